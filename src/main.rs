use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{IntoDiagnostic, Result};

use kim::{Context, LOAD_ORIGIN};

/// Kim is an assembler, disassembler and simulator for the MOS 6502,
/// named for the KIM-1 single-board computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble a `.asm` file, run it, and dump the registers
    Run {
        /// `.asm` file to run
        name: PathBuf,
    },
    /// Assemble a `.asm` file into a binary `.prg` image
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination for the `.prg` image
        dest: Option<PathBuf>,
    },
    /// Assemble a `.asm` file without running or writing anything
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Load a binary `.prg` image and print its disassembly
    Dis {
        /// `.prg` image to disassemble
        name: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut ctx = Context::new();

    match args.command {
        Command::Run { name } => {
            println!(
                "{:>12} target {}",
                "Assembling".green().bold(),
                name.display()
            );
            ctx.assemble_file(&name)?;
            report_warnings(&ctx);
            println!("{:>12} program", "Running".green().bold());
            ctx.run().into_diagnostic()?;
            print_registers(&ctx);
            println!(
                "{:>12} target {}",
                "Completed".green().bold(),
                name.display()
            );
        }
        Command::Compile { name, dest } => {
            println!(
                "{:>12} target {}",
                "Assembling".green().bold(),
                name.display()
            );
            ctx.assemble_file(&name)?;
            report_warnings(&ctx);
            let out = dest.unwrap_or_else(|| name.with_extension("prg"));
            ctx.save(&out)?;
            println!("{:>12} {}", "Saved to".green().bold(), out.display());
        }
        Command::Check { name } => {
            println!(
                "{:>12} target {}",
                "Checking".green().bold(),
                name.display()
            );
            ctx.assemble_file(&name)?;
            report_warnings(&ctx);
            println!("{:>12} with 0 errors", "Finished".green().bold());
        }
        Command::Dis { name } => {
            let bytes = ctx.load(&name)?;
            print!("{}", ctx.disassemble(LOAD_ORIGIN, bytes));
        }
    }
    Ok(())
}

fn report_warnings(ctx: &Context) {
    for warning in ctx.warnings() {
        eprintln!("{warning:?}");
    }
}

fn print_registers(ctx: &Context) {
    println!("A  0x{:02x}", ctx.a());
    println!("X  0x{:02x}", ctx.x());
    println!("Y  0x{:02x}", ctx.y());
    println!("PC 0x{:04x}", ctx.pc());
    println!("SP 0x{:02x}", ctx.sp());
    println!("P  0b{:08b}", ctx.status());
}
