use std::fs;
use std::path::Path;

use bitflags::bitflags;
use miette::{IntoDiagnostic, Report, Result};

use crate::asm::{Assembler, LOAD_ORIGIN};
use crate::disasm;
use crate::opcode::{self, AddressingMode, Mnemonic};

/// The 6502 can address 64KB of memory.
pub const MEMORY_MAX: usize = 0x10000;

/// Base of the hardware stack page.
const STACK_BASE: usize = 0x0100;

bitflags! {
    /// Processor status register, bit-packed the way PHP/PLP observe it.
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub struct Status: u8 {
        /// Carry
        const C = 1 << 0;
        /// Zero
        const Z = 1 << 1;
        /// Interrupt disable
        const I = 1 << 2;
        /// Decimal mode (stored but never honoured; ADC/SBC stay binary)
        const D = 1 << 3;
        /// Break
        const B = 1 << 4;
        /// Unused, reads as 1
        const U = 1 << 5;
        /// Overflow
        const V = 1 << 6;
        /// Negative
        const N = 1 << 7;
    }
}

impl Status {
    /// P as restored by PLP/RTI: the pushed B bit is discarded and the
    /// unused bit is forced on.
    fn from_stack(bits: u8) -> Status {
        (Status::from_bits_truncate(bits) - Status::B) | Status::U
    }
}

/// Faults the interpreter can hit. Execution halts and the machine state
/// is left exactly as the last successful instruction left it.
#[derive(thiserror::Error, Clone, Copy, PartialEq, Eq, Debug)]
pub enum RunError {
    #[error("illegal opcode {opcode:#04x} at {pc:#06x}")]
    IllegalOpcode { pc: u16, opcode: u8 },
    #[error("stack overflow at {pc:#06x}")]
    StackOverflow { pc: u16 },
    #[error("stack underflow at {pc:#06x}")]
    StackUnderflow { pc: u16 },
}

/// What an addressing mode resolved to for one instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Operand {
    None,
    /// Instruction works on the accumulator itself.
    Acc,
    /// Immediate byte.
    Value(u8),
    /// Effective address (or branch target for Relative mode).
    Address(u16),
}

/// Complete machine state: registers, flags, stack and 64KB of memory,
/// plus bookkeeping for the most recently assembled or loaded program.
pub struct Context {
    a: u8,
    x: u8,
    y: u8,
    pc: u16,
    sp: u8,
    p: Status,
    mem: Box<[u8; MEMORY_MAX]>,
    num_bytes: u16,
    num_commands: usize,
    warnings: Vec<Report>,
}

impl Context {
    pub fn new() -> Self {
        Context {
            a: 0,
            x: 0,
            y: 0,
            pc: LOAD_ORIGIN,
            sp: 0xFF,
            p: Status::U,
            mem: Box::new([0; MEMORY_MAX]),
            num_bytes: 0,
            num_commands: 0,
            warnings: Vec::new(),
        }
    }

    /// Zeroes memory and registers, clears flags, and puts PC back at the
    /// load origin with an empty stack.
    pub fn reset(&mut self) {
        *self = Context::new();
    }

    // ---- assembling and images -------------------------------------------

    /// Assembles `src` into memory at the load origin and returns the
    /// number of bytes emitted. On error nothing is copied, so whatever
    /// program was previously loaded stays runnable.
    pub fn assemble(&mut self, src: &str) -> Result<usize> {
        let program = Assembler::new(src)?.assemble()?;
        let start = LOAD_ORIGIN as usize;
        self.mem[start..start + program.code.len()].copy_from_slice(&program.code);
        self.num_bytes = program.code.len() as u16;
        self.num_commands = program.commands;
        self.warnings = program.warnings;
        Ok(program.code.len())
    }

    pub fn assemble_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let src = fs::read_to_string(path).into_diagnostic()?;
        self.assemble(&src)
    }

    /// Non-fatal diagnostics raised by the last `assemble` call.
    pub fn warnings(&self) -> &[Report] {
        &self.warnings
    }

    pub fn disassemble(&self, start: u16, count: usize) -> String {
        disasm::disassemble(&self.mem, start, count)
    }

    pub fn dump(&self, start: u16, len: usize) -> String {
        disasm::dump(&self.mem, start, len)
    }

    // ---- execution -------------------------------------------------------

    /// Executes one instruction. Returns false once the program has
    /// stopped: a BRK, or PC leaving the loaded program.
    pub fn step(&mut self) -> Result<bool, RunError> {
        let end = LOAD_ORIGIN.wrapping_add(self.num_bytes);
        if !(LOAD_ORIGIN..end).contains(&self.pc) {
            return Ok(false);
        }
        let opcode = self.mem[self.pc as usize];
        let Some((mnemonic, mode)) = opcode::decode(opcode) else {
            return Err(RunError::IllegalOpcode { pc: self.pc, opcode });
        };
        let operand = self.fetch_operand(mode);
        self.execute(mnemonic, operand)?;
        if !mnemonic.modifies_pc() {
            self.pc = self.pc.wrapping_add(1 + mode.operand_size());
        }
        Ok(mnemonic != Mnemonic::Brk)
    }

    /// Runs the loaded program from the load origin until it stops or
    /// faults. There is no timeout; hosts wanting cancellation should
    /// drive `step` themselves.
    pub fn run(&mut self) -> Result<(), RunError> {
        self.pc = LOAD_ORIGIN;
        while self.step()? {}
        Ok(())
    }

    fn fetch_operand(&self, mode: AddressingMode) -> Operand {
        use AddressingMode::*;
        let arg = |offs: u16| self.mem[self.pc.wrapping_add(offs) as usize];
        match mode {
            Implied => Operand::None,
            Accumulator => Operand::Acc,
            Immediate => Operand::Value(arg(1)),
            ZeroPage => Operand::Address(arg(1) as u16),
            // Indexing wraps within the zero page, never into page one.
            ZeroPageX => Operand::Address(arg(1).wrapping_add(self.x) as u16),
            ZeroPageY => Operand::Address(arg(1).wrapping_add(self.y) as u16),
            Absolute | JmpAbsolute => Operand::Address(u16::from_le_bytes([arg(1), arg(2)])),
            AbsoluteX => {
                Operand::Address(u16::from_le_bytes([arg(1), arg(2)]).wrapping_add(self.x as u16))
            }
            AbsoluteY => {
                Operand::Address(u16::from_le_bytes([arg(1), arg(2)]).wrapping_add(self.y as u16))
            }
            IndirectX => {
                let zp = arg(1).wrapping_add(self.x);
                let lo = self.mem[zp as usize];
                let hi = self.mem[zp.wrapping_add(1) as usize];
                Operand::Address(u16::from_le_bytes([lo, hi]))
            }
            IndirectY => {
                let zp = arg(1);
                let lo = self.mem[zp as usize];
                let hi = self.mem[zp.wrapping_add(1) as usize];
                Operand::Address(u16::from_le_bytes([lo, hi]).wrapping_add(self.y as u16))
            }
            Indirect => {
                let ptr = u16::from_le_bytes([arg(1), arg(2)]);
                let lo = self.mem[ptr as usize];
                let hi = self.mem[ptr.wrapping_add(1) as usize];
                Operand::Address(u16::from_le_bytes([lo, hi]))
            }
            Relative => {
                let disp = arg(1) as i8;
                Operand::Address(self.pc.wrapping_add(2).wrapping_add(disp as u16))
            }
        }
    }

    fn execute(&mut self, mnemonic: Mnemonic, operand: Operand) -> Result<(), RunError> {
        use Mnemonic::*;
        match mnemonic {
            // Loads and stores
            Lda => {
                self.a = self.value_of(operand);
                self.set_zn(self.a);
            }
            Ldx => {
                self.x = self.value_of(operand);
                self.set_zn(self.x);
            }
            Ldy => {
                self.y = self.value_of(operand);
                self.set_zn(self.y);
            }
            Sta => self.mem[self.addr_of(operand) as usize] = self.a,
            Stx => self.mem[self.addr_of(operand) as usize] = self.x,
            Sty => self.mem[self.addr_of(operand) as usize] = self.y,

            // Transfers; flags come from the destination, TXS sets none
            Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }
            Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Txs => self.sp = self.x,

            // Increments and decrements
            Inc => {
                let addr = self.addr_of(operand) as usize;
                let v = self.mem[addr].wrapping_add(1);
                self.mem[addr] = v;
                self.set_zn(v);
            }
            Dec => {
                let addr = self.addr_of(operand) as usize;
                let v = self.mem[addr].wrapping_sub(1);
                self.mem[addr] = v;
                self.set_zn(v);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }

            // Arithmetic; SBC is ADC of the complement
            Adc => {
                let m = self.value_of(operand);
                self.adc(m);
            }
            Sbc => {
                let m = self.value_of(operand);
                self.adc(!m);
            }

            // Bitwise
            And => {
                self.a &= self.value_of(operand);
                self.set_zn(self.a);
            }
            Ora => {
                self.a |= self.value_of(operand);
                self.set_zn(self.a);
            }
            Eor => {
                self.a ^= self.value_of(operand);
                self.set_zn(self.a);
            }

            // Shifts and rotates
            Asl => self.rotate(operand, |v, _| (v << 1, v & 0x80 != 0)),
            Lsr => self.rotate(operand, |v, _| (v >> 1, v & 0x01 != 0)),
            Rol => self.rotate(operand, |v, c| ((v << 1) | c as u8, v & 0x80 != 0)),
            Ror => self.rotate(operand, |v, c| ((v >> 1) | ((c as u8) << 7), v & 0x01 != 0)),

            // Comparisons
            Cmp => {
                let m = self.value_of(operand);
                self.compare(self.a, m);
            }
            Cpx => {
                let m = self.value_of(operand);
                self.compare(self.x, m);
            }
            Cpy => {
                let m = self.value_of(operand);
                self.compare(self.y, m);
            }
            Bit => {
                let m = self.value_of(operand);
                self.p.set(Status::Z, self.a & m == 0);
                self.p.set(Status::N, m & 0x80 != 0);
                self.p.set(Status::V, m & 0x40 != 0);
            }

            // Branches
            Bcc => self.branch(!self.p.contains(Status::C), operand),
            Bcs => self.branch(self.p.contains(Status::C), operand),
            Bne => self.branch(!self.p.contains(Status::Z), operand),
            Beq => self.branch(self.p.contains(Status::Z), operand),
            Bpl => self.branch(!self.p.contains(Status::N), operand),
            Bmi => self.branch(self.p.contains(Status::N), operand),
            Bvc => self.branch(!self.p.contains(Status::V), operand),
            Bvs => self.branch(self.p.contains(Status::V), operand),

            // Jumps and returns
            Jmp => self.pc = self.addr_of(operand),
            Jsr => {
                let ret = self.pc.wrapping_add(2);
                self.push((ret >> 8) as u8)?;
                self.push(ret as u8)?;
                self.pc = self.addr_of(operand);
            }
            Rts => {
                let lo = self.pull()?;
                let hi = self.pull()?;
                self.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            Rti => {
                let bits = self.pull()?;
                self.p = Status::from_stack(bits);
                let lo = self.pull()?;
                let hi = self.pull()?;
                self.pc = u16::from_le_bytes([lo, hi]);
            }

            // Stack
            Pha => self.push(self.a)?,
            Php => self.push((self.p | Status::B | Status::U).bits())?,
            Pla => {
                self.a = self.pull()?;
                self.set_zn(self.a);
            }
            Plp => {
                let bits = self.pull()?;
                self.p = Status::from_stack(bits);
            }

            // Flag manipulation
            Clc => self.p.remove(Status::C),
            Sec => self.p.insert(Status::C),
            Cld => self.p.remove(Status::D),
            Sed => self.p.insert(Status::D),
            Cli => self.p.remove(Status::I),
            Sei => self.p.insert(Status::I),
            Clv => self.p.remove(Status::V),

            // BRK stops the run loop; the loop itself handles it
            Brk => {}
            Nop => {}
        }
        Ok(())
    }

    fn value_of(&self, operand: Operand) -> u8 {
        match operand {
            Operand::Value(v) => v,
            Operand::Address(addr) => self.mem[addr as usize],
            Operand::Acc => self.a,
            Operand::None => 0,
        }
    }

    fn addr_of(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Address(addr) => addr,
            // The encoding table never pairs an address-taking instruction
            // with a mode that yields anything else.
            _ => unreachable!("operand has no effective address"),
        }
    }

    fn set_zn(&mut self, val: u8) {
        self.p.set(Status::Z, val == 0);
        self.p.set(Status::N, val & 0x80 != 0);
    }

    /// Add with carry in binary mode, the only mode this machine has.
    fn adc(&mut self, m: u8) {
        let carry = self.p.contains(Status::C) as u16;
        let sum = self.a as u16 + m as u16 + carry;
        let result = sum as u8;
        self.p.set(Status::C, sum > 0xFF);
        // Signed overflow: operands agree in sign, result does not.
        self.p
            .set(Status::V, (self.a ^ result) & (m ^ result) & 0x80 != 0);
        self.a = result;
        self.set_zn(result);
    }

    fn rotate(&mut self, operand: Operand, f: impl FnOnce(u8, bool) -> (u8, bool)) {
        let carry_in = self.p.contains(Status::C);
        match operand {
            Operand::Acc => {
                let (result, carry) = f(self.a, carry_in);
                self.a = result;
                self.p.set(Status::C, carry);
                self.set_zn(result);
            }
            Operand::Address(addr) => {
                let (result, carry) = f(self.mem[addr as usize], carry_in);
                self.mem[addr as usize] = result;
                self.p.set(Status::C, carry);
                self.set_zn(result);
            }
            _ => unreachable!("shift target is neither A nor memory"),
        }
    }

    fn compare(&mut self, reg: u8, m: u8) {
        self.p.set(Status::C, reg >= m);
        self.p.set(Status::Z, reg == m);
        self.p.set(Status::N, reg.wrapping_sub(m) & 0x80 != 0);
    }

    /// Branch target was resolved during operand fetch; not taken falls
    /// through to the next instruction.
    fn branch(&mut self, taken: bool, operand: Operand) {
        if taken {
            self.pc = self.addr_of(operand);
        } else {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// Push writes, then decrements. SP wrapping off the bottom of the
    /// stack page is an error, detected before any state changes.
    fn push(&mut self, val: u8) -> Result<(), RunError> {
        if self.sp == 0x00 {
            return Err(RunError::StackOverflow { pc: self.pc });
        }
        self.mem[STACK_BASE + self.sp as usize] = val;
        self.sp -= 1;
        Ok(())
    }

    /// Pull increments, then reads.
    fn pull(&mut self) -> Result<u8, RunError> {
        if self.sp == 0xFF {
            return Err(RunError::StackUnderflow { pc: self.pc });
        }
        self.sp += 1;
        Ok(self.mem[STACK_BASE + self.sp as usize])
    }

    // ---- inspection ------------------------------------------------------

    pub fn read(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        self.mem[addr as usize] = val;
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn flag(&self, flag: Status) -> bool {
        self.p.contains(flag)
    }

    /// P as a packed byte, unused bit forced on.
    pub fn status(&self) -> u8 {
        (self.p | Status::U).bits()
    }

    pub fn num_bytes(&self) -> u16 {
        self.num_bytes
    }

    pub fn num_commands(&self) -> usize {
        self.num_commands
    }

    pub(crate) fn mem(&self) -> &[u8; MEMORY_MAX] {
        &self.mem
    }

    pub(crate) fn load_image(&mut self, code: &[u8], commands: usize) {
        let start = LOAD_ORIGIN as usize;
        self.mem[start..start + code.len()].copy_from_slice(code);
        self.num_bytes = code.len() as u16;
        self.num_commands = commands;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
