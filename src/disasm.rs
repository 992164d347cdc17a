use crate::opcode::{self, AddressingMode};
use crate::runtime::MEMORY_MAX;

/// Renders `count` bytes of memory starting at `start` as one instruction
/// per line, `PC  MNEMONIC OPERAND`. Bytes that decode to nothing are shown
/// as `.byte $xx` so the walk never stalls.
pub fn disassemble(mem: &[u8; MEMORY_MAX], start: u16, count: usize) -> String {
    let mut out = String::new();
    let mut pc = start;
    let mut consumed = 0;
    while consumed < count {
        let opcode = mem[pc as usize];
        let size = match opcode::decode(opcode) {
            Some((mnemonic, mode)) => {
                let operand = render_operand(mem, pc, mode);
                if operand.is_empty() {
                    out.push_str(&format!("{pc:04X}  {mnemonic}\n"));
                } else {
                    out.push_str(&format!("{pc:04X}  {mnemonic} {operand}\n"));
                }
                1 + mode.operand_size() as usize
            }
            None => {
                out.push_str(&format!("{pc:04X}  .byte ${opcode:02X}\n"));
                1
            }
        };
        pc = pc.wrapping_add(size as u16);
        consumed += size;
    }
    out
}

fn render_operand(mem: &[u8; MEMORY_MAX], pc: u16, mode: AddressingMode) -> String {
    use AddressingMode::*;
    let byte = mem[pc.wrapping_add(1) as usize];
    let word = u16::from_le_bytes([byte, mem[pc.wrapping_add(2) as usize]]);
    match mode {
        Implied => String::new(),
        Accumulator => "A".to_string(),
        Immediate => format!("#${byte:02X}"),
        ZeroPage => format!("${byte:02X}"),
        ZeroPageX => format!("${byte:02X},X"),
        ZeroPageY => format!("${byte:02X},Y"),
        Absolute | JmpAbsolute => format!("${word:04X}"),
        AbsoluteX => format!("${word:04X},X"),
        AbsoluteY => format!("${word:04X},Y"),
        IndirectX => format!("(${byte:02X},X)"),
        IndirectY => format!("(${byte:02X}),Y"),
        Indirect => format!("(${word:04X})"),
        Relative => {
            // Shown as the resolved target, not the raw displacement.
            let target = pc.wrapping_add(2).wrapping_add(byte as i8 as u16);
            format!("${target:04X}")
        }
    }
}

/// Hex dump of a memory range, eight bytes per row.
pub fn dump(mem: &[u8; MEMORY_MAX], start: u16, len: usize) -> String {
    let mut out = String::new();
    for i in 0..len {
        let addr = start.wrapping_add(i as u16);
        if i % 8 == 0 {
            if i != 0 {
                out.push('\n');
            }
            out.push_str(&format!("{addr:04X} : "));
        }
        out.push_str(&format!("{:02X} ", mem[addr as usize]));
    }
    if len != 0 {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asm::{Assembler, LOAD_ORIGIN};

    fn memory_with(bytes: &[u8]) -> Box<[u8; MEMORY_MAX]> {
        let mut mem = Box::new([0u8; MEMORY_MAX]);
        mem[LOAD_ORIGIN as usize..LOAD_ORIGIN as usize + bytes.len()].copy_from_slice(bytes);
        mem
    }

    #[test]
    fn renders_each_operand_form() {
        let mem = memory_with(&[
            0xA9, 0x01, // LDA #$01
            0xA5, 0x50, // LDA $50
            0xB5, 0x50, // LDA $50,X
            0xB6, 0x50, // LDX $50,Y
            0x8D, 0x00, 0x02, // STA $0200
            0xBD, 0x00, 0x02, // LDA $0200,X
            0xB9, 0x00, 0x02, // LDA $0200,Y
            0xA1, 0x20, // LDA ($20,X)
            0xB1, 0x20, // LDA ($20),Y
            0x6C, 0x00, 0x06, // JMP ($0600)
            0x0A, // ASL A
            0xEA, // NOP
        ]);
        let listing = disassemble(&mem, LOAD_ORIGIN, 26);
        let expected = "\
            0600  LDA #$01\n\
            0602  LDA $50\n\
            0604  LDA $50,X\n\
            0606  LDX $50,Y\n\
            0608  STA $0200\n\
            060B  LDA $0200,X\n\
            060E  LDA $0200,Y\n\
            0611  LDA ($20,X)\n\
            0613  LDA ($20),Y\n\
            0615  JMP ($0600)\n\
            0618  ASL A\n\
            0619  NOP\n";
        assert_eq!(listing, expected);
    }

    #[test]
    fn renders_branch_targets() {
        // BNE back over eight bytes, then BEQ forward over two.
        let mem = memory_with(&[0xD0, 0xF8, 0xF0, 0x02]);
        let listing = disassemble(&mem, LOAD_ORIGIN, 4);
        assert_eq!(listing, "0600  BNE $05FA\n0602  BEQ $0606\n");
    }

    #[test]
    fn unknown_bytes_render_as_data() {
        let mem = memory_with(&[0x02, 0xEA]);
        let listing = disassemble(&mem, LOAD_ORIGIN, 2);
        assert_eq!(listing, "0600  .byte $02\n0601  NOP\n");
    }

    #[test]
    fn listing_reassembles_to_identical_bytes() {
        let src = "LDA #$01\nSTA $0200\nLDA ($20),Y\nASL A\nJMP $0600\nBRK\n";
        let first = Assembler::new(src).unwrap().assemble().unwrap();
        let mem = memory_with(&first.code);
        let listing = disassemble(&mem, LOAD_ORIGIN, first.code.len());
        // Strip the leading address column before reassembling.
        let source: String = listing
            .lines()
            .map(|line| &line[6..])
            .collect::<Vec<_>>()
            .join("\n");
        let second = Assembler::new(&source).unwrap().assemble().unwrap();
        assert_eq!(first.code, second.code);
    }

    #[test]
    fn dump_rows_of_eight() {
        let mem = memory_with(&[0xA9, 0x01, 0x8D, 0x00, 0x02, 0xA9, 0x05, 0x8D, 0x01, 0x02]);
        let text = dump(&mem, LOAD_ORIGIN, 10);
        assert_eq!(
            text,
            "0600 : A9 01 8D 00 02 A9 05 8D \n0608 : 01 02 \n"
        );
    }
}
