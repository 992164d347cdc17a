use std::fmt;

/// The rule by which an instruction's operand bytes are interpreted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    Indirect,
    Relative,
    /// Absolute operand of JMP/JSR. Kept apart from `Absolute` so control
    /// transfer never goes through the load/store address path.
    JmpAbsolute,
}

impl AddressingMode {
    /// Number of operand bytes following the opcode byte.
    pub fn operand_size(self) -> u16 {
        use AddressingMode::*;
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect | JmpAbsolute => 2,
        }
    }
}

/// The 56 documented 6502 mnemonics, in table order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

impl Mnemonic {
    pub const ALL: [Mnemonic; 56] = {
        use Mnemonic::*;
        [
            Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli,
            Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy,
            Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta,
            Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
        ]
    };

    pub fn name(self) -> &'static str {
        use Mnemonic::*;
        match self {
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
        }
    }

    /// Case-insensitive lookup of a three letter mnemonic.
    pub fn parse(text: &str) -> Option<Mnemonic> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(text))
    }

    /// Instructions that load PC themselves. Everything else gets the
    /// common post-increment of `1 + operand_size` after execution.
    pub fn modifies_pc(self) -> bool {
        use Mnemonic::*;
        matches!(
            self,
            Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs | Jmp | Jsr | Rts | Rti | Brk
        )
    }

    /// The eight conditional branches, which take a label operand encoded
    /// as a signed 8-bit displacement.
    pub fn is_branch(self) -> bool {
        use Mnemonic::*;
        matches!(self, Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs)
    }

    /// JMP and JSR, which take a 16-bit absolute target.
    pub fn is_jump(self) -> bool {
        matches!(self, Mnemonic::Jmp | Mnemonic::Jsr)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One legal (mnemonic, addressing mode, opcode byte) triple.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Encoding {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub opcode: u8,
}

const fn row(mnemonic: Mnemonic, mode: AddressingMode, opcode: u8) -> Encoding {
    Encoding {
        mnemonic,
        mode,
        opcode,
    }
}

/// Every defined opcode of the NMOS 6502, grouped by mnemonic.
pub static ENCODINGS: [Encoding; 151] = {
    use AddressingMode::*;
    use Mnemonic::*;
    [
        // ADC
        row(Adc, Immediate, 0x69),
        row(Adc, ZeroPage, 0x65),
        row(Adc, ZeroPageX, 0x75),
        row(Adc, Absolute, 0x6D),
        row(Adc, AbsoluteX, 0x7D),
        row(Adc, AbsoluteY, 0x79),
        row(Adc, IndirectX, 0x61),
        row(Adc, IndirectY, 0x71),
        // AND
        row(And, Immediate, 0x29),
        row(And, ZeroPage, 0x25),
        row(And, ZeroPageX, 0x35),
        row(And, Absolute, 0x2D),
        row(And, AbsoluteX, 0x3D),
        row(And, AbsoluteY, 0x39),
        row(And, IndirectX, 0x21),
        row(And, IndirectY, 0x31),
        // ASL
        row(Asl, Accumulator, 0x0A),
        row(Asl, ZeroPage, 0x06),
        row(Asl, ZeroPageX, 0x16),
        row(Asl, Absolute, 0x0E),
        row(Asl, AbsoluteX, 0x1E),
        // Branches
        row(Bcc, Relative, 0x90),
        row(Bcs, Relative, 0xB0),
        row(Beq, Relative, 0xF0),
        row(Bmi, Relative, 0x30),
        row(Bne, Relative, 0xD0),
        row(Bpl, Relative, 0x10),
        row(Bvc, Relative, 0x50),
        row(Bvs, Relative, 0x70),
        // BIT
        row(Bit, ZeroPage, 0x24),
        row(Bit, Absolute, 0x2C),
        // BRK
        row(Brk, Implied, 0x00),
        // Flag clears and sets
        row(Clc, Implied, 0x18),
        row(Cld, Implied, 0xD8),
        row(Cli, Implied, 0x58),
        row(Clv, Implied, 0xB8),
        // CMP
        row(Cmp, Immediate, 0xC9),
        row(Cmp, ZeroPage, 0xC5),
        row(Cmp, ZeroPageX, 0xD5),
        row(Cmp, Absolute, 0xCD),
        row(Cmp, AbsoluteX, 0xDD),
        row(Cmp, AbsoluteY, 0xD9),
        row(Cmp, IndirectX, 0xC1),
        row(Cmp, IndirectY, 0xD1),
        // CPX
        row(Cpx, Immediate, 0xE0),
        row(Cpx, ZeroPage, 0xE4),
        row(Cpx, Absolute, 0xEC),
        // CPY
        row(Cpy, Immediate, 0xC0),
        row(Cpy, ZeroPage, 0xC4),
        row(Cpy, Absolute, 0xCC),
        // DEC
        row(Dec, ZeroPage, 0xC6),
        row(Dec, ZeroPageX, 0xD6),
        row(Dec, Absolute, 0xCE),
        row(Dec, AbsoluteX, 0xDE),
        row(Dex, Implied, 0xCA),
        row(Dey, Implied, 0x88),
        // EOR
        row(Eor, Immediate, 0x49),
        row(Eor, ZeroPage, 0x45),
        row(Eor, ZeroPageX, 0x55),
        row(Eor, Absolute, 0x4D),
        row(Eor, AbsoluteX, 0x5D),
        row(Eor, AbsoluteY, 0x59),
        row(Eor, IndirectX, 0x41),
        row(Eor, IndirectY, 0x51),
        // INC
        row(Inc, ZeroPage, 0xE6),
        row(Inc, ZeroPageX, 0xF6),
        row(Inc, Absolute, 0xEE),
        row(Inc, AbsoluteX, 0xFE),
        row(Inx, Implied, 0xE8),
        row(Iny, Implied, 0xC8),
        // JMP / JSR
        row(Jmp, JmpAbsolute, 0x4C),
        row(Jmp, Indirect, 0x6C),
        row(Jsr, JmpAbsolute, 0x20),
        // LDA
        row(Lda, Immediate, 0xA9),
        row(Lda, ZeroPage, 0xA5),
        row(Lda, ZeroPageX, 0xB5),
        row(Lda, Absolute, 0xAD),
        row(Lda, AbsoluteX, 0xBD),
        row(Lda, AbsoluteY, 0xB9),
        row(Lda, IndirectX, 0xA1),
        row(Lda, IndirectY, 0xB1),
        // LDX
        row(Ldx, Immediate, 0xA2),
        row(Ldx, ZeroPage, 0xA6),
        row(Ldx, ZeroPageY, 0xB6),
        row(Ldx, Absolute, 0xAE),
        row(Ldx, AbsoluteY, 0xBE),
        // LDY
        row(Ldy, Immediate, 0xA0),
        row(Ldy, ZeroPage, 0xA4),
        row(Ldy, ZeroPageX, 0xB4),
        row(Ldy, Absolute, 0xAC),
        row(Ldy, AbsoluteX, 0xBC),
        // LSR
        row(Lsr, Accumulator, 0x4A),
        row(Lsr, ZeroPage, 0x46),
        row(Lsr, ZeroPageX, 0x56),
        row(Lsr, Absolute, 0x4E),
        row(Lsr, AbsoluteX, 0x5E),
        // NOP
        row(Nop, Implied, 0xEA),
        // ORA
        row(Ora, Immediate, 0x09),
        row(Ora, ZeroPage, 0x05),
        row(Ora, ZeroPageX, 0x15),
        row(Ora, Absolute, 0x0D),
        row(Ora, AbsoluteX, 0x1D),
        row(Ora, AbsoluteY, 0x19),
        row(Ora, IndirectX, 0x01),
        row(Ora, IndirectY, 0x11),
        // Stack pushes and pulls
        row(Pha, Implied, 0x48),
        row(Php, Implied, 0x08),
        row(Pla, Implied, 0x68),
        row(Plp, Implied, 0x28),
        // ROL
        row(Rol, Accumulator, 0x2A),
        row(Rol, ZeroPage, 0x26),
        row(Rol, ZeroPageX, 0x36),
        row(Rol, Absolute, 0x2E),
        row(Rol, AbsoluteX, 0x3E),
        // ROR
        row(Ror, Accumulator, 0x6A),
        row(Ror, ZeroPage, 0x66),
        row(Ror, ZeroPageX, 0x76),
        row(Ror, Absolute, 0x6E),
        row(Ror, AbsoluteX, 0x7E),
        // Returns
        row(Rti, Implied, 0x40),
        row(Rts, Implied, 0x60),
        // SBC
        row(Sbc, Immediate, 0xE9),
        row(Sbc, ZeroPage, 0xE5),
        row(Sbc, ZeroPageX, 0xF5),
        row(Sbc, Absolute, 0xED),
        row(Sbc, AbsoluteX, 0xFD),
        row(Sbc, AbsoluteY, 0xF9),
        row(Sbc, IndirectX, 0xE1),
        row(Sbc, IndirectY, 0xF1),
        row(Sec, Implied, 0x38),
        row(Sed, Implied, 0xF8),
        row(Sei, Implied, 0x78),
        // STA
        row(Sta, ZeroPage, 0x85),
        row(Sta, ZeroPageX, 0x95),
        row(Sta, Absolute, 0x8D),
        row(Sta, AbsoluteX, 0x9D),
        row(Sta, AbsoluteY, 0x99),
        row(Sta, IndirectX, 0x81),
        row(Sta, IndirectY, 0x91),
        // STX
        row(Stx, ZeroPage, 0x86),
        row(Stx, ZeroPageY, 0x96),
        row(Stx, Absolute, 0x8E),
        // STY
        row(Sty, ZeroPage, 0x84),
        row(Sty, ZeroPageX, 0x94),
        row(Sty, Absolute, 0x8C),
        // Transfers
        row(Tax, Implied, 0xAA),
        row(Tay, Implied, 0xA8),
        row(Tsx, Implied, 0xBA),
        row(Txa, Implied, 0x8A),
        row(Txs, Implied, 0x9A),
        row(Tya, Implied, 0x98),
    ]
};

/// Opcode byte for a (mnemonic, mode) pair, if the pair is legal.
pub fn encode(mnemonic: Mnemonic, mode: AddressingMode) -> Option<u8> {
    ENCODINGS
        .iter()
        .find(|e| e.mnemonic == mnemonic && e.mode == mode)
        .map(|e| e.opcode)
}

/// Reverse lookup used by the interpreter and disassembler.
pub fn decode(opcode: u8) -> Option<(Mnemonic, AddressingMode)> {
    ENCODINGS
        .iter()
        .find(|e| e.opcode == opcode)
        .map(|e| (e.mnemonic, e.mode))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_opcode_byte_is_unique() {
        let mut seen = [false; 256];
        for enc in ENCODINGS.iter() {
            assert!(
                !seen[enc.opcode as usize],
                "duplicate opcode {:#04x}",
                enc.opcode
            );
            seen[enc.opcode as usize] = true;
        }
        assert_eq!(seen.iter().filter(|s| **s).count(), 151);
    }

    #[test]
    fn encode_decode_are_inverses() {
        for enc in ENCODINGS.iter() {
            assert_eq!(encode(enc.mnemonic, enc.mode), Some(enc.opcode));
            assert_eq!(decode(enc.opcode), Some((enc.mnemonic, enc.mode)));
        }
    }

    #[test]
    fn well_known_encodings() {
        use AddressingMode::*;
        use Mnemonic::*;
        assert_eq!(encode(Lda, Immediate), Some(0xA9));
        assert_eq!(encode(Sta, Absolute), Some(0x8D));
        assert_eq!(encode(Jmp, JmpAbsolute), Some(0x4C));
        assert_eq!(encode(Jmp, Indirect), Some(0x6C));
        assert_eq!(encode(Jsr, JmpAbsolute), Some(0x20));
        assert_eq!(encode(Bne, Relative), Some(0xD0));
        assert_eq!(encode(Brk, Implied), Some(0x00));
        assert_eq!(decode(0xEA), Some((Nop, Implied)));
    }

    #[test]
    fn illegal_pairs_are_absent() {
        use AddressingMode::*;
        use Mnemonic::*;
        assert_eq!(encode(Lda, Accumulator), None);
        assert_eq!(encode(Sta, Immediate), None);
        assert_eq!(encode(Jsr, Indirect), None);
        assert_eq!(encode(Inx, ZeroPage), None);
        assert_eq!(decode(0x02), None);
    }

    #[test]
    fn operand_sizes_per_mode() {
        use AddressingMode::*;
        assert_eq!(Implied.operand_size(), 0);
        assert_eq!(Accumulator.operand_size(), 0);
        assert_eq!(Immediate.operand_size(), 1);
        assert_eq!(ZeroPageX.operand_size(), 1);
        assert_eq!(IndirectY.operand_size(), 1);
        assert_eq!(Relative.operand_size(), 1);
        assert_eq!(Absolute.operand_size(), 2);
        assert_eq!(Indirect.operand_size(), 2);
        assert_eq!(JmpAbsolute.operand_size(), 2);
    }

    #[test]
    fn pc_writers_are_flagged() {
        use Mnemonic::*;
        for m in [Bcc, Bcs, Beq, Bmi, Bne, Bpl, Bvc, Bvs, Jmp, Jsr, Rts, Rti, Brk] {
            assert!(m.modifies_pc(), "{m} must own its PC update");
        }
        for m in [Lda, Sta, Adc, Inx, Nop, Pha, Txs] {
            assert!(!m.modifies_pc(), "{m} must use the common PC advance");
        }
    }

    #[test]
    fn mnemonic_lookup_is_case_insensitive() {
        assert_eq!(Mnemonic::parse("lda"), Some(Mnemonic::Lda));
        assert_eq!(Mnemonic::parse("LdA"), Some(Mnemonic::Lda));
        assert_eq!(Mnemonic::parse("BRK"), Some(Mnemonic::Brk));
        assert_eq!(Mnemonic::parse("label"), None);
        assert_eq!(Mnemonic::parse("xyz"), None);
    }
}
