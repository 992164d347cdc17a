use std::num::ParseIntError;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::lexer::TokenKind;
use crate::opcode::Mnemonic;
use crate::symbol::Span;

// Lexer errors

pub fn lex_unterminated_hex(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::unterminated_hex",
        help = "a `$` must be followed by at least one hex digit, like $0600.",
        labels = vec![LabeledSpan::at(span, "incomplete hex literal")],
        "Encountered a `$` with no hex digits after it.",
    )
    .with_source_code(src.to_string())
}

pub fn lex_bad_lit(span: Span, src: &str, e: ParseIntError) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::bad_lit",
        help = "numeric literals must fit in 32 bits.",
        labels = vec![LabeledSpan::at(span, "incorrect literal")],
        "Encountered an invalid numeric literal: {e}",
    )
    .with_source_code(src.to_string())
}

pub fn lex_unknown(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "lex::unknown",
        help = "check for stray punctuation; hex literals start with $.",
        labels = vec![LabeledSpan::at(span, "unknown token")],
        "Encountered an unknown token",
    )
    .with_source_code(src.to_string())
}

/// Warning attached to literals wider than an address.
pub fn lex_truncated(span: Span, src: &str, val: u32) -> Report {
    miette!(
        severity = Severity::Warning,
        code = "lex::truncated",
        help = "addresses are 16 bits; only the low 16 bits are kept.",
        labels = vec![LabeledSpan::at(span, "wider than 16 bits")],
        "Literal {val:#x} truncated to 16 bits",
    )
    .with_source_code(src.to_string())
}

// Assembler errors

pub fn asm_bad_mode(span: Span, src: &str, mnemonic: Mnemonic) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::bad_mode",
        help = "check the addressing modes this instruction supports.",
        labels = vec![LabeledSpan::at(span, "unsupported operand form")],
        "{mnemonic} does not support this addressing mode",
    )
    .with_source_code(src.to_string())
}

pub fn asm_undefined_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::undefined_label",
        help = "labels are defined with `name:` on their own line.",
        labels = vec![LabeledSpan::at(span, "no such label")],
        "Reference to an undefined label",
    )
    .with_source_code(src.to_string())
}

pub fn asm_duplicate_label(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::duplicate_label",
        help = "each label may be defined only once per program.",
        labels = vec![LabeledSpan::at(span, "duplicate label")],
        "Duplicate label definition",
    )
    .with_source_code(src.to_string())
}

pub fn asm_branch_range(span: Span, src: &str, disp: i32) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::branch_range",
        help = "branch targets must lie within -128..=127 bytes of the next instruction; use JMP for longer hops.",
        labels = vec![LabeledSpan::at(span, "target too far")],
        "Branch displacement {disp} does not fit in a signed byte",
    )
    .with_source_code(src.to_string())
}

pub fn asm_too_large(span: Span, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::too_large",
        help = "programs load at $0600 and must fit below $10000.",
        labels = vec![LabeledSpan::at(span, "no room for this instruction")],
        "Program does not fit in memory",
    )
    .with_source_code(src.to_string())
}

pub fn asm_unexpected_token(span: Span, src: &str, expected: &str, found: TokenKind) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::unexpected_token",
        help = "check the operands for this instruction.",
        labels = vec![LabeledSpan::at(span, "unexpected token")],
        "Expected {expected}, found {found}",
    )
    .with_source_code(src.to_string())
}

pub fn asm_unexpected_eof(src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::unexpected_eof",
        help = "the last instruction may be missing its operand.",
        labels = vec![LabeledSpan::at_offset(src.len().saturating_sub(1), "input ends here")],
        "Unexpected end of file",
    )
    .with_source_code(src.to_string())
}
