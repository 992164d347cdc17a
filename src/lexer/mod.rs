use std::fmt;
use std::num::ParseIntError;

use miette::{Report, Result};

use crate::error;
use crate::opcode::Mnemonic;
use crate::symbol::Span;

mod cursor;

use cursor::Cursor;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    /// Numeric literal, already masked to 16 bits.
    Number(u16),
    /// Label name; the text is recovered through the span.
    Ident,
    Mnemonic(Mnemonic),
    Hash,
    Comma,
    Colon,
    LParen,
    RParen,
    IndexX,
    IndexY,
    Accumulator,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Number(_) => "numeric literal",
            TokenKind::Ident => "identifier",
            TokenKind::Mnemonic(_) => "mnemonic",
            TokenKind::Hash => "`#`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::IndexX => "index `X`",
            TokenKind::IndexY => "index `Y`",
            TokenKind::Accumulator => "`A`",
        };
        f.write_str(text)
    }
}

/// Token stream plus any non-fatal diagnostics raised while lexing.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub warnings: Vec<Report>,
}

/// Turns a source string into a flat token stream.
///
/// Whitespace and `;` comments disappear here; every surviving token
/// carries a byte span into `src` for diagnostics and label text.
pub fn tokenize(src: &str) -> Result<Lexed> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();
    let mut warnings = Vec::new();

    loop {
        cur.start_token();
        let Some(c) = cur.bump() else { break };
        let kind = match c {
            ' ' | '\t' | '\r' | '\n' => continue,
            ';' => {
                cur.take_while(|c| c != '\n');
                continue;
            }
            '#' => TokenKind::Hash,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '$' => {
                cur.take_while(|c| c.is_ascii_hexdigit());
                let span = cur.token_span();
                let digits = &src[span.offs() + 1..span.end()];
                if digits.is_empty() {
                    return Err(error::lex_unterminated_hex(span, src));
                }
                literal(u32::from_str_radix(digits, 16), span, src, &mut warnings)?
            }
            c if c.is_ascii_digit() => {
                cur.take_while(|c| c.is_ascii_digit());
                let span = cur.token_span();
                let digits = &src[span.as_range()];
                literal(u32::from_str_radix(digits, 10), span, src, &mut warnings)?
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                cur.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
                let text = &src[cur.token_span().as_range()];
                classify_word(text)
            }
            _ => return Err(error::lex_unknown(cur.token_span(), src)),
        };
        tokens.push(Token {
            kind,
            span: cur.token_span(),
        });
    }

    Ok(Lexed { tokens, warnings })
}

/// Values wider than an address are masked down with a warning; values
/// that do not fit in 32 bits at all are a hard error.
fn literal(
    parsed: Result<u32, ParseIntError>,
    span: Span,
    src: &str,
    warnings: &mut Vec<Report>,
) -> Result<TokenKind> {
    let val = parsed.map_err(|e| error::lex_bad_lit(span, src, e))?;
    if val > 0xFFFF {
        warnings.push(error::lex_truncated(span, src, val));
    }
    Ok(TokenKind::Number(val as u16))
}

fn classify_word(text: &str) -> TokenKind {
    // Single letters A/X/Y act as register designators, never as labels.
    if text.len() == 1 {
        match text {
            "A" | "a" => return TokenKind::Accumulator,
            "X" | "x" => return TokenKind::IndexX,
            "Y" | "y" => return TokenKind::IndexY,
            _ => {}
        }
    }
    match Mnemonic::parse(text) {
        Some(m) => TokenKind::Mnemonic(m),
        None => TokenKind::Ident,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_a_store_line() {
        assert_eq!(
            kinds("LDA #$01\nSTA $0200"),
            vec![
                TokenKind::Mnemonic(Mnemonic::Lda),
                TokenKind::Hash,
                TokenKind::Number(0x01),
                TokenKind::Mnemonic(Mnemonic::Sta),
                TokenKind::Number(0x0200),
            ]
        );
    }

    #[test]
    fn tokenizes_indexed_and_indirect_forms() {
        assert_eq!(
            kinds("LDA $FE,X\nSTA ($20),Y\nJMP ($0600)"),
            vec![
                TokenKind::Mnemonic(Mnemonic::Lda),
                TokenKind::Number(0xFE),
                TokenKind::Comma,
                TokenKind::IndexX,
                TokenKind::Mnemonic(Mnemonic::Sta),
                TokenKind::LParen,
                TokenKind::Number(0x20),
                TokenKind::RParen,
                TokenKind::Comma,
                TokenKind::IndexY,
                TokenKind::Mnemonic(Mnemonic::Jmp),
                TokenKind::LParen,
                TokenKind::Number(0x0600),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn decimal_literals_parse_base_ten() {
        assert_eq!(kinds("LDX #200"), vec![
            TokenKind::Mnemonic(Mnemonic::Ldx),
            TokenKind::Hash,
            TokenKind::Number(200),
        ]);
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        assert_eq!(kinds("lda #1"), vec![
            TokenKind::Mnemonic(Mnemonic::Lda),
            TokenKind::Hash,
            TokenKind::Number(1),
        ]);
    }

    #[test]
    fn labels_and_colons() {
        let lexed = tokenize("decrement:\nDEX").unwrap();
        assert_eq!(lexed.tokens[0].kind, TokenKind::Ident);
        assert_eq!(lexed.tokens[1].kind, TokenKind::Colon);
        assert_eq!(lexed.tokens[2].kind, TokenKind::Mnemonic(Mnemonic::Dex));
        // Span recovers the label text.
        assert_eq!(&"decrement:\nDEX"[lexed.tokens[0].span.as_range()], "decrement");
    }

    #[test]
    fn three_letter_identifier_prefix_is_not_a_mnemonic() {
        // "dec" is a mnemonic but "decrement" must stay an identifier.
        assert_eq!(kinds("decrement"), vec![TokenKind::Ident]);
    }

    #[test]
    fn accumulator_operand() {
        assert_eq!(kinds("ASL A"), vec![
            TokenKind::Mnemonic(Mnemonic::Asl),
            TokenKind::Accumulator,
        ]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(kinds("NOP ; increments nothing\nBRK"), vec![
            TokenKind::Mnemonic(Mnemonic::Nop),
            TokenKind::Mnemonic(Mnemonic::Brk),
        ]);
    }

    #[test]
    fn wide_literal_truncates_with_warning() {
        let lexed = tokenize("LDA $12345").unwrap();
        assert_eq!(lexed.tokens[1].kind, TokenKind::Number(0x2345));
        assert_eq!(lexed.warnings.len(), 1);
    }

    #[test]
    fn bare_dollar_is_an_error() {
        let err = tokenize("LDA $\n").unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "lex::unterminated_hex");
    }

    #[test]
    fn oversized_literal_is_an_error() {
        let err = tokenize("LDA 99999999999").unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "lex::bad_lit");
    }

    #[test]
    fn stray_punctuation_is_an_error() {
        let err = tokenize("LDA @1").unwrap_err();
        assert_eq!(err.code().unwrap().to_string(), "lex::unknown");
    }
}
