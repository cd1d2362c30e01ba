//! Lexer and operand parser for Go assembler instruction lines.
//!
//! The lexer splits one line into [`Token`]s, each carrying its [`Span`] so
//! that errors can point back at the offending operand. [`parse_instruction`]
//! then classifies the tokens into a mnemonic and typed [`Operand`]s.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{MapError, Span};
use crate::ir::{Immediate, Instruction, MemoryOperand, Operand};

/// A token produced by the lexer, borrowed from the source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// Token classification.
    pub kind: TokenKind,
    /// Source text of the token.
    pub text: &'src str,
    /// Source location.
    pub span: Span,
}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A bare word: the mnemonic or a register name.
    Ident,
    /// A `$`-prefixed immediate.
    Immediate,
    /// A word containing `(`: a memory reference.
    Address,
}

/// Tokenize one instruction line.
///
/// Unicode whitespace and commas separate tokens; empty tokens are dropped. Each
/// token is classified by its first byte (`$` → immediate) or by whether it
/// contains `(` (address).
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::with_capacity(source.len() / 3 + 1);
    let mut chars = source.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if is_separator(ch) {
            continue;
        }

        let mut end = start + ch.len_utf8();
        while let Some(&(i, c)) = chars.peek() {
            if is_separator(c) {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let text = &source[start..end];
        let kind = if ch == '$' {
            TokenKind::Immediate
        } else if text.contains('(') {
            TokenKind::Address
        } else {
            TokenKind::Ident
        };
        tokens.push(Token {
            kind,
            text,
            span: Span::new(start, end - start),
        });
    }

    tokens
}

/// Unicode whitespace or a comma.
fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ch == ','
}

/// Parse one instruction line into its mnemonic and typed operands.
///
/// # Errors
///
/// Returns [`MapError::EmptyInput`] when the line has no tokens, and
/// [`MapError::MalformedOperand`] when an immediate is empty or a memory
/// reference does not follow `[disp](base)[(index[*scale])]`.
pub fn parse_instruction(source: &str) -> Result<Instruction, MapError> {
    let tokens = tokenize(source);
    let mut iter = tokens.into_iter();
    let mnemonic = match iter.next() {
        Some(tok) => tok.text.to_string(),
        None => return Err(MapError::EmptyInput),
    };

    let operands = iter.map(parse_operand).collect::<Result<Vec<_>, _>>()?;
    Ok(Instruction { mnemonic, operands })
}

fn parse_operand(tok: Token<'_>) -> Result<Operand, MapError> {
    match tok.kind {
        TokenKind::Ident => Ok(Operand::Register(tok.text.to_string())),
        TokenKind::Immediate => {
            let text = &tok.text[1..];
            if text.is_empty() {
                return Err(malformed(&tok, "missing value after '$'"));
            }
            Ok(Operand::Immediate(Immediate {
                text: text.to_string(),
                value: parse_integer(text),
            }))
        }
        TokenKind::Address => parse_address(&tok).map(Operand::Memory),
    }
}

/// Parse `[disp](base)[(index[*scale])]`; the whole token must match.
fn parse_address(tok: &Token<'_>) -> Result<MemoryOperand, MapError> {
    let text = tok.text;
    let open = text.find('(').unwrap_or(text.len());

    let disp_text = &text[..open];
    let disp = if disp_text.is_empty() {
        0
    } else {
        parse_integer(disp_text)
            .and_then(|v| i64::try_from(v).ok())
            .ok_or_else(|| malformed(tok, "displacement is not an integer"))?
    };

    let bytes = text.as_bytes();
    let mut pos = open;
    let base = parse_group(bytes, &mut pos).ok_or_else(|| malformed(tok, "expected (base)"))?;

    let mut mem = MemoryOperand {
        disp,
        ..MemoryOperand::new(base.0)
    };
    if base.1.is_some() {
        return Err(malformed(tok, "base register cannot be scaled"));
    }

    if pos < bytes.len() {
        let (index, scale) =
            parse_group(bytes, &mut pos).ok_or_else(|| malformed(tok, "expected (index)"))?;
        mem.index = Some(index);
        mem.scale = scale.unwrap_or(1);
    }

    if pos != bytes.len() {
        return Err(malformed(tok, "unexpected text after address"));
    }
    Ok(mem)
}

/// Parse one `(reg)` or `(reg*scale)` group at `pos`, advancing past it.
fn parse_group(bytes: &[u8], pos: &mut usize) -> Option<(String, Option<u8>)> {
    let len = bytes.len();
    if *pos >= len || bytes[*pos] != b'(' {
        return None;
    }
    let start = *pos + 1;
    let mut end = start;
    while end < len && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    if end == start || end >= len {
        return None;
    }

    let mut scale = None;
    let mut close = end;
    if bytes[end] == b'*' {
        let digit = *bytes.get(end + 1)?;
        if !matches!(digit, b'1' | b'2' | b'4' | b'8') {
            return None;
        }
        scale = Some(digit - b'0');
        close = end + 2;
    }
    if bytes.get(close) != Some(&b')') {
        return None;
    }

    // Group contents are ASCII alphanumerics, so this cannot fail.
    let reg = core::str::from_utf8(&bytes[start..end]).ok()?.to_string();
    *pos = close + 1;
    Some((reg, scale))
}

fn malformed(tok: &Token<'_>, detail: &str) -> MapError {
    MapError::MalformedOperand {
        token: tok.text.to_string(),
        detail: detail.to_string(),
        span: tok.span,
    }
}

/// Parse an integer literal with automatic radix detection.
///
/// Accepts an optional sign, then `0x`/`0X` (hex), `0b`/`0B` (binary),
/// `0o`/`0O` or a leading `0` (octal), or plain decimal. `_` may separate
/// digits. Returns `None` on any other text or on overflow.
pub fn parse_integer(text: &str) -> Option<i128> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let bytes = body.as_bytes();
    let (radix, digits) = if bytes.len() > 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => (16, &body[2..]),
            b'b' | b'B' => (2, &body[2..]),
            b'o' | b'O' => (8, &body[2..]),
            _ => (8, &body[1..]),
        }
    } else if bytes.len() == 2 && bytes[0] == b'0' && bytes[1].is_ascii_digit() {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return None;
    }

    let mut value: i128 = 0;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let d = ch.to_digit(radix)?;
        value = value
            .checked_mul(i128::from(radix))?
            .checked_add(i128::from(d))?;
    }
    Some(if negative { -value } else { value })
}
