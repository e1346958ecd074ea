//! Hand-written lexer for WHERE clauses.
//!
//! String literals support `\uXXXX` (four hex digits) and the usual
//! backslash escapes. Numeric literals keep their source lexeme so the
//! canonical rendering can reproduce them verbatim.

use crate::error::{ConstraintError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    /// `||`
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Number(String),
    Str(String),
    /// Bare word: a column reference or a keyword, decided by the parser.
    Ident(String),
}

/// A token plus the byte offset where it started.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let chars: Vec<char> = input.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let offset = byte_offset(input, i);
        let token = match c {
            '(' => {
                i += 1;
                Token::LParen
            }
            ')' => {
                i += 1;
                Token::RParen
            }
            ',' => {
                i += 1;
                Token::Comma
            }
            '+' => {
                i += 1;
                Token::Plus
            }
            '-' => {
                i += 1;
                Token::Minus
            }
            '*' => {
                i += 1;
                Token::Star
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '|' => {
                if chars.get(i + 1) == Some(&'|') {
                    i += 2;
                    Token::Concat
                } else {
                    return Err(ConstraintError::syntax(offset, "expected '||'"));
                }
            }
            '=' => {
                i += 1;
                Token::Eq
            }
            '!' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Ne
                } else {
                    return Err(ConstraintError::syntax(offset, "expected '!='"));
                }
            }
            '<' => match chars.get(i + 1) {
                Some('=') => {
                    i += 2;
                    Token::Le
                }
                Some('>') => {
                    i += 2;
                    Token::Ne
                }
                _ => {
                    i += 1;
                    Token::Lt
                }
            },
            '>' => {
                if chars.get(i + 1) == Some(&'=') {
                    i += 2;
                    Token::Ge
                } else {
                    i += 1;
                    Token::Gt
                }
            }
            '\'' => {
                let (s, next) = scan_string(input, &chars, i)?;
                i = next;
                Token::Str(s)
            }
            _ if c.is_ascii_digit() || (c == '.' && next_is_digit(&chars, i + 1)) => {
                let (s, next) = scan_number(&chars, i);
                i = next;
                Token::Number(s)
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                Token::Ident(chars[start..i].iter().collect())
            }
            _ => {
                return Err(ConstraintError::syntax(
                    offset,
                    format!("unexpected character '{c}'"),
                ));
            }
        };
        out.push(Spanned { token, offset });
    }
    Ok(out)
}

fn next_is_digit(chars: &[char], i: usize) -> bool {
    chars.get(i).is_some_and(|c| c.is_ascii_digit())
}

fn byte_offset(input: &str, char_index: usize) -> usize {
    input
        .char_indices()
        .nth(char_index)
        .map(|(b, _)| b)
        .unwrap_or(input.len())
}

/// Scans a quoted string literal starting at the opening quote. Returns
/// the decoded contents and the index one past the closing quote.
fn scan_string(input: &str, chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut s = String::new();
    let mut i = start + 1;
    loop {
        let Some(&c) = chars.get(i) else {
            return Err(ConstraintError::syntax(
                byte_offset(input, start),
                "unterminated string literal",
            ));
        };
        match c {
            '\'' => return Ok((s, i + 1)),
            '\\' => {
                let Some(&esc) = chars.get(i + 1) else {
                    return Err(ConstraintError::syntax(
                        byte_offset(input, i),
                        "dangling escape at end of string",
                    ));
                };
                match esc {
                    '\'' => s.push('\''),
                    'b' => s.push('\u{8}'),
                    'f' => s.push('\u{c}'),
                    'n' => s.push('\n'),
                    'r' => s.push('\r'),
                    't' => s.push('\t'),
                    '/' => s.push('/'),
                    '\\' => s.push('\\'),
                    'u' => {
                        let hex: String = chars.get(i + 2..i + 6).map(|w| w.iter().collect()).unwrap_or_default();
                        let code = if hex.len() == 4 {
                            u32::from_str_radix(&hex, 16).ok()
                        } else {
                            None
                        };
                        match code.and_then(char::from_u32) {
                            Some(decoded) => {
                                s.push(decoded);
                                i += 6;
                                continue;
                            }
                            None => {
                                return Err(ConstraintError::syntax(
                                    byte_offset(input, i),
                                    "\\u escape requires four hex digits",
                                ));
                            }
                        }
                    }
                    _ => {
                        return Err(ConstraintError::syntax(
                            byte_offset(input, i),
                            format!("unrecognized escape '\\{esc}'"),
                        ));
                    }
                }
                i += 2;
            }
            _ => {
                s.push(c);
                i += 1;
            }
        }
    }
}

/// Scans an unsigned numeric literal: digits with an optional fraction
/// and an optional exponent. Sign is handled by the parser.
fn scan_number(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    while next_is_digit(chars, i) {
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        while next_is_digit(chars, i) {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+') | Some('-')) {
            j += 1;
        }
        if next_is_digit(chars, j) {
            i = j;
            while next_is_digit(chars, i) {
                i += 1;
            }
        }
    }
    (chars[start..i].iter().collect(), i)
}
