//! Tokenizer for schema source text.

use super::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, possibly dotted (`db.VarChar`).
    Ident(String),
    /// String literal with escapes decoded.
    Str(String),
    Number(String),
    /// Text of a `///` comment.
    DocComment(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Equals,
    Question,
    At,
    AtAt,
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
}

pub struct Lexer;

impl Lexer {
    /// Splits source text into tokens.
    ///
    /// Plain `//` comments are dropped. Line breaks inside parentheses or
    /// brackets are not emitted, so attribute arguments may span lines. A
    /// leading byte order mark is skipped.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        let mut tokens = Vec::new();
        let mut chars = source.chars().peekable();
        let mut line = 1;
        let mut nesting = 0usize;

        while let Some(ch) = chars.next() {
            let kind = match ch {
                '\n' => {
                    line += 1;
                    if nesting > 0 {
                        continue;
                    }
                    TokenKind::Newline
                }
                c if c.is_whitespace() => continue,
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    let mut text = String::new();
                    while let Some(&next) = chars.peek() {
                        if next == '\n' {
                            break;
                        }
                        text.push(next);
                        chars.next();
                    }
                    match text.strip_prefix('/') {
                        Some(doc) => {
                            let doc = doc.strip_prefix(' ').unwrap_or(doc);
                            TokenKind::DocComment(doc.trim_end().to_string())
                        }
                        None => continue,
                    }
                }
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '(' => {
                    nesting += 1;
                    TokenKind::LParen
                }
                ')' => {
                    nesting = nesting.saturating_sub(1);
                    TokenKind::RParen
                }
                '[' => {
                    nesting += 1;
                    TokenKind::LBracket
                }
                ']' => {
                    nesting = nesting.saturating_sub(1);
                    TokenKind::RBracket
                }
                ',' => TokenKind::Comma,
                ':' => TokenKind::Colon,
                '=' => TokenKind::Equals,
                '?' => TokenKind::Question,
                '@' => {
                    if chars.peek() == Some(&'@') {
                        chars.next();
                        TokenKind::AtAt
                    } else {
                        TokenKind::At
                    }
                }
                '"' => TokenKind::Str(read_string(&mut chars, &mut line)?),
                c if c.is_ascii_digit()
                    || (c == '-' && chars.peek().is_some_and(char::is_ascii_digit)) =>
                {
                    let mut number = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '.' {
                            number.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    TokenKind::Number(number)
                }
                c if is_ident_start(c) => {
                    let mut ident = String::from(c);
                    while let Some(&next) = chars.peek() {
                        if is_ident_continue(next) {
                            ident.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    TokenKind::Ident(ident)
                }
                other => {
                    return Err(ParseError::Syntax {
                        line,
                        message: format!("unexpected character `{other}`"),
                    });
                }
            };

            // A newline token belongs to the line it terminates.
            let token_line = if kind == TokenKind::Newline {
                line - 1
            } else {
                line
            };
            tokens.push(Token {
                kind,
                line: token_line,
            });
        }

        Ok(tokens)
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: &mut usize,
) -> Result<String, ParseError> {
    let start = *line;
    let mut value = String::new();

    loop {
        let Some(ch) = chars.next() else {
            return Err(ParseError::Syntax {
                line: start,
                message: "unterminated string literal".to_string(),
            });
        };
        match ch {
            '"' => return Ok(value),
            '\n' => {
                return Err(ParseError::Syntax {
                    line: start,
                    message: "unterminated string literal".to_string(),
                });
            }
            '\\' => match chars.next() {
                Some('n') => value.push('\n'),
                Some('r') => value.push('\r'),
                Some('t') => value.push('\t'),
                Some('u') => value.push(read_unicode_escape(chars, start)?),
                Some('"') => value.push('"'),
                Some('\\') => value.push('\\'),
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                }
                None => {
                    return Err(ParseError::Syntax {
                        line: start,
                        message: "unterminated string literal".to_string(),
                    });
                }
            },
            other => value.push(other),
        }
    }
}

/// Reads the four hex digits of a `\uXXXX` escape.
fn read_unicode_escape(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: usize,
) -> Result<char, ParseError> {
    let digits: String = chars.by_ref().take(4).collect();
    Some(&digits)
        .filter(|d| d.len() == 4 && d.chars().all(|c| c.is_ascii_hexdigit()))
        .and_then(|d| u32::from_str_radix(d, 16).ok())
        .and_then(char::from_u32)
        .ok_or_else(|| ParseError::Syntax {
            line,
            message: format!("invalid unicode escape `\\u{digits}`"),
        })
}
