//! Byte-preserving tokenizer for Go source.
//!
//! Every byte of the input belongs to exactly one token, so concatenating the
//! token texts reproduces the input. Comments, whitespace and newlines are
//! tokens too; the parser decides which ones matter.

use std::ops::Range;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword.
    Ident,
    /// Numeric literal.
    Number,
    /// Interpreted string literal (`"..."`).
    String,
    /// Raw string literal (`` `...` ``).
    RawString,
    /// Rune literal (`'x'`).
    Char,
    /// `// ...` up to (not including) the newline.
    LineComment,
    /// `/* ... */`.
    BlockComment,
    /// A single `\n`.
    Newline,
    /// Spaces, tabs and carriage returns.
    Whitespace,
    /// `...`
    Ellipsis,
    /// `<-`
    Arrow,
    /// Any other single punctuation character.
    Punct(char),
}

/// A token with its byte span and 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Token {
    /// Byte range of the token in the source.
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Token text.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// True for comments.
    pub fn is_comment(&self) -> bool {
        matches!(self.kind, TokenKind::LineComment | TokenKind::BlockComment)
    }

    /// True for tokens that carry no syntax (whitespace, not newlines).
    pub fn is_blank(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }

    /// True if this is the given punctuation character.
    pub fn is_punct(&self, c: char) -> bool {
        self.kind == TokenKind::Punct(c)
    }

    /// True if this is an identifier with the given text.
    pub fn is_ident(&self, source: &str, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(source) == text
    }
}

/// A tokenizer failure: message and 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: usize,
    pub message: String,
}

/// Tokenize Go source text.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < bytes.len() {
        let start = pos;
        let start_line = line;
        let c = bytes[pos];

        let kind = match c {
            b'\n' => {
                pos += 1;
                line += 1;
                TokenKind::Newline
            }
            b' ' | b'\t' | b'\r' => {
                while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b'\r') {
                    pos += 1;
                }
                TokenKind::Whitespace
            }
            b'/' if bytes.get(pos + 1) == Some(&b'/') => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                TokenKind::LineComment
            }
            b'/' if bytes.get(pos + 1) == Some(&b'*') => {
                pos += 2;
                loop {
                    if pos + 1 >= bytes.len() {
                        return Err(LexError {
                            line: start_line,
                            message: "comment not terminated".to_string(),
                        });
                    }
                    if bytes[pos] == b'*' && bytes[pos + 1] == b'/' {
                        pos += 2;
                        break;
                    }
                    if bytes[pos] == b'\n' {
                        line += 1;
                    }
                    pos += 1;
                }
                TokenKind::BlockComment
            }
            b'"' | b'\'' => {
                pos += 1;
                loop {
                    match bytes.get(pos) {
                        None | Some(b'\n') => {
                            return Err(LexError {
                                line: start_line,
                                message: "string literal not terminated".to_string(),
                            });
                        }
                        Some(b'\\') => pos += 2,
                        Some(&b) if b == c => {
                            pos += 1;
                            break;
                        }
                        Some(_) => pos += 1,
                    }
                }
                if c == b'"' {
                    TokenKind::String
                } else {
                    TokenKind::Char
                }
            }
            b'`' => {
                pos += 1;
                loop {
                    match bytes.get(pos) {
                        None => {
                            return Err(LexError {
                                line: start_line,
                                message: "raw string literal not terminated".to_string(),
                            });
                        }
                        Some(b'`') => {
                            pos += 1;
                            break;
                        }
                        Some(b'\n') => {
                            line += 1;
                            pos += 1;
                        }
                        Some(_) => pos += 1,
                    }
                }
                TokenKind::RawString
            }
            b'.' if bytes.get(pos + 1) == Some(&b'.') && bytes.get(pos + 2) == Some(&b'.') => {
                pos += 3;
                TokenKind::Ellipsis
            }
            b'<' if bytes.get(pos + 1) == Some(&b'-') => {
                pos += 2;
                TokenKind::Arrow
            }
            b'0'..=b'9' => {
                while pos < bytes.len()
                    && (bytes[pos].is_ascii_alphanumeric() || matches!(bytes[pos], b'.' | b'_'))
                {
                    pos += 1;
                }
                TokenKind::Number
            }
            _ if c == b'_' || c.is_ascii_alphabetic() || c >= 0x80 => {
                while pos < bytes.len() {
                    let b = bytes[pos];
                    if b == b'_' || b.is_ascii_alphanumeric() || b >= 0x80 {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                TokenKind::Ident
            }
            _ => {
                // Non-ASCII bytes are consumed by the identifier arm, so this
                // is always a single-byte character.
                pos += 1;
                TokenKind::Punct(c as char)
            }
        };

        // Escapes may have stepped past the end of the input.
        let end = pos.min(bytes.len());
        tokens.push(Token {
            kind,
            start,
            end,
            line: start_line,
        });
        pos = end;
    }

    Ok(tokens)
}
