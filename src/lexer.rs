//! Tokenizer for the `.bakelite` IDL
// (c) Bakelite Contributors

use crate::error::{ParseError, ParseResult, Span};

/// A single lexical token, with the source position at which it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token's kind and payload
    pub kind: TokenKind,
    /// Where the token starts in the source
    pub span: Span,
}

/// The kinds of token the lexer produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// An identifier or keyword
    Ident(String),
    /// A decimal or `0x`-prefixed hexadecimal integer literal
    Int(i128),
    /// `:`
    Colon,
    /// `=`
    Equals,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `@`
    At,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// A structural newline
    Newline,
    /// End of file
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier {s:?}"),
            TokenKind::Int(v) => write!(f, "integer {v}"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Equals => write!(f, "'='"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Newline => write!(f, "newline"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// Tokenizes an entire `.bakelite` source file.
///
/// Comments (`# ... \n`) are discarded. Newlines are preserved as structural tokens;
/// all other whitespace is discarded.
pub fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    source: &'a str,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            source,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn run(mut self) -> ParseResult<Vec<Token>> {
        while let Some(c) = self.peek() {
            let span = self.span();
            match c {
                '#' => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                '\n' => {
                    self.bump();
                    self.tokens.push(Token {
                        kind: TokenKind::Newline,
                        span,
                    });
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                ':' => self.single(TokenKind::Colon, span),
                '=' => self.single(TokenKind::Equals, span),
                '{' => self.single(TokenKind::LBrace, span),
                '}' => self.single(TokenKind::RBrace, span),
                '[' => self.single(TokenKind::LBracket, span),
                ']' => self.single(TokenKind::RBracket, span),
                '@' => self.single(TokenKind::At, span),
                '(' => self.single(TokenKind::LParen, span),
                ')' => self.single(TokenKind::RParen, span),
                ',' => self.single(TokenKind::Comma, span),
                c if c.is_ascii_digit() => self.number(span)?,
                c if is_ident_start(c) => self.ident(span),
                other => {
                    self.bump();
                    return Err(ParseError::UnexpectedChar { span, found: other });
                }
            }
        }
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            span: self.span(),
        });
        Ok(self.tokens)
    }

    fn single(&mut self, kind: TokenKind, span: Span) {
        self.bump();
        self.tokens.push(Token { kind, span });
    }

    fn ident(&mut self, span: Span) {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        let mut end = start;
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                end = self.bump_index();
            } else {
                break;
            }
        }
        let text = self.source[start..end].to_string();
        self.tokens.push(Token {
            kind: TokenKind::Ident(text),
            span,
        });
    }

    /// Bumps a character and returns the byte offset just past it
    fn bump_index(&mut self) -> usize {
        let (i, c) = self.chars.next().expect("peeked Some");
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        i + c.len_utf8()
    }

    fn number(&mut self, span: Span) -> ParseResult<()> {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap_or(self.source.len());
        let mut end = start;

        // hex literal?
        let is_hex = {
            let mut clone = self.chars.clone();
            matches!(clone.next(), Some((_, '0')))
                && matches!(clone.next(), Some((_, 'x' | 'X')))
        };

        if is_hex {
            end = self.bump_index(); // '0'
            end = self.bump_index(); // 'x'
            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    end = self.bump_index();
                } else {
                    break;
                }
            }
            let text = &self.source[start..end];
            let digits = &text[2..];
            let value = i128::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidInteger {
                span,
                text: text.to_string(),
            })?;
            self.tokens.push(Token {
                kind: TokenKind::Int(value),
                span,
            });
            return Ok(());
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                end = self.bump_index();
            } else {
                break;
            }
        }
        let text = &self.source[start..end];
        let value: i128 = text.parse().map_err(|_| ParseError::InvalidInteger {
            span,
            text: text.to_string(),
        })?;
        self.tokens.push(Token {
            kind: TokenKind::Int(value),
            span,
        });
        Ok(())
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_struct_skeleton() {
        let src = "struct Ack {\n  code: uint8\n}\n";
        let kinds = kinds(src);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident("struct".into()),
                TokenKind::Ident("Ack".into()),
                TokenKind::LBrace,
                TokenKind::Newline,
                TokenKind::Ident("code".into()),
                TokenKind::Colon,
                TokenKind::Ident("uint8".into()),
                TokenKind::Newline,
                TokenKind::RBrace,
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_hex_and_decimal_integers() {
        let kinds = kinds("0x2a 42");
        assert_eq!(
            kinds,
            vec![TokenKind::Int(42), TokenKind::Int(42), TokenKind::Eof]
        );
    }

    #[test]
    fn strips_comments() {
        let kinds = kinds("# a comment\nstruct # trailing\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Newline,
                TokenKind::Ident("struct".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("struct $").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedChar { found: '$', .. }));
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = tokenize("a\nb").unwrap();
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[2].span, Span::new(2, 1));
    }
}
