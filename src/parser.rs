//! Recursive-descent parser for the `.bakelite` IDL
// (c) Bakelite Contributors

use crate::ast::{
    Annotation, Decl, EnumDecl, EnumMember, FieldDecl, File, MessageAssignment, ProtocolDecl,
    StructDecl, TypeExpr,
};
use crate::error::{ParseError, ParseResult, Span};
use crate::lexer::{Token, TokenKind, tokenize};

/// Parses a complete `.bakelite` source file into a [`File`].
///
/// Parsing stops at the first error.
pub fn parse(source: &str) -> ParseResult<File> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_file()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect_ident(&mut self, what: &str) -> ParseResult<(String, Span)> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, span))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                span,
                expected: what.to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                span,
                expected: what.to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Span> {
        let (name, span) = self.expect_ident(&format!("'{keyword}'"))?;
        if name != keyword {
            return Err(ParseError::UnexpectedToken {
                span,
                expected: format!("'{keyword}'"),
                found: format!("identifier {name:?}"),
            });
        }
        Ok(span)
    }

    fn expect_int(&mut self, what: &str) -> ParseResult<(i128, Span)> {
        let span = self.span();
        match self.peek_kind().clone() {
            TokenKind::Int(v) => {
                self.advance();
                Ok((v, span))
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEof {
                span,
                expected: what.to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                span,
                expected: what.to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> ParseResult<Span> {
        let span = self.span();
        if self.peek_kind() == kind {
            self.advance();
            Ok(span)
        } else if matches!(self.peek_kind(), TokenKind::Eof) {
            Err(ParseError::UnexpectedEof {
                span,
                expected: what.to_string(),
            })
        } else {
            Err(ParseError::UnexpectedToken {
                span,
                expected: what.to_string(),
                found: self.peek_kind().to_string(),
            })
        }
    }

    fn parse_file(&mut self) -> ParseResult<File> {
        let mut decls = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek_kind(), TokenKind::Eof) {
            let annotations = self.parse_annotations()?;
            let (keyword, span) = self.expect_ident("a declaration ('enum', 'struct' or 'protocol')")?;
            let decl = match keyword.as_str() {
                "enum" => Decl::Enum(self.parse_enum(annotations, span)?),
                "struct" => Decl::Struct(self.parse_struct(annotations, span)?),
                "protocol" => Decl::Protocol(self.parse_protocol(span)?),
                other => {
                    return Err(ParseError::UnexpectedToken {
                        span,
                        expected: "'enum', 'struct' or 'protocol'".to_string(),
                        found: format!("identifier {other:?}"),
                    });
                }
            };
            decls.push(decl);
            self.skip_newlines();
        }
        Ok(File { decls })
    }

    fn parse_annotations(&mut self) -> ParseResult<Vec<Annotation>> {
        let mut out = Vec::new();
        loop {
            self.skip_newlines();
            if !matches!(self.peek_kind(), TokenKind::At) {
                break;
            }
            let span = self.span();
            self.advance(); // '@'
            let (name, _) = self.expect_ident("an annotation name")?;
            let mut args = Vec::new();
            if matches!(self.peek_kind(), TokenKind::LParen) {
                self.advance();
                while !matches!(self.peek_kind(), TokenKind::RParen) {
                    args.push(self.parse_annotation_arg()?);
                    if matches!(self.peek_kind(), TokenKind::Comma) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                self.expect(&TokenKind::RParen, "')'")?;
            }
            out.push(Annotation { name, args, span });
        }
        Ok(out)
    }

    fn parse_annotation_arg(&mut self) -> ParseResult<String> {
        match self.peek_kind().clone() {
            TokenKind::Ident(s) => {
                self.advance();
                Ok(s)
            }
            TokenKind::Int(v) => {
                self.advance();
                Ok(v.to_string())
            }
            other => {
                let span = self.span();
                Err(ParseError::UnexpectedToken {
                    span,
                    expected: "an annotation argument".to_string(),
                    found: other.to_string(),
                })
            }
        }
    }

    fn parse_enum(&mut self, annotations: Vec<Annotation>, _kw_span: Span) -> ParseResult<EnumDecl> {
        let (name, span) = self.expect_ident("an enum name")?;
        self.expect(&TokenKind::Colon, "':'")?;
        let (underlying, _) = self.expect_ident("the underlying primitive type")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut members = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            let (mname, mspan) = self.expect_ident("an enum member name")?;
            self.expect(&TokenKind::Equals, "'='")?;
            let (value, _) = self.expect_int("an integer value")?;
            members.push(EnumMember {
                name: mname,
                value,
                span: mspan,
            });
            self.skip_separator();
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(EnumDecl {
            name,
            underlying,
            members,
            annotations,
            span,
        })
    }

    /// Consumes one or more commas/newlines separating list items.
    fn skip_separator(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Comma | TokenKind::Newline => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    fn parse_struct(&mut self, annotations: Vec<Annotation>, _kw_span: Span) -> ParseResult<StructDecl> {
        let (name, span) = self.expect_ident("a struct name")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut fields = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            let field_annotations = self.parse_annotations()?;
            let (fname, fspan) = self.expect_ident("a field name")?;
            self.expect(&TokenKind::Colon, "':'")?;
            let type_expr = self.parse_type_expr()?;
            fields.push(FieldDecl {
                name: fname,
                type_expr,
                annotations: field_annotations,
                span: fspan,
            });
            self.skip_separator();
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(StructDecl {
            name,
            fields,
            annotations,
            span,
        })
    }

    fn parse_bracketed_len(&mut self) -> ParseResult<u32> {
        self.expect(&TokenKind::LBracket, "'['")?;
        let (v, span) = self.expect_int("a capacity")?;
        self.expect(&TokenKind::RBracket, "']'")?;
        u32::try_from(v).map_err(|_| ParseError::InvalidInteger {
            span,
            text: v.to_string(),
        })
    }

    fn parse_type_expr(&mut self) -> ParseResult<TypeExpr> {
        let (name, _) = self.expect_ident("a type name")?;
        if name == "bytes" || name == "string" {
            let capacity = self.parse_bracketed_len()?;
            let array_len = if matches!(self.peek_kind(), TokenKind::LBracket) {
                Some(self.parse_bracketed_len()?)
            } else {
                None
            };
            return Ok(if name == "bytes" {
                TypeExpr::Bytes { capacity, array_len }
            } else {
                TypeExpr::StringT { capacity, array_len }
            });
        }
        let base = TypeExpr::Named(name);
        if matches!(self.peek_kind(), TokenKind::LBracket) {
            let len = self.parse_bracketed_len()?;
            Ok(TypeExpr::Array {
                element: Box::new(base),
                len,
            })
        } else {
            Ok(base)
        }
    }

    fn parse_protocol(&mut self, span: Span) -> ParseResult<ProtocolDecl> {
        let (name, _) = self.expect_ident("a protocol name")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        self.skip_newlines();
        let mut decl = ProtocolDecl {
            name,
            max_length: None,
            framing: None,
            crc: None,
            messages: Vec::new(),
            span,
        };
        while !matches!(self.peek_kind(), TokenKind::RBrace) {
            let (key, kspan) = self.expect_ident("'max_length', 'framing', 'crc' or 'message'")?;
            match key.as_str() {
                "max_length" => {
                    self.expect(&TokenKind::Equals, "'='")?;
                    let (v, vspan) = self.expect_int("an integer")?;
                    let v = u32::try_from(v).map_err(|_| ParseError::InvalidInteger {
                        span: vspan,
                        text: v.to_string(),
                    })?;
                    decl.max_length = Some((v, kspan));
                }
                "framing" => {
                    self.expect(&TokenKind::Equals, "'='")?;
                    let (v, _) = self.expect_ident("'COBS' or 'None'")?;
                    decl.framing = Some((v, kspan));
                }
                "crc" => {
                    self.expect(&TokenKind::Equals, "'='")?;
                    let (v, _) = self.expect_ident("'None', 'CRC8', 'CRC16' or 'CRC32'")?;
                    decl.crc = Some((v, kspan));
                }
                "message" => {
                    let (mname, mspan) = self.expect_ident("a message struct name")?;
                    self.expect(&TokenKind::Equals, "'='")?;
                    let (v, vspan) = self.expect_int("a message id")?;
                    let id = u32::try_from(v).map_err(|_| ParseError::InvalidInteger {
                        span: vspan,
                        text: v.to_string(),
                    })?;
                    decl.messages.push(MessageAssignment {
                        name: mname,
                        id,
                        span: mspan,
                    });
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        span: kspan,
                        expected: "'max_length', 'framing', 'crc' or 'message'".to_string(),
                        found: format!("identifier {other:?}"),
                    });
                }
            }
            self.skip_separator();
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(decl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ack_struct() {
        let src = "struct Ack {\n  code: uint8\n}\n";
        let file = parse(src).unwrap();
        assert_eq!(file.decls.len(), 1);
        match &file.decls[0] {
            Decl::Struct(s) => {
                assert_eq!(s.name, "Ack");
                assert_eq!(s.fields.len(), 1);
                assert_eq!(s.fields[0].name, "code");
                assert_eq!(s.fields[0].type_expr, TypeExpr::Named("uint8".into()));
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn parses_enum_with_hex_values() {
        let src = "enum Status : uint8 {\n  Ok = 0x00,\n  Bad = 1,\n}\n";
        let file = parse(src).unwrap();
        match &file.decls[0] {
            Decl::Enum(e) => {
                assert_eq!(e.underlying, "uint8");
                assert_eq!(e.members.len(), 2);
                assert_eq!(e.members[0].value, 0);
                assert_eq!(e.members[1].value, 1);
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn parses_bytes_string_and_array_fields() {
        let src = "struct S {\n  a: bytes[16]\n  b: string[8]\n  c: uint8[4]\n  d: bytes[4][2]\n}\n";
        let file = parse(src).unwrap();
        match &file.decls[0] {
            Decl::Struct(s) => {
                assert_eq!(
                    s.fields[0].type_expr,
                    TypeExpr::Bytes {
                        capacity: 16,
                        array_len: None
                    }
                );
                assert_eq!(
                    s.fields[1].type_expr,
                    TypeExpr::StringT {
                        capacity: 8,
                        array_len: None
                    }
                );
                assert_eq!(
                    s.fields[2].type_expr,
                    TypeExpr::Array {
                        element: Box::new(TypeExpr::Named("uint8".into())),
                        len: 4
                    }
                );
                assert_eq!(
                    s.fields[3].type_expr,
                    TypeExpr::Bytes {
                        capacity: 4,
                        array_len: Some(2)
                    }
                );
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn parses_protocol_block() {
        let src = "protocol P {\n  max_length = 64\n  framing = COBS\n  crc = CRC8\n  message Ack = 2\n}\n";
        let file = parse(src).unwrap();
        match &file.decls[0] {
            Decl::Protocol(p) => {
                assert_eq!(p.max_length.unwrap().0, 64);
                assert_eq!(p.framing.as_ref().unwrap().0, "COBS");
                assert_eq!(p.crc.as_ref().unwrap().0, "CRC8");
                assert_eq!(p.messages[0].id, 2);
            }
            other => panic!("expected protocol, got {other:?}"),
        }
    }

    #[test]
    fn parses_annotations_with_args() {
        let src = "@wire(id=1)\nstruct S {\n  a: uint8\n}\n";
        let file = parse(src).unwrap();
        match &file.decls[0] {
            Decl::Struct(s) => {
                assert_eq!(s.annotations.len(), 1);
                assert_eq!(s.annotations[0].name, "wire");
                assert_eq!(s.annotations[0].args, vec!["id=1".to_string()]);
            }
            other => panic!("expected struct, got {other:?}"),
        }
    }

    #[test]
    fn reports_error_location_and_stops_at_first_error() {
        let src = "struct S {\n  a: \n}\n";
        let err = parse(src).unwrap_err();
        assert_eq!(err.span().line, 3);
    }
}
