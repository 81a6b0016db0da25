//! Concrete syntax tree produced by the parser
// (c) Bakelite Contributors

use crate::error::Span;

/// An `@name(args?)` annotation, preserved verbatim with no semantic meaning to the core
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// The annotation's name
    pub name: String,
    /// Raw argument text, one entry per comma-separated argument, if any were given
    pub args: Vec<String>,
    /// Location of the `@`
    pub span: Span,
}

/// A type expression as written in the source, before name resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A bare name: a primitive keyword, or a reference to an enum/struct
    Named(String),
    /// `bytes[K]`, and optionally `bytes[K][N]` if `array_len` is set
    Bytes {
        /// inline capacity
        capacity: u32,
        /// outer array element count, for `bytes[K][N]`
        array_len: Option<u32>,
    },
    /// `string[K]`, and optionally `string[K][N]` if `array_len` is set
    StringT {
        /// inline capacity
        capacity: u32,
        /// outer array element count, for `string[K][N]`
        array_len: Option<u32>,
    },
    /// A named/primitive type with an outer array modifier, `T[N]`
    Array {
        /// the element type
        element: Box<TypeExpr>,
        /// maximum element count
        len: u32,
    },
}

/// A field declaration inside a struct body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// the field's name
    pub name: String,
    /// the field's declared type
    pub type_expr: TypeExpr,
    /// annotations attached to this field
    pub annotations: Vec<Annotation>,
    /// location of the field name
    pub span: Span,
}

/// A single `name = value` enum member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// the member's name
    pub name: String,
    /// the member's declared value
    pub value: i128,
    /// location of the member
    pub span: Span,
}

/// `enum Name : underlying { members }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDecl {
    /// the enum's name
    pub name: String,
    /// the name of the underlying primitive type
    pub underlying: String,
    /// the enum's members, in declaration order
    pub members: Vec<EnumMember>,
    /// annotations attached to the declaration
    pub annotations: Vec<Annotation>,
    /// location of the enum's name
    pub span: Span,
}

/// `struct Name { fields }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructDecl {
    /// the struct's name
    pub name: String,
    /// the struct's fields, in declaration order
    pub fields: Vec<FieldDecl>,
    /// annotations attached to the declaration
    pub annotations: Vec<Annotation>,
    /// location of the struct's name
    pub span: Span,
}

/// A `message Name = id` entry inside a protocol block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAssignment {
    /// the struct being assigned an id
    pub name: String,
    /// the assigned message id
    pub id: u32,
    /// location of the assignment
    pub span: Span,
}

/// `protocol Name { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolDecl {
    /// the protocol's name
    pub name: String,
    /// `max_length = N`
    pub max_length: Option<(u32, Span)>,
    /// `framing = COBS|None`
    pub framing: Option<(String, Span)>,
    /// `crc = None|CRC8|CRC16|CRC32`
    pub crc: Option<(String, Span)>,
    /// `message Name = id` entries
    pub messages: Vec<MessageAssignment>,
    /// location of the protocol's name
    pub span: Span,
}

/// A single top-level declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decl {
    /// an `enum` declaration
    Enum(EnumDecl),
    /// a `struct` declaration
    Struct(StructDecl),
    /// a `protocol` declaration
    Protocol(ProtocolDecl),
}

/// A whole parsed `.bakelite` file: an ordered sequence of declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    /// the declarations, in source order
    pub decls: Vec<Decl>,
}
