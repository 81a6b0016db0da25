//! The frozen, typed schema graph produced by [`super::resolve::resolve`]
// (c) Bakelite Contributors

use crate::error::Span;

/// One of the eleven fixed-width primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PrimitiveType {
    /// 8-bit signed
    Int8,
    /// 16-bit signed, little-endian
    Int16,
    /// 32-bit signed, little-endian
    Int32,
    /// 64-bit signed, little-endian
    Int64,
    /// 8-bit unsigned
    Uint8,
    /// 16-bit unsigned, little-endian
    Uint16,
    /// 32-bit unsigned, little-endian
    Uint32,
    /// 64-bit unsigned, little-endian
    Uint64,
    /// 32-bit IEEE-754, little-endian
    Float32,
    /// 64-bit IEEE-754, little-endian
    Float64,
    /// one byte, `0x01` / `0x00`
    Bool,
}

impl PrimitiveType {
    /// Looks up a primitive by its `.bakelite` keyword spelling
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "bool" => Self::Bool,
            _ => return None,
        })
    }

    /// Is this an integer type (as opposed to a float or bool)? Only integer types may
    /// underlie an enum.
    #[must_use]
    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Float32 | Self::Float64 | Self::Bool)
    }

    /// Is this a signed integer type?
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Fixed wire width in bytes
    #[must_use]
    pub fn width(self) -> u32 {
        match self {
            Self::Int8 | Self::Uint8 | Self::Bool => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
        }
    }

    /// Inclusive range of values representable by this type, as `i128` so it can hold
    /// `u64::MAX`
    #[must_use]
    pub fn range(self) -> (i128, i128) {
        match self {
            Self::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
            Self::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            Self::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            Self::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            Self::Uint8 => (0, i128::from(u8::MAX)),
            Self::Uint16 => (0, i128::from(u16::MAX)),
            Self::Uint32 => (0, i128::from(u32::MAX)),
            Self::Uint64 => (0, i128::from(u64::MAX)),
            Self::Float32 | Self::Float64 | Self::Bool => (0, 1),
        }
    }
}

/// An index into [`Schema::enums`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumId(pub usize);

/// An index into [`Schema::structs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructId(pub usize);

/// A resolved field or element type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireType {
    /// a fixed-width primitive
    Primitive(PrimitiveType),
    /// a reference to a declared enum
    Enum(EnumId),
    /// a reference to a declared struct
    Struct(StructId),
    /// `bytes[N]`: length-prefixed raw bytes
    Bytes {
        /// maximum byte length
        capacity: u32,
    },
    /// `string[N]`: null-terminated, capacity includes the terminator
    StringT {
        /// buffer capacity including the null terminator
        capacity: u32,
    },
    /// a length-prefixed outer array of up to `len` elements
    Array {
        /// the element type
        element: Box<WireType>,
        /// maximum element count
        len: u32,
    },
}

/// One resolved `(name, value)` member of an enum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// the member's name
    pub name: String,
    /// the member's value
    pub value: i128,
}

/// A resolved enum declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// the enum's name
    pub name: String,
    /// the underlying primitive integer type
    pub underlying: PrimitiveType,
    /// members in declaration order
    pub members: Vec<EnumMember>,
    /// location of the declaration
    pub span: Span,
}

/// A resolved field of a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// the field's name
    pub name: String,
    /// the field's resolved type
    pub ty: WireType,
    /// location of the field
    pub span: Span,
}

/// A resolved struct declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructType {
    /// the struct's name
    pub name: String,
    /// fields in declaration order
    pub fields: Vec<Field>,
    /// location of the declaration
    pub span: Span,
    /// maximum possible encoded size in bytes, excluding the leading message-id byte
    pub max_size: u32,
}

/// The framing strategy selected by a protocol block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum Framing {
    /// Consistent Overhead Byte Stuffing
    #[default]
    Cobs,
    /// no framing at all
    None,
}

impl Framing {
    /// Parses a `framing = ...` value, case-insensitively, falling back to the default
    /// (COBS) for an unrecognised spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "none" => Self::None,
            _ => Self::Cobs,
        }
    }
}

/// The CRC trailer selected by a protocol block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
pub enum CrcKind {
    /// no CRC trailer
    #[default]
    None,
    /// CRC-8, polynomial 0x107
    Crc8,
    /// CRC-16/ARC, polynomial 0x18005
    Crc16,
    /// CRC-32/IEEE 802.3, polynomial 0x104C11DB7
    Crc32,
}

impl CrcKind {
    /// Parses a `crc = ...` value, case-insensitively, falling back to the default
    /// (no CRC) for an unrecognised spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "CRC8" => Self::Crc8,
            "CRC16" => Self::Crc16,
            "CRC32" => Self::Crc32,
            _ => Self::None,
        }
    }

    /// Trailer width in bytes
    #[must_use]
    pub fn width(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Crc8 => 1,
            Self::Crc16 => 2,
            Self::Crc32 => 4,
        }
    }
}

/// One `message Name = id` assignment, resolved to a struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// the assigned wire id, in `1..=255`
    pub id: u8,
    /// the struct carrying this message's payload
    pub struct_id: StructId,
    /// the struct's name, cached for diagnostics and codegen
    pub name: String,
    /// location of the assignment
    pub span: Span,
}

/// A resolved `protocol` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    /// the protocol's name
    pub name: String,
    /// maximum framed payload length (before CRC and framing overhead)
    pub max_length: u32,
    /// selected framing strategy
    pub framing: Framing,
    /// selected CRC trailer
    pub crc: CrcKind,
    /// message-id assignments, in declaration order
    pub messages: Vec<Message>,
    /// location of the declaration
    pub span: Span,
}

/// The complete, validated schema produced from one `.bakelite` source file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// all declared enums, in declaration order
    pub enums: Vec<EnumType>,
    /// all declared structs, in declaration order
    pub structs: Vec<StructType>,
    /// all declared protocol blocks, in declaration order
    pub protocols: Vec<Protocol>,
}

impl Schema {
    /// The maximum encoded size of a resolved type, in bytes
    #[must_use]
    pub fn wire_type_max_size(&self, ty: &WireType) -> u32 {
        match ty {
            WireType::Primitive(p) => p.width(),
            WireType::Enum(id) => self.enums[id.0].underlying.width(),
            WireType::Struct(id) => self.structs[id.0].max_size,
            WireType::Bytes { capacity } => 1 + capacity,
            WireType::StringT { capacity } => *capacity,
            WireType::Array { element, len } => 1 + len * self.wire_type_max_size(element),
        }
    }
}
