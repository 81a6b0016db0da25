//! The semantic model: name resolution, invariant checking, and the frozen schema graph
// (c) Bakelite Contributors

mod resolve;
mod types;

pub use resolve::resolve;
pub use types::{
    CrcKind, EnumId, EnumMember, EnumType, Field, Framing, Message, PrimitiveType, Protocol,
    Schema, StructId, StructType, WireType,
};
