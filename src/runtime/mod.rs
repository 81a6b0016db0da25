//! The Rust reference runtime: COBS codec, CRC engine, byte-stream buffer and framer
//!
//! This is the deterministic, byte-exact wire engine described by the wire format. It is
//! also a usable Rust runtime in its own right (not one of the three codegen targets,
//! which emit source text for other languages).
// (c) Bakelite Contributors

pub mod buffer;
pub mod cobs;
pub mod crc;
pub mod framer;

pub use buffer::{Buffer, BufferError, BufferResult};
pub use framer::{FeedResult, Framer, SendResult};
