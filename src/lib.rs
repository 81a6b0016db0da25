//! bakelite is a schema compiler for embedded communication protocols.
//!
//! A `.bakelite` schema describes enums, structs and protocol blocks; this crate parses
//! and semantically validates that schema, then emits byte-exact wire codec source for
//! one of three targets: a generic allocating host backend, and two fixed-capacity
//! embedded backends (C99 and C++).
//!
//! ## Pipeline
//!
//! 1. [`lexer`] tokenizes the source text.
//! 2. [`parser`] builds an [`ast::File`] from the token stream.
//! 3. [`model::resolve`] resolves references and computes wire sizes, producing a
//!    [`model::Schema`].
//! 4. [`codegen`] emits source text for the selected [`codegen::Target`].
//!
//! [`wire`] and [`runtime`] hold the crate's own reference implementation of the wire
//! format and framing layer, used both to validate the semantic model's size
//! computations and as the ground truth for the generated backends' golden-vector
//! tests.
// (c) Bakelite Contributors

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod ast;
pub(crate) mod cli;
pub use cli::cli as main;

pub mod codegen;
pub mod error;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod runtime;
pub(crate) mod util;
pub mod wire;
