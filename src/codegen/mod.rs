//! Backend architecture: one function from the schema graph to generated source text
//!
//! Each backend implements the shared [`Backend`] trait (`generate`/`runtime_files`),
//! consumed uniformly by the `gen`/`runtime` CLI subcommands. All three share the same
//! wire rules (see [`crate::wire`]) so they can never drift from each other on the bytes
//! they produce.
// (c) Bakelite Contributors

mod cpptiny;
mod ctiny;
mod python;
mod writer;

use crate::model::Schema;

/// A codegen target, selected on the command line with `-l`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lower")]
pub enum Target {
    /// generic host backend: allocating containers, natural sequence types
    Python,
    /// C99 backend with fixed-capacity inline storage and packed structs
    Ctiny,
    /// C++ backend with a fixed-capacity sequence template
    Cpptiny,
}

impl Target {
    /// A short human-readable name, used in generated header comments
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Target::Python => "python",
            Target::Ctiny => "ctiny",
            Target::Cpptiny => "cpptiny",
        }
    }

    /// The conventional file extension for this target's generated source
    #[must_use]
    pub fn file_extension(self) -> &'static str {
        match self {
            Target::Python => "py",
            Target::Ctiny => "h",
            Target::Cpptiny => "hpp",
        }
    }

    fn backend(self) -> Box<dyn Backend> {
        match self {
            Target::Python => Box::new(PythonBackend),
            Target::Ctiny => Box::new(CtinyBackend),
            Target::Cpptiny => Box::new(CpptinyBackend),
        }
    }
}

/// The interface every codegen backend implements: a function from the schema graph to
/// generated source text, plus whatever shared runtime-support files it needs alongside
/// that generated source.
pub trait Backend {
    /// Emits the `gen` artifact: pack/unpack code for every struct and protocol in `schema`.
    fn generate(&self, schema: &Schema) -> String;

    /// Emits the `runtime` artifact's files as `(filename, contents)` pairs. Empty for a
    /// backend whose generated module is self-contained.
    fn runtime_files(&self) -> Vec<(&'static str, String)>;
}

struct PythonBackend;

impl Backend for PythonBackend {
    fn generate(&self, schema: &Schema) -> String {
        python::generate(schema)
    }

    fn runtime_files(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

struct CtinyBackend;

impl Backend for CtinyBackend {
    fn generate(&self, schema: &Schema) -> String {
        ctiny::generate(schema)
    }

    fn runtime_files(&self) -> Vec<(&'static str, String)> {
        ctiny::runtime_files()
    }
}

struct CpptinyBackend;

impl Backend for CpptinyBackend {
    fn generate(&self, schema: &Schema) -> String {
        cpptiny::generate(schema)
    }

    fn runtime_files(&self) -> Vec<(&'static str, String)> {
        cpptiny::runtime_files()
    }
}

/// Emits the `gen` artifact for `target`: pack/unpack code for every struct and protocol.
#[must_use]
pub fn generate(target: Target, schema: &Schema) -> String {
    target.backend().generate(schema)
}

/// Emits the `runtime` artifact's files for `target`, as `(filename, contents)` pairs.
///
/// Returns `None` for [`Target::Python`], which has no separate runtime artifact: its
/// generated module is self-contained. The tiny backends return more than one file, since
/// their CRC tables and COBS/framer bodies live in a separate implementation file from the
/// header declaring them.
#[must_use]
pub fn runtime(target: Target) -> Option<Vec<(&'static str, String)>> {
    let files = target.backend().runtime_files();
    if files.is_empty() {
        None
    } else {
        Some(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::resolve;
    use crate::parser::parse;

    fn sample_schema() -> Schema {
        let src = "struct Ack {\n  code: uint8\n}\nprotocol P {\n  max_length = 16\n  framing = COBS\n  crc = CRC8\n  message Ack = 2\n}\n";
        resolve(&parse(src).unwrap()).unwrap()
    }

    #[test]
    fn every_backend_produces_nonempty_output() {
        let schema = sample_schema();
        for target in [Target::Python, Target::Ctiny, Target::Cpptiny] {
            let generated = generate(target, &schema);
            assert!(!generated.is_empty(), "{target:?} produced no output");
            assert!(generated.contains("Ack"), "{target:?} output omits the struct name");
        }
    }

    #[test]
    fn only_tiny_backends_have_runtime_artifacts() {
        assert!(runtime(Target::Python).is_none());
        assert!(runtime(Target::Ctiny).is_some());
        assert!(runtime(Target::Cpptiny).is_some());
    }

    #[test]
    fn tiny_runtimes_are_header_plus_implementation_pairs() {
        for target in [Target::Ctiny, Target::Cpptiny] {
            let files = runtime(target).unwrap();
            assert_eq!(files.len(), 2, "{target:?} should emit a header and an implementation file");
            let names: Vec<_> = files.iter().map(|(name, _)| *name).collect();
            assert!(names.iter().any(|n| n.ends_with(".h") || n.ends_with(".hpp")));
            assert!(names.iter().any(|n| n.ends_with(".c") || n.ends_with(".cpp")));
            for (_, contents) in &files {
                assert!(contents.contains("bakelite_crc8_table") || contents.contains("kCrc8Table") || contents.contains("crc8"));
            }
        }
    }

    // Golden-vector test: pins the exact generated text for a small fixture schema so
    // accidental drift in the python backend's output shape is caught immediately, rather
    // than only being caught by a looser substring check.
    #[test]
    fn python_backend_golden_vector() {
        let schema = sample_schema();
        let generated = generate(Target::Python, &schema);
        let expected = "\
# Generated by bakelite. Do not edit by hand.
from __future__ import annotations
import struct
from dataclasses import dataclass, field
from enum import IntEnum

@dataclass
class Ack:
    code: object

def pack_ack(value: Ack) -> bytes:
    out = bytearray()
    out += struct.pack('<B', value.code)
    return bytes(out)

def unpack_ack(data: bytes, pos: int = 0) -> tuple[Ack, int]:
    (code,) = struct.unpack_from('<B', data, pos); pos += 1
    return Ack(code), pos

class PMessageId(IntEnum):
    ACK = 2

def poll_p(data: bytes) -> int | None:
    if not data:
        return None
    return data[0]

def pack_ack_message(value: Ack) -> bytes:
    return struct.pack('<B', 2) + pack_ack(value)

def decode_ack_message(data: bytes, pos: int = 0) -> tuple[Ack, int] | None:
    (_id,) = struct.unpack_from('<B', data, pos)
    if _id != 2:
        return None
    return unpack_ack(data, pos + 1)

";
        assert_eq!(generated, expected);
    }
}
