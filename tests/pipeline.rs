//! End-to-end tests: schema source text through to generated backend output
// (c) Bakelite Contributors

use std::io::Write as _;

use bakelite::codegen::{self, Target};
use bakelite::model::resolve;
use bakelite::parser::parse;
use rstest::rstest;

const SCHEMA: &str = r"
enum Code: uint8 {
    Ok = 0
    Error = 1
}

struct Ack {
    code: Code
    detail: string[16]
}

protocol Telemetry {
    max_length = 32
    framing = COBS
    crc = CRC8
    message Ack = 2
}
";

#[rstest]
#[case(Target::Python)]
#[case(Target::Ctiny)]
#[case(Target::Cpptiny)]
fn compiles_and_generates_for_every_target(#[case] target: Target) {
    let file = parse(SCHEMA).expect("schema parses");
    let schema = resolve(&file).expect("schema resolves");
    let generated = codegen::generate(target, &schema);
    assert!(generated.contains("Ack"));
    assert!(generated.contains("Code") || generated.contains("code"));
}

#[rstest]
#[case(Target::Ctiny)]
#[case(Target::Cpptiny)]
fn tiny_targets_emit_a_runtime_artifact(#[case] target: Target) {
    let files = codegen::runtime(target).expect("tiny backends have a runtime artifact");
    assert_eq!(files.len(), 2, "expected a header plus an implementation file");
    let (header_name, header) = &files[0];
    let (impl_name, impl_src) = &files[1];
    assert!(header_name.ends_with(".h") || header_name.ends_with(".hpp"));
    assert!(impl_name.ends_with(".c") || impl_name.ends_with(".cpp"));
    // the CRC tables and COBS bodies belong in the implementation file, not the header
    assert!(!header.contains("0x00, 0x07, 0x0e"), "CRC-8 table leaked into the header");
    assert!(impl_src.contains("0x00, 0x07, 0x0e"), "CRC-8 table missing from the implementation file");
}

#[test]
fn python_has_no_separate_runtime_artifact() {
    assert!(codegen::runtime(Target::Python).is_none());
}

// Golden-vector test: the exact generated text for a minimal fixture schema, so drift in
// the python backend's struct/enum/message-dispatch shape is caught immediately rather
// than by a substring check alone.
#[test]
fn python_backend_golden_vector_for_an_enum_field() {
    let src = "enum Code: uint8 {\n  Ok = 0\n  Err = 1\n}\nstruct Ping {\n  code: Code\n}\n";
    let file = parse(src).expect("schema parses");
    let schema = resolve(&file).expect("schema resolves");
    let generated = codegen::generate(Target::Python, &schema);
    let expected = "\
# Generated by bakelite. Do not edit by hand.
from __future__ import annotations
import struct
from dataclasses import dataclass, field
from enum import IntEnum

class Code(IntEnum):
    OK = 0
    ERR = 1

@dataclass
class Ping:
    code: object

def pack_ping(value: Ping) -> bytes:
    out = bytearray()
    out += struct.pack('<B', int(value.code))
    return bytes(out)

def unpack_ping(data: bytes, pos: int = 0) -> tuple[Ping, int]:
    (code_raw,) = struct.unpack_from('<B', data, pos); pos += 1; code = Code(code_raw)
    return Ping(code), pos

";
    assert_eq!(generated, expected);
}

#[test]
fn schema_file_on_disk_round_trips_through_the_full_pipeline() {
    let mut input = tempfile::NamedTempFile::new().expect("create temp schema file");
    write!(input, "{SCHEMA}").expect("write schema");

    let source = std::fs::read_to_string(input.path()).expect("read schema back");
    let file = parse(&source).expect("parses");
    let schema = resolve(&file).expect("resolves");
    assert_eq!(schema.structs.len(), 1);
    assert_eq!(schema.protocols.len(), 1);
    assert_eq!(schema.protocols[0].messages.len(), 1);
}

#[test]
fn rejects_a_schema_with_an_unresolved_reference() {
    let bad = "struct Ack {\n  code: NoSuchEnum\n}\n";
    let file = parse(bad).expect("parses syntactically");
    let err = resolve(&file).expect_err("an unresolved reference must fail semantic analysis");
    let message = err.to_string();
    assert!(message.contains("NoSuchEnum"), "unexpected error: {message}");
}
