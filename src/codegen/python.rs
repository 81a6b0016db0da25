//! Generic host backend: allocating containers, natural Python types
// (c) Bakelite Contributors

use heck::{ToPascalCase, ToShoutySnakeCase, ToSnakeCase};

use crate::model::{PrimitiveType, Schema, WireType};

use super::writer::Writer;

fn struct_format(prim: PrimitiveType) -> &'static str {
    match prim {
        PrimitiveType::Int8 => "b",
        PrimitiveType::Uint8 => "B",
        PrimitiveType::Int16 => "h",
        PrimitiveType::Uint16 => "H",
        PrimitiveType::Int32 => "i",
        PrimitiveType::Uint32 => "I",
        PrimitiveType::Int64 => "q",
        PrimitiveType::Uint64 => "Q",
        PrimitiveType::Float32 => "f",
        PrimitiveType::Float64 => "d",
        PrimitiveType::Bool => "?",
    }
}

/// Generates the `gen` artifact for the generic host backend: one module defining a
/// dataclass per struct, an `IntEnum` per enum, and `pack_<name>`/`unpack_<name>`
/// functions plus message-id constants per protocol.
#[must_use]
pub fn generate(schema: &Schema) -> String {
    let mut w = Writer::new("    ");
    w.line("# Generated by bakelite. Do not edit by hand.");
    w.line("from __future__ import annotations");
    w.line("import struct");
    w.line("from dataclasses import dataclass, field");
    w.line("from enum import IntEnum");
    w.line("");

    for e in &schema.enums {
        w.line(format!("class {}(IntEnum):", e.name.to_pascal_case()));
        w.indent();
        for m in &e.members {
            w.line(format!("{} = {}", m.name.to_shouty_snake_case(), m.value));
        }
        w.dedent();
        w.line("");
    }

    for s in &schema.structs {
        w.line("@dataclass");
        w.line(format!("class {}:", s.name.to_pascal_case()));
        w.indent();
        if s.fields.is_empty() {
            w.line("pass");
        }
        for f in &s.fields {
            w.line(format!("{}: object", f.name.to_snake_case()));
        }
        w.dedent();
        w.line("");

        w.line(format!(
            "def pack_{}(value: {}) -> bytes:",
            s.name.to_snake_case(),
            s.name.to_pascal_case()
        ));
        w.indent();
        w.line("out = bytearray()");
        for f in &s.fields {
            emit_field_pack(&mut w, schema, &format!("value.{}", f.name.to_snake_case()), &f.ty);
        }
        w.line("return bytes(out)");
        w.dedent();
        w.line("");

        w.line(format!(
            "def unpack_{}(data: bytes, pos: int = 0) -> tuple[{}, int]:",
            s.name.to_snake_case(),
            s.name.to_pascal_case()
        ));
        w.indent();
        for f in &s.fields {
            emit_field_unpack(&mut w, schema, &f.name.to_snake_case(), &f.ty);
        }
        w.line(format!(
            "return {}({}), pos",
            s.name.to_pascal_case(),
            s.fields
                .iter()
                .map(|f| f.name.to_snake_case())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        w.dedent();
        w.line("");
    }

    for p in &schema.protocols {
        w.line(format!("class {}MessageId(IntEnum):", p.name.to_pascal_case()));
        w.indent();
        for m in &p.messages {
            w.line(format!("{} = {}", m.name.to_shouty_snake_case(), m.id));
        }
        w.dedent();
        w.line("");
    }

    for p in &schema.protocols {
        emit_protocol_dispatch(&mut w, schema, p);
    }

    w.finish()
}

/// Emits the message-id-aware wire contract for one protocol: `poll_<protocol>` peeks the
/// leading id byte, and each message gets `pack_<message>_message`/`decode_<message>_message`
/// wrapping the struct-level `pack_*`/`unpack_*` with the id byte from spec §4.3/§6.
fn emit_protocol_dispatch(w: &mut Writer, schema: &Schema, p: &crate::model::Protocol) {
    let proto_snake = p.name.to_snake_case();
    w.line(format!("def poll_{proto_snake}(data: bytes) -> int | None:"));
    w.indent();
    w.line("if not data:");
    w.indent();
    w.line("return None");
    w.dedent();
    w.line("return data[0]");
    w.dedent();
    w.line("");

    for m in &p.messages {
        let s = &schema.structs[m.struct_id.0];
        let struct_pascal = s.name.to_pascal_case();
        let struct_snake = s.name.to_snake_case();
        let msg_snake = m.name.to_snake_case();
        let id = m.id;

        w.line(format!("def pack_{msg_snake}_message(value: {struct_pascal}) -> bytes:"));
        w.indent();
        w.line(format!("return struct.pack('<B', {id}) + pack_{struct_snake}(value)"));
        w.dedent();
        w.line("");

        w.line(format!(
            "def decode_{msg_snake}_message(data: bytes, pos: int = 0) -> tuple[{struct_pascal}, int] | None:"
        ));
        w.indent();
        w.line("(_id,) = struct.unpack_from('<B', data, pos)");
        w.line(format!("if _id != {id}:"));
        w.indent();
        w.line("return None");
        w.dedent();
        w.line(format!("return unpack_{struct_snake}(data, pos + 1)"));
        w.dedent();
        w.line("");
    }
}

fn emit_field_pack(w: &mut Writer, schema: &Schema, expr: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(p) => {
            w.line(format!("out += struct.pack('<{}', {expr})", struct_format(*p)));
        }
        WireType::Enum(id) => {
            let underlying = schema.enums[id.0].underlying;
            w.line(format!("out += struct.pack('<{}', int({expr}))", struct_format(underlying)));
        }
        WireType::Struct(id) => {
            w.line(format!("out += pack_{}({expr})", schema.structs[id.0].name.to_snake_case()));
        }
        WireType::Bytes { .. } => {
            w.line(format!("out += struct.pack('<B', len({expr}))"));
            w.line(format!("out += bytes({expr})"));
        }
        WireType::StringT { capacity } => {
            w.line(format!(
                "out += {expr}.encode('utf-8')[: {} ] + b'\\x00'",
                capacity.saturating_sub(1)
            ));
        }
        WireType::Array { element, .. } => {
            w.line(format!("out += struct.pack('<B', len({expr}))"));
            w.line(format!("for _item in {expr}:"));
            w.indent();
            emit_field_pack(w, schema, "_item", element);
            w.dedent();
        }
    }
}

fn emit_field_unpack(w: &mut Writer, schema: &Schema, name: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(p) => {
            let fmt = struct_format(*p);
            let size = p.width();
            w.line(format!(
                "({name},) = struct.unpack_from('<{fmt}', data, pos); pos += {size}"
            ));
        }
        WireType::Enum(id) => {
            let underlying = schema.enums[id.0].underlying;
            let fmt = struct_format(underlying);
            let size = underlying.width();
            w.line(format!(
                "({name}_raw,) = struct.unpack_from('<{fmt}', data, pos); pos += {size}; {name} = {}({name}_raw)",
                schema.enums[id.0].name.to_pascal_case()
            ));
        }
        WireType::Struct(id) => {
            w.line(format!(
                "{name}, pos = unpack_{}(data, pos)",
                schema.structs[id.0].name.to_snake_case()
            ));
        }
        WireType::Bytes { .. } => {
            w.line("(_len,) = struct.unpack_from('<B', data, pos); pos += 1");
            w.line(format!("{name} = data[pos: pos + _len]; pos += _len"));
        }
        WireType::StringT { .. } => {
            w.line("_end = data.index(b'\\x00', pos)");
            w.line(format!("{name} = data[pos:_end].decode('utf-8'); pos = _end + 1"));
        }
        WireType::Array { element, .. } => {
            w.line("(_count,) = struct.unpack_from('<B', data, pos); pos += 1");
            w.line(format!("{name} = []"));
            w.line("for _ in range(_count):");
            w.indent();
            emit_field_unpack(w, schema, "_element", element);
            w.line(format!("{name}.append(_element)"));
            w.dedent();
        }
    }
}
