//! C++ tiny backend: fixed-capacity sequence template, method-template pack/unpack
// (c) Bakelite Contributors

use heck::{ToPascalCase, ToSnakeCase};

use crate::model::{PrimitiveType, Protocol, Schema, WireType};
use crate::runtime::crc::{crc16_table, crc32_table, crc8_table};

use super::writer::Writer;

fn cpp_type(prim: PrimitiveType) -> &'static str {
    match prim {
        PrimitiveType::Int8 => "int8_t",
        PrimitiveType::Uint8 => "uint8_t",
        PrimitiveType::Int16 => "int16_t",
        PrimitiveType::Uint16 => "uint16_t",
        PrimitiveType::Int32 => "int32_t",
        PrimitiveType::Uint32 => "uint32_t",
        PrimitiveType::Int64 => "int64_t",
        PrimitiveType::Uint64 => "uint64_t",
        PrimitiveType::Float32 => "float",
        PrimitiveType::Float64 => "double",
        PrimitiveType::Bool => "bool",
    }
}

fn field_cpp_type(schema: &Schema, ty: &WireType) -> String {
    match ty {
        WireType::Primitive(p) => cpp_type(*p).to_string(),
        WireType::Enum(id) => schema.enums[id.0].name.to_pascal_case(),
        WireType::Struct(id) => schema.structs[id.0].name.to_pascal_case(),
        WireType::Bytes { capacity } => format!("bakelite::Bytes<{capacity}>"),
        WireType::StringT { capacity } => format!("bakelite::String<{capacity}>"),
        WireType::Array { element, len } => {
            format!("bakelite::Sequence<{}, {len}>", field_cpp_type(schema, element))
        }
    }
}

/// Generates the `gen` artifact: one header with a `struct` per message type (using
/// `bakelite::Sequence`/`Bytes`/`String` for variable-length fields), `pack`/`unpack`
/// method templates, and per-protocol message-id dispatch (`pack_<message>_message`/
/// `decode_<message>_message`/`poll_<protocol>`) plus zero-copy overlay accessors over a
/// [`bakelite::Framer`].
#[must_use]
pub fn generate(schema: &Schema) -> String {
    let mut w = Writer::new("  ");
    w.line("// Generated by bakelite. Do not edit by hand.");
    w.line("#pragma once");
    w.line("#include <cstdint>");
    w.line("#include \"bakelite_runtime.hpp\"");
    w.line("");
    w.line("namespace bakelite_generated {");
    w.line("");

    for e in &schema.enums {
        w.line(format!("enum class {} : {} {{", e.name.to_pascal_case(), cpp_type(e.underlying)));
        w.indent();
        for m in &e.members {
            w.line(format!("{} = {},", m.name.to_pascal_case(), m.value));
        }
        w.dedent();
        w.line("};");
        w.line("");
    }

    for s in &schema.structs {
        let name = s.name.to_pascal_case();
        w.line(format!("struct {name} {{"));
        w.indent();
        for f in &s.fields {
            w.line(format!("{} {};", field_cpp_type(schema, &f.ty), f.name.to_snake_case()));
        }
        w.line("");
        w.line("template <typename Stream>");
        w.line("bakelite::Status pack(Stream &out) const {");
        w.indent();
        for f in &s.fields {
            emit_pack(&mut w, &f.name.to_snake_case(), &f.ty);
        }
        w.line("return bakelite::Status::Ok;");
        w.dedent();
        w.line("}");
        w.line("");
        w.line("template <typename Stream>");
        w.line("bakelite::Status unpack(Stream &in) {");
        w.indent();
        for f in &s.fields {
            emit_unpack(&mut w, &f.name.to_snake_case(), &f.ty);
        }
        w.line("return bakelite::Status::Ok;");
        w.dedent();
        w.line("}");
        w.dedent();
        w.line("};");
        w.line("");
    }

    for p in &schema.protocols {
        w.line(format!("enum class {}MessageId : uint8_t {{", p.name.to_pascal_case()));
        w.indent();
        for m in &p.messages {
            w.line(format!("{} = {},", m.name.to_pascal_case(), m.id));
        }
        w.dedent();
        w.line("};");
        w.line("");
    }

    for p in &schema.protocols {
        emit_protocol_dispatch(&mut w, schema, p);
    }

    w.line("} // namespace bakelite_generated");
    w.finish()
}

fn emit_pack(w: &mut Writer, field: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(_) | WireType::Enum(_) => {
            w.line(format!("BAKELITE_TRY(out.write_raw(&{field}, sizeof({field})));"));
        }
        WireType::Struct(_) | WireType::Bytes { .. } | WireType::StringT { .. } | WireType::Array { .. } => {
            w.line(format!("BAKELITE_TRY({field}.pack(out));"));
        }
    }
}

fn emit_unpack(w: &mut Writer, field: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(_) | WireType::Enum(_) => {
            w.line(format!("BAKELITE_TRY(in.read_raw(&{field}, sizeof({field})));"));
        }
        WireType::Struct(_) | WireType::Bytes { .. } | WireType::StringT { .. } | WireType::Array { .. } => {
            w.line(format!("BAKELITE_TRY({field}.unpack(in));"));
        }
    }
}

/// Emits one protocol's message-id wire contract: `poll_<protocol>` peeks the leading id
/// byte of a raw byte span, each message gets `pack_<message>_message`/
/// `decode_<message>_message` templates wrapping the struct's own `pack`/`unpack`, and a
/// zero-copy overlay pair (`message_<message>`/`send_<message>`) casts directly into a
/// [`bakelite::Framer`]'s payload area.
fn emit_protocol_dispatch(w: &mut Writer, schema: &Schema, p: &Protocol) {
    let proto_snake = p.name.to_snake_case();
    let proto_pascal = p.name.to_pascal_case();

    w.line(format!(
        "inline int {proto_snake}_poll(const uint8_t *data, size_t len) {{"
    ));
    w.indent();
    w.line("if (len == 0) return -1;");
    w.line("return data[0];");
    w.dedent();
    w.line("}");
    w.line("");

    for m in &p.messages {
        let s = &schema.structs[m.struct_id.0];
        let struct_name = s.name.to_pascal_case();
        let msg_snake = m.name.to_snake_case();
        let msg_pascal = m.name.to_pascal_case();
        let id_expr = format!("static_cast<uint8_t>({proto_pascal}MessageId::{msg_pascal})");

        w.line("template <typename Stream>");
        w.line(format!(
            "bakelite::Status pack_{msg_snake}_message(const {struct_name} &value, Stream &out) {{"
        ));
        w.indent();
        w.line(format!("uint8_t id = {id_expr};"));
        w.line("BAKELITE_TRY(out.write_raw(&id, 1));");
        w.line("return value.pack(out);");
        w.dedent();
        w.line("}");
        w.line("");

        w.line("template <typename Stream>");
        w.line(format!(
            "bakelite::Status decode_{msg_snake}_message({struct_name} &value, Stream &in) {{"
        ));
        w.indent();
        w.line("uint8_t id;");
        w.line("BAKELITE_TRY(in.read_raw(&id, 1));");
        w.line(format!("if (id != {id_expr}) return bakelite::Status::ErrWrongMessage;"));
        w.line("return value.unpack(in);");
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "inline {struct_name} *message_{msg_snake}(bakelite::Framer &f) {{"
        ));
        w.indent();
        w.line(format!(
            "return reinterpret_cast<{struct_name} *>(f.payload_ptr() + 1);"
        ));
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "inline bool send_{msg_snake}(bakelite::Framer &f, size_t *out_len) {{"
        ));
        w.indent();
        w.line(format!("f.payload_ptr()[0] = {id_expr};"));
        w.line(format!("return f.send(1 + sizeof({struct_name}), out_len);"));
        w.dedent();
        w.line("}");
        w.line("");
    }
}

fn emit_crc_table_u8(w: &mut Writer, name: &str, table: &[u8; 256]) {
    w.line(format!("const uint8_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(16) {
        let row = chunk.iter().map(|b| format!("0x{b:02x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

fn emit_crc_table_u16(w: &mut Writer, name: &str, table: &[u16; 256]) {
    w.line(format!("const uint16_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(8) {
        let row = chunk.iter().map(|v| format!("0x{v:04x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

fn emit_crc_table_u32(w: &mut Writer, name: &str, table: &[u32; 256]) {
    w.line(format!("const uint32_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(4) {
        let row = chunk.iter().map(|v| format!("0x{v:08x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

/// Generates the `runtime` artifact: a header with the `bakelite::Bytes`/`String`/
/// `Sequence` fixed-capacity templates (necessarily header-only) plus the declarations of
/// `crc8`/`crc16`/`crc32`, COBS, and [`bakelite::Framer`]; and a companion implementation
/// file with their bodies (table-driven CRC, in-place COBS, the framer state machine),
/// since none of those need to be templates.
#[must_use]
pub fn runtime_files() -> Vec<(&'static str, String)> {
    vec![
        ("bakelite_runtime.hpp", runtime_header()),
        ("bakelite_runtime.cpp", runtime_impl()),
    ]
}

fn runtime_header() -> String {
    let mut w = Writer::new("  ");
    w.line("// Generated by bakelite. Do not edit by hand.");
    w.line("#pragma once");
    w.line("#include <cstdint>");
    w.line("#include <cstddef>");
    w.line("#include <cstring>");
    w.line("");
    w.line("namespace bakelite {");
    w.line("");
    w.line("enum class Status { Ok, ErrWrite, ErrRead, ErrSeek, ErrCapacity, ErrWrongMessage };");
    w.line("");
    w.line("#define BAKELITE_TRY(expr) do { bakelite::Status _s = (expr); if (_s != bakelite::Status::Ok) return _s; } while (0)");
    w.line("");
    w.line("template <size_t N>");
    w.line("struct Bytes {");
    w.indent();
    w.line("uint8_t data[N]{};");
    w.line("uint8_t len = 0;");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status pack(Stream &out) const {");
    w.indent();
    w.line("BAKELITE_TRY(out.write_raw(&len, 1));");
    w.line("return out.write_raw(data, len);");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status unpack(Stream &in) {");
    w.indent();
    w.line("BAKELITE_TRY(in.read_raw(&len, 1));");
    w.line("if (len > N) return Status::ErrCapacity;");
    w.line("return in.read_raw(data, len);");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("};");
    w.line("");
    w.line("template <size_t N>");
    w.line("struct String {");
    w.indent();
    w.line("char data[N]{};");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status pack(Stream &out) const {");
    w.indent();
    w.line("size_t len = strnlen(data, N - 1);");
    w.line("BAKELITE_TRY(out.write_raw(data, len));");
    w.line("uint8_t terminator = 0;");
    w.line("return out.write_raw(&terminator, 1);");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status unpack(Stream &in) {");
    w.indent();
    w.line("size_t i = 0;");
    w.line("for (;;) {");
    w.indent();
    w.line("uint8_t byte;");
    w.line("BAKELITE_TRY(in.read_raw(&byte, 1));");
    w.line("if (byte == 0) break;");
    w.line("if (i < N - 1) data[i++] = static_cast<char>(byte);");
    w.dedent();
    w.line("}");
    w.line("data[i < N ? i : N - 1] = '\\0';");
    w.line("return Status::Ok;");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("};");
    w.line("");
    w.line("template <typename T, size_t N>");
    w.line("struct Sequence {");
    w.indent();
    w.line("T data[N]{};");
    w.line("uint8_t len = 0;");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status pack(Stream &out) const {");
    w.indent();
    w.line("BAKELITE_TRY(out.write_raw(&len, 1));");
    w.line("for (uint8_t i = 0; i < len; ++i) BAKELITE_TRY(data[i].pack(out));");
    w.line("return Status::Ok;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("template <typename Stream>");
    w.line("Status unpack(Stream &in) {");
    w.indent();
    w.line("BAKELITE_TRY(in.read_raw(&len, 1));");
    w.line("if (len > N) return Status::ErrCapacity;");
    w.line("for (uint8_t i = 0; i < len; ++i) BAKELITE_TRY(data[i].unpack(in));");
    w.line("return Status::Ok;");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("};");
    w.line("");
    w.line("uint8_t crc8(const uint8_t *data, size_t len);");
    w.line("uint16_t crc16(const uint8_t *data, size_t len);");
    w.line("uint32_t crc32(const uint8_t *data, size_t len);");
    w.line("");
    w.line("#define BAKELITE_COBS_OK 0");
    w.line("#define BAKELITE_COBS_NULL_POINTER 1");
    w.line("#define BAKELITE_COBS_OUT_BUFFER_OVERFLOW 2");
    w.line("#define BAKELITE_COBS_ZERO_BYTE_IN_INPUT 4");
    w.line("#define BAKELITE_COBS_INPUT_TOO_SHORT 8");
    w.line("");
    w.line("size_t cobs_encode(const uint8_t *src, size_t src_len, uint8_t *dst, size_t dst_cap, uint8_t *status);");
    w.line("size_t cobs_decode_in_place(uint8_t *buf, size_t len, uint8_t *status);");
    w.line("");
    w.line("enum class FrameResult { Ok, NotReady, Failure, CrcFailure, BufferOverrun };");
    w.line("");
    w.line("// Buffer-layout-aware COBS+CRC framer, the C++ counterpart of the Rust reference's");
    w.line("// own bakelite::Framer: owns a caller-provided buffer laid out as");
    w.line("// [ cobs-overhead prefix | payload area | crc area | terminator ].");
    w.line("class Framer {");
    w.line(" public:");
    w.indent();
    w.line("Framer(uint8_t *buffer, size_t buffer_len, size_t max_length, size_t crc_width);");
    w.line("");
    w.line("size_t message_offset() const { return message_offset_; }");
    w.line("uint8_t *payload_ptr() { return buffer_ + message_offset_; }");
    w.line("size_t max_length() const { return max_length_; }");
    w.line("");
    w.line("bool send(size_t len, size_t *out_len);");
    w.line("FrameResult feed(uint8_t byte, size_t *out_len);");
    w.dedent();
    w.line("");
    w.line(" private:");
    w.indent();
    w.line("uint8_t *buffer_;");
    w.line("size_t buffer_len_;");
    w.line("size_t max_length_;");
    w.line("size_t crc_width_;");
    w.line("size_t message_offset_;");
    w.line("size_t read_pos_;");
    w.dedent();
    w.line("};");
    w.line("");
    w.line("} // namespace bakelite");
    w.finish()
}

fn runtime_impl() -> String {
    let mut w = Writer::new("  ");
    w.line("// Generated by bakelite. Do not edit by hand.");
    w.line("#include \"bakelite_runtime.hpp\"");
    w.line("");
    w.line("namespace bakelite {");
    w.line("");

    emit_crc_table_u8(&mut w, "kCrc8Table", crc8_table());
    w.line("");
    emit_crc_table_u16(&mut w, "kCrc16Table", crc16_table());
    w.line("");
    emit_crc_table_u32(&mut w, "kCrc32Table", crc32_table());
    w.line("");

    w.line("uint8_t crc8(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint8_t crc = 0x00;");
    w.line("for (size_t i = 0; i < len; i++) crc = kCrc8Table[crc ^ data[i]];");
    w.line("return crc;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("uint16_t crc16(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint16_t crc = 0x0000;");
    w.line("for (size_t i = 0; i < len; i++) {");
    w.indent();
    w.line("uint8_t index = static_cast<uint8_t>(crc) ^ data[i];");
    w.line("crc = (crc >> 8) ^ kCrc16Table[index];");
    w.dedent();
    w.line("}");
    w.line("return crc;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("uint32_t crc32(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint32_t crc = 0xFFFFFFFFu;");
    w.line("for (size_t i = 0; i < len; i++) {");
    w.indent();
    w.line("uint8_t index = static_cast<uint8_t>(crc) ^ data[i];");
    w.line("crc = (crc >> 8) ^ kCrc32Table[index];");
    w.dedent();
    w.line("}");
    w.line("return crc ^ 0xFFFFFFFFu;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("size_t cobs_encode(const uint8_t *src, size_t src_len, uint8_t *dst, size_t dst_cap, uint8_t *status) {");
    w.indent();
    w.line("size_t overhead = src_len + (src_len + 253) / 254;");
    w.line("if (dst_cap < overhead) { *status = BAKELITE_COBS_OUT_BUFFER_OVERFLOW; return 0; }");
    w.line("size_t read = 0, write = 1, code_index = 0;");
    w.line("uint8_t code = 1;");
    w.line("while (read < src_len) {");
    w.indent();
    w.line("if (src[read] == 0) {");
    w.indent();
    w.line("dst[code_index] = code;");
    w.line("code = 1;");
    w.line("code_index = write++;");
    w.dedent();
    w.line("} else {");
    w.indent();
    w.line("dst[write++] = src[read];");
    w.line("code++;");
    w.line("if (code == 0xFF) {");
    w.indent();
    w.line("dst[code_index] = code;");
    w.line("code = 1;");
    w.line("code_index = write++;");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("}");
    w.line("read++;");
    w.dedent();
    w.line("}");
    w.line("dst[code_index] = code;");
    w.line("*status = BAKELITE_COBS_OK;");
    w.line("return write;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("size_t cobs_decode_in_place(uint8_t *buf, size_t len, uint8_t *status) {");
    w.indent();
    w.line("size_t read = 0, write = 0;");
    w.line("while (read < len) {");
    w.indent();
    w.line("size_t code = buf[read];");
    w.line("if (code == 0) { *status = BAKELITE_COBS_ZERO_BYTE_IN_INPUT; return write; }");
    w.line("if (read + code > len) { *status = BAKELITE_COBS_INPUT_TOO_SHORT; return write; }");
    w.line("read++;");
    w.line("for (size_t i = 1; i < code; i++) { buf[write++] = buf[read++]; }");
    w.line("if (code != 0xFF && read < len) { buf[write++] = 0; }");
    w.dedent();
    w.line("}");
    w.line("*status = BAKELITE_COBS_OK;");
    w.line("return write;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("static void crc_of(const uint8_t *data, size_t len, size_t crc_width, uint8_t *out) {");
    w.indent();
    w.line("if (crc_width == 1) {");
    w.indent();
    w.line("out[0] = crc8(data, len);");
    w.dedent();
    w.line("} else if (crc_width == 2) {");
    w.indent();
    w.line("uint16_t c = crc16(data, len);");
    w.line("out[0] = static_cast<uint8_t>(c & 0xFF);");
    w.line("out[1] = static_cast<uint8_t>(c >> 8);");
    w.dedent();
    w.line("} else if (crc_width == 4) {");
    w.indent();
    w.line("uint32_t c = crc32(data, len);");
    w.line("out[0] = static_cast<uint8_t>(c & 0xFF);");
    w.line("out[1] = static_cast<uint8_t>((c >> 8) & 0xFF);");
    w.line("out[2] = static_cast<uint8_t>((c >> 16) & 0xFF);");
    w.line("out[3] = static_cast<uint8_t>((c >> 24) & 0xFF);");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("Framer::Framer(uint8_t *buffer, size_t buffer_len, size_t max_length, size_t crc_width)");
    w.indent();
    w.line(": buffer_(buffer),");
    w.line("  buffer_len_(buffer_len),");
    w.line("  max_length_(max_length),");
    w.line("  crc_width_(crc_width),");
    w.line("  message_offset_(max_length + crc_width + (max_length + crc_width + 253) / 254),");
    w.line("  read_pos_(0) {}");
    w.dedent();
    w.line("");

    w.line("bool Framer::send(size_t len, size_t *out_len) {");
    w.indent();
    w.line("uint8_t trailer[4];");
    w.line("crc_of(buffer_ + message_offset_, len, crc_width_, trailer);");
    w.line("memcpy(buffer_ + message_offset_ + len, trailer, crc_width_);");
    w.line("size_t body_len = len + crc_width_;");
    w.line("");
    w.line("uint8_t status;");
    w.line("size_t encoded_len = cobs_encode(buffer_ + message_offset_, body_len, buffer_, message_offset_, &status);");
    w.line("if (status != BAKELITE_COBS_OK) return false;");
    w.line("buffer_[encoded_len] = 0x00;");
    w.line("*out_len = encoded_len + 1;");
    w.line("return true;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("FrameResult Framer::feed(uint8_t byte, size_t *out_len) {");
    w.indent();
    w.line("if (byte != 0x00) {");
    w.indent();
    w.line("if (read_pos_ >= message_offset_) {");
    w.indent();
    w.line("read_pos_ = 0;");
    w.line("return FrameResult::BufferOverrun;");
    w.dedent();
    w.line("}");
    w.line("buffer_[read_pos_++] = byte;");
    w.line("return FrameResult::NotReady;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("if (read_pos_ == 0) return FrameResult::Failure;");
    w.line("size_t acc_len = read_pos_;");
    w.line("read_pos_ = 0;");
    w.line("");
    w.line("uint8_t status;");
    w.line("size_t out = cobs_decode_in_place(buffer_, acc_len, &status);");
    w.line("if (status != BAKELITE_COBS_OK) return FrameResult::Failure;");
    w.line("if (out < crc_width_) return FrameResult::Failure;");
    w.line("size_t payload_len = out - crc_width_;");
    w.line("if (crc_width_ > 0) {");
    w.indent();
    w.line("uint8_t expected[4];");
    w.line("memcpy(expected, buffer_ + payload_len, crc_width_);");
    w.line("uint8_t actual[4];");
    w.line("crc_of(buffer_, payload_len, crc_width_, actual);");
    w.line("if (memcmp(expected, actual, crc_width_) != 0) return FrameResult::CrcFailure;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("memmove(buffer_ + message_offset_, buffer_, payload_len);");
    w.line("*out_len = payload_len;");
    w.line("return FrameResult::Ok;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("} // namespace bakelite");
    w.finish()
}
