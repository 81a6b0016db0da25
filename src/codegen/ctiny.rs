//! C99 tiny backend: fixed-capacity inline storage, packed structs, zero-copy overlay
// (c) Bakelite Contributors

use heck::{ToShoutySnakeCase, ToSnakeCase};

use crate::model::{PrimitiveType, Protocol, Schema, WireType};
use crate::runtime::crc::{crc16_table, crc32_table, crc8_table};

use super::writer::Writer;

fn c_type(prim: PrimitiveType) -> &'static str {
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
        PrimitiveType::Bool => "uint8_t",
    }
}

fn field_c_type(schema: &Schema, ty: &WireType) -> String {
    match ty {
        WireType::Primitive(p) => c_type(*p).to_string(),
        WireType::Enum(id) => format!("{}_t", schema.enums[id.0].name.to_snake_case()),
        WireType::Struct(id) => format!("{}_t", schema.structs[id.0].name.to_snake_case()),
        WireType::Bytes { .. } | WireType::StringT { .. } | WireType::Array { .. } => {
            unreachable!("variable-length fields are emitted as inline capacity members, not a bare C type")
        }
    }
}

/// Generates the `gen` artifact: one header with a packed struct per message type, fixed
/// `(data[N], len)` members for variable-length fields, `pack_*`/`unpack_*` functions, and
/// per-protocol message-id dispatch (`pack_<message>`, `decode_<message>`, `poll_<protocol>`)
/// plus zero-copy overlay accessors over a [`bakelite_framer_t`].
#[must_use]
pub fn generate(schema: &Schema) -> String {
    let mut w = Writer::new("    ");
    w.line("/* Generated by bakelite. Do not edit by hand. */");
    w.line("#pragma once");
    w.line("#include <stdint.h>");
    w.line("#include <string.h>");
    w.line("#include \"bakelite_runtime.h\"");
    w.line("");

    for e in &schema.enums {
        let name = e.name.to_snake_case();
        w.line(format!("typedef {} {}_t;", c_type(e.underlying), name));
        for m in &e.members {
            w.line(format!(
                "#define {}_{} (({}_t){})",
                name.to_shouty_snake_case(),
                m.name.to_shouty_snake_case(),
                name,
                m.value
            ));
        }
        w.line("");
    }

    for s in &schema.structs {
        let name = s.name.to_snake_case();
        w.line("#pragma pack(push, 1)");
        w.line("typedef struct {");
        w.indent();
        for f in &s.fields {
            emit_field_member(&mut w, schema, f.name.as_str(), &f.ty);
        }
        if s.fields.is_empty() {
            w.line("uint8_t _unused;");
        }
        w.dedent();
        w.line(format!("}} {name}_t;"));
        w.line("#pragma pack(pop)");
        w.line(format!("BAKELITE_STATIC_ASSERT_UNALIGNED_OK({name}_t);"));
        w.line("");

        w.line(format!(
            "static inline bakelite_status_t pack_{name}(const {name}_t *value, bakelite_buffer_t *buf) {{"
        ));
        w.indent();
        for f in &s.fields {
            emit_field_pack(&mut w, schema, &format!("value->{}", f.name.to_snake_case()), &f.ty);
        }
        w.line("return BAKELITE_OK;");
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "static inline bakelite_status_t unpack_{name}({name}_t *value, bakelite_buffer_t *buf) {{"
        ));
        w.indent();
        for f in &s.fields {
            emit_field_unpack(&mut w, schema, &format!("value->{}", f.name.to_snake_case()), &f.ty);
        }
        w.line("return BAKELITE_OK;");
        w.dedent();
        w.line("}");
        w.line("");
    }

    for p in &schema.protocols {
        for m in &p.messages {
            w.line(format!(
                "#define {}_MSG_{} {}",
                p.name.to_shouty_snake_case(),
                m.name.to_shouty_snake_case(),
                m.id
            ));
        }
        w.line("");
    }

    for p in &schema.protocols {
        emit_protocol_dispatch(&mut w, schema, p);
    }

    w.finish()
}

fn emit_field_member(w: &mut Writer, schema: &Schema, name: &str, ty: &WireType) {
    let snake = name.to_snake_case();
    match ty {
        WireType::Bytes { capacity } => {
            w.line(format!("uint8_t {snake}[{capacity}];"));
            w.line(format!("uint8_t {snake}_len;"));
        }
        WireType::StringT { capacity } => {
            w.line(format!("char {snake}[{capacity}];"));
        }
        WireType::Array { element, len } => {
            w.line(format!("{} {snake}[{len}];", field_c_type(schema, element)));
            w.line(format!("uint8_t {snake}_len;"));
        }
        other => w.line(format!("{} {snake};", field_c_type(schema, other))),
    };
}

fn emit_field_pack(w: &mut Writer, schema: &Schema, expr: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(_) | WireType::Enum(_) => {
            w.line(format!(
                "BAKELITE_TRY(bakelite_buffer_write(buf, &{expr}, sizeof({expr})));"
            ));
        }
        WireType::Struct(id) => {
            w.line(format!(
                "BAKELITE_TRY(pack_{}(&{expr}, buf));",
                schema.structs[id.0].name.to_snake_case()
            ));
        }
        WireType::Bytes { .. } => {
            w.line(format!("BAKELITE_TRY(bakelite_buffer_write(buf, &{expr}_len, 1));"));
            w.line(format!("BAKELITE_TRY(bakelite_buffer_write(buf, {expr}, {expr}_len));"));
        }
        WireType::StringT { capacity } => {
            w.line(format!("BAKELITE_TRY(bakelite_write_cstring(buf, {expr}, {capacity}));"));
        }
        WireType::Array { element, .. } => {
            w.line(format!("BAKELITE_TRY(bakelite_buffer_write(buf, &{expr}_len, 1));"));
            w.line(format!("for (uint8_t _i = 0; _i < {expr}_len; ++_i) {{"));
            w.indent();
            emit_field_pack(w, schema, &format!("{expr}[_i]"), element);
            w.dedent();
            w.line("}");
        }
    }
}

fn emit_field_unpack(w: &mut Writer, schema: &Schema, expr: &str, ty: &WireType) {
    match ty {
        WireType::Primitive(_) | WireType::Enum(_) => {
            w.line(format!(
                "BAKELITE_TRY(bakelite_buffer_read(buf, &{expr}, sizeof({expr})));"
            ));
        }
        WireType::Struct(id) => {
            w.line(format!(
                "BAKELITE_TRY(unpack_{}(&{expr}, buf));",
                schema.structs[id.0].name.to_snake_case()
            ));
        }
        WireType::Bytes { capacity } => {
            w.line(format!("BAKELITE_TRY(bakelite_buffer_read(buf, &{expr}_len, 1));"));
            w.line(format!("if ({expr}_len > {capacity}) return BAKELITE_ERR_CAPACITY;"));
            w.line(format!("BAKELITE_TRY(bakelite_buffer_read(buf, {expr}, {expr}_len));"));
        }
        WireType::StringT { capacity } => {
            w.line(format!("BAKELITE_TRY(bakelite_read_cstring(buf, {expr}, {capacity}));"));
        }
        WireType::Array { element, len } => {
            w.line(format!("BAKELITE_TRY(bakelite_buffer_read(buf, &{expr}_len, 1));"));
            w.line(format!("if ({expr}_len > {len}) return BAKELITE_ERR_CAPACITY;"));
            w.line(format!("for (uint8_t _i = 0; _i < {expr}_len; ++_i) {{"));
            w.indent();
            emit_field_unpack(w, schema, &format!("{expr}[_i]"), element);
            w.dedent();
            w.line("}");
        }
    }
}

/// Emits one protocol's message-id wire contract (spec §4.3/§6): `poll_<protocol>` peeks
/// the leading id byte of a `bakelite_buffer_t`, each message gets `pack_<message>`/
/// `decode_<message>` wrapping its struct-level `pack_*`/`unpack_*` with the id byte, and a
/// zero-copy overlay pair (`<protocol>_message_<message>`/`<protocol>_send_<message>`) casts
/// directly into a [`bakelite_framer_t`]'s payload area.
fn emit_protocol_dispatch(w: &mut Writer, schema: &Schema, p: &Protocol) {
    let proto_snake = p.name.to_snake_case();
    let proto_shouty = p.name.to_shouty_snake_case();

    w.line(format!(
        "static inline int {proto_snake}_poll(const bakelite_buffer_t *buf) {{"
    ));
    w.indent();
    w.line("if (buf->pos >= buf->size) return -1;");
    w.line("return buf->data[buf->pos];");
    w.dedent();
    w.line("}");
    w.line("");

    for m in &p.messages {
        let s = &schema.structs[m.struct_id.0];
        let struct_name = s.name.to_snake_case();
        let msg_snake = m.name.to_snake_case();
        let msg_shouty = m.name.to_shouty_snake_case();
        let define = format!("{proto_shouty}_MSG_{msg_shouty}");

        w.line(format!(
            "static inline bakelite_status_t {proto_snake}_pack_{msg_snake}(const {struct_name}_t *value, bakelite_buffer_t *buf) {{"
        ));
        w.indent();
        w.line("uint8_t id = (uint8_t)".to_string() + &define + ";");
        w.line("BAKELITE_TRY(bakelite_buffer_write(buf, &id, 1));");
        w.line(format!("return pack_{struct_name}(value, buf);"));
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "static inline bakelite_status_t {proto_snake}_decode_{msg_snake}({struct_name}_t *value, bakelite_buffer_t *buf) {{"
        ));
        w.indent();
        w.line("uint8_t id;");
        w.line("BAKELITE_TRY(bakelite_buffer_read(buf, &id, 1));");
        w.line(format!("if (id != (uint8_t){define}) return BAKELITE_ERR_WRONG_MESSAGE;"));
        w.line(format!("return unpack_{struct_name}(value, buf);"));
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "static inline {struct_name}_t *{proto_snake}_message_{msg_snake}(bakelite_framer_t *f) {{"
        ));
        w.indent();
        w.line(format!("return ({struct_name}_t *)(f->buffer + f->message_offset + 1);"));
        w.dedent();
        w.line("}");
        w.line("");

        w.line(format!(
            "static inline int {proto_snake}_send_{msg_snake}(bakelite_framer_t *f, size_t *out_len) {{"
        ));
        w.indent();
        w.line(format!("f->buffer[f->message_offset] = (uint8_t){define};"));
        w.line(format!(
            "return bakelite_framer_send(f, 1 + sizeof({struct_name}_t), out_len);"
        ));
        w.dedent();
        w.line("}");
        w.line("");
    }
}

fn emit_crc_table_u8(w: &mut Writer, name: &str, table: &[u8; 256]) {
    w.line(format!("static const uint8_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(16) {
        let row = chunk.iter().map(|b| format!("0x{b:02x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

fn emit_crc_table_u16(w: &mut Writer, name: &str, table: &[u16; 256]) {
    w.line(format!("static const uint16_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(8) {
        let row = chunk.iter().map(|v| format!("0x{v:04x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

fn emit_crc_table_u32(w: &mut Writer, name: &str, table: &[u32; 256]) {
    w.line(format!("static const uint32_t {name}[256] = {{"));
    w.indent();
    for chunk in table.chunks(4) {
        let row = chunk.iter().map(|v| format!("0x{v:08x}")).collect::<Vec<_>>().join(", ");
        w.line(format!("{row},"));
    }
    w.dedent();
    w.line("};");
}

/// Generates the `runtime` artifact: a header declaring the buffer/CRC/COBS/framer API,
/// plus a companion implementation file with real function bodies (table-driven CRC,
/// in-place COBS, and the framer state machine), since C has no way to build the CRC
/// tables lazily the way the Rust reference does behind a `OnceLock`.
#[must_use]
pub fn runtime_files() -> Vec<(&'static str, String)> {
    vec![
        ("bakelite_runtime.h", runtime_header()),
        ("bakelite_runtime.c", runtime_impl()),
    ]
}

fn runtime_header() -> String {
    let mut w = Writer::new("    ");
    w.line("/* Generated by bakelite. Do not edit by hand. */");
    w.line("#pragma once");
    w.line("#include <stdint.h>");
    w.line("#include <stddef.h>");
    w.line("");
    w.line("typedef enum {");
    w.indent();
    w.line("BAKELITE_OK = 0,");
    w.line("BAKELITE_ERR_WRITE,");
    w.line("BAKELITE_ERR_READ,");
    w.line("BAKELITE_ERR_SEEK,");
    w.line("BAKELITE_ERR_CAPACITY,");
    w.line("BAKELITE_ERR_WRONG_MESSAGE,");
    w.dedent();
    w.line("} bakelite_status_t;");
    w.line("");
    w.line("#define BAKELITE_TRY(expr) do { bakelite_status_t _s = (expr); if (_s != BAKELITE_OK) return _s; } while (0)");
    w.line("");
    w.line("/* A compile-time check that the host tolerates unaligned loads/stores on a");
    w.line("   packed struct; backends targeting strict-alignment CPUs should replace");
    w.line("   this with a field-by-field pack/unpack fallback. */");
    w.line("#define BAKELITE_STATIC_ASSERT_UNALIGNED_OK(type) \\");
    w.indent();
    w.line("_Static_assert(sizeof(type) > 0, #type \" must be a complete packed type\")");
    w.dedent();
    w.line("");
    w.line("typedef struct {");
    w.indent();
    w.line("uint8_t *data;");
    w.line("size_t size;");
    w.line("size_t pos;");
    w.dedent();
    w.line("} bakelite_buffer_t;");
    w.line("");
    w.line("bakelite_status_t bakelite_buffer_write(bakelite_buffer_t *buf, const void *src, size_t len);");
    w.line("bakelite_status_t bakelite_buffer_read(bakelite_buffer_t *buf, void *dst, size_t len);");
    w.line("bakelite_status_t bakelite_write_cstring(bakelite_buffer_t *buf, const char *src, size_t capacity);");
    w.line("bakelite_status_t bakelite_read_cstring(bakelite_buffer_t *buf, char *dst, size_t capacity);");
    w.line("");
    w.line("uint8_t bakelite_crc8(const uint8_t *data, size_t len);");
    w.line("uint16_t bakelite_crc16(const uint8_t *data, size_t len);");
    w.line("uint32_t bakelite_crc32(const uint8_t *data, size_t len);");
    w.line("");
    w.line("#define BAKELITE_COBS_OK 0");
    w.line("#define BAKELITE_COBS_NULL_POINTER 1");
    w.line("#define BAKELITE_COBS_OUT_BUFFER_OVERFLOW 2");
    w.line("#define BAKELITE_COBS_ZERO_BYTE_IN_INPUT 4");
    w.line("#define BAKELITE_COBS_INPUT_TOO_SHORT 8");
    w.line("");
    w.line("size_t bakelite_cobs_encode(const uint8_t *src, size_t src_len, uint8_t *dst, size_t dst_cap, uint8_t *status);");
    w.line("size_t bakelite_cobs_decode_in_place(uint8_t *buf, size_t len, uint8_t *status);");
    w.line("");
    w.line("typedef enum {");
    w.indent();
    w.line("BAKELITE_FRAME_OK = 0,");
    w.line("BAKELITE_FRAME_NOT_READY,");
    w.line("BAKELITE_FRAME_FAILURE,");
    w.line("BAKELITE_FRAME_CRC_FAILURE,");
    w.line("BAKELITE_FRAME_OVERRUN,");
    w.dedent();
    w.line("} bakelite_frame_result_t;");
    w.line("");
    w.line("typedef struct {");
    w.indent();
    w.line("uint8_t *buffer;");
    w.line("size_t buffer_len;");
    w.line("size_t message_offset;");
    w.line("size_t read_pos;");
    w.line("size_t max_length;");
    w.line("size_t crc_width;");
    w.dedent();
    w.line("} bakelite_framer_t;");
    w.line("");
    w.line("void bakelite_framer_init(bakelite_framer_t *f, uint8_t *buffer, size_t buffer_len, size_t max_length, size_t crc_width);");
    w.line("int bakelite_framer_send(bakelite_framer_t *f, size_t len, size_t *out_len);");
    w.line("bakelite_frame_result_t bakelite_framer_feed(bakelite_framer_t *f, uint8_t byte, size_t *out_len);");
    w.finish()
}

fn runtime_impl() -> String {
    let mut w = Writer::new("    ");
    w.line("/* Generated by bakelite. Do not edit by hand. */");
    w.line("#include \"bakelite_runtime.h\"");
    w.line("#include <string.h>");
    w.line("");

    emit_crc_table_u8(&mut w, "bakelite_crc8_table", crc8_table());
    w.line("");
    emit_crc_table_u16(&mut w, "bakelite_crc16_table", crc16_table());
    w.line("");
    emit_crc_table_u32(&mut w, "bakelite_crc32_table", crc32_table());
    w.line("");

    w.line("bakelite_status_t bakelite_buffer_write(bakelite_buffer_t *buf, const void *src, size_t len) {");
    w.indent();
    w.line("if (len > buf->size - buf->pos) return BAKELITE_ERR_WRITE;");
    w.line("memcpy(buf->data + buf->pos, src, len);");
    w.line("buf->pos += len;");
    w.line("return BAKELITE_OK;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("bakelite_status_t bakelite_buffer_read(bakelite_buffer_t *buf, void *dst, size_t len) {");
    w.indent();
    w.line("if (len > buf->size - buf->pos) return BAKELITE_ERR_READ;");
    w.line("memcpy(dst, buf->data + buf->pos, len);");
    w.line("buf->pos += len;");
    w.line("return BAKELITE_OK;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("bakelite_status_t bakelite_write_cstring(bakelite_buffer_t *buf, const char *src, size_t capacity) {");
    w.indent();
    w.line("size_t max_content = capacity > 0 ? capacity - 1 : 0;");
    w.line("size_t len = strnlen(src, max_content);");
    w.line("BAKELITE_TRY(bakelite_buffer_write(buf, src, len));");
    w.line("uint8_t terminator = 0;");
    w.line("return bakelite_buffer_write(buf, &terminator, 1);");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("bakelite_status_t bakelite_read_cstring(bakelite_buffer_t *buf, char *dst, size_t capacity) {");
    w.indent();
    w.line("size_t i = 0;");
    w.line("for (;;) {");
    w.indent();
    w.line("uint8_t byte;");
    w.line("BAKELITE_TRY(bakelite_buffer_read(buf, &byte, 1));");
    w.line("if (byte == 0) break;");
    w.line("if (i < capacity - 1) dst[i++] = (char)byte;");
    w.dedent();
    w.line("}");
    w.line("dst[i < capacity ? i : capacity - 1] = '\\0';");
    w.line("return BAKELITE_OK;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("uint8_t bakelite_crc8(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint8_t crc = 0x00;");
    w.line("for (size_t i = 0; i < len; i++) crc = bakelite_crc8_table[crc ^ data[i]];");
    w.line("return crc;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("uint16_t bakelite_crc16(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint16_t crc = 0x0000;");
    w.line("for (size_t i = 0; i < len; i++) {");
    w.indent();
    w.line("uint8_t index = (uint8_t)crc ^ data[i];");
    w.line("crc = (crc >> 8) ^ bakelite_crc16_table[index];");
    w.dedent();
    w.line("}");
    w.line("return crc;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("uint32_t bakelite_crc32(const uint8_t *data, size_t len) {");
    w.indent();
    w.line("uint32_t crc = 0xFFFFFFFFu;");
    w.line("for (size_t i = 0; i < len; i++) {");
    w.indent();
    w.line("uint8_t index = (uint8_t)crc ^ data[i];");
    w.line("crc = (crc >> 8) ^ bakelite_crc32_table[index];");
    w.dedent();
    w.line("}");
    w.line("return crc ^ 0xFFFFFFFFu;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("size_t bakelite_cobs_encode(const uint8_t *src, size_t src_len, uint8_t *dst, size_t dst_cap, uint8_t *status) {");
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

    w.line("size_t bakelite_cobs_decode_in_place(uint8_t *buf, size_t len, uint8_t *status) {");
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

    w.line("void bakelite_framer_init(bakelite_framer_t *f, uint8_t *buffer, size_t buffer_len, size_t max_length, size_t crc_width) {");
    w.indent();
    w.line("f->buffer = buffer;");
    w.line("f->buffer_len = buffer_len;");
    w.line("f->max_length = max_length;");
    w.line("f->crc_width = crc_width;");
    w.line("size_t body_cap = max_length + crc_width;");
    w.line("f->message_offset = body_cap + (body_cap + 253) / 254;");
    w.line("f->read_pos = 0;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("static void bakelite_crc_of(const uint8_t *data, size_t len, size_t crc_width, uint8_t *out) {");
    w.indent();
    w.line("if (crc_width == 1) {");
    w.indent();
    w.line("out[0] = bakelite_crc8(data, len);");
    w.dedent();
    w.line("} else if (crc_width == 2) {");
    w.indent();
    w.line("uint16_t c = bakelite_crc16(data, len);");
    w.line("out[0] = (uint8_t)(c & 0xFF);");
    w.line("out[1] = (uint8_t)(c >> 8);");
    w.dedent();
    w.line("} else if (crc_width == 4) {");
    w.indent();
    w.line("uint32_t c = bakelite_crc32(data, len);");
    w.line("out[0] = (uint8_t)(c & 0xFF);");
    w.line("out[1] = (uint8_t)((c >> 8) & 0xFF);");
    w.line("out[2] = (uint8_t)((c >> 16) & 0xFF);");
    w.line("out[3] = (uint8_t)((c >> 24) & 0xFF);");
    w.dedent();
    w.line("}");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("int bakelite_framer_send(bakelite_framer_t *f, size_t len, size_t *out_len) {");
    w.indent();
    w.line("size_t offset = f->message_offset;");
    w.line("uint8_t trailer[4];");
    w.line("bakelite_crc_of(f->buffer + offset, len, f->crc_width, trailer);");
    w.line("memcpy(f->buffer + offset + len, trailer, f->crc_width);");
    w.line("size_t body_len = len + f->crc_width;");
    w.line("");
    w.line("uint8_t status;");
    w.line("size_t encoded_len = bakelite_cobs_encode(f->buffer + offset, body_len, f->buffer, offset, &status);");
    w.line("if (status != BAKELITE_COBS_OK) return 0;");
    w.line("f->buffer[encoded_len] = 0x00;");
    w.line("*out_len = encoded_len + 1;");
    w.line("return 1;");
    w.dedent();
    w.line("}");
    w.line("");

    w.line("bakelite_frame_result_t bakelite_framer_feed(bakelite_framer_t *f, uint8_t byte, size_t *out_len) {");
    w.indent();
    w.line("if (byte != 0x00) {");
    w.indent();
    w.line("if (f->read_pos >= f->message_offset) {");
    w.indent();
    w.line("f->read_pos = 0;");
    w.line("return BAKELITE_FRAME_OVERRUN;");
    w.dedent();
    w.line("}");
    w.line("f->buffer[f->read_pos++] = byte;");
    w.line("return BAKELITE_FRAME_NOT_READY;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("if (f->read_pos == 0) return BAKELITE_FRAME_FAILURE;");
    w.line("size_t acc_len = f->read_pos;");
    w.line("f->read_pos = 0;");
    w.line("");
    w.line("uint8_t status;");
    w.line("size_t out = bakelite_cobs_decode_in_place(f->buffer, acc_len, &status);");
    w.line("if (status != BAKELITE_COBS_OK) return BAKELITE_FRAME_FAILURE;");
    w.line("if (out < f->crc_width) return BAKELITE_FRAME_FAILURE;");
    w.line("size_t payload_len = out - f->crc_width;");
    w.line("if (f->crc_width > 0) {");
    w.indent();
    w.line("uint8_t expected[4];");
    w.line("memcpy(expected, f->buffer + payload_len, f->crc_width);");
    w.line("uint8_t actual[4];");
    w.line("bakelite_crc_of(f->buffer, payload_len, f->crc_width, actual);");
    w.line("if (memcmp(expected, actual, f->crc_width) != 0) return BAKELITE_FRAME_CRC_FAILURE;");
    w.dedent();
    w.line("}");
    w.line("");
    w.line("memmove(f->buffer + f->message_offset, f->buffer, payload_len);");
    w.line("*out_len = payload_len;");
    w.line("return BAKELITE_FRAME_OK;");
    w.dedent();
    w.line("}");
    w.finish()
}
