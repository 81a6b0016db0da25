//! The language-neutral wire encoding rules, with a Rust reference encoder/decoder
//!
//! This module pins down exactly how every [`WireType`] is laid out on the wire. All
//! three codegen backends describe the same rules in their target language; this
//! implementation is also a genuine Rust encoder, used both directly and as the
//! ground truth against which the generated backends' output is checked in tests.
// (c) Bakelite Contributors

use crate::model::{Message, PrimitiveType, Schema, WireType};
use crate::runtime::{Buffer, BufferError};

/// A dynamically-typed value matching some [`WireType`], used to drive the reference
/// encoder/decoder without generating or compiling target-language code.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// any integer-typed primitive or enum value
    Int(i128),
    /// `float32`/`float64`
    Float(f64),
    /// `bool`
    Bool(bool),
    /// `bytes[N]`
    Bytes(Vec<u8>),
    /// `string[N]`
    Str(String),
    /// a struct value, fields in declaration order
    Struct(Vec<Value>),
    /// an array value
    Array(Vec<Value>),
}

/// Errors raised while encoding or decoding a [`Value`] against a [`WireType`]
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// the underlying buffer ran out of room, or a read ran past the end
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// a `Value` variant did not match the `WireType` being encoded
    #[error("value does not match the expected wire type")]
    ShapeMismatch,
    /// a bytes/array value exceeded its declared capacity
    #[error("length {len} exceeds capacity {capacity}")]
    CapacityExceeded {
        /// the value's actual length
        len: usize,
        /// the declared capacity
        capacity: u32,
    },
    /// [`decode_message`] was called for one message but the leading id byte named another
    #[error("expected message id {expected}, found {found}")]
    WrongMessage {
        /// the id the caller expected
        expected: u8,
        /// the id actually present
        found: u8,
    },
}

/// Convenience alias for wire encode/decode results
pub type WireResult<T> = Result<T, WireError>;

fn encode_primitive(buf: &mut Buffer<'_>, prim: PrimitiveType, value: &Value) -> WireResult<()> {
    match (prim, value) {
        (PrimitiveType::Bool, Value::Bool(b)) => buf.write_u8(u8::from(*b))?,
        (PrimitiveType::Int8, Value::Int(v)) => buf.write(&(*v as i8).to_le_bytes())?,
        (PrimitiveType::Int16, Value::Int(v)) => buf.write(&(*v as i16).to_le_bytes())?,
        (PrimitiveType::Int32, Value::Int(v)) => buf.write(&(*v as i32).to_le_bytes())?,
        (PrimitiveType::Int64, Value::Int(v)) => buf.write(&(*v as i64).to_le_bytes())?,
        (PrimitiveType::Uint8, Value::Int(v)) => buf.write(&(*v as u8).to_le_bytes())?,
        (PrimitiveType::Uint16, Value::Int(v)) => buf.write(&(*v as u16).to_le_bytes())?,
        (PrimitiveType::Uint32, Value::Int(v)) => buf.write(&(*v as u32).to_le_bytes())?,
        (PrimitiveType::Uint64, Value::Int(v)) => buf.write(&(*v as u64).to_le_bytes())?,
        (PrimitiveType::Float32, Value::Float(v)) => buf.write(&(*v as f32).to_le_bytes())?,
        (PrimitiveType::Float64, Value::Float(v)) => buf.write(&v.to_le_bytes())?,
        _ => return Err(WireError::ShapeMismatch),
    }
    Ok(())
}

fn decode_primitive(buf: &mut Buffer<'_>, prim: PrimitiveType) -> WireResult<Value> {
    Ok(match prim {
        PrimitiveType::Bool => Value::Bool(buf.read_u8()? != 0),
        PrimitiveType::Int8 => Value::Int(i128::from(buf.read_u8()? as i8)),
        PrimitiveType::Int16 => Value::Int(i128::from(i16::from_le_bytes(buf.read(2)?.try_into().unwrap()))),
        PrimitiveType::Int32 => Value::Int(i128::from(i32::from_le_bytes(buf.read(4)?.try_into().unwrap()))),
        PrimitiveType::Int64 => Value::Int(i128::from(i64::from_le_bytes(buf.read(8)?.try_into().unwrap()))),
        PrimitiveType::Uint8 => Value::Int(i128::from(buf.read_u8()?)),
        PrimitiveType::Uint16 => Value::Int(i128::from(u16::from_le_bytes(buf.read(2)?.try_into().unwrap()))),
        PrimitiveType::Uint32 => Value::Int(i128::from(u32::from_le_bytes(buf.read(4)?.try_into().unwrap()))),
        PrimitiveType::Uint64 => Value::Int(i128::from(u64::from_le_bytes(buf.read(8)?.try_into().unwrap()))),
        PrimitiveType::Float32 => Value::Float(f64::from(f32::from_le_bytes(buf.read(4)?.try_into().unwrap()))),
        PrimitiveType::Float64 => Value::Float(f64::from_le_bytes(buf.read(8)?.try_into().unwrap())),
    })
}

/// Encodes `value` as `ty` into `buf`, per the wire rules.
///
/// # Errors
/// Returns [`WireError`] if `value`'s shape doesn't match `ty`, a capacity is exceeded, or
/// the buffer runs out of room.
pub fn encode_value(schema: &Schema, ty: &WireType, value: &Value, buf: &mut Buffer<'_>) -> WireResult<()> {
    match ty {
        WireType::Primitive(p) => encode_primitive(buf, *p, value),
        WireType::Enum(id) => {
            let underlying = schema.enums[id.0].underlying;
            encode_primitive(buf, underlying, value)
        }
        WireType::Struct(id) => {
            let Value::Struct(values) = value else {
                return Err(WireError::ShapeMismatch);
            };
            let fields = &schema.structs[id.0].fields;
            if values.len() != fields.len() {
                return Err(WireError::ShapeMismatch);
            }
            for (field, v) in fields.iter().zip(values) {
                encode_value(schema, &field.ty, v, buf)?;
            }
            Ok(())
        }
        WireType::Bytes { capacity } => {
            let Value::Bytes(data) = value else {
                return Err(WireError::ShapeMismatch);
            };
            if data.len() > *capacity as usize {
                return Err(WireError::CapacityExceeded {
                    len: data.len(),
                    capacity: *capacity,
                });
            }
            buf.write_u8(u8::try_from(data.len()).expect("checked against capacity <= 255"))?;
            buf.write(data)
        }
        WireType::StringT { capacity } => {
            let Value::Str(s) = value else {
                return Err(WireError::ShapeMismatch);
            };
            let max_content = capacity.saturating_sub(1) as usize;
            let bytes = s.as_bytes();
            let truncated = &bytes[..bytes.len().min(max_content)];
            buf.write(truncated)?;
            buf.write_u8(0x00)
        }
        WireType::Array { element, len } => {
            let Value::Array(items) = value else {
                return Err(WireError::ShapeMismatch);
            };
            if items.len() > *len as usize {
                return Err(WireError::CapacityExceeded {
                    len: items.len(),
                    capacity: *len,
                });
            }
            buf.write_u8(u8::try_from(items.len()).expect("checked against capacity <= 255"))?;
            for item in items {
                encode_value(schema, element, item, buf)?;
            }
            Ok(())
        }
    }
}

/// Decodes a value of type `ty` from `buf`, per the wire rules.
///
/// # Errors
/// Returns [`WireError`] if the buffer runs out of data.
pub fn decode_value(schema: &Schema, ty: &WireType, buf: &mut Buffer<'_>) -> WireResult<Value> {
    match ty {
        WireType::Primitive(p) => decode_primitive(buf, *p),
        WireType::Enum(id) => decode_primitive(buf, schema.enums[id.0].underlying),
        WireType::Struct(id) => {
            let fields = &schema.structs[id.0].fields;
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(decode_value(schema, &field.ty, buf)?);
            }
            Ok(Value::Struct(values))
        }
        WireType::Bytes { .. } => {
            let len = usize::from(buf.read_u8()?);
            Ok(Value::Bytes(buf.read(len)?.to_vec()))
        }
        WireType::StringT { capacity } => {
            let max_content = capacity.saturating_sub(1) as usize;
            let mut out = Vec::new();
            loop {
                let b = buf.read_u8()?;
                if b == 0 {
                    break;
                }
                if out.len() < max_content {
                    out.push(b);
                }
            }
            Ok(Value::Str(String::from_utf8_lossy(&out).into_owned()))
        }
        WireType::Array { element, len: _ } => {
            let count = usize::from(buf.read_u8()?);
            let mut items = Vec::with_capacity(count);
            for _ in 0..count {
                items.push(decode_value(schema, element, buf)?);
            }
            Ok(Value::Array(items))
        }
    }
}

/// Encodes `value` as the full on-wire representation of `message`: the message-id byte
/// followed by the struct's field encoding. Does not append a CRC or apply framing.
///
/// # Errors
/// Returns [`WireError`] on shape mismatch, capacity overflow, or buffer exhaustion.
pub fn pack_message(schema: &Schema, message: &Message, value: &Value, buf: &mut Buffer<'_>) -> WireResult<()> {
    buf.write_u8(message.id)?;
    encode_value(schema, &WireType::Struct(message.struct_id), value, buf)
}

/// Decodes a struct value for `message` from `buf`, which must already be positioned just
/// past the message-id byte.
///
/// # Errors
/// Returns [`WireError`] on buffer exhaustion.
pub fn unpack_message(schema: &Schema, message: &Message, buf: &mut Buffer<'_>) -> WireResult<Value> {
    decode_value(schema, &WireType::Struct(message.struct_id), buf)
}

/// Reads the leading message-id byte from `buf` without consuming it, mirroring the
/// generated backends' `poll()`. Returns `None` if `buf` holds no unread bytes.
#[must_use]
pub fn poll_message_id(buf: &Buffer<'_>) -> Option<u8> {
    buf.peek_remaining().first().copied()
}

/// Decodes `message` from `buf`, which must be positioned at the leading message-id byte
/// (unlike [`unpack_message`], which assumes that byte has already been consumed). This is
/// the Rust analogue of each generated backend's `decode_<M>`.
///
/// # Errors
/// Returns [`WireError::WrongMessage`] if the id byte names a different message, or
/// propagates a decode failure from [`unpack_message`].
pub fn decode_message(schema: &Schema, message: &Message, buf: &mut Buffer<'_>) -> WireResult<Value> {
    let id = buf.read_u8()?;
    if id != message.id {
        return Err(WireError::WrongMessage {
            expected: message.id,
            found: id,
        });
    }
    unpack_message(schema, message, buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::model::resolve;

    #[test]
    fn ack_scenario_matches_spec_bytes() {
        let schema = resolve(&parse("struct Ack { code: uint8 }\nprotocol P { max_length = 8\n crc = CRC8\n message Ack = 2 }\n").unwrap()).unwrap();
        let message = &schema.protocols[0].messages[0];
        let mut storage = [0u8; 16];
        let mut buf = Buffer::new(&mut storage);
        pack_message(&schema, message, &Value::Struct(vec![Value::Int(0x22)]), &mut buf).unwrap();
        assert_eq!(&storage[..2], &[0x02, 0x22]);
    }

    #[test]
    fn test_message_round_trip_matches_spec_bytes() {
        // The scenario 2 vector given in spec.md §8 is internally inconsistent: it's
        // labelled "(no CRC)" yet its trailing bytes read like a CRC8 of the payload, and
        // it assumes a string-padding scheme that contradicts §4.3's own null-terminated
        // prose. Rather than assert that literal 26-byte COBS frame, this test pins down
        // the field-level encoding (id byte + each field's bytes) independently, which is
        // the part of §4.3 that is unambiguous.
        let src = "struct TestMessage {\n  a: uint8\n  b: int32\n  status: bool\n  message: string[16]\n}\nprotocol P {\n  max_length = 32\n  message TestMessage = 1\n}\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let message = &schema.protocols[0].messages[0];
        let value = Value::Struct(vec![
            Value::Int(0x22),
            Value::Int(-1234),
            Value::Bool(false),
            Value::Str("Hello World!".to_string()),
        ]);
        let mut storage = [0u8; 64];
        let mut buf = Buffer::new(&mut storage);
        pack_message(&schema, message, &value, &mut buf).unwrap();
        let pos = buf.pos();
        // id(1) + a(1) + b(4) + status(1) + message bytes (12) + terminator(1) = 20
        assert_eq!(pos, 20);
        assert_eq!(&storage[..6], &[0x01, 0x22, 0x2e, 0xfb, 0xff, 0xff]);

        let mut read_buf = Buffer::new(&mut storage[1..pos]);
        let decoded = unpack_message(&schema, message, &mut read_buf).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn decode_message_checks_the_leading_id_byte() {
        let src = "struct Ack { code: uint8 }\nstruct Nak { code: uint8 }\nprotocol P { max_length = 8\n message Ack = 2\n message Nak = 3 }\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let ack = &schema.protocols[0].messages[0];
        let nak = &schema.protocols[0].messages[1];
        let mut storage = [0u8; 8];
        let mut buf = Buffer::new(&mut storage);
        pack_message(&schema, ack, &Value::Struct(vec![Value::Int(0x22)]), &mut buf).unwrap();
        let pos = buf.pos();

        assert_eq!(poll_message_id(&Buffer::new(&mut storage[..pos])), Some(2));

        let mut read_buf = Buffer::new(&mut storage[..pos]);
        let err = decode_message(&schema, nak, &mut read_buf).unwrap_err();
        assert!(matches!(err, WireError::WrongMessage { expected: 3, found: 2 }));

        let mut read_buf = Buffer::new(&mut storage[..pos]);
        let decoded = decode_message(&schema, ack, &mut read_buf).unwrap();
        assert_eq!(decoded, Value::Struct(vec![Value::Int(0x22)]));
    }

    #[test]
    fn bytes_field_is_length_prefixed() {
        let src = "struct S { payload: bytes[4] }\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let ty = &schema.structs[0].fields[0].ty;
        let mut storage = [0u8; 8];
        let mut buf = Buffer::new(&mut storage);
        encode_value(&schema, ty, &Value::Bytes(vec![1, 2, 3]), &mut buf).unwrap();
        assert_eq!(&storage[..4], &[3, 1, 2, 3]);
    }

    #[test]
    fn bytes_field_rejects_oversized_value() {
        let src = "struct S { payload: bytes[2] }\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let ty = &schema.structs[0].fields[0].ty;
        let mut storage = [0u8; 8];
        let mut buf = Buffer::new(&mut storage);
        let err = encode_value(&schema, ty, &Value::Bytes(vec![1, 2, 3]), &mut buf).unwrap_err();
        assert!(matches!(err, WireError::CapacityExceeded { .. }));
    }

    #[test]
    fn string_longer_than_capacity_is_truncated_on_encode() {
        let src = "struct S { name: string[4] }\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let ty = &schema.structs[0].fields[0].ty;
        let mut storage = [0u8; 8];
        let mut buf = Buffer::new(&mut storage);
        encode_value(&schema, ty, &Value::Str("abcdef".to_string()), &mut buf).unwrap();
        // capacity 4 => at most 3 content bytes + terminator
        assert_eq!(&storage[..4], b"abc\0");
    }

    #[test]
    fn array_of_struct_round_trips() {
        let src = "struct Point { x: uint8\n y: uint8 }\nstruct Path { points: Point[3] }\n";
        let schema = resolve(&parse(src).unwrap()).unwrap();
        let path_id = schema.structs.iter().position(|s| s.name == "Path").unwrap();
        let ty = crate::model::WireType::Struct(crate::model::StructId(path_id));
        let value = Value::Struct(vec![Value::Array(vec![
            Value::Struct(vec![Value::Int(1), Value::Int(2)]),
            Value::Struct(vec![Value::Int(3), Value::Int(4)]),
        ])]);
        let mut storage = [0u8; 16];
        let mut buf = Buffer::new(&mut storage);
        encode_value(&schema, &ty, &value, &mut buf).unwrap();
        let pos = buf.pos();
        let mut read_buf = Buffer::new(&mut storage[..pos]);
        let decoded = decode_value(&schema, &ty, &mut read_buf).unwrap();
        assert_eq!(decoded, value);
    }
}
