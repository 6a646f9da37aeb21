//! Wire codec for [`Value`] payloads.
//!
//! Values travel as raw big-endian payloads with no type tag; the schema
//! layer knows the [`TypeId`] of every column and drives decoding. Booleans
//! encode as a 4-byte integer, characters as one UTF-16 code unit, and
//! varchars as a length prefix followed by UTF-16 code units. A composite
//! row is the plain concatenation of its fields.

use bytes::{Buf, BufMut, BytesMut};
use larch_common::{LarchError, Result, TypeId, Value};

/// Appends the encoded payload of `value` to `buf`.
pub fn encode_value(value: &Value, buf: &mut BytesMut) {
    match value {
        Value::Null => {}
        Value::Boolean(v) => buf.put_i32(i32::from(*v)),
        Value::Int8(v) => buf.put_i8(*v),
        Value::Int16(v) => buf.put_i16(*v),
        Value::Int32(v) => buf.put_i32(*v),
        Value::Int64(v) => buf.put_i64(*v),
        Value::Float32(v) => buf.put_f32(*v),
        Value::Float64(v) => buf.put_f64(*v),
        Value::Char(c) => buf.put_u16(*c as u16),
        Value::Varchar(s) => {
            let units: Vec<u16> = s.encode_utf16().collect();
            buf.put_u32(units.len() as u32);
            for unit in units {
                buf.put_u16(unit);
            }
        }
        Value::Composite(fields) => {
            for field in fields {
                encode_value(field, buf);
            }
        }
    }
}

/// Decodes one scalar payload of the given type from `buf`.
///
/// Composite payloads carry no field layout of their own; use
/// [`decode_composite`] with the schema's field types.
pub fn decode_value(buf: &mut impl Buf, type_id: TypeId) -> Result<Value> {
    match type_id {
        TypeId::Null => Ok(Value::Null),
        TypeId::Boolean => {
            need(buf, 4, type_id)?;
            Ok(Value::Boolean(buf.get_i32() != 0))
        }
        TypeId::Int8 => {
            need(buf, 1, type_id)?;
            Ok(Value::Int8(buf.get_i8()))
        }
        TypeId::Int16 => {
            need(buf, 2, type_id)?;
            Ok(Value::Int16(buf.get_i16()))
        }
        TypeId::Int32 => {
            need(buf, 4, type_id)?;
            Ok(Value::Int32(buf.get_i32()))
        }
        TypeId::Int64 => {
            need(buf, 8, type_id)?;
            Ok(Value::Int64(buf.get_i64()))
        }
        TypeId::Float32 => {
            need(buf, 4, type_id)?;
            Ok(Value::Float32(buf.get_f32()))
        }
        TypeId::Float64 => {
            need(buf, 8, type_id)?;
            Ok(Value::Float64(buf.get_f64()))
        }
        TypeId::Char => {
            need(buf, 2, type_id)?;
            let unit = buf.get_u16();
            char::from_u32(u32::from(unit)).map(Value::Char).ok_or_else(|| {
                LarchError::ValueCorrupted(format!("invalid char code unit {unit:#06x}"))
            })
        }
        TypeId::Varchar => {
            need(buf, 4, type_id)?;
            let len = buf.get_u32() as usize;
            need(buf, len * 2, type_id)?;
            let mut units = Vec::with_capacity(len);
            for _ in 0..len {
                units.push(buf.get_u16());
            }
            String::from_utf16(&units)
                .map(Value::Varchar)
                .map_err(|_| LarchError::ValueCorrupted("invalid UTF-16 varchar".to_string()))
        }
        TypeId::Composite => Err(LarchError::UnsupportedType(
            "COMPOSITE requires a field layout".to_string(),
        )),
    }
}

/// Decodes a composite row whose fields have the given types, in order.
/// Nested composites are not supported; schemas are flat.
pub fn decode_composite(buf: &mut impl Buf, fields: &[TypeId]) -> Result<Value> {
    let mut out = Vec::with_capacity(fields.len());
    for &field in fields {
        out.push(decode_value(buf, field)?);
    }
    Ok(Value::Composite(out))
}

fn need(buf: &impl Buf, bytes: usize, type_id: TypeId) -> Result<()> {
    if buf.remaining() < bytes {
        return Err(LarchError::ValueCorrupted(format!(
            "truncated {type_id} payload: need {bytes} bytes, have {}",
            buf.remaining()
        )));
    }
    Ok(())
}
