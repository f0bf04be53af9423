use byteorder::{BigEndian, ByteOrder};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::integer::{decode_minimal, encode_minimal, minimal_len, MAX_INT_WIDTH};
use crate::marker::{ChunkType, Marker};
use crate::value::Value;
use crate::varint::{decode_varint, encode_varint};

const F64_WIDTH: usize = 8;

/// A chunk payload as read straight out of the buffer. Strings, byte runs, and array elements
/// borrow from the input; containers are only described by their payload length until the
/// decoder enters them.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    Container(usize),
    Bytes(&'a [u8]),
    Str(&'a str),
    Int(i64),
    F64(f64),
    Array(ArrayRef<'a>),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Element::Container(_) => "Container",
            Element::Bytes(_) => "Bytes",
            Element::Str(_) => "Str",
            Element::Int(_) => "Int",
            Element::F64(_) => "F64",
            Element::Array(_) => "Array",
        }
    }

    /// Convert to an owned value. Containers have no owned form here, as their children haven't
    /// been read yet.
    pub fn to_value(&self) -> Option<Value> {
        Some(match *self {
            Element::Container(_) => return None,
            Element::Bytes(v) => Value::Bytes(v.to_vec()),
            Element::Str(v) => Value::Str(v.to_owned()),
            Element::Int(v) => Value::Int(v),
            Element::F64(v) => Value::F64(v),
            Element::Array(ref v) => Value::Array(v.iter().collect()),
        })
    }
}

/// An array payload whose element width has already been validated.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayRef<'a> {
    ty: ChunkType,
    count: usize,
    width: usize,
    data: &'a [u8],
}

impl<'a> ArrayRef<'a> {
    pub fn element_type(&self) -> ChunkType {
        self.ty
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte width shared by every element.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + 'a {
        let ty = self.ty;
        let width = self.width;
        let data = self.data;
        (0..self.count).map(move |i| {
            let elem = &data[i * width..(i + 1) * width];
            match ty {
                ChunkType::SignedInteger => {
                    // Width was checked to be 1..=8 when the array was parsed.
                    Value::Int(decode_minimal(elem).unwrap_or_default())
                }
                ChunkType::Float64 => Value::F64(BigEndian::read_f64(elem)),
                _ => Value::Bytes(elem.to_vec()),
            }
        })
    }
}

/// Encode a leaf or array value's payload onto `buf`, returning the marker to write in front of
/// it. Containers are handled by the encoder, since their payload is made of whole chunks.
pub fn serialize_payload(buf: &mut Vec<u8>, value: &Value) -> EncodeResult<Marker> {
    let ty = value.chunk_type()?;
    match value {
        Value::Container(_) => return Err(EncodeError::UnsupportedValueType("Container")),
        Value::Bytes(v) => {
            buf.extend_from_slice(v);
            return Ok(Marker::new(ty, false, v.len() == 1));
        }
        Value::Str(v) => {
            buf.extend_from_slice(v.as_bytes());
            return Ok(Marker::new(ty, false, v.len() == 1));
        }
        Value::Int(v) => {
            encode_minimal(*v, 1, buf);
        }
        Value::F64(v) => {
            let mut bytes = [0u8; F64_WIDTH];
            BigEndian::write_f64(&mut bytes, *v);
            buf.extend_from_slice(&bytes);
        }
        Value::Array(v) => serialize_array(buf, v)?,
    }
    Ok(Marker::new(ty, value.is_array(), false))
}

fn serialize_array(buf: &mut Vec<u8>, items: &[Value]) -> EncodeResult<()> {
    let first = match items.first() {
        Some(first) => first,
        None => {
            encode_varint(0, buf)?;
            return Ok(());
        }
    };
    for item in items {
        if std::mem::discriminant(item) != std::mem::discriminant(first) {
            return Err(EncodeError::ArrayTypeMismatch {
                expected: first.name(),
                actual: item.name(),
            });
        }
    }
    encode_varint(items.len() as u64, buf)?;
    match first {
        Value::Int(_) => {
            let width = items
                .iter()
                .filter_map(Value::as_i64)
                .map(minimal_len)
                .max()
                .unwrap_or(1);
            for v in items.iter().filter_map(Value::as_i64) {
                encode_minimal(v, width, buf);
            }
        }
        Value::F64(_) => {
            for v in items.iter().filter_map(Value::as_f64) {
                let mut bytes = [0u8; F64_WIDTH];
                BigEndian::write_f64(&mut bytes, v);
                buf.extend_from_slice(&bytes);
            }
        }
        Value::Bytes(first) => {
            if first.is_empty() {
                return Err(EncodeError::ZeroWidthArray { count: items.len() });
            }
            for v in items.iter().filter_map(Value::as_bytes) {
                if v.len() != first.len() {
                    return Err(EncodeError::ArrayElementLengthMismatch {
                        expected: first.len(),
                        actual: v.len(),
                    });
                }
                buf.extend_from_slice(v);
            }
        }
        other => return Err(EncodeError::UnsupportedValueType(other.name())),
    }
    Ok(())
}

/// Decode a payload according to its marker. `max_array_len` bounds the element count of
/// arrays, which otherwise could claim an enormous number of zero-width elements.
pub fn parse_payload<'a>(
    marker: Marker,
    payload: &'a [u8],
    max_array_len: usize,
) -> DecodeResult<Element<'a>> {
    if marker.is_array() {
        return parse_array(marker.ty, payload, max_array_len).map(Element::Array);
    }
    Ok(match marker.ty {
        ChunkType::Container => Element::Container(payload.len()),
        ChunkType::RawBytes => Element::Bytes(payload),
        ChunkType::Utf8String => {
            Element::Str(std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8)?)
        }
        ChunkType::SignedInteger => Element::Int(decode_minimal(payload)?),
        ChunkType::Float64 => {
            if payload.len() != F64_WIDTH {
                return Err(DecodeError::InvalidFloatWidth(payload.len()));
            }
            Element::F64(BigEndian::read_f64(payload))
        }
    })
}

fn parse_array(
    ty: ChunkType,
    payload: &[u8],
    max_array_len: usize,
) -> DecodeResult<ArrayRef<'_>> {
    let mut pos = 0;
    let count = decode_varint(payload, &mut pos)?;
    let count = usize::try_from(count).map_err(|_| DecodeError::VarIntOutOfRange(count))?;
    if count > max_array_len {
        return Err(DecodeError::ArrayTooLong {
            max: max_array_len,
            actual: count,
        });
    }
    let data = &payload[pos..];
    let width = if count == 0 {
        if !data.is_empty() {
            return Err(DecodeError::ArrayWidthNotDivisible {
                payload: data.len(),
                count,
            });
        }
        0
    } else {
        if data.len() % count != 0 {
            return Err(DecodeError::ArrayWidthNotDivisible {
                payload: data.len(),
                count,
            });
        }
        data.len() / count
    };
    if count > 0 {
        match ty {
            // Every element takes at least one byte, so the count can't outgrow the payload.
            ChunkType::RawBytes if width == 0 => {
                return Err(DecodeError::ZeroWidthArray { count });
            }
            ChunkType::SignedInteger if width == 0 || width > MAX_INT_WIDTH => {
                return Err(DecodeError::InvalidIntegerWidth(width));
            }
            ChunkType::Float64 if width != F64_WIDTH => {
                return Err(DecodeError::InvalidFloatWidth(width));
            }
            _ => (),
        }
    }
    Ok(ArrayRef {
        ty,
        count,
        width,
        data,
    })
}
