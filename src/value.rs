use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, EncodeResult};
use crate::marker::ChunkType;
use crate::varint::VarInt;

/// A decoded or to-be-encoded chunk payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A nested record: an ordered run of child chunks.
    Container(Vec<Chunk>),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Str(String),
    Int(i64),
    F64(f64),
    /// A homogeneous array of `Bytes` (all the same length), `Int`, or `F64` values.
    Array(Vec<Value>),
}

/// One field of a chunk stream: a numeric id, unique within its container, and its value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: u64,
    pub value: Value,
}

impl Chunk {
    pub fn new<V: Into<Value>>(id: u64, value: V) -> Chunk {
        Chunk {
            id,
            value: value.into(),
        }
    }

    /// Build a chunk from a signed id, rejecting negative or oversized ids up front.
    pub fn try_new<V: Into<Value>>(id: i64, value: V) -> EncodeResult<Chunk> {
        let id = VarInt::try_from(id)?.to_u64();
        Ok(Chunk::new(id, value))
    }

    pub fn container(id: u64, children: Vec<Chunk>) -> Chunk {
        Chunk {
            id,
            value: Value::Container(children),
        }
    }
}

impl Value {
    pub fn name(&self) -> &'static str {
        match self {
            Value::Container(_) => "Container",
            Value::Bytes(_) => "Bytes",
            Value::Str(_) => "Str",
            Value::Int(_) => "Int",
            Value::F64(_) => "F64",
            Value::Array(_) => "Array",
        }
    }

    /// The wire type tag for this value. Arrays are tagged by their element type, and empty
    /// arrays fall back to `RawBytes`.
    pub fn chunk_type(&self) -> EncodeResult<ChunkType> {
        Ok(match self {
            Value::Container(_) => ChunkType::Container,
            Value::Bytes(_) => ChunkType::RawBytes,
            Value::Str(_) => ChunkType::Utf8String,
            Value::Int(_) => ChunkType::SignedInteger,
            Value::F64(_) => ChunkType::Float64,
            Value::Array(v) => match v.first() {
                None => ChunkType::RawBytes,
                Some(Value::Bytes(_)) => ChunkType::RawBytes,
                Some(Value::Int(_)) => ChunkType::SignedInteger,
                Some(Value::F64(_)) => ChunkType::Float64,
                Some(other) => return Err(EncodeError::UnsupportedValueType(other.name())),
            },
        })
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Container(_))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(_))
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_f64(&self) -> bool {
        matches!(self, Value::F64(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_container(&self) -> Option<&[Chunk]> {
        match self {
            Value::Container(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a direct child of a container by id. Returns the first match.
    pub fn get(&self, id: u64) -> Option<&Value> {
        self.as_container()?
            .iter()
            .find(|c| c.id == id)
            .map(|c| &c.value)
    }
}

macro_rules! impl_from_int {
    ($t: ty) => {
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64)
            }
        }
    };
}

impl_from_int!(i8);
impl_from_int!(i16);
impl_from_int!(i32);
impl_from_int!(i64);
impl_from_int!(u8);
impl_from_int!(u16);
impl_from_int!(u32);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Array(v.into_iter().map(Value::Int).collect())
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(v.into_iter().map(Value::F64).collect())
    }
}

impl From<Vec<Chunk>> for Value {
    fn from(v: Vec<Chunk>) -> Self {
        Value::Container(v)
    }
}
