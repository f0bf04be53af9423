//! Chunk stream builder.

use crate::element::serialize_payload;
use crate::error::{EncodeError, EncodeResult};
use crate::marker::{ChunkType, Marker};
use crate::value::{Chunk, Value};
use crate::varint::VarInt;

#[derive(Clone, Debug)]
struct Frame {
    id: u64,
    buf: Vec<u8>,
}

/// Builds a chunk stream, either chunk-by-chunk with explicit `enter_container` /
/// `leave_container` calls, or by writing whole [`Value`] trees.
///
/// Each open container is a frame on a stack, collecting its children's encoded bytes. Leaving
/// the container wraps those bytes in a single container chunk in the parent frame. A leaf write
/// that fails leaves the current frame as it was.
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    root: Vec<u8>,
    frames: Vec<Frame>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing buffer; new chunks are appended after its contents.
    pub fn from_vec(buf: Vec<u8>) -> Self {
        Self {
            root: buf,
            frames: Vec::new(),
        }
    }

    /// Number of containers currently open.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enter_container(&mut self, id: u64) -> EncodeResult<()> {
        VarInt::new(id)?;
        self.frames.push(Frame {
            id,
            buf: Vec::new(),
        });
        Ok(())
    }

    pub fn leave_container(&mut self) -> EncodeResult<()> {
        let frame = self
            .frames
            .pop()
            .ok_or(EncodeError::LeaveAtOutermostContainer)?;
        let marker = Marker::new(ChunkType::Container, false, false);
        if let Err(e) = append_chunk(self.current(), frame.id, marker, &frame.buf) {
            // Put the frame back so the caller still sees a consistent stack.
            self.frames.push(frame);
            return Err(e);
        }
        Ok(())
    }

    /// Write a value of any kind, containers included, under `id`.
    pub fn write(&mut self, id: u64, value: &Value) -> EncodeResult<()> {
        serialize_chunk(self.current(), id, value)
    }

    pub fn write_chunk(&mut self, chunk: &Chunk) -> EncodeResult<()> {
        self.write(chunk.id, &chunk.value)
    }

    pub fn write_bytes(&mut self, id: u64, v: &[u8]) -> EncodeResult<()> {
        let marker = Marker::new(ChunkType::RawBytes, false, v.len() == 1);
        append_chunk(self.current(), id, marker, v)
    }

    pub fn write_str(&mut self, id: u64, v: &str) -> EncodeResult<()> {
        let marker = Marker::new(ChunkType::Utf8String, false, v.len() == 1);
        append_chunk(self.current(), id, marker, v.as_bytes())
    }

    pub fn write_int(&mut self, id: u64, v: i64) -> EncodeResult<()> {
        self.write(id, &Value::Int(v))
    }

    pub fn write_f64(&mut self, id: u64, v: f64) -> EncodeResult<()> {
        self.write(id, &Value::F64(v))
    }

    pub fn write_array(&mut self, id: u64, items: &[Value]) -> EncodeResult<()> {
        let mut payload = Vec::new();
        let marker = serialize_payload(&mut payload, &Value::Array(items.to_vec()))?;
        append_chunk(self.current(), id, marker, &payload)
    }

    /// Return the encoded stream. Fails if any container is still open.
    pub fn finish(self) -> EncodeResult<Vec<u8>> {
        if !self.frames.is_empty() {
            return Err(EncodeError::UnclosedContainers {
                open: self.frames.len(),
            });
        }
        Ok(self.root)
    }

    fn current(&mut self) -> &mut Vec<u8> {
        match self.frames.last_mut() {
            Some(frame) => &mut frame.buf,
            None => &mut self.root,
        }
    }
}

/// Serialize one chunk, recursing into containers, and append it to `buf`. Nothing is appended
/// unless the whole chunk encodes successfully.
pub fn serialize_chunk(buf: &mut Vec<u8>, id: u64, value: &Value) -> EncodeResult<()> {
    let mut payload = Vec::new();
    let marker = match value {
        Value::Container(children) => {
            for child in children {
                serialize_chunk(&mut payload, child.id, &child.value)?;
            }
            Marker::new(ChunkType::Container, false, false)
        }
        _ => serialize_payload(&mut payload, value)?,
    };
    append_chunk(buf, id, marker, &payload)
}

fn append_chunk(buf: &mut Vec<u8>, id: u64, marker: Marker, payload: &[u8]) -> EncodeResult<()> {
    let id = VarInt::new(id)?;
    let len = if marker.is_inline() {
        None
    } else {
        Some(VarInt::new(payload.len() as u64)?)
    };
    id.write(buf);
    buf.push(marker.into());
    if let Some(len) = len {
        len.write(buf);
    }
    buf.extend_from_slice(payload);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_VARINT;

    #[test]
    fn wire_bytes() {
        let mut enc = Encoder::new();
        enc.write_int(1, -12).unwrap();
        enc.write_str(2, "gdscc").unwrap();
        enc.write_str(3, "x").unwrap();
        enc.enter_container(4).unwrap();
        enc.write_f64(5, 1.0).unwrap();
        enc.leave_container().unwrap();
        let data = enc.finish().unwrap();
        let expected = vec![
            0x01, 0x60, 0x01, 0xf4, // id 1, SignedInteger, len 1, -12
            0x02, 0xc0, 0x05, b'g', b'd', b's', b'c', b'c', // id 2, Utf8String, len 5
            0x03, 0xc4, b'x', // id 3, Utf8String | INLINE
            0x04, 0x20, 0x0b, // id 4, Container, len 11
            0x05, 0xa0, 0x08, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0, // id 5, Float64
        ];
        assert_eq!(data, expected);
    }

    #[test]
    fn builder_matches_tree() {
        let mut enc = Encoder::new();
        enc.write_int(1, 7).unwrap();
        enc.enter_container(2).unwrap();
        enc.write_bytes(3, &[1, 2, 3]).unwrap();
        enc.write_array(4, &[Value::Int(1), Value::Int(300)]).unwrap();
        enc.leave_container().unwrap();
        let built = enc.finish().unwrap();

        let tree = vec![
            Chunk::new(1, 7),
            Chunk::container(
                2,
                vec![
                    Chunk::new(3, vec![1u8, 2, 3]),
                    Chunk::new(4, vec![1i64, 300]),
                ],
            ),
        ];
        let mut enc = Encoder::new();
        for chunk in &tree {
            enc.write_chunk(chunk).unwrap();
        }
        assert_eq!(enc.finish().unwrap(), built);
    }

    #[test]
    fn empty_container() {
        let mut enc = Encoder::new();
        enc.enter_container(9).unwrap();
        enc.leave_container().unwrap();
        assert_eq!(enc.finish().unwrap(), vec![0x09, 0x20, 0x00]);
    }

    #[test]
    fn leave_outermost() {
        let mut enc = Encoder::new();
        assert_eq!(
            enc.leave_container(),
            Err(EncodeError::LeaveAtOutermostContainer)
        );
    }

    #[test]
    fn unclosed() {
        let mut enc = Encoder::new();
        enc.enter_container(1).unwrap();
        enc.enter_container(2).unwrap();
        assert_eq!(enc.depth(), 2);
        assert_eq!(enc.finish(), Err(EncodeError::UnclosedContainers { open: 2 }));
    }

    #[test]
    fn oversized_id() {
        let mut enc = Encoder::new();
        assert_eq!(
            enc.write_int(MAX_VARINT + 1, 1),
            Err(EncodeError::ValueTooLarge(MAX_VARINT + 1))
        );
        assert_eq!(
            enc.enter_container(MAX_VARINT + 1),
            Err(EncodeError::ValueTooLarge(MAX_VARINT + 1))
        );
        enc.write_int(MAX_VARINT, 1).unwrap();
    }

    #[test]
    fn failed_write_leaves_frame_untouched() {
        let mut enc = Encoder::new();
        enc.write_int(1, 1).unwrap();
        let bad = Value::Container(vec![
            Chunk::new(2, 2),
            Chunk::new(3, Value::Array(vec![Value::Int(1), Value::from("no")])),
        ]);
        assert!(matches!(
            enc.write(4, &bad),
            Err(EncodeError::ArrayTypeMismatch { .. })
        ));
        let mut expected = Encoder::new();
        expected.write_int(1, 1).unwrap();
        assert_eq!(enc.finish().unwrap(), expected.finish().unwrap());
    }

    #[test]
    fn appends_to_existing_buffer() {
        let mut enc = Encoder::from_vec(vec![0xaa]);
        enc.write_int(1, 0).unwrap();
        assert_eq!(enc.finish().unwrap(), vec![0xaa, 0x01, 0x60, 0x01, 0x00]);
    }
}
