//! Cursor-based chunk stream reader.

use std::convert::TryFrom;

use crate::depth_tracking::DepthTracker;
use crate::element::{parse_payload, Element};
use crate::error::{DecodeError, DecodeResult};
use crate::marker::{ChunkType, Marker};
use crate::value::{Chunk, Value};
use crate::varint::VarInt;
use crate::{MAX_ARRAY_LEN, MAX_DEPTH};

/// Parsing limits applied while decoding untrusted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Deepest container nesting allowed.
    pub max_depth: usize,
    /// Largest element count accepted for a single array chunk.
    pub max_array_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_array_len: MAX_ARRAY_LEN,
        }
    }
}

/// One chunk read by [`Decoder::next`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRef<'a> {
    pub id: u64,
    pub marker: Marker,
    pub element: Element<'a>,
}

impl<'a> ChunkRef<'a> {
    pub fn is_container(&self) -> bool {
        matches!(self.element, Element::Container(_))
    }
}

/// Reads chunks out of a complete in-memory buffer.
///
/// `next` walks the siblings of the current container. When it returns a container chunk, the
/// caller may `enter_container` to walk its children and `leave_container` to come back out, or
/// just keep calling `next` to skip over it.
///
/// After the first error the decoder stops: `next` returns `Ok(None)` forever, `remaining` is 0,
/// and `enter_container` and `leave_container` fail with [`DecodeError::AlreadyFailed`] without
/// moving the cursor.
#[derive(Clone, Debug)]
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: DepthTracker,
    pending: Option<(usize, usize)>,
    limits: DecodeLimits,
    errored: bool,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Decoder<'a> {
        Self::with_limits(data, DecodeLimits::default())
    }

    pub fn with_limits(data: &'a [u8], limits: DecodeLimits) -> Decoder<'a> {
        Self {
            data,
            pos: 0,
            depth: DepthTracker::new(limits.max_depth),
            pending: None,
            limits,
            errored: false,
        }
    }

    /// Number of containers currently entered.
    pub fn depth(&self) -> usize {
        self.depth.depth()
    }

    /// Bytes left in the current container.
    pub fn remaining(&self) -> usize {
        if self.errored {
            return 0;
        }
        self.depth
            .end_or(self.data.len())
            .saturating_sub(self.pos)
    }

    /// True if the current container has no more chunks.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read the next chunk header in the current container and decode its payload. Container
    /// payloads are left for `enter_container`.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> DecodeResult<Option<ChunkRef<'a>>> {
        self.pending = None;
        if self.errored || self.is_empty() {
            return Ok(None);
        }
        match self.read_chunk() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(e) => {
                self.errored = true;
                tracing::debug!(offset = self.pos, error = %e, "chunk decode failed");
                Err(e)
            }
        }
    }

    /// Step into the container chunk that `next` just returned.
    pub fn enter_container(&mut self) -> DecodeResult<()> {
        if self.errored {
            return Err(DecodeError::AlreadyFailed);
        }
        let (start, end) = self.pending.take().ok_or(DecodeError::NotAtContainer)?;
        self.depth.enter(end)?;
        self.pos = start;
        Ok(())
    }

    /// Step out of the current container, skipping whatever children weren't read.
    pub fn leave_container(&mut self) -> DecodeResult<()> {
        if self.errored {
            return Err(DecodeError::AlreadyFailed);
        }
        self.pending = None;
        self.pos = self.depth.leave()?;
        Ok(())
    }

    /// Decode every remaining chunk of the current container into owned chunks.
    pub fn read_tree(&mut self) -> DecodeResult<Vec<Chunk>> {
        let mut chunks = Vec::new();
        while let Some(chunk) = self.next()? {
            let value = match chunk.element.to_value() {
                Some(value) => value,
                None => {
                    self.enter_container()?;
                    let children = self.read_tree()?;
                    self.leave_container()?;
                    Value::Container(children)
                }
            };
            chunks.push(Chunk {
                id: chunk.id,
                value,
            });
        }
        Ok(chunks)
    }

    fn read_chunk(&mut self) -> DecodeResult<ChunkRef<'a>> {
        let end = self.depth.end_or(self.data.len());
        let mut data = self.data.get(self.pos..end).unwrap_or(&[]);

        let id = VarInt::read(&mut data)?.to_u64();
        let (&marker, rest) = data.split_first().ok_or(DecodeError::TruncatedBuffer {
            step: "decode chunk marker",
            actual: 0,
            expected: 1,
        })?;
        data = rest;
        let marker = Marker::from_u8(marker)?;
        let len = if marker.is_inline() {
            1
        } else {
            let len = VarInt::read(&mut data)?.to_u64();
            usize::try_from(len).map_err(|_| DecodeError::VarIntOutOfRange(len))?
        };
        if len > data.len() {
            return Err(DecodeError::TruncatedBuffer {
                step: "get chunk payload",
                actual: data.len(),
                expected: len,
            });
        }
        let start = end - data.len();
        let payload = &data[..len];
        let element = parse_payload(marker, payload, self.limits.max_array_len)?;

        self.pos = start + len;
        if marker.ty == ChunkType::Container {
            self.pending = Some((start, start + len));
        }
        tracing::trace!(id, ty = ?marker.ty, len, "read chunk");
        Ok(ChunkRef {
            id,
            marker,
            element,
        })
    }
}
