//! sdxf2 is a compact, self-describing binary format for structured data.
//!
//! Data is a sequence of chunks. Each chunk carries a numeric id, a type, and a payload. A
//! container chunk's payload is itself a sequence of chunks, so arbitrary trees can be built.
//! The format provides:
//!
//! - Variable-length integers (VarInts) for ids, lengths, and counts, up to 42 bits
//! - Signed integers in the fewest big-endian two's complement bytes that hold them
//! - Packed arrays of integers, floats, or equal-length byte strings
//! - A single-byte inline form for one-byte strings and byte strings
//! - A cursor-style [`Decoder`] that borrows from the input and can skip whole containers
//!   without looking inside them
//! - A key table layer, which maps field names to ids once per stream so that
//!   [`Record`]s can be encoded without repeating their field names
//!
//! The layouts are described in the [`format`] module.
//!
//! # Example
//!
//! ```
//! use sdxf2::{decode_record_with_key_table, encode_record_with_key_table, Record};
//!
//! let record = Record::new()
//!     .with("site", Record::new().with("name", "gdscc").with("elevation", -12i64))
//!     .with("readings", vec![100i64, 250, 4000]);
//!
//! let data = encode_record_with_key_table(&record).unwrap();
//! let decoded = decode_record_with_key_table(&data).unwrap();
//! assert_eq!(decoded, record);
//! assert_eq!(decoded["site"].as_record().unwrap()["name"].as_str(), Some("gdscc"));
//! ```

mod depth_tracking;
mod element;
mod error;
mod integer;
mod marker;
mod record;
mod value;

pub mod decoder;
pub mod encoder;
pub mod format;
pub mod key_table;
pub mod varint;

pub use self::decoder::{ChunkRef, DecodeLimits, Decoder};
pub use self::element::{ArrayRef, Element};
pub use self::encoder::{serialize_chunk, Encoder};
pub use self::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use self::integer::{decode_minimal, encode_minimal, minimal_len};
pub use self::key_table::{
    decode_record_with_key_table, decode_with_key_table, decode_with_key_table_limits,
    encode_record_with_key_table, encode_with_key_table, KeyTable,
};
pub use self::marker::{ChunkType, Marker, FLAG_ARRAY, FLAG_INLINE};
pub use self::record::{Field, Record};
pub use self::value::{Chunk, Value};
pub use self::varint::{decode_varint, encode_varint, VarInt};

/// The largest value a VarInt can hold: 42 bits.
pub const MAX_VARINT: u64 = (1u64 << 42) - 1;
/// Default limit on container nesting while decoding.
pub const MAX_DEPTH: usize = 100;
/// Default limit on the element count of a single array chunk while decoding.
pub const MAX_ARRAY_LEN: usize = 1usize << 24;
/// Chunk id reserved for the key table, and for the name entry inside a key table container.
pub const KEY_TABLE_ID: u64 = 0;
/// Chunk id of the top-level container wrapping each record in a key table stream.
pub const RECORD_ID: u64 = 1;
/// First id handed out to field names by a key table.
pub const FIRST_KEY_ID: u64 = 2;

/// Encode a sequence of chunks into a new buffer.
pub fn encode(chunks: &[Chunk]) -> EncodeResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(&mut buf, chunks)?;
    Ok(buf)
}

/// Encode a sequence of chunks, appending to `buf`. Each chunk is appended whole or not at all;
/// chunks before a failing one stay in the buffer.
pub fn encode_into(buf: &mut Vec<u8>, chunks: &[Chunk]) -> EncodeResult<()> {
    for chunk in chunks {
        serialize_chunk(buf, chunk.id, &chunk.value)?;
    }
    Ok(())
}

/// Decode a complete buffer into an owned chunk tree.
pub fn decode(data: &[u8]) -> DecodeResult<Vec<Chunk>> {
    decode_with_limits(data, DecodeLimits::default())
}

pub fn decode_with_limits(data: &[u8], limits: DecodeLimits) -> DecodeResult<Vec<Chunk>> {
    Decoder::with_limits(data, limits).read_tree()
}
