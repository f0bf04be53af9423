use crate::error::{DecodeError, DecodeResult};

/// Flag bit: the payload is a count-prefixed run of equal-width elements.
pub const FLAG_ARRAY: u8 = 0x02;
/// Flag bit: the payload is exactly one byte and no length field precedes it.
pub const FLAG_INLINE: u8 = 0x04;

const FLAG_MASK: u8 = 0x1F;

/// Chunk type tags, stored in the top 3 bits of the header byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkType {
    Container,
    RawBytes,
    SignedInteger,
    Float64,
    Utf8String,
}

impl ChunkType {
    pub fn from_u8(tag: u8) -> DecodeResult<ChunkType> {
        match tag {
            1 => Ok(ChunkType::Container),
            2 => Ok(ChunkType::RawBytes),
            3 => Ok(ChunkType::SignedInteger),
            5 => Ok(ChunkType::Float64),
            6 => Ok(ChunkType::Utf8String),
            _ => Err(DecodeError::UnknownTypeTag(tag)),
        }
    }

    pub fn into_u8(self) -> u8 {
        match self {
            ChunkType::Container => 1,
            ChunkType::RawBytes => 2,
            ChunkType::SignedInteger => 3,
            ChunkType::Float64 => 5,
            ChunkType::Utf8String => 6,
        }
    }

    /// Whether elements of this type may be packed into an array chunk.
    pub fn allows_array(self) -> bool {
        matches!(
            self,
            ChunkType::RawBytes | ChunkType::SignedInteger | ChunkType::Float64
        )
    }
}

impl From<ChunkType> for u8 {
    fn from(val: ChunkType) -> u8 {
        val.into_u8()
    }
}

/// The single type-and-flags byte that follows a chunk's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marker {
    pub ty: ChunkType,
    pub flags: u8,
}

impl Marker {
    pub fn new(ty: ChunkType, array: bool, inline: bool) -> Marker {
        let mut flags = 0;
        if array {
            flags |= FLAG_ARRAY;
        }
        if inline {
            flags |= FLAG_INLINE;
        }
        Marker { ty, flags }
    }

    /// Construct a marker from a single byte. Unknown flag bits are carried along untouched.
    pub fn from_u8(n: u8) -> DecodeResult<Marker> {
        let ty = ChunkType::from_u8(n >> 5)?;
        let flags = n & FLAG_MASK;
        if flags & FLAG_ARRAY != 0 && !ty.allows_array() {
            return Err(DecodeError::InvalidArrayType(ty.into_u8()));
        }
        Ok(Marker { ty, flags })
    }

    pub fn into_u8(self) -> u8 {
        (self.ty.into_u8() << 5) | (self.flags & FLAG_MASK)
    }

    pub fn is_array(&self) -> bool {
        self.flags & FLAG_ARRAY != 0
    }

    pub fn is_inline(&self) -> bool {
        self.flags & FLAG_INLINE != 0
    }
}

impl From<Marker> for u8 {
    fn from(val: Marker) -> u8 {
        val.into_u8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_bytes() {
        assert_eq!(Marker::new(ChunkType::Container, false, false).into_u8(), 0x20);
        assert_eq!(Marker::new(ChunkType::RawBytes, false, true).into_u8(), 0x44);
        assert_eq!(Marker::new(ChunkType::SignedInteger, true, false).into_u8(), 0x62);
        assert_eq!(Marker::new(ChunkType::Float64, false, false).into_u8(), 0xa0);
        assert_eq!(Marker::new(ChunkType::Utf8String, false, true).into_u8(), 0xc4);
    }

    #[test]
    fn roundtrip() {
        let types = [
            ChunkType::Container,
            ChunkType::RawBytes,
            ChunkType::SignedInteger,
            ChunkType::Float64,
            ChunkType::Utf8String,
        ];
        for ty in types {
            for inline in [false, true] {
                let marker = Marker::new(ty, false, inline);
                assert_eq!(Marker::from_u8(marker.into_u8()).unwrap(), marker);
            }
            if ty.allows_array() {
                let marker = Marker::new(ty, true, false);
                assert_eq!(Marker::from_u8(marker.into_u8()).unwrap(), marker);
            }
        }
    }

    #[test]
    fn unknown_tags() {
        for tag in [0u8, 4, 7] {
            assert_eq!(
                Marker::from_u8(tag << 5),
                Err(DecodeError::UnknownTypeTag(tag))
            );
        }
    }

    #[test]
    fn array_of_containers() {
        assert_eq!(
            Marker::from_u8(0x20 | FLAG_ARRAY),
            Err(DecodeError::InvalidArrayType(1))
        );
        assert_eq!(
            Marker::from_u8(0xc0 | FLAG_ARRAY),
            Err(DecodeError::InvalidArrayType(6))
        );
    }
}
