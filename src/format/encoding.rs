/*!

Encoding of chunk streams.

A stream is a plain concatenation of chunks, with no header and no terminator. Its length is
assumed to be known from whatever carries it.

# VarInt

Chunk ids, payload lengths, and array counts are unsigned variable-length integers of 1 to 8
bytes, holding at most 42 bits. The number of leading one bits in the first byte gives the total
length:

| Lead byte  | Length | Value bits                         | Largest value   |
| --         | --     | --                                 | --              |
| `0xxxxxxx` | 1      | 7                                  | `0x7F`          |
| `10xxxxxx` | -      | Invalid                            | -               |
| `110xxxxx` | 2      | 5 + 6                              | `0x7FF`         |
| `1110xxxx` | 3      | 4 + 6 * 2                          | `0xFFFF`        |
| `11110xxx` | 4      | 3 + 6 * 3                          | `0x1F_FFFF`     |
| `111110xx` | 5      | 2 + 6 * 4                          | `0x3FF_FFFF`    |
| `1111110x` | 6      | 1 + 6 * 5                          | `0x7FFF_FFFF`   |
| `11111110` | 7      | 6 * 6                              | `0xF_FFFF_FFFF` |
| `11111111` | 8      | 6 * 7                              | `0x3FF_FFFF_FFFF`|

Every byte after the first carries 6 value bits in its low bits, most significant first. The
top two bits of those bytes are written as 0 and ignored on decode:

```text
0x80 => +----------+----------+
        | 11000010 | 00000000 |
        +----------+----------+
```

Encoders always use the shortest form. Decoders accept longer forms too.

# Signed Integers

Signed integers are big-endian two's complement, in the fewest bytes (1 to 8) that sign-extend
back to the same value. So `0` is `0x00`, `-1` is `0xFF`, `127` is `0x7F`, `128` is `0x00 0x80`,
and `-12` is `0xF4`.

# Chunks

```text
+========+----------+==========+=========+
|   Id   |  Marker  |  Length  | Payload |
+========+----------+==========+=========+

- Id is a VarInt
- Marker is a single byte, `TTTFFFFF`
- Length is a VarInt giving the payload size, and is omitted if the INLINE flag is set
- Payload is the chunk's data
```

The top 3 bits of the marker are the chunk type:

| Type | Name          | Payload                                   |
| --   | --            | --                                        |
| 1    | Container     | Zero or more chunks                       |
| 2    | RawBytes      | Arbitrary bytes                           |
| 3    | SignedInteger | A signed integer, as above                |
| 5    | Float64       | IEEE 754 binary64, big-endian, 8 bytes    |
| 6    | Utf8String    | UTF-8 text                                |

Types 0, 4, and 7 are unassigned, and decoding fails on them. The low 5 bits are flags:

| Flag   | Value  | Meaning                                                   |
| --     | --     | --                                                        |
| ARRAY  | `0x02` | The payload is an array of the chunk type                 |
| INLINE | `0x04` | No Length field; the payload is exactly one byte          |

INLINE is only written for RawBytes and Utf8String chunks holding exactly one byte. The other
flag bits are written as 0 and ignored on decode.

# Arrays

An array payload is a VarInt element count followed by the elements, back to back, all the same
width. The width is the remaining payload length divided by the count, and decoding fails if it
doesn't divide evenly.

- SignedInteger arrays use the width of the widest element's minimal encoding, sign-extending
  the narrower ones.
- Float64 arrays always use 8 bytes per element.
- RawBytes arrays hold equal-length byte strings.
- Container and Utf8String chunks can't be arrays.

An empty array is written as a RawBytes array with a count of 0, so its whole payload is `0x00`.

# Example

```text
01 60 01 F4                    id 1, SignedInteger, length 1, -12
02 C0 05 67 64 73 63 63        id 2, Utf8String, length 5, "gdscc"
03 C4 78                       id 3, Utf8String | INLINE, "x"
04 20 0B                       id 4, Container, length 11
   05 A0 08 3F F0 00 00 00 00 00 00     id 5, Float64, 1.0
06 62 07 03 00 64 00 FA 0F A0  id 6, SignedInteger | ARRAY, length 7, [100, 250, 4000]
```

*/
