/*!
Layout of the binary format.

- [`encoding`]: VarInts, integers, chunk headers, and payloads.
- [`key_table`]: The key table chunk and the record stream built on it.

*/

pub mod encoding;
pub mod key_table;
