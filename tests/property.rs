use proptest::prelude::*;
use sdxf2::{
    decode, decode_minimal, decode_varint, decode_with_key_table, encode, encode_minimal,
    encode_varint, encode_with_key_table, minimal_len, varint, Chunk, Field, Record, Value,
    MAX_VARINT,
};

fn float() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("NaN never compares equal", |f| !f.is_nan())
}

fn array_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Array(Vec::new())),
        prop::collection::vec(any::<i64>(), 1..8).prop_map(Value::from),
        prop::collection::vec(float(), 1..8).prop_map(Value::from),
        (1usize..6, 1usize..4).prop_flat_map(|(count, width)| {
            prop::collection::vec(prop::collection::vec(any::<u8>(), width), count)
                .prop_map(|items| Value::Array(items.into_iter().map(Value::Bytes).collect()))
        }),
    ]
}

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        prop::collection::vec(any::<u8>(), 0..12).prop_map(Value::Bytes),
        any::<String>().prop_map(Value::Str),
        any::<i64>().prop_map(Value::Int),
        float().prop_map(Value::F64),
        array_value(),
    ]
}

fn chunk_id() -> impl Strategy<Value = u64> {
    prop_oneof![0u64..300, 0..=MAX_VARINT]
}

fn chunk_tree() -> impl Strategy<Value = Vec<Chunk>> {
    let leaf = (chunk_id(), leaf_value()).prop_map(|(id, value)| Chunk { id, value });
    let chunk = leaf.prop_recursive(4, 32, 6, |inner| {
        (chunk_id(), prop::collection::vec(inner, 0..6))
            .prop_map(|(id, children)| Chunk::container(id, children))
    });
    prop::collection::vec(chunk, 0..6)
}

fn record() -> impl Strategy<Value = Record> {
    let name = "[a-d]{1,2}";
    let leaf = prop_oneof![
        any::<i64>().prop_map(Field::from),
        "[ -~]{0,8}".prop_map(Field::from),
        float().prop_map(Field::from),
        prop::collection::vec(any::<i64>(), 0..4).prop_map(Field::from),
    ];
    let nested = prop::collection::btree_map(name, leaf.clone(), 0..4)
        .prop_map(|fields| Field::Record(Record::from(fields)));
    let field = prop_oneof![3 => leaf, 1 => nested];
    prop::collection::btree_map(name, field, 0..6).prop_map(Record::from)
}

proptest! {
    #[test]
    fn varint_roundtrip(value in 0..=MAX_VARINT) {
        let mut buf = Vec::new();
        let len = encode_varint(value, &mut buf).unwrap();
        prop_assert_eq!(len, buf.len());
        prop_assert_eq!(Ok(len), varint::encoded_len(value));
        let mut pos = 0;
        prop_assert_eq!(decode_varint(&buf, &mut pos), Ok(value));
        prop_assert_eq!(pos, len);
    }

    #[test]
    fn varint_rejects_large(value in (MAX_VARINT + 1)..=u64::MAX) {
        let mut buf = Vec::new();
        prop_assert!(encode_varint(value, &mut buf).is_err());
        prop_assert!(buf.is_empty());
    }

    #[test]
    fn minimal_integer_roundtrip(value in any::<i64>(), min_len in 0usize..12) {
        let mut buf = Vec::new();
        let len = encode_minimal(value, min_len, &mut buf);
        prop_assert_eq!(len, buf.len());
        prop_assert_eq!(len, minimal_len(value).max(min_len.clamp(1, 8)));
        prop_assert_eq!(decode_minimal(&buf), Ok(value));
    }

    #[test]
    fn tree_roundtrip(tree in chunk_tree()) {
        let data = encode(&tree).unwrap();
        prop_assert_eq!(decode(&data).unwrap(), tree);
    }

    #[test]
    fn truncated_tree_fails(children in chunk_tree()) {
        let data = encode(&[Chunk::container(1, children)]).unwrap();
        for cut in 1..data.len() {
            prop_assert!(decode(&data[..cut]).is_err());
        }
    }

    #[test]
    fn arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = decode(&data);
        let _ = decode_with_key_table(&data);
    }

    #[test]
    fn key_table_roundtrip(records in prop::collection::vec(record(), 0..4)) {
        let data = encode_with_key_table(&records).unwrap();
        prop_assert_eq!(decode_with_key_table(&data).unwrap(), records);
    }
}
