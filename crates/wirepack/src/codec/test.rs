use std::{rc::Rc, sync::Arc};

use tracing_test::traced_test;

use super::*;
use crate::{Compatible, Decode, Encode, Shape, Signature};

#[derive(Debug, Clone, PartialEq, Shape, Encode, Decode)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, PartialEq, Shape, Encode, Decode)]
struct Labelled {
    id: u32,
    label: String,
    color: Compatible<u8, 1>,
}

#[derive(Debug, Clone, PartialEq, Shape, Encode, Decode)]
struct Holder {
    tag: u8,
    shared: Rc<Labelled>,
}

fn fresh() -> Labelled {
    Labelled { id: 8, label: "new".to_owned(), color: Compatible::absent() }
}

fn stale() -> Labelled {
    Labelled { id: 1, label: "old".to_owned(), color: Compatible::new(4) }
}

fn header_word(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[..4].try_into().unwrap())
}

#[test]
fn record_layout() {
    let bytes = Codec::default().serialize(&Point { x: 1, y: -1 }).unwrap();

    assert_eq!(bytes.len(), 12);
    assert_eq!(header_word(&bytes), Signature::of::<Point>().unwrap().to_raw());
    assert_eq!(&bytes[4..], [1, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
}

#[test]
fn nested_struct_carries_bitmap() {
    let bytes = Codec::default().serialize(&(7u8, Point { x: 1, y: 2 })).unwrap();

    // the tuple has no bitmap, the nested point writes an empty one
    assert_eq!(&bytes[4..], [7, 0, 1, 0, 0, 0, 2, 0, 0, 0]);
    assert_eq!(
        Codec::default().deserialize::<(u8, Point)>(&bytes).unwrap(),
        (7, Point { x: 1, y: 2 })
    );
}

#[test]
fn compatible_flag_and_bitmap() {
    let value = Labelled {
        id: 2,
        label: "a".to_owned(),
        color: Compatible::new(9),
    };
    let bytes = Codec::default().serialize(&value).unwrap();

    let signature = Signature::of::<Labelled>().unwrap();
    assert_eq!(header_word(&bytes), signature.to_raw() | 1);
    // bitmap, id, label, then the color slot
    assert_eq!(&bytes[4..], [1, 1, 2, 0, 0, 0, 1, b'a', 1, 9]);

    assert_eq!(Codec::default().deserialize::<Labelled>(&bytes).unwrap(), value);
}

#[test]
fn size_matches_output() {
    let codec = Codec::default();
    let value = vec!["one".to_owned(), "two".to_owned()];

    let bytes = codec.serialize(&value).unwrap();
    assert_eq!(codec.serialized_size(&value).unwrap(), bytes.len());
}

#[test]
fn append_keeps_prefix() {
    let mut buffer = vec![0xAB, 0xCD];
    let written = Codec::default().serialize_append(&7u16, &mut buffer).unwrap();

    assert_eq!(written, 6);
    assert_eq!(&buffer[..2], [0xAB, 0xCD]);
    assert_eq!(&buffer[6..], [7, 0]);
}

#[test]
fn offset_reserves_zeroes() {
    let codec = Codec::default();
    let bytes = codec.serialize_with_offset(&1u8, 3).unwrap();

    assert_eq!(&bytes[..3], [0, 0, 0]);
    assert_eq!(codec.deserialize::<u8>(&bytes[3..]).unwrap(), 1);
}

#[test]
#[traced_test]
fn serialize_to_checks_capacity_first() {
    let codec = Codec::default();
    let value = Point { x: 3, y: 4 };

    let mut small = [0x55; 11];
    let error = codec.serialize_to(&value, &mut small).unwrap_err();

    assert_eq!(error, Error::Capacity { required: 12, capacity: 11 });
    assert!(error.is_capacity());
    assert_eq!(small, [0x55; 11]);
    assert!(logs_contain("output region too small"));

    let mut exact = [0; 16];
    assert_eq!(codec.serialize_to(&value, &mut exact).unwrap(), 12);
    assert_eq!(codec.deserialize::<Point>(&exact[..12]).unwrap(), value);
}

#[test]
#[traced_test]
fn signature_mismatch() {
    let codec = Codec::default();
    let bytes = codec.serialize(&Point { x: 0, y: 0 }).unwrap();

    let error = codec.deserialize::<(i64,)>(&bytes).unwrap_err();
    assert!(error.is_schema_mismatch());
    assert_eq!(error, Error::SchemaMismatch {
        expected: Signature::of::<(i64,)>().unwrap(),
        found: Signature::of::<Point>().unwrap(),
    });
    assert!(logs_contain("signature mismatch"));
}

#[test]
fn same_shape_different_type() {
    let codec = Codec::default();
    let bytes = codec.serialize(&Point { x: 5, y: 6 }).unwrap();

    assert_eq!(codec.deserialize::<(i32, i32)>(&bytes).unwrap(), (5, 6));
}

#[test]
fn flag_on_non_aggregate() {
    let codec = Codec::default();
    let mut bytes = codec.serialize(&5u32).unwrap();
    bytes[0] |= 1;

    assert!(matches!(
        codec.deserialize::<u32>(&bytes),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn trailing_bytes() {
    let mut bytes = serialize_u8(3);
    bytes.push(0);

    assert_eq!(
        Codec::default().deserialize::<u8>(&bytes).unwrap_err(),
        Error::TrailingBytes { count: 1 }
    );

    let lenient =
        Codec::new(Options::builder().trailing_bytes(TrailingBytes::Ignore).build());
    assert_eq!(lenient.deserialize::<u8>(&bytes).unwrap(), 3);
}

#[test]
fn truncated_header() {
    let error = Codec::default().deserialize::<u8>(&[1, 2]).unwrap_err();
    assert!(error.is_truncated());
}

#[test]
fn deserialize_at_advances() {
    let codec = Codec::default();
    let mut bytes = codec.serialize(&1u16).unwrap();
    codec.serialize_append("two", &mut bytes).unwrap();

    let mut offset = 0;
    assert_eq!(codec.deserialize_at::<u16>(&bytes, &mut offset).unwrap(), 1);
    assert_eq!(offset, 6);

    // wrong type: the offset stays put
    assert!(codec.deserialize_at::<u16>(&bytes, &mut offset).is_err());
    assert_eq!(offset, 6);

    assert_eq!(codec.deserialize_at::<String>(&bytes, &mut offset).unwrap(), "two");
    assert_eq!(offset, bytes.len());

    let mut past_end = bytes.len() + 1;
    assert!(
        codec
            .deserialize_at::<u16>(&bytes, &mut past_end)
            .unwrap_err()
            .is_truncated()
    );
}

#[test]
fn deserialize_into_overwrites() {
    let codec = Codec::default();
    let bytes = codec
        .serialize(&Labelled {
            id: 8,
            label: "new".to_owned(),
            color: Compatible::absent(),
        })
        .unwrap();

    let mut value = Labelled {
        id: 1,
        label: "old".to_owned(),
        color: Compatible::new(4),
    };
    codec.deserialize_into(&bytes, &mut value).unwrap();

    assert_eq!(value, Labelled {
        id: 8,
        label: "new".to_owned(),
        color: Compatible::new(4),
    });
}

#[test]
fn deserialize_into_through_pointers() {
    let codec = Codec::default();
    let merged = Labelled { color: Compatible::new(4), ..fresh() };

    let bytes = codec.serialize(&Holder { tag: 2, shared: Rc::new(fresh()) }).unwrap();
    let mut holder = Holder { tag: 0, shared: Rc::new(stale()) };
    codec.deserialize_into(&bytes, &mut holder).unwrap();
    assert_eq!(holder, Holder { tag: 2, shared: Rc::new(merged.clone()) });

    let bytes = codec.serialize(&Arc::new(fresh())).unwrap();
    let mut value = Arc::new(stale());
    codec.deserialize_into(&bytes, &mut value).unwrap();
    assert_eq!(*value, merged);

    let mut value = Box::new(stale());
    codec.deserialize_into(&bytes, &mut value).unwrap();
    assert_eq!(*value, merged);
}

#[test]
fn deserialize_into_replaces_shared_pointee() {
    let codec = Codec::default();
    let bytes = codec.serialize(&fresh()).unwrap();

    let mut value = Arc::new(stale());
    let other = Arc::clone(&value);
    codec.deserialize_into(&bytes, &mut value).unwrap();

    assert_eq!(*value, fresh());
    assert_eq!(*other, stale());
}

#[test]
fn get_field_by_name() {
    let codec = Codec::default();
    let bytes = codec.serialize(&Point { x: 10, y: 20 }).unwrap();

    assert_eq!(codec.get_field::<Point, i32>(&bytes, "y").unwrap(), 20);
    assert_eq!(codec.get_field::<Point, i32>(&bytes, 0usize).unwrap(), 10);
}

fn serialize_u8(value: u8) -> Vec<u8> { Codec::default().serialize(&value).unwrap() }
