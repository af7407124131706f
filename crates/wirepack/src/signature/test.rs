use super::*;
use crate::{Decode, Encode, Shape, wire::SliceDecoder};

#[derive(Shape, Encode, Decode)]
struct Person {
    id: u32,
    name: String,
}

#[derive(Shape, Encode, Decode)]
struct Renamed {
    key: u32,
    label: String,
}

#[derive(Shape, Encode, Decode)]
struct Swapped {
    name: String,
    id: u32,
}

#[test]
fn pinned_values() {
    // SipHash-1-3 under the frozen keys; changing any of these means the
    // algorithm version must be bumped.
    assert_eq!(Signature::of_literal(&[0x07, 4]).to_raw(), 0x3373_af32);
    assert_eq!(Signature::of_literal(&[0x01]).to_raw(), 0xf844_89e2);
    assert_eq!(
        Signature::of_literal(&[0xFE, 0x07, 4, 0x10, 0xFF]).to_raw(),
        0x4fe2_517a
    );

    assert_eq!(Signature::of::<u32>().unwrap().to_raw(), 0x3373_af32);
    assert_eq!(Signature::of::<Person>().unwrap().to_raw(), 0x4fe2_517a);
}

#[test]
fn names_do_not_matter() {
    assert_eq!(
        Signature::of::<Person>().unwrap(),
        Signature::of::<Renamed>().unwrap()
    );
}

#[test]
fn order_matters() {
    assert_ne!(
        Signature::of::<Person>().unwrap(),
        Signature::of::<Swapped>().unwrap()
    );
    assert_eq!(Signature::of::<Swapped>().unwrap().to_raw(), 0xd18f_e326);
}

#[test]
fn low_bit_is_reserved() {
    for literal in [&[0x02, 1][..], &[0x10], &[0x11, 0x03, 1], &[0xFE, 0xFF]] {
        assert_eq!(Signature::of_literal(literal).to_raw() & 1, 0);
    }

    assert_eq!(Signature::from_raw(0x1234_5679).to_raw(), 0x1234_5678);
}

#[test]
fn display_is_hex() {
    let signature = Signature::from_raw(0x00ab_cdee);
    assert_eq!(signature.to_string(), "0x00abcdee");
    assert_eq!(format!("{signature:?}"), "Signature(0x00abcdee)");
}

#[test]
fn header_word_carries_flag() {
    let mut bytes = Vec::new();
    let header = Header {
        signature: Signature::from_raw(0x4fe2_517a),
        has_compatible: true,
    };
    header.encode(&mut crate::wire::BufferEncoder::new(&mut bytes)).unwrap();
    assert_eq!(bytes, 0x4fe2_517bu32.to_le_bytes());

    let options = crate::Options::default();
    let mut decoder = SliceDecoder::new(&bytes, &options);
    assert_eq!(Header::decode(&mut decoder).unwrap(), header);
}
