use super::*;
use crate::{
    Options,
    wire::{BufferEncoder, SliceDecoder},
};

fn bitmap(slots: &[bool]) -> PresenceBitmap {
    let mut presence = PresenceBitmap::new();
    for present in slots {
        presence.push(*present).unwrap();
    }
    presence
}

fn encoded(presence: &PresenceBitmap) -> Vec<u8> {
    let mut bytes = Vec::new();
    presence.encode(&mut BufferEncoder::new(&mut bytes)).unwrap();
    bytes
}

fn decode_bitmap(bytes: &[u8]) -> Result<PresenceBitmap> {
    let options = Options::default();
    PresenceBitmap::decode(&mut SliceDecoder::new(bytes, &options))
}

#[test]
fn bitmap_lsb_first() {
    let presence = bitmap(&[true, false, true]);

    assert_eq!(encoded(&presence), [3, 0b101]);
    assert_eq!(presence.encoded_len(), 2);
    assert!(presence.is_present(0));
    assert!(!presence.is_present(1));
    assert!(presence.is_present(2));
    assert!(!presence.is_present(3));
}

#[test]
fn bitmap_spans_bytes() {
    let mut slots = [false; 10];
    slots[9] = true;
    let presence = bitmap(&slots);

    assert_eq!(encoded(&presence), [10, 0, 0b10]);
    assert_eq!(decode_bitmap(&[10, 0, 0b10]).unwrap(), presence);
}

#[test]
fn empty_bitmap() {
    let presence = PresenceBitmap::new();
    assert!(presence.is_empty());
    assert_eq!(encoded(&presence), [0]);
    assert_eq!(decode_bitmap(&[0]).unwrap(), presence);
}

#[test]
fn full_bitmap() {
    let presence = bitmap(&[true; MAX_COMPATIBLE_FIELDS]);
    let bytes = encoded(&presence);

    assert_eq!(bytes.len(), 9);
    assert_eq!(decode_bitmap(&bytes).unwrap(), presence);

    let mut presence = presence;
    assert!(matches!(presence.push(false), Err(Error::InvalidData(_))));
}

#[test]
fn bitmap_rejects_stray_bits() {
    // two slots, third bit set
    assert!(matches!(decode_bitmap(&[2, 0b100]), Err(Error::InvalidData(_))));
}

#[test]
fn bitmap_rejects_oversized_count() {
    assert!(matches!(decode_bitmap(&[65]), Err(Error::InvalidData(_))));
}

#[test]
fn bitmap_truncated() {
    assert!(decode_bitmap(&[9, 0xFF]).unwrap_err().is_truncated());
}

#[test]
fn encode_is_length_prefixed() {
    let field = Compatible::<String, 3>::new("hi".to_owned());

    let mut bytes = Vec::new();
    field.encode(&mut BufferEncoder::new(&mut bytes)).unwrap();
    // payload length, string length, text
    assert_eq!(bytes, [3, 2, b'h', b'i']);

    let mut bytes = Vec::new();
    Compatible::<String, 3>::absent()
        .encode(&mut BufferEncoder::new(&mut bytes))
        .unwrap();
    assert!(bytes.is_empty());
}

#[test]
fn read_present_and_absent() {
    let options = Options::default();
    let bytes = [4, 7, 0, 0, 0];
    let mut decoder = SliceDecoder::new(&bytes, &options);

    let mut fields = CompatibleFields::new(bitmap(&[false, true]));
    assert_eq!(fields.read::<u32, _>(&mut decoder).unwrap(), None);
    assert_eq!(fields.read::<u32, _>(&mut decoder).unwrap(), Some(7));
    // past the producer's slots
    assert_eq!(fields.read::<u32, _>(&mut decoder).unwrap(), None);
    assert_eq!(decoder.remaining(), 0);
}

#[test]
fn read_length_mismatch() {
    let options = Options::default();
    // declares five bytes for a four byte u32
    let bytes = [5, 7, 0, 0, 0, 0];
    let mut decoder = SliceDecoder::new(&bytes, &options);

    let mut fields = CompatibleFields::new(bitmap(&[true]));
    assert!(matches!(
        fields.read::<u32, _>(&mut decoder),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn read_length_past_end() {
    let options = Options::default();
    let bytes = [9, 7, 0];
    let mut decoder = SliceDecoder::new(&bytes, &options);

    let mut fields = CompatibleFields::new(bitmap(&[true]));
    assert_eq!(
        fields.read::<u32, _>(&mut decoder).unwrap_err(),
        Error::Truncated { needed: 9, available: 2 }
    );
}

#[test]
fn finish_skips_unknown_slots() {
    let options = Options::default();
    let bytes = [1, 0xAA, 2, 0xBB, 0xCC, 0xEE];
    let mut decoder = SliceDecoder::new(&bytes, &options);

    let mut fields = CompatibleFields::new(bitmap(&[true, false, true]));
    assert_eq!(fields.read::<u8, _>(&mut decoder).unwrap(), Some(0xAA));
    fields.finish(&mut decoder).unwrap();

    assert_eq!(decoder.rest(), [0xEE]);
}

#[test]
fn decode_into_keeps_absent_value() {
    let options = Options::default();
    let mut decoder = SliceDecoder::new(&[], &options);
    let mut fields = CompatibleFields::new(bitmap(&[false]));

    let mut field = Compatible::<u8>::new(5);
    field.decode_field_into(&mut decoder, &mut fields).unwrap();
    assert_eq!(field.get(), Some(&5));
}

#[test]
fn standalone_decode_fails() {
    let options = Options::default();
    let mut decoder = SliceDecoder::new(&[1, 1], &options);

    assert!(matches!(
        Compatible::<u8>::decode(&mut decoder),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn accessors() {
    let mut field = Compatible::<u8, 9>::default();
    assert_eq!(Compatible::<u8, 9>::VERSION, 9);
    assert!(!field.is_present());

    assert_eq!(field.set(1), None);
    *field.get_mut().unwrap() += 1;
    assert_eq!(field.take(), Some(2));
    assert_eq!(Option::from(field), None::<u8>);
    assert_eq!(Compatible::<u8>::from(Some(3)).into_inner(), Some(3));
}
