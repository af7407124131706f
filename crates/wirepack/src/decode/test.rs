use super::*;
use crate::{
    Encode,
    wire::{BufferEncoder, SliceDecoder},
};

fn body<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut bytes = Vec::new();
    value.encode(&mut BufferEncoder::new(&mut bytes)).unwrap();
    bytes
}

fn decode_with<T: Decode>(bytes: &[u8], options: &Options) -> Result<T> {
    let mut decoder = SliceDecoder::new(bytes, options);
    T::decode(&mut decoder)
}

fn decode_body<T: Decode>(bytes: &[u8]) -> Result<T> {
    decode_with(bytes, &Options::default())
}

#[test]
fn strict_bool() {
    assert!(!decode_body::<bool>(&[0]).unwrap());
    assert!(decode_body::<bool>(&[1]).unwrap());
    assert!(matches!(decode_body::<bool>(&[2]), Err(Error::InvalidData(_))));
}

#[test]
fn invalid_char() {
    let surrogate = 0xD800u32.to_le_bytes();
    assert!(matches!(
        decode_body::<char>(&surrogate),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn invalid_utf8() {
    assert!(matches!(
        decode_body::<String>(&[2, 0xC3, 0x28]),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn length_past_end_is_truncated() {
    let error = decode_body::<String>(&[5, b'a', b'b']).unwrap_err();
    assert_eq!(error, Error::Truncated { needed: 5, available: 2 });
}

#[test]
fn forged_count_does_not_allocate() {
    // claims u32::MAX elements but carries none
    let mut bytes = Vec::new();
    crate::wire::write_varint(&mut bytes, u64::from(u32::MAX));

    assert!(decode_body::<Vec<u64>>(&bytes).unwrap_err().is_truncated());
}

#[test]
fn collection_limit() {
    let options = Options::builder().max_collection_len(2).build();
    let bytes = body(&vec![1u8, 2, 3]);

    assert!(matches!(
        decode_with::<Vec<u8>>(&bytes, &options),
        Err(Error::InvalidData(_))
    ));
    assert_eq!(decode_body::<Vec<u8>>(&bytes).unwrap(), [1, 2, 3]);
}

#[test]
fn duplicate_keys() {
    // a set of two identical u8 elements
    assert!(matches!(
        decode_body::<BTreeSet<u8>>(&[2, 7, 7]),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        decode_body::<HashSet<u8>>(&[2, 7, 7]),
        Err(Error::InvalidData(_))
    ));
    assert!(matches!(
        decode_body::<HashMap<u8, u8>>(&[2, 1, 0, 1, 9]),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn result_discriminant() {
    let ok: std::result::Result<u8, String> = Ok(4);
    assert_eq!(body(&ok), [0, 4]);
    assert_eq!(
        decode_body::<std::result::Result<u8, String>>(&[0, 4]).unwrap(),
        ok
    );

    assert!(matches!(
        decode_body::<std::result::Result<u8, String>>(&[2, 4]),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn option_presence_byte() {
    assert_eq!(body(&Some(3u16)), [1, 3, 0]);
    assert_eq!(body(&None::<u16>), [0]);
    assert!(matches!(
        decode_body::<Option<u16>>(&[3, 0, 0]),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn duration_range() {
    let value = Duration::new(5, 7);
    assert_eq!(decode_body::<Duration>(&body(&value)).unwrap(), value);

    let mut bytes = body(&5u64);
    bytes.extend_from_slice(&1_000_000_000u32.to_le_bytes());
    assert!(matches!(
        decode_body::<Duration>(&bytes),
        Err(Error::InvalidData(_))
    ));
}

#[test]
fn arrays_have_no_prefix() {
    let value = [1u16, 2, 3];
    let bytes = body(&value);
    assert_eq!(bytes.len(), 6);
    assert_eq!(decode_body::<[u16; 3]>(&bytes).unwrap(), value);
}

#[test]
fn nested_containers() {
    let value: BTreeMap<String, Vec<Option<i64>>> = [
        ("a".to_owned(), vec![Some(-1), None]),
        ("b".to_owned(), Vec::new()),
    ]
    .into_iter()
    .collect();

    assert_eq!(decode_body::<BTreeMap<_, _>>(&body(&value)).unwrap(), value);
}

#[test]
fn smart_pointers() {
    let value: Arc<str> = Arc::from("shared");
    assert_eq!(decode_body::<Arc<str>>(&body(&value)).unwrap(), value);

    let value: Box<[u8]> = vec![1, 2].into_boxed_slice();
    assert_eq!(decode_body::<Box<[u8]>>(&body(&value)).unwrap(), value);

    let value = Rc::new(LinkedList::from([1u8, 2]));
    assert_eq!(decode_body::<Rc<LinkedList<u8>>>(&body(&value)).unwrap(), value);
}
