use super::*;
use crate::{
    Compatible, Decode, Encode, Options, Shape,
    wire::{BufferEncoder, SliceDecoder},
};

#[derive(Debug, PartialEq, Shape, Encode, Decode)]
struct Record {
    id: u32,
    flag: bool,
    name: String,
    score: u64,
    extra: Compatible<u8, 1>,
    note: Compatible<String, 2>,
}

#[derive(Debug, PartialEq, Shape, Encode, Decode)]
enum Event {
    Tick,
    Move { x: i16, y: i16 },
    Say(String),
}

#[derive(Debug, PartialEq, Shape, Encode, Decode)]
struct Plain {
    a: u32,
    b: u16,
}

#[derive(Debug, PartialEq, Shape, Encode, Decode)]
struct Wrapper {
    head: u8,
    plain: Plain,
    tail: u32,
}

#[derive(Shape)]
struct Looping {
    next: Option<Box<Looping>>,
}

#[test]
fn offsets_stop_at_variable_width() {
    let layout = Layout::of::<Record>().unwrap();
    let offsets = layout.fields().iter().map(FieldLayout::offset).collect::<Vec<_>>();

    assert_eq!(offsets, [Some(0), Some(4), Some(5), None, None, None]);
}

#[test]
fn nested_structs_are_variable_width() {
    let layout = Layout::of::<Wrapper>().unwrap();

    let offsets = layout.fields().iter().map(FieldLayout::offset).collect::<Vec<_>>();
    assert_eq!(offsets, [Some(0), Some(1), None]);

    let encodings =
        layout.fields().iter().map(FieldLayout::encoding).collect::<Vec<_>>();
    assert_eq!(encodings, [Encoding::Fixed(1), Encoding::Nested, Encoding::Fixed(4)]);

    assert_eq!(Layout::of::<Plain>().unwrap().fixed_size(), Some(6));
    assert_eq!(layout.fixed_size(), None);
}

#[test]
fn encodings() {
    let layout = Layout::of::<Record>().unwrap();
    let encodings =
        layout.fields().iter().map(FieldLayout::encoding).collect::<Vec<_>>();

    assert_eq!(encodings, [
        Encoding::Fixed(4),
        Encoding::Fixed(1),
        Encoding::LengthPrefixed,
        Encoding::Fixed(8),
        Encoding::Compatible,
        Encoding::Compatible,
    ]);

    assert_eq!(Encoding::of(&Descriptor::Optional(Box::new(Descriptor::Unit))), Encoding::Optional);
    assert_eq!(
        Encoding::of(Layout::of::<Event>().unwrap().descriptor()),
        Encoding::Variant { discriminant_width: 1 }
    );
}

#[test]
fn compatible_slots() {
    let layout = Layout::of::<Record>().unwrap();

    assert!(layout.has_compatible());
    assert_eq!(layout.mandatory_fields().count(), 4);

    let slots =
        layout.compatible_fields().filter_map(FieldLayout::compatible).collect::<Vec<_>>();
    assert_eq!(slots, [
        CompatibleSlot { slot: 0, version: 1 },
        CompatibleSlot { slot: 1, version: 2 },
    ]);

    // the wrapped shape, not the wrapper
    let extra = layout.field(FieldSelector::Name("extra")).unwrap();
    assert_eq!(extra.literal(), Layout::of::<u8>().unwrap().descriptor().literal());
}

#[test]
fn field_lookup() {
    let layout = Layout::of::<Record>().unwrap();

    assert_eq!(layout.field(FieldSelector::Index(2)).unwrap().name(), "name");
    assert_eq!(layout.field(FieldSelector::Name("score")).unwrap().index(), 3);
    assert!(layout.field(FieldSelector::Index(6)).is_none());
    assert!(layout.field(FieldSelector::Name("missing")).is_none());
}

#[test]
fn non_aggregates_have_no_fields() {
    let layout = Layout::of::<Vec<u8>>().unwrap();

    assert!(layout.fields().is_empty());
    assert!(!layout.has_compatible());
    assert_eq!(layout.fixed_size(), None);
    assert_eq!(Layout::of::<(u32, u16)>().unwrap().fixed_size(), Some(6));
}

#[test]
fn cached_per_type() {
    let first = Layout::of::<Record>().unwrap();
    let second = Layout::of::<Record>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.type_name(), std::any::type_name::<Record>());
}

#[test]
fn failures_are_not_cached() {
    assert!(matches!(Layout::of::<Looping>(), Err(Error::CyclicType { .. })));
    assert!(matches!(Layout::of::<Looping>(), Err(Error::CyclicType { .. })));
}

#[test]
fn skip_walks_every_kind() {
    let record = Record {
        id: 1,
        flag: true,
        name: "skip".to_owned(),
        score: 9,
        extra: Compatible::absent(),
        note: Compatible::new("note".to_owned()),
    };
    let value = (
        record,
        vec![Event::Tick, Event::Move { x: 1, y: -1 }, Event::Say("hi".to_owned())],
        Some([1u16, 2, 3]),
        std::collections::BTreeMap::from([(1u8, "one".to_owned())]),
    );

    let mut bytes = Vec::new();
    value.encode(&mut BufferEncoder::new(&mut bytes)).unwrap();
    bytes.push(0xEE);

    let layout = Layout::of::<(
        Record,
        Vec<Event>,
        Option<[u16; 3]>,
        std::collections::BTreeMap<u8, String>,
    )>()
    .unwrap();

    let options = Options::default();
    let mut decoder = SliceDecoder::new(&bytes, &options);
    skip(layout.descriptor(), &mut decoder).unwrap();

    assert_eq!(decoder.rest(), [0xEE]);
}

#[test]
fn skip_reads_nested_bitmaps() {
    let value = (
        Wrapper { head: 1, plain: Plain { a: 2, b: 3 }, tail: 4 },
        Plain { a: 5, b: 6 },
    );

    let mut bytes = Vec::new();
    value.encode(&mut BufferEncoder::new(&mut bytes)).unwrap();
    assert_eq!(bytes.len(), (1 + 1 + 1 + 6 + 4) + (1 + 6));
    bytes.push(0xEE);

    let layout = Layout::of::<(Wrapper, Plain)>().unwrap();
    let options = Options::default();
    let mut decoder = SliceDecoder::new(&bytes, &options);
    skip(layout.descriptor(), &mut decoder).unwrap();

    assert_eq!(decoder.rest(), [0xEE]);
}

#[test]
fn skip_truncated() {
    let options = Options::default();
    let mut decoder = SliceDecoder::new(&[3, b'a'], &options);

    assert!(skip(&Descriptor::Text, &mut decoder).unwrap_err().is_truncated());
}
