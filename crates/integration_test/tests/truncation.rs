#![allow(missing_docs)]

use proptest::prelude::*;
use wirepack::{Compatible, Decode, Shape};
use wirepack_integration_test::{Inventory, Telemetry, v2, v3};

fn assert_every_prefix_truncated<T: Shape + Decode + std::fmt::Debug>(bytes: &[u8]) {
    for len in 0..bytes.len() {
        let error = wirepack::deserialize::<T>(&bytes[..len]).unwrap_err();
        assert!(error.is_truncated(), "prefix of {len} bytes gave {error:?}");
    }
}

#[test]
fn mixed_shapes() {
    let bytes = wirepack::serialize(&Inventory::sample()).unwrap();
    assert_every_prefix_truncated::<Inventory>(&bytes);
}

#[test]
fn nested_compatible_fields() {
    let bytes = wirepack::serialize(&v3::Envelope {
        sequence: 3,
        profile: v3::Profile {
            id: 1,
            name: "n".to_owned(),
            email: Compatible::absent(),
            phone: Compatible::new(9),
        },
        checksum: 4,
    })
    .unwrap();

    assert_every_prefix_truncated::<v3::Envelope>(&bytes);
    // the old consumer skips `phone` but still needs its bytes
    assert_every_prefix_truncated::<v2::Envelope>(&bytes);
}

#[test]
fn in_place_and_offset_decodes() {
    let bytes = wirepack::serialize(&Telemetry::new(6)).unwrap();

    for len in 0..bytes.len() {
        let mut value = Telemetry::new(1);
        let error = wirepack::deserialize_into(&bytes[..len], &mut value).unwrap_err();
        assert!(error.is_truncated());

        let mut offset = 0;
        let error =
            wirepack::deserialize_at::<Telemetry>(&bytes[..len], &mut offset).unwrap_err();
        assert!(error.is_truncated());
        assert_eq!(offset, 0);
    }
}

proptest! {
    #[test]
    fn any_telemetry(seed in any::<u32>(), cut in 1usize..64) {
        let bytes = wirepack::serialize(&Telemetry::new(seed)).unwrap();
        let len = bytes.len().saturating_sub(cut);

        let error = wirepack::deserialize::<Telemetry>(&bytes[..len]).unwrap_err();
        prop_assert!(error.is_truncated(), "{:?}", error);
    }

    #[test]
    fn any_text(text in ".{0,40}", cut in 1usize..8) {
        let bytes = wirepack::serialize(&text).unwrap();
        let len = bytes.len().saturating_sub(cut);

        prop_assert!(wirepack::deserialize::<String>(&bytes[..len]).unwrap_err().is_truncated());
    }
}
