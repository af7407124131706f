#![allow(missing_docs)]

use wirepack::{Codec, Compatible, Error, FieldSelector};
use wirepack_integration_test::{Inventory, Telemetry, v1, v3};

#[test]
fn field_past_variable_width_prefix() {
    let bytes = wirepack::serialize(&Inventory::sample()).unwrap();

    let grid: [[u8; 3]; 2] = wirepack::get_field::<Inventory, _>(&bytes, "grid").unwrap();
    assert_eq!(grid, [[1, 2, 3], [4, 5, 6]]);

    let outcome: Result<u16, String> =
        wirepack::get_field::<Inventory, _>(&bytes, "outcome").unwrap();
    assert_eq!(outcome, Err("pending".to_owned()));
}

#[test]
fn several_fields_at_once() {
    let value = Telemetry::new(10);
    let bytes = wirepack::serialize(&value).unwrap();

    let record = wirepack::deserialize_partial::<Telemetry>(&bytes, &[
        "host".into(),
        FieldSelector::Index(2),
        "region".into(),
    ])
    .unwrap();

    assert_eq!(record.get::<String>("host").unwrap(), value.host);
    assert_eq!(record.get::<(u64, u64)>(2usize).unwrap(), value.window);
    assert_eq!(record.get::<String>("region").unwrap(), "eu");
}

#[test]
fn absent_compatible_field() {
    let bytes = wirepack::serialize(&Telemetry::new(11)).unwrap();

    assert!(matches!(
        wirepack::get_field::<Telemetry, String>(&bytes, "region"),
        Err(Error::FieldAbsent { .. })
    ));
}

#[test]
fn field_written_by_older_producer() {
    let bytes =
        wirepack::serialize(&v1::Profile { id: 3, name: "old".to_owned() }).unwrap();
    let record =
        wirepack::deserialize_partial::<v3::Profile>(&bytes, &["name".into(), "phone".into()])
            .unwrap();

    assert_eq!(record.get::<String>("name").unwrap(), "old");
    assert!(!record.is_present("phone").unwrap());
}

#[test]
fn field_unknown_to_older_consumer_is_skipped() {
    let bytes = wirepack::serialize(&v3::Profile {
        id: 4,
        name: "new".to_owned(),
        email: Compatible::new("a@b".to_owned()),
        phone: Compatible::new(1),
    })
    .unwrap();

    let name: String = wirepack::get_field::<v1::Profile, _>(&bytes, 1usize).unwrap();
    assert_eq!(name, "new");
}

#[test]
fn wrong_field_shape() {
    let bytes = wirepack::serialize(&Telemetry::new(2)).unwrap();
    let codec = Codec::default();

    assert!(matches!(
        codec.get_field::<Telemetry, Vec<u64>>(&bytes, "samples"),
        Err(Error::FieldShapeMismatch { .. })
    ));
}
