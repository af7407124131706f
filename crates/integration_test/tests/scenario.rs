#![allow(missing_docs)]

use wirepack_integration_test::{IdFirst, NameFirst};

#[test]
fn id_then_name() {
    let value = IdFirst { id: 42, name: "ab".to_owned() };
    let bytes = wirepack::serialize(&value).unwrap();

    assert_eq!(bytes, [
        0x7A, 0x51, 0xE2, 0x4F, // signature 0x4fe2517a
        42, 0, 0, 0, // id
        2, b'a', b'b', // name
    ]);
    assert_eq!(wirepack::deserialize::<IdFirst>(&bytes).unwrap(), value);
}

#[test]
fn name_then_id() {
    let value = NameFirst { name: "ab".to_owned(), id: 42 };
    let bytes = wirepack::serialize(&value).unwrap();

    assert_eq!(bytes, [
        0x26, 0xE3, 0x8F, 0xD1, // signature 0xd18fe326
        2, b'a', b'b', // name
        42, 0, 0, 0, // id
    ]);
    assert_eq!(wirepack::deserialize::<NameFirst>(&bytes).unwrap(), value);
}

#[test]
fn orders_do_not_mix() {
    let bytes =
        wirepack::serialize(&IdFirst { id: 42, name: "ab".to_owned() }).unwrap();

    assert!(wirepack::deserialize::<NameFirst>(&bytes).unwrap_err().is_schema_mismatch());
}
