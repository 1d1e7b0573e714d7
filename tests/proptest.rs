//! Property tests for the codec and OID primitives.

use std::net::Ipv4Addr;

use bytes::Bytes;
use proptest::prelude::*;
use snmp_session::ber::{
    decode_integer, decode_length, decode_sequence, decode_signed, encode_integer, encode_length,
    encode_sequence, encode_signed,
};
use snmp_session::{Oid, SequenceTag, Value};

/// OIDs under `1.3`, the only prefix the encoder writes.
fn encodable_oid() -> impl Strategy<Value = Oid> {
    prop::collection::vec(
        prop_oneof![0u64..128, 128u64..=u64::from(u32::MAX), any::<u64>()],
        1..32,
    )
    .prop_map(|tail| Oid::new([1, 3].into_iter().chain(tail)))
}

/// Values that survive an encode/decode cycle unchanged.
fn plain_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Boolean),
        any::<i64>().prop_map(Value::Integer),
        prop::collection::vec(any::<u8>(), 0..300).prop_map(|b| Value::OctetString(Bytes::from(b))),
        Just(Value::Null),
        encodable_oid().prop_map(Value::ObjectIdentifier),
        any::<u32>().prop_map(Value::Counter),
        any::<u32>().prop_map(Value::Gauge),
        any::<u32>().prop_map(Value::TimeTicks),
        any::<[u8; 4]>().prop_map(|o| Value::IpAddress(Ipv4Addr::from(o))),
    ]
}

proptest! {
    #[test]
    fn oid_text_round_trip(oid in encodable_oid()) {
        let text = oid.to_string();
        prop_assert!(text.starts_with(".1.3"));
        prop_assert_eq!(Oid::parse(&text).unwrap(), oid.clone());
        prop_assert_eq!(Oid::parse(&text[1..]).unwrap(), oid);
    }

    #[test]
    fn oid_ber_round_trip(oid in encodable_oid()) {
        let ber = oid.to_ber().unwrap();
        prop_assert_eq!(ber[0], 0x2B);
        prop_assert_eq!(Oid::from_ber(&ber).unwrap(), oid);
    }

    #[test]
    fn signed_integer_round_trip(value in any::<i64>()) {
        let bytes = encode_signed(value);
        prop_assert!(!bytes.is_empty() && bytes.len() <= 8);
        prop_assert_eq!(decode_signed(&bytes).unwrap(), value);
    }

    #[test]
    fn unsigned_integer_round_trip(value in any::<u64>()) {
        let bytes = encode_integer(value);
        // Minimal: no redundant leading zero byte.
        prop_assert!(bytes.len() == 1 || bytes[0] != 0);
        prop_assert_eq!(decode_integer(&bytes).unwrap(), value);
    }

    #[test]
    fn length_round_trip(len in 0usize..=u32::MAX as usize) {
        let bytes = encode_length(len);
        prop_assert_eq!(bytes.len() == 1, len <= 127);
        prop_assert_eq!(decode_length(&bytes).unwrap(), (len, bytes.len()));
    }

    #[test]
    fn sequence_round_trip(values in prop::collection::vec(plain_value(), 0..12)) {
        let mut items = vec![Value::Tag(SequenceTag::Sequence)];
        items.extend(values);
        let bytes = encode_sequence(&items).unwrap();
        prop_assert_eq!(decode_sequence(&bytes).unwrap(), items);
    }

    #[test]
    fn decoder_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_sequence(&data);
        let _ = Oid::from_ber(&data);
    }
}
