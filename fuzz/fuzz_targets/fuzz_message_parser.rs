#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_session::message::{CommunityMessage, ScopedPdu, V3Message, parse_trap};
use snmp_session::v3::{UsmSecurityParams, locate_auth_params};

fuzz_target!(|data: &[u8]| {
    let _ = CommunityMessage::decode(data);
    let _ = V3Message::decode(data);
    let _ = ScopedPdu::decode(data);
    let _ = parse_trap(data);
    let _ = UsmSecurityParams::decode(data);

    if let Some(range) = locate_auth_params(data) {
        assert!(range.end <= data.len());
    }
});
