#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_session::oid::Oid;

fuzz_target!(|data: &[u8]| {
    let _ = Oid::from_ber(data);

    if let Ok(s) = std::str::from_utf8(data)
        && let Ok(oid) = Oid::parse(s)
    {
        let _ = oid.to_ber();
    }
});
