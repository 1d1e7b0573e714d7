#![no_main]

use libfuzzer_sys::fuzz_target;

use snmp_session::ber::{decode_integer, decode_length, decode_sequence, decode_signed, encode_sequence};

fuzz_target!(|data: &[u8]| {
    let _ = decode_length(data);
    let _ = decode_integer(data);
    let _ = decode_signed(data);

    // Anything that decodes must re-encode.
    if let Ok(values) = decode_sequence(data) {
        let _ = encode_sequence(&values);
    }
});
