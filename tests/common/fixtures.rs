//! Common test fixtures and constants.

use snmp_session::util::hex;
use snmp_session::{Oid, Value, oid};

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_uptime() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifDescr column: 1.3.6.1.2.1.2.2.1.2
pub fn if_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

/// ifType column, right after ifDescr
pub fn if_type() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 3)
}

/// Auth password for the simulated USM user
pub const AUTH_PASSWORD: &str = "authpass123";
/// Privacy password for the simulated USM user
pub const PRIV_PASSWORD: &str = "privpass123";
pub const USERNAME: &str = "operator";
pub const COMMUNITY: &str = "public";

/// Engine ID of the simulated agent (net-snmp style, text format)
pub const ENGINE_ID: &[u8] = b"\x80\x00\x1f\x88\x04sim-agent";

/// A small MIB: the system group and a three-row ifDescr column.
pub fn sample_mib() -> Vec<(Oid, Value)> {
    let mut mib = vec![
        (sys_descr(), Value::from("Simulated agent")),
        (
            oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)),
        ),
        (sys_uptime(), Value::TimeTicks(76_705_700)),
        (sys_name(), Value::from("core-1")),
    ];
    for (index, name) in [(1, "lo"), (2, "eth0"), (3, "eth1")] {
        mib.push((if_descr().child(index), Value::from(name)));
    }
    for index in 1..=3 {
        mib.push((if_type().child(index), Value::Integer(6)));
    }
    mib
}

/// Decode a hex fixture.
pub fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).expect("valid hex fixture")
}
