//! Well-known OID names.
//!
//! A short fixed table for display and for naming a table root on the
//! command line. Not MIB support.

use crate::Oid;

static WELL_KNOWN_OIDS: &[(&[u64], &str)] = &[
    // SNMPv2-MIB::system
    (&[1, 3, 6, 1, 2, 1, 1, 1, 0], "sysDescr.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 2, 0], "sysObjectID.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 3, 0], "sysUpTime.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 4, 0], "sysContact.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 5, 0], "sysName.0"),
    (&[1, 3, 6, 1, 2, 1, 1, 6, 0], "sysLocation.0"),
    // Notification objects
    (&[1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0], "snmpTrapOID.0"),
    (&[1, 3, 6, 1, 6, 3, 1, 1, 5, 1], "coldStart"),
    (&[1, 3, 6, 1, 6, 3, 1, 1, 5, 3], "linkDown"),
    (&[1, 3, 6, 1, 6, 3, 1, 1, 5, 4], "linkUp"),
    // Table roots
    (&[1, 3, 6, 1, 2, 1, 1], "system"),
    (&[1, 3, 6, 1, 2, 1, 2, 2], "ifTable"),
    (&[1, 3, 6, 1, 2, 1, 2, 2, 1], "ifEntry"),
    (&[1, 3, 6, 1, 2, 1, 4, 20], "ipAddrTable"),
    (&[1, 3, 6, 1, 2, 1, 31, 1, 1], "ifXTable"),
];

/// Friendly name for an OID in the table.
pub fn lookup(oid: &Oid) -> Option<&'static str> {
    let arcs = oid.arcs();
    WELL_KNOWN_OIDS
        .iter()
        .find(|(pattern, _)| *pattern == arcs)
        .map(|(_, name)| *name)
}

/// Parse dotted notation or a well-known name (case-insensitive).
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    WELL_KNOWN_OIDS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(s))
        .map(|(arcs, _)| Oid::from_slice(arcs))
        .ok_or_else(|| {
            format!(
                "unknown OID name '{}'; use dotted notation (e.g. 1.3.6.1.2.1.2.2)",
                s
            )
        })
}
