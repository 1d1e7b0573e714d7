//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u64; 16]>` to avoid heap allocation for common OIDs.
//! Text form is dotted decimal with a leading dot (`.1.3.6.1.2.1`); the empty
//! OID is the root of the tree and prints as `.`.

use crate::error::{Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Arcs are ordered and compared lexicographically, which is the order agents
/// walk the MIB in. `Clone` yields an independent value, so a walk cursor never
/// aliases the OID it was derived from.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Oid {
    arcs: SmallVec<[u64; 16]>,
}

impl Oid {
    /// Create an empty OID (the root).
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    pub fn new(arcs: impl IntoIterator<Item = u64>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_session::oid::Oid;
    ///
    /// let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    /// assert_eq!(oid.to_string(), ".1.3.6.1.2.1.1.1.0");
    /// ```
    pub fn from_slice(arcs: &[u64]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation.
    ///
    /// `""` and `"."` give the empty OID. One leading dot is stripped; every
    /// remaining component must be a decimal `u64`.
    ///
    /// # Examples
    ///
    /// ```
    /// use snmp_session::oid::Oid;
    ///
    /// let a = Oid::parse(".1.3.6.1.2.1").unwrap();
    /// let b = Oid::parse("1.3.6.1.2.1").unwrap();
    /// assert_eq!(a, b);
    /// assert!(Oid::parse(".").unwrap().is_empty());
    /// assert!(Oid::parse("1.3.six").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::empty());
        }

        let body = s.strip_prefix('.').unwrap_or(s);
        let mut arcs = SmallVec::new();

        for part in body.split('.') {
            // u64::from_str accepts a leading '+', which is not valid OID text
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s));
            }
            let arc: u64 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u64] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Prefix containment: true when `other` is a prefix of `self`.
    ///
    /// Every OID is within itself and within the empty OID.
    ///
    /// ```
    /// use snmp_session::oid;
    ///
    /// assert!(oid!(1, 2, 3).within(&oid!(1, 2)));
    /// assert!(!oid!(1, 2).within(&oid!(1, 2, 3)));
    /// ```
    pub fn within(&self, other: &Oid) -> bool {
        other.len() <= self.len() && self.arcs[..other.len()] == other.arcs[..]
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u64) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Encode to BER content bytes (no tag or length).
    ///
    /// Requires at least three arcs starting with `1.3`, which collapse into the
    /// leading `0x2B` byte. Every remaining arc is written base-128, high bit
    /// set on all bytes but the last.
    pub fn to_ber(&self) -> Result<SmallVec<[u8; 64]>> {
        if self.arcs.len() < 3 {
            return Err(Error::invalid_oid(OidErrorKind::TooShort));
        }
        if self.arcs[0] != 1 || self.arcs[1] != 3 {
            return Err(Error::invalid_oid(OidErrorKind::UnsupportedPrefix));
        }

        let mut out = SmallVec::new();
        out.push(0x2B);
        for &arc in &self.arcs[2..] {
            encode_subidentifier(&mut out, arc);
        }
        Ok(out)
    }

    /// Decode from BER content bytes (no tag or length).
    ///
    /// The first subidentifier packs the first two arcs as `40 * a + b`
    /// (X.690 8.19.4): values below 80 split with div/mod 40, anything larger
    /// belongs to arc 2.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        // One content byte is enough: `06 01 00` is 0.0, so the two-byte
        // minimum of a well-formed wire OID is not enforced here.
        if data.is_empty() {
            return Err(Error::invalid_oid(OidErrorKind::Empty));
        }

        let mut arcs: SmallVec<[u64; 16]> = SmallVec::new();
        let mut value: u64 = 0;
        let mut first = true;

        for (i, &byte) in data.iter().enumerate() {
            if value > (u64::MAX >> 7) {
                return Err(Error::invalid_oid(OidErrorKind::SubidentifierOverflow));
            }
            value = (value << 7) | u64::from(byte & 0x7F);

            if byte & 0x80 != 0 {
                if i == data.len() - 1 {
                    return Err(Error::invalid_oid(OidErrorKind::TruncatedSubidentifier));
                }
                continue;
            }

            if first {
                let (a, b) = match value {
                    0..40 => (0, value),
                    40..80 => (1, value - 40),
                    _ => (2, value - 80),
                };
                arcs.push(a);
                arcs.push(b);
                first = false;
            } else {
                arcs.push(value);
            }
            value = 0;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                }));
            }
        }

        Ok(Self { arcs })
    }
}

fn encode_subidentifier(out: &mut SmallVec<[u8; 64]>, value: u64) {
    if value == 0 {
        out.push(0);
        return;
    }
    let groups = (64 - value.leading_zeros() as usize).div_ceil(7);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i != 0 {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arcs.is_empty() {
            return f.write_str(".");
        }
        for arc in &self.arcs {
            write!(f, ".{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u64]> for Oid {
    fn from(arcs: &[u64]) -> Self {
        Self::from_slice(arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```
/// use snmp_session::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.len(), 9);
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
