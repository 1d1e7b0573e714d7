//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value. On the wire each binding is a
//! two-element SEQUENCE, and a PDU carries them in one enclosing SEQUENCE.

use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use crate::value::{SequenceTag, Value, field};

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// The binding as `Sequence(oid, value)`.
    pub fn to_value(&self) -> Value {
        Value::sequence(
            SequenceTag::Sequence,
            [
                Value::ObjectIdentifier(self.oid.clone()),
                self.value.clone(),
            ],
        )
    }

    /// Read a binding from a decoded `Sequence(oid, value)`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let items = value
            .as_sequence()
            .ok_or(Error::decode(0, DecodeErrorKind::UnexpectedType { field: "varbind" }))?;
        let oid = field::oid(items, 1, "varbind name")?.clone();
        let value = field::get(items, 2, "varbind value")?.clone();
        Ok(Self { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Build the varbind list SEQUENCE.
pub fn encode_varbind_list(varbinds: &[VarBind]) -> Value {
    Value::sequence(SequenceTag::Sequence, varbinds.iter().map(VarBind::to_value))
}

/// Read the bindings out of a decoded varbind list (tag first).
pub fn decode_varbind_list(items: &[Value]) -> Result<Vec<VarBind>> {
    items
        .iter()
        .skip(1)
        .map(VarBind::from_value)
        .collect()
}
