//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! A generic, variant-typed codec: messages are `Vec<Value>` lists headed by a
//! [`Value::Tag`](crate::value::Value::Tag), so community envelopes, USM
//! envelopes and varbind payloads all go through the same two functions.

mod decode;
mod encode;
mod integer;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use integer::*;
pub use length::{decode_length, encode_length};
pub(crate) use length::decode_length_at;
