//! Shared test utilities for snmp-session integration tests.

// Not every test file uses every helper
#![allow(dead_code)]
#![allow(unused_imports)]

mod agent;
mod fixtures;

pub use agent::*;
pub use fixtures::*;
