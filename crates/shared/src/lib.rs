pub mod domain;
pub mod error;
pub mod protocol;
pub mod table;

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod protocol_tests;
