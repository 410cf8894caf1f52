//! Deterministic, pure logic for the staged walkthrough.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod decision;
pub mod outputs;
pub mod parser;
pub mod stages;
pub mod threader;
pub mod types;
