//! Staged generative walkthrough for breakthrough ideas.
//!
//! A fixed catalog of eight stages is run in order against a generative
//! service. Every stage sees the operator's vision plus all earlier stage
//! outputs, and an applied stage writes its response into a project document
//! tree. The crate keeps a strict split:
//!
//! - **[`core`]**: pure logic (stage catalog, prompt threading, response
//!   parsing, decisions). No I/O.
//! - **[`io`]**: filesystem store, service client, config, operator console.
//!
//! [`session`] ties the two together, and [`app`] is the binary's entry point.

pub mod app;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
