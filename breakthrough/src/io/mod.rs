//! Side-effecting parts of the walkthrough: filesystem, child processes, and
//! the operator console.

pub mod client;
pub mod config;
pub mod operator;
pub mod process;
pub mod store;
pub mod vision;
