//! Application layer: command execution and error reporting.

pub mod commands;
pub mod error;
