//! Post-update command execution for gitsync.
//!
//! This crate provides:
//! - [`CommandSpec`]: A command, its arguments and how it is run
//! - [`merge_errors`]: Combines independent command failures into one error

mod aggregate;
mod command;
mod error;

pub use aggregate::{ExecErrors, merge_errors};
pub use command::{CommandSpec, ExecMode};
pub use error::{ExecError, ExecResult};
