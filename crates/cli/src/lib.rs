//! Operator tool for inspecting consistent-hash server sets offline.
//!
//! Provides commands for:
//! - Picking the server that owns a key
//! - Showing per-server ring points and sampled key distribution
//!
//! Everything runs against the `serverset` public API; no network I/O.

pub mod commands;
pub mod config;

pub use commands::Command;
pub use config::CliConfig;
