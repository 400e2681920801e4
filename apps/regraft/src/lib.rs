//! # regraft
//!
//! File-facing layer of the `regraft` command: JSON graph and rule
//! documents, and the TOML engine configuration overlay.

pub mod config;
pub mod document;
