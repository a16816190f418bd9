//! # LHX Common Library
//!
//! Shared code for the listening-history tools including:
//! - Error and result types
//! - Data folder resolution and TOML configuration
//! - Atomic file writes
//! - Timestamp helpers
//! - Tracing initialisation

pub mod config;
pub mod error;
pub mod fs;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
