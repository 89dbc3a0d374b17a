//! Tracing/logging setup shared by the binaries.

/// Tracing subscriber configuration (filters, output format).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_with};
