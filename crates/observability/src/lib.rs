//! Process-wide tracing setup shared by every binary and test harness.

pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat, init, init_with};
