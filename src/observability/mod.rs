//! Process-wide logging setup and HTTP request metrics.

pub mod logging;
pub mod metrics;
