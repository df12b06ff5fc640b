//! Supervision of an open position until it becomes exit-worthy.

pub mod error;
pub mod monitor;

pub use error::{MonitorError, MonitorResult};
pub use monitor::{MonitorConfig, MonitorOutcome, PositionMonitor};
