//! Error types for swing-position.

use swing_broker::BrokerError;
use thiserror::Error;

/// Monitoring failures that are real errors. Transient broker trouble
/// during a tick is tolerated in place, not surfaced here.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The broker failed in a way retrying cannot fix.
    #[error("Broker failure while monitoring position: {0}")]
    Broker(#[from] BrokerError),
}

/// Result type alias for monitoring operations.
pub type MonitorResult<T> = std::result::Result<T, MonitorError>;
