//! Error types for swing-signal.

use swing_broker::BrokerError;
use thiserror::Error;

/// Signal-stage failures that are real errors (not inconclusive
/// readings, which are normal cascade outcomes).
#[derive(Debug, Error)]
pub enum SignalError {
    /// The broker failed in a way retrying cannot fix.
    #[error("Broker failure during signal detection: {0}")]
    Broker(#[from] BrokerError),
}

/// Result type alias for signal operations.
pub type SignalResult<T> = std::result::Result<T, SignalError>;
