//! Broker error taxonomy.
//!
//! Three kinds matter to callers: transient transport failures (retry),
//! domain rejections (never retry), and the expected not-found sentinel
//! for position lookups (frequent, not an error condition).

use thiserror::Error;

/// Errors surfaced by the broker collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BrokerError {
    /// Transport failure or temporary broker unavailability.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Historical bars could not be served.
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    /// No such entity; expected and frequent for position lookups.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Order or request rejected on its merits (insufficient buying
    /// power, invalid quantity, untradable asset). Never retried.
    #[error("Rejected: {0}")]
    Rejected(String),
}

impl BrokerError {
    /// Whether a retry could plausibly change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connectivity(_) | Self::DataUnavailable(_))
    }
}

/// Result type alias for broker operations.
pub type BrokerResult<T> = std::result::Result<T, BrokerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryability() {
        assert!(BrokerError::Connectivity("timeout".into()).is_retryable());
        assert!(BrokerError::DataUnavailable("gap".into()).is_retryable());
        assert!(!BrokerError::NotFound("no position".into()).is_retryable());
        assert!(!BrokerError::Rejected("insufficient buying power".into()).is_retryable());
    }
}
