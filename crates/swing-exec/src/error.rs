//! Error types for swing-exec.

use swing_broker::BrokerError;
use swing_core::CoreError;
use thiserror::Error;

/// Execution-stage failures.
///
/// `UnresolvedOrder` is the one that matters most: it means a resting
/// order could not be cancelled and its fill state is unknown, so the
/// cycle must abort rather than risk a second entry.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The account cannot cover the computed quantity.
    #[error("Sizing rejected: {0}")]
    Sizing(String),

    /// Cancellation exhausted its budget; cancel-all was issued and the
    /// cycle must not proceed.
    #[error("Order {0} left in unknown state after cancel escalation")]
    UnresolvedOrder(String),

    /// A retried broker call ran out of attempts.
    #[error("{action} attempts exhausted")]
    Exhausted { action: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The broker failed in a way retrying cannot fix.
    #[error("Broker failure during order handling: {0}")]
    Broker(#[from] BrokerError),
}

/// Result type alias for execution operations.
pub type ExecResult<T> = std::result::Result<T, ExecError>;
