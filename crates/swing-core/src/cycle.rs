//! Terminal outcome of one trade cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position stopped being worth holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    /// Price crossed the take-profit bound.
    TakeProfit,
    /// Price crossed the stop-loss bound.
    StopLoss,
    /// Stochastic %K/%D ordering flipped against the held direction.
    Reversal,
    /// Monitor tick budget exhausted while still watching.
    Timeout,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "take-profit"),
            Self::StopLoss => write!(f, "stop-loss"),
            Self::Reversal => write!(f, "reversal"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Result handed back to the scheduling loop.
///
/// Drives only the inter-cycle delay and logging; carries no side
/// effects of its own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub success: bool,
    pub exit: Option<ExitReason>,
}

impl CycleResult {
    /// A position was opened and closed; `exit` says why it closed.
    pub fn completed(exit: ExitReason) -> Self {
        Self {
            success: true,
            exit: Some(exit),
        }
    }

    /// No trade this cycle (inconclusive signal, sizing failure,
    /// unfilled entry, pre-existing position).
    pub fn skipped() -> Self {
        Self {
            success: false,
            exit: None,
        }
    }
}
