//! Entry-signal detection.
//!
//! `indicators` holds the pure numeric functions (EMA, RSI, stochastic
//! %K/%D); `cascade` layers them into four sequential gates that must
//! all agree on a direction before a trade is authorized.

pub mod cascade;
pub mod error;
pub mod indicators;

pub use cascade::{CascadeConfig, SignalCascade};
pub use error::{SignalError, SignalResult};
