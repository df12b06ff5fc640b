//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup safety check failed; the process must not trade.
    #[error("Startup check failed: {0}")]
    Startup(String),

    #[error("Broker error: {0}")]
    Broker(#[from] swing_broker::BrokerError),

    #[error("Signal error: {0}")]
    Signal(#[from] swing_signal::SignalError),

    #[error("Execution error: {0}")]
    Exec(#[from] swing_exec::ExecError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] swing_position::MonitorError),

    #[error("Core error: {0}")]
    Core(#[from] swing_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
