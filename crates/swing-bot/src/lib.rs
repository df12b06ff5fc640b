//! Single-ticker swing trade-cycle bot.
//!
//! Wires the pieces into one process: configuration, logging, startup
//! safety checks, and the orchestrated cycle of
//! cascade → size → enter → monitor → exit, repeated forever.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::TradeOrchestrator;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use logging::init_logging;
