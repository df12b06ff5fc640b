//! Order execution: position sizing and the entry/exit lifecycle.
//!
//! `sizer` turns equity and price into a bounded share quantity plus
//! stop/profit levels; `lifecycle` owns every order the bot places,
//! from the price-bounded limit entry through the guaranteed market
//! exit.

pub mod error;
pub mod lifecycle;
pub mod sizer;

pub use error::{ExecError, ExecResult};
pub use lifecycle::{LifecycleConfig, OrderLifecycleManager};
pub use sizer::RiskSizer;
