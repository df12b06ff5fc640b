//! Application configuration.

use crate::error::{AppError, AppResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use swing_broker::{RestConfig, RetryBudget};
use swing_exec::LifecycleConfig;
use swing_position::MonitorConfig;
use swing_signal::CascadeConfig;

/// Application configuration.
///
/// Loaded once at process start and immutable afterwards. Every
/// component reads its own section; the margins and the slippage
/// allowance are validated here so call sites never re-check them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ticker to trade. Overridable on the command line; if absent in
    /// both places the process prompts for it.
    #[serde(default)]
    pub ticker: Option<String>,
    /// Cap on notional spend per entry, in account currency.
    #[serde(default = "default_max_spend")]
    pub max_spend: Decimal,
    /// Stop-loss distance from entry, fraction in (0, 1).
    #[serde(default = "default_stop_margin")]
    pub stop_margin: Decimal,
    /// Take-profit distance from entry, fraction in (0, 1).
    #[serde(default = "default_profit_margin")]
    pub profit_margin: Decimal,
    /// Sleep between trade cycles (ms).
    #[serde(default = "default_cycle_sleep_ms")]
    pub cycle_sleep_ms: u64,
    /// Sleep between close-confirmation polls after an exit (ms).
    #[serde(default = "default_close_poll_ms")]
    pub close_poll_ms: u64,
    /// Startup account/cancel-all checks.
    #[serde(default = "default_startup_budget")]
    pub startup: RetryBudget,
    /// Broker connection; falls back to environment credentials when
    /// the section is absent.
    #[serde(default)]
    pub broker: Option<RestConfig>,
    /// Signal cascade retry budgets.
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Order lifecycle knobs.
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    /// Position monitor tick budget.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_max_spend() -> Decimal {
    Decimal::from(1_000)
}

fn default_stop_margin() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn default_profit_margin() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

fn default_cycle_sleep_ms() -> u64 {
    60_000
}

fn default_close_poll_ms() -> u64 {
    5_000
}

fn default_startup_budget() -> RetryBudget {
    RetryBudget::new(5, 5_000)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ticker: None,
            max_spend: default_max_spend(),
            stop_margin: default_stop_margin(),
            profit_margin: default_profit_margin(),
            cycle_sleep_ms: default_cycle_sleep_ms(),
            close_poll_ms: default_close_poll_ms(),
            startup: default_startup_budget(),
            broker: None,
            cascade: CascadeConfig::default(),
            lifecycle: LifecycleConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration, `SWINGBOT_CONFIG` or the default path.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("SWINGBOT_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject margins and the slippage allowance outside (0, 1) and a
    /// non-positive spend cap.
    pub fn validate(&self) -> AppResult<()> {
        for (name, value) in [
            ("stop_margin", self.stop_margin),
            ("profit_margin", self.profit_margin),
            ("lifecycle.max_variation", self.lifecycle.max_variation),
        ] {
            if value <= Decimal::ZERO || value >= Decimal::ONE {
                return Err(AppError::Config(format!(
                    "{name} must be in (0, 1), got {value}"
                )));
            }
        }
        if self.max_spend <= Decimal::ZERO {
            return Err(AppError::Config(format!(
                "max_spend must be positive, got {}",
                self.max_spend
            )));
        }
        Ok(())
    }
}
