//! Painter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Refresh loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PainterConfig {
    /// Polling interval in milliseconds.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Publish the portfolio view.
    #[serde(default = "default_enabled")]
    pub paint_portfolios: bool,
    /// Publish the working-orders view.
    #[serde(default = "default_enabled")]
    pub paint_orders: bool,
    /// Start with painting switched on.
    #[serde(default = "default_enabled")]
    pub start_painting: bool,
}

fn default_refresh_interval_ms() -> u64 {
    1_000
}

fn default_enabled() -> bool {
    true
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            paint_portfolios: default_enabled(),
            paint_orders: default_enabled(),
            start_painting: default_enabled(),
        }
    }
}

impl PainterConfig {
    /// Polling interval, never shorter than one millisecond.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let config: PainterConfig = toml::from_str("").unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
        assert!(config.paint_orders);
        assert!(config.paint_portfolios);
        assert!(config.start_painting);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = PainterConfig {
            refresh_interval_ms: 0,
            ..PainterConfig::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_millis(1));
    }
}
