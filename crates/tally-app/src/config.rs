//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use tally_core::ServerKind;
use tally_painter::PainterConfig;

use crate::error::{AppError, AppResult};

/// A replay connection fed from a JSON-lines event file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Unique id inside the registry.
    pub id: String,
    /// Venue kind the connection reports as.
    #[serde(default)]
    pub kind: ServerKind,
    /// Event file, one `ServerEvent` JSON object per line.
    pub events: PathBuf,
    /// Delay between two events (ms). Default: 250.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

fn default_pacing_ms() -> u64 {
    250
}

impl ConnectionConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub painter: PainterConfig,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    /// Cancel every working order before exiting.
    #[serde(default)]
    pub cancel_on_exit: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> AppResult<()> {
        for (i, connection) in self.connections.iter().enumerate() {
            if connection.id.trim().is_empty() {
                return Err(AppError::Config(format!("connections[{i}] has an empty id")));
            }
            if self.connections[..i].iter().any(|c| c.id == connection.id) {
                return Err(AppError::Config(format!(
                    "Duplicate connection id: {}",
                    connection.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = AppConfig::from_toml(
            r#"
            cancel_on_exit = true

            [painter]
            refresh_interval_ms = 500
            paint_portfolios = false

            [[connections]]
            id = "quik-1"
            kind = "quik"
            events = "demos/quik_session.jsonl"
            pacing_ms = 10

            [[connections]]
            id = "plaza-1"
            kind = "plaza"
            events = "demos/plaza_session.jsonl"
            "#,
        )
        .unwrap();

        assert!(config.cancel_on_exit);
        assert_eq!(config.painter.refresh_interval(), Duration::from_millis(500));
        assert!(!config.painter.paint_portfolios);
        assert!(config.painter.paint_orders);
        assert_eq!(config.connections.len(), 2);
        assert_eq!(config.connections[0].kind, ServerKind::Quik);
        assert_eq!(config.connections[0].pacing(), Duration::from_millis(10));
        assert_eq!(config.connections[1].pacing_ms, 250);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.connections.is_empty());
        assert!(!config.cancel_on_exit);
        assert_eq!(config.painter.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_duplicate_connection_ids_rejected() {
        let err = AppConfig::from_toml(
            r#"
            [[connections]]
            id = "a"
            events = "a.jsonl"

            [[connections]]
            id = "a"
            events = "b.jsonl"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("Duplicate")));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::from_file("/nonexistent/tally.toml"),
            Err(AppError::Config(_))
        ));
    }
}
