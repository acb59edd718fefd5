//! Originating connection kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of trading-server connection a record came from.
///
/// Simulation kinds (tester, optimizer, miner) are excluded from state
/// tracking; every other kind is treated as a live venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerKind {
    /// Kind not reported by the connection.
    #[default]
    None,
    /// Historical-data backtester.
    Tester,
    /// Parameter optimizer (runs many testers).
    Optimizer,
    /// Pattern miner.
    Miner,
    /// In-process paper trading venue.
    Paper,
    Binance,
    Bitmex,
    Kraken,
    Quik,
    Plaza,
    InteractiveBrokers,
    Finam,
}

impl ServerKind {
    /// Returns true for backtest/optimization kinds whose orders must not be tracked.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Tester | Self::Optimizer | Self::Miner)
    }

    /// Returns true for connections whose events feed the stores.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.is_simulated()
    }
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Tester => "tester",
            Self::Optimizer => "optimizer",
            Self::Miner => "miner",
            Self::Paper => "paper",
            Self::Binance => "binance",
            Self::Bitmex => "bitmex",
            Self::Kraken => "kraken",
            Self::Quik => "quik",
            Self::Plaza => "plaza",
            Self::InteractiveBrokers => "interactive_brokers",
            Self::Finam => "finam",
        };
        f.write_str(name)
    }
}
