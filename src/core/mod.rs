pub mod config;
pub mod error;
pub mod types;

pub use config::BattleConfig;
pub use error::{ArenaError, Result};
pub use types::{EnemyId, GaugeKind, ItemId, SessionId, Side, Tier, Turn};
