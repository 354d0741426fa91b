use thiserror::Error;

use crate::battle::actions::ItemKind;
use crate::battle::session::BattleState;
use crate::core::types::GaugeKind;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Not the player's turn (state: {state:?})")]
    NotPlayerTurn { state: BattleState },

    #[error("Not enough {gauge:?} gauge: need {cost}, have {available}")]
    InsufficientGauge {
        gauge: GaugeKind,
        cost: u32,
        available: u32,
    },

    #[error("No {0:?} left in inventory")]
    MissingItem(ItemKind),

    #[error("{action} is blocked by {by}")]
    ActionBlocked { action: String, by: String },

    #[error("Special attack unlocks at level {required} (current level {level})")]
    SpecialLocked { level: u32, required: u32 },

    #[error("Focus gauge not full ({focus}/100)")]
    FocusNotReady { focus: u32 },

    #[error("Battle outcome was already resolved")]
    OutcomeAlreadyResolved,

    #[error("Battle has not reached a terminal state (state: {state:?})")]
    NotTerminal { state: BattleState },

    #[error("Battle session is closed")]
    SessionClosed,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ArenaError {
    /// Rejections the player can recover from by picking another action
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::NotPlayerTurn { .. }
                | Self::InsufficientGauge { .. }
                | Self::MissingItem(_)
                | Self::ActionBlocked { .. }
                | Self::SpecialLocked { .. }
                | Self::FocusNotReady { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ArenaError>;
