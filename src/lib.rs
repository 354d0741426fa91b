//! Habit Arena - turn-based combat engine
//!
//! Completing real-world tasks unlocks battles against scaled monsters.
//! This crate owns the battle rules; rendering, audio and save formats sit
//! behind the traits in `ports`.

pub mod battle;
pub mod core;
pub mod ports;
