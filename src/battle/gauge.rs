//! Clamped resource pools
//!
//! HP and every action gauge share one type. All mutation clamps to
//! `[0, max]`; nothing can push a value out of range.

use serde::{Deserialize, Serialize};

/// A bounded, regenerating resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gauge {
    value: u32,
    max: u32,
}

impl Gauge {
    /// Create a gauge; `value` is clamped to `max`
    pub fn new(value: u32, max: u32) -> Self {
        Self {
            value: value.min(max),
            max,
        }
    }

    pub fn full(max: u32) -> Self {
        Self { value: max, max }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0
    }

    pub fn is_full(&self) -> bool {
        self.value >= self.max
    }

    /// Fill level in [0.0, 1.0]
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 0.0;
        }
        self.value as f32 / self.max as f32
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.value >= cost
    }

    /// Add up to `amount`, returning how much was actually added
    pub fn add(&mut self, amount: u32) -> u32 {
        let before = self.value;
        self.value = self.value.saturating_add(amount).min(self.max);
        self.value - before
    }

    /// Remove up to `amount`, returning how much was actually removed
    pub fn drain(&mut self, amount: u32) -> u32 {
        let removed = amount.min(self.value);
        self.value -= removed;
        removed
    }

    /// Remove exactly `cost` if affordable
    pub fn spend(&mut self, cost: u32) -> bool {
        if !self.can_afford(cost) {
            return false;
        }
        self.value -= cost;
        true
    }

    pub fn set(&mut self, value: u32) {
        self.value = value.min(self.max);
    }

    pub fn empty(&mut self) {
        self.value = 0;
    }

    pub fn fill(&mut self) {
        self.value = self.max;
    }
}
