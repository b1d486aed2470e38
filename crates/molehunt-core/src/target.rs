use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Whether a target is an ordinary mole or a bonus (golden) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    Ordinary,
    Bonus,
}

/// A transient target occupying one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    pub visible: Duration,
}

impl Target {
    pub fn ordinary(visible: Duration) -> Self {
        Self {
            kind: TargetKind::Ordinary,
            visible,
        }
    }

    pub fn bonus(visible: Duration) -> Self {
        Self {
            kind: TargetKind::Bonus,
            visible,
        }
    }
}

/// Index of a slot, `0..slot_count`.
pub type SlotIndex = usize;
