//! Attack state machine shared by the fighting agent kinds

use crate::core::types::Vec2;
use serde::{Deserialize, Serialize};

/// Current attack state of a fighting agent
///
/// The target is held by name and re-validated against the registry on
/// every use: a target may die of unrelated causes while referenced, in
/// which case the name no longer resolves and the attacker disengages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatState {
    NotAttacking,
    Attacking { target: String },
}

impl CombatState {
    pub fn is_attacking(&self) -> bool {
        matches!(self, CombatState::Attacking { .. })
    }

    pub fn target(&self) -> Option<&str> {
        match self {
            CombatState::Attacking { target } => Some(target),
            CombatState::NotAttacking => None,
        }
    }
}

/// Reach and damage of a fighting agent kind
#[derive(Debug, Clone, Copy)]
pub struct CombatProfile {
    pub range: f32,
    pub strength: i32,
}

/// What became of the target of a strike
///
/// Returned synchronously so combat code on the call stack observes a
/// death before control unwinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeOutcome {
    /// Target was hit and survived
    Hit,
    /// Target was killed and has been removed from the simulation
    Killed,
    /// Target was no longer registered
    Gone,
}

/// Identity and position of an attacker, passed into `take_hit`
///
/// A value type rather than a reference: the attacker is detached from
/// the registry while its strike resolves.
#[derive(Debug, Clone)]
pub struct AttackerInfo {
    pub name: String,
    pub location: Vec2,
}
