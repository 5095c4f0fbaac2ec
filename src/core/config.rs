//! Simulation configuration with documented constants
//!
//! Tuning values for movement and the economy are collected here with
//! explanations of their purpose. Combat profiles (range, strength,
//! per-kind health) live in `agent::constants` since they are fixed
//! properties of the agent kinds rather than tunables.

use serde::{Deserialize, Serialize};

/// Configuration for the simulation kernel
///
/// An instance is passed explicitly to [`crate::model::Model::new`];
/// there is no global configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    // === AGENTS ===
    /// Starting health for ordinary agents (peasants, soldiers, archers)
    ///
    /// Mages start weaker; see `agent::constants::MAGE_HEALTH`.
    pub default_agent_health: i32,

    /// Distance an agent covers per tick while moving (world units)
    pub agent_speed: f32,

    /// Maximum amount of food a peasant can carry at once
    ///
    /// A peasant asks its source structure for exactly the amount
    /// needed to top up to this capacity.
    pub peasant_capacity: f64,

    // === STRUCTURES ===
    /// Food a farm starts with when built
    pub farm_initial_food: f64,

    /// Food a farm produces per tick
    ///
    /// At the default rate (2.0) a farm regenerates a full peasant
    /// load in about 18 ticks.
    pub farm_production_rate: f64,

    /// Fraction of a town hall's holdings kept back on withdrawal
    pub town_hall_tax_rate: f64,

    /// Smallest withdrawal a town hall will grant
    ///
    /// Computed amounts below this threshold are floored to zero,
    /// so tiny taxed remainders cannot be drained.
    pub town_hall_min_withdrawal: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            default_agent_health: 5,
            agent_speed: 5.0,
            peasant_capacity: 35.0,
            farm_initial_food: 50.0,
            farm_production_rate: 2.0,
            town_hall_tax_rate: 0.1,
            town_hall_min_withdrawal: 1.0,
        }
    }
}

impl SimConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.default_agent_health <= 0 {
            return Err("default_agent_health must be positive".into());
        }
        if self.agent_speed <= 0.0 {
            return Err("agent_speed must be positive".into());
        }
        if self.peasant_capacity <= 0.0 {
            return Err("peasant_capacity must be positive".into());
        }
        if !(0.0..1.0).contains(&self.town_hall_tax_rate) {
            return Err(format!(
                "town_hall_tax_rate ({}) must be in [0, 1)",
                self.town_hall_tax_rate
            ));
        }
        if self.farm_production_rate < 0.0 || self.farm_initial_food < 0.0 {
            return Err("farm food values must be non-negative".into());
        }
        Ok(())
    }
}
