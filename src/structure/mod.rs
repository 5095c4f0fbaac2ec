//! Stationary resource endpoints
//!
//! Structures never move and are never removed; they hold a quantity of
//! food that agents withdraw from and deposit into. Farms grow food each
//! tick, town halls tax withdrawals.

use crate::core::config::SimConfig;
use crate::core::types::Vec2;

/// Kind-specific behavior of a structure
#[derive(Debug, Clone)]
pub enum StructureKind {
    /// Produces `rate` food per tick and hands out whatever it has
    Farm { rate: f64 },
    /// Keeps back a tax fraction on withdrawal and floors tiny grants to zero
    TownHall { tax_rate: f64, min_withdrawal: f64 },
}

/// A named, stationary resource endpoint
#[derive(Debug, Clone)]
pub struct Structure {
    name: String,
    location: Vec2,
    on_hand: f64,
    kind: StructureKind,
}

impl Structure {
    pub fn farm(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self {
            name: name.into(),
            location,
            on_hand: config.farm_initial_food,
            kind: StructureKind::Farm {
                rate: config.farm_production_rate,
            },
        }
    }

    pub fn town_hall(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self {
            name: name.into(),
            location,
            on_hand: 0.0,
            kind: StructureKind::TownHall {
                tax_rate: config.town_hall_tax_rate,
                min_withdrawal: config.town_hall_min_withdrawal,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> Vec2 {
        self.location
    }

    pub fn on_hand(&self) -> f64 {
        self.on_hand
    }

    pub fn kind(&self) -> &StructureKind {
        &self.kind
    }

    fn kind_name(&self) -> &'static str {
        match self.kind {
            StructureKind::Farm { .. } => "Farm",
            StructureKind::TownHall { .. } => "Town hall",
        }
    }

    /// Hand out up to `request` food, returning the amount actually granted
    pub fn withdraw(&mut self, request: f64) -> f64 {
        let granted = match self.kind {
            StructureKind::Farm { .. } => request.min(self.on_hand),
            StructureKind::TownHall {
                tax_rate,
                min_withdrawal,
            } => {
                let available = self.on_hand - tax_rate * self.on_hand;
                let granted = request.min(available);
                if granted < min_withdrawal {
                    0.0
                } else {
                    granted
                }
            }
        };
        self.on_hand -= granted;
        granted
    }

    /// Add `amount` to the holdings
    pub fn deposit(&mut self, amount: f64) {
        self.on_hand += amount;
    }

    /// Per-tick behavior; returns the new amount when it changed
    pub fn update(&mut self) -> Option<f64> {
        match self.kind {
            StructureKind::Farm { rate } => {
                self.on_hand += rate;
                tracing::debug!(name = %self.name, on_hand = self.on_hand, "farm produced food");
                Some(self.on_hand)
            }
            StructureKind::TownHall { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {} at ({:.1}, {:.1}) holds {:.1} food",
            self.kind_name(),
            self.name,
            self.location.x,
            self.location.y,
            self.on_hand
        )
    }
}
