//! Combat profiles - fixed properties of the agent kinds
//!
//! These are identity, not tuning: scenario balance is expressed through
//! `core::config::SimConfig` instead.

/// Soldier melee reach (world units)
pub const SOLDIER_RANGE: f32 = 2.0;
/// Damage per soldier strike
pub const SOLDIER_STRENGTH: i32 = 2;

/// Archer bow reach (world units)
pub const ARCHER_RANGE: f32 = 6.0;
/// Damage per archer strike
pub const ARCHER_STRENGTH: i32 = 1;

/// Mage casting reach, also the blink distance when evading
pub const MAGE_RANGE: f32 = 6.0;
/// Damage per mage strike
pub const MAGE_STRENGTH: i32 = 5;
/// Mages trade raw health for charges
pub const MAGE_HEALTH: i32 = 4;
/// Maximum blink charges a mage can hold
pub const MAGE_MAX_CHARGES: u32 = 2;
/// Ticks to regain one charge
pub const MAGE_RECHARGE_TICKS: u32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges_reasonable() {
        assert!(SOLDIER_RANGE < ARCHER_RANGE);
        assert_eq!(ARCHER_RANGE, MAGE_RANGE);
    }

    #[test]
    fn test_strengths_positive() {
        assert!(SOLDIER_STRENGTH > 0);
        assert!(ARCHER_STRENGTH > 0);
        assert!(MAGE_STRENGTH > SOLDIER_STRENGTH);
    }
}
