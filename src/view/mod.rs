//! Observer protocol for display components
//!
//! The kernel pushes state changes to attached views; rendering itself
//! lives outside the crate. `TraceView` is the one implementation shipped
//! here, used by the demo binary to narrate a run through `tracing`.

use tracing::info;

use crate::core::types::Vec2;

/// Identifies an attached view for later detachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// Consumer of entity state notifications
pub trait View {
    /// The named entity is now at `location`
    fn update_location(&mut self, name: &str, location: Vec2);
    /// The named agent's health changed
    fn update_health(&mut self, name: &str, health: i32);
    /// The named entity's food amount changed (structure holdings or
    /// peasant load)
    fn update_amount(&mut self, name: &str, amount: f64);
    /// The named entity no longer exists
    fn update_remove(&mut self, name: &str);
    /// Render whatever this view renders
    fn draw(&mut self);
}

/// View that logs every notification
#[derive(Debug, Default)]
pub struct TraceView;

impl View for TraceView {
    fn update_location(&mut self, name: &str, location: Vec2) {
        info!(target: "hamlet::view", name, x = location.x, y = location.y, "location");
    }

    fn update_health(&mut self, name: &str, health: i32) {
        info!(target: "hamlet::view", name, health, "health");
    }

    fn update_amount(&mut self, name: &str, amount: f64) {
        info!(target: "hamlet::view", name, amount, "amount");
    }

    fn update_remove(&mut self, name: &str) {
        info!(target: "hamlet::view", name, "removed");
    }

    fn draw(&mut self) {
        info!(target: "hamlet::view", "draw");
    }
}
