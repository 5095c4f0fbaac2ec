//! Kinematic component embedded in every agent
//!
//! Moves in a straight line toward a destination at a fixed speed,
//! one step per tick, snapping exactly onto the destination on the
//! final step.

use crate::core::types::Vec2;

/// Position, destination and speed of a mobile entity
#[derive(Debug, Clone)]
pub struct Motion {
    location: Vec2,
    destination: Vec2,
    speed: f32,
    moving: bool,
}

impl Motion {
    pub fn new(location: Vec2, speed: f32) -> Self {
        Self {
            location,
            destination: location,
            speed,
            moving: false,
        }
    }

    pub fn location(&self) -> Vec2 {
        self.location
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    /// Destination of the current movement, if any
    pub fn destination(&self) -> Option<Vec2> {
        self.moving.then_some(self.destination)
    }

    /// Begin moving toward `destination`
    ///
    /// Starting a move to the current location is a no-op.
    pub fn start_moving(&mut self, destination: Vec2) {
        self.destination = destination;
        self.moving = self.location != destination;
    }

    /// Cancel movement in place; the location is unchanged
    pub fn stop_moving(&mut self) {
        self.moving = false;
    }

    /// Teleport to `p` instantly, bypassing the speed limit
    ///
    /// Any in-progress movement continues toward its destination from
    /// the new location on the next tick.
    pub fn jump_to(&mut self, p: Vec2) {
        self.location = p;
        if self.moving && self.location == self.destination {
            self.moving = false;
        }
    }

    /// Advance one step toward the destination
    ///
    /// Returns true exactly when the destination was reached or passed
    /// this step, in which case the location snaps onto the destination
    /// and movement stops.
    pub fn update_location(&mut self) -> bool {
        if !self.moving {
            return false;
        }
        let to_go = self.destination - self.location;
        let distance = to_go.length();
        if distance <= self.speed {
            self.location = self.destination;
            self.moving = false;
            true
        } else {
            self.location += to_go / distance * self.speed;
            false
        }
    }
}
