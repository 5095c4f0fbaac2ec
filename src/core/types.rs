//! Core type definitions used throughout the codebase

/// Game tick counter (simulation time unit)
pub type Tick = u64;

/// 2D position, supplied by the external geometry library
pub use glam::Vec2;
