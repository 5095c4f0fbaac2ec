//! Hamlet - discrete-tick multi-agent simulation kernel

pub mod agent;
pub mod core;
pub mod group;
pub mod model;
pub mod motion;
pub mod structure;
pub mod view;
