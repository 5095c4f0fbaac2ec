//! Peasant work cycle between a source and a destination structure

use serde::{Deserialize, Serialize};

/// Phase of an active ferrying job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkPhase {
    /// Walking to the source
    Inbound,
    /// At the source, withdrawing (retries while the source is empty)
    Collecting,
    /// Walking to the destination with a load
    Outbound,
    /// At the destination, about to unload
    Depositing,
}

/// An active ferrying job; absence of a job means "not working"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub source: String,
    pub destination: String,
    pub phase: WorkPhase,
}

impl Job {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, phase: WorkPhase) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            phase,
        }
    }
}
