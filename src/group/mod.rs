//! User-named aggregates of agents
//!
//! A group holds member *names* only; the agents themselves are owned by
//! the model. Composite commands are routed through the model, which
//! snapshots the member list before forwarding so that members dying
//! mid-command cannot invalidate the iteration. A group never contains
//! the name of a dead agent: the model drops members on death.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Marching formation; cosmetic only, reported by `describe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Formation {
    Line,
    Column,
    #[default]
    Loose,
}

/// A named set of agent members
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    formation: Formation,
    members: BTreeSet<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, formation: Formation) -> Self {
        Self {
            name: name.into(),
            formation,
            members: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn formation(&self) -> Formation {
        self.formation
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.members
    }

    pub fn is_member(&self, agent: &str) -> bool {
        self.members.contains(agent)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn insert_member(&mut self, agent: &str) {
        self.members.insert(agent.to_string());
    }

    pub(crate) fn remove_member(&mut self, agent: &str) -> bool {
        self.members.remove(agent)
    }

    /// Drop a member that has died; silent whether or not it was present
    pub(crate) fn drop_dead_member(&mut self, agent: &str) {
        self.members.remove(agent);
    }

    pub fn describe(&self) -> String {
        let members: Vec<&str> = self.members.iter().map(String::as_str).collect();
        format!(
            "Group {} ({:?}): [{}]",
            self.name,
            self.formation,
            members.join(", ")
        )
    }
}
