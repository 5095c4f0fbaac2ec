//! Registry and clock coordinating all entities and views
//!
//! The model owns every agent, structure and group, advances simulation
//! time, routes commands from the external controller, and broadcasts
//! state changes to attached views. It is an explicitly constructed
//! object passed to whoever needs it; there is no global instance.
//!
//! Update order is lexicographic by name over the union of structures
//! and agents. The order is arbitrary but stable, and combat resolution
//! depends on it being stable: two agents killing each other's targets
//! in the same tick must replay identically run after run.
//!
//! Re-entrancy: an agent's update may kill another agent, shrinking the
//! registry mid-tick. The tick loop therefore iterates a pre-collected
//! name snapshot and re-checks registration before each update, and the
//! agent being updated (or struck) is temporarily detached from the map
//! so it can freely call back into the model.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::agent::combat::{AttackerInfo, StrikeOutcome};
use crate::agent::{Agent, AgentKind};
use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{Tick, Vec2};
use crate::group::Group;
use crate::structure::Structure;
use crate::view::{View, ViewId};

pub struct Model {
    config: SimConfig,
    time: Tick,
    agents: BTreeMap<String, Agent>,
    structures: BTreeMap<String, Structure>,
    groups: BTreeMap<String, Group>,
    views: Vec<(ViewId, Box<dyn View>)>,
    next_view_id: u64,
}

impl Model {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            time: 0,
            agents: BTreeMap::new(),
            structures: BTreeMap::new(),
            groups: BTreeMap::new(),
            views: Vec::new(),
            next_view_id: 0,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn get_time(&self) -> Tick {
        self.time
    }

    /// True if `name` names any agent, structure, or group
    pub fn is_name_in_use(&self, name: &str) -> bool {
        self.agents.contains_key(name)
            || self.structures.contains_key(name)
            || self.groups.contains_key(name)
    }

    // === REGISTRY ===

    pub fn add_agent(&mut self, agent: Agent) -> Result<()> {
        if self.is_name_in_use(agent.name()) {
            return Err(SimError::DuplicateName(agent.name().to_string()));
        }
        let name = agent.name().to_string();
        let location = agent.location();
        let health = agent.health();
        let carried = match agent.kind() {
            AgentKind::Peasant { carried, .. } => Some(*carried),
            _ => None,
        };
        self.agents.insert(name.clone(), agent);
        self.notify_location(&name, location);
        self.notify_health(&name, health);
        if let Some(carried) = carried {
            self.notify_amount(&name, carried);
        }
        info!(name = %name, "agent registered");
        Ok(())
    }

    pub fn find_agent(&self, name: &str) -> Option<&Agent> {
        self.agents.get(name)
    }

    /// Remove an agent from the registry, every group it belonged to,
    /// and the views
    pub fn remove_agent(&mut self, name: &str) -> Result<()> {
        let agent = self
            .agents
            .remove(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        self.detach_everywhere(agent);
        Ok(())
    }

    pub fn add_structure(&mut self, structure: Structure) -> Result<()> {
        if self.is_name_in_use(structure.name()) {
            return Err(SimError::DuplicateName(structure.name().to_string()));
        }
        let name = structure.name().to_string();
        let location = structure.location();
        let on_hand = structure.on_hand();
        self.structures.insert(name.clone(), structure);
        self.notify_location(&name, location);
        self.notify_amount(&name, on_hand);
        info!(name = %name, "structure registered");
        Ok(())
    }

    pub fn find_structure(&self, name: &str) -> Option<&Structure> {
        self.structures.get(name)
    }

    pub fn add_group(&mut self, group: Group) -> Result<()> {
        if self.is_name_in_use(group.name()) {
            return Err(SimError::DuplicateName(group.name().to_string()));
        }
        debug_assert!(group.is_empty(), "groups are registered empty");
        info!(group = %group.name(), "group registered");
        self.groups.insert(group.name().to_string(), group);
        Ok(())
    }

    pub fn find_group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Drop the group and every member's back-reference to it
    pub fn disband_group(&mut self, name: &str) -> Result<()> {
        let group = self
            .groups
            .remove(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        for member in group.members() {
            if let Some(agent) = self.agents.get_mut(member) {
                agent.leave_group(name);
            }
        }
        info!(group = %name, "group disbanded");
        Ok(())
    }

    pub fn remove_group(&mut self, name: &str) -> Result<()> {
        self.disband_group(name)
    }

    // === CLOCK ===

    /// Advance the simulation by one tick, updating every registered
    /// sim object exactly once
    pub fn update(&mut self) {
        self.time += 1;
        debug!(time = self.time, "tick");
        // Snapshot the visitation order up front: deaths during the tick
        // shrink the agent map, and a stale name is simply skipped.
        let mut names: Vec<String> = self.structures.keys().cloned().collect();
        names.extend(self.agents.keys().cloned());
        names.sort();
        for name in names {
            if self.structures.contains_key(&name) {
                self.update_structure(&name);
            } else if let Some(mut agent) = self.agents.remove(&name) {
                agent.update(self);
                debug_assert!(agent.is_alive(), "an agent cannot die in its own update");
                self.agents.insert(name, agent);
            }
        }
    }

    fn update_structure(&mut self, name: &str) {
        let changed = self.structures.get_mut(name).and_then(Structure::update);
        if let Some(amount) = changed {
            self.notify_amount(name, amount);
        }
    }

    /// Multi-line description of every structure, agent and group
    pub fn describe(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = writeln!(out, "Time {}:", self.time);
        let _ = writeln!(out, "Structures:");
        for s in self.structures.values() {
            let _ = writeln!(out, "  {}", s.describe());
        }
        let _ = writeln!(out, "Agents:");
        for a in self.agents.values() {
            let _ = writeln!(out, "  {}", a.describe());
        }
        let _ = writeln!(out, "Groups:");
        for g in self.groups.values() {
            let _ = writeln!(out, "  {}", g.describe());
        }
        out
    }

    // === AGENT COMMANDS ===

    pub fn agent_move_to(&mut self, name: &str, destination: Vec2) -> Result<()> {
        let agent = self
            .agents
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        agent.move_to(destination);
        Ok(())
    }

    pub fn agent_stop(&mut self, name: &str) -> Result<()> {
        let agent = self
            .agents
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        agent.stop();
        Ok(())
    }

    /// Order `attacker` to engage `target`
    ///
    /// Rejects self-attack, unknown or dead targets (a dead agent is no
    /// longer registered), non-fighting attackers, and out-of-range
    /// targets.
    pub fn agent_start_attacking(&mut self, attacker: &str, target: &str) -> Result<()> {
        if attacker == target {
            return Err(SimError::InvalidCommand(format!(
                "{attacker} cannot attack itself"
            )));
        }
        let target_loc = self
            .agents
            .get(target)
            .ok_or_else(|| SimError::UnknownName(target.to_string()))?
            .location();
        let agent = self
            .agents
            .get_mut(attacker)
            .ok_or_else(|| SimError::UnknownName(attacker.to_string()))?;
        let profile = agent.kind().combat_profile().ok_or_else(|| {
            SimError::InvalidCommand(format!("{attacker} cannot attack"))
        })?;
        if agent.location().distance(target_loc) > profile.range {
            return Err(SimError::InvalidCommand(format!(
                "{target} is out of range of {attacker}"
            )));
        }
        info!(name = %attacker, target = %target, "attacking");
        agent.set_attacking(target.to_string());
        Ok(())
    }

    /// Order `name` to ferry food from `source` to `destination`
    pub fn agent_start_working(
        &mut self,
        name: &str,
        source: &str,
        destination: &str,
    ) -> Result<()> {
        if source == destination {
            return Err(SimError::InvalidCommand(
                "source and destination are the same".to_string(),
            ));
        }
        let source_loc = self
            .structure_location(source)
            .ok_or_else(|| SimError::UnknownName(source.to_string()))?;
        let destination_loc = self
            .structure_location(destination)
            .ok_or_else(|| SimError::UnknownName(destination.to_string()))?;
        let agent = self
            .agents
            .get_mut(name)
            .ok_or_else(|| SimError::UnknownName(name.to_string()))?;
        agent.start_working(source, destination, source_loc, destination_loc)
    }

    // === GROUP COMMANDS ===

    pub fn group_add_agent(&mut self, group: &str, agent: &str) -> Result<()> {
        if !self.agents.contains_key(agent) {
            return Err(SimError::UnknownName(agent.to_string()));
        }
        let g = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SimError::UnknownName(group.to_string()))?;
        g.insert_member(agent);
        if let Some(a) = self.agents.get_mut(agent) {
            a.join_group(group);
        }
        debug!(group = %group, agent = %agent, "joined group");
        Ok(())
    }

    pub fn group_remove_agent(&mut self, group: &str, agent: &str) -> Result<()> {
        let g = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SimError::UnknownName(group.to_string()))?;
        if !g.remove_member(agent) {
            return Err(SimError::InvalidCommand(format!(
                "{agent} is not a member of {group}"
            )));
        }
        if let Some(a) = self.agents.get_mut(agent) {
            a.leave_group(group);
        }
        debug!(group = %group, agent = %agent, "left group");
        Ok(())
    }

    pub fn group_move(&mut self, group: &str, destination: Vec2) -> Result<()> {
        for member in self.group_members_snapshot(group)? {
            if let Some(agent) = self.agents.get_mut(&member) {
                agent.move_to(destination);
            }
        }
        Ok(())
    }

    pub fn group_stop(&mut self, group: &str) -> Result<()> {
        for member in self.group_members_snapshot(group)? {
            if let Some(agent) = self.agents.get_mut(&member) {
                agent.stop();
            }
        }
        Ok(())
    }

    /// Forward an attack order to every member able to carry it out
    ///
    /// Members that cannot (peasants, the target itself, anyone out of
    /// range) are skipped with a log line rather than aborting the
    /// composite command.
    pub fn group_attack(&mut self, group: &str, target: &str) -> Result<()> {
        for member in self.group_members_snapshot(group)? {
            if let Err(err) = self.agent_start_attacking(&member, target) {
                debug!(group = %group, member = %member, %err, "member skipped");
            }
        }
        Ok(())
    }

    /// Forward a work order to every member able to carry it out
    pub fn group_work(&mut self, group: &str, source: &str, destination: &str) -> Result<()> {
        for member in self.group_members_snapshot(group)? {
            if let Err(err) = self.agent_start_working(&member, source, destination) {
                debug!(group = %group, member = %member, %err, "member skipped");
            }
        }
        Ok(())
    }

    fn group_members_snapshot(&self, group: &str) -> Result<Vec<String>> {
        self.groups
            .get(group)
            .map(|g| g.members().iter().cloned().collect())
            .ok_or_else(|| SimError::UnknownName(group.to_string()))
    }

    // === COMBAT SERVICES ===

    /// Resolve a strike against `target`, detaching it from the registry
    /// while it absorbs the hit
    ///
    /// A killed target is fully de-registered (registry, groups, views)
    /// before this returns, so the attacker observes the death
    /// synchronously.
    pub(crate) fn strike(
        &mut self,
        attacker_name: &str,
        attacker_loc: Vec2,
        strength: i32,
        target: &str,
    ) -> StrikeOutcome {
        let Some(mut victim) = self.agents.remove(target) else {
            return StrikeOutcome::Gone;
        };
        let attacker = AttackerInfo {
            name: attacker_name.to_string(),
            location: attacker_loc,
        };
        victim.take_hit(strength, &attacker, self);
        if victim.is_alive() {
            self.agents.insert(victim.name().to_string(), victim);
            StrikeOutcome::Hit
        } else {
            self.detach_everywhere(victim);
            StrikeOutcome::Killed
        }
    }

    fn detach_everywhere(&mut self, agent: Agent) {
        let name = agent.name().to_string();
        for group in agent.groups() {
            if let Some(g) = self.groups.get_mut(group) {
                g.drop_dead_member(&name);
            }
        }
        self.notify_gone(&name);
        info!(name = %name, "removed from the simulation");
    }

    /// Nearest agent to `from` within `range` sharing no group with the
    /// seeker; ties break lexicographically
    pub(crate) fn nearest_hostile(
        &self,
        exclude: &str,
        from: Vec2,
        groups: &BTreeSet<String>,
        range: f32,
    ) -> Option<String> {
        self.agents
            .values()
            .filter(|a| a.name() != exclude)
            .filter(|a| a.groups().is_disjoint(groups))
            .map(|a| (OrderedFloat(a.location().distance(from)), a.name()))
            .filter(|(d, _)| d.0 <= range)
            .min()
            .map(|(_, name)| name.to_string())
    }

    /// Nearest structure to `from`; ties break lexicographically
    pub(crate) fn nearest_structure(&self, from: Vec2) -> Option<(String, Vec2)> {
        self.structures
            .values()
            .map(|s| (OrderedFloat(s.location().distance(from)), s.name(), s.location()))
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(_, name, loc)| (name.to_string(), loc))
    }

    // === ECONOMY SERVICES ===

    pub(crate) fn structure_location(&self, name: &str) -> Option<Vec2> {
        self.structures.get(name).map(Structure::location)
    }

    pub(crate) fn withdraw_from(&mut self, name: &str, request: f64) -> f64 {
        let Some(structure) = self.structures.get_mut(name) else {
            debug_assert!(false, "withdrawal from unknown structure");
            return 0.0;
        };
        let granted = structure.withdraw(request);
        let on_hand = structure.on_hand();
        if granted > 0.0 {
            self.notify_amount(name, on_hand);
        }
        granted
    }

    pub(crate) fn deposit_to(&mut self, name: &str, amount: f64) {
        let Some(structure) = self.structures.get_mut(name) else {
            debug_assert!(false, "deposit to unknown structure");
            return;
        };
        structure.deposit(amount);
        let on_hand = structure.on_hand();
        self.notify_amount(name, on_hand);
    }

    // === VIEWS ===

    /// Attach a view and immediately replay the current state of every
    /// entity to it
    pub fn attach(&mut self, view: Box<dyn View>) -> ViewId {
        let id = ViewId(self.next_view_id);
        self.next_view_id += 1;
        self.views.push((id, view));
        self.broadcast_current_state();
        id
    }

    /// Detach a previously attached view; returns false if unknown
    pub fn detach(&mut self, id: ViewId) -> bool {
        let before = self.views.len();
        self.views.retain(|(vid, _)| *vid != id);
        self.views.len() != before
    }

    fn broadcast_current_state(&mut self) {
        let mut locations = Vec::new();
        let mut healths = Vec::new();
        let mut amounts = Vec::new();
        for (name, s) in &self.structures {
            locations.push((name.clone(), s.location()));
            amounts.push((name.clone(), s.on_hand()));
        }
        for (name, a) in &self.agents {
            locations.push((name.clone(), a.location()));
            healths.push((name.clone(), a.health()));
            if let AgentKind::Peasant { carried, .. } = a.kind() {
                amounts.push((name.clone(), *carried));
            }
        }
        for (name, location) in locations {
            self.notify_location(&name, location);
        }
        for (name, health) in healths {
            self.notify_health(&name, health);
        }
        for (name, amount) in amounts {
            self.notify_amount(&name, amount);
        }
    }

    pub fn notify_location(&mut self, name: &str, location: Vec2) {
        for (_, view) in &mut self.views {
            view.update_location(name, location);
        }
    }

    pub fn notify_health(&mut self, name: &str, health: i32) {
        for (_, view) in &mut self.views {
            view.update_health(name, health);
        }
    }

    pub fn notify_amount(&mut self, name: &str, amount: f64) {
        for (_, view) in &mut self.views {
            view.update_amount(name, amount);
        }
    }

    pub fn notify_gone(&mut self, name: &str) {
        for (_, view) in &mut self.views {
            view.update_remove(name);
        }
    }

    /// Trigger each attached view's draw, in attachment order
    pub fn notify_draw(&mut self) {
        for (_, view) in &mut self.views {
            view.draw();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::constants::{MAGE_STRENGTH, SOLDIER_STRENGTH};
    use crate::group::Formation;

    fn model() -> Model {
        Model::new(SimConfig::default())
    }

    #[test]
    fn test_strike_on_unregistered_target_is_gone() {
        let mut m = model();
        assert_eq!(
            m.strike("ghost", Vec2::ZERO, 3, "nobody"),
            StrikeOutcome::Gone
        );
    }

    #[test]
    fn test_strike_damages_and_kills() {
        let mut m = model();
        let cfg = m.config().clone();
        m.add_agent(Agent::peasant("pia", Vec2::ZERO, &cfg)).unwrap();
        assert_eq!(
            m.strike("foe", Vec2::new(1.0, 0.0), SOLDIER_STRENGTH, "pia"),
            StrikeOutcome::Hit
        );
        assert_eq!(m.find_agent("pia").unwrap().health(), 3);
        assert_eq!(
            m.strike("foe", Vec2::new(1.0, 0.0), MAGE_STRENGTH, "pia"),
            StrikeOutcome::Killed
        );
        assert!(m.find_agent("pia").is_none());
    }

    #[test]
    fn test_mage_without_charges_takes_full_damage() {
        let mut m = model();
        let cfg = m.config().clone();
        let mut mage = Agent::mage("mira", Vec2::ZERO, &cfg);
        let AgentKind::Mage { charges, .. } = mage.kind_mut() else {
            panic!("expected mage");
        };
        *charges = 0;
        m.add_agent(mage).unwrap();
        assert_eq!(
            m.strike("foe", Vec2::new(1.0, 0.0), SOLDIER_STRENGTH, "mira"),
            StrikeOutcome::Hit
        );
        let mira = m.find_agent("mira").unwrap();
        assert_eq!(mira.health(), 2);
        assert_eq!(mira.location(), Vec2::ZERO);
        let AgentKind::Mage { charges, .. } = mira.kind() else {
            panic!("expected mage");
        };
        assert_eq!(*charges, 0);
    }

    #[test]
    fn test_death_detaches_from_groups() {
        let mut m = model();
        let cfg = m.config().clone();
        m.add_agent(Agent::soldier("sten", Vec2::ZERO, &cfg)).unwrap();
        m.add_group(Group::new("band", Formation::default())).unwrap();
        m.group_add_agent("band", "sten").unwrap();
        assert_eq!(
            m.strike("foe", Vec2::new(1.0, 0.0), 99, "sten"),
            StrikeOutcome::Killed
        );
        assert!(m.find_group("band").unwrap().is_empty());
        assert!(m.find_agent("sten").is_none());
    }

    #[test]
    fn test_nearest_structure_breaks_ties_by_name() {
        let mut m = model();
        let cfg = m.config().clone();
        m.add_structure(Structure::farm("west", Vec2::new(-4.0, 0.0), &cfg))
            .unwrap();
        m.add_structure(Structure::farm("east", Vec2::new(4.0, 0.0), &cfg))
            .unwrap();
        let (name, _) = m.nearest_structure(Vec2::ZERO).unwrap();
        assert_eq!(name, "east");
    }

    #[test]
    fn test_nearest_hostile_skips_groupmates() {
        let mut m = model();
        let cfg = m.config().clone();
        m.add_agent(Agent::soldier("ally", Vec2::new(1.0, 0.0), &cfg))
            .unwrap();
        m.add_agent(Agent::soldier("enemy", Vec2::new(3.0, 0.0), &cfg))
            .unwrap();
        m.add_agent(Agent::archer("arlo", Vec2::ZERO, &cfg)).unwrap();
        m.add_group(Group::new("band", Formation::default())).unwrap();
        m.group_add_agent("band", "arlo").unwrap();
        m.group_add_agent("band", "ally").unwrap();
        let groups = m.find_agent("arlo").unwrap().groups().clone();
        assert_eq!(
            m.nearest_hostile("arlo", Vec2::ZERO, &groups, 6.0),
            Some("enemy".to_string())
        );
    }
}
