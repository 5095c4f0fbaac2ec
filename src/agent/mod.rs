//! Mobile simulation entities and their per-kind state machines
//!
//! An agent is a name, a health pool, a kinematic component and a closed
//! tagged variant carrying kind-specific state. Capability queries
//! (`combat_profile`, `is_worker`) replace "can't do that" stub overrides:
//! commands an agent cannot execute are rejected up front by the model.

pub mod combat;
pub mod constants;
pub mod work;

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::core::config::SimConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::Vec2;
use crate::model::Model;
use crate::motion::Motion;

use combat::{AttackerInfo, CombatProfile, CombatState, StrikeOutcome};
use constants::{
    ARCHER_RANGE, ARCHER_STRENGTH, MAGE_HEALTH, MAGE_MAX_CHARGES, MAGE_RANGE, MAGE_RECHARGE_TICKS,
    MAGE_STRENGTH, SOLDIER_RANGE, SOLDIER_STRENGTH,
};
use work::{Job, WorkPhase};

/// Kind-specific state of an agent
#[derive(Debug, Clone)]
pub enum AgentKind {
    /// Ferries food between structures
    Peasant { carried: f64, job: Option<Job> },
    /// Short-range fighter that counter-attacks when struck
    Soldier { combat: CombatState },
    /// Long-range fighter that picks its own targets and flees when struck
    Archer { combat: CombatState },
    /// Heavy hitter that spends charges to blink away from incoming blows
    Mage {
        combat: CombatState,
        charges: u32,
        recharge: u32,
    },
}

impl AgentKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            AgentKind::Peasant { .. } => "Peasant",
            AgentKind::Soldier { .. } => "Soldier",
            AgentKind::Archer { .. } => "Archer",
            AgentKind::Mage { .. } => "Mage",
        }
    }

    /// Reach and damage, for kinds that can fight
    pub fn combat_profile(&self) -> Option<CombatProfile> {
        match self {
            AgentKind::Peasant { .. } => None,
            AgentKind::Soldier { .. } => Some(CombatProfile {
                range: SOLDIER_RANGE,
                strength: SOLDIER_STRENGTH,
            }),
            AgentKind::Archer { .. } => Some(CombatProfile {
                range: ARCHER_RANGE,
                strength: ARCHER_STRENGTH,
            }),
            AgentKind::Mage { .. } => Some(CombatProfile {
                range: MAGE_RANGE,
                strength: MAGE_STRENGTH,
            }),
        }
    }

    pub fn is_worker(&self) -> bool {
        matches!(self, AgentKind::Peasant { .. })
    }

    pub fn combat_state(&self) -> Option<&CombatState> {
        match self {
            AgentKind::Peasant { .. } => None,
            AgentKind::Soldier { combat }
            | AgentKind::Archer { combat }
            | AgentKind::Mage { combat, .. } => Some(combat),
        }
    }

    fn combat_state_mut(&mut self) -> Option<&mut CombatState> {
        match self {
            AgentKind::Peasant { .. } => None,
            AgentKind::Soldier { combat }
            | AgentKind::Archer { combat }
            | AgentKind::Mage { combat, .. } => Some(combat),
        }
    }
}

/// A mobile, named simulation entity
///
/// Agents present in the model registry are alive; a dying agent is
/// removed from the registry, from every group and from the views before
/// the blow that killed it finishes resolving.
#[derive(Debug, Clone)]
pub struct Agent {
    name: String,
    health: i32,
    motion: Motion,
    groups: BTreeSet<String>,
    kind: AgentKind,
}

impl Agent {
    fn new(name: impl Into<String>, location: Vec2, health: i32, speed: f32, kind: AgentKind) -> Self {
        Self {
            name: name.into(),
            health,
            motion: Motion::new(location, speed),
            groups: BTreeSet::new(),
            kind,
        }
    }

    pub fn peasant(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self::new(
            name,
            location,
            config.default_agent_health,
            config.agent_speed,
            AgentKind::Peasant {
                carried: 0.0,
                job: None,
            },
        )
    }

    pub fn soldier(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self::new(
            name,
            location,
            config.default_agent_health,
            config.agent_speed,
            AgentKind::Soldier {
                combat: CombatState::NotAttacking,
            },
        )
    }

    pub fn archer(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self::new(
            name,
            location,
            config.default_agent_health,
            config.agent_speed,
            AgentKind::Archer {
                combat: CombatState::NotAttacking,
            },
        )
    }

    pub fn mage(name: impl Into<String>, location: Vec2, config: &SimConfig) -> Self {
        Self::new(
            name,
            location,
            MAGE_HEALTH,
            config.agent_speed,
            AgentKind::Mage {
                combat: CombatState::NotAttacking,
                charges: MAGE_MAX_CHARGES,
                recharge: MAGE_RECHARGE_TICKS,
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn location(&self) -> Vec2 {
        self.motion.location()
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_moving()
    }

    pub fn kind(&self) -> &AgentKind {
        &self.kind
    }

    #[cfg(test)]
    pub(crate) fn kind_mut(&mut self) -> &mut AgentKind {
        &mut self.kind
    }

    /// Names of the groups this agent belongs to (back-references only;
    /// the groups themselves live in the model)
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    pub(crate) fn join_group(&mut self, group: &str) {
        self.groups.insert(group.to_string());
    }

    pub(crate) fn leave_group(&mut self, group: &str) {
        self.groups.remove(group);
    }

    /// Head toward `destination`, abandoning any work in progress
    pub fn move_to(&mut self, destination: Vec2) {
        self.forget_job();
        info!(name = %self.name, x = destination.x, y = destination.y, "moving out");
        self.motion.start_moving(destination);
    }

    /// Halt in place and abandon any work in progress
    ///
    /// Idempotent: stopping an agent that is already idle changes nothing.
    pub fn stop(&mut self) {
        let working = matches!(&self.kind, AgentKind::Peasant { job: Some(_), .. });
        if self.motion.is_moving() || working {
            info!(name = %self.name, "stopping");
            self.motion.stop_moving();
            self.forget_job();
        }
    }

    fn forget_job(&mut self) {
        if let AgentKind::Peasant { job, .. } = &mut self.kind {
            *job = None;
        }
    }

    /// Begin ferrying food from `source` to `destination`
    ///
    /// The starting phase depends on the current load and position, so a
    /// peasant interrupted mid-cycle resumes sensibly. The model has
    /// already validated both structure names.
    pub(crate) fn start_working(
        &mut self,
        source: &str,
        destination: &str,
        source_loc: Vec2,
        destination_loc: Vec2,
    ) -> Result<()> {
        let location = self.motion.location();
        let AgentKind::Peasant { carried, job } = &mut self.kind else {
            return Err(SimError::InvalidCommand(format!(
                "{} cannot work",
                self.name
            )));
        };
        self.motion.stop_moving();
        if *carried == 0.0 {
            if location == source_loc {
                *job = Some(Job::new(source, destination, WorkPhase::Collecting));
            } else {
                self.motion.start_moving(source_loc);
                *job = Some(Job::new(source, destination, WorkPhase::Inbound));
            }
        } else if location == destination_loc {
            *job = Some(Job::new(source, destination, WorkPhase::Depositing));
        } else {
            self.motion.start_moving(destination_loc);
            *job = Some(Job::new(source, destination, WorkPhase::Outbound));
        }
        info!(name = %self.name, source, destination, "starting work");
        Ok(())
    }

    pub(crate) fn set_attacking(&mut self, target: String) {
        if let Some(state) = self.kind.combat_state_mut() {
            *state = CombatState::Attacking { target };
        }
    }

    fn set_not_attacking(&mut self) {
        if let Some(state) = self.kind.combat_state_mut() {
            *state = CombatState::NotAttacking;
        }
    }

    /// Absorb a strike of `strength` from `attacker`
    ///
    /// Called with this agent detached from the registry; registry and
    /// group cleanup after a fatal hit is the model's job.
    pub(crate) fn take_hit(&mut self, strength: i32, attacker: &AttackerInfo, model: &mut Model) {
        if self.try_evade(attacker, model) {
            return;
        }
        self.lose_health(strength, model);
        if !self.is_alive() {
            return;
        }
        match &mut self.kind {
            AgentKind::Soldier { combat } => {
                // Retaliation is unconditional and immediate
                if !combat.is_attacking() {
                    info!(name = %self.name, target = %attacker.name, "counter-attacking");
                    *combat = CombatState::Attacking {
                        target: attacker.name.clone(),
                    };
                }
            }
            AgentKind::Archer { .. } => {
                if let Some((shelter, loc)) = model.nearest_structure(self.motion.location()) {
                    info!(name = %self.name, shelter = %shelter, "running for shelter");
                    self.motion.start_moving(loc);
                }
            }
            _ => {}
        }
    }

    /// Mage evasion: spend a charge to blink clear of the blow
    ///
    /// Blinks the casting range directly away from the attacker, or
    /// toward the nearest structure when the attacker is co-located, or
    /// stays put when there is nowhere to go. No damage in any case.
    fn try_evade(&mut self, attacker: &AttackerInfo, model: &mut Model) -> bool {
        let own = self.motion.location();
        let AgentKind::Mage { charges, .. } = &mut self.kind else {
            return false;
        };
        if *charges == 0 {
            return false;
        }
        *charges -= 1;
        let direction = if attacker.location != own {
            (own - attacker.location).normalize_or_zero()
        } else {
            match model.nearest_structure(own) {
                Some((_, loc)) if loc != own => (loc - own).normalize_or_zero(),
                _ => Vec2::ZERO,
            }
        };
        info!(name = %self.name, attacker = %attacker.name, "blinks clear of the blow");
        if direction != Vec2::ZERO {
            self.motion.jump_to(own + direction * MAGE_RANGE);
            model.notify_location(&self.name, self.motion.location());
        }
        true
    }

    fn lose_health(&mut self, strength: i32, model: &mut Model) {
        self.health -= strength;
        model.notify_health(&self.name, self.health);
        if self.is_alive() {
            info!(name = %self.name, health = self.health, "takes a hit");
        } else {
            self.motion.stop_moving();
            info!(name = %self.name, "has fallen");
        }
    }

    /// Per-tick behavior: the movement step always runs first, then the
    /// kind-specific state machine
    pub(crate) fn update(&mut self, model: &mut Model) {
        if self.motion.is_moving() {
            let arrived = self.motion.update_location();
            model.notify_location(&self.name, self.motion.location());
            if arrived {
                debug!(name = %self.name, "arrived");
            }
        }
        match self.kind {
            AgentKind::Peasant { .. } => self.update_work(model),
            _ => self.update_combat(model),
        }
    }

    fn update_work(&mut self, model: &mut Model) {
        let capacity = model.config().peasant_capacity;
        let AgentKind::Peasant {
            carried,
            job: Some(job),
        } = &mut self.kind
        else {
            return;
        };
        match job.phase {
            WorkPhase::Inbound => {
                if !self.motion.is_moving() {
                    job.phase = WorkPhase::Collecting;
                }
            }
            WorkPhase::Collecting => {
                let request = capacity - *carried;
                let received = model.withdraw_from(&job.source, request);
                if received > 0.0 {
                    *carried += received;
                    model.notify_amount(&self.name, *carried);
                    info!(name = %self.name, amount = received, source = %job.source, "collected food");
                    if let Some(dest) = model.structure_location(&job.destination) {
                        self.motion.start_moving(dest);
                    }
                    job.phase = WorkPhase::Outbound;
                } else {
                    info!(name = %self.name, source = %job.source, "waiting for food");
                }
            }
            WorkPhase::Outbound => {
                if !self.motion.is_moving() {
                    job.phase = WorkPhase::Depositing;
                }
            }
            WorkPhase::Depositing => {
                model.deposit_to(&job.destination, *carried);
                info!(name = %self.name, amount = *carried, destination = %job.destination, "deposited food");
                *carried = 0.0;
                model.notify_amount(&self.name, 0.0);
                if let Some(src) = model.structure_location(&job.source) {
                    self.motion.start_moving(src);
                }
                job.phase = WorkPhase::Inbound;
            }
        }
    }

    fn update_combat(&mut self, model: &mut Model) {
        self.tick_recharge();
        let Some(profile) = self.kind.combat_profile() else {
            return;
        };
        let target = self
            .kind
            .combat_state()
            .and_then(|s| s.target())
            .map(str::to_string);
        let Some(target) = target else {
            // Archers pick their own fights: nearest agent in range that
            // shares no group with them
            if matches!(self.kind, AgentKind::Archer { .. }) {
                if let Some(foe) =
                    model.nearest_hostile(&self.name, self.location(), &self.groups, profile.range)
                {
                    info!(name = %self.name, target = %foe, "drawing on the nearest foe");
                    self.set_attacking(foe);
                }
            }
            return;
        };
        let target_loc = match model.find_agent(&target) {
            Some(t) => t.location(),
            None => {
                info!(name = %self.name, target = %target, "target is dead");
                self.set_not_attacking();
                return;
            }
        };
        if self.location().distance(target_loc) > profile.range {
            info!(name = %self.name, target = %target, "target is now out of range");
            self.set_not_attacking();
            return;
        }
        if let AgentKind::Mage { charges, .. } = &self.kind {
            if *charges == 0 {
                info!(name = %self.name, "must recharge before casting");
                return;
            }
        }
        info!(name = %self.name, target = %target, "strikes");
        match model.strike(&self.name, self.location(), profile.strength, &target) {
            StrikeOutcome::Killed => {
                info!(name = %self.name, target = %target, "felled its target");
                self.set_not_attacking();
            }
            StrikeOutcome::Gone => self.set_not_attacking(),
            StrikeOutcome::Hit => {}
        }
    }

    fn tick_recharge(&mut self) {
        if let AgentKind::Mage {
            charges, recharge, ..
        } = &mut self.kind
        {
            if *charges < MAGE_MAX_CHARGES {
                if *recharge > 1 {
                    *recharge -= 1;
                } else {
                    *charges += 1;
                    *recharge = MAGE_RECHARGE_TICKS;
                    debug!(name = %self.name, charges = *charges, "regained a charge");
                }
            }
        }
    }

    pub fn describe(&self) -> String {
        let loc = self.location();
        let mut line = format!(
            "{} {} at ({:.1}, {:.1}), health {}",
            self.kind.kind_name(),
            self.name,
            loc.x,
            loc.y,
            self.health
        );
        match &self.kind {
            AgentKind::Peasant { carried, job } => {
                line.push_str(&format!(", carrying {:.1}", carried));
                if let Some(job) = job {
                    line.push_str(&format!(
                        ", ferrying {} -> {} ({:?})",
                        job.source, job.destination, job.phase
                    ));
                }
            }
            AgentKind::Mage { combat, charges, .. } => {
                line.push_str(&format!(", {} charges", charges));
                if let Some(target) = combat.target() {
                    line.push_str(&format!(", attacking {}", target));
                }
            }
            AgentKind::Soldier { combat } | AgentKind::Archer { combat } => {
                if let Some(target) = combat.target() {
                    line.push_str(&format!(", attacking {}", target));
                }
            }
        }
        if let Some(dest) = self.motion.destination() {
            line.push_str(&format!(", heading to ({:.1}, {:.1})", dest.x, dest.y));
        }
        line
    }
}
