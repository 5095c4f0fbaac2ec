//! Combat integration tests
//!
//! End-to-end runs of the attack state machines through the model's tick
//! loop: duels, retaliation, mage evasion, archer acquisition and flight.
//! Update order is lexicographic by name, so the sequences asserted here
//! are fully deterministic.

use hamlet::agent::combat::CombatState;
use hamlet::agent::{Agent, AgentKind};
use hamlet::core::config::SimConfig;
use hamlet::core::types::Vec2;
use hamlet::group::{Formation, Group};
use hamlet::model::Model;
use hamlet::structure::Structure;

fn setup() -> (Model, SimConfig) {
    let config = SimConfig::default();
    (Model::new(config.clone()), config)
}

fn combat_state<'a>(model: &'a Model, name: &str) -> &'a CombatState {
    model
        .find_agent(name)
        .expect("agent should exist")
        .kind()
        .combat_state()
        .expect("agent should fight")
}

#[test]
fn test_soldier_duel_with_retaliation() {
    let (mut model, config) = setup();
    model
        .add_agent(Agent::soldier("alpha", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::soldier("bruno", Vec2::new(1.0, 0.0), &config))
        .unwrap();
    model.agent_start_attacking("alpha", "bruno").unwrap();

    // Tick 1: alpha strikes first (lexicographic order); bruno survives,
    // counter-attacks immediately, and strikes back within the same tick.
    model.update();
    assert_eq!(model.find_agent("bruno").unwrap().health(), 3);
    assert_eq!(model.find_agent("alpha").unwrap().health(), 3);
    assert_eq!(combat_state(&model, "bruno").target(), Some("alpha"));

    // Tick 2: both trade blows again.
    model.update();
    assert_eq!(model.find_agent("bruno").unwrap().health(), 1);
    assert_eq!(model.find_agent("alpha").unwrap().health(), 1);

    // Tick 3: alpha's blow is fatal. Bruno is de-registered before alpha's
    // update returns and never gets to swing.
    model.update();
    assert!(model.find_agent("bruno").is_none());
    let alpha = model.find_agent("alpha").unwrap();
    assert!(alpha.is_alive());
    assert_eq!(alpha.health(), 1);
    assert_eq!(combat_state(&model, "alpha"), &CombatState::NotAttacking);
}

#[test]
fn test_one_hit_kill_leaves_no_retaliation() {
    let (mut model, config) = setup();
    // Mage strength 5 one-shots a default soldier (health 5).
    model
        .add_agent(Agent::mage("aggro", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::soldier("dolf", Vec2::new(3.0, 0.0), &config))
        .unwrap();
    model.agent_start_attacking("aggro", "dolf").unwrap();

    model.update();
    assert!(model.find_agent("dolf").is_none());
    // The dead soldier never engaged its killer.
    let aggro = model.find_agent("aggro").unwrap();
    assert!(aggro.is_alive());
    assert_eq!(combat_state(&model, "aggro"), &CombatState::NotAttacking);
}

#[test]
fn test_mage_evades_away_from_attacker() {
    let (mut model, config) = setup();
    model
        .add_agent(Agent::soldier("sam", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::mage("mira", Vec2::new(1.0, 0.0), &config))
        .unwrap();
    model.agent_start_attacking("sam", "mira").unwrap();

    // Sam's strike is fully evaded: one charge spent, zero damage, and a
    // blink of exactly the casting range directly away from sam.
    model.update();
    let mira = model.find_agent("mira").unwrap();
    assert_eq!(mira.health(), 4);
    assert_eq!(mira.location(), Vec2::new(7.0, 0.0));
    let AgentKind::Mage { charges, .. } = mira.kind() else {
        panic!("expected mage");
    };
    assert_eq!(*charges, 1);

    // The blink put mira far outside sam's reach; sam disengages.
    model.update();
    assert_eq!(combat_state(&model, "sam"), &CombatState::NotAttacking);
}

#[test]
fn test_archer_auto_engages_nearest_foe() {
    let (mut model, config) = setup();
    model
        .add_agent(Agent::archer("arlo", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::peasant("pete", Vec2::new(3.0, 0.0), &config))
        .unwrap();

    // Tick 1: acquisition only; the first arrow flies next tick.
    model.update();
    assert_eq!(combat_state(&model, "arlo").target(), Some("pete"));
    assert_eq!(model.find_agent("pete").unwrap().health(), 5);

    model.update();
    assert_eq!(model.find_agent("pete").unwrap().health(), 4);
}

#[test]
fn test_archer_leaves_groupmates_alone() {
    let (mut model, config) = setup();
    model
        .add_agent(Agent::archer("arlo", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::peasant("pete", Vec2::new(3.0, 0.0), &config))
        .unwrap();
    model
        .add_group(Group::new("band", Formation::default()))
        .unwrap();
    model.group_add_agent("band", "arlo").unwrap();
    model.group_add_agent("band", "pete").unwrap();

    model.update();
    model.update();
    assert_eq!(combat_state(&model, "arlo"), &CombatState::NotAttacking);
    assert_eq!(model.find_agent("pete").unwrap().health(), 5);
}

#[test]
fn test_archer_flees_toward_nearest_structure_when_hit() {
    let (mut model, config) = setup();
    model
        .add_structure(Structure::farm("refuge", Vec2::new(30.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::soldier("sam", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::archer("arlo", Vec2::new(1.0, 0.0), &config))
        .unwrap();
    model.agent_start_attacking("sam", "arlo").unwrap();

    // Tick 1: arlo (updating first) acquires sam; sam's blow lands and
    // sends arlo running toward the farm.
    model.update();
    let arlo = model.find_agent("arlo").unwrap();
    assert_eq!(arlo.health(), 3);
    assert_eq!(arlo.location(), Vec2::new(1.0, 0.0));
    assert!(arlo.is_moving());

    // Tick 2: arlo has opened the distance beyond sam's melee reach.
    model.update();
    let arlo = model.find_agent("arlo").unwrap();
    assert_eq!(arlo.location(), Vec2::new(6.0, 0.0));
    assert_eq!(combat_state(&model, "sam"), &CombatState::NotAttacking);
}

#[test]
fn test_attack_command_validation() {
    let (mut model, config) = setup();
    model
        .add_agent(Agent::soldier("sten", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::soldier("faro", Vec2::new(50.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::peasant("pia", Vec2::new(0.0, 0.0), &config))
        .unwrap();

    assert!(model.agent_start_attacking("sten", "sten").is_err());
    assert!(model.agent_start_attacking("sten", "nobody").is_err());
    assert!(model.agent_start_attacking("sten", "faro").is_err()); // out of range
    assert!(model.agent_start_attacking("pia", "sten").is_err()); // cannot fight
    assert_eq!(
        combat_state(&model, "sten"),
        &CombatState::NotAttacking,
        "rejected commands must not change state"
    );
}

#[test]
fn test_mage_evades_twice_then_recharges() {
    let (mut model, config) = setup();
    // Mage "avia" attacks mage "prey". Prey evades the first strike and
    // blinks out of range, so avia disengages; prey's spent charge then
    // ticks back up over three ticks.
    model
        .add_agent(Agent::mage("avia", Vec2::new(0.0, 0.0), &config))
        .unwrap();
    model
        .add_agent(Agent::mage("prey", Vec2::new(3.0, 0.0), &config))
        .unwrap();
    model.agent_start_attacking("avia", "prey").unwrap();

    // Tick 1: avia strikes, prey blinks to (9, 0) with one charge left.
    model.update();
    let prey = model.find_agent("prey").unwrap();
    assert_eq!(prey.health(), 4);
    assert_eq!(prey.location(), Vec2::new(9.0, 0.0));
    let AgentKind::Mage { charges, .. } = prey.kind() else {
        panic!("expected mage");
    };
    assert_eq!(*charges, 1);

    // Tick 2: prey is out of range; avia disengages.
    model.update();
    assert_eq!(combat_state(&model, "avia"), &CombatState::NotAttacking);

    // Two more ticks complete the three-tick recharge.
    model.update();
    model.update();
    let AgentKind::Mage { charges, .. } = model.find_agent("prey").unwrap().kind() else {
        panic!("expected mage");
    };
    assert_eq!(*charges, 2);
}
