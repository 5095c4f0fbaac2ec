//! Scripted skirmish demo
//!
//! Drives the kernel through its public API: a peasant ferries food from
//! a farm to the town hall while a brawl breaks out between two soldiers,
//! an archer and a mage. A tracing view narrates every state change.
//! Run with RUST_LOG=debug for the tick-by-tick detail.

use hamlet::agent::Agent;
use hamlet::core::config::SimConfig;
use hamlet::core::error::Result;
use hamlet::core::types::Vec2;
use hamlet::group::{Formation, Group};
use hamlet::model::Model;
use hamlet::structure::Structure;
use hamlet::view::TraceView;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SimConfig::default();
    if let Err(err) = config.validate() {
        eprintln!("bad configuration: {err}");
        std::process::exit(1);
    }

    let mut model = Model::new(config.clone());
    model.attach(Box::new(TraceView));

    if let Err(err) = run(&mut model, &config) {
        eprintln!("scenario failed: {err}");
        std::process::exit(1);
    }

    println!("{}", model.describe());
}

fn run(model: &mut Model, config: &SimConfig) -> Result<()> {
    model.add_structure(Structure::farm("field", Vec2::new(0.0, 0.0), config))?;
    model.add_structure(Structure::town_hall("hall", Vec2::new(20.0, 0.0), config))?;

    model.add_agent(Agent::peasant("pia", Vec2::new(0.0, 0.0), config))?;
    model.add_agent(Agent::soldier("sten", Vec2::new(10.0, 4.0), config))?;
    model.add_agent(Agent::soldier("ogrim", Vec2::new(10.0, 5.0), config))?;
    model.add_agent(Agent::archer("arlo", Vec2::new(12.0, 4.0), config))?;
    model.add_agent(Agent::mage("mira", Vec2::new(8.0, 6.0), config))?;

    model.add_group(Group::new("militia", Formation::Line))?;
    model.group_add_agent("militia", "sten")?;
    model.group_add_agent("militia", "arlo")?;

    model.agent_start_working("pia", "field", "hall")?;
    model.agent_start_attacking("ogrim", "sten")?;

    for _ in 0..30 {
        model.update();
    }
    model.notify_draw();
    Ok(())
}
