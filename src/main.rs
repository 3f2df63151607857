use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use hecs::World;

use locomotion::components::{Label, MotionTrace};
use locomotion::config::LocomotionConfig;
use locomotion::scene::test_scene::{load_test_scene, Scenario};
use locomotion::systems::{locomotion_system, FlatGround, LocomotionMachine};

#[derive(Parser)]
#[command(name = "locomotion", about = "Headless character locomotion runner")]
struct Args {
    /// TOML file overriding the default locomotion constants
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scripted run to simulate
    #[arg(long, value_enum, default_value_t = Scenario::All)]
    scenario: Scenario,

    /// Number of simulation ticks
    #[arg(long, default_value_t = 240)]
    ticks: u32,

    /// Seconds per tick
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Force planar (side-scrolling) movement
    #[arg(long)]
    side_scrolling: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LocomotionConfig::load(path)?,
        None => LocomotionConfig::default(),
    };
    if args.side_scrolling {
        config.side_scrolling = true;
    }
    config.validate()?;

    if args.dt <= 0.0 || !args.dt.is_finite() {
        log::warn!("Non-positive --dt {}; characters will not move", args.dt);
    }

    let mut world = World::new();
    let scenarios = args.scenario.expand();
    load_test_scene(&mut world, &config, &scenarios)?;
    log::info!(
        "Simulating {} character(s) for {} ticks at dt={}",
        scenarios.len(),
        args.ticks,
        args.dt
    );

    for _ in 0..args.ticks {
        locomotion_system(&mut world, args.dt);
    }

    for (_e, (label, machine, trace)) in world
        .query::<(&Label, &LocomotionMachine<FlatGround>, &MotionTrace)>()
        .iter()
    {
        let motion = machine.motion();
        let p = machine.transform().position;
        let v = motion.velocity;
        println!(
            "{:<10} {:<8} pos=({:7.2}, {:6.2}, {:7.2}) vel=({:6.2}, {:6.2}, {:6.2}) peak={:5.2} air_actions={} transitions={}",
            label.0,
            format!("{:?}", machine.state()),
            p.x, p.y, p.z,
            v.x, v.y, v.z,
            trace.peak_height,
            motion.air_actions_used,
            trace.transitions,
        );
    }

    Ok(())
}
