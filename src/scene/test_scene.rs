use clap::ValueEnum;
use glam::Vec3;
use hecs::{Entity, World};

use crate::config::LocomotionConfig;
use crate::engine::input::{InputScript, ScriptStep};
use crate::error::Error;
use crate::scene::prefabs::spawn_character;
use crate::systems::FlatGround;

/// Scripted demo runs, one character each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Full jump, button held to the apex.
    Hop,
    /// Jump tapped for two ticks.
    ShortHop,
    /// Held dash along facing until the window expires.
    Dash,
    /// Jump out of a dash: dash-speed air control, no air actions.
    DashJump,
    /// Jump, then keep pressing jump in the air.
    AirJumps,
    /// Walk forward off the edge of a small platform.
    WalkOff,
    /// Walk while turning with look input.
    Circle,
    /// Every scenario above.
    All,
}

impl Scenario {
    pub const RUNNABLE: [Scenario; 7] = [
        Self::Hop,
        Self::ShortHop,
        Self::Dash,
        Self::DashJump,
        Self::AirJumps,
        Self::WalkOff,
        Self::Circle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Hop => "hop",
            Self::ShortHop => "short-hop",
            Self::Dash => "dash",
            Self::DashJump => "dash-jump",
            Self::AirJumps => "air-jumps",
            Self::WalkOff => "walk-off",
            Self::Circle => "circle",
            Self::All => "all",
        }
    }

    /// Expand `All` into the individual scenarios.
    pub fn expand(self) -> Vec<Scenario> {
        match self {
            Self::All => Self::RUNNABLE.to_vec(),
            other => vec![other],
        }
    }

    fn ground(self) -> FlatGround {
        match self {
            Self::WalkOff => FlatGround::platform(0.0, 4.0),
            _ => FlatGround::new(0.0),
        }
    }

    fn script(self) -> InputScript {
        let steps = match self {
            Self::Hop => vec![ScriptStep::rest(5), ScriptStep::rest(60).jump()],
            Self::ShortHop => vec![ScriptStep::rest(5), ScriptStep::rest(2).jump()],
            Self::Dash => vec![ScriptStep::rest(5), ScriptStep::rest(150).dash()],
            Self::DashJump => vec![
                ScriptStep::rest(5),
                ScriptStep::rest(10).dash().moving(0.0, 1.0),
                ScriptStep::rest(40).dash().jump().moving(0.0, 1.0),
            ],
            Self::AirJumps => vec![
                ScriptStep::rest(5),
                ScriptStep::rest(20).jump(),
                ScriptStep::rest(5),
                ScriptStep::rest(20).jump(),
                ScriptStep::rest(5),
                ScriptStep::rest(20).jump(),
            ],
            Self::WalkOff => vec![ScriptStep::rest(120).moving(0.0, 1.0)],
            Self::Circle => vec![ScriptStep::rest(240).moving(0.0, 1.0).looking(1.5)],
            Self::All => Vec::new(),
        };
        InputScript::new(steps)
    }
}

/// Spawn one character per scenario, each on its own ground.
/// Returns the spawned entities in scenario order.
pub fn load_test_scene(
    world: &mut World,
    config: &LocomotionConfig,
    scenarios: &[Scenario],
) -> Result<Vec<Entity>, Error> {
    let mut entities = Vec::with_capacity(scenarios.len());
    for &scenario in scenarios {
        let entity = spawn_character(
            world,
            scenario.name(),
            config.clone(),
            scenario.ground(),
            Vec3::ZERO,
            scenario.script(),
        )?;
        log::debug!("Spawned {} as {:?}", scenario.name(), entity);
        entities.push(entity);
    }
    Ok(entities)
}
