use glam::Vec3;
use hecs::{Entity, World};

use crate::components::{Label, LocalTransform, MotionTrace};
use crate::config::LocomotionConfig;
use crate::engine::input::InputScript;
use crate::error::Error;
use crate::systems::{FlatGround, LocomotionMachine};

/// Spawn one scripted character standing at `pos` on `ground`.
///
/// Each entity owns its own machine and ground collaborator, so characters
/// never share mutable state.
pub fn spawn_character(
    world: &mut World,
    label: &str,
    config: LocomotionConfig,
    ground: FlatGround,
    pos: Vec3,
    script: InputScript,
) -> Result<Entity, Error> {
    let machine = LocomotionMachine::new(config, ground, LocalTransform::new(pos))?;
    let trace = MotionTrace {
        peak_height: pos.y,
        transitions: 0,
    };
    Ok(world.spawn((Label(label.to_string()), machine, script, trace)))
}
