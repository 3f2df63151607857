mod ground;
mod locomotion;

pub use ground::{FlatGround, LocomotionSurface};
pub use locomotion::{
    locomotion_system, look_rotation, move_towards, Character, LocomotionMachine, Towards,
};
