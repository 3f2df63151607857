//! Platformer-style character locomotion: a flat state-dispatch engine and
//! the seven-state movement machine built on it.

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod fsm;
pub mod scene;
pub mod systems;

pub use components::{CharacterState, MotionState};
pub use config::LocomotionConfig;
pub use engine::input::InputSnapshot;
pub use error::{ConfigError, Error, FsmError};
pub use systems::{FlatGround, LocomotionMachine, LocomotionSurface};
