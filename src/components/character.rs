use glam::Vec3;

use crate::fsm::StateMachine;

// ---------------------------------------------------------------------------
// Character state machine
// ---------------------------------------------------------------------------

/// All discrete locomotion states a character can be in.
///
/// Transition logic lives in `src/systems/locomotion.rs` (where it has access
/// to input and ground context) rather than here so that this file stays
/// pure data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CharacterState {
    /// Grounded, no movement input. Friction brings velocity to rest.
    Idle,
    /// Grounded, accelerating toward run speed along the input direction.
    Walk,
    /// Ascending after a grounded jump.
    Jump,
    /// Airborne and descending, or walked off an edge.
    Fall,
    /// Grounded burst along facing while the dash button is held.
    Dash,
    /// Jump started in the air. Consumes one air action.
    AirJump,
    /// Dash started in the air. Cancels vertical speed and consumes one air action.
    AirDash,
}

impl CharacterState {
    pub const ALL: [CharacterState; 7] = [
        Self::Idle,
        Self::Walk,
        Self::Jump,
        Self::Fall,
        Self::Dash,
        Self::AirJump,
        Self::AirDash,
    ];
}

/// Shared motion fields that the state callbacks read and mutate.
///
/// Created once at spawn and carried across every transition; nothing here is
/// reset implicitly when the state changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    /// Current velocity. Integrated into position by the late hook.
    pub velocity: Vec3,
    /// Unit direction the character faces. Written only by the global hooks.
    pub facing: Vec3,
    /// Air jumps + air dashes since the last time Idle was entered.
    pub air_actions_used: u32,
    /// Simulation time the most recent dash started. `None` before any dash.
    pub dash_start_time: Option<f32>,
    /// Set by Jump's enter when launched out of a dash. Reset by Idle's enter.
    pub dash_launched_jump: bool,
}

impl MotionState {
    pub fn new(facing: Vec3) -> Self {
        Self {
            velocity: Vec3::ZERO,
            facing,
            air_actions_used: 0,
            dash_start_time: None,
            dash_launched_jump: false,
        }
    }
}

/// FSM driving one character. `C` is the callback context.
pub type CharacterFsm<C> = StateMachine<CharacterState, C>;
