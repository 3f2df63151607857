mod character;

pub use character::{CharacterFsm, CharacterState, MotionState};

use glam::{Mat4, Quat, Vec3};

/// Spatial transform with position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

/// Display name of a simulated character.
#[derive(Debug, Clone)]
pub struct Label(pub String);

/// Per-character run statistics collected by the locomotion system.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionTrace {
    pub peak_height: f32,
    pub transitions: u32,
}
