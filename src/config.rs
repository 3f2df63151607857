//! Tunable locomotion constants, loaded from TOML.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//!
//! ```toml
//! run_speed = 12.0
//! air_action_limit = -1   # unlimited air jumps / dashes
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Planar speed while walking or airborne after a normal jump (units/s).
    pub run_speed: f32,
    /// Planar speed while dashing or airborne after a dash-launched jump.
    pub dash_speed: f32,
    /// Seconds a held dash stays active.
    pub dash_duration: f32,
    /// Apex height of an uninterrupted jump above its launch point.
    pub jump_height: f32,
    /// Gravity used to derive the launch speed from `jump_height`.
    pub jump_gravity: f32,
    /// Gravity integrated while airborne (units/s²).
    pub gravity: f32,
    /// Terminal fall speed.
    pub max_gravity: f32,
    /// Air jumps + air dashes allowed before landing. Negative = unlimited.
    pub air_action_limit: i32,
    /// Extra deceleration of upward speed once jump is released (short hop).
    pub interrupt_force: f32,
    /// Rate at which Idle brings velocity to rest (units/s²).
    pub idle_friction: f32,
    /// Degrees of yaw per unit of horizontal look delta.
    pub look_sensitivity: f32,
    /// Ground query tolerance used to decide whether to *leave* the ground.
    pub maintain_ground_tolerance: f32,
    /// Ground query tolerance used to decide whether to *land*.
    pub acquire_ground_tolerance: f32,
    /// Planar mode: move along world right only, facing follows the move axes.
    pub side_scrolling: bool,
    /// Pin the depth (Z) axis to its spawn value every tick.
    pub lock_depth_axis: bool,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            run_speed: 10.0,
            dash_speed: 20.0,
            dash_duration: 2.0,
            jump_height: 6.0,
            jump_gravity: 55.0,
            gravity: 55.0,
            max_gravity: 65.0,
            air_action_limit: 1,
            interrupt_force: 100.0,
            idle_friction: 100.0,
            look_sensitivity: 1.0,
            maintain_ground_tolerance: 0.5,
            acquire_ground_tolerance: 0.01,
            side_scrolling: false,
            lock_depth_axis: false,
        }
    }
}

impl LocomotionConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded locomotion config: {}", path.display());
        Ok(config)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce NaN or nonsensical motion.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("run_speed", self.run_speed),
            ("dash_speed", self.dash_speed),
            ("dash_duration", self.dash_duration),
            ("jump_height", self.jump_height),
            ("interrupt_force", self.interrupt_force),
            ("idle_friction", self.idle_friction),
            ("maintain_ground_tolerance", self.maintain_ground_tolerance),
            ("acquire_ground_tolerance", self.acquire_ground_tolerance),
        ];
        let positive = [
            ("jump_gravity", self.jump_gravity),
            ("gravity", self.gravity),
            ("max_gravity", self.max_gravity),
        ];

        for (field, value) in non_negative.into_iter().chain(positive) {
            if !value.is_finite() {
                return Err(invalid(field, format!("{} is not a finite number", value)));
            }
        }
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(invalid(field, format!("must be >= 0, got {}", value)));
            }
        }
        for (field, value) in positive {
            if value <= 0.0 {
                return Err(invalid(field, format!("must be > 0, got {}", value)));
            }
        }
        if !self.look_sensitivity.is_finite() {
            return Err(invalid("look_sensitivity", "is not a finite number".into()));
        }
        Ok(())
    }

    /// Launch speed that peaks exactly `jump_height` above the launch point.
    pub fn jump_speed(&self) -> f32 {
        (2.0 * self.jump_height * self.jump_gravity).sqrt()
    }

    /// Planar speed used while airborne.
    pub fn air_speed(&self, dash_launched: bool) -> f32 {
        if dash_launched {
            self.dash_speed
        } else {
            self.run_speed
        }
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
