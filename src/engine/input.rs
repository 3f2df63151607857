use glam::{Vec2, Vec3};

/// Player intent for one tick. Immutable once handed to the locomotion core.
///
/// `*_pressed` flags are edges (true only on the tick the button went down);
/// `*_held` flags are levels (true from press until release).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// `x` = sideways (right positive), `z` = forward. Components in [-1, 1].
    pub move_axes: Vec3,
    /// Mouse / right-stick look delta for this tick.
    pub look_delta: Vec2,
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub dash_pressed: bool,
    pub dash_held: bool,
}

impl InputSnapshot {
    /// No movement, no look, no buttons.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn with_move(mut self, sideways: f32, forward: f32) -> Self {
        self.move_axes = Vec3::new(sideways, 0.0, forward);
        self
    }

    pub fn with_look(mut self, dx: f32, dy: f32) -> Self {
        self.look_delta = Vec2::new(dx, dy);
        self
    }

    /// Jump went down this tick (and is therefore held).
    pub fn press_jump(mut self) -> Self {
        self.jump_pressed = true;
        self.jump_held = true;
        self
    }

    pub fn hold_jump(mut self) -> Self {
        self.jump_held = true;
        self
    }

    /// Dash went down this tick (and is therefore held).
    pub fn press_dash(mut self) -> Self {
        self.dash_pressed = true;
        self.dash_held = true;
        self
    }

    pub fn hold_dash(mut self) -> Self {
        self.dash_held = true;
        self
    }

    pub fn has_move(&self) -> bool {
        self.move_axes != Vec3::ZERO
    }
}

/// Turns raw per-tick button levels into [`InputSnapshot`] edges and holds.
///
/// This is host-side plumbing; the locomotion core only ever sees snapshots.
#[derive(Debug, Clone, Default)]
pub struct InputLatch {
    jump_down: bool,
    dash_down: bool,
}

impl InputLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample this tick's raw device state.
    pub fn sample(
        &mut self,
        move_axes: Vec3,
        look_delta: Vec2,
        jump: bool,
        dash: bool,
    ) -> InputSnapshot {
        let snapshot = InputSnapshot {
            move_axes: move_axes.clamp(Vec3::splat(-1.0), Vec3::ONE),
            look_delta,
            jump_pressed: jump && !self.jump_down,
            jump_held: jump,
            dash_pressed: dash && !self.dash_down,
            dash_held: dash,
        };
        self.jump_down = jump;
        self.dash_down = dash;
        snapshot
    }
}

/// One segment of a scripted input sequence: raw button levels held for `ticks`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScriptStep {
    pub ticks: u32,
    pub move_axes: Vec3,
    pub look_delta: Vec2,
    pub jump: bool,
    pub dash: bool,
}

impl ScriptStep {
    /// Nothing pressed for `ticks`.
    pub fn rest(ticks: u32) -> Self {
        Self {
            ticks,
            ..Self::default()
        }
    }

    pub fn moving(mut self, sideways: f32, forward: f32) -> Self {
        self.move_axes = Vec3::new(sideways, 0.0, forward);
        self
    }

    pub fn looking(mut self, dx: f32) -> Self {
        self.look_delta = Vec2::new(dx, 0.0);
        self
    }

    pub fn jump(mut self) -> Self {
        self.jump = true;
        self
    }

    pub fn dash(mut self) -> Self {
        self.dash = true;
        self
    }
}

/// Replays [`ScriptStep`]s through an [`InputLatch`], one snapshot per tick.
/// Once exhausted it yields neutral input.
#[derive(Debug, Clone, Default)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
    cursor: usize,
    tick_in_step: u32,
    latch: InputLatch,
}

impl InputScript {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn next_snapshot(&mut self) -> InputSnapshot {
        let step = loop {
            match self.steps.get(self.cursor) {
                Some(step) if self.tick_in_step < step.ticks => break *step,
                Some(_) => {
                    self.cursor += 1;
                    self.tick_in_step = 0;
                }
                None => break ScriptStep::default(),
            }
        };
        self.tick_in_step = self.tick_in_step.saturating_add(1);
        self.latch
            .sample(step.move_axes, step.look_delta, step.jump, step.dash)
    }

    pub fn finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Total ticks the script covers.
    pub fn len_ticks(&self) -> u32 {
        self.steps.iter().map(|s| s.ticks).sum()
    }
}
