use glam::{Mat3, Quat, Vec3};
use hecs::World;

use crate::components::{CharacterFsm, CharacterState, LocalTransform, MotionState, MotionTrace};
use crate::config::LocomotionConfig;
use crate::engine::input::{InputScript, InputSnapshot};
use crate::error::Error;
use crate::fsm::{StateCallbacks, StateTable, Tick};

use super::ground::{FlatGround, LocomotionSurface};

use CharacterState::{AirDash, AirJump, Dash, Fall, Idle, Jump, Walk};

// ---------------------------------------------------------------------------
// Callback context
// ---------------------------------------------------------------------------

/// Everything a state callback may touch for one character.
pub struct Character<G> {
    pub motion: MotionState,
    pub transform: LocalTransform,
    pub surface: G,
    /// Snapshot for the tick in progress.
    pub input: InputSnapshot,
    pub config: LocomotionConfig,
    /// The depth-axis lock pins Z back to this.
    spawn_position: Vec3,
}

impl<G: LocomotionSurface> Character<G> {
    fn maintaining_ground(&self) -> bool {
        self.surface
            .is_grounded(true, self.config.maintain_ground_tolerance)
    }

    fn acquiring_ground(&self) -> bool {
        self.surface
            .is_grounded(false, self.config.acquire_ground_tolerance)
    }

    /// Dash held and still inside the window opened by the last dash entry.
    fn is_dashing(&self, now: f32) -> bool {
        self.input.dash_held
            && self
                .motion
                .dash_start_time
                .is_some_and(|start| now - start < self.config.dash_duration)
    }

    /// Negative limits mean no cap. A dash-launched jump forfeits air actions.
    fn can_air_act(&self) -> bool {
        let limit = self.config.air_action_limit;
        !self.motion.dash_launched_jump
            && (limit < 0 || i64::from(self.motion.air_actions_used) < i64::from(limit))
    }

    /// Request an air jump or air dash if one is pressed and budgeted.
    ///
    /// Uses `restart` so chaining the same air action re-enters its state.
    fn try_air_action(&self, tick: &mut Tick<CharacterState>) -> bool {
        if !self.can_air_act() {
            return false;
        }
        if self.input.jump_pressed {
            tick.restart(AirJump);
            true
        } else if self.input.dash_pressed {
            tick.restart(AirDash);
            true
        } else {
            false
        }
    }

    /// Input intent expressed relative to facing and up, normalized.
    fn local_movement(&self, state: CharacterState, now: f32) -> Vec3 {
        let facing = self.motion.facing;
        let axes = self.input.move_axes;

        let mut local = if self.config.side_scrolling {
            Vec3::X * axes.x
        } else {
            let right = facing.cross(self.surface.up());
            right * axes.x + facing * axes.z
        };

        // Dashing always pushes along facing, except once a jump has launched.
        if state != Jump && self.is_dashing(now) {
            local += facing;
        }

        local.normalize_or_zero()
    }

    /// Split velocity into its planar part and its signed speed along up.
    fn split_velocity(&self) -> (Vec3, f32) {
        let up = self.surface.up();
        let rise = self.motion.velocity.dot(up);
        (self.motion.velocity - up * rise, rise)
    }

    fn zero_vertical(&mut self) {
        let (planar, _) = self.split_velocity();
        self.motion.velocity = planar;
    }

    fn launch(&mut self) {
        self.zero_vertical();
        self.motion.velocity += self.surface.up() * self.config.jump_speed();
    }

    fn release_ground(&mut self) {
        self.surface.disable_ground_clamp();
        self.surface.disable_slope_limit();
    }

    /// Airborne integration: steer planar speed from input, pull the vertical
    /// speed down toward terminal velocity.
    fn apply_gravity(&mut self, state: CharacterState, now: f32, dt: f32) {
        let (_, mut rise) = self.split_velocity();

        // Jump released while still rising: cut the arc short.
        if !self.input.jump_held && rise > 0.0 {
            rise = move_towards(rise, 0.0, self.config.interrupt_force * dt);
        }

        let speed = self.config.air_speed(self.motion.dash_launched_jump);
        let planar = self.local_movement(state, now) * speed;
        rise = move_towards(rise, -self.config.max_gravity, self.config.gravity * dt);

        self.motion.velocity = planar + self.surface.up() * rise;
    }

    /// Landing or apex check for Jump/AirJump. Returns `true` if a transition
    /// was requested.
    fn jump_ended(&mut self, tick: &mut Tick<CharacterState>) -> bool {
        let (planar, rise) = self.split_velocity();
        // Moving against up is the "more than 90° from up" case.
        if rise < 0.0 && self.acquiring_ground() {
            self.motion.velocity = planar;
            tick.go(Idle);
            return true;
        }
        if rise < 0.0 {
            tick.go(Fall);
            return true;
        }
        false
    }

    fn accelerate_toward(&mut self, state: CharacterState, now: f32, speed: f32) {
        let target = self.local_movement(state, now) * speed;
        self.motion.velocity = move_towards(self.motion.velocity, target, speed);
    }
}

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards<V: Towards>(current: V, target: V, max_delta: f32) -> V {
    V::towards(current, target, max_delta)
}

pub trait Towards: Copy {
    fn towards(current: Self, target: Self, max_delta: f32) -> Self;
}

impl Towards for f32 {
    fn towards(current: f32, target: f32, max_delta: f32) -> f32 {
        if (target - current).abs() <= max_delta {
            target
        } else {
            current + (target - current).signum() * max_delta
        }
    }
}

impl Towards for Vec3 {
    fn towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
        let delta = target - current;
        let distance = delta.length();
        if distance <= max_delta || distance == 0.0 {
            target
        } else {
            current + delta / distance * max_delta
        }
    }
}

// ---------------------------------------------------------------------------
// State callbacks
// ---------------------------------------------------------------------------

type Ctx<G> = Character<G>;
type StateTick = Tick<CharacterState>;

fn idle_enter<G: LocomotionSurface>(c: &mut Ctx<G>, _: &mut StateTick) {
    c.surface.enable_slope_limit();
    c.surface.enable_ground_clamp();
    c.motion.dash_launched_jump = false;
    c.motion.air_actions_used = 0;
}

fn idle_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.input.dash_pressed {
        t.go(Dash);
    } else if c.input.jump_pressed {
        t.go(Jump);
    } else if !c.maintaining_ground() {
        t.go(Fall);
    } else if c.input.has_move() {
        t.go(Walk);
    } else {
        let friction = c.config.idle_friction * t.dt();
        c.motion.velocity = move_towards(c.motion.velocity, Vec3::ZERO, friction);
    }
}

fn walk_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.input.dash_pressed {
        t.go(Dash);
    } else if c.input.jump_pressed {
        t.go(Jump);
    } else if !c.maintaining_ground() {
        t.go(Fall);
    } else if !c.input.has_move() {
        t.go(Idle);
    } else {
        c.accelerate_toward(t.state(), t.now(), c.config.run_speed);
    }
}

fn jump_enter<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    c.release_ground();
    if c.is_dashing(t.now()) || c.input.dash_pressed {
        c.motion.dash_launched_jump = true;
    }
    c.launch();
}

/// Shared by Jump and AirJump.
fn jump_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.try_air_action(t) || c.jump_ended(t) {
        return;
    }
    c.apply_gravity(t.state(), t.now(), t.dt());
}

fn air_jump_enter<G: LocomotionSurface>(c: &mut Ctx<G>, _: &mut StateTick) {
    c.release_ground();
    c.launch();
    c.motion.air_actions_used += 1;
}

fn fall_enter<G: LocomotionSurface>(c: &mut Ctx<G>, _: &mut StateTick) {
    c.release_ground();
}

fn fall_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.try_air_action(t) {
        return;
    }
    if c.acquiring_ground() {
        c.zero_vertical();
        t.go(Idle);
        return;
    }
    c.apply_gravity(t.state(), t.now(), t.dt());
}

fn dash_enter<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    c.motion.dash_start_time = Some(t.now());
    // Jump pressed on the dash's first tick re-targets immediately.
    if c.input.jump_pressed {
        t.go(Jump);
    }
}

fn dash_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.input.jump_pressed {
        t.go(Jump);
    } else if !c.maintaining_ground() {
        t.go(Fall);
    } else if !c.is_dashing(t.now()) {
        t.go(Idle);
    } else {
        c.accelerate_toward(t.state(), t.now(), c.config.dash_speed);
    }
}

fn air_dash_enter<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    c.motion.dash_start_time = Some(t.now());
    c.zero_vertical();
    c.motion.air_actions_used += 1;
}

fn air_dash_update<G: LocomotionSurface>(c: &mut Ctx<G>, t: &mut StateTick) {
    if c.try_air_action(t) {
        return;
    }
    if !c.is_dashing(t.now()) {
        t.go(if c.maintaining_ground() { Idle } else { Fall });
        return;
    }
    c.accelerate_toward(t.state(), t.now(), c.config.dash_speed);
}

// ---------------------------------------------------------------------------
// Global hooks
// ---------------------------------------------------------------------------

/// Early hook: turn `facing` from look input (3D) or move input (planar).
fn update_facing<G: LocomotionSurface>(c: &mut Ctx<G>, _: &StateTick) {
    if !c.config.side_scrolling {
        let yaw = -c.input.look_delta.x * c.config.look_sensitivity;
        if yaw != 0.0 {
            let turn = Quat::from_axis_angle(c.surface.up(), yaw.to_radians());
            c.motion.facing = (turn * c.motion.facing).normalize_or(c.motion.facing);
        }
    } else if c.input.has_move() {
        let axes = c.input.move_axes;
        if !c.config.lock_depth_axis {
            c.motion.facing = axes.normalize();
        } else if axes.x != 0.0 {
            c.motion.facing = Vec3::X * axes.x.signum();
        }
    }
}

/// Late hook: integrate position, apply the axis lock, orient the mesh.
fn integrate_motion<G: LocomotionSurface>(c: &mut Ctx<G>, t: &StateTick) {
    c.transform.position += c.motion.velocity * t.dt();
    if c.config.lock_depth_axis {
        c.transform.position.z = c.spawn_position.z;
    }
    if let Some(rotation) = look_rotation(c.motion.facing, c.surface.up()) {
        c.transform.rotation = rotation;
    }
}

/// Rotation that points local `-Z` along `forward` with local `+Y` toward `up`.
/// `None` when the two are parallel.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let back = -forward.normalize_or_zero();
    let right = up.cross(back);
    if right.length_squared() < 1e-8 {
        return None;
    }
    let right = right.normalize();
    let up = back.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, back)))
}

fn dispatch_table<G: LocomotionSurface>() -> StateTable<CharacterState, Ctx<G>> {
    StateTable::new()
        .state(
            Idle,
            StateCallbacks::new()
                .on_enter(idle_enter::<G>)
                .on_update(idle_update::<G>),
        )
        .state(Walk, StateCallbacks::new().on_update(walk_update::<G>))
        .state(
            Jump,
            StateCallbacks::new()
                .on_enter(jump_enter::<G>)
                .on_update(jump_update::<G>),
        )
        .state(
            AirJump,
            StateCallbacks::new()
                .on_enter(air_jump_enter::<G>)
                .on_update(jump_update::<G>),
        )
        .state(
            Fall,
            StateCallbacks::new()
                .on_enter(fall_enter::<G>)
                .on_update(fall_update::<G>),
        )
        .state(
            Dash,
            StateCallbacks::new()
                .on_enter(dash_enter::<G>)
                .on_update(dash_update::<G>),
        )
        .state(
            AirDash,
            StateCallbacks::new()
                .on_enter(air_dash_enter::<G>)
                .on_update(air_dash_update::<G>),
        )
        .early(update_facing::<G>)
        .late(integrate_motion::<G>)
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// One simulated character: its dispatch engine plus the context it drives.
pub struct LocomotionMachine<G> {
    fsm: CharacterFsm<Character<G>>,
    character: Character<G>,
}

impl<G: LocomotionSurface> LocomotionMachine<G> {
    /// Validate `config` and spawn in Idle. Facing starts along the spawn
    /// rotation's forward (`-Z`), or its right (`+X`) when side-scrolling.
    pub fn new(
        config: LocomotionConfig,
        surface: G,
        spawn: LocalTransform,
    ) -> Result<Self, Error> {
        Self::starting_in(Idle, config, surface, spawn)
    }

    fn starting_in(
        initial: CharacterState,
        config: LocomotionConfig,
        surface: G,
        spawn: LocalTransform,
    ) -> Result<Self, Error> {
        config.validate()?;
        let local_facing = if config.side_scrolling { Vec3::X } else { Vec3::NEG_Z };
        let facing = (spawn.rotation * local_facing).normalize_or(local_facing);
        let fsm = CharacterFsm::<Character<G>>::new(initial, dispatch_table::<G>())?;
        Ok(Self {
            fsm,
            character: Character {
                motion: MotionState::new(facing),
                transform: spawn,
                surface,
                input: InputSnapshot::neutral(),
                config,
                spawn_position: spawn.position,
            },
        })
    }

    /// Run one tick with `input`, using the surface's delta time.
    pub fn tick(&mut self, input: InputSnapshot) {
        self.character.input = input;
        let dt = self.character.surface.delta_time();
        self.fsm.tick(&mut self.character, dt);
    }

    pub fn state(&self) -> CharacterState {
        self.fsm.state()
    }

    pub fn previous_state(&self) -> CharacterState {
        self.fsm.previous()
    }

    pub fn motion(&self) -> &MotionState {
        &self.character.motion
    }

    pub fn transform(&self) -> &LocalTransform {
        &self.character.transform
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.character.config
    }

    pub fn surface(&self) -> &G {
        &self.character.surface
    }

    pub fn surface_mut(&mut self) -> &mut G {
        &mut self.character.surface
    }

    /// Simulation time the next tick will see as `now`.
    pub fn clock(&self) -> f32 {
        self.fsm.clock()
    }

    /// Point gravity along `-new_up` and carry facing along with the rotation.
    pub fn rotate_gravity(&mut self, new_up: Vec3) {
        let from = self.character.surface.up();
        let to = new_up.normalize_or(from);
        self.character.surface.set_up(to);

        let motion = &mut self.character.motion;
        let turned = Quat::from_rotation_arc(from, to) * motion.facing;
        motion.facing = turned.normalize_or(motion.facing);
    }
}

impl LocomotionMachine<FlatGround> {
    /// Host step against flat ground: clamp dt, collide, then tick.
    pub fn step(&mut self, raw_dt: f32, input: InputSnapshot) {
        let character = &mut self.character;
        character.surface.begin_tick(raw_dt);
        character.surface.resolve(&mut character.transform.position);
        self.tick(input);
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Advance every scripted character in `world` by one step of `dt` seconds.
pub fn locomotion_system(world: &mut World, dt: f32) {
    for (entity, (machine, script, trace)) in world.query_mut::<(
        &mut LocomotionMachine<FlatGround>,
        &mut InputScript,
        &mut MotionTrace,
    )>() {
        let input = script.next_snapshot();
        let before = machine.state();
        machine.step(dt, input);

        if machine.state() != before {
            trace.transitions += 1;
        }
        trace.peak_height = trace.peak_height.max(machine.transform().position.y);

        log::trace!(
            "[locomotion] {:?} {:?} pos={:?} vel={:?}",
            entity,
            machine.state(),
            machine.transform().position,
            machine.motion().velocity
        );
    }
}
