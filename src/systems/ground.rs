use glam::Vec3;

/// Movement-primitive collaborator consumed by the locomotion core.
///
/// The core never collides anything itself: it asks for ground contact at two
/// sensitivities, toggles clamping/slope behaviour on state entry, and trusts
/// the surface for `up` and the tick's elapsed time.
pub trait LocomotionSurface {
    /// Unit up direction.
    fn up(&self) -> Vec3;
    /// Point gravity along `-up` from now on. `up` is unit length.
    fn set_up(&mut self, up: Vec3);
    /// Authoritative duration of the current tick, in seconds.
    fn delta_time(&self) -> f32;
    fn enable_ground_clamp(&mut self);
    fn disable_ground_clamp(&mut self);
    fn enable_slope_limit(&mut self);
    fn disable_slope_limit(&mut self);
    /// `strict = true` asks "still on the ground we had"; `false` asks "just landed".
    fn is_grounded(&self, strict: bool, tolerance: f32) -> bool;
}

const DEFAULT_MAX_DELTA: f32 = 0.1;
const DEFAULT_CLAMP_DISTANCE: f32 = 0.5;

/// Ground plane perpendicular to `up`, optionally bounded to a square platform.
///
/// `height` is measured along `up`, so rotating gravity tilts the plane with it.
/// Call [`begin_tick`](Self::begin_tick) and [`resolve`](Self::resolve) once
/// per tick before the locomotion machine runs, in that order.
#[derive(Debug, Clone)]
pub struct FlatGround {
    pub height: f32,
    up: Vec3,
    /// Half-width of the platform around the origin, measured in the plane.
    /// `None` = infinite.
    pub half_extent: Option<f32>,
    /// Max height above the plane that ground clamping snaps down from.
    pub clamp_distance: f32,
    /// Upper bound applied to incoming delta times (stall protection).
    pub max_delta: f32,
    delta_time: f32,
    clamping: bool,
    slope_limit: bool,
    /// Position seen by the last `resolve`.
    foot: Vec3,
}

impl FlatGround {
    /// Infinite plane at `height`.
    pub fn new(height: f32) -> Self {
        Self {
            height,
            up: Vec3::Y,
            half_extent: None,
            clamp_distance: DEFAULT_CLAMP_DISTANCE,
            max_delta: DEFAULT_MAX_DELTA,
            delta_time: 0.0,
            clamping: true,
            slope_limit: true,
            foot: Vec3::Y * height,
        }
    }

    /// Square platform of half-width `half_extent` centred on the origin.
    pub fn platform(height: f32, half_extent: f32) -> Self {
        Self {
            half_extent: Some(half_extent),
            ..Self::new(height)
        }
    }

    /// Store this tick's delta time. Non-finite or negative values become 0.
    pub fn begin_tick(&mut self, raw_dt: f32) {
        self.delta_time = if raw_dt.is_finite() {
            raw_dt.clamp(0.0, self.max_delta)
        } else {
            0.0
        };
    }

    /// Collide `position` against the plane and remember it for ground queries.
    pub fn resolve(&mut self, position: &mut Vec3) {
        if self.supports(*position) {
            let above = self.height_above(*position);
            if above < 0.0 || (self.clamping && above <= self.clamp_distance) {
                *position -= self.up * above;
            }
        }
        self.foot = *position;
    }

    pub fn supports(&self, position: Vec3) -> bool {
        match self.half_extent {
            Some(half) => {
                let planar = position - self.up * position.dot(self.up);
                planar.abs().max_element() <= half
            }
            None => true,
        }
    }

    /// Signed distance from the plane along `up`.
    pub fn height_above(&self, position: Vec3) -> f32 {
        position.dot(self.up) - self.height
    }

    pub fn clamping(&self) -> bool {
        self.clamping
    }

    pub fn slope_limited(&self) -> bool {
        self.slope_limit
    }
}

impl LocomotionSurface for FlatGround {
    fn up(&self) -> Vec3 {
        self.up
    }

    fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    fn delta_time(&self) -> f32 {
        self.delta_time
    }

    fn enable_ground_clamp(&mut self) {
        self.clamping = true;
    }

    fn disable_ground_clamp(&mut self) {
        self.clamping = false;
    }

    fn enable_slope_limit(&mut self) {
        self.slope_limit = true;
    }

    fn disable_slope_limit(&mut self) {
        self.slope_limit = false;
    }

    // A flat plane has no slopes, so strict and loose contact only differ by tolerance.
    fn is_grounded(&self, _strict: bool, tolerance: f32) -> bool {
        self.supports(self.foot) && self.height_above(self.foot) <= tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_lifts_positions_out_of_the_plane() {
        let mut ground = FlatGround::new(1.0);
        let mut p = Vec3::new(0.0, 0.2, 0.0);
        ground.resolve(&mut p);
        assert_eq!(p.y, 1.0);
        assert!(ground.is_grounded(false, 0.01));
    }

    #[test]
    fn clamping_snaps_down_only_while_enabled() {
        let mut ground = FlatGround::new(0.0);
        let mut p = Vec3::new(0.0, 0.3, 0.0);
        ground.resolve(&mut p);
        assert_eq!(p.y, 0.0);

        ground.disable_ground_clamp();
        let mut p = Vec3::new(0.0, 0.3, 0.0);
        ground.resolve(&mut p);
        assert_eq!(p.y, 0.3);
        assert!(ground.is_grounded(true, 0.5));
        assert!(!ground.is_grounded(false, 0.01));
    }

    #[test]
    fn platform_edges_stop_support() {
        let mut ground = FlatGround::platform(0.0, 2.0);
        let mut p = Vec3::new(3.0, -1.0, 0.0);
        ground.resolve(&mut p);
        assert_eq!(p.y, -1.0);
        assert!(!ground.is_grounded(true, 0.5));
    }

    #[test]
    fn tilted_plane_follows_up() {
        let mut ground = FlatGround::platform(0.0, 10.0);
        ground.set_up(Vec3::Z);
        let mut p = Vec3::new(1.0, 5.0, -0.3);
        ground.resolve(&mut p);
        assert_eq!(p, Vec3::new(1.0, 5.0, 0.0));
        assert!(ground.is_grounded(false, 0.01));

        // Y now lies in the plane, so 5.0 is past a half-width of 4.
        ground.half_extent = Some(4.0);
        let mut p = Vec3::new(0.0, 5.0, -0.3);
        ground.resolve(&mut p);
        assert_eq!(p.z, -0.3);
        assert!(!ground.is_grounded(true, 0.5));
    }

    #[test]
    fn delta_time_is_clamped() {
        let mut ground = FlatGround::new(0.0);
        ground.begin_tick(5.0);
        assert_eq!(ground.delta_time(), DEFAULT_MAX_DELTA);
        ground.begin_tick(-1.0);
        assert_eq!(ground.delta_time(), 0.0);
        ground.begin_tick(f32::NAN);
        assert_eq!(ground.delta_time(), 0.0);
    }
}
