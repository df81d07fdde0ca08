use std::fmt;

use glam::{Vec2, vec2};

use crate::config::CameraConfig;

/// Sine/cosine pair of one angle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinCos {
    pub sin: f32,
    pub cos: f32,
}

impl SinCos {
    #[inline]
    fn of(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { sin, cos }
    }
}

/// Flying view-point above the heightfield.
///
/// * `yaw` is where the camera looks, `fly_yaw` where it travels; both are
///   radians, 0 = +X, counter-clockwise positive, never wrapped.
/// * `pitch` > 0 looks down and always stays in `[min_pitch, max_pitch]`.
/// * `roll` rotates the image in the screen plane.
///
/// Turning can be eased: input moves a target, and [`Camera::ease`] covers a
/// fixed fraction of the remaining distance every frame. An easing factor of
/// 1 turns immediately.
///
/// The trig terms, horizontal FoV and focal length are a cache: call
/// [`Camera::refresh_trig_cache`] after any orientation or FoV change and
/// before projecting anything, otherwise projections use the old pose.
#[derive(Clone, Debug)]
pub struct Camera {
    pub pos: Vec2,
    pub altitude: f32,
    pub yaw: f32,
    pub fly_yaw: f32,
    pub roll: f32,
    /// World units per frame along `fly_yaw`.
    pub speed: f32,
    pitch: f32,
    fov: f32, // vertical, radians

    min_pitch: f32,
    max_pitch: f32,
    min_fov: f32,
    max_fov: f32,
    motion: bool,

    /* easing: fraction of the remaining turn covered per frame, in (0, 1] */
    yaw_easing: f32,
    pitch_easing: f32,
    pending_yaw: f32,
    pending_fly_yaw: f32,
    target_pitch: f32,

    /* derived, see refresh_trig_cache */
    yaw_sc: SinCos,
    fly_sc: SinCos,
    pitch_sc: SinCos,
    roll_sc: SinCos,
    hfov: f32,
    focal: f32,
}

impl Camera {
    /// Camera at `pos` with default limits and motion enabled.
    pub fn new(pos: Vec2, altitude: f32, yaw: f32, pitch: f32, fov: f32) -> Self {
        let mut cam = Self {
            pos,
            altitude,
            yaw,
            fly_yaw: yaw,
            roll: 0.0,
            speed: 0.0,
            pitch,
            fov,
            min_pitch: -std::f32::consts::FRAC_PI_2,
            max_pitch: std::f32::consts::FRAC_PI_2,
            min_fov: 1f32.to_radians(),
            max_fov: 179f32.to_radians(),
            motion: true,
            yaw_easing: 1.0,
            pitch_easing: 1.0,
            pending_yaw: 0.0,
            pending_fly_yaw: 0.0,
            target_pitch: pitch,
            yaw_sc: SinCos::of(0.0),
            fly_sc: SinCos::of(0.0),
            pitch_sc: SinCos::of(0.0),
            roll_sc: SinCos::of(0.0),
            hfov: fov,
            focal: 1.0,
        };
        cam.pitch = clamp_to(cam.pitch, cam.min_pitch, cam.max_pitch);
        cam.target_pitch = cam.pitch;
        cam
    }

    pub fn from_config(cfg: &CameraConfig, motion: bool) -> Self {
        let mut cam = Self::new(
            Vec2::from(cfg.position),
            cfg.altitude,
            cfg.yaw_deg.to_radians(),
            cfg.pitch_deg.to_radians(),
            cfg.fov_deg.to_radians(),
        )
        .with_pitch_limits(cfg.min_pitch_deg.to_radians(), cfg.max_pitch_deg.to_radians())
        .with_fov_limits(cfg.min_fov_deg.to_radians(), cfg.max_fov_deg.to_radians())
        .with_easing(cfg.yaw_easing, cfg.pitch_easing);
        cam.roll = cfg.roll_deg.to_radians();
        cam.speed = cfg.speed;
        cam.motion = motion;
        cam
    }

    /// Replace the pitch interval; the current pitch is clamped into it.
    #[must_use]
    pub fn with_pitch_limits(mut self, min: f32, max: f32) -> Self {
        self.min_pitch = min;
        self.max_pitch = max;
        self.pitch = clamp_to(self.pitch, min, max);
        self.target_pitch = self.pitch;
        self
    }

    #[must_use]
    pub fn with_fov_limits(mut self, min: f32, max: f32) -> Self {
        self.min_fov = min;
        self.max_fov = max;
        self.fov = clamp_to(self.fov, min, max);
        self
    }

    /// Per-frame easing factors for yaw (view and travel) and pitch.
    /// Values outside `(0, 1]` fall back to 1.
    #[must_use]
    pub fn with_easing(mut self, yaw: f32, pitch: f32) -> Self {
        let sane = |k: f32| if k > 0.0 && k <= 1.0 { k } else { 1.0 };
        self.yaw_easing = sane(yaw);
        self.pitch_easing = sane(pitch);
        self
    }

    /*──────────────────────── accessors ─────────────────────────────*/

    #[inline]
    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Pitch the camera is easing towards.
    #[inline]
    pub fn target_pitch(&self) -> f32 {
        self.target_pitch
    }

    #[inline]
    pub fn pitch_limits(&self) -> (f32, f32) {
        (self.min_pitch, self.max_pitch)
    }

    /// Vertical field of view in radians.
    #[inline]
    pub fn fov(&self) -> f32 {
        self.fov
    }

    /// Horizontal field of view as of the last trig refresh.
    #[inline]
    pub fn hfov(&self) -> f32 {
        self.hfov
    }

    /// Focal length in tile units as of the last trig refresh.
    #[inline]
    pub fn focal(&self) -> f32 {
        self.focal
    }

    #[inline]
    pub fn yaw_sc(&self) -> SinCos {
        self.yaw_sc
    }

    #[inline]
    pub fn fly_sc(&self) -> SinCos {
        self.fly_sc
    }

    #[inline]
    pub fn pitch_sc(&self) -> SinCos {
        self.pitch_sc
    }

    #[inline]
    pub fn roll_sc(&self) -> SinCos {
        self.roll_sc
    }

    #[inline]
    pub fn motion_enabled(&self) -> bool {
        self.motion
    }

    pub fn set_motion(&mut self, on: bool) {
        self.motion = on;
    }

    /// Unit view direction on the ground plane (cached).
    #[inline(always)]
    pub fn forward(&self) -> Vec2 {
        vec2(self.yaw_sc.cos, self.yaw_sc.sin)
    }

    /// Unit travel direction on the ground plane (cached).
    #[inline(always)]
    pub fn fly_forward(&self) -> Vec2 {
        vec2(self.fly_sc.cos, self.fly_sc.sin)
    }

    /*──────────────────────── mutation ──────────────────────────────*/

    /// Rotation deltas from the input side, in radians.
    ///
    /// With motion enabled, yaw input also turns the travel direction so the
    /// camera flies where it looks; a look-around rig leaves `fly_yaw` alone.
    /// The pitch target is clamped here, so easing never leaves the limits.
    pub fn apply_rotation_input(&mut self, d_yaw: f32, d_pitch: f32, d_roll: f32) {
        self.pending_yaw += d_yaw;
        if self.motion {
            self.pending_fly_yaw += d_yaw;
        }
        self.target_pitch = clamp_to(self.target_pitch + d_pitch, self.min_pitch, self.max_pitch);
        self.roll += d_roll;
        self.settle_instant();
    }

    /// Turn only the travel direction.
    pub fn steer(&mut self, d_fly_yaw: f32) {
        self.pending_fly_yaw += d_fly_yaw;
        self.settle_instant();
    }

    /// One frame of easing towards the input targets.
    pub fn ease(&mut self) {
        self.ease_by(self.yaw_easing, self.pitch_easing);
    }

    /// Apply at once the channels whose easing factor is 1.
    fn settle_instant(&mut self) {
        let instant = |k: f32| if k >= 1.0 { 1.0 } else { 0.0 };
        self.ease_by(instant(self.yaw_easing), instant(self.pitch_easing));
    }

    fn ease_by(&mut self, k_yaw: f32, k_pitch: f32) {
        const SNAP: f32 = 1e-5;

        for (angle, pending) in [
            (&mut self.yaw, &mut self.pending_yaw),
            (&mut self.fly_yaw, &mut self.pending_fly_yaw),
        ] {
            let step = if k_yaw >= 1.0 || pending.abs() < SNAP {
                *pending
            } else {
                *pending * k_yaw
            };
            *angle += step;
            *pending -= step;
        }

        if k_pitch >= 1.0 || (self.target_pitch - self.pitch).abs() < SNAP {
            self.pitch = self.target_pitch;
        } else if k_pitch > 0.0 {
            let next = self.pitch + (self.target_pitch - self.pitch) * k_pitch;
            self.pitch = clamp_to(next, self.min_pitch, self.max_pitch);
        }
    }

    /// Widen (`d_fov > 0`) or narrow the vertical field of view.
    /// Returns `false` when the request was clamped.
    pub fn zoom(&mut self, d_fov: f32) -> bool {
        let wanted = self.fov + d_fov;
        self.fov = clamp_to(wanted, self.min_fov, self.max_fov);
        self.fov == wanted
    }

    /// One frame of forward motion along `fly_yaw`.
    pub fn advance(&mut self) {
        if !self.motion {
            return;
        }
        let (s, c) = self.fly_yaw.sin_cos();
        self.pos += vec2(c, s) * self.speed;
    }

    /// Recompute every derived term for a `width`×`height` surface on which
    /// one tile spans `tile_size` pixels at the focal plane.
    ///
    /// ```text
    /// hfov  = 2 · atan(tan(fov/2) · width/height)
    /// focal = (height/2) / tan(fov/2) / tile_size
    /// ```
    pub fn refresh_trig_cache(&mut self, width: usize, height: usize, tile_size: f32) {
        self.yaw_sc = SinCos::of(self.yaw);
        self.fly_sc = SinCos::of(self.fly_yaw);
        self.pitch_sc = SinCos::of(self.pitch);
        self.roll_sc = SinCos::of(self.roll);

        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let half_tan = (self.fov * 0.5).tan();
        self.hfov = 2.0 * (half_tan * aspect).atan();
        self.focal = height.max(1) as f32 * 0.5 / half_tan / tile_size;
    }

    /// Read-only snapshot for debug overlays and logs.
    pub fn telemetry(&self) -> Telemetry {
        Telemetry {
            x: self.pos.x,
            y: self.pos.y,
            altitude: self.altitude,
            yaw_deg: self.yaw.to_degrees(),
            pitch_deg: self.pitch.to_degrees(),
            roll_deg: self.roll.to_degrees(),
            fov_deg: self.fov.to_degrees(),
        }
    }
}

/// `v` limited to `[min, max]`. Unlike `f32::clamp` it never panics; with
/// inverted bounds `max` wins.
#[inline]
fn clamp_to(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

/// Camera state as shown to a human. Angles in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub x: f32,
    pub y: f32,
    pub altitude: f32,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
    pub fov_deg: f32,
}

impl fmt::Display for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x {:.2}  y {:.2}  alt {:.1}  yaw {:.1}°  pitch {:.1}°  roll {:.1}°  fov {:.1}°",
            self.x, self.y, self.altitude, self.yaw_deg, self.pitch_deg, self.roll_deg, self.fov_deg
        )
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn cam() -> Camera {
        let mut c = Camera::new(Vec2::ZERO, 6.5, 0.0, PI / 7.0, 75f32.to_radians())
            .with_pitch_limits(PI / 15.0, PI / 2.1);
        c.speed = 0.5;
        c
    }

    #[test]
    fn pitch_saturates_at_max() {
        let mut c = cam();
        for _ in 0..100 {
            c.apply_rotation_input(0.0, 0.3, 0.0);
        }
        assert_eq!(c.pitch(), PI / 2.1);

        c.apply_rotation_input(0.0, -10.0, 0.0);
        assert_eq!(c.pitch(), PI / 15.0);
    }

    #[test]
    fn roll_and_yaw_are_unbounded() {
        let mut c = cam();
        c.apply_rotation_input(10.0, 0.0, -20.0);
        assert_eq!(c.yaw, 10.0);
        assert_eq!(c.roll, -20.0);
    }

    #[test]
    fn yaw_drags_fly_yaw_only_when_moving() {
        let mut c = cam();
        c.apply_rotation_input(0.5, 0.0, 0.0);
        assert_eq!(c.fly_yaw, 0.5);

        c.set_motion(false);
        c.apply_rotation_input(0.5, 0.0, 0.0);
        assert_eq!(c.yaw, 1.0);
        assert_eq!(c.fly_yaw, 0.5);

        c.steer(-0.25);
        assert_eq!(c.fly_yaw, 0.25);
        assert_eq!(c.yaw, 1.0);
    }

    #[test]
    fn advance_follows_fly_yaw() {
        let mut c = cam();
        c.steer(FRAC_PI_2);
        c.advance();
        assert!((c.pos - vec2(0.0, 0.5)).length() < 1e-5);

        c.set_motion(false);
        c.advance();
        assert!((c.pos - vec2(0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn trig_cache_is_stale_until_refreshed() {
        let mut c = cam();
        c.refresh_trig_cache(800, 800, 32.0);
        assert!((c.forward() - vec2(1.0, 0.0)).length() < 1e-6);

        c.apply_rotation_input(FRAC_PI_2, 0.0, 0.0);
        assert!((c.forward() - vec2(1.0, 0.0)).length() < 1e-6);

        c.refresh_trig_cache(800, 800, 32.0);
        assert!((c.forward() - vec2(0.0, 1.0)).length() < 1e-6);
        assert!((c.fly_forward() - vec2(0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn hfov_and_focal_from_aspect() {
        let mut c = Camera::new(Vec2::ZERO, 0.0, 0.0, 0.0, FRAC_PI_2);
        c.refresh_trig_cache(800, 800, 1.0);
        assert!((c.hfov() - FRAC_PI_2).abs() < 1e-5);
        assert!((c.focal() - 400.0).abs() < 1e-2);

        c.refresh_trig_cache(1600, 800, 32.0);
        assert!((c.hfov() - 2.0 * 2f32.atan()).abs() < 1e-5);
        assert!((c.focal() - 12.5).abs() < 1e-3);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = cam().with_fov_limits(FRAC_PI_4, FRAC_PI_2);
        assert!(!c.zoom(10.0));
        assert_eq!(c.fov(), FRAC_PI_2);
        assert!(!c.zoom(-10.0));
        assert_eq!(c.fov(), FRAC_PI_4);
        assert!(c.zoom(0.1));
    }

    #[test]
    fn eased_pitch_converges_without_overshoot() {
        let mut c = cam().with_easing(0.07, 0.09);
        c.apply_rotation_input(0.0, 10.0, 0.0);
        assert_eq!(c.target_pitch(), PI / 2.1);
        // nothing moves until the frame step
        assert_eq!(c.pitch(), PI / 7.0);

        let mut last = c.pitch();
        for _ in 0..400 {
            c.ease();
            assert!(c.pitch() <= PI / 2.1);
            assert!(c.pitch() >= last);
            last = c.pitch();
        }
        assert_eq!(c.pitch(), PI / 2.1);
    }

    #[test]
    fn eased_yaw_covers_a_fraction_per_frame() {
        let mut c = cam().with_easing(0.07, 0.09);
        c.apply_rotation_input(1.0, 0.0, 0.0);
        c.steer(0.5);
        assert_eq!(c.yaw, 0.0);

        c.ease();
        assert!((c.yaw - 0.07).abs() < 1e-6);
        assert!((c.fly_yaw - 0.105).abs() < 1e-6);

        for _ in 0..400 {
            c.ease();
        }
        assert!((c.yaw - 1.0).abs() < 1e-4);
        assert!((c.fly_yaw - 1.5).abs() < 1e-4);
    }

    #[test]
    fn easing_out_of_range_turns_immediately() {
        let mut c = cam().with_easing(0.0, f32::NAN);
        c.apply_rotation_input(0.3, 0.1, 0.0);
        assert_eq!(c.yaw, 0.3);
        assert_eq!(c.pitch(), PI / 7.0 + 0.1);
    }

    #[test]
    fn inverted_limits_do_not_panic() {
        let mut c = cam()
            .with_pitch_limits(1.0, 0.5)
            .with_fov_limits(f32::NAN, 0.5);
        assert_eq!(c.pitch(), 0.5);
        assert_eq!(c.fov(), 0.5);
        c.apply_rotation_input(0.0, 1.0, 0.0);
        assert_eq!(c.pitch(), 0.5);
    }

    #[test]
    fn telemetry_reports_degrees() {
        let mut c = cam();
        c.yaw = PI;
        let t = c.telemetry();
        assert!((t.yaw_deg - 180.0).abs() < 1e-3);
        assert!((t.fov_deg - 75.0).abs() < 1e-3);
        assert!(t.to_string().contains("alt 6.5"));
    }
}
