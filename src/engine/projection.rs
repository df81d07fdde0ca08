use glam::{Vec2, Vec3, vec2};

use crate::{
    engine::types::{Projected, Screen, Viewer},
    world::Camera,
};

/// World point `(x, y, height)` → surface pixel, or `None` when the point is
/// at or behind the camera.
///
/// ```text
/// d          = p − (cam.pos, altitude)
/// forward    = d.x·cos yaw + d.y·sin yaw
/// lateral    = d.x·sin yaw − d.y·cos yaw          (+ = screen right)
/// fwd'       = forward·cos pitch − d.z·sin pitch
/// up'        = forward·sin pitch + d.z·cos pitch
/// depth      = fwd'·perspective_scale + focal
/// screen     = (lateral, −up') · tile_size · focal / depth
/// ```
///
/// The result is then rolled about the view centre and moved to the anchor.
/// Relies on the camera's trig cache being fresh.
pub fn project(cam: &Camera, view: &Viewer, screen: &Screen, p: Vec3) -> Option<Projected> {
    let dx = p.x - cam.pos.x;
    let dy = p.y - cam.pos.y;
    let dz = p.z - cam.altitude;

    // Rotate by -yaw: camera forward becomes the first axis
    let yaw = cam.yaw_sc();
    let forward = dx * yaw.cos + dy * yaw.sin;
    let lateral = dx * yaw.sin - dy * yaw.cos;

    // Tilt by -pitch (pitch > 0 looks down)
    let pitch = cam.pitch_sc();
    let rot_forward = forward * pitch.cos - dz * pitch.sin;
    let rot_up = forward * pitch.sin + dz * pitch.cos;

    let depth = rot_forward * view.perspective_scale + cam.focal();
    if depth <= view.near_threshold {
        return None;
    }

    let scale = view.tile_size * cam.focal() / depth;
    // screen Y grows downward, world height upward
    let rel = vec2(lateral * scale, -rot_up * scale);

    Some(Projected {
        screen: place(cam, screen, rel),
        depth,
    })
}

/// View-centre-relative pixel offset → surface pixel, applying roll.
#[inline]
pub fn place(cam: &Camera, screen: &Screen, rel: Vec2) -> Vec2 {
    let roll = cam.roll_sc();
    let rolled = vec2(
        rel.x * roll.cos + rel.y * roll.sin,
        -rel.x * roll.sin + rel.y * roll.cos,
    );
    screen.anchor + rolled
}

/// Vertical offset of the horizon line from the view centre, before roll.
///
/// `None` when the camera looks straight down (or past it) and no horizon
/// exists on the image plane.
pub fn horizon_offset(cam: &Camera, view: &Viewer) -> Option<f32> {
    let pitch = cam.pitch_sc();
    if pitch.cos <= 1e-4 {
        return None;
    }
    Some(-pitch.sin / pitch.cos * view.tile_size * cam.focal() / view.perspective_scale)
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
