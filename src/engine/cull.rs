//! Cheap per-tile visibility test run before the four-corner projection.
//!
//! Two stages: a horizontal field-of-view cone around the view direction,
//! then a projection of the tile centre against the surface grown by a
//! margin. Both over-include a little (a tile whose centre is outside may
//! still have a corner inside) in exchange for rejecting most of the window
//! without touching its corners.

use glam::{IVec2, Vec2, vec2};

use crate::{
    engine::{
        projection::project,
        types::{Screen, Viewer},
    },
    world::{Camera, HeightCache},
};

/// Centre of projection: `focal / perspective_scale` tiles behind the camera
/// along the view direction.
#[inline]
pub fn eye(cam: &Camera, view: &Viewer) -> Vec2 {
    cam.pos - cam.forward() * (cam.focal() / view.perspective_scale)
}

/// Ground-plane centre of tile `cell`.
#[inline]
pub fn tile_center(cell: IVec2) -> Vec2 {
    cell.as_vec2() + vec2(0.5, 0.5)
}

/// Mean of the four corner heights of `cell`.
pub fn center_height(heights: &mut HeightCache, cell: IVec2) -> f32 {
    let sum: i32 = [IVec2::ZERO, IVec2::X, IVec2::ONE, IVec2::Y]
        .into_iter()
        .map(|o| heights.height(cell + o))
        .sum();
    sum as f32 * 0.25
}

/// Is `point` inside the horizontal view cone?
///
/// `dot(normalize(point − eye), forward) ≥ cos(hfov / 2)`.
///
/// The apex is the eye rather than the camera position, so the cone matches
/// the screen's horizontal extent. Points just beside the camera are kept even
/// though they fall outside a cone drawn from the camera itself.
pub fn in_view_cone(cam: &Camera, view: &Viewer, point: Vec2) -> bool {
    let dir = (point - eye(cam, view)).normalize_or_zero();
    dir.dot(cam.forward()) >= (cam.hfov() * 0.5).cos()
}

/// Field-of-view and projected-bounds test for tile `cell`.
pub fn is_tile_visible(
    cam: &Camera,
    view: &Viewer,
    screen: &Screen,
    heights: &mut HeightCache,
    margin: f32,
    cell: IVec2,
) -> bool {
    let center = tile_center(cell);
    if !in_view_cone(cam, view, center) {
        return false;
    }
    let h = center_height(heights, cell);
    match project(cam, view, screen, center.extend(h)) {
        Some(p) => screen.contains_with_margin(p.screen, margin),
        None => false,
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
