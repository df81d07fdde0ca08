//! Frame assembly: window → cull → back-to-front sort → shaded quads.
use glam::{IVec2, Vec2, vec2};

use crate::{
    config::{ColorMode, Config, PipelineFlags, ShadingConfig},
    engine::{
        cull::is_tile_visible,
        projection::{horizon_offset, place, project},
        types::{DrawCandidate, Projected, Screen, Viewer},
    },
    renderer::{Surface, SurfaceExt},
    world::{Camera, HeightCache, Rgb, TileColors, shade_color},
};

/// Corner offsets in paint order: NW, NE, SE, SW.
const CORNERS: [IVec2; 4] = [IVec2::ZERO, IVec2::X, IVec2::ONE, IVec2::Y];

/// A tile whose four corners all projected in front of the camera.
#[derive(Clone, Copy, Debug)]
pub struct TileQuad {
    pub cell: IVec2,
    /// NW, NE, SE, SW.
    pub corners: [Projected; 4],
    pub heights: [i32; 4],
}

impl TileQuad {
    pub fn mean_height(&self) -> f32 {
        self.heights.iter().sum::<i32>() as f32 * 0.25
    }

    /// Half the difference between the heights of the two corners nearest
    /// the eye and the two farthest. Positive = the tile falls away from the
    /// viewer.
    pub fn slope(&self) -> f32 {
        let mut order = [0usize, 1, 2, 3];
        order.sort_unstable_by(|&a, &b| self.corners[a].depth.total_cmp(&self.corners[b].depth));
        let near = self.heights[order[0]] + self.heights[order[1]];
        let far = self.heights[order[2]] + self.heights[order[3]];
        (near - far) as f32 * 0.5
    }

    fn point(&self, i: usize) -> Vec2 {
        self.corners[i].screen
    }
}

/// Fill `out` with the camera-centred window of tiles, culled (when enabled)
/// and sorted farthest-first. Returns the window size before culling.
pub fn collect_candidates(
    cfg: &Config,
    cam: &Camera,
    view: &Viewer,
    screen: &Screen,
    heights: &mut HeightCache,
    out: &mut Vec<DrawCandidate>,
) -> usize {
    out.clear();
    let r = cfg.window_radius();
    let base = cam.pos.floor().as_ivec2();
    let fwd = cam.forward();
    let cull = cfg.flags.contains(PipelineFlags::CULLING);

    for dy in -r..=r {
        for dx in -r..=r {
            let cell = base + IVec2::new(dx, dy);
            if cull
                && !is_tile_visible(cam, view, screen, heights, cfg.projection.cull_margin, cell)
            {
                continue;
            }
            let depth = (cell.as_vec2() - cam.pos).dot(fwd);
            out.push(DrawCandidate { cell, depth });
        }
    }

    // painter's algorithm: farthest first, nearer tiles overwrite
    out.sort_unstable_by(|a, b| b.depth.total_cmp(&a.depth));
    let side = (2 * r + 1) as usize;
    side * side
}

/// Project the four corners of `cell`.
///
/// `None` when any corner is behind the camera, nearer than `min_depth`, or
/// when the quad's bounding box misses the padded viewport. Partial quads
/// are never produced.
pub fn build_quad(
    cfg: &Config,
    cam: &Camera,
    view: &Viewer,
    screen: &Screen,
    heights: &mut HeightCache,
    cell: IVec2,
) -> Option<TileQuad> {
    let mut hs = [0i32; 4];
    let mut corners = [Projected {
        screen: Vec2::ZERO,
        depth: 0.0,
    }; 4];

    for (i, off) in CORNERS.iter().enumerate() {
        let k = cell + *off;
        hs[i] = heights.height(k);
        let p = project(cam, view, screen, k.as_vec2().extend(hs[i] as f32))?;
        if p.depth < cfg.projection.min_depth {
            return None;
        }
        corners[i] = p;
    }

    let (lo, hi) = corners.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(lo, hi), c| (lo.min(c.screen), hi.max(c.screen)),
    );
    let pad = &cfg.projection.padding;
    let (w, h) = (screen.w as f32, screen.h as f32);
    if hi.x < -pad.left || lo.x > w + pad.right || hi.y < -pad.top || lo.y > h + pad.bottom {
        return None;
    }

    Some(TileQuad {
        cell,
        corners,
        heights: hs,
    })
}

/// Base color → (first face, second face) after slope shading.
pub fn face_colors(shading: &ShadingConfig, base: Rgb, slope: f32) -> (Rgb, Rgb) {
    let shade = (shading.base_shade - slope * shading.slope_gain).max(shading.min_shade);
    let first = shade_color(base, shade);
    (first, shade_color(first, shading.second_face_shade))
}

/// Paint `quad` as two triangles split along NW–SE.
pub fn draw_quad<S: Surface + ?Sized>(
    surface: &mut S,
    cfg: &Config,
    colors: &mut TileColors,
    quad: &TileQuad,
) {
    let base = match cfg.shading.mode {
        ColorMode::Hashed => colors.get_color(quad.cell.x, quad.cell.y),
        ColorMode::HeightBands => colors.band_color(quad.mean_height()),
    };
    let (first, second) = face_colors(&cfg.shading, base, quad.slope());
    let outline = cfg.flags.contains(PipelineFlags::OUTLINE);

    for (tri, col) in [([0, 1, 2], first), ([0, 2, 3], second)] {
        surface.polygon(&tri.map(|i| quad.point(i)));
        surface.fill(col);
        if outline {
            surface.stroke(cfg.shading.outline);
        }
    }
}

/// Clear to the ground color, then (optionally) paint a sky gradient above
/// the horizon line, following the roll.
pub fn draw_background<S: Surface + ?Sized>(
    surface: &mut S,
    cam: &Camera,
    view: &Viewer,
    screen: &Screen,
    shading: &ShadingConfig,
    sky: bool,
) {
    surface.clear(shading.ground);
    if !sky || shading.sky_bands == 0 {
        return;
    }
    let Some(horizon) = horizon_offset(cam, view) else {
        return;
    };

    // far enough that the bands cover the surface at any roll
    let reach = (screen.w + screen.h) as f32 * 2.0;
    let top = horizon - reach;
    let n = shading.sky_bands;
    for i in 0..n {
        let y0 = top + (horizon - top) * i as f32 / n as f32;
        let y1 = top + (horizon - top) * (i + 1) as f32 / n as f32;
        let t = if n > 1 {
            i as f32 / (n - 1) as f32
        } else {
            1.0
        };
        let band = [
            vec2(-reach, y0),
            vec2(reach, y0),
            vec2(reach, y1),
            vec2(-reach, y1),
        ]
        .map(|p| place(cam, screen, p));
        surface.polygon(&band);
        surface.fill(shading.sky_top.lerp(shading.sky_horizon, t));
    }
}

/// True when `list` is non-increasing in depth.
pub fn is_back_to_front(list: &[DrawCandidate]) -> bool {
    list.windows(2).all(|w| w[0].depth >= w[1].depth)
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::{DrawCmd, Recorder},
        world::HeightProfile,
    };

    const W: usize = 1280;
    const H: usize = 800;

    struct Rig {
        cfg: Config,
        cam: Camera,
        view: Viewer,
        screen: Screen,
        heights: HeightCache,
    }

    fn rig(cfg: Config) -> Rig {
        let mut cam = Camera::from_config(&cfg.camera, true);
        cam.refresh_trig_cache(W, H, cfg.projection.tile_size);
        Rig {
            view: Viewer::from(&cfg.projection),
            screen: Screen::new(W, H, cfg.projection.horizon_anchor),
            heights: HeightCache::new(cfg.height_profile),
            cam,
            cfg,
        }
    }

    fn candidates(r: &mut Rig) -> (usize, Vec<DrawCandidate>) {
        let mut out = Vec::new();
        let n = collect_candidates(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, &mut out);
        (n, out)
    }

    #[test]
    fn candidates_are_sorted_far_to_near() {
        for yaw in [0.0, 45.0, 133.0, -90.0, 270.0] {
            let mut cfg = Config::default();
            cfg.camera.yaw_deg = yaw;
            cfg.camera.position = [17.3, -4.6];
            let mut r = rig(cfg);
            let (_, list) = candidates(&mut r);
            assert!(!list.is_empty());
            assert!(is_back_to_front(&list), "yaw {yaw}");
        }
    }

    #[test]
    fn window_without_culling_is_full_square() {
        let mut cfg = Config::default();
        cfg.flags.remove(PipelineFlags::CULLING);
        let mut r = rig(cfg);
        let (n, list) = candidates(&mut r);
        let side = (2 * r.cfg.window_radius() + 1) as usize;
        assert_eq!(n, side * side);
        assert_eq!(list.len(), n);
        assert!(is_back_to_front(&list));
    }

    #[test]
    fn culling_drops_tiles_behind() {
        let mut r = rig(Config::default());
        let (n, list) = candidates(&mut r);
        assert!(list.len() < n);
        let fwd = r.cam.forward();
        for c in &list {
            // nothing far behind the eye survives
            let rel = c.cell.as_vec2() - r.cam.pos;
            assert!(rel.dot(fwd) > -r.cam.focal() - 2.0, "{:?}", c);
        }
    }

    #[test]
    fn depth_is_dot_with_forward() {
        let mut r = rig(Config::default());
        let (_, list) = candidates(&mut r);
        let fwd = r.cam.forward();
        for c in list.iter().take(20) {
            let expected = (c.cell.as_vec2() - r.cam.pos).dot(fwd);
            assert!((c.depth - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn quad_needs_all_corners_in_front() {
        let mut r = rig(Config::default());
        // tile ahead of the camera projects fine
        let ahead = (r.cam.pos + r.cam.forward() * 8.0).floor().as_ivec2();
        let q = build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, ahead).unwrap();
        assert!(q.corners.iter().all(|c| c.depth >= r.cfg.projection.min_depth));

        // a tile far behind the eye does not
        let behind = (r.cam.pos - r.cam.forward() * 60.0).floor().as_ivec2();
        assert!(build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, behind).is_none());
    }

    #[test]
    fn min_depth_skips_whole_tile() {
        let mut cfg = Config::default();
        cfg.projection.min_depth = 1.0e4;
        let mut r = rig(cfg);
        let ahead = (r.cam.pos + r.cam.forward() * 8.0).floor().as_ivec2();
        assert!(build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, ahead).is_none());
    }

    #[test]
    fn padding_rejects_far_offscreen_boxes() {
        let mut cfg = Config::default();
        cfg.projection.padding = crate::config::Padding {
            left: 0.0,
            right: 0.0,
            top: 0.0,
            bottom: 0.0,
        };
        let mut r = rig(cfg);
        // beside and slightly ahead of the eye: projects far off the right edge
        let side = vec2(r.cam.forward().y, -r.cam.forward().x);
        let cell = (r.cam.pos + side * 40.0).floor().as_ivec2();
        assert!(build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, cell).is_none());
    }

    #[test]
    fn slope_sign_follows_near_far_heights() {
        let p = |depth| Projected {
            screen: Vec2::ZERO,
            depth,
        };
        let mut q = TileQuad {
            cell: IVec2::ZERO,
            corners: [p(10.0), p(10.0), p(20.0), p(20.0)],
            heights: [3, 3, 1, 1],
        };
        assert_eq!(q.slope(), 2.0);
        q.heights = [0, 1, 3, 2];
        assert_eq!(q.slope(), -2.0);
        assert_eq!(q.mean_height(), 1.5);
    }

    #[test]
    fn face_shading_is_clamped_and_second_face_darker() {
        let sh = ShadingConfig::default();
        let base = Rgb::new(100, 200, 50);
        let (flat_a, flat_b) = face_colors(&sh, base, 0.0);
        assert_eq!(flat_a, shade_color(base, 1.1));
        assert_eq!(flat_b, shade_color(flat_a, 0.9));
        assert!(flat_b.g <= flat_a.g);

        // steep fall-off bottoms out at min_shade
        let (steep, _) = face_colors(&sh, base, 50.0);
        assert_eq!(steep, shade_color(base, 0.7));
    }

    #[test]
    fn quad_is_drawn_as_two_triangles() {
        let mut cfg = Config::default();
        cfg.flags.insert(PipelineFlags::OUTLINE);
        let mut r = rig(cfg);
        let mut colors = TileColors::new(
            r.cfg.shading.palette.clone(),
            r.cfg.shading.bands.clone(),
            16,
        );
        let ahead = (r.cam.pos + r.cam.forward() * 8.0).floor().as_ivec2();
        let q = build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, ahead).unwrap();

        let mut rec = Recorder::new(W, H);
        draw_quad(&mut rec, &r.cfg, &mut colors, &q);

        let fills = rec.filled_paths();
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].0, vec![q.point(0), q.point(1), q.point(2)]);
        assert_eq!(fills[1].0, vec![q.point(0), q.point(2), q.point(3)]);
        assert_ne!(fills[0].1, fills[1].1);
        let strokes = rec
            .cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Stroke(_)))
            .count();
        assert_eq!(strokes, 2);
        assert_eq!(colors.cache().len(), 1);
    }

    #[test]
    fn height_bands_color_by_mean_height() {
        let mut cfg = Config::default();
        cfg.shading.mode = ColorMode::HeightBands;
        cfg.height_profile = HeightProfile::Flat;
        let mut r = rig(cfg);
        let mut colors = TileColors::new(
            r.cfg.shading.palette.clone(),
            r.cfg.shading.bands.clone(),
            16,
        );
        let ahead = (r.cam.pos + r.cam.forward() * 8.0).floor().as_ivec2();
        let q = build_quad(&r.cfg, &r.cam, &r.view, &r.screen, &mut r.heights, ahead).unwrap();
        let mut rec = Recorder::new(W, H);
        draw_quad(&mut rec, &r.cfg, &mut colors, &q);

        let (first, _) = face_colors(&r.cfg.shading, r.cfg.shading.bands[0], 0.0);
        assert_eq!(rec.filled_paths()[0].1, first);
        assert!(colors.cache().is_empty());
    }

    #[test]
    fn sky_is_painted_after_clear() {
        let r = rig(Config::default());
        let mut rec = Recorder::new(W, H);
        draw_background(&mut rec, &r.cam, &r.view, &r.screen, &r.cfg.shading, true);
        assert_eq!(rec.cmds[0], DrawCmd::Clear(r.cfg.shading.ground));
        let fills = rec.filled_paths();
        assert_eq!(fills.len(), r.cfg.shading.sky_bands as usize);
        assert_eq!(fills[0].1, r.cfg.shading.sky_top);
        assert_eq!(fills.last().unwrap().1, r.cfg.shading.sky_horizon);

        let mut plain = Recorder::new(W, H);
        draw_background(&mut plain, &r.cam, &r.view, &r.screen, &r.cfg.shading, false);
        assert_eq!(plain.cmds, vec![DrawCmd::Clear(r.cfg.shading.ground)]);
    }
}
