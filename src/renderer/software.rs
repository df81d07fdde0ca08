//! ---------------------------------------------------------------------------
//! Software (CPU) path rasteriser
//!
//! * Fills a `Vec<u32>` frame-buffer in **0xAARRGGBB** format.
//! * Relies on the frame pipeline to issue paths *back-to-front*, so later
//!   fills simply overwrite earlier ones and no Z-buffer is needed.
//! * Fill rule is even-odd, sampled at pixel centres.
//! ---------------------------------------------------------------------------

use glam::{Vec2, vec2};
use smallvec::SmallVec;

use crate::{
    renderer::{Argb, Surface},
    world::Rgb,
};

/// One `move_to`-started run of vertices.
#[derive(Clone, Debug, Default)]
struct SubPath {
    pts: SmallVec<[Vec2; 4]>,
    closed: bool,
}

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

/// Frame-buffer surface.
#[derive(Default)]
pub struct Software {
    scratch: Vec<Argb>,
    path: Vec<SubPath>,
    /* crossing list reused across scan-lines */
    xs: Vec<f32>,
    width: usize,
    height: usize,
}

impl Software {
    pub fn new(w: usize, h: usize) -> Self {
        let mut sw = Self::default();
        sw.begin_frame(w, h);
        sw
    }

    /// (Re)allocate for the requested resolution and drop any path.
    pub fn begin_frame(&mut self, w: usize, h: usize) {
        if w != self.width || h != self.height {
            self.width = w;
            self.height = h;
            self.scratch.resize(w * h, 0);
        }
        self.path.clear();
    }

    /// Hand the finished frame to `submit(&[Argb], w, h)`, exactly once.
    pub fn end_frame<F, T>(&mut self, submit: F) -> T
    where
        F: FnOnce(&[Argb], usize, usize) -> T,
    {
        submit(&self.scratch, self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[Argb] {
        &self.scratch
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Argb> {
        (x < self.width && y < self.height).then(|| self.scratch[y * self.width + x])
    }

    /// Every edge of the current path; unclosed sub-paths are closed for
    /// filling.
    fn fill_edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.path.iter().flat_map(|sp| {
            let n = sp.pts.len();
            (0..n).map(move |i| (sp.pts[i], sp.pts[(i + 1) % n]))
        })
    }

    /// Edges to stroke: closing edge only when `close_path` was called.
    fn stroke_edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        self.path.iter().flat_map(|sp| {
            let n = sp.pts.len();
            let count = if sp.closed { n } else { n.saturating_sub(1) };
            (0..count).map(move |i| (sp.pts[i], sp.pts[(i + 1) % n]))
        })
    }

    /// Even-odd scan-line fill of the current path.
    fn fill_path(&mut self, col: Argb) {
        let (mut y_min, mut y_max) = (f32::INFINITY, f32::NEG_INFINITY);
        for sp in &self.path {
            for p in &sp.pts {
                if !p.is_finite() {
                    return;
                }
                y_min = y_min.min(p.y);
                y_max = y_max.max(p.y);
            }
        }
        if y_min > y_max {
            return;
        }

        // pixel rows whose centre lies inside [y_min, y_max)
        let row0 = ((y_min - 0.5).ceil().max(0.0)) as usize;
        let row1 = ((y_max - 0.5).ceil().min(self.height as f32)).max(0.0) as usize;

        let mut xs = std::mem::take(&mut self.xs);
        for row in row0..row1 {
            let yc = row as f32 + 0.5;
            xs.clear();
            for (a, b) in self.fill_edges() {
                // half-open rule so shared vertices count once
                if (a.y <= yc) != (b.y <= yc) {
                    let t = (yc - a.y) / (b.y - a.y);
                    xs.push(a.x + (b.x - a.x) * t);
                }
            }
            xs.sort_unstable_by(f32::total_cmp);

            let line = &mut self.scratch[row * self.width..(row + 1) * self.width];
            for pair in xs.chunks_exact(2) {
                let x0 = (pair[0] - 0.5).ceil().max(0.0) as usize;
                let x1 = ((pair[1] - 0.5).ceil().min(self.width as f32)).max(0.0) as usize;
                if x0 < x1 {
                    line[x0..x1].fill(col);
                }
            }
        }
        self.xs = xs;
    }

    /// Integer Bresenham line, clipped to the frame first.
    fn draw_line(&mut self, a: Vec2, b: Vec2, col: Argb) {
        let Some((a, b)) = clip_line(a, b, self.width as f32, self.height as f32) else {
            return;
        };
        let (mut x0, mut y0) = (a.x as i32, a.y as i32);
        let (x1, y1) = (b.x as i32, b.y as i32);

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            if (0..self.width as i32).contains(&x0) && (0..self.height as i32).contains(&y0) {
                self.scratch[y0 as usize * self.width + x0 as usize] = col;
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

/// Liang–Barsky clip of segment `a`→`b` to `[0, w) × [0, h)`.
/// Returns `None` when nothing is left.
fn clip_line(a: Vec2, b: Vec2, w: f32, h: f32) -> Option<(Vec2, Vec2)> {
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);
    let max_x = w - 1.0;
    let max_y = h - 1.0;
    for (p, q) in [
        (-d.x, a.x),
        (d.x, max_x - a.x),
        (-d.y, a.y),
        (d.y, max_y - a.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((a + d * t0, a + d * t1))
}

/*──────────────────────── Surface trait impl ─────────────────────────*/
impl Surface for Software {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn clear(&mut self, color: Rgb) {
        self.scratch.fill(color.to_argb());
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Vec2) {
        let mut sp = SubPath::default();
        sp.pts.push(p);
        self.path.push(sp);
    }

    fn line_to(&mut self, p: Vec2) {
        match self.path.last_mut() {
            Some(sp) if !sp.closed => sp.pts.push(p),
            // canvas semantics: line_to without a current point acts as move_to
            _ => self.move_to(p),
        }
    }

    fn close_path(&mut self) {
        if let Some(sp) = self.path.last_mut() {
            sp.closed = true;
            // later line_to calls continue from the sub-path's first point
            let start = sp.pts[0];
            let mut next = SubPath::default();
            next.pts.push(start);
            self.path.push(next);
        }
    }

    fn fill(&mut self, color: Rgb) {
        self.fill_path(color.to_argb());
    }

    fn stroke(&mut self, color: Rgb) {
        let col = color.to_argb();
        let edges: SmallVec<[(Vec2, Vec2); 8]> = self.stroke_edges().collect();
        for (a, b) in edges {
            self.draw_line(a, b, col);
        }
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
