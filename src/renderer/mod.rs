//! Rendering abstraction layer.
//!
//! *The frame pipeline never touches a pixel buffer directly.* It issues
//! canvas-style path commands to a type that implements [`Surface`]:
//!
//! * [`software::Software`] rasterises into a 0xAARRGGBB frame-buffer.
//! * [`Recorder`] just remembers the commands, which is how tests check the
//!   paint order.

use glam::Vec2;

use crate::world::Rgb;

/// Pixel format of the software frame-buffer (0xAARRGGBB).
pub type Argb = u32;

/// Immediate-mode 2-D drawing target.
///
/// Paths follow the usual canvas model: `begin_path` drops the current path,
/// `move_to` starts a sub-path, `close_path` joins its ends, and `fill` /
/// `stroke` paint the whole current path without consuming it.
pub trait Surface {
    /// (width, height) in pixels.
    fn size(&self) -> (usize, usize);

    /// Paint every pixel with `color`.
    fn clear(&mut self, color: Rgb);

    fn begin_path(&mut self);

    fn move_to(&mut self, p: Vec2);

    fn line_to(&mut self, p: Vec2);

    fn close_path(&mut self);

    fn fill(&mut self, color: Rgb);

    fn stroke(&mut self, color: Rgb);
}

/// Convenience blanket-impl for closed polygons.
pub trait SurfaceExt: Surface {
    /// Start a fresh path tracing `pts` and close it.
    fn polygon(&mut self, pts: &[Vec2]) {
        self.begin_path();
        if let Some((first, rest)) = pts.split_first() {
            self.move_to(*first);
            for p in rest {
                self.line_to(*p);
            }
            self.close_path();
        }
    }
}
impl<T: Surface + ?Sized> SurfaceExt for T {}

/// One recorded [`Surface`] call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCmd {
    Clear(Rgb),
    BeginPath,
    MoveTo(Vec2),
    LineTo(Vec2),
    ClosePath,
    Fill(Rgb),
    Stroke(Rgb),
}

/// Surface that records commands instead of drawing them.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub width: usize,
    pub height: usize,
    pub cmds: Vec<DrawCmd>,
}

impl Recorder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cmds: Vec::new(),
        }
    }

    /// Number of `fill` calls recorded.
    pub fn fills(&self) -> usize {
        self.cmds
            .iter()
            .filter(|c| matches!(c, DrawCmd::Fill(_)))
            .count()
    }

    /// Every filled path as (vertices, color), in paint order.
    pub fn filled_paths(&self) -> Vec<(Vec<Vec2>, Rgb)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        for cmd in &self.cmds {
            match *cmd {
                DrawCmd::BeginPath => path.clear(),
                DrawCmd::MoveTo(p) | DrawCmd::LineTo(p) => path.push(p),
                DrawCmd::Fill(c) => out.push((path.clone(), c)),
                DrawCmd::Clear(_) | DrawCmd::ClosePath | DrawCmd::Stroke(_) => {}
            }
        }
        out
    }
}

impl Surface for Recorder {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }
    fn clear(&mut self, color: Rgb) {
        self.cmds.push(DrawCmd::Clear(color));
    }
    fn begin_path(&mut self) {
        self.cmds.push(DrawCmd::BeginPath);
    }
    fn move_to(&mut self, p: Vec2) {
        self.cmds.push(DrawCmd::MoveTo(p));
    }
    fn line_to(&mut self, p: Vec2) {
        self.cmds.push(DrawCmd::LineTo(p));
    }
    fn close_path(&mut self) {
        self.cmds.push(DrawCmd::ClosePath);
    }
    fn fill(&mut self, color: Rgb) {
        self.cmds.push(DrawCmd::Fill(color));
    }
    fn stroke(&mut self, color: Rgb) {
        self.cmds.push(DrawCmd::Stroke(color));
    }
}

pub mod software;
