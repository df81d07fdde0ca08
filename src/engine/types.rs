use glam::{IVec2, Vec2, vec2};

use crate::config::ProjectionConfig;

/// Constants that depend on the *surface*, not on the camera.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    /// Pixel the view centre lands on.
    pub anchor: Vec2,
}

impl Screen {
    /// `anchor` is given as fractions of the surface size.
    pub fn new(w: usize, h: usize, anchor: [f32; 2]) -> Self {
        Self {
            w,
            h,
            anchor: vec2(w as f32 * anchor[0], h as f32 * anchor[1]),
        }
    }

    /// Is `p` inside the surface grown by `margin` pixels on every side?
    #[inline]
    pub fn contains_with_margin(&self, p: Vec2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.w as f32 + margin
            && p.y >= -margin
            && p.y <= self.h as f32 + margin
    }
}

/// Projection constants shared by every tile of a frame.
#[derive(Clone, Copy, Debug)]
pub struct Viewer {
    pub tile_size: f32,
    pub perspective_scale: f32,
    pub near_threshold: f32,
}

impl From<&ProjectionConfig> for Viewer {
    fn from(cfg: &ProjectionConfig) -> Self {
        Self {
            tile_size: cfg.tile_size,
            perspective_scale: cfg.perspective_scale,
            near_threshold: cfg.near_threshold,
        }
    }
}

/// A world point after projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    /// Surface pixel coordinates, anchor already applied.
    pub screen: Vec2,
    /// Perspective divisor; always above the near threshold.
    pub depth: f32,
}

/// One tile queued for painting this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCandidate {
    pub cell: IVec2,
    /// Signed distance along the view direction; larger = farther.
    pub depth: f32,
}

/// Per-frame counters, logged at trace level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Tiles in the window around the camera.
    pub window: usize,
    /// Tiles that survived culling.
    pub visible: usize,
    /// Tiles actually painted.
    pub drawn: usize,
}
