//! Deterministic terrain sampling.
//!
//! Heights are pure functions of integer tile coordinates, so nothing about a
//! cell is ever stored for longer than one frame.

use std::{collections::HashMap, str::FromStr};

use glam::IVec2;
use serde::Deserialize;
use thiserror::Error;

/// Highest height any profile produces; the lowest is always 0.
pub const MAX_HEIGHT: i32 = 3;

/// Trigonometric hash of `(x, y)` into `[0, 1)`.
///
/// The same inputs always give the same value; the only platform dependence
/// is the precision of `sin`.
#[inline]
pub fn noise(x: f64, y: f64) -> f64 {
    ((x * 127.1 + y * 311.7).sin() * 43758.5453).abs() % 1.0
}

/// Rolling hills: two low-frequency sinusoids plus a little noise, floored
/// and clamped to `0..=MAX_HEIGHT`.
pub fn compute_height(x: i32, y: i32) -> i32 {
    let (fx, fy) = (x as f64, y as f64);
    let h = 2.2
        + 2.0 * (fx * 0.25 + fy * 0.17).sin()
        + 1.5 * (fx * 0.19 - fy * 0.23).cos()
        + 0.8 * noise(fx, fy);
    (h.floor() as i32).clamp(0, MAX_HEIGHT)
}

/// Which height function the terrain uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HeightProfile {
    /// Every cell at height 0.
    Flat,
    /// [`compute_height`].
    #[default]
    Rolling,
    /// Random corner heights on a coarse lattice of `cell` tiles, bilinearly
    /// interpolated in between.
    Bilinear { cell: i32 },
}

impl HeightProfile {
    pub fn height(self, x: i32, y: i32) -> i32 {
        match self {
            HeightProfile::Flat => 0,
            HeightProfile::Rolling => compute_height(x, y),
            HeightProfile::Bilinear { cell } => bilinear_height(x, y, cell.max(1)),
        }
    }
}

fn bilinear_height(x: i32, y: i32, cell: i32) -> i32 {
    let corner = |cx: i32, cy: i32| noise(cx as f64, cy as f64) * (MAX_HEIGHT + 1) as f64;

    let (cx, cy) = (x.div_euclid(cell), y.div_euclid(cell));
    let tx = x.rem_euclid(cell) as f64 / cell as f64;
    let ty = y.rem_euclid(cell) as f64 / cell as f64;

    let top = corner(cx, cy) * (1.0 - tx) + corner(cx + 1, cy) * tx;
    let bottom = corner(cx, cy + 1) * (1.0 - tx) + corner(cx + 1, cy + 1) * tx;
    let h = top * (1.0 - ty) + bottom * ty;
    (h.floor() as i32).clamp(0, MAX_HEIGHT)
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown height profile `{0}` (expected flat, rolling or bilinear)")]
pub struct ParseProfileError(String);

impl FromStr for HeightProfile {
    type Err = ParseProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(HeightProfile::Flat),
            "rolling" => Ok(HeightProfile::Rolling),
            "bilinear" => Ok(HeightProfile::Bilinear { cell: 4 }),
            _ => Err(ParseProfileError(s.to_string())),
        }
    }
}

/// Height memo for a single frame.
///
/// A corner is shared by up to four tiles, so each frame samples every
/// height once. [`HeightCache::clear`] must run at the start of each frame.
#[derive(Debug, Default)]
pub struct HeightCache {
    profile: HeightProfile,
    heights: HashMap<IVec2, i32>,
}

impl HeightCache {
    pub fn new(profile: HeightProfile) -> Self {
        Self {
            profile,
            heights: HashMap::new(),
        }
    }

    #[inline]
    pub fn profile(&self) -> HeightProfile {
        self.profile
    }

    /// Height of the grid corner `cell`, computed at most once per frame.
    pub fn height(&mut self, cell: IVec2) -> i32 {
        let profile = self.profile;
        *self
            .heights
            .entry(cell)
            .or_insert_with(|| profile.height(cell.x, cell.y))
    }

    pub fn clear(&mut self) {
        self.heights.clear();
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
