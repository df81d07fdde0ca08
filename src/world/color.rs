//! Tile base colors: palette lookup keyed by a coordinate hash, a bounded
//! memo for the lookups, and the shading helper used for slope lighting.

use std::{
    collections::{HashMap, VecDeque},
    fmt,
    str::FromStr,
};

use glam::IVec2;
use log::trace;
use serde::Deserialize;
use thiserror::Error;

use super::noise::noise;

/// 8-bit-per-channel color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `0xRRGGBB` → color.
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Frame-buffer pixel (0xAARRGGBB, opaque).
    #[inline]
    pub const fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }

    /// Channel-wise linear blend, `t = 0` → `self`, `t = 1` → `other`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color `{0}` must start with `#`")]
    MissingHash(String),

    #[error("color `{0}` must have 3 or 6 hex digits")]
    BadLength(String),

    #[error("color `{0}` contains a non-hex digit")]
    BadDigit(String),
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    /// Accepts `#rgb` and `#rrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::BadDigit(s.to_string()));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorParseError::BadLength(s.to_string())),
        };
        let hex = u32::from_str_radix(&expanded, 16)
            .map_err(|_| ColorParseError::BadDigit(s.to_string()))?;
        Ok(Rgb::from_hex(hex))
    }
}

impl TryFrom<String> for Rgb {
    type Error = ColorParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Darker (or, above 1.0, brighter) variant of `color`: every channel is
/// scaled by `percent`, floored and saturated to `0..=255`.
pub fn shade_color(color: Rgb, percent: f32) -> Rgb {
    let scale = |c: u8| (c as f32 * percent).floor().clamp(0.0, 255.0) as u8;
    Rgb::new(scale(color.r), scale(color.g), scale(color.b))
}

/// Hashed terrain palette, in lookup order.
pub const DEFAULT_PALETTE: [Rgb; 7] = [
    Rgb::from_hex(0xAAAADD),
    Rgb::from_hex(0x66BB88),
    Rgb::from_hex(0x338866),
    Rgb::from_hex(0x22CC44),
    Rgb::from_hex(0xCC9944),
    Rgb::from_hex(0x77BB55),
    Rgb::from_hex(0xAA8833),
];

/// Height-band colors, indexed by the floor of a tile's mean height.
pub const DEFAULT_BANDS: [Rgb; 4] = [
    Rgb::from_hex(0xAAAADD),
    Rgb::from_hex(0x66BB88),
    Rgb::from_hex(0x338866),
    Rgb::from_hex(0x22CC44),
];

/// Band color for heights past the end of the band list.
pub const BAND_FALLBACK: Rgb = Rgb::from_hex(0x222222);

/// Bounded memo with first-in-first-out eviction.
///
/// Invariant: `len() <= capacity()` after every call.
#[derive(Debug)]
pub struct ColorCache {
    capacity: usize,
    colors: HashMap<IVec2, Rgb>,
    order: VecDeque<IVec2>,
}

impl ColorCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            colors: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, cell: IVec2) -> Option<Rgb> {
        self.colors.get(&cell).copied()
    }

    /// Cached color for `cell`, or `make()` stored as the newest entry.
    pub fn get_or_insert_with(&mut self, cell: IVec2, make: impl FnOnce() -> Rgb) -> Rgb {
        if let Some(c) = self.get(cell) {
            return c;
        }
        let color = make();
        if self.capacity == 0 {
            return color;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.colors.remove(&oldest);
                trace!("color cache full, evicted {oldest}");
            }
        }
        self.colors.insert(cell, color);
        self.order.push_back(cell);
        color
    }

    /// Keys from oldest to newest insertion.
    pub fn keys(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.order.iter().copied()
    }

    pub fn clear(&mut self) {
        self.colors.clear();
        self.order.clear();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Per-tile base color generator.
#[derive(Debug)]
pub struct TileColors {
    palette: Vec<Rgb>,
    bands: Vec<Rgb>,
    cache: ColorCache,
}

impl TileColors {
    /// `palette` must not be empty (see `Config::validate`).
    pub fn new(palette: Vec<Rgb>, bands: Vec<Rgb>, capacity: usize) -> Self {
        Self {
            palette,
            bands,
            cache: ColorCache::new(capacity),
        }
    }

    /// Palette entry for tile `(x, y)`, memoized across frames.
    pub fn get_color(&mut self, x: i32, y: i32) -> Rgb {
        let palette = &self.palette;
        self.cache.get_or_insert_with(IVec2::new(x, y), || {
            let idx = (noise(x as f64 + 1.5, y as f64 - 2.7) * palette.len() as f64) as usize;
            palette
                .get(idx.min(palette.len().saturating_sub(1)))
                .copied()
                .unwrap_or(BAND_FALLBACK)
        })
    }

    /// Drops every memoized color. Later lookups give the same answers.
    pub fn reset_color_map(&mut self) {
        self.cache.clear();
    }

    /// Band color for a tile whose corners average `mean_height`.
    pub fn band_color(&self, mean_height: f32) -> Rgb {
        if mean_height < 0.0 {
            return BAND_FALLBACK;
        }
        self.bands
            .get(mean_height.floor() as usize)
            .copied()
            .unwrap_or(BAND_FALLBACK)
    }

    pub fn cache(&self) -> &ColorCache {
        &self.cache
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn colors(capacity: usize) -> TileColors {
        TileColors::new(DEFAULT_PALETTE.to_vec(), DEFAULT_BANDS.to_vec(), capacity)
    }

    #[test]
    fn shade_red_by_half() {
        let red: Rgb = "#ff0000".parse().unwrap();
        let shaded = shade_color(red, 0.5);
        assert_eq!(shaded, Rgb::new(127, 0, 0));
        assert_eq!(shaded.to_string(), "rgb(127,0,0)");
    }

    #[test]
    fn shade_never_brightens_below_one() {
        for c in DEFAULT_PALETTE {
            assert_eq!(shade_color(c, 1.0), c);
            for p in [0.0, 0.12, 0.5, 0.7, 0.99] {
                let s = shade_color(c, p);
                assert!(s.r <= c.r && s.g <= c.g && s.b <= c.b, "{c} * {p} = {s}");
            }
        }
    }

    #[test]
    fn shade_saturates_above_one() {
        assert_eq!(shade_color(Rgb::new(200, 10, 255), 1.5), Rgb::new(255, 15, 255));
        assert_eq!(shade_color(Rgb::new(200, 10, 255), -1.0), Rgb::BLACK);
    }

    #[test]
    fn parse_short_and_long_hex() {
        assert_eq!("#aad".parse(), Ok(Rgb::new(0xAA, 0xAA, 0xDD)));
        assert_eq!("#1a2B3c".parse(), Ok(Rgb::new(0x1A, 0x2B, 0x3C)));
        assert_eq!(
            "aad".parse::<Rgb>(),
            Err(ColorParseError::MissingHash("aad".into()))
        );
        assert_eq!(
            "#abcd".parse::<Rgb>(),
            Err(ColorParseError::BadLength("#abcd".into()))
        );
        assert_eq!(
            "#ggg".parse::<Rgb>(),
            Err(ColorParseError::BadDigit("#ggg".into()))
        );
    }

    #[test]
    fn argb_packs_opaque_pixel() {
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).to_argb(), 0xFF12_3456);
    }

    #[test]
    fn get_color_is_cached_and_deterministic() {
        let mut tc = colors(64);
        let c1 = tc.get_color(2, 3);
        let c2 = tc.get_color(2, 3);
        assert_eq!(c1, c2);
        assert_eq!(tc.cache().len(), 1);

        tc.reset_color_map();
        assert!(tc.cache().is_empty());
        assert_eq!(tc.get_color(2, 3), c1);
        assert!(DEFAULT_PALETTE.contains(&c1));
    }

    #[test]
    fn cache_is_bounded_and_fifo() {
        let mut tc = colors(3);
        for x in 0..10 {
            tc.get_color(x, 0);
            assert!(tc.cache().len() <= 3);
        }
        let keys: Vec<IVec2> = tc.cache().keys().collect();
        assert_eq!(
            keys,
            vec![IVec2::new(7, 0), IVec2::new(8, 0), IVec2::new(9, 0)]
        );

        // a hit does not refresh insertion order
        tc.get_color(7, 0);
        tc.get_color(100, 0);
        assert_eq!(tc.cache().get(IVec2::new(7, 0)), None);
        assert!(tc.cache().get(IVec2::new(8, 0)).is_some());
    }

    #[test]
    fn zero_capacity_cache_stores_nothing() {
        let mut cache = ColorCache::new(0);
        let c = cache.get_or_insert_with(IVec2::ZERO, || Rgb::new(1, 2, 3));
        assert_eq!(c, Rgb::new(1, 2, 3));
        assert!(cache.is_empty());
    }

    #[test]
    fn band_color_falls_back_past_the_end() {
        let tc = colors(4);
        assert_eq!(tc.band_color(0.0), DEFAULT_BANDS[0]);
        assert_eq!(tc.band_color(2.75), DEFAULT_BANDS[2]);
        assert_eq!(tc.band_color(4.0), BAND_FALLBACK);
        assert_eq!(tc.band_color(-0.5), BAND_FALLBACK);
    }

    #[test]
    fn lerp_endpoints() {
        let a = Rgb::new(0, 100, 200);
        let b = Rgb::new(200, 100, 0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(100, 100, 100));
    }
}
