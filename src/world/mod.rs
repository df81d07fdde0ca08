mod camera;
mod color;
mod noise;

pub use camera::{Camera, SinCos, Telemetry};
pub use color::{
    BAND_FALLBACK, ColorCache, ColorParseError, DEFAULT_BANDS, DEFAULT_PALETTE, Rgb, TileColors,
    shade_color,
};
pub use noise::{
    HeightCache, HeightProfile, MAX_HEIGHT, ParseProfileError, compute_height, noise,
};
