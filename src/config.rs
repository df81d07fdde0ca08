//! Tunables for the camera, projection, culling and shading.
//!
//! Every field has a default, so an empty TOML file (or none at all) gives the
//! stock flyover. Angles are in degrees here and converted once at startup.

use std::{fs, io, path::Path};

use bitflags::bitflags;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::world::{DEFAULT_BANDS, DEFAULT_PALETTE, HeightProfile, Rgb};

bitflags! {
    /// Optional stages of the frame pipeline.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PipelineFlags: u8 {
        /// FoV cone + projected-bounds test before the four-corner projection.
        const CULLING       = 0x01;
        /// Camera moves along `fly_yaw` every frame; off = look-around rig.
        const CAMERA_MOTION = 0x02;
        /// Sky gradient above the horizon line.
        const SKY           = 0x04;
        /// Outline every tile triangle.
        const OUTLINE       = 0x08;
    }
}

impl Default for PipelineFlags {
    fn default() -> Self {
        PipelineFlags::CULLING | PipelineFlags::CAMERA_MOTION | PipelineFlags::SKY
    }
}

/// Deserialized from a list of flag names, e.g. `["CULLING", "SKY"]`.
impl<'de> Deserialize<'de> for PipelineFlags {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let names = Vec::<String>::deserialize(de)?;
        names.iter().try_fold(PipelineFlags::empty(), |acc, name| {
            PipelineFlags::from_name(&name.to_ascii_uppercase())
                .map(|f| acc | f)
                .ok_or_else(|| serde::de::Error::custom(format!("unknown pipeline flag `{name}`")))
        })
    }
}

/// Where a tile's base color comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// Palette entry picked by a coordinate hash (memoized).
    #[default]
    Hashed,
    /// Band picked by the tile's mean corner height.
    HeightBands,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 2],
    pub altitude: f32,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub roll_deg: f32,
    pub min_pitch_deg: f32,
    pub max_pitch_deg: f32,
    /// Vertical field of view.
    pub fov_deg: f32,
    pub min_fov_deg: f32,
    pub max_fov_deg: f32,
    /// World units per frame.
    pub speed: f32,
    /// Fraction of the remaining yaw turn covered each frame; 1 = instant.
    pub yaw_easing: f32,
    pub pitch_easing: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            altitude: 6.5,
            yaw_deg: 45.0,
            pitch_deg: 180.0 / 7.0,
            roll_deg: 0.0,
            min_pitch_deg: 12.0,
            max_pitch_deg: 180.0 / 2.1,
            fov_deg: 75.0,
            min_fov_deg: 20.0,
            max_fov_deg: 120.0,
            speed: 0.14,
            yaw_easing: 0.07,
            pitch_easing: 0.09,
        }
    }
}

/// Extra room around the viewport, in pixels, before a tile's projected
/// bounding box counts as off-screen.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Padding {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            left: 400.0,
            right: 400.0,
            top: 1200.0,
            bottom: 1600.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Pixels per world unit at the focal plane.
    pub tile_size: f32,
    /// Multiplier on the forward component before the focal offset.
    pub perspective_scale: f32,
    /// Depth at or below which a point is behind the camera.
    pub near_threshold: f32,
    /// Tiles with any corner nearer than this are skipped.
    pub min_depth: f32,
    /// Screen position of the view centre, as fractions of width/height.
    pub horizon_anchor: [f32; 2],
    /// Pixels a tile centre may sit outside the surface and still be kept.
    pub cull_margin: f32,
    pub padding: Padding,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tile_size: 32.0,
            perspective_scale: 1.0,
            near_threshold: 0.05,
            min_depth: 1.0,
            horizon_anchor: [0.5, 0.5],
            cull_margin: 200.0,
            padding: Padding::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub mode: ColorMode,
    pub palette: Vec<Rgb>,
    pub bands: Vec<Rgb>,
    /// Most colors the hashed-palette memo keeps before evicting.
    pub cache_capacity: usize,
    pub base_shade: f32,
    pub min_shade: f32,
    pub slope_gain: f32,
    /// Extra factor for the second triangle of every tile.
    pub second_face_shade: f32,
    pub outline: Rgb,
    pub ground: Rgb,
    pub sky_top: Rgb,
    pub sky_horizon: Rgb,
    pub sky_bands: u32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            mode: ColorMode::Hashed,
            palette: DEFAULT_PALETTE.to_vec(),
            bands: DEFAULT_BANDS.to_vec(),
            cache_capacity: 4096,
            base_shade: 1.1,
            min_shade: 0.7,
            slope_gain: 0.12,
            second_face_shade: 0.9,
            outline: Rgb::from_hex(0x111111),
            ground: Rgb::from_hex(0x202020),
            sky_top: Rgb::from_hex(0x1B3A6B),
            sky_horizon: Rgb::from_hex(0xB8D4E8),
            sky_bands: 24,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tiles across the view; the window radius is half this plus `overscan`.
    pub tiles_in_view: i32,
    pub overscan: i32,
    pub height_profile: HeightProfile,
    pub flags: PipelineFlags,
    pub camera: CameraConfig,
    pub projection: ProjectionConfig,
    pub shading: ShadingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiles_in_view: 36,
            overscan: 5,
            height_profile: HeightProfile::default(),
            flags: PipelineFlags::default(),
            camera: CameraConfig::default(),
            projection: ProjectionConfig::default(),
            shading: ShadingConfig::default(),
        }
    }
}

impl Config {
    /// Read and validate a TOML file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Radius of the square tile window around the camera.
    #[inline]
    pub fn window_radius(&self) -> i32 {
        self.tiles_in_view / 2 + self.overscan
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        // negated comparisons so NaN fails them too
        if !(cam.min_pitch_deg <= cam.max_pitch_deg) {
            return Err(ConfigError::Invalid(format!(
                "min_pitch_deg {} exceeds max_pitch_deg {}",
                cam.min_pitch_deg, cam.max_pitch_deg
            )));
        }
        if !(0.0 < cam.min_fov_deg && cam.min_fov_deg <= cam.max_fov_deg && cam.max_fov_deg < 180.0)
        {
            return Err(ConfigError::Invalid(format!(
                "fov limits {}..{} must lie inside (0, 180)",
                cam.min_fov_deg, cam.max_fov_deg
            )));
        }
        for (name, k) in [("yaw_easing", cam.yaw_easing), ("pitch_easing", cam.pitch_easing)] {
            if !(k > 0.0 && k <= 1.0) {
                return Err(ConfigError::Invalid(format!("{name} {k} must lie in (0, 1]")));
            }
        }
        if !(self.projection.tile_size > 0.0) {
            return Err(ConfigError::Invalid("tile_size must be positive".into()));
        }
        if !(self.projection.perspective_scale > 0.0) {
            return Err(ConfigError::Invalid(
                "perspective_scale must be positive".into(),
            ));
        }
        if !(self.projection.near_threshold > 0.0) {
            return Err(ConfigError::Invalid(
                "near_threshold must be positive".into(),
            ));
        }
        if self.tiles_in_view <= 0 || self.overscan < 0 {
            return Err(ConfigError::Invalid(
                "tiles_in_view must be positive and overscan non-negative".into(),
            ));
        }
        if self.shading.palette.is_empty() {
            return Err(ConfigError::Invalid("palette is empty".into()));
        }
        if self.shading.cache_capacity == 0 {
            return Err(ConfigError::Invalid("cache_capacity must be at least 1".into()));
        }
        if let HeightProfile::Bilinear { cell } = self.height_profile {
            if cell <= 0 {
                return Err(ConfigError::Invalid(format!(
                    "bilinear cell size {cell} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Things that can go wrong while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("bad config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.window_radius(), 23);
        assert!(cfg.flags.contains(PipelineFlags::CULLING));
        assert!(!cfg.flags.contains(PipelineFlags::OUTLINE));
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn toml_overrides_nested_fields() {
        let cfg = Config::from_toml(
            r##"
            tiles_in_view = 20
            flags = ["culling", "OUTLINE"]
            height_profile = { kind = "bilinear", cell = 8 }

            [camera]
            altitude = 9.0
            fov_deg = 60.0

            [shading]
            mode = "height_bands"
            palette = ["#fff", "#000000"]
            "##,
        )
        .unwrap();

        assert_eq!(cfg.tiles_in_view, 20);
        assert_eq!(cfg.overscan, 5);
        assert_eq!(cfg.flags, PipelineFlags::CULLING | PipelineFlags::OUTLINE);
        assert_eq!(cfg.height_profile, HeightProfile::Bilinear { cell: 8 });
        assert_eq!(cfg.camera.altitude, 9.0);
        assert_eq!(cfg.camera.speed, CameraConfig::default().speed);
        assert_eq!(cfg.shading.mode, ColorMode::HeightBands);
        assert_eq!(
            cfg.shading.palette,
            vec![Rgb::new(255, 255, 255), Rgb::new(0, 0, 0)]
        );
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Config::from_toml(r#"flags = ["WIREFRAME"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn bad_color_is_rejected() {
        let err = Config::from_toml("[shading]\nground = \"#12\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn inverted_pitch_limits_are_rejected() {
        let err =
            Config::from_toml("[camera]\nmin_pitch_deg = 50.0\nmax_pitch_deg = 10.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn nan_pitch_limit_is_rejected() {
        let mut cfg = Config::default();
        cfg.camera.max_pitch_deg = f32::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_positive_perspective_scale_is_rejected() {
        let err = Config::from_toml("[projection]\nperspective_scale = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn easing_outside_unit_interval_is_rejected() {
        let err = Config::from_toml("[camera]\nyaw_easing = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
        let cfg = Config::from_toml("[camera]\npitch_easing = 1.0").unwrap();
        assert_eq!(cfg.camera.pitch_easing, 1.0);
        assert_eq!(cfg.camera.yaw_easing, 0.07);
    }

    #[test]
    fn empty_palette_is_rejected() {
        let mut cfg = Config::default();
        cfg.shading.palette.clear();
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }
}
