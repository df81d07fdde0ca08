use log::{debug, info, trace};

use crate::{
    config::{Config, ConfigError, PipelineFlags},
    engine::{
        pipeline::{build_quad, collect_candidates, draw_background, draw_quad},
        types::{DrawCandidate, FrameStats, Screen, Viewer},
    },
    renderer::Surface,
    world::{Camera, HeightCache, TileColors},
};

/// Per-frame control deltas, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationInput {
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    /// Travel direction only.
    pub fly_yaw: f32,
    /// Vertical field of view; positive widens.
    pub fov: f32,
}

impl RotationInput {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

pub struct Engine {
    config: Config,
    camera: Camera,
    view: Viewer,
    heights: HeightCache,
    colors: TileColors,
    draw_list: Vec<DrawCandidate>,
    stats: FrameStats,
}

impl Engine {
    /// Validate `config` and build the camera and caches from it.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let motion = config.flags.contains(PipelineFlags::CAMERA_MOTION);
        let camera = Camera::from_config(&config.camera, motion);
        let shading = &config.shading;
        let colors = TileColors::new(
            shading.palette.clone(),
            shading.bands.clone(),
            shading.cache_capacity,
        );

        info!(
            "engine: window radius {}, profile {:?}, flags {:?}, color mode {:?}",
            config.window_radius(),
            config.height_profile,
            config.flags,
            shading.mode
        );

        Ok(Self {
            view: Viewer::from(&config.projection),
            heights: HeightCache::new(config.height_profile),
            draw_list: Vec::new(),
            stats: FrameStats::default(),
            camera,
            colors,
            config,
        })
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[inline]
    pub fn flags(&self) -> PipelineFlags {
        self.config.flags
    }

    /// Replace the pipeline flags; `CAMERA_MOTION` is forwarded to the camera.
    pub fn set_flags(&mut self, flags: PipelineFlags) {
        if flags != self.config.flags {
            debug!("pipeline flags {:?} -> {:?}", self.config.flags, flags);
        }
        self.config.flags = flags;
        self.camera
            .set_motion(flags.contains(PipelineFlags::CAMERA_MOTION));
    }

    pub fn toggle(&mut self, flag: PipelineFlags) {
        self.set_flags(self.config.flags ^ flag);
    }

    /// Tiles painted in the last frame, farthest first.
    #[inline]
    pub fn draw_list(&self) -> &[DrawCandidate] {
        &self.draw_list
    }

    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    #[inline]
    pub fn colors(&self) -> &TileColors {
        &self.colors
    }

    /// Forget every memoized tile color.
    pub fn reset_color_map(&mut self) {
        self.colors.reset_color_map();
    }

    /// Apply one frame of input, ease the turn, then move the camera.
    pub fn tick(&mut self, input: RotationInput) {
        if !input.is_idle() {
            self.camera
                .apply_rotation_input(input.yaw, input.pitch, input.roll);
            if input.fly_yaw != 0.0 {
                self.camera.steer(input.fly_yaw);
            }
            if input.fov != 0.0 && !self.camera.zoom(input.fov) {
                debug!("fov clamped at {:.1}°", self.camera.fov().to_degrees());
            }
        }
        self.camera.ease();
        self.camera.advance();
    }

    /// Paint one frame onto `surface`, sized from the surface itself.
    pub fn render_frame<S: Surface + ?Sized>(&mut self, surface: &mut S) -> FrameStats {
        let (w, h) = surface.size();
        let cfg = &self.config;
        let screen = Screen::new(w, h, cfg.projection.horizon_anchor);

        self.camera
            .refresh_trig_cache(w, h, cfg.projection.tile_size);
        // heights are only reused within one frame
        self.heights.clear();

        draw_background(
            surface,
            &self.camera,
            &self.view,
            &screen,
            &cfg.shading,
            cfg.flags.contains(PipelineFlags::SKY),
        );

        let window = collect_candidates(
            cfg,
            &self.camera,
            &self.view,
            &screen,
            &mut self.heights,
            &mut self.draw_list,
        );

        let mut drawn = 0;
        for cand in &self.draw_list {
            let Some(quad) = build_quad(
                cfg,
                &self.camera,
                &self.view,
                &screen,
                &mut self.heights,
                cand.cell,
            ) else {
                continue;
            };
            draw_quad(surface, cfg, &mut self.colors, &quad);
            drawn += 1;
        }

        self.stats = FrameStats {
            window,
            visible: self.draw_list.len(),
            drawn,
        };
        trace!(
            "frame: {} in window, {} visible, {} drawn, {} heights, {} colors",
            window,
            self.stats.visible,
            drawn,
            self.heights.len(),
            self.colors.cache().len()
        );
        self.stats
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
