//! Interactive flyover in a software-rendered window.
//!
//! ```bash
//! cargo run --release -- --config fly.toml --width 1600 --height 900
//! ```
//!
//! ←/→ look, ↑/↓ or W/S pitch, A/D steer, Q/E roll, +/- zoom,
//! M motion, C culling, O outline, K sky, R recolor, Esc quit.

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use clap::Parser;
use log::{LevelFilter, info, warn};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use simple_logger::SimpleLogger;

use tilefly::{
    Config, Engine, PipelineFlags, RotationInput, renderer::software::Software,
    world::HeightProfile,
};

const YAW_STEP: f32 = 0.02;
const PITCH_STEP: f32 = 0.012;
const ROLL_STEP: f32 = 0.01;
const FOV_STEP_DEG: f32 = 0.5;
const REPORT_EVERY: Duration = Duration::from_secs(3);

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// TOML file with engine settings; defaults are used when absent
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 1280)]
    width: usize,

    #[arg(long, default_value_t = 800)]
    height: usize,

    /// Frame-rate cap
    #[arg(long, default_value_t = 60)]
    fps: usize,

    /// Start as a look-around rig instead of flying
    #[arg(long)]
    no_motion: bool,

    /// Skip the cone/bounds test and project every tile in the window
    #[arg(long)]
    no_cull: bool,

    /// Height profile: flat, rolling or bilinear
    #[arg(long, value_name = "KIND")]
    profile: Option<HeightProfile>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    SimpleLogger::new().with_level(opts.log_level).init()?;

    let mut cfg = match &opts.config {
        Some(path) => {
            info!("loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };
    if opts.no_motion {
        cfg.flags.remove(PipelineFlags::CAMERA_MOTION);
    }
    if opts.no_cull {
        cfg.flags.remove(PipelineFlags::CULLING);
    }
    if let Some(profile) = opts.profile {
        cfg.height_profile = profile;
    }

    let (w, h) = (opts.width.max(1), opts.height.max(1));
    let mut engine = Engine::new(cfg)?;
    let mut surface = Software::new(w, h);

    let mut win = Window::new("tilefly", w, h, WindowOptions::default())?;
    win.set_target_fps(opts.fps);

    // ────────────────── benchmarking state ──────────────────────────────
    let mut acc_time = Duration::ZERO;
    let mut acc_frames = 0usize;
    let mut last_print = Instant::now();

    while win.is_open() && !win.is_key_down(Key::Escape) {
        let t0 = Instant::now();

        /* --------------- one RotationInput per frame ---------------------- */
        let mut input = RotationInput::default();
        let axis = |neg: Key, pos: Key| {
            win.is_key_down(pos) as i32 as f32 - win.is_key_down(neg) as i32 as f32
        };
        input.yaw = axis(Key::Right, Key::Left) * YAW_STEP;
        input.pitch =
            (axis(Key::Down, Key::Up) + axis(Key::S, Key::W)).clamp(-1.0, 1.0) * PITCH_STEP;
        input.roll = axis(Key::Q, Key::E) * ROLL_STEP;
        input.fly_yaw = axis(Key::D, Key::A) * YAW_STEP;
        input.fov = (axis(Key::Equal, Key::Minus) + axis(Key::NumPadPlus, Key::NumPadMinus))
            * FOV_STEP_DEG.to_radians();

        /* toggles (edge-triggered) ----------------------------------------- */
        for (key, flag) in [
            (Key::M, PipelineFlags::CAMERA_MOTION),
            (Key::C, PipelineFlags::CULLING),
            (Key::O, PipelineFlags::OUTLINE),
            (Key::K, PipelineFlags::SKY),
        ] {
            if win.is_key_pressed(key, KeyRepeat::No) {
                engine.toggle(flag);
                info!("flags: {:?}", engine.flags());
            }
        }
        if win.is_key_pressed(Key::R, KeyRepeat::No) {
            engine.reset_color_map();
        }

        engine.tick(input);

        /* draw */
        let (w, h) = win.get_size();
        if w == 0 || h == 0 {
            warn!("window has zero size, skipping frame");
            win.update();
            continue;
        }
        surface.begin_frame(w, h);
        engine.render_frame(&mut surface);
        acc_time += t0.elapsed();
        acc_frames += 1;
        surface.end_frame(|fb, w, h| win.update_with_buffer(fb, w, h))?;

        // ─────────── report every ~3 s ────────────────────
        if last_print.elapsed() >= REPORT_EVERY {
            let avg_ms = acc_time.as_secs_f64() * 1000.0 / acc_frames.max(1) as f64;
            let stats = engine.stats();
            let telemetry = engine.camera().telemetry();
            info!(
                "avg render: {:.2} ms  ({:.1} FPS)  tiles {}/{}/{}  {}",
                avg_ms,
                1000.0 / avg_ms.max(f64::EPSILON),
                stats.drawn,
                stats.visible,
                stats.window,
                telemetry
            );
            win.set_title(&format!("tilefly  {telemetry}  {avg_ms:.1} ms"));
            acc_time = Duration::ZERO;
            acc_frames = 0;
            last_print = Instant::now();
        }
    }
    Ok(())
}
