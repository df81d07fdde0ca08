//! Software-rendered flyover of an infinite, procedurally generated tile
//! heightfield.
//!
//! Every frame a camera-centred window of tiles is culled, depth-sorted
//! back-to-front and painted onto a [`renderer::Surface`] as pairs of shaded
//! triangles. There is no depth buffer: draw order alone resolves occlusion.

pub mod config;
pub mod engine;
pub mod renderer;
pub mod world;

pub use config::{Config, ConfigError, PipelineFlags};
pub use engine::{Engine, RotationInput};
