pub mod cull;
pub mod engine;
pub mod pipeline;
pub mod projection;
pub mod types;

pub use engine::{Engine, RotationInput};
pub use types::{DrawCandidate, FrameStats, Projected, Screen, Viewer};
