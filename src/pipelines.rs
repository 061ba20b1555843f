use image::ImageError;
use ndarray::Array3;
use serde::Serialize;
use thiserror::Error;

use crate::codec::PixelImage;
use crate::config::ConfigurationError;

mod request;
mod sampler;

pub use request::GenerationRequest;
pub use sampler::Sampler;

/// A `(height, width, 3)` working array of the reverse process.
pub type Sample = Array3<f32>;

/// Output of a [`GenerationRequest`], ready for the gallery layer to persist.
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub seed: u64,
    pub prompt: String,
    pub steps: usize,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub image: PixelImage,
    #[serde(skip)]
    pub png: Vec<u8>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("non-finite value produced at timestep {timestep}")]
    NumericInstability { timestep: usize },
    #[error("timestep {timestep} is outside a schedule of length {len}")]
    TimestepOutOfRange { timestep: usize, len: usize },
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
    #[error("image encoding failed: {0}")]
    Encoding(#[from] ImageError),
}
