pub mod codec;
mod config;
mod denoiser;
pub mod pipelines;
pub mod schedulers;

pub use codec::{OutputFormat, PixelImage};
pub use config::{ConfigurationError, SamplerConfig};
pub use denoiser::{Denoiser, SyntheticDenoiser};
pub use pipelines::{Generation, GenerationRequest, PipelineError, Sampler};
