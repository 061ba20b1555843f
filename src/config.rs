use std::fs::File;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Construction parameters of a [`Sampler`](crate::pipelines::Sampler).
///
/// Built once per process and handed to the sampler, which precomputes its noise
/// schedule from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    pub image_size: usize,
    pub timesteps: usize,
    pub beta_min: f32,
    pub beta_max: f32,
    pub default_steps: usize,
}

impl SamplerConfig {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let file = io::BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_image_size(mut self, image_size: usize) -> Self {
        self.image_size = image_size;
        self
    }

    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }

    pub fn with_beta_range(mut self, beta_min: f32, beta_max: f32) -> Self {
        self.beta_min = beta_min;
        self.beta_max = beta_max;
        self
    }

    pub fn with_default_steps(mut self, default_steps: usize) -> Self {
        self.default_steps = default_steps;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.image_size == 0 || u32::try_from(self.image_size).is_err() {
            return Err(ConfigurationError::InvalidImageSize(self.image_size));
        }
        check_schedule_params(self.timesteps, self.beta_min, self.beta_max)?;
        check_steps(self.default_steps, self.timesteps)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            image_size: 128,
            timesteps: 100,
            beta_min: 1e-4,
            beta_max: 0.02,
            default_steps: 50,
        }
    }
}

pub(crate) fn check_schedule_params(
    timesteps: usize,
    beta_min: f32,
    beta_max: f32,
) -> Result<(), ConfigurationError> {
    if timesteps < 1 {
        return Err(ConfigurationError::InvalidTimesteps(timesteps));
    }
    let in_unit = |b: f32| b.is_finite() && b > 0. && b < 1.;
    if !in_unit(beta_min) || !in_unit(beta_max) || beta_min >= beta_max {
        return Err(ConfigurationError::InvalidBetaRange { beta_min, beta_max });
    }
    Ok(())
}

pub(crate) fn check_steps(steps: usize, timesteps: usize) -> Result<(), ConfigurationError> {
    if steps == 0 || steps > timesteps {
        return Err(ConfigurationError::InvalidSteps { steps, timesteps });
    }
    Ok(())
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("timesteps must be at least 1, got {0}")]
    InvalidTimesteps(usize),
    #[error("beta bounds must satisfy 0 < beta_min < beta_max < 1, got [{beta_min}, {beta_max}]")]
    InvalidBetaRange { beta_min: f32, beta_max: f32 },
    #[error("cumulative alpha reaches zero at timestep {0}")]
    DegenerateSchedule(usize),
    #[error("image size must be a positive 32-bit dimension, got {0}")]
    InvalidImageSize(usize),
    #[error("steps must be in 1..={timesteps}, got {steps}")]
    InvalidSteps { steps: usize, timesteps: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}
