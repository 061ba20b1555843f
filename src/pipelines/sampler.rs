use std::time::Instant;

use ndarray::{Array3, ArrayView3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::{PipelineError, Sample};
use crate::config::{check_steps, ConfigurationError, SamplerConfig};
use crate::denoiser::{Denoiser, SyntheticDenoiser};
use crate::schedulers::{Ancestral, NoiseSchedule, Scheduler};

/// Turns seeded noise into a finished [`Sample`] by walking the noise schedule backwards.
///
/// The schedule is computed once in the constructor and only read afterwards, so a
/// single sampler can be shared between threads serving concurrent requests.
#[derive(Debug)]
pub struct Sampler<S = Ancestral, D = SyntheticDenoiser> {
    config: SamplerConfig,
    scheduler: S,
    denoiser: D,
}

impl Sampler {
    pub fn new(config: SamplerConfig) -> Result<Self, ConfigurationError> {
        Self::with_denoiser(config, SyntheticDenoiser::default())
    }
}

impl<D: Denoiser> Sampler<Ancestral, D> {
    pub fn with_denoiser(config: SamplerConfig, denoiser: D) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let scheduler = Ancestral::linear(config.timesteps, config.beta_min, config.beta_max)?;
        tracing::info!(
            image_size = config.image_size,
            timesteps = config.timesteps,
            "sampler ready"
        );

        Ok(Self {
            config,
            scheduler,
            denoiser,
        })
    }
}

impl<S: Scheduler, D: Denoiser> Sampler<S, D> {
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    pub fn schedule(&self) -> &NoiseSchedule {
        self.scheduler.schedule()
    }

    /// Runs `steps` reverse steps, from timestep `steps - 1` down to 0, drawing all
    /// randomness from `rng`.
    ///
    /// Fails without returning a partial sample if any value stops being finite.
    pub fn generate(&self, steps: usize, rng: &mut impl Rng) -> Result<Sample, PipelineError> {
        check_steps(steps, self.schedule().len())?;

        let size = self.config.image_size;
        let mut sample =
            Array3::<f32>::from_shape_simple_fn((size, size, 3), || rng.sample(StandardNormal));

        let now = Instant::now();
        for timestep in (0..steps).rev() {
            tracing::trace!(
                step = steps - timestep,
                steps,
                elapsed = now.elapsed().as_secs_f32(),
                "reverse step"
            );

            let output = self.denoiser.estimate_noise(timestep, sample.view(), rng);
            self.scheduler
                .step(timestep, sample.view_mut(), output.view(), rng)
                .map_err(|err| {
                    tracing::warn!(timestep, "reverse step failed: {err}");
                    err
                })?;

            if !sample.iter().all(|x| x.is_finite()) {
                tracing::warn!(timestep, "sample diverged");
                return Err(PipelineError::NumericInstability { timestep });
            }
        }

        Ok(sample)
    }

    /// [`generate`](Self::generate) with a private generator seeded from `seed`.
    pub fn generate_seeded(&self, seed: u64, steps: usize) -> Result<Sample, PipelineError> {
        self.generate(steps, &mut StdRng::seed_from_u64(seed))
    }

    /// Noises a clean sample up to `timestep`, returning the noisy sample and the noise drawn.
    pub fn forward_diffusion(
        &self,
        sample: ArrayView3<'_, f32>,
        timestep: usize,
        rng: &mut impl Rng,
    ) -> Result<(Sample, Sample), PipelineError> {
        let noise =
            Array3::<f32>::from_shape_simple_fn(sample.dim(), || rng.sample(StandardNormal));
        let noisy = self.scheduler.add_noise(timestep, sample, noise.view())?;
        Ok((noisy, noise))
    }
}
