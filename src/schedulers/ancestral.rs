use ndarray::{Array3, ArrayView3, ArrayViewMut3, Zip};
use rand::Rng;
use rand_distr::StandardNormal;

use super::{NoiseSchedule, Scheduler};
use crate::config::ConfigurationError;
use crate::pipelines::PipelineError;

/// Simplified ancestral step: removes the scaled noise estimate, rescales by
/// `1 / sqrt(alpha_bar)` and reinjects a little fresh noise on every step but the last.
#[derive(Debug, Clone)]
pub struct Ancestral {
    schedule: NoiseSchedule,
    reinjection_scale: f32,
}

impl Ancestral {
    pub const REINJECTION_SCALE: f32 = 0.1;

    pub fn new(schedule: NoiseSchedule) -> Self {
        Self {
            schedule,
            reinjection_scale: Self::REINJECTION_SCALE,
        }
    }

    pub fn linear(
        timesteps: usize,
        beta_min: f32,
        beta_max: f32,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self::new(NoiseSchedule::linear(timesteps, beta_min, beta_max)?))
    }

    fn checked_alpha_bar(&self, timestep: usize) -> Result<f32, PipelineError> {
        let alpha_bar = self
            .schedule
            .alpha_bar(timestep)
            .ok_or(PipelineError::TimestepOutOfRange {
                timestep,
                len: self.schedule.len(),
            })?;
        if !(alpha_bar.is_finite() && alpha_bar > 0.) {
            return Err(PipelineError::NumericInstability { timestep });
        }
        Ok(alpha_bar)
    }
}

impl Scheduler for Ancestral {
    fn step(
        &self,
        timestep: usize,
        mut sample: ArrayViewMut3<'_, f32>,
        output: ArrayView3<'_, f32>,
        rng: &mut impl Rng,
    ) -> Result<(), PipelineError> {
        let alpha_bar = self.checked_alpha_bar(timestep)?;
        let removed = 1. - alpha_bar;
        let denom = alpha_bar.sqrt();

        Zip::from(&mut sample)
            .and(&output)
            .for_each(|x, &eps| *x = (*x - removed * eps) / denom);

        if timestep > 0 {
            let noise =
                Array3::<f32>::from_shape_simple_fn(sample.dim(), || rng.sample(StandardNormal));
            sample.scaled_add(self.reinjection_scale, &noise);
        }
        Ok(())
    }

    fn add_noise(
        &self,
        timestep: usize,
        sample: ArrayView3<'_, f32>,
        noise: ArrayView3<'_, f32>,
    ) -> Result<Array3<f32>, PipelineError> {
        let alpha_bar = self.checked_alpha_bar(timestep)?;
        Ok(&sample * alpha_bar.sqrt() + &noise * (1. - alpha_bar).sqrt())
    }

    #[inline]
    fn schedule(&self) -> &NoiseSchedule {
        &self.schedule
    }
}
