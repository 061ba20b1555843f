use ndarray::{Array3, ArrayView3, ArrayViewMut3};
use rand::Rng;

use crate::pipelines::PipelineError;

mod ancestral;
mod schedule;

pub use ancestral::Ancestral;
pub use schedule::NoiseSchedule;

/// A reverse-diffusion update rule driven by a precomputed [`NoiseSchedule`].
///
/// Implementations hold no per-call state, so one scheduler can serve concurrent
/// generations through a shared reference.
pub trait Scheduler {
    /// Applies the update for `timestep` to `sample` in place, given the noise
    /// estimate `output` for that timestep.
    fn step(
        &self,
        timestep: usize,
        sample: ArrayViewMut3<'_, f32>,
        output: ArrayView3<'_, f32>,
        rng: &mut impl Rng,
    ) -> Result<(), PipelineError>;

    /// Forward process: noises a clean `sample` up to `timestep`.
    fn add_noise(
        &self,
        timestep: usize,
        sample: ArrayView3<'_, f32>,
        noise: ArrayView3<'_, f32>,
    ) -> Result<Array3<f32>, PipelineError>;

    fn schedule(&self) -> &NoiseSchedule;
}
