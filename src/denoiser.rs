use ndarray::{Array3, ArrayView3};
use rand::Rng;
use rand_distr::StandardNormal;

/// Produces the noise estimate the scheduler subtracts at each reverse step.
pub trait Denoiser {
    fn estimate_noise(
        &self,
        timestep: usize,
        sample: ArrayView3<'_, f32>,
        rng: &mut impl Rng,
    ) -> Array3<f32>;
}

/// Placeholder for a trained noise-prediction network.
///
/// Ignores the sample values and returns freshly drawn standard-normal noise scaled by a
/// fixed factor, so the output carries no learned structure.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticDenoiser {
    scale: f32,
}

impl SyntheticDenoiser {
    pub const SCALE: f32 = 0.1;
}

impl Denoiser for SyntheticDenoiser {
    fn estimate_noise(
        &self,
        _timestep: usize,
        sample: ArrayView3<'_, f32>,
        rng: &mut impl Rng,
    ) -> Array3<f32> {
        let noise =
            Array3::<f32>::from_shape_simple_fn(sample.dim(), || rng.sample(StandardNormal));
        noise * self.scale
    }
}

impl Default for SyntheticDenoiser {
    fn default() -> Self {
        Self { scale: Self::SCALE }
    }
}

#[cfg(test)]
mod test {
    use ndarray::Array3;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn estimate_is_scaled_normal_noise_of_sample_shape() {
        let sample = Array3::<f32>::zeros((3, 5, 3));
        let mut rng = StdRng::seed_from_u64(1);
        let estimate = SyntheticDenoiser::default().estimate_noise(0, sample.view(), &mut rng);

        let mut rng = StdRng::seed_from_u64(1);
        let expected = Array3::<f32>::from_shape_simple_fn((3, 5, 3), || {
            rng.sample::<f32, _>(StandardNormal) * 0.1
        });
        assert_eq!(estimate.dim(), (3, 5, 3));
        assert_eq!(estimate, expected);
    }
}
