use ndarray::Array1;

use crate::config::{check_schedule_params, ConfigurationError};

/// Linear beta schedule with its derived alphas and cumulative alphas.
///
/// Every `alpha_bar` of a successfully built schedule is finite and strictly
/// positive, and the sequence never increases.
#[derive(Debug, Clone)]
pub struct NoiseSchedule {
    betas: Array1<f32>,
    alphas: Array1<f32>,
    alphas_cumprod: Array1<f32>,
}

impl NoiseSchedule {
    pub fn linear(
        timesteps: usize,
        beta_min: f32,
        beta_max: f32,
    ) -> Result<Self, ConfigurationError> {
        check_schedule_params(timesteps, beta_min, beta_max)?;

        let start = f64::from(beta_min);
        let span = f64::from(beta_max) - start;
        let last = timesteps.saturating_sub(1).max(1) as f64;
        let betas: Array1<f32> = (0..timesteps)
            .map(|i| ((start + span * (i as f64 / last)) as f32).clamp(beta_min, beta_max))
            .collect();

        let alphas = betas.mapv(|b| 1. - b);
        let alphas_cumprod: Array1<f32> = alphas
            .iter()
            .scan(1.0, |state, &x| {
                *state *= x;
                Some(*state)
            })
            .collect();

        if let Some(t) = alphas_cumprod.iter().position(|&x| x <= 0.) {
            return Err(ConfigurationError::DegenerateSchedule(t));
        }

        tracing::debug!(
            timesteps,
            beta_min,
            beta_max,
            final_alpha_bar = alphas_cumprod[timesteps - 1],
            "built linear noise schedule"
        );

        Ok(Self {
            betas,
            alphas,
            alphas_cumprod,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.betas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.betas.is_empty()
    }

    pub fn betas(&self) -> &Array1<f32> {
        &self.betas
    }

    pub fn alphas(&self) -> &Array1<f32> {
        &self.alphas
    }

    pub fn alphas_cumprod(&self) -> &Array1<f32> {
        &self.alphas_cumprod
    }

    #[inline]
    pub fn alpha_bar(&self, timestep: usize) -> Option<f32> {
        self.alphas_cumprod.get(timestep).copied()
    }

    #[cfg(test)]
    pub(crate) fn from_cumprod(alphas_cumprod: Array1<f32>) -> Self {
        Self {
            betas: alphas_cumprod.mapv(|_| 0.),
            alphas: alphas_cumprod.mapv(|_| 1.),
            alphas_cumprod,
        }
    }
}
