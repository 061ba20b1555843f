use std::time::Instant;

use rand::Rng;

use super::{Generation, PipelineError, Sampler};
use crate::codec::{self, OutputFormat};
use crate::denoiser::Denoiser;
use crate::schedulers::Scheduler;

/// A single gallery submission: optional prompt, seed and step count.
///
/// The prompt does not influence synthesis; it is carried through to the
/// [`Generation`] record for display.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub seed: Option<u64>,
    pub steps: Option<usize>,
}

impl GenerationRequest {
    /// Upper bound (inclusive) of seeds picked for requests that don't supply one.
    pub const MAX_RANDOM_SEED: u64 = 1_000_000;

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }

    fn resolve_seed(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..=Self::MAX_RANDOM_SEED))
    }

    pub fn execute<S, D>(&self, sampler: &Sampler<S, D>) -> Result<Generation, PipelineError>
    where
        S: Scheduler,
        D: Denoiser,
    {
        let seed = self.resolve_seed();
        let steps = self.steps.unwrap_or(sampler.config().default_steps);

        let now = Instant::now();
        let sample = sampler.generate_seeded(seed, steps)?;
        let image = codec::encode(sample.view())?;
        let png = image.to_bytes(OutputFormat::Png)?;

        tracing::info!(
            seed,
            steps,
            bytes = png.len(),
            elapsed = now.elapsed().as_secs_f32(),
            "generation finished"
        );

        Ok(Generation {
            seed,
            prompt: self.prompt.clone(),
            steps,
            width: image.width(),
            height: image.height(),
            image,
            png,
        })
    }
}

#[cfg(test)]
mod test {
    use image::{GenericImageView, ImageFormat};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{ConfigurationError, SamplerConfig};

    #[test]
    fn gallery_configuration_produces_decodable_png() {
        let sampler = Sampler::new(SamplerConfig::default()).unwrap();
        let generation = GenerationRequest::default()
            .with_prompt("a quiet lake")
            .with_seed(42)
            .with_steps(50)
            .execute(&sampler)
            .unwrap();

        assert_eq!(generation.seed, 42);
        assert_eq!(generation.prompt, "a quiet lake");
        assert_eq!((generation.width, generation.height), (128, 128));
        assert!(!generation.png.is_empty());

        let decoded =
            image::load_from_memory_with_format(&generation.png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (128, 128));
    }

    #[test]
    fn output_bytes_depend_only_on_seed() {
        let sampler = Sampler::new(SamplerConfig::default()).unwrap();
        let run = |seed| {
            GenerationRequest::default()
                .with_seed(seed)
                .execute(&sampler)
                .unwrap()
                .png
        };

        assert_eq!(run(42), run(42));
        assert_ne!(run(42), run(43));
    }

    #[test]
    fn missing_seed_is_resolved_and_reported() {
        let sampler = Sampler::new(SamplerConfig::default().with_image_size(4)).unwrap();
        let generation = GenerationRequest::default()
            .with_steps(2)
            .execute(&sampler)
            .unwrap();
        assert!(generation.seed <= GenerationRequest::MAX_RANDOM_SEED);

        let replay = GenerationRequest::default()
            .with_seed(generation.seed)
            .with_steps(2)
            .execute(&sampler)
            .unwrap();
        assert_eq!(replay.png, generation.png);
    }

    #[test]
    fn default_steps_come_from_config() {
        let config = SamplerConfig::default()
            .with_image_size(4)
            .with_default_steps(7);
        let sampler = Sampler::new(config).unwrap();
        let generation = GenerationRequest::default()
            .with_seed(1)
            .execute(&sampler)
            .unwrap();
        assert_eq!(generation.steps, 7);
    }

    #[test]
    fn invalid_step_count_yields_no_image() {
        let sampler = Sampler::new(SamplerConfig::default().with_image_size(4)).unwrap();
        let result = GenerationRequest::default()
            .with_seed(1)
            .with_steps(500)
            .execute(&sampler);
        assert!(matches!(
            result,
            Err(PipelineError::Configuration(
                ConfigurationError::InvalidSteps { steps: 500, .. }
            ))
        ));
    }

    #[test]
    fn record_serializes_metadata_only() {
        let sampler = Sampler::new(SamplerConfig::default().with_image_size(4)).unwrap();
        let generation = GenerationRequest::default()
            .with_prompt("dunes")
            .with_seed(9)
            .with_steps(3)
            .execute(&sampler)
            .unwrap();

        let json = serde_json::to_value(&generation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "seed": 9,
                "prompt": "dunes",
                "steps": 3,
                "width": 4,
                "height": 4,
            })
        );
    }
}
