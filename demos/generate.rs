use std::env;
use std::error::Error as StdError;
use std::fs;

use noisegarden::{GenerationRequest, Sampler, SamplerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn StdError>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("noisegarden=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // usage: generate [seed] [config.json]
    let mut args = env::args().skip(1);
    let seed = args.next().map(|s| s.parse()).transpose()?;
    let config = match args.next() {
        Some(path) => SamplerConfig::open(path)?,
        None => SamplerConfig::default(),
    };

    let sampler = Sampler::new(config)?;
    let mut request = GenerationRequest::default().with_prompt("a field of static");
    if let Some(seed) = seed {
        request = request.with_seed(seed);
    }

    let generation = request.execute(&sampler)?;
    let path = format!("{}.png", generation.seed);
    fs::write(&path, &generation.png)?;

    println!("seed {} -> {path}", generation.seed);
    println!("{}", serde_json::to_string(&generation)?);
    Ok(())
}
