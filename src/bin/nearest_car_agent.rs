//! Runs a simulation end to end with the nearest-car reference
//! controller, which dispatches each idle car to its nearest unserved
//! hall call or onboard destination.
use anyhow::{Context, Result};
use clap::Parser;
use elevator_sim::Config;
use elevator_sim::agents::NearestCarAgent;
use elevator_sim::{Backend, Controller};
use rand::SeedableRng;
use rand_pcg::Pcg64;

#[derive(Parser)]
struct Args {
    /// Path to a JSON config, as produced by `generate_scenario`. Falls
    /// back to the built-in default config if omitted.
    #[clap(long)]
    config: Option<String>,
    /// RNG seed for passenger spawning and slot selection.
    #[clap(long, default_value_t = 1)]
    seed: u64,
    /// Hard cap on fixed substeps, in case a config never ends.
    #[clap(long, default_value_t = 1_000_000)]
    max_steps: u64,
}

fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path))?;
            serde_json::from_str(&text).context("failed to parse config JSON")
        }
        None => Ok(Config::default()),
    }
}

const FIXED_DT: f64 = 1.0 / 60.0;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    config.validate().context("invalid configuration")?;

    let mut backend = Backend::initialize(config, Box::new(Pcg64::seed_from_u64(args.seed)))
        .context("failed to initialize backend")?;
    let mut controller: Box<dyn Controller> = Box::new(NearestCarAgent);

    let mut steps = 0u64;
    while !backend.is_challenge_ended() && steps < args.max_steps {
        backend.call_user_code(controller.as_mut(), FIXED_DT).await;
        backend.tick(FIXED_DT);
        steps += 1;
    }

    if !backend.is_challenge_ended() {
        log::warn!("hit max_steps ({}) before the challenge ended", args.max_steps);
    }
    backend.cleanup();

    println!("{}", serde_json::to_string_pretty(&backend.get_stats())?);
    Ok(())
}
