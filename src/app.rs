//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads the artifact bundle
//! - runs single or batch estimates
//! - prints reports and writes optional exports

use std::io::Read;
use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::artifacts::EncodingArtifacts;
use crate::cli::{BatchArgs, Cli, Command, EstimateArgs, GlobalArgs, SynthArgs};
use crate::data::{SyntheticConfig, generate_bundle, generate_listings};
use crate::domain::EstimatorConfig;
use crate::error::AppError;

pub mod pipeline;

/// File name of the sample listings written next to a synthetic bundle.
pub const SYNTH_LISTINGS_FILE: &str = "listings.csv";

/// Entry point for the `price` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Estimate(args) => handle_estimate(&cli.global, args),
        Command::Batch(args) => handle_batch(&cli.global, args),
        Command::Inspect => handle_inspect(&cli.global),
        Command::Synth(args) => handle_synth(&cli.global, args),
    }
}

/// Logs go to stderr; stdout is reserved for command output.
fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_price=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_estimate(global: &GlobalArgs, args: EstimateArgs) -> Result<(), AppError> {
    let estimator = pipeline::load_estimator(&global.artifacts, global.reference_year)?;
    let body = read_request_body(&args)?;

    // A failed estimate is still a successful run: the failure is in the response.
    let response = estimator.respond_json(&body);
    let text = serde_json::to_string(&response)
        .map_err(|e| AppError::new(4, format!("Failed to serialize response: {e}")))?;
    println!("{text}");
    Ok(())
}

fn read_request_body(args: &EstimateArgs) -> Result<String, AppError> {
    if let Some(body) = &args.json {
        return Ok(body.clone());
    }
    if let Some(path) = &args.input {
        return std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read request '{}': {e}", path.display())));
    }

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .map_err(|e| AppError::new(2, format!("Failed to read request from stdin: {e}")))?;
    Ok(body)
}

fn handle_batch(global: &GlobalArgs, args: BatchArgs) -> Result<(), AppError> {
    let estimator = pipeline::load_estimator(&global.artifacts, global.reference_year)?;
    let run = pipeline::run_batch_file(&estimator, &args.input)?;

    println!("{}", crate::report::format_batch_summary(&run.summary));
    if args.show > 0 {
        println!("{}", crate::report::format_outcomes_table(&run.outcomes, args.show));
    }
    for err in &run.ingest.row_errors {
        eprintln!("line {}: {}", err.line, err.message);
    }

    if let Some(path) = &args.export {
        crate::io::export::write_results_csv(path, &run.outcomes)?;
        info!(export = %path.display(), rows = run.outcomes.len(), "wrote results");
    }

    Ok(())
}

fn handle_inspect(global: &GlobalArgs) -> Result<(), AppError> {
    let artifacts = EncodingArtifacts::load(&global.artifacts)?;
    println!("{}", crate::report::format_bundle_summary(&artifacts));
    Ok(())
}

fn handle_synth(global: &GlobalArgs, args: SynthArgs) -> Result<(), AppError> {
    let config = SyntheticConfig {
        seed: args.seed,
        n_trees: args.trees,
        max_depth: args.depth,
        brand_encoding: args.brand_encoding,
        ..SyntheticConfig::default()
    };
    write_synthetic_bundle(&config, &args.out)?;

    // Validate what was written.
    let artifacts = EncodingArtifacts::load(&args.out)?;
    println!("{}", crate::report::format_bundle_summary(&artifacts));

    if let Some(n) = args.listings {
        let reference_year = global
            .reference_year
            .unwrap_or_else(|| EstimatorConfig::current().reference_year);
        let listings = generate_listings(args.seed.wrapping_add(1), n, reference_year)?;
        let path = args.out.join(SYNTH_LISTINGS_FILE);
        crate::io::export::write_listings_csv(&path, &listings)?;
        info!(listings = n, path = %path.display(), "wrote sample listings");
    }

    Ok(())
}

/// Generate a bundle from `config` and write it into `dir`.
pub fn write_synthetic_bundle(config: &SyntheticConfig, dir: &Path) -> Result<(), AppError> {
    let parts = generate_bundle(config)?;
    parts
        .write(dir)
        .map_err(|e| AppError::new(4, format!("Failed to write bundle: {e}")))?;
    info!(
        out = %dir.display(),
        seed = config.seed,
        trees = config.n_trees,
        brand_encoding = config.brand_encoding.display_name(),
        "wrote synthetic bundle"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BrandEncoding;

    #[test]
    fn synthetic_bundle_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = SyntheticConfig {
            brand_encoding: BrandEncoding::TargetMean,
            n_trees: 10,
            ..SyntheticConfig::default()
        };
        write_synthetic_bundle(&config, dir.path()).unwrap();

        let estimator = pipeline::load_estimator(dir.path(), Some(2025)).unwrap();
        assert_eq!(estimator.artifacts().forest().n_trees(), 10);
        assert!(estimator.artifacts().encoders().brand.is_some());

        let in_memory = EncodingArtifacts::from_parts(generate_bundle(&config).unwrap()).unwrap();
        let listings = generate_listings(3, 25, 2025).unwrap();
        let in_memory = crate::estimate::PriceEstimator::new(std::sync::Arc::new(in_memory), EstimatorConfig::new(2025));
        for raw in &listings {
            assert_eq!(estimator.respond(raw), in_memory.respond(raw));
        }
    }

    #[test]
    fn request_body_prefers_inline_json() {
        let args = EstimateArgs {
            json: Some("{\"brand\": \"Toyota\"}".to_string()),
            input: None,
        };
        assert_eq!(read_request_body(&args).unwrap(), "{\"brand\": \"Toyota\"}");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, "{}").unwrap();
        let args = EstimateArgs {
            json: None,
            input: Some(path),
        };
        assert_eq!(read_request_body(&args).unwrap(), "{}");
    }
}
