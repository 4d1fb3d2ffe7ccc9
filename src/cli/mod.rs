//! Command-line parsing for the listing price estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the encoding/inference code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::BrandEncoding;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "price", version, about = "Vehicle listing price estimator")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Directory holding the artifact bundle (`manifest.json` and friends).
    #[arg(long, global = true, env = "PRICE_ARTIFACTS_DIR", default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Year that listing age is measured against (defaults to the current year).
    #[arg(long, global = true, env = "PRICE_REFERENCE_YEAR")]
    pub reference_year: Option<i32>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Estimate the price of one listing and print the response JSON.
    Estimate(EstimateArgs),
    /// Estimate every listing in a CSV file.
    Batch(BatchArgs),
    /// Describe the artifact bundle.
    Inspect,
    /// Write a synthetic artifact bundle (and optionally sample listings).
    Synth(SynthArgs),
}

/// Where the request body comes from. Reads stdin when neither is given.
#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    /// Request body as inline JSON.
    #[arg(long, value_name = "BODY", conflicts_with = "input")]
    pub json: Option<String>,

    /// File containing the request body.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Listings CSV (`brand,model,year,mileage,...`, optional `id`).
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Export per-listing results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Number of rows to show in the terminal table.
    #[arg(long, default_value_t = 20)]
    pub show: usize,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Output directory for the bundle.
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of trees.
    #[arg(long, default_value_t = 50)]
    pub trees: usize,

    /// Maximum tree depth.
    #[arg(long, default_value_t = 4)]
    pub depth: usize,

    /// How `brand` enters the feature vector.
    #[arg(long, value_enum, default_value_t = BrandEncoding::OneHot)]
    pub brand_encoding: BrandEncoding,

    /// Also write this many sample listings to `<DIR>/listings.csv`.
    #[arg(long, value_name = "N")]
    pub listings: Option<usize>,
}
