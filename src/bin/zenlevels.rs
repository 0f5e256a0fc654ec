//! Command-line interface for zenlevels
//!
//! Usage: zenlevels [OPTIONS] <INPUT> <LEVELS> <OUTPUT>
//!
//! Reduces a PGM image to LEVELS gray levels and saves it.
//! Example: `zenlevels lena.pgm 4 lena_4.pgm`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use zenlevels::pgm::{PgmEncoding, PgmImage, load_pgm, save_pgm};
use zenlevels::{LevelConfig, Strategy, quantize_levels};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Minimum squared error (dynamic program)
    Exact,
    /// Equal-population bins (fast, approximate)
    Uniform,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    /// Same encoding as the input
    Keep,
    Ascii,
    Binary,
}

#[derive(Parser)]
#[command(
    name = "zenlevels",
    version,
    about = "Reduce a grayscale PGM image to k levels with minimum squared error"
)]
struct Cli {
    /// Input PGM image (P2 or P5)
    input: PathBuf,
    /// Number of output gray levels
    levels: usize,
    /// Output PGM image
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = StrategyArg::Exact)]
    strategy: StrategyArg,
    #[arg(long, value_enum, default_value_t = EncodingArg::Keep)]
    encoding: EncodingArg,
}

fn run(cli: &Cli) -> Result<()> {
    let image = load_pgm(&cli.input)
        .with_context(|| format!("error while loading input image '{}'", cli.input.display()))?;
    info!(
        "loaded {}x{} image, max value {}",
        image.width(),
        image.height(),
        image.max_value
    );

    let strategy = match cli.strategy {
        StrategyArg::Exact => Strategy::ExactDp,
        StrategyArg::Uniform => Strategy::UniformHeuristic,
    };
    let config = LevelConfig::new().levels(cli.levels).strategy(strategy);
    let result = quantize_levels(image.pixels.as_ref(), image.max_value, &config)
        .context("error while computing the reduction")?;
    println!("Compression error: {}", result.error());

    let encoding = match cli.encoding {
        EncodingArg::Keep => image.encoding,
        EncodingArg::Ascii => PgmEncoding::Ascii,
        EncodingArg::Binary => PgmEncoding::Binary,
    };
    let output = PgmImage {
        encoding,
        max_value: image.max_value,
        pixels: result.into_image(),
    };
    save_pgm(&cli.output, &output)
        .with_context(|| format!("error while saving output image in '{}'", cli.output.display()))?;
    info!("saved {}", cli.output.display());

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Aborting; {e:#}");
            ExitCode::FAILURE
        }
    }
}
