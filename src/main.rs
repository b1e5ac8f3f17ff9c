// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use frame_beauty::config::{ComputeBackend, GraphVariant};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "frame-beauty")]
#[command(about = "Face beautification for video frames")]
#[command(version = frame_beauty::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the GPU adapter the pipeline would use
    Info {
        /// Compute backend to probe
        #[arg(short, long, value_enum, default_value = "auto")]
        backend: ComputeBackend,
    },

    /// Beautify one image
    Process {
        /// Input image (any format the image crate reads)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Graph variant (overrides the config)
        #[arg(long, value_enum)]
        variant: Option<GraphVariant>,

        /// Compute backend (overrides the config)
        #[arg(long, value_enum)]
        backend: Option<ComputeBackend>,

        #[command(flatten)]
        levels: cli::LevelArgs,
    },

    /// Write a synthetic test face
    Synth {
        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// Edge length in pixels (rounded down to even)
        #[arg(short, long, default_value = "256")]
        size: u32,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=frame_beauty=trace, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { backend } => cli::show_info(backend),
        Commands::Process {
            input,
            output,
            config,
            variant,
            backend,
            levels,
        } => cli::process_image(&input, &output, config, variant, backend, &levels),
        Commands::Synth { output, size } => cli::write_synthetic(&output, size),
    }
}
