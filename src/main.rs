// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qr-scanner")]
#[command(about = "Live QR code scanner with latest-frame scheduling")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode QR codes from image files
    Scan {
        /// Image files to decode
        images: Vec<PathBuf>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Feed an image through the scheduler at camera rate
    ///
    /// Demonstrates the latest-wins drop policy: frames are produced faster
    /// than they decode, and the scheduler skips the stale ones.
    Stream {
        /// Image file to replay as the frame source
        input: PathBuf,

        /// Frames per second to produce
        #[arg(short, long)]
        fps: Option<u32>,

        /// Stop after this many seconds (default: run until Ctrl-C)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_scanner=trace, RUST_LOG=info
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
        Commands::Scan { images, config } => cli::scan_images(&images, config.as_deref()).await,
        Commands::Stream {
            input,
            fps,
            duration,
            config,
        } => cli::stream_file(&input, fps, duration, config.as_deref()).await,
    }
}
