// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand, ValueEnum};
use frame_engine::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "frame-engine")]
#[command(about = "Encode camera frames and detect barcodes in them")]
#[command(version = app_info::version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the frame comes from
#[derive(Args)]
struct InputArgs {
    /// Image file (png, jpg, bmp) or raw pixel dump
    #[arg(short, long)]
    input: PathBuf,

    /// Raw input width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Raw input height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Raw input pixel format (NV12, YUY2, RGBA, GREY, ...)
    #[arg(long)]
    format: Option<String>,

    /// Raw input row stride in bytes (default: tightly packed)
    #[arg(long)]
    stride: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Encoding {
    Jpeg,
    Png,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a frame to JPEG or PNG
    Capture {
        #[command(flatten)]
        input: InputArgs,

        /// Output encoding
        #[arg(short, long, value_enum, default_value = "jpeg")]
        encoding: Encoding,

        /// JPEG quality from 0.0 to 1.0
        #[arg(short, long, default_value = "0.5")]
        quality: f32,

        /// Write the encoded image to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the base64 payload
        #[arg(long)]
        base64: bool,
    },

    /// Detect barcodes in a frame and print them as JSON
    Detect {
        #[command(flatten)]
        input: InputArgs,

        /// Comma-separated barcode formats (QRCode, Ean13, Code128, ...)
        #[arg(short, long, value_delimiter = ',', default_value = "QRCode")]
        formats: Vec<String>,

        /// More scan lines and rotated passes
        #[arg(long)]
        accurate: bool,

        /// Scan quadrants and a center region separately
        #[arg(long)]
        quadrant: bool,

        /// Report every barcode instead of stopping at the first
        #[arg(long)]
        multiple: bool,

        /// Engine config file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=frame_engine=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Capture {
            input,
            encoding,
            quality,
            output,
            base64,
        } => {
            let source = cli::load_input(&input.into())?;
            let options = match encoding {
                Encoding::Jpeg => frame_engine::CaptureOptions::jpeg(quality),
                Encoding::Png => frame_engine::CaptureOptions::png(),
            };
            cli::capture(&source, &options, output, base64)
        }
        Commands::Detect {
            input,
            formats,
            accurate,
            quadrant,
            multiple,
            config,
        } => {
            let source = cli::load_input(&input.into())?;
            let options = frame_engine::DetectionOptions {
                accurate,
                read_by_quadrant: quadrant,
                read_multiple: multiple,
            };
            cli::detect(&source, &formats, &options, config)
        }
    }
}

impl From<InputArgs> for cli::InputSpec {
    fn from(args: InputArgs) -> Self {
        cli::InputSpec {
            path: args.input,
            width: args.width,
            height: args.height,
            format: args.format,
            stride: args.stride,
        }
    }
}
