//! `flashpack` command-line tool
//!
//! Builds images from a directory tree and inspects existing images.
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `warn`).

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use flashpack::{Compression, Filesystem};
use std::io::Write;
use std::path::PathBuf;

mod inspect;
mod pack;

#[derive(Parser)]
#[command(
    name = "flashpack",
    about = "Build and inspect flashpack read-only filesystem images",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory tree into an image
    Pack {
        /// Directory to pack
        input: PathBuf,

        /// Image file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Codec to try on each file; kept only where it saves space
        #[arg(short, long, value_enum, default_value = "none")]
        compress: Codec,
    },

    /// Show the image header
    Info {
        /// Image file
        image: PathBuf,
    },

    /// List a directory
    Ls {
        /// Image file
        image: PathBuf,

        /// Directory inside the image
        #[arg(default_value = "/")]
        path: String,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Show entry metadata
    Stat {
        /// Image file
        image: PathBuf,

        /// Entry inside the image
        path: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Write a file's contents to stdout
    Cat {
        /// Image file
        image: PathBuf,

        /// File inside the image
        path: String,

        /// Write the stored bytes without decompressing
        #[arg(long)]
        raw: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Codec {
    None,
    Deflate,
    Lz4,
}

impl From<Codec> for Compression {
    fn from(codec: Codec) -> Self {
        match codec {
            Codec::None => Self::None,
            Codec::Deflate => Self::Deflate,
            Codec::Lz4 => Self::Lz4,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Pack {
            input,
            output,
            compress,
        } => pack::run(&input, &output, compress.into(), &mut out)?,
        Commands::Info { image } => inspect::info(&Filesystem::mount(&image)?, &mut out)?,
        Commands::Ls {
            image,
            path,
            recursive,
        } => inspect::ls(&Filesystem::mount(&image)?, &path, recursive, &mut out)?,
        Commands::Stat { image, path, json } => {
            inspect::stat(&Filesystem::mount(&image)?, &path, json, &mut out)?;
        }
        Commands::Cat { image, path, raw } => {
            inspect::cat(&Filesystem::mount(&image)?, &path, raw, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
