//! Dovetail quadrant splitter.
//!
//! # Commands
//!
//! - `dovetail split <input.stl> -o parts.zip` - Split into four parts
//! - `dovetail preview <input.stl> [--json out.json]` - Show the cutting paths
//! - `dovetail check <input.stl>` - Report whether a mesh can be split
//!
//! Parameters come from `dovetail.toml` in the working directory (or the
//! file given with `--config`), overridden by command-line flags.

mod commands;
mod options;
mod progress;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::options::ParamArgs;

/// Split a mesh into four printable quadrants joined by dovetails.
#[derive(Parser)]
#[command(name = "dovetail")]
#[command(about = "Split meshes into dovetailed quadrants", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Parameter file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a mesh and write the four parts as a ZIP archive
    Split {
        /// Input STL file
        input: PathBuf,

        /// Output archive
        #[arg(short, long, default_value = "parts.zip")]
        output: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Lay out the cutting paths without cutting
    Preview {
        /// Input STL file
        input: PathBuf,

        /// Write the paths as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Validate a mesh and report whether it can be split
    Check {
        /// Input STL file
        input: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Split { input, output, params } => commands::split(&input, &output, &params.resolve(config)?),
        Commands::Preview { input, json, params } => {
            commands::preview(&input, json.as_deref(), &params.resolve(config)?)
        }
        Commands::Check { input, params } => commands::check(&input, &params.resolve(config)?),
    }
}
