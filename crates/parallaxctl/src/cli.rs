//! CLI - command-line argument parsing.
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parallax CLI
#[derive(Parser)]
#[command(name = "parallaxctl")]
#[command(about = "Parallax - active viewpoint agent for spatial relations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to config file (overrides $PARALLAX_CONFIG and defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run one estimation episode against a directory of rendered frames
    Run {
        /// Central (reference) object name
        central: String,

        /// Target object name
        target: String,

        /// Directory of pre-rendered frames (overrides config)
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Scene id used in frame file names (overrides config)
        #[arg(long)]
        scene: Option<String>,

        /// Step budget (overrides config)
        #[arg(long)]
        max_steps: Option<usize>,

        /// Jittered repeats per step (overrides config)
        #[arg(long)]
        jitter: Option<usize>,

        /// Per-axis stop threshold on the top posterior probability
        #[arg(long)]
        tau: Option<f64>,

        /// RNG seed for reproducible jitter
        #[arg(long)]
        seed: Option<u64>,

        /// Ground-truth tuple to score the final answer against,
        /// e.g. "(+X, -Y, 0Z)"
        #[arg(long)]
        expect: Option<String>,

        /// Output JSON only
        #[arg(long)]
        json: bool,
    },

    /// Judge a single rendered view without running the loop
    Judge {
        /// Image file to judge
        image: PathBuf,

        /// Central (reference) object name
        central: String,

        /// Target object name
        target: String,

        /// Axes to focus on, e.g. "XY"
        #[arg(long, default_value = "XYZ")]
        axes: String,
    },

    /// Print the effective configuration
    Config {
        /// Output JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}
