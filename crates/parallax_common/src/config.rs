//! Configuration for Parallax.
//!
//! Config file: `~/.config/parallax/config.toml`, overridable with
//! `$PARALLAX_CONFIG` or an explicit path. Every section and field has a
//! default, so a missing file is not an error.

use crate::belief::{BeliefOptions, ConfidenceModel, StopRule};
use crate::model::ModelConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunables of the control loop and the belief engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Posterior probability every axis must reach before stopping.
    pub tau: f64,
    /// Pseudo-count mass every axis must accumulate before stopping.
    pub kappa_min: f64,
    /// Step budget; reaching it is normal termination, not an error.
    pub max_steps: usize,
    /// Jittered repeats per step, on top of the canonical view.
    pub jitter_count: usize,
    /// Jitter radius in azimuth, degrees.
    pub jitter_az: f64,
    /// Jitter radius in elevation, degrees.
    pub jitter_el: f64,
    /// Dirichlet prior mass and Laplace smoothing constant.
    pub lambda: f64,
    /// Confidence sharpening exponent.
    pub gamma: f64,
    pub confidence: ConfidenceModel,
    pub stop_rule: StopRule,
    /// Fixed RNG seed for reproducible jitter; random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            tau: 0.9,
            kappa_min: 10.0,
            max_steps: 10,
            jitter_count: 4,
            jitter_az: 3.0,
            jitter_el: 3.0,
            lambda: 1.0,
            gamma: 1.0,
            confidence: ConfidenceModel::default(),
            stop_rule: StopRule::default(),
            seed: None,
        }
    }
}

impl AgentConfig {
    pub fn belief_options(&self) -> BeliefOptions {
        BeliefOptions {
            lambda: self.lambda,
            gamma: self.gamma,
            model: self.confidence,
            stop_rule: self.stop_rule,
        }
    }
}

/// Where the pre-rendered frames live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub frames_dir: PathBuf,
    pub object_id: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            frames_dir: PathBuf::from("./frames"),
            object_id: "scene".to_string(),
        }
    }
}

/// Top-level configuration: agent tunables plus one endpoint per model role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    pub agent: AgentConfig,
    pub planner: ModelConfig,
    pub perception: ModelConfig,
    pub scene: SceneConfig,
}

impl ParallaxConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Discover the config file path.
    ///
    /// Priority:
    /// 1. `$PARALLAX_CONFIG` (explicit override)
    /// 2. `$XDG_CONFIG_HOME/parallax/config.toml`
    /// 3. `~/.config/parallax/config.toml`
    pub fn discover_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PARALLAX_CONFIG") {
            return Some(PathBuf::from(path));
        }
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg_config).join("parallax/config.toml"));
        }
        if let Ok(home) = std::env::var("HOME") {
            return Some(PathBuf::from(home).join(".config/parallax/config.toml"));
        }
        None
    }

    /// Load from an explicit path, else from the discovered path if a file
    /// exists there, else defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::discover_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serializing config")
    }
}
