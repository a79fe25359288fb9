//! NeuroOpositor core
//!
//! Layout and learning-path engine for a study dashboard:
//! - Force-directed 2D/3D layout of the topic graph
//! - Topic clusters by block and by connectivity
//! - Prerequisite ordering tolerant of cycles
//! - Priority scoring for optimal, reinforcement and exploration paths
//! - Per-user progress tracking and topic recommendations

pub mod engine;
pub mod graph;
pub mod paths;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::Result;
use graph::layout::{CircleSeeder, ForceParams, JitterSeeder, PositionSeeder};
use graph::models::Dimensions;
use serde::Deserialize;
use std::path::Path;

pub use engine::{CourseEngine, NeuroEngine};

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub layout: LayoutYamlConfig,
    pub paths: PathsYamlConfig,
}

/// Layout configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutYamlConfig {
    /// Largest graph accepted for one layout run
    pub max_nodes: usize,
    /// Overrides the per-dimension preset iteration count
    pub iterations: Option<usize>,
    /// When set, unplaced topics are seeded randomly from this seed
    pub seed: Option<u64>,
    /// Radius used to seed unplaced topics
    pub circle_radius: f64,
}

impl Default for LayoutYamlConfig {
    fn default() -> Self {
        Self {
            max_nodes: 500,
            iterations: None,
            seed: None,
            circle_radius: 200.0,
        }
    }
}

/// Study path configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsYamlConfig {
    pub recommendation_limit: usize,
}

impl Default for PathsYamlConfig {
    fn default() -> Self {
        Self {
            recommendation_limit: paths::scoring::DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

// ============================================================================
// Runtime config (what the engine actually uses)
// ============================================================================

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub max_nodes: usize,
    pub layout_iterations: Option<usize>,
    pub layout_seed: Option<u64>,
    pub circle_radius: f64,
    pub recommendation_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_yaml(YamlConfig::default())
    }
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "neuroopositor.yaml" in CWD. If the file
    /// doesn't exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        // 1. Load YAML config (or defaults if file not found)
        let mut config = Self::from_yaml(Self::load_yaml(yaml_path));

        // 2. Env var overrides
        if let Some(max_nodes) = env_parse("NEURO_MAX_NODES") {
            config.max_nodes = max_nodes;
        }
        if let Some(iterations) = env_parse("NEURO_LAYOUT_ITERATIONS") {
            config.layout_iterations = Some(iterations);
        }
        if let Some(seed) = env_parse("NEURO_LAYOUT_SEED") {
            config.layout_seed = Some(seed);
        }
        if let Some(limit) = env_parse("NEURO_RECOMMENDATION_LIMIT") {
            config.recommendation_limit = limit;
        }
        Ok(config)
    }

    fn from_yaml(yaml: YamlConfig) -> Self {
        let mut circle_radius = yaml.layout.circle_radius;
        if !(circle_radius.is_finite() && circle_radius > 0.0) {
            let fallback = LayoutYamlConfig::default().circle_radius;
            tracing::warn!(
                "Invalid layout.circle_radius {}. Using {}.",
                circle_radius,
                fallback
            );
            circle_radius = fallback;
        }

        Self {
            max_nodes: yaml.layout.max_nodes,
            layout_iterations: yaml.layout.iterations,
            layout_seed: yaml.layout.seed,
            circle_radius,
            recommendation_limit: yaml.paths.recommendation_limit,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("neuroopositor.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Force parameters for a layout space, with configured overrides applied.
    pub fn force_params(&self, dimensions: Dimensions) -> ForceParams {
        let mut params = ForceParams::preset(dimensions);
        params.max_nodes = self.max_nodes;
        if let Some(iterations) = self.layout_iterations {
            params.iterations = iterations;
        }
        params
    }

    /// Seeder for topics without a stored position.
    pub fn seeder(&self) -> Box<dyn PositionSeeder> {
        match self.layout_seed {
            Some(seed) => Box::new(JitterSeeder {
                seed,
                radius: self.circle_radius,
            }),
            None => Box::new(CircleSeeder {
                radius: self.circle_radius,
            }),
        }
    }
}

fn env_parse<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

// ============================================================================
// Tests
// ============================================================================
