//! Service configuration.
//!
//! Loaded from TOML once at startup and handed to the engine by value — the
//! component roster it describes becomes the immutable predictor registry.
//!
//! ## Loading Order
//!
//! 1. `ROTORWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `rotorwatch.toml` in the current working directory
//! 3. Built-in defaults (the five-component extended deployment)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::{ComponentSpec, CutoffClassifier, PredictorRegistry};
use crate::types::{channels, LabelConvention};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("component roster is empty — at least one [[component]] is required")]
    EmptyRoster,

    #[error("component `{0}` declares an empty feature list")]
    EmptyFeatureList(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP bind address.
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// One monitored component: which channels its classifier consumes (order
/// matters), which label convention it emits, and the cutoff for the built-in
/// provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentConfig {
    pub name: String,
    pub features: Vec<String>,
    pub label_convention: LabelConvention,
    /// Unhealthy when the mean of the feature vector reaches this value.
    pub cutoff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub server: ServerConfig,
    #[serde(rename = "component")]
    pub components: Vec<ComponentConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        // The extended five-component deployment. The sound components
        // deliberately reuse the vibration axes alongside their own channel.
        let component = |name: &str, features: &[&str], cutoff: f64| ComponentConfig {
            name: name.to_string(),
            features: features.iter().map(|f| f.to_string()).collect(),
            label_convention: LabelConvention::BinaryCode,
            cutoff,
        };

        Self {
            server: ServerConfig::default(),
            components: vec![
                component(
                    "temperature",
                    &[channels::TEMPERATURE_ONE, channels::TEMPERATURE_TWO],
                    90.0,
                ),
                component(
                    "vibration",
                    &[channels::VIBRATION_X, channels::VIBRATION_Y, channels::VIBRATION_Z],
                    1.8,
                ),
                component(
                    "magnetic_flux",
                    &[
                        channels::MAGNETIC_FLUX_X,
                        channels::MAGNETIC_FLUX_Y,
                        channels::MAGNETIC_FLUX_Z,
                    ],
                    0.5,
                ),
                component(
                    "audible_sound",
                    &[
                        channels::VIBRATION_X,
                        channels::VIBRATION_Y,
                        channels::VIBRATION_Z,
                        channels::AUDIBLE_SOUND,
                    ],
                    1.5,
                ),
                component(
                    "ultra_sound",
                    &[
                        channels::VIBRATION_X,
                        channels::VIBRATION_Y,
                        channels::VIBRATION_Z,
                        channels::ULTRA_SOUND,
                    ],
                    1.5,
                ),
            ],
        }
    }
}

impl MonitorConfig {
    /// Resolve configuration: env var, local file, then built-in defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("ROTORWATCH_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded config from ROTORWATCH_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from ROTORWATCH_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "ROTORWATCH_CONFIG points to non-existent file, falling back");
            }
        }

        let local = PathBuf::from("rotorwatch.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded config from ./rotorwatch.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./rotorwatch.toml, using defaults");
                }
            }
        }

        info!("No rotorwatch.toml found — using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Build the immutable predictor registry from the component roster.
    pub fn build_registry(&self) -> Result<PredictorRegistry, ConfigError> {
        if self.components.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }

        let mut registry = PredictorRegistry::new();
        for c in &self.components {
            if c.features.is_empty() {
                return Err(ConfigError::EmptyFeatureList(c.name.clone()));
            }
            registry = registry.register(
                ComponentSpec {
                    name: c.name.clone(),
                    features: c.features.clone(),
                    convention: c.label_convention,
                },
                Arc::new(CutoffClassifier::new(c.cutoff, c.label_convention)),
            );
        }
        Ok(registry)
    }
}
