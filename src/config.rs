use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Directory where session reports are written
    pub output_dir: PathBuf,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("metrics"),
        }
    }
}

impl Config {
    /// Load configuration from an optional file, falling back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("metrics.output_dir", "metrics")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics: MetricsConfig::default(),
        }
    }
}
