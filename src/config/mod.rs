//! Configuration management for the tracer.
//!
//! Hierarchical loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional TOML config file
//! 3. Environment variables with the `CCTRACE_` prefix (highest priority)

mod channel;
mod driver;
mod trace;

pub use channel::*;
pub use driver::*;
pub use trace::*;

#[cfg(test)]
mod config_test;

use ::config::Config;
use ::config::Environment;
use ::config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Settings {
    /// Named message-queue transport parameters
    #[serde(default)]
    pub channel: ChannelConfig,
    /// Trace-session behavior (paths, cache, liveness bound)
    #[serde(default)]
    pub trace: TraceConfig,
    /// External build-driver command run by the binary
    #[serde(default)]
    pub driver: DriverConfig,
}

impl Settings {
    /// Load configuration from an optional TOML file overlaid with
    /// `CCTRACE_` environment variables.
    ///
    /// # Arguments
    /// * `config_path` - Optional path to a TOML configuration file
    ///
    /// # Returns
    /// Merged, validated configuration
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("CCTRACE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.channel.validate()?;
        self.trace.validate()?;
        Ok(())
    }
}
