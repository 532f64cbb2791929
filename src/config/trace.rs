use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Trace-session behavior: artifact locations, wrapper-spec caching, and
/// the liveness bound applied when a build driver abandons its terminal
/// handshake.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TraceConfig {
    /// Where the source checkouts of ad hoc traced specs live
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    /// Where the concretized tracing-wrapper spec is cached
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Disable the wrapper cache entirely when false
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// How long after the driver subprocess finishes to keep waiting for
    /// the terminal event before declaring the session abandoned
    #[serde(default = "default_driver_grace_timeout_ms")]
    pub driver_grace_timeout_ms: u64,

    /// Whether an environment substitution is undone after the trace
    #[serde(default = "default_restore_environment")]
    pub restore_environment: bool,

    /// Log directory for the binary's file appender
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            cache_dir: default_cache_dir(),
            use_cache: default_use_cache(),
            driver_grace_timeout_ms: default_driver_grace_timeout_ms(),
            restore_environment: default_restore_environment(),
            log_dir: default_log_dir(),
        }
    }
}

impl TraceConfig {
    pub fn driver_grace_timeout(&self) -> Duration {
        Duration::from_millis(self.driver_grace_timeout_ms)
    }

    /// Validates trace configuration consistency
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.driver_grace_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "trace.driver_grace_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }
}

fn default_source_root() -> PathBuf {
    PathBuf::from("sources")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".trace-cache")
}

fn default_use_cache() -> bool {
    true
}

fn default_driver_grace_timeout_ms() -> u64 {
    5000
}

fn default_restore_environment() -> bool {
    true
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
