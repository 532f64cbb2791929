use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// The external build-driver command the binary runs under a trace
/// session. The session's queue name is exported to the subprocess through
/// `queue_env_var` so transitively spawned compiler wrappers can attach by
/// name.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriverConfig {
    /// Command and arguments, e.g. `["make", "-j8"]`
    #[serde(default)]
    pub command: Vec<String>,

    /// Working directory for the command (inherited when unset)
    #[serde(default)]
    pub working_dir: Option<PathBuf>,

    /// Environment variable carrying the queue name into the build
    #[serde(default = "default_queue_env_var")]
    pub queue_env_var: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            working_dir: None,
            queue_env_var: default_queue_env_var(),
        }
    }
}

fn default_queue_env_var() -> String {
    "CCTRACE_MQ".to_string()
}
