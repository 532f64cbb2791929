use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_MAX_MESSAGE_SIZE;
use crate::constants::DEFAULT_QUEUE_DEPTH;
use crate::constants::TERMINAL_PAYLOAD;
use crate::Error;
use crate::Result;

/// Parameters of the named message queue carrying trace events.
///
/// Capacity values are fixed at queue creation and read back by every
/// attaching process; they cannot change for the life of the name.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChannelConfig {
    /// Queue names are `/{name_prefix}-{session id}`; the per-session
    /// suffix is what allows concurrent trace sessions without caller
    /// serialization.
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,

    /// Maximum queued, unread messages. Chosen generously so producer
    /// stalls on a full queue stay irrelevant, but a full queue is an
    /// intentional backpressure point, not an error.
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,

    /// Maximum payload size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: i64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            max_depth: default_max_depth(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl ChannelConfig {
    /// Validates channel configuration consistency
    /// # Errors
    /// Returns `Error::InvalidConfig` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.name_prefix.is_empty() || self.name_prefix.contains('/') {
            return Err(Error::InvalidConfig(
                "channel.name_prefix must be non-empty and contain no '/'".into(),
            ));
        }
        if self.max_depth <= 0 {
            return Err(Error::InvalidConfig(
                "channel.max_depth must be positive".into(),
            ));
        }
        if self.max_message_size <= 0 {
            return Err(Error::InvalidConfig(
                "channel.max_message_size must be positive".into(),
            ));
        }
        if (self.max_message_size as usize) < TERMINAL_PAYLOAD.len() {
            return Err(Error::InvalidConfig(
                "channel.max_message_size cannot be smaller than the terminal sentinel".into(),
            ));
        }
        Ok(())
    }
}

fn default_name_prefix() -> String {
    "cctrace".to_string()
}

fn default_max_depth() -> i64 {
    DEFAULT_QUEUE_DEPTH
}

fn default_max_message_size() -> i64 {
    DEFAULT_MAX_MESSAGE_SIZE
}
