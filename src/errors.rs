//! Trace Session Error Hierarchy
//!
//! Defines error types for the compile-command tracing pipeline,
//! categorized by transport, session, decoding and graph-surgery concerns.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use ::config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Named message-queue transport failures
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// Trace-session lifecycle failures (driver start, abandonment, interrupt)
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Wire-format decoding failures
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Dependency-graph substitution failures
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),

    /// Infrastructure-level failures (filesystem, serialization)
    #[error(transparent)]
    System(#[from] SystemError),

    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid configuration values caught by validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Unrecoverable failures requiring the trace attempt to abort
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failures of the named POSIX message queue used as the trace transport.
///
/// Queue setup errors (`AlreadyExists`, `PermissionDenied`, `ResourceLimit`)
/// are fatal to the whole trace attempt: they fire before any build
/// subprocess starts.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A queue with this name already exists. A stale queue from a prior
    /// session is a fatal setup error; orphaned queues are never adopted.
    #[error("Message queue '{0}' already exists")]
    AlreadyExists(String),

    /// Attach-side open of a queue that was never created or already unlinked
    #[error("Message queue '{0}' does not exist")]
    NotFound(String),

    #[error("Permission denied for message queue '{0}'")]
    PermissionDenied(String),

    /// Kernel queue limits exhausted (ENOSPC / EMFILE / ENFILE)
    #[error("Resource limit reached creating message queue '{0}'")]
    ResourceLimit(String),

    /// Payload exceeds the capacity negotiated at queue creation
    #[error("Payload of {size} bytes exceeds queue maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Queue full on send, or empty on a nonblocking receive
    #[error("Message queue operation would block")]
    WouldBlock,

    /// Descriptor already closed or unlinked out from under this handle
    #[error("Message queue descriptor is closed")]
    Closed,

    #[error("Message queue I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures of one trace session's lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The build-driving subprocess could not be started
    #[error("Failed to start build driver: {0}")]
    DriverStartFailed(String),

    /// The build-driving subprocess ran but reported failure. The session
    /// still terminates cleanly through the terminal event.
    #[error("Build driver failed: {0}")]
    DriverFailed(String),

    /// The driver finished without ever sending the terminal event.
    /// The session is bounded by a grace deadline instead of hanging.
    #[error("Build driver abandoned the session: no terminal event within {waited:?}")]
    DriverAbandoned { waited: Duration },

    /// External interrupt while draining; the channel was still unlinked
    #[error("Trace session interrupted")]
    Interrupted,
}

/// Failures decoding one raw trace message. These are logged and skipped by
/// the session, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The envelope did not split into exactly four colon-delimited fields
    #[error("Malformed trace message: expected 4 fields, found {fields}")]
    Malformed { fields: usize },

    #[error("Trace message payload is not valid UTF-8")]
    NotUtf8,
}

/// Failures of the compiler-wrapper substitution operation.
///
/// Fatal only to that node's trace attempt; other nodes in a multi-node
/// session proceed independently.
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    /// The node has no dependency edge satisfying the compiler-wrapper role
    #[error("Spec '{spec}' has no compiler-wrapper dependency edge")]
    MissingWrapperEdge { spec: String },

    /// More than one compiler-wrapper edge; never picks one silently
    #[error("Spec '{spec}' has {count} compiler-wrapper dependency edges")]
    AmbiguousWrapperEdge { spec: String, count: usize },

    /// Environment swap target not present in the concretized lists
    #[error("Spec '{spec}' is not a concretized member of the environment")]
    SpecNotInEnvironment { spec: String },

    /// Restore attempted with a swap record the environment no longer matches
    #[error("Environment no longer contains the substituted spec '{spec}'")]
    StaleSwap { spec: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
