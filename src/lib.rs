//! # cctrace
//!
//! Compile-command tracing for package builds.
//!
//! A build orchestrator compiles sources through short-lived compiler
//! wrapper processes. cctrace observes those invocations without patching
//! the orchestrator: it substitutes an instrumented wrapper into the
//! dependency graph of the spec under trace, opens a named, priority-ordered
//! message queue, and collects one event per compiler invocation while the
//! build runs. When the build finishes, a terminal event sent below every
//! data event's priority closes the session deterministically, and the
//! collected events become a `compile_commands.json` document per traced
//! spec.
//!
//! ## Pipeline
//!
//! - **channel**: the named POSIX message queue transport
//! - **protocol**: the event wire format and decode policies
//! - **collector**: one session's lifecycle and the termination handshake
//! - **graph**: concretized specs and the wrapper substitution operation
//! - **trace**: orchestration of whole trace attempts
//! - **output**: document writing and the wrapper concretization cache
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use cctrace::AbstractSpec;
//! use cctrace::Settings;
//! use cctrace::Tracer;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> cctrace::Result<()> {
//!     let settings = Settings::load(None)?;
//!     let tracer = Tracer::new(settings, resolver, installer, CancellationToken::new());
//!     tracer.trace_specs(&[AbstractSpec::new("zlib@1.3")]).await?;
//!     Ok(())
//! }
//! ```

mod channel;
mod collector;
mod config;
mod constants;
mod errors;
mod graph;
mod output;
mod protocol;
mod trace;

pub mod utils;

pub use channel::*;
pub use collector::*;
pub use config::*;
pub use errors::*;
pub use graph::*;
pub use output::*;
pub use protocol::*;
pub use trace::*;
