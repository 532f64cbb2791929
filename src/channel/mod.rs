//! Named, priority-ordered inter-process message queue used as the trace
//! transport.
//!
//! One long-lived collector reads; many short-lived compiler-wrapper
//! processes write. The queue must be named and kernel-namespace-visible
//! (not an in-process primitive) because the wrappers are spawned
//! transitively by the build orchestrator and can only attach by name.

mod mqueue;

pub use mqueue::*;
