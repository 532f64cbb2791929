//! Orchestration of whole trace attempts: wrapper concretization and
//! caching, ad hoc spec tracing, and environment tracing.

mod command;
mod tracer;

pub use command::*;
pub use tracer::*;
