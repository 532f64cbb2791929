//! Concretized dependency graph model and the compiler-wrapper
//! substitution operation.
//!
//! The graph itself is produced by an external resolver; this module only
//! consumes finished concrete specs, swaps one dependency edge target for
//! the instrumented wrapper, and keeps the routing-key index that maps
//! trace events back to the spec that produced them.

mod concretize;
mod environment;
mod spec;
mod substitute;

pub use concretize::*;
pub use environment::*;
pub use spec::*;
pub use substitute::*;

#[cfg(test)]
mod spec_test;
