//! Output artifacts: per-spec compile-commands documents and the cached
//! concretization of the tracing wrapper.

mod cache;
mod writer;

pub use cache::*;
pub use writer::*;

#[cfg(test)]
mod cache_test;
