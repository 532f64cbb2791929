//! Wire format of one trace event and the decoding of a raw session into
//! structured records.
//!
//! One event payload is `routing_key ":" working_directory ":" arguments
//! ":" mode`, with the argument vector joined by a control byte (BEL).
//! The layout is bit-exact interop with the instrumented compiler wrapper,
//! an external collaborator.

mod compile_commands;
mod message;

pub use compile_commands::*;
pub use message::*;

#[cfg(test)]
mod compile_commands_test;
#[cfg(test)]
mod message_test;
