//! The trace collector: owns one session's channel lifetime
//! (create -> poll -> unlink) and the termination handshake with the
//! build-driving subprocess.

mod driver;
mod session;

pub use driver::*;
pub use session::*;
