//! Progress and narration plumbing shared by build, apply and remote
//! operations.

pub mod progress;

pub use progress::{EventSink, NullSink, ProgressGate};
