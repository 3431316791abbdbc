//! Utility modules for minepack.

pub mod errors;
pub mod logger;

pub use errors::{PackError, Result};
