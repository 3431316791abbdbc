//! Minepack Library
//!
//! Manifest-driven pack sync for Minecraft installations: package a selected
//! subset of the client directory into a checksummed zip, publish it as a
//! GitHub release asset, and apply published packs to other installations
//! with backup and rollback material.

pub mod config;
pub mod fs;
pub mod pack;
pub mod remote;
pub mod sync;
pub mod transfer;
pub mod update;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use pack::manifest::Manifest;
pub use transfer::progress::{EventSink, NullSink};
pub use utils::errors::PackError;
pub type Result<T> = std::result::Result<T, PackError>;
