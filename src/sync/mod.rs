//! Destructive-side operations: applying a pack to a live root and the
//! backup snapshots taken before anything is overwritten.

pub mod apply;
pub mod backup;

pub use apply::{apply_manifest, ApplyOptions};
pub use backup::{create_backup, prune_backups};
