//! Filesystem helpers: path normalization, the protected-path predicate, and
//! structure-preserving copies.

pub mod copy;
pub mod paths;

pub use copy::copy_path;
pub use paths::{is_protected, normalize_rel, PROTECTED};
