//! Remote artifact store: GitHub Releases plumbing and the credential
//! boundary.

pub mod github;
pub mod secret;

pub use github::GithubClient;
pub use secret::{EnvTokenProvider, TokenProvider};
