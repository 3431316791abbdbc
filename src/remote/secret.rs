//! Credential boundary for the remote artifact store.
//!
//! The crate only needs an opaque bearer token. Front ends with an
//! OS-encrypted store (DPAPI, keychain) implement [`TokenProvider`] on top of
//! it; the environment variable works everywhere and takes precedence in the
//! original tool, so it is the default here too.

/// Supplies the bearer credential for GitHub API calls, if one is available.
pub trait TokenProvider {
    fn token(&self) -> Option<String>;
}

/// Reads the token from the `GITHUB_TOKEN` environment variable.
pub struct EnvTokenProvider;

impl TokenProvider for EnvTokenProvider {
    fn token(&self) -> Option<String> {
        std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}
