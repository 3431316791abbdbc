//! GitHub Releases client for pack distribution.
//!
//! One release per pack version, tagged with the manifest version. The
//! "latest" release carries `manifest.json` and the archive as assets.
//! Publishing is idempotent: re-publishing a tag reuses the release and
//! replaces its assets.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::config::Settings;
use crate::pack::manifest::{Manifest, ARCHIVE_NAME, MANIFEST_NAME};
use crate::remote::secret::TokenProvider;
use crate::transfer::progress::{format_bytes, EventSink, ProgressGate};
use crate::utils::errors::{PackError, Result};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("minepack/", env!("CARGO_PKG_VERSION"));

/// A GitHub release, reduced to the fields the client touches.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub upload_url: String,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub url: String,
    pub browser_download_url: String,
}

pub struct GithubClient {
    owner: String,
    repo: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl GithubClient {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, token: Option<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            token,
            http: reqwest::Client::new(),
        }
    }

    /// Build a client from persisted settings and the credential boundary.
    pub fn from_settings(settings: &Settings, secrets: &dyn TokenProvider) -> Self {
        Self::new(
            settings.repo_owner.clone(),
            settings.repo_name.clone(),
            secrets.token(),
        )
    }

    /// Attach the standard GitHub API headers and bearer auth when a token is
    /// present.
    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.headers(api_headers());
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn repo_url(&self, tail: &str) -> String {
        format!("{}/repos/{}/{}/{}", API_BASE, self.owner, self.repo, tail)
    }

    /// Latest published release of the pack repository.
    pub async fn latest_release(&self) -> Result<Release> {
        let resp = self
            .auth(self.http.get(self.repo_url("releases/latest")))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Fetch and deserialize `manifest.json` from the latest release.
    pub async fn get_latest_manifest(&self) -> Result<Manifest> {
        let release = self.latest_release().await?;
        let asset = find_asset(&release, MANIFEST_NAME)?;
        let resp = self
            .auth(self.http.get(&asset.browser_download_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Stream a named asset of the latest release into `dest_dir/<name>`,
    /// reporting byte-level progress when the size is known.
    pub async fn download_asset(
        &self,
        name: &str,
        dest_dir: &Path,
        sink: &mut dyn EventSink,
    ) -> Result<PathBuf> {
        use futures_util::StreamExt;

        let release = self.latest_release().await?;
        let asset = find_asset(&release, name)?;

        tokio::fs::create_dir_all(dest_dir).await?;
        let out_path = dest_dir.join(name);

        let resp = self
            .auth(self.http.get(&asset.browser_download_url))
            .send()
            .await?
            .error_for_status()?;
        let total = resp.content_length().unwrap_or(0);

        let mut gate = ProgressGate::new();
        let mut file = tokio::fs::File::create(&out_path).await?;
        let mut stream = resp.bytes_stream();
        let mut read: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            read += chunk.len() as u64;
            if total > 0 {
                gate.report(sink, read as f64 / total as f64);
            }
        }
        file.flush().await?;
        gate.report(sink, 1.0);

        debug!("downloaded {} ({})", name, format_bytes(read));
        Ok(out_path)
    }

    /// Publish a built pack: ensure a release exists for the manifest version
    /// and upload `manifest.json` plus the archive, replacing existing assets.
    /// Returns the release tag.
    pub async fn publish(
        &self,
        manifest_path: &Path,
        archive_path: &Path,
        sink: &mut dyn EventSink,
    ) -> Result<String> {
        if self.token.is_none() {
            return Err(PackError::AuthRequired);
        }

        let mut gate = ProgressGate::new();
        gate.report(sink, 0.02);

        let manifest = Manifest::load(manifest_path)?;
        let tag = if manifest.version.is_empty() {
            Manifest::timestamp_version()
        } else {
            manifest.version.clone()
        };
        sink.log(&format!("[RELEASE] Tag: {}", tag));
        gate.report(sink, 0.10);

        let release = match self.release_by_tag(&tag).await? {
            Some(release) => {
                sink.log("[RELEASE] Using existing release (will replace assets).");
                release
            }
            None => {
                let release = self.create_release(&tag).await?;
                sink.log("[RELEASE] Created new release.");
                release
            }
        };

        sink.log(&format!("[UPLOAD] {}", MANIFEST_NAME));
        self.upload_asset(&release, manifest_path, MANIFEST_NAME, "application/octet-stream")
            .await?;
        gate.report(sink, 0.35);

        sink.log(&format!("[UPLOAD] {}", ARCHIVE_NAME));
        self.upload_asset(&release, archive_path, ARCHIVE_NAME, "application/zip")
            .await?;

        sink.log("[DONE] Published.");
        gate.report(sink, 1.0);
        Ok(tag)
    }

    async fn release_by_tag(&self, tag: &str) -> Result<Option<Release>> {
        let resp = self
            .auth(self.http.get(self.repo_url(&format!("releases/tags/{}", tag))))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(resp.error_for_status()?.json().await?))
    }

    async fn create_release(&self, tag: &str) -> Result<Release> {
        let payload = serde_json::json!({
            "tag_name": tag,
            "name": format!("Pack v{}", tag),
            "body": "",
            "draft": false,
            "prerelease": false,
        });
        let resp = self
            .auth(self.http.post(self.repo_url("releases")))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Upload one file as a release asset. A 422 `already_exists` response
    /// deletes the existing asset and retries once, which is what makes a
    /// retried publish under the same tag idempotent.
    async fn upload_asset(
        &self,
        release: &Release,
        path: &Path,
        name: &str,
        content_type: &'static str,
    ) -> Result<()> {
        let url = asset_upload_url(&release.upload_url, name);
        let bytes = tokio::fs::read(path).await?;

        let resp = self
            .auth(self.http.post(&url))
            .header(CONTENT_TYPE, content_type)
            .body(bytes.clone())
            .send()
            .await?;

        if resp.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let text = resp.text().await.unwrap_or_default();
            if !text.contains("already_exists") {
                return Err(PackError::Config(format!(
                    "asset upload rejected for {}: {}",
                    name, text
                )));
            }
            info!("asset {} already exists, replacing", name);
            self.delete_asset_by_name(&release.tag_name, name).await?;
            self.auth(self.http.post(&url))
                .header(CONTENT_TYPE, content_type)
                .body(bytes)
                .send()
                .await?
                .error_for_status()?;
            return Ok(());
        }

        resp.error_for_status()?;
        Ok(())
    }

    async fn delete_asset_by_name(&self, tag: &str, name: &str) -> Result<()> {
        let release = self
            .release_by_tag(tag)
            .await?
            .ok_or_else(|| PackError::AssetNotFound(name.to_string()))?;
        let asset = find_asset(&release, name)?;
        self.auth(self.http.delete(&asset.url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

fn api_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert(
        "X-GitHub-Api-Version",
        HeaderValue::from_static("2022-11-28"),
    );
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_static(USER_AGENT),
    );
    headers
}

fn find_asset<'a>(release: &'a Release, name: &str) -> Result<&'a ReleaseAsset> {
    release
        .assets
        .iter()
        .find(|a| a.name == name)
        .ok_or_else(|| PackError::AssetNotFound(name.to_string()))
}

/// Resolve GitHub's upload URL template (`.../assets{?name,label}`) for a
/// concrete asset name.
fn asset_upload_url(template: &str, name: &str) -> String {
    let base = template.split('{').next().unwrap_or(template);
    format!("{}?name={}", base, name)
}
