//! Where manifests, sprites and viewports come from.
//!
//! The overlay only cares about the parsed shapes, so transport is hidden
//! behind two small traits. [`HttpApi`] talks to the game server's HTTP
//! endpoints; [`DirAssets`] reads a local asset directory for offline demo
//! runs.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::resources::viewport::Viewport;

/// Failure to retrieve a remote or local resource.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("rejected payload: {0}")]
    Rejected(String),
}

/// Source of the asset manifest and sprite image bytes.
pub trait AssetSource: Send + Sync {
    /// Raw manifest JSON.
    fn manifest(&self) -> Result<String, FetchError>;
    /// Encoded image bytes for a manifest frame path.
    fn image(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Source of viewport windows around a world coordinate.
pub trait ViewportSource: Send + Sync {
    fn viewport(&self, x: i32, y: i32, radius: u32) -> Result<Viewport, FetchError>;
}

/// Blocking HTTP client for the game server's REST endpoints.
pub struct HttpApi {
    base: String,
    client: reqwest::blocking::Client,
}

impl HttpApi {
    pub fn new(base: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(HttpApi {
            base: base.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn get(&self, path: &str) -> Result<reqwest::blocking::Response, FetchError> {
        let url = format!("{}/{}", self.base, path.trim_start_matches('/'));
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response)
    }
}

impl AssetSource for HttpApi {
    fn manifest(&self) -> Result<String, FetchError> {
        Ok(self.get("api/assets/manifest")?.text()?)
    }

    fn image(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self.get(&format!("assets/{}", path))?.bytes()?.to_vec())
    }
}

impl ViewportSource for HttpApi {
    fn viewport(&self, x: i32, y: i32, radius: u32) -> Result<Viewport, FetchError> {
        let body = self
            .get(&format!("api/viewport?x={}&y={}&r={}", x, y, radius))?
            .text()?;
        let viewport: Viewport = serde_json::from_str(&body)?;
        viewport.validate().map_err(FetchError::Rejected)?;
        Ok(viewport)
    }
}

/// Asset source backed by a local directory holding `manifest.json` and the
/// frame paths it declares.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirAssets { root: root.into() }
    }
}

impl AssetSource for DirAssets {
    fn manifest(&self) -> Result<String, FetchError> {
        Ok(std::fs::read_to_string(self.root.join("manifest.json"))?)
    }

    fn image(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        Ok(std::fs::read(self.root.join(path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_assets_reads_manifest_and_reports_missing_images() {
        let root = std::env::temp_dir().join(format!("rpgoverlay_dir_{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("manifest.json"), "{}").unwrap();

        let source = DirAssets::new(&root);
        assert_eq!(source.manifest().unwrap(), "{}");
        assert!(matches!(source.image("nope.png"), Err(FetchError::Io(_))));

        std::fs::remove_dir_all(&root).ok();
    }
}
