//! Asset manifest and sprite image registry.
//!
//! The manifest declares which sprite keys exist, the idle and walk frame
//! paths of each, the layer draw order and the default loadout. The catalog
//! pairs it with the images that actually loaded. Missing entries are normal:
//! lookups return `None` and the compositor degrades to a placeholder.
//!
//! Loading is a bounded fan-out over every declared frame path behind a single
//! barrier (see [`AssetCatalog::preload`]); one slow or broken sprite never
//! blocks startup and never fails it.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use crossbeam_channel::unbounded;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resources::remote::{AssetSource, FetchError};

/// Layer order used when the manifest does not declare one.
pub const DEFAULT_LAYERS: [&str; 4] = ["base", "head", "mainhand", "offhand"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("manifest unavailable: {0}")]
    Fetch(#[from] FetchError),
    #[error("manifest is not valid JSON: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Frame sequences of one sprite key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrames {
    #[serde(default)]
    pub idle: Vec<String>,
    #[serde(default)]
    pub walk: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestDefaults {
    #[serde(default)]
    pub appearance: Option<FxHashMap<String, String>>,
    #[serde(default)]
    pub equipment: Option<FxHashMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMeta {
    #[serde(default, rename = "walkFps")]
    pub walk_fps: Option<f64>,
}

/// Parsed asset manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default)]
    pub sprites: FxHashMap<String, SpriteFrames>,
    #[serde(default)]
    pub layers: Option<Vec<String>>,
    #[serde(default)]
    pub defaults: ManifestDefaults,
    #[serde(default)]
    pub meta: ManifestMeta,
}

impl AssetManifest {
    pub fn from_json(json: &str) -> Result<Self, AssetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every non-empty frame path, deduplicated, in a stable order.
    pub fn frame_paths(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut keys: Vec<&String> = self.sprites.keys().collect();
        keys.sort();
        let mut paths = Vec::new();
        for key in keys {
            let frames = &self.sprites[key];
            let walk = frames.walk.iter().flatten();
            for path in frames.idle.iter().chain(walk) {
                if !path.is_empty() && seen.insert(path.clone()) {
                    paths.push(path.clone());
                }
            }
        }
        paths
    }

    /// Length of the longest walk sequence declared by any sprite.
    pub fn longest_walk(&self) -> usize {
        self.sprites
            .values()
            .filter_map(|frames| frames.walk.as_ref().map(Vec::len))
            .max()
            .unwrap_or(0)
    }
}

/// A decoded sprite frame. The encoded bytes are kept for the frontend, which
/// uploads them to the GPU lazily.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteImage {
    pub width: u32,
    pub height: u32,
    pub encoded: Arc<[u8]>,
}

impl SpriteImage {
    pub fn new(width: u32, height: u32, encoded: impl Into<Arc<[u8]>>) -> Self {
        SpriteImage {
            width,
            height,
            encoded: encoded.into(),
        }
    }

    /// Decode and validate image bytes.
    pub fn decode(bytes: Vec<u8>) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(&bytes)?;
        Ok(SpriteImage::new(decoded.width(), decoded.height(), bytes))
    }
}

/// Loaded manifest plus every sprite frame that decoded successfully.
#[derive(Resource, Debug, Clone, Default)]
pub struct AssetCatalog {
    manifest: Option<Arc<AssetManifest>>,
    images: FxHashMap<String, SpriteImage>,
}

impl AssetCatalog {
    /// Catalog with no manifest: everything renders as placeholders.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_manifest(manifest: AssetManifest) -> Self {
        AssetCatalog {
            manifest: Some(Arc::new(manifest)),
            images: FxHashMap::default(),
        }
    }

    pub fn manifest(&self) -> Option<&AssetManifest> {
        self.manifest.as_deref()
    }

    pub fn insert(&mut self, path: impl Into<String>, image: SpriteImage) {
        self.images.insert(path.into(), image);
    }

    pub fn image(&self, path: &str) -> Option<&SpriteImage> {
        self.images.get(path)
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Layer names in draw order.
    pub fn layers(&self) -> Vec<&str> {
        match self.manifest().and_then(|m| m.layers.as_ref()) {
            Some(layers) => layers.iter().map(String::as_str).collect(),
            None => DEFAULT_LAYERS.to_vec(),
        }
    }

    /// Load the manifest and every frame it declares.
    ///
    /// At most `workers` loads run at once. The call returns only after every
    /// attempted load settled; failures are logged and leave the path absent.
    /// A missing or malformed manifest yields an empty catalog.
    pub fn preload(source: &dyn AssetSource, workers: usize) -> Self {
        let manifest = match source
            .manifest()
            .map_err(AssetError::from)
            .and_then(|json| AssetManifest::from_json(&json))
        {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Asset manifest missing; using rectangles. ({})", e);
                return AssetCatalog::empty();
            }
        };

        let paths = manifest.frame_paths();
        let mut catalog = AssetCatalog::with_manifest(manifest);
        if paths.is_empty() {
            return catalog;
        }

        let total = paths.len();
        let (tx_path, rx_path) = unbounded::<String>();
        let (tx_done, rx_done) = unbounded::<(String, Result<SpriteImage, AssetError>)>();
        for path in paths {
            let _ = tx_path.send(path);
        }
        drop(tx_path);

        std::thread::scope(|scope| {
            for _ in 0..workers.clamp(1, total) {
                let rx_path = rx_path.clone();
                let tx_done = tx_done.clone();
                scope.spawn(move || {
                    for path in rx_path.iter() {
                        let result = source
                            .image(&path)
                            .map_err(AssetError::from)
                            .and_then(SpriteImage::decode);
                        let _ = tx_done.send((path, result));
                    }
                });
            }
        });
        drop(tx_done);

        for (path, result) in rx_done.iter() {
            match result {
                Ok(image) => catalog.insert(path, image),
                Err(e) => debug!("sprite '{}' unavailable: {}", path, e),
            }
        }
        info!("Loaded {}/{} sprite frames", catalog.image_count(), total);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct MemorySource {
        manifest: Option<String>,
        images: FxHashMap<String, Vec<u8>>,
    }

    impl AssetSource for MemorySource {
        fn manifest(&self) -> Result<String, FetchError> {
            self.manifest
                .clone()
                .ok_or_else(|| FetchError::Rejected("no manifest".into()))
        }

        fn image(&self, path: &str) -> Result<Vec<u8>, FetchError> {
            self.images
                .get(path)
                .cloned()
                .ok_or_else(|| FetchError::Rejected(format!("404 {}", path)))
        }
    }

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::new(w, h);
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    const MANIFEST: &str = r#"{
        "sprites": {
            "base/default": {"idle": ["b/i0.png"], "walk": ["b/w0.png", "b/w1.png", ""]},
            "head/hat": {"idle": ["h/i0.png", "b/i0.png"]}
        },
        "layers": ["base", "head"],
        "meta": {"walkFps": 10}
    }"#;

    #[test]
    fn manifest_fields_are_all_optional() {
        let manifest = AssetManifest::from_json("{}").unwrap();
        assert!(manifest.sprites.is_empty());
        assert!(manifest.layers.is_none());
        assert!(manifest.meta.walk_fps.is_none());
        assert_eq!(manifest.longest_walk(), 0);
    }

    #[test]
    fn frame_paths_skip_empty_and_duplicates() {
        let manifest = AssetManifest::from_json(MANIFEST).unwrap();
        let paths = manifest.frame_paths();
        assert_eq!(paths, vec!["b/i0.png", "b/w0.png", "b/w1.png", "h/i0.png"]);
        assert_eq!(manifest.longest_walk(), 3);
    }

    #[test]
    fn default_layer_order_without_manifest() {
        assert_eq!(
            AssetCatalog::empty().layers(),
            vec!["base", "head", "mainhand", "offhand"]
        );
    }

    #[test]
    fn preload_tolerates_missing_and_undecodable_images() {
        let mut images = FxHashMap::default();
        images.insert("b/i0.png".to_string(), png_bytes(4, 4));
        images.insert("b/w0.png".to_string(), b"not a png".to_vec());
        images.insert("h/i0.png".to_string(), png_bytes(2, 3));
        let source = MemorySource {
            manifest: Some(MANIFEST.to_string()),
            images,
        };

        let catalog = AssetCatalog::preload(&source, 2);
        assert_eq!(catalog.image_count(), 2);
        assert!(catalog.image("b/w0.png").is_none());
        assert!(catalog.image("b/w1.png").is_none());
        let hat = catalog.image("h/i0.png").unwrap();
        assert_eq!((hat.width, hat.height), (2, 3));
        assert_eq!(catalog.layers(), vec!["base", "head"]);
    }

    #[test]
    fn preload_without_manifest_is_empty() {
        let source = MemorySource {
            manifest: None,
            images: FxHashMap::default(),
        };
        let catalog = AssetCatalog::preload(&source, 4);
        assert!(catalog.manifest().is_none());
        assert_eq!(catalog.image_count(), 0);
    }

    #[test]
    fn preload_with_malformed_manifest_is_empty() {
        let source = MemorySource {
            manifest: Some("{ not json".to_string()),
            images: FxHashMap::default(),
        };
        assert!(AssetCatalog::preload(&source, 4).manifest().is_none());
    }
}
