//! Equipment and appearance selection of the local character.
//!
//! Both maps go from layer name to sprite key. Equipment wins over appearance
//! when both name the same layer; an empty key counts as "nothing selected".

use bevy_ecs::prelude::Component;
use rustc_hash::FxHashMap;

use crate::resources::assetcatalog::AssetManifest;

/// Base appearance used when the manifest declares none.
pub const FALLBACK_BASE_KEY: &str = "base/default";

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Loadout {
    pub equipment: FxHashMap<String, String>,
    pub appearance: FxHashMap<String, String>,
}

impl Loadout {
    /// Start from the manifest's defaults, or a bare default body.
    pub fn from_manifest(manifest: Option<&AssetManifest>) -> Self {
        let defaults = manifest.map(|m| &m.defaults);
        let appearance = defaults
            .and_then(|d| d.appearance.clone())
            .unwrap_or_else(|| {
                let mut base = FxHashMap::default();
                base.insert("base".to_string(), FALLBACK_BASE_KEY.to_string());
                base
            });
        let equipment = defaults
            .and_then(|d| d.equipment.clone())
            .unwrap_or_default();
        Loadout {
            equipment,
            appearance,
        }
    }

    pub fn set_equipment(&mut self, layer: impl Into<String>, key: impl Into<String>) {
        self.equipment.insert(layer.into(), key.into());
    }

    pub fn set_appearance(&mut self, layer: impl Into<String>, key: impl Into<String>) {
        self.appearance.insert(layer.into(), key.into());
    }

    pub fn clear_equipment(&mut self, layer: &str) {
        self.equipment.remove(layer);
    }

    /// Sprite key drawn for `layer`, if any. The `base` layer always
    /// resolves, falling back to [`FALLBACK_BASE_KEY`].
    pub fn resolve(&self, layer: &str) -> Option<&str> {
        fn pick<'a>(map: &'a FxHashMap<String, String>, layer: &str) -> Option<&'a str> {
            map.get(layer)
                .map(String::as_str)
                .filter(|key| !key.is_empty())
        }
        pick(&self.equipment, layer)
            .or_else(|| pick(&self.appearance, layer))
            .or_else(|| (layer == "base").then_some(FALLBACK_BASE_KEY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_default_without_manifest() {
        let loadout = Loadout::from_manifest(None);
        assert_eq!(loadout.resolve("base"), Some(FALLBACK_BASE_KEY));
        assert_eq!(loadout.resolve("head"), None);
    }

    #[test]
    fn manifest_defaults_are_used() {
        let manifest = AssetManifest::from_json(
            r#"{"defaults":{"appearance":{"base":"base/elf"},"equipment":{"mainhand":"weapon/sword"}}}"#,
        )
        .unwrap();
        let loadout = Loadout::from_manifest(Some(&manifest));
        assert_eq!(loadout.resolve("base"), Some("base/elf"));
        assert_eq!(loadout.resolve("mainhand"), Some("weapon/sword"));
    }

    #[test]
    fn equipment_overrides_appearance() {
        let mut loadout = Loadout::from_manifest(None);
        loadout.set_appearance("head", "hair/short");
        loadout.set_equipment("head", "helm/iron");
        assert_eq!(loadout.resolve("head"), Some("helm/iron"));
        loadout.clear_equipment("head");
        assert_eq!(loadout.resolve("head"), Some("hair/short"));
    }

    #[test]
    fn empty_keys_count_as_absent() {
        let mut loadout = Loadout::from_manifest(None);
        loadout.set_appearance("head", "hair/short");
        loadout.set_equipment("head", "");
        assert_eq!(loadout.resolve("head"), Some("hair/short"));
        loadout.set_appearance("head", "");
        assert_eq!(loadout.resolve("head"), None);
    }

    #[test]
    fn base_falls_back_when_manifest_appearance_lacks_it() {
        let manifest =
            AssetManifest::from_json(r#"{"defaults":{"appearance":{"head":"hair/short"}}}"#)
                .unwrap();
        let loadout = Loadout::from_manifest(Some(&manifest));
        assert_eq!(loadout.resolve("base"), Some(FALLBACK_BASE_KEY));
        assert_eq!(loadout.resolve("head"), Some("hair/short"));
    }

    #[test]
    fn empty_base_falls_back_to_default_body() {
        let mut loadout = Loadout::from_manifest(None);
        loadout.set_appearance("base", "");
        assert_eq!(loadout.resolve("base"), Some(FALLBACK_BASE_KEY));
        loadout.set_equipment("base", "base/armored");
        assert_eq!(loadout.resolve("base"), Some("base/armored"));
    }
}
