use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::dsp::params::CompressorParams;

// =============================================================================
// FACTORY PRESETS
// =============================================================================

pub const DEFAULT_PRESET: &str = "Default";

/// One named factory snapshot. Fields missing from the JSON fall back to
/// `CompressorParams::default()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub params: CompressorParams,
}

#[derive(Debug)]
pub struct PresetManager {
    presets: BTreeMap<String, CompressorParams>,
}

impl PresetManager {
    /// Load presets from baked-in JSON. This is fallible but non-fatal.
    /// Returns a manager holding only the default preset if parsing fails.
    pub fn new() -> Self {
        Self::from_json(include_str!("../presets.json"))
    }

    /// Parse a preset table. Entries that fail validation are skipped.
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<BTreeMap<String, CompressorParams>>(json) {
            Ok(parsed) => {
                let mut presets = BTreeMap::new();
                for (name, params) in parsed {
                    match params.validate() {
                        Ok(()) => {
                            presets.insert(name, params);
                        }
                        Err(err) => log::warn!("skipping preset '{}': {}", name, err),
                    }
                }
                presets
                    .entry(DEFAULT_PRESET.to_string())
                    .or_insert_with(CompressorParams::default);
                Self { presets }
            }
            Err(err) => {
                log::warn!("factory presets unreadable, using defaults: {}", err);
                Self::default()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&CompressorParams> {
        self.presets.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.presets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Preset> + '_ {
        self.presets.iter().map(|(name, params)| Preset {
            name: name.clone(),
            params: *params,
        })
    }
}

impl Default for PresetManager {
    fn default() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert(DEFAULT_PRESET.to_string(), CompressorParams::default());
        Self { presets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::detector::StereoTopology;
    use crate::dsp::engine::CompressorMode;

    #[test]
    fn test_factory_presets_load() {
        let manager = PresetManager::new();
        assert!(manager.len() >= 6);
        assert!(manager.get(DEFAULT_PRESET).is_some());

        let drums = manager.get("JFET All Buttons Drums").expect("factory preset");
        assert_eq!(drums.mode, CompressorMode::Jfet);
        assert!(drums.all_buttons);

        let ms = manager.get("Mid/Side Master").expect("factory preset");
        assert_eq!(ms.topology, StereoTopology::MidSide { linked: false });
    }

    #[test]
    fn test_every_factory_preset_is_valid() {
        for preset in PresetManager::new().iter() {
            assert!(preset.params.validate().is_ok(), "{}", preset.name);
        }
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let manager = PresetManager::from_json("{ not json");
        assert_eq!(manager.len(), 1);
        assert!(manager.get(DEFAULT_PRESET).is_some());
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let manager = PresetManager::from_json(r#"{ "Broken": { "ratio": -1.0 }, "Ok": {} }"#);
        assert!(manager.get("Broken").is_none());
        assert!(manager.get("Ok").is_some());
        assert!(manager.names().any(|n| n == DEFAULT_PRESET));
    }
}
