use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::effects::{EffectInstance, EffectType};
use crate::error::{CoreError, Result};

/// Version written into preset files. Bump on breaking shape changes.
pub const CURRENT_PRESET_VERSION: &str = "1.0.0";
/// Oldest preset file version this build can still read.
pub const MIN_SUPPORTED_PRESET_VERSION: &str = "1.0.0";

/// A named, reusable effect chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectPreset {
    pub name: String,
    pub description: String,
    pub category: String,
    pub effects: Vec<EffectInstance>,
    /// Built-in presets ship with the library and cannot be removed.
    #[serde(default)]
    pub builtin: bool,
}

/// The user's preset collection plus favorites, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PresetLibrary {
    presets: Vec<EffectPreset>,
    favorites: Vec<String>,
}

/// On-disk envelope: the library plus a version field checked on load.
#[derive(Serialize, Deserialize)]
struct PresetFile {
    version: String,
    library: PresetLibrary,
}

impl PresetLibrary {
    /// An empty library with no presets at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A library holding the built-in presets.
    pub fn with_builtins() -> Self {
        Self {
            presets: builtin_presets(),
            favorites: Vec::new(),
        }
    }

    /// Add a preset, replacing any existing preset with the same name.
    /// Fails if the name belongs to a built-in preset.
    pub fn add(&mut self, preset: EffectPreset) -> Result<()> {
        if let Some(existing) = self.presets.iter_mut().find(|p| p.name == preset.name) {
            if existing.builtin {
                return Err(CoreError::BuiltinPresetImmutable(preset.name));
            }
            *existing = preset;
        } else {
            self.presets.push(preset);
        }
        Ok(())
    }

    /// Remove a preset by name. Built-in presets cannot be removed.
    pub fn remove(&mut self, name: &str) -> Result<EffectPreset> {
        let idx = self
            .presets
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| CoreError::PresetNotFound(name.to_string()))?;
        if self.presets[idx].builtin {
            return Err(CoreError::BuiltinPresetImmutable(name.to_string()));
        }
        self.favorites.retain(|f| f != name);
        Ok(self.presets.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&EffectPreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    pub fn presets(&self) -> &[EffectPreset] {
        &self.presets
    }

    /// Distinct categories in first-appearance order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for preset in &self.presets {
            if !out.contains(&preset.category.as_str()) {
                out.push(&preset.category);
            }
        }
        out
    }

    /// Toggle a preset's favorite flag; returns the new state.
    pub fn toggle_favorite(&mut self, name: &str) -> Result<bool> {
        if self.get(name).is_none() {
            return Err(CoreError::PresetNotFound(name.to_string()));
        }
        if let Some(idx) = self.favorites.iter().position(|f| f == name) {
            self.favorites.remove(idx);
            Ok(false)
        } else {
            self.favorites.push(name.to_string());
            Ok(true)
        }
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.favorites.iter().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = PresetFile {
            version: CURRENT_PRESET_VERSION.to_string(),
            library: self.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;

        // Check the version before deserializing the full shape, so a file
        // from a newer build fails with a version error instead of a parse
        // error.
        let raw: serde_json::Value = serde_json::from_str(&json)?;
        let version = raw
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| CoreError::InvalidPresetFile("missing version field".to_string()))?;
        let got = parse_version(version)?;
        let max = parse_version(CURRENT_PRESET_VERSION)?;
        let min = parse_version(MIN_SUPPORTED_PRESET_VERSION)?;
        if got > max {
            return Err(CoreError::VersionTooNew {
                got: version.to_string(),
                max: CURRENT_PRESET_VERSION.to_string(),
            });
        }
        if got < min {
            return Err(CoreError::VersionTooOld {
                got: version.to_string(),
                min: MIN_SUPPORTED_PRESET_VERSION.to_string(),
            });
        }

        let file: PresetFile = serde_json::from_str(&json)?;
        let mut library = file.library;
        library.restore_builtins();
        Ok(library)
    }

    /// Re-insert any built-in preset a stale or hand-edited file dropped,
    /// and keep the built-in flag authoritative for shipped names.
    fn restore_builtins(&mut self) {
        for builtin in builtin_presets() {
            match self.presets.iter_mut().find(|p| p.name == builtin.name) {
                Some(existing) => existing.builtin = true,
                None => self.presets.push(builtin),
            }
        }
    }
}

fn parse_version(version: &str) -> Result<semver::Version> {
    semver::Version::parse(version)
        .map_err(|e| CoreError::InvalidPresetFile(format!("bad version `{version}`: {e}")))
}

fn intensity_effect(effect_type: EffectType, intensity: f64) -> EffectInstance {
    let mut effect = EffectInstance::new(effect_type);
    effect.set_float("intensity", intensity);
    effect
}

fn builtin_presets() -> Vec<EffectPreset> {
    vec![
        EffectPreset {
            name: "Monochrome".to_string(),
            description: "Classic black and white with boosted contrast".to_string(),
            category: "Black & White".to_string(),
            effects: vec![
                intensity_effect(EffectType::Grayscale, 100.0),
                intensity_effect(EffectType::Contrast, 120.0),
            ],
            builtin: true,
        },
        EffectPreset {
            name: "Vintage".to_string(),
            description: "Warm, slightly faded retro tones".to_string(),
            category: "Retro".to_string(),
            effects: vec![
                intensity_effect(EffectType::Sepia, 80.0),
                intensity_effect(EffectType::Brightness, 90.0),
                intensity_effect(EffectType::Saturate, 85.0),
            ],
            builtin: true,
        },
        EffectPreset {
            name: "Dreamy".to_string(),
            description: "Bright, soft, dream-like look".to_string(),
            category: "Artistic".to_string(),
            effects: vec![
                intensity_effect(EffectType::Brightness, 110.0),
                intensity_effect(EffectType::Blur, 20.0),
                intensity_effect(EffectType::Saturate, 120.0),
            ],
            builtin: true,
        },
        EffectPreset {
            name: "Cinematic".to_string(),
            description: "Film-grade contrast and muted color".to_string(),
            category: "Film".to_string(),
            effects: vec![
                intensity_effect(EffectType::Contrast, 115.0),
                intensity_effect(EffectType::Brightness, 95.0),
                intensity_effect(EffectType::Saturate, 90.0),
            ],
            builtin: true,
        },
    ]
}
