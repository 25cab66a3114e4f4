use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// The type of effect applied to an image.
///
/// The set is closed: statically known effects dispatch exhaustively, and
/// only external string identifiers (via [`FromStr`]) can fail with
/// `UnknownEffect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectType {
    Sharpen,
    Emboss,
    Noise,
    Vignette,
    ColorSplit,
    Mosaic,
    ColorBalance,
    Tonemap,
    Grayscale,
    Sepia,
    Blur,
    Brightness,
    Contrast,
    Saturate,
}

impl EffectType {
    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sharpen => "Sharpen",
            Self::Emboss => "Emboss",
            Self::Noise => "Noise",
            Self::Vignette => "Vignette",
            Self::ColorSplit => "Color Split",
            Self::Mosaic => "Mosaic",
            Self::ColorBalance => "Color Balance",
            Self::Tonemap => "Tone Mapping",
            Self::Grayscale => "Grayscale",
            Self::Sepia => "Sepia",
            Self::Blur => "Blur",
            Self::Brightness => "Brightness",
            Self::Contrast => "Contrast",
            Self::Saturate => "Saturation",
        }
    }

    /// Stable string identifier, used for external dispatch and persisted
    /// parameter maps.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Sharpen => "sharpen",
            Self::Emboss => "emboss",
            Self::Noise => "noise",
            Self::Vignette => "vignette",
            Self::ColorSplit => "colorSplit",
            Self::Mosaic => "mosaic",
            Self::ColorBalance => "colorBalance",
            Self::Tonemap => "tonemap",
            Self::Grayscale => "grayscale",
            Self::Sepia => "sepia",
            Self::Blur => "blur",
            Self::Brightness => "brightness",
            Self::Contrast => "contrast",
            Self::Saturate => "saturate",
        }
    }

    /// Parameter definitions for this effect type.
    pub fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        match self {
            Self::Sharpen => vec![float("intensity", "Intensity", 50.0, 0.0, 100.0)],
            Self::Emboss => vec![
                float("intensity", "Intensity", 50.0, 0.0, 100.0),
                float("angle", "Angle", 45.0, 0.0, 360.0),
            ],
            Self::Noise => vec![
                float("amount", "Amount", 20.0, 0.0, 100.0),
                float("size", "Size", 1.0, 1.0, 10.0),
            ],
            Self::Vignette => vec![
                float("intensity", "Intensity", 50.0, 0.0, 100.0),
                float("size", "Size", 50.0, 0.0, 100.0),
            ],
            Self::ColorSplit => vec![
                float("amount", "Amount", 50.0, 0.0, 100.0),
                float("hue", "Hue", 180.0, 0.0, 360.0),
            ],
            Self::Mosaic => vec![float("size", "Size", 10.0, 1.0, 50.0)],
            Self::ColorBalance => vec![
                float("red", "Red", 0.0, -255.0, 255.0),
                float("green", "Green", 0.0, -255.0, 255.0),
                float("blue", "Blue", 0.0, -255.0, 255.0),
            ],
            Self::Tonemap => vec![
                float("exposure", "Exposure", 0.0, -100.0, 100.0),
                float("contrast", "Contrast", 0.0, -100.0, 100.0),
            ],
            Self::Grayscale => vec![float("intensity", "Intensity", 100.0, 0.0, 100.0)],
            Self::Sepia => vec![float("intensity", "Intensity", 100.0, 0.0, 100.0)],
            Self::Blur => vec![float("intensity", "Intensity", 100.0, 0.0, 100.0)],
            Self::Brightness => vec![float("intensity", "Intensity", 100.0, 0.0, 200.0)],
            Self::Contrast => vec![float("intensity", "Intensity", 100.0, 0.0, 200.0)],
            Self::Saturate => vec![float("intensity", "Intensity", 100.0, 0.0, 200.0)],
        }
    }

    /// All built-in effect types.
    pub fn all_builtin() -> Vec<EffectType> {
        vec![
            EffectType::Sharpen,
            EffectType::Emboss,
            EffectType::Noise,
            EffectType::Vignette,
            EffectType::ColorSplit,
            EffectType::Mosaic,
            EffectType::ColorBalance,
            EffectType::Tonemap,
            EffectType::Grayscale,
            EffectType::Sepia,
            EffectType::Blur,
            EffectType::Brightness,
            EffectType::Contrast,
            EffectType::Saturate,
        ]
    }
}

impl FromStr for EffectType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all_builtin()
            .into_iter()
            .find(|t| t.id() == s)
            .ok_or_else(|| CoreError::UnknownEffect(s.to_string()))
    }
}

fn float(name: &str, label: &str, default: f64, min: f64, max: f64) -> ParameterDefinition {
    ParameterDefinition {
        name: name.to_string(),
        label: label.to_string(),
        param_type: ParameterType::Float { default, min, max },
    }
}

/// The type of a parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterType {
    Float { default: f64, min: f64, max: f64 },
}

/// Definition of a parameter on an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub label: String,
    pub param_type: ParameterType,
}

/// A concrete parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Float(f64),
}

// Manual Eq impl: f64 doesn't impl Eq, but we need this for EffectInstance's
// Eq derive. Parameter values are always finite in practice.
impl Eq for ParameterValue {}

/// An instance of an effect in a chain, with its parameter values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectInstance {
    pub id: Uuid,
    pub effect_type: EffectType,
    pub parameters: Vec<(String, ParameterValue)>,
}

impl EffectInstance {
    /// Create a new effect instance with default parameter values.
    pub fn new(effect_type: EffectType) -> Self {
        let parameters = effect_type
            .parameter_definitions()
            .into_iter()
            .map(|def| {
                let value = match def.param_type {
                    ParameterType::Float { default, .. } => ParameterValue::Float(default),
                };
                (def.name, value)
            })
            .collect();
        Self {
            id: Uuid::new_v4(),
            effect_type,
            parameters,
        }
    }

    /// Get a float parameter value by name.
    pub fn get_float(&self, name: &str) -> Option<f64> {
        get_float_param(&self.parameters, name)
    }

    /// Set a float parameter value by name. Returns true if found and set.
    pub fn set_float(&mut self, name: &str, value: f64) -> bool {
        for (n, v) in &mut self.parameters {
            if n == name {
                *v = ParameterValue::Float(value);
                return true;
            }
        }
        false
    }
}

/// Look up a raw float parameter by name.
pub fn get_float_param(params: &[(String, ParameterValue)], name: &str) -> Option<f64> {
    params.iter().find_map(|(n, v)| {
        if n == name {
            match v {
                ParameterValue::Float(f) => Some(*f),
            }
        } else {
            None
        }
    })
}

/// Resolve a parameter against an effect's definitions: missing keys fall
/// back to the documented default, supplied values are clamped to the
/// documented range. Out-of-range input is never an error.
///
/// Parameters with no definition on the effect resolve to 0.0; effects only
/// ask for names they define.
pub fn resolve_param(
    effect_type: EffectType,
    params: &[(String, ParameterValue)],
    name: &str,
) -> f64 {
    let def = effect_type
        .parameter_definitions()
        .into_iter()
        .find(|d| d.name == name);
    let Some(def) = def else { return 0.0 };
    let ParameterType::Float { default, min, max } = def.param_type;
    match get_float_param(params, name) {
        Some(v) => v.clamp(min, max),
        None => default,
    }
}
