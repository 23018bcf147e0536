//! Structured story input: characters, their emotions, a scene and a situation.
//!
//! Every field is optional on the wire; missing values deserialize to empty
//! strings so the prompt compiler can always produce a prompt. Use
//! [`Scenario::validate`] where a meaningful prompt is required.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A character taking part in the story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub emotions: Emotions,
}

impl Character {
    pub fn new(name: impl Into<String>, emotions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emotions: Emotions::Text(emotions.into()),
        }
    }
}

/// How a character feels.
///
/// Accepts free text (`"joyful"`) or an ordered map of emotion to intensity
/// (`{"happiness": 3, "fear": "1"}`), the shape posted by slider-based forms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Emotions {
    Text(String),
    Levels(IndexMap<String, serde_json::Value>),
    #[default]
    Unspecified,
}

impl Emotions {
    /// Render the emotions as prompt text.
    ///
    /// Intensity maps keep submission order and list only positive
    /// intensities as `"{emotion} ({intensity})"`, joined with `", "`.
    /// Non-numeric intensities are ignored.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Unspecified => String::new(),
            Self::Levels(levels) => levels
                .iter()
                .filter_map(|(emotion, value)| {
                    let intensity = intensity_of(value)?;
                    (intensity > 0.0).then(|| format!("{emotion} ({})", format_intensity(intensity)))
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn intensity_of(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn format_intensity(intensity: f64) -> String {
    if intensity.fract() == 0.0 && intensity.abs() < i64::MAX as f64 {
        format!("{}", intensity as i64)
    } else {
        format!("{intensity}")
    }
}

/// A complete story request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub scene: String,
    #[serde(default)]
    pub scenario: String,
    #[serde(default)]
    pub characters: Vec<Character>,
}

impl Scenario {
    /// Check that the scenario can produce a meaningful prompt.
    ///
    /// Requires at least one character, a name for every character, and a
    /// non-blank scene and scenario.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.characters.is_empty() {
            return Err(ValidationError::new(
                "characters",
                "at least one character is required",
            ));
        }
        if let Some(index) = self.characters.iter().position(|c| c.name.trim().is_empty()) {
            return Err(ValidationError::new(
                "characters",
                format!("character {index} has no name"),
            ));
        }
        if self.scene.trim().is_empty() {
            return Err(ValidationError::new("scene", "must not be blank"));
        }
        if self.scenario.trim().is_empty() {
            return Err(ValidationError::new("scenario", "must not be blank"));
        }
        Ok(())
    }
}
