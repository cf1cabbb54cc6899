//! Narration language, voice, and caption styling settings.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Narration language for the generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }

    /// Default TTS voice for this language.
    pub fn default_voice(&self) -> &'static str {
        match self {
            Language::En => "en-AU-WilliamNeural",
            Language::Ar => "ar-SA-HamedNeural",
        }
    }

    /// Default caption font family for this language.
    pub fn default_font_family(&self) -> &'static str {
        match self {
            Language::En => "Arial",
            Language::Ar => "Arial Unicode MS",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            other => Err(LanguageParseError(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unsupported language: {0}")]
pub struct LanguageParseError(pub String);

/// Caption rendering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FontSettings {
    pub size: u32,
    pub color: String,
    pub stroke_color: String,
    pub stroke_width: u32,
    pub family: String,
}

impl FontSettings {
    /// Defaults for a given language (Arabic needs a Unicode-capable family).
    pub fn defaults_for(language: Language) -> Self {
        Self {
            size: 100,
            color: "white".to_string(),
            stroke_color: "black".to_string(),
            stroke_width: 3,
            family: language.default_font_family().to_string(),
        }
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self::defaults_for(Language::En)
    }
}

/// Full per-task settings echoed back in status responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoSettings {
    pub language: Language,
    pub voice: String,
    pub font: FontSettings,
}

impl VideoSettings {
    pub fn defaults_for(language: Language) -> Self {
        Self {
            language,
            voice: language.default_voice().to_string(),
            font: FontSettings::defaults_for(language),
        }
    }
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self::defaults_for(Language::En)
    }
}
