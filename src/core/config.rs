use crate::core::charset::Charset;
use crate::encoders::algorithms::errors::CodecError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// A named character set as written in `charsets.toml`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct CharsetConfig {
    /// The symbols of the set (explicit list)
    #[serde(default)]
    pub chars: String,
    /// First character of a range-based definition
    /// Use with `length` to define sequential Unicode ranges
    #[serde(default)]
    pub start: Option<String>,
    /// Number of code points in a range-based definition
    #[serde(default)]
    pub length: Option<u32>,
    /// Inclusive code point bounds `[lo, hi]`
    #[serde(default)]
    pub range: Option<[u32; 2]>,
    /// Free-form note shown by `radixpack charsets`
    #[serde(default)]
    pub description: Option<String>,
}

impl CharsetConfig {
    /// Builds the charset this entry describes.
    ///
    /// Priority:
    /// 1. If `chars` is non-empty, use it directly
    /// 2. If `start` + `length` are set, use that code-point run
    /// 3. Otherwise use `range`
    pub fn build(&self) -> Result<Charset, CodecError> {
        if !self.chars.is_empty() {
            return Charset::from_symbols(&self.chars);
        }

        if let (Some(start), Some(length)) = (&self.start, self.length) {
            let first = start.chars().next().ok_or_else(|| {
                CodecError::InvalidAlphabet("start must contain at least one character".into())
            })? as u32;
            if length < 2 {
                return Err(CodecError::InvalidAlphabet(format!(
                    "length must be at least 2, got {}",
                    length
                )));
            }
            let last = first.checked_add(length - 1).ok_or_else(|| {
                CodecError::InvalidAlphabet("range exceeds maximum Unicode codepoint".into())
            })?;
            return Charset::range(first, last);
        }

        if let Some([lo, hi]) = self.range {
            return Charset::range(lo, hi);
        }

        Err(CodecError::InvalidAlphabet(
            "entry needs chars, start + length, or range".into(),
        ))
    }
}

fn default_charset_name() -> String {
    "base64".to_string()
}

/// Global settings for radixpack.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Charset used when none is named on the command line
    #[serde(default = "default_charset_name")]
    pub default_charset: String,
    /// Start sessions in strict mode
    #[serde(default)]
    pub strict: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_charset: default_charset_name(),
            strict: false,
        }
    }
}

/// Collection of named charsets loaded from TOML files.
#[derive(Debug, Deserialize, Default)]
pub struct CharsetRegistry {
    /// Map of charset names to their definitions
    #[serde(default)]
    pub charsets: HashMap<String, CharsetConfig>,
    #[serde(default)]
    settings: Option<Settings>,
}

impl CharsetRegistry {
    /// Parses charset definitions from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads the built-in charsets bundled with the library.
    pub fn load_default() -> Result<Self, Box<dyn std::error::Error>> {
        let content = include_str!("../../charsets.toml");
        Ok(Self::from_toml(content)?)
    }

    /// Loads definitions from a custom file path.
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&content)?)
    }

    /// Loads the built-in charsets with user overrides from standard locations.
    ///
    /// Searches in priority order:
    /// 1. Built-in charsets (from library)
    /// 2. `~/.config/radixpack/charsets.toml` (user overrides)
    /// 3. `./charsets.toml` (project-local overrides)
    ///
    /// Later files override earlier ones for matching names. A file that
    /// fails to load is logged and skipped.
    pub fn load_with_overrides() -> Result<Self, Box<dyn std::error::Error>> {
        let mut registry = Self::load_default()?;

        if let Some(config_dir) = dirs::config_dir() {
            registry.merge_file(&config_dir.join("radixpack").join("charsets.toml"));
        }
        registry.merge_file(Path::new("charsets.toml"));

        Ok(registry)
    }

    fn merge_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match Self::load_from_file(path) {
            Ok(other) => {
                debug!(path = %path.display(), count = other.charsets.len(), "loaded charset overrides");
                self.merge(other);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load charset overrides"),
        }
    }

    /// Merges another registry into this one.
    ///
    /// Charsets from `other` replace charsets with the same name in `self`;
    /// its `[settings]` table, if present, replaces the current one.
    pub fn merge(&mut self, other: CharsetRegistry) {
        self.charsets.extend(other.charsets);
        if other.settings.is_some() {
            self.settings = other.settings;
        }
    }

    /// Retrieves a charset definition by name.
    pub fn get_charset(&self, name: &str) -> Option<&CharsetConfig> {
        self.charsets.get(name)
    }

    /// Charset names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.charsets.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn settings(&self) -> Settings {
        self.settings.clone().unwrap_or_default()
    }
}
