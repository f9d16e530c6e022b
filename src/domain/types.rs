//! Shared domain enumerations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an entity's body is authored. Only builder-authored entities go
/// through the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    Builder,
    #[serde(untagged)]
    Other(String),
}

impl EditMode {
    pub fn is_builder(&self) -> bool {
        matches!(self, EditMode::Builder)
    }

    pub fn as_str(&self) -> &str {
        match self {
            EditMode::Builder => "builder",
            EditMode::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for EditMode {
    fn from(value: &str) -> Self {
        match value.trim() {
            "builder" => EditMode::Builder,
            other => EditMode::Other(other.to_string()),
        }
    }
}

/// Webfont delivery family as reported by the font classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontType {
    /// Served through the combined family stylesheet query.
    Standard,
    /// Served through the legacy per-font stylesheet path.
    EarlyAccess,
    /// Anything the queue does not know how to load (system fonts, custom uploads).
    Unknown,
}

impl FontType {
    pub fn as_str(self) -> &'static str {
        match self {
            FontType::Standard => "standard",
            FontType::EarlyAccess => "early_access",
            FontType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FontType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Script,
    Style,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Script => "script",
            AssetKind::Style => "style",
        }
    }
}

/// Where the host prints an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    #[default]
    Head,
    Footer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_mode_parses_builder_and_keeps_other_values() {
        assert_eq!(EditMode::from("builder"), EditMode::Builder);
        assert_eq!(
            EditMode::from("classic"),
            EditMode::Other("classic".to_string())
        );
        assert!(!EditMode::from("").is_builder());
    }

    #[test]
    fn edit_mode_deserializes_unknown_strings_as_other() {
        let mode: EditMode = serde_json::from_str("\"builder\"").expect("builder mode");
        assert!(mode.is_builder());

        let mode: EditMode = serde_json::from_str("\"gutenberg\"").expect("other mode");
        assert_eq!(mode.as_str(), "gutenberg");
    }
}
