//! Mod loader identification.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The mod loader a package is built for.
///
/// Decoding is lenient: names match case-insensitively, and an unknown,
/// missing or non-string value falls back to [`ModLoader::QuestLoader`]
/// rather than failing the whole manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum ModLoader {
    #[default]
    QuestLoader,
    Scotland2,
}

impl ModLoader {
    /// Canonical name as written to the manifest.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuestLoader => "QuestLoader",
            Self::Scotland2 => "Scotland2",
        }
    }

    /// Parse a loader name exactly (case-insensitive), returning `None` if unknown.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|loader| loader.as_str().eq_ignore_ascii_case(s))
    }

    /// Parse a loader name, defaulting to [`ModLoader::QuestLoader`] if unknown.
    #[must_use]
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or_default()
    }

    /// All known loaders.
    #[must_use]
    pub fn all() -> &'static [ModLoader] {
        &[Self::QuestLoader, Self::Scotland2]
    }
}

impl fmt::Display for ModLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModLoader {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value.as_str().map(Self::parse_lenient).unwrap_or_default())
    }
}
