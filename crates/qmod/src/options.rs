//! Options for opening a package.

use crate::ArchiveMode;
use serde::{Deserialize, Serialize};

/// How [`Package::open`](crate::Package::open) treats the archive and any
/// inconsistencies between the manifest and the archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOptions {
    /// Fail on mod, library or file-copy entries missing from the archive.
    /// When `false`, missing entries are dropped from the manifest instead.
    #[serde(default = "default_strict_files")]
    pub strict_files: bool,

    /// Fail when the cover image is missing.
    /// When `false`, a missing cover is cleared from the manifest instead.
    #[serde(default)]
    pub strict_cover: bool,

    /// Archive mode to use instead of the one derived from the stream.
    #[serde(default)]
    pub mode: Option<ArchiveMode>,
}

fn default_strict_files() -> bool {
    true
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            strict_files: default_strict_files(),
            strict_cover: false,
            mode: None,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that drop every inconsistency rather than failing.
    pub fn lenient() -> Self {
        Self {
            strict_files: false,
            strict_cover: false,
            mode: None,
        }
    }

    #[must_use]
    pub fn strict_files(mut self, strict: bool) -> Self {
        self.strict_files = strict;
        self
    }

    #[must_use]
    pub fn strict_cover(mut self, strict: bool) -> Self {
        self.strict_cover = strict;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: ArchiveMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn OpenOptions___default___strict_files_only() {
        let options = OpenOptions::default();

        assert!(options.strict_files);
        assert!(!options.strict_cover);
        assert_eq!(options.mode, None);
    }

    #[test]
    fn OpenOptions___builder___sets_fields() {
        let options = OpenOptions::new()
            .strict_files(false)
            .strict_cover(true)
            .mode(ArchiveMode::ReadOnly);

        assert!(!options.strict_files);
        assert!(options.strict_cover);
        assert_eq!(options.mode, Some(ArchiveMode::ReadOnly));
    }

    #[test]
    fn OpenOptions___deserialize___empty_object___uses_defaults() {
        let options: OpenOptions = serde_json::from_str("{}").unwrap();

        assert_eq!(options, OpenOptions::default());
    }

    #[test]
    fn OpenOptions___deserialize___camel_case_keys() {
        let json = r#"{"strictFiles": false, "strictCover": true, "mode": "readOnly"}"#;

        let options: OpenOptions = serde_json::from_str(json).unwrap();

        assert!(!options.strict_files);
        assert!(options.strict_cover);
        assert_eq!(options.mode, Some(ArchiveMode::ReadOnly));
    }
}
