//! Error types for package operations.

use std::fmt;
use thiserror::Error;

/// Boxed cause attached to [`QmodError::InvalidFormat`].
pub type FormatCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while reading, creating or updating a package.
#[derive(Debug, Error)]
pub enum QmodError {
    /// I/O error on the underlying stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error.
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Malformed bytes, or a manifest that does not conform to the schema.
    #[error("Invalid mod: {reason}")]
    InvalidFormat {
        reason: String,
        #[source]
        source: Option<FormatCause>,
    },

    /// The manifest declares a schema version this library cannot load.
    #[error("Unsupported QMOD schema version {version}. Upgrade your mod installer!")]
    UnsupportedSchemaVersion { version: String },

    /// A file stated in the manifest is absent from the archive.
    #[error("Missing stated {kind} {path} in manifest")]
    MissingFile { kind: FileKind, path: String },

    /// An invalid value or request was supplied by the caller.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The package's archive mode does not permit the operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The referenced file is not listed in the manifest.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl QmodError {
    pub(crate) fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn invalid_format_caused_by(
        reason: impl Into<String>,
        source: impl Into<FormatCause>,
    ) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

/// The role a file plays within a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Copied to the mod loader's early mods directory.
    ModFile,
    /// Copied to the mod loader's late mods directory.
    LateModFile,
    /// Copied to the mod loader's libraries directory.
    LibraryFile,
    /// Origin file of a [`FileCopy`](crate::FileCopy).
    FileCopy,
    /// The package's cover image.
    CoverImage,
}

impl FileKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModFile => "mod file",
            Self::LateModFile => "late mod file",
            Self::LibraryFile => "library file",
            Self::FileCopy => "file copy",
            Self::CoverImage => "cover image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
