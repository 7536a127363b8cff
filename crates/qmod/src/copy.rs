//! File copy and copy extension records.

use crate::{QmodError, QmodResult};
use serde::{Deserialize, Deserializer, Serialize};

/// A file inside the package that installers copy to an arbitrary location.
///
/// Several records may share the same [`name`](FileCopy::name): one origin
/// file can be copied to many destinations. Records are compared by both
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileCopy {
    /// Path of the origin file within the archive.
    pub name: String,

    /// Destination path to copy the file to.
    pub destination: String,
}

impl FileCopy {
    pub fn new(name: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            destination: destination.into(),
        }
    }
}

/// Registers a file extension whose files should be copied to a directory when imported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CopyExtension {
    #[serde(deserialize_with = "de_extension")]
    extension: String,

    destination: String,
}

impl CopyExtension {
    /// Create a copy extension. Leading periods on `extension` are stripped.
    ///
    /// # Errors
    ///
    /// [`QmodError::InvalidArgument`] if nothing remains of `extension` once
    /// the periods are stripped.
    pub fn new(extension: &str, destination: impl Into<String>) -> QmodResult<Self> {
        Ok(Self {
            extension: normalize_extension(extension)?,
            destination: destination.into(),
        })
    }

    /// The file extension, without a leading period.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Directory that files with this extension are copied to.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }
}

fn normalize_extension(extension: &str) -> QmodResult<String> {
    let stripped = extension.trim_start_matches('.');
    if stripped.is_empty() {
        return Err(QmodError::InvalidArgument(format!(
            "Copy extension must name an extension ({extension:?})"
        )));
    }
    Ok(stripped.to_string())
}

fn de_extension<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let extension = String::deserialize(deserializer)?;
    if extension.is_empty() || extension.starts_with('.') {
        return Err(serde::de::Error::custom(format!(
            "copy extension must not be empty or start with a period ({extension:?})"
        )));
    }
    Ok(extension)
}
