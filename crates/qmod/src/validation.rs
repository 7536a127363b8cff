//! Field validators shared by the manifest, its value types and the package.

use crate::{QmodError, QmodResult};
use semver::Version;
use url::Url;

/// Check that an ID is non-empty and contains no whitespace.
pub(crate) fn validate_id(id: &str) -> QmodResult<()> {
    if id.is_empty() {
        return Err(QmodError::InvalidArgument(
            "Cannot set ID to an empty value".to_string(),
        ));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(QmodError::InvalidArgument(format!(
            "Cannot set ID to a value containing whitespace ({id})"
        )));
    }
    Ok(())
}

/// Parse a semantic version string.
pub(crate) fn parse_version(version: &str) -> QmodResult<Version> {
    Version::parse(version).map_err(|e| {
        QmodError::InvalidArgument(format!("Invalid semantic version {version}: {e}"))
    })
}

/// Parse a download URL, rejecting inputs the WHATWG parser would repair.
pub(crate) fn parse_download_url(url: &str) -> QmodResult<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| QmodError::InvalidArgument(format!("Could not parse dependency URL {url}: {e}")))?;

    // `https:/host` parses as `https://host/`; a hierarchical URL must spell out its authority
    if parsed.has_host() {
        let after_scheme = &url[parsed.scheme().len()..];
        if !after_scheme.starts_with("://") {
            return Err(QmodError::InvalidArgument(format!(
                "Could not parse dependency URL {url}: missing '//' before host"
            )));
        }
    }

    Ok(parsed)
}
