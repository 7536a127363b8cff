//! Dependencies on other mods.

use crate::validation::{parse_download_url, validate_id};
use crate::{QmodResult, VersionRange};
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use url::Url;

/// A dependency on another mod.
///
/// Installers check that a dependency is installed within [`version_range`]
/// before installing the depending mod. If it is not, it may be fetched from
/// [`download_if_missing`].
///
/// [`version_range`]: Dependency::version_range
/// [`download_if_missing`]: Dependency::download_if_missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(deserialize_with = "de_id")]
    id: String,

    #[serde(rename = "version")]
    version_range: VersionRange,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "ser_download_url",
        deserialize_with = "de_download_url"
    )]
    download_if_missing: Option<Url>,

    #[serde(default = "default_required")]
    required: bool,
}

fn default_required() -> bool {
    true
}

impl Dependency {
    /// Create a dependency on the given mod ID.
    ///
    /// Fails if the ID is empty or contains whitespace, the range is not a
    /// valid semver range, or the download URL is malformed.
    pub fn new(
        id: &str,
        version_range: &str,
        download_if_missing: Option<&str>,
        required: bool,
    ) -> QmodResult<Self> {
        validate_id(id)?;
        Ok(Self {
            id: id.to_string(),
            version_range: VersionRange::parse(version_range)?,
            download_if_missing: download_if_missing.map(parse_download_url).transpose()?,
            required,
        })
    }

    /// A required dependency accepting any version, with no download URL.
    pub fn any_version(id: &str) -> QmodResult<Self> {
        Self::new(id, "*", None, true)
    }

    /// Mod ID of the dependency.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) -> QmodResult<()> {
        if self.id == id {
            return Ok(());
        }
        validate_id(id)?;
        self.id = id.to_string();
        Ok(())
    }

    /// Supported version range of the dependency.
    #[must_use]
    pub fn version_range(&self) -> &VersionRange {
        &self.version_range
    }

    /// Set the version range from its string form. The previous range is kept on failure.
    pub fn set_version_range(&mut self, range: &str) -> QmodResult<()> {
        self.version_range = VersionRange::parse(range)?;
        Ok(())
    }

    /// Check whether an installed version satisfies this dependency.
    #[must_use]
    pub fn accepts(&self, version: &Version) -> bool {
        self.version_range.matches(version)
    }

    /// URL to download the dependency from if it is not installed.
    #[must_use]
    pub fn download_if_missing(&self) -> Option<&Url> {
        self.download_if_missing.as_ref()
    }

    pub fn set_download_if_missing(&mut self, url: Option<&str>) -> QmodResult<()> {
        self.download_if_missing = url.map(parse_download_url).transpose()?;
        Ok(())
    }

    /// Whether the dependency must be installed for the mod to install.
    ///
    /// Optional dependencies need not be installed, but if they are, they
    /// must still fall within the version range.
    #[must_use]
    pub fn required(&self) -> bool {
        self.required
    }

    pub fn set_required(&mut self, required: bool) {
        self.required = required;
    }
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    validate_id(&id).map_err(serde::de::Error::custom)?;
    Ok(id)
}

fn ser_download_url<S: Serializer>(url: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error> {
    match url {
        Some(url) => serializer.serialize_str(url.as_str()),
        None => serializer.serialize_none(),
    }
}

fn de_download_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Url>, D::Error> {
    Option::<String>::deserialize(deserializer)?
        .as_deref()
        .map(parse_download_url)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crate::QmodError;

    fn test_dependency() -> Dependency {
        Dependency::any_version("my-dependency").unwrap()
    }

    #[test]
    fn Dependency___any_version___uses_wildcard_and_required() {
        let dependency = test_dependency();

        assert_eq!(dependency.version_range().to_string(), "*");
        assert!(dependency.required());
        assert!(dependency.download_if_missing().is_none());
    }

    #[test]
    fn Dependency___set_id___rejects_whitespace() {
        let mut dependency = test_dependency();
        dependency.set_id("my-other-dependency").unwrap();

        let err = dependency.set_id("ID containing spaces").unwrap_err();

        assert!(matches!(err, QmodError::InvalidArgument(_)));
        assert_eq!(dependency.id(), "my-other-dependency");
    }

    #[test]
    fn Dependency___set_download_if_missing___parses_and_clears() {
        let mut dependency = test_dependency();

        dependency
            .set_download_if_missing(Some("https://example.com"))
            .unwrap();
        assert_eq!(
            dependency.download_if_missing().map(Url::as_str),
            Some("https://example.com/")
        );

        dependency.set_download_if_missing(None).unwrap();
        assert!(dependency.download_if_missing().is_none());

        assert!(
            dependency
                .set_download_if_missing(Some("https:/example.com"))
                .is_err()
        );
    }

    #[test]
    fn Dependency___set_version_range___keeps_previous_on_failure() {
        let mut dependency = test_dependency();
        dependency.set_version_range("^0.1.0").unwrap();

        assert!(dependency.set_version_range("^0.1.0.0").is_err());
        assert_eq!(dependency.version_range().to_string(), "^0.1.0");
    }

    #[test]
    fn Dependency___accepts___checks_range_containment() {
        let dependency = Dependency::new("dep", "^0.1.0", None, true).unwrap();

        assert!(dependency.accepts(&Version::new(0, 1, 5)));
        assert!(!dependency.accepts(&Version::new(0, 2, 0)));
    }

    #[test]
    fn Dependency___accepts___treats_bare_version_as_exact() {
        let dependency = Dependency::new("dep", "1.0.0", None, true).unwrap();

        assert!(dependency.accepts(&Version::new(1, 0, 0)));
        assert!(!dependency.accepts(&Version::new(1, 5, 0)));
    }

    #[test]
    fn Dependency___serialize___keeps_range_text() {
        let json = r#"{ "id": "dep", "version": "^1.0.0 || 2.0.0 - 2.5.0" }"#;
        let dependency: Dependency = serde_json::from_str(json).unwrap();

        let value = serde_json::to_value(&dependency).unwrap();

        assert_eq!(value["version"], "^1.0.0 || 2.0.0 - 2.5.0");
        assert!(dependency.accepts(&Version::new(2, 5, 0)));
        assert!(!dependency.accepts(&Version::new(2, 6, 0)));
    }

    #[test]
    fn Dependency___deserialize___defaults_required_to_true() {
        let dependency: Dependency =
            serde_json::from_str(r#"{ "id": "dep", "version": "^1.0.0" }"#).unwrap();

        assert!(dependency.required());
        assert!(dependency.download_if_missing().is_none());
    }

    #[test]
    fn Dependency___serialize___uses_canonical_keys_and_omits_null_url() {
        let dependency = Dependency::new("dep", "^1.2.0", None, false).unwrap();

        let json = serde_json::to_value(&dependency).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "id": "dep", "version": "^1.2.0", "required": false })
        );
    }

    #[test]
    fn Dependency___deserialize___rejects_malformed_url() {
        let result = serde_json::from_str::<Dependency>(
            r#"{ "id": "dep", "version": "*", "downloadIfMissing": "https:/example.com" }"#,
        );

        assert!(result.is_err());
    }
}
