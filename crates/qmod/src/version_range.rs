//! Dependency version ranges.

use crate::{QmodError, QmodResult};
use semver::{Version, VersionReq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A semantic version range as written in a QMOD manifest.
///
/// Ranges follow the node-semver grammar used across QMOD tooling:
///
/// ```text
/// 1.0.0                 exactly 1.0.0
/// ^1.0.0 || ^2.0.0      either comparator set
/// >=1.0.0 <2.0.0        all comparators in a set
/// 1.0.0 - 2.0.0         inclusive hyphen range
/// ```
///
/// The range text is kept as written and serialized unchanged. Equality
/// compares that text.
#[derive(Debug, Clone)]
pub struct VersionRange {
    text: String,
    alternatives: Vec<VersionReq>,
}

impl VersionRange {
    /// Parse a range string.
    ///
    /// # Errors
    ///
    /// [`QmodError::InvalidArgument`] if any comparator set is malformed.
    pub fn parse(range: &str) -> QmodResult<Self> {
        let alternatives = range
            .split("||")
            .map(translate_set)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                QmodError::InvalidArgument(format!("Invalid semantic version range {range}: {e}"))
            })?;

        Ok(Self {
            text: range.to_string(),
            alternatives,
        })
    }

    /// The range accepting every release version.
    #[must_use]
    pub fn any() -> Self {
        Self {
            text: "*".to_string(),
            alternatives: vec![VersionReq::STAR],
        }
    }

    /// The range text as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Check whether a version falls within the range.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives.iter().any(|req| req.matches(version))
    }
}

/// Translate one `||`-separated comparator set into a [`VersionReq`].
fn translate_set(set: &str) -> Result<VersionReq, semver::Error> {
    let set = set.trim();
    if set.is_empty() {
        return Ok(VersionReq::STAR);
    }

    if let Some((lower, upper)) = set.split_once(" - ") {
        return VersionReq::parse(&format!(">={}, <={}", lower.trim(), upper.trim()));
    }

    let mut comparators = Vec::new();
    let mut operator: Option<&str> = None;
    for token in set.split_whitespace() {
        // `>= 1.0.0` splits the operator from its version
        if token.chars().all(is_operator_char) {
            operator = Some(token);
            continue;
        }
        comparators.push(match operator.take() {
            Some(op) => format!("{op}{token}"),
            None => exact_if_bare(token),
        });
    }
    if let Some(op) = operator {
        comparators.push(op.to_string());
    }

    VersionReq::parse(&comparators.join(", "))
}

fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=' | '^' | '~')
}

/// A bare version is an exact match; `VersionReq` would read it as a caret range.
fn exact_if_bare(token: &str) -> String {
    let bare = token.starts_with(|c: char| c.is_ascii_digit());
    let core = token.split(['-', '+']).next().unwrap_or(token);
    let wildcard = core.contains(['x', 'X', '*']);
    if bare && !wildcard {
        format!("={token}")
    } else {
        token.to_string()
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for VersionRange {
    type Err = QmodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for VersionRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for VersionRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let range = String::deserialize(deserializer)?;
        Self::parse(&range).map_err(serde::de::Error::custom)
    }
}
