//! Validation of manifest documents against the embedded QMOD schema.

use crate::{QmodError, QmodResult, SUPPORTED_SCHEMA_VERSIONS};
use jsonschema::Draft;
use serde_json::Value;
use std::sync::OnceLock;

const QMOD_SCHEMA_JSON: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schema/qmod.schema.json"
));

/// Key holding the schema version in a manifest document.
pub(crate) const SCHEMA_VERSION_KEY: &str = "_QPVersion";

/// Schema errors listed in an `InvalidFormat` message.
const MAX_REPORTED_ERRORS: usize = 10;

static VALIDATOR: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn compiled_validator() -> QmodResult<&'static jsonschema::Validator> {
    VALIDATOR
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(QMOD_SCHEMA_JSON)
                .map_err(|e| format!("failed to parse embedded QMOD schema: {e}"))?;

            jsonschema::options()
                .with_draft(Draft::Draft7)
                .build(&schema)
                .map_err(|e| format!("failed to compile QMOD schema: {e}"))
        })
        .as_ref()
        .map_err(|e| QmodError::invalid_format(e.clone()))
}

/// Check whether this library can load the given schema version.
#[must_use]
pub fn is_supported_schema_version(version: &str) -> bool {
    SUPPORTED_SCHEMA_VERSIONS.contains(&version)
}

/// Validate a parsed manifest document.
///
/// An unsupported `_QPVersion` is reported in preference to the generic
/// schema failure, since it is usually the reason validation failed.
pub(crate) fn validate_document(document: &Value) -> QmodResult<()> {
    let validator = compiled_validator()?;
    if validator.is_valid(document) {
        return Ok(());
    }

    if let Some(version) = document.get(SCHEMA_VERSION_KEY).and_then(Value::as_str)
        && !is_supported_schema_version(version)
    {
        return Err(QmodError::UnsupportedSchemaVersion {
            version: version.to_string(),
        });
    }

    let errors: Vec<String> = validator
        .iter_errors(document)
        .take(MAX_REPORTED_ERRORS)
        .map(|e| e.to_string())
        .collect();

    Err(QmodError::invalid_format(format!(
        "QMOD schema validation failed: {}",
        errors.join("; ")
    )))
}
