//! The `mod.json` manifest document.
//!
//! The manifest describes a package's identity, the files it ships and the
//! mods it depends on. Parsing validates the document against the embedded
//! QMOD schema before decoding it into typed fields.

use crate::schema;
use crate::validation::{parse_version, validate_id};
use crate::{
    CURRENT_SCHEMA_VERSION, CopyExtension, Dependency, FileCopy, ModLoader, QmodError, QmodResult,
};
use semver::Version;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Package manifest, stored as `mod.json` in the archive root.
///
/// `id` is never empty or contains whitespace, and `version` is always a valid semantic
/// version: every constructor and setter validates before committing.
///
/// `Clone` is deep: every list and nested record is copied. Borrow the
/// manifest (for example through [`Package::manifest`](crate::Package::manifest))
/// when an aliasing view is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version the document was written against. Serialization
    /// always writes [`CURRENT_SCHEMA_VERSION`].
    #[serde(rename = "_QPVersion", serialize_with = "ser_current_schema_version")]
    schema_version: String,

    #[serde(deserialize_with = "de_id")]
    id: String,

    name: String,

    author: String,

    version: Version,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    package_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    package_version: Option<String>,

    #[serde(rename = "modloader", default)]
    mod_loader: ModLoader,

    #[serde(default)]
    mod_files: Vec<String>,

    #[serde(default)]
    late_mod_files: Vec<String>,

    #[serde(default)]
    library_files: Vec<String>,

    #[serde(default)]
    file_copies: Vec<FileCopy>,

    #[serde(default)]
    dependencies: Vec<Dependency>,

    #[serde(default)]
    copy_extensions: Vec<CopyExtension>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(rename = "coverImage", default, skip_serializing_if = "Option::is_none")]
    cover_image_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    porter: Option<String>,

    #[serde(default)]
    is_library: bool,
}

fn ser_current_schema_version<S: Serializer>(_: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(CURRENT_SCHEMA_VERSION)
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let id = String::deserialize(deserializer)?;
    validate_id(&id).map_err(serde::de::Error::custom)?;
    Ok(id)
}

impl Manifest {
    /// Create a new manifest stamped with the current schema version.
    ///
    /// All file lists start empty and the mod loader defaults to
    /// [`ModLoader::QuestLoader`].
    pub fn new(
        id: &str,
        name: &str,
        version: &str,
        package_id: Option<&str>,
        package_version: Option<&str>,
        author: &str,
    ) -> QmodResult<Self> {
        validate_id(id)?;
        let version = parse_version(version)?;

        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION.to_string(),
            id: id.to_string(),
            name: name.to_string(),
            author: author.to_string(),
            version,
            package_id: package_id.map(str::to_string),
            package_version: package_version.map(str::to_string),
            mod_loader: ModLoader::default(),
            mod_files: Vec::new(),
            late_mod_files: Vec::new(),
            library_files: Vec::new(),
            file_copies: Vec::new(),
            dependencies: Vec::new(),
            copy_extensions: Vec::new(),
            description: None,
            cover_image_path: None,
            porter: None,
            is_library: false,
        })
    }

    /// Create a new manifest whose name is the same as its ID.
    pub fn with_id(
        id: &str,
        version: &str,
        package_id: Option<&str>,
        package_version: Option<&str>,
        author: &str,
    ) -> QmodResult<Self> {
        Self::new(id, id, version, package_id, package_version, author)
    }

    /// Parse a manifest from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidFormat`] for malformed JSON or a document that
    ///   does not match the schema.
    /// * [`QmodError::UnsupportedSchemaVersion`] if `_QPVersion` is not one
    ///   this library can load.
    pub fn parse(bytes: &[u8]) -> QmodResult<Self> {
        let document: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| QmodError::invalid_format_caused_by("Invalid JSON in manifest", e))?;

        schema::validate_document(&document)?;

        serde_json::from_value(document).map_err(|e| {
            QmodError::invalid_format_caused_by("Manifest fields could not be decoded", e)
        })
    }

    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> QmodResult<Self> {
        Self::parse(json.as_bytes())
    }

    /// Serialize to indented JSON.
    pub fn to_json(&self) -> QmodResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| QmodError::invalid_format_caused_by("Manifest could not be encoded", e))
    }

    /// Serialize to indented JSON bytes.
    pub fn to_bytes(&self) -> QmodResult<Vec<u8>> {
        Ok(self.to_json()?.into_bytes())
    }

    /// Schema version the manifest was read with, or the current version for new manifests.
    #[must_use]
    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// ID of the mod. Two mods with the same ID cannot be installed together.
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

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn set_author(&mut self, author: &str) {
        self.author = author.to_string();
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Set the version from a semver string. The previous version is kept on failure.
    pub fn set_version(&mut self, version: &str) -> QmodResult<()> {
        self.version = parse_version(version)?;
        Ok(())
    }

    /// Package ID of the app the mod targets, `None` for any app.
    #[must_use]
    pub fn package_id(&self) -> Option<&str> {
        self.package_id.as_deref()
    }

    pub fn set_package_id(&mut self, package_id: Option<&str>) {
        self.package_id = package_id.map(str::to_string);
    }

    /// Version of the targeted app, `None` if the mod works with any version.
    #[must_use]
    pub fn package_version(&self) -> Option<&str> {
        self.package_version.as_deref()
    }

    pub fn set_package_version(&mut self, package_version: Option<&str>) {
        self.package_version = package_version.map(str::to_string);
    }

    #[must_use]
    pub fn mod_loader(&self) -> ModLoader {
        self.mod_loader
    }

    pub fn set_mod_loader(&mut self, mod_loader: ModLoader) {
        self.mod_loader = mod_loader;
    }

    /// Whether the mod is a library, to be uninstalled once nothing depends on it.
    #[must_use]
    pub fn is_library(&self) -> bool {
        self.is_library
    }

    pub fn set_is_library(&mut self, is_library: bool) {
        self.is_library = is_library;
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.map(str::to_string);
    }

    /// Author of the port, if the mod was ported from another platform.
    #[must_use]
    pub fn porter(&self) -> Option<&str> {
        self.porter.as_deref()
    }

    pub fn set_porter(&mut self, porter: Option<&str>) {
        self.porter = porter.map(str::to_string);
    }

    /// Path of the cover image within the archive.
    #[must_use]
    pub fn cover_image_path(&self) -> Option<&str> {
        self.cover_image_path.as_deref()
    }

    pub fn set_cover_image_path(&mut self, path: Option<&str>) {
        self.cover_image_path = path.map(str::to_string);
    }

    /// Files copied to the mod loader's early mods directory.
    #[must_use]
    pub fn mod_files(&self) -> &[String] {
        &self.mod_files
    }

    pub fn mod_files_mut(&mut self) -> &mut Vec<String> {
        &mut self.mod_files
    }

    /// Files copied to the mod loader's late mods directory.
    #[must_use]
    pub fn late_mod_files(&self) -> &[String] {
        &self.late_mod_files
    }

    pub fn late_mod_files_mut(&mut self) -> &mut Vec<String> {
        &mut self.late_mod_files
    }

    /// Files copied to the mod loader's libraries directory.
    #[must_use]
    pub fn library_files(&self) -> &[String] {
        &self.library_files
    }

    pub fn library_files_mut(&mut self) -> &mut Vec<String> {
        &mut self.library_files
    }

    #[must_use]
    pub fn file_copies(&self) -> &[FileCopy] {
        &self.file_copies
    }

    pub fn file_copies_mut(&mut self) -> &mut Vec<FileCopy> {
        &mut self.file_copies
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<Dependency>) {
        self.dependencies = dependencies;
    }

    pub fn dependencies_mut(&mut self) -> &mut Vec<Dependency> {
        &mut self.dependencies
    }

    #[must_use]
    pub fn copy_extensions(&self) -> &[CopyExtension] {
        &self.copy_extensions
    }

    pub fn set_copy_extensions(&mut self, copy_extensions: Vec<CopyExtension>) {
        self.copy_extensions = copy_extensions;
    }

    pub fn copy_extensions_mut(&mut self) -> &mut Vec<CopyExtension> {
        &mut self.copy_extensions
    }
}
