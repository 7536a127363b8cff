//! The package container.
//!
//! A [`Package`] binds a [`Manifest`] to the entries of an [`Archive`]. It
//! keeps the manifest's file lists consistent with the archive, enforces the
//! [`ArchiveMode`] permissions, and writes the manifest back into the archive
//! when it is closed or dropped.

use crate::archive::{Archive, ArchiveMode, ZipStore};
use crate::stream::PackageStream;
use crate::validation::parse_version;
use crate::{
    CopyExtension, Dependency, FileCopy, FileKind, MANIFEST_FILE, Manifest, ModLoader, OpenOptions,
    QmodError, QmodResult,
};
use semver::Version;
use std::io::Read;

/// Role lists holding plain file paths.
#[derive(Debug, Clone, Copy)]
enum FileRole {
    Mod,
    LateMod,
    Library,
}

impl FileRole {
    fn kind(self) -> FileKind {
        match self {
            Self::Mod => FileKind::ModFile,
            Self::LateMod => FileKind::LateModFile,
            Self::Library => FileKind::LibraryFile,
        }
    }

    fn files(self, manifest: &Manifest) -> &[String] {
        match self {
            Self::Mod => manifest.mod_files(),
            Self::LateMod => manifest.late_mod_files(),
            Self::Library => manifest.library_files(),
        }
    }

    fn files_mut(self, manifest: &mut Manifest) -> &mut Vec<String> {
        match self {
            Self::Mod => manifest.mod_files_mut(),
            Self::LateMod => manifest.late_mod_files_mut(),
            Self::Library => manifest.library_files_mut(),
        }
    }
}

/// A mod package: a manifest plus the archive holding its files.
///
/// # Lifecycle
///
/// ```text
/// open / create ──► mutate (setters, file operations) ──► close / drop
///                         │                                   │
///                         └── marks manifest dirty ──────────►┘ rewrites mod.json, commits archive
/// ```
///
/// Closing runs exactly once. Prefer [`close`](Package::close), which reports
/// failures; dropping the package performs the same work and logs failures.
///
/// # Example
///
/// ```no_run
/// use qmod::{FileStream, OpenOptions, Package};
///
/// let file = FileStream::read_write("example-mod.qmod")?;
/// let mut package = Package::open(file, OpenOptions::default())?;
/// package.set_version("1.1.0")?;
/// package.create_mod_file("libexample-mod.so", &b"..."[..])?;
/// package.close()?;
/// # Ok::<(), qmod::QmodError>(())
/// ```
#[derive(Debug)]
pub struct Package<A: Archive> {
    archive: A,
    manifest: Manifest,
    manifest_dirty: bool,
    closed: bool,
}

impl<S: PackageStream> Package<ZipStore<S>> {
    /// Open an existing package from a stream.
    ///
    /// The archive mode is derived from the stream's capabilities unless
    /// `options.mode` requests one.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidArgument`] if the stream cannot be read or the
    ///   requested mode is create-only or unsupported by the stream.
    /// * [`QmodError::InvalidFormat`] if the stream is not a ZIP archive, has
    ///   no manifest, or the manifest is invalid.
    /// * [`QmodError::UnsupportedSchemaVersion`] for manifests of an unknown schema version.
    /// * [`QmodError::MissingFile`] if a stated file is missing and the options are strict.
    pub fn open(stream: S, options: OpenOptions) -> QmodResult<Self> {
        let mode = ArchiveMode::for_open(stream.capabilities(), options.mode)?;
        let archive = ZipStore::open(stream, mode)?;
        Self::from_archive(archive, options)
    }

    /// Create a new package in a stream, selecting the best mode the stream supports.
    ///
    /// # Errors
    ///
    /// See [`create_with_mode`](Package::create_with_mode).
    pub fn create(stream: S, manifest: Manifest) -> QmodResult<Self> {
        Self::create_with_mode(stream, manifest, None)
    }

    /// Create a new package in a stream with an explicit archive mode.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidArgument`] if the stream cannot be written, or
    ///   `mode` is read-only or unsupported by the stream.
    /// * [`QmodError::InvalidFormat`] if an updatable stream holds bytes that
    ///   are not a ZIP archive.
    /// * [`QmodError::MissingFile`] if the manifest states a file the archive lacks.
    pub fn create_with_mode(
        stream: S,
        manifest: Manifest,
        mode: Option<ArchiveMode>,
    ) -> QmodResult<Self> {
        let mode = ArchiveMode::for_create(stream.capabilities(), mode)?;
        let archive = ZipStore::create(stream, mode)?;
        Self::create_in_archive(archive, manifest)
    }
}

impl<A: Archive> Package<A> {
    /// Load a package from an already opened archive.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidArgument`] if the archive is in create-only mode.
    /// * [`QmodError::InvalidFormat`] if the archive has no manifest or the
    ///   manifest is invalid.
    /// * [`QmodError::UnsupportedSchemaVersion`] for manifests of an unknown schema version.
    /// * [`QmodError::MissingFile`] if a stated file is missing and `options` are strict.
    pub fn from_archive(mut archive: A, options: OpenOptions) -> QmodResult<Self> {
        if archive.mode() == ArchiveMode::CreateOnly {
            return Err(QmodError::InvalidArgument(
                "Cannot load a package from an archive in create-only mode".to_string(),
            ));
        }
        if !archive.contains(MANIFEST_FILE) {
            return Err(QmodError::invalid_format(format!(
                "Mod archive did not contain a manifest at {MANIFEST_FILE}"
            )));
        }

        let mut bytes = Vec::new();
        archive.open_entry(MANIFEST_FILE)?.read_to_end(&mut bytes)?;
        let mut manifest = Manifest::parse(&bytes)?;

        if let Some(cover) = manifest.cover_image_path().map(str::to_string)
            && !archive.contains(&cover)
        {
            if options.strict_cover {
                return Err(QmodError::MissingFile {
                    kind: FileKind::CoverImage,
                    path: cover,
                });
            }
            tracing::warn!(path = %cover, "stated cover image is missing, clearing it");
            manifest.set_cover_image_path(None);
        }

        verify_stated_files(&archive, &mut manifest, options.strict_files)?;

        tracing::debug!(
            id = manifest.id(),
            version = %manifest.version(),
            mode = %archive.mode(),
            "opened package"
        );

        Ok(Self {
            archive,
            manifest,
            manifest_dirty: false,
            closed: false,
        })
    }

    /// Start a new package in an archive. The manifest is written on close.
    ///
    /// Any files or cover the manifest already states must exist in the archive.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidArgument`] if the archive is read-only.
    /// * [`QmodError::MissingFile`] if the manifest states a file the archive lacks.
    pub fn create_in_archive(archive: A, mut manifest: Manifest) -> QmodResult<Self> {
        if archive.mode() == ArchiveMode::ReadOnly {
            return Err(QmodError::InvalidArgument(
                "Cannot create a package in a read-only archive".to_string(),
            ));
        }

        if let Some(cover) = manifest.cover_image_path()
            && !archive.contains(cover)
        {
            return Err(QmodError::MissingFile {
                kind: FileKind::CoverImage,
                path: cover.to_string(),
            });
        }
        verify_stated_files(&archive, &mut manifest, true)?;

        tracing::debug!(id = manifest.id(), mode = %archive.mode(), "created package");

        Ok(Self {
            archive,
            manifest,
            manifest_dirty: true,
            closed: false,
        })
    }

    /// Check every stated mod, late mod, library and file-copy origin against the archive.
    ///
    /// With `strict`, the first missing file fails with
    /// [`QmodError::MissingFile`]. Otherwise missing files are removed from
    /// the manifest in memory.
    pub fn verify_stated_files(&mut self, strict: bool) -> QmodResult<()> {
        verify_stated_files(&self.archive, &mut self.manifest, strict)
    }

    #[must_use]
    pub fn mode(&self) -> ArchiveMode {
        self.archive.mode()
    }

    /// The underlying archive.
    #[must_use]
    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// Whether the manifest has changed since it was last written to the archive.
    #[must_use]
    pub fn is_manifest_dirty(&self) -> bool {
        self.manifest_dirty
    }

    /// Borrow the current manifest.
    #[must_use]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Take an independent copy of the current manifest.
    #[must_use]
    pub fn to_manifest(&self) -> Manifest {
        self.manifest.clone()
    }

    /// Names of every entry in the archive, including the manifest.
    #[must_use]
    pub fn entry_names(&self) -> Vec<String> {
        self.archive.entry_names()
    }

    #[must_use]
    pub fn has_entry(&self, path: &str) -> bool {
        self.archive.contains(path)
    }

    // ------------------------------------------------------------------------
    // Manifest properties
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn schema_version(&self) -> &str {
        self.manifest.schema_version()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.manifest.id()
    }

    pub fn set_id(&mut self, id: &str) -> QmodResult<()> {
        self.set_field(id, |m, id| m.id() == *id, |m, id| m.set_id(id))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.manifest.name()
    }

    pub fn set_name(&mut self, name: &str) -> QmodResult<()> {
        self.set_field(
            name,
            |m, name| m.name() == *name,
            |m, name| {
                m.set_name(name);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn author(&self) -> &str {
        self.manifest.author()
    }

    pub fn set_author(&mut self, author: &str) -> QmodResult<()> {
        self.set_field(
            author,
            |m, author| m.author() == *author,
            |m, author| {
                m.set_author(author);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        self.manifest.version()
    }

    /// Set the version from a semver string. The previous version is kept on failure.
    pub fn set_version(&mut self, version: &str) -> QmodResult<()> {
        self.set_field(
            version,
            |m, version| parse_version(version).is_ok_and(|v| v == *m.version()),
            |m, version| m.set_version(version),
        )
    }

    #[must_use]
    pub fn package_id(&self) -> Option<&str> {
        self.manifest.package_id()
    }

    pub fn set_package_id(&mut self, package_id: Option<&str>) -> QmodResult<()> {
        self.set_field(
            package_id,
            |m, package_id| m.package_id() == *package_id,
            |m, package_id| {
                m.set_package_id(package_id);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn package_version(&self) -> Option<&str> {
        self.manifest.package_version()
    }

    pub fn set_package_version(&mut self, package_version: Option<&str>) -> QmodResult<()> {
        self.set_field(
            package_version,
            |m, package_version| m.package_version() == *package_version,
            |m, package_version| {
                m.set_package_version(package_version);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.manifest.description()
    }

    pub fn set_description(&mut self, description: Option<&str>) -> QmodResult<()> {
        self.set_field(
            description,
            |m, description| m.description() == *description,
            |m, description| {
                m.set_description(description);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn porter(&self) -> Option<&str> {
        self.manifest.porter()
    }

    pub fn set_porter(&mut self, porter: Option<&str>) -> QmodResult<()> {
        self.set_field(
            porter,
            |m, porter| m.porter() == *porter,
            |m, porter| {
                m.set_porter(porter);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn is_library(&self) -> bool {
        self.manifest.is_library()
    }

    pub fn set_is_library(&mut self, is_library: bool) -> QmodResult<()> {
        self.set_field(
            is_library,
            |m, is_library| m.is_library() == *is_library,
            |m, is_library| {
                m.set_is_library(is_library);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn mod_loader(&self) -> ModLoader {
        self.manifest.mod_loader()
    }

    pub fn set_mod_loader(&mut self, mod_loader: ModLoader) -> QmodResult<()> {
        self.set_field(
            mod_loader,
            |m, mod_loader| m.mod_loader() == *mod_loader,
            |m, mod_loader| {
                m.set_mod_loader(mod_loader);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        self.manifest.dependencies()
    }

    pub fn set_dependencies(&mut self, dependencies: Vec<Dependency>) -> QmodResult<()> {
        self.set_field(
            dependencies,
            |m, dependencies| m.dependencies() == dependencies.as_slice(),
            |m, dependencies| {
                m.set_dependencies(dependencies);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn copy_extensions(&self) -> &[CopyExtension] {
        self.manifest.copy_extensions()
    }

    pub fn set_copy_extensions(&mut self, copy_extensions: Vec<CopyExtension>) -> QmodResult<()> {
        self.set_field(
            copy_extensions,
            |m, copy_extensions| m.copy_extensions() == copy_extensions.as_slice(),
            |m, copy_extensions| {
                m.set_copy_extensions(copy_extensions);
                Ok(())
            },
        )
    }

    #[must_use]
    pub fn mod_files(&self) -> &[String] {
        self.manifest.mod_files()
    }

    #[must_use]
    pub fn late_mod_files(&self) -> &[String] {
        self.manifest.late_mod_files()
    }

    #[must_use]
    pub fn library_files(&self) -> &[String] {
        self.manifest.library_files()
    }

    #[must_use]
    pub fn file_copies(&self) -> &[FileCopy] {
        self.manifest.file_copies()
    }

    /// Single entry point for property changes.
    ///
    /// Checks the mode, skips values equal to the current one, then commits
    /// through the manifest's own validation and marks the manifest dirty.
    fn set_field<T>(
        &mut self,
        value: T,
        is_current: impl FnOnce(&Manifest, &T) -> bool,
        commit: impl FnOnce(&mut Manifest, T) -> QmodResult<()>,
    ) -> QmodResult<()> {
        self.ensure_writable("set a manifest property")?;
        if is_current(&self.manifest, &value) {
            return Ok(());
        }
        commit(&mut self.manifest, value)?;
        self.manifest_dirty = true;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Cover image
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn cover_image_path(&self) -> Option<&str> {
        self.manifest.cover_image_path()
    }

    /// Rename or remove the cover image.
    ///
    /// Renaming copies the cover to the new path and deletes the old entry.
    /// Setting `None` deletes the cover entry. A cover must be written with
    /// [`write_cover_image`](Package::write_cover_image) before it can be renamed.
    ///
    /// # Errors
    ///
    /// * [`QmodError::InvalidOperation`] in read-only or create-only mode, or
    ///   when renaming a package that has no cover.
    /// * [`QmodError::InvalidArgument`] if `path` is the manifest path or an
    ///   existing entry.
    /// * [`QmodError::MissingFile`] if the current cover entry is missing.
    pub fn set_cover_image_path(&mut self, path: Option<&str>) -> QmodResult<()> {
        self.ensure_writable("change the cover image path")?;
        if self.mode() == ArchiveMode::CreateOnly {
            return Err(QmodError::InvalidOperation(
                "Cannot change the cover image path of a package in create-only mode".to_string(),
            ));
        }

        let current = self.manifest.cover_image_path().map(str::to_string);
        if current.as_deref() == path {
            return Ok(());
        }

        match (current, path) {
            (None, Some(_)) => {
                return Err(QmodError::InvalidOperation(
                    "Cannot set the cover image path when no cover image exists, write the cover image first"
                        .to_string(),
                ));
            }
            (Some(old), None) => {
                if self.archive.contains(&old) {
                    self.archive.delete_entry(&old)?;
                }
            }
            (Some(old), Some(new)) => {
                if new == MANIFEST_FILE {
                    return Err(QmodError::InvalidArgument(format!(
                        "Cannot rename the cover image to {MANIFEST_FILE}"
                    )));
                }
                if self.archive.contains(new) {
                    return Err(QmodError::InvalidArgument(format!(
                        "Cannot rename the cover image to {new}, as a file already exists there"
                    )));
                }
                if !self.archive.contains(&old) {
                    return Err(QmodError::MissingFile {
                        kind: FileKind::CoverImage,
                        path: old,
                    });
                }

                let mut contents = Vec::new();
                self.archive.open_entry(&old)?.read_to_end(&mut contents)?;
                self.archive.create_entry(new, &mut contents.as_slice())?;
                self.archive.delete_entry(&old)?;
                tracing::debug!(from = %old, to = new, "renamed cover image");
            }
            (None, None) => return Ok(()),
        }

        self.manifest.set_cover_image_path(path);
        self.manifest_dirty = true;
        Ok(())
    }

    /// Create or replace the cover image, stored at `name`.
    pub fn write_cover_image(&mut self, name: &str, mut source: impl Read) -> QmodResult<()> {
        self.ensure_writable("write the cover image")?;
        if name == MANIFEST_FILE {
            return Err(QmodError::InvalidArgument(format!(
                "Cannot store the cover image at {MANIFEST_FILE}"
            )));
        }

        let current = self.manifest.cover_image_path().map(str::to_string);
        if current.as_deref() != Some(name) && self.archive.contains(name) {
            return Err(QmodError::InvalidArgument(format!(
                "Cannot store the cover image at {name}, as a file already exists there"
            )));
        }

        if let Some(current) = &current
            && self.archive.contains(current)
        {
            self.archive.delete_entry(current)?;
        }
        self.archive.create_entry(name, &mut source)?;

        if current.as_deref() != Some(name) {
            self.manifest.set_cover_image_path(Some(name));
            self.manifest_dirty = true;
        }
        Ok(())
    }

    /// Open the cover image for reading.
    pub fn open_cover_image(&mut self) -> QmodResult<Box<dyn Read + '_>> {
        let path = self
            .manifest
            .cover_image_path()
            .ok_or_else(|| QmodError::NotFound("Package has no cover image".to_string()))?
            .to_string();
        self.open_listed_entry(&path)
    }

    // ------------------------------------------------------------------------
    // Mod, late mod and library files
    // ------------------------------------------------------------------------

    /// Create a mod file, or overwrite one already listed as a mod file.
    pub fn create_mod_file(&mut self, path: &str, mut source: impl Read) -> QmodResult<()> {
        self.create_role_file(FileRole::Mod, path, &mut source)
    }

    pub fn delete_mod_file(&mut self, path: &str) -> QmodResult<()> {
        self.delete_role_file(FileRole::Mod, path)
    }

    pub fn open_mod_file(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        self.open_role_file(FileRole::Mod, path)
    }

    /// Create a late mod file, or overwrite one already listed as a late mod file.
    pub fn create_late_mod_file(&mut self, path: &str, mut source: impl Read) -> QmodResult<()> {
        self.create_role_file(FileRole::LateMod, path, &mut source)
    }

    pub fn delete_late_mod_file(&mut self, path: &str) -> QmodResult<()> {
        self.delete_role_file(FileRole::LateMod, path)
    }

    pub fn open_late_mod_file(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        self.open_role_file(FileRole::LateMod, path)
    }

    /// Create a library file, or overwrite one already listed as a library file.
    pub fn create_library_file(&mut self, path: &str, mut source: impl Read) -> QmodResult<()> {
        self.create_role_file(FileRole::Library, path, &mut source)
    }

    pub fn delete_library_file(&mut self, path: &str) -> QmodResult<()> {
        self.delete_role_file(FileRole::Library, path)
    }

    pub fn open_library_file(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        self.open_role_file(FileRole::Library, path)
    }

    fn create_role_file(
        &mut self,
        role: FileRole,
        path: &str,
        source: &mut dyn Read,
    ) -> QmodResult<()> {
        let kind = role.kind();
        self.ensure_writable(&format!("create {kind} {path}"))?;
        if path == MANIFEST_FILE {
            return Err(QmodError::InvalidArgument(format!(
                "Cannot create {kind} with path {MANIFEST_FILE}"
            )));
        }

        let listed = role.files(&self.manifest).iter().any(|file| file == path);
        if self.archive.contains(path) {
            if !listed {
                return Err(QmodError::InvalidArgument(format!(
                    "Cannot create {kind} with path {path} as it is already taken up by another file in the package"
                )));
            }
            self.delete_for_overwrite(path)?;
        }

        let written = self.archive.create_entry(path, source)?;
        if !listed {
            role.files_mut(&mut self.manifest).push(path.to_string());
            self.manifest_dirty = true;
        }

        tracing::debug!(%kind, path, bytes = written, "wrote file");
        Ok(())
    }

    fn delete_role_file(&mut self, role: FileRole, path: &str) -> QmodResult<()> {
        let kind = role.kind();
        self.ensure_writable(&format!("delete {kind} {path}"))?;

        let position = role
            .files(&self.manifest)
            .iter()
            .position(|file| file == path)
            .ok_or_else(|| {
                QmodError::NotFound(format!("Cannot delete {kind} {path} as it does not exist"))
            })?;

        if self.archive.contains(path) {
            self.archive.delete_entry(path)?;
        }
        role.files_mut(&mut self.manifest).remove(position);
        self.manifest_dirty = true;

        tracing::debug!(%kind, path, "deleted file");
        Ok(())
    }

    fn open_role_file(&mut self, role: FileRole, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        if !role.files(&self.manifest).iter().any(|file| file == path) {
            return Err(QmodError::NotFound(format!(
                "Cannot open {} {path} as it does not exist",
                role.kind()
            )));
        }
        self.open_listed_entry(path)
    }

    // ------------------------------------------------------------------------
    // File copies
    // ------------------------------------------------------------------------

    /// Add a file copy record.
    ///
    /// With a `source`, the origin file is written (overwriting it only if
    /// another record already uses the same origin). Without one, another
    /// record must already share the origin file.
    pub fn add_file_copy(
        &mut self,
        file_copy: FileCopy,
        source: Option<&mut dyn Read>,
    ) -> QmodResult<()> {
        self.ensure_writable("add a file copy")?;

        let shares_origin = self
            .manifest
            .file_copies()
            .iter()
            .any(|copy| copy.name == file_copy.name);

        match source {
            None if !shares_origin => {
                return Err(QmodError::InvalidArgument(format!(
                    "No file copy existed with the origin file {}, and no source was provided to create it from",
                    file_copy.name
                )));
            }
            None => {}
            Some(source) => {
                if file_copy.name == MANIFEST_FILE {
                    return Err(QmodError::InvalidArgument(format!(
                        "Cannot create file copy origin at {MANIFEST_FILE}"
                    )));
                }
                if self.archive.contains(&file_copy.name) {
                    if !shares_origin {
                        return Err(QmodError::InvalidArgument(format!(
                            "Cannot create file copy with origin file {}, as a file already exists in the package with this path",
                            file_copy.name
                        )));
                    }
                    self.delete_for_overwrite(&file_copy.name)?;
                }
                self.archive.create_entry(&file_copy.name, source)?;
            }
        }

        if !self.manifest.file_copies().contains(&file_copy) {
            tracing::debug!(
                name = %file_copy.name,
                destination = %file_copy.destination,
                "added file copy"
            );
            self.manifest.file_copies_mut().push(file_copy);
            self.manifest_dirty = true;
        }
        Ok(())
    }

    /// Remove a file copy record.
    ///
    /// The origin file is deleted once no other record refers to it.
    pub fn remove_file_copy(&mut self, file_copy: &FileCopy) -> QmodResult<()> {
        self.ensure_writable("remove a file copy")?;

        let copies = self.manifest.file_copies();
        let position = copies
            .iter()
            .position(|copy| copy == file_copy)
            .ok_or_else(|| {
                QmodError::NotFound(format!(
                    "Cannot remove file copy of {} to {} as it does not exist",
                    file_copy.name, file_copy.destination
                ))
            })?;
        let origin_shared = copies
            .iter()
            .filter(|copy| copy.name == file_copy.name)
            .count()
            > 1;

        if !origin_shared && self.archive.contains(&file_copy.name) {
            self.archive.delete_entry(&file_copy.name)?;
        }
        self.manifest.file_copies_mut().remove(position);
        self.manifest_dirty = true;
        Ok(())
    }

    /// Open the origin file of a file copy.
    pub fn open_file_copy(&mut self, file_copy: &FileCopy) -> QmodResult<Box<dyn Read + '_>> {
        if !self
            .manifest
            .file_copies()
            .iter()
            .any(|copy| copy.name == file_copy.name)
        {
            return Err(QmodError::NotFound(format!(
                "Cannot open file copy with name {} as it does not exist",
                file_copy.name
            )));
        }
        self.open_listed_entry(&file_copy.name)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Write the manifest if it changed, then commit the archive.
    pub fn close(mut self) -> QmodResult<()> {
        self.finish()
    }

    fn finish(&mut self) -> QmodResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if self.manifest_dirty && self.mode().can_write() {
            if self.archive.contains(MANIFEST_FILE) {
                self.archive.delete_entry(MANIFEST_FILE)?;
            }
            let bytes = self.manifest.to_bytes()?;
            self.archive
                .create_entry(MANIFEST_FILE, &mut bytes.as_slice())?;
            self.manifest_dirty = false;
            tracing::debug!(id = self.manifest.id(), "saved manifest");
        }

        self.archive.commit()
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    fn ensure_writable(&self, action: &str) -> QmodResult<()> {
        if self.mode().can_write() {
            Ok(())
        } else {
            Err(QmodError::InvalidOperation(format!(
                "Cannot {action}: package is read-only"
            )))
        }
    }

    fn delete_for_overwrite(&mut self, path: &str) -> QmodResult<()> {
        if !self.mode().can_delete_entries() {
            return Err(QmodError::InvalidOperation(format!(
                "Cannot overwrite {path} in a package in {} mode",
                self.mode()
            )));
        }
        self.archive.delete_entry(path)
    }

    fn open_listed_entry(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        if !self.mode().can_read_entries() {
            return Err(QmodError::InvalidOperation(format!(
                "Cannot open {path} in a package in {} mode",
                self.mode()
            )));
        }
        self.archive.open_entry(path)
    }
}

impl<A: Archive> Drop for Package<A> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            tracing::error!(error = %e, "failed to save package");
        }
    }
}

fn verify_stated_files<A: Archive + ?Sized>(
    archive: &A,
    manifest: &mut Manifest,
    strict: bool,
) -> QmodResult<()> {
    for role in [FileRole::Mod, FileRole::LateMod, FileRole::Library] {
        remove_missing(archive, role.kind(), strict, role.files_mut(manifest), |file| {
            file.as_str()
        })?;
    }
    remove_missing(
        archive,
        FileKind::FileCopy,
        strict,
        manifest.file_copies_mut(),
        |copy| copy.name.as_str(),
    )
}

/// Iterates backward so removals do not shift entries still to be visited.
fn remove_missing<A: Archive + ?Sized, T>(
    archive: &A,
    kind: FileKind,
    strict: bool,
    items: &mut Vec<T>,
    name_of: impl Fn(&T) -> &str,
) -> QmodResult<()> {
    for index in (0..items.len()).rev() {
        let path = name_of(&items[index]);
        if archive.contains(path) {
            continue;
        }

        let path = path.to_string();
        if strict {
            return Err(QmodError::MissingFile { kind, path });
        }
        tracing::warn!(%kind, %path, "stated file is missing, removing it from the manifest");
        items.remove(index);
    }
    Ok(())
}
