//! Archive storage behind a package.
//!
//! [`Archive`] is the entry-level interface a [`Package`](crate::Package)
//! needs from its storage engine. [`ZipStore`] implements it over a
//! [`PackageStream`] using the `zip` crate: existing entries are read from
//! the source archive, new entries are staged in memory, and the archive
//! is rewritten to the stream on [`commit`](Archive::commit).

use crate::stream::{PackageStream, StreamCapabilities, StreamIo};
use crate::{QmodError, QmodResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Read, SeekFrom, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// What a package may do with its archive.
///
/// The mode is derived once from the stream's capabilities when a package is
/// opened or created and never changes afterwards.
///
/// ```text
/// read + write + seek  → Updatable   (everything)
/// write                → CreateOnly  (new entries only; no reading, deleting or overwriting)
/// read                 → ReadOnly    (no mutation of any kind)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArchiveMode {
    ReadOnly,
    CreateOnly,
    Updatable,
}

impl ArchiveMode {
    /// Check whether a stream with these capabilities can back this mode.
    #[must_use]
    pub fn is_supported_by(&self, capabilities: StreamCapabilities) -> bool {
        match self {
            Self::ReadOnly => capabilities.read,
            Self::CreateOnly => capabilities.write,
            Self::Updatable => capabilities.read && capabilities.write && capabilities.seek,
        }
    }

    /// Whether entries and manifest properties may be changed.
    #[must_use]
    pub fn can_write(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }

    /// Whether existing entries may be opened for reading.
    #[must_use]
    pub fn can_read_entries(&self) -> bool {
        !matches!(self, Self::CreateOnly)
    }

    /// Whether entries may be deleted or overwritten.
    #[must_use]
    pub fn can_delete_entries(&self) -> bool {
        matches!(self, Self::Updatable)
    }

    /// Select the mode for opening an existing package.
    ///
    /// Create-only mode can never open a package, since the manifest could
    /// not be read back.
    pub fn for_open(
        capabilities: StreamCapabilities,
        requested: Option<ArchiveMode>,
    ) -> QmodResult<Self> {
        match requested {
            Some(Self::CreateOnly) => Err(QmodError::InvalidArgument(
                "Cannot open an existing package in create-only mode".to_string(),
            )),
            Some(mode) => mode.require(capabilities),
            None if Self::Updatable.is_supported_by(capabilities) => Ok(Self::Updatable),
            None if capabilities.read => Ok(Self::ReadOnly),
            None => Err(QmodError::InvalidArgument(
                "Cannot open a package from a stream which does not support reading".to_string(),
            )),
        }
    }

    /// Select the mode for creating a new package.
    pub fn for_create(
        capabilities: StreamCapabilities,
        requested: Option<ArchiveMode>,
    ) -> QmodResult<Self> {
        match requested {
            Some(Self::ReadOnly) => Err(QmodError::InvalidArgument(
                "Cannot create a package in read-only mode".to_string(),
            )),
            Some(mode) => mode.require(capabilities),
            None if Self::Updatable.is_supported_by(capabilities) => Ok(Self::Updatable),
            None if capabilities.write => Ok(Self::CreateOnly),
            None => Err(QmodError::InvalidArgument(
                "Cannot create a package using a stream that does not support writing"
                    .to_string(),
            )),
        }
    }

    fn require(self, capabilities: StreamCapabilities) -> QmodResult<Self> {
        if self.is_supported_by(capabilities) {
            Ok(self)
        } else {
            Err(QmodError::InvalidArgument(format!(
                "Stream does not support {self} mode (read: {}, write: {}, seek: {})",
                capabilities.read, capabilities.write, capabilities.seek
            )))
        }
    }
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::CreateOnly => write!(f, "create-only"),
            Self::Updatable => write!(f, "updatable"),
        }
    }
}

/// Entry-level operations on an archive.
///
/// Paths are caller-chosen strings relative to the archive root.
pub trait Archive {
    /// The mode this archive was opened in.
    fn mode(&self) -> ArchiveMode;

    /// Names of all entries, in archive order.
    fn entry_names(&self) -> Vec<String>;

    /// Check whether an entry exists.
    fn contains(&self, path: &str) -> bool;

    /// Open an entry for reading.
    fn open_entry(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>>;

    /// Create a new entry holding everything read from `source`.
    ///
    /// Returns the number of bytes written. Fails if the entry already exists.
    fn create_entry(&mut self, path: &str, source: &mut dyn Read) -> QmodResult<u64>;

    /// Delete an existing entry.
    fn delete_entry(&mut self, path: &str) -> QmodResult<()>;

    /// Persist all changes to the underlying stream.
    fn commit(&mut self) -> QmodResult<()>;
}

#[derive(Debug)]
enum EntryData {
    /// Entry at this index of the source archive.
    Stored(usize),
    /// Entry created since the archive was opened.
    Staged(Vec<u8>),
}

#[derive(Debug)]
struct StoreEntry {
    name: String,
    data: EntryData,
}

/// ZIP-backed [`Archive`] over a [`PackageStream`].
///
/// The whole stream is read into memory when the store is opened. Changes
/// are held in memory until [`commit`](Archive::commit), which writes a new
/// archive: from the start of the stream in updatable mode (truncating any
/// trailing bytes), or appended to the stream in create-only mode.
#[derive(Debug)]
pub struct ZipStore<S: PackageStream> {
    stream: S,
    mode: ArchiveMode,
    source: Option<ZipArchive<Cursor<Vec<u8>>>>,
    entries: Vec<StoreEntry>,
    modified: bool,
    sealed: bool,
}

impl<S: PackageStream> ZipStore<S> {
    /// Open an existing archive. Create-only mode is rejected.
    pub fn open(mut stream: S, mode: ArchiveMode) -> QmodResult<Self> {
        if mode == ArchiveMode::CreateOnly {
            return Err(QmodError::InvalidArgument(
                "Cannot open an existing archive in create-only mode".to_string(),
            ));
        }

        let bytes = read_stream(&mut stream, mode)?;
        let source = parse_archive(bytes)?;
        Ok(Self::with_source(stream, mode, Some(source)))
    }

    /// Start a new archive.
    ///
    /// In updatable mode a stream that already holds an archive keeps its
    /// existing entries; an empty stream starts an empty archive.
    pub fn create(mut stream: S, mode: ArchiveMode) -> QmodResult<Self> {
        match mode {
            ArchiveMode::ReadOnly => Err(QmodError::InvalidArgument(
                "Cannot create an archive in read-only mode".to_string(),
            )),
            ArchiveMode::CreateOnly => Ok(Self::with_source(stream, mode, None)),
            ArchiveMode::Updatable => {
                let bytes = read_stream(&mut stream, mode)?;
                let source = if bytes.is_empty() {
                    None
                } else {
                    Some(parse_archive(bytes)?)
                };
                let mut store = Self::with_source(stream, mode, source);
                store.modified = true;
                Ok(store)
            }
        }
    }

    fn with_source(
        stream: S,
        mode: ArchiveMode,
        source: Option<ZipArchive<Cursor<Vec<u8>>>>,
    ) -> Self {
        let entries = source
            .as_ref()
            .map(|archive| {
                (0..archive.len())
                    .filter_map(|index| {
                        archive.name_for_index(index).map(|name| StoreEntry {
                            name: name.to_string(),
                            data: EntryData::Stored(index),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            stream,
            mode,
            source,
            entries,
            modified: false,
            sealed: false,
        }
    }

    /// The underlying stream.
    #[must_use]
    pub fn stream(&self) -> &S {
        &self.stream
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == path)
    }

    fn write_archive(&mut self) -> QmodResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in &self.entries {
            match &entry.data {
                EntryData::Stored(index) => {
                    let source = self.source.as_mut().ok_or_else(|| {
                        QmodError::invalid_format(format!(
                            "Entry {} refers to a missing source archive",
                            entry.name
                        ))
                    })?;
                    writer.raw_copy_file(source.by_index_raw(*index)?)?;
                }
                EntryData::Staged(contents) => {
                    writer.start_file(entry.name.as_str(), options)?;
                    writer.write_all(contents)?;
                }
            }
        }

        Ok(writer.finish()?.into_inner())
    }
}

impl<S: PackageStream> Archive for ZipStore<S> {
    fn mode(&self) -> ArchiveMode {
        self.mode
    }

    fn entry_names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    fn contains(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    fn open_entry(&mut self, path: &str) -> QmodResult<Box<dyn Read + '_>> {
        if !self.mode.can_read_entries() {
            return Err(QmodError::InvalidOperation(format!(
                "Cannot open {path}: entries cannot be read in {} mode",
                self.mode
            )));
        }

        let position = self
            .position(path)
            .ok_or_else(|| QmodError::NotFound(format!("No entry {path} in archive")))?;

        match &self.entries[position].data {
            EntryData::Staged(contents) => Ok(Box::new(contents.as_slice())),
            EntryData::Stored(index) => {
                let index = *index;
                let source = self.source.as_mut().ok_or_else(|| {
                    QmodError::invalid_format(format!(
                        "Entry {path} refers to a missing source archive"
                    ))
                })?;
                Ok(Box::new(source.by_index(index)?))
            }
        }
    }

    fn create_entry(&mut self, path: &str, source: &mut dyn Read) -> QmodResult<u64> {
        if !self.mode.can_write() || self.sealed {
            return Err(QmodError::InvalidOperation(format!(
                "Cannot create {path}: archive is not writable"
            )));
        }
        if self.contains(path) {
            return Err(QmodError::InvalidArgument(format!(
                "Entry {path} already exists in archive"
            )));
        }

        let mut contents = Vec::new();
        let written = source.read_to_end(&mut contents)?;
        self.entries.push(StoreEntry {
            name: path.to_string(),
            data: EntryData::Staged(contents),
        });
        self.modified = true;

        Ok(written as u64)
    }

    fn delete_entry(&mut self, path: &str) -> QmodResult<()> {
        if !self.mode.can_delete_entries() {
            return Err(QmodError::InvalidOperation(format!(
                "Cannot delete {path}: entries cannot be deleted in {} mode",
                self.mode
            )));
        }

        let position = self
            .position(path)
            .ok_or_else(|| QmodError::NotFound(format!("No entry {path} in archive")))?;
        self.entries.remove(position);
        self.modified = true;
        Ok(())
    }

    fn commit(&mut self) -> QmodResult<()> {
        if !self.mode.can_write() || !self.modified || self.sealed {
            return Ok(());
        }

        let bytes = self.write_archive()?;
        match self.mode {
            ArchiveMode::Updatable => {
                self.stream.seek(SeekFrom::Start(0))?;
                StreamIo(&mut self.stream).write_all(&bytes)?;
                self.stream.set_len(bytes.len() as u64)?;
            }
            ArchiveMode::CreateOnly => {
                StreamIo(&mut self.stream).write_all(&bytes)?;
                // Appending twice would corrupt a non-seekable stream
                self.sealed = true;
            }
            ArchiveMode::ReadOnly => {}
        }
        self.stream.flush()?;

        tracing::debug!(
            mode = %self.mode,
            entries = self.entries.len(),
            bytes = bytes.len(),
            "committed archive"
        );
        self.modified = false;
        Ok(())
    }
}

fn read_stream<S: PackageStream>(stream: &mut S, mode: ArchiveMode) -> QmodResult<Vec<u8>> {
    if mode == ArchiveMode::Updatable {
        stream.seek(SeekFrom::Start(0))?;
    }
    let mut bytes = Vec::new();
    StreamIo(stream).read_to_end(&mut bytes)?;
    Ok(bytes)
}

fn parse_archive(bytes: Vec<u8>) -> QmodResult<ZipArchive<Cursor<Vec<u8>>>> {
    ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| QmodError::invalid_format_caused_by("Package is not a valid ZIP archive", e))
}
