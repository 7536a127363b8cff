//! QMOD package format
//!
//! This crate reads, creates and updates `.qmod` packages: ZIP archives
//! holding the files of a mod together with a `mod.json` manifest that
//! describes them.
//!
//! # Package Structure
//!
//! ```text
//! example-mod_2.0.0.qmod
//! ├── mod.json                   # Manifest
//! ├── libexample-mod.so          # Mod file (early mods directory)
//! ├── libmy-latemod.so           # Late mod file
//! ├── libmy-library.so           # Library file
//! ├── myFile.png                 # File copy origin
//! └── myCover.png                # Cover image
//! ```
//!
//! # Example
//!
//! ```no_run
//! use qmod::{FileStream, Manifest, Package};
//! use std::fs::File;
//!
//! // Create a package
//! let manifest = Manifest::new("example-mod", "Example Mod", "1.0.0", Some("com.my.game"), None, "me")?;
//! let mut package = Package::create(FileStream::create("example-mod.qmod")?, manifest)?;
//! package.create_mod_file("libexample-mod.so", File::open("target/libexample-mod.so")?)?;
//! package.write_cover_image("cover.png", File::open("cover.png")?)?;
//! package.close()?;
//! # Ok::<(), qmod::QmodError>(())
//! ```
//!
//! # Streams and modes
//!
//! What a package may do is fixed by its stream's capabilities when it is
//! opened. Open files through [`FileStream`], choosing the constructor that
//! matches the access needed: [`FileStream::read_only`] yields a read-only
//! package whose setters fail immediately, while [`FileStream::read_write`]
//! yields an updatable one.

mod copy;
mod dependency;
mod error;
mod manifest;
mod mod_loader;
mod options;
mod package;
mod schema;
mod validation;
mod version_range;

pub mod archive;
pub mod stream;

pub use archive::{Archive, ArchiveMode, ZipStore};
pub use copy::{CopyExtension, FileCopy};
pub use dependency::Dependency;
pub use error::{FileKind, FormatCause, QmodError};
pub use manifest::Manifest;
pub use mod_loader::ModLoader;
pub use options::OpenOptions;
pub use package::Package;
pub use schema::is_supported_schema_version;
pub use stream::{FileStream, PackageStream, ReadOnly, StreamCapabilities, WriteOnly};
pub use version_range::VersionRange;

/// Result type for package operations.
pub type QmodResult<T> = Result<T, QmodError>;

/// Package file extension.
pub const QMOD_EXTENSION: &str = "qmod";

/// Manifest file name within the package.
pub const MANIFEST_FILE: &str = "mod.json";

/// Schema versions this library can load.
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["0.1.0", "0.1.1", "0.1.2", "1.0.0", "1.1.0", "1.2.0"];

/// Schema version stamped on every manifest written.
pub const CURRENT_SCHEMA_VERSION: &str = "1.2.0";
