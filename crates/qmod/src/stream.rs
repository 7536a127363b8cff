//! Byte streams that packages are read from and written to.
//!
//! A stream advertises what it can do through [`StreamCapabilities`]; the
//! package derives its [`ArchiveMode`](crate::ArchiveMode) from those flags
//! once, when it is opened or created.
//!
//! Files go through [`FileStream`], whose constructors record the access the
//! file was opened with. A bare `std::fs::File` is not a stream.

use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Read/write/seek capability flags of a [`PackageStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamCapabilities {
    pub read: bool,
    pub write: bool,
    pub seek: bool,
}

impl StreamCapabilities {
    /// Readable, writable and seekable.
    pub const FULL: Self = Self {
        read: true,
        write: true,
        seek: true,
    };
}

fn unsupported(operation: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("stream does not support {operation}"),
    )
}

/// A byte stream backing a package.
///
/// Operations the stream does not advertise in [`capabilities`] return
/// [`io::ErrorKind::Unsupported`] by default.
///
/// [`capabilities`]: PackageStream::capabilities
pub trait PackageStream {
    fn capabilities(&self) -> StreamCapabilities;

    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(unsupported("reading"))
    }

    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(unsupported("writing"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(unsupported("seeking"))
    }

    /// Truncate or extend the stream to `len` bytes.
    fn set_len(&mut self, _len: u64) -> io::Result<()> {
        Err(unsupported("resizing"))
    }
}

/// Adapts a `&mut PackageStream` to the `std::io` traits.
pub(crate) struct StreamIo<'a, S: ?Sized>(pub(crate) &'a mut S);

impl<S: PackageStream + ?Sized> Read for StreamIo<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        PackageStream::read(&mut *self.0, buf)
    }
}

impl<S: PackageStream + ?Sized> Write for StreamIo<'_, S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        PackageStream::write(&mut *self.0, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        PackageStream::flush(&mut *self.0)
    }
}

impl PackageStream for Cursor<Vec<u8>> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::FULL
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

impl PackageStream for Cursor<&mut Vec<u8>> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities::FULL
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(self, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

/// A file together with the access it was opened with.
///
/// `std::fs::File` does not report whether it was opened for reading or
/// writing, so the capabilities are fixed by the constructor. A file opened
/// with [`FileStream::read_only`] backs a read-only package instead of
/// failing on the first write at close.
#[derive(Debug)]
pub struct FileStream {
    file: File,
    capabilities: StreamCapabilities,
}

impl FileStream {
    /// Open an existing file for reading only.
    pub fn read_only(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(
            file,
            StreamCapabilities {
                read: true,
                write: false,
                seek: true,
            },
        ))
    }

    /// Open an existing file for reading and writing.
    pub fn read_write(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::options().read(true).write(true).open(path)?;
        Ok(Self::new(file, StreamCapabilities::FULL))
    }

    /// Create a file, truncating any existing one, for reading and writing.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self::new(file, StreamCapabilities::FULL))
    }

    /// Wrap an already opened file, declaring the access it was opened with.
    #[must_use]
    pub fn new(file: File, capabilities: StreamCapabilities) -> Self {
        Self { file, capabilities }
    }

    #[must_use]
    pub fn into_inner(self) -> File {
        self.file
    }
}

impl PackageStream for FileStream {
    fn capabilities(&self) -> StreamCapabilities {
        self.capabilities
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.capabilities.read {
            return Err(unsupported("reading"));
        }
        Read::read(&mut self.file, buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.capabilities.write {
            return Err(unsupported("writing"));
        }
        Write::write(&mut self.file, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.file)
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if !self.capabilities.seek {
            return Err(unsupported("seeking"));
        }
        Seek::seek(&mut self.file, pos)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        if !self.capabilities.write {
            return Err(unsupported("resizing"));
        }
        self.file.set_len(len)
    }
}

/// A readable, non-seekable stream. Packages opened over it are read-only.
#[derive(Debug)]
pub struct ReadOnly<R>(pub R);

impl<R: Read> PackageStream for ReadOnly<R> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities {
            read: true,
            write: false,
            seek: false,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Read::read(&mut self.0, buf)
    }
}

/// A writable, non-seekable stream. Packages created over it are create-only.
#[derive(Debug)]
pub struct WriteOnly<W>(pub W);

impl<W: Write> PackageStream for WriteOnly<W> {
    fn capabilities(&self) -> StreamCapabilities {
        StreamCapabilities {
            read: false,
            write: true,
            seek: false,
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut self.0, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut self.0)
    }
}
