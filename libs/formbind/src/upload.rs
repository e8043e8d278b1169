use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use tempfile::{NamedTempFile, TempPath};

/// `Read + Seek`, boxable.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

// ═══════════════════════════════════════════════════════════════
//  Uploaded entry
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
enum Content {
    Memory(Bytes),
    Temp(Arc<TempPath>),
}

impl Content {
    fn open(&self) -> io::Result<Box<dyn ReadSeek + Send>> {
        Ok(match self {
            Content::Memory(bytes) => Box::new(Cursor::new(bytes.clone())),
            Content::Temp(path) => Box::new(File::open(&**path)?),
        })
    }
}

/// One uploaded file, already decoded from the transport.
///
/// Every view (`to_bytes`, `open`, `open_file`, `header`) starts from the
/// beginning of the content, independent of views taken before it.
#[derive(Debug, Clone)]
pub struct UploadedEntry {
    original_name: String,
    size: u64,
    content: Content,
    /// Temp copy of in-memory content, written on first `open_file` and
    /// shared by every clone of the entry.
    spilled: Arc<OnceLock<TempPath>>,
}

impl UploadedEntry {
    pub fn in_memory(original_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            original_name: original_name.into(),
            size: bytes.len() as u64,
            content: Content::Memory(bytes),
            spilled: Arc::default(),
        }
    }

    /// Entry backed by an existing temp file; the file is removed when the
    /// last clone of the entry is dropped.
    pub fn from_temp(original_name: impl Into<String>, path: TempPath) -> io::Result<Self> {
        let size = std::fs::metadata(&path)?.len();
        Ok(Self {
            original_name: original_name.into(),
            size,
            content: Content::Temp(Arc::new(path)),
            spilled: Arc::default(),
        })
    }

    /// Keep `bytes` in memory, or write them to a temp file when they are
    /// larger than `threshold`.
    pub fn spill(
        original_name: impl Into<String>,
        bytes: impl Into<Bytes>,
        threshold: u64,
    ) -> io::Result<Self> {
        let bytes = bytes.into();
        if bytes.len() as u64 <= threshold {
            return Ok(Self::in_memory(original_name, bytes));
        }
        let path = write_temp(&bytes)?;
        Self::from_temp(original_name, path)
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn is_in_memory(&self) -> bool {
        matches!(self.content, Content::Memory(_))
    }

    /// Full copy of the content.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        match &self.content {
            Content::Memory(bytes) => Ok(bytes.to_vec()),
            Content::Temp(path) => std::fs::read(&**path),
        }
    }

    /// Fresh seekable reader positioned at the start.
    pub fn open(&self) -> io::Result<Box<dyn ReadSeek + Send>> {
        self.content.open()
    }

    /// Path of the temp-backed copy, writing it first if the content is
    /// still in memory.
    pub fn materialize(&self) -> io::Result<&Path> {
        let bytes = match &self.content {
            Content::Temp(path) => return Ok(&***path),
            Content::Memory(bytes) => bytes,
        };
        if self.spilled.get().is_none() {
            let path = write_temp(bytes)?;
            tracing::debug!(file = %self.original_name, size = self.size, path = %path.display(), "upload materialized");
            let _ = self.spilled.set(path);
        }
        match self.spilled.get() {
            Some(path) => Ok(&**path),
            None => Err(io::Error::other("temp copy vanished")),
        }
    }

    /// Fresh handle on the temp-backed copy.
    pub fn open_file(&self) -> io::Result<(File, PathBuf)> {
        let path = self.materialize()?;
        Ok((File::open(path)?, path.to_path_buf()))
    }

    pub fn header(&self) -> FileHeader {
        FileHeader {
            filename: self.original_name.clone(),
            size: self.size,
            content: Some(self.content.clone()),
        }
    }
}

fn write_temp(bytes: &[u8]) -> io::Result<TempPath> {
    let mut file = NamedTempFile::new()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}

// ═══════════════════════════════════════════════════════════════
//  Consumption shapes
// ═══════════════════════════════════════════════════════════════

/// Upload copied into a byte buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBytes(pub Vec<u8>);

impl UploadBytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for UploadBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Upload as a one-shot reader. Reads nothing until bound.
pub struct UploadReader(pub(crate) Box<dyn Read + Send>);

impl Default for UploadReader {
    fn default() -> Self {
        Self(Box::new(io::empty()))
    }
}

impl Read for UploadReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl fmt::Debug for UploadReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UploadReader(..)")
    }
}

/// Upload as a seekable reader. Empty until bound.
pub struct UploadSeeker(pub(crate) Box<dyn ReadSeek + Send>);

impl Default for UploadSeeker {
    fn default() -> Self {
        Self(Box::new(Cursor::new(Vec::new())))
    }
}

impl Read for UploadSeeker {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Seek for UploadSeeker {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.seek(pos)
    }
}

impl fmt::Debug for UploadSeeker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UploadSeeker(..)")
    }
}

/// Upload as an open handle on a temp file.
///
/// The file is owned by the `AttachmentSet`; `path` stays valid only while
/// the set is alive.
#[derive(Debug, Default)]
pub struct UploadFile {
    pub(crate) file: Option<File>,
    pub(crate) path: Option<PathBuf>,
}

impl UploadFile {
    pub fn file(&self) -> Option<&File> {
        self.file.as_ref()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn into_file(self) -> Option<File> {
        self.file
    }

    fn bound(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no upload bound"))
    }
}

impl Read for UploadFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.bound()?.read(buf)
    }
}

impl Seek for UploadFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.bound()?.seek(pos)
    }
}

/// Upload metadata: the submitted filename plus re-openable content.
#[derive(Debug, Clone, Default)]
pub struct FileHeader {
    pub filename: String,
    pub size: u64,
    content: Option<Content>,
}

impl FileHeader {
    /// Fresh reader over the content.
    pub fn open(&self) -> io::Result<Box<dyn ReadSeek + Send>> {
        match &self.content {
            Some(content) => content.open(),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no upload bound")),
        }
    }
}
