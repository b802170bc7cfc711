// Stored artifacts: the on-disk copies of buffers handed to the sync tool.
//
// Artifacts are written right before the tool runs and read back right after.
// Each trial overwrites the previous one's files. When the `file-io` feature is
// enabled, a SHA-256 digest is computed as bytes are written so mismatch
// reports can name the exact contents involved.

use std::ffi::OsString;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[cfg(feature = "file-io")]
use sha2::Digest;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Facts about an artifact written by [`write_artifact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStats {
    /// Where the artifact lives.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// SHA-256 of the contents (if `file-io` feature is enabled).
    pub sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An artifact could not be written or read.
#[derive(Debug, thiserror::Error)]
#[error("artifact {}: {source}", .path.display())]
pub struct IoError {
    /// The artifact path involved.
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl IoError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

/// Suffix the sync tool appends to the target path for its reconstruction.
pub const UPDATED_SUFFIX: &str = ".updated";

// ---------------------------------------------------------------------------
// write / read
// ---------------------------------------------------------------------------

/// Write `data` to `path`, replacing any previous contents.
pub fn write_artifact(path: &Path, data: &[u8]) -> Result<ArtifactStats, IoError> {
    let file = File::create(path).map_err(|e| IoError::new(path, e))?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);

    #[cfg(feature = "file-io")]
    let sha256 = {
        let mut hasher = sha2::Sha256::new();
        let mut hashing = HashingWriter {
            inner: &mut writer,
            hasher: &mut hasher,
        };
        hashing
            .write_all(data)
            .map_err(|e| IoError::new(path, e))?;
        Some(hasher.finalize().into())
    };

    #[cfg(not(feature = "file-io"))]
    let sha256: Option<[u8; 32]> = {
        writer.write_all(data).map_err(|e| IoError::new(path, e))?;
        None
    };

    writer.flush().map_err(|e| IoError::new(path, e))?;

    Ok(ArtifactStats {
        path: path.to_path_buf(),
        size: data.len() as u64,
        sha256,
    })
}

/// Read an artifact back. A missing file yields `Ok(None)`.
pub fn read_artifact(path: &Path) -> Result<Option<Vec<u8>>, IoError> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(IoError::new(path, e)),
    }
}

/// Remove a stale artifact; a missing file is not an error.
pub fn remove_artifact(path: &Path) -> Result<(), IoError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(IoError::new(path, e)),
    }
}

/// Path of the reconstruction the tool writes for target `dst`.
pub fn updated_path(dst: &Path) -> PathBuf {
    let mut name = OsString::from(dst.as_os_str());
    name.push(UPDATED_SUFFIX);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Comparison helpers
// ---------------------------------------------------------------------------

/// Offset of the first byte where `expected` and `actual` differ.
///
/// If one is a prefix of the other, the shorter length is returned. Equal
/// inputs yield `None`.
pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<u64> {
    expected
        .iter()
        .zip(actual)
        .position(|(a, b)| a != b)
        .or_else(|| (expected.len() != actual.len()).then(|| expected.len().min(actual.len())))
        .map(|pos| pos as u64)
}

/// SHA-256 of `data` (if `file-io` feature is enabled).
pub fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    #[cfg(feature = "file-io")]
    {
        Some(sha2::Sha256::digest(data).into())
    }
    #[cfg(not(feature = "file-io"))]
    {
        let _ = data;
        None
    }
}

/// Lowercase hex rendering of a digest.
pub fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Hashing writer (used with file-io feature)
// ---------------------------------------------------------------------------

#[cfg(feature = "file-io")]
struct HashingWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: &'a mut sha2::Sha256,
}

#[cfg(feature = "file-io")]
impl<W: Write> Write for HashingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
