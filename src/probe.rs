//! Filesystem probes consumed by extractors and the dispatcher
//!
//! The dispatcher never touches the filesystem directly; every stat or sniff
//! goes through a [`FileProbe`]. [`FsProbe`] is the real implementation.

use chrono::{DateTime, Utc};
use mime::Mime;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Number of leading bytes inspected when sniffing a media type
pub const SNIFF_LEN: usize = 8192;

/// Media type reported for zero-length files
pub const EMPTY_MEDIA_TYPE: &str = "application/x-empty";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("timestamp out of range for {0}")]
    Timestamp(PathBuf),
}

impl ProbeError {
    fn io(path: &Path, source: io::Error) -> Self {
        ProbeError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Primitive metadata probes
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// Best-effort media type of an existing file
    fn media_type_of(&self, path: &Path) -> Result<Mime, ProbeError>;

    fn size_of(&self, path: &Path) -> Result<u64, ProbeError>;

    fn last_modified(&self, path: &Path) -> Result<DateTime<Utc>, ProbeError>;

    /// Inode status change time (ctime)
    fn status_changed(&self, path: &Path) -> Result<DateTime<Utc>, ProbeError>;
}

/// Probe backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl FsProbe {
    fn metadata(path: &Path) -> Result<fs::Metadata, ProbeError> {
        fs::metadata(path).map_err(|e| ProbeError::io(path, e))
    }
}

impl FileProbe for FsProbe {
    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn media_type_of(&self, path: &Path) -> Result<Mime, ProbeError> {
        let file = fs::File::open(path).map_err(|e| ProbeError::io(path, e))?;
        let mut head = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .map_err(|e| ProbeError::io(path, e))?;

        Ok(sniff(&head))
    }

    fn size_of(&self, path: &Path) -> Result<u64, ProbeError> {
        Ok(Self::metadata(path)?.len())
    }

    fn last_modified(&self, path: &Path) -> Result<DateTime<Utc>, ProbeError> {
        let modified = Self::metadata(path)?
            .modified()
            .map_err(|e| ProbeError::io(path, e))?;
        utc_from_system_time(path, modified)
    }

    #[cfg(unix)]
    fn status_changed(&self, path: &Path) -> Result<DateTime<Utc>, ProbeError> {
        use std::os::unix::fs::MetadataExt;

        let metadata = Self::metadata(path)?;
        let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
        DateTime::<Utc>::from_timestamp(metadata.ctime(), nanos)
            .ok_or_else(|| ProbeError::Timestamp(path.to_path_buf()))
    }

    #[cfg(not(unix))]
    fn status_changed(&self, path: &Path) -> Result<DateTime<Utc>, ProbeError> {
        let metadata = Self::metadata(path)?;
        let changed = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| ProbeError::io(path, e))?;
        utc_from_system_time(path, changed)
    }
}

/// Checked `SystemTime` conversion; times outside chrono's range are errors
pub(crate) fn utc_from_system_time(
    path: &Path,
    time: SystemTime,
) -> Result<DateTime<Utc>, ProbeError> {
    let out_of_range = || ProbeError::Timestamp(path.to_path_buf());

    let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(after) => (
            i64::try_from(after.as_secs()).map_err(|_| out_of_range())?,
            after.subsec_nanos(),
        ),
        Err(err) => {
            let before = err.duration();
            let secs = i64::try_from(before.as_secs()).map_err(|_| out_of_range())?;
            match before.subsec_nanos() {
                0 => (-secs, 0),
                nanos => (-secs - 1, 1_000_000_000 - nanos),
            }
        }
    };

    DateTime::<Utc>::from_timestamp(secs, nanos).ok_or_else(out_of_range)
}

/// Classify leading file bytes
fn sniff(head: &[u8]) -> Mime {
    if head.is_empty() {
        return EMPTY_MEDIA_TYPE
            .parse()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    }

    if let Some(kind) = infer::get(head) {
        if let Ok(parsed) = kind.mime_type().parse::<Mime>() {
            return parsed;
        }
    }

    if looks_like_text(head) {
        mime::TEXT_PLAIN
    } else {
        mime::APPLICATION_OCTET_STREAM
    }
}

/// Valid UTF-8, tolerating a multi-byte sequence cut off by the sniff window
fn looks_like_text(head: &[u8]) -> bool {
    match std::str::from_utf8(head) {
        Ok(text) => !text.contains('\0'),
        Err(err) => err.error_len().is_none() && head.len() - err.valid_up_to() < 4,
    }
}
