use chrono::{DateTime, Utc};

use super::traits::{Extractor, Operation};
use super::types::{BoundFile, Extraction};

/// Creation time approximated as the earlier of mtime and ctime
///
/// Most filesystems expose no birth time through the probes used here, so
/// this is a heuristic, not a true creation timestamp.
pub fn approximate_creation_time(
    modified: DateTime<Utc>,
    status_changed: DateTime<Utc>,
) -> DateTime<Utc> {
    modified.min(status_changed)
}

/// Built-in universal extractor for size and timestamps
///
/// Serves `created`, `edited` and `size` for every media type, plus the
/// `filesize` alias.
#[derive(Debug, Clone)]
pub struct BasicExtractor {
    file: BoundFile,
}

impl BasicExtractor {
    fn created(&self) -> Extraction {
        let probe = self.file.probe();
        let modified = probe.last_modified(self.file.path())?;
        let changed = probe.status_changed(self.file.path())?;

        Ok(approximate_creation_time(modified, changed).into())
    }

    fn edited(&self) -> Extraction {
        Ok(self.file.probe().last_modified(self.file.path())?.into())
    }

    fn size(&self) -> Extraction {
        Ok(self.file.probe().size_of(self.file.path())?.into())
    }
}

impl Extractor for BasicExtractor {
    const NAME: &'static str = "basic";
    const ALIASES: &'static [(&'static str, &'static str)] = &[("filesize", "size")];

    fn operations() -> Vec<Operation<Self>> {
        vec![
            Operation::conventional("get_created_property", Self::created),
            Operation::conventional("get_edited_property", Self::edited),
            Operation::conventional("get_size_property", Self::size),
        ]
    }

    fn bind(file: BoundFile) -> Self {
        Self { file }
    }
}
