use chrono::{DateTime, Utc};
use mime::Mime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::probe::{FileProbe, ProbeError};

/// Value produced by an extraction operation
///
/// Timestamps are carried as Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Integer(i64),
    Text(String),
    Flag(bool),
}

impl PropertyValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PropertyValue::Integer(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<u64> for PropertyValue {
    fn from(value: u64) -> Self {
        PropertyValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Flag(value)
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Integer(value.timestamp())
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Integer(value) => write!(f, "{value}"),
            PropertyValue::Text(value) => f.write_str(value),
            PropertyValue::Flag(value) => write!(f, "{value}"),
        }
    }
}

/// Extraction errors raised by a bound handler
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("handler cannot produce a value for this file")]
    Unavailable,
    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),
}

pub type Extraction = Result<PropertyValue, ExtractionError>;

/// Outcome of a single property lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(PropertyValue),
    /// No registered handler serves the property for this media type
    Unresolved,
    /// A handler was resolved but produced no value
    Unavailable,
}

impl Lookup {
    pub fn value(&self) -> Option<&PropertyValue> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<PropertyValue> {
        match self {
            Lookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Position of a handler type in registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HandlerId(pub(crate) usize);

impl HandlerId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Target file a handler instance is bound to
#[derive(Clone)]
pub struct BoundFile {
    path: PathBuf,
    media_type: Mime,
    probe: Arc<dyn FileProbe>,
}

impl BoundFile {
    pub fn new(path: PathBuf, media_type: Mime, probe: Arc<dyn FileProbe>) -> Self {
        Self {
            path,
            media_type,
            probe,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn media_type(&self) -> &Mime {
        &self.media_type
    }

    pub fn probe(&self) -> &dyn FileProbe {
        self.probe.as_ref()
    }
}

impl fmt::Debug for BoundFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundFile")
            .field("path", &self.path)
            .field("media_type", &self.media_type.essence_str())
            .finish_non_exhaustive()
    }
}
