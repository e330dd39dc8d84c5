use std::fmt;

use super::types::{BoundFile, Extraction};

/// Extraction operation exposed by an extractor
///
/// An operation either names its property explicitly or leaves it to be
/// derived from its id (see [`property_name_for`](super::descriptor::property_name_for)).
pub struct Operation<E> {
    id: &'static str,
    property: Option<&'static str>,
    call: fn(&E) -> Extraction,
}

impl<E> Operation<E> {
    /// Operation served under an explicit property name
    pub fn new(property: &'static str, id: &'static str, call: fn(&E) -> Extraction) -> Self {
        Self {
            id,
            property: Some(property),
            call,
        }
    }

    /// Operation whose property name follows from `get_<name>_property`
    pub fn conventional(id: &'static str, call: fn(&E) -> Extraction) -> Self {
        Self {
            id,
            property: None,
            call,
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn property(&self) -> Option<&'static str> {
        self.property
    }

    pub(crate) fn call(&self) -> fn(&E) -> Extraction {
        self.call
    }
}

impl<E> Clone for Operation<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Operation<E> {}

impl<E> fmt::Debug for Operation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("property", &self.property)
            .finish()
    }
}

/// Extractor trait for per-file metadata handlers
///
/// Capabilities are declared up front: the registry reads [`NAME`](Self::NAME),
/// [`MEDIA_TYPES`](Self::MEDIA_TYPES), [`ALIASES`](Self::ALIASES) and
/// [`operations`](Self::operations) once at registration and never again.
/// Instances are created per request via [`bind`](Self::bind).
pub trait Extractor: Sized + Send + Sync + 'static {
    /// Unique handler name
    const NAME: &'static str;

    /// Media types this extractor serves; empty means every media type
    const MEDIA_TYPES: &'static [&'static str] = &[];

    /// `(alias, target)` pairs; the target is a property name or an operation id
    const ALIASES: &'static [(&'static str, &'static str)] = &[];

    /// Declared extraction operations, in declaration order
    fn operations() -> Vec<Operation<Self>>;

    /// Bind a new instance to a file
    fn bind(file: BoundFile) -> Self;

    /// Runtime check against the bound file
    fn check_compatibility(&self) -> bool {
        true
    }
}
