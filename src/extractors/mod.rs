//! Extractor system for finfo
//!
//! Extractors declare which properties they can read from a file and for
//! which media types. The [`Registry`] indexes those declarations once and
//! answers "which extractor serves property P for media type M".
//!
//! ## Key Components
//!
//! - [`Extractor`] - Trait implemented by every extractor type
//! - [`BasicExtractor`] - Built-in universal extractor (size, timestamps)
//! - [`Registry`] - Property index and best-match resolution
//! - [`HandlerDescriptor`] - Static capabilities of one extractor type
//! - [`Explorer`] - One extractor bound to one file, queried per naming [`Layer`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use finfo::extractors::{BasicExtractor, Registry};
//!
//! let mut registry = Registry::new();
//! assert!(registry.register::<BasicExtractor>());
//!
//! let candidate = registry.resolve("size", "image/png").unwrap();
//! assert_eq!(candidate.name, "basic");
//! ```

mod basic;
mod descriptor;
mod explorer;
mod handler;
mod registry;
mod traits;
mod types;

pub use basic::{BasicExtractor, approximate_creation_time};
pub use descriptor::{
    CapabilityError, HandlerDescriptor, Layer, OPERATION_PREFIX, OPERATION_SUFFIX,
    PropertyBinding, RESERVED_OPERATIONS, discover_operations, property_name_for,
    resolve_alias_operations,
};
pub use explorer::Explorer;
pub(crate) use handler::{BoundHandler, lookup_outcome};
pub use registry::{Candidate, Registry, RegistryError};
pub use traits::{Extractor, Operation};
pub use types::{
    BoundFile, Extraction, ExtractionError, HandlerId, Lookup, PropertyValue,
};

/// Names accepted by [`Registry::register_named`]
pub const BUILTIN_EXTRACTORS: &[&str] = &[BasicExtractor::NAME];
