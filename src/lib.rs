pub mod config;
pub mod dispatch;
pub mod extractors;
pub mod observability;
pub mod probe;

pub use dispatch::{DispatchError, Dispatcher, Selection};
pub use extractors::{BasicExtractor, Extractor, Lookup, PropertyValue, Registry};
