use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use super::basic::BasicExtractor;
use super::descriptor::{CapabilityError, HandlerDescriptor};
use super::explorer::Explorer;
use super::handler::{HandlerType, TypedHandler};
use super::traits::Extractor;
use super::types::{BoundFile, HandlerId};
use crate::config::ExtractorsConfig;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("handler already registered: {0}")]
    DuplicateRegistration(String),
    #[error("incompatible handler type: {0}")]
    IncompatibleHandlerType(#[from] CapabilityError),
    #[error("handler not found: {0}")]
    NotFound(String),
}

/// Handler able to serve a property for a media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub handler: HandlerId,
    pub name: &'static str,
    pub operation: &'static str,
    /// Matched by an explicitly declared media type rather than as a universal handler
    pub specific: bool,
    pub(crate) slot: usize,
}

#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    handler: HandlerId,
    slot: usize,
}

/// Registry of extractor types and the property index built from them
///
/// Registration needs `&mut self`; once populated the registry is shared
/// read-only (typically behind an `Arc`).
#[derive(Default)]
pub struct Registry {
    handlers: Vec<Box<dyn HandlerType>>,
    /// Virtual property names in first-registration order
    properties: Vec<String>,
    /// Property -> serving handlers in registration order
    index: HashMap<String, Vec<IndexEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in extractors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<BasicExtractor>();
        registry
    }

    /// Registry holding the configured built-in extractors, in order
    pub fn from_config(config: &ExtractorsConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for name in &config.enabled {
            registry.register_named(name)?;
        }
        Ok(registry)
    }

    /// Register `E`, indexing every virtual property it serves
    pub fn try_register<E: Extractor>(&mut self) -> Result<HandlerId, RegistryError> {
        let handler = TypedHandler::<E>::new()?;

        let duplicate = self.handlers.iter().any(|registered| {
            registered.extractor_type() == handler.extractor_type()
                || registered.descriptor().name() == E::NAME
        });
        if duplicate {
            return Err(RegistryError::DuplicateRegistration(E::NAME.to_string()));
        }

        let id = HandlerId(self.handlers.len());
        for binding in handler.descriptor().virtual_properties() {
            if !self.index.contains_key(&binding.name) {
                self.properties.push(binding.name.clone());
            }
            self.index.entry(binding.name.clone()).or_default().push(IndexEntry {
                handler: id,
                slot: binding.slot,
            });
        }

        tracing::info!(
            handler = E::NAME,
            id = %id,
            properties = handler.descriptor().virtual_properties().len(),
            universal = handler.descriptor().is_universal(),
            "Registered extractor"
        );

        self.handlers.push(Box::new(handler));
        Ok(id)
    }

    /// Register `E`; `false` if it is already registered or incompatible
    pub fn register<E: Extractor>(&mut self) -> bool {
        match self.try_register::<E>() {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(handler = E::NAME, error = %err, "Extractor registration rejected");
                false
            }
        }
    }

    /// Register a built-in extractor by name
    pub fn register_named(&mut self, name: &str) -> Result<HandlerId, RegistryError> {
        match name {
            BasicExtractor::NAME => self.try_register::<BasicExtractor>(),
            _ => Err(RegistryError::NotFound(name.to_string())),
        }
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.describe_handler(name).is_some()
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.index.contains_key(property)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Registered handler names in registration order
    pub fn list_registered_handlers(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.descriptor().name()).collect()
    }

    /// Every virtual property served by at least one handler
    pub fn list_virtual_properties(&self) -> Vec<&str> {
        self.properties.iter().map(String::as_str).collect()
    }

    /// Property -> handler -> declared media types
    pub fn virtual_property_details(&self) -> BTreeMap<String, BTreeMap<String, Vec<String>>> {
        self.index
            .iter()
            .map(|(property, entries)| {
                let handlers = entries
                    .iter()
                    .map(|entry| {
                        let descriptor = self.descriptor(entry.handler);
                        (descriptor.name().to_string(), descriptor.media_types().to_vec())
                    })
                    .collect();
                (property.clone(), handlers)
            })
            .collect()
    }

    /// Names of every handler serving `property`, regardless of media type
    pub fn handlers_for_property(&self, property: &str) -> Vec<&'static str> {
        self.index
            .get(property)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| self.descriptor(entry.handler).name())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn describe_handler(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.handlers
            .iter()
            .map(|h| h.descriptor())
            .find(|d| d.name() == name)
    }

    /// Best handler for `property` on `media_type`
    ///
    /// The first handler declaring `media_type` wins; otherwise the first
    /// universal handler; otherwise `None`.
    pub fn resolve(&self, property: &str, media_type: &str) -> Option<Candidate> {
        let entries = self.index.get(property)?;
        let mut universal = None;

        for entry in entries {
            let descriptor = self.descriptor(entry.handler);
            if descriptor.declares(media_type) {
                return Some(self.candidate(entry, true));
            }
            if universal.is_none() && descriptor.is_universal() {
                universal = Some(self.candidate(entry, false));
            }
        }

        if universal.is_none() {
            tracing::debug!(property, media_type, "No handler serves property");
        }
        universal
    }

    /// Every handler able to serve `property` on `media_type`
    ///
    /// Specific matches come first, each group in registration order, so the
    /// head of the list is what [`resolve`](Self::resolve) returns.
    pub fn resolve_all(&self, property: &str, media_type: &str) -> Vec<Candidate> {
        let Some(entries) = self.index.get(property) else {
            return Vec::new();
        };

        let (mut specific, mut universal) = (Vec::new(), Vec::new());
        for entry in entries {
            let descriptor = self.descriptor(entry.handler);
            if descriptor.declares(media_type) {
                specific.push(self.candidate(entry, true));
            } else if descriptor.is_universal() {
                universal.push(self.candidate(entry, false));
            }
        }

        specific.append(&mut universal);
        specific
    }

    /// Bind the handler registered as `name` to `file` for handler-level lookups
    ///
    /// The handler is used whatever the file's media type; its own
    /// compatibility check still applies.
    pub fn explore(&self, name: &str, file: BoundFile) -> Result<Explorer<'_>, RegistryError> {
        let handler = self
            .handlers
            .iter()
            .find(|h| h.descriptor().name() == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        Ok(Explorer::new(handler.as_ref(), file))
    }

    pub(crate) fn handler(&self, id: HandlerId) -> &dyn HandlerType {
        self.handlers[id.0].as_ref()
    }

    fn descriptor(&self, id: HandlerId) -> &HandlerDescriptor {
        self.handler(id).descriptor()
    }

    fn candidate(&self, entry: &IndexEntry, specific: bool) -> Candidate {
        let descriptor = self.descriptor(entry.handler);
        let operation = descriptor
            .virtual_properties()
            .iter()
            .find(|b| b.slot == entry.slot)
            .map(|b| b.operation)
            .unwrap_or_default();

        Candidate {
            handler: entry.handler,
            name: descriptor.name(),
            operation,
            specific,
            slot: entry.slot,
        }
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.list_registered_handlers())
            .field("properties", &self.properties)
            .finish()
    }
}
