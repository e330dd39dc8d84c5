//! Capability descriptors
//!
//! A [`HandlerDescriptor`] is the static view of one extractor type: which
//! properties it declares, which aliases resolve to them and which media
//! types it serves. It is derived from the extractor's declarations alone,
//! so computing it twice yields the same value.

use mime::Mime;
use serde::Serialize;
use thiserror::Error;

use super::traits::Extractor;

/// Prefix of conventionally named operation ids
pub const OPERATION_PREFIX: &str = "get_";
/// Suffix of conventionally named operation ids
pub const OPERATION_SUFFIX: &str = "_property";
/// Ids reserved by the dispatch contract; never exposed as properties
pub const RESERVED_OPERATIONS: &[&str] = &["get_value_property", "get_virtual_property"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("handler name is empty")]
    EmptyName,
    #[error("handler '{handler}' declares an empty property name for operation '{operation}'")]
    EmptyProperty {
        handler: String,
        operation: String,
    },
    #[error("handler '{handler}' declares property '{property}' more than once")]
    DuplicateProperty { handler: String, property: String },
    #[error("handler '{handler}' declares operation '{operation}' more than once")]
    DuplicateOperation { handler: String, operation: String },
    #[error("handler '{handler}' declares invalid media type '{media_type}'")]
    InvalidMediaType { handler: String, media_type: String },
}

/// A property name bound to one of the handler's operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyBinding {
    pub name: String,
    pub operation: &'static str,
    /// Index into the extractor's operation table
    #[serde(skip)]
    pub(crate) slot: usize,
}

/// Static capabilities of one extractor type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerDescriptor {
    name: &'static str,
    media_types: Vec<String>,
    properties: Vec<PropertyBinding>,
    aliases: Vec<PropertyBinding>,
    virtual_properties: Vec<PropertyBinding>,
}

impl HandlerDescriptor {
    /// Derive the descriptor of `E`, rejecting inconsistent declarations
    pub fn of<E: Extractor>() -> Result<Self, CapabilityError> {
        if E::NAME.trim().is_empty() {
            return Err(CapabilityError::EmptyName);
        }

        let media_types = parse_media_types(E::NAME, E::MEDIA_TYPES)?;
        let properties = discover_operations::<E>()?;
        let aliases = resolve_alias_operations(E::NAME, &properties, E::ALIASES);
        let virtual_properties = merge_virtual_properties(&properties, &aliases);

        Ok(Self {
            name: E::NAME,
            media_types,
            properties,
            aliases,
            virtual_properties,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared media type essences; empty for a universal handler
    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    pub fn is_universal(&self) -> bool {
        self.media_types.is_empty()
    }

    /// Whether the handler declares `media_type` explicitly
    pub fn declares(&self, media_type: &str) -> bool {
        self.media_types
            .iter()
            .any(|declared| declared.eq_ignore_ascii_case(media_type))
    }

    pub fn properties(&self) -> &[PropertyBinding] {
        &self.properties
    }

    pub fn aliases(&self) -> &[PropertyBinding] {
        &self.aliases
    }

    /// Declared properties followed by resolved aliases
    pub fn virtual_properties(&self) -> &[PropertyBinding] {
        &self.virtual_properties
    }

    pub fn binding(&self, name: &str) -> Option<&PropertyBinding> {
        self.virtual_properties.iter().find(|b| b.name == name)
    }

    /// Keys of one naming layer paired with their bindings, in declaration order
    pub fn entries(&self, layer: Layer) -> Vec<(&str, &PropertyBinding)> {
        let bindings = match layer {
            Layer::Operations => {
                return self.properties.iter().map(|b| (b.operation, b)).collect();
            }
            Layer::Properties => &self.properties,
            Layer::Aliases => &self.aliases,
            Layer::VirtualProperties => &self.virtual_properties,
        };

        bindings.iter().map(|b| (b.name.as_str(), b)).collect()
    }

    /// Binding reached by `key` through one naming layer
    pub fn lookup(&self, layer: Layer, key: &str) -> Option<&PropertyBinding> {
        self.entries(layer)
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, binding)| binding)
    }
}

/// Naming layer a handler-level lookup goes through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    /// Operation ids such as `get_size_property`
    Operations,
    /// Declared property names, aliases excluded
    Properties,
    /// Resolved aliases only
    Aliases,
    /// Declared properties plus aliases
    #[default]
    VirtualProperties,
}

/// Property name for a conventionally named operation id
///
/// `get_size_property` becomes `size`, `get_Created_property` becomes
/// `created`. Reserved ids and ids without the prefix/suffix yield `None`.
pub fn property_name_for(operation_id: &str) -> Option<String> {
    if RESERVED_OPERATIONS.contains(&operation_id) {
        return None;
    }

    let stem = operation_id
        .strip_prefix(OPERATION_PREFIX)?
        .strip_suffix(OPERATION_SUFFIX)?;

    let mut chars = stem.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

/// Ordered property → operation table of `E`
pub fn discover_operations<E: Extractor>() -> Result<Vec<PropertyBinding>, CapabilityError> {
    let mut bindings: Vec<PropertyBinding> = Vec::new();
    let mut seen: Vec<&'static str> = Vec::new();

    for (slot, operation) in E::operations().iter().enumerate() {
        if seen.contains(&operation.id()) {
            return Err(CapabilityError::DuplicateOperation {
                handler: E::NAME.to_string(),
                operation: operation.id().to_string(),
            });
        }
        seen.push(operation.id());

        if RESERVED_OPERATIONS.contains(&operation.id()) {
            tracing::debug!(
                handler = E::NAME,
                operation = operation.id(),
                "Operation id is reserved, skipping"
            );
            continue;
        }

        let name = match operation.property() {
            Some(property) if property.trim().is_empty() => {
                return Err(CapabilityError::EmptyProperty {
                    handler: E::NAME.to_string(),
                    operation: operation.id().to_string(),
                });
            }
            Some(property) => property.to_string(),
            None => match property_name_for(operation.id()) {
                Some(name) => name,
                None => {
                    tracing::debug!(
                        handler = E::NAME,
                        operation = operation.id(),
                        "Operation does not follow the naming convention, skipping"
                    );
                    continue;
                }
            },
        };

        if bindings.iter().any(|b| b.name == name) {
            return Err(CapabilityError::DuplicateProperty {
                handler: E::NAME.to_string(),
                property: name,
            });
        }

        bindings.push(PropertyBinding {
            name,
            operation: operation.id(),
            slot,
        });
    }

    Ok(bindings)
}

/// Resolve alias targets against declared properties, then operation ids
///
/// Aliases whose target matches neither are dropped.
pub fn resolve_alias_operations(
    handler: &str,
    declared: &[PropertyBinding],
    aliases: &[(&'static str, &'static str)],
) -> Vec<PropertyBinding> {
    let mut resolved: Vec<PropertyBinding> = Vec::new();

    for &(alias, target) in aliases {
        if resolved.iter().any(|b| b.name == alias) {
            continue;
        }

        let found = declared
            .iter()
            .find(|b| b.name == target)
            .or_else(|| declared.iter().find(|b| b.operation == target));

        match found {
            Some(binding) => resolved.push(PropertyBinding {
                name: alias.to_string(),
                operation: binding.operation,
                slot: binding.slot,
            }),
            None => {
                tracing::debug!(handler, alias, target, "Dropping unresolved alias");
            }
        }
    }

    resolved
}

/// Declared properties plus aliases that do not shadow one of them
fn merge_virtual_properties(
    declared: &[PropertyBinding],
    aliases: &[PropertyBinding],
) -> Vec<PropertyBinding> {
    let mut merged = declared.to_vec();
    for alias in aliases {
        if !merged.iter().any(|b| b.name == alias.name) {
            merged.push(alias.clone());
        }
    }
    merged
}

fn parse_media_types(handler: &str, declared: &[&str]) -> Result<Vec<String>, CapabilityError> {
    let mut media_types: Vec<String> = Vec::new();

    for raw in declared {
        let parsed: Mime = raw.parse().map_err(|_| CapabilityError::InvalidMediaType {
            handler: handler.to_string(),
            media_type: raw.to_string(),
        })?;

        let essence = parsed.essence_str().to_ascii_lowercase();
        if !media_types.contains(&essence) {
            media_types.push(essence);
        }
    }

    Ok(media_types)
}
