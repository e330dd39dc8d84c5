//! Handler-level lookups
//!
//! An [`Explorer`] is one extractor bound to one file. Unlike the
//! dispatcher it never resolves across handlers: every key goes through a
//! single [`Layer`] of that handler's names.

use std::collections::BTreeMap;
use std::fmt;

use super::descriptor::{HandlerDescriptor, Layer, PropertyBinding};
use super::handler::{BoundHandler, HandlerType, lookup_outcome};
use super::types::{BoundFile, Lookup, PropertyValue};

/// A single extractor bound to a file
pub struct Explorer<'r> {
    descriptor: &'r HandlerDescriptor,
    bound: Box<dyn BoundHandler + 'r>,
    file: BoundFile,
    compatible: bool,
}

impl<'r> Explorer<'r> {
    pub(crate) fn new(handler: &'r dyn HandlerType, file: BoundFile) -> Self {
        let bound = handler.bind(file.clone());
        let compatible = bound.is_compatible();
        if !compatible {
            tracing::debug!(
                handler = handler.descriptor().name(),
                path = %file.path().display(),
                "Extractor declined file"
            );
        }

        Self {
            descriptor: handler.descriptor(),
            bound,
            file,
            compatible,
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        self.descriptor
    }

    pub fn file(&self) -> &BoundFile {
        &self.file
    }

    pub fn is_compatible(&self) -> bool {
        self.compatible
    }

    /// Value reached by `key` through `layer`
    ///
    /// [`Lookup::Unresolved`] when the layer has no such key,
    /// [`Lookup::Unavailable`] when the handler declined the file or could
    /// not produce a value.
    pub fn value(&self, layer: Layer, key: &str) -> Lookup {
        match self.descriptor.lookup(layer, key) {
            Some(binding) => self.extract(binding, key),
            None => Lookup::Unresolved,
        }
    }

    pub fn value_by_operation(&self, operation_id: &str) -> Lookup {
        self.value(Layer::Operations, operation_id)
    }

    pub fn value_by_property(&self, property: &str) -> Lookup {
        self.value(Layer::Properties, property)
    }

    pub fn value_by_alias(&self, alias: &str) -> Lookup {
        self.value(Layer::Aliases, alias)
    }

    pub fn value_by_virtual_property(&self, name: &str) -> Lookup {
        self.value(Layer::VirtualProperties, name)
    }

    /// Every value of one layer keyed by that layer's names
    ///
    /// Keys without a value are omitted.
    pub fn extract_all(&self, layer: Layer) -> BTreeMap<String, PropertyValue> {
        self.descriptor
            .entries(layer)
            .into_iter()
            .filter_map(|(key, binding)| {
                self.extract(binding, key)
                    .into_value()
                    .map(|value| (key.to_string(), value))
            })
            .collect()
    }

    fn extract(&self, binding: &PropertyBinding, key: &str) -> Lookup {
        if !self.compatible {
            return Lookup::Unavailable;
        }
        lookup_outcome(
            self.bound.extract(binding.slot),
            self.descriptor.name(),
            binding.operation,
            key,
        )
    }
}

impl fmt::Debug for Explorer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("handler", &self.descriptor.name())
            .field("file", &self.file)
            .field("compatible", &self.compatible)
            .finish_non_exhaustive()
    }
}
