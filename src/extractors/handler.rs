use std::any::TypeId;
use std::marker::PhantomData;

use super::descriptor::{CapabilityError, HandlerDescriptor};
use super::traits::Extractor;
use super::types::{BoundFile, Extraction, ExtractionError, Lookup};

/// Type-erased registered extractor type
pub(crate) trait HandlerType: Send + Sync {
    fn extractor_type(&self) -> TypeId;

    fn descriptor(&self) -> &HandlerDescriptor;

    fn bind(&self, file: BoundFile) -> Box<dyn BoundHandler + '_>;
}

/// Extractor instance bound to one file
pub(crate) trait BoundHandler {
    fn is_compatible(&self) -> bool;

    fn extract(&self, slot: usize) -> Extraction;
}

/// Operation table of `E`, captured once at registration
pub(crate) struct TypedHandler<E: Extractor> {
    descriptor: HandlerDescriptor,
    operations: Vec<fn(&E) -> Extraction>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: Extractor> TypedHandler<E> {
    pub(crate) fn new() -> Result<Self, CapabilityError> {
        let descriptor = HandlerDescriptor::of::<E>()?;
        let operations = E::operations().iter().map(|op| op.call()).collect();

        Ok(Self {
            descriptor,
            operations,
            _marker: PhantomData,
        })
    }
}

impl<E: Extractor> HandlerType for TypedHandler<E> {
    fn extractor_type(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    fn bind(&self, file: BoundFile) -> Box<dyn BoundHandler + '_> {
        Box::new(Bound {
            instance: E::bind(file),
            operations: &self.operations,
        })
    }
}

struct Bound<'a, E> {
    instance: E,
    operations: &'a [fn(&E) -> Extraction],
}

impl<E: Extractor> BoundHandler for Bound<'_, E> {
    fn is_compatible(&self) -> bool {
        self.instance.check_compatibility()
    }

    fn extract(&self, slot: usize) -> Extraction {
        match self.operations.get(slot) {
            Some(call) => call(&self.instance),
            None => Err(ExtractionError::Unavailable),
        }
    }
}

/// Fold an extraction result into a lookup outcome, logging real failures
pub(crate) fn lookup_outcome(
    extraction: Extraction,
    handler: &str,
    operation: &str,
    property: &str,
) -> Lookup {
    match extraction {
        Ok(value) => Lookup::Found(value),
        Err(ExtractionError::Unavailable) => Lookup::Unavailable,
        Err(err) => {
            tracing::warn!(handler, operation, property, error = %err, "Extraction failed");
            Lookup::Unavailable
        }
    }
}
