use super::models::Config;
use crate::extractors::BUILTIN_EXTRACTORS;
use mime::Mime;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("No extractors enabled (at least one is required)")]
    NoExtractorsEnabled,

    #[error("Unknown extractor '{name}', expected one of: {known}")]
    UnknownExtractor { name: String, known: String },

    #[error("Extractor '{name}' is enabled more than once")]
    DuplicateExtractor { name: String },

    #[error("Default property names must not be empty")]
    EmptyDefaultProperty,

    #[error("Default property '{property}' lists invalid media type '{media_type}'")]
    InvalidMediaType { property: String, media_type: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_extractors(config)?;
    validate_default_properties(config)?;
    Ok(())
}

fn validate_extractors(config: &Config) -> Result<(), ValidationError> {
    if config.extractors.enabled.is_empty() {
        return Err(ValidationError::NoExtractorsEnabled);
    }

    let mut seen = HashSet::new();
    for name in &config.extractors.enabled {
        if !BUILTIN_EXTRACTORS.contains(&name.as_str()) {
            return Err(ValidationError::UnknownExtractor {
                name: name.clone(),
                known: BUILTIN_EXTRACTORS.join(", "),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(ValidationError::DuplicateExtractor { name: name.clone() });
        }
    }

    Ok(())
}

fn validate_default_properties(config: &Config) -> Result<(), ValidationError> {
    for (property, media_types) in &config.dispatch.default_properties {
        if property.trim().is_empty() {
            return Err(ValidationError::EmptyDefaultProperty);
        }

        for media_type in media_types {
            if media_type.parse::<Mime>().is_err() {
                return Err(ValidationError::InvalidMediaType {
                    property: property.clone(),
                    media_type: media_type.clone(),
                });
            }
        }
    }

    Ok(())
}
