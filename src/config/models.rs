use mime::Mime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub extractors: ExtractorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Selection of properties when a request names none
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Return every virtual property even when defaults are configured
    #[serde(default)]
    pub return_everything: bool,
    /// Default property -> media types it applies to (empty = all)
    #[serde(default)]
    pub default_properties: BTreeMap<String, Vec<String>>,
}

impl DispatchConfig {
    /// Add a default property, merging media types unless `replace` is set
    pub fn add_default_property(
        &mut self,
        property: impl Into<String>,
        media_types: &[&str],
        replace: bool,
    ) {
        let media_types = media_types.iter().map(|m| media_essence(m));
        let entry = self.default_properties.entry(property.into()).or_default();

        if replace {
            entry.clear();
        }
        for media_type in media_types {
            if !entry.contains(&media_type) {
                entry.push(media_type);
            }
        }
    }

    pub fn reset_default_properties(&mut self) {
        self.default_properties.clear();
    }

    /// Rewrite every configured media type to its lowercased essence
    pub fn normalize_media_types(&mut self) {
        for media_types in self.default_properties.values_mut() {
            let mut normalized: Vec<String> = Vec::with_capacity(media_types.len());
            for media_type in media_types.iter().map(|m| media_essence(m)) {
                if !normalized.contains(&media_type) {
                    normalized.push(media_type);
                }
            }
            *media_types = normalized;
        }
    }

    /// Configured default properties that apply to `media_type`
    ///
    /// Parameters such as `; charset=utf-8` are ignored on both sides.
    pub fn default_properties_for(&self, media_type: &str) -> Vec<&str> {
        let target = media_essence(media_type);
        self.default_properties
            .iter()
            .filter(|(_, media_types)| {
                media_types.is_empty() || media_types.iter().any(|m| media_essence(m) == target)
            })
            .map(|(property, _)| property.as_str())
            .collect()
    }
}

/// Lowercased essence of a media type; unparsable input is only trimmed and
/// lowercased so validation can still report it
pub(crate) fn media_essence(raw: &str) -> String {
    match raw.trim().parse::<Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => raw.trim().to_ascii_lowercase(),
    }
}

/// Built-in extractors to register, in registration order
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtractorsConfig {
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,
}

impl Default for ExtractorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    vec!["basic".to_string()]
}

/// Tracing filter settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}
