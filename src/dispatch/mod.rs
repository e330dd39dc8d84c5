//! File-level dispatch API
//!
//! A [`Dispatcher`] answers "what are the values of these properties for this
//! file": it checks the file exists, sniffs its media type once, resolves
//! each property through the [`Registry`] and invokes the bound extractor.
//!
//! Every property lookup walks the same steps:
//! `Requested -> MediaTypeDetermined -> HandlerResolved -> ValueExtracted`.
//! A missing file stops the whole request with [`DispatchError::FileNotFound`];
//! any later miss only drops that one property.

mod error;
mod selection;

pub use error::{DispatchError, Result};
pub use selection::Selection;

use bon::Builder;
use mime::Mime;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::extractors::{
    BoundFile, BoundHandler, Candidate, Explorer, HandlerId, Lookup, PropertyValue, Registry,
    lookup_outcome,
};
use crate::probe::{FileProbe, FsProbe};

/// Bound extractors reused across one request
type Bindings<'a> = HashMap<HandlerId, Box<dyn BoundHandler + 'a>>;

fn default_probe() -> Arc<dyn FileProbe> {
    Arc::new(FsProbe)
}

/// Dispatches property requests for files to registered extractors
#[derive(Builder)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    #[builder(default = default_probe())]
    probe: Arc<dyn FileProbe>,
    #[builder(default)]
    settings: DispatchConfig,
}

impl Dispatcher {
    /// Dispatcher over the real filesystem with default settings
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::builder().registry(registry).build()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &DispatchConfig {
        &self.settings
    }

    /// Media type of an existing file
    pub fn media_type_of(&self, path: impl AsRef<Path>) -> Result<Mime> {
        Ok(self.open(path.as_ref())?.media_type().clone())
    }

    /// Every extractor able to serve `property` for this file, best first
    pub fn candidates(&self, path: impl AsRef<Path>, property: &str) -> Result<Vec<Candidate>> {
        let file = self.open(path.as_ref())?;
        Ok(self
            .registry
            .resolve_all(property, file.media_type().essence_str()))
    }

    /// Value of a single property
    ///
    /// Returns [`Lookup::Unresolved`] when no extractor serves the property
    /// for the file's media type and [`Lookup::Unavailable`] when the
    /// extractor could not produce a value.
    pub fn get_value(&self, path: impl AsRef<Path>, property: &str) -> Result<Lookup> {
        let file = self.open(path.as_ref())?;
        let mut bindings = Bindings::new();
        Ok(self.lookup(&file, property, &mut bindings))
    }

    /// Values of the selected properties
    ///
    /// Properties without a value are omitted; only a missing file fails the
    /// whole request.
    pub fn get_all(
        &self,
        path: impl AsRef<Path>,
        selection: impl Into<Selection>,
    ) -> Result<BTreeMap<String, PropertyValue>> {
        let file = self.open(path.as_ref())?;
        let requested = self.requested_properties(&selection.into(), &file);

        let mut bindings = Bindings::new();
        let mut values = BTreeMap::new();

        for property in requested {
            if values.contains_key(&property) {
                continue;
            }
            if let Lookup::Found(value) = self.lookup(&file, &property, &mut bindings) {
                values.insert(property, value);
            }
        }

        tracing::debug!(
            path = %file.path().display(),
            media_type = file.media_type().essence_str(),
            values = values.len(),
            "Extracted file properties"
        );

        Ok(values)
    }

    /// Bind the extractor registered as `handler` to an existing file
    pub fn explore(&self, handler: &str, path: impl AsRef<Path>) -> Result<Explorer<'_>> {
        let file = self.open(path.as_ref())?;
        self.registry
            .explore(handler, file)
            .map_err(|_| DispatchError::HandlerNotFound(handler.to_string()))
    }

    fn open(&self, path: &Path) -> Result<BoundFile> {
        if !self.probe.exists(path) {
            return Err(DispatchError::FileNotFound(path.to_path_buf()));
        }

        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let media_type = self.probe.media_type_of(&absolute).unwrap_or_else(|err| {
            tracing::warn!(
                path = %absolute.display(),
                error = %err,
                "Media type probe failed, treating file as application/octet-stream"
            );
            mime::APPLICATION_OCTET_STREAM
        });

        Ok(BoundFile::new(absolute, media_type, Arc::clone(&self.probe)))
    }

    fn requested_properties(&self, selection: &Selection, file: &BoundFile) -> Vec<String> {
        match selection {
            Selection::Single(name) => vec![name.clone()],
            Selection::Set(names) if !names.is_empty() => names.clone(),
            _ if self.settings.return_everything || self.settings.default_properties.is_empty() => {
                self.registry
                    .list_virtual_properties()
                    .into_iter()
                    .map(String::from)
                    .collect()
            }
            _ => self
                .settings
                .default_properties_for(file.media_type().essence_str())
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    fn lookup<'a>(&'a self, file: &BoundFile, property: &str, bindings: &mut Bindings<'a>) -> Lookup {
        let Some(candidate) = self
            .registry
            .resolve(property, file.media_type().essence_str())
        else {
            return Lookup::Unresolved;
        };

        let bound = bindings
            .entry(candidate.handler)
            .or_insert_with(|| self.registry.handler(candidate.handler).bind(file.clone()));

        if !bound.is_compatible() {
            tracing::debug!(
                handler = candidate.name,
                path = %file.path().display(),
                "Extractor declined file"
            );
            return Lookup::Unavailable;
        }

        lookup_outcome(
            bound.extract(candidate.slot),
            candidate.name,
            candidate.operation,
            property,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{
        BasicExtractor, Extraction, ExtractionError, Extractor, Layer, Operation,
    };
    use crate::probe::test_support::{StaticFile, StaticProbe};

    const SAMPLE: &str = "/fixtures/sample.txt";
    const IMAGE: &str = "/fixtures/photo.png";
    const BROKEN: &str = "/fixtures/broken.txt";
    const FAR_FUTURE: &str = "/fixtures/far-future.txt";
    const UNSNIFFABLE: &str = "/fixtures/locked.png";
    const STAMP: i64 = 1531556313;
    const BEYOND_CHRONO: i64 = 99_999_999_999_999;

    struct PngExtractor {
        file: BoundFile,
    }

    impl PngExtractor {
        fn width(&self) -> Extraction {
            Ok(PropertyValue::Integer(640))
        }

        fn size(&self) -> Extraction {
            Ok(PropertyValue::Integer(-1))
        }

        fn thumbnail(&self) -> Extraction {
            Err(ExtractionError::Unavailable)
        }
    }

    impl Extractor for PngExtractor {
        const NAME: &'static str = "png";
        const MEDIA_TYPES: &'static [&'static str] = &["image/png"];

        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::conventional("get_width_property", Self::width),
                Operation::conventional("get_size_property", Self::size),
                Operation::conventional("get_thumbnail_property", Self::thumbnail),
            ]
        }

        fn bind(file: BoundFile) -> Self {
            Self { file }
        }

        fn check_compatibility(&self) -> bool {
            self.file.media_type().essence_str() == "image/png"
        }
    }

    struct Picky;

    impl Extractor for Picky {
        const NAME: &'static str = "picky";
        const MEDIA_TYPES: &'static [&'static str] = &["text/plain"];

        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::new("lines", "count_lines", |_: &Self| Ok(PropertyValue::Integer(3)))]
        }

        fn bind(_file: BoundFile) -> Self {
            Picky
        }

        fn check_compatibility(&self) -> bool {
            false
        }
    }

    fn probe() -> StaticProbe {
        StaticProbe::new()
            .with_file(SAMPLE, StaticFile::new("text/plain", 9399, STAMP, STAMP))
            .with_file(IMAGE, StaticFile::new("image/png", 2048, STAMP, STAMP + 60))
            .with_broken_file(BROKEN, StaticFile::new("text/plain", 0, 0, 0))
            .with_file(
                FAR_FUTURE,
                StaticFile::new("text/plain", 5, BEYOND_CHRONO, STAMP),
            )
            .with_unsniffable_file(UNSNIFFABLE, StaticFile::new("image/png", 2048, STAMP, STAMP))
    }

    fn dispatcher(registry: Registry, settings: DispatchConfig) -> Dispatcher {
        Dispatcher::builder()
            .registry(Arc::new(registry))
            .probe(Arc::new(probe()))
            .settings(settings)
            .build()
    }

    fn return_everything() -> DispatchConfig {
        DispatchConfig {
            return_everything: true,
            ..DispatchConfig::default()
        }
    }

    fn expected(pairs: &[(&str, i64)]) -> BTreeMap<String, PropertyValue> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), PropertyValue::Integer(*value)))
            .collect()
    }

    #[test]
    fn test_get_all_returns_every_virtual_property() {
        let dispatcher = dispatcher(Registry::with_defaults(), return_everything());
        let values = dispatcher.get_all(SAMPLE, Selection::Set(Vec::new())).unwrap();

        assert_eq!(
            values,
            expected(&[
                ("created", STAMP),
                ("edited", STAMP),
                ("size", 9399),
                ("filesize", 9399),
            ])
        );
    }

    #[test]
    fn test_get_all_drops_unknown_properties() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());
        let values = dispatcher
            .get_all(SAMPLE, ["created", "edited", "size", "length"])
            .unwrap();

        assert_eq!(
            values,
            expected(&[("created", STAMP), ("edited", STAMP), ("size", 9399)])
        );
    }

    #[test]
    fn test_get_all_single_property() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());

        assert_eq!(
            dispatcher.get_all(SAMPLE, "filesize").unwrap(),
            expected(&[("filesize", 9399)])
        );
        assert!(dispatcher.get_all(SAMPLE, "length").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error_not_an_empty_map() {
        let dispatcher = dispatcher(Registry::with_defaults(), return_everything());

        assert!(matches!(
            dispatcher.get_all("/fixtures/missing.txt", Selection::Unspecified),
            Err(DispatchError::FileNotFound(_))
        ));
        assert!(matches!(
            dispatcher.get_value("/fixtures/missing.txt", "length"),
            Err(DispatchError::FileNotFound(_))
        ));
        assert!(matches!(
            dispatcher.media_type_of("/fixtures/missing.txt"),
            Err(DispatchError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_property_is_unresolved() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());
        assert_eq!(dispatcher.get_value(SAMPLE, "length").unwrap(), Lookup::Unresolved);
    }

    #[test]
    fn test_alias_matches_canonical_property() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());

        for path in [SAMPLE, IMAGE] {
            let alias = dispatcher.get_value(path, "filesize").unwrap();
            let canonical = dispatcher.get_value(path, "size").unwrap();
            assert!(alias.is_found());
            assert_eq!(alias, canonical);
        }
    }

    #[test]
    fn test_specific_extractor_wins_for_its_media_type() {
        let mut registry = Registry::with_defaults();
        assert!(registry.register::<PngExtractor>());
        let dispatcher = dispatcher(registry, DispatchConfig::default());

        assert_eq!(
            dispatcher.get_value(IMAGE, "size").unwrap(),
            Lookup::Found(PropertyValue::Integer(-1))
        );
        assert_eq!(
            dispatcher.get_value(SAMPLE, "size").unwrap(),
            Lookup::Found(PropertyValue::Integer(9399))
        );
        assert_eq!(dispatcher.get_value(SAMPLE, "width").unwrap(), Lookup::Unresolved);

        let candidates = dispatcher.candidates(IMAGE, "size").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "png");
    }

    #[test]
    fn test_unavailable_value_is_omitted_from_batch() {
        let mut registry = Registry::with_defaults();
        assert!(registry.register::<PngExtractor>());
        let dispatcher = dispatcher(registry, DispatchConfig::default());

        assert_eq!(dispatcher.get_value(IMAGE, "thumbnail").unwrap(), Lookup::Unavailable);

        let values = dispatcher.get_all(IMAGE, ["thumbnail", "width"]).unwrap();
        assert_eq!(values, expected(&[("width", 640)]));
    }

    #[test]
    fn test_incompatible_extractor_yields_unavailable() {
        let mut registry = Registry::new();
        assert!(registry.register::<Picky>());
        let dispatcher = dispatcher(registry, DispatchConfig::default());

        assert_eq!(dispatcher.get_value(SAMPLE, "lines").unwrap(), Lookup::Unavailable);
    }

    #[test]
    fn test_probe_failure_does_not_abort_batch() {
        let dispatcher = dispatcher(Registry::with_defaults(), return_everything());

        assert_eq!(dispatcher.get_value(BROKEN, "size").unwrap(), Lookup::Unavailable);
        assert!(dispatcher.get_all(BROKEN, Selection::Unspecified).unwrap().is_empty());
    }

    #[test]
    fn test_out_of_range_mtime_is_unavailable() {
        let dispatcher = dispatcher(Registry::with_defaults(), return_everything());

        assert_eq!(dispatcher.get_value(FAR_FUTURE, "edited").unwrap(), Lookup::Unavailable);
        assert_eq!(dispatcher.get_value(FAR_FUTURE, "created").unwrap(), Lookup::Unavailable);
        assert_eq!(
            dispatcher.get_all(FAR_FUTURE, Selection::Unspecified).unwrap(),
            expected(&[("size", 5), ("filesize", 5)])
        );
    }

    #[test]
    fn test_unreadable_media_type_falls_back_to_universal_extractors() {
        let mut registry = Registry::with_defaults();
        assert!(registry.register::<PngExtractor>());
        let dispatcher = dispatcher(registry, return_everything());

        assert_eq!(
            dispatcher.media_type_of(UNSNIFFABLE).unwrap(),
            mime::APPLICATION_OCTET_STREAM
        );
        assert_eq!(
            dispatcher.get_value(UNSNIFFABLE, "size").unwrap(),
            Lookup::Found(PropertyValue::Integer(2048))
        );
        assert_eq!(dispatcher.get_value(UNSNIFFABLE, "width").unwrap(), Lookup::Unresolved);

        let values = dispatcher.get_all(UNSNIFFABLE, Selection::Unspecified).unwrap();
        assert_eq!(
            values,
            expected(&[
                ("created", STAMP),
                ("edited", STAMP),
                ("size", 2048),
                ("filesize", 2048),
            ])
        );
    }

    #[test]
    fn test_defaults_are_filtered_by_media_type() {
        let mut settings = DispatchConfig::default();
        settings.add_default_property("size", &[], false);
        settings.add_default_property("created", &["image/png"], false);
        let dispatcher = dispatcher(Registry::with_defaults(), settings);

        assert_eq!(
            dispatcher.get_all(SAMPLE, Selection::Unspecified).unwrap(),
            expected(&[("size", 9399)])
        );
        assert_eq!(
            dispatcher.get_all(IMAGE, Selection::Unspecified).unwrap(),
            expected(&[("created", STAMP), ("size", 2048)])
        );
    }

    #[test]
    fn test_return_everything_overrides_defaults() {
        let mut settings = return_everything();
        settings.add_default_property("size", &[], false);
        let dispatcher = dispatcher(Registry::with_defaults(), settings);

        assert_eq!(dispatcher.get_all(SAMPLE, Selection::Unspecified).unwrap().len(), 4);
    }

    #[test]
    fn test_no_defaults_falls_back_to_everything() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());
        assert_eq!(dispatcher.get_all(SAMPLE, None::<&str>).unwrap().len(), 4);
    }

    #[test]
    fn test_empty_registry_yields_empty_map() {
        let dispatcher = dispatcher(Registry::new(), DispatchConfig::default());
        assert!(dispatcher.get_all(SAMPLE, Selection::Unspecified).unwrap().is_empty());
    }

    #[test]
    fn test_explore_handler_layers() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());
        let explorer = dispatcher.explore("basic", SAMPLE).unwrap();

        assert_eq!(explorer.file().media_type().essence_str(), "text/plain");
        assert_eq!(
            explorer.value_by_alias("filesize"),
            Lookup::Found(PropertyValue::Integer(9399))
        );
        assert_eq!(explorer.value_by_alias("size"), Lookup::Unresolved);
        assert_eq!(
            explorer.extract_all(Layer::Operations),
            expected(&[
                ("get_created_property", STAMP),
                ("get_edited_property", STAMP),
                ("get_size_property", 9399),
            ])
        );
    }

    #[test]
    fn test_explore_errors() {
        let dispatcher = dispatcher(Registry::with_defaults(), DispatchConfig::default());

        assert!(matches!(
            dispatcher.explore("basic", "/fixtures/missing.txt"),
            Err(DispatchError::FileNotFound(_))
        ));

        let err = dispatcher.explore("exif", SAMPLE).unwrap_err();
        assert!(matches!(err, DispatchError::HandlerNotFound(ref name) if name == "exif"));
        assert_eq!(err.code(), "HANDLER_NOT_FOUND");
    }

    #[test]
    fn test_media_type_of() {
        let dispatcher = dispatcher(Registry::new(), DispatchConfig::default());
        assert_eq!(dispatcher.media_type_of(IMAGE).unwrap().essence_str(), "image/png");
    }

    #[test]
    fn test_basic_extractor_is_default_registration() {
        let dispatcher = Dispatcher::new(Arc::new(Registry::with_defaults()));
        assert_eq!(dispatcher.registry().list_registered_handlers(), vec![BasicExtractor::NAME]);
        assert!(!dispatcher.settings().return_everything);
    }
}
