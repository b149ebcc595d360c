//! Registry of conforming [`crate::extractor::Extractor`] implementations,
//! dispatched by file extension (§4.7 item 2).

pub mod javascript;
pub mod metadata;
pub mod php;
pub mod route;

use crate::extractor::Extractor;

/// All extractors known to the walker, in registration order. Several may
/// claim the same extension (`route` and `metadata` both claim `.json`);
/// the walker runs every extractor whose `supported_extensions()` matches
/// and whose name passes [`crate::config::IndexOptions::is_extractor_enabled`],
/// and each extractor internally no-ops on files it does not recognize.
pub fn registry() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(php::PhpExtractor),
        Box::new(javascript::JavaScriptExtractor),
        Box::new(route::RouteExtractor),
        Box::new(metadata::MetadataExtractor),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_includes_all_four_extractors() {
        let names: Vec<&'static str> = registry().iter().map(|e| e.name()).collect();
        assert!(names.contains(&"php"));
        assert!(names.contains(&"javascript"));
        assert!(names.contains(&"route"));
        assert!(names.contains(&"metadata"));
    }
}
