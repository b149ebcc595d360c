//! Uniform input→(vertices, edges, diagnostics) interface used by every
//! language/framework extractor (§4.3).
//!
//! Extractors are pure with respect to the graph store: they never write
//! directly, and they tolerate subprocess or parse failure by returning a
//! [`ParseResult`] whose `diagnostics` carries a fatal entry and whose
//! `vertices`/`edges` are empty.

use std::collections::HashSet;
use std::path::Path;

use crate::types::ParseResult;

/// A value of this trait converts one source file into a [`ParseResult`].
///
/// Implementations must not hold any handle to the store; the walker owns
/// batching and persistence (§4.7).
pub trait Extractor: Send + Sync {
    /// Short machine name used by [`crate::config::IndexOptions::extractor_allow_list`]
    /// (`"php"`, `"javascript"`, `"route"`, `"metadata"`).
    fn name(&self) -> &'static str;

    /// File extensions (without leading dot) this extractor claims.
    fn supported_extensions(&self) -> HashSet<&'static str>;

    /// Language tag attached to every vertex this extractor produces.
    fn language_tag(&self) -> crate::types::Language;

    /// Parse one file's bytes. Never panics: parse failures are reported as
    /// diagnostics on the returned [`ParseResult`], not as an `Err`.
    fn parse_file(&self, path: &Path, bytes: &[u8]) -> ParseResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Diagnostic, Language};

    struct AlwaysFails;

    impl Extractor for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        fn supported_extensions(&self) -> HashSet<&'static str> {
            ["xyz"].into_iter().collect()
        }

        fn language_tag(&self) -> Language {
            Language::Unknown
        }

        fn parse_file(&self, path: &Path, _bytes: &[u8]) -> ParseResult {
            ParseResult::failed(path.to_path_buf(), Diagnostic::fatal("boom"))
        }
    }

    #[test]
    fn extractor_tolerates_failure_via_diagnostics_not_panic() {
        let extractor = AlwaysFails;
        let result = extractor.parse_file(Path::new("a.xyz"), b"");
        assert!(result.vertices.is_empty());
        assert!(result.edges.is_empty());
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn supported_extensions_reports_claimed_set() {
        let extractor = AlwaysFails;
        assert!(extractor.supported_extensions().contains("xyz"));
    }
}
