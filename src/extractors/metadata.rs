//! Metadata/config JSON enricher (§6.2, §3.4 `REGISTERED_IN`; SPEC_FULL §C.1).
//!
//! Scans EspoCRM-style metadata JSON for string values that look like PHP
//! FQNs, plus the special-cased `*HookClassNameList` keys in
//! `authentication.json`. Runs a two-pass scan (authentication hooks
//! first, general FQN scan second) as a conforming [`Extractor`] rather
//! than a standalone script, so it shares the walker's batching and
//! dispatch.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;

use crate::extractor::Extractor;
use crate::identity;
use crate::types::{Diagnostic, Edge, EdgeKind, Language, ParseResult, PrimaryLabel, Vertex};

const HOOK_KEYS: &[&str] = &[
    "beforeLoginHookClassNameList",
    "onLoginHookClassNameList",
    "onFailHookClassNameList",
    "onSuccessHookClassNameList",
    "onSuccessByTokenHookClassNameList",
    "onSecondStepRequiredHookClassNameList",
];

pub struct MetadataExtractor;

impl Extractor for MetadataExtractor {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn supported_extensions(&self) -> HashSet<&'static str> {
        ["json"].into_iter().collect()
    }

    fn language_tag(&self) -> Language {
        Language::Php
    }

    fn parse_file(&self, path: &Path, bytes: &[u8]) -> ParseResult {
        if !applies_to(path) {
            return ParseResult::empty(path.to_path_buf());
        }

        let content = match std::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => {
                return ParseResult::failed(
                    path.to_path_buf(),
                    Diagnostic::fatal(format!("not valid UTF-8: {e}")),
                )
            }
        };

        let value: Value = match serde_json::from_str(content) {
            Ok(v) => v,
            Err(e) => {
                return ParseResult::failed(
                    path.to_path_buf(),
                    Diagnostic::warning(format!("invalid JSON: {e}")),
                )
            }
        };

        let file_path_str = path.to_string_lossy().to_string();
        let config_id = identity::file_id(&file_path_str);
        let mut result = ParseResult::empty(path.to_path_buf());
        result.vertices.push(Vertex::new(
            config_id.clone(),
            PrimaryLabel::ConfigFile,
            Language::Php,
            path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
            file_path_str,
        ));

        let is_authentication = path.file_name().and_then(|n| n.to_str()) == Some("authentication.json");
        if is_authentication {
            scan_authentication_hooks(&value, &config_id, &mut result);
            // HOOK_KEYS already produced their AUTHENTICATION_HOOK edges above;
            // re-walking them in the general scan would emit a second
            // RegisteredIn edge for the identical (kind, source, target) triple,
            // and the gateway's merge-by-id upsert would let whichever write
            // lands last silently overwrite the other's reference_type.
            scan_for_class_references(&value, &config_id, &[], HOOK_KEYS, &mut result);
        } else {
            scan_for_class_references(&value, &config_id, &[], &[], &mut result);
        }
        result
    }
}

/// `**/Resources/metadata/**/*.json`, `**/Custom/Resources/**/*.json`, or
/// `authentication.json` anywhere.
fn applies_to(path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    normalized.contains("/Resources/metadata/")
        || normalized.contains("/resources/metadata/")
        || normalized.contains("/Custom/Resources/")
        || path.file_name().and_then(|n| n.to_str()) == Some("authentication.json")
}

fn scan_authentication_hooks(value: &Value, config_id: &str, result: &mut ParseResult) {
    let Value::Object(map) = value else { return };
    for hook_key in HOOK_KEYS {
        let Some(Value::Array(items)) = map.get(*hook_key) else {
            continue;
        };
        for item in items {
            let Some(class_name) = item.as_str() else { continue };
            if class_name == "__APPEND__" || !looks_like_php_fqn(class_name) {
                continue;
            }
            push_reference(result, config_id, hook_key, class_name, "AUTHENTICATION_HOOK");
        }
    }
}

/// `skip_top_level_keys` excludes object keys from the scan, but only at
/// `trail.is_empty()` depth — it's how the authentication-hook keys, already
/// handled by [`scan_authentication_hooks`], are kept out of the general pass.
fn scan_for_class_references(
    value: &Value,
    config_id: &str,
    trail: &[String],
    skip_top_level_keys: &[&str],
    result: &mut ParseResult,
) {
    match value {
        Value::String(s) => {
            if looks_like_php_fqn(s) {
                let config_key = trail.join("::");
                push_reference(result, config_id, &config_key, s, "CLASS_REFERENCE");
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                if trail.is_empty() && skip_top_level_keys.contains(&key.as_str()) {
                    continue;
                }
                let mut next_trail = trail.to_vec();
                next_trail.push(key.clone());
                scan_for_class_references(child, config_id, &next_trail, skip_top_level_keys, result);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let mut next_trail = trail.to_vec();
                next_trail.push(idx.to_string());
                scan_for_class_references(child, config_id, &next_trail, skip_top_level_keys, result);
            }
        }
        _ => {}
    }
}

fn push_reference(result: &mut ParseResult, config_id: &str, config_key: &str, class_name: &str, reference_type: &str) {
    let target_id = identity::symbol_id(Language::Php, class_name);
    if !result.vertices.iter().any(|v| v.id == target_id) {
        result.vertices.push(
            Vertex::new(
                target_id.clone(),
                PrimaryLabel::Unresolved,
                Language::Php,
                class_name.rsplit('\\').next().unwrap_or(class_name).to_string(),
                class_name.to_string(),
            )
            .with_attr("expected_label", PrimaryLabel::Class.as_str()),
        );
    }
    result.edges.push(
        Edge::new(EdgeKind::RegisteredIn, target_id, config_id.to_string())
            .with_attr("config_key", config_key.to_string())
            .with_attr("reference_type", reference_type.to_string()),
    );
}

/// `^[A-Z][A-Za-z0-9_\\]+\\[A-Za-z0-9_\\]+$` per §6.2: leading uppercase
/// segment, at least one namespace separator.
fn looks_like_php_fqn(value: &str) -> bool {
    if !value.contains('\\') {
        return false;
    }
    let mut chars = value.chars();
    match chars.next() {
        Some(c) if c.is_ascii_uppercase() => {}
        _ => return false,
    }
    value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_outside_metadata_roots_is_ignored() {
        let result = MetadataExtractor.parse_file(Path::new("/r/package.json"), b"{}");
        assert!(result.vertices.is_empty());
    }

    #[test]
    fn fqn_like_string_under_metadata_root_produces_registered_in_edge() {
        let json = r#"{"className": "Espo\\Services\\Lead"}"#;
        let result = MetadataExtractor.parse_file(
            Path::new("/r/application/Espo/Resources/metadata/entityDefs/Lead.json"),
            json.as_bytes(),
        );
        assert!(result.edges.iter().any(|e| e.kind == EdgeKind::RegisteredIn));
    }

    #[test]
    fn plain_string_without_namespace_separator_is_not_treated_as_fqn() {
        let json = r#"{"label": "Lead Name"}"#;
        let result = MetadataExtractor.parse_file(
            Path::new("/r/application/Espo/Resources/metadata/entityDefs/Lead.json"),
            json.as_bytes(),
        );
        assert!(result.edges.is_empty());
    }

    #[test]
    fn authentication_json_scans_hook_class_name_lists() {
        let json = r#"{"beforeLoginHookClassNameList": ["Espo\\Hooks\\BeforeLogin", "__APPEND__"]}"#;
        let result = MetadataExtractor.parse_file(Path::new("/r/authentication.json"), json.as_bytes());
        let edge = result.edges.iter().find(|e| e.attributes.get("reference_type").is_some()).unwrap();
        assert_eq!(
            edge.attributes.get("reference_type"),
            Some(&crate::types::AttrValue::Str("AUTHENTICATION_HOOK".to_string()))
        );
    }

    #[test]
    fn authentication_hook_key_is_not_also_picked_up_by_the_general_class_reference_scan() {
        let json = r#"{"beforeLoginHookClassNameList": ["Espo\\Hooks\\BeforeLogin"]}"#;
        let result = MetadataExtractor.parse_file(Path::new("/r/authentication.json"), json.as_bytes());
        assert_eq!(result.edges.len(), 1, "hook FQN must be reported exactly once, not once per pass");
        assert_eq!(
            result.edges[0].attributes.get("reference_type"),
            Some(&crate::types::AttrValue::Str("AUTHENTICATION_HOOK".to_string()))
        );
    }

    #[test]
    fn append_sentinel_is_skipped() {
        let json = r#"{"beforeLoginHookClassNameList": ["__APPEND__"]}"#;
        let result = MetadataExtractor.parse_file(Path::new("/r/authentication.json"), json.as_bytes());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn invalid_json_yields_warning_diagnostic_not_fatal() {
        let result = MetadataExtractor.parse_file(Path::new("/r/authentication.json"), b"not json");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].severity, crate::types::Severity::Warning);
    }
}
