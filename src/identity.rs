//! Deterministic identifier derivation (§3.3, §4.1).
//!
//! Every downstream component depends only on this module for id
//! derivation: two independently produced vertices that refer to the same
//! entity must compute the same id so the store's merge-by-id upsert
//! collapses them without a separate symbol table.

use sha2::{Digest, Sha256};

use crate::types::Language;

/// `hash(identity_tuple)`: a short hex digest, stable across runs and
/// across languages implementing the same rule.
fn make_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\0");
        }
        hasher.update(part.as_bytes());
    }
    hex::encode(&hasher.finalize()[..16])
}

pub fn directory_id(absolute_path: &str) -> String {
    make_id(&[absolute_path])
}

pub fn file_id(absolute_path: &str) -> String {
    make_id(&[absolute_path])
}

pub fn namespace_id(fqn: &str) -> String {
    make_id(&["ns:", fqn])
}

/// Class/Interface/Trait/Function/Constant.
pub fn symbol_id(language: Language, fqn: &str) -> String {
    make_id(&["sym:", language.as_str(), ":", fqn])
}

/// Method/Property.
pub fn member_id(language: Language, class_fqn: &str, member_name: &str) -> String {
    make_id(&["sym:", language.as_str(), ":", class_fqn, "::", member_name])
}

pub fn module_id(absolute_path: &str) -> String {
    make_id(&["mod:", absolute_path])
}

pub fn endpoint_id(method: &str, normalized_path: &str) -> String {
    make_id(&["ep:", &method.to_ascii_uppercase(), " ", normalized_path])
}

pub fn import_site_id(importing_file: &str, module_spec: &str) -> String {
    make_id(&["imp:", importing_file, ":", module_spec])
}

pub fn api_call_site_id(caller_file: &str, line: u32, method: &str, url: &str) -> String {
    make_id(&[
        "call:",
        caller_file,
        ":",
        &line.to_string(),
        ":",
        &method.to_ascii_uppercase(),
        " ",
        url,
    ])
}

/// Unresolved placeholder. `kind` is the primary label the symbol is
/// expected to eventually carry (e.g. `"sym:php"`), `fqn_or_name` the best
/// identity string available at the point of reference.
pub fn unresolved_id(kind: &str, fqn_or_name: &str) -> String {
    make_id(&["unresolved:", kind, ":", fqn_or_name])
}

/// Collapse duplicate slashes, strip a trailing slash (except root),
/// preserve `:name`/`{name}` parameter placeholders verbatim.
pub fn normalize_endpoint_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    let mut prev_was_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_was_slash {
                continue;
            }
            prev_was_slash = true;
        } else {
            prev_was_slash = false;
        }
        normalized.push(c);
    }
    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}
