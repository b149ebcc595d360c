//! Route/framework extractor (§4.6).
//!
//! §4.6 leaves the concrete route-table surface pluggable, so this
//! implements one concrete, defensible realization: a JSON route table named
//! `routes.json` whose entries look like
//! `{"route": "/Lead/:id", "method": "get", "controller": "Lead", "action": "read"}`,
//! the shape EspoCRM's own `application/*/Resources/routes.json` files use.
//! Any other `.json` file is left alone (handled by
//! [`super::metadata`] instead).

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::extractor::Extractor;
use crate::identity;
use crate::types::{Diagnostic, Edge, EdgeKind, Language, ParseResult, PrimaryLabel, Vertex};

#[derive(Deserialize)]
struct RouteEntry {
    route: String,
    method: String,
    controller: Option<String>,
    action: Option<String>,
    #[serde(rename = "className")]
    class_name: Option<String>,
}

pub struct RouteExtractor;

impl Extractor for RouteExtractor {
    fn name(&self) -> &'static str {
        "route"
    }

    fn supported_extensions(&self) -> HashSet<&'static str> {
        ["json"].into_iter().collect()
    }

    fn language_tag(&self) -> Language {
        Language::Framework
    }

    fn parse_file(&self, path: &Path, bytes: &[u8]) -> ParseResult {
        if path.file_name().and_then(|n| n.to_str()) != Some("routes.json") {
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

        let entries: Vec<RouteEntry> = match serde_json::from_str(content) {
            Ok(entries) => entries,
            Err(e) => {
                return ParseResult::failed(
                    path.to_path_buf(),
                    Diagnostic::fatal(format!("malformed route table: {e}")),
                )
            }
        };

        let mut result = ParseResult::empty(path.to_path_buf());
        for entry in entries {
            let method = entry.method.to_ascii_uppercase();
            let normalized = identity::normalize_endpoint_path(&entry.route);
            let endpoint_id = identity::endpoint_id(&method, &normalized);
            let qualified_name = format!("{method} {normalized}");

            let mut vertex = Vertex::new(
                endpoint_id.clone(),
                PrimaryLabel::Endpoint,
                Language::Framework,
                qualified_name.clone(),
                qualified_name,
            )
            .with_attr("method", method.clone());

            if let Some(controller) = &entry.controller {
                vertex = vertex.with_attr("controller", controller.clone());
            }
            if let Some(action) = &entry.action {
                vertex = vertex.with_attr("action", action.clone());
            }
            result.vertices.push(vertex);

            // A resolved HANDLES edge requires both the handler class and
            // method name be statically known; otherwise the linker's
            // endpoint-to-handler pass derives the method from the naming
            // convention at link time (§4.8 pass 4).
            if let (Some(class_name), Some(action)) = (&entry.class_name, &entry.action) {
                let class_fqn = class_name.clone();
                let method_name = format!("action{}", capitalize(action));
                let handler_id = identity::member_id(Language::Php, &class_fqn, &method_name);
                result.vertices.push(
                    Vertex::new(
                        handler_id.clone(),
                        PrimaryLabel::Unresolved,
                        Language::Php,
                        method_name,
                        format!("{class_fqn}::action{}", capitalize(action)),
                    )
                    .with_attr("expected_label", PrimaryLabel::Method.as_str()),
                );
                result
                    .edges
                    .push(Edge::new(EdgeKind::Handles, endpoint_id, handler_id));
            }
        }
        result
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
