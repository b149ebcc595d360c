//! Cross-Language Linker (§4.8).
//!
//! Runs once after bulk ingestion as four sequential, idempotent bulk
//! passes over the store: placeholder merge, inheritance resolution,
//! API-to-endpoint linking, and endpoint-to-handler linking. None of
//! these passes deletes an extractor-produced edge; unresolvable
//! placeholders are retained as explicit holes in the graph.

use std::collections::HashMap;

use crate::error::Result;
use crate::store::GraphGateway;
use crate::types::{AttrValue, Diagnostic, Edge, EdgeKind, Language, PrimaryLabel, Vertex};

#[derive(Debug, Default, Clone)]
pub struct LinkReport {
    pub placeholders_merged: usize,
    pub inheritance_edges_annotated: usize,
    pub dangling_endpoints_created: usize,
    pub handler_edges_resolved: usize,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run all four passes in order (§4.8: "linker passes are sequential with
/// respect to each other"). Safe to call repeatedly on the same store.
pub fn link(gateway: &mut GraphGateway) -> Result<LinkReport> {
    let mut report = LinkReport::default();
    merge_placeholders(gateway, &mut report)?;
    resolve_inheritance(gateway, &mut report)?;
    link_api_calls_to_endpoints(gateway, &mut report)?;
    link_endpoints_to_handlers(gateway, &mut report)?;
    Ok(report)
}

/// Pass 1: placeholder merge (§4.8 item 1).
///
/// A placeholder whose id was derived from a known FQN (`symbol_id`/
/// `member_id`) already shares its row with any later concrete
/// definition; the store's merge-by-id upsert collapses those at write
/// time, before the linker ever runs. What's left for this pass is the
/// harder case: a placeholder created from a bare name with no resolvable
/// FQN (`identity::unresolved_id`, e.g. a method call through a
/// statically-unknown receiver) whose id can never coincide with a
/// concrete definition's id. This pass looks such placeholders up by
/// `qualified_name` against concrete vertices of the label recorded in
/// its `expected_label` attribute, and relabels the placeholder's row in
/// place when exactly one unambiguous candidate exists. More than one
/// candidate means the name is genuinely ambiguous and the placeholder is
/// left as an explicit hole rather than guessed at.
fn merge_placeholders(gateway: &mut GraphGateway, report: &mut LinkReport) -> Result<()> {
    let vertices = gateway.get_all_vertices()?;

    let mut concrete_by_key: HashMap<(PrimaryLabel, &str), Vec<&Vertex>> = HashMap::new();
    for vertex in &vertices {
        if vertex.label != PrimaryLabel::Unresolved {
            concrete_by_key
                .entry((vertex.label, vertex.qualified_name.as_str()))
                .or_default()
                .push(vertex);
        }
    }

    let mut to_write = Vec::new();
    for placeholder in vertices.iter().filter(|v| v.label == PrimaryLabel::Unresolved) {
        let Some(AttrValue::Str(expected)) = placeholder.attributes.get("expected_label") else {
            continue;
        };
        let Some(expected_label) = label_from_str(expected) else {
            continue;
        };
        let key = (expected_label, placeholder.qualified_name.as_str());
        let Some(candidates) = concrete_by_key.get(&key) else {
            continue;
        };
        if candidates.len() != 1 {
            report.diagnostics.push(Diagnostic::info(format!(
                "placeholder {} ({}) has {} ambiguous concrete candidates, left unresolved",
                placeholder.qualified_name,
                expected,
                candidates.len()
            )));
            continue;
        }
        let concrete = candidates[0];
        let mut merged = concrete.clone();
        merged.id = placeholder.id.clone();
        merged.attributes.extend(placeholder.attributes.clone());
        merged.attributes.insert("merged_via".to_string(), AttrValue::Str("qualified_name".to_string()));
        to_write.push(merged);
    }

    if !to_write.is_empty() {
        report.placeholders_merged = to_write.len();
        gateway.write_batch(&to_write, &[], Language::Unknown)?;
    }
    Ok(())
}

fn label_from_str(value: &str) -> Option<PrimaryLabel> {
    Some(match value {
        "Class" => PrimaryLabel::Class,
        "Interface" => PrimaryLabel::Interface,
        "Trait" => PrimaryLabel::Trait,
        "Method" => PrimaryLabel::Method,
        "Function" => PrimaryLabel::Function,
        "Module" => PrimaryLabel::Module,
        _ => return None,
    })
}

/// Pass 2: inheritance resolution (§4.8 item 2).
///
/// `EXTENDS`/`IMPLEMENTS`/`USES_TRAIT` edges are never deleted, even when
/// their target is still `Unresolved` after pass 1. A dangling
/// inheritance edge is intentional, recorded knowledge that a reference
/// exists whose definition wasn't indexed. Every such edge is annotated
/// with `resolved` so a consumer can tell a real gap from a fully
/// resolved chain without re-deriving it.
fn resolve_inheritance(gateway: &mut GraphGateway, report: &mut LinkReport) -> Result<()> {
    let edges = gateway.get_all_edges()?;
    let vertices = gateway.get_all_vertices()?;
    let labels: HashMap<&str, PrimaryLabel> = vertices.iter().map(|v| (v.id.as_str(), v.label)).collect();

    let mut to_write = Vec::new();
    for edge in &edges {
        if !matches!(edge.kind, EdgeKind::Extends | EdgeKind::Implements | EdgeKind::UsesTrait) {
            continue;
        }
        let resolved = labels.get(edge.target_id.as_str()).map(|l| *l != PrimaryLabel::Unresolved).unwrap_or(false);
        if edge.attributes.get("resolved") == Some(&AttrValue::Bool(resolved)) {
            continue;
        }
        to_write.push(edge.clone().with_attr("resolved", resolved));
    }

    if !to_write.is_empty() {
        report.inheritance_edges_annotated = to_write.len();
        gateway.write_batch(&[], &to_write, Language::Unknown)?;
    }
    Ok(())
}

/// Pass 3: API-to-endpoint linking (§4.8 item 3).
///
/// `CALLS_API` edges already point at endpoint ids derived from
/// `(METHOD, normalized_url)` by [`crate::identity::endpoint_id`]. The
/// JavaScript extractor materializes that `Endpoint` vertex itself before
/// emitting the edge, so in practice this pass is a verification no-op.
/// It still runs as a defensive bulk check, since the contract ("every
/// edge's endpoints exist") must hold regardless of which extractor
/// produced the edge.
fn link_api_calls_to_endpoints(gateway: &mut GraphGateway, report: &mut LinkReport) -> Result<()> {
    let edges = gateway.get_all_edges()?;
    let call_targets: Vec<&str> = edges
        .iter()
        .filter(|e| e.kind == EdgeKind::CallsApi)
        .map(|e| e.target_id.as_str())
        .collect();
    if call_targets.is_empty() {
        return Ok(());
    }

    let missing = gateway.filter_missing_ids(&call_targets)?;
    if missing.is_empty() {
        return Ok(());
    }

    let mut dangling = Vec::with_capacity(missing.len());
    for id in &missing {
        report.diagnostics.push(Diagnostic::warning(format!("CALLS_API target {id} has no endpoint vertex, synthesizing a dangling one")));
        dangling.push(
            Vertex::new(id.clone(), PrimaryLabel::Endpoint, Language::Api, id.clone(), id.clone())
                .with_attr("inferred_from", "javascript"),
        );
    }
    report.dangling_endpoints_created = dangling.len();
    gateway.write_batch(&dangling, &[], Language::Api)?;
    Ok(())
}

/// Pass 4: endpoint-to-handler linking (§4.8 item 4, §4.6 naming
/// convention).
///
/// For every `Endpoint` vertex still lacking a `HANDLES` edge, derive the
/// handler method from its `controller`/`action` attributes: method
/// `action{Capitalized(action)}` on the class the `controller` attribute
/// names. The route extractor already resolves the common case
/// (`className` known statically); this pass only has to fill in routes
/// that recorded a bare controller name. A controller name with no known
/// FQN, or a missing `action`, is a `LinkError` diagnostic rather than a
/// silent skip (§9 Open Question resolution).
fn link_endpoints_to_handlers(gateway: &mut GraphGateway, report: &mut LinkReport) -> Result<()> {
    let vertices = gateway.get_all_vertices()?;
    let edges = gateway.get_all_edges()?;

    let endpoints_with_handles: std::collections::HashSet<&str> =
        edges.iter().filter(|e| e.kind == EdgeKind::Handles).map(|e| e.source_id.as_str()).collect();

    let mut new_edges = Vec::new();
    let mut new_vertices = Vec::new();

    for endpoint in vertices.iter().filter(|v| v.label == PrimaryLabel::Endpoint) {
        if endpoints_with_handles.contains(endpoint.id.as_str()) {
            continue;
        }
        let (Some(AttrValue::Str(controller)), Some(AttrValue::Str(action))) =
            (endpoint.attributes.get("controller"), endpoint.attributes.get("action"))
        else {
            continue;
        };

        let class_fqn = controller_fqn(controller);
        let method_name = format!("action{}", capitalize(action));
        let handler_id = crate::identity::member_id(Language::Php, &class_fqn, &method_name);

        new_vertices.push(
            Vertex::new(handler_id.clone(), PrimaryLabel::Unresolved, Language::Php, method_name.clone(), format!("{class_fqn}::{method_name}"))
                .with_attr("expected_label", PrimaryLabel::Method.as_str()),
        );
        new_edges.push(Edge::new(EdgeKind::Handles, endpoint.id.clone(), handler_id));
    }

    for endpoint in vertices.iter().filter(|v| v.label == PrimaryLabel::Endpoint) {
        if endpoints_with_handles.contains(endpoint.id.as_str()) {
            continue;
        }
        if endpoint.attributes.get("controller").is_none() || endpoint.attributes.get("action").is_none() {
            report.diagnostics.push(Diagnostic::warning(format!(
                "endpoint {} has no resolvable handler: missing controller or action attribute",
                endpoint.qualified_name
            )));
        }
    }

    if !new_vertices.is_empty() {
        report.handler_edges_resolved = new_edges.len();
        gateway.write_batch(&new_vertices, &new_edges, Language::Php)?;
    }
    Ok(())
}

/// EspoCRM's own convention: a bare controller name (`"Lead"`) names a
/// class under the framework's `Controllers` namespace. The route
/// extractor already records the fully-qualified `className` when a route
/// table provides one; this is the fallback for the bare-name case §4.6
/// describes ("if only the class name is known").
fn controller_fqn(controller: &str) -> String {
    format!("Espo\\Controllers\\{controller}")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
