//! Row <-> `Vertex`/`Edge` conversion (§4.2 attribute flattening).
//!
//! Attributes are stored as one JSON blob per row rather than flattened
//! into columns. §4.2 describes flattening nested maps into `_`-joined
//! keys for a property-graph backend with a fixed property-per-label
//! schema, which SQLite's dynamic typing doesn't require; storing the
//! already-flat [`Attributes`] map as JSON gives the same external
//! behavior (`query()` rows expose flattened keys) without a column
//! migration per new attribute.

use std::path::PathBuf;

use rusqlite::{Row, ToSql};

use crate::error::Result;
use crate::types::{Attributes, Edge, EdgeKind, Language, PrimaryLabel, SourceSpan, Vertex};

pub fn label_to_sql(label: PrimaryLabel) -> &'static str {
    label.as_str()
}

pub fn label_from_sql(value: &str) -> Option<PrimaryLabel> {
    Some(match value {
        "Directory" => PrimaryLabel::Directory,
        "File" => PrimaryLabel::File,
        "Namespace" => PrimaryLabel::Namespace,
        "Class" => PrimaryLabel::Class,
        "Interface" => PrimaryLabel::Interface,
        "Trait" => PrimaryLabel::Trait,
        "Method" => PrimaryLabel::Method,
        "Property" => PrimaryLabel::Property,
        "Constant" => PrimaryLabel::Constant,
        "Function" => PrimaryLabel::Function,
        "Module" => PrimaryLabel::Module,
        "Endpoint" => PrimaryLabel::Endpoint,
        "Unresolved" => PrimaryLabel::Unresolved,
        "ConfigFile" => PrimaryLabel::ConfigFile,
        _ => return None,
    })
}

pub fn language_from_sql(value: &str) -> Language {
    match value {
        "php" => Language::Php,
        "javascript" => Language::JavaScript,
        "filesystem" => Language::Filesystem,
        "api" => Language::Api,
        "framework" => Language::Framework,
        _ => Language::Unknown,
    }
}

pub fn edge_kind_to_sql(kind: EdgeKind) -> &'static str {
    kind.as_str()
}

pub fn edge_kind_from_sql(value: &str) -> Option<EdgeKind> {
    Some(match value {
        "CONTAINS" => EdgeKind::Contains,
        "IN_DIRECTORY" => EdgeKind::InDirectory,
        "DEFINED_IN" => EdgeKind::DefinedIn,
        "EXTENDS" => EdgeKind::Extends,
        "IMPLEMENTS" => EdgeKind::Implements,
        "USES_TRAIT" => EdgeKind::UsesTrait,
        "HAS_METHOD" => EdgeKind::HasMethod,
        "HAS_PROPERTY" => EdgeKind::HasProperty,
        "HAS_CONSTANT" => EdgeKind::HasConstant,
        "CALLS" => EdgeKind::Calls,
        "INSTANTIATES" => EdgeKind::Instantiates,
        "IMPORTS" => EdgeKind::Imports,
        "CALLS_API" => EdgeKind::CallsApi,
        "HANDLES" => EdgeKind::Handles,
        "REGISTERED_IN" => EdgeKind::RegisteredIn,
        _ => return None,
    })
}

/// Bind values for one `INSERT ... ON CONFLICT` vertex upsert.
pub fn vertex_params(vertex: &Vertex) -> Result<Vec<Box<dyn ToSql>>> {
    let (file_path, start_line, start_column, end_line, end_column) = match &vertex.location {
        Some(loc) => (
            Some(loc.file_path.to_string_lossy().to_string()),
            Some(loc.start_line),
            Some(loc.start_column),
            Some(loc.end_line),
            Some(loc.end_column),
        ),
        None => (None, None, None, None, None),
    };
    let attributes_json = serde_json::to_string(&vertex.attributes)?;
    Ok(vec![
        Box::new(vertex.id.clone()),
        Box::new(label_to_sql(vertex.label).to_string()),
        Box::new(vertex.language.as_str().to_string()),
        Box::new(vertex.name.clone()),
        Box::new(vertex.qualified_name.clone()),
        Box::new(file_path),
        Box::new(start_line),
        Box::new(start_column),
        Box::new(end_line),
        Box::new(end_column),
        Box::new(attributes_json),
    ])
}

pub fn edge_params(edge: &Edge) -> Result<Vec<Box<dyn ToSql>>> {
    let attributes_json = serde_json::to_string(&edge.attributes)?;
    Ok(vec![
        Box::new(edge_kind_to_sql(edge.kind).to_string()),
        Box::new(edge.source_id.clone()),
        Box::new(edge.target_id.clone()),
        Box::new(edge.line),
        Box::new(edge.column),
        Box::new(attributes_json),
    ])
}

pub fn vertex_from_row(row: &Row) -> rusqlite::Result<Vertex> {
    let label_str: String = row.get("label")?;
    let language_str: String = row.get("language")?;
    let attributes_json: String = row.get("attributes")?;
    let attributes: Attributes = serde_json::from_str(&attributes_json).unwrap_or_default();

    let file_path: Option<String> = row.get("file_path")?;
    let location = file_path.map(|fp| SourceSpan {
        file_path: PathBuf::from(fp),
        start_line: row.get::<_, Option<u32>>("start_line").ok().flatten().unwrap_or(0),
        start_column: row.get::<_, Option<u32>>("start_column").ok().flatten().unwrap_or(0),
        end_line: row.get::<_, Option<u32>>("end_line").ok().flatten().unwrap_or(0),
        end_column: row.get::<_, Option<u32>>("end_column").ok().flatten().unwrap_or(0),
    });

    Ok(Vertex {
        id: row.get("id")?,
        label: label_from_sql(&label_str).unwrap_or(PrimaryLabel::Unresolved),
        language: language_from_sql(&language_str),
        name: row.get("name")?,
        qualified_name: row.get("qualified_name")?,
        location,
        attributes,
    })
}

pub fn edge_from_row(row: &Row) -> rusqlite::Result<Edge> {
    let kind_str: String = row.get("kind")?;
    let attributes_json: String = row.get("attributes")?;
    let attributes: Attributes = serde_json::from_str(&attributes_json).unwrap_or_default();
    Ok(Edge {
        kind: edge_kind_from_sql(&kind_str).unwrap_or(EdgeKind::Calls),
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        line: row.get::<_, Option<u32>>("line")?,
        column: row.get::<_, Option<u32>>("column_no")?,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips_through_sql_string() {
        for label in [
            PrimaryLabel::Directory,
            PrimaryLabel::Class,
            PrimaryLabel::Endpoint,
            PrimaryLabel::Unresolved,
            PrimaryLabel::ConfigFile,
        ] {
            assert_eq!(label_from_sql(label_to_sql(label)), Some(label));
        }
    }

    #[test]
    fn edge_kind_round_trips_through_sql_string() {
        for kind in [EdgeKind::UsesTrait, EdgeKind::CallsApi, EdgeKind::RegisteredIn] {
            assert_eq!(edge_kind_from_sql(edge_kind_to_sql(kind)), Some(kind));
        }
    }

    #[test]
    fn unknown_label_string_returns_none() {
        assert_eq!(label_from_sql("NotALabel"), None);
    }
}
