//! CSV export (§6.2 third bullet), an optional bulk-loader format
//! alongside the store's native queries, split one file per label and
//! per edge type the way a Neo4j bulk import expects.
//!
//! One file per [`PrimaryLabel`] (`id:ID,name,qualified_name,language,
//! file_path,start_line,attributes,:LABEL`) and one per [`EdgeKind`]
//! (`:START_ID,:END_ID,line,column,attributes,:TYPE`), matching the
//! `id:ID,...,:LABEL` / `:START_ID,:END_ID,...,:TYPE` header shape §6.2
//! names. Attributes are exported as a single JSON column rather
//! than flattened, for the same reason `db::converters` stores them as
//! JSON: a fixed property-per-label CSV schema would need a migration
//! per new attribute, while one JSON column doesn't.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::store::GraphGateway;
use crate::types::{Edge, EdgeKind, PrimaryLabel, Vertex};

#[derive(Debug, Default, Clone)]
pub struct ExportReport {
    pub vertex_files_written: usize,
    pub edge_files_written: usize,
    pub vertices_exported: usize,
    pub edges_exported: usize,
}

const ALL_LABELS: &[PrimaryLabel] = &[
    PrimaryLabel::Directory,
    PrimaryLabel::File,
    PrimaryLabel::Namespace,
    PrimaryLabel::Class,
    PrimaryLabel::Interface,
    PrimaryLabel::Trait,
    PrimaryLabel::Method,
    PrimaryLabel::Property,
    PrimaryLabel::Constant,
    PrimaryLabel::Function,
    PrimaryLabel::Module,
    PrimaryLabel::Endpoint,
    PrimaryLabel::Unresolved,
    PrimaryLabel::ConfigFile,
];

const ALL_EDGE_KINDS: &[EdgeKind] = &[
    EdgeKind::Contains,
    EdgeKind::InDirectory,
    EdgeKind::DefinedIn,
    EdgeKind::Extends,
    EdgeKind::Implements,
    EdgeKind::UsesTrait,
    EdgeKind::HasMethod,
    EdgeKind::HasProperty,
    EdgeKind::HasConstant,
    EdgeKind::Calls,
    EdgeKind::Instantiates,
    EdgeKind::Imports,
    EdgeKind::CallsApi,
    EdgeKind::Handles,
    EdgeKind::RegisteredIn,
];

/// Write one CSV per populated label and edge kind under `output_dir`.
/// Labels/kinds with no rows produce no file (§8 CSV export round-trip
/// property only needs to hold for what was actually written).
pub fn export(gateway: &GraphGateway, output_dir: &Path) -> Result<ExportReport> {
    std::fs::create_dir_all(output_dir)?;
    let mut report = ExportReport::default();

    let vertices = gateway.get_all_vertices()?;
    for label in ALL_LABELS {
        let rows: Vec<&Vertex> = vertices.iter().filter(|v| v.label == *label).collect();
        if rows.is_empty() {
            continue;
        }
        write_vertex_csv(&vertex_csv_path(output_dir, *label), &rows)?;
        report.vertex_files_written += 1;
        report.vertices_exported += rows.len();
    }

    let edges = gateway.get_all_edges()?;
    for kind in ALL_EDGE_KINDS {
        let rows: Vec<&Edge> = edges.iter().filter(|e| e.kind == *kind).collect();
        if rows.is_empty() {
            continue;
        }
        write_edge_csv(&edge_csv_path(output_dir, *kind), &rows)?;
        report.edge_files_written += 1;
        report.edges_exported += rows.len();
    }

    Ok(report)
}

fn vertex_csv_path(output_dir: &Path, label: PrimaryLabel) -> PathBuf {
    output_dir.join(format!("{}.csv", label.as_str()))
}

fn edge_csv_path(output_dir: &Path, kind: EdgeKind) -> PathBuf {
    output_dir.join(format!("{}.csv", kind.as_str()))
}

fn write_vertex_csv(path: &Path, rows: &[&Vertex]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| crate::error::CodeGraphError::Other(e.to_string()))?;
    writer.write_record(["id:ID", "name", "qualified_name", "language", "file_path", "start_line", "attributes", ":LABEL"])?;
    for vertex in rows {
        let file_path = vertex.location.as_ref().map(|l| l.file_path.to_string_lossy().to_string()).unwrap_or_default();
        let start_line = vertex.location.as_ref().map(|l| l.start_line.to_string()).unwrap_or_default();
        let attributes = serde_json::to_string(&vertex.attributes)?;
        writer.write_record([
            vertex.id.as_str(),
            vertex.name.as_str(),
            vertex.qualified_name.as_str(),
            vertex.language.as_str(),
            file_path.as_str(),
            start_line.as_str(),
            attributes.as_str(),
            vertex.label.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_edge_csv(path: &Path, rows: &[&Edge]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| crate::error::CodeGraphError::Other(e.to_string()))?;
    writer.write_record([":START_ID", ":END_ID", "line", "column", "attributes", ":TYPE"])?;
    for edge in rows {
        let line = edge.line.map(|l| l.to_string()).unwrap_or_default();
        let column = edge.column.map(|c| c.to_string()).unwrap_or_default();
        let attributes = serde_json::to_string(&edge.attributes)?;
        writer.write_record([
            edge.source_id.as_str(),
            edge.target_id.as_str(),
            line.as_str(),
            column.as_str(),
            attributes.as_str(),
            edge.kind.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
