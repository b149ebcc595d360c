//! Store Gateway (§4.2): the only component allowed to touch the
//! database connection. Extractors, the walker, and the linker all go
//! through this to keep "the store is the only shared mutable resource"
//! (§5) true in code, not just in the design doc.
//!
//! SQLite stands in for the abstract backend of §6.1; `ensure_schema`,
//! `clear`, `write_batch`, `query`, and `get_statistics` are the exact
//! five operations named there, so swapping backends later means
//! reimplementing this one file.

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::converters::{edge_params, edge_kind_to_sql, vertex_params};
use crate::db::schema::{self, ClearScope};
use crate::error::Result;
use crate::types::{Edge, Language, Vertex};

const UPSERT_VERTEX_SQL: &str = "\
INSERT INTO vertices (id, label, language, name, qualified_name, file_path, start_line, start_column, end_line, end_column, attributes)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
ON CONFLICT(id) DO UPDATE SET
  label = CASE
    WHEN excluded.label = 'Unresolved' AND vertices.label != 'Unresolved' THEN vertices.label
    ELSE excluded.label
  END,
  language = excluded.language,
  name = excluded.name,
  qualified_name = excluded.qualified_name,
  file_path = COALESCE(excluded.file_path, vertices.file_path),
  start_line = COALESCE(excluded.start_line, vertices.start_line),
  start_column = COALESCE(excluded.start_column, vertices.start_column),
  end_line = COALESCE(excluded.end_line, vertices.end_line),
  end_column = COALESCE(excluded.end_column, vertices.end_column),
  attributes = json_patch(vertices.attributes, excluded.attributes)";

const UPSERT_EDGE_SQL: &str = "\
INSERT INTO edges (kind, source_id, target_id, line, column_no, attributes)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(kind, source_id, target_id) DO UPDATE SET
  line = COALESCE(excluded.line, edges.line),
  column_no = COALESCE(excluded.column_no, edges.column_no),
  attributes = json_patch(edges.attributes, excluded.attributes)";

/// `node_counts_by_label` / `edge_counts_by_type` / `language_counts`
/// (§4.2 `get_statistics`).
#[derive(Debug, Default, Clone)]
pub struct Statistics {
    pub node_counts_by_label: BTreeMap<String, i64>,
    pub edge_counts_by_type: BTreeMap<String, i64>,
    pub language_counts: BTreeMap<String, i64>,
}

struct PendingEdge {
    edge: Edge,
    retried: bool,
}

/// One read row from [`GraphGateway::query`]: column name to a string
/// rendering of the value (NULL becomes an absent key).
pub type Row = BTreeMap<String, String>;

pub struct GraphGateway {
    conn: Connection,
    pending_edges: Vec<PendingEdge>,
}

impl GraphGateway {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = schema::initialize_database(&db_path.to_string_lossy())?;
        Ok(Self { conn, pending_edges: Vec::new() })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = schema::initialize_database(":memory:")?;
        Ok(Self { conn, pending_edges: Vec::new() })
    }

    pub fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.conn).map_err(|e| crate::error::CodeGraphError::SchemaError(e.to_string()))
    }

    pub fn clear(&mut self, scope: ClearScope) -> Result<()> {
        schema::clear(&mut self.conn, scope)?;
        Ok(())
    }

    /// §4.2 `write_batch`: vertices first (so edges in the same call can
    /// reference them), falls `language_tag` back onto any vertex that
    /// doesn't already carry one (extractors set theirs directly; this
    /// only fills in the walker's own placeholder vertices), then attempts
    /// edges, deferring any whose endpoint is still missing to a pending
    /// buffer retried exactly once on the *next* call.
    pub fn write_batch(&mut self, vertices: &[Vertex], edges: &[Edge], language_tag: Language) -> Result<(usize, usize)> {
        let nodes_written = self.write_vertices(vertices, language_tag)?;

        let mut candidates: Vec<PendingEdge> =
            std::mem::take(&mut self.pending_edges);
        candidates.extend(edges.iter().cloned().map(|edge| PendingEdge { edge, retried: false }));

        let mut edges_written = 0usize;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut exists_stmt = tx.prepare_cached("SELECT 1 FROM vertices WHERE id = ?1")?;
            let mut upsert_stmt = tx.prepare_cached(UPSERT_EDGE_SQL)?;
            let mut still_pending = Vec::new();

            for pending in candidates {
                let source_exists: bool = exists_stmt
                    .query_row([&pending.edge.source_id], |_| Ok(()))
                    .optional()?
                    .is_some();
                let target_exists: bool = exists_stmt
                    .query_row([&pending.edge.target_id], |_| Ok(()))
                    .optional()?
                    .is_some();

                if source_exists && target_exists {
                    let bound = edge_params(&pending.edge)?;
                    let refs: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
                    upsert_stmt.execute(refs.as_slice())?;
                    edges_written += 1;
                } else if pending.retried {
                    tracing::warn!(
                        kind = edge_kind_to_sql(pending.edge.kind),
                        source = %pending.edge.source_id,
                        target = %pending.edge.target_id,
                        "dropping edge after one retry: endpoint still missing"
                    );
                } else {
                    still_pending.push(PendingEdge { edge: pending.edge, retried: true });
                }
            }
            self.pending_edges = still_pending;
        }
        tx.commit()?;

        Ok((nodes_written, edges_written))
    }

    fn write_vertices(&mut self, vertices: &[Vertex], language_tag: Language) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_VERTEX_SQL)?;
            for vertex in vertices {
                let mut tagged = vertex.clone();
                if tagged.language == Language::Unknown {
                    tagged.language = language_tag;
                }
                let bound = vertex_params(&tagged)?;
                let refs: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
                stmt.execute(refs.as_slice())?;
            }
        }
        tx.commit()?;
        Ok(vertices.len())
    }

    /// §4.2 `query`: read-only, parameters bound positionally as text.
    pub fn query(&self, query_text: &str, parameters: &[&str]) -> Result<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare(query_text)
            .map_err(|e| crate::error::CodeGraphError::QueryError(e.to_string()))?;
        let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let bound: Vec<&dyn rusqlite::ToSql> = parameters.iter().map(|p| p as &dyn rusqlite::ToSql).collect();

        let rows = stmt
            .query_map(bound.as_slice(), |row| {
                let mut map = Row::new();
                for (idx, name) in column_names.iter().enumerate() {
                    let value: rusqlite::types::Value = row.get(idx)?;
                    if let Some(rendered) = render_value(&value) {
                        map.insert(name.clone(), rendered);
                    }
                }
                Ok(map)
            })
            .map_err(|e| crate::error::CodeGraphError::QueryError(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| crate::error::CodeGraphError::QueryError(e.to_string()))?);
        }
        Ok(out)
    }

    pub fn get_statistics(&self) -> Result<Statistics> {
        let mut stats = Statistics::default();
        {
            let mut stmt = self.conn.prepare_cached("SELECT label, COUNT(*) FROM vertices GROUP BY label")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                stats.node_counts_by_label.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
            }
        }
        {
            let mut stmt = self.conn.prepare_cached("SELECT kind, COUNT(*) FROM edges GROUP BY kind")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                stats.edge_counts_by_type.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
            }
        }
        {
            let mut stmt = self.conn.prepare_cached("SELECT language, COUNT(*) FROM vertices GROUP BY language")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                stats.language_counts.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
            }
        }
        Ok(stats)
    }

    pub fn get_vertex(&self, id: &str) -> Result<Option<Vertex>> {
        let mut stmt = self.conn.prepare_cached("SELECT * FROM vertices WHERE id = ?1")?;
        Ok(stmt
            .query_row(params![id], |row| crate::db::converters::vertex_from_row(row))
            .optional()?)
    }

    pub fn get_all_vertices(&self) -> Result<Vec<Vertex>> {
        let mut stmt = self.conn.prepare_cached("SELECT * FROM vertices")?;
        let rows = stmt.query_map([], |row| crate::db::converters::vertex_from_row(row))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_all_edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare_cached("SELECT * FROM edges")?;
        let rows = stmt.query_map([], |row| crate::db::converters::edge_from_row(row))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn pending_edge_count(&self) -> usize {
        self.pending_edges.len()
    }

    /// Of `ids`, return those with no corresponding row in `vertices` yet.
    /// Used by the walker to synthesize backstop [`PrimaryLabel::Unresolved`]
    /// placeholders so every edge endpoint exists before the edge is written
    /// (§3.5 invariant 2), even for an edge type an extractor forgot to
    /// placeholder itself.
    pub fn filter_missing_ids(&self, ids: &[&str]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        let mut stmt = self.conn.prepare_cached("SELECT 1 FROM vertices WHERE id = ?1")?;
        for id in ids {
            let exists = stmt.query_row([id], |_| Ok(())).optional()?.is_some();
            if !exists {
                missing.push((*id).to_string());
            }
        }
        Ok(missing)
    }
}

fn render_value(value: &rusqlite::types::Value) -> Option<String> {
    use rusqlite::types::Value;
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f) => Some(f.to_string()),
        Value::Text(s) => Some(s.clone()),
        Value::Blob(_) => Some("<blob>".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity;
    use crate::types::{EdgeKind, PrimaryLabel};

    fn class_vertex(id: &str, name: &str) -> Vertex {
        Vertex::new(id.to_string(), PrimaryLabel::Class, Language::Php, name.to_string(), name.to_string())
    }

    #[test]
    fn write_batch_counts_vertices_and_edges() {
        let mut gw = GraphGateway::in_memory().unwrap();
        let a = class_vertex("a", "A");
        let b = class_vertex("b", "B");
        let edge = Edge::new(EdgeKind::Extends, "a", "b");
        let (nodes, edges) = gw.write_batch(&[a, b], &[edge], Language::Php).unwrap();
        assert_eq!(nodes, 2);
        assert_eq!(edges, 1);
    }

    #[test]
    fn edge_with_missing_endpoint_is_deferred_then_dropped_after_one_retry() {
        let mut gw = GraphGateway::in_memory().unwrap();
        let a = class_vertex("a", "A");
        let edge = Edge::new(EdgeKind::Extends, "a", "missing");
        let (_, written) = gw.write_batch(&[a], &[edge], Language::Php).unwrap();
        assert_eq!(written, 0);
        assert_eq!(gw.pending_edge_count(), 1);

        // Second call with no new vertices: retry fails, edge is dropped.
        let (_, written2) = gw.write_batch(&[], &[], Language::Php).unwrap();
        assert_eq!(written2, 0);
        assert_eq!(gw.pending_edge_count(), 0);
    }

    #[test]
    fn deferred_edge_resolves_once_target_arrives_in_next_batch() {
        let mut gw = GraphGateway::in_memory().unwrap();
        let a = class_vertex("a", "A");
        let edge = Edge::new(EdgeKind::Extends, "a", "b");
        gw.write_batch(&[a], &[edge], Language::Php).unwrap();
        assert_eq!(gw.pending_edge_count(), 1);

        let b = class_vertex("b", "B");
        let (_, written) = gw.write_batch(&[b], &[], Language::Php).unwrap();
        assert_eq!(written, 1);
        assert_eq!(gw.pending_edge_count(), 0);
    }

    #[test]
    fn rewriting_a_vertex_merges_attributes_rather_than_replacing() {
        let mut gw = GraphGateway::in_memory().unwrap();
        let v1 = class_vertex("a", "A").with_attr("abstract", false);
        gw.write_batch(&[v1], &[], Language::Php).unwrap();

        let v2 = class_vertex("a", "A").with_attr("final", true);
        gw.write_batch(&[v2], &[], Language::Php).unwrap();

        let stored = gw.get_vertex("a").unwrap().unwrap();
        assert_eq!(stored.attributes.len(), 2);
    }

    #[test]
    fn get_statistics_groups_by_label_kind_and_language() {
        let mut gw = GraphGateway::in_memory().unwrap();
        gw.write_batch(&[class_vertex("a", "A")], &[], Language::Php).unwrap();
        let stats = gw.get_statistics().unwrap();
        assert_eq!(stats.node_counts_by_label.get("Class"), Some(&1));
        assert_eq!(stats.language_counts.get("php"), Some(&1));
    }

    #[test]
    fn clear_all_removes_everything() {
        let mut gw = GraphGateway::in_memory().unwrap();
        gw.write_batch(&[class_vertex("a", "A")], &[], Language::Php).unwrap();
        gw.clear(ClearScope::All).unwrap();
        assert!(gw.get_all_vertices().unwrap().is_empty());
    }

    #[test]
    fn query_returns_rows_as_column_maps() {
        let mut gw = GraphGateway::in_memory().unwrap();
        gw.write_batch(&[class_vertex("a", "A")], &[], Language::Php).unwrap();
        let rows = gw.query("SELECT name FROM vertices WHERE id = ?1", &["a"]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&"A".to_string()));
    }

    #[test]
    fn later_unresolved_write_does_not_downgrade_an_already_concrete_vertex() {
        // Ordering independence (§5 "no ordering required across files"): a
        // concrete Class arriving before a later file's Unresolved mention of
        // the same id must not clobber the concrete label.
        let mut gw = GraphGateway::in_memory().unwrap();
        let id = identity::symbol_id(Language::Php, "X\\A");
        gw.write_batch(&[class_vertex(&id, "A")], &[], Language::Php).unwrap();

        let placeholder = Vertex::new(id.clone(), PrimaryLabel::Unresolved, Language::Php, "A".to_string(), "X\\A".to_string());
        gw.write_batch(&[placeholder], &[], Language::Php).unwrap();

        let stored = gw.get_vertex(&id).unwrap().unwrap();
        assert_eq!(stored.label, PrimaryLabel::Class);
    }

    #[test]
    fn concrete_vertex_sharing_an_unresolved_placeholders_id_overwrites_its_label() {
        let mut gw = GraphGateway::in_memory().unwrap();
        let id = identity::symbol_id(Language::Php, "X\\A");
        let placeholder = Vertex::new(id.clone(), PrimaryLabel::Unresolved, Language::Php, "A".to_string(), "X\\A".to_string())
            .with_attr("expected_label", PrimaryLabel::Class.as_str());
        gw.write_batch(&[placeholder], &[], Language::Php).unwrap();

        let concrete = class_vertex(&id, "A");
        gw.write_batch(&[concrete], &[], Language::Php).unwrap();

        let stored = gw.get_vertex(&id).unwrap().unwrap();
        assert_eq!(stored.label, PrimaryLabel::Class);
    }
}
