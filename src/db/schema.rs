//! SQLite schema for the property graph (§4.2 `ensure_schema`/`clear`).
//!
//! SQLite stands in for the abstract "property-graph store" of §6.1: a
//! transactional bulk-write accepting a list parameter, merge-by-key
//! upserts on `(label, id)`, and read queries returning labeled rows. Two
//! tables (`vertices`, `edges`) carry the whole model; attributes are
//! stored as a JSON blob rather than one column per possible attribute,
//! since the attribute set is open-ended across extractors (§3.1).

use rusqlite::Connection;

const CREATE_VERTICES: &str = "\
CREATE TABLE IF NOT EXISTS vertices (
  id TEXT PRIMARY KEY,
  label TEXT NOT NULL,
  language TEXT NOT NULL,
  name TEXT NOT NULL,
  qualified_name TEXT NOT NULL,
  file_path TEXT,
  start_line INTEGER,
  start_column INTEGER,
  end_line INTEGER,
  end_column INTEGER,
  attributes TEXT NOT NULL DEFAULT '{}'
)";

const CREATE_EDGES: &str = "\
CREATE TABLE IF NOT EXISTS edges (
  rowid INTEGER PRIMARY KEY AUTOINCREMENT,
  kind TEXT NOT NULL,
  source_id TEXT NOT NULL,
  target_id TEXT NOT NULL,
  line INTEGER,
  column_no INTEGER,
  attributes TEXT NOT NULL DEFAULT '{}',
  UNIQUE(kind, source_id, target_id)
)";

const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_vertices_label ON vertices(label)",
    "CREATE INDEX IF NOT EXISTS idx_vertices_language ON vertices(language)",
    "CREATE INDEX IF NOT EXISTS idx_vertices_name ON vertices(label, name)",
    "CREATE INDEX IF NOT EXISTS idx_vertices_qualified_name ON vertices(label, qualified_name)",
    "CREATE INDEX IF NOT EXISTS idx_vertices_file_path ON vertices(file_path)",
    "CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_target ON edges(target_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_kind ON edges(kind)",
];

/// What [`clear`] removes. `All` truncates both tables; `Language` removes
/// only vertices tagged with that language (and any edge touching one of
/// them), leaving other languages' data intact for incremental re-indexing
/// of a single extractor.
pub enum ClearScope<'a> {
    All,
    Language(&'a str),
}

/// Open (or create) the database at `db_path` with WAL mode and the full
/// schema applied. Foreign keys stay off: edges legitimately target
/// `Unresolved` placeholder ids that may never materialize as concrete rows
/// written by the same extractor (§4.8 pass 2's "dangling reference is
/// intentional").
pub fn initialize_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "OFF")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Idempotently create the `vertices`/`edges` tables and their indexes
/// (§4.2 `ensure_schema`).
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_VERTICES)?;
    conn.execute_batch(CREATE_EDGES)?;
    for ddl in CREATE_INDEXES {
        conn.execute_batch(ddl)?;
    }
    Ok(())
}

/// Deletes in bounded batches (§4.2: "avoid unbounded memory on the
/// backend") rather than a single `DELETE FROM`. SQLite itself would
/// handle an unbounded delete fine, but the batched form matches the
/// contract every other backend behind this gateway must also honor.
pub fn clear(conn: &mut Connection, scope: ClearScope) -> rusqlite::Result<()> {
    const BATCH: i64 = 5000;
    match scope {
        ClearScope::All => {
            loop {
                let tx = conn.transaction()?;
                let deleted = tx.execute("DELETE FROM edges WHERE rowid IN (SELECT rowid FROM edges LIMIT ?1)", [BATCH])?;
                tx.commit()?;
                if deleted == 0 {
                    break;
                }
            }
            loop {
                let tx = conn.transaction()?;
                let deleted = tx.execute("DELETE FROM vertices WHERE id IN (SELECT id FROM vertices LIMIT ?1)", [BATCH])?;
                tx.commit()?;
                if deleted == 0 {
                    break;
                }
            }
        }
        ClearScope::Language(language) => {
            loop {
                let tx = conn.transaction()?;
                let deleted = tx.execute(
                    "DELETE FROM edges WHERE rowid IN (
                        SELECT e.rowid FROM edges e
                        JOIN vertices v ON v.id = e.source_id OR v.id = e.target_id
                        WHERE v.language = ?1 LIMIT ?2
                    )",
                    rusqlite::params![language, BATCH],
                )?;
                tx.commit()?;
                if deleted == 0 {
                    break;
                }
            }
            loop {
                let tx = conn.transaction()?;
                let deleted = tx.execute(
                    "DELETE FROM vertices WHERE id IN (SELECT id FROM vertices WHERE language = ?1 LIMIT ?2)",
                    rusqlite::params![language, BATCH],
                )?;
                tx.commit()?;
                if deleted == 0 {
                    break;
                }
            }
        }
    }
    Ok(())
}
