//! Driver surface (§6.4), the one entry point the CLI (or any other
//! embedding caller) talks to. Wires the walker, the extractor registry,
//! the store gateway, the linker, and CSV export behind five operations:
//! `index`, `clear`, `link`, `query`, `statistics`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::IndexOptions;
use crate::csv_export::{self, ExportReport};
use crate::db::schema::ClearScope;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::extractors;
use crate::resolution::linker::{self, LinkReport};
use crate::store::{GraphGateway, Row, Statistics};
use crate::types::{Diagnostic, PrimaryLabel};
use crate::walker::{self, WalkReport};

/// §7 "propagation policy": recoverable errors are collected into this
/// report with counts and sampled messages rather than aborting the run.
#[derive(Debug, Default, Clone)]
pub struct IndexReport {
    pub files_visited: usize,
    pub directories_visited: usize,
    pub vertices_written: usize,
    pub edges_written: usize,
    pub unresolved_remaining: usize,
    /// Diagnostic message, occurrence count, sorted most frequent first,
    /// truncated to the top ten (§7: "top-N diagnostics by frequency").
    pub top_diagnostics: Vec<(String, usize)>,
}

impl IndexReport {
    fn from_walk(walk: WalkReport, unresolved_remaining: usize) -> Self {
        Self {
            files_visited: walk.files_visited,
            directories_visited: walk.directories_visited,
            vertices_written: walk.nodes_written,
            edges_written: walk.edges_written,
            unresolved_remaining,
            top_diagnostics: top_diagnostics(&walk.diagnostics),
        }
    }
}

fn top_diagnostics(diagnostics: &[Diagnostic]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for diagnostic in diagnostics {
        *counts.entry(diagnostic.message.as_str()).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().map(|(message, count)| (message.to_string(), count)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(10);
    ranked
}

pub struct Driver {
    gateway: GraphGateway,
    registry: Vec<Arc<dyn Extractor>>,
}

impl Driver {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self { gateway: GraphGateway::open(db_path)?, registry: default_registry() })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self { gateway: GraphGateway::in_memory()?, registry: default_registry() })
    }

    /// `index(root_path, options) → IndexReport` (§6.4).
    pub fn index(&mut self, root: &Path, options: &IndexOptions) -> Result<IndexReport> {
        let applicable: Vec<Arc<dyn Extractor>> =
            self.registry.iter().filter(|e| options.is_extractor_enabled(e.name())).cloned().collect();
        let walk_report = walker::walk_and_index(root, options, &applicable, &mut self.gateway)?;
        let unresolved_remaining = self
            .gateway
            .get_all_vertices()?
            .iter()
            .filter(|v| v.label == PrimaryLabel::Unresolved)
            .count();
        Ok(IndexReport::from_walk(walk_report, unresolved_remaining))
    }

    /// `clear(scope) → ()` (§6.4).
    pub fn clear(&mut self, scope: ClearScope) -> Result<()> {
        self.gateway.clear(scope)
    }

    /// `link() → LinkReport` (§6.4, §4.8).
    pub fn link(&mut self) -> Result<LinkReport> {
        linker::link(&mut self.gateway)
    }

    /// `query(text, params) → rows` (§6.4).
    pub fn query(&self, text: &str, params: &[&str]) -> Result<Vec<Row>> {
        self.gateway.query(text, params)
    }

    /// `statistics() → Stats` (§6.4).
    pub fn statistics(&self) -> Result<Statistics> {
        self.gateway.get_statistics()
    }

    /// §6.2 optional CSV export, not part of the four-operation §6.4 list
    /// but exposed the same way for the CLI to reach.
    pub fn export_csv(&self, output_dir: &Path) -> Result<ExportReport> {
        csv_export::export(&self.gateway, output_dir)
    }
}

fn default_registry() -> Vec<Arc<dyn Extractor>> {
    extractors::registry().into_iter().map(Arc::from).collect()
}
