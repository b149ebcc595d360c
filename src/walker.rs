//! Filesystem Walker & Assembler (§4.7).
//!
//! Breadth-first directory enumeration, directory/`CONTAINS` vertex
//! materialization in parent-before-child order, extension-based extractor
//! dispatch, and the two backstop edges (`IN_DIRECTORY`, `DEFINED_IN`) that
//! keep every vertex reachable from its file even when an extractor forgot
//! one.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use rayon::prelude::*;

use crate::config::IndexOptions;
use crate::error::Result;
use crate::extractor::Extractor;
use crate::identity;
use crate::store::GraphGateway;
use crate::types::{Diagnostic, Edge, EdgeKind, Language, ParseResult, PrimaryLabel, Vertex};

#[derive(Debug, Default, Clone)]
pub struct WalkReport {
    pub files_visited: usize,
    pub directories_visited: usize,
    pub nodes_written: usize,
    pub edges_written: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn walk_and_index(
    root: &Path,
    options: &IndexOptions,
    registry: &[Arc<dyn Extractor>],
    gateway: &mut GraphGateway,
) -> Result<WalkReport> {
    let matcher = build_ignore_matcher(root, &options.ignore_globs);
    let mut report = WalkReport::default();

    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.clone());

    let mut materialized_dirs: HashSet<String> = HashSet::new();
    materialize_directory(&root, None, &mut materialized_dirs, gateway, &mut report)?;

    let mut pending_files: Vec<PathBuf> = Vec::new();

    while let Some(dir) = queue.pop_front() {
        report.directories_visited += 1;
        let mut entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(read_dir) => read_dir.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(e) => {
                report
                    .diagnostics
                    .push(Diagnostic::warning(format!("could not read directory {}: {e}", dir.display())));
                continue;
            }
        };
        entries.sort();

        for entry in entries {
            let is_dir = entry.is_dir();
            if matcher.matched(&entry, is_dir).is_ignore() {
                continue;
            }
            if is_dir {
                materialize_directory(&entry, Some(&dir), &mut materialized_dirs, gateway, &mut report)?;
                queue.push_back(entry);
            } else {
                pending_files.push(entry);
                if pending_files.len() >= options.batch_size {
                    process_batch(&pending_files, options, registry, gateway, &mut report)?;
                    pending_files.clear();
                }
            }
        }
    }

    if !pending_files.is_empty() {
        process_batch(&pending_files, options, registry, gateway, &mut report)?;
    }

    Ok(report)
}

fn build_ignore_matcher(root: &Path, globs: &[String]) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    for glob in globs {
        let _ = builder.add_line(None, glob);
    }
    builder.build().unwrap_or_else(|_| GitignoreBuilder::new(root).build().expect("empty builder never fails"))
}

/// Directory/`CONTAINS` materialization, deduped by id so re-visiting a
/// directory across batches is a no-op (§4.7 item 1: "parent-before-child").
fn materialize_directory(
    path: &Path,
    parent: Option<&Path>,
    materialized: &mut HashSet<String>,
    gateway: &mut GraphGateway,
    report: &mut WalkReport,
) -> Result<()> {
    let path_str = path.to_string_lossy().to_string();
    let dir_id = identity::directory_id(&path_str);
    if !materialized.insert(dir_id.clone()) {
        return Ok(());
    }

    let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| path_str.clone());
    let vertices = vec![Vertex::new(dir_id.clone(), PrimaryLabel::Directory, Language::Filesystem, name, path_str)];
    let mut edges = Vec::new();

    if let Some(parent) = parent {
        let parent_id = identity::directory_id(&parent.to_string_lossy());
        edges.push(Edge::new(EdgeKind::Contains, parent_id, dir_id));
    }

    let (nodes, edges_written) = gateway.write_batch(&vertices, &edges, Language::Filesystem)?;
    report.nodes_written += nodes;
    report.edges_written += edges_written;
    Ok(())
}

fn process_batch(
    files: &[PathBuf],
    options: &IndexOptions,
    registry: &[Arc<dyn Extractor>],
    gateway: &mut GraphGateway,
    report: &mut WalkReport,
) -> Result<()> {
    let timeout = Duration::from_secs(options.file_timeout_secs);

    // §5/§6.4: the worker pool is bounded to `options.worker_count`, not
    // rayon's ambient global pool (which defaults to all cores regardless
    // of configuration).
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.worker_count.max(1))
        .build()
        .map_err(|e| crate::error::CodeGraphError::Other(e.to_string()))?;

    let results: Vec<(PathBuf, Vec<ParseResult>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let bytes = std::fs::read(path).unwrap_or_default();
                let applicable: Vec<Arc<dyn Extractor>> = registry
                    .iter()
                    .filter(|e| {
                        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                        e.supported_extensions().contains(ext)
                            && options.is_extractor_enabled(e.name())
                            && options.is_language_enabled(e.language_tag())
                    })
                    .cloned()
                    .collect();

                let parsed: Vec<ParseResult> = applicable
                    .into_iter()
                    .map(|extractor| parse_with_timeout(extractor, path.clone(), bytes.clone(), timeout))
                    .collect();
                (path.clone(), parsed)
            })
            .collect()
    });

    let mut batch_vertices: Vec<Vertex> = Vec::new();
    let mut batch_edges = Vec::new();

    for (path, parse_results) in results {
        report.files_visited += 1;
        let path_str = path.to_string_lossy().to_string();
        let file_id = identity::file_id(&path_str);
        let dir_id = identity::directory_id(&path.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default());

        let mut file_has_in_directory = false;
        let mut defined_in_sources: HashSet<String> = HashSet::new();

        for result in parse_results {
            for diagnostic in result.diagnostics {
                report.diagnostics.push(diagnostic);
            }
            for vertex in result.vertices {
                if vertex.label == PrimaryLabel::File && vertex.id == file_id {
                    file_has_in_directory = true;
                }
                batch_vertices.push(vertex);
            }
            for edge in result.edges {
                if edge.kind == EdgeKind::DefinedIn {
                    defined_in_sources.insert(edge.source_id.clone());
                }
                batch_edges.push(edge);
            }
        }

        if file_has_in_directory {
            batch_edges.push(Edge::new(EdgeKind::InDirectory, file_id.clone(), dir_id));
        }

        // Backstop: any symbol vertex this file produced without its own
        // DEFINED_IN edge gets one pointing at the file (§4.7 item 4).
        for vertex in batch_vertices.iter().filter(|v| {
            v.location.as_ref().map(|l| l.file_path == path).unwrap_or(false)
                && !matches!(v.label, PrimaryLabel::File | PrimaryLabel::Directory)
        }) {
            if !defined_in_sources.contains(&vertex.id) {
                batch_edges.push(Edge::new(EdgeKind::DefinedIn, vertex.id.clone(), file_id.clone()));
                defined_in_sources.insert(vertex.id.clone());
            }
        }
    }

    // Centralized backstop for §3.5 invariant 2: no matter which extractor
    // produced an edge, every endpoint must resolve to a vertex. Extractors
    // are expected to placeholder their own targets (§4.4 item 6), but a
    // future or third-party extractor that forgets to is caught here rather
    // than corrupting the graph with a dangling edge.
    let known_ids: HashSet<&str> = batch_vertices.iter().map(|v| v.id.as_str()).collect();
    let mut referenced: Vec<&str> = Vec::new();
    for edge in &batch_edges {
        if !known_ids.contains(edge.source_id.as_str()) {
            referenced.push(&edge.source_id);
        }
        if !known_ids.contains(edge.target_id.as_str()) {
            referenced.push(&edge.target_id);
        }
    }
    referenced.sort_unstable();
    referenced.dedup();
    if !referenced.is_empty() {
        for id in gateway.filter_missing_ids(&referenced)? {
            batch_vertices.push(Vertex::new(id.clone(), PrimaryLabel::Unresolved, Language::Unknown, id.clone(), id));
        }
    }

    let (nodes, edges) = gateway.write_batch(&batch_vertices, &batch_edges, Language::Unknown)?;
    report.nodes_written += nodes;
    report.edges_written += edges;
    Ok(())
}

fn parse_with_timeout(extractor: Arc<dyn Extractor>, path: PathBuf, bytes: Vec<u8>, timeout: Duration) -> ParseResult {
    let (tx, rx) = mpsc::channel();
    let path_for_thread = path.clone();
    std::thread::spawn(move || {
        let result = extractor.parse_file(&path_for_thread, &bytes);
        let _ = tx.send(result);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => ParseResult::failed(path, Diagnostic::fatal("extractor timed out")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors;
    use tempfile::tempdir;

    fn registry_arcs() -> Vec<Arc<dyn Extractor>> {
        extractors::registry().into_iter().map(Arc::from).collect()
    }

    #[test]
    fn walking_a_small_tree_materializes_directories_and_files() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/Foo.php"), "<?php class Foo {}").unwrap();

        let options = IndexOptions::default();
        let mut gateway = GraphGateway::in_memory().unwrap();
        let report = walk_and_index(dir.path(), &options, &registry_arcs(), &mut gateway).unwrap();

        assert!(report.files_visited >= 1);
        assert!(report.directories_visited >= 1);

        let vertices = gateway.get_all_vertices().unwrap();
        assert!(vertices.iter().any(|v| v.label == PrimaryLabel::Class && v.name == "Foo"));
        assert!(vertices.iter().any(|v| v.label == PrimaryLabel::Directory));
    }

    #[test]
    fn ignored_directory_is_not_walked() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("vendor")).unwrap();
        std::fs::write(dir.path().join("vendor/Skip.php"), "<?php class Skip {}").unwrap();

        let options = IndexOptions::default();
        let mut gateway = GraphGateway::in_memory().unwrap();
        walk_and_index(dir.path(), &options, &registry_arcs(), &mut gateway).unwrap();

        let vertices = gateway.get_all_vertices().unwrap();
        assert!(!vertices.iter().any(|v| v.name == "Skip"));
    }

    #[test]
    fn file_vertex_gets_in_directory_edge() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("Foo.php"), "<?php class Foo {}").unwrap();

        let options = IndexOptions::default();
        let mut gateway = GraphGateway::in_memory().unwrap();
        walk_and_index(dir.path(), &options, &registry_arcs(), &mut gateway).unwrap();

        let edges = gateway.get_all_edges().unwrap();
        assert!(edges.iter().any(|e| e.kind == EdgeKind::InDirectory));
    }
}
