//! End-to-end coverage across index → link → query → export, exercising
//! the driver the way the CLI does rather than any one module in isolation.

use codegraph::config::IndexOptions;
use codegraph::driver::Driver;
use codegraph::types::PrimaryLabel;
use tempfile::tempdir;

fn write(dir: &std::path::Path, rel: &str, contents: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

#[test]
fn indexing_a_polyglot_repo_links_frontend_calls_to_backend_handlers() {
    let dir = tempdir().unwrap();
    write(
        &dir.path(),
        "application/Controllers/Lead.php",
        "<?php\nnamespace Espo\\Controllers;\nclass Lead extends \\Espo\\Core\\Controllers\\Base {\n    public function actionList() {}\n}\n",
    );
    write(
        &dir.path(),
        "application/Resources/routes.json",
        r#"[{"route": "/Lead", "method": "get", "className": "Espo\\Controllers\\Lead", "action": "list"}]"#,
    );
    write(
        &dir.path(),
        "client/src/views/lead-list.js",
        "Espo.Ajax.getRequest('Lead').then(function (leads) {});\n",
    );

    let mut driver = Driver::in_memory().unwrap();
    let index_report = driver.index(dir.path(), &IndexOptions::default()).unwrap();
    assert!(index_report.files_visited >= 3);
    assert!(index_report.vertices_written > 0);

    let link_report = driver.link().unwrap();
    assert!(link_report.inheritance_edges_annotated >= 1, "the Base superclass reference should get annotated");

    let stats = driver.statistics().unwrap();
    assert!(stats.node_counts_by_label.contains_key("Class"));
    assert!(stats.node_counts_by_label.contains_key("Endpoint"));
    assert!(stats.edge_counts_by_type.contains_key("CALLS_API"));

    let rows = driver
        .query("SELECT qualified_name FROM vertices WHERE label = 'Endpoint'", &[])
        .unwrap();
    assert!(rows.iter().any(|r| r.get("qualified_name").map(|q| q == "GET /Lead").unwrap_or(false)));
}

#[test]
fn every_edge_endpoint_exists_as_a_vertex_after_a_mixed_language_index() {
    // Invariant 2 (§3.5), exercised through the full walker rather than a
    // single gateway.write_batch call.
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php\nnamespace X;\nclass A extends X\\B {\n    public function run() { $this->helper(); }\n}\n");
    write(&dir.path(), "src/view.js", "fetch('/api/v1/Lead/' + id);\n");

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &IndexOptions::default()).unwrap();
    driver.link().unwrap();

    let vertices = driver.query("SELECT id FROM vertices", &[]).unwrap();
    let known: std::collections::HashSet<String> = vertices.into_iter().filter_map(|r| r.get("id").cloned()).collect();

    let edges = driver.query("SELECT source_id, target_id FROM edges", &[]).unwrap();
    assert!(!edges.is_empty());
    for edge in edges {
        let source = edge.get("source_id").unwrap();
        let target = edge.get("target_id").unwrap();
        assert!(known.contains(source), "dangling edge source {source}");
        assert!(known.contains(target), "dangling edge target {target}");
    }
}

#[test]
fn re_indexing_the_same_tree_does_not_duplicate_vertices() {
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php\nnamespace X;\nclass A {}\n");

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &IndexOptions::default()).unwrap();
    let first_count = driver.statistics().unwrap().node_counts_by_label.values().sum::<i64>();

    driver.index(dir.path(), &IndexOptions::default()).unwrap();
    let second_count = driver.statistics().unwrap().node_counts_by_label.values().sum::<i64>();

    assert_eq!(first_count, second_count, "re-indexing should upsert in place, not append");
}

#[test]
fn running_link_twice_produces_no_further_changes_the_second_time() {
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php\nnamespace X;\nclass A extends X\\B {}\n");

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &IndexOptions::default()).unwrap();
    driver.link().unwrap();
    let second = driver.link().unwrap();

    assert_eq!(second.placeholders_merged, 0);
    assert_eq!(second.inheritance_edges_annotated, 0);
    assert_eq!(second.dangling_endpoints_created, 0);
    assert_eq!(second.handler_edges_resolved, 0);
}

#[test]
fn csv_export_after_a_real_index_produces_a_file_per_populated_label() {
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php\nnamespace X;\nclass A {}\n");

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &IndexOptions::default()).unwrap();

    let out = tempdir().unwrap();
    let report = driver.export_csv(out.path()).unwrap();
    assert!(report.vertices_exported > 0);
    assert!(out.path().join(format!("{}.csv", PrimaryLabel::Class.as_str())).exists());
    assert!(out.path().join(format!("{}.csv", PrimaryLabel::Directory.as_str())).exists());
}

#[test]
fn disabling_a_language_via_options_excludes_its_vertices() {
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php class A {}");
    write(&dir.path(), "src/view.js", "fetch('/api/v1/Lead');\n");

    let mut options = IndexOptions::default();
    options.language_overrides.insert("javascript".to_string(), false);

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &options).unwrap();

    let stats = driver.statistics().unwrap();
    assert!(!stats.language_counts.contains_key("javascript"));
    assert!(stats.node_counts_by_label.contains_key("Class"));
}

#[test]
fn clear_scoped_to_a_language_only_removes_that_languages_vertices() {
    let dir = tempdir().unwrap();
    write(&dir.path(), "src/A.php", "<?php class A {}");
    write(&dir.path(), "src/view.js", "fetch('/api/v1/Lead');\n");

    let mut driver = Driver::in_memory().unwrap();
    driver.index(dir.path(), &IndexOptions::default()).unwrap();

    driver.clear(codegraph::db::schema::ClearScope::Language("php")).unwrap();

    let stats = driver.statistics().unwrap();
    assert!(!stats.language_counts.contains_key("php"));
    assert!(stats.language_counts.contains_key("javascript"));
}
