//! Thin CLI wiring around [`crate::driver::Driver`]. Subcommands map
//! one-to-one onto §6.4's five driver operations plus the optional CSV
//! export; this exists only because a binary needs some entry point to
//! invoke the driver from.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::IndexOptions;
use crate::db::schema::ClearScope;
use crate::driver::Driver;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "codegraph", about = "Polyglot code knowledge graph indexer")]
pub struct Cli {
    /// Path to the SQLite database file backing the graph.
    #[arg(long, global = true, default_value = "codegraph.db")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Walk `root` and populate the graph.
    Index {
        root: PathBuf,
        /// Optional YAML config file (defaults applied for anything absent).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run the cross-language linker's four resolution passes.
    Link,
    /// Drop graph data.
    Clear {
        /// Restrict to one language tag (e.g. "php"); omit to clear everything.
        #[arg(long)]
        language: Option<String>,
    },
    /// Run a read-only SQL query and print rows as JSON lines.
    Query {
        text: String,
        #[arg(long = "param")]
        params: Vec<String>,
    },
    /// Print vertex/edge counts by label, edge type, and language.
    Stats,
    /// Export the graph as per-label/per-edge-type CSV files (§6.2).
    ExportCsv { output_dir: PathBuf },
}

pub fn run(cli: Cli) -> Result<()> {
    let mut driver = Driver::open(&cli.db)?;

    match cli.command {
        Command::Index { root, config } => {
            let options = match config {
                Some(path) => IndexOptions::load(&path)?,
                None => IndexOptions::default(),
            };
            let report = driver.index(&root, &options)?;
            println!(
                "{} files visited, {} directories visited, {} vertices written, {} edges written, {} unresolved remaining",
                report.files_visited,
                report.directories_visited,
                report.vertices_written,
                report.edges_written,
                report.unresolved_remaining
            );
            for (message, count) in &report.top_diagnostics {
                println!("  [{count}x] {message}");
            }
        }
        Command::Link => {
            let report = driver.link()?;
            println!(
                "{} placeholders merged, {} inheritance edges annotated, {} dangling endpoints created, {} handler edges resolved",
                report.placeholders_merged,
                report.inheritance_edges_annotated,
                report.dangling_endpoints_created,
                report.handler_edges_resolved
            );
        }
        Command::Clear { language } => match &language {
            Some(lang) => driver.clear(ClearScope::Language(lang))?,
            None => driver.clear(ClearScope::All)?,
        },
        Command::Query { text, params } => {
            let refs: Vec<&str> = params.iter().map(|p| p.as_str()).collect();
            for row in driver.query(&text, &refs)? {
                let json = serde_json::to_string(&row).unwrap_or_default();
                println!("{json}");
            }
        }
        Command::Stats => {
            let stats = driver.statistics()?;
            println!("vertices by label: {:?}", stats.node_counts_by_label);
            println!("edges by type: {:?}", stats.edge_counts_by_type);
            println!("vertices by language: {:?}", stats.language_counts);
        }
        Command::ExportCsv { output_dir } => {
            let report = driver.export_csv(&output_dir)?;
            println!(
                "{} vertex files ({} vertices), {} edge files ({} edges) written to {}",
                report.vertex_files_written,
                report.vertices_exported,
                report.edge_files_written,
                report.edges_exported,
                output_dir.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn index_subcommand_parses_root_and_optional_config() {
        let cli = Cli::parse_from(["codegraph", "index", "/tmp/repo"]);
        match cli.command {
            Command::Index { root, config } => {
                assert_eq!(root, PathBuf::from("/tmp/repo"));
                assert!(config.is_none());
            }
            _ => panic!("expected Index"),
        }
    }

    #[test]
    fn db_flag_defaults_when_absent() {
        let cli = Cli::parse_from(["codegraph", "stats"]);
        assert_eq!(cli.db, PathBuf::from("codegraph.db"));
    }
}
