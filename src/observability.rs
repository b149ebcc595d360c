//! Structured logging for the indexing pipeline.
//!
//! Extractors, the walker, the store gateway, and the linker all emit
//! `tracing` events at their diagnostic points rather than `println!`.

use tracing_subscriber::EnvFilter;

/// Initialize structured logging with `RUST_LOG` environment variable
/// support. Defaults to `codegraph=info` when `RUST_LOG` is not set. Call
/// once at program startup; subsequent calls are silently ignored.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("codegraph=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Counters surfaced alongside an [`crate::driver::IndexReport`] /
/// [`crate::driver::LinkReport`].
#[derive(Debug, Default, Clone)]
pub struct Metrics {
    pub indexing_duration_ms: Option<u64>,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub vertices_written: usize,
    pub edges_written: usize,
    pub unresolved_remaining: usize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "indexing_duration_ms": self.indexing_duration_ms,
            "files_processed": self.files_processed,
            "files_skipped": self.files_skipped,
            "vertices_written": self.vertices_written,
            "edges_written": self.edges_written,
            "unresolved_remaining": self.unresolved_remaining,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic_on_repeat_calls() {
        init_logging();
        init_logging();
    }

    #[test]
    fn metrics_default_is_zeroed() {
        let m = Metrics::new();
        assert_eq!(m.files_processed, 0);
        assert_eq!(m.vertices_written, 0);
        assert!(m.indexing_duration_ms.is_none());
    }

    #[test]
    fn metrics_to_json_round_trips_fields() {
        let mut m = Metrics::new();
        m.files_processed = 12;
        m.vertices_written = 340;
        let json = m.to_json();
        assert_eq!(json["files_processed"], 12);
        assert_eq!(json["vertices_written"], 340);
    }
}
