//! Property-based checks on the store gateway's core contracts (§3.5
//! invariant 2, §4.2's upsert-by-id semantics) using arbitrary id/edge
//! shapes rather than hand-picked fixtures.

use std::collections::HashSet;

use codegraph::store::GraphGateway;
use codegraph::types::{Edge, EdgeKind, Language, PrimaryLabel, Vertex};
use proptest::prelude::*;

fn arb_id() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn vertex(id: &str) -> Vertex {
    Vertex::new(id.to_string(), PrimaryLabel::Class, Language::Php, id.to_string(), id.to_string())
}

proptest! {
    /// Every edge whose endpoints were both written in the same batch as
    /// vertices is immediately present; no ordering within the vertex list
    /// matters.
    #[test]
    fn edges_between_co_batched_vertices_always_land(ids in prop::collection::vec(arb_id(), 2..8)) {
        let mut unique: Vec<String> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        prop_assume!(unique.len() >= 2);
        unique.sort();

        let mut gw = GraphGateway::in_memory().unwrap();
        let vertices: Vec<Vertex> = unique.iter().map(|id| vertex(id)).collect();
        let edges: Vec<Edge> = unique.windows(2).map(|w| Edge::new(EdgeKind::Calls, w[0].clone(), w[1].clone())).collect();
        let expected_edges = edges.len();

        let (_, written) = gw.write_batch(&vertices, &edges, Language::Php).unwrap();
        prop_assert_eq!(written, expected_edges);
        prop_assert_eq!(gw.pending_edge_count(), 0);
    }

    /// Writing the same vertex set twice never changes the stored row
    /// count (upsert-by-id, not append).
    #[test]
    fn rewriting_the_same_vertices_is_idempotent_on_count(ids in prop::collection::vec(arb_id(), 1..8)) {
        let unique: Vec<String> = ids.into_iter().collect::<HashSet<_>>().into_iter().collect();
        let mut gw = GraphGateway::in_memory().unwrap();
        let vertices: Vec<Vertex> = unique.iter().map(|id| vertex(id)).collect();

        gw.write_batch(&vertices, &[], Language::Php).unwrap();
        let first_count = gw.get_all_vertices().unwrap().len();

        gw.write_batch(&vertices, &[], Language::Php).unwrap();
        let second_count = gw.get_all_vertices().unwrap().len();

        prop_assert_eq!(first_count, second_count);
        prop_assert_eq!(first_count, unique.len());
    }

    /// An edge referencing an id never written as a vertex is deferred,
    /// never silently materialized as a phantom row in `edges`.
    #[test]
    fn edge_to_a_never_written_target_never_appears_until_the_target_does(id in arb_id(), missing in arb_id()) {
        prop_assume!(id != missing);
        let mut gw = GraphGateway::in_memory().unwrap();
        let edge = Edge::new(EdgeKind::Calls, id.clone(), missing.clone());
        let (_, written) = gw.write_batch(&[vertex(&id)], &[edge], Language::Php).unwrap();
        prop_assert_eq!(written, 0);

        let edges = gw.get_all_edges().unwrap();
        prop_assert!(edges.is_empty());
    }
}
