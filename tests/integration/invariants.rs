//! Property-based checks for the quantified invariants in §8: the
//! nonzero/positive zero-entry policies, undirected edge symmetry, and
//! compression's total-weight preservation.

use proptest::prelude::*;
use tvg::flags::Flags;
use tvg::graph::SparseGraph;
use tvg::object_id::ObjectId;
use tvg::tvg::Tvg;
use tvg::vector::SparseVector;

fn small_index() -> impl Strategy<Value = u64> {
    0u64..64
}

fn small_weight() -> impl Strategy<Value = f32> {
    prop_oneof![
        Just(0.0f32),
        -10.0f32..10.0f32,
    ]
}

proptest! {
    // ∀k. ¬V.has(k) ∨ |V[k]| >= eps
    #[test]
    fn nonzero_vector_never_holds_a_sub_eps_entry(
        ops in prop::collection::vec((small_index(), small_weight()), 0..200),
    ) {
        let mut v = SparseVector::new(Flags::NONZERO);
        v.set_eps(1e-3);
        for (k, w) in ops {
            v.set(k, w);
            prop_assert!(!v.has(k) || v.get(k).abs() >= v.eps());
        }
        for (k, w) in v.entries() {
            prop_assert!(w.abs() >= v.eps(), "entry {k} = {w} violates nonzero policy");
        }
    }

    // ∀(s,t). ¬G.has(s,t) ∨ G[s,t] > 0
    #[test]
    fn positive_graph_never_holds_a_negative_edge(
        ops in prop::collection::vec((small_index(), small_index(), small_weight()), 0..200),
    ) {
        let mut g = SparseGraph::new(Flags::POSITIVE | Flags::DIRECTED);
        for (a, b, w) in ops {
            g.set(a, b, w);
        }
        for (_, _, w) in g.edges() {
            prop_assert!(w > 0.0, "positive-flagged graph stored a non-positive edge {w}");
        }
    }

    // Undirected graph: ∀(s,t). G[s,t] = G[t,s]
    #[test]
    fn undirected_edges_read_identically_both_ways(
        ops in prop::collection::vec((small_index(), small_index(), -10.0f32..10.0f32), 0..200),
    ) {
        let mut g = SparseGraph::new(Flags::empty());
        for (a, b, w) in &ops {
            g.set(*a, *b, *w);
        }
        for (a, b, _) in &ops {
            prop_assert_eq!(g.get(*a, *b), g.get(*b, *a));
        }
    }

    // add(k, w); sub(k, w) returns the vector to its prior state, modulo eps drift.
    #[test]
    fn add_then_sub_is_roundtrip(
        start in -5.0f32..5.0f32,
        delta in -5.0f32..5.0f32,
        k in small_index(),
    ) {
        let mut v = SparseVector::new(Flags::empty());
        v.set(k, start);
        v.add(k, delta);
        v.sub(k, delta);
        prop_assert!((v.get(k) - start).abs() < 1e-3);
    }

    // TVG compression with step=s, offset=o preserves total edge weight.
    #[test]
    fn compression_preserves_total_edge_weight(
        weights in prop::collection::vec(1.0f32..50.0f32, 1..60),
        step in 1i64..11,
        offset in -20i64..20,
    ) {
        let mut tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
        let mut total_before = 0.0f64;
        for (ts, w) in weights.iter().enumerate() {
            let mut g = SparseGraph::new(Flags::empty());
            g.set(0, 0, *w);
            g.set(1, 2, *w * 0.5);
            total_before += (*w + *w * 0.5) as f64;
            tvg.link(g, ts as i64, ObjectId::None).unwrap();
        }

        tvg.compress(step, offset).unwrap();

        let mut total_after = 0.0f64;
        for handle in tvg.iter() {
            let g = handle.borrow();
            for (_, _, w) in g.edges() {
                total_after += w as f64;
            }
        }
        prop_assert!((total_after - total_before).abs() < 1e-2 * total_before.max(1.0));
    }
}
