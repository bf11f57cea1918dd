use tvg::flags::Flags;
use tvg::graph::bfs::{bfs_weighted, BfsControl};
use tvg::graph::SparseGraph;

#[test]
fn weighted_bfs_matches_accumulated_weight_order() {
    // 0 -> 1 -> 2 -> 3 all cost 1; 2 -> 4 and 3 -> 4 both cost 1.5, so 4 is
    // reached via 2 at accumulated cost 3.5, tying with (but arriving no
    // earlier than) the 3 -> 4 alternative at the same cost.
    let mut g = SparseGraph::new(Flags::DIRECTED);
    g.set(0, 1, 1.0);
    g.set(1, 2, 1.0);
    g.set(2, 3, 1.0);
    g.set(3, 4, 1.5);
    g.set(2, 4, 1.5);

    let mut order = Vec::new();
    bfs_weighted(&g, 0, |v| {
        order.push((v.node, v.parent, v.distance));
        BfsControl::Continue
    });

    assert_eq!(order.len(), 5);
    let by_node = |n: u64| order.iter().find(|(node, _, _)| *node == n).unwrap();

    let n0 = by_node(0);
    assert_eq!(n0.1, None);
    assert_eq!(n0.2, 0.0);

    let n1 = by_node(1);
    assert_eq!(n1.1, Some(0));
    assert!((n1.2 - 1.0).abs() < 1e-9);

    let n2 = by_node(2);
    assert_eq!(n2.1, Some(1));
    assert!((n2.2 - 2.0).abs() < 1e-9);

    let n3 = by_node(3);
    assert_eq!(n3.1, Some(2));
    assert!((n3.2 - 3.0).abs() < 1e-9);

    let n4 = by_node(4);
    assert_eq!(n4.1, Some(2));
    assert!((n4.2 - 3.5).abs() < 1e-9);

    // nodes settle in non-decreasing accumulated-weight order
    for w in order.windows(2) {
        assert!(w[0].2 <= w[1].2 + 1e-9);
    }
}
