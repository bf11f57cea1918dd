use tvg::flags::Flags;
use tvg::graph::SparseGraph;
use tvg::object_id::ObjectId;
use tvg::tvg::Tvg;

#[test]
fn compress_buckets_a_hundred_graphs_into_twenty() {
    let mut tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
    for t in 0..100i64 {
        let mut g = SparseGraph::new(Flags::empty());
        g.set(0, 0, (t + 1) as f32);
        tvg.link(g, t, ObjectId::None).unwrap();
    }

    tvg.compress(5, 100).unwrap();

    let graphs: Vec<_> = tvg.iter().collect();
    assert_eq!(graphs.len(), 20);

    for (i, handle) in graphs.iter().enumerate() {
        let g = handle.borrow();
        let base = (i as i64) * 5;
        let expected: f32 = (0..5).map(|k| (base + k + 1) as f32).sum();
        assert!((g.get(0, 0) - expected).abs() < 1e-3);
    }
}
