use tvg::flags::Flags;
use tvg::graph::SparseGraph;
use tvg::metric::RectSum;
use tvg::object_id::ObjectId;
use tvg::tvg::Tvg;
use tvg::window::Window;

fn edge_graph(a: u64, b: u64, w: f32) -> SparseGraph {
    let mut g = SparseGraph::new(Flags::empty());
    g.set(a, b, w);
    g
}

#[test]
fn rect_window_isolates_exactly_enclosed_graph() {
    let mut tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
    tvg.link(edge_graph(0, 0, 1.0), 100, ObjectId::None).unwrap();
    tvg.link(edge_graph(0, 1, 2.0), 200, ObjectId::None).unwrap();
    tvg.link(edge_graph(0, 2, 3.0), 300, ObjectId::None).unwrap();

    let mut window = Window::new(-50, 50, 0).unwrap();
    window.attach(Box::new(RectSum::new(Flags::empty())));
    window.update(&tvg, 200).unwrap();

    let aggregate = window.metric(0).aggregate().as_graph().unwrap();
    assert_eq!(aggregate.get(0, 1), 2.0);
    assert_eq!(aggregate.num_edges(), 1);
    assert!(!aggregate.has_edge(0, 0));
    assert!(!aggregate.has_edge(0, 2));
}
