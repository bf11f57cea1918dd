use tvg::flags::Flags;
use tvg::graph::SparseGraph;
use tvg::metric::ExpDecaySum;
use tvg::object_id::ObjectId;
use tvg::tvg::Tvg;
use tvg::window::{Window, NEG_INFINITY, POS_INFINITY};

#[test]
fn exp_decay_window_tracks_beta_power_and_recovers_on_return() {
    let mut tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
    let mut g = SparseGraph::new(Flags::empty());
    g.set(0, 0, 1.0);
    tvg.link(g, 0, ObjectId::None).unwrap();

    let mut window = Window::new(NEG_INFINITY, POS_INFINITY, 0).unwrap();
    let log_beta = 0.3f64.ln();
    window.attach(Box::new(ExpDecaySum::new(Flags::empty(), 1.0, log_beta).unwrap()));

    window.update(&tvg, 0).unwrap();
    let at_zero = window.metric(0).aggregate().as_graph().unwrap().get(0, 0) as f64;
    assert!((at_zero - 1.0).abs() < 1e-9);

    window.update(&tvg, 100).unwrap();
    let at_hundred = window.metric(0).aggregate().as_graph().unwrap().get(0, 0) as f64;
    let expected = 0.3f64.powi(100);
    assert!((at_hundred - expected).abs() < expected.max(1e-300) * 1e-6 + 1e-12);

    window.update(&tvg, 0).unwrap();
    let back_to_zero = window.metric(0).aggregate().as_graph().unwrap().get(0, 0) as f64;
    assert!((back_to_zero - 1.0).abs() < 1e-9);
}
