use tvg::flags::Flags;
use tvg::graph::power_iteration::{power_iteration, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
use tvg::graph::SparseGraph;

#[test]
fn power_iteration_finds_known_stationary_vector() {
    // G = [[0.5, 0.5], [0.2, 0.8]], directed: (0,0)=0.5 (0,1)=0.5 (1,0)=0.2 (1,1)=0.8.
    // (1/sqrt2, 1/sqrt2) is already a fixed point with eigenvalue 1.
    let mut g = SparseGraph::new(Flags::DIRECTED);
    g.set(0, 0, 0.5);
    g.set(0, 1, 0.5);
    g.set(1, 0, 0.2);
    g.set(1, 1, 0.8);

    let result = power_iteration(&g, None, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE);

    assert!(result.converged);
    assert!(result.iterations <= 64);
    assert!((result.eigenvalue - 1.0).abs() < 1e-7);

    let expected = 1.0 / 2.0f64.sqrt();
    assert!((result.vector.get(0) as f64 - expected).abs() < 1e-7);
    assert!((result.vector.get(1) as f64 - expected).abs() < 1e-7);
}
