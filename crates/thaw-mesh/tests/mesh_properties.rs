use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use thaw_mesh::{generate_mesh, raw_edges, MeshParams};

fn spacings(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

fn check_invariants(params: &MeshParams, edges: &[f64]) {
    assert!(edges.len() >= 2);
    assert_eq!(edges[0], 0.0);
    assert_eq!(*edges.last().unwrap(), -params.depth);
    for pair in edges.windows(2) {
        assert!(pair[1] < pair[0], "edges not strictly decreasing: {pair:?}");
    }

    let raw = raw_edges(params).unwrap();
    let scale = params.depth / raw.last().unwrap();
    let cap = params.max_spacing * scale;
    let eps = 1e-9 * params.depth;
    let widths = spacings(edges);
    let mut capped = false;
    for pair in widths.windows(2) {
        assert!(pair[1] >= pair[0] - eps, "spacing shrank: {pair:?}");
    }
    for width in &widths {
        assert!(*width <= cap + eps);
        if capped {
            assert_abs_diff_eq!(*width, cap, epsilon = eps);
        }
        capped = capped || (*width - cap).abs() <= eps;
    }
}

proptest! {
    #[test]
    fn valid_configurations_produce_graded_meshes(
        depth in 0.5f64..50.0,
        initial in 0.001f64..0.5,
        growth in 1.0f64..1.5,
        cap_factor in 1.0f64..20.0,
    ) {
        let params = MeshParams::new(depth, initial, growth, initial * cap_factor);
        let edges = generate_mesh(depth, initial, growth, initial * cap_factor).unwrap();
        check_invariants(&params, &edges);
    }
}

#[test]
fn reference_configuration_is_reproducible() {
    let params = MeshParams::new(2.5, 0.02, 1.01, 0.08);
    let first = generate_mesh(2.5, 0.02, 1.01, 0.08).expect("mesh");
    let second = generate_mesh(2.5, 0.02, 1.01, 0.08).expect("mesh");
    assert_eq!(first, second);
    assert_eq!(first.len(), 83);
    check_invariants(&params, &first);

    let raw = raw_edges(&params).expect("raw");
    let widths = spacings(&raw);
    assert_eq!(widths[0], 0.02);
    assert_abs_diff_eq!(widths[1], 0.0202, epsilon = 1e-15);
    // 2.5 m is reached before the 0.08 cap.
    assert!(widths.iter().all(|w| *w < 0.08));
    assert!(widths.last().unwrap() > &0.044);
}

#[test]
fn deep_domains_settle_on_the_cap() {
    let params = MeshParams::new(20.0, 0.02, 1.01, 0.08);
    let raw = raw_edges(&params).expect("raw");
    let widths = spacings(&raw);
    let first_capped = widths
        .iter()
        .position(|w| (*w - 0.08).abs() < 1e-12)
        .expect("cap reached");
    assert!(widths[..first_capped].iter().all(|w| *w < 0.08));
    for width in &widths[first_capped..] {
        assert_abs_diff_eq!(*width, 0.08, epsilon = 1e-12);
    }

    let edges = generate_mesh(20.0, 0.02, 1.01, 0.08).expect("mesh");
    check_invariants(&params, &edges);
}

#[test]
fn invalid_configurations_are_rejected_up_front() {
    let cases = [
        (0.0, 0.02, 1.01, 0.08, "mesh_depth"),
        (-1.0, 0.02, 1.01, 0.08, "mesh_depth"),
        (2.5, 0.0, 1.01, 0.08, "mesh_initial_spacing"),
        (2.5, 0.02, 0.0, 0.08, "mesh_growth_factor"),
        (2.5, 0.02, 1.01, 0.01, "mesh_spacing_cap"),
        (2.5, 0.02, 1.01, f64::INFINITY, "mesh_max_spacing"),
        (1e9, 1e-6, 1.0, 1e-6, "mesh_too_fine"),
    ];
    for (depth, initial, growth, cap, code) in cases {
        let err = generate_mesh(depth, initial, growth, cap).unwrap_err();
        assert!(matches!(err, thaw_core::ThawError::Config(_)));
        assert_eq!(err.info().code, code);
    }
}
