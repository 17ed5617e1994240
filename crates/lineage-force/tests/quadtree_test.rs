use lineage_force::{MassTerm, QuadTree, TreePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_points(seed: u64, n: usize, extent: f64) -> Vec<TreePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| TreePoint::new(rng.gen_range(0.0..extent), rng.gen_range(0.0..extent)))
        .collect()
}

/// Inverse-distance field from `terms` acting on `at`, the kernel the charge force uses.
fn field(at: TreePoint, terms: &[MassTerm]) -> (f64, f64) {
    let (mut fx, mut fy) = (0.0, 0.0);
    for t in terms {
        let (dx, dy) = (t.x - at.x, t.y - at.y);
        let l = dx * dx + dy * dy;
        if l > 0.0 {
            fx += dx * t.mass / l;
            fy += dy * t.mass / l;
        }
    }
    (fx, fy)
}

#[test]
fn empty_input_yields_no_terms() {
    let tree = QuadTree::build(&[]);
    assert!(tree.is_empty());
    assert!(tree.query(0, 0.9).is_empty());
    assert!(tree.within(0.0, 0.0, 100.0).is_empty());
}

#[test]
fn theta_zero_is_the_exact_pairwise_set() {
    let pts = random_points(1, 200, 1_000.0);
    let tree = QuadTree::build(&pts);
    for idx in [0, 17, 199] {
        let terms = tree.query(idx, 0.0);
        assert_eq!(terms.len(), 199);
        assert!(terms.iter().all(|t| t.mass == 1.0));
        assert!(!terms.contains(&MassTerm {
            mass: 1.0,
            x: pts[idx].x,
            y: pts[idx].y,
        }));
    }
}

#[test]
fn aggregated_mass_excludes_only_the_query_point() {
    let pts = random_points(2, 500, 1_000.0);
    let tree = QuadTree::build(&pts);
    assert_eq!(tree.mass(), 500.0);
    for idx in (0..500).step_by(37) {
        let terms = tree.query(idx, 0.9);
        let total: f64 = terms.iter().map(|t| t.mass).sum();
        assert_eq!(total, 499.0);
        assert!(terms.len() < 499, "theta 0.9 should aggregate distant cells");
    }
}

#[test]
fn barnes_hut_field_tracks_the_exact_field() {
    let pts = random_points(3, 400, 1_000.0);
    let tree = QuadTree::build(&pts);
    let mut err = 0.0;
    let mut scale = 0.0;
    for idx in 0..pts.len() {
        let exact = field(pts[idx], &tree.query(idx, 0.0));
        let approx = field(pts[idx], &tree.query(idx, 0.5));
        err += (exact.0 - approx.0).hypot(exact.1 - approx.1);
        scale += exact.0.hypot(exact.1);
    }
    assert!(err / scale < 0.05, "relative error {}", err / scale);
}

#[test]
fn coincident_cluster_does_not_split_forever() {
    let mut pts = vec![TreePoint::new(10.0, 10.0); 50];
    pts.push(TreePoint::new(10.0 + 1e-12, 10.0));
    pts.push(TreePoint::new(900.0, 900.0));
    let tree = QuadTree::build(&pts);
    assert_eq!(tree.mass(), 52.0);
    assert!(tree.cell_count() < 4 * 64);
    let terms = tree.query(0, 0.9);
    assert_eq!(terms.iter().map(|t| t.mass).sum::<f64>(), 51.0);
}

#[test]
fn within_matches_a_brute_force_scan() {
    let pts = random_points(4, 300, 500.0);
    let tree = QuadTree::build(&pts);
    for (x, y, r) in [(250.0, 250.0, 40.0), (0.0, 0.0, 120.0), (499.0, 10.0, 75.0)] {
        let mut got = tree.within(x, y, r);
        got.sort_unstable();
        let want: Vec<usize> = pts
            .iter()
            .enumerate()
            .filter(|(_, p)| (p.x - x).powi(2) + (p.y - y).powi(2) <= r * r)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(got, want);
    }
}
