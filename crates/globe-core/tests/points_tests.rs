// Host-side tests for the Fibonacci point field and neighbour queries.

use globe_core::{PointField, GLOBE_RADIUS, NEIGHBOR_RADIUS};
use glam::Vec3;

#[test]
fn every_point_lies_on_the_sphere() {
    for &n in &[1usize, 2, 60, 120] {
        let field = PointField::generate(n, GLOBE_RADIUS);
        assert_eq!(field.len(), n);
        for p in field.points() {
            let err = (p.length() - GLOBE_RADIUS).abs();
            assert!(err < 1e-2, "point {p:?} off-sphere by {err} (n={n})");
        }
    }
}

#[test]
fn points_are_distinct_up_to_120() {
    for &n in &[60usize, 120] {
        let field = PointField::generate(n, GLOBE_RADIUS);
        let pts = field.points();
        for i in 0..pts.len() {
            for j in (i + 1)..pts.len() {
                assert!(
                    pts[i].distance(pts[j]) > 1.0,
                    "points {i} and {j} coincide for n={n}"
                );
            }
        }
    }
}

#[test]
fn generation_is_deterministic() {
    let a = PointField::generate(120, GLOBE_RADIUS);
    let b = PointField::generate(120, GLOBE_RADIUS);
    assert_eq!(a.points(), b.points());
}

#[test]
fn spiral_spans_both_poles() {
    let field = PointField::generate(120, GLOBE_RADIUS);
    let zs: Vec<f32> = field.points().iter().map(|p| p.z).collect();
    let max_z = zs.iter().cloned().fold(f32::MIN, f32::max);
    let min_z = zs.iter().cloned().fold(f32::MAX, f32::min);
    assert!(max_z > 0.95 * GLOBE_RADIUS);
    assert!(min_z < -0.9 * GLOBE_RADIUS);
}

#[test]
fn every_point_has_a_neighbor_in_range_on_the_full_field() {
    let field = PointField::generate(120, GLOBE_RADIUS);
    for i in 0..field.len() {
        assert!(
            !field.neighbors_within(i, NEIGHBOR_RADIUS).is_empty(),
            "point {i} isolated"
        );
    }
}

#[test]
fn neighbors_exclude_self_and_respect_distance() {
    let field = PointField::generate(120, GLOBE_RADIUS);
    let origin = field.get(7).unwrap();
    let near = field.neighbors_within(7, NEIGHBOR_RADIUS);
    assert!(!near.contains(&7));
    for &j in &near {
        assert!(origin.distance(field.get(j).unwrap()) < NEIGHBOR_RADIUS);
    }
    // and nothing in range was missed
    let expected = field
        .points()
        .iter()
        .enumerate()
        .filter(|&(j, p)| j != 7 && origin.distance(*p) < NEIGHBOR_RADIUS)
        .count();
    assert_eq!(near.len(), expected);
}

#[test]
fn sparse_field_yields_no_neighbors() {
    let field = PointField::from_points(
        vec![
            Vec3::new(GLOBE_RADIUS, 0.0, 0.0),
            Vec3::new(-GLOBE_RADIUS, 0.0, 0.0),
            Vec3::new(0.0, GLOBE_RADIUS, 0.0),
        ],
        GLOBE_RADIUS,
    );
    for i in 0..field.len() {
        assert!(field.neighbors_within(i, NEIGHBOR_RADIUS).is_empty());
    }
    assert!(field.neighbors_within(99, NEIGHBOR_RADIUS).is_empty());
}
