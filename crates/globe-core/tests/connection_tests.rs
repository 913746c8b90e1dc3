// Host-side tests for the connection lifecycle: envelope, growth, cascade, retirement, spawning.

use globe_core::{
    random_walk, ConnectionPhase, ConnectionSet, ConnectionTiming, DynamicConnection, Envelope,
    HopGeometry, Palette, PointField, Primitive, SceneGraph, SpawnOutcome, SpawnParams,
    FADE_IN_SEC, FADE_OUT_SEC, GLOBE_RADIUS, GROWTH_SEC, NEIGHBOR_RADIUS,
};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

const GEOMETRY: HopGeometry = HopGeometry {
    arc_segments: 20,
    curve_samples: 40,
    arc_radius: 542.0,
};

fn opacity_of(scene: &SceneGraph, id: globe_core::PrimitiveId) -> f32 {
    scene.get(id).and_then(|p| p.opacity()).expect("primitive present")
}

fn chain(hops: usize, seed: u64) -> Vec<Vec3> {
    let field = PointField::generate(120, GLOBE_RADIUS);
    let mut rng = StdRng::seed_from_u64(seed);
    let path = random_walk(&field, hops, NEIGHBOR_RADIUS, &mut rng);
    assert_eq!(path.len(), hops + 1, "full field always has neighbours");
    path.to_vec()
}

fn connection(hops: usize, max_life: f32, scene: &mut SceneGraph) -> DynamicConnection {
    DynamicConnection::from_path(
        0,
        &chain(hops, 7),
        ConnectionTiming::with_max_life(max_life),
        GEOMETRY,
        &Palette::default(),
        scene,
    )
    .expect("path has at least two points")
}

#[test]
fn phases_run_from_spawning_to_retired() {
    let mut scene = SceneGraph::new();
    let mut c = connection(2, 5.0, &mut scene);
    assert_eq!(c.phase(), ConnectionPhase::Spawning);
    assert!(c.tick(0.05, &mut scene));
    assert_eq!(c.phase(), ConnectionPhase::Growing(0));
    while c.phase() != ConnectionPhase::Complete {
        assert!(c.tick(0.05, &mut scene));
    }
    c.life = 4.6;
    assert_eq!(c.phase(), ConnectionPhase::FadingOut);
    assert!(!c.tick(0.5, &mut scene));
    assert_eq!(c.phase(), ConnectionPhase::Retired);
}

#[test]
fn envelope_boundaries() {
    let m = 6.5;
    let env = Envelope {
        max_life: m,
        fade_in: FADE_IN_SEC,
        fade_out: FADE_OUT_SEC,
    };
    assert_eq!(env.opacity_at(0.0), 0.0);
    assert!((env.opacity_at(FADE_IN_SEC) - 1.0).abs() < 1e-6);
    assert!((env.opacity_at(m - FADE_OUT_SEC) - 1.0).abs() < 1e-6);
    assert_eq!(env.opacity_at(m), 0.0);
    assert!(env.is_expired(m));
    assert!(!env.is_expired(m - 0.01));

    // linear ramps
    assert!((env.opacity_at(FADE_IN_SEC / 2.0) - 0.5).abs() < 1e-5);
    assert!((env.opacity_at(m - FADE_OUT_SEC / 2.0) - 0.5).abs() < 1e-5);
}

#[test]
fn random_timing_stays_in_five_to_eight_seconds() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let t = ConnectionTiming::random(&mut rng);
        assert!(t.envelope.max_life >= 5.0 && t.envelope.max_life < 8.0);
        assert_eq!(t.envelope.fade_in, FADE_IN_SEC);
        assert_eq!(t.envelope.fade_out, FADE_OUT_SEC);
        assert_eq!(t.growth, GROWTH_SEC);
    }
}

#[test]
fn spawn_and_retire_with_one_second_ticks() {
    let mut scene = SceneGraph::new();
    let mut set = ConnectionSet::new();
    let c = connection(3, 5.0, &mut scene);
    let id = c.id;
    assert_eq!(set.insert(c, 10, &mut scene), SpawnOutcome::Spawned(id));

    let mut opacities = Vec::new();
    for _ in 0..4 {
        set.tick(1.0, &mut scene);
        opacities.push(set.get(id).expect("still live").envelope_opacity());
    }
    assert_eq!(opacities, vec![1.0, 1.0, 1.0, 1.0]);

    // cumulative life reaches 5.0 here
    let retired = set.tick(1.0, &mut scene);
    assert_eq!(retired, 1);
    assert!(!set.contains(id));
    assert!(set.is_empty());
    assert!(scene.is_empty(), "retired connection left primitives behind");

    set.tick(1.0, &mut scene);
    assert!(set.is_empty());
}

#[test]
fn fade_out_is_visible_before_retirement() {
    let mut scene = SceneGraph::new();
    let mut c = connection(2, 5.0, &mut scene);
    assert!(c.tick(4.75, &mut scene));
    assert!((c.envelope_opacity() - 0.5).abs() < 1e-4);
    assert_eq!(c.phase(), ConnectionPhase::FadingOut);
    assert!(!c.tick(0.25, &mut scene));
}

#[test]
fn hop_growth_is_monotonic_and_completes() {
    let mut scene = SceneGraph::new();
    let mut c = connection(2, 7.0, &mut scene);
    let total = c.hops[0].total_samples();
    assert_eq!(total, 41);

    let mut prev = 0;
    while c.life < GROWTH_SEC + 0.05 {
        assert!(c.tick(0.01, &mut scene));
        let revealed = c.hops[0].revealed_points();
        assert!(revealed >= prev, "revealed went from {prev} to {revealed}");
        prev = revealed;
        if let Some(Primitive::Polyline { points, .. }) = scene.get(c.hops[0].line) {
            if revealed > 1 {
                assert_eq!(points.len(), revealed);
                assert_eq!(points[..], c.hops[0].path.samples[..revealed]);
            }
        }
    }
    assert_eq!(prev, total);
    assert!(c.hops[0].growth_complete);
}

#[test]
fn growing_line_and_marker_opacity_follow_envelope() {
    let mut scene = SceneGraph::new();
    let mut c = connection(2, 7.0, &mut scene);
    c.tick(0.1, &mut scene);
    let env = c.envelope_opacity();
    let hop = &c.hops[0];
    // age 0.1 -> marker ramp 0.5
    assert!((opacity_of(&scene, hop.start_marker) - 0.5 * env).abs() < 1e-5);
    // growth 0.1/0.6 of 41 samples = 6 points -> visible
    assert_eq!(hop.revealed_points(), 6);
    assert!((opacity_of(&scene, hop.line) - 0.8 * env).abs() < 1e-5);
}

#[test]
fn inactive_hops_hide_their_line_and_dim_their_marker() {
    let mut scene = SceneGraph::new();
    let mut c = connection(3, 7.0, &mut scene);
    c.tick(0.2, &mut scene);
    let env = c.envelope_opacity();
    for hop in &c.hops[1..] {
        assert!(!hop.is_active);
        assert_eq!(opacity_of(&scene, hop.line), 0.0);
        assert!((opacity_of(&scene, hop.start_marker) - 0.5 * env).abs() < 1e-5);
    }
}

#[test]
fn hops_activate_in_order_one_per_tick() {
    let mut scene = SceneGraph::new();
    let mut c = connection(4, 7.5, &mut scene);
    let mut was_active: Vec<bool> = c.hops.iter().map(|h| h.is_active).collect();
    assert_eq!(was_active, vec![true, false, false, false]);

    for _ in 0..200 {
        if !c.tick(0.05, &mut scene) {
            break;
        }
        let now_active: Vec<bool> = c.hops.iter().map(|h| h.is_active).collect();
        let newly: Vec<usize> = (0..now_active.len())
            .filter(|&i| now_active[i] && !was_active[i])
            .collect();
        assert!(newly.len() <= 1, "several hops activated in one tick: {newly:?}");
        for &i in &newly {
            let prev = &c.hops[i - 1];
            assert!(prev.growth_complete, "hop {i} activated before hop {} finished", i - 1);
            assert_eq!(prev.revealed_points(), prev.total_samples());
            assert!(c.hops[i].activated_at > prev.activated_at);
            assert!((c.hops[i].activated_at - c.life).abs() < 1e-6);
        }
        was_active = now_active;
    }
    assert!(was_active.iter().all(|a| *a));
}

#[test]
fn end_marker_appears_once_after_last_hop_completes() {
    let mut scene = SceneGraph::new();
    let mut c = connection(2, 7.0, &mut scene);
    let base = scene.len();
    while !c.hops[1].growth_complete {
        assert!(!c.end_marker_created());
        assert!(c.tick(0.05, &mut scene));
    }
    assert!(c.end_marker_created());
    assert_eq!(scene.len(), base + 1);
    assert_eq!(c.phase(), ConnectionPhase::Complete);

    let end = c.end_marker.unwrap();
    match scene.get(end) {
        Some(Primitive::Marker { center, radius, .. }) => {
            assert_eq!(*radius, 2.0);
            assert!(center.distance(c.hops[1].path.last()) < 1e-5);
        }
        other => panic!("expected end marker, got {other:?}"),
    }

    c.tick(0.05, &mut scene);
    assert_eq!(scene.len(), base + 1, "end marker created twice");
    assert!((opacity_of(&scene, end) - c.envelope_opacity()).abs() < 1e-6);
}

#[test]
fn chained_hops_share_endpoints() {
    let mut scene = SceneGraph::new();
    let c = connection(4, 7.0, &mut scene);
    for w in c.hops.windows(2) {
        let end_dir = w[0].path.control.last().unwrap().normalize();
        let start_dir = w[1].path.control[0].normalize();
        assert!(end_dir.distance(start_dir) < 1e-5);
    }
}

#[test]
fn random_walk_steps_stay_in_range() {
    let field = PointField::generate(120, GLOBE_RADIUS);
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..50 {
        let path = random_walk(&field, 5, NEIGHBOR_RADIUS, &mut rng);
        assert_eq!(path.len(), 6);
        for w in path.windows(2) {
            let d = w[0].distance(w[1]);
            assert!(d > 0.0 && d < NEIGHBOR_RADIUS);
        }
    }
}

#[test]
fn spawning_respects_capacity() {
    let field = PointField::generate(120, GLOBE_RADIUS);
    let palette = Palette::default();
    let mut scene = SceneGraph::new();
    let mut set = ConnectionSet::new();
    let mut rng = StdRng::seed_from_u64(3);
    let params = SpawnParams {
        capacity: 3,
        max_hops: 3,
        max_distance: NEIGHBOR_RADIUS,
        geometry: GEOMETRY,
        palette: &palette,
    };

    for i in 0..3 {
        match set.try_spawn(&field, &params, &mut scene, &mut rng) {
            SpawnOutcome::Spawned(id) => assert_eq!(id, i),
            other => panic!("expected spawn, got {other:?}"),
        }
    }
    let primitives = scene.len();
    for _ in 0..5 {
        assert_eq!(
            set.try_spawn(&field, &params, &mut scene, &mut rng),
            SpawnOutcome::AtCapacity
        );
        assert_eq!(set.len(), 3);
    }
    assert_eq!(scene.len(), primitives, "rejected spawn leaked primitives");

    // once something retires there is room again
    set.tick(9.0, &mut scene);
    assert!(set.is_empty());
    assert!(matches!(
        set.try_spawn(&field, &params, &mut scene, &mut rng),
        SpawnOutcome::Spawned(3)
    ));
}

#[test]
fn isolated_start_point_aborts_the_spawn() {
    let field = PointField::from_points(
        vec![
            Vec3::new(GLOBE_RADIUS, 0.0, 0.0),
            Vec3::new(-GLOBE_RADIUS, 0.0, 0.0),
            Vec3::new(0.0, 0.0, GLOBE_RADIUS),
        ],
        GLOBE_RADIUS,
    );
    let palette = Palette::default();
    let mut scene = SceneGraph::new();
    let mut set = ConnectionSet::new();
    let mut rng = StdRng::seed_from_u64(11);
    let params = SpawnParams {
        capacity: 10,
        max_hops: 5,
        max_distance: NEIGHBOR_RADIUS,
        geometry: GEOMETRY,
        palette: &palette,
    };
    for _ in 0..10 {
        assert_eq!(
            set.try_spawn(&field, &params, &mut scene, &mut rng),
            SpawnOutcome::NoNeighbors
        );
    }
    assert!(set.is_empty());
    assert!(scene.is_empty());
}

#[test]
fn insert_over_capacity_discards_primitives() {
    let mut scene = SceneGraph::new();
    let mut set = ConnectionSet::new();
    let c = connection(2, 6.0, &mut scene);
    assert_eq!(set.insert(c, 0, &mut scene), SpawnOutcome::AtCapacity);
    assert!(scene.is_empty());
}

#[test]
fn clear_removes_every_primitive() {
    let mut scene = SceneGraph::new();
    let mut set = ConnectionSet::new();
    let c = connection(3, 6.0, &mut scene);
    set.insert(c, 10, &mut scene);
    set.tick(2.0, &mut scene);
    assert!(!scene.is_empty());
    set.clear(&mut scene);
    assert!(set.is_empty());
    assert!(scene.is_empty());
}
