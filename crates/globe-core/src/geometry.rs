//! Arc construction between two point-field entries.
//!
//! An arc is built in two steps: the straight chord between the endpoints is
//! sampled and each sample pushed back out to the arc radius (cheap great-circle
//! approximation), then the resulting control points are resampled with a
//! centripetal Catmull-Rom spline so the revealed polyline is smooth.

use crate::config::Palette;
use crate::connection::Hop;
use crate::constants::START_MARKER_RADIUS;
use crate::scene::{Primitive, SceneGraph};
use glam::Vec3;

/// Sampled geometry of one hop.
#[derive(Clone, Debug)]
pub struct ArcPath {
    /// `segments + 1` renormalized chord samples.
    pub control: Vec<Vec3>,
    /// Smoothed polyline revealed progressively while the hop grows.
    pub samples: Vec<Vec3>,
}

impl ArcPath {
    pub fn new(start: Vec3, end: Vec3, segments: usize, curve_samples: usize, arc_radius: f32) -> Self {
        let control = build_arc(start, end, segments, arc_radius);
        let samples = catmull_rom(&control, curve_samples);
        Self { control, samples }
    }

    #[inline]
    pub fn first(&self) -> Vec3 {
        self.control.first().copied().unwrap_or(Vec3::ZERO)
    }

    #[inline]
    pub fn last(&self) -> Vec3 {
        self.samples.last().copied().unwrap_or(Vec3::ZERO)
    }
}

/// Lerp the chord from `start` to `end` into `segments + 1` points, each rescaled to `arc_radius`.
pub fn build_arc(start: Vec3, end: Vec3, segments: usize, arc_radius: f32) -> Vec<Vec3> {
    let segments = segments.max(1);
    (0..=segments)
        .map(|j| {
            let t = j as f32 / segments as f32;
            let p = start.lerp(end, t);
            // antipodal chords pass through the origin; keep the start direction there
            p.try_normalize()
                .or_else(|| start.try_normalize())
                .unwrap_or(Vec3::Y)
                * arc_radius
        })
        .collect()
}

/// Resample `points` into `divisions + 1` points along a centripetal Catmull-Rom curve.
///
/// Parameterized uniformly over control-point spans, endpoints extrapolated
/// linearly; the first and last output points coincide with the first and last
/// control points.
pub fn catmull_rom(points: &[Vec3], divisions: usize) -> Vec<Vec3> {
    match points.len() {
        0 => return Vec::new(),
        1 => return vec![points[0]; divisions + 1],
        _ => {}
    }
    let divisions = divisions.max(1);
    (0..=divisions)
        .map(|d| curve_point(points, d as f32 / divisions as f32))
        .collect()
}

fn curve_point(points: &[Vec3], t: f32) -> Vec3 {
    let l = points.len();
    let p = (l - 1) as f32 * t;
    let mut int_point = p.floor() as usize;
    let mut weight = p - int_point as f32;
    if int_point >= l - 1 {
        int_point = l - 2;
        weight = 1.0;
    }

    let p1 = points[int_point];
    let p2 = points[int_point + 1];
    let p0 = if int_point > 0 {
        points[int_point - 1]
    } else {
        p1 + (p1 - p2)
    };
    let p3 = if int_point + 2 < l {
        points[int_point + 2]
    } else {
        p2 + (p2 - p1)
    };

    // centripetal parameterization: knot spacing ~ sqrt(distance)
    let mut dt0 = p0.distance_squared(p1).powf(0.25);
    let mut dt1 = p1.distance_squared(p2).powf(0.25);
    let mut dt2 = p2.distance_squared(p3).powf(0.25);
    if dt1 < 1e-4 {
        dt1 = 1.0;
    }
    if dt0 < 1e-4 {
        dt0 = dt1;
    }
    if dt2 < 1e-4 {
        dt2 = dt1;
    }

    let t1 = ((p1 - p0) / dt0 - (p2 - p0) / (dt0 + dt1) + (p2 - p1) / dt1) * dt1;
    let t2 = ((p2 - p1) / dt1 - (p3 - p1) / (dt1 + dt2) + (p3 - p2) / dt2) * dt1;

    // cubic Hermite between p1 and p2
    let c0 = p1;
    let c1 = t1;
    let c2 = -3.0 * p1 + 3.0 * p2 - 2.0 * t1 - t2;
    let c3 = 2.0 * p1 - 2.0 * p2 + t1 + t2;
    let w = weight;
    c0 + c1 * w + c2 * (w * w) + c3 * (w * w * w)
}

/// Settings needed to tessellate a hop; copied out of the active tier.
#[derive(Clone, Copy, Debug)]
pub struct HopGeometry {
    pub arc_segments: usize,
    pub curve_samples: usize,
    pub arc_radius: f32,
}

/// Build a hop from `start` to `end` and register its primitives in `scene`.
///
/// The polyline starts degenerate (first sample twice) and everything is fully
/// transparent; only hop 0 of a connection starts active.
pub fn build_hop(
    scene: &mut SceneGraph,
    start: Vec3,
    end: Vec3,
    index: usize,
    geometry: HopGeometry,
    palette: &Palette,
) -> Hop {
    let path = ArcPath::new(
        start,
        end,
        geometry.arc_segments,
        geometry.curve_samples,
        geometry.arc_radius,
    );
    let head = path.samples.first().copied().unwrap_or(start);
    let line = scene.add_to_globe(Primitive::Polyline {
        points: vec![head, head],
        color: palette.arc,
        opacity: 0.0,
    });
    let start_marker = scene.add_to_globe(Primitive::Marker {
        center: path.first(),
        radius: START_MARKER_RADIUS,
        color: palette.marker,
        opacity: 0.0,
    });
    Hop::new(path, line, start_marker, index == 0)
}
