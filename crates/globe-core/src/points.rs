//! Evenly distributed connection endpoints on the globe surface.

use glam::Vec3;
use smallvec::SmallVec;
use std::f32::consts::PI;

/// Candidate list returned by neighbour queries; rarely more than a dozen entries.
pub type Neighbors = SmallVec<[usize; 16]>;

/// Fixed set of points on a sphere of radius `radius`, generated once at setup.
#[derive(Clone, Debug)]
pub struct PointField {
    points: Vec<Vec3>,
    radius: f32,
}

impl PointField {
    /// Golden-angle (Fibonacci) spiral: `phi = acos(-1 + 2i/N)`, `theta = sqrt(N*pi) * phi`.
    pub fn generate(count: usize, radius: f32) -> Self {
        let n = count as f32;
        let points = (0..count)
            .map(|i| {
                let phi = (-1.0 + (2.0 * i as f32) / n).clamp(-1.0, 1.0).acos();
                let theta = (n * PI).sqrt() * phi;
                Vec3::new(
                    radius * phi.sin() * theta.cos(),
                    radius * phi.sin() * theta.sin(),
                    radius * phi.cos(),
                )
            })
            .collect();
        Self { points, radius }
    }

    /// Wrap an explicit point set (used for custom layouts and tests).
    pub fn from_points(points: Vec<Vec3>, radius: f32) -> Self {
        Self { points, radius }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Vec3> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Every point strictly closer than `max_distance` to `points[index]`, excluding itself.
    ///
    /// Linear scan over the whole field; N stays small (<= 120) so no index is kept.
    pub fn neighbors_within(&self, index: usize, max_distance: f32) -> Neighbors {
        let Some(origin) = self.get(index) else {
            return Neighbors::new();
        };
        let max_sq = max_distance * max_distance;
        self.points
            .iter()
            .enumerate()
            .filter(|&(j, p)| j != index && origin.distance_squared(*p) < max_sq)
            .map(|(j, _)| j)
            .collect()
    }
}
