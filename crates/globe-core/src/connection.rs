//! Dynamic connections: chains of arcs that draw themselves hop by hop.
//!
//! Per connection the states run Growing(hop 0) -> Growing(hop 1) -> ... ->
//! Complete -> FadingOut -> Retired. A whole-connection opacity envelope
//! (fade in, hold, fade out) multiplies everything the connection draws; on
//! top of it each active hop reveals a growing prefix of its polyline and,
//! once fully grown, activates the next hop.

use crate::config::Palette;
use crate::constants::{
    END_MARKER_RADIUS, FADE_IN_SEC, FADE_OUT_SEC, GROWTH_SEC, LINE_OPACITY_SCALE,
    MARKER_RAMP_SEC, MAX_LIFE_BASE_SEC, MAX_LIFE_JITTER_SEC, PENDING_MARKER_OPACITY_SCALE,
};
use crate::geometry::{build_hop, ArcPath, HopGeometry};
use crate::points::PointField;
use crate::scene::{Primitive, PrimitiveId, SceneGraph};
use glam::Vec3;
use rand::Rng;
use smallvec::SmallVec;

/// One arc segment of a connection with its primitives and animation state.
#[derive(Clone, Debug)]
pub struct Hop {
    pub path: ArcPath,
    pub line: PrimitiveId,
    pub start_marker: PrimitiveId,
    pub is_active: bool,
    /// Connection `life` at which this hop became active.
    pub activated_at: f32,
    pub growth_complete: bool,
    revealed: usize,
}

impl Hop {
    pub fn new(path: ArcPath, line: PrimitiveId, start_marker: PrimitiveId, is_active: bool) -> Self {
        Self {
            path,
            line,
            start_marker,
            is_active,
            activated_at: 0.0,
            growth_complete: false,
            revealed: 0,
        }
    }

    /// Number of smoothed samples in the fully grown polyline.
    #[inline]
    pub fn total_samples(&self) -> usize {
        self.path.samples.len()
    }

    /// Number of polyline points currently drawn (0 until the first visible prefix).
    #[inline]
    pub fn revealed_points(&self) -> usize {
        self.revealed
    }
}

/// Fade-in / hold / fade-out schedule over a connection's life.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub max_life: f32,
    pub fade_in: f32,
    pub fade_out: f32,
}

impl Envelope {
    pub fn opacity_at(&self, life: f32) -> f32 {
        if life < self.fade_in {
            life / self.fade_in
        } else if life < self.max_life - self.fade_out {
            1.0
        } else if life < self.max_life {
            (self.max_life - life) / self.fade_out
        } else {
            0.0
        }
    }

    #[inline]
    pub fn is_expired(&self, life: f32) -> bool {
        life >= self.max_life
    }
}

/// Timing of one connection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConnectionTiming {
    pub envelope: Envelope,
    /// Per-hop growth duration.
    pub growth: f32,
}

impl ConnectionTiming {
    /// Standard timing with a lifespan drawn from 5..8 seconds.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self::with_max_life(MAX_LIFE_BASE_SEC + rng.gen::<f32>() * MAX_LIFE_JITTER_SEC)
    }

    pub fn with_max_life(max_life: f32) -> Self {
        Self {
            envelope: Envelope {
                max_life,
                fade_in: FADE_IN_SEC,
                fade_out: FADE_OUT_SEC,
            },
            growth: GROWTH_SEC,
        }
    }
}

/// Coarse lifecycle stage, derived from `life` and hop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Built and registered, not yet ticked.
    Spawning,
    Growing(usize),
    Complete,
    FadingOut,
    Retired,
}

#[derive(Clone, Debug)]
pub struct DynamicConnection {
    pub id: u64,
    pub hops: SmallVec<[Hop; 6]>,
    pub life: f32,
    pub timing: ConnectionTiming,
    pub end_marker: Option<PrimitiveId>,
    end_color: [f32; 3],
}

impl DynamicConnection {
    /// Chain hops along `path` (consecutive point pairs). Returns `None` for fewer than two points.
    pub fn from_path(
        id: u64,
        path: &[Vec3],
        timing: ConnectionTiming,
        geometry: HopGeometry,
        palette: &Palette,
        scene: &mut SceneGraph,
    ) -> Option<Self> {
        if path.len() < 2 {
            return None;
        }
        let hops = path
            .windows(2)
            .enumerate()
            .map(|(i, pair)| build_hop(scene, pair[0], pair[1], i, geometry, palette))
            .collect();
        Some(Self {
            id,
            hops,
            life: 0.0,
            timing,
            end_marker: None,
            end_color: palette.end_marker,
        })
    }

    #[inline]
    pub fn envelope_opacity(&self) -> f32 {
        self.timing.envelope.opacity_at(self.life)
    }

    #[inline]
    pub fn end_marker_created(&self) -> bool {
        self.end_marker.is_some()
    }

    pub fn phase(&self) -> ConnectionPhase {
        let env = self.timing.envelope;
        if self.life <= 0.0 {
            ConnectionPhase::Spawning
        } else if env.is_expired(self.life) {
            ConnectionPhase::Retired
        } else if self.life >= env.max_life - env.fade_out {
            ConnectionPhase::FadingOut
        } else {
            match self.hops.iter().position(|h| !h.growth_complete) {
                Some(i) => ConnectionPhase::Growing(i),
                None => ConnectionPhase::Complete,
            }
        }
    }

    /// Every primitive this connection owns.
    pub fn handles(&self) -> impl Iterator<Item = PrimitiveId> + '_ {
        self.hops
            .iter()
            .flat_map(|h| [h.line, h.start_marker])
            .chain(self.end_marker)
    }

    /// Advance by `dt` seconds. Returns `false` once the connection has retired;
    /// its primitives are then already removed from `scene`.
    pub fn tick(&mut self, dt: f32, scene: &mut SceneGraph) -> bool {
        self.life += dt;
        if self.timing.envelope.is_expired(self.life) {
            scene.remove_all(self.handles());
            return false;
        }
        let opacity = self.envelope_opacity();
        self.update_hops(opacity, scene);
        if let Some(end) = self.end_marker {
            scene.set_opacity(end, opacity);
        }
        true
    }

    fn update_hops(&mut self, opacity: f32, scene: &mut SceneGraph) {
        let life = self.life;
        let growth_duration = self.timing.growth;
        let hop_count = self.hops.len();

        for i in 0..hop_count {
            let hop = &mut self.hops[i];
            let age = life - hop.activated_at;
            if !hop.is_active || age <= 0.0 {
                // not yet drawing: arc hidden, start marker dimly pre-visible
                scene.set_opacity(hop.line, 0.0);
                scene.set_opacity(hop.start_marker, opacity * PENDING_MARKER_OPACITY_SCALE);
                continue;
            }

            scene.set_opacity(hop.start_marker, (age / MARKER_RAMP_SEC).min(1.0) * opacity);

            let growth = (age / growth_duration).min(1.0);
            let total = hop.total_samples();
            let count = ((growth * total as f32).floor() as usize).min(total);
            if count <= 1 {
                continue;
            }
            if count != hop.revealed {
                scene.set_polyline(hop.line, &hop.path.samples[..count]);
                hop.revealed = count;
            }
            scene.set_opacity(hop.line, opacity * LINE_OPACITY_SCALE);

            if growth < 1.0 {
                continue;
            }
            hop.growth_complete = true;
            let end_point = hop.path.last();
            if let Some(next) = self.hops.get_mut(i + 1) {
                if !next.is_active {
                    next.is_active = true;
                    next.activated_at = life;
                }
            } else if self.end_marker.is_none() {
                self.end_marker = Some(scene.add_to_globe(Primitive::Marker {
                    center: end_point,
                    radius: END_MARKER_RADIUS,
                    color: self.end_color,
                    opacity,
                }));
            }
        }
    }
}

/// Result of a spawn attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnOutcome {
    Spawned(u64),
    AtCapacity,
    /// The start point had no neighbour in range; nothing was added.
    NoNeighbors,
}

/// Random walk over the point field: from a uniformly random start, repeatedly
/// move to a uniformly random neighbour within `max_distance`, up to `max_hops`
/// times. Stops early when the current point has no neighbour.
pub fn random_walk(
    field: &PointField,
    max_hops: usize,
    max_distance: f32,
    rng: &mut impl Rng,
) -> SmallVec<[Vec3; 8]> {
    let mut path = SmallVec::new();
    if field.is_empty() {
        return path;
    }
    let mut current = rng.gen_range(0..field.len());
    path.extend(field.get(current));
    for _ in 0..max_hops {
        let candidates = field.neighbors_within(current, max_distance);
        if candidates.is_empty() {
            break;
        }
        current = candidates[rng.gen_range(0..candidates.len())];
        path.extend(field.get(current));
    }
    path
}

/// Inputs of one spawn attempt.
#[derive(Clone, Copy, Debug)]
pub struct SpawnParams<'a> {
    pub capacity: usize,
    pub max_hops: usize,
    pub max_distance: f32,
    pub geometry: HopGeometry,
    pub palette: &'a Palette,
}

/// All live connections, bounded by a capacity.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    connections: Vec<DynamicConnection>,
    next_id: u64,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicConnection> {
        self.connections.iter()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.connections.iter().any(|c| c.id == id)
    }

    pub fn get(&self, id: u64) -> Option<&DynamicConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Insert a connection built by the caller, respecting `capacity`.
    pub fn insert(&mut self, connection: DynamicConnection, capacity: usize, scene: &mut SceneGraph) -> SpawnOutcome {
        if self.connections.len() >= capacity {
            scene.remove_all(connection.handles());
            return SpawnOutcome::AtCapacity;
        }
        let id = connection.id;
        self.next_id = self.next_id.max(id + 1);
        self.connections.push(connection);
        SpawnOutcome::Spawned(id)
    }

    /// Build a random connection over `field` and add it if below capacity.
    pub fn try_spawn(
        &mut self,
        field: &PointField,
        params: &SpawnParams<'_>,
        scene: &mut SceneGraph,
        rng: &mut impl Rng,
    ) -> SpawnOutcome {
        if self.connections.len() >= params.capacity {
            return SpawnOutcome::AtCapacity;
        }
        let path = random_walk(field, params.max_hops, params.max_distance, rng);
        let timing = ConnectionTiming::random(rng);
        let id = self.next_id;
        match DynamicConnection::from_path(id, &path, timing, params.geometry, params.palette, scene) {
            Some(connection) => {
                self.next_id += 1;
                log::debug!(
                    "[globe] spawned connection {} with {} hops, life {:.2}s",
                    id,
                    connection.hops.len(),
                    timing.envelope.max_life
                );
                self.connections.push(connection);
                SpawnOutcome::Spawned(id)
            }
            None => SpawnOutcome::NoNeighbors,
        }
    }

    /// Advance every connection, dropping the ones that retired.
    pub fn tick(&mut self, dt: f32, scene: &mut SceneGraph) -> usize {
        let before = self.connections.len();
        self.connections.retain_mut(|c| c.tick(dt, scene));
        before - self.connections.len()
    }

    /// Retire the oldest connections until at most `capacity` remain.
    /// Returns how many were removed.
    pub fn shrink_to(&mut self, capacity: usize, scene: &mut SceneGraph) -> usize {
        let excess = self.connections.len().saturating_sub(capacity);
        for c in self.connections.drain(..excess) {
            scene.remove_all(c.handles());
        }
        excess
    }

    /// Remove every connection and its primitives.
    pub fn clear(&mut self, scene: &mut SceneGraph) {
        for c in self.connections.drain(..) {
            scene.remove_all(c.handles());
        }
    }
}
