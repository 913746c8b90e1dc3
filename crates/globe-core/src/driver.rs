//! Scene/render driver: builds the globe scene and advances it once per frame.
//!
//! Within a step the order is fixed: group rotation, connection ticking,
//! spawn-timer check. The draw call is issued by the caller right after, so a
//! connection spawned in a step is drawn in that same frame with zero growth.

use crate::config::{GlobeConfig, Palette, QualityTier, TierSettings};
use crate::connection::{ConnectionSet, SpawnOutcome, SpawnParams};
use crate::constants::{
    directional_light_position, AMBIENT_COLOR, AMBIENT_INTENSITY, DIRECTIONAL_COLOR,
    DIRECTIONAL_INTENSITY, GLOBE_TILT_X, REFERENCE_FPS,
};
use crate::error::SetupError;
use crate::geometry::HopGeometry;
use crate::points::PointField;
use crate::scene::{Layer, Light, Primitive, PrimitiveId, SceneGraph};
use crate::state::Camera;
use glam::Mat4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct GlobeScene {
    graph: SceneGraph,
    camera: Camera,
    field: PointField,
    connections: ConnectionSet,
    settings: TierSettings,
    palette: Palette,
    arc_radius: f32,
    neighbor_radius: f32,
    frame_independent_rotation: bool,
    tilt_x: f32,
    rotation_y: f32,
    spawn_timer: f32,
    wireframe: PrimitiveId,
    rng: StdRng,
}

impl GlobeScene {
    /// Build camera, tilted globe group, wireframe sphere, point field and lights.
    pub fn setup(config: &GlobeConfig, tier: QualityTier) -> Result<Self, SetupError> {
        config.validate()?;
        let settings = config.tier(tier).clone();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let field = PointField::generate(settings.point_count, config.radius);
        if field.len() < 2 {
            return Err(SetupError::DegeneratePointField(field.len()));
        }

        let mut graph = SceneGraph::new();
        let wireframe = graph.add_to_globe(Primitive::Wireframe {
            radius: config.radius,
            segments: settings.sphere_segments,
            rings: settings.sphere_rings,
            color: config.palette.wireframe,
            opacity: settings.wireframe_opacity,
        });
        graph.add(
            Layer::Root,
            Primitive::Light(Light::Ambient {
                color: AMBIENT_COLOR,
                intensity: AMBIENT_INTENSITY,
            }),
        );
        graph.add(
            Layer::Root,
            Primitive::Light(Light::Directional {
                color: DIRECTIONAL_COLOR,
                intensity: DIRECTIONAL_INTENSITY,
                position: directional_light_position(),
            }),
        );

        log::info!(
            "[globe] scene ready: {:?} tier, {} points, cap {} connections",
            tier,
            field.len(),
            settings.max_connections
        );

        Ok(Self {
            graph,
            camera: Camera::globe_default(),
            field,
            connections: ConnectionSet::new(),
            settings,
            palette: config.palette.clone(),
            arc_radius: config.arc_radius(),
            neighbor_radius: config.neighbor_radius,
            frame_independent_rotation: config.frame_rate_independent_rotation,
            tilt_x: GLOBE_TILT_X,
            rotation_y: 0.0,
            spawn_timer: 0.0,
            wireframe,
            rng,
        })
    }

    /// Advance one rendered frame of `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Option<SpawnOutcome> {
        self.rotation_y += if self.frame_independent_rotation {
            self.settings.rotation_step * dt * REFERENCE_FPS
        } else {
            self.settings.rotation_step
        };

        self.connections.tick(dt, &mut self.graph);

        self.spawn_timer += dt;
        if self.spawn_timer >= self.settings.spawn_interval_sec
            && self.connections.len() < self.settings.max_connections
        {
            self.spawn_timer = 0.0;
            return Some(self.spawn());
        }
        None
    }

    /// Attempt one spawn right away, ignoring the timer.
    pub fn spawn(&mut self) -> SpawnOutcome {
        let max_hops = self.rng.gen_range(self.settings.hop_range());
        let params = SpawnParams {
            capacity: self.settings.max_connections,
            max_hops,
            max_distance: self.neighbor_radius,
            geometry: self.hop_geometry(),
            palette: &self.palette,
        };
        self.connections
            .try_spawn(&self.field, &params, &mut self.graph, &mut self.rng)
    }

    /// Switch the live quality settings that can change without rebuilding the scene.
    pub fn apply_tier(&mut self, settings: &TierSettings) {
        self.settings.rotation_step = settings.rotation_step;
        self.settings.spawn_interval_sec = settings.spawn_interval_sec;
        self.settings.max_connections = settings.max_connections;
        self.settings.min_hops = settings.min_hops;
        self.settings.max_hops = settings.max_hops;
        let dropped = self
            .connections
            .shrink_to(settings.max_connections, &mut self.graph);
        if dropped > 0 {
            log::debug!("[globe] retired {} connections over the new cap", dropped);
        }
    }

    fn hop_geometry(&self) -> HopGeometry {
        HopGeometry {
            arc_segments: self.settings.arc_segments,
            curve_samples: self.settings.curve_samples,
            arc_radius: self.arc_radius,
        }
    }

    /// Model matrix of the globe group: fixed tilt about X, then spin about Y.
    pub fn group_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt_x) * Mat4::from_rotation_y(self.rotation_y)
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn field(&self) -> &PointField {
        &self.field
    }

    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    pub fn settings(&self) -> &TierSettings {
        &self.settings
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    pub fn wireframe(&self) -> PrimitiveId {
        self.wireframe
    }

    /// Drop every connection and primitive.
    pub fn dispose(&mut self) {
        self.connections.clear(&mut self.graph);
        self.graph.clear();
    }
}
