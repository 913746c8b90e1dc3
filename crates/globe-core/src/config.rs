//! Engine configuration.
//!
//! Every field has a default so a partial JSON object (or none at all) is a
//! valid configuration.

use crate::constants::{ARC_LIFT, GLOBE_RADIUS, NEIGHBOR_RADIUS};
use crate::error::SetupError;
use serde::{Deserialize, Deserializer};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Quality tier the engine runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QualityTier {
    Full,
    Constrained,
}

/// Per-tier quality table.
#[derive(Clone, Debug, PartialEq)]
pub struct TierSettings {
    pub point_count: usize,
    pub max_connections: usize,
    pub spawn_interval_sec: f32,
    pub min_hops: usize,
    pub max_hops: usize,
    pub arc_segments: usize,
    pub curve_samples: usize,
    pub sphere_segments: u32,
    pub sphere_rings: u32,
    pub wireframe_opacity: f32,
    pub rotation_step: f32, // rad per rendered frame
    pub antialias: bool,
    pub low_power: bool,
}

impl TierSettings {
    pub fn full() -> Self {
        Self {
            point_count: 120,
            max_connections: 10,
            spawn_interval_sec: 1.2,
            min_hops: 3,
            max_hops: 5,
            arc_segments: 20,
            curve_samples: 40,
            sphere_segments: 32,
            sphere_rings: 16,
            wireframe_opacity: 0.08,
            rotation_step: 0.0015,
            antialias: true,
            low_power: false,
        }
    }

    pub fn constrained() -> Self {
        Self {
            point_count: 60,
            max_connections: 3,
            spawn_interval_sec: 2.5,
            min_hops: 2,
            max_hops: 3,
            arc_segments: 10,
            curve_samples: 20,
            sphere_segments: 24,
            sphere_rings: 12,
            wireframe_opacity: 0.03,
            rotation_step: 0.001,
            antialias: false,
            low_power: true,
        }
    }

    #[inline]
    pub fn hop_range(&self) -> RangeInclusive<usize> {
        self.min_hops..=self.max_hops
    }

    fn validate(&self, name: &str) -> Result<(), SetupError> {
        let invalid = |reason: &str| {
            Err(SetupError::InvalidConfig(format!("{name}: {reason}")))
        };
        if self.point_count < 2 {
            return invalid("point_count must be at least 2");
        }
        if self.min_hops == 0 || self.min_hops > self.max_hops {
            return invalid("hop range must be non-empty and start at 1 or more");
        }
        if self.arc_segments == 0 || self.curve_samples == 0 {
            return invalid("arc_segments and curve_samples must be positive");
        }
        if !(self.spawn_interval_sec.is_finite() && self.spawn_interval_sec > 0.0) {
            return invalid("spawn_interval_sec must be positive");
        }
        Ok(())
    }
}

/// A tier table as written in JSON; missing fields fall back to the tier's own table.
#[derive(Default, Deserialize)]
#[serde(default)]
struct TierOverrides {
    point_count: Option<usize>,
    max_connections: Option<usize>,
    spawn_interval_sec: Option<f32>,
    min_hops: Option<usize>,
    max_hops: Option<usize>,
    arc_segments: Option<usize>,
    curve_samples: Option<usize>,
    sphere_segments: Option<u32>,
    sphere_rings: Option<u32>,
    wireframe_opacity: Option<f32>,
    rotation_step: Option<f32>,
    antialias: Option<bool>,
    low_power: Option<bool>,
}

impl TierOverrides {
    fn over(self, base: TierSettings) -> TierSettings {
        TierSettings {
            point_count: self.point_count.unwrap_or(base.point_count),
            max_connections: self.max_connections.unwrap_or(base.max_connections),
            spawn_interval_sec: self.spawn_interval_sec.unwrap_or(base.spawn_interval_sec),
            min_hops: self.min_hops.unwrap_or(base.min_hops),
            max_hops: self.max_hops.unwrap_or(base.max_hops),
            arc_segments: self.arc_segments.unwrap_or(base.arc_segments),
            curve_samples: self.curve_samples.unwrap_or(base.curve_samples),
            sphere_segments: self.sphere_segments.unwrap_or(base.sphere_segments),
            sphere_rings: self.sphere_rings.unwrap_or(base.sphere_rings),
            wireframe_opacity: self.wireframe_opacity.unwrap_or(base.wireframe_opacity),
            rotation_step: self.rotation_step.unwrap_or(base.rotation_step),
            antialias: self.antialias.unwrap_or(base.antialias),
            low_power: self.low_power.unwrap_or(base.low_power),
        }
    }
}

fn full_tier<'de, D: Deserializer<'de>>(d: D) -> Result<TierSettings, D::Error> {
    Ok(TierOverrides::deserialize(d)?.over(TierSettings::full()))
}

fn constrained_tier<'de, D: Deserializer<'de>>(d: D) -> Result<TierSettings, D::Error> {
    Ok(TierOverrides::deserialize(d)?.over(TierSettings::constrained()))
}

/// Linear RGB colours, components in 0..=1.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub wireframe: [f32; 3],
    pub arc: [f32; 3],
    pub marker: [f32; 3],
    pub end_marker: [f32; 3],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            wireframe: hex_rgb(0xf97316),
            arc: [1.0, 0.8, 0.2],
            marker: [1.0, 1.0, 0.3],
            end_marker: [1.0, 0.9, 0.4],
        }
    }
}

#[inline]
pub fn hex_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    pub enabled: bool,
    pub radius: f32,
    pub arc_lift: f32,
    pub neighbor_radius: f32,
    #[serde(default = "TierSettings::full", deserialize_with = "full_tier")]
    pub full: TierSettings,
    #[serde(default = "TierSettings::constrained", deserialize_with = "constrained_tier")]
    pub constrained: TierSettings,
    pub palette: Palette,
    pub adaptive_quality: bool,
    pub allow_constrained: bool,
    pub frame_rate_independent_rotation: bool,
    pub seed: Option<u64>,
    pub load_timeout_ms: u64,
    pub resize_debounce_ms: u32,
    pub log_level: String,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: GLOBE_RADIUS,
            arc_lift: ARC_LIFT,
            neighbor_radius: NEIGHBOR_RADIUS,
            full: TierSettings::full(),
            constrained: TierSettings::constrained(),
            palette: Palette::default(),
            adaptive_quality: true,
            allow_constrained: false,
            frame_rate_independent_rotation: false,
            seed: None,
            load_timeout_ms: 8000,
            resize_debounce_ms: 250,
            log_level: "info".to_string(),
        }
    }
}

impl GlobeConfig {
    pub fn tier(&self, tier: QualityTier) -> &TierSettings {
        match tier {
            QualityTier::Full => &self.full,
            QualityTier::Constrained => &self.constrained,
        }
    }

    /// Radius R′ arcs are drawn at.
    #[inline]
    pub fn arc_radius(&self) -> f32 {
        self.radius + self.arc_lift
    }

    #[inline]
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Parsed `log_level`, falling back to `Info` on unknown names.
    pub fn log_level(&self) -> log::Level {
        self.log_level.parse().unwrap_or(log::Level::Info)
    }

    pub fn validate(&self) -> Result<(), SetupError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SetupError::InvalidConfig(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !(self.neighbor_radius.is_finite() && self.neighbor_radius > 0.0) {
            return Err(SetupError::InvalidConfig(format!(
                "neighbor_radius must be positive, got {}",
                self.neighbor_radius
            )));
        }
        self.full.validate("full")?;
        self.constrained.validate("constrained")
    }
}
