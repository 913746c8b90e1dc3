//! Device capability gating and viewport sizing.

use crate::config::{GlobeConfig, QualityTier};
use crate::constants::{
    DEFAULT_DEVICE_MEMORY_GB, DEFAULT_HARDWARE_CONCURRENCY, MAX_PIXEL_RATIO,
    MIN_DEVICE_MEMORY_GB, MIN_HARDWARE_CONCURRENCY, MIN_MAX_TEXTURE_SIZE, MOBILE_BREAKPOINT_PX,
    VIEWPORT_HEIGHT_FACTOR,
};
use std::fmt;

/// Result of probing for a WebGL-capable context.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GraphicsProbe {
    Unavailable,
    Available { max_texture_size: u32 },
}

/// Read-only environment hints sampled from the host.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentSignals {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub device_pixel_ratio: f64,
    pub prefers_reduced_motion: bool,
    /// `navigator.deviceMemory`, if the browser reports it.
    pub device_memory_gb: Option<f64>,
    /// `navigator.hardwareConcurrency`, if the browser reports it.
    pub hardware_concurrency: Option<u32>,
    pub graphics: GraphicsProbe,
}

impl Default for EnvironmentSignals {
    /// A capable desktop: 1440x900, DPR 1, 8 GB, 8 cores, 8k textures.
    fn default() -> Self {
        Self {
            viewport_width: 1440.0,
            viewport_height: 900.0,
            device_pixel_ratio: 1.0,
            prefers_reduced_motion: false,
            device_memory_gb: Some(8.0),
            hardware_concurrency: Some(8),
            graphics: GraphicsProbe::Available {
                max_texture_size: 8192,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LowEndReason {
    NoWebGl,
    SmallTextures(u32),
    LowMemory(f64),
    FewCores(u32),
}

/// Why the engine refused to start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateReason {
    Disabled,
    NarrowViewport(f64),
    ReducedMotion,
    LowEndDevice(LowEndReason),
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateReason::Disabled => write!(f, "disabled by configuration"),
            GateReason::NarrowViewport(w) => write!(f, "viewport {w}px narrower than {MOBILE_BREAKPOINT_PX}px"),
            GateReason::ReducedMotion => write!(f, "prefers-reduced-motion is set"),
            GateReason::LowEndDevice(LowEndReason::NoWebGl) => write!(f, "WebGL unavailable"),
            GateReason::LowEndDevice(LowEndReason::SmallTextures(n)) => {
                write!(f, "max texture size {n} below {MIN_MAX_TEXTURE_SIZE}")
            }
            GateReason::LowEndDevice(LowEndReason::LowMemory(gb)) => {
                write!(f, "device memory {gb}GB below {MIN_DEVICE_MEMORY_GB}GB")
            }
            GateReason::LowEndDevice(LowEndReason::FewCores(n)) => {
                write!(f, "{n} CPU cores below {MIN_HARDWARE_CONCURRENCY}")
            }
        }
    }
}

#[inline]
pub fn is_mobile_width(width: f64) -> bool {
    width < MOBILE_BREAKPOINT_PX
}

/// First low-end indicator, if any. Missing memory/core hints count as 4.
pub fn low_end_reason(signals: &EnvironmentSignals) -> Option<LowEndReason> {
    let max_texture_size = match signals.graphics {
        GraphicsProbe::Unavailable => return Some(LowEndReason::NoWebGl),
        GraphicsProbe::Available { max_texture_size } => max_texture_size,
    };
    let memory = signals.device_memory_gb.unwrap_or(DEFAULT_DEVICE_MEMORY_GB);
    let cores = signals
        .hardware_concurrency
        .unwrap_or(DEFAULT_HARDWARE_CONCURRENCY);
    if max_texture_size < MIN_MAX_TEXTURE_SIZE {
        Some(LowEndReason::SmallTextures(max_texture_size))
    } else if memory < MIN_DEVICE_MEMORY_GB {
        Some(LowEndReason::LowMemory(memory))
    } else if cores < MIN_HARDWARE_CONCURRENCY {
        Some(LowEndReason::FewCores(cores))
    } else {
        None
    }
}

/// Device-level constraint that does not change with the viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeviceProfile {
    pub constrained: Option<GateReason>,
}

impl DeviceProfile {
    pub fn from_signals(signals: &EnvironmentSignals) -> Self {
        let constrained = if signals.prefers_reduced_motion {
            Some(GateReason::ReducedMotion)
        } else {
            low_end_reason(signals).map(GateReason::LowEndDevice)
        };
        Self { constrained }
    }

    /// Live tier for a viewport of `width` CSS pixels.
    pub fn tier_for_width(&self, width: f64) -> QualityTier {
        if self.constrained.is_some() || is_mobile_width(width) {
            QualityTier::Constrained
        } else {
            QualityTier::Full
        }
    }
}

/// Evaluate the start-up gate once. `Ok` carries the tier to run in.
pub fn gate(config: &GlobeConfig, signals: &EnvironmentSignals) -> Result<QualityTier, GateReason> {
    if !config.enabled {
        return Err(GateReason::Disabled);
    }
    // never rendered, even when constrained devices are allowed
    if signals.prefers_reduced_motion {
        return Err(GateReason::ReducedMotion);
    }
    if signals.graphics == GraphicsProbe::Unavailable {
        return Err(GateReason::LowEndDevice(LowEndReason::NoWebGl));
    }
    let reason = if is_mobile_width(signals.viewport_width) {
        Some(GateReason::NarrowViewport(signals.viewport_width))
    } else {
        DeviceProfile::from_signals(signals).constrained
    };
    match reason {
        None => Ok(QualityTier::Full),
        Some(_) if config.allow_constrained => Ok(QualityTier::Constrained),
        Some(reason) => Err(reason),
    }
}

/// Square render viewport in CSS pixels plus the backing-store pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub size_css: f64,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn for_tier(signals: &EnvironmentSignals, tier: QualityTier) -> Self {
        let pixel_ratio = match tier {
            QualityTier::Constrained => 1.0,
            QualityTier::Full => signals.device_pixel_ratio.min(MAX_PIXEL_RATIO),
        };
        Self {
            size_css: signals.viewport_height * VIEWPORT_HEIGHT_FACTOR,
            pixel_ratio,
        }
    }

    /// Backing-store side length in physical pixels.
    #[inline]
    pub fn size_px(&self) -> u32 {
        ((self.size_css * self.pixel_ratio).round() as u32).max(1)
    }
}
