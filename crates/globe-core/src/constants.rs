use glam::Vec3;

// Shared geometry/animation constants used by the core engine and the web frontend.

// Globe layout
pub const GLOBE_RADIUS: f32 = 532.0; // sphere radius R
pub const ARC_LIFT: f32 = 10.0; // arcs float at R + lift
pub const GLOBE_TILT_X: f32 = 0.3; // fixed inclination of the rotating group (rad)
pub const NEIGHBOR_RADIUS: f32 = 250.0; // max hop length between point-field entries

// Connection lifespan (seconds)
pub const MAX_LIFE_BASE_SEC: f32 = 5.0;
pub const MAX_LIFE_JITTER_SEC: f32 = 3.0;
pub const FADE_IN_SEC: f32 = 0.3;
pub const FADE_OUT_SEC: f32 = 0.5;
pub const GROWTH_SEC: f32 = 0.6; // per hop
pub const MARKER_RAMP_SEC: f32 = 0.2;

// Opacity multipliers relative to the connection envelope
pub const LINE_OPACITY_SCALE: f32 = 0.8;
pub const PENDING_MARKER_OPACITY_SCALE: f32 = 0.5;

// Marker sizing
pub const START_MARKER_RADIUS: f32 = 1.5;
pub const END_MARKER_RADIUS: f32 = 2.0;

// Camera
pub const CAMERA_FOVY_DEG: f32 = 75.0;
pub const CAMERA_Z: f32 = 1000.0;
pub const CAMERA_ZNEAR: f32 = 0.1;
pub const CAMERA_ZFAR: f32 = 2000.0;

// Lighting
pub const AMBIENT_COLOR: [f32; 3] = [0.25, 0.25, 0.25]; // #404040
pub const AMBIENT_INTENSITY: f32 = 0.4;
pub const DIRECTIONAL_COLOR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DIRECTIONAL_INTENSITY: f32 = 0.6;
pub const DIRECTIONAL_POSITION: [f32; 3] = [-300.0, -300.0, 400.0];

// Device gating
pub const MOBILE_BREAKPOINT_PX: f64 = 768.0;
pub const MIN_MAX_TEXTURE_SIZE: u32 = 4096;
pub const MIN_DEVICE_MEMORY_GB: f64 = 4.0;
pub const MIN_HARDWARE_CONCURRENCY: u32 = 4;
// assumed when the browser does not report a hint
pub const DEFAULT_DEVICE_MEMORY_GB: f64 = 4.0;
pub const DEFAULT_HARDWARE_CONCURRENCY: u32 = 4;

// Viewport
pub const VIEWPORT_HEIGHT_FACTOR: f64 = 1.2; // square canvas side = innerHeight * factor
pub const MAX_PIXEL_RATIO: f64 = 2.0;

// Adaptive quality
pub const FPS_HISTORY_LEN: usize = 30;
pub const MIN_FPS_SAMPLES: usize = 10;
pub const LOW_FPS_THRESHOLD: f32 = 25.0;

// Reference rate used when rotation is scaled by frame time
pub const REFERENCE_FPS: f32 = 60.0;

#[inline]
pub fn directional_light_position() -> Vec3 {
    Vec3::from_array(DIRECTIONAL_POSITION)
}
