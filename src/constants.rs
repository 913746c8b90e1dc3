/// Browser-side names and tuning for the globe binding.
///
/// Pure values only; the host tests include this file directly.
// DOM
pub const CONTAINER_ID: &str = "globe-container";
pub const CONFIG_ATTRIBUTE: &str = "data-globe-config";
pub const CANVAS_CLASS: &str = "globe-canvas";

// Environment probes
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";
pub const GL_MAX_TEXTURE_SIZE: u32 = 0x0D33;

// Lazy mount: start slightly before the container scrolls into view
pub const LAZY_ROOT_MARGIN: &str = "200px";

// Marker tessellation (latitude bands x longitude slices)
pub const MARKER_RINGS: u32 = 6;
pub const MARKER_SLICES: u32 = 8;

// Render targets
pub const MSAA_SAMPLES: u32 = 4;
pub const CLEAR_RGBA: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

// Initial vertex buffer capacity, in vertices; buffers grow on demand
pub const LINE_VERTEX_CAPACITY: usize = 8 * 1024;
pub const TRIANGLE_VERTEX_CAPACITY: usize = 4 * 1024;
