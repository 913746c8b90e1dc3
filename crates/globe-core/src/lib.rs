pub mod config;
pub mod connection;
pub mod constants;
pub mod device;
pub mod driver;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod points;
pub mod quality;
pub mod scene;
pub mod state;

pub use config::*;
pub use connection::*;
pub use constants::*;
pub use device::*;
pub use driver::*;
pub use engine::*;
pub use error::*;
pub use geometry::*;
pub use points::*;
pub use quality::*;
pub use scene::*;
pub use state::*;
