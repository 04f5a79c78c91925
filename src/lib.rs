//! Capture photos together with where they were taken, stored locally.
//!
//! The heart of the crate is [`store::photos::PhotoStore`], a repository
//! over an embedded SQLite database holding one immutable record per
//! captured photo. Around it sit two narrow device adapters (camera and
//! position, both over host-implemented traits), an opportunistic static
//! asset cache, and [`app::App`], the context object that wires a capture
//! event through to a saved, listable record.
//!
//! Everything profile-local, nothing networked: the only outbound artifact
//! is the map link each saved fix can render.

pub mod adapters;
pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod store;

pub use adapters::camera::{CameraAdapter, RawFrame, VideoSource};
pub use adapters::position::{PositionAdapter, PositionSource};
pub use app::App;
pub use cache::{AssetCache, AssetFetcher};
pub use config::{CameraConfig, CameraFacing, LocationConfig};
pub use error::{AppError, CacheError, CaptureError, LocationError, StoreError};
pub use store::photos::{Coordinates, NewPhoto, PhotoRecord, PhotoStore};
