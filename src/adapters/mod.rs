//! Device adapters.
//!
//! The platform camera and geolocation calls live behind narrow traits the
//! host implements:
//! - Frame acquisition and JPEG encoding (camera.rs)
//! - One-shot position fixes with timeout and reuse (position.rs)

pub mod camera;
pub mod position;
