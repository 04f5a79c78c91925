//! Configuration for the camera and position adapters.
//!
//! The original dynamic option bags are pinned down as structs with named,
//! documented fields so the defaults are visible in one place.

use serde::{Deserialize, Serialize};

/// Which camera to prefer when more than one is available.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    /// Front-facing (selfie) camera.
    User,
    /// Rear-facing camera, pointed at the scene.
    Environment,
}

/// Constraints requested when opening the video source.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConfig {
    /// Preferred frame width in pixels. The source may deliver less.
    pub ideal_width: u32,

    /// Preferred frame height in pixels. The source may deliver less.
    pub ideal_height: u32,

    /// Preferred camera direction.
    pub facing: CameraFacing,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1280,
            ideal_height: 720,
            facing: CameraFacing::Environment,
        }
    }
}

/// Options for a one-shot position fix.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationConfig {
    /// Ask the platform for its most accurate positioning method.
    pub high_accuracy: bool,

    /// How long to wait for a fix before giving up, in milliseconds.
    pub timeout_ms: u64,

    /// A previous fix no older than this is reused instead of asking the
    /// platform again, in milliseconds.
    pub max_cached_age_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 15_000,
            max_cached_age_ms: 60_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.ideal_width, 1280);
        assert_eq!(config.ideal_height, 720);
        assert_eq!(config.facing, CameraFacing::Environment);
    }

    #[test]
    fn test_location_defaults() {
        let config = LocationConfig::default();
        assert!(config.high_accuracy);
        assert_eq!(config.timeout_ms, 15_000);
        assert_eq!(config.max_cached_age_ms, 60_000);
    }

    #[test]
    fn test_serialization() {
        let mut config = LocationConfig::default();
        config.timeout_ms = 5_000;

        let json = serde_json::to_string(&config).unwrap();
        let restored: LocationConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, restored);
    }

    #[test]
    fn test_facing_renames_to_lowercase() {
        let json = serde_json::to_string(&CameraFacing::Environment).unwrap();
        assert_eq!(json, "\"environment\"");
    }
}
