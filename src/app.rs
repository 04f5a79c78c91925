//! The application context.
//!
//! One explicit object constructed at startup and handed to the event
//! handlers; it owns the opened store, both adapters, and a transient
//! status line. Thin glue: capture a frame, look up the position
//! best-effort, save, re-read the list.

use chrono::Utc;
use log::{info, warn};

use crate::adapters::camera::{CameraAdapter, VideoSource};
use crate::adapters::position::{PositionAdapter, PositionSource};
use crate::error::AppError;
use crate::store::photos::{NewPhoto, PhotoRecord, PhotoStore};

/// Main application state.
pub struct App<S, P> {
    /// The photo store, opened once for the process lifetime.
    store: PhotoStore,
    camera: CameraAdapter<S>,
    position: PositionAdapter<P>,
    /// Status message to display to the user.
    status: String,
}

impl<S: VideoSource, P: PositionSource> App<S, P> {
    /// Assemble the context around an already-opened store. A store that
    /// failed to open never gets here; that failure is fatal to startup.
    pub async fn new(
        store: PhotoStore,
        camera: CameraAdapter<S>,
        position: PositionAdapter<P>,
    ) -> Self {
        let count = store.count().await.unwrap_or(0);
        info!("initialized with {} saved photos", count);

        let status = format!("Ready. {} photos saved.", count);
        App {
            store,
            camera,
            position,
            status,
        }
    }

    /// Current status line.
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn store(&self) -> &PhotoStore {
        &self.store
    }

    /// Open the camera. On failure the capture control stays disabled and
    /// the status carries permission guidance; the user re-taps to retry.
    pub fn start_camera(&mut self) -> Result<(), AppError> {
        match self.camera.start() {
            Ok(()) => {
                self.set_status("Camera ready. Tap capture to take photo.");
                Ok(())
            }
            Err(e) => {
                warn!("camera error: {}", e);
                self.set_status("Camera access denied. Please enable camera permissions.");
                Err(e.into())
            }
        }
    }

    /// Release the camera. Safe when already stopped.
    pub fn stop_camera(&mut self) {
        self.camera.stop();
    }

    /// Capture a photo, attach the current position when one can be had,
    /// save it, and return the refreshed list.
    ///
    /// Location failure degrades to a record without coordinates. Capture
    /// and storage failures leave the store untouched and surface as a
    /// transient status message; nothing retries automatically.
    pub async fn capture_photo(&mut self) -> Result<Vec<PhotoRecord>, AppError> {
        self.set_status("Capturing photo...");

        let image = match self.camera.capture_frame() {
            Ok(image) => image,
            Err(e) => {
                self.set_status("Error capturing photo. Please try again.");
                return Err(e.into());
            }
        };

        let coordinates = match self.position.current_position().await {
            Ok(fix) => Some(fix),
            Err(e) => {
                warn!("could not get location: {}", e);
                None
            }
        };

        let photo = NewPhoto {
            image,
            coordinates,
            captured_at_ms: Utc::now().timestamp_millis(),
        };

        if let Err(e) = self.store.create(photo).await {
            self.set_status("Error saving photo. Please try again.");
            return Err(e.into());
        }

        self.set_status("Photo captured!");
        self.refresh().await
    }

    /// Delete a photo and return the refreshed list. Confirmation prompts
    /// are the UI's business, not the store's.
    pub async fn delete_photo(&mut self, id: i64) -> Result<Vec<PhotoRecord>, AppError> {
        if let Err(e) = self.store.delete(id).await {
            self.set_status("Error deleting photo");
            return Err(e.into());
        }

        self.set_status("Photo deleted");
        self.refresh().await
    }

    /// Re-read the list for display, newest first.
    pub async fn refresh(&self) -> Result<Vec<PhotoRecord>, AppError> {
        Ok(self.store.list().await?)
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::camera::RawFrame;
    use crate::config::{CameraConfig, LocationConfig};
    use crate::error::{CaptureError, LocationError};
    use crate::store::photos::Coordinates;
    use std::time::Duration;

    struct TestCamera;

    impl VideoSource for TestCamera {
        fn open(&mut self, _config: &CameraConfig) -> Result<(), CaptureError> {
            Ok(())
        }

        fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
            Ok(RawFrame {
                width: 8,
                height: 8,
                pixels: vec![0x80; 8 * 8 * 3],
            })
        }

        fn close(&mut self) {}
    }

    enum TestPosition {
        Fix(Coordinates),
        Slow(u64),
    }

    impl PositionSource for TestPosition {
        fn is_supported(&self) -> bool {
            true
        }

        fn is_secure_context(&self) -> bool {
            true
        }

        async fn current_position(
            &self,
            _config: &LocationConfig,
        ) -> Result<Coordinates, LocationError> {
            match self {
                TestPosition::Fix(fix) => Ok(*fix),
                TestPosition::Slow(ms) => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                    Err(LocationError::Timeout)
                }
            }
        }
    }

    fn fix() -> Coordinates {
        Coordinates {
            latitude: 35.6586,
            longitude: 139.7454,
            accuracy_m: 20.0,
            captured_at_ms: 1_700_000_000_000,
        }
    }

    async fn app_with(position: TestPosition, timeout_ms: u64) -> App<TestCamera, TestPosition> {
        let store = PhotoStore::open_in_memory().unwrap();
        let camera = CameraAdapter::new(TestCamera);
        let position = PositionAdapter::with_config(
            position,
            LocationConfig {
                timeout_ms,
                ..LocationConfig::default()
            },
        );
        App::new(store, camera, position).await
    }

    #[tokio::test]
    async fn test_capture_saves_photo_with_fix() {
        let mut app = app_with(TestPosition::Fix(fix()), 15_000).await;
        app.start_camera().unwrap();

        let photos = app.capture_photo().await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].coordinates, Some(fix()));
        assert_eq!(app.status(), "Photo captured!");
    }

    #[tokio::test]
    async fn test_location_timeout_degrades_to_no_coordinates() {
        let mut app = app_with(TestPosition::Slow(100), 10).await;
        app.start_camera().unwrap();

        let photos = app.capture_photo().await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].coordinates, None);

        // And the degraded record is retrievable like any other.
        let listed = app.refresh().await.unwrap();
        assert_eq!(listed[0].id, photos[0].id);
    }

    #[tokio::test]
    async fn test_capture_without_camera_leaves_store_untouched() {
        let mut app = app_with(TestPosition::Fix(fix()), 15_000).await;

        let result = app.capture_photo().await;
        assert!(matches!(result, Err(AppError::Capture(_))));
        assert_eq!(app.status(), "Error capturing photo. Please try again.");
        assert!(app.refresh().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refreshes_list() {
        let mut app = app_with(TestPosition::Fix(fix()), 15_000).await;
        app.start_camera().unwrap();

        let photos = app.capture_photo().await.unwrap();
        let remaining = app.delete_photo(photos[0].id).await.unwrap();

        assert!(remaining.is_empty());
        assert_eq!(app.status(), "Photo deleted");
    }

    #[tokio::test]
    async fn test_deleting_twice_is_still_a_success() {
        let mut app = app_with(TestPosition::Fix(fix()), 15_000).await;
        app.start_camera().unwrap();

        let photos = app.capture_photo().await.unwrap();
        app.delete_photo(photos[0].id).await.unwrap();
        app.delete_photo(photos[0].id).await.unwrap();
    }
}
