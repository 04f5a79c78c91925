//! The camera adapter.
//!
//! Wraps an exclusive video source and turns single frames into encoded
//! JPEG stills. The source itself (hardware access, permission prompts) is
//! the host's business; this module only owns the start/capture/stop
//! lifecycle and the encoding.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use log::info;

use crate::config::CameraConfig;
use crate::error::CaptureError;

/// JPEG quality for captured stills (out of 100).
pub const JPEG_QUALITY: u8 = 80;

/// One uncompressed frame from the video source: tightly packed RGB8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes, row-major.
    pub pixels: Vec<u8>,
}

/// The external video source. Implementations wrap the actual platform
/// camera; tests use a canned frame.
pub trait VideoSource {
    /// Request exclusive access honoring the preferred constraints.
    /// Fails with [`CaptureError::DeviceUnavailable`] when access is denied
    /// or no device is present.
    fn open(&mut self, config: &CameraConfig) -> Result<(), CaptureError>;

    /// Grab one frame from the open source.
    fn read_frame(&mut self) -> Result<RawFrame, CaptureError>;

    /// Release the source. Called at most once per successful `open`.
    fn close(&mut self);
}

/// Start/capture/stop lifecycle over a [`VideoSource`].
pub struct CameraAdapter<S> {
    source: S,
    config: CameraConfig,
    active: bool,
}

impl<S: VideoSource> CameraAdapter<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, CameraConfig::default())
    }

    pub fn with_config(source: S, config: CameraConfig) -> Self {
        Self {
            source,
            config,
            active: false,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Whether the source is currently held open.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Open the video source. A no-op when already started; on failure the
    /// adapter stays inactive so the caller can re-try after the user fixes
    /// permissions.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.active {
            return Ok(());
        }

        self.source.open(&self.config)?;
        self.active = true;
        info!(
            "camera ready ({}x{} preferred)",
            self.config.ideal_width, self.config.ideal_height
        );
        Ok(())
    }

    /// Capture one still from the active source, encoded as JPEG.
    /// Does not touch the store; saving is the caller's job.
    pub fn capture_frame(&mut self) -> Result<Vec<u8>, CaptureError> {
        if !self.active {
            return Err(CaptureError::DeviceUnavailable(
                "camera is not started".into(),
            ));
        }

        let frame = self.source.read_frame()?;
        encode_jpeg(&frame)
    }

    /// Release the video source. Safe to call when already stopped.
    pub fn stop(&mut self) {
        if self.active {
            self.source.close();
            self.active = false;
        }
    }
}

fn encode_jpeg(frame: &RawFrame) -> Result<Vec<u8>, CaptureError> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    encoder
        .encode(
            &frame.pixels,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;
    Ok(jpeg)
}
