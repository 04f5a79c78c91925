//! The position adapter.
//!
//! One-shot geolocation with a hard timeout and short-lived reuse of the
//! previous fix. Every failure here is non-fatal: the caller saves the
//! photo with no coordinates and moves on.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::info;
use tokio::time::timeout;

use crate::config::LocationConfig;
use crate::error::LocationError;
use crate::store::photos::Coordinates;

/// The external geolocation capability. Implementations wrap the platform
/// positioning service; tests use canned fixes.
#[allow(async_fn_in_trait)]
pub trait PositionSource {
    /// Whether the platform has any geolocation capability at all.
    fn is_supported(&self) -> bool;

    /// Whether we are running on a secure origin (HTTPS or loopback), which
    /// the platform requires before it will hand out positions.
    fn is_secure_context(&self) -> bool;

    /// Acquire one fix. The adapter enforces the timeout; implementations
    /// only need to report `Denied` when the user or platform refuses.
    async fn current_position(&self, config: &LocationConfig)
        -> Result<Coordinates, LocationError>;
}

struct CachedFix {
    fix: Coordinates,
    taken_at: Instant,
}

/// One-shot fix acquisition over a [`PositionSource`].
pub struct PositionAdapter<P> {
    source: P,
    config: LocationConfig,
    cached: Mutex<Option<CachedFix>>,
}

impl<P: PositionSource> PositionAdapter<P> {
    pub fn new(source: P) -> Self {
        Self::with_config(source, LocationConfig::default())
    }

    pub fn with_config(source: P, config: LocationConfig) -> Self {
        Self {
            source,
            config,
            cached: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// Return one coordinate fix.
    ///
    /// A fix younger than `max_cached_age_ms` is reused without consulting
    /// the source. A source that takes longer than `timeout_ms` fails with
    /// [`LocationError::Timeout`]; there is no cancellation beyond that.
    pub async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if !self.source.is_supported() {
            return Err(LocationError::Unsupported);
        }
        if !self.source.is_secure_context() {
            return Err(LocationError::InsecureContext);
        }

        if let Some(fix) = self.fresh_cached_fix() {
            info!("reusing cached position fix");
            return Ok(fix);
        }

        let deadline = Duration::from_millis(self.config.timeout_ms);
        let fix = match timeout(deadline, self.source.current_position(&self.config)).await {
            Ok(result) => result?,
            Err(_) => return Err(LocationError::Timeout),
        };

        self.remember(fix);
        Ok(fix)
    }

    fn fresh_cached_fix(&self) -> Option<Coordinates> {
        let max_age = Duration::from_millis(self.config.max_cached_age_ms);
        let cached = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        cached
            .as_ref()
            .filter(|c| c.taken_at.elapsed() < max_age)
            .map(|c| c.fix)
    }

    fn remember(&self, fix: Coordinates) {
        let mut cached = self
            .cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *cached = Some(CachedFix {
            fix,
            taken_at: Instant::now(),
        });
    }
}
