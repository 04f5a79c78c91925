//! The photo repository over SQLite.
//!
//! One table, one secondary index, no joins. Records are immutable once
//! created; the only mutations are insert and delete-by-id. Every operation
//! runs in its own short-lived transaction on the blocking pool, and the
//! single connection is shared behind a mutex so the store stays safe if the
//! host ever calls it from more than one task.

use chrono::{Local, LocalResult, TimeZone};
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task;

use crate::error::StoreError;

/// A single geolocation reading. Either all four fields are known or the
/// photo has no coordinates at all; partial fixes do not exist.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty around the fix, in meters.
    pub accuracy_m: f64,
    /// When the fix itself was taken, epoch milliseconds.
    pub captured_at_ms: i64,
}

impl Coordinates {
    /// Outbound link that opens the fix in the map provider.
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }
}

/// Input to [`PhotoStore::create`]. The store assigns the id; callers never
/// supply one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    /// Encoded JPEG bytes.
    pub image: Vec<u8>,
    /// Best-effort fix; `None` when location was unavailable or denied.
    pub coordinates: Option<Coordinates>,
    /// Creation time, epoch milliseconds.
    pub captured_at_ms: i64,
}

/// A stored photo. Immutable after creation except for deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Store-assigned id, unique and never reused within a store's lifetime.
    pub id: i64,
    pub image: Vec<u8>,
    pub coordinates: Option<Coordinates>,
    pub captured_at_ms: i64,
}

impl PhotoRecord {
    /// Human-readable rendering of the capture time, recomputed on demand
    /// rather than stored.
    pub fn display_timestamp(&self) -> String {
        match Local.timestamp_millis_opt(self.captured_at_ms) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }
            LocalResult::None => self.captured_at_ms.to_string(),
        }
    }
}

/// The photo repository. Open it once at startup and reuse the handle for
/// the process lifetime; there is no explicit teardown.
pub struct PhotoStore {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
}

impl PhotoStore {
    /// Open or create the database at `path` and establish the schema.
    ///
    /// Fails with [`StoreError::Unavailable`] when the directory cannot be
    /// created or the database cannot be opened; that is fatal to startup
    /// and no handle is returned.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = path.into();
        task::spawn_blocking(move || Self::open_blocking(db_path))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    /// Open the database at the platform default location:
    /// - Linux: ~/.local/share/whereismy/whereismy.db
    /// - macOS: ~/Library/Application Support/whereismy/whereismy.db
    /// - Windows: %APPDATA%\whereismy\whereismy.db
    pub async fn open_default() -> Result<Self, StoreError> {
        Self::open(Self::default_db_path()?).await
    }

    /// Back the same API with an in-memory database. Nothing survives the
    /// handle; intended for tests and previews.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: None,
        })
    }

    fn open_blocking(db_path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Unavailable(format!(
                        "could not create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(&db_path)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::init_schema(&conn)?;

        info!("database initialized at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: Some(db_path),
        })
    }

    fn default_db_path() -> Result<PathBuf, StoreError> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                StoreError::Unavailable("could not determine user data directory".into())
            })?;

        path.push("whereismy");
        path.push("whereismy.db");
        Ok(path)
    }

    /// Create the table and index if they don't exist.
    ///
    /// AUTOINCREMENT keeps ids monotonic across deletes, so an id is never
    /// reused within a store's lifetime.
    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS photos (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                image           BLOB NOT NULL,
                coordinates     TEXT,
                captured_at     INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photos_captured_at
             ON photos(captured_at DESC)",
            [],
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    /// Path to the database file, `None` for an in-memory store.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Insert a new photo and return the store-assigned id.
    ///
    /// The write is all-or-nothing: on [`StoreError::WriteFailed`] the store
    /// is unchanged.
    pub async fn create(&self, photo: NewPhoto) -> Result<i64, StoreError> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let coordinates = photo
                .coordinates
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

            let conn = lock(&conn);
            conn.execute(
                "INSERT INTO photos (image, coordinates, captured_at) VALUES (?1, ?2, ?3)",
                params![photo.image, coordinates, photo.captured_at_ms],
            )
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?
    }

    /// All photos, newest first (descending capture time, descending id as
    /// the tiebreaker). An empty store yields an empty vec, not an error.
    pub async fn list(&self) -> Result<Vec<PhotoRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = lock(&conn);
            let mut stmt = conn
                .prepare(
                    "SELECT id, image, coordinates, captured_at FROM photos
                     ORDER BY captured_at DESC, id DESC",
                )
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

            let row_iter = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                })
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

            let mut photos = Vec::new();
            for row in row_iter {
                let (id, image, coordinates, captured_at_ms) =
                    row.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                let coordinates = coordinates
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                photos.push(PhotoRecord {
                    id,
                    image,
                    coordinates,
                    captured_at_ms,
                });
            }

            Ok(photos)
        })
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?
    }

    /// Delete the photo with the given id. Deleting an id that does not
    /// exist is a no-op success, so calling this twice is fine.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = lock(&conn);
            conn.execute("DELETE FROM photos WHERE id = ?1", params![id])
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?
    }

    /// Number of stored photos.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = lock(&conn);
            conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))
                .map_err(|e| StoreError::ReadFailed(e.to_string()))
        })
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?
    }

    /// Fetch a single photo by id, `None` when it does not exist.
    pub async fn get(&self, id: i64) -> Result<Option<PhotoRecord>, StoreError> {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = lock(&conn);
            let row = conn
                .query_row(
                    "SELECT id, image, coordinates, captured_at FROM photos WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, Vec<u8>>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

            row.map(|(id, image, coordinates, captured_at_ms)| {
                let coordinates = coordinates
                    .as_deref()
                    .map(serde_json::from_str)
                    .transpose()
                    .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
                Ok(PhotoRecord {
                    id,
                    image,
                    coordinates,
                    captured_at_ms,
                })
            })
            .transpose()
        })
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?
    }
}

impl std::fmt::Debug for PhotoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// A poisoned mutex only means another task panicked mid-operation; the
/// connection itself is still usable.
fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    match conn.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
