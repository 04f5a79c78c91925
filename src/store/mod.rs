//! Local persistence.
//!
//! This module owns the embedded SQLite database holding every captured
//! photo:
//! - Repository and schema (photos.rs)
//! - The `PhotoRecord` / `Coordinates` data model (photos.rs)

pub mod photos;
