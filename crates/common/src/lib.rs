//! Common utilities and shared types for ripple.
//!
//! This crate provides foundational components used across all ripple crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error taxonomy via [`AppError`] and [`AppResult`]
//! - **Geo**: Coordinate parsing and haversine distance via [`GeoPoint`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Blob storage for evidence photos
//!
//! # Example
//!
//! ```no_run
//! use ripple_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("{} -> {}", config.server.url, id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod id;
pub mod storage;

pub use config::{
    AuthConfig, ClassifierConfig, Config, DatabaseConfig, RoleLookupFailurePolicy, ServerConfig,
    StorageSettings,
};
pub use error::{AppError, AppResult};
pub use geo::{GeoPoint, haversine_km, parse_coords};
pub use id::IdGenerator;
pub use storage::{
    LocalStorage, StorageBackend, UploadedFile, evidence_key, sanitize_file_name,
};
