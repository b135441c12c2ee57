//! Transient artifact subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline
//!     → store.allocate()   (unique path, nothing on disk yet)
//!     → qr encoder writes the PNG
//!     → mail dispatcher reads it as an inline attachment
//!     → store.remove()     (always, success or failure)
//! ```

pub mod store;

pub use store::{ArtifactStore, QrArtifact};
