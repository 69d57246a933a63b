//! Common types and traits shared across `GeoBuild` crates.
//!
//! This crate provides the abstractions shared between `geobuild-core` and
//! its collaborators (table sources, object stores), preventing circular
//! dependencies.

pub mod io;
pub mod schemas;

// Re-export commonly used types
pub use io::{
    CreatedObject, DownloadedObject, ObjectMetadata, ObjectRef, ObjectStore, TableSource,
};
pub use schemas::{ObjectSchema, SupportStatus};
