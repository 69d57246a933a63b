//! `geobuild-core` is the core library for the `GeoBuild` project, turning tabular
//! geoscience data into typed, schema-conformant geoscience objects.
//!
//! This crate includes:
//! - **Schema Registry**: The object types that can be built and the schema each one targets.
//! - **Builders**: Pointsets, line segments, downhole collections and downhole intervals,
//!   each reporting row-level problems as validation messages.
//! - **Geometry**: Segment resolution, drillhole desurvey and interval positioning.
//! - **Projection**: Built objects rendered as schema-conformant JSON payloads.
//! - **Operations**: Build, preview and fetch entry points consumed by the CLI.

pub mod builders;
pub mod error;
pub mod geometry;
pub mod mapping;
pub mod messages;
pub mod operations;
pub mod projection;
pub mod schemas;
pub mod sources;
pub mod store;
pub mod types;

pub use error::{GeoBuildError, MissingColumnError, Result};
pub use geobuild_core_common::{ObjectRef, ObjectStore, TableSource};
pub use messages::{Locator, Severity, ValidationLog, ValidationMessage};
pub use schemas::ObjectType;
