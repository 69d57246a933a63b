//! Build, preview and fetch operations.
//!
//! These functions tie the pieces together: parse the request documents,
//! load tables through a [`TableSource`], run the builder for the object
//! type, project the result and, unless it is a dry run, hand the payload to
//! an [`ObjectStore`].

use std::collections::BTreeMap;

use geobuild_core_common::{DownloadedObject, ObjectRef, ObjectStore, TableSource};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tabular_csv::{ColumnType, Table};

use crate::builders::{
    Built, DownholeCollectionBuilder, DownholeIntervalsBuilder, LineSegmentsBuilder,
    PointsetBuilder, desurvey_holes,
};
use crate::error::{ConfigError, GeoBuildError, MappingError, Result, StoreError};
use crate::mapping::{ColumnMapping, IntervalGeometryColumns, SourceMap, check_pairing};
use crate::messages::{Severity, ValidationLog};
use crate::projection::{BuiltObject, project, project_built};
use crate::schemas::ObjectType;
use crate::types::{Crs, ObjectMeta};

/// Everything needed to build one object.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRequest {
    pub object_type: ObjectType,
    pub workspace_id: String,
    pub object_path: String,
    pub name: String,
    /// Source map document, e.g. `{"points": "samples.csv"}`
    pub sources: Value,
    /// Column mapping document, e.g. `{"x": "EAST", "y": "NORTH", "z": "RL"}`
    pub columns: Value,
    pub description: String,
    pub crs: Crs,
    /// Validate and project without calling the store
    pub dry_run: bool,
}

impl BuildRequest {
    #[must_use]
    pub fn new(
        object_type: ObjectType,
        workspace_id: impl Into<String>,
        object_path: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            object_type,
            workspace_id: workspace_id.into(),
            object_path: object_path.into(),
            name: name.into(),
            sources: Value::Null,
            columns: Value::Null,
            description: String::new(),
            crs: Crs::Unspecified,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_sources(mut self, sources: Value) -> Self {
        self.sources = sources;
        self
    }

    #[must_use]
    pub fn with_columns(mut self, columns: Value) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn meta(&self) -> ObjectMeta {
        ObjectMeta::new(self.name.as_str())
            .with_description(self.description.as_str())
            .with_crs(self.crs.clone())
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("workspace", &self.workspace_id),
            ("object path", &self.object_path),
            ("name", &self.name),
        ];
        for (option, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingRequired {
                    option: option.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Outcome of [`build_object`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BuildResponse {
    /// Dry run: the projected payload, not stored
    Validated {
        object_name: String,
        schema_id: String,
        payload: Value,
        messages: ValidationLog,
    },
    /// The payload was stored
    Created {
        id: String,
        path: String,
        version_id: String,
        messages: ValidationLog,
    },
}

impl BuildResponse {
    #[must_use]
    pub fn messages(&self) -> &ValidationLog {
        match self {
            BuildResponse::Validated { messages, .. } | BuildResponse::Created { messages, .. } => {
                messages
            },
        }
    }
}

/// Parses the request documents, loads every table and runs the builder.
///
/// No store is involved; this is the synchronous core of [`build_object`].
///
/// # Errors
///
/// - [`GeoBuildError::Mapping`] / [`GeoBuildError::MissingColumn`] for bad
///   request documents or absent columns (raised before any table is read
///   where the documents alone show the problem)
/// - [`GeoBuildError::Source`] when a table cannot be loaded
pub fn build_local(request: &BuildRequest, tables: &dyn TableSource) -> Result<Built<BuiltObject>> {
    let columns = ColumnMapping::parse(request.object_type, &request.columns)?;
    let sources = SourceMap::parse(request.object_type, &request.sources)?;
    check_pairing(&sources, &columns)?;

    let meta = request.meta();
    let built: Built<BuiltObject> = match (&sources, &columns) {
        (SourceMap::Pointset { points }, ColumnMapping::Pointset(cols)) => {
            let points = load(tables, points)?;
            PointsetBuilder.build(meta, &points, cols)?.into()
        },
        (SourceMap::LineSegments { vertices, segments }, ColumnMapping::LineSegments(cols)) => {
            let vertices = load(tables, vertices)?;
            let segments = load(tables, segments)?;
            LineSegmentsBuilder.build(meta, &vertices, &segments, cols)?.into()
        },
        (
            SourceMap::DownholeCollection {
                collar,
                survey,
                intervals,
            },
            ColumnMapping::DownholeCollection(cols),
        ) => {
            let collar = load(tables, collar)?;
            let survey = load(tables, survey)?;
            let interval_tables = intervals
                .iter()
                .map(|(name, handle)| -> Result<(String, Table)> {
                    Ok((name.clone(), load(tables, handle)?))
                })
                .collect::<Result<BTreeMap<_, _>>>()?;
            DownholeCollectionBuilder
                .build(meta, &collar, &survey, &interval_tables, cols)?
                .into()
        },
        (
            SourceMap::DownholeIntervals {
                intervals,
                collar,
                survey,
            },
            ColumnMapping::DownholeIntervals(cols),
        ) => {
            let intervals = load(tables, intervals)?;
            match (&cols.geometry, collar, survey) {
                (
                    IntervalGeometryColumns::Desurveyed {
                        collar: collar_columns,
                        survey: survey_columns,
                        method,
                    },
                    Some(collar),
                    Some(survey),
                ) => {
                    let collar = load(tables, collar)?;
                    let survey = load(tables, survey)?;
                    let (holes, mut log) =
                        desurvey_holes(&collar, &survey, collar_columns, survey_columns, *method)?
                            .into_parts();
                    let (object, interval_log) = DownholeIntervalsBuilder
                        .build(meta, &intervals, cols, Some(&holes))?
                        .into_parts();
                    log.extend(interval_log);
                    Built::new(object, log).into()
                },
                _ => DownholeIntervalsBuilder
                    .build(meta, &intervals, cols, None)?
                    .into(),
            }
        },
        _ => {
            return Err(MappingError::invalid(
                "source map",
                format!("does not match object type {}", request.object_type),
            )
            .into());
        },
    };

    log_summary(request, built.messages());
    Ok(built)
}

fn load(tables: &dyn TableSource, handle: &str) -> Result<Table> {
    debug!("Loading source '{handle}'");
    Ok(tables.load(handle)?)
}

fn log_summary(request: &BuildRequest, messages: &ValidationLog) {
    info!(
        "Built {} '{}': {} info, {} warning(s), {} error(s)",
        request.object_type,
        request.name,
        messages.count(Severity::Info),
        messages.count(Severity::Warning),
        messages.count(Severity::Error)
    );
    for message in messages.with_severity(Severity::Error) {
        warn!("{message}");
    }
}

/// Builds an object and either returns its payload (dry run) or stores it.
///
/// A non-dry-run build issues exactly one `create_object` call; a dry run
/// never touches `store`.
///
/// # Errors
///
/// Everything [`build_local`] returns, plus
/// - [`GeoBuildError::Config`] when workspace, path or name is blank
/// - [`GeoBuildError::Schema`] when the object type has no registered schema
/// - [`GeoBuildError::Store`] when the store rejects the payload
pub async fn build_object(
    request: &BuildRequest,
    tables: &dyn TableSource,
    store: &dyn ObjectStore,
) -> Result<BuildResponse> {
    request.validate()?;
    info!(
        "Building {} '{}' for workspace {}",
        request.object_type, request.name, request.workspace_id
    );

    let built = build_local(request, tables)?;
    let (payload, messages) = project_built(built)?.into_parts();

    if request.dry_run {
        info!("Dry run successful - object validated but not created");
        return Ok(BuildResponse::Validated {
            object_name: request.name.clone(),
            schema_id: payload.schema_id().to_string(),
            payload: payload.into_content(),
            messages,
        });
    }

    let created = store
        .create_object(&request.object_path, payload.into_content())
        .await
        .map_err(StoreError::request)?;
    info!(
        "Created {}: {} at {}",
        request.object_type, request.name, request.object_path
    );

    Ok(BuildResponse::Created {
        id: created.id,
        path: request.object_path.clone(),
        version_id: created.version_id,
        messages,
    })
}

/// Projects an already built object, for callers that drive builders directly.
///
/// # Errors
///
/// Returns [`GeoBuildError::Schema`] if the object type has no registered schema.
pub fn payload_for(object: &BuiltObject) -> Result<Value> {
    Ok(project(object)?.into_content())
}

/// Name, inferred type and number of blank cells of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(serialize_with = "column_type_name")]
    pub data_type: ColumnType,
    pub missing: usize,
}

fn column_type_name<S: serde::Serializer>(
    data_type: &ColumnType,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(data_type.as_str())
}

/// A quick look at a source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablePreview {
    pub source: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnSummary>,
    /// First rows as JSON values, `null` for missing cells
    pub rows: Vec<Vec<Value>>,
}

/// Loads `handle` and summarizes its structure and first `max_rows` rows.
///
/// # Errors
///
/// Returns [`GeoBuildError::Source`] if the table cannot be loaded.
pub fn preview_table(
    tables: &dyn TableSource,
    handle: &str,
    max_rows: usize,
) -> Result<TablePreview> {
    let table = load(tables, handle)?;
    let columns = table
        .columns()
        .iter()
        .map(|c| ColumnSummary {
            name: c.name().to_string(),
            data_type: c.data_type(),
            missing: c.missing_count(),
        })
        .collect();
    let rows = table
        .head(max_rows)
        .into_iter()
        .map(|row| row.into_iter().map(crate::projection::cell_to_json).collect())
        .collect();

    Ok(TablePreview {
        source: handle.to_string(),
        row_count: table.row_count(),
        column_count: table.column_count(),
        columns,
        rows,
    })
}

/// Downloads an object by id or path; `version` `None` is the latest.
///
/// # Errors
///
/// Returns [`GeoBuildError::Store`]; [`StoreError::NotFound`] when the
/// object or version does not exist.
pub async fn fetch_object(
    store: &dyn ObjectStore,
    object: &ObjectRef,
    version: Option<&str>,
) -> Result<DownloadedObject> {
    debug!("Fetching object {object}");
    store
        .download_object(object, version)
        .await
        .map_err(|err| match err.downcast::<StoreError>() {
            Ok(store_error) => GeoBuildError::Store(store_error),
            Err(other) => GeoBuildError::Store(StoreError::request(other)),
        })
}
