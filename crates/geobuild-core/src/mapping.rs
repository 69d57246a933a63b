//! Typed column mappings and source maps.
//!
//! Requests carry two JSON documents: a source map naming the table behind
//! each purpose (`"points"`, `"collar"`, ...) and a column mapping binding
//! logical roles to column names. Both are parsed here into one typed
//! structure per object type. Every required role that is absent is
//! collected and reported at once as a [`MissingColumnError`], before any
//! table is read.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{GeoBuildError, MappingError, MissingColumnError};
use crate::geometry::DesurveyMethod;
use crate::schemas::ObjectType;

/// Attribute selection for one table.
///
/// `None` carries every column not bound to a role; `Some` carries exactly
/// the listed columns.
pub type AttributeSelection = Option<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointsetColumns {
    pub x: String,
    pub y: String,
    pub z: String,
    pub attributes: AttributeSelection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSegmentsColumns {
    pub x: String,
    pub y: String,
    pub z: String,
    /// Column of the segment table holding the start vertex row position
    pub start_index: String,
    /// Column of the segment table holding the end vertex row position
    pub end_index: String,
    pub vertex_attributes: AttributeSelection,
    pub segment_attributes: AttributeSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollarColumns {
    pub id: String,
    pub x: String,
    pub y: String,
    pub z: String,
    pub attributes: AttributeSelection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurveyColumns {
    pub id: String,
    pub depth: String,
    pub azimuth: String,
    pub dip: String,
}

/// Columns of one interval set nested in a downhole collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalColumns {
    pub id: String,
    pub from: String,
    pub to: String,
    pub attributes: AttributeSelection,
    pub is_composited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownholeCollectionColumns {
    pub collar: CollarColumns,
    pub survey: SurveyColumns,
    pub intervals: BTreeMap<String, IntervalColumns>,
    pub desurvey: DesurveyMethod,
}

/// Literal start/mid/end coordinate columns of an interval table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalCoordinateColumns {
    pub start_x: String,
    pub start_y: String,
    pub start_z: String,
    pub mid_x: String,
    pub mid_y: String,
    pub mid_z: String,
    pub end_x: String,
    pub end_y: String,
    pub end_z: String,
}

impl IntervalCoordinateColumns {
    pub const ROLES: [&'static str; 9] = [
        "start_x", "start_y", "start_z", "mid_x", "mid_y", "mid_z", "end_x", "end_y", "end_z",
    ];

    /// Start, mid and end `[x, y, z]` column triples.
    #[must_use]
    pub fn triples(&self) -> [[&str; 3]; 3] {
        [
            [&self.start_x, &self.start_y, &self.start_z],
            [&self.mid_x, &self.mid_y, &self.mid_z],
            [&self.end_x, &self.end_y, &self.end_z],
        ]
        .map(|triple| triple.map(String::as_str))
    }

    /// `(role, column)` pairs in [`Self::ROLES`] order.
    #[must_use]
    pub fn roles(&self) -> [(&'static str, &str); 9] {
        [
            ("start_x", self.start_x.as_str()),
            ("start_y", self.start_y.as_str()),
            ("start_z", self.start_z.as_str()),
            ("mid_x", self.mid_x.as_str()),
            ("mid_y", self.mid_y.as_str()),
            ("mid_z", self.mid_z.as_str()),
            ("end_x", self.end_x.as_str()),
            ("end_y", self.end_y.as_str()),
            ("end_z", self.end_z.as_str()),
        ]
    }
}

/// How a standalone interval table gets its geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalGeometryColumns {
    /// Coordinates are read from the table and trusted as-is.
    Literal(IntervalCoordinateColumns),
    /// Positions are derived from paths desurveyed from collar and survey tables.
    Desurveyed {
        collar: CollarColumns,
        survey: SurveyColumns,
        method: DesurveyMethod,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownholeIntervalsColumns {
    pub hole_id: String,
    pub from: String,
    pub to: String,
    pub attributes: AttributeSelection,
    pub is_composited: bool,
    pub geometry: IntervalGeometryColumns,
}

impl DownholeIntervalsColumns {
    /// Literal coordinate columns, when the table carries its own geometry.
    #[must_use]
    pub fn coordinates(&self) -> Option<&IntervalCoordinateColumns> {
        match &self.geometry {
            IntervalGeometryColumns::Literal(coordinates) => Some(coordinates),
            IntervalGeometryColumns::Desurveyed { .. } => None,
        }
    }
}

/// A column mapping parsed for one object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMapping {
    Pointset(PointsetColumns),
    LineSegments(LineSegmentsColumns),
    DownholeCollection(DownholeCollectionColumns),
    DownholeIntervals(DownholeIntervalsColumns),
}

impl ColumnMapping {
    /// Parses the column mapping document for `object_type`.
    ///
    /// # Errors
    ///
    /// - [`GeoBuildError::MissingColumn`] listing every required role that is absent
    /// - [`GeoBuildError::Mapping`] when the document has the wrong shape
    pub fn parse(object_type: ObjectType, document: &Value) -> Result<Self, GeoBuildError> {
        let root = document
            .as_object()
            .ok_or_else(|| MappingError::invalid(COLUMN_MAPPING, "expected a JSON object"))?;
        let mut fields = Fields::new(root, "");

        let mapping = match object_type {
            ObjectType::Pointset => ColumnMapping::Pointset(PointsetColumns {
                x: fields.required("x"),
                y: fields.required("y"),
                z: fields.required("z"),
                attributes: fields.list("attributes"),
            }),
            ObjectType::LineSegments => {
                let vertex_attributes = match fields.list("vertex_attributes") {
                    Some(list) => Some(list),
                    None => fields.list("attributes"),
                };
                ColumnMapping::LineSegments(LineSegmentsColumns {
                    x: fields.required("x"),
                    y: fields.required("y"),
                    z: fields.required("z"),
                    start_index: fields.required("start_index"),
                    end_index: fields.required("end_index"),
                    vertex_attributes,
                    segment_attributes: fields.list("segment_attributes"),
                })
            },
            ObjectType::DownholeCollection => {
                ColumnMapping::DownholeCollection(parse_collection(&mut fields))
            },
            ObjectType::DownholeIntervals => {
                ColumnMapping::DownholeIntervals(parse_intervals(&mut fields))
            },
        };

        fields.finish()?;
        Ok(mapping)
    }

    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            ColumnMapping::Pointset(_) => ObjectType::Pointset,
            ColumnMapping::LineSegments(_) => ObjectType::LineSegments,
            ColumnMapping::DownholeCollection(_) => ObjectType::DownholeCollection,
            ColumnMapping::DownholeIntervals(_) => ObjectType::DownholeIntervals,
        }
    }
}

const COLUMN_MAPPING: &str = "column mapping";
const SOURCE_MAP: &str = "source map";

fn parse_collar(fields: &mut Fields<'_>) -> Option<CollarColumns> {
    let mut collar = fields.nested("collar")?;
    let columns = CollarColumns {
        id: collar.required("id"),
        x: collar.required("x"),
        y: collar.required("y"),
        z: collar.required("z"),
        attributes: collar.list("attributes"),
    };
    fields.absorb(collar);
    Some(columns)
}

fn parse_survey(fields: &mut Fields<'_>) -> Option<SurveyColumns> {
    let mut survey = fields.nested("survey")?;
    let columns = SurveyColumns {
        id: survey.required("id"),
        depth: survey.required("depth"),
        azimuth: survey.required("azimuth"),
        dip: survey.required("dip"),
    };
    fields.absorb(survey);
    Some(columns)
}

fn parse_collection(fields: &mut Fields<'_>) -> DownholeCollectionColumns {
    let collar = parse_collar(fields);
    let survey = parse_survey(fields);
    if collar.is_none() {
        fields.missing("collar");
    }
    if survey.is_none() {
        fields.missing("survey");
    }

    let mut intervals = BTreeMap::new();
    if let Some(mut sets) = fields.nested("intervals") {
        for name in sets.keys() {
            let Some(mut set) = sets.nested(&name) else {
                continue;
            };
            intervals.insert(
                name,
                IntervalColumns {
                    id: set.required("id"),
                    from: set.required("from"),
                    to: set.required("to"),
                    attributes: set.list("attributes"),
                    is_composited: set.flag("is_composited"),
                },
            );
            fields.absorb(set);
        }
        fields.absorb(sets);
    }

    DownholeCollectionColumns {
        collar: collar.unwrap_or_default(),
        survey: survey.unwrap_or_default(),
        intervals,
        desurvey: fields.desurvey_method(),
    }
}

fn parse_intervals(fields: &mut Fields<'_>) -> DownholeIntervalsColumns {
    let hole_id = fields.required("hole_id");
    let from = fields.required("from");
    let to = fields.required("to");
    let attributes = fields.list("attributes");
    let is_composited = fields.flag("is_composited");

    let any_coordinate = IntervalCoordinateColumns::ROLES
        .iter()
        .any(|role| fields.has(role));

    let geometry = if !any_coordinate {
        let collar = parse_collar(fields);
        let survey = parse_survey(fields);
        match (collar, survey) {
            (Some(collar), Some(survey)) => IntervalGeometryColumns::Desurveyed {
                collar,
                survey,
                method: fields.desurvey_method(),
            },
            (collar, survey) => {
                if collar.is_none() && survey.is_none() {
                    for role in IntervalCoordinateColumns::ROLES {
                        fields.missing(role);
                    }
                } else if collar.is_none() {
                    fields.missing("collar");
                } else {
                    fields.missing("survey");
                }
                IntervalGeometryColumns::Literal(IntervalCoordinateColumns::default())
            },
        }
    } else {
        IntervalGeometryColumns::Literal(IntervalCoordinateColumns {
            start_x: fields.required("start_x"),
            start_y: fields.required("start_y"),
            start_z: fields.required("start_z"),
            mid_x: fields.required("mid_x"),
            mid_y: fields.required("mid_y"),
            mid_z: fields.required("mid_z"),
            end_x: fields.required("end_x"),
            end_y: fields.required("end_y"),
            end_z: fields.required("end_z"),
        })
    };

    DownholeIntervalsColumns {
        hole_id,
        from,
        to,
        attributes,
        is_composited,
        geometry,
    }
}

/// Reads roles out of one JSON object, collecting absent and malformed ones.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    prefix: String,
    missing: Vec<String>,
    invalid: Vec<String>,
}

impl<'a> Fields<'a> {
    fn new(map: &'a Map<String, Value>, prefix: &str) -> Self {
        Self {
            map,
            prefix: prefix.to_string(),
            missing: Vec::new(),
            invalid: Vec::new(),
        }
    }

    fn path(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn has(&self, key: &str) -> bool {
        self.map.get(key).is_some_and(|v| !v.is_null())
    }

    fn keys(&self) -> Vec<String> {
        self.map.keys().cloned().collect()
    }

    fn missing(&mut self, key: &str) {
        let path = self.path(key);
        self.missing.push(path);
    }

    fn required(&mut self, key: &str) -> String {
        let map = self.map;
        match map.get(key) {
            None | Some(Value::Null) => {
                self.missing(key);
                String::new()
            },
            Some(Value::String(column)) if column.trim().is_empty() => {
                self.missing(key);
                String::new()
            },
            Some(Value::String(column)) => column.clone(),
            Some(_) => {
                let path = self.path(key);
                self.invalid.push(format!("'{path}' must be a column name"));
                String::new()
            },
        }
    }

    fn list(&mut self, key: &str) -> AttributeSelection {
        let map = self.map;
        match map.get(key)? {
            Value::Null => None,
            Value::Array(items) => {
                let mut columns = Vec::with_capacity(items.len());
                for item in items {
                    match item.as_str() {
                        Some(column) => columns.push(column.to_string()),
                        None => {
                            let path = self.path(key);
                            self.invalid.push(format!("'{path}' must list column names"));
                        },
                    }
                }
                Some(columns)
            },
            _ => {
                let path = self.path(key);
                self.invalid.push(format!("'{path}' must be a list of column names"));
                None
            },
        }
    }

    fn flag(&mut self, key: &str) -> bool {
        let map = self.map;
        match map.get(key) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                let path = self.path(key);
                self.invalid.push(format!("'{path}' must be true or false"));
                false
            },
        }
    }

    fn desurvey_method(&mut self) -> DesurveyMethod {
        let map = self.map;
        match map.get("desurvey") {
            None | Some(Value::Null) => DesurveyMethod::default(),
            Some(Value::String(method)) => method.parse().unwrap_or_else(|message| {
                self.invalid.push(message);
                DesurveyMethod::default()
            }),
            Some(_) => {
                let path = self.path("desurvey");
                self.invalid.push(format!("'{path}' must be a method name"));
                DesurveyMethod::default()
            },
        }
    }

    fn nested(&mut self, key: &str) -> Option<Fields<'a>> {
        let map = self.map;
        match map.get(key)? {
            Value::Object(map) => Some(Fields::new(map, &format!("{}.", self.path(key)))),
            Value::Null => None,
            _ => {
                let path = self.path(key);
                self.invalid.push(format!("'{path}' must be an object"));
                None
            },
        }
    }

    /// Takes over what a nested reader collected.
    fn absorb(&mut self, nested: Fields<'_>) {
        self.missing.extend(nested.missing);
        self.invalid.extend(nested.invalid);
    }

    fn finish(self) -> Result<(), GeoBuildError> {
        if !self.invalid.is_empty() {
            return Err(MappingError::invalid(COLUMN_MAPPING, self.invalid.join("; ")).into());
        }
        if !self.missing.is_empty() {
            return Err(MissingColumnError::from_roles(&self.missing).into());
        }
        Ok(())
    }
}

/// Source handles for each table a build reads, per object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMap {
    Pointset {
        points: String,
    },
    LineSegments {
        vertices: String,
        segments: String,
    },
    DownholeCollection {
        collar: String,
        survey: String,
        intervals: BTreeMap<String, String>,
    },
    DownholeIntervals {
        intervals: String,
        collar: Option<String>,
        survey: Option<String>,
    },
}

impl SourceMap {
    /// Parses the source map document for `object_type`.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::MissingSource`] for the first required table
    /// without a handle and [`MappingError::Invalid`] for wrongly shaped
    /// documents.
    pub fn parse(object_type: ObjectType, document: &Value) -> Result<Self, MappingError> {
        let root = document
            .as_object()
            .ok_or_else(|| MappingError::invalid(SOURCE_MAP, "expected a JSON object"))?;

        let handle = |key: &str| -> Result<Option<String>, MappingError> {
            match root.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(Value::String(handle)) if handle.trim().is_empty() => Ok(None),
                Some(Value::String(handle)) => Ok(Some(handle.clone())),
                Some(_) => Err(MappingError::invalid(
                    SOURCE_MAP,
                    format!("'{key}' must be a file path"),
                )),
            }
        };
        let required = |key: &str| -> Result<String, MappingError> {
            handle(key)?.ok_or_else(|| MappingError::MissingSource {
                table: key.to_string(),
            })
        };

        Ok(match object_type {
            ObjectType::Pointset => SourceMap::Pointset {
                points: required("points")?,
            },
            ObjectType::LineSegments => SourceMap::LineSegments {
                vertices: required("vertices")?,
                segments: required("segments")?,
            },
            ObjectType::DownholeCollection => {
                let mut intervals = BTreeMap::new();
                match root.get("intervals") {
                    None | Some(Value::Null) => {},
                    Some(Value::Object(sets)) => {
                        for (name, handle) in sets {
                            let handle = handle.as_str().ok_or_else(|| {
                                MappingError::invalid(
                                    SOURCE_MAP,
                                    format!("'intervals.{name}' must be a file path"),
                                )
                            })?;
                            intervals.insert(name.clone(), handle.to_string());
                        }
                    },
                    Some(_) => {
                        return Err(MappingError::invalid(
                            SOURCE_MAP,
                            "'intervals' must map interval set names to file paths",
                        ));
                    },
                }
                SourceMap::DownholeCollection {
                    collar: required("collar")?,
                    survey: required("survey")?,
                    intervals,
                }
            },
            ObjectType::DownholeIntervals => SourceMap::DownholeIntervals {
                intervals: required("intervals")?,
                collar: handle("collar")?,
                survey: handle("survey")?,
            },
        })
    }
}

/// Checks that a source map and column mapping describe the same tables.
///
/// # Errors
///
/// - [`MappingError::UnpairedIntervalSet`] when an interval set appears in
///   only one of the two documents
/// - [`MappingError::MissingSource`] when desurveyed intervals lack a
///   collar or survey table
/// - [`MappingError::Invalid`] when the documents are for different object types
pub fn check_pairing(sources: &SourceMap, columns: &ColumnMapping) -> Result<(), MappingError> {
    match (sources, columns) {
        (SourceMap::DownholeCollection { intervals, .. }, ColumnMapping::DownholeCollection(cols)) => {
            for name in intervals.keys() {
                if !cols.intervals.contains_key(name) {
                    return Err(MappingError::UnpairedIntervalSet {
                        name: name.clone(),
                        present: "source".to_string(),
                        absent: "column mapping".to_string(),
                    });
                }
            }
            for name in cols.intervals.keys() {
                if !intervals.contains_key(name) {
                    return Err(MappingError::UnpairedIntervalSet {
                        name: name.clone(),
                        present: "column mapping".to_string(),
                        absent: "source".to_string(),
                    });
                }
            }
            Ok(())
        },
        (
            SourceMap::DownholeIntervals { collar, survey, .. },
            ColumnMapping::DownholeIntervals(cols),
        ) => {
            if matches!(cols.geometry, IntervalGeometryColumns::Desurveyed { .. }) {
                if collar.is_none() {
                    return Err(MappingError::MissingSource {
                        table: "collar".to_string(),
                    });
                }
                if survey.is_none() {
                    return Err(MappingError::MissingSource {
                        table: "survey".to_string(),
                    });
                }
            }
            Ok(())
        },
        (SourceMap::Pointset { .. }, ColumnMapping::Pointset(_))
        | (SourceMap::LineSegments { .. }, ColumnMapping::LineSegments(_)) => Ok(()),
        _ => Err(MappingError::invalid(
            SOURCE_MAP,
            format!(
                "source map does not match a {} column mapping",
                columns.object_type()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn missing_roles(err: GeoBuildError) -> Vec<String> {
        match err {
            GeoBuildError::MissingColumn(err) => err.missing().iter().map(|m| m.role.clone()).collect(),
            other => panic!("expected missing column error, got {other}"),
        }
    }

    #[test]
    fn test_parse_pointset() {
        let mapping = ColumnMapping::parse(
            ObjectType::Pointset,
            &json!({"x": "EAST", "y": "NORTH", "z": "RL", "attributes": ["Au"]}),
        )
        .unwrap();
        let ColumnMapping::Pointset(columns) = mapping else {
            panic!("wrong variant");
        };
        assert_eq!(columns.x, "EAST");
        assert_eq!(columns.attributes, Some(vec!["Au".to_string()]));
    }

    #[test]
    fn test_all_missing_roles_are_reported() {
        let err = ColumnMapping::parse(ObjectType::Pointset, &json!({"y": "NORTH"})).unwrap_err();
        assert_eq!(missing_roles(err), vec!["x", "z"]);
    }

    #[test]
    fn test_line_segments_attribute_alias() {
        let mapping = ColumnMapping::parse(
            ObjectType::LineSegments,
            &json!({"x": "x", "y": "y", "z": "z", "start_index": "a", "end_index": "b",
                    "attributes": ["colour"]}),
        )
        .unwrap();
        let ColumnMapping::LineSegments(columns) = mapping else {
            panic!("wrong variant");
        };
        assert_eq!(columns.vertex_attributes, Some(vec!["colour".to_string()]));
        assert_eq!(columns.segment_attributes, None);
    }

    #[test]
    fn test_collection_nested_roles() {
        let err = ColumnMapping::parse(
            ObjectType::DownholeCollection,
            &json!({
                "collar": {"id": "HOLEID", "x": "E", "y": "N"},
                "survey": {"id": "HOLEID", "depth": "DEPTH", "azimuth": "AZI", "dip": "DIP"},
                "intervals": {"assay": {"id": "HOLEID", "from": "FROM"}}
            }),
        )
        .unwrap_err();
        assert_eq!(missing_roles(err), vec!["collar.z", "intervals.assay.to"]);
    }

    #[test]
    fn test_collection_desurvey_method() {
        let mapping = ColumnMapping::parse(
            ObjectType::DownholeCollection,
            &json!({
                "collar": {"id": "HOLEID", "x": "E", "y": "N", "z": "RL"},
                "survey": {"id": "HOLEID", "depth": "DEPTH", "azimuth": "AZI", "dip": "DIP"},
                "desurvey": "tangential"
            }),
        )
        .unwrap();
        let ColumnMapping::DownholeCollection(columns) = mapping else {
            panic!("wrong variant");
        };
        assert_eq!(columns.desurvey, DesurveyMethod::Tangential);
        assert!(columns.intervals.is_empty());
    }

    #[test]
    fn test_invalid_desurvey_method() {
        let err = ColumnMapping::parse(
            ObjectType::DownholeCollection,
            &json!({
                "collar": {"id": "a", "x": "b", "y": "c", "z": "d"},
                "survey": {"id": "a", "depth": "b", "azimuth": "c", "dip": "d"},
                "desurvey": "spline"
            }),
        )
        .unwrap_err();
        assert!(matches!(err, GeoBuildError::Mapping(MappingError::Invalid { .. })));
    }

    #[test]
    fn test_intervals_literal_coordinates() {
        let err = ColumnMapping::parse(
            ObjectType::DownholeIntervals,
            &json!({"hole_id": "h", "from": "f", "to": "t",
                    "start_x": "sx", "start_y": "sy", "start_z": "sz",
                    "mid_x": "mx", "mid_y": "my", "mid_z": "mz",
                    "end_x": "ex", "end_y": "ey"}),
        )
        .unwrap_err();
        assert_eq!(missing_roles(err), vec!["end_z"]);
    }

    #[test]
    fn test_intervals_without_any_geometry() {
        let err = ColumnMapping::parse(
            ObjectType::DownholeIntervals,
            &json!({"hole_id": "h", "from": "f", "to": "t"}),
        )
        .unwrap_err();
        assert_eq!(missing_roles(err).len(), 9);
    }

    #[test]
    fn test_intervals_desurveyed_geometry() {
        let mapping = ColumnMapping::parse(
            ObjectType::DownholeIntervals,
            &json!({"hole_id": "h", "from": "f", "to": "t", "is_composited": true,
                    "collar": {"id": "h", "x": "x", "y": "y", "z": "z"},
                    "survey": {"id": "h", "depth": "d", "azimuth": "a", "dip": "i"}}),
        )
        .unwrap();
        let ColumnMapping::DownholeIntervals(columns) = mapping else {
            panic!("wrong variant");
        };
        assert!(columns.is_composited);
        assert!(columns.coordinates().is_none());
    }

    #[test]
    fn test_wrong_value_type_is_invalid_mapping() {
        let err = ColumnMapping::parse(ObjectType::Pointset, &json!({"x": 1, "y": "y", "z": "z"}))
            .unwrap_err();
        assert!(err.to_string().contains("'x' must be a column name"));
    }

    #[test]
    fn test_interval_set_must_be_an_object() {
        let err = ColumnMapping::parse(
            ObjectType::DownholeCollection,
            &json!({
                "collar": {"id": "a", "x": "b", "y": "c", "z": "d"},
                "survey": {"id": "a", "depth": "b", "azimuth": "c", "dip": "d"},
                "intervals": {"assay": {"id": "a", "from": "f", "to": "t"}, "litho": "lith.csv"}
            }),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GeoBuildError::Mapping(MappingError::Invalid { ref message, .. })
                if message == "'intervals.litho' must be an object"
        ));
    }

    #[test]
    fn test_source_map_missing_table() {
        let err = SourceMap::parse(ObjectType::LineSegments, &json!({"vertices": "v.csv"})).unwrap_err();
        assert!(matches!(err, MappingError::MissingSource { ref table } if table == "segments"));
    }

    #[test]
    fn test_unpaired_interval_set() {
        let sources = SourceMap::parse(
            ObjectType::DownholeCollection,
            &json!({"collar": "c.csv", "survey": "s.csv", "intervals": {"assay": "a.csv", "litho": "l.csv"}}),
        )
        .unwrap();
        let columns = ColumnMapping::parse(
            ObjectType::DownholeCollection,
            &json!({
                "collar": {"id": "a", "x": "b", "y": "c", "z": "d"},
                "survey": {"id": "a", "depth": "b", "azimuth": "c", "dip": "d"},
                "intervals": {"assay": {"id": "a", "from": "f", "to": "t"}}
            }),
        )
        .unwrap();
        let err = check_pairing(&sources, &columns).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Interval set 'litho' has a source but no column mapping"
        );
    }
}
