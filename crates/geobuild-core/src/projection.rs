//! Renders built objects into the object store's JSON shape.
//!
//! Every payload starts with `schema`, `name`, `description`, `crs` and
//! `bounding_box`, followed by the geometry of its type. Per-row attributes
//! are flattened into one array per attribute under `attributes`.

use serde::Serialize;
use serde_json::{Map, Value};
use tabular_csv::{CellValue, format_timestamp};

use crate::builders::{
    Built, DownholeCollection, DownholeIntervals, Hole, Interval, LineSegments, Pointset,
};
use crate::error::SchemaError;
use crate::geometry::HolePath;
use crate::schemas::ObjectType;
use crate::types::{AttributeDef, BoundingBox, Crs, ObjectMeta, Point3};

/// Any built object, one variant per object type.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltObject {
    Pointset(Pointset),
    LineSegments(LineSegments),
    DownholeCollection(DownholeCollection),
    DownholeIntervals(DownholeIntervals),
}

impl BuiltObject {
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        match self {
            BuiltObject::Pointset(_) => ObjectType::Pointset,
            BuiltObject::LineSegments(_) => ObjectType::LineSegments,
            BuiltObject::DownholeCollection(_) => ObjectType::DownholeCollection,
            BuiltObject::DownholeIntervals(_) => ObjectType::DownholeIntervals,
        }
    }

    #[must_use]
    pub fn meta(&self) -> &ObjectMeta {
        match self {
            BuiltObject::Pointset(o) => &o.meta,
            BuiltObject::LineSegments(o) => &o.meta,
            BuiltObject::DownholeCollection(o) => &o.meta,
            BuiltObject::DownholeIntervals(o) => &o.meta,
        }
    }

    /// Extent of every position the object carries.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            BuiltObject::Pointset(o) => BoundingBox::from_points(o.points.iter().map(|p| p.position)),
            BuiltObject::LineSegments(o) => {
                BoundingBox::from_points(o.vertices.iter().map(|v| v.position))
            },
            BuiltObject::DownholeCollection(o) => {
                let collars = o.holes.iter().map(|h| h.collar.position);
                let paths = o
                    .holes
                    .iter()
                    .filter_map(|h| h.path.as_ref())
                    .flat_map(|path| path.stations().iter().map(|s| s.position));
                let intervals = o.interval_sets.iter().flat_map(|set| interval_points(&set.intervals));
                BoundingBox::from_points(collars.chain(paths).chain(intervals))
            },
            BuiltObject::DownholeIntervals(o) => BoundingBox::from_points(interval_points(&o.intervals)),
        }
    }
}

fn interval_points(intervals: &[Interval]) -> impl Iterator<Item = Point3> + '_ {
    intervals.iter().flat_map(|i| [i.start, i.end])
}

macro_rules! impl_from_built {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for BuiltObject {
                fn from(object: $variant) -> Self {
                    BuiltObject::$variant(object)
                }
            }

            impl From<Built<$variant>> for Built<BuiltObject> {
                fn from(built: Built<$variant>) -> Self {
                    built.map(BuiltObject::$variant)
                }
            }
        )*
    };
}

impl_from_built!(Pointset, LineSegments, DownholeCollection, DownholeIntervals);

/// A projected payload ready for an object store.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPayload {
    object_type: ObjectType,
    schema_id: &'static str,
    content: Value,
}

impl ObjectPayload {
    #[must_use]
    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    #[must_use]
    pub fn schema_id(&self) -> &'static str {
        self.schema_id
    }

    #[must_use]
    pub fn content(&self) -> &Value {
        &self.content
    }

    #[must_use]
    pub fn into_content(self) -> Value {
        self.content
    }
}

#[derive(Serialize)]
struct Header<'a> {
    schema: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    crs: &'a Crs,
    bounding_box: Option<BoundingBox>,
}

/// Projects `object` into its store representation.
///
/// # Errors
///
/// - [`SchemaError::UnsupportedObjectType`] when the object type has no
///   registered schema
/// - [`SchemaError::Serialization`] when the payload cannot be rendered
pub fn project(object: &BuiltObject) -> Result<ObjectPayload, SchemaError> {
    let object_type = object.object_type();
    let schema_id = object_type.schema_id()?;
    let meta = object.meta();

    let header = Header {
        schema: schema_id,
        name: &meta.name,
        description: meta.description.as_deref(),
        crs: &meta.crs,
        bounding_box: object.bounding_box(),
    };
    let mut content = to_map(object_type, &header)?;

    match object {
        BuiltObject::Pointset(pointset) => {
            content.insert("points".into(), positions(pointset.points.iter().map(|p| p.position)));
            content.insert(
                "attributes".into(),
                attribute_arrays(&pointset.attributes, pointset.points.iter().map(|p| &p.attributes)),
            );
        },
        BuiltObject::LineSegments(lines) => {
            content.insert("vertices".into(), positions(lines.vertices.iter().map(|v| v.position)));
            content.insert(
                "segments".into(),
                Value::Array(
                    lines
                        .segments
                        .iter()
                        .map(|s| Value::from(vec![s.start, s.end]))
                        .collect(),
                ),
            );
            content.insert(
                "attributes".into(),
                attribute_arrays(&lines.vertex_attributes, lines.vertices.iter().map(|v| &v.attributes)),
            );
            content.insert(
                "segment_attributes".into(),
                attribute_arrays(&lines.segment_attributes, lines.segments.iter().map(|s| &s.attributes)),
            );
        },
        BuiltObject::DownholeIntervals(intervals) => {
            content.extend(interval_fields(object_type, intervals)?);
        },
        BuiltObject::DownholeCollection(collection) => {
            content.insert(
                "desurvey_method".into(),
                Value::from(collection.desurvey_method.as_str()),
            );
            let holes = collection
                .holes
                .iter()
                .map(|hole| hole_value(object_type, hole))
                .collect::<Result<Vec<_>, _>>()?;
            content.insert("holes".into(), Value::Array(holes));
            content.insert(
                "attributes".into(),
                attribute_arrays(
                    &collection.collar_attributes,
                    collection.holes.iter().map(|h| &h.collar.attributes),
                ),
            );
            let mut sets = Map::new();
            for set in &collection.interval_sets {
                sets.insert(
                    set.meta.name.clone(),
                    Value::Object(interval_fields(object_type, set)?),
                );
            }
            content.insert("interval_sets".into(), Value::Object(sets));
        },
    }

    Ok(ObjectPayload {
        object_type,
        schema_id,
        content: Value::Object(content),
    })
}

/// Projects a build result, keeping its messages.
///
/// # Errors
///
/// See [`project`].
pub fn project_built(
    built: Built<BuiltObject>,
) -> Result<Built<ObjectPayload>, SchemaError> {
    let (object, messages) = built.into_parts();
    Ok(Built::new(project(&object)?, messages))
}

fn to_map<T: Serialize>(object_type: ObjectType, value: &T) -> Result<Map<String, Value>, SchemaError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Ok(Map::new()),
        Err(source) => Err(SchemaError::Serialization {
            object_type: object_type.to_string(),
            source,
        }),
    }
}

fn positions(points: impl Iterator<Item = Point3>) -> Value {
    Value::Array(points.map(|p| Value::from(p.to_array().to_vec())).collect())
}

/// JSON form of a cell; missing values are `null`.
#[must_use]
pub fn cell_to_json(cell: &CellValue) -> Value {
    match cell {
        CellValue::Missing => Value::Null,
        CellValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
        CellValue::Timestamp(ts) => Value::String(format_timestamp(ts)),
        CellValue::Text(text) => Value::String(text.clone()),
    }
}

/// `{name: [value per row]}` for every attribute.
fn attribute_arrays<'a>(
    attributes: &[AttributeDef],
    rows: impl Iterator<Item = &'a Vec<CellValue>> + Clone,
) -> Value {
    let mut arrays = Map::new();
    for (i, attribute) in attributes.iter().enumerate() {
        let values = rows
            .clone()
            .map(|row| row.get(i).map_or(Value::Null, cell_to_json))
            .collect();
        arrays.insert(attribute.name.clone(), Value::Array(values));
    }
    Value::Object(arrays)
}

#[derive(Serialize)]
struct IntervalRecord<'a> {
    hole_id: &'a str,
    from: f64,
    to: f64,
    start: Point3,
    mid: Point3,
    end: Point3,
    mid_depth: f64,
}

fn interval_fields(
    object_type: ObjectType,
    set: &DownholeIntervals,
) -> Result<Map<String, Value>, SchemaError> {
    let records: Vec<_> = set
        .intervals
        .iter()
        .map(|i| IntervalRecord {
            hole_id: &i.hole_id,
            from: i.from,
            to: i.to,
            start: i.start,
            mid: i.mid,
            end: i.end,
            mid_depth: i.mid_depth,
        })
        .collect();

    let mut fields = Map::new();
    fields.insert("is_composited".into(), Value::Bool(set.is_composited));
    fields.insert(
        "intervals".into(),
        serde_json::to_value(records).map_err(|source| SchemaError::Serialization {
            object_type: object_type.to_string(),
            source,
        })?,
    );
    fields.insert(
        "attributes".into(),
        attribute_arrays(&set.attributes, set.intervals.iter().map(|i| &i.attributes)),
    );
    Ok(fields)
}

#[derive(Serialize)]
struct StationRecord {
    depth: f64,
    azimuth: f64,
    dip: f64,
    position: Point3,
}

#[derive(Serialize)]
struct HoleRecord<'a> {
    hole_id: &'a str,
    collar: Point3,
    path: Option<Vec<StationRecord>>,
}

fn hole_value(object_type: ObjectType, hole: &Hole) -> Result<Value, SchemaError> {
    let record = HoleRecord {
        hole_id: &hole.hole_id,
        collar: hole.collar.position,
        path: hole.path.as_ref().map(station_records),
    };
    serde_json::to_value(record).map_err(|source| SchemaError::Serialization {
        object_type: object_type.to_string(),
        source,
    })
}

fn station_records(path: &HolePath) -> Vec<StationRecord> {
    path.stations()
        .iter()
        .map(|s| StationRecord {
            depth: s.station.depth,
            azimuth: s.station.azimuth,
            dip: s.station.dip,
            position: s.position,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{PointsetBuilder, Segment};
    use crate::mapping::PointsetColumns;
    use crate::schemas::{LINE_SEGMENTS_SCHEMA, POINTSET_SCHEMA};
    use crate::types::GeometryPoint;
    use serde_json::json;
    use tabular_csv::{ColumnType, Table};

    #[test]
    fn test_pointset_payload_shape() {
        let table = Table::from_text_rows(
            &["X", "Y", "Z", "rock", "Au"],
            &[
                vec!["1", "2", "3", "granite", "0.5"],
                vec!["4", "5", "6", "", "1.5"],
            ],
        )
        .unwrap();
        let built = PointsetBuilder
            .build(
                ObjectMeta::new("samples").with_description("soil samples"),
                &table,
                &PointsetColumns {
                    x: "X".into(),
                    y: "Y".into(),
                    z: "Z".into(),
                    attributes: None,
                },
            )
            .unwrap();

        let payload = project(&BuiltObject::from(built.object().clone())).unwrap();
        assert_eq!(payload.schema_id(), POINTSET_SCHEMA);
        assert_eq!(
            payload.content(),
            &json!({
                "schema": POINTSET_SCHEMA,
                "name": "samples",
                "description": "soil samples",
                "crs": "unspecified",
                "bounding_box": {
                    "min_x": 1.0, "max_x": 4.0,
                    "min_y": 2.0, "max_y": 5.0,
                    "min_z": 3.0, "max_z": 6.0
                },
                "points": [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
                "attributes": {
                    "rock": ["granite", null],
                    "Au": [0.5, 1.5]
                }
            })
        );
    }

    #[test]
    fn test_line_segments_payload() {
        let lines = LineSegments {
            meta: ObjectMeta::new("faults").with_crs(Crs::Epsg(32750)),
            vertices: vec![
                GeometryPoint::new(Point3::new(0.0, 0.0, 0.0), vec![]),
                GeometryPoint::new(Point3::new(1.0, 1.0, 1.0), vec![]),
            ],
            vertex_attributes: vec![],
            segments: vec![Segment {
                start: 0,
                end: 1,
                attributes: vec![CellValue::Text("F1".into())],
            }],
            segment_attributes: vec![AttributeDef {
                name: "fault".into(),
                data_type: ColumnType::Text,
            }],
        };

        let payload = project(&lines.into()).unwrap();
        let content = payload.into_content();
        assert_eq!(content["schema"], json!(LINE_SEGMENTS_SCHEMA));
        assert_eq!(content["crs"], json!({"epsg_code": 32750}));
        assert_eq!(content["segments"], json!([[0, 1]]));
        assert_eq!(content["segment_attributes"], json!({"fault": ["F1"]}));
        assert!(content.get("description").is_none());
    }

    #[test]
    fn test_empty_object_has_null_bounding_box() {
        let intervals = DownholeIntervals {
            meta: ObjectMeta::new("empty"),
            intervals: vec![],
            attributes: vec![],
            is_composited: true,
        };
        let content = project(&intervals.into()).unwrap().into_content();
        assert_eq!(content["bounding_box"], Value::Null);
        assert_eq!(content["is_composited"], json!(true));
        assert_eq!(content["intervals"], json!([]));
    }
}
