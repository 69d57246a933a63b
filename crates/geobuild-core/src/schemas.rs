//! Object-schema registry and the closed set of buildable object types.

use std::fmt;
use std::str::FromStr;

pub use geobuild_core_common::{ObjectSchema, SupportStatus};

use crate::error::{SchemaError, unsupported_object_type};

pub const POINTSET_SCHEMA: &str = "/objects/pointset/1.2.0/pointset.schema.json";
pub const LINE_SEGMENTS_SCHEMA: &str = "/objects/line-segments/2.1.0/line-segments.schema.json";
pub const DOWNHOLE_COLLECTION_SCHEMA: &str =
    "/objects/downhole-collection/1.3.0/downhole-collection.schema.json";
pub const DOWNHOLE_INTERVALS_SCHEMA: &str =
    "/objects/downhole-intervals/1.0.1/downhole-intervals.schema.json";

/// Returns every registered object schema, buildable or not.
#[must_use]
pub fn get_object_schemas() -> Vec<ObjectSchema> {
    use SupportStatus::{Planned, Supported};

    vec![
        ObjectSchema::new("pointset", "Point Set", Some(POINTSET_SCHEMA), Supported),
        ObjectSchema::new(
            "line-segments",
            "Line Segments",
            Some(LINE_SEGMENTS_SCHEMA),
            Supported,
        ),
        ObjectSchema::new(
            "downhole-collection",
            "Downhole Collection",
            Some(DOWNHOLE_COLLECTION_SCHEMA),
            Supported,
        ),
        ObjectSchema::new(
            "downhole-intervals",
            "Downhole Intervals",
            Some(DOWNHOLE_INTERVALS_SCHEMA),
            Supported,
        ),
        ObjectSchema::new("triangle-mesh", "Triangle Mesh", None, Planned),
        ObjectSchema::new("regular-3d-grid", "Regular 3D Grid", None, Planned),
    ]
}

/// Returns the schemas that can currently be built.
#[must_use]
pub fn get_supported_schemas() -> Vec<ObjectSchema> {
    get_object_schemas()
        .into_iter()
        .filter(|s| s.status.is_supported())
        .collect()
}

/// Finds a schema by its short name (case-insensitive, `_` accepted for `-`).
#[must_use]
pub fn find_schema(name: &str) -> Option<ObjectSchema> {
    let name = normalize(name);
    get_object_schemas()
        .into_iter()
        .find(|s| s.short_name.eq_ignore_ascii_case(&name))
}

/// Returns the short names of buildable types in sorted order.
#[must_use]
pub fn get_supported_schema_names() -> Vec<&'static str> {
    let mut names: Vec<_> = get_supported_schemas().iter().map(|s| s.short_name).collect();
    names.sort_unstable();
    names
}

fn normalize(name: &str) -> String {
    name.trim().replace('_', "-")
}

/// The buildable object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Pointset,
    LineSegments,
    DownholeCollection,
    DownholeIntervals,
}

impl ObjectType {
    pub const ALL: [ObjectType; 4] = [
        ObjectType::Pointset,
        ObjectType::LineSegments,
        ObjectType::DownholeCollection,
        ObjectType::DownholeIntervals,
    ];

    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            ObjectType::Pointset => "pointset",
            ObjectType::LineSegments => "line-segments",
            ObjectType::DownholeCollection => "downhole-collection",
            ObjectType::DownholeIntervals => "downhole-intervals",
        }
    }

    /// Registry entry for this type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedObjectType`] if the registry has no
    /// buildable entry for the type.
    pub fn schema(&self) -> Result<ObjectSchema, SchemaError> {
        find_schema(self.short_name())
            .filter(|s| s.registered_schema_id().is_some())
            .ok_or_else(|| unsupported_object_type(self.short_name()))
    }

    /// Registered schema id for this type.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::UnsupportedObjectType`] if no schema id is registered.
    pub fn schema_id(&self) -> Result<&'static str, SchemaError> {
        self.schema()?
            .registered_schema_id()
            .ok_or_else(|| unsupported_object_type(self.short_name()))
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ObjectType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize(s);
        ObjectType::ALL
            .into_iter()
            .find(|t| t.short_name().eq_ignore_ascii_case(&name))
            .ok_or_else(|| unsupported_object_type(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_schema() {
        let schema = find_schema("pointset").unwrap();
        assert_eq!(schema.schema_id, Some(POINTSET_SCHEMA));
    }

    #[test]
    fn test_find_schema_case_insensitive() {
        let schema = find_schema("Line_Segments").unwrap();
        assert_eq!(schema.short_name, "line-segments");
    }

    #[test]
    fn test_supported_schemas() {
        let names = get_supported_schema_names();
        assert_eq!(
            names,
            vec![
                "downhole-collection",
                "downhole-intervals",
                "line-segments",
                "pointset"
            ]
        );
        assert_eq!(get_object_schemas().len(), 6);
    }

    #[test]
    fn test_every_object_type_has_schema_id() {
        for object_type in ObjectType::ALL {
            assert!(object_type.schema_id().is_ok(), "{object_type}");
        }
    }

    #[test]
    fn test_parse_object_type() {
        assert_eq!(
            "downhole_intervals".parse::<ObjectType>().unwrap(),
            ObjectType::DownholeIntervals
        );
        assert_eq!(
            "Pointset".parse::<ObjectType>().unwrap(),
            ObjectType::Pointset
        );
    }

    #[test]
    fn test_planned_type_is_unsupported() {
        let err = "triangle-mesh".parse::<ObjectType>().unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnsupportedObjectType { ref name, .. } if name == "triangle-mesh"
        ));
        assert!("surface".parse::<ObjectType>().is_err());
    }
}
