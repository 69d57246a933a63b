//! Shared data types for built objects: coordinates, attributes, coordinate
//! reference systems and object metadata.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tabular_csv::{CellValue, ColumnType};

/// A 3D coordinate. `z` is elevation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Linear interpolation; `t = 0` is `self`, `t = 1` is `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Point3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Serialize for Point3 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

/// Name and inferred type of an attribute carried through from a source column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDef {
    pub name: String,
    pub data_type: ColumnType,
}

/// A point plus its attribute values.
///
/// `attributes` is aligned with the owning object's [`AttributeDef`] list.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryPoint {
    pub position: Point3,
    pub attributes: Vec<CellValue>,
}

impl GeometryPoint {
    #[must_use]
    pub fn new(position: Point3, attributes: Vec<CellValue>) -> Self {
        Self {
            position,
            attributes,
        }
    }
}

/// Coordinate reference system tag.
///
/// Never omitted from payloads: an absent CRS is the explicit
/// [`Crs::Unspecified`] sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Crs {
    #[default]
    Unspecified,
    Epsg(u32),
    OgcWkt(String),
}

impl Crs {
    /// Parses a request-level CRS string.
    ///
    /// `""` and `"unspecified"` map to [`Crs::Unspecified`], `"EPSG:4326"` or
    /// a bare code to [`Crs::Epsg`], anything else is kept as OGC WKT.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("unspecified") {
            return Crs::Unspecified;
        }
        let code = raw
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("epsg:"))
            .map_or(raw, |_| &raw[5..]);
        match code.trim().parse::<u32>() {
            Ok(code) => Crs::Epsg(code),
            Err(_) => Crs::OgcWkt(raw.to_string()),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Unspecified => f.write_str("unspecified"),
            Crs::Epsg(code) => write!(f, "EPSG:{code}"),
            Crs::OgcWkt(_) => f.write_str("OGC WKT"),
        }
    }
}

impl Serialize for Crs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Crs::Unspecified => serializer.serialize_str("unspecified"),
            Crs::Epsg(code) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("epsg_code", code)?;
                map.end()
            },
            Crs::OgcWkt(wkt) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("ogc_wkt", wkt)?;
                map.end()
            },
        }
    }
}

/// Name, description and CRS shared by every object type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMeta {
    pub name: String,
    pub description: Option<String>,
    pub crs: Crs,
}

impl ObjectMeta {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the description; blank descriptions are dropped.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = (!description.trim().is_empty()).then_some(description);
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }
}

/// Axis-aligned extent of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl BoundingBox {
    /// Extent of `points`, or `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let init = Self {
            min_x: first.x,
            max_x: first.x,
            min_y: first.y,
            max_y: first.y,
            min_z: first.z,
            max_z: first.z,
        };
        Some(points.fold(init, |bbox, p| Self {
            min_x: bbox.min_x.min(p.x),
            max_x: bbox.max_x.max(p.x),
            min_y: bbox.min_y.min(p.y),
            max_y: bbox.max_y.max(p.y),
            min_z: bbox.min_z.min(p.z),
            max_z: bbox.max_z.max(p.z),
        }))
    }
}
