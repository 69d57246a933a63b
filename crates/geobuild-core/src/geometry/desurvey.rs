use std::str::FromStr;

use super::GeometryError;
use crate::types::Point3;

/// One directional survey reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyStation {
    /// Measured depth along the hole from the collar
    pub depth: f64,
    /// Degrees clockwise from north
    pub azimuth: f64,
    /// Degrees below horizontal, positive downward
    pub dip: f64,
}

impl SurveyStation {
    #[must_use]
    pub const fn new(depth: f64, azimuth: f64, dip: f64) -> Self {
        Self {
            depth,
            azimuth,
            dip,
        }
    }
}

/// How positions between survey stations are integrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DesurveyMethod {
    /// Circular arc between consecutive stations.
    #[default]
    MinimumCurvature,
    /// Straight leg along the upper station's direction.
    Tangential,
}

impl DesurveyMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DesurveyMethod::MinimumCurvature => "minimum_curvature",
            DesurveyMethod::Tangential => "tangential",
        }
    }
}

impl FromStr for DesurveyMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "minimum_curvature" | "min_curvature" => Ok(DesurveyMethod::MinimumCurvature),
            "tangential" => Ok(DesurveyMethod::Tangential),
            other => Err(format!(
                "unknown desurvey method '{other}', expected 'minimum_curvature' or 'tangential'"
            )),
        }
    }
}

/// Unit direction vector for an azimuth/dip pair.
#[must_use]
pub fn direction(azimuth: f64, dip: f64) -> Point3 {
    let azimuth = azimuth.to_radians();
    let dip = dip.to_radians();
    Point3::new(
        dip.cos() * azimuth.sin(),
        dip.cos() * azimuth.cos(),
        -dip.sin(),
    )
}

/// A survey station together with its computed position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesurveyedStation {
    pub station: SurveyStation,
    pub position: Point3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PathNode {
    depth: f64,
    position: Point3,
    direction: Point3,
}

/// A desurveyed drillhole trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct HolePath {
    collar: Point3,
    method: DesurveyMethod,
    stations: Vec<DesurveyedStation>,
    // collar node first when the first station is below the collar
    nodes: Vec<PathNode>,
}

impl HolePath {
    #[must_use]
    pub fn collar(&self) -> Point3 {
        self.collar
    }

    #[must_use]
    pub fn method(&self) -> DesurveyMethod {
        self.method
    }

    /// Every survey station with its position, in depth order.
    #[must_use]
    pub fn stations(&self) -> &[DesurveyedStation] {
        &self.stations
    }

    /// Shallowest and deepest depth covered by the path.
    #[must_use]
    pub fn depth_range(&self) -> (f64, f64) {
        let first = self.nodes.first().map_or(0.0, |n| n.depth);
        let last = self.nodes.last().map_or(0.0, |n| n.depth);
        (first, last)
    }

    /// Position at a measured depth, linearly interpolated between path
    /// points.
    ///
    /// Depths outside [`HolePath::depth_range`] are extrapolated along the
    /// direction of the nearest end station; the returned flag is `true` in
    /// that case.
    #[must_use]
    pub fn position_at(&self, depth: f64) -> (Point3, bool) {
        let (Some(first), Some(last)) = (self.nodes.first(), self.nodes.last()) else {
            return (self.collar, true);
        };

        if depth < first.depth {
            return (first.position + first.direction * (depth - first.depth), true);
        }
        if depth > last.depth {
            return (last.position + last.direction * (depth - last.depth), true);
        }

        if self.nodes.len() == 1 {
            return (first.position, false);
        }
        let upper = self
            .nodes
            .partition_point(|node| node.depth <= depth)
            .clamp(1, self.nodes.len() - 1);
        let a = self.nodes[upper - 1];
        let b = self.nodes[upper];
        let t = (depth - a.depth) / (b.depth - a.depth);
        (a.position.lerp(b.position, t), false)
    }
}

/// Desurveys one hole.
///
/// Computes a position for every station starting from `collar`. When the
/// first station lies below the collar, the leg from the collar follows the
/// first station's direction. A single station at depth 0 yields the collar
/// itself.
///
/// # Errors
///
/// - [`GeometryError::EmptySurvey`] when `stations` is empty
/// - [`GeometryError::InvalidSurveyOrder`] when the first depth is negative
///   or depths do not strictly increase
/// - [`GeometryError::InvalidStation`] when a dip is outside [-90, 90]
pub fn desurvey(
    collar: Point3,
    stations: &[SurveyStation],
    method: DesurveyMethod,
) -> Result<HolePath, GeometryError> {
    validate_stations(stations)?;

    let mut nodes = Vec::with_capacity(stations.len() + 1);
    let mut desurveyed = Vec::with_capacity(stations.len());

    let first = stations[0];
    let first_direction = direction(first.azimuth, first.dip);
    if first.depth > 0.0 {
        nodes.push(PathNode {
            depth: 0.0,
            position: collar,
            direction: first_direction,
        });
    }
    let mut previous = PathNode {
        depth: first.depth,
        position: collar + first_direction * first.depth,
        direction: first_direction,
    };
    nodes.push(previous);
    desurveyed.push(DesurveyedStation {
        station: first,
        position: previous.position,
    });

    for station in &stations[1..] {
        let current_direction = direction(station.azimuth, station.dip);
        let length = station.depth - previous.depth;
        let offset = match method {
            DesurveyMethod::MinimumCurvature => {
                minimum_curvature_offset(previous.direction, current_direction, length)
            },
            DesurveyMethod::Tangential => previous.direction * length,
        };
        let node = PathNode {
            depth: station.depth,
            position: previous.position + offset,
            direction: current_direction,
        };
        nodes.push(node);
        desurveyed.push(DesurveyedStation {
            station: *station,
            position: node.position,
        });
        previous = node;
    }

    Ok(HolePath {
        collar,
        method,
        stations: desurveyed,
        nodes,
    })
}

fn validate_stations(stations: &[SurveyStation]) -> Result<(), GeometryError> {
    if stations.is_empty() {
        return Err(GeometryError::EmptySurvey);
    }
    let mut previous: Option<f64> = None;
    for (index, station) in stations.iter().enumerate() {
        if !(-90.0..=90.0).contains(&station.dip) {
            return Err(GeometryError::InvalidStation {
                station: index,
                dip: station.dip,
            });
        }
        let out_of_order = match previous {
            None => station.depth < 0.0,
            Some(prev) => station.depth <= prev,
        };
        if out_of_order {
            return Err(GeometryError::InvalidSurveyOrder {
                station: index,
                depth: station.depth,
                previous,
            });
        }
        previous = Some(station.depth);
    }
    Ok(())
}

fn minimum_curvature_offset(upper: Point3, lower: Point3, length: f64) -> Point3 {
    let dogleg = upper.dot(lower).clamp(-1.0, 1.0).acos();
    let ratio = if dogleg < 1e-9 {
        1.0
    } else {
        2.0 / dogleg * (dogleg / 2.0).tan()
    };
    let ratio = if ratio.is_finite() { ratio } else { 1.0 };
    (upper + lower) * (length / 2.0 * ratio)
}
