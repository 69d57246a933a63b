//! Geometry engine: segment index resolution, desurveying of directional
//! drillhole surveys into 3D paths, and interval positions along those paths.
//!
//! Conventions used throughout:
//! - azimuth is in degrees clockwise from north (+y);
//! - dip is in degrees below horizontal, positive downward (90 is vertical);
//! - z is elevation, so it decreases down a hole.

mod desurvey;
mod intervals;
mod lines;

pub use desurvey::{DesurveyMethod, DesurveyedStation, HolePath, SurveyStation, desurvey, direction};
pub use intervals::{IntervalPositions, interval_positions};
pub use lines::{ResolvedSegment, line_geometry, resolve_segment};

use thiserror::Error;

/// Errors raised by geometry computations.
///
/// Builders turn these into validation messages; they never abort a whole
/// build on their own.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// A segment refers to a vertex position that does not exist.
    #[error("segment {segment} references vertex {index}, but only {vertex_count} vertices exist")]
    IndexOutOfRange {
        /// Position of the segment
        segment: usize,
        /// The offending vertex index
        index: i64,
        /// Number of vertices available
        vertex_count: usize,
    },

    /// Survey depths are negative or not strictly increasing.
    #[error("{}", survey_order_message(*station, *depth, *previous))]
    InvalidSurveyOrder {
        /// Position of the offending station
        station: usize,
        /// Its depth
        depth: f64,
        /// Depth of the preceding station, if any
        previous: Option<f64>,
    },

    /// Desurveying was asked for a hole without stations.
    #[error("survey has no stations")]
    EmptySurvey,

    /// A station's dip is outside [-90, 90] degrees.
    #[error("survey station {station} has dip {dip}, expected a value between -90 and 90")]
    InvalidStation {
        /// Position of the offending station
        station: usize,
        /// The dip value
        dip: f64,
    },
}

fn survey_order_message(station: usize, depth: f64, previous: Option<f64>) -> String {
    match previous {
        None => format!("first survey depth {depth} is negative"),
        Some(previous) => format!(
            "survey depth {depth} at station {station} does not increase from {previous}"
        ),
    }
}
