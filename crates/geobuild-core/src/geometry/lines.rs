use super::GeometryError;
use crate::types::Point3;

/// A segment whose endpoints have been resolved against a vertex list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSegment {
    pub start: usize,
    pub end: usize,
    pub start_point: Point3,
    pub end_point: Point3,
}

impl ResolvedSegment {
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end_point - self.start_point).length()
    }
}

/// Checks a (start, end) pair of vertex positions against `vertex_count`.
///
/// # Errors
///
/// Returns [`GeometryError::IndexOutOfRange`] for the first endpoint that is
/// negative or not below `vertex_count`.
pub fn resolve_segment(
    segment: usize,
    start: i64,
    end: i64,
    vertex_count: usize,
) -> Result<(usize, usize), GeometryError> {
    let check = |index: i64| {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < vertex_count)
            .ok_or(GeometryError::IndexOutOfRange {
                segment,
                index,
                vertex_count,
            })
    };
    Ok((check(start)?, check(end)?))
}

/// Resolves every segment against `vertices`, one result per segment.
///
/// Failures are per segment so callers can skip the bad ones and keep the rest.
#[must_use]
pub fn line_geometry(
    vertices: &[Point3],
    segments: &[(i64, i64)],
) -> Vec<Result<ResolvedSegment, GeometryError>> {
    segments
        .iter()
        .enumerate()
        .map(|(segment, &(start, end))| {
            let (start, end) = resolve_segment(segment, start, end, vertices.len())?;
            Ok(ResolvedSegment {
                start,
                end,
                start_point: vertices[start],
                end_point: vertices[end],
            })
        })
        .collect()
}
