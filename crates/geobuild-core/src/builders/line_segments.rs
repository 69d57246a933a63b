use log::debug;
use tabular_csv::{CellValue, Table};

use super::{Built, ColumnCheck, NamedTable, attribute_values, select_attributes};
use crate::error::MissingColumnError;
use crate::geometry::{GeometryError, ResolvedSegment, line_geometry, resolve_segment};
use crate::mapping::LineSegmentsColumns;
use crate::types::{AttributeDef, GeometryPoint, ObjectMeta};

/// A segment between two entries of the vertex list.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    /// Aligned with [`LineSegments::segment_attributes`]
    pub attributes: Vec<CellValue>,
}

/// Vertices plus segments referencing them by position.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSegments {
    pub meta: ObjectMeta,
    pub vertices: Vec<GeometryPoint>,
    pub vertex_attributes: Vec<AttributeDef>,
    pub segments: Vec<Segment>,
    pub segment_attributes: Vec<AttributeDef>,
}

impl LineSegments {
    /// Resolves every segment against the vertex list.
    #[must_use]
    pub fn resolved_segments(&self) -> Vec<Result<ResolvedSegment, GeometryError>> {
        let positions: Vec<_> = self.vertices.iter().map(|v| v.position).collect();
        let pairs: Vec<_> = self
            .segments
            .iter()
            .map(|s| (to_index(s.start), to_index(s.end)))
            .collect();
        line_geometry(&positions, &pairs)
    }
}

fn to_index(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}

/// Builds [`LineSegments`] from a vertex table and a segment table.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineSegmentsBuilder;

impl LineSegmentsBuilder {
    pub const VERTEX_TABLE: &'static str = "vertices";
    pub const SEGMENT_TABLE: &'static str = "segments";

    /// Builds the vertex list and the segments referencing it.
    ///
    /// Segment start/end values are row positions in `vertices`. They are
    /// remapped to positions in the returned vertex list, so every returned
    /// segment index is valid for it.
    ///
    /// - vertex rows with a bad coordinate are dropped with a warning
    /// - segments with a missing or non-integer index are skipped with a warning
    /// - segments referencing a row outside the vertex table, or a dropped
    ///   vertex row, are skipped with an error
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if a mapped column is absent from its table.
    pub fn build(
        &self,
        meta: ObjectMeta,
        vertices: &Table,
        segments: &Table,
        columns: &LineSegmentsColumns,
    ) -> Result<Built<LineSegments>, MissingColumnError> {
        let vertex_table = NamedTable::new(Self::VERTEX_TABLE, vertices);
        let segment_table = NamedTable::new(Self::SEGMENT_TABLE, segments);

        let mut check = ColumnCheck::new();
        check.require(vertex_table, "x", &columns.x);
        check.require(vertex_table, "y", &columns.y);
        check.require(vertex_table, "z", &columns.z);
        check.require(segment_table, "start_index", &columns.start_index);
        check.require(segment_table, "end_index", &columns.end_index);
        let mut log = check.finish()?;

        let coordinates = [columns.x.as_str(), columns.y.as_str(), columns.z.as_str()];
        let vertex_attributes =
            select_attributes(vertex_table, &columns.vertex_attributes, &coordinates, &mut log);
        let segment_attributes = select_attributes(
            segment_table,
            &columns.segment_attributes,
            &[columns.start_index.as_str(), columns.end_index.as_str()],
            &mut log,
        );

        // vertex table row -> position in the returned vertex list
        let mut remap = Vec::with_capacity(vertices.row_count());
        let mut vertex_list = Vec::with_capacity(vertices.row_count());
        for row in vertex_table.rows() {
            match vertex_table.point(coordinates, row) {
                Ok(position) => {
                    remap.push(Some(vertex_list.len()));
                    vertex_list.push(GeometryPoint::new(
                        position,
                        attribute_values(vertex_table, &vertex_attributes, row),
                    ));
                },
                Err(reason) => {
                    remap.push(None);
                    log.warning(
                        format!("vertex row {row} dropped: {reason}"),
                        vertex_table.locate(row),
                    );
                },
            }
        }

        let mut segment_list = Vec::with_capacity(segments.row_count());
        for row in segment_table.rows() {
            let indices = read_index(segment_table, &columns.start_index, row)
                .and_then(|start| Ok((start, read_index(segment_table, &columns.end_index, row)?)));
            let (start, end) = match indices {
                Ok(indices) => indices,
                Err(reason) => {
                    log.warning(
                        format!("segment row {row} skipped: {reason}"),
                        segment_table.locate(row),
                    );
                    continue;
                },
            };

            let (start, end) = match resolve_segment(row, start, end, vertices.row_count()) {
                Ok(resolved) => resolved,
                Err(err) => {
                    log.error(err.to_string(), segment_table.locate(row));
                    continue;
                },
            };

            match (remap[start], remap[end]) {
                (Some(start), Some(end)) => segment_list.push(Segment {
                    start,
                    end,
                    attributes: attribute_values(segment_table, &segment_attributes, row),
                }),
                (start_vertex, _) => {
                    let dropped = if start_vertex.is_none() { start } else { end };
                    log.error(
                        format!("segment {row} references vertex row {dropped}, which was dropped"),
                        segment_table.locate(row),
                    );
                },
            }
        }

        debug!(
            "Built line segments '{}' with {} vertices and {} segments",
            meta.name,
            vertex_list.len(),
            segment_list.len()
        );

        Ok(Built::new(
            LineSegments {
                meta,
                vertices: vertex_list,
                vertex_attributes,
                segments: segment_list,
                segment_attributes,
            },
            log,
        ))
    }
}

/// Reads a vertex row reference; whole numbers only.
fn read_index(table: NamedTable<'_>, column: &str, row: usize) -> Result<i64, String> {
    let value = table.number(column, row)?;
    if value.fract() != 0.0 || value.abs() > 9.0e15 {
        return Err(format!("index {value} in column '{column}' is not an integer"));
    }
    Ok(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Severity;

    fn columns() -> LineSegmentsColumns {
        LineSegmentsColumns {
            x: "x".to_string(),
            y: "y".to_string(),
            z: "z".to_string(),
            start_index: "from_vertex".to_string(),
            end_index: "to_vertex".to_string(),
            vertex_attributes: None,
            segment_attributes: None,
        }
    }

    fn vertices() -> Table {
        Table::from_text_rows(
            &["x", "y", "z"],
            &[
                vec!["0", "0", "0"],
                vec!["1", "0", "0"],
                vec!["bad", "1", "0"],
                vec!["0", "1", "0"],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_indices_remapped_after_dropped_vertex() {
        let segments = Table::from_text_rows(
            &["from_vertex", "to_vertex", "fault"],
            &[vec!["0", "1", "F1"], vec!["1", "3", "F1"], vec!["3", "0", "F2"]],
        )
        .unwrap();

        let built = LineSegmentsBuilder
            .build(ObjectMeta::new("faults"), &vertices(), &segments, &columns())
            .unwrap();
        let lines = built.object();

        assert_eq!(lines.vertices.len(), 3);
        assert_eq!(lines.segments.len(), 3);
        assert_eq!((lines.segments[1].start, lines.segments[1].end), (1, 2));
        assert_eq!(lines.segment_attributes[0].name, "fault");
        assert_eq!(built.messages().count(Severity::Warning), 1);
        assert!(built.is_valid());
    }

    #[test]
    fn test_invalid_segments_are_skipped() {
        let segments = Table::from_text_rows(
            &["from_vertex", "to_vertex"],
            &[
                vec!["0", "1"],
                vec!["1", "7"],
                vec!["2", "3"],
                vec!["1.5", "3"],
                vec!["", "3"],
                vec!["-1", "0"],
            ],
        )
        .unwrap();

        let built = LineSegmentsBuilder
            .build(ObjectMeta::new("faults"), &vertices(), &segments, &columns())
            .unwrap();

        assert_eq!(built.object().segments.len(), 1);
        assert!(!built.is_valid());
        let errors: Vec<_> = built.messages().with_severity(Severity::Error).collect();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].locator.row, Some(1));
        assert!(errors[0].message.contains("only 4 vertices exist"));
        assert!(errors[1].message.contains("vertex row 2"));
        // the dropped vertex warning plus two unreadable indices
        assert_eq!(built.messages().count(Severity::Warning), 3);
    }

    #[test]
    fn test_returned_segments_resolve() {
        let segments = Table::from_text_rows(
            &["from_vertex", "to_vertex"],
            &[vec!["3", "1"], vec!["0", "3"], vec!["2", "0"]],
        )
        .unwrap();

        let built = LineSegmentsBuilder
            .build(ObjectMeta::new("faults"), &vertices(), &segments, &columns())
            .unwrap();

        assert!(built.object().resolved_segments().iter().all(Result::is_ok));
    }

    #[test]
    fn test_missing_segment_columns() {
        let segments = Table::from_text_rows(&["a", "b"], &[vec!["0", "1"]]).unwrap();
        let err = LineSegmentsBuilder
            .build(ObjectMeta::new("faults"), &vertices(), &segments, &columns())
            .unwrap_err();

        let roles: Vec<_> = err.missing().iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["start_index", "end_index"]);
    }
}
