use log::debug;
use tabular_csv::Table;

use super::{Built, ColumnCheck, NamedTable, attribute_values, select_attributes};
use crate::error::MissingColumnError;
use crate::mapping::PointsetColumns;
use crate::types::{AttributeDef, GeometryPoint, ObjectMeta};

/// A named set of points with per-point attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Pointset {
    pub meta: ObjectMeta,
    pub points: Vec<GeometryPoint>,
    pub attributes: Vec<AttributeDef>,
}

/// Builds a [`Pointset`] from a single points table.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsetBuilder;

impl PointsetBuilder {
    pub const TABLE: &'static str = "points";

    /// Extracts one point per row.
    ///
    /// Rows with a missing or non-numeric coordinate are dropped with one
    /// warning each.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if x, y or z is not a column of `table`.
    pub fn build(
        &self,
        meta: ObjectMeta,
        table: &Table,
        columns: &PointsetColumns,
    ) -> Result<Built<Pointset>, MissingColumnError> {
        let points_table = NamedTable::new(Self::TABLE, table);

        let mut check = ColumnCheck::new();
        check.require(points_table, "x", &columns.x);
        check.require(points_table, "y", &columns.y);
        check.require(points_table, "z", &columns.z);
        let mut log = check.finish()?;

        let coordinates = [columns.x.as_str(), columns.y.as_str(), columns.z.as_str()];
        let attributes = select_attributes(points_table, &columns.attributes, &coordinates, &mut log);

        let mut points = Vec::with_capacity(table.row_count());
        for row in points_table.rows() {
            match points_table.point(coordinates, row) {
                Ok(position) => points.push(GeometryPoint::new(
                    position,
                    attribute_values(points_table, &attributes, row),
                )),
                Err(reason) => log.warning(
                    format!("row {row} dropped: {reason}"),
                    points_table.locate(row),
                ),
            }
        }

        debug!(
            "Built pointset '{}' with {} of {} rows",
            meta.name,
            points.len(),
            table.row_count()
        );

        Ok(Built::new(
            Pointset {
                meta,
                points,
                attributes,
            },
            log,
        ))
    }
}
