use std::collections::HashSet;

use log::debug;
use tabular_csv::{CellValue, Table};

use super::downhole_collection::DesurveyedHoles;
use super::{Built, ColumnCheck, NamedTable, attribute_values, select_attributes};
use crate::error::MissingColumnError;
use crate::geometry::interval_positions;
use crate::mapping::{
    AttributeSelection, DownholeIntervalsColumns, IntervalColumns, IntervalCoordinateColumns,
};
use crate::messages::{Locator, ValidationLog};
use crate::types::{AttributeDef, ObjectMeta, Point3};

/// One depth interval of a hole with its derived positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    pub hole_id: String,
    pub from: f64,
    pub to: f64,
    pub start: Point3,
    pub mid: Point3,
    pub end: Point3,
    /// Exactly `(from + to) / 2`
    pub mid_depth: f64,
    /// Aligned with [`DownholeIntervals::attributes`]
    pub attributes: Vec<CellValue>,
}

/// A set of downhole intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct DownholeIntervals {
    pub meta: ObjectMeta,
    pub intervals: Vec<Interval>,
    pub attributes: Vec<AttributeDef>,
    /// Metadata only; the intervals were aggregated upstream
    pub is_composited: bool,
}

/// The hole id / from / to roles shared by standalone and nested interval tables.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IntervalRoles<'c> {
    pub prefix: &'c str,
    pub hole_id: &'c str,
    pub from: &'c str,
    pub to: &'c str,
    pub attributes: &'c AttributeSelection,
    pub is_composited: bool,
}

impl<'c> IntervalRoles<'c> {
    pub fn nested(prefix: &'c str, columns: &'c IntervalColumns) -> Self {
        Self {
            prefix,
            hole_id: &columns.id,
            from: &columns.from,
            to: &columns.to,
            attributes: &columns.attributes,
            is_composited: columns.is_composited,
        }
    }

    fn standalone(columns: &'c DownholeIntervalsColumns) -> Self {
        Self {
            prefix: "",
            hole_id: &columns.hole_id,
            from: &columns.from,
            to: &columns.to,
            attributes: &columns.attributes,
            is_composited: columns.is_composited,
        }
    }

    pub fn require(&self, check: &mut ColumnCheck, table: NamedTable<'_>, id_role: &str) {
        check.require(table, &format!("{}{id_role}", self.prefix), self.hole_id);
        check.require(table, &format!("{}from", self.prefix), self.from);
        check.require(table, &format!("{}to", self.prefix), self.to);
    }

    fn bound(&self) -> Vec<&'c str> {
        vec![self.hole_id, self.from, self.to]
    }

    /// Hole id and depth range of a row, or why the row is unusable.
    fn read(&self, table: NamedTable<'_>, row: usize) -> Result<(String, f64, f64), String> {
        let hole_id = table
            .hole_id(self.hole_id, row)
            .ok_or_else(|| format!("missing hole id in column '{}'", self.hole_id))?;
        let from = table.number(self.from, row)?;
        let to = table.number(self.to, row)?;
        if from >= to {
            return Err(format!("from depth {from} is not less than to depth {to}"));
        }
        Ok((hole_id, from, to))
    }
}

/// Builds [`DownholeIntervals`] from a single interval table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownholeIntervalsBuilder;

impl DownholeIntervalsBuilder {
    pub const TABLE: &'static str = "intervals";

    /// Builds the interval set.
    ///
    /// When the mapping names the nine start/mid/end coordinate columns their
    /// values are trusted as-is. Otherwise positions are interpolated along
    /// the paths in `holes`; intervals of a hole without a path are excluded
    /// with one error per hole.
    ///
    /// Rows with a missing hole id, unreadable depths or `from >= to` are
    /// dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if a mapped column is absent from `table`.
    pub fn build(
        &self,
        meta: ObjectMeta,
        table: &Table,
        columns: &DownholeIntervalsColumns,
        holes: Option<&DesurveyedHoles>,
    ) -> Result<Built<DownholeIntervals>, MissingColumnError> {
        let intervals_table = NamedTable::new(Self::TABLE, table);
        let roles = IntervalRoles::standalone(columns);

        let mut check = ColumnCheck::new();
        roles.require(&mut check, intervals_table, "hole_id");
        if let Some(coordinates) = columns.coordinates() {
            for (role, column) in coordinates.roles() {
                check.require(intervals_table, role, column);
            }
        }
        let mut log = check.finish()?;

        let intervals = match columns.coordinates() {
            Some(coordinates) => {
                literal_intervals(meta, intervals_table, roles, coordinates, &mut log)
            },
            None => desurveyed_intervals(meta, intervals_table, roles, holes, &mut log),
        };

        Ok(Built::new(intervals, log))
    }
}

fn literal_intervals(
    meta: ObjectMeta,
    table: NamedTable<'_>,
    roles: IntervalRoles<'_>,
    coordinates: &IntervalCoordinateColumns,
    log: &mut ValidationLog,
) -> DownholeIntervals {
    let mut bound: Vec<&str> = roles.bound();
    bound.extend(coordinates.roles().map(|(_, column)| column));
    let attributes = select_attributes(table, roles.attributes, &bound, log);

    let mut intervals = Vec::with_capacity(table.table.row_count());
    for row in table.rows() {
        let read = roles.read(table, row).and_then(|(hole_id, from, to)| {
            let [start, mid, end] = coordinates.triples();
            let start = table.point(start, row)?;
            let mid = table.point(mid, row)?;
            let end = table.point(end, row)?;
            Ok(Interval {
                hole_id,
                from,
                to,
                start,
                mid,
                end,
                mid_depth: (from + to) / 2.0,
                attributes: attribute_values(table, &attributes, row),
            })
        });
        match read {
            Ok(interval) => intervals.push(interval),
            Err(reason) => log.warning(
                format!("interval row {row} dropped: {reason}"),
                table.locate(row),
            ),
        }
    }

    debug!(
        "Built interval set '{}' with {} intervals from literal coordinates",
        meta.name,
        intervals.len()
    );

    DownholeIntervals {
        meta,
        intervals,
        attributes,
        is_composited: roles.is_composited,
    }
}

/// Interpolates interval positions along desurveyed hole paths.
pub(crate) fn desurveyed_intervals(
    meta: ObjectMeta,
    table: NamedTable<'_>,
    roles: IntervalRoles<'_>,
    holes: Option<&DesurveyedHoles>,
    log: &mut ValidationLog,
) -> DownholeIntervals {
    let attributes = select_attributes(table, roles.attributes, &roles.bound(), log);

    let mut reported = HashSet::new();
    let mut intervals = Vec::with_capacity(table.table.row_count());
    for row in table.rows() {
        let (hole_id, from, to) = match roles.read(table, row) {
            Ok(read) => read,
            Err(reason) => {
                log.warning(format!("interval row {row} dropped: {reason}"), table.locate(row));
                continue;
            },
        };

        let hole = holes.and_then(|holes| holes.get(&hole_id));
        let Some(path) = hole.and_then(|hole| hole.path.as_ref()) else {
            if reported.insert(hole_id.clone()) {
                let reason = if hole.is_some() {
                    "has no desurveyed path"
                } else {
                    "is not in the collar table"
                };
                log.error(
                    format!("hole '{hole_id}' {reason}; its intervals in '{}' were excluded", table.name),
                    Locator::table(table.name).with_row(row).with_hole(hole_id.as_str()),
                );
            }
            continue;
        };

        let positions = interval_positions(path, from, to);
        if positions.extrapolated {
            let (shallowest, deepest) = path.depth_range();
            log.warning(
                format!(
                    "interval {from}-{to} lies outside the surveyed depth range {shallowest}-{deepest}; positions were extrapolated"
                ),
                table.locate(row).with_hole(hole_id.as_str()),
            );
        }

        intervals.push(Interval {
            hole_id,
            from,
            to,
            start: positions.start,
            mid: positions.mid,
            end: positions.end,
            mid_depth: positions.mid_depth,
            attributes: attribute_values(table, &attributes, row),
        });
    }

    debug!(
        "Built interval set '{}' with {} desurveyed intervals",
        meta.name,
        intervals.len()
    );

    DownholeIntervals {
        meta,
        intervals,
        attributes,
        is_composited: roles.is_composited,
    }
}
