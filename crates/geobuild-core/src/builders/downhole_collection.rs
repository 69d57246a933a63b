use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use tabular_csv::Table;

use super::downhole_intervals::{DownholeIntervals, IntervalRoles, desurveyed_intervals};
use super::{Built, ColumnCheck, NamedTable, attribute_values, select_attributes};
use crate::error::MissingColumnError;
use crate::geometry::{DesurveyMethod, HolePath, SurveyStation, desurvey};
use crate::mapping::{CollarColumns, DownholeCollectionColumns, SurveyColumns};
use crate::messages::{Locator, ValidationLog};
use crate::types::{AttributeDef, GeometryPoint, ObjectMeta};

const COLLAR_TABLE: &str = "collar";
const SURVEY_TABLE: &str = "survey";

/// A drillhole: collar position and, when desurveying succeeded, its path.
#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    pub hole_id: String,
    /// Collar position; attributes aligned with the collar attribute list
    pub collar: GeometryPoint,
    pub path: Option<HolePath>,
}

/// Holes read from collar and survey tables, in collar table order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DesurveyedHoles {
    pub holes: Vec<Hole>,
    pub collar_attributes: Vec<AttributeDef>,
    pub method: DesurveyMethod,
    index: HashMap<String, usize>,
}

impl DesurveyedHoles {
    #[must_use]
    pub fn get(&self, hole_id: &str) -> Option<&Hole> {
        self.index.get(hole_id).map(|&i| &self.holes[i])
    }

    /// Path of `hole_id`, if it was desurveyed.
    #[must_use]
    pub fn path(&self, hole_id: &str) -> Option<&HolePath> {
        self.get(hole_id).and_then(|hole| hole.path.as_ref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }
}

/// Collars, their desurveyed paths and any nested interval sets.
#[derive(Debug, Clone, PartialEq)]
pub struct DownholeCollection {
    pub meta: ObjectMeta,
    pub holes: Vec<Hole>,
    pub collar_attributes: Vec<AttributeDef>,
    pub desurvey_method: DesurveyMethod,
    pub interval_sets: Vec<DownholeIntervals>,
}

fn require_hole_columns(
    check: &mut ColumnCheck,
    collar: NamedTable<'_>,
    survey: NamedTable<'_>,
    collar_columns: &CollarColumns,
    survey_columns: &SurveyColumns,
) {
    check.require(collar, "collar.id", &collar_columns.id);
    check.require(collar, "collar.x", &collar_columns.x);
    check.require(collar, "collar.y", &collar_columns.y);
    check.require(collar, "collar.z", &collar_columns.z);
    check.require(survey, "survey.id", &survey_columns.id);
    check.require(survey, "survey.depth", &survey_columns.depth);
    check.require(survey, "survey.azimuth", &survey_columns.azimuth);
    check.require(survey, "survey.dip", &survey_columns.dip);
}

/// Reads collars and surveys and desurveys every hole with `method`.
///
/// # Errors
///
/// Returns [`MissingColumnError`] if a mapped collar or survey column is absent.
pub fn desurvey_holes(
    collar: &Table,
    survey: &Table,
    collar_columns: &CollarColumns,
    survey_columns: &SurveyColumns,
    method: DesurveyMethod,
) -> Result<Built<DesurveyedHoles>, MissingColumnError> {
    let collar = NamedTable::new(COLLAR_TABLE, collar);
    let survey = NamedTable::new(SURVEY_TABLE, survey);

    let mut check = ColumnCheck::new();
    require_hole_columns(&mut check, collar, survey, collar_columns, survey_columns);
    let mut log = check.finish()?;

    let holes = read_holes(collar, survey, collar_columns, survey_columns, method, &mut log);
    Ok(Built::new(holes, log))
}

fn read_holes(
    collar: NamedTable<'_>,
    survey: NamedTable<'_>,
    collar_columns: &CollarColumns,
    survey_columns: &SurveyColumns,
    method: DesurveyMethod,
    log: &mut ValidationLog,
) -> DesurveyedHoles {
    let coordinates = [
        collar_columns.x.as_str(),
        collar_columns.y.as_str(),
        collar_columns.z.as_str(),
    ];
    let mut bound = vec![collar_columns.id.as_str()];
    bound.extend(coordinates);
    let collar_attributes = select_attributes(collar, &collar_columns.attributes, &bound, log);

    let mut holes: Vec<Hole> = Vec::with_capacity(collar.table.row_count());
    let mut index = HashMap::new();
    for row in collar.rows() {
        let Some(hole_id) = collar.hole_id(&collar_columns.id, row) else {
            log.warning(
                format!("collar row {row} dropped: missing hole id in column '{}'", collar_columns.id),
                collar.locate(row),
            );
            continue;
        };
        if index.contains_key(&hole_id) {
            log.error(
                format!("duplicate collar for hole '{hole_id}'; row {row} dropped"),
                collar.locate(row).with_hole(hole_id.as_str()),
            );
            continue;
        }
        let position = match collar.point(coordinates, row) {
            Ok(position) => position,
            Err(reason) => {
                log.warning(
                    format!("collar row {row} dropped: {reason}"),
                    collar.locate(row).with_hole(hole_id.as_str()),
                );
                continue;
            },
        };
        index.insert(hole_id.clone(), holes.len());
        holes.push(Hole {
            hole_id,
            collar: GeometryPoint::new(
                position,
                attribute_values(collar, &collar_attributes, row),
            ),
            path: None,
        });
    }

    let mut stations: BTreeMap<usize, Vec<SurveyStation>> = BTreeMap::new();
    for row in survey.rows() {
        let Some(hole_id) = survey.hole_id(&survey_columns.id, row) else {
            log.warning(
                format!("survey row {row} dropped: missing hole id in column '{}'", survey_columns.id),
                survey.locate(row),
            );
            continue;
        };
        let Some(&hole) = index.get(&hole_id) else {
            log.error(
                format!("survey row {row} references hole '{hole_id}', which is not in the collar table"),
                survey.locate(row).with_hole(hole_id.as_str()),
            );
            continue;
        };
        let station = survey.number(&survey_columns.depth, row).and_then(|depth| {
            Ok(SurveyStation::new(
                depth,
                survey.number(&survey_columns.azimuth, row)?,
                survey.number(&survey_columns.dip, row)?,
            ))
        });
        match station {
            Ok(station) => stations.entry(hole).or_default().push(station),
            Err(reason) => log.warning(
                format!("survey row {row} dropped: {reason}"),
                survey.locate(row).with_hole(hole_id.as_str()),
            ),
        }
    }

    for (i, hole) in holes.iter_mut().enumerate() {
        let Some(hole_stations) = stations.get(&i) else {
            log.warning(
                format!("hole '{}' has no survey stations; its path is unresolved", hole.hole_id),
                Locator::table(COLLAR_TABLE).with_hole(hole.hole_id.as_str()),
            );
            continue;
        };
        match desurvey(hole.collar.position, hole_stations, method) {
            Ok(path) => hole.path = Some(path),
            Err(err) => {
                warn!("Desurvey failed for hole '{}': {err}", hole.hole_id);
                log.error(
                    format!("desurvey failed for hole '{}': {err}", hole.hole_id),
                    Locator::table(SURVEY_TABLE).with_hole(hole.hole_id.as_str()),
                );
            },
        }
    }

    DesurveyedHoles {
        holes,
        collar_attributes,
        method,
        index,
    }
}

/// Builds a [`DownholeCollection`] from collar, survey and interval tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownholeCollectionBuilder;

impl DownholeCollectionBuilder {
    /// Reads collars, desurveys every hole and positions each named interval set.
    ///
    /// - collar rows with a bad coordinate are dropped with a warning
    /// - a duplicate collar id is an error; the later row is dropped
    /// - survey rows for a hole missing from the collar table are errors
    /// - survey rows with a bad depth, azimuth or dip are dropped with a warning
    /// - a hole whose survey is out of order is an error; its path stays null
    /// - a hole without survey rows is a warning; its path stays null
    /// - intervals of a hole without path are excluded with one error per
    ///   hole per interval set
    ///
    /// `interval_tables` is keyed by interval set name, matching
    /// `columns.intervals`.
    ///
    /// # Errors
    ///
    /// Returns [`MissingColumnError`] if any mapped column is absent from its table.
    pub fn build(
        &self,
        meta: ObjectMeta,
        collar: &Table,
        survey: &Table,
        interval_tables: &BTreeMap<String, Table>,
        columns: &DownholeCollectionColumns,
    ) -> Result<Built<DownholeCollection>, MissingColumnError> {
        let collar = NamedTable::new(COLLAR_TABLE, collar);
        let survey = NamedTable::new(SURVEY_TABLE, survey);

        let prefixes: BTreeMap<&str, String> = columns
            .intervals
            .keys()
            .map(|name| (name.as_str(), format!("intervals.{name}.")))
            .collect();

        let mut check = ColumnCheck::new();
        require_hole_columns(&mut check, collar, survey, &columns.collar, &columns.survey);
        for (name, set_columns) in &columns.intervals {
            if let (Some(table), Some(prefix)) = (interval_tables.get(name), prefixes.get(name.as_str())) {
                IntervalRoles::nested(prefix, set_columns).require(
                    &mut check,
                    NamedTable::new(name, table),
                    "id",
                );
            }
        }
        let mut log = check.finish()?;

        let holes = read_holes(
            collar,
            survey,
            &columns.collar,
            &columns.survey,
            columns.desurvey,
            &mut log,
        );

        let mut interval_sets = Vec::with_capacity(columns.intervals.len());
        for (name, set_columns) in &columns.intervals {
            let (Some(table), Some(prefix)) = (interval_tables.get(name), prefixes.get(name.as_str()))
            else {
                log.error(
                    format!("no table was supplied for interval set '{name}'"),
                    Locator::table(name.as_str()),
                );
                continue;
            };
            let set_meta = ObjectMeta::new(name.as_str()).with_crs(meta.crs.clone());
            interval_sets.push(desurveyed_intervals(
                set_meta,
                NamedTable::new(name, table),
                IntervalRoles::nested(prefix, set_columns),
                Some(&holes),
                &mut log,
            ));
        }

        debug!(
            "Built downhole collection '{}' with {} holes and {} interval sets",
            meta.name,
            holes.len(),
            interval_sets.len()
        );

        let DesurveyedHoles {
            holes,
            collar_attributes,
            method,
            ..
        } = holes;
        Ok(Built::new(
            DownholeCollection {
                meta,
                holes,
                collar_attributes,
                desurvey_method: method,
                interval_sets,
            },
            log,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::IntervalColumns;
    use crate::messages::Severity;

    fn columns() -> DownholeCollectionColumns {
        let mut intervals = BTreeMap::new();
        intervals.insert(
            "assay".to_string(),
            IntervalColumns {
                id: "HOLEID".to_string(),
                from: "FROM".to_string(),
                to: "TO".to_string(),
                attributes: Some(vec!["Au".to_string()]),
                is_composited: false,
            },
        );
        DownholeCollectionColumns {
            collar: CollarColumns {
                id: "HOLEID".to_string(),
                x: "EAST".to_string(),
                y: "NORTH".to_string(),
                z: "RL".to_string(),
                attributes: None,
            },
            survey: SurveyColumns {
                id: "HOLEID".to_string(),
                depth: "DEPTH".to_string(),
                azimuth: "AZIMUTH".to_string(),
                dip: "DIP".to_string(),
            },
            intervals,
            desurvey: DesurveyMethod::MinimumCurvature,
        }
    }

    fn collar() -> Table {
        Table::from_text_rows(
            &["HOLEID", "EAST", "NORTH", "RL", "DRILLER"],
            &[
                vec!["DH1", "1000", "5000", "300", "acme"],
                vec!["DH2", "1100", "5000", "310", "acme"],
                vec!["DH3", "1200", "5000", "320", "drillco"],
            ],
        )
        .unwrap()
    }

    fn survey() -> Table {
        Table::from_text_rows(
            &["HOLEID", "DEPTH", "AZIMUTH", "DIP"],
            &[
                vec!["DH1", "0", "90", "60"],
                vec!["DH1", "50", "90", "60"],
                vec!["DH3", "0", "0", "90"],
                vec!["DH3", "100", "0", "90"],
            ],
        )
        .unwrap()
    }

    fn assays() -> BTreeMap<String, Table> {
        let table = Table::from_text_rows(
            &["HOLEID", "FROM", "TO", "Au"],
            &[
                vec!["DH1", "0", "10", "0.2"],
                vec!["DH2", "0", "5", "1.4"],
                vec!["DH2", "5", "10", "0.9"],
                vec!["DH3", "20", "30", "2.5"],
            ],
        )
        .unwrap();
        BTreeMap::from([("assay".to_string(), table)])
    }

    #[test]
    fn test_hole_missing_from_survey() {
        let built = DownholeCollectionBuilder
            .build(
                ObjectMeta::new("drilling"),
                &collar(),
                &survey(),
                &assays(),
                &columns(),
            )
            .unwrap();
        let collection = built.object();

        assert_eq!(collection.holes.len(), 3);
        let dh2 = &collection.holes[1];
        assert_eq!(dh2.hole_id, "DH2");
        assert!(dh2.path.is_none());
        assert!(collection.holes[0].path.is_some());
        assert!(collection.holes[2].path.is_some());

        let warnings: Vec<_> = built.messages().with_severity(Severity::Warning).collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].locator.hole_id.as_deref(), Some("DH2"));

        let errors: Vec<_> = built.messages().with_severity(Severity::Error).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].locator.hole_id.as_deref(), Some("DH2"));
        assert_eq!(errors[0].locator.table.as_deref(), Some("assay"));

        let assay = &collection.interval_sets[0];
        assert_eq!(assay.meta.name, "assay");
        let holes: Vec<_> = assay.intervals.iter().map(|i| i.hole_id.as_str()).collect();
        assert_eq!(holes, vec!["DH1", "DH3"]);
        assert!((assay.intervals[1].mid.z - (320.0 - 25.0)).abs() < 1e-9);
    }

    #[test]
    fn test_collar_and_survey_problems() {
        let collar = Table::from_text_rows(
            &["HOLEID", "EAST", "NORTH", "RL"],
            &[
                vec!["DH1", "1000", "5000", "300"],
                vec!["DH1", "1001", "5000", "300"],
                vec!["DH2", "x", "5000", "300"],
                vec!["DH3", "0", "0", "0"],
            ],
        )
        .unwrap();
        let survey = Table::from_text_rows(
            &["HOLEID", "DEPTH", "AZIMUTH", "DIP"],
            &[
                vec!["DH1", "0", "0", "90"],
                vec!["DH1", "", "0", "90"],
                vec!["DH9", "0", "0", "90"],
                vec!["DH3", "50", "0", "90"],
                vec!["DH3", "20", "0", "90"],
            ],
        )
        .unwrap();

        let built = DownholeCollectionBuilder
            .build(
                ObjectMeta::new("drilling"),
                &collar,
                &survey,
                &BTreeMap::new(),
                &DownholeCollectionColumns {
                    intervals: BTreeMap::new(),
                    ..columns()
                },
            )
            .unwrap();
        let collection = built.object();

        assert_eq!(collection.holes.len(), 2);
        assert_eq!(collection.holes[0].collar.position.x, 1000.0);
        assert!(collection.holes[0].path.is_some());
        assert!(collection.holes[1].path.is_none());

        let errors: Vec<_> = built
            .messages()
            .with_severity(Severity::Error)
            .map(|m| m.message.as_str())
            .collect();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("duplicate collar for hole 'DH1'"));
        assert!(errors[1].contains("'DH9', which is not in the collar table"));
        assert!(errors[2].starts_with("desurvey failed for hole 'DH3'"));
        // bad collar coordinate and blank survey depth
        assert_eq!(built.messages().count(Severity::Warning), 2);
        assert!(!built.is_valid());
    }

    #[test]
    fn test_missing_columns_across_tables() {
        let survey = Table::from_text_rows(&["HOLEID", "DEPTH", "AZI", "DIP"], &[vec!["DH1", "0", "0", "90"]])
            .unwrap();
        let err = DownholeCollectionBuilder
            .build(
                ObjectMeta::new("drilling"),
                &collar(),
                &survey,
                &assays(),
                &DownholeCollectionColumns {
                    intervals: BTreeMap::from([(
                        "assay".to_string(),
                        IntervalColumns {
                            id: "HOLEID".to_string(),
                            from: "FROM_M".to_string(),
                            to: "TO".to_string(),
                            attributes: None,
                            is_composited: false,
                        },
                    )]),
                    ..columns()
                },
            )
            .unwrap_err();

        let roles: Vec<_> = err.missing().iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["survey.azimuth", "intervals.assay.from"]);
    }

    #[test]
    fn test_desurvey_holes_alone() {
        let cols = columns();
        let built = desurvey_holes(&collar(), &survey(), &cols.collar, &cols.survey, DesurveyMethod::Tangential)
            .unwrap();
        let holes = built.object();

        assert_eq!(holes.len(), 3);
        assert_eq!(holes.method, DesurveyMethod::Tangential);
        assert!(holes.path("DH1").is_some());
        assert!(holes.path("DH2").is_none());
        assert!(holes.get("DH2").is_some());
        assert_eq!(holes.collar_attributes[0].name, "DRILLER");
    }
}
