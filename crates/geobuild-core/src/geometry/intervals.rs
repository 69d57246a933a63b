use super::HolePath;
use crate::types::Point3;

/// Start, mid and end positions of one depth interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalPositions {
    pub start: Point3,
    pub mid: Point3,
    pub end: Point3,
    /// Exactly `(from + to) / 2`
    pub mid_depth: f64,
    /// At least one of the three depths lies outside the surveyed range
    pub extrapolated: bool,
}

/// Positions of the interval `from..to` along `path`.
#[must_use]
pub fn interval_positions(path: &HolePath, from: f64, to: f64) -> IntervalPositions {
    let mid_depth = (from + to) / 2.0;
    let (start, start_extrapolated) = path.position_at(from);
    let (mid, mid_extrapolated) = path.position_at(mid_depth);
    let (end, end_extrapolated) = path.position_at(to);
    IntervalPositions {
        start,
        mid,
        end,
        mid_depth,
        extrapolated: start_extrapolated || mid_extrapolated || end_extrapolated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{DesurveyMethod, SurveyStation, desurvey};

    fn vertical_path() -> HolePath {
        desurvey(
            Point3::new(0.0, 0.0, 200.0),
            &[
                SurveyStation::new(0.0, 0.0, 90.0),
                SurveyStation::new(100.0, 0.0, 90.0),
            ],
            DesurveyMethod::MinimumCurvature,
        )
        .unwrap()
    }

    #[test]
    fn test_interval_inside_survey() {
        let positions = interval_positions(&vertical_path(), 10.0, 30.0);

        assert_eq!(positions.mid_depth, 20.0);
        assert!(!positions.extrapolated);
        assert!((positions.start.z - 190.0).abs() < 1e-9);
        assert!((positions.mid.z - 180.0).abs() < 1e-9);
        assert!((positions.end.z - 170.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_past_end_is_extrapolated() {
        let positions = interval_positions(&vertical_path(), 95.0, 110.0);

        assert!(positions.extrapolated);
        assert_eq!(positions.mid_depth, 102.5);
        assert!((positions.end.z - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_mid_depth_is_exact() {
        let positions = interval_positions(&vertical_path(), 0.1, 0.7);
        assert_eq!(positions.mid_depth, (0.1 + 0.7) / 2.0);
    }
}
