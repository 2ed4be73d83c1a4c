//! Recommended sand ratio, JGJ 55-2011 Table 5.4.2

use crate::interpolate::{Edge, interpolate_grid, round_to};
use crate::models::{FineAggregate, SandClass};
use crate::tables::{SAND_RATIO, SIZE_KEYS, WCR_KEYS};

/// Slump above which the table value is raised (mm)
const SLUMP_BASIS: f64 = 60.0;

/// Sand-grade adjustment in percentage points (midpoint of 2-3 %)
const SAND_GRADE_ADJUSTMENT: f64 = 2.5;

/// Manufactured-sand adjustment in percentage points (midpoint of 3-5 %)
const MANUFACTURED_ADJUSTMENT: f64 = 4.0;

/// Sand ratio (%) rounded to 2 decimals.
///
/// The midpoint of each table range is interpolated along the water-binder
/// ratio first and across the maximum size second. One table serves both
/// aggregate kinds. Out-of-table sizes clamp to the nearest key. Ratios
/// outside 0.4-0.7 continue along the line through the 0.4 and 0.7 columns.
pub fn sand_ratio(wcr: f64, max_size: f64, slump: f64, fine: &FineAggregate) -> f64 {
    let midpoint = |r: usize, c: usize| SAND_RATIO[r][c].midpoint();
    let mut ratio = interpolate_grid(&SIZE_KEYS, &WCR_KEYS, max_size, wcr, Edge::Extend, midpoint);

    // +1 % for every full 20 mm above 60 mm
    if slump > SLUMP_BASIS {
        ratio += ((slump - SLUMP_BASIS) / 20.0).floor();
    }

    ratio += match fine.sand_class() {
        SandClass::Fine => -SAND_GRADE_ADJUSTMENT,
        SandClass::Coarse => SAND_GRADE_ADJUSTMENT,
        SandClass::Medium => 0.0,
    };

    if fine.is_manufactured() {
        ratio += MANUFACTURED_ADJUSTMENT;
    }

    round_to(ratio, 2)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::models::{FineAggregateType, SandGrade};

    fn sand(kind: FineAggregateType, grade: Option<SandGrade>) -> FineAggregate {
        FineAggregate { kind, grade }
    }

    fn river() -> FineAggregate {
        sand(FineAggregateType::NaturalRiver, None)
    }

    #[test]
    fn table_midpoint_at_exact_keys() {
        assert_relative_eq!(sand_ratio(0.5, 20.0, 50.0, &river()), 30.5);
        assert_relative_eq!(sand_ratio(0.7, 40.0, 30.0, &river()), 33.5);
    }

    #[test]
    fn interpolates_ratio_then_size() {
        // 10 mm: 29 -> 32.5, 16 mm: 28 -> 31.5, both at 0.45
        assert_relative_eq!(sand_ratio(0.45, 16.0, 50.0, &river()), 29.75);
        assert_relative_eq!(sand_ratio(0.45, 13.0, 50.0, &river()), 30.25);
    }

    #[test]
    fn slump_adds_one_point_per_full_20mm() {
        assert_relative_eq!(sand_ratio(0.5, 20.0, 60.0, &river()), 30.5);
        assert_relative_eq!(sand_ratio(0.5, 20.0, 79.0, &river()), 30.5);
        assert_relative_eq!(sand_ratio(0.5, 20.0, 80.0, &river()), 31.5);
        assert_relative_eq!(sand_ratio(0.5, 20.0, 180.0, &river()), 36.5);
    }

    #[test]
    fn sand_grade_and_manufactured_adjustments_stack() {
        let fine_manufactured = sand(FineAggregateType::Manufactured, Some(SandGrade::Fine));
        assert_relative_eq!(sand_ratio(0.5, 20.0, 50.0, &fine_manufactured), 32.0);

        let coarse = sand(FineAggregateType::NaturalRiver, Some(SandGrade::Coarse));
        assert_relative_eq!(sand_ratio(0.5, 20.0, 50.0, &coarse), 33.0);

        let mixed = sand(FineAggregateType::Mixed, Some(SandGrade::Medium));
        assert_relative_eq!(sand_ratio(0.5, 20.0, 50.0, &mixed), 30.5);
    }

    #[test]
    fn ratio_outside_the_table_extrapolates() {
        // 20 mm row: 27 at 0.4, 36.5 at 0.7
        assert_relative_eq!(sand_ratio(0.347942, 20.0, 50.0, &river()), 25.35);
        assert_relative_eq!(sand_ratio(0.974752, 20.0, 50.0, &river()), 45.2);
        assert_relative_eq!(sand_ratio(0.8, 20.0, 50.0, &river()), 39.67);
    }

    #[test]
    fn size_outside_the_table_clamps() {
        assert_relative_eq!(sand_ratio(0.5, 63.0, 50.0, &river()), 27.5);
        assert_relative_eq!(sand_ratio(0.5, 5.0, 50.0, &river()), 32.5);
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_relative_eq!(sand_ratio(0.488842, 20.0, 180.0, &river()), 36.11);
    }
}
