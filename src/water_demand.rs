//! Base water demand, JGJ 55-2011 Table 5.2.1-2

use crate::interpolate::{Edge, bracket, exact_key, interpolate_grid, round_to};
use crate::models::{AggregateKind, FineAggregate, SandClass};
use crate::tables::{self, SIZE_KEYS, SLUMP_KEYS};

/// Highest slump covered by the table (mm)
const TABLE_SLUMP_MAX: f64 = 90.0;

/// Extra water per 20 mm of slump beyond the table (kg/m³)
const WATER_PER_20MM: f64 = 5.0;

/// Adjustment from the medium-sand basis of the table (kg/m³)
const SAND_WATER_ADJUSTMENT: f64 = 7.0;

/// Water demand (kg/m³) before any water reducer, rounded to 2 decimals.
///
/// Slumps above 90 mm extrapolate from the 90 mm column of the exact size
/// row, or of the lower bracketing row when the size is between keys. The
/// extrapolated value is returned without the sand-grade adjustment.
/// Inside the table an exact (size, slump) cell is read directly, anything
/// else goes through the two-stage interpolation (slump first, then size).
/// Slumps below 10 mm follow the line through the 10 mm and 90 mm columns;
/// sizes outside the table clamp.
pub fn water_demand(kind: AggregateKind, max_size: f64, slump: f64, fine: &FineAggregate) -> f64 {
    let table = tables::water_demand_table(kind);

    if slump > TABLE_SLUMP_MAX {
        let row = exact_key(&SIZE_KEYS, max_size).unwrap_or_else(|| bracket(&SIZE_KEYS, max_size, Edge::Clamp).0);
        let base = table[row][SLUMP_KEYS.len() - 1];
        let water = base + WATER_PER_20MM * (slump - TABLE_SLUMP_MAX) / 20.0;
        return round_to(water, 2);
    }

    let water = match (exact_key(&SIZE_KEYS, max_size), exact_key(&SLUMP_KEYS, slump)) {
        (Some(row), Some(col)) => table[row][col],
        _ => interpolate_grid(&SIZE_KEYS, &SLUMP_KEYS, max_size, slump, Edge::Extend, |r, c| {
            table[r][c]
        }),
    };

    round_to(water + sand_adjustment(fine), 2)
}

fn sand_adjustment(fine: &FineAggregate) -> f64 {
    match fine.sand_class() {
        SandClass::Fine => SAND_WATER_ADJUSTMENT,
        SandClass::Coarse => -SAND_WATER_ADJUSTMENT,
        SandClass::Medium => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::models::{FineAggregateType, SandGrade};

    fn river(grade: Option<SandGrade>) -> FineAggregate {
        FineAggregate {
            kind: FineAggregateType::NaturalRiver,
            grade,
        }
    }

    #[test]
    fn published_irregular_cell_is_returned_verbatim() {
        assert_eq!(water_demand(AggregateKind::Crushed, 20.0, 90.0, &river(None)), 215.0);
    }

    #[test]
    fn high_slump_extrapolates_from_90mm_column() {
        assert_eq!(water_demand(AggregateKind::Crushed, 20.0, 110.0, &river(None)), 220.0);
        assert_eq!(water_demand(AggregateKind::Crushed, 20.0, 180.0, &river(None)), 237.5);
        assert_eq!(water_demand(AggregateKind::Gravel, 40.0, 130.0, &river(None)), 160.0);
    }

    #[test]
    fn high_slump_between_sizes_uses_lower_row() {
        // 22 mm brackets 20..25, the 20 mm row is used without interpolation
        assert_eq!(water_demand(AggregateKind::Crushed, 22.0, 110.0, &river(None)), 220.0);
    }

    #[test]
    fn exact_cells_for_both_tables() {
        assert_eq!(water_demand(AggregateKind::Crushed, 31.5, 50.0, &river(None)), 160.0);
        assert_eq!(water_demand(AggregateKind::Gravel, 10.0, 10.0, &river(None)), 185.0);
    }

    #[test]
    fn interpolates_slump_then_size() {
        // 25 mm row: 165 -> 170, slump 40 gives 167.5
        assert_relative_eq!(water_demand(AggregateKind::Crushed, 25.0, 40.0, &river(None)), 167.5);
        // Slump 70 is a key but 22.5 mm is not: 185 at 20 mm, 175 at 25 mm
        assert_relative_eq!(water_demand(AggregateKind::Crushed, 22.5, 70.0, &river(None)), 180.0);
        // 20 mm brackets with 16 mm; the result still lands on the 20 mm row
        assert_relative_eq!(water_demand(AggregateKind::Crushed, 20.0, 80.0, &river(None)), 200.0);
    }

    #[test]
    fn sizes_outside_the_table_clamp() {
        assert_eq!(water_demand(AggregateKind::Gravel, 63.0, 50.0, &river(None)), 140.0);
        assert_eq!(water_demand(AggregateKind::Gravel, 5.0, 50.0, &river(None)), 195.0);
    }

    #[test]
    fn low_slump_extends_the_10_to_90_line() {
        // 170 + (215 - 170) * (5 - 10) / 80
        assert_eq!(water_demand(AggregateKind::Crushed, 20.0, 5.0, &river(None)), 167.19);
        // 160 + (180 - 160) * (2 - 10) / 80
        assert_eq!(water_demand(AggregateKind::Gravel, 20.0, 2.0, &river(None)), 158.0);
    }

    #[test]
    fn sand_grade_adjusts_lookup_and_interpolation_alike() {
        let fine = river(Some(SandGrade::Fine));
        let very_fine = river(Some(SandGrade::VeryFine));
        let coarse = river(Some(SandGrade::Coarse));
        let medium = river(Some(SandGrade::Medium));

        assert_eq!(water_demand(AggregateKind::Crushed, 25.0, 50.0, &fine), 177.0);
        assert_eq!(water_demand(AggregateKind::Crushed, 25.0, 50.0, &very_fine), 177.0);
        assert_eq!(water_demand(AggregateKind::Crushed, 25.0, 50.0, &coarse), 163.0);
        assert_eq!(water_demand(AggregateKind::Crushed, 25.0, 50.0, &medium), 170.0);
        assert_relative_eq!(water_demand(AggregateKind::Crushed, 25.0, 40.0, &fine), 174.5);
    }

    #[test]
    fn extrapolated_value_is_not_sand_adjusted() {
        let fine = river(Some(SandGrade::Fine));
        assert_eq!(water_demand(AggregateKind::Crushed, 20.0, 110.0, &fine), 220.0);
    }
}
