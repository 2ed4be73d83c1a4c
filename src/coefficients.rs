//! Strength-contribution factors of supplementary cementitious materials
//!
//! γf (fly ash) and γs (slag powder) scale the measured cement strength to
//! the binder strength fb = γf · γs · fce. Both are piecewise linear in the
//! dosage, given here as a percentage of binder mass.

use crate::models::{FlyAshGrade, SlagPowderGrade};

/// Fly-ash influence factor γf.
///
/// Two regimes split at 10 % dosage. Grades I and II share one pair of
/// lines, grade III is 0.1 lower past the split.
pub fn fly_ash_factor(grade: FlyAshGrade, dosage: f64) -> f64 {
    let d = dosage / 100.0;
    let (slope, intercept) = match grade {
        FlyAshGrade::I | FlyAshGrade::II => (0.5, 1.05),
        FlyAshGrade::III => (1.5, 0.95),
    };
    if dosage <= 10.0 {
        1.00 - slope * d
    } else {
        intercept - d
    }
}

/// Slag-powder influence factor γs.
///
/// Dosages outside every band of a grade, and grades without bands (S115),
/// give 1.0.
pub fn slag_powder_factor(grade: SlagPowderGrade, dosage: f64) -> f64 {
    let d = dosage / 100.0;
    match grade {
        SlagPowderGrade::S75 => {
            if dosage <= 10.0 {
                1.00
            } else if dosage <= 30.0 {
                1.00 - 0.5 * (d - 0.1)
            } else if dosage <= 50.0 {
                1.2 - d
            } else {
                1.0
            }
        }
        SlagPowderGrade::S95 => banded_s95(dosage, 0.0),
        SlagPowderGrade::S105 => banded_s95(dosage, 0.05),
        SlagPowderGrade::S115 => 1.0,
    }
}

/// S95 bands; S105 is the same curve lifted by `offset`.
fn banded_s95(dosage: f64, offset: f64) -> f64 {
    let d = dosage / 100.0;
    if dosage <= 0.0 || dosage > 50.0 {
        1.0
    } else if dosage <= 30.0 {
        1.00 + offset
    } else if dosage <= 40.0 {
        1.3 + offset - d
    } else {
        0.9 + offset - 0.5 * (d - 0.4)
    }
}
