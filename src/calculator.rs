//! JGJ 55-2011 mix-design calculation
//!
//! Turns a validated [`MixDesignInput`] into a per-cubic-metre material bill
//! in ten steps. Each step consumes the previous one's output and rounding is
//! applied exactly where noted: moving a rounding changes the bill.

use std::str::FromStr;

use log::{debug, warn};

use crate::coefficients::{fly_ash_factor, slag_powder_factor};
use crate::error::MixError;
use crate::interpolate::round_to;
use crate::labels;
use crate::models::{
    AggregateKind, DEFAULT_CONCRETE_DENSITY, Fallback, FineAggregate, FineAggregateType,
    MixDesignInput, MixDesignRequest, MixDesignResult, MixDetails, MixProportions, Overrides,
    SandGrade, StrengthGrade, Supplement,
};
use crate::sand_ratio::sand_ratio;
use crate::tables::{self, DEFAULT_SIGMA};
use crate::water_demand::water_demand;

/// Probability factor t for a 95 % guarantee rate
const GUARANTEE_FACTOR: f64 = 1.645;

/// Validate a request and run the calculation.
pub fn design(request: &MixDesignRequest) -> Result<MixDesignResult, MixError> {
    calculate_mix_design(&request.validate()?)
}

/// Run the ten-step calculation on a validated input.
pub fn calculate_mix_design(input: &MixDesignInput) -> Result<MixDesignResult, MixError> {
    let o = &input.overrides;
    let mut fallbacks = input.fallbacks.clone();

    // 1. Configured strength fcu,0 = fcu,k + 1.645σ
    let sigma = match o.sigma {
        Some(sigma) => sigma,
        None => tables::standard_deviation(input.strength_grade).unwrap_or_else(|| {
            warn!(
                "{} not in the standard-deviation table, using σ = {}",
                input.strength_grade, DEFAULT_SIGMA
            );
            fallbacks.push(Fallback::UnlistedStrengthGrade {
                grade: input.strength_grade.0,
                sigma: DEFAULT_SIGMA,
            });
            DEFAULT_SIGMA
        }),
    };
    let config_strength = input.strength_grade.mpa() + GUARANTEE_FACTOR * sigma;
    debug!("fcu,0 = {config_strength} MPa (σ = {sigma})");

    // 2. Binder strength fb = γf · γs · fce
    let gamma_f = o.fly_ash_factor.unwrap_or_else(|| match input.fly_ash.grade {
        Some(grade) if input.fly_ash.dosage > 0.0 => fly_ash_factor(grade, input.fly_ash.dosage),
        _ => 1.0,
    });
    let gamma_s = o.slag_powder_factor.unwrap_or_else(|| match input.slag_powder.grade {
        Some(grade) if input.slag_powder.dosage > 0.0 => {
            slag_powder_factor(grade, input.slag_powder.dosage)
        }
        _ => 1.0,
    });
    let binder_strength = input.cement_strength * gamma_f * gamma_s;
    debug!("fb = {binder_strength} MPa (γf = {gamma_f}, γs = {gamma_s})");

    // 3. Binder composition
    let fly_ash_ratio = input.fly_ash.ratio();
    let slag_ratio = input.slag_powder.ratio();
    if 1.0 - fly_ash_ratio - slag_ratio <= 0.0 {
        return Err(MixError::BinderComposition {
            fly_ash: input.fly_ash.dosage,
            slag_powder: input.slag_powder.dosage,
        });
    }

    // 4. Water-binder ratio W/B = αa·fb / (fcu,0 + αa·αb·fb)
    let (default_a, default_b) = input.aggregate.regression_coefficients();
    let alpha_a = o.alpha_a.unwrap_or(default_a);
    let alpha_b = o.alpha_b.unwrap_or(default_b);
    let wcr = match o.wcr {
        Some(wcr) => wcr,
        None => {
            let denominator = config_strength + alpha_a * alpha_b * binder_strength;
            if !(denominator.is_finite() && denominator > 0.0) {
                return Err(MixError::DegenerateRatio {
                    config_strength,
                    binder_strength,
                });
            }
            alpha_a * binder_strength / denominator
        }
    };
    let wcr = round_to(wcr, 6);
    if !(wcr.is_finite() && wcr > 0.0) {
        return Err(MixError::NonPositiveRatio(wcr));
    }
    debug!("W/B = {wcr} (αa = {alpha_a}, αb = {alpha_b})");

    // 5. Water demand without admixture
    let water_base = o.water_base.unwrap_or_else(|| {
        water_demand(input.aggregate, input.max_size, input.slump, &input.fine_aggregate)
    });

    // 6. Water with the reducer, whole kilograms
    let water_actual = (water_base * (1.0 - input.water_reducer_rate / 100.0)).round();
    if water_actual <= 0.0 {
        return Err(MixError::OutOfRange {
            field: "waterActual",
            value: water_actual,
            reason: "water after reduction must be positive",
        });
    }
    debug!("mw0 = {water_base}, mw = {water_actual}");

    // 7. Total binder
    let binder_total = round_to(water_actual / wcr, 6);

    // 8. Binder split; cement takes the residual so the parts sum exactly
    let fly_ash = (binder_total * fly_ash_ratio).round();
    let slag_powder = (binder_total * slag_ratio).round();
    let cement = (binder_total - fly_ash - slag_powder).round();

    // 9. Admixture, dosed on top of the binder
    let admixture = round_to(binder_total * input.admixture_dosage / 100.0, 1);

    // 10. Sand ratio and aggregates. Admixture stays outside the density budget.
    let sand_ratio = round_to(
        o.sand_ratio.unwrap_or_else(|| {
            sand_ratio(wcr, input.max_size, input.slump, &input.fine_aggregate)
        }),
        2,
    );
    let aggregate_total = input.concrete_density - water_actual - binder_total;
    if aggregate_total <= 0.0 {
        return Err(MixError::AggregateBudget {
            density: input.concrete_density,
            aggregate: aggregate_total,
        });
    }
    let sand = (aggregate_total * sand_ratio / 100.0).round();
    let stone = (aggregate_total - sand).round();
    debug!("βs = {sand_ratio} %, aggregate = {aggregate_total} kg/m³");

    Ok(MixDesignResult {
        strength_grade: input.strength_grade.to_string(),
        config_strength: round_to(config_strength, 1),
        binder_strength: round_to(binder_strength, 1),
        wcr,
        water_base: water_base.round(),
        water_actual,
        binder_total: round_to(binder_total, 2),
        sand_ratio,
        proportions: MixProportions {
            water: water_actual,
            cement,
            fly_ash,
            slag_powder,
            admixture,
            sand,
            stone,
        },
        details: MixDetails {
            sigma,
            fly_ash_factor: round_to(gamma_f, 3),
            slag_powder_factor: round_to(gamma_s, 3),
            aggregate_total: round_to(aggregate_total, 2),
            fallbacks,
        },
    })
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn positive(field: &'static str, value: Option<f64>) -> Result<f64, MixError> {
    let value = value.ok_or(MixError::MissingField(field))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(MixError::OutOfRange {
            field,
            value,
            reason: "must be positive",
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, MixError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MixError::OutOfRange {
            field,
            value,
            reason: "must not be negative",
        })
    }
}

fn finite(field: &'static str, value: Option<f64>) -> Result<Option<f64>, MixError> {
    match value {
        Some(v) if !v.is_finite() => Err(MixError::OutOfRange {
            field,
            value: v,
            reason: "must be a finite number",
        }),
        _ => Ok(value),
    }
}

/// Parse a grade whose unknown spellings fall back to "no effect".
fn lenient_grade<G: FromStr>(
    label: &Option<String>,
    fallback: impl FnOnce(String) -> Fallback,
    fallbacks: &mut Vec<Fallback>,
) -> Option<G> {
    let label = non_blank(label)?;
    match label.parse() {
        Ok(grade) => Some(grade),
        Err(_) => {
            let note = fallback(label.to_string());
            warn!("{note}");
            fallbacks.push(note);
            None
        }
    }
}

impl MixDesignRequest {
    /// Normalise labels and check ranges, separating caller errors from
    /// documented defaults.
    pub fn validate(&self) -> Result<MixDesignInput, MixError> {
        let mut fallbacks = Vec::new();

        let strength_grade: StrengthGrade = non_blank(&self.strength_grade)
            .ok_or(MixError::MissingField("strengthGrade"))?
            .parse()?;
        let slump = positive("slump", self.slump)?;
        let aggregate: AggregateKind = non_blank(&self.aggregate_type)
            .ok_or(MixError::MissingField("aggregateType"))?
            .parse()?;
        let max_size = match (self.max_size, non_blank(&self.nominal_size)) {
            (Some(size), _) => positive("maxSize", Some(size))?,
            (None, Some(label)) => labels::max_nominal_size(label)?,
            (None, None) => return Err(MixError::MissingField("maxSize")),
        };

        let kind: FineAggregateType = match non_blank(&self.fine_aggregate_type) {
            Some(label) => label.parse()?,
            None => {
                fallbacks.push(Fallback::AssumedRiverSand);
                FineAggregateType::NaturalRiver
            }
        };
        let grade = non_blank(&self.fine_aggregate_grade)
            .map(str::parse::<SandGrade>)
            .transpose()?;

        let cement_strength = positive("cementStrength28d", self.cement_strength_28d)?;

        let fly_ash = Supplement {
            grade: lenient_grade(
                &self.fly_ash_grade,
                |label| Fallback::UnknownFlyAshGrade { label },
                &mut fallbacks,
            ),
            dosage: non_negative("flyAshDosage", self.fly_ash_dosage)?,
        };
        let slag_powder = Supplement {
            grade: lenient_grade(
                &self.slag_powder_grade,
                |label| Fallback::UnknownSlagPowderGrade { label },
                &mut fallbacks,
            ),
            dosage: non_negative("slagPowderDosage", self.slag_powder_dosage)?,
        };

        let water_reducer_rate = non_negative("waterReducerRate", self.water_reducer_rate)?;
        if water_reducer_rate >= 100.0 {
            return Err(MixError::OutOfRange {
                field: "waterReducerRate",
                value: water_reducer_rate,
                reason: "must be below 100 %",
            });
        }
        let admixture_dosage = non_negative("admixtureDosage", self.admixture_dosage)?;
        let concrete_density = positive(
            "concreteDensity",
            Some(self.concrete_density.unwrap_or(DEFAULT_CONCRETE_DENSITY)),
        )?;

        let overrides = Overrides {
            sigma: finite("customSigma", self.custom_sigma)?,
            water_base: self
                .custom_water_base
                .map(|v| positive("customWaterBase", Some(v)))
                .transpose()?,
            fly_ash_factor: finite("customFlyAshFactor", self.custom_fly_ash_factor)?,
            slag_powder_factor: finite("customSlagPowderFactor", self.custom_slag_powder_factor)?,
            sand_ratio: self
                .custom_sand_ratio
                .map(|v| positive("customSandRatio", Some(v)))
                .transpose()?,
            alpha_a: finite("customAlphaA", self.custom_alpha_a)?,
            alpha_b: finite("customAlphaB", self.custom_alpha_b)?,
            wcr: finite("customWCR", self.custom_wcr)?,
        };

        Ok(MixDesignInput {
            strength_grade,
            slump,
            aggregate,
            max_size,
            fine_aggregate: FineAggregate { kind, grade },
            cement_strength,
            fly_ash,
            slag_powder,
            water_reducer_rate,
            admixture_dosage,
            concrete_density,
            overrides,
            fallbacks,
        })
    }
}

/// Format a material bill as aligned rows
pub fn format_proportions(p: &MixProportions) -> String {
    let rows = [
        ("Water", p.water),
        ("Cement", p.cement),
        ("Fly ash", p.fly_ash),
        ("Slag powder", p.slag_powder),
        ("Admixture", p.admixture),
        ("Sand", p.sand),
        ("Stone", p.stone),
    ];
    let mut output = String::new();
    for (name, mass) in rows {
        output.push_str(&format!("  {:<12} {:>8.1}\n", name, mass));
    }
    output.push_str(&format!("  {:<12} {:>8.1}\n", "Total", p.total()));
    output
}

impl std::fmt::Display for MixDesignResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Mix Design {} (JGJ 55-2011) ===", self.strength_grade)?;
        writeln!(
            f,
            "Configured strength: {:.1} MPa (σ = {})",
            self.config_strength, self.details.sigma
        )?;
        writeln!(
            f,
            "Binder strength:     {:.1} MPa (γf = {:.3}, γs = {:.3})",
            self.binder_strength, self.details.fly_ash_factor, self.details.slag_powder_factor
        )?;
        writeln!(f, "Water-binder ratio:  {:.6}", self.wcr)?;
        writeln!(
            f,
            "Water demand:        {:.0} -> {:.0} kg/m³",
            self.water_base, self.water_actual
        )?;
        writeln!(f, "Binder total:        {:.2} kg/m³", self.binder_total)?;
        writeln!(f, "Sand ratio:          {:.2} %", self.sand_ratio)?;
        writeln!(f, "Aggregate total:     {:.2} kg/m³", self.details.aggregate_total)?;
        writeln!(f)?;

        writeln!(f, "Materials (kg/m³):")?;
        write!(f, "{}", format_proportions(&self.proportions))?;

        if !self.details.fallbacks.is_empty() {
            writeln!(f)?;
            writeln!(f, "Defaults applied:")?;
            for note in &self.details.fallbacks {
                writeln!(f, "  {}", note)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn c40_request() -> MixDesignRequest {
        MixDesignRequest {
            strength_grade: Some("C40".into()),
            slump: Some(180.0),
            aggregate_type: Some("碎石".into()),
            max_size: Some(20.0),
            fine_aggregate_type: Some("天然砂（河砂）".into()),
            cement_strength_28d: Some(49.3),
            water_reducer_rate: 30.0,
            admixture_dosage: 2.0,
            concrete_density: Some(2400.0),
            ..Default::default()
        }
    }

    #[test]
    fn c40_pumped_plain_cement() {
        let result = design(&c40_request()).unwrap();

        assert_relative_eq!(result.config_strength, 48.2);
        assert_relative_eq!(result.binder_strength, 49.3);
        assert_relative_eq!(result.wcr, 0.488842);
        assert_eq!(result.water_base, 238.0);
        assert_eq!(result.water_actual, 166.0);
        assert_relative_eq!(result.binder_total, 339.58);
        assert_relative_eq!(result.sand_ratio, 36.11);

        let p = &result.proportions;
        assert_eq!(p.water, 166.0);
        assert_eq!(p.cement, 340.0);
        assert_eq!(p.fly_ash, 0.0);
        assert_eq!(p.slag_powder, 0.0);
        assert_relative_eq!(p.admixture, 6.8);
        assert_eq!(p.sand, 684.0);
        assert_eq!(p.stone, 1210.0);

        assert_eq!(result.details.sigma, 5.0);
        assert_relative_eq!(result.details.aggregate_total, 1894.42);
        assert!(result.details.fallbacks.is_empty());
    }

    #[test]
    fn c40_with_fly_ash_and_slag() {
        let request = MixDesignRequest {
            fly_ash_grade: Some("I级".into()),
            fly_ash_dosage: 20.0,
            slag_powder_grade: Some("S95".into()),
            slag_powder_dosage: 20.0,
            ..c40_request()
        };
        let result = design(&request).unwrap();

        assert_relative_eq!(result.details.fly_ash_factor, 0.85);
        assert_relative_eq!(result.details.slag_powder_factor, 1.0);
        assert_relative_eq!(result.binder_strength, 41.9);
        assert_relative_eq!(result.wcr, 0.4217, epsilon = 1e-9);

        let p = &result.proportions;
        assert_eq!((p.fly_ash, p.slag_powder, p.cement), (79.0, 79.0, 236.0));
        assert_relative_eq!(p.admixture, 7.9);
        assert_relative_eq!(result.sand_ratio, 33.76);
        assert_eq!((p.sand, p.stone), (621.0, 1219.0));
    }

    #[test]
    fn binder_and_aggregate_sums_hold() {
        for (fa, slag, slump) in [(0.0, 0.0, 50.0), (15.0, 25.0, 120.0), (33.0, 17.0, 75.0)] {
            let request = MixDesignRequest {
                fly_ash_grade: Some("II级".into()),
                fly_ash_dosage: fa,
                slag_powder_grade: Some("S75".into()),
                slag_powder_dosage: slag,
                slump: Some(slump),
                ..c40_request()
            };
            let result = design(&request).unwrap();
            let p = &result.proportions;
            assert!((p.binder() - result.binder_total.round()).abs() <= 1.0);
            assert_eq!(p.sand + p.stone, result.details.aggregate_total.round());
        }
    }

    fn plain_request(grade: &str) -> MixDesignRequest {
        MixDesignRequest {
            strength_grade: Some(grade.into()),
            slump: Some(50.0),
            water_reducer_rate: 0.0,
            admixture_dosage: 0.0,
            ..c40_request()
        }
    }

    #[test]
    fn low_grade_extrapolates_sand_ratio_past_the_table() {
        let result = design(&plain_request("C15")).unwrap();
        assert_relative_eq!(result.wcr, 0.974752);
        assert_relative_eq!(result.sand_ratio, 45.2);
        assert_eq!(result.proportions.cement, 185.0);
        assert_eq!((result.proportions.sand, result.proportions.stone), (920.0, 1115.0));
    }

    #[test]
    fn high_grade_extrapolates_sand_ratio_below_the_table() {
        let result = design(&plain_request("C60")).unwrap();
        assert_relative_eq!(result.wcr, 0.347942);
        assert_relative_eq!(result.sand_ratio, 25.35);
        assert_eq!(result.proportions.cement, 517.0);
        assert_eq!((result.proportions.sand, result.proportions.stone), (432.0, 1271.0));
    }

    #[test]
    fn gravel_uses_its_own_regression_coefficients() {
        let request = MixDesignRequest {
            aggregate_type: Some("卵石".into()),
            cement_strength_28d: Some(45.0),
            ..plain_request("C30")
        };
        let result = design(&request).unwrap();
        // 0.46 * 45 / (38.225 + 0.46 * 0.07 * 45)
        assert_relative_eq!(result.wcr, 0.521752);
        assert_eq!(result.water_actual, 170.0);
        assert_relative_eq!(result.sand_ratio, 31.15);
        let p = &result.proportions;
        assert_eq!((p.cement, p.sand, p.stone), (326.0, 593.0, 1311.0));
    }

    #[test]
    fn alpha_a_override_keeps_default_alpha_b() {
        let request = MixDesignRequest {
            custom_alpha_a: Some(0.5),
            ..c40_request()
        };
        let result = design(&request).unwrap();
        // αb stays at 0.20 for crushed stone; 0.07 would give 0.493489
        assert_relative_eq!(result.wcr, 0.463738);
        assert_relative_eq!(result.sand_ratio, 35.23);
        assert_eq!(result.proportions.cement, 358.0);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let request = c40_request();
        assert_eq!(design(&request).unwrap(), design(&request).unwrap());
    }

    #[test]
    fn more_water_reducer_means_less_water() {
        let water: Vec<f64> = [10.0, 20.0, 30.0]
            .into_iter()
            .map(|rate| {
                let request = MixDesignRequest {
                    water_reducer_rate: rate,
                    ..c40_request()
                };
                design(&request).unwrap().water_actual
            })
            .collect();
        assert!(water.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn unlisted_grade_falls_back_to_default_sigma() {
        let request = MixDesignRequest {
            strength_grade: Some("C99".into()),
            ..c40_request()
        };
        let result = design(&request).unwrap();
        assert_eq!(result.details.sigma, 5.0);
        assert_eq!(
            result.details.fallbacks,
            vec![Fallback::UnlistedStrengthGrade {
                grade: 99,
                sigma: 5.0
            }]
        );
    }

    #[test]
    fn unknown_supplement_grade_is_a_recorded_fallback() {
        let request = MixDesignRequest {
            fly_ash_grade: Some("特级".into()),
            fly_ash_dosage: 10.0,
            ..c40_request()
        };
        let result = design(&request).unwrap();
        assert_eq!(result.details.fly_ash_factor, 1.0);
        assert_eq!(result.proportions.fly_ash, (result.binder_total * 0.1).round());
        assert!(matches!(
            result.details.fallbacks.as_slice(),
            [Fallback::UnknownFlyAshGrade { .. }]
        ));
    }

    #[test]
    fn missing_grade_is_rejected_before_the_pipeline() {
        let request = MixDesignRequest {
            strength_grade: None,
            ..c40_request()
        };
        assert_eq!(design(&request), Err(MixError::MissingField("strengthGrade")));
    }

    #[test]
    fn misspelt_aggregate_is_rejected() {
        let request = MixDesignRequest {
            aggregate_type: Some("碎 石".into()),
            ..c40_request()
        };
        assert!(matches!(design(&request), Err(MixError::InvalidLabel { .. })));
    }

    #[test]
    fn nominal_size_stands_in_for_max_size() {
        let by_label = MixDesignRequest {
            max_size: None,
            nominal_size: Some("5-20".into()),
            ..c40_request()
        };
        assert_eq!(design(&by_label).unwrap(), design(&c40_request()).unwrap());
    }

    #[test]
    fn binder_without_cement_is_rejected() {
        let request = MixDesignRequest {
            fly_ash_dosage: 60.0,
            slag_powder_dosage: 40.0,
            ..c40_request()
        };
        assert!(matches!(
            design(&request),
            Err(MixError::BinderComposition { .. })
        ));
    }

    #[test]
    fn non_positive_denominator_is_rejected() {
        let request = MixDesignRequest {
            custom_alpha_b: Some(-2.0),
            ..c40_request()
        };
        assert!(matches!(
            design(&request),
            Err(MixError::DegenerateRatio { .. })
        ));
    }

    #[test]
    fn zero_ratio_override_is_rejected() {
        let request = MixDesignRequest {
            custom_wcr: Some(0.0),
            ..c40_request()
        };
        assert_eq!(design(&request), Err(MixError::NonPositiveRatio(0.0)));
    }

    #[test]
    fn full_reduction_is_rejected() {
        let request = MixDesignRequest {
            water_reducer_rate: 100.0,
            ..c40_request()
        };
        assert!(matches!(design(&request), Err(MixError::OutOfRange { .. })));
    }

    #[test]
    fn low_density_leaves_no_aggregate() {
        let request = MixDesignRequest {
            concrete_density: Some(400.0),
            ..c40_request()
        };
        assert!(matches!(
            design(&request),
            Err(MixError::AggregateBudget { .. })
        ));
    }

    #[test]
    fn overrides_short_circuit_lookups() {
        let request = MixDesignRequest {
            custom_sigma: Some(6.0),
            custom_water_base: Some(200.0),
            custom_wcr: Some(0.4),
            custom_sand_ratio: Some(40.0),
            custom_fly_ash_factor: Some(0.9),
            ..c40_request()
        };
        let result = design(&request).unwrap();
        assert_relative_eq!(result.config_strength, 49.9);
        assert_eq!(result.water_actual, 140.0);
        assert_relative_eq!(result.binder_total, 350.0);
        assert_relative_eq!(result.details.fly_ash_factor, 0.9);
        assert_relative_eq!(result.sand_ratio, 40.0);
        // 2400 - 140 - 350 = 1910
        assert_eq!((result.proportions.sand, result.proportions.stone), (764.0, 1146.0));
    }

    #[test]
    fn absent_fine_aggregate_type_assumes_river_sand() {
        let request = MixDesignRequest {
            fine_aggregate_type: None,
            ..c40_request()
        };
        let result = design(&request).unwrap();
        assert_eq!(result.details.fallbacks, vec![Fallback::AssumedRiverSand]);
    }
}
