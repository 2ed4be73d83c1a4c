//! Raw-material checks against the product standards
//!
//! Each material on a [`MaterialSheet`] is optional, as is every measurement
//! on it. Blank values are skipped; only what was entered is checked.

use serde::{Deserialize, Serialize};

use crate::models::{FineAggregateType, FlyAshGrade, SandGrade, SlagPowderGrade};
use crate::tables::{self, Gradation, OtherAdditiveType, OtherAdmixtureType, WaterReducerType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Outside a mandatory limit
    Violation,
    /// Outside a recommended range
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub material: &'static str,
    pub message: String,
}

impl Finding {
    fn violation(material: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Violation,
            material,
            message,
        }
    }

    fn advisory(material: &'static str, message: String) -> Self {
        Self {
            severity: Severity::Advisory,
            material,
            message,
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Violation => "VIOLATION",
            Severity::Advisory => "advisory",
        };
        write!(f, "[{}] {}: {}", tag, self.material, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CementSample {
    pub cement_type: Option<String>,
    pub strength_grade: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlyAshSample {
    pub grade: Option<String>,
    pub strength_activity: Option<f64>,
    pub water_demand_ratio: Option<f64>,
    pub loss_on_ignition: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlagPowderSample {
    pub grade: Option<String>,
    pub strength_activity: Option<f64>,
    pub specific_surface: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WaterReducerSample {
    pub reducer_type: Option<String>,
    /// Chemical family, e.g. `聚羧酸系`
    pub category: Option<String>,
    pub reduction_rate: Option<f64>,
    pub dosage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SandSample {
    pub kind: Option<String>,
    pub grade: Option<String>,
    pub fineness_modulus: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoarseSample {
    pub gradation: Option<String>,
    pub nominal_size: Option<String>,
    pub max_size: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherAdmixtureSample {
    pub admixture_type: Option<String>,
    pub model: Option<String>,
    /// % of binder
    pub dosage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OtherAdditiveSample {
    pub additive_type: Option<String>,
    pub specification: Option<String>,
    /// % of binder
    pub dosage: Option<f64>,
}

/// Raw-material test results, as entered on the materials form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MaterialSheet {
    pub cement: Option<CementSample>,
    pub fly_ash: Option<FlyAshSample>,
    pub slag_powder: Option<SlagPowderSample>,
    pub water_reducer: Option<WaterReducerSample>,
    pub sand: Option<SandSample>,
    pub coarse: Option<CoarseSample>,
    pub other_admixture: Option<OtherAdmixtureSample>,
    pub other_additive: Option<OtherAdditiveSample>,
}

/// Check every material present on the sheet.
pub fn check_materials(sheet: &MaterialSheet) -> Vec<Finding> {
    let mut findings = Vec::new();
    if let Some(cement) = &sheet.cement {
        findings.extend(check_cement(cement));
    }
    if let Some(fly_ash) = &sheet.fly_ash {
        findings.extend(check_fly_ash(fly_ash));
    }
    if let Some(slag) = &sheet.slag_powder {
        findings.extend(check_slag_powder(slag));
    }
    if let Some(reducer) = &sheet.water_reducer {
        findings.extend(check_water_reducer(reducer));
    }
    if let Some(sand) = &sheet.sand {
        findings.extend(check_sand(sand));
    }
    if let Some(coarse) = &sheet.coarse {
        findings.extend(check_coarse(coarse));
    }
    if let Some(admixture) = &sheet.other_admixture {
        findings.extend(check_other_admixture(admixture));
    }
    if let Some(additive) = &sheet.other_additive {
        findings.extend(check_other_additive(additive));
    }
    findings
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn check_cement(sample: &CementSample) -> Vec<Finding> {
    let (Some(cement_type), Some(grade)) = (
        non_blank(&sample.cement_type),
        non_blank(&sample.strength_grade),
    ) else {
        return Vec::new();
    };
    match tables::cement_grades(cement_type) {
        None => vec![Finding::violation(
            "cement",
            format!("unknown cement type `{cement_type}`"),
        )],
        Some(offered) if !offered.contains(&grade) => vec![Finding::violation(
            "cement",
            format!(
                "{cement_type} is not produced in grade {grade} (offered: {})",
                offered.join(", ")
            ),
        )],
        Some(_) => Vec::new(),
    }
}

pub fn check_fly_ash(sample: &FlyAshSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.grade) else {
        return Vec::new();
    };
    let grade: FlyAshGrade = match label.parse() {
        Ok(grade) => grade,
        Err(e) => return vec![Finding::violation("fly ash", e.to_string())],
    };
    let limits = tables::fly_ash_limits(grade);
    let mut findings = Vec::new();

    if let Some(activity) = sample.strength_activity {
        if activity < limits.strength_activity_min {
            findings.push(Finding::violation(
                "fly ash",
                format!(
                    "{} strength-activity index {}% is below {}%",
                    grade.label(),
                    activity,
                    limits.strength_activity_min
                ),
            ));
        }
    }
    if let Some(ratio) = sample.water_demand_ratio {
        if ratio > limits.water_demand_ratio_max {
            findings.push(Finding::violation(
                "fly ash",
                format!(
                    "{} water-demand ratio {}% exceeds {}%",
                    grade.label(),
                    ratio,
                    limits.water_demand_ratio_max
                ),
            ));
        }
    }
    if let Some(loss) = sample.loss_on_ignition {
        if loss > limits.loss_on_ignition_max {
            findings.push(Finding::violation(
                "fly ash",
                format!(
                    "{} loss on ignition {}% exceeds {}%",
                    grade.label(),
                    loss,
                    limits.loss_on_ignition_max
                ),
            ));
        }
    }
    findings
}

pub fn check_slag_powder(sample: &SlagPowderSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.grade) else {
        return Vec::new();
    };
    let grade: SlagPowderGrade = match label.parse() {
        Ok(grade) => grade,
        Err(e) => return vec![Finding::violation("slag powder", e.to_string())],
    };
    let limits = tables::slag_powder_limits(grade);
    let mut findings = Vec::new();

    if let Some(activity) = sample.strength_activity {
        let above = limits.strength_activity_max.is_some_and(|max| activity > max);
        if activity < limits.strength_activity_min || above {
            findings.push(Finding::violation(
                "slag powder",
                format!(
                    "activity index {}% does not match {}",
                    activity, limits.activity_description
                ),
            ));
        }
    }
    if let Some(surface) = sample.specific_surface {
        if surface < limits.specific_surface_min {
            findings.push(Finding::violation(
                "slag powder",
                format!(
                    "{} specific surface {} m²/kg is below {} m²/kg",
                    grade.label(),
                    surface,
                    limits.specific_surface_min
                ),
            ));
        }
    }
    findings
}

pub fn check_water_reducer(sample: &WaterReducerSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.reducer_type) else {
        return Vec::new();
    };
    let Some(kind) = WaterReducerType::from_label(label) else {
        return vec![Finding::violation(
            "water reducer",
            format!("unknown water-reducer type `{label}`"),
        )];
    };
    let limits = tables::water_reducer_limits(kind);
    let mut findings = Vec::new();

    if let Some(category) = non_blank(&sample.category) {
        let offered = tables::water_reducer_categories(kind);
        if !offered.contains(&category) {
            findings.push(Finding::advisory(
                "water reducer",
                format!(
                    "{category} is not a {} category (offered: {})",
                    kind.label(),
                    offered.join(", ")
                ),
            ));
        }
    }

    if let Some(rate) = sample.reduction_rate {
        if rate < limits.reduction_rate_min {
            findings.push(Finding::violation(
                "water reducer",
                format!(
                    "{} reduction rate {}% is below {}%",
                    kind.label(),
                    rate,
                    limits.reduction_rate_min
                ),
            ));
        }
    }
    if let Some(dosage) = sample.dosage {
        if dosage < limits.dosage.min || dosage > limits.dosage.max {
            findings.push(Finding::advisory(
                "water reducer",
                format!(
                    "dosage {}% is outside the recommended {}-{}%",
                    dosage, limits.dosage.min, limits.dosage.max
                ),
            ));
        }
    }
    findings
}

pub fn check_sand(sample: &SandSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.grade) else {
        return Vec::new();
    };
    let grade: SandGrade = match label.parse() {
        Ok(grade) => grade,
        Err(e) => return vec![Finding::violation("sand", e.to_string())],
    };
    let mut findings = Vec::new();

    if let Some(kind) = non_blank(&sample.kind) {
        match kind.parse::<FineAggregateType>() {
            Ok(kind) if !tables::allowed_sand_grades(kind).contains(&grade) => {
                findings.push(Finding::violation(
                    "sand",
                    format!("{} cannot be graded {}", kind.label(), grade.label()),
                ));
            }
            Ok(_) => {}
            Err(e) => findings.push(Finding::violation("sand", e.to_string())),
        }
    }

    if let Some(fm) = sample.fineness_modulus {
        let range = tables::fineness_modulus_range(grade);
        if fm < range.min || fm > range.max {
            findings.push(Finding::violation(
                "sand",
                format!(
                    "fineness modulus {} is outside {}-{} for {}",
                    fm,
                    range.min,
                    range.max,
                    grade.label()
                ),
            ));
        }
    }
    findings
}

pub fn check_coarse(sample: &CoarseSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.nominal_size) else {
        return Vec::new();
    };
    let (gradation, size) = match crate::labels::nominal_size(label) {
        Ok(entry) => entry,
        Err(e) => return vec![Finding::violation("coarse aggregate", e.to_string())],
    };
    let mut findings = Vec::new();

    if let Some(declared) = non_blank(&sample.gradation) {
        match Gradation::from_label(declared) {
            Some(declared) if declared == gradation => {}
            Some(declared) => findings.push(Finding::violation(
                "coarse aggregate",
                format!(
                    "nominal size {label} is {}, not {}",
                    gradation.label(),
                    declared.label()
                ),
            )),
            None => findings.push(Finding::violation(
                "coarse aggregate",
                format!("unknown gradation `{declared}`"),
            )),
        }
    }
    if let Some(declared) = sample.max_size {
        if size != declared {
            findings.push(Finding::violation(
                "coarse aggregate",
                format!("nominal size {label} has a maximum of {size} mm, not {declared} mm"),
            ));
        }
    }
    findings
}

fn dosage_advisory(
    material: &'static str,
    kind: &str,
    dosage: Option<f64>,
    range: tables::RatioRange,
) -> Option<Finding> {
    let dosage = dosage?;
    (dosage < range.min || dosage > range.max).then(|| {
        Finding::advisory(
            material,
            format!(
                "{kind} dosage {dosage}% is outside the recommended {}-{}%",
                range.min, range.max
            ),
        )
    })
}

pub fn check_other_admixture(sample: &OtherAdmixtureSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.admixture_type) else {
        return Vec::new();
    };
    let Some(kind) = OtherAdmixtureType::from_label(label) else {
        return vec![Finding::violation(
            "admixture",
            format!("unknown admixture type `{label}`"),
        )];
    };
    let mut findings = Vec::new();

    if let Some(model) = non_blank(&sample.model) {
        if !kind.models().contains(&model) {
            findings.push(Finding::advisory(
                "admixture",
                format!(
                    "model {model} is not listed for {} (listed: {})",
                    kind.label(),
                    kind.models().join(", ")
                ),
            ));
        }
    }
    let range = kind.dosage_range();
    findings.extend(dosage_advisory("admixture", kind.label(), sample.dosage, range));
    findings
}

pub fn check_other_additive(sample: &OtherAdditiveSample) -> Vec<Finding> {
    let Some(label) = non_blank(&sample.additive_type) else {
        return Vec::new();
    };
    let Some(kind) = OtherAdditiveType::from_label(label) else {
        return vec![Finding::violation(
            "additive",
            format!("unknown additive type `{label}`"),
        )];
    };
    let mut findings = Vec::new();

    if let Some(spec) = non_blank(&sample.specification) {
        if !kind.specifications().contains(&spec) {
            findings.push(Finding::advisory(
                "additive",
                format!(
                    "specification {spec} is not listed for {} (listed: {})",
                    kind.label(),
                    kind.specifications().join(", ")
                ),
            ));
        }
    }
    let range = kind.dosage_range();
    findings.extend(dosage_advisory("additive", kind.label(), sample.dosage, range));
    findings
}
