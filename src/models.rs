//! Data models for mix-design requests, typed inputs and results

use serde::{Deserialize, Serialize};

/// Default assumed fresh-concrete density (kg/m³)
pub const DEFAULT_CONCRETE_DENSITY: f64 = 2400.0;

/// Coarse aggregate kind; selects the water-demand table and αa/αb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    Crushed,
    Gravel,
}

impl AggregateKind {
    pub fn label(self) -> &'static str {
        match self {
            AggregateKind::Crushed => "碎石",
            AggregateKind::Gravel => "卵石",
        }
    }

    /// Regression coefficients (αa, αb) of JGJ 55-2011 Table 5.1.2
    pub fn regression_coefficients(self) -> (f64, f64) {
        match self {
            AggregateKind::Crushed => (0.53, 0.20),
            AggregateKind::Gravel => (0.46, 0.07),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineAggregateType {
    NaturalRiver,
    NaturalSea,
    NaturalMountain,
    /// 机制砂 / 人工砂
    Manufactured,
    Mixed,
}

impl FineAggregateType {
    pub fn label(self) -> &'static str {
        match self {
            FineAggregateType::NaturalRiver => "天然砂（河砂）",
            FineAggregateType::NaturalSea => "天然砂（海砂）",
            FineAggregateType::NaturalMountain => "天然砂（山砂）",
            FineAggregateType::Manufactured => "机制砂",
            FineAggregateType::Mixed => "混合砂",
        }
    }
}

/// Sand grading by fineness modulus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SandGrade {
    Coarse,
    Medium,
    Fine,
    VeryFine,
}

impl SandGrade {
    pub fn label(self) -> &'static str {
        match self {
            SandGrade::Coarse => "粗砂（3.7-3.1）",
            SandGrade::Medium => "中砂（3.0-2.3）",
            SandGrade::Fine => "细砂（2.2-1.6）",
            SandGrade::VeryFine => "特细砂（1.5-0.7）",
        }
    }

    /// Very fine sand is adjusted like fine sand.
    pub fn class(self) -> SandClass {
        match self {
            SandGrade::Coarse => SandClass::Coarse,
            SandGrade::Medium => SandClass::Medium,
            SandGrade::Fine | SandGrade::VeryFine => SandClass::Fine,
        }
    }
}

/// Adjustment class used by both resolvers. Tables are based on medium sand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandClass {
    Fine,
    Medium,
    Coarse,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineAggregate {
    pub kind: FineAggregateType,
    pub grade: Option<SandGrade>,
}

impl FineAggregate {
    pub fn sand_class(&self) -> SandClass {
        self.grade.map_or(SandClass::Medium, SandGrade::class)
    }

    pub fn is_manufactured(&self) -> bool {
        self.kind == FineAggregateType::Manufactured
    }
}

/// Strength grade such as C40; holds the characteristic strength in MPa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrengthGrade(pub u32);

impl StrengthGrade {
    pub fn mpa(self) -> f64 {
        f64::from(self.0)
    }
}

impl std::fmt::Display for StrengthGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlyAshGrade {
    I,
    II,
    III,
}

impl FlyAshGrade {
    pub fn label(self) -> &'static str {
        match self {
            FlyAshGrade::I => "I级",
            FlyAshGrade::II => "II级",
            FlyAshGrade::III => "III级",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlagPowderGrade {
    S75,
    S95,
    S105,
    S115,
}

impl SlagPowderGrade {
    pub fn label(self) -> &'static str {
        match self {
            SlagPowderGrade::S75 => "S75",
            SlagPowderGrade::S95 => "S95",
            SlagPowderGrade::S105 => "S105",
            SlagPowderGrade::S115 => "S115",
        }
    }
}

/// A supplementary cementitious material: grade (if known) and dosage as a
/// percentage of binder mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Supplement<G> {
    pub grade: Option<G>,
    pub dosage: f64,
}

impl<G> Supplement<G> {
    pub fn ratio(&self) -> f64 {
        self.dosage / 100.0
    }
}

/// Values that short-circuit the corresponding table lookup when present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub sigma: Option<f64>,
    pub water_base: Option<f64>,
    pub fly_ash_factor: Option<f64>,
    pub slag_powder_factor: Option<f64>,
    pub sand_ratio: Option<f64>,
    pub alpha_a: Option<f64>,
    pub alpha_b: Option<f64>,
    pub wcr: Option<f64>,
}

/// A documented default that was applied instead of a table value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Fallback {
    /// Grade not in the standard-deviation table; σ defaulted.
    UnlistedStrengthGrade { grade: u32, sigma: f64 },
    /// Fly-ash grade label not recognised; factor treated as 1.0.
    UnknownFlyAshGrade { label: String },
    /// Slag-powder grade label not recognised; factor treated as 1.0.
    UnknownSlagPowderGrade { label: String },
    /// No fine-aggregate type given; natural river sand assumed.
    AssumedRiverSand,
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::UnlistedStrengthGrade { grade, sigma } => {
                write!(f, "C{grade} is not in the σ table, using σ = {sigma}")
            }
            Fallback::UnknownFlyAshGrade { label } => {
                write!(f, "fly-ash grade `{label}` unknown, factor 1.0")
            }
            Fallback::UnknownSlagPowderGrade { label } => {
                write!(f, "slag-powder grade `{label}` unknown, factor 1.0")
            }
            Fallback::AssumedRiverSand => write!(f, "no fine-aggregate type, assuming river sand"),
        }
    }
}

/// A mix-design request as entered on the form or stored in a JSON file.
///
/// Labels are free text here; [`MixDesignRequest::validate`] turns them into
/// closed enumerations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixDesignRequest {
    pub strength_grade: Option<String>,
    pub slump: Option<f64>,
    pub aggregate_type: Option<String>,
    pub max_size: Option<f64>,
    pub nominal_size: Option<String>,
    pub fine_aggregate_type: Option<String>,
    pub fine_aggregate_grade: Option<String>,
    pub cement_strength_28d: Option<f64>,
    pub fly_ash_grade: Option<String>,
    pub fly_ash_dosage: f64,
    pub slag_powder_grade: Option<String>,
    pub slag_powder_dosage: f64,
    pub water_reducer_rate: f64,
    pub admixture_dosage: f64,
    pub concrete_density: Option<f64>,
    pub custom_sigma: Option<f64>,
    pub custom_water_base: Option<f64>,
    pub custom_fly_ash_factor: Option<f64>,
    pub custom_slag_powder_factor: Option<f64>,
    pub custom_sand_ratio: Option<f64>,
    pub custom_alpha_a: Option<f64>,
    pub custom_alpha_b: Option<f64>,
    #[serde(rename = "customWCR")]
    pub custom_wcr: Option<f64>,
}

/// Validated, typed input to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct MixDesignInput {
    pub strength_grade: StrengthGrade,
    /// mm
    pub slump: f64,
    pub aggregate: AggregateKind,
    /// Maximum nominal size of the coarse aggregate (mm)
    pub max_size: f64,
    pub fine_aggregate: FineAggregate,
    /// Measured 28-day cement strength (MPa)
    pub cement_strength: f64,
    pub fly_ash: Supplement<FlyAshGrade>,
    pub slag_powder: Supplement<SlagPowderGrade>,
    /// Water-reduction rate of the water reducer (%)
    pub water_reducer_rate: f64,
    /// Admixture dosage (% of binder mass)
    pub admixture_dosage: f64,
    pub concrete_density: f64,
    pub overrides: Overrides,
    /// Fallbacks already applied while normalising labels
    pub fallbacks: Vec<Fallback>,
}

/// Per-cubic-metre material bill (kg/m³)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MixProportions {
    pub water: f64,
    pub cement: f64,
    pub fly_ash: f64,
    pub slag_powder: f64,
    pub admixture: f64,
    pub sand: f64,
    pub stone: f64,
}

impl MixProportions {
    pub fn binder(&self) -> f64 {
        self.cement + self.fly_ash + self.slag_powder
    }

    pub fn total(&self) -> f64 {
        self.water + self.binder() + self.admixture + self.sand + self.stone
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixDetails {
    pub sigma: f64,
    pub fly_ash_factor: f64,
    pub slag_powder_factor: f64,
    pub aggregate_total: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<Fallback>,
}

/// Result of the standards-based calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MixDesignResult {
    pub strength_grade: String,
    /// fcu,0 rounded to 1 decimal for display
    pub config_strength: f64,
    pub binder_strength: f64,
    pub wcr: f64,
    pub water_base: f64,
    pub water_actual: f64,
    pub binder_total: f64,
    pub sand_ratio: f64,
    #[serde(flatten)]
    pub proportions: MixProportions,
    pub details: MixDetails,
}

/// Result returned by the recommendation workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(flatten)]
    pub proportions: MixProportions,
    pub wcr: f64,
    pub sand_ratio: f64,
    pub strength_grade: String,
    pub notes: String,
    pub referenced_standards: Vec<String>,
}

/// Either calculation path, seen through the common proportions shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum MixOutcome {
    Standard(MixDesignResult),
    Recommended(Recommendation),
}

impl MixOutcome {
    pub fn proportions(&self) -> &MixProportions {
        match self {
            MixOutcome::Standard(r) => &r.proportions,
            MixOutcome::Recommended(r) => &r.proportions,
        }
    }

    pub fn wcr(&self) -> f64 {
        match self {
            MixOutcome::Standard(r) => r.wcr,
            MixOutcome::Recommended(r) => r.wcr,
        }
    }

    pub fn strength_grade(&self) -> &str {
        match self {
            MixOutcome::Standard(r) => &r.strength_grade,
            MixOutcome::Recommended(r) => &r.strength_grade,
        }
    }

    /// Mode tag stored alongside history rows
    pub fn mode(&self) -> &'static str {
        match self {
            MixOutcome::Standard(_) => "STD",
            MixOutcome::Recommended(_) => "AI",
        }
    }
}
