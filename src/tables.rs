//! Reference tables from JGJ 55-2011 and the material-grade standards
//!
//! All tables are immutable statics; every lookup is a pure function of its
//! arguments.

use crate::models::{AggregateKind, FineAggregateType, FlyAshGrade, SandGrade, SlagPowderGrade, StrengthGrade};

/// σ used when a grade is missing from [`STANDARD_DEVIATION`]
pub const DEFAULT_SIGMA: f64 = 5.0;

/// Strength standard deviation σ (MPa), Table 4.0.2
pub const STANDARD_DEVIATION: [(u32, f64); 10] = [
    (15, 4.0),
    (20, 4.0),
    (25, 5.0),
    (30, 5.0),
    (35, 5.0),
    (40, 5.0),
    (45, 5.0),
    (50, 6.0),
    (55, 6.0),
    (60, 6.0),
];

pub fn standard_deviation(grade: StrengthGrade) -> Option<f64> {
    STANDARD_DEVIATION
        .iter()
        .find(|(g, _)| *g == grade.0)
        .map(|(_, sigma)| *sigma)
}

/// Maximum nominal sizes (mm) shared by the water-demand and sand-ratio tables
pub const SIZE_KEYS: [f64; 6] = [10.0, 16.0, 20.0, 25.0, 31.5, 40.0];

/// Slump keys (mm) of the water-demand tables
pub const SLUMP_KEYS: [f64; 5] = [10.0, 30.0, 50.0, 70.0, 90.0];

/// Water-binder ratio keys of the sand-ratio table
pub const WCR_KEYS: [f64; 4] = [0.4, 0.5, 0.6, 0.7];

/// Base water demand (kg/m³) for crushed stone, rows by [`SIZE_KEYS`],
/// columns by [`SLUMP_KEYS`].
///
/// The 20 mm / 90 mm cell reads 215 where the row progression would give 190.
/// It is kept as published until checked against the standard.
pub const WATER_DEMAND_CRUSHED: [[f64; 5]; 6] = [
    [195.0, 200.0, 205.0, 210.0, 215.0],
    [180.0, 185.0, 190.0, 195.0, 200.0],
    [170.0, 175.0, 180.0, 185.0, 215.0],
    [160.0, 165.0, 170.0, 175.0, 180.0],
    [150.0, 155.0, 160.0, 165.0, 170.0],
    [140.0, 145.0, 150.0, 155.0, 160.0],
];

/// Base water demand (kg/m³) for gravel
pub const WATER_DEMAND_GRAVEL: [[f64; 5]; 6] = [
    [185.0, 190.0, 195.0, 200.0, 205.0],
    [170.0, 175.0, 180.0, 185.0, 190.0],
    [160.0, 165.0, 170.0, 175.0, 180.0],
    [150.0, 155.0, 160.0, 165.0, 170.0],
    [140.0, 145.0, 150.0, 155.0, 160.0],
    [130.0, 135.0, 140.0, 145.0, 150.0],
];

pub fn water_demand_table(kind: AggregateKind) -> &'static [[f64; 5]; 6] {
    match kind {
        AggregateKind::Crushed => &WATER_DEMAND_CRUSHED,
        AggregateKind::Gravel => &WATER_DEMAND_GRAVEL,
    }
}

/// Sand ratio range (%), Table 5.4.2
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioRange {
    pub min: f64,
    pub max: f64,
}

impl RatioRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Rows by [`SIZE_KEYS`], columns by [`WCR_KEYS`]
pub const SAND_RATIO: [[RatioRange; 4]; 6] = [
    [
        RatioRange::new(26.0, 32.0),
        RatioRange::new(30.0, 35.0),
        RatioRange::new(33.0, 38.0),
        RatioRange::new(36.0, 41.0),
    ],
    [
        RatioRange::new(25.0, 31.0),
        RatioRange::new(29.0, 34.0),
        RatioRange::new(32.0, 37.0),
        RatioRange::new(35.0, 40.0),
    ],
    [
        RatioRange::new(24.0, 30.0),
        RatioRange::new(28.0, 33.0),
        RatioRange::new(31.0, 36.0),
        RatioRange::new(34.0, 39.0),
    ],
    [
        RatioRange::new(24.0, 30.0),
        RatioRange::new(27.0, 32.0),
        RatioRange::new(30.0, 35.0),
        RatioRange::new(33.0, 38.0),
    ],
    [
        RatioRange::new(23.0, 29.0),
        RatioRange::new(26.0, 31.0),
        RatioRange::new(29.0, 34.0),
        RatioRange::new(32.0, 37.0),
    ],
    [
        RatioRange::new(22.0, 28.0),
        RatioRange::new(25.0, 30.0),
        RatioRange::new(28.0, 33.0),
        RatioRange::new(31.0, 36.0),
    ],
];

// ---------------------------------------------------------------------------
// Material limits (GB/T 1596, GB/T 18046, GB 8076, GB/T 14684)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyAshLimits {
    /// Minimum strength-activity index (%)
    pub strength_activity_min: f64,
    /// Maximum water-demand ratio (%)
    pub water_demand_ratio_max: f64,
    /// Maximum loss on ignition (%)
    pub loss_on_ignition_max: f64,
}

pub fn fly_ash_limits(grade: FlyAshGrade) -> FlyAshLimits {
    let (strength_activity_min, water_demand_ratio_max, loss_on_ignition_max) = match grade {
        FlyAshGrade::I => (70.0, 105.0, 5.0),
        FlyAshGrade::II => (60.0, 115.0, 8.0),
        FlyAshGrade::III => (50.0, 125.0, 15.0),
    };
    FlyAshLimits {
        strength_activity_min,
        water_demand_ratio_max,
        loss_on_ignition_max,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlagPowderLimits {
    pub strength_activity_min: f64,
    /// Open-ended for S115
    pub strength_activity_max: Option<f64>,
    /// Minimum specific surface area (m²/kg)
    pub specific_surface_min: f64,
    pub activity_description: &'static str,
}

pub fn slag_powder_limits(grade: SlagPowderGrade) -> SlagPowderLimits {
    match grade {
        SlagPowderGrade::S75 => SlagPowderLimits {
            strength_activity_min: 75.0,
            strength_activity_max: Some(90.0),
            specific_surface_min: 350.0,
            activity_description: "75级（28d活性指数75%-90%）",
        },
        SlagPowderGrade::S95 => SlagPowderLimits {
            strength_activity_min: 95.0,
            strength_activity_max: Some(105.0),
            specific_surface_min: 400.0,
            activity_description: "95级（28d活性指数95%-105%）",
        },
        SlagPowderGrade::S105 => SlagPowderLimits {
            strength_activity_min: 105.0,
            strength_activity_max: Some(115.0),
            specific_surface_min: 450.0,
            activity_description: "105级（28d活性指数105%-115%）",
        },
        SlagPowderGrade::S115 => SlagPowderLimits {
            strength_activity_min: 115.0,
            strength_activity_max: None,
            specific_surface_min: 450.0,
            activity_description: "115级（28d活性指数≥115%）",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaterReducerType {
    HighPerformance,
    HighEfficiency,
    Normal,
    Retarding,
    AirEntraining,
}

impl WaterReducerType {
    pub const ALL: [WaterReducerType; 5] = [
        WaterReducerType::HighPerformance,
        WaterReducerType::HighEfficiency,
        WaterReducerType::Normal,
        WaterReducerType::Retarding,
        WaterReducerType::AirEntraining,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WaterReducerType::HighPerformance => "高性能减水剂",
            WaterReducerType::HighEfficiency => "高效减水剂",
            WaterReducerType::Normal => "普通减水剂",
            WaterReducerType::Retarding => "缓凝减水剂",
            WaterReducerType::AirEntraining => "引气减水剂",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == trimmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterReducerLimits {
    /// Minimum water-reduction rate (%)
    pub reduction_rate_min: f64,
    /// Recommended dosage range (% of binder)
    pub dosage: RatioRange,
}

pub fn water_reducer_limits(kind: WaterReducerType) -> WaterReducerLimits {
    match kind {
        WaterReducerType::HighPerformance => WaterReducerLimits {
            reduction_rate_min: 25.0,
            dosage: RatioRange::new(0.5, 2.0),
        },
        WaterReducerType::HighEfficiency => WaterReducerLimits {
            reduction_rate_min: 20.0,
            dosage: RatioRange::new(0.5, 1.5),
        },
        WaterReducerType::Normal | WaterReducerType::Retarding | WaterReducerType::AirEntraining => {
            WaterReducerLimits {
                reduction_rate_min: 8.0,
                dosage: RatioRange::new(0.2, 0.5),
            }
        }
    }
}

/// Product categories offered under each water-reducer type
pub fn water_reducer_categories(kind: WaterReducerType) -> &'static [&'static str] {
    match kind {
        WaterReducerType::HighPerformance => &["聚羧酸系", "萘系", "氨基磺酸盐系"],
        WaterReducerType::HighEfficiency => &["萘系", "密胺系", "氨基磺酸盐系"],
        WaterReducerType::Normal => &["木质素磺酸盐类"],
        WaterReducerType::Retarding => &["木质素磺酸盐类", "糖钙类"],
        WaterReducerType::AirEntraining => &["松香类", "烷基苯磺酸盐类"],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtherAdmixtureType {
    Retarder,
    Accelerator,
    AirEntrainer,
    Expansive,
    Waterproof,
    Antifreeze,
}

impl OtherAdmixtureType {
    pub const ALL: [OtherAdmixtureType; 6] = [
        OtherAdmixtureType::Retarder,
        OtherAdmixtureType::Accelerator,
        OtherAdmixtureType::AirEntrainer,
        OtherAdmixtureType::Expansive,
        OtherAdmixtureType::Waterproof,
        OtherAdmixtureType::Antifreeze,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OtherAdmixtureType::Retarder => "缓凝剂",
            OtherAdmixtureType::Accelerator => "早强剂",
            OtherAdmixtureType::AirEntrainer => "引气剂",
            OtherAdmixtureType::Expansive => "膨胀剂",
            OtherAdmixtureType::Waterproof => "防水剂",
            OtherAdmixtureType::Antifreeze => "防冻剂",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == trimmed)
    }

    /// Product models on the form; `其他` stands for any other model
    pub fn models(self) -> &'static [&'static str] {
        match self {
            OtherAdmixtureType::Retarder => &["HZ-1", "HZ-2", "HZ-3", "其他"],
            OtherAdmixtureType::Accelerator => &["ZS-1", "ZS-2", "ZS-3", "其他"],
            OtherAdmixtureType::AirEntrainer => &["YQ-1", "YQ-2", "YQ-3", "其他"],
            OtherAdmixtureType::Expansive => &["PN-1", "PN-2", "PN-3", "其他"],
            OtherAdmixtureType::Waterproof => &["FS-1", "FS-2", "FS-3", "其他"],
            OtherAdmixtureType::Antifreeze => &["FD-1", "FD-2", "FD-3", "其他"],
        }
    }

    /// Recommended dosage (% of binder)
    pub fn dosage_range(self) -> RatioRange {
        match self {
            OtherAdmixtureType::Retarder => RatioRange::new(0.1, 0.5),
            OtherAdmixtureType::Accelerator => RatioRange::new(0.5, 3.0),
            OtherAdmixtureType::AirEntrainer => RatioRange::new(0.005, 0.05),
            OtherAdmixtureType::Expansive => RatioRange::new(6.0, 12.0),
            OtherAdmixtureType::Waterproof | OtherAdmixtureType::Antifreeze => {
                RatioRange::new(2.0, 5.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OtherAdditiveType {
    SilicaFume,
    GroundSlag,
    LimestonePowder,
    Metakaolin,
}

impl OtherAdditiveType {
    pub const ALL: [OtherAdditiveType; 4] = [
        OtherAdditiveType::SilicaFume,
        OtherAdditiveType::GroundSlag,
        OtherAdditiveType::LimestonePowder,
        OtherAdditiveType::Metakaolin,
    ];

    pub fn label(self) -> &'static str {
        match self {
            OtherAdditiveType::SilicaFume => "硅灰",
            OtherAdditiveType::GroundSlag => "磨细矿渣粉",
            OtherAdditiveType::LimestonePowder => "石灰石粉",
            OtherAdditiveType::Metakaolin => "偏高岭土",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == trimmed)
    }

    pub fn specifications(self) -> &'static [&'static str] {
        match self {
            OtherAdditiveType::SilicaFume => &["SF-85", "SF-90", "SF-95", "其他"],
            OtherAdditiveType::GroundSlag => &["GS-75", "GS-95", "GS-105", "其他"],
            OtherAdditiveType::LimestonePowder => &["LS-200", "LS-300", "LS-400", "其他"],
            OtherAdditiveType::Metakaolin => &["MK-600", "MK-800", "MK-1000", "其他"],
        }
    }

    /// Recommended dosage (% of binder)
    pub fn dosage_range(self) -> RatioRange {
        match self {
            OtherAdditiveType::SilicaFume => RatioRange::new(5.0, 10.0),
            OtherAdditiveType::GroundSlag => RatioRange::new(20.0, 50.0),
            OtherAdditiveType::LimestonePowder => RatioRange::new(5.0, 20.0),
            OtherAdditiveType::Metakaolin => RatioRange::new(5.0, 15.0),
        }
    }
}

/// Fineness modulus range for a sand grade
pub fn fineness_modulus_range(grade: SandGrade) -> RatioRange {
    match grade {
        SandGrade::Coarse => RatioRange::new(3.1, 3.7),
        SandGrade::Medium => RatioRange::new(2.3, 3.0),
        SandGrade::Fine => RatioRange::new(1.6, 2.2),
        SandGrade::VeryFine => RatioRange::new(0.7, 1.5),
    }
}

/// Sand grades that may be declared for a fine aggregate type
pub fn allowed_sand_grades(kind: FineAggregateType) -> &'static [SandGrade] {
    const ALL: [SandGrade; 4] = [
        SandGrade::Coarse,
        SandGrade::Medium,
        SandGrade::Fine,
        SandGrade::VeryFine,
    ];
    match kind {
        FineAggregateType::Manufactured => &ALL[..3],
        _ => &ALL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gradation {
    Continuous,
    Discontinuous,
}

impl Gradation {
    pub fn label(self) -> &'static str {
        match self {
            Gradation::Continuous => "连续粒级",
            Gradation::Discontinuous => "间断粒级",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "连续粒级" | "连续" | "continuous" => Some(Gradation::Continuous),
            "间断粒级" | "间断" | "discontinuous" => Some(Gradation::Discontinuous),
            _ => None,
        }
    }
}

/// Nominal size label, gradation and maximum nominal size (mm)
pub const NOMINAL_SIZES: [(&str, Gradation, f64); 11] = [
    ("5-10", Gradation::Continuous, 10.0),
    ("5-16", Gradation::Continuous, 16.0),
    ("5-20", Gradation::Continuous, 20.0),
    ("5-25", Gradation::Continuous, 25.0),
    ("5-31.5", Gradation::Continuous, 31.5),
    ("5-40", Gradation::Continuous, 40.0),
    ("10-20", Gradation::Discontinuous, 20.0),
    ("16-31.5", Gradation::Discontinuous, 31.5),
    ("20-40", Gradation::Discontinuous, 40.0),
    ("31.5-63", Gradation::Discontinuous, 63.0),
    ("40-80", Gradation::Discontinuous, 80.0),
];

/// Cement types and the strength classes offered for each
pub const CEMENT_GRADES: [(&str, &[&str]); 6] = [
    ("硅酸盐水泥", &["42.5", "42.5R", "52.5", "52.5R", "62.5", "62.5R"]),
    ("普通硅酸盐水泥", &["42.5", "42.5R", "52.5", "52.5R", "62.5", "62.5R"]),
    ("矿渣硅酸盐水泥", &["32.5", "32.5R", "42.5", "42.5R", "52.5", "52.5R"]),
    ("粉煤灰硅酸盐水泥", &["32.5", "32.5R", "42.5", "42.5R", "52.5", "52.5R"]),
    ("火山灰质硅酸盐水泥", &["32.5", "32.5R", "42.5", "42.5R", "52.5", "52.5R"]),
    ("复合硅酸盐水泥", &["42.5", "42.5R", "52.5", "52.5R"]),
];

pub fn cement_grades(cement_type: &str) -> Option<&'static [&'static str]> {
    let trimmed = cement_type.trim();
    CEMENT_GRADES
        .iter()
        .find(|(name, _)| *name == trimmed)
        .map(|(_, grades)| *grades)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_table_covers_listed_grades_only() {
        assert_eq!(standard_deviation(StrengthGrade(15)), Some(4.0));
        assert_eq!(standard_deviation(StrengthGrade(25)), Some(5.0));
        assert_eq!(standard_deviation(StrengthGrade(50)), Some(6.0));
        assert_eq!(standard_deviation(StrengthGrade(99)), None);
    }

    #[test]
    fn crushed_20mm_90mm_cell_is_kept_as_published() {
        // Row progression would give 190; the published value is 215.
        let row = &WATER_DEMAND_CRUSHED[2];
        assert_eq!(row[4], 215.0);
        assert_eq!(row[3] + 5.0, 190.0);
    }

    #[test]
    fn other_water_demand_rows_are_monotonic() {
        for table in [&WATER_DEMAND_CRUSHED, &WATER_DEMAND_GRAVEL] {
            for row in table.iter() {
                assert!(row.windows(2).all(|w| w[0] < w[1]));
            }
        }
        // Decreasing with size at every slump except the 20 mm / 90 mm quirk
        for col in 0..4 {
            assert!(WATER_DEMAND_CRUSHED.windows(2).all(|w| w[0][col] > w[1][col]));
        }
    }

    #[test]
    fn sand_ratio_midpoints() {
        assert_eq!(SAND_RATIO[2][0].midpoint(), 27.0);
        assert_eq!(SAND_RATIO[2][1].midpoint(), 30.5);
        assert_eq!(SAND_RATIO[5][3].midpoint(), 33.5);
    }

    #[test]
    fn composite_cement_has_no_low_grades() {
        let grades = cement_grades("复合硅酸盐水泥").unwrap();
        assert!(!grades.contains(&"32.5"));
        assert!(cement_grades("白水泥").is_none());
    }

    #[test]
    fn manufactured_sand_cannot_be_very_fine() {
        assert!(!allowed_sand_grades(FineAggregateType::Manufactured).contains(&SandGrade::VeryFine));
        assert!(allowed_sand_grades(FineAggregateType::NaturalSea).contains(&SandGrade::VeryFine));
    }

    #[test]
    fn naphthalene_is_offered_under_two_reducer_types() {
        assert!(water_reducer_categories(WaterReducerType::HighPerformance).contains(&"萘系"));
        assert!(water_reducer_categories(WaterReducerType::HighEfficiency).contains(&"萘系"));
        assert!(!water_reducer_categories(WaterReducerType::Normal).contains(&"萘系"));
    }

    #[test]
    fn every_other_material_lists_a_catch_all_model() {
        for kind in OtherAdmixtureType::ALL {
            assert_eq!(OtherAdmixtureType::from_label(kind.label()), Some(kind));
            assert!(kind.models().contains(&"其他"));
            assert!(kind.dosage_range().min < kind.dosage_range().max);
        }
        for kind in OtherAdditiveType::ALL {
            assert_eq!(OtherAdditiveType::from_label(kind.label()), Some(kind));
            assert!(kind.specifications().contains(&"其他"));
        }
        assert_eq!(OtherAdmixtureType::Retarder.dosage_range(), RatioRange::new(0.1, 0.5));
        assert_eq!(OtherAdditiveType::SilicaFume.dosage_range(), RatioRange::new(5.0, 10.0));
    }

    #[test]
    fn nominal_sizes_split_by_gradation() {
        let continuous = NOMINAL_SIZES
            .iter()
            .filter(|(_, g, _)| *g == Gradation::Continuous)
            .count();
        assert_eq!(continuous, 6);
        assert_eq!(Gradation::from_label(" 间断粒级 "), Some(Gradation::Discontinuous));
        assert_eq!(Gradation::from_label("Continuous"), Some(Gradation::Continuous));
        assert_eq!(Gradation::from_label("混合"), None);
    }
}
