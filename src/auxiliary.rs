//! Side calculators used at the plant: sand-ratio check, admixture dose and
//! trial-batch scaling

use serde::Serialize;

use crate::interpolate::round_to;
use crate::models::MixProportions;

/// Common lab batch volumes (m³)
pub const QUICK_VOLUMES: [(f64, &str); 4] = [
    (0.015, "15 L test cubes"),
    (0.020, "20 L small sample"),
    (0.030, "30 L standard"),
    (0.050, "50 L large sample"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SandRatioBand {
    VeryLow,
    Low,
    Optimal,
    High,
    VeryHigh,
}

impl SandRatioBand {
    pub fn classify(ratio: f64) -> Self {
        if ratio < 30.0 {
            SandRatioBand::VeryLow
        } else if ratio < 36.0 {
            SandRatioBand::Low
        } else if ratio <= 42.0 {
            SandRatioBand::Optimal
        } else if ratio <= 48.0 {
            SandRatioBand::High
        } else {
            SandRatioBand::VeryHigh
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SandRatioBand::VeryLow => "过低 (very low)",
            SandRatioBand::Low => "偏低 (low)",
            SandRatioBand::Optimal => "适中 (optimal)",
            SandRatioBand::High => "偏高 (high)",
            SandRatioBand::VeryHigh => "过高 (very high)",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            SandRatioBand::VeryLow => "poor cohesion, prone to segregation and bleeding; hard to pump",
            SandRatioBand::Low => "high aggregate voids; suits paving or low-slump concrete",
            SandRatioBand::Optimal => "typical range for pumped concrete (36-42 %)",
            SandRatioBand::High => "suits high-strength, self-compacting or fine-stone concrete",
            SandRatioBand::VeryHigh => "raises water and binder demand; expect drying shrinkage cracks",
        }
    }
}

/// Sand ratio (%) of an existing mix, 2 decimals. `None` when there is no
/// aggregate at all.
pub fn sand_ratio_of(sand: f64, stone: f64) -> Option<f64> {
    let total = sand + stone;
    if total.is_nan() || total <= 0.0 {
        return None;
    }
    Some(round_to(sand / total * 100.0, 2))
}

/// Admixture mass (kg) for a binder mass and dosage in percent
pub fn admixture_mass(binder: f64, dosage: f64) -> f64 {
    binder * dosage / 100.0
}

/// Mass of liquid product that delivers `mass` of solids at `solid_content` %.
pub fn liquid_admixture_mass(mass: f64, solid_content: f64) -> Option<f64> {
    if solid_content > 0.0 {
        Some(mass * 100.0 / solid_content)
    } else {
        None
    }
}

/// A per-cubic-metre mix scaled to a lab batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBatch {
    /// m³
    pub volume: f64,
    pub masses: MixProportions,
    pub total: f64,
}

pub fn trial_batch(mix: &MixProportions, volume: f64) -> TrialBatch {
    let masses = MixProportions {
        water: mix.water * volume,
        cement: mix.cement * volume,
        fly_ash: mix.fly_ash * volume,
        slag_powder: mix.slag_powder * volume,
        admixture: mix.admixture * volume,
        sand: mix.sand * volume,
        stone: mix.stone * volume,
    };
    TrialBatch {
        volume,
        masses,
        total: masses.total(),
    }
}

impl std::fmt::Display for TrialBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Trial batch {:.1} L ===", self.volume * 1000.0)?;
        let m = &self.masses;
        for (name, mass) in [
            ("Water", m.water),
            ("Cement", m.cement),
            ("Fly ash", m.fly_ash),
            ("Slag powder", m.slag_powder),
            ("Sand", m.sand),
            ("Stone", m.stone),
        ] {
            writeln!(f, "  {:<12} {:>9.2} kg", name, mass)?;
        }
        writeln!(
            f,
            "  {:<12} {:>9.3} kg ({:.0} g)",
            "Admixture",
            m.admixture,
            m.admixture * 1000.0
        )?;
        writeln!(f, "  {:<12} {:>9.2} kg", "Total", self.total)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn sand_ratio_of_existing_mix() {
        assert_eq!(sand_ratio_of(684.0, 1210.0), Some(36.11));
        assert_eq!(sand_ratio_of(0.0, 0.0), None);
        assert_eq!(sand_ratio_of(f64::NAN, 10.0), None);
    }

    #[test]
    fn band_edges() {
        assert_eq!(SandRatioBand::classify(29.99), SandRatioBand::VeryLow);
        assert_eq!(SandRatioBand::classify(30.0), SandRatioBand::Low);
        assert_eq!(SandRatioBand::classify(36.0), SandRatioBand::Optimal);
        assert_eq!(SandRatioBand::classify(42.0), SandRatioBand::Optimal);
        assert_eq!(SandRatioBand::classify(48.0), SandRatioBand::High);
        assert_eq!(SandRatioBand::classify(48.01), SandRatioBand::VeryHigh);
    }

    #[test]
    fn admixture_dose_and_liquid_conversion() {
        assert_relative_eq!(admixture_mass(300.0, 1.5), 4.5);
        assert_relative_eq!(liquid_admixture_mass(4.5, 10.0).unwrap(), 45.0);
        assert_eq!(liquid_admixture_mass(4.5, 0.0), None);
    }

    #[test]
    fn trial_batch_scales_every_component() {
        let mix = MixProportions {
            water: 166.0,
            cement: 340.0,
            fly_ash: 0.0,
            slag_powder: 0.0,
            admixture: 6.8,
            sand: 684.0,
            stone: 1210.0,
        };
        let batch = trial_batch(&mix, 0.030);
        assert_relative_eq!(batch.masses.cement, 10.2, epsilon = 1e-9);
        assert_relative_eq!(batch.masses.admixture, 0.204, epsilon = 1e-9);
        assert_relative_eq!(batch.total, mix.total() * 0.030, epsilon = 1e-9);
    }

    #[test]
    fn quick_volumes_are_ascending() {
        assert!(QUICK_VOLUMES.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
