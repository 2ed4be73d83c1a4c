//! Normalisation of free-text labels into closed enumerations
//!
//! The legacy form stores labels such as `天然砂（河砂）` or `中砂（3.0-2.3）`
//! and matches them by substring. Here every accepted spelling is listed
//! explicitly and anything else is rejected, so a typo can no longer turn an
//! adjustment into a silent no-op.

use std::str::FromStr;

use regex::Regex;

use crate::error::MixError;
use crate::models::{
    AggregateKind, FineAggregateType, FlyAshGrade, SandGrade, SlagPowderGrade, StrengthGrade,
};
use crate::tables::{self, Gradation};

fn invalid(field: &'static str, value: &str) -> MixError {
    MixError::InvalidLabel {
        field,
        value: value.to_string(),
    }
}

impl FromStr for StrengthGrade {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MixError::MissingField("strengthGrade"));
        }
        let re = Regex::new(r"^[Cc]\s*(\d{1,3})$")?;
        let cap = re
            .captures(trimmed)
            .ok_or_else(|| invalid("strength grade", s))?;
        let value: u32 = cap[1].parse().map_err(|_| invalid("strength grade", s))?;
        if value == 0 {
            return Err(invalid("strength grade", s));
        }
        Ok(StrengthGrade(value))
    }
}

impl FromStr for AggregateKind {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "碎石" | "crushed" => Ok(AggregateKind::Crushed),
            "卵石" | "gravel" => Ok(AggregateKind::Gravel),
            "" => Err(MixError::MissingField("aggregateType")),
            _ => Err(invalid("coarse aggregate", s)),
        }
    }
}

impl FromStr for FineAggregateType {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // 天然砂（河砂）, 天然砂(河砂) or just 河砂
        let natural = Regex::new(r"^(?:天然砂\s*[（(]\s*)?(河砂|海砂|山砂)\s*[）)]?$")?;
        if let Some(cap) = natural.captures(trimmed) {
            return Ok(match &cap[1] {
                "河砂" => FineAggregateType::NaturalRiver,
                "海砂" => FineAggregateType::NaturalSea,
                _ => FineAggregateType::NaturalMountain,
            });
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "机制砂" | "人工砂" | "manufactured" | "artificial" => {
                Ok(FineAggregateType::Manufactured)
            }
            "混合砂" | "mixed" => Ok(FineAggregateType::Mixed),
            "river" => Ok(FineAggregateType::NaturalRiver),
            "sea" => Ok(FineAggregateType::NaturalSea),
            "mountain" => Ok(FineAggregateType::NaturalMountain),
            _ => Err(invalid("fine aggregate type", s)),
        }
    }
}

impl FromStr for SandGrade {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Grade name, optionally followed by its fineness-modulus range
        let re = Regex::new(r"^(特细砂|细砂|中砂|粗砂)\s*(?:[（(][\d.\s-]+[）)])?$")?;
        if let Some(cap) = re.captures(trimmed) {
            return Ok(match &cap[1] {
                "粗砂" => SandGrade::Coarse,
                "中砂" => SandGrade::Medium,
                "细砂" => SandGrade::Fine,
                _ => SandGrade::VeryFine,
            });
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "coarse" => Ok(SandGrade::Coarse),
            "medium" => Ok(SandGrade::Medium),
            "fine" => Ok(SandGrade::Fine),
            "very-fine" | "very fine" | "very_fine" => Ok(SandGrade::VeryFine),
            _ => Err(invalid("fine aggregate grade", s)),
        }
    }
}

impl FromStr for FlyAshGrade {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^(III|II|I)\s*级?$")?;
        let upper = s.trim().to_ascii_uppercase();
        match re.captures(&upper).map(|cap| cap[1].to_string()).as_deref() {
            Some("I") => Ok(FlyAshGrade::I),
            Some("II") => Ok(FlyAshGrade::II),
            Some("III") => Ok(FlyAshGrade::III),
            _ => Err(invalid("fly-ash grade", s)),
        }
    }
}

impl FromStr for SlagPowderGrade {
    type Err = MixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let re = Regex::new(r"^S\s*(75|95|105|115)$")?;
        let upper = s.trim().to_ascii_uppercase();
        match re.captures(&upper).map(|cap| cap[1].to_string()).as_deref() {
            Some("75") => Ok(SlagPowderGrade::S75),
            Some("95") => Ok(SlagPowderGrade::S95),
            Some("105") => Ok(SlagPowderGrade::S105),
            Some("115") => Ok(SlagPowderGrade::S115),
            _ => Err(invalid("slag-powder grade", s)),
        }
    }
}

/// Gradation and maximum nominal size (mm) for a nominal size label such
/// as `5-20`.
pub fn nominal_size(label: &str) -> Result<(Gradation, f64), MixError> {
    let re = Regex::new(r"^(\d+(?:\.\d+)?)\s*[-~～]\s*(\d+(?:\.\d+)?)\s*(?:mm)?$")?;
    let trimmed = label.trim();
    let cap = re
        .captures(trimmed)
        .ok_or_else(|| invalid("nominal size", label))?;
    let normalized = format!("{}-{}", &cap[1], &cap[2]);
    tables::NOMINAL_SIZES
        .iter()
        .find(|(name, _, _)| *name == normalized)
        .map(|(_, gradation, max)| (*gradation, *max))
        .ok_or_else(|| invalid("nominal size", label))
}

/// Maximum nominal size (mm) for a nominal size label.
pub fn max_nominal_size(label: &str) -> Result<f64, MixError> {
    nominal_size(label).map(|(_, max)| max)
}
