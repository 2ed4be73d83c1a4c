//! Error taxonomy for the mix-design pipeline

use thiserror::Error;

/// Reasons a mix design is rejected.
///
/// Documented table fallbacks (unlisted strength grade, unknown fly-ash
/// grade, ...) are not errors; they are reported as
/// [`Fallback`](crate::models::Fallback) entries on the result instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MixError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("unrecognised {field} label `{value}`")]
    InvalidLabel { field: &'static str, value: String },

    #[error("{field} = {value} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error(
        "fly ash ({fly_ash}%) and slag powder ({slag_powder}%) leave no cement in the binder"
    )]
    BinderComposition { fly_ash: f64, slag_powder: f64 },

    #[error("water-binder ratio denominator is not positive (fcu,0 = {config_strength}, fb = {binder_strength})")]
    DegenerateRatio {
        config_strength: f64,
        binder_strength: f64,
    },

    #[error("water-binder ratio must be positive and finite, got {0}")]
    NonPositiveRatio(f64),

    #[error("density {density} kg/m³ leaves no room for aggregate ({aggregate} kg/m³)")]
    AggregateBudget { density: f64, aggregate: f64 },

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}
