//! Client for the remote mix-recommendation workflow
//!
//! One blocking POST per recommendation, no retry. The workflow answers
//! with free-form JSON whose result text may be nested under one of several
//! keys; [`parse_workflow_response`] digs the mix out of it.

use std::time::Duration;

use clap::ValueEnum;
use log::{debug, info};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use crate::models::{MixDesignRequest, MixProportions, Recommendation};

pub const DEFAULT_WORKFLOW_PATH: &str = "/jetopcms/ks/DifyWorkflowHandler.ashx";
pub const DEFAULT_WORKFLOW_ID: &str = "cba3740e-cf84-261d-ed20-6768da4948dc";
pub const DEFAULT_REGION: &str = "通用地区";

const SIMPLE_QUERY: &str = "请根据提供的简单参数计算混凝土配合比";
const DETAILED_QUERY: &str = "请根据提供的详细原材料参数计算混凝土配合比";

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("workflow request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("workflow returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse workflow result: {0}")]
    Parse(String),

    #[error("workflow result is missing {}", .0.join(", "))]
    Incomplete(Vec<&'static str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Season {
    Standard,
    Summer,
    Winter,
}

impl Season {
    pub fn label(self) -> &'static str {
        match self {
            Season::Standard => "常温 (春秋)",
            Season::Summer => "夏季 (高温)",
            Season::Winter => "冬季 (低温)",
        }
    }
}

/// Slump classes offered by the quick recommendation form
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlumpClass {
    Low,
    Medium,
    High,
    Pump,
}

impl SlumpClass {
    pub fn label(self) -> &'static str {
        match self {
            SlumpClass::Low => "10-30mm",
            SlumpClass::Medium => "30-50mm",
            SlumpClass::High => "50-90mm",
            SlumpClass::Pump => "160-200mm",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecommendationQuery {
    /// A handful of headline parameters
    Simple {
        grade: String,
        slump: SlumpClass,
        max_aggregate_size: f64,
        use_fly_ash: bool,
        region: Option<String>,
        season: Season,
    },
    /// The full calculation form
    Detailed {
        request: MixDesignRequest,
        region: Option<String>,
        season: Season,
    },
}

impl RecommendationQuery {
    pub fn query_text(&self) -> &'static str {
        match self {
            RecommendationQuery::Simple { .. } => SIMPLE_QUERY,
            RecommendationQuery::Detailed { .. } => DETAILED_QUERY,
        }
    }

    pub fn inputs(&self) -> Result<Value, WorkflowError> {
        let region = |r: &Option<String>| {
            r.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_REGION)
                .to_string()
        };
        match self {
            RecommendationQuery::Simple {
                grade,
                slump,
                max_aggregate_size,
                use_fly_ash,
                region: r,
                season,
            } => Ok(json!({
                "designType": "simple",
                "grade": grade,
                "slump": slump.label(),
                "maxAggregateSize": max_aggregate_size,
                "useFlyAsh": use_fly_ash,
                "region": region(r),
                "season": season.label(),
            })),
            RecommendationQuery::Detailed {
                request,
                region: r,
                season,
            } => {
                let form = serde_json::to_value(request)
                    .map_err(|e| WorkflowError::Parse(e.to_string()))?;
                Ok(json!({
                    "designType": "detailed",
                    "designParameters": {
                        "strengthGrade": request.strength_grade,
                        "slump": request.slump,
                        "concreteDensity": request
                            .concrete_density
                            .unwrap_or(crate::models::DEFAULT_CONCRETE_DENSITY),
                        "region": region(r),
                        "season": season.label(),
                    },
                    "request": form,
                }))
            }
        }
    }
}

/// Request body expected by the workflow handler
pub fn build_payload(workflow_id: &str, query: &RecommendationQuery) -> Result<Value, WorkflowError> {
    Ok(json!({
        "workflow_id": workflow_id,
        "inputs": query.inputs()?,
        "query": query.query_text(),
        "stream": false,
        "conversation_id": "",
        "files": [],
        "http_method": "POST",
    }))
}

/// Full handler URL for a server base such as `https://plant.example.com`.
/// A URL that already names the handler is used as given.
pub fn endpoint(base: &str) -> String {
    let base = base.trim();
    if base.ends_with(".ashx") {
        base.to_string()
    } else {
        format!("{}{}", base.trim_end_matches('/'), DEFAULT_WORKFLOW_PATH)
    }
}

pub struct WorkflowClient {
    url: String,
    workflow_id: String,
    client: Client,
}

impl WorkflowClient {
    pub fn new(url: &str, workflow_id: &str, timeout: Duration) -> Result<Self, WorkflowError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            workflow_id: workflow_id.to_string(),
            client,
        })
    }

    pub fn recommend(&self, query: &RecommendationQuery) -> Result<Recommendation, WorkflowError> {
        let payload = build_payload(&self.workflow_id, query)?;
        info!("Requesting recommendation from {}", self.url);
        debug!("Payload: {}", payload);

        let response = self.client.post(&self.url).json(&payload).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(WorkflowError::Status {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        let data: Value = response.json()?;
        parse_workflow_response(&data)
    }
}

/// Prefer the `error.message` of a JSON error body, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.to_string())
}

/// First non-empty field among `keys`, as text.
fn field_text(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match data.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        v @ Value::Object(_) => Some(v.to_string()),
        _ => None,
    })
}

fn result_text(data: &Value) -> String {
    let text = field_text(data, &["output", "result", "response"]).unwrap_or_else(|| data.to_string());
    if text.contains('{') {
        return text;
    }
    field_text(data, &["content", "message", "answer"]).unwrap_or_else(|| data.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRecommendation {
    cement: f64,
    water: f64,
    sand: f64,
    stone: f64,
    admixture: f64,
    fly_ash: f64,
    #[serde(alias = "slagPowder")]
    slag: f64,
    wcr: f64,
    sand_ratio: f64,
    strength_grade: String,
    notes: String,
    referenced_standards: Vec<String>,
}

/// Extract the recommended mix from a workflow response body.
pub fn parse_workflow_response(data: &Value) -> Result<Recommendation, WorkflowError> {
    let text = result_text(data);
    let raw: RawRecommendation =
        serde_json::from_str(&text).map_err(|e| WorkflowError::Parse(format!("{e}: {text}")))?;

    let missing: Vec<&'static str> = [
        ("cement", raw.cement),
        ("water", raw.water),
        ("sand", raw.sand),
        ("stone", raw.stone),
    ]
    .into_iter()
    .filter(|(_, v)| *v == 0.0)
    .map(|(name, _)| name)
    .collect();
    if !missing.is_empty() {
        return Err(WorkflowError::Incomplete(missing));
    }

    Ok(Recommendation {
        proportions: MixProportions {
            water: raw.water,
            cement: raw.cement,
            fly_ash: raw.fly_ash,
            slag_powder: raw.slag,
            admixture: raw.admixture,
            sand: raw.sand,
            stone: raw.stone,
        },
        wcr: raw.wcr,
        sand_ratio: raw.sand_ratio,
        strength_grade: raw.strength_grade,
        notes: raw.notes,
        referenced_standards: raw.referenced_standards,
    })
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Recommended Mix {} ===", self.strength_grade)?;
        writeln!(f, "Water-binder ratio:  {}", self.wcr)?;
        writeln!(f, "Sand ratio:          {} %", self.sand_ratio)?;
        writeln!(f)?;
        writeln!(f, "Materials (kg/m³):")?;
        write!(f, "{}", crate::calculator::format_proportions(&self.proportions))?;
        if !self.referenced_standards.is_empty() {
            writeln!(f)?;
            writeln!(f, "Standards: {}", self.referenced_standards.join(", "))?;
        }
        if !self.notes.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.notes)?;
        }
        Ok(())
    }
}
