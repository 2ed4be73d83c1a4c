//! Concrete Mix-Design Calculator
//!
//! JGJ 55-2011 mix proportioning for ready-mix technicians, with raw-material
//! checks, plant-side helper calculators and a local calculation history.

mod auxiliary;
mod batch;
mod calculator;
mod coefficients;
mod db;
mod error;
mod interpolate;
mod labels;
mod models;
mod sand_ratio;
mod tables;
mod validation;
mod water_demand;
mod workflow;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, info};
use rusqlite::Connection;
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::auxiliary::SandRatioBand;
use crate::models::{
    AggregateKind, FineAggregate, FineAggregateType, FlyAshGrade, MixDesignRequest, MixOutcome,
    MixProportions, SandGrade, SlagPowderGrade,
};
use crate::workflow::{RecommendationQuery, Season, SlumpClass, WorkflowClient};

#[derive(Parser)]
#[command(name = "mix-calculator")]
#[command(about = "JGJ 55-2011 concrete mix-design calculator")]
struct Cli {
    /// Path to the SQLite history database
    #[arg(short, long, global = true, env = "MIX_HISTORY_DB", default_value = "mix_history.db")]
    database: PathBuf,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    workflow: WorkflowArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WorkflowArgs {
    /// Recommendation server, or the full handler URL
    #[arg(long, global = true, env = "MIX_WORKFLOW_URL")]
    workflow_url: Option<String>,

    #[arg(long, global = true, env = "MIX_WORKFLOW_ID", default_value = workflow::DEFAULT_WORKFLOW_ID)]
    workflow_id: String,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "MIX_WORKFLOW_TIMEOUT", default_value = "60")]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Design a mix from a request file and/or flags
    Calc {
        /// JSON request (camelCase form fields)
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        form: FormArgs,

        /// Save the result to history
        #[arg(long)]
        save: bool,
    },

    /// Look up the base water demand (kg/m³)
    WaterDemand {
        /// 碎石 / crushed or 卵石 / gravel
        aggregate: String,
        /// Maximum aggregate size (mm)
        max_size: f64,
        /// Slump (mm)
        slump: f64,
        #[arg(long)]
        sand_grade: Option<String>,
    },

    /// Look up the recommended sand ratio (%)
    SandRatio {
        /// Water-binder ratio
        wcr: f64,
        max_size: f64,
        slump: f64,
        #[arg(long)]
        sand_type: Option<String>,
        #[arg(long)]
        sand_grade: Option<String>,
    },

    /// Show the fly-ash and slag-powder influence factors
    Factors {
        #[arg(long)]
        fly_ash_grade: Option<String>,
        #[arg(long, default_value = "0")]
        fly_ash: f64,
        #[arg(long)]
        slag_grade: Option<String>,
        #[arg(long, default_value = "0")]
        slag: f64,
    },

    /// Check raw-material test results against the product standards
    Check {
        /// JSON material sheet
        sheet: PathBuf,
    },

    /// Ask the recommendation workflow for a mix
    Recommend {
        /// Strength grade for a quick recommendation, e.g. C30
        grade: Option<String>,
        #[arg(long, value_enum, default_value = "pump")]
        slump: SlumpClass,
        #[arg(long, default_value = "25")]
        max_size: f64,
        #[arg(long)]
        fly_ash: bool,
        #[arg(long)]
        region: Option<String>,
        #[arg(long, value_enum, default_value = "standard")]
        season: Season,
        /// Send a full request file instead of the quick parameters
        #[arg(long)]
        detailed: Option<PathBuf>,
        #[arg(long)]
        save: bool,
    },

    /// Saved calculations
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Design every *.json request under a directory
    Batch {
        dir: PathBuf,
        #[arg(long)]
        save: bool,
    },

    /// Sand ratio of an existing mix and how it rates
    SandCheck {
        /// Sand (kg/m³)
        sand: f64,
        /// Stone (kg/m³)
        stone: f64,
    },

    /// Admixture mass for a binder mass and dosage
    Admixture {
        /// Binder (kg/m³)
        binder: f64,
        /// Dosage (% of binder)
        dosage: f64,
        /// Solid content of a liquid product (%)
        #[arg(long)]
        solid_content: Option<f64>,
    },

    /// Scale a mix to a lab trial batch
    Trial {
        /// Design this request file first
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Use a saved calculation
        #[arg(long)]
        from_history: Option<i64>,
        /// Batch volume (m³)
        #[arg(long, default_value = "0.03")]
        volume: f64,
        /// Print every standard lab volume
        #[arg(long)]
        quick: bool,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// Most recent calculations
    List {
        #[arg(short, long, default_value_t = db::DEFAULT_HISTORY_LIMIT)]
        limit: usize,
    },
    Show {
        id: i64,
    },
    Delete {
        id: i64,
    },
    Clear,
}

/// Form fields; each one given replaces the value from the request file.
#[derive(Args)]
struct FormArgs {
    #[arg(long)]
    grade: Option<String>,
    #[arg(long)]
    slump: Option<f64>,
    #[arg(long)]
    aggregate: Option<String>,
    #[arg(long)]
    max_size: Option<f64>,
    #[arg(long)]
    nominal_size: Option<String>,
    #[arg(long)]
    sand_type: Option<String>,
    #[arg(long)]
    sand_grade: Option<String>,
    /// Measured 28-day cement strength (MPa)
    #[arg(long)]
    cement_strength: Option<f64>,
    #[arg(long)]
    fly_ash_grade: Option<String>,
    #[arg(long)]
    fly_ash: Option<f64>,
    #[arg(long)]
    slag_grade: Option<String>,
    #[arg(long)]
    slag: Option<f64>,
    /// Water-reduction rate (%)
    #[arg(long)]
    reducer: Option<f64>,
    /// Admixture dosage (% of binder)
    #[arg(long)]
    admixture: Option<f64>,
    #[arg(long)]
    density: Option<f64>,
}

impl FormArgs {
    fn apply(self, request: &mut MixDesignRequest) {
        if self.grade.is_some() {
            request.strength_grade = self.grade;
        }
        if self.slump.is_some() {
            request.slump = self.slump;
        }
        if self.aggregate.is_some() {
            request.aggregate_type = self.aggregate;
        }
        if self.max_size.is_some() {
            request.max_size = self.max_size;
        }
        if self.nominal_size.is_some() {
            request.nominal_size = self.nominal_size;
        }
        if self.sand_type.is_some() {
            request.fine_aggregate_type = self.sand_type;
        }
        if self.sand_grade.is_some() {
            request.fine_aggregate_grade = self.sand_grade;
        }
        if self.cement_strength.is_some() {
            request.cement_strength_28d = self.cement_strength;
        }
        if self.fly_ash_grade.is_some() {
            request.fly_ash_grade = self.fly_ash_grade;
        }
        if let Some(dosage) = self.fly_ash {
            request.fly_ash_dosage = dosage;
        }
        if self.slag_grade.is_some() {
            request.slag_powder_grade = self.slag_grade;
        }
        if let Some(dosage) = self.slag {
            request.slag_powder_dosage = dosage;
        }
        if let Some(rate) = self.reducer {
            request.water_reducer_rate = rate;
        }
        if let Some(dosage) = self.admixture {
            request.admixture_dosage = dosage;
        }
        if self.density.is_some() {
            request.concrete_density = self.density;
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialise logger")
}

fn open_history(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open history database {}", path.display()))?;
    db::init_schema(&conn)?;
    Ok(conn)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Print as JSON or through `Display`
fn emit<T: Serialize + std::fmt::Display>(json: bool, value: &T) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn fine_aggregate(kind: Option<&str>, grade: Option<&str>) -> Result<FineAggregate> {
    Ok(FineAggregate {
        kind: kind
            .map(str::parse::<FineAggregateType>)
            .transpose()?
            .unwrap_or(FineAggregateType::NaturalRiver),
        grade: grade.map(str::parse::<SandGrade>).transpose()?,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Calc { input, form, save } => {
            let mut request: MixDesignRequest = match &input {
                Some(path) => read_json(path)?,
                None => MixDesignRequest::default(),
            };
            form.apply(&mut request);

            let result = calculator::design(&request).context("Mix design rejected")?;
            emit(cli.json, &result)?;

            if save {
                let conn = open_history(&cli.database)?;
                let id = db::insert_entry(
                    &conn,
                    &serde_json::to_value(&request)?,
                    &MixOutcome::Standard(result),
                )?;
                info!("Saved as history entry {}", id);
            }
        }

        Commands::WaterDemand {
            aggregate,
            max_size,
            slump,
            sand_grade,
        } => {
            let kind: AggregateKind = aggregate.parse()?;
            let fine = fine_aggregate(None, sand_grade.as_deref())?;
            let water = water_demand::water_demand(kind, max_size, slump, &fine);
            if cli.json {
                println!("{}", serde_json::json!({ "waterDemand": water }));
            } else {
                println!(
                    "{} {} mm, slump {} mm: {} kg/m³",
                    kind.label(),
                    max_size,
                    slump,
                    water
                );
            }
        }

        Commands::SandRatio {
            wcr,
            max_size,
            slump,
            sand_type,
            sand_grade,
        } => {
            let fine = fine_aggregate(sand_type.as_deref(), sand_grade.as_deref())?;
            let ratio = sand_ratio::sand_ratio(wcr, max_size, slump, &fine);
            if cli.json {
                println!("{}", serde_json::json!({ "sandRatio": ratio }));
            } else {
                println!("W/B {}, {} mm, slump {} mm: {} %", wcr, max_size, slump, ratio);
            }
        }

        Commands::Factors {
            fly_ash_grade,
            fly_ash,
            slag_grade,
            slag,
        } => {
            let fly_ash_factor = match fly_ash_grade.as_deref() {
                Some(label) if fly_ash > 0.0 => {
                    coefficients::fly_ash_factor(label.parse::<FlyAshGrade>()?, fly_ash)
                }
                _ => 1.0,
            };
            let slag_factor = match slag_grade.as_deref() {
                Some(label) if slag > 0.0 => {
                    coefficients::slag_powder_factor(label.parse::<SlagPowderGrade>()?, slag)
                }
                _ => 1.0,
            };
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "flyAshFactor": fly_ash_factor, "slagPowderFactor": slag_factor })
                );
            } else {
                println!("γf = {:.3} (fly ash {}%)", fly_ash_factor, fly_ash);
                println!("γs = {:.3} (slag powder {}%)", slag_factor, slag);
            }
        }

        Commands::Check { sheet } => {
            let sheet: validation::MaterialSheet = read_json(&sheet)?;
            let findings = validation::check_materials(&sheet);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&findings)?);
            } else if findings.is_empty() {
                println!("All entered materials are within limits.");
            } else {
                for finding in &findings {
                    println!("{}", finding);
                }
            }
        }

        Commands::Recommend {
            grade,
            slump,
            max_size,
            fly_ash,
            region,
            season,
            detailed,
            save,
        } => {
            let query = match (detailed, grade) {
                (Some(path), _) => RecommendationQuery::Detailed {
                    request: read_json(&path)?,
                    region,
                    season,
                },
                (None, Some(grade)) => RecommendationQuery::Simple {
                    grade,
                    slump,
                    max_aggregate_size: max_size,
                    use_fly_ash: fly_ash,
                    region,
                    season,
                },
                (None, None) => bail!("Give a strength grade or --detailed <request.json>"),
            };

            let base = cli
                .workflow
                .workflow_url
                .as_deref()
                .context("--workflow-url (or MIX_WORKFLOW_URL) is required for recommendations")?;
            let client = WorkflowClient::new(
                &workflow::endpoint(base),
                &cli.workflow.workflow_id,
                Duration::from_secs(cli.workflow.timeout_secs),
            )?;
            let recommendation = client.recommend(&query)?;
            emit(cli.json, &recommendation)?;

            if save {
                let conn = open_history(&cli.database)?;
                let id = db::insert_entry(
                    &conn,
                    &query.inputs()?,
                    &MixOutcome::Recommended(recommendation),
                )?;
                info!("Saved as history entry {}", id);
            }
        }

        Commands::History { action } => {
            let conn = open_history(&cli.database)?;
            match action {
                HistoryAction::List { limit } => {
                    let entries = db::recent_entries(&conn, limit)?;
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&entries)?);
                    } else if entries.is_empty() {
                        println!("No saved calculations.");
                    } else {
                        for entry in entries {
                            println!("{}", entry);
                        }
                    }
                }
                HistoryAction::Show { id } => match db::get_entry(&conn, id)? {
                    Some(entry) if cli.json => {
                        println!("{}", serde_json::to_string_pretty(&entry)?)
                    }
                    Some(entry) => match &entry.outcome {
                        MixOutcome::Standard(result) => println!("{}", result),
                        MixOutcome::Recommended(rec) => println!("{}", rec),
                    },
                    None => println!("History entry {} not found", id),
                },
                HistoryAction::Delete { id } => {
                    if db::delete_entry(&conn, id)? {
                        println!("Deleted history entry {}", id);
                    } else {
                        println!("History entry {} not found", id);
                    }
                }
                HistoryAction::Clear => {
                    let removed = db::clear_history(&conn)?;
                    println!("Removed {} history entries", removed);
                }
            }
        }

        Commands::Batch { dir, save } => {
            let conn = if save {
                Some(open_history(&cli.database)?)
            } else {
                None
            };
            let stats = batch::run_batch(conn.as_ref(), &dir)?;
            println!("\n{}", stats);
        }

        Commands::SandCheck { sand, stone } => {
            let ratio = auxiliary::sand_ratio_of(sand, stone)
                .context("Sand plus stone must be positive")?;
            let band = SandRatioBand::classify(ratio);
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "sandRatio": ratio, "band": band })
                );
            } else {
                println!("Sand ratio {:.2} %: {}", ratio, band.label());
                println!("  {}", band.advice());
            }
        }

        Commands::Admixture {
            binder,
            dosage,
            solid_content,
        } => {
            let mass = auxiliary::admixture_mass(binder, dosage);
            let liquid = solid_content.and_then(|s| auxiliary::liquid_admixture_mass(mass, s));
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "admixture": mass, "liquidProduct": liquid })
                );
            } else {
                println!("Admixture: {:.2} kg/m³", mass);
                match (solid_content, liquid) {
                    (Some(s), Some(l)) => println!("Liquid product at {}% solids: {:.2} kg/m³", s, l),
                    (Some(s), None) => println!("Solid content {}% is not usable", s),
                    _ => {}
                }
            }
        }

        Commands::Trial {
            input,
            from_history,
            volume,
            quick,
        } => {
            let mix: MixProportions = match (input, from_history) {
                (Some(path), _) => {
                    let request: MixDesignRequest = read_json(&path)?;
                    calculator::design(&request)
                        .context("Mix design rejected")?
                        .proportions
                }
                (None, Some(id)) => {
                    let conn = open_history(&cli.database)?;
                    *db::get_entry(&conn, id)?
                        .with_context(|| format!("History entry {} not found", id))?
                        .outcome
                        .proportions()
                }
                (None, None) => bail!("Give --input <request.json> or --from-history <id>"),
            };

            let volumes: Vec<(f64, &str)> = if quick {
                auxiliary::QUICK_VOLUMES.to_vec()
            } else {
                vec![(volume, "")]
            };
            for (v, label) in volumes {
                if !cli.json && !label.is_empty() {
                    println!("{}", label);
                }
                emit(cli.json, &auxiliary::trial_batch(&mix, v))?;
            }
        }
    }

    Ok(())
}
