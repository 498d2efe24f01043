//! Wellcheck CLI - Command-line interface for Wellcheck
//!
//! Commands:
//! - predict: Submit an assessment to the prediction service
//! - payload: Print the request body without sending it
//! - validate: Range-check an assessment
//! - vitals: Show guided-mode vital estimates for a stress level
//! - bands: Print the slider band tables
//! - personas: List preset starting profiles
//! - doctor: Diagnose configuration

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use wellcheck::config::{ClientConfig, API_URL_ENV, DEFAULT_API_URL};
use wellcheck::features::{apply_estimated_vitals, apply_measured_vitals, bmi, estimate_vitals};
use wellcheck::interpret::Tone;
use wellcheck::normalizer::{BandScale, Normalizer, ScaleKind};
use wellcheck::personas;
use wellcheck::validation;
use wellcheck::{
    AssessError, AssessmentInput, AssessmentOutcome, AssessmentSession, EntryPoint, HttpPredictor,
    PayloadBuilder, Sex, StressLevel, ValidationErrors, WELLCHECK_VERSION,
};

/// Wellcheck - wellness assessment and risk prediction client
#[derive(Parser)]
#[command(name = "wellcheck")]
#[command(version = WELLCHECK_VERSION)]
#[command(about = "Assess digital-wellness risk from lifestyle and vitals", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an assessment to the prediction service
    Predict {
        #[command(flatten)]
        assessment: AssessmentArgs,

        /// Prediction service base URL
        #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Output format (defaults to text on a terminal, JSON otherwise)
        #[arg(long)]
        output: Option<OutputFormat>,
    },

    /// Print the request body without sending it
    Payload {
        #[command(flatten)]
        assessment: AssessmentArgs,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Range-check an assessment
    Validate {
        #[command(flatten)]
        assessment: AssessmentArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show guided-mode vital estimates for a stress level
    Vitals {
        /// Stress level, 1 (calm) to 10 (highly stressed)
        #[arg(long)]
        stress: u8,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the slider band tables
    Bands {
        /// Entry point whose tables to print
        #[arg(long, value_enum, default_value = "youth")]
        entry: EntryArg,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List preset starting profiles
    Personas {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Prediction service base URL
        #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Where an assessment comes from, plus per-field overrides
#[derive(Args)]
struct AssessmentArgs {
    /// Assessment JSON file (use - for stdin)
    #[arg(short, long, conflicts_with = "persona")]
    input: Option<PathBuf>,

    /// Start from a preset profile (see `wellcheck personas`)
    #[arg(long)]
    persona: Option<String>,

    /// Entry point form
    #[arg(long, value_enum)]
    entry: Option<EntryArg>,

    /// Age in years
    #[arg(long, allow_negative_numbers = true)]
    age: Option<i32>,

    /// Sex
    #[arg(long, value_enum)]
    sex: Option<SexArg>,

    /// Daily screen time in hours
    #[arg(long, allow_negative_numbers = true)]
    hours: Option<i32>,

    /// Height in centimetres
    #[arg(long)]
    height: Option<f64>,

    /// Weight in kilograms
    #[arg(long)]
    weight: Option<f64>,

    /// Sleep quality slider step (1 = good)
    #[arg(long)]
    sleep_step: Option<u8>,

    /// Physical activity slider step (1 = sedentary)
    #[arg(long)]
    activity_step: Option<u8>,

    /// Social functioning slider step (1 = withdrawn)
    #[arg(long)]
    social_step: Option<u8>,

    /// Guided mode: estimate vitals from a stress level (1-10)
    #[arg(long, conflicts_with_all = ["heart_rate", "systolic", "diastolic"])]
    stress: Option<u8>,

    /// Measured heart rate (bpm)
    #[arg(long)]
    heart_rate: Option<i32>,

    /// Measured systolic blood pressure
    #[arg(long)]
    systolic: Option<i32>,

    /// Measured diastolic blood pressure
    #[arg(long)]
    diastolic: Option<i32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EntryArg {
    /// Ages 8-19
    Youth,
    /// Ages 5-99
    General,
}

impl From<EntryArg> for EntryPoint {
    fn from(arg: EntryArg) -> Self {
        match arg {
            EntryArg::Youth => EntryPoint::Youth,
            EntryArg::General => EntryPoint::General,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SexArg {
    Female,
    Male,
}

impl From<SexArg> for Sex {
    fn from(arg: SexArg) -> Self {
        match arg {
            SexArg::Female => Sex::Female,
            SexArg::Male => Sex::Male,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wellcheck={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), WellcheckCliError> {
    match cli.command {
        Commands::Predict {
            assessment,
            api_url,
            output,
        } => cmd_predict(&assessment, &api_url, output).await,

        Commands::Payload { assessment, pretty } => cmd_payload(&assessment, pretty),

        Commands::Validate { assessment, json } => cmd_validate(&assessment, json),

        Commands::Vitals { stress, json } => cmd_vitals(stress, json),

        Commands::Bands { entry, json } => cmd_bands(entry.into(), json),

        Commands::Personas { json } => cmd_personas(json),

        Commands::Doctor { api_url, json } => cmd_doctor(&api_url, json),
    }
}

async fn cmd_predict(
    args: &AssessmentArgs,
    api_url: &str,
    output: Option<OutputFormat>,
) -> Result<(), WellcheckCliError> {
    let input = load_assessment(args)?;
    let predictor = HttpPredictor::new(ClientConfig::new(api_url)?)?;

    let mut session = AssessmentSession::new();
    session.start_with_input(input)?;
    let submitted = session.submit(&predictor).await.map(|_| ());
    if let Err(e) = submitted {
        return Err(if e.is_network() {
            WellcheckCliError::Network(session.error().unwrap_or_default().to_string(), e)
        } else {
            WellcheckCliError::from(e)
        });
    }
    let outcome = session.outcome().ok_or(WellcheckCliError::Assess(
        AssessError::InvalidStage {
            action: "read results",
            stage: "assessment",
        },
    ))?;

    let format = output.unwrap_or(if atty::is(atty::Stream::Stdout) {
        OutputFormat::Text
    } else {
        OutputFormat::Json
    });

    match format {
        OutputFormat::Text => print_outcome(outcome, atty::is(atty::Stream::Stdout)),
        OutputFormat::Json => println!("{}", serde_json::to_string(outcome)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(outcome)?),
    }

    Ok(())
}

fn cmd_payload(args: &AssessmentArgs, pretty: bool) -> Result<(), WellcheckCliError> {
    let input = load_assessment(args)?;
    let record = PayloadBuilder::build(&input)?;

    if pretty {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

fn cmd_validate(args: &AssessmentArgs, json: bool) -> Result<(), WellcheckCliError> {
    let mut input = load_assessment(args)?;
    let snapped = Normalizer::normalize(&mut input);
    let result = validation::validate(&input);

    let report = ValidationReport {
        valid: result.is_ok(),
        bmi: bmi(input.height_cm, input.weight_kg),
        snapped: snapped.iter().map(|k| k.as_str()).collect(),
        vitals_estimated: input.vitals_source.is_estimated(),
        errors: result.as_ref().err().cloned(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Valid: {}", if report.valid { "yes" } else { "no" });
        match report.bmi {
            Some(value) => println!("BMI:   {value:.2}"),
            None => println!("BMI:   undefined"),
        }
        if report.vitals_estimated {
            println!("Vitals: estimated from stress level (not measured)");
        }
        for scale in &report.snapped {
            println!("Note:  {scale} moved onto its nearest band value");
        }

        if let Some(errors) = &report.errors {
            println!("\nErrors:");
            for (field, violation) in errors.iter() {
                println!("  - {field}: {violation}");
            }
        }
    }

    match result {
        Ok(()) => Ok(()),
        Err(errors) => Err(WellcheckCliError::ValidationFailed(errors)),
    }
}

fn cmd_vitals(stress: u8, json: bool) -> Result<(), WellcheckCliError> {
    let vitals = estimate_vitals(StressLevel::new(stress)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&vitals)?);
    } else {
        println!("Stress level {} (estimated, not measured)", stress);
        println!("  Heart rate: {} bpm", vitals.heart_rate_bpm);
        println!(
            "  Blood pressure: {}/{}",
            vitals.systolic_bp, vitals.diastolic_bp
        );
    }
    Ok(())
}

fn cmd_bands(entry: EntryPoint, json: bool) -> Result<(), WellcheckCliError> {
    let scales: Vec<BandScale> = ScaleKind::ALL
        .iter()
        .map(|kind| BandScale::for_entry(entry, *kind))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&scales)?);
        return Ok(());
    }

    let (age_min, age_max) = entry.age_range();
    println!("Band tables: {} (ages {}-{})", entry.as_str(), age_min, age_max);
    for scale in &scales {
        println!();
        println!("{}", scale.kind.as_str());
        for band in scale.bands {
            let floor = if band.floor.is_finite() {
                format!(">= {}", band.floor)
            } else {
                "lowest".to_string()
            };
            println!(
                "  step {}  raw {:>5}  {:<10}  {}",
                band.step, band.raw, floor, band.label
            );
        }
    }
    Ok(())
}

fn cmd_personas(json: bool) -> Result<(), WellcheckCliError> {
    let all = personas::personas();

    if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
    } else {
        for persona in &all {
            println!("{:<16} {} - {}", persona.id, persona.name, persona.summary);
        }
    }
    Ok(())
}

fn cmd_doctor(api_url: &str, json: bool) -> Result<(), WellcheckCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Wellcheck version {}", WELLCHECK_VERSION),
    });

    match ClientConfig::new(api_url) {
        Ok(config) => checks.push(DoctorCheck {
            name: "api_url".to_string(),
            status: CheckStatus::Ok,
            message: format!("Predictions go to {}", config.predict_url()),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "api_url".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        }),
    }

    if std::env::var(API_URL_ENV).is_err() {
        checks.push(DoctorCheck {
            name: "environment".to_string(),
            status: CheckStatus::Warning,
            message: format!("{} is not set; using {}", API_URL_ENV, api_url),
        });
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (use --input FILE or flags)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        version: WELLCHECK_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Wellcheck Doctor Report");
        println!("=======================");
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(WellcheckCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_assessment(args: &AssessmentArgs) -> Result<AssessmentInput, WellcheckCliError> {
    let mut input = if let Some(path) = &args.input {
        let data = if path.to_string_lossy() == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            fs::read_to_string(path)?
        };
        serde_json::from_str::<AssessmentInput>(&data)?
    } else if let Some(id) = &args.persona {
        personas::find(id)
            .map(|p| p.input)
            .ok_or_else(|| WellcheckCliError::UnknownPersona(id.clone()))?
    } else {
        AssessmentInput::default()
    };

    if let Some(entry) = args.entry {
        Normalizer::set_entry(&mut input, entry.into());
    }
    if let Some(age) = args.age {
        input.age = age;
    }
    if let Some(sex) = args.sex {
        input.sex = sex.into();
    }
    if let Some(hours) = args.hours {
        input.screen_hours = hours;
    }
    if let Some(height) = args.height {
        input.height_cm = height;
    }
    if let Some(weight) = args.weight {
        input.weight_kg = weight;
    }

    let steps = [
        (ScaleKind::SleepDisturbance, args.sleep_step),
        (ScaleKind::PhysicalActivity, args.activity_step),
        (ScaleKind::SocialFunctioning, args.social_step),
    ];
    for (kind, step) in steps {
        if let Some(step) = step {
            Normalizer::set_step(&mut input, kind, step);
        }
    }

    if let Some(stress) = args.stress {
        apply_estimated_vitals(&mut input, StressLevel::new(stress)?);
    } else if args.heart_rate.is_some() || args.systolic.is_some() || args.diastolic.is_some() {
        let heart_rate = args.heart_rate.unwrap_or(input.heart_rate_bpm);
        let systolic = args.systolic.unwrap_or(input.systolic_bp);
        let diastolic = args.diastolic.unwrap_or(input.diastolic_bp);
        apply_measured_vitals(&mut input, heart_rate, systolic, diastolic);
    }

    debug!(?input, "loaded assessment");
    Ok(input)
}

fn print_outcome(outcome: &AssessmentOutcome, color: bool) {
    let interp = &outcome.interpretation;
    let width = 30usize;
    let filled = (interp.gauge.fraction * width as f64).round() as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(width - filled));

    println!("Analysis Complete");
    println!("=================");
    println!("{}", paint(&interp.risk_level, interp.gauge.tone, color));
    println!(
        "[{}] severity index {:.2}",
        paint(&bar, interp.gauge.tone, color),
        outcome.result.prediction_score
    );
    println!();
    println!("{}", interp.description);

    if let Some(stress) = interp.stress {
        let marker = if stress.elevated { "elevated" } else { "normal" };
        println!();
        println!("Stress & Vital Signs: {}% ({})", stress.percent, marker);
    }
    if outcome.vitals_estimated {
        println!("Note: heart rate and blood pressure were estimated from stress level.");
    }
    if let Some(rec) = &interp.recommendation {
        println!();
        println!("{}: {}", rec.title, rec.message);
    }
}

fn paint(text: &str, tone: Tone, color: bool) -> String {
    if color {
        format!("\x1b[{}m{}\x1b[0m", tone.ansi_color(), text)
    } else {
        text.to_string()
    }
}

// Error types

#[derive(Debug)]
enum WellcheckCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Assess(AssessError),
    Network(String, AssessError),
    ValidationFailed(ValidationErrors),
    UnknownPersona(String),
    DoctorFailed,
}

impl From<io::Error> for WellcheckCliError {
    fn from(e: io::Error) -> Self {
        WellcheckCliError::Io(e)
    }
}

impl From<serde_json::Error> for WellcheckCliError {
    fn from(e: serde_json::Error) -> Self {
        WellcheckCliError::Json(e)
    }
}

impl From<AssessError> for WellcheckCliError {
    fn from(e: AssessError) -> Self {
        match e {
            AssessError::Validation(errors) => WellcheckCliError::ValidationFailed(errors),
            other => WellcheckCliError::Assess(other),
        }
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<WellcheckCliError> for CliError {
    fn from(e: WellcheckCliError) -> Self {
        match e {
            WellcheckCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
                details: None,
            },
            WellcheckCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
                details: None,
            },
            WellcheckCliError::Assess(e) => CliError {
                code: "ASSESS_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
                details: None,
            },
            WellcheckCliError::Network(banner, e) => CliError {
                code: "NETWORK_ERROR".to_string(),
                message: banner,
                hint: Some(format!("Check --api-url / {API_URL_ENV}, then resubmit")),
                details: Some(serde_json::Value::String(e.to_string())),
            },
            WellcheckCliError::ValidationFailed(errors) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} field(s) out of range: {}", errors.len(), errors),
                hint: Some("Correct the listed fields and retry".to_string()),
                details: serde_json::to_value(&errors).ok(),
            },
            WellcheckCliError::UnknownPersona(id) => CliError {
                code: "UNKNOWN_PERSONA".to_string(),
                message: format!("No persona named '{}'", id),
                hint: Some("Run 'wellcheck personas' for the list".to_string()),
                details: None,
            },
            WellcheckCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
                details: None,
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    valid: bool,
    bmi: Option<f64>,
    snapped: Vec<&'static str>,
    vitals_estimated: bool,
    errors: Option<ValidationErrors>,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wellcheck::types::VitalsSource;

    fn assessment_from(args: &[&str]) -> AssessmentInput {
        let cli = Cli::try_parse_from(["wellcheck", "payload"].iter().chain(args).copied()).unwrap();
        match cli.command {
            Commands::Payload { assessment, .. } => load_assessment(&assessment).unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_partial_vitals_override_keeps_other_readings() {
        let input = assessment_from(&["--heart-rate", "66"]);
        assert_eq!(input.vitals_source, VitalsSource::Measured);
        assert_eq!(
            (input.heart_rate_bpm, input.systolic_bp, input.diastolic_bp),
            (66, 120, 75)
        );
    }

    #[test]
    fn test_stress_flag_uses_estimator() {
        let input = assessment_from(&["--stress", "10"]);
        assert!(input.vitals_source.is_estimated());
        assert_eq!(input.heart_rate_bpm, 95);
    }

    #[test]
    fn test_entry_switch_keeps_activity_level() {
        let input = assessment_from(&["--entry", "general"]);
        assert_eq!(input.entry, EntryPoint::General);
        assert_eq!(input.physical_activity, 2.5);
        assert_eq!(Normalizer::step(&input, ScaleKind::PhysicalActivity), 2);
    }

    #[test]
    fn test_unknown_persona_is_reported() {
        let cli = Cli::try_parse_from(["wellcheck", "payload", "--persona", "nobody"]).unwrap();
        let Commands::Payload { assessment, .. } = cli.command else {
            unreachable!()
        };
        assert!(matches!(
            load_assessment(&assessment),
            Err(WellcheckCliError::UnknownPersona(id)) if id == "nobody"
        ));
    }
}
