//! Vitalens CLI - Command-line interface for the Vitalens engine
//!
//! Commands:
//! - run: Process streaming landmark frames from stdin (streaming mode)
//! - doctor: Diagnose engine health and configuration
//! - schema: Print input/output record descriptions

use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use vitalens::types::{LandmarkSet, Point};
use vitalens::{AnalysisSession, AnalyzerConfig, PRODUCER_NAME, VERSION};

/// Vitalens - facial vitals and drowsiness analytics from landmark streams
#[derive(Parser)]
#[command(name = "vitalens")]
#[command(version = VERSION)]
#[command(about = "Transform facial landmark frames into vital-sign insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process streaming frames from stdin, one JSON frame per line
    Run {
        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Flush output after each snapshot
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Diagnose engine health and configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print input/output record descriptions
    Schema {
        /// Record to describe
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
    /// Pretty-printed JSON per snapshot
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input frame record
    Input,
    /// Output snapshot record
    Output,
}

/// One input frame: timestamp, PPG intensity, and landmark coordinates.
#[derive(serde::Deserialize)]
struct FrameRecord {
    t_ms: f64,
    intensity: f64,
    #[serde(default)]
    landmarks: Vec<[f64; 2]>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
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

fn run(cli: Cli) -> Result<(), VitalensCliError> {
    match cli.command {
        Commands::Run {
            output_format,
            flush,
        } => cmd_run(output_format, flush),
        Commands::Doctor { json } => cmd_doctor(json),
        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_run(output_format: OutputFormat, flush: bool) -> Result<(), VitalensCliError> {
    let mut session = AnalysisSession::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let frame: FrameRecord = serde_json::from_str(trimmed)
            .map_err(|e| VitalensCliError::ParseError(format!("Failed to parse frame: {}", e)))?;

        let points: Vec<Point> = frame
            .landmarks
            .iter()
            .map(|&[x, y]| Point::new(x, y))
            .collect();
        let landmarks = LandmarkSet::new(points)?;

        let snapshot = session.process_frame(&landmarks, frame.t_ms, frame.intensity)?;

        let rendered = match output_format {
            OutputFormat::Ndjson => serde_json::to_string(&snapshot)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(&snapshot)?,
        };
        writeln!(stdout, "{}", rendered)?;
        if flush {
            stdout.flush()?;
        }
    }

    Ok(())
}

fn cmd_doctor(json: bool) -> Result<(), VitalensCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "vitalens_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitalens version {}", VERSION),
    });

    match AnalyzerConfig::default().validate() {
        Ok(()) => checks.push(DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Ok,
            message: "Default configuration is valid".to_string(),
        }),
        Err(e) => checks.push(DoctorCheck {
            name: "default_config".to_string(),
            status: CheckStatus::Error,
            message: format!("Default configuration rejected: {}", e),
        }),
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitalens Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
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
        Err(VitalensCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), VitalensCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input frame record (one JSON object per line):");
            println!();
            println!("- t_ms: frame timestamp in milliseconds, monotonic per session");
            println!("- intensity: mean color intensity of the PPG region of interest");
            println!("- landmarks: array of [x, y] pairs in normalized image coordinates");
            println!();
            println!("Dense meshes (>= 400 points) are interpreted with MediaPipe FaceMesh");
            println!("indexing; smaller sets fall back to bounding-box region heuristics.");
        }
        SchemaType::Output => {
            println!("Output snapshot record (one JSON object per frame):");
            println!();
            println!("- producer, version, session_id, timestamp_ms, computed_at");
            println!("- geometry: face box, eye/mouth openness, head pose, jawline");
            println!("- eye_state: eyes_closed, blink_detected, blink_rate_per_min,");
            println!("  perclos, yawn_probability, closure_threshold");
            println!("- heart_rate: {{ bpm, confidence }} (bpm null until enough data)");
            println!("- respiration: {{ breaths_per_min, confidence }}");
            println!("- hrv: {{ rmssd_ms, sdnn_ms, mean_ibi_ms, peak_count }}");
            println!("- adiposity: component ratios, fullness_index, category");
        }
    }

    Ok(())
}

// Error types

#[derive(Debug)]
enum VitalensCliError {
    Io(io::Error),
    Analysis(vitalens::AnalysisError),
    Json(serde_json::Error),
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for VitalensCliError {
    fn from(e: io::Error) -> Self {
        VitalensCliError::Io(e)
    }
}

impl From<vitalens::AnalysisError> for VitalensCliError {
    fn from(e: vitalens::AnalysisError) -> Self {
        VitalensCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for VitalensCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalensCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalensCliError> for CliError {
    fn from(e: VitalensCliError) -> Self {
        match e {
            VitalensCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check stream availability and permissions".to_string()),
            },
            VitalensCliError::Analysis(e) => CliError {
                code: "ANALYSIS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check frame timestamps and landmark coordinates".to_string()),
            },
            VitalensCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalensCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            VitalensCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'vitalens schema input' for the frame format".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
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
    Error,
}
