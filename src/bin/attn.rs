//! attn CLI - Command-line interface for the attention-quality engine
//!
//! Commands:
//! - replay: Replay a recorded signal stream into dwell events (batch mode)
//! - run: Process streaming signals from stdin (streaming mode)
//! - validate: Validate signal schema
//! - config: Print the effective, normalized configuration
//! - doctor: Diagnose configuration and environment
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use attention_quality::config::{AttentionConfig, CatchUpPolicy};
use attention_quality::replay::{replay_signals, DwellReport, ReplayProcessor};
use attention_quality::schema::{AttentionSignal, SignalAdapter, SCHEMA_VERSION};
use attention_quality::{ENGINE_VERSION, PRODUCER_NAME};

/// attn - Bounded, quality-filtered section dwell-time telemetry
#[derive(Parser)]
#[command(name = "attn")]
#[command(author = "Synheart AI Inc")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Turn visibility, activity and scroll signals into dwell events", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded signals into dwell events (batch mode)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Process streaming signals from stdin (streaming mode)
    Run {
        /// Buffer output instead of flushing after each signal
        #[arg(long)]
        no_flush: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Validate signal schema
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration after normalization
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Check a configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

/// Configuration file plus per-option overrides
#[derive(clap::Args)]
struct ConfigArgs {
    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Inactivity threshold before pausing, in milliseconds
    #[arg(long)]
    idle_timeout_ms: Option<u64>,

    /// Cumulative scroll distance that resets a section, in pixels
    #[arg(long)]
    scroll_reset_threshold_px: Option<f64>,

    /// Size of each emitted dwell slice, in milliseconds
    #[arg(long)]
    emit_interval_ms: Option<u64>,

    /// Cap per uninterrupted section view, in milliseconds
    #[arg(long)]
    max_duration_ms: Option<u64>,

    /// How skipped intervals are emitted after a stall
    #[arg(long)]
    catch_up: Option<CatchUpArg>,
}

#[derive(Clone, ValueEnum)]
enum CatchUpArg {
    /// At most one interval per tick
    Single,
    /// All completed intervals at once
    Burst,
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one signal per line)
    Ndjson,
    /// JSON array of signals
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one dwell event per line)
    Ndjson,
    /// Full dwell report as JSON
    Json,
    /// Pretty-printed dwell report
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (attn.signal.v1)
    Input,
    /// Output schema (attn.dwell_report.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), AttnCliError> {
    match cli.command {
        Commands::Replay {
            input,
            output,
            input_format,
            output_format,
            config,
        } => cmd_replay(&input, &output, input_format, output_format, &config),

        Commands::Run { no_flush, config } => cmd_run(&config, !no_flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Config { config } => cmd_config(&config),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_replay(
    input: &Path,
    output: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    config_args: &ConfigArgs,
) -> Result<(), AttnCliError> {
    let config = build_config(config_args)?;
    let input_data = read_input(input)?;
    let signals = parse_signals(&input_data, &input_format)?;

    if signals.is_empty() {
        return Err(AttnCliError::NoSignals);
    }

    log::info!("replaying {} signals", signals.len());
    let report = replay_signals(&signals, config)?;
    let output_str = format_output(&report, &output_format)?;

    if output.to_string_lossy() == "-" {
        io::stdout().write_all(output_str.as_bytes())?;
    } else {
        fs::write(output, output_str)?;
    }

    Ok(())
}

fn cmd_run(config_args: &ConfigArgs, flush: bool) -> Result<(), AttnCliError> {
    let config = build_config(config_args)?;
    let mut processor = ReplayProcessor::with_config(config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        for event in processor.process_line(&line)? {
            writeln!(stdout, "{}", serde_json::to_string(&event)?)?;
        }
        if flush {
            stdout.flush()?;
        }

        if processor.is_destroyed() {
            log::info!("destroy signal received, stopping");
            break;
        }
    }

    stdout.flush()?;
    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), AttnCliError> {
    let input_data = read_input(input)?;
    let signals = parse_signals(&input_data, &input_format)?;
    let results = SignalAdapter::validate_signals(&signals);

    let report = ValidationReport {
        total_signals: signals.len(),
        valid_signals: signals.len() - results.len(),
        invalid_signals: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                signal_id: r.signal_id.clone(),
                error: r.result.as_ref().map(|e| e.to_string()).unwrap_or_default(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total signals:   {}", report.total_signals);
        println!("Valid signals:   {}", report.valid_signals);
        println!("Invalid signals: {}", report.invalid_signals);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Signal {} (index {}): {}",
                    err.signal_id.as_deref().unwrap_or("unknown"),
                    err.index,
                    err.error
                );
            }
        }
    }

    if report.invalid_signals > 0 {
        Err(AttnCliError::ValidationFailed(report.invalid_signals))
    } else {
        Ok(())
    }
}

fn cmd_config(config_args: &ConfigArgs) -> Result<(), AttnCliError> {
    let config = build_config(config_args)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), AttnCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("attention-quality version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "schema_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input schema: {}", SCHEMA_VERSION),
    });

    if let Some(path) = config_path {
        checks.push(check_config_file(path));
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("attn Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AttnCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn check_config_file(path: &Path) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist, defaults will be used".to_string(),
        };
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read config file: {}", e),
            }
        }
    };

    let raw: AttentionConfig = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            return DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: format!("Invalid config JSON: {}", e),
            }
        }
    };

    let normalized = raw.clone().normalized();
    if normalized == raw {
        DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "Config valid ({} intervals of {} ms per view)",
                normalized.intervals_per_view(),
                normalized.emit_interval_ms
            ),
        }
    } else {
        DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Config will be normalized (max_duration_ms {} -> {}, emit_interval_ms {} -> {})",
                raw.max_duration_ms,
                normalized.max_duration_ms,
                raw.emit_interval_ms,
                normalized.emit_interval_ms
            ),
        }
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), AttnCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("Every record carries schema_version, at (RFC 3339 UTC) and a type:");
                println!();
                println!("- observe     {{ section_id }}            section entered the viewport");
                println!("- unobserve   {{ section_id }}            section left the viewport");
                println!("- scroll      {{ section_id, delta_px }}  scroll displacement, either sign");
                println!("- interaction {{ signal }}                pointer_move, key_down, touch, scroll, click");
                println!("- visibility  {{ visible }}               page visibility change");
                println!("- tick                                  periodic timer tick");
                println!("- destroy                               page unload");
                println!();
                println!("Timestamps must be non-decreasing.");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: attn.dwell_report.v1");
                println!();
                println!("- producer: {{ name, version, instance_id }}");
                println!("- config: effective normalized configuration");
                println!("- events: [{{ section_id, duration_ms, emitted_at }}]");
                println!("- sections: tracked sections at end of stream");
                println!("  {{ section_id, phase, accumulated_ms, last_emitted_ms, scroll_delta_px, capped }}");
                println!("- total_dwell_ms: sum of emitted durations");
                println!();
                println!("With --output-format ndjson only the events are written, one per line.");
            }
        }
    }

    Ok(())
}

// Helper functions

fn build_config(args: &ConfigArgs) -> Result<AttentionConfig, AttnCliError> {
    let mut config = match &args.config {
        Some(path) => AttentionConfig::from_json(&fs::read_to_string(path)?)?,
        None => AttentionConfig::default(),
    };

    if let Some(v) = args.idle_timeout_ms {
        config.idle_timeout_ms = v;
    }
    if let Some(v) = args.scroll_reset_threshold_px {
        config.scroll_reset_threshold_px = v;
    }
    if let Some(v) = args.emit_interval_ms {
        config.emit_interval_ms = v;
    }
    if let Some(v) = args.max_duration_ms {
        config.max_duration_ms = v;
    }
    if let Some(catch_up) = &args.catch_up {
        config.catch_up = match catch_up {
            CatchUpArg::Single => CatchUpPolicy::Single,
            CatchUpArg::Burst => CatchUpPolicy::Burst,
        };
    }

    Ok(config.normalized())
}

fn read_input(input: &Path) -> Result<String, AttnCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_signals(
    input_data: &str,
    format: &InputFormat,
) -> Result<Vec<AttentionSignal>, AttnCliError> {
    let signals = match format {
        InputFormat::Ndjson => SignalAdapter::parse_ndjson(input_data)?,
        InputFormat::Json => SignalAdapter::parse_array(input_data)?,
    };
    Ok(signals)
}

fn format_output(report: &DwellReport, format: &OutputFormat) -> Result<String, AttnCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut out = String::new();
            for event in &report.events {
                out.push_str(&serde_json::to_string(event)?);
                out.push('\n');
            }
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string(report)?),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(report)?),
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/attn.signal.v1.json",
        "title": "attn.signal.v1",
        "description": "Host notification driving the attention-quality engine",
        "type": "object",
        "required": ["schema_version", "at", "type"],
        "properties": {
            "schema_version": { "type": "string", "const": "attn.signal.v1" },
            "signal_id": { "type": "string" },
            "at": { "type": "string", "format": "date-time" },
            "type": {
                "type": "string",
                "enum": ["observe", "unobserve", "scroll", "interaction", "visibility", "tick", "destroy"]
            },
            "section_id": { "type": "string", "minLength": 1 },
            "delta_px": { "type": "number" },
            "signal": {
                "type": "string",
                "enum": ["pointer_move", "key_down", "touch", "scroll", "click"]
            },
            "visible": { "type": "boolean" }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": "https://synheart.ai/schemas/attn.dwell_report.v1.json",
        "title": "attn.dwell_report.v1",
        "description": "Dwell events produced by replaying a signal stream",
        "type": "object",
        "required": ["producer", "config", "events", "sections", "total_dwell_ms"],
        "properties": {
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "version": { "type": "string" },
                    "instance_id": { "type": "string" }
                }
            },
            "config": { "type": "object" },
            "events": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["section_id", "duration_ms", "emitted_at"],
                    "properties": {
                        "section_id": { "type": "string" },
                        "duration_ms": { "type": "integer", "minimum": 1 },
                        "emitted_at": { "type": "string", "format": "date-time" }
                    }
                }
            },
            "sections": { "type": "array", "items": { "type": "object" } },
            "total_dwell_ms": { "type": "integer" }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum AttnCliError {
    Io(io::Error),
    Engine(attention_quality::AttentionError),
    Json(serde_json::Error),
    NoSignals,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for AttnCliError {
    fn from(e: io::Error) -> Self {
        AttnCliError::Io(e)
    }
}

impl From<attention_quality::AttentionError> for AttnCliError {
    fn from(e: attention_quality::AttentionError) -> Self {
        AttnCliError::Engine(e)
    }
}

impl From<serde_json::Error> for AttnCliError {
    fn from(e: serde_json::Error) -> Self {
        AttnCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AttnCliError> for CliError {
    fn from(e: AttnCliError) -> Self {
        match e {
            AttnCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AttnCliError::Engine(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input matches attn.signal.v1 schema".to_string()),
            },
            AttnCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AttnCliError::NoSignals => CliError {
                code: "NO_SIGNALS".to_string(),
                message: "No signals found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AttnCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} signals failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            AttnCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_signals: usize,
    valid_signals: usize,
    invalid_signals: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    signal_id: Option<String>,
    error: String,
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
    Warning,
    Error,
}
