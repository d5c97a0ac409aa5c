//! formguard CLI
//!
//! Commands:
//! - analyze: Score a recorded event log (batch mode)
//! - run: Score streaming events from stdin (streaming mode)
//! - validate: Validate interaction event schema
//! - schema: Print schema information

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use formguard::events::{self, InteractionEvent};
use formguard::report::JsonLinesSink;
use formguard::{BehaviorDetector, DetectorConfig, ScoreError, FORMGUARD_VERSION, PRODUCER_NAME};

/// formguard - Behavioral scoring engine for detecting automated form
/// interaction
#[derive(Parser)]
#[command(name = "formguard")]
#[command(version = FORMGUARD_VERSION)]
#[command(about = "Score interaction event streams for bot likelihood", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a recorded event log (batch mode)
    Analyze {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Detector configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the final report
        #[arg(long)]
        pretty: bool,
    },

    /// Score streaming events from stdin (streaming mode)
    Run {
        /// Detector configuration JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Emit a report envelope after every N events (0 = final only)
        #[arg(long, default_value = "50")]
        report_every: u64,

        /// Flush output after each report
        #[arg(long, default_value = "true")]
        flush: bool,
    },

    /// Validate interaction event schema
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

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one event per line)
    Ndjson,
    /// JSON array of events
    Json,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (interaction events)
    Input,
    /// Output schema (report envelope)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

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

fn run(cli: Cli) -> Result<(), FormguardCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            input_format,
            config,
            pretty,
        } => cmd_analyze(&input, input_format, config.as_deref(), pretty),

        Commands::Run {
            config,
            report_every,
            flush,
        } => cmd_run(config.as_deref(), report_every, flush),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Schema { schema_type } => cmd_schema(schema_type),
    }
}

fn cmd_analyze(
    input: &PathBuf,
    input_format: InputFormat,
    config: Option<&std::path::Path>,
    pretty: bool,
) -> Result<(), FormguardCliError> {
    let input_data = read_input(input)?;
    let events = parse_events(&input_data, &input_format)?;
    if events.is_empty() {
        return Err(FormguardCliError::NoEvents);
    }

    let mut detector = BehaviorDetector::new(load_config(config)?);
    for event in events {
        detector.process(event)?;
    }

    let report = detector.report();
    let output = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", output);

    Ok(())
}

fn cmd_run(
    config: Option<&std::path::Path>,
    report_every: u64,
    flush: bool,
) -> Result<(), FormguardCliError> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("formguard run reads NDJSON events from stdin; pipe an event stream in");
    }

    let config = load_config(config)?;
    let mut detector =
        BehaviorDetector::new(config).with_sink(Box::new(JsonLinesSink::new(io::stdout())));

    let stdin = io::stdin();
    let mut processed = 0u64;

    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event: InteractionEvent = serde_json::from_str(trimmed)
            .map_err(|e| FormguardCliError::ParseError(format!("Failed to parse event: {}", e)))?;
        detector.process(event)?;
        processed += 1;

        if report_every > 0 && processed % report_every == 0 {
            detector.report();
            if flush {
                io::stdout().flush()?;
            }
        }
    }

    // Final report for whatever remains
    detector.report();
    io::stdout().flush()?;

    Ok(())
}

fn cmd_validate(
    input: &PathBuf,
    input_format: InputFormat,
    json: bool,
) -> Result<(), FormguardCliError> {
    let input_data = read_input(input)?;
    let events = parse_events(&input_data, &input_format)?;

    let mut errors: Vec<ValidationErrorDetail> = Vec::new();
    for (index, event) in events.iter().enumerate() {
        if let Err(e) = event.validate() {
            errors.push(ValidationErrorDetail {
                index,
                error: e.to_string(),
            });
        }
    }

    let report = ValidationReport {
        total_events: events.len(),
        valid_events: events.len() - errors.len(),
        invalid_events: errors.len(),
        errors,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events:   {}", report.total_events);
        println!("Valid events:   {}", report.valid_events);
        println!("Invalid events: {}", report.invalid_events);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - Event at index {}: {}", err.index, err.error);
            }
        }
    }

    if report.invalid_events > 0 {
        Err(FormguardCliError::ValidationFailed(report.invalid_events))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType) -> Result<(), FormguardCliError> {
    match schema_type {
        SchemaType::Input => {
            println!("Input Schema: interaction events");
            println!();
            println!("One JSON object per event with a timestamp, an event_type tag, and");
            println!("the matching payload field:");
            println!();
            println!("1. key       - {{ key, field? }} key press on a text-input target");
            println!("2. click     - {{ x, y }} mouse click or touch tap");
            println!("3. movement  - {{ x, y }} pointer position sample");
            println!("4. focus     - {{ kind: focus|blur }} window focus transition");
            println!("5. clipboard - {{ kind: copy|paste, text, source? }} clipboard action");
            println!();
            println!("Timestamps are RFC3339; events must arrive in time order per channel.");
        }
        SchemaType::Output => {
            println!("Output Schema: report envelope ({} v{})", PRODUCER_NAME, FORMGUARD_VERSION);
            println!();
            println!("- sessionId: UUID of the tracked session");
            println!("- producer: {{ name, version }}");
            println!("- report:");
            println!("  - timestamp, sessionDuration (ms), botScore, confidence,");
            println!("    interactionCount");
            println!("  - metrics.typing: {{ wpm, consistency, samples }}");
            println!("  - metrics.clicks: {{ speed, patternScore, samples }}");
            println!("  - metrics.movement: {{ speed, straightness, naturalness, samples }}");
            println!("  - metrics.tabSwitching: {{ frequency, samples }}");
            println!("  - metrics.copyPaste: {{ copyPasteCount, externalPasteCount,");
            println!("    averageTimeBetweenCopyPaste, suspiciousScore, samples }}");
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &PathBuf) -> Result<String, FormguardCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_events(
    input: &str,
    format: &InputFormat,
) -> Result<Vec<InteractionEvent>, FormguardCliError> {
    let events = match format {
        InputFormat::Ndjson => events::parse_ndjson(input)?,
        InputFormat::Json => events::parse_array(input)?,
    };
    Ok(events)
}

fn load_config(path: Option<&std::path::Path>) -> Result<DetectorConfig, FormguardCliError> {
    match path {
        None => Ok(DetectorConfig::default()),
        Some(path) => {
            let json = fs::read_to_string(path)?;
            serde_json::from_str(&json).map_err(|e| {
                FormguardCliError::ConfigError(format!("{}: {}", path.display(), e))
            })
        }
    }
}

// Error types

#[derive(Debug)]
enum FormguardCliError {
    Io(io::Error),
    Score(ScoreError),
    Json(serde_json::Error),
    ConfigError(String),
    ParseError(String),
    NoEvents,
    ValidationFailed(usize),
}

impl From<io::Error> for FormguardCliError {
    fn from(e: io::Error) -> Self {
        FormguardCliError::Io(e)
    }
}

impl From<ScoreError> for FormguardCliError {
    fn from(e: ScoreError) -> Self {
        FormguardCliError::Score(e)
    }
}

impl From<serde_json::Error> for FormguardCliError {
    fn from(e: serde_json::Error) -> Self {
        FormguardCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FormguardCliError> for CliError {
    fn from(e: FormguardCliError) -> Self {
        match e {
            FormguardCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FormguardCliError::Score(e) => CliError {
                code: "SCORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'formguard validate' on the input".to_string()),
            },
            FormguardCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FormguardCliError::ConfigError(msg) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check the configuration file against 'formguard schema'".to_string()),
            },
            FormguardCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
            FormguardCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            FormguardCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} events failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    valid_events: usize,
    invalid_events: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    error: String,
}
