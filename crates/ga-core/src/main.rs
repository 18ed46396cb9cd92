//! Group Audit Core - underperforming-group detection
//!
//! The main entry point for ga-core, handling:
//! - Auditing a labeled dataset for underperforming groups
//! - Synthetic dataset generation
//! - Configuration inspection and validation
//! - JSON Schema output for agents

use clap::{Args, Parser, Subcommand};
use ga_common::{
    format_error_human, Error, OutputFormat, RunId, StructuredError, SCHEMA_VERSION,
};
use ga_config::{
    get_preset, list_presets, load_config, validate_config, AnalyzerConfig,
    ClusterSelectionMethod, ConfigPaths, ConfigSnapshot, PresetName,
};
use ga_core::dataset::{DatasetFile, STDIN_PATH};
use ga_core::exit_codes::ExitCode;
use ga_core::issue::IssueRegistry;
use ga_core::logging::{
    event_names, init_logging, LogConfig, LogContext, LogFormat, LogOverrides, Stage,
};
use ga_core::run::{render_markdown, run_audit, summary_line, AuditOptions};
use ga_core::schema::{available_schemas, format_schema, generate_all_schemas, generate_schema, SchemaFormat};
use ga_core::synthetic::{generate, BlobLayout, SynthOptions, DEFAULT_CENTERS};
use ga_core::log_event;
use ga_math::DistanceMetric;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Group Audit Core - find clusters where a classifier underperforms
#[derive(Parser)]
#[command(name = "ga-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to underperf_group.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a dataset for underperforming groups
    Audit(AuditArgs),

    /// Write a synthetic blob dataset
    Synth(SynthArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print JSON Schemas for inputs and outputs
    Schema(SchemaArgs),

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct AuditArgs {
    /// Dataset JSON file, or '-' for stdin
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Issue type to look for
    #[arg(long, default_value = "underperf_group")]
    issue_type: String,

    /// Start from a named preset instead of the config file
    #[arg(long)]
    preset: Option<String>,

    /// Flag clusters whose quality ratio is below this
    #[arg(long)]
    threshold: Option<f64>,

    /// Distance metric (euclidean, manhattan, chebyshev, cosine)
    #[arg(long)]
    metric: Option<DistanceMetric>,

    /// Minimum cluster size
    #[arg(long)]
    min_cluster_size: Option<usize>,

    /// Neighbourhood size for core distances
    #[arg(long)]
    min_samples: Option<usize>,

    /// Cluster selection method (eom, leaf)
    #[arg(long)]
    cluster_selection: Option<ClusterSelectionMethod>,

    /// Allow the whole dataset to be one cluster
    #[arg(long)]
    allow_single_cluster: bool,

    /// Include per-example flag and score columns in JSON output
    #[arg(long)]
    include_issues: bool,

    /// Report verbosity (0-2)
    #[arg(long)]
    verbosity: Option<u8>,

    /// Rows listed as most severe examples
    #[arg(long)]
    max_examples: Option<usize>,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Number of blobs (one class each)
    #[arg(long, default_value_t = DEFAULT_CENTERS.len())]
    blobs: usize,

    /// Sample gaussian blobs instead of lattices
    #[arg(long)]
    gaussian: bool,

    /// Points per gaussian blob
    #[arg(long, default_value_t = 50)]
    per_blob: usize,

    /// Standard deviation of gaussian blobs
    #[arg(long, default_value_t = 1.0)]
    std_dev: f64,

    /// Weight on the true class before normalization
    #[arg(long, default_value_t = 0.9)]
    label_weight: f64,

    /// Swap this class's probability column with the next class's
    #[arg(long)]
    swap_class: Option<usize>,

    /// RNG seed for gaussian blobs
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Show built-in defaults, ignoring config files
        #[arg(long)]
        defaults: bool,

        /// Show a named preset
        #[arg(long)]
        preset: Option<String>,
    },

    /// Validate a configuration file
    Validate {
        /// File to validate (default: resolved config)
        path: Option<PathBuf>,
    },

    /// List available presets
    Presets,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type to print
    type_name: Option<String>,

    /// List available types
    #[arg(long)]
    list: bool,

    /// Print every schema
    #[arg(long)]
    all: bool,

    /// Single-line JSON
    #[arg(long)]
    compact: bool,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let log_format = if cli.global.format.is_machine_readable() {
        Some(LogFormat::Jsonl)
    } else {
        None
    };
    let log_config = LogConfig::from_env(LogOverrides {
        level: LogConfig::level_from_verbosity(cli.global.verbose, cli.global.quiet),
        format: log_format,
        no_color: cli.global.no_color,
    });
    init_logging(&log_config);

    let exit_code = match &cli.command {
        Commands::Audit(args) => run_audit_command(&cli.global, args),
        Commands::Synth(args) => run_synth(&cli.global, args),
        Commands::Config(args) => run_config(&cli.global, args),
        Commands::Schema(args) => run_schema(&cli.global, args),
        Commands::Version => {
            print_version(&cli.global);
            ExitCode::Clean
        }
    };

    exit_code.into()
}

// ============================================================================
// audit
// ============================================================================

fn run_audit_command(global: &GlobalOpts, args: &AuditArgs) -> ExitCode {
    let run_id = RunId::new();
    let dataset_id = args.input.display().to_string();
    let ctx = LogContext::new(run_id.to_string()).with_dataset_id(dataset_id.clone());
    let span = tracing::info_span!(
        "audit",
        run_id = %run_id,
        dataset_id = %dataset_id,
    );
    let _guard = span.enter();

    log_event!(
        ctx,
        INFO,
        event_names::RUN_STARTED,
        Stage::Init,
        "Starting audit",
        issue_type = args.issue_type.as_str()
    );

    let (config, snapshot) = match resolve_audit_config(global, args, &ctx) {
        Ok(resolved) => resolved,
        Err(err) => return output_error(global, &run_id, &err),
    };

    let dataset = match DatasetFile::load(&args.input).and_then(DatasetFile::into_loaded) {
        Ok(d) => d,
        Err(err) => return output_error(global, &run_id, &err),
    };
    log_event!(
        ctx,
        INFO,
        event_names::INPUT_LOADED,
        Stage::Init,
        "Dataset loaded",
        num_examples = dataset.context.num_examples() as u64,
        num_classes = dataset.context.num_classes() as u64
    );

    let registry = IssueRegistry::default();
    let options = AuditOptions {
        issue_type: &args.issue_type,
        run_id: &run_id,
        dataset_id: Some(&dataset_id),
        include_issues: args.include_issues,
        verbosity: config.report.verbosity,
    };
    let outcome = match run_audit(&registry, &dataset, &config, snapshot, &options) {
        Ok(o) => o,
        Err(err) => return output_error(global, &run_id, &err),
    };

    match global.format {
        OutputFormat::Json => match serde_json::to_string_pretty(&outcome.report) {
            Ok(json) => println!("{}", json),
            Err(err) => return output_error(global, &run_id, &Error::Json(err)),
        },
        OutputFormat::Md => print!("{}", render_markdown(&outcome)),
        OutputFormat::Summary => println!("{}", summary_line(&outcome.report)),
        OutputFormat::Exitcode => {}
    }

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "Audit complete",
        num_issues = outcome.report.summary.num_issues as u64,
        exit_code = outcome.exit_code.as_i32() as i64
    );
    outcome.exit_code
}

/// Config file or preset, then CLI overrides, then validation.
fn resolve_audit_config(
    global: &GlobalOpts,
    args: &AuditArgs,
    ctx: &LogContext,
) -> Result<(AnalyzerConfig, ConfigSnapshot), Error> {
    let (mut config, snapshot) = match &args.preset {
        Some(name) => {
            let preset = parse_preset(name)?;
            let config = get_preset(preset);
            let snapshot = ConfigSnapshot::new(&config, &ConfigPaths::default(), None);
            (config, snapshot)
        }
        None => {
            let loaded = load_cli_config(global.config.as_deref())?;
            match &loaded.paths.config {
                Some(path) => log_event!(
                    ctx,
                    INFO,
                    event_names::CONFIG_LOADED,
                    Stage::Init,
                    "Config loaded",
                    path = path.display().to_string().as_str()
                ),
                None => log_event!(
                    ctx,
                    DEBUG,
                    event_names::CONFIG_DEFAULT_USED,
                    Stage::Init,
                    "No config file found; using defaults"
                ),
            }
            (loaded.config, loaded.snapshot)
        }
    };

    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if let Some(mcs) = args.min_cluster_size {
        config.clustering.min_cluster_size = mcs;
    }
    if let Some(ms) = args.min_samples {
        config.clustering.min_samples = Some(ms);
    }
    if let Some(method) = args.cluster_selection {
        config.clustering.cluster_selection_method = method;
    }
    if args.allow_single_cluster {
        config.clustering.allow_single_cluster = true;
    }
    if let Some(verbosity) = args.verbosity {
        config.report.verbosity = verbosity;
    }
    if let Some(max) = args.max_examples {
        config.report.max_examples = max;
    }

    if let Err(err) = validate_config(&config) {
        log_event!(
            ctx,
            ERROR,
            event_names::CONFIG_ERROR,
            Stage::Init,
            "Invalid configuration",
            error = err.to_string().as_str()
        );
        return Err(err.into());
    }
    let snapshot = snapshot.with_overrides(&config);
    Ok((config, snapshot))
}

fn parse_preset(name: &str) -> Result<PresetName, Error> {
    Ok(name.parse::<PresetName>()?)
}

/// `load_config`, except that an explicit `--config` must exist.
fn load_cli_config(path: Option<&Path>) -> Result<ga_config::LoadedConfig, Error> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
    }
    Ok(load_config(path)?)
}

// ============================================================================
// synth
// ============================================================================

fn run_synth(global: &GlobalOpts, args: &SynthArgs) -> ExitCode {
    let run_id = RunId::new();
    if args.blobs == 0 || args.blobs > DEFAULT_CENTERS.len() {
        eprintln!(
            "ga-core synth: --blobs must be between 1 and {}",
            DEFAULT_CENTERS.len()
        );
        return ExitCode::ArgsError;
    }
    if !(0.0..=1.0).contains(&args.label_weight) {
        eprintln!("ga-core synth: --label-weight must lie in [0, 1]");
        return ExitCode::ArgsError;
    }
    if args.swap_class.is_some_and(|c| c >= args.blobs) {
        eprintln!("ga-core synth: --swap-class must name one of the {} classes", args.blobs);
        return ExitCode::ArgsError;
    }

    let layout = if args.gaussian {
        BlobLayout::Gaussian {
            per_blob: args.per_blob,
            std_dev: args.std_dev,
        }
    } else {
        BlobLayout::default()
    };
    let options = SynthOptions {
        centers: DEFAULT_CENTERS[..args.blobs].to_vec(),
        layout,
        label_weight: args.label_weight,
        swap_class: args.swap_class,
        seed: args.seed,
    };
    let data = generate(&options);
    let json = match DatasetFile::from(&data).to_json_pretty() {
        Ok(j) => j,
        Err(err) => return output_error(global, &run_id, &err),
    };

    match &args.output {
        Some(path) if path.as_os_str() != STDIN_PATH => {
            if let Err(err) = std::fs::write(path, json + "\n") {
                return output_error(global, &run_id, &Error::Io(err));
            }
            tracing::info!(
                path = %path.display(),
                num_examples = data.labels.len(),
                "synthetic dataset written"
            );
        }
        _ => println!("{}", json),
    }
    ExitCode::Clean
}

// ============================================================================
// config
// ============================================================================

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> ExitCode {
    match &args.command {
        ConfigCommands::Show { defaults, preset } => {
            run_config_show(global, *defaults, preset.as_deref())
        }
        ConfigCommands::Validate { path } => {
            run_config_validate(global, path.as_deref().or(global.config.as_deref()))
        }
        ConfigCommands::Presets => run_config_presets(global),
    }
}

/// Display the effective configuration (including defaults if no file is present).
fn run_config_show(global: &GlobalOpts, defaults: bool, preset: Option<&str>) -> ExitCode {
    let run_id = RunId::new();

    let (config, snapshot) = if let Some(name) = preset {
        match parse_preset(name) {
            Ok(p) => {
                let config = get_preset(p);
                let snapshot = ConfigSnapshot::new(&config, &ConfigPaths::default(), None);
                (config, snapshot)
            }
            Err(err) => return output_error(global, &run_id, &err),
        }
    } else if defaults {
        let config = AnalyzerConfig::default();
        let snapshot = ConfigSnapshot::new(&config, &ConfigPaths::default(), None);
        (config, snapshot)
    } else {
        match load_cli_config(global.config.as_deref()) {
            Ok(loaded) => (loaded.config, loaded.snapshot),
            Err(err) => return output_error(global, &run_id, &err),
        }
    };

    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id.to_string(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "source": {
            "path": snapshot.config_path,
            "source": snapshot.config_source,
            "hash": snapshot.config_hash,
        },
        "config": config,
    });

    match global.format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Summary => {
            println!(
                "[{}] config: source={} threshold={} metric={} min_cluster_size={}",
                run_id,
                snapshot.config_source,
                config.threshold,
                config.metric,
                config.clustering.min_cluster_size
            );
        }
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# ga-core config show");
            println!();
            match &snapshot.config_path {
                Some(path) => println!("Source: {}", path),
                None => println!("Source: **{}**", snapshot.config_source),
            }
            println!("Hash: {}", snapshot.short_id());
            println!();
            println!("```json");
            println!("{}", config.to_json().unwrap_or_default());
            println!("```");
        }
    }
    ExitCode::Clean
}

/// Validate a configuration file.
fn run_config_validate(global: &GlobalOpts, path: Option<&Path>) -> ExitCode {
    let run_id = RunId::new();
    let loaded = match load_cli_config(path) {
        Ok(l) => l,
        Err(err) => return output_error(global, &run_id, &err),
    };

    let response = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "run_id": run_id.to_string(),
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "valid",
        "path": loaded.paths.config.as_ref().map(|p| p.display().to_string()),
        "using_defaults": loaded.paths.config.is_none(),
        "config_hash": loaded.snapshot.config_hash,
    });

    match global.format {
        OutputFormat::Json => print_json(&response),
        OutputFormat::Summary => println!("[{}] config validate: OK", run_id),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            println!("# Configuration Validation");
            println!();
            println!("Status: ✓ Valid");
            match &loaded.paths.config {
                Some(p) => println!("File: {}", p.display()),
                None => println!("File: none, using built-in defaults"),
            }
        }
    }
    ExitCode::Clean
}

fn run_config_presets(global: &GlobalOpts) -> ExitCode {
    let presets = list_presets();
    match global.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "schema_version": SCHEMA_VERSION,
            "presets": presets,
        })),
        OutputFormat::Exitcode => {}
        OutputFormat::Summary | OutputFormat::Md => {
            for preset in presets {
                println!("{:<14} {}", preset.name, preset.description);
            }
        }
    }
    ExitCode::Clean
}

// ============================================================================
// schema / version
// ============================================================================

fn run_schema(global: &GlobalOpts, args: &SchemaArgs) -> ExitCode {
    let format = if args.compact {
        SchemaFormat::JsonCompact
    } else {
        SchemaFormat::Json
    };

    if args.list {
        match global.format {
            OutputFormat::Json => print_json(&serde_json::json!(available_schemas()
                .into_iter()
                .map(|(name, description)| serde_json::json!({
                    "name": name,
                    "description": description,
                }))
                .collect::<Vec<_>>())),
            _ => {
                for (name, description) in available_schemas() {
                    println!("{:<18} {}", name, description);
                }
            }
        }
        return ExitCode::Clean;
    }

    if args.all {
        let all = serde_json::json!(generate_all_schemas());
        println!("{}", format_schema(&all, format));
        return ExitCode::Clean;
    }

    let Some(name) = args.type_name.as_deref() else {
        eprintln!("ga-core schema: pass a type name, --list or --all");
        return ExitCode::ArgsError;
    };
    match generate_schema(name) {
        Some(schema) => {
            println!("{}", format_schema(&schema, format));
            ExitCode::Clean
        }
        None => {
            eprintln!(
                "ga-core schema: unknown type '{}'; run 'ga-core schema --list'",
                name
            );
            ExitCode::ArgsError
        }
    }
}

fn print_version(global: &GlobalOpts) {
    let version_info = serde_json::json!({
        "schema_version": SCHEMA_VERSION,
        "ga_core_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => print_json(&version_info),
        OutputFormat::Exitcode => {}
        _ => {
            println!("ga-core {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}

// ============================================================================
// output helpers
// ============================================================================

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(err) => eprintln!("ga-core: failed to serialize output: {}", err),
    }
}

/// Report an error on stderr in the requested format and map it to an exit code.
fn output_error(global: &GlobalOpts, run_id: &RunId, err: &Error) -> ExitCode {
    let exit_code = ExitCode::from(err);
    tracing::error!(
        target: event_names::INTERNAL_ERROR,
        code = err.code(),
        exit_code = exit_code.as_i32(),
        error = %err,
        "command failed"
    );

    match global.format {
        OutputFormat::Json => {
            let structured = StructuredError::from(err)
                .with_context("run_id", run_id.as_str())
                .with_context("exit_code", exit_code.as_i32());
            eprintln!("{}", structured.to_json_pretty());
        }
        OutputFormat::Summary => eprintln!("[{}] error {}: {}", run_id, err.code(), err),
        OutputFormat::Exitcode => {}
        OutputFormat::Md => {
            let color = !global.no_color && std::io::stderr().is_terminal();
            eprintln!("{}", format_error_human(err, color));
        }
    }
    exit_code
}
