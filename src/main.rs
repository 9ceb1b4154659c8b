// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use subweave::app_config::{Config, LogLevel};
use subweave::errors::AppError;
use subweave::fetch::HttpFetcher;
use subweave::resolver::{parse_entry_url, ResolutionFailure, ResolveRequest, ResolvedCaptions, ResolverOptions, SubtitleResolver};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// Options shared by every subcommand that talks to the network
#[derive(Parser, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Entry manifest URL(s) captured from the player
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Correlation id returned with the result (generated when omitted)
    #[arg(short = 'i', long)]
    video_id: Option<String>,

    /// Write the caption document to this file instead of stdout
    #[arg(short, long, conflicts_with = "json")]
    output: Option<PathBuf>,

    /// Print results and failures as JSON lines
    #[arg(short, long)]
    json: bool,

    /// Number of subtitle segments fetched concurrently
    #[arg(short, long)]
    parallel: Option<usize>,

    /// Deadline for each resolution in seconds (0 disables it)
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct ClassifyArgs {
    /// URL to fetch and classify
    #[arg(value_name = "URL")]
    url: String,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve manifest URLs into stitched WebVTT documents
    Resolve(ResolveArgs),

    /// Fetch a URL once and report what kind of document it serves
    Classify(ClassifyArgs),

    /// Generate shell completions for subweave
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subweave - subtitle playlist resolution and segment stitching
///
/// Follows an HLS manifest down to its subtitle track and stitches the
/// subtitle segments into one WebVTT document.
#[derive(Parser, Debug)]
#[command(name = "subweave")]
#[command(version)]
#[command(about = "Resolve HLS subtitle playlists into a single WebVTT document")]
#[command(long_about = "subweave follows an HLS manifest URL down to its subtitle track and stitches the subtitle segments into one WebVTT document.

EXAMPLES:
    subweave resolve https://cdn.example.com/master.m3u8              # Print the document
    subweave resolve -o en.vtt https://cdn.example.com/master.m3u8    # Save it to a file
    subweave resolve --json -p 4 URL1 URL2                            # Resolve two videos, JSON output
    subweave classify https://cdn.example.com/master.m3u8             # Show what a URL serves
    subweave completions bash > subweave.bash                         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and label for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level && metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, label) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                colour, now, label, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    let result = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subweave", &mut std::io::stdout());
            Ok(true)
        }
        Commands::Resolve(args) => run_resolve(args).await,
        Commands::Classify(args) => run_classify(args).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load configuration, apply command line overrides, validate and set the log level
fn load_config(common: &CommonArgs) -> Result<Config, AppError> {
    if let Some(level) = &common.log_level {
        let level: LogLevel = level.clone().into();
        log::set_max_level(LevelFilter::from(&level));
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(level) = &common.log_level {
        config.log_level = level.clone().into();
    }
    if let Some(secs) = common.request_timeout {
        config.fetch.request_timeout_secs = secs;
    }

    config.validate().map_err(|e| AppError::Config(format!("{:#}", e)))?;
    log::set_max_level(LevelFilter::from(&config.log_level));

    Ok(config)
}

async fn run_resolve(args: ResolveArgs) -> Result<bool> {
    let mut config = load_config(&args.common)?;

    if let Some(parallel) = args.parallel {
        config.fetch.max_parallel_segments = parallel;
    }
    if let Some(timeout) = args.timeout {
        config.fetch.pipeline_timeout_secs = timeout;
    }
    config.validate()?;

    if args.output.is_some() && args.urls.len() > 1 {
        return Err(anyhow!("--output can only be used with a single URL"));
    }

    let fetcher = Arc::new(HttpFetcher::from_config(&config.fetch)?);
    let resolver = SubtitleResolver::with_options(fetcher, ResolverOptions::from(&config.fetch));
    let requests = build_requests(&args.urls, args.video_id.as_deref());

    info!("Resolving {} manifest URL(s)", requests.len());
    let results = resolver.resolve_all(requests).await;

    let mut all_ok = true;
    for result in results {
        match result {
            Ok(resolved) => report_success(&resolved, &args)?,
            Err(failure) => {
                all_ok = false;
                report_failure(&failure, args.json)?;
            }
        }
    }

    Ok(all_ok)
}

/// One request per URL; ids are the given id, `<id>-<n>` for several URLs, or random
fn build_requests(urls: &[String], video_id: Option<&str>) -> Vec<ResolveRequest> {
    urls.iter()
        .enumerate()
        .map(|(index, url)| {
            let id = match video_id {
                Some(id) if urls.len() == 1 => id.to_string(),
                Some(id) => format!("{}-{}", id, index + 1),
                None => uuid::Uuid::new_v4().to_string(),
            };
            ResolveRequest::new(id, url.clone())
        })
        .collect()
}

fn report_success(resolved: &ResolvedCaptions, args: &ResolveArgs) -> Result<(), AppError> {
    if let Some(stats) = resolved.stats {
        info!(
            "[{}] {}/{} segments stitched",
            resolved.video_id, stats.succeeded, stats.attempted
        );
    }

    if args.json {
        let line = serde_json::to_string(resolved).map_err(|e| AppError::Unknown(e.to_string()))?;
        println!("{}", line);
    } else if let Some(path) = &args.output {
        write_document(path, &resolved.document)?;
        info!("[{}] Success: {:?}", resolved.video_id, path);
    } else {
        let mut stdout = std::io::stdout();
        stdout.write_all(resolved.document.as_bytes())?;
        stdout.flush()?;
    }
    Ok(())
}

fn report_failure(failure: &ResolutionFailure, json: bool) -> Result<(), AppError> {
    error!("{}", failure);
    if json {
        let line = serde_json::to_string(failure).map_err(|e| AppError::Unknown(e.to_string()))?;
        println!("{}", line);
    }
    Ok(())
}

fn write_document(path: &Path, document: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, document)?;
    Ok(())
}

async fn run_classify(args: ClassifyArgs) -> Result<bool> {
    let config = load_config(&args.common)?;
    let url = parse_entry_url(&args.url)?;
    let resolver = SubtitleResolver::new(HttpFetcher::from_config(&config.fetch)?);

    let kind = resolver.classify_url(&url).await?;
    println!("{}", kind);
    Ok(true)
}
