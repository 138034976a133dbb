//! CLI binary for resumind.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig` / `AnalysisConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumind::pipeline::input::load_input;
use resumind::services::{JsonFileKvStore, LlmFeedbackService, LocalFileStorage};
use resumind::workflow::load_record;
use resumind::{
    AnalysisConfig, AnalysisProgressCallback, AnalysisStage, AnalyzeRequest, ConversionOutcome,
    ConverterConfig, PdfToImageConverter, ResumeAnalyzer, ResumeRecord,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner showing the current analysis stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: AnalysisStage) {
        if stage == AnalysisStage::Complete {
            return;
        }
        self.bar.set_message(stage.status_text());
    }

    fn on_failure(&self, stage: AnalysisStage, error: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}  {}", red("✘"), bold(stage.status_text()), red(error));
    }

    fn on_complete(&self, record_id: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} Analysis complete  {}", green("✔"), dim(record_id));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render page 1 of a résumé to resume.png
  resumind convert resume.pdf

  # Explicit output path, JSON report on stdout
  resumind convert resume.pdf -o preview.png --json

  # Convert from URL
  resumind convert https://example.com/cv.pdf

  # Full review against a job posting
  resumind analyze resume.pdf --company Acme --job-title "Backend Engineer" \
      --job-description-file posting.txt

  # Print a stored review
  resumind show 6f1c0c9e-2f4a-4c53-9a83-0b8e1f6f2a10

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  RESUMIND_LLM_PROVIDER   Override provider (openai, anthropic, gemini, ollama)
  RESUMIND_MODEL          Override model ID
  RESUMIND_STORE          Directory for uploads and records
  PDFIUM_LIB_PATH         Path to an existing libpdfium
  RESUMIND_PDFIUM_DIR     Directory searched for libpdfium
"#;

/// Résumé previews and AI feedback.
#[derive(Parser, Debug)]
#[command(
    name = "resumind",
    version,
    about = "Render résumé PDFs to PNG previews and review them with a vision LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RESUMIND_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RESUMIND_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render page 1 of a PDF to PNG.
    Convert(ConvertArgs),
    /// Upload, convert and review a résumé.
    Analyze(AnalyzeArgs),
    /// Print a stored review.
    Show(ShowArgs),
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Path to libpdfium. Searched in standard locations when unset.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "RESUMIND_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "RESUMIND_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the PNG here. Default: the input name with a `.png` extension.
    #[arg(short, long, env = "RESUMIND_OUTPUT")]
    output: Option<PathBuf>,

    /// Print a JSON report on stdout.
    #[arg(long, env = "RESUMIND_JSON")]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Company the résumé is submitted to.
    #[arg(long)]
    company: String,

    /// Job title of the posting.
    #[arg(long)]
    job_title: String,

    /// Job description text.
    #[arg(long, conflicts_with = "job_description_file")]
    job_description: Option<String>,

    /// Read the job description from this file.
    #[arg(long)]
    job_description_file: Option<PathBuf>,

    #[command(flatten)]
    store: StoreArgs,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "RESUMIND_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "RESUMIND_LLM_PROVIDER")]
    provider: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "RESUMIND_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens.
    #[arg(long, env = "RESUMIND_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "RESUMIND_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "RESUMIND_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print the record as JSON on stdout.
    #[arg(long, env = "RESUMIND_JSON")]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Record id printed by `analyze`.
    id: String,

    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// Directory for uploaded files and the record store.
    #[arg(long, env = "RESUMIND_STORE", default_value = ".resumind")]
    store: PathBuf,
}

impl StoreArgs {
    fn storage(&self) -> LocalFileStorage {
        LocalFileStorage::new(self.store.join("files"))
    }

    fn kv(&self) -> JsonFileKvStore {
        JsonFileKvStore::new(self.store.join("records.json"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner covers INFO-level progress during `analyze`.
    let spinner = !cli.quiet && matches!(cli.command, Command::Analyze(ref a) if !a.json);
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Convert(ref args) => run_convert(args, cli.quiet).await,
        Command::Analyze(ref args) => run_analyze(args, spinner).await,
        Command::Show(ref args) => run_show(args).await,
    }
}

fn build_converter_config(engine: &EngineArgs) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder();
    if let Some(ref path) = engine.pdfium {
        builder = builder.pdfium_library_path(path);
    }
    if let Some(ref pwd) = engine.password {
        builder = builder.password(pwd);
    }
    builder.build().context("Invalid configuration")
}

// ── convert ──────────────────────────────────────────────────────────────────

async fn run_convert(args: &ConvertArgs, quiet: bool) -> Result<()> {
    let converter = PdfToImageConverter::new(build_converter_config(&args.engine)?);
    let input = load_input(&args.input, args.engine.download_timeout)
        .await
        .context("Failed to read input")?;

    let result = converter.convert(input).await;
    if args.json {
        let outcome = ConversionOutcome::from_result(&result);
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).context("Failed to serialise report")?
        );
    }
    let image = result.context("Conversion failed")?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&image.file.name));
    write_atomic(&output, &image.file.bytes).await?;
    image.image_url.revoke();

    if !quiet && !args.json {
        eprintln!(
            "{}  {}x{} px  {} bytes  →  {}",
            green("✔"),
            image.width,
            image.height,
            image.file.len(),
            bold(&output.display().to_string()),
        );
    }
    Ok(())
}

/// Write through a temporary sibling so a failed write leaves no partial file.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("png.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    Ok(())
}

// ── analyze ──────────────────────────────────────────────────────────────────

async fn run_analyze(args: &AnalyzeArgs, spinner: bool) -> Result<()> {
    let job_description = match (&args.job_description, &args.job_description_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description from {:?}", path))?,
        (None, None) => String::new(),
    };
    let system_prompt = match args.system_prompt {
        Some(ref path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        ),
        None => None,
    };

    let mut builder = AnalysisConfig::builder()
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout);
    if let Some(ref model) = args.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if spinner {
        builder = builder.progress_callback(CliProgressCallback::new());
    }
    let config = builder.build().context("Invalid configuration")?;

    let storage = Arc::new(args.store.storage());
    let kv = Arc::new(args.store.kv());
    let ai = LlmFeedbackService::from_config(storage.clone(), config.clone())
        .context("Failed to initialise LLM provider")?;
    let converter = PdfToImageConverter::new(build_converter_config(&args.engine)?);
    let analyzer = ResumeAnalyzer::new(converter, storage, kv, Arc::new(ai), &config);

    let resume = load_input(&args.input, args.engine.download_timeout)
        .await
        .context("Failed to read input")?;
    let record = analyzer
        .analyze(AnalyzeRequest {
            company_name: args.company.clone(),
            job_title: args.job_title.clone(),
            job_description,
            resume,
        })
        .await
        .context("Analysis failed")?;

    print_record(&record, args.json)
}

// ── show ─────────────────────────────────────────────────────────────────────

async fn run_show(args: &ShowArgs) -> Result<()> {
    let kv = args.store.kv();
    let record = load_record(&kv, &args.id)
        .await
        .context("Failed to load record")?;
    print_record(&record, true)
}

fn print_record(record: &ResumeRecord, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(record).context("Failed to serialise record")?
        );
        return Ok(());
    }

    println!("Id:       {}", record.id);
    println!("Company:  {}", record.company_name);
    println!("Job:      {}", record.job_title);
    println!("Résumé:   {}", record.resume_path);
    println!("Preview:  {}", record.image_path);
    if let Some(score) = record.feedback.get("overallScore") {
        println!("Score:    {}", bold(&score.to_string()));
    }
    for section in ["ATS", "toneAndStyle", "content", "structure", "skills"] {
        if let Some(score) = record.feedback.get(section).and_then(|s| s.get("score")) {
            println!("  {:<14}{}", section, score);
        }
    }
    Ok(())
}
