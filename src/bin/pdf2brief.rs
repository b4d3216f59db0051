//! CLI binary for pdf2brief.
//!
//! `serve` runs the HTTP service; `run` briefs one local file without HTTP;
//! `crew-config` prints the effective agent/task YAML.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdf2brief::{
    server, BriefConfig, Briefer, CorsPolicy, CrewConfig, PageSeparator, ServerConfig,
};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve on this machine's LAN address, port 5010
  pdf2brief serve

  # Serve on localhost only, restricting browser origins
  pdf2brief serve --host 127.0.0.1 --allowed-origin https://app.example.org

  # Brief a local file and print the JSON
  pdf2brief run report.pdf > brief.json

  # Customise the agent/task prompts
  pdf2brief crew-config --out ./crew
  $EDITOR ./crew/tasks.yaml
  pdf2brief serve --crew-dir ./crew

  # Call the running service
  curl -F "file=@report.pdf;type=application/pdf" http://192.168.1.20:5010/file-handler

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  GOOGLE_API_KEY          Same as GEMINI_API_KEY, accepted as an alternative
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to an existing libpdfium; skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory

  Variables may also be placed in a .env file in the working directory.
"#;

/// Turn uploaded PDFs into Markdown plus a structured LLM briefing.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2brief",
    version,
    about = "Turn PDFs into Markdown plus a structured LLM briefing",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2BRIEF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2BRIEF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve {
        #[command(flatten)]
        brief: BriefArgs,

        /// Address to bind. Defaults to this machine's LAN address.
        #[arg(long, env = "PDF2BRIEF_HOST")]
        host: Option<IpAddr>,

        /// Port to bind.
        #[arg(long, env = "PDF2BRIEF_PORT", default_value_t = pdf2brief::config::DEFAULT_PORT)]
        port: u16,

        /// Allowed browser origin; repeat for several. Omit (or pass `*`) to
        /// allow any origin.
        #[arg(long = "allowed-origin", env = "PDF2BRIEF_ALLOWED_ORIGINS", value_delimiter = ',')]
        allowed_origins: Vec<String>,

        /// Largest accepted upload, in MiB.
        #[arg(long, env = "PDF2BRIEF_MAX_UPLOAD_MB", default_value_t = 50)]
        max_upload_mb: usize,
    },

    /// Brief one local PDF and print the result as JSON.
    Run {
        /// PDF file to brief.
        input: PathBuf,

        #[command(flatten)]
        brief: BriefArgs,
    },

    /// Print the effective agents.yaml and tasks.yaml.
    CrewConfig {
        /// Directory to read agent/task YAML from (defaults to the built-in crew).
        #[arg(long, env = "PDF2BRIEF_CREW_DIR")]
        crew_dir: Option<PathBuf>,

        /// Write agents.yaml and tasks.yaml into this directory instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Settings shared by `serve` and `run`.
#[derive(Args, Debug)]
struct BriefArgs {
    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// LLM model ID (default: gemini-2.0-flash).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Directory containing agents.yaml and tasks.yaml.
    #[arg(long, env = "PDF2BRIEF_CREW_DIR")]
    crew_dir: Option<PathBuf>,

    /// Task to run (a key in tasks.yaml).
    #[arg(long, env = "PDF2BRIEF_TASK")]
    task: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2BRIEF_PASSWORD")]
    password: Option<String>,

    /// Page separator: none, hr, comment, or a custom string.
    #[arg(long, env = "PDF2BRIEF_SEPARATOR", default_value = "hr")]
    separator: String,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2BRIEF_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "PDF2BRIEF_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to an existing libpdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_library: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is the normal case.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
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
        Command::Serve {
            brief,
            host,
            port,
            allowed_origins,
            max_upload_mb,
        } => {
            let config = build_config(&brief)?;
            ensure_pdfium(&brief)?;

            let briefer = Briefer::from_config(&config).context("Failed to set up the briefer")?;
            let server_config = ServerConfig {
                host: host.unwrap_or_else(pdf2brief::config::local_ip),
                port,
                cors: CorsPolicy::from_origins(allowed_origins),
                max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            };
            info!(
                "Using crew task '{}' with CORS policy {:?}",
                config.crew.task, server_config.cors
            );

            server::serve(&server_config, server::AppState::new(briefer), shutdown_signal())
                .await
                .context("Server failed")?;
        }

        Command::Run { input, brief } => {
            let config = build_config(&brief)?;
            ensure_pdfium(&brief)?;

            let output = pdf2brief::brief_file(&input, &config)
                .await
                .with_context(|| format!("Failed to brief {}", input.display()))?;

            let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
        }

        Command::CrewConfig { crew_dir, out } => {
            let crew = load_crew(crew_dir.as_ref())?;
            let (agents, tasks) = crew.to_yaml().context("Failed to render crew YAML")?;

            match out {
                Some(dir) => {
                    std::fs::create_dir_all(&dir)
                        .with_context(|| format!("Failed to create {}", dir.display()))?;
                    std::fs::write(dir.join("agents.yaml"), agents)
                        .context("Failed to write agents.yaml")?;
                    std::fs::write(dir.join("tasks.yaml"), tasks)
                        .context("Failed to write tasks.yaml")?;
                    if !cli.quiet {
                        eprintln!("Wrote agents.yaml and tasks.yaml to {}", dir.display());
                    }
                }
                None => {
                    println!("# agents.yaml\n{agents}");
                    println!("# tasks.yaml\n{tasks}");
                }
            }
        }
    }

    Ok(())
}

fn load_crew(dir: Option<&PathBuf>) -> Result<CrewConfig> {
    match dir {
        Some(dir) => CrewConfig::from_dir(dir)
            .with_context(|| format!("Failed to load crew from {}", dir.display())),
        None => Ok(CrewConfig::default()),
    }
}

/// Map CLI args to `BriefConfig`.
fn build_config(args: &BriefArgs) -> Result<BriefConfig> {
    let mut crew = load_crew(args.crew_dir.as_ref())?;
    if let Some(ref task) = args.task {
        crew = crew.with_task(task.clone());
    }

    let mut builder = BriefConfig::builder()
        .temperature(args.temperature)
        .max_tokens(args.max_tokens)
        .page_separator(PageSeparator::parse(&args.separator))
        .crew(crew);

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref password) = args.password {
        builder = builder.password(password.clone());
    }
    if let Some(ref path) = args.pdfium_library {
        builder = builder.pdfium_library(path.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Make sure a pdfium library is available before the first request needs it.
///
/// The first run downloads it (~30 MB) into the user cache; later runs only
/// check the path.
fn ensure_pdfium(args: &BriefArgs) -> Result<()> {
    if args.pdfium_library.is_some() || pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }

    info!("Downloading the PDFium engine (first run only)");
    tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
        .context("Failed to download PDFium engine")?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
