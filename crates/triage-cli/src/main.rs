//! Triage CLI - AI-assisted debugging of Python snippets
//!
//! Usage:
//!   triage                           Interactive prompt
//!   triage --test                    Run the scripted scenarios
//!   triage analyze <input>           Triage one input (or file:<path>)
//!   triage serve [--port] [--open]   Serve the web form
//!   triage init                      Write .triage/config.toml
//!   triage validate-json --schema <file> --payload <file>

mod repl;
mod scenarios;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use triage_core::fail_open::fail_open_text;
use triage_core::TriageConfig;
use triage_orchestrator::{Debugger, Triage};
use triage_tools::{validation_request, ServiceClient};
use triage_web::WebConfig;

#[derive(Parser)]
#[command(name = "triage")]
#[command(author, version, about = "AI-assisted triage of Python defects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run the scripted scenarios and report pass/fail
    #[arg(long)]
    test: bool,

    /// Directory holding .triage/config.toml
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration to .triage/config.toml
    Init,

    /// Triage a single input and print the report
    Analyze {
        /// Description or code, or file:<path>
        input: String,
    },

    /// Serve the web form
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8501")]
        port: u16,

        /// Open the page in a browser
        #[arg(long)]
        open: bool,
    },

    /// Validate a JSON payload against a schema through the validator service
    ValidateJson {
        /// Schema file (JSON)
        #[arg(long)]
        schema: PathBuf,

        /// Payload file (JSON)
        #[arg(long)]
        payload: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if cli.test {
        return cmd_test(&cli.root).await;
    }

    match cli.command {
        None => cmd_repl(&cli.root).await,
        Some(Commands::Init) => cmd_init(&cli.root),
        Some(Commands::Analyze { input }) => cmd_analyze(&cli.root, &input).await,
        Some(Commands::Serve { port, open }) => cmd_serve(&cli.root, port, open).await,
        Some(Commands::ValidateJson { schema, payload }) => {
            cmd_validate_json(&cli.root, &schema, &payload).await
        }
    }
}

fn load_config(root: &Path) -> Result<TriageConfig> {
    TriageConfig::load(root).context("Failed to load .triage/config.toml")
}

async fn connect(root: &Path) -> Result<Debugger> {
    let config = load_config(root)?;
    Debugger::connect(&config, root)
        .await
        .context("Could not start the model backend")
}

fn cmd_init(root: &Path) -> Result<()> {
    info!("Initializing triage in {:?}", root);

    let path = TriageConfig::write_default(root).context("Failed to write config")?;

    println!("Initialized triage in {:?}", root);
    println!("Created:");
    println!("  {}", path.display());
    Ok(())
}

async fn cmd_repl(root: &Path) -> Result<()> {
    let debugger = connect(root).await?;
    let mode = debugger.strategy().to_string();
    repl::run(&debugger, &mode).await
}

async fn cmd_analyze(root: &Path, input: &str) -> Result<()> {
    let input = repl::resolve_input(input);
    let debugger = connect(root).await?;

    let report = debugger.debug_tool_issue(&input).await;
    println!("{}", repl::format_report(&report));
    Ok(())
}

async fn cmd_test(root: &Path) -> Result<()> {
    let debugger = connect(root).await?;
    let results = scenarios::run_all(&debugger).await;

    for result in &results {
        println!("\n🧪 Test: {}", result.scenario.name);
        if result.passed {
            println!("✅ Passed");
        } else {
            println!("❌ Failed");
            println!("{}", repl::format_report(&result.report));
        }
    }

    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        anyhow::bail!("{} of {} scenarios failed", failed, results.len());
    }
    Ok(())
}

async fn cmd_serve(root: &Path, port: u16, open: bool) -> Result<()> {
    let debugger = connect(root).await?;
    let config = WebConfig {
        port,
        open_browser: open,
    };
    triage_web::run(Arc::new(debugger), config).await
}

async fn cmd_validate_json(root: &Path, schema: &Path, payload: &Path) -> Result<()> {
    let config = load_config(root)?;
    let client = ServiceClient::new(&config.services).context("Failed to build service client")?;

    let request = validation_request(schema, payload);
    let result = fail_open_text("JSONValidator", || client.validate_json(&request)).await;

    println!("{}", repl::format_report(&result));
    Ok(())
}
