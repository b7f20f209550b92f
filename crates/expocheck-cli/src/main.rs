use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use expocheck_core::{
    render_findings, ClientSettings, HttpTransport, OutputFormat, ProgressView, ScanController,
    ScanOutcome,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "expocheck",
    author,
    version,
    about = "Follow a remote secret-scanning job and render its findings"
)]
struct Cli {
    /// Base URL of the scan backend API
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submit a repository path for scanning and follow the job to completion
    Scan {
        /// Filesystem path of the repository to scan
        path: String,
        /// Emit findings as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan { path, json } => scan(cli.api_url, &path, json).await?,
    }
    Ok(())
}

/// Prints each progress snapshot as a line; in-job errors go to stderr on a
/// visually distinct channel.
struct TerminalView;

impl ProgressView for TerminalView {
    fn progress(&mut self, progress: f32, message: &str) {
        println!("[{progress:>3.0}%] {message}");
    }

    fn scan_error(&mut self, message: &str) {
        eprintln!("{}", format!("Error: {message}").red());
    }
}

async fn scan(api_url: Option<String>, path: &str, json: bool) -> Result<()> {
    let mut settings = ClientSettings::from_env();
    if let Some(url) = api_url {
        settings.base_url = url;
    }
    let transport = HttpTransport::new(&settings)?;
    let mut controller = ScanController::new(transport);
    let mut view = TerminalView;

    match controller.run_scan(path, &mut view).await? {
        ScanOutcome::Completed { findings } => {
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
            print!("{}", render_findings(&findings, format)?);
            Ok(())
        }
        ScanOutcome::Rejected { message } => bail!("{message}"),
        ScanOutcome::ConnectFailed => {
            bail!("failed to connect to backend at {}", settings.base_url)
        }
        ScanOutcome::ConnectionLost => bail!("connection lost"),
        ScanOutcome::Cancelled => bail!("scan cancelled"),
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tokio=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
