//! CLI binary for middleman-tools.
//!
//! A thin shim over the library: each subcommand maps to one `ToolsClient`
//! call and prints the primary result to stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use middleman_tools::mcp::{serve_stdio, McpServer};
use middleman_tools::tools::format_pages;
use middleman_tools::{
    ClientConfig, PageImage, PageSource, Presentation, TemplateDefaults, ToolsClient,
    API_KEY_ENV, DEFAULT_BASE_URL,
};
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r##"EXAMPLES:
  # Markdown from stdin → PDF download URL
  echo "# Sample" | middleman md_to_pdf

  # Use a PDF template
  middleman md_to_pdf --template-id 0bb238bd-d03a-4f1a-be6f-fe2e0c6e91f7 < notes.md

  # One image URL per page
  middleman pdf_to_page_images report.pdf

  # Inspect a PPTX template, then fill it
  middleman json_to_pptx_analyze <TEMPLATE_ID>
  middleman json_to_pptx_execute <TEMPLATE_ID> < slides.json

  # Run as an MCP server on stdio
  middleman mcp

ENVIRONMENT VARIABLES:
  MIDDLEMAN_API_KEY           API key (required)
  MIDDLEMAN_BASE_URL          Override the API endpoint
  MIDDLEMAN_TIMEOUT           Request timeout in seconds
  MIDDLEMAN_PDF_TEMPLATE_ID   Default PDF template (mcp)
  MIDDLEMAN_DOCX_TEMPLATE_ID  Default DOCX template (mcp)
  MIDDLEMAN_TEMPLATE_ID       Default PPTX template (mcp)
  RUST_LOG                    Log filter, e.g. middleman_tools=debug
"##;

/// Convert documents with the Middleman.ai API.
#[derive(Parser, Debug)]
#[command(
    name = "middleman",
    version,
    about = "Convert Markdown to PDF/DOCX/PPTX, render page images and fill PPTX templates via Middleman.ai",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// API key.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// API base URL.
    #[arg(long, env = "MIDDLEMAN_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "MIDDLEMAN_TIMEOUT", default_value_t = 30, global = true)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress the spinner and all logs except errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "snake_case")]
enum Command {
    /// Convert Markdown (stdin) to PDF.
    MdToPdf {
        /// PDF template ID.
        #[arg(long)]
        template_id: Option<String>,
    },
    /// Convert Markdown (stdin) to DOCX.
    MdToDocx {
        /// DOCX template ID.
        #[arg(long)]
        template_id: Option<String>,
    },
    /// Convert Markdown (stdin) to PPTX.
    MdToPptx,
    /// Render each page of a PDF as an image.
    PdfToPageImages {
        path: PathBuf,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Render each slide of a PPTX as an image.
    PptxToPageImages {
        path: PathBuf,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Render each page of a DOCX as an image.
    DocxToPageImages {
        path: PathBuf,
        #[arg(long)]
        request_id: Option<String>,
    },
    /// Print the slide layouts and placeholders of a PPTX template.
    JsonToPptxAnalyze { template_id: String },
    /// Fill a PPTX template with presentation JSON read from stdin.
    JsonToPptxExecute { template_id: String },
    /// List the tools the service offers.
    ListTools,
    /// Run the MCP server on stdin/stdout.
    Mcp,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries results (or MCP frames), so logs always go to stderr.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if matches!(cli.command, Command::Mcp) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Checked before anything touches the network.
    let api_key = cli
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .with_context(|| format!("{API_KEY_ENV} environment variable is required"))?;

    let config = ClientConfig::builder()
        .api_key(api_key)
        .base_url(cli.base_url.clone())
        .timeout_secs(cli.timeout)
        .build()?;
    let client = ToolsClient::new(config)?;
    let spinner = !cli.quiet;

    match cli.command {
        Command::MdToPdf { template_id } => {
            let markdown = read_stdin().await?;
            let url = with_spinner(spinner, "Converting to PDF…", async {
                client.md_to_pdf(&markdown, template_id.as_deref()).await
            })
            .await?;
            println!("{url}");
        }
        Command::MdToDocx { template_id } => {
            let markdown = read_stdin().await?;
            let url = with_spinner(spinner, "Converting to DOCX…", async {
                client.md_to_docx(&markdown, template_id.as_deref()).await
            })
            .await?;
            println!("{url}");
        }
        Command::MdToPptx => {
            let markdown = read_stdin().await?;
            let url = with_spinner(spinner, "Converting to PPTX…", async {
                client.md_to_pptx(&markdown).await
            })
            .await?;
            println!("{url}");
        }
        Command::PdfToPageImages { path, request_id } => {
            let pages = page_images(&client, spinner, path, PageSource::Pdf, request_id).await?;
            println!("{}", format_pages(&pages));
        }
        Command::PptxToPageImages { path, request_id } => {
            let pages = page_images(&client, spinner, path, PageSource::Pptx, request_id).await?;
            println!("{}", format_pages(&pages));
        }
        Command::DocxToPageImages { path, request_id } => {
            let pages = page_images(&client, spinner, path, PageSource::Docx, request_id).await?;
            println!("{}", format_pages(&pages));
        }
        Command::JsonToPptxAnalyze { template_id } => {
            let slides = with_spinner(spinner, "Analysing template…", async {
                client.json_to_pptx_analyze(&template_id).await
            })
            .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&slides).context("Failed to serialise slides")?
            );
        }
        Command::JsonToPptxExecute { template_id } => {
            let json = read_stdin().await?;
            let presentation = Presentation::from_json(&json).context("Invalid JSON input")?;
            let url = with_spinner(spinner, "Generating PPTX…", async {
                client.json_to_pptx_execute(&template_id, &presentation).await
            })
            .await?;
            println!("{url}");
        }
        Command::ListTools => {
            let tools = with_spinner(spinner, "Fetching tools…", async {
                client.list_tools().await
            })
            .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&tools).context("Failed to serialise tools")?
            );
        }
        Command::Mcp => {
            let server = McpServer::new(client, TemplateDefaults::from_env());
            serve_stdio(&server).await.context("MCP server I/O failed")?;
        }
    }

    Ok(())
}

async fn page_images(
    client: &ToolsClient,
    spinner: bool,
    path: PathBuf,
    source: PageSource,
    request_id: Option<String>,
) -> Result<Vec<PageImage>> {
    if !path.exists() {
        anyhow::bail!("File not found: '{}'", path.display());
    }
    let pages = with_spinner(spinner, "Rendering page images…", async {
        client
            .file_to_page_images(&path, source, request_id.as_deref())
            .await
    })
    .await?;
    Ok(pages)
}

async fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("Failed to read stdin")?;
    Ok(buf)
}

/// Show a stderr spinner while `fut` runs. indicatif hides it when stderr is
/// not a terminal.
async fn with_spinner<T, F>(enabled: bool, message: &'static str, fut: F) -> F::Output
where
    F: Future<Output = T>,
{
    if !enabled {
        return fut.await;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    let out = fut.await;
    bar.finish_and_clear();
    out
}
