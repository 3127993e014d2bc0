use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use reelpost::config::{DeliveryConfig, RelayConfig};
use reelpost::dashboard::{SendResponse, SummaryResponse};
use reelpost::node::Node;
use reelpost::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "reelpost")]
#[command(version)]
#[command(about = "Delivers media files to a messaging channel through a worker queue")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start a reelpost node
    Server(ServerArgs),

    /// Show the status of every job on a running node
    Status {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Submit a batch file (JSON `{"items": [...]}`) to a running node
    Send {
        #[command(flatten)]
        client: ClientArgs,

        /// Path to the batch file
        file: PathBuf,
    },
}

// =============================================================================
// Server Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServerArgs {
    /// Address to bind the dashboard to
    #[arg(long, env = "REELPOST_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the dashboard
    #[arg(long, env = "REELPOST_PORT", default_value = "8080")]
    port: u16,

    /// Number of workers pulling from the job queue
    #[arg(long, env = "REELPOST_WORKERS", default_value = "1")]
    workers: usize,

    /// Jobs buffered before enqueueing waits for a worker
    #[arg(long, env = "REELPOST_QUEUE_CAPACITY", default_value = "100")]
    queue_capacity: usize,

    /// Target channel; deliveries are only logged when unset
    #[arg(long, env = "TELEGRAM_CHAN")]
    channel: Option<String>,

    /// Stars attached to paid items
    #[arg(long, env = "REELPOST_STARS", default_value = "10")]
    stars: u32,

    /// Every Nth item of a batch, starting with the first, is sent free (0 disables)
    #[arg(long, env = "REELPOST_STARS_EVERY", default_value = "10")]
    stars_every: usize,
}

// =============================================================================
// Client Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ClientArgs {
    /// Node address
    #[arg(long, short = 'a', default_value = "http://127.0.0.1:8080")]
    addr: String,

    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    output: OutputFormat,
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct StatusOutput {
    jobs: BTreeMap<String, String>,
    summary: Option<SummaryResponse>,
}

// =============================================================================
// Server Implementation
// =============================================================================

async fn run_server(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig {
        listen_addr: SocketAddr::new(args.host, args.port),
        workers: args.workers.max(1),
        queue_capacity: args.queue_capacity.max(1),
        delivery: DeliveryConfig {
            channel: args.channel,
            stars_every: args.stars_every,
            stars: args.stars,
        },
    };

    if !config.delivery.is_configured() {
        tracing::warn!("No delivery channel configured, items will only be logged");
    }

    tracing::info!(
        listen_addr = %config.listen_addr,
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        channel = ?config.delivery.channel,
        "Starting reelpost node"
    );

    let shutdown = install_shutdown_handler();
    let node = Node::dry_run(config);
    node.run(shutdown).await?;

    Ok(())
}

// =============================================================================
// Client Command Handlers
// =============================================================================

fn endpoint(addr: &str, path: &str) -> String {
    format!("{}{}", addr.trim_end_matches('/'), path)
}

async fn handle_status(
    client: &reqwest::Client,
    args: &ClientArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let jobs: BTreeMap<String, String> = client
        .get(endpoint(&args.addr, "/status"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let summary = match client
        .get(endpoint(&args.addr, "/api/summary"))
        .send()
        .await
    {
        Ok(response) => response.json::<SummaryResponse>().await.ok(),
        Err(e) => {
            tracing::debug!(error = %e, "Summary unavailable");
            None
        }
    };

    match args.output {
        OutputFormat::Json => {
            let output = StatusOutput { jobs, summary };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Table => {
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<60} STATUS", "JOB ID");
                println!("{}", "-".repeat(72));
                for (id, status) in &jobs {
                    let id_display = if id.chars().count() > 58 {
                        format!("{}...", id.chars().take(55).collect::<String>())
                    } else {
                        id.clone()
                    };
                    println!("{:<60} {}", id_display, status);
                }
            }
            if let Some(s) = summary {
                println!();
                println!(
                    "total {}  queued {}  processing {}  done {}  failed {}  buffered {}",
                    s.total, s.queued, s.processing, s.done, s.failed, s.pending
                );
            }
        }
    }
    Ok(())
}

async fn handle_send(
    client: &reqwest::Client,
    args: &ClientArgs,
    file: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let raw = tokio::fs::read_to_string(&file).await?;
    let batch: serde_json::Value = serde_json::from_str(&raw)?;

    let response = client
        .post(endpoint(&args.addr, "/send"))
        .json(&batch)
        .send()
        .await?;
    let status = response.status();
    let text = response.text().await?;
    let body = parse_send_response(status, &text)?;

    if !body.success {
        eprintln!(
            "Error: batch rejected ({}): {}",
            status,
            body.error.unwrap_or_default()
        );
        std::process::exit(1);
    }

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body)?),
        OutputFormat::Table => {
            println!("Batch accepted!");
            println!("Jobs queued:     {}", body.accepted);
            println!("Jobs discarded:  {}", body.cleared);
        }
    }
    Ok(())
}

/// Decode a `/send` reply. Only accepted and validation-rejected replies carry
/// a JSON body; anything else (malformed request, wrong content type) is
/// reported with its status and raw text.
fn parse_send_response(
    status: reqwest::StatusCode,
    text: &str,
) -> Result<SendResponse, Box<dyn std::error::Error>> {
    if !status.is_success() && status != reqwest::StatusCode::UNPROCESSABLE_ENTITY {
        return Err(format!("node returned {}: {}", status, text.trim()).into());
    }
    Ok(serde_json::from_str(text)?)
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    match args.command {
        Commands::Server(server_args) => {
            run_server(server_args).await?;
        }
        Commands::Status { client } => {
            let http = reqwest::Client::new();
            handle_status(&http, &client).await?;
        }
        Commands::Send { client, file } => {
            let http = reqwest::Client::new();
            handle_send(&http, &client, file).await?;
        }
    }

    Ok(())
}
