use std::io::Read;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use smishguard_client::{Classifier, HttpTransport};
use smishguard_core::ClientConfig;
use tracing_subscriber::EnvFilter;

mod display;

#[derive(Parser)]
#[command(name = "smishguard", version, about = "Check text messages for smishing risk")]
struct Cli {
    /// Base URL of the classification service [default: $SMISHGUARD_API_BASE or http://localhost:8000]
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Request timeout in seconds, 0 disables [default: $SMISHGUARD_TIMEOUT_SECS or 30]
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify a message
    Analyze(AnalyzeArgs),
    /// Check that the classification service is reachable
    Health,
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Message text; read from stdin when omitted
    text: Option<String>,

    /// Pause before sending the request, in milliseconds [default: $SMISHGUARD_REQUEST_DELAY_MS or 800]
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Include the raw evidence source and full response payload
    #[arg(long)]
    raw: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("smishguard v{}", env!("CARGO_PKG_VERSION"));

    let env_config = ClientConfig::from_env().context("reading SMISHGUARD_* environment")?;
    let config = cli.apply(env_config);

    match cli.command {
        Command::Analyze(args) => analyze(config, args).await,
        Command::Health => health(config).await,
    }
}

impl Cli {
    /// Layer command-line flags over the environment-derived config.
    fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout_secs(secs);
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn analyze(config: ClientConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let message = match args.text {
        Some(text) => text,
        None => read_stdin().context("reading message from stdin")?,
    };

    let config = match args.delay_ms {
        Some(ms) => config.with_request_delay(Duration::from_millis(ms)),
        None => config,
    };
    let transport = HttpTransport::new(&config).context("building HTTP client")?;
    let classifier = Classifier::new(transport, config);

    let mut attempt = classifier
        .classify(message.clone())
        .context("starting classification")?;
    let cancel = attempt.cancel_token();

    if !args.json {
        eprintln!("Analyzing message...");
    }

    let outcome = tokio::select! {
        outcome = attempt.outcome() => outcome,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            None
        }
    };

    let Some(outcome) = outcome else {
        eprintln!("Cancelled; no result was produced.");
        return Ok(());
    };

    if args.json {
        let value = display::outcome_json(&outcome);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", display::render_card(&message, &outcome, args.raw));
    }
    Ok(())
}

async fn health(config: ClientConfig) -> anyhow::Result<()> {
    let transport = HttpTransport::new(&config).context("building HTTP client")?;
    transport
        .health(&config)
        .await
        .with_context(|| format!("classification service at {} is not healthy", config.api_base()))?;
    println!("ok: {}", config.health_url());
    Ok(())
}

fn read_stdin() -> anyhow::Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}
