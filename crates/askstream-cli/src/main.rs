//! `askstream` command-line client.
//!
//! Streams an answer to stdout as it is generated, then prints follow-up
//! questions. Connection settings come from `ASKSTREAM_*` variables (a `.env`
//! file is loaded if present) and can be overridden with flags.

mod observability;
mod printer;

use std::time::Duration;

use anyhow::Context as _;
use askstream::{AbortHandle, AskClient, AskResult, ClientConfig};
use clap::Parser;
use tracing::{debug, info};

use crate::printer::TerminalPrinter;

#[derive(Debug, Parser)]
#[command(name = "askstream", version, about = "Ask a question and stream the answer")]
struct Cli {
    /// Question to ask.
    question: String,
    /// Index (or table) to retrieve from.
    #[arg(long)]
    index: Option<String>,
    /// Maximum number of hits to retrieve.
    #[arg(long)]
    top_k: Option<u32>,
    /// Request a single JSON document instead of an event stream.
    #[arg(long)]
    no_stream: bool,
    /// Print reasoning tokens to stderr.
    #[arg(long)]
    show_reasoning: bool,
    /// Print retrieved hits to stderr.
    #[arg(long)]
    show_hits: bool,
    /// Print the final result as JSON instead of plain text.
    #[arg(long)]
    json: bool,
    /// Give up on a streamed answer after this many seconds.
    #[arg(long)]
    deadline_secs: Option<u64>,
    /// Timeout for non-streamed requests.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Overrides `ASKSTREAM_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,
    /// Default log filter when neither `ASKSTREAM_LOG_LEVEL` nor `RUST_LOG` is set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.base_url {
        Some(url) => {
            let mut config = ClientConfig::new(url.as_str());
            if let Ok(key) = std::env::var("ASKSTREAM_API_KEY")
                && !key.trim().is_empty()
            {
                config = config.api_key(key.trim());
            }
            config
        }
        None => ClientConfig::from_env()?,
    };
    if let Some(secs) = cli.timeout_secs {
        config = config.timeout(Duration::from_secs(secs));
    }
    config.validate()?;
    Ok(config)
}

fn print_result(result: &AskResult, cli: &Cli) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    // Streamed answers were already printed chunk by chunk.
    if cli.no_stream {
        println!("{}", result.answer);
    } else if !result.completed {
        eprintln!("(stream ended before the server finished)");
    }
    if !result.followup_questions.is_empty() {
        println!();
        for question in &result.followup_questions {
            println!("- {question}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    observability::init_observability(&cli.log_level).context("initializing logging")?;

    let config = load_config(&cli).context("loading client configuration")?;
    info!(base_url = %config.base_url, "askstream starting");
    let client = AskClient::new(config)?;

    let abort = AbortHandle::new();
    tokio::spawn({
        let abort = abort.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("interrupt received; aborting stream");
                abort.abort();
            }
        }
    });

    let mut builder = client
        .ask(cli.question.as_str())
        .stream(!cli.no_stream)
        .abort_signal(&abort);
    if let Some(index) = &cli.index {
        builder = builder.index(index.as_str());
    }
    if let Some(top_k) = cli.top_k {
        builder = builder.top_k(top_k);
    }
    if let Some(secs) = cli.deadline_secs {
        builder = builder.deadline(Duration::from_secs(secs));
    }

    let result = if cli.json {
        builder.collect().await?
    } else {
        let mut printer = TerminalPrinter::new(std::io::stdout(), std::io::stderr())
            .show_reasoning(cli.show_reasoning)
            .show_hits(cli.show_hits);
        builder.send(&mut printer).await?
    };

    print_result(&result, &cli)
}
