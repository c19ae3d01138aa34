//! sqirvy-cli - send prompts from stdin, files and URLs to a large language model
//!
//! The model's reply goes to stdout; logs and errors go to stderr, so the
//! tool can sit in the middle of a shell pipeline.

use std::io::{self, IsTerminal as _, Write as _};

use anyhow::{Context as _, Result};
use clap::Parser as _;
use sqirvy_cli::cli::{Cli, Commands, GlobalArgs};
use sqirvy_cli::commands::{self, Mode};
use sqirvy_cli::input::{HtmlScraper, read_process_stdin};
use sqirvy_cli::{Config, execute_query};
use sqirvy_providers::create_provider;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const DEFAULT_LOG_FILTER: &str = "sqirvy_cli=info,sqirvy_providers=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();

    let (global, command) = Cli::parse().into_command();

    let (mode, inputs) = match command {
        Commands::Query { inputs } => (Mode::Query, inputs),
        Commands::Plan { inputs } => (Mode::Plan, inputs),
        Commands::Code { inputs } => (Mode::Code, inputs),
        Commands::Review { inputs } => (Mode::Review, inputs),
        Commands::Models => return write_stdout(&commands::format_model_list()),
        Commands::Version => return write_stdout(&format!("{}\n", commands::version())),
    };

    let response = handle_query(&global, mode, &inputs).await?;
    write_stdout(&format!("{response}\n"))
}

async fn handle_query(global: &GlobalArgs, mode: Mode, inputs: &[String]) -> Result<String> {
    let config = Config::resolve(global).context("invalid configuration")?;
    let stdin = read_process_stdin(config.max_input_bytes).context("error reading stdin")?;
    let scraper = HtmlScraper::new(config.providers.request_timeout())
        .with_max_bytes(config.max_input_bytes)
        .with_private_urls(config.allow_private_urls);

    let response = execute_query(
        &config,
        mode.system_prompt(),
        inputs,
        stdin,
        scraper,
        |provider| create_provider(provider, &config.providers),
    )
    .await
    .with_context(|| format!("querying model {} failed", config.model))?;

    Ok(response)
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
