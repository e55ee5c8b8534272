use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod configuration;
mod error;
mod prompt;
mod session;

use configuration::{Overrides, Settings};
use prompt::cliclack::CliclackPrompt;
use scout::agent::Agent;
use scout::providers::factory::{self, ProviderType};
use scout::search::system::WebSearchSystem;
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Provider option (ollama or openai)
    #[arg(short, long)]
    provider: Option<ProviderType>,

    /// Model to use, defaults to the provider's default model
    #[arg(short, long)]
    model: Option<String>,

    /// Answer this message and exit instead of starting a chat
    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let overrides = Overrides {
        provider: cli.provider,
        model: cli.model.clone(),
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides)?;
    tracing::info!(
        provider = %settings.provider.provider_type(),
        "starting scout"
    );

    let provider = factory::get_provider(settings.provider.into_config())?;
    let mut agent = Agent::with_config(provider, settings.agent.into_config());
    agent.add_system(Box::new(WebSearchSystem::new(settings.search)?));

    let mut session = Session::new(agent, Box::new(CliclackPrompt::new()));
    match cli.message {
        Some(message) => session.headless_start(&message).await,
        None => session.start().await,
    }
}
