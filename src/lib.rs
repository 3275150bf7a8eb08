pub mod completion;
pub mod config;
pub mod logging;
pub mod providers;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing::info;

use completion::{CompletionGateway, CompletionRequest, HttpCompletionGateway};
use config::{Cli, Config, Environment};

pub async fn run() -> Result<()> {
    let _log_guard = logging::init();

    let cli = Cli::parse();
    let env = Environment::capture();
    let cfg = Config::resolve(cli, &env)?;
    info!(
        model = %cfg.model,
        temperature = cfg.temperature,
        max_tokens = cfg.max_tokens,
        prompt_len = cfg.prompt.len(),
        "loaded runtime configuration"
    );

    let client = Client::builder()
        .build()
        .context("Failed to initialize HTTP client")?;

    let gateway = HttpCompletionGateway::new(&client, &cfg);
    let request = CompletionRequest {
        model: cfg.model.clone(),
        temperature: cfg.temperature,
        max_tokens: cfg.max_tokens,
        prompt: cfg.prompt.clone(),
    };
    let response = gateway.complete(request).await?;

    println!("{}", response.text.trim());
    Ok(())
}
