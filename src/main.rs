// This is the entry point of the PromptGuard console client.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation client, session history, analytics)
// - `infra/` = Implementations of core traits (HTTP gateway, env config)
// - `console/` = Terminal adapter (command parsing, text rendering)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Run the read-eval-print loop

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::console::commands::{handle_command, parse_command};
use crate::console::formatter::help_text;
use crate::core::session::SessionController;
use crate::infra::config::GuardConfig;
use crate::infra::moderation::HttpModerationGateway;
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging. Stdout belongs to the console, so logs go to stderr.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = GuardConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, "Starting PromptGuard client");

    let gateway = HttpModerationGateway::new(config.base_url.clone())
        .context("Failed to create moderation HTTP client")?
        .with_reset_timeout(config.reset_timeout);
    let controller = SessionController::new(gateway);

    if controller.is_service_reachable().await {
        tracing::info!("Moderation service is reachable");
    } else {
        tracing::warn!(
            base_url = %config.base_url,
            "Moderation service is unreachable, prompts will be checked locally until it is back"
        );
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(help_text().as_bytes()).await?;
    stdout.write_all(b"\n\n").await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(output) = handle_command(&controller, parse_command(&line)).await else {
            break;
        };
        if output.is_empty() {
            continue;
        }
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n\n").await?;
        stdout.flush().await?;
    }

    tracing::info!("Console closed");
    Ok(())
}
