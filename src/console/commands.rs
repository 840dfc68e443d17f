// Console commands.
//
// Same shape as any adapter layer:
// 1. Parse the input line
// 2. Call the session controller
// 3. Format the result
//
// No moderation logic lives here.

use super::formatter::{format_analytics, format_event, format_feed, format_stats, help_text};
use crate::core::analytics::session_analytics;
use crate::core::moderation::ModerationGateway;
use crate::core::session::{SessionController, SubmitOutcome};

const FEED_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Submit(String),
    Stats,
    Analytics,
    Feed,
    Report,
    Reset,
    Help,
    Quit,
}

/// Lines starting with a known `/command` are commands; everything else is a prompt.
pub fn parse_command(line: &str) -> ConsoleCommand {
    match line.trim().to_ascii_lowercase().as_str() {
        "/stats" => ConsoleCommand::Stats,
        "/analytics" => ConsoleCommand::Analytics,
        "/feed" => ConsoleCommand::Feed,
        "/report" => ConsoleCommand::Report,
        "/reset" => ConsoleCommand::Reset,
        "/help" => ConsoleCommand::Help,
        "/quit" | "/exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Submit(line.to_string()),
    }
}

/// Run one command. Returns `None` when the console should exit.
pub async fn handle_command<G: ModerationGateway>(
    controller: &SessionController<G>,
    command: ConsoleCommand,
) -> Option<String> {
    let output = match command {
        ConsoleCommand::Submit(prompt) => match controller.submit(&prompt).await {
            Ok(SubmitOutcome::Recorded(event)) => {
                let mut out = format_event(&event);
                if let Some(reply) = &event.reply {
                    out.push_str(&format!("\n\nAssistant: {}", reply));
                }
                out
            }
            Ok(SubmitOutcome::Skipped) => String::new(),
            Ok(SubmitOutcome::Discarded) => {
                "Session was reset before the verdict arrived; prompt dropped.".to_string()
            }
            Err(e) => format!("⚠️ Could not record verdict: {}", e),
        },
        ConsoleCommand::Stats => {
            let snapshot = controller.snapshot().await;
            format_stats(snapshot.state(), &session_analytics(snapshot.events()))
        }
        ConsoleCommand::Analytics => {
            let snapshot = controller.snapshot().await;
            format_analytics(&snapshot, &session_analytics(snapshot.events()))
        }
        ConsoleCommand::Feed => format_feed(&controller.snapshot().await, FEED_LIMIT),
        ConsoleCommand::Report => match controller.generate_report().await {
            Ok(report) => report,
            Err(e) if e.is_retryable() => {
                format!("❌ Report generation failed: {}. Type /report to retry.", e)
            }
            Err(e) => format!("❌ {}", e),
        },
        ConsoleCommand::Reset => {
            controller.reset().await;
            "Session cleared.".to_string()
        }
        ConsoleCommand::Help => help_text().to_string(),
        ConsoleCommand::Quit => return None,
    };

    Some(output)
}
