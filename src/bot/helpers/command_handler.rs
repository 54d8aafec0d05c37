use crate::bot::Handler;
use crate::commands;
use anyhow::Result;
use serenity::all::{CommandInteraction, Context};

/// Route a slash command to its handler
pub async fn handle_slash_command(
    handler: &Handler,
    context: &Context,
    command: &CommandInteraction,
) -> Result<()> {
    match command.data.name.as_str() {
        "faq" => commands::faq::run(handler, context, command).await,
        "help" => commands::help::run(handler, context, command).await,
        "info" => commands::info::run(handler, context, command).await,
        "leaderboard" => commands::leaderboard::run(handler, context, command).await,
        "quiz" => commands::quiz::run(handler, context, command).await,
        "stats" => commands::stats::run(handler, context, command).await,
        "welcome" => commands::welcome::run(handler, context, command).await,
        unknown_command => {
            tracing::warn!("Unknown slash command received: '{}'", unknown_command);
            commands::error::run(
                context,
                command,
                &format!(
                    "Unknown command: `{}`. Use `/help` to see all available commands.",
                    unknown_command
                ),
            )
            .await
        }
    }
}
