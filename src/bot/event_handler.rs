use std::sync::atomic::Ordering;

use crate::bot::{
    Handler, command_registry, component_router, helpers::command_handler, version_checker,
};
use crate::commands;
use crate::ui::recovery::{self, HttpMessageSource};
use serenity::all::{
    Command, CreateInteractionResponse, CreateInteractionResponseMessage, Interaction, Ready,
};
use serenity::prelude::*;

/// Interval between hard-delete sweeps of expired button rows.
const SWEEP_INTERVAL_HOURS: u64 = 6;

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, context: Context, interaction: Interaction) {
        let result = match interaction {
            Interaction::Command(ref command) => {
                let command_result =
                    command_handler::handle_slash_command(self, &context, command).await;

                // One-time version notification after successful commands.
                if command_result.is_ok()
                    && let Ok(exists) = self.database.user_exists(command.user.id.get()).await
                    && exists
                {
                    let _ =
                        version_checker::check_and_notify_version_update(self, &context, command)
                            .await;
                }

                command_result
            }

            Interaction::Component(ref component) => {
                component_router::route_component_interaction(self, &context, component).await
            }

            _ => Ok(()),
        };

        // Central error boundary: nothing past here may crash the process.
        if let Err(e) = result {
            tracing::error!("[BOT] Error processing interaction: {:#}", e);

            match &interaction {
                Interaction::Command(command) => {
                    if let Err(send_err) = commands::error::run(
                        &context,
                        command,
                        "An unexpected error occurred. Please try again later.",
                    )
                    .await
                    {
                        tracing::error!(
                            "[BOT] Failed to send error response to user: {}",
                            send_err
                        );
                    }
                }
                Interaction::Component(component) => {
                    let error_response = CreateInteractionResponseMessage::new()
                        .content("An unexpected error occurred. Please try again later.")
                        .ephemeral(true);

                    if let Err(send_err) = component
                        .create_response(
                            &context.http,
                            CreateInteractionResponse::Message(error_response),
                        )
                        .await
                    {
                        tracing::error!(
                            "[BOT] Failed to send component error response: {}",
                            send_err
                        );
                    }
                }
                _ => {
                    tracing::error!("[BOT] Unhandled interaction type in error handler");
                }
            }
        }
    }

    async fn ready(&self, context: Context, ready: Ready) {
        tracing::info!("[BOT] {} is ready and connected!", ready.user.name);

        let commands_vec = command_registry::get_all_commands();
        let command_count = commands_vec.len();

        let _commands = Command::set_global_commands(&context, commands_vec).await;
        tracing::info!(
            "[CMD] Successfully registered {} global commands",
            command_count
        );

        // Gateway reconnects re-fire ready; recovery and the sweep task run
        // once per process.
        if self.startup_done.swap(true, Ordering::SeqCst) {
            return;
        }

        let source = HttpMessageSource::new(&context.http);
        recovery::run_startup_recovery(&self.ui, &source).await;

        let store = self.ui.store.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                SWEEP_INTERVAL_HOURS * 60 * 60,
            ));
            // The recovery pass just swept; skip the immediate first tick.
            interval.tick().await;

            loop {
                interval.tick().await;
                match store.sweep_expired().await {
                    Ok(0) => {}
                    Ok(swept) => {
                        tracing::info!("[SWEEP] Removed {} expired button rows", swept);
                    }
                    Err(e) => tracing::error!("[SWEEP] Periodic sweep failed: {}", e),
                }
            }
        });
    }
}
