use serenity::all::{
    ButtonStyle, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, ReactionType,
};

use crate::bot::Handler;
use crate::bot::helpers::components;
use crate::commands;
use crate::ui::handler::{ButtonConfig, ButtonHandler};
use crate::ui::state::{ButtonPayload, ButtonState};

/// Action buttons on the help menu: swap the embed in place, or close it.
pub struct HelpActionHandler;

#[serenity::async_trait]
impl ButtonHandler for HelpActionHandler {
    fn button_config(&self, state: &ButtonState) -> ButtonConfig {
        let name = match &state.payload {
            ButtonPayload::Action { name } => name.as_str(),
            _ => "",
        };

        match name {
            "guide" => ButtonConfig {
                style: ButtonStyle::Success,
                label: Some("Commands Guide".to_string()),
                emoji: Some(ReactionType::Unicode("📘".to_string())),
                disabled: false,
            },
            "support" => ButtonConfig {
                style: ButtonStyle::Primary,
                label: Some("Support".to_string()),
                emoji: Some(ReactionType::Unicode("🎧".to_string())),
                disabled: false,
            },
            "menu" => ButtonConfig {
                style: ButtonStyle::Secondary,
                label: Some("Main Menu".to_string()),
                emoji: Some(ReactionType::Unicode("📋".to_string())),
                disabled: false,
            },
            "close" => ButtonConfig {
                style: ButtonStyle::Danger,
                label: Some("Close".to_string()),
                emoji: Some(ReactionType::Unicode("❌".to_string())),
                disabled: false,
            },
            _ => ButtonConfig::fallback(),
        }
    }

    async fn handle_interaction(
        &self,
        bot: &Handler,
        context: &Context,
        interaction: &ComponentInteraction,
        state: &ButtonState,
    ) -> anyhow::Result<()> {
        let ButtonPayload::Action { name } = &state.payload else {
            anyhow::bail!("help button carried a non-action payload");
        };

        if name == "close" {
            let response = CreateInteractionResponseMessage::new()
                .content("Help menu closed.")
                .embeds(Vec::new())
                .components(Vec::new());
            interaction
                .create_response(context, CreateInteractionResponse::UpdateMessage(response))
                .await?;
            return Ok(());
        }

        let embed = match name.as_str() {
            "guide" => commands::help::guide_embed(),
            "support" => commands::help::support_embed(),
            "menu" => commands::help::menu_embed(),
            other => {
                return components::ephemeral_text(
                    context,
                    interaction,
                    &format!("Unknown action: {other}"),
                )
                .await;
            }
        };

        // Keep the existing buttons; only the embed changes.
        let view = commands::help::action_view(&bot.ui, state.owner_id, state.guild_id)?;
        let response = CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(view.components());
        interaction
            .create_response(context, CreateInteractionResponse::UpdateMessage(response))
            .await?;

        Ok(())
    }
}
