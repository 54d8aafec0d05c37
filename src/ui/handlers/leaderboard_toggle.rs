use serenity::all::{
    ButtonStyle, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, ReactionType,
};

use crate::bot::Handler;
use crate::commands;
use crate::ui::handler::{ButtonConfig, ButtonHandler};
use crate::ui::state::{ButtonPayload, ButtonState, ToggleScope};

/// Flips a leaderboard between server and global scope.
pub struct LeaderboardToggleHandler;

#[serenity::async_trait]
impl ButtonHandler for LeaderboardToggleHandler {
    fn button_config(&self, state: &ButtonState) -> ButtonConfig {
        let scope = match &state.payload {
            ButtonPayload::Toggle { scope } => *scope,
            _ => ToggleScope::Server,
        };

        // The label advertises the scope a click switches to.
        match scope {
            ToggleScope::Global => ButtonConfig {
                style: ButtonStyle::Success,
                label: Some("Switch to Server".to_string()),
                emoji: Some(ReactionType::Unicode("🌐".to_string())),
                disabled: false,
            },
            ToggleScope::Server => ButtonConfig {
                style: ButtonStyle::Secondary,
                label: Some("Switch to Global".to_string()),
                emoji: Some(ReactionType::Unicode("🏠".to_string())),
                disabled: false,
            },
        }
    }

    async fn handle_interaction(
        &self,
        bot: &Handler,
        context: &Context,
        interaction: &ComponentInteraction,
        state: &ButtonState,
    ) -> anyhow::Result<()> {
        let ButtonPayload::Toggle { scope } = &state.payload else {
            anyhow::bail!("leaderboard toggle carried a non-toggle payload");
        };

        let new_scope = scope.flipped();
        let guild_name = interaction
            .guild_id
            .and_then(|id| id.name(&context.cache));

        let embed = commands::leaderboard::build_embed(bot, new_scope, state.guild_id, guild_name)
            .await?;
        let view = commands::leaderboard::toggle_view(
            &bot.ui,
            state.owner_id,
            state.guild_id,
            new_scope,
        )?;

        let response = CreateInteractionResponseMessage::new()
            .embed(embed)
            .components(view.components());
        interaction
            .create_response(context, CreateInteractionResponse::UpdateMessage(response))
            .await?;

        view.persist_to_database(&interaction.message).await;
        Ok(())
    }
}
