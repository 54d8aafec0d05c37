use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseMessage,
};

use crate::bot::Handler;
use crate::bot::helpers::components;
use crate::commands;
use crate::ui::handler::{ButtonConfig, ButtonHandler};
use crate::ui::handlers::navigation::{paging_config, step};
use crate::ui::state::{ButtonPayload, ButtonState};

/// Pagination across a user's stats pages. The pages are regenerated from
/// the stats store on every step, so the numbers shown are always current.
pub struct StatsNavigationHandler;

#[serenity::async_trait]
impl ButtonHandler for StatsNavigationHandler {
    fn button_config(&self, state: &ButtonState) -> ButtonConfig {
        match &state.payload {
            ButtonPayload::Navigate {
                direction,
                page,
                total,
                ..
            } => paging_config(*direction, *page, *total),
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
        let ButtonPayload::Navigate {
            direction,
            page,
            total,
            target_user,
        } = &state.payload
        else {
            anyhow::bail!("stats navigation button carried a non-navigate payload");
        };

        let target_user_id = target_user.unwrap_or(state.owner_id);
        let new_page = step(*direction, *page, *total);

        let pages =
            commands::stats::build_stats_pages(bot, context, target_user_id, state.guild_id)
                .await?;
        let Some(embed) = pages.get(new_page as usize) else {
            return components::ephemeral_text(context, interaction, "Page not found.").await;
        };

        let view = commands::stats::navigation_view(
            &bot.ui,
            state.owner_id,
            target_user_id,
            state.guild_id,
            new_page,
            pages.len() as u16,
        )?;

        let response = CreateInteractionResponseMessage::new()
            .embed(embed.clone())
            .components(view.components());
        interaction
            .create_response(context, CreateInteractionResponse::UpdateMessage(response))
            .await?;

        view.persist_to_database(&interaction.message).await;
        Ok(())
    }
}
