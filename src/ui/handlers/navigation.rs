use serenity::all::{
    ButtonStyle, ComponentInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseMessage, ReactionType,
};

use crate::bot::Handler;
use crate::commands;
use crate::ui::handler::{ButtonConfig, ButtonHandler};
use crate::ui::state::{ButtonPayload, ButtonState, Direction};

/// Apply a navigation step to a 0-indexed page, clamped to [0, total).
pub fn step(direction: Direction, page: u16, total: u16) -> u16 {
    let last = total.saturating_sub(1);
    match direction {
        Direction::First => 0,
        Direction::Prev => page.saturating_sub(1),
        Direction::Next => page.saturating_add(1).min(last),
        Direction::Last => last,
    }
}

/// Visual config shared by the paging handlers: a gray arrow, disabled when
/// the step cannot move off the current page.
pub fn paging_config(direction: Direction, page: u16, total: u16) -> ButtonConfig {
    let emoji = match direction {
        Direction::First => "⏮️",
        Direction::Prev => "◀️",
        Direction::Next => "▶️",
        Direction::Last => "⏭️",
    };

    let at_start = page == 0;
    let at_end = page >= total.saturating_sub(1);
    let disabled = match direction {
        Direction::First | Direction::Prev => at_start,
        Direction::Next | Direction::Last => at_end,
    };

    ButtonConfig {
        style: ButtonStyle::Secondary,
        label: None,
        emoji: Some(ReactionType::Unicode(emoji.to_string())),
        disabled,
    }
}

/// Generic pagination for static page sets (the FAQ).
pub struct NavigationHandler;

#[serenity::async_trait]
impl ButtonHandler for NavigationHandler {
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
            ..
        } = &state.payload
        else {
            anyhow::bail!("navigation button carried a non-navigate payload");
        };

        let new_page = step(*direction, *page, *total);
        let embed = commands::faq::page_embed(new_page);
        let view =
            commands::faq::navigation_view(&bot.ui, state.owner_id, state.guild_id, new_page)?;

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_clamps_at_edges() {
        assert_eq!(step(Direction::Prev, 0, 5), 0);
        assert_eq!(step(Direction::Next, 4, 5), 4);
        assert_eq!(step(Direction::First, 3, 5), 0);
        assert_eq!(step(Direction::Last, 0, 5), 4);
    }

    #[test]
    fn test_step_moves_inside_range() {
        assert_eq!(step(Direction::Next, 1, 5), 2);
        assert_eq!(step(Direction::Prev, 3, 5), 2);
    }

    #[test]
    fn test_edge_buttons_render_disabled() {
        assert!(paging_config(Direction::Prev, 0, 3).disabled);
        assert!(paging_config(Direction::Next, 2, 3).disabled);
        assert!(!paging_config(Direction::Next, 0, 3).disabled);
    }
}
