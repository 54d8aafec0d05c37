use serenity::all::{
    ButtonStyle, Colour, ComponentInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, ReactionType,
};

use crate::bot::Handler;
use crate::bot::helpers::components;
use crate::ui::handler::{ButtonConfig, ButtonHandler};
use crate::ui::state::{ButtonPayload, ButtonState};

/// Public action buttons on the server welcome message. These never expire
/// and carry `owner_id = 0` so every member can use them.
pub struct WelcomeActionHandler;

#[serenity::async_trait]
impl ButtonHandler for WelcomeActionHandler {
    fn button_config(&self, state: &ButtonState) -> ButtonConfig {
        let name = match &state.payload {
            ButtonPayload::Action { name } => name.as_str(),
            _ => "",
        };

        match name {
            "quiz" => ButtonConfig {
                style: ButtonStyle::Primary,
                label: Some("Start a Quiz".to_string()),
                emoji: Some(ReactionType::Unicode("🎯".to_string())),
                disabled: false,
            },
            "guide" => ButtonConfig {
                style: ButtonStyle::Secondary,
                label: Some("Setup Guide".to_string()),
                emoji: Some(ReactionType::Unicode("📖".to_string())),
                disabled: false,
            },
            "commands" => ButtonConfig {
                style: ButtonStyle::Secondary,
                label: Some("Command List".to_string()),
                emoji: Some(ReactionType::Unicode("📋".to_string())),
                disabled: false,
            },
            _ => ButtonConfig::fallback(),
        }
    }

    async fn handle_interaction(
        &self,
        _bot: &Handler,
        context: &Context,
        interaction: &ComponentInteraction,
        state: &ButtonState,
    ) -> anyhow::Result<()> {
        let ButtonPayload::Action { name } = &state.payload else {
            anyhow::bail!("welcome button carried a non-action payload");
        };

        let embed = match name.as_str() {
            "quiz" => quiz_start_embed(),
            "guide" => setup_guide_embed(),
            "commands" => command_list_embed(),
            other => {
                return components::ephemeral_text(
                    context,
                    interaction,
                    &format!("Unknown action: {other}"),
                )
                .await;
            }
        };

        let response = CreateInteractionResponseMessage::new()
            .embed(embed)
            .ephemeral(true);
        interaction
            .create_response(context, CreateInteractionResponse::Message(response))
            .await?;

        Ok(())
    }
}

fn quiz_start_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("🎯 Starting a Quiz")
        .description(
            "To start a quiz, use the `/quiz start` command. \
             You'll need a topic, and you can optionally set the difficulty \
             and question count.\n\n\
             **Examples:**\n\
             • `/quiz start science`\n\
             • `/quiz start history 10 medium`\n\
             • `/quiz start programming`\n\n\
             Use `/quiz topics` to see popular quiz topics!",
        )
        .color(Colour::from_rgb(34, 197, 94))
}

fn setup_guide_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("📖 Setup Guide for Administrators")
        .description(
            "**Initial Setup:**\n\
             1. Make sure the bot has the required permissions\n\
             2. Use `/welcome` to post the welcome message in a channel\n\
             3. Start a quiz with `/quiz start` to check everything works\n\n\
             **Required Permissions:**\n\
             • Send Messages\n\
             • Embed Links\n\
             • Use Slash Commands",
        )
        .color(Colour::BLUE)
}

fn command_list_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("📋 Available Commands")
        .description(
            "Use `/help` for the full command reference. \
             The most commonly used ones:\n\n\
             **Quiz Commands:**\n\
             • `/quiz start` - Start a new quiz\n\
             • `/quiz stop` - Stop the current quiz\n\
             • `/quiz topics` - View popular topics\n\n\
             **Other Commands:**\n\
             • `/stats` - View your statistics\n\
             • `/leaderboard` - View the server leaderboard\n\
             • `/faq` - Frequently asked questions",
        )
        .color(Colour::PURPLE)
}
