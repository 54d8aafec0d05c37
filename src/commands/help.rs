use crate::bot::Handler;
use crate::ui::UiContext;
use crate::ui::handler::HandlerId;
use crate::ui::state::{ButtonPayload, UiError};
use crate::ui::view::{PersistenceMode, PersistentView};
use serenity::all::{
    Colour, CommandInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext,
};
use serenity::builder::CreateCommand;

pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let view = action_view(
        &handler.ui,
        interaction.user.id.get(),
        interaction.guild_id.map(|id| id.get()),
    )?;

    let response = CreateInteractionResponseMessage::new()
        .embed(menu_embed())
        .components(view.components());

    interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}

/// The four help-menu buttons, owned by whoever opened the menu.
///
/// The menu is ephemeral, so the buttons use memory persistence: they die
/// with the process, exactly like the message they sit on.
pub fn action_view<'a>(
    ui: &'a UiContext,
    owner_id: u64,
    guild_id: Option<u64>,
) -> Result<PersistentView<'a>, UiError> {
    let mut view = PersistentView::new(ui, "HelpView").with_mode(PersistenceMode::Memory);
    let expiry = Some(ui.config.timeouts.help());

    for action in ["guide", "support", "menu", "close"] {
        view.add_button(
            HandlerId::HelpAction,
            owner_id,
            ButtonPayload::Action {
                name: action.to_string(),
            },
            guild_id,
            expiry,
        )?;
    }

    Ok(view)
}

pub fn menu_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("📋 Quibble - Main Menu")
        .description("Welcome to the quiz bot! Pick an option below, or jump straight in:")
        .color(Colour::PURPLE)
        .field(
            "🚀 Quick Start",
            "New here? Try `/quiz start` followed by any topic!",
            false,
        )
        .field(
            "🎯 Popular Features",
            "• **Quizzes** - `/quiz start <topic>`\n\
             • **Statistics** - `/stats` and `/leaderboard`\n\
             • **Questions & Answers** - `/faq`",
            false,
        )
        .field(
            "📚 Topics",
            "The bot generates quizzes on virtually any topic - from science to history to pop culture.",
            false,
        )
}

pub fn guide_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("📘 Commands Guide")
        .description("All available commands, organized by category:")
        .color(Colour::from_rgb(34, 197, 94))
        .field(
            "🎯 Quiz Commands",
            "`/quiz start <topic> [count] [difficulty]` - Start a quiz on any topic\n\
             `/quiz stop` - Stop the current quiz\n\
             `/quiz topics` - View popular quiz topics",
            false,
        )
        .field(
            "🏆 Competition & Stats",
            "`/stats [user]` - View detailed statistics\n\
             `/leaderboard` - View the server leaderboard",
            false,
        )
        .field(
            "⚙️ Other",
            "`/faq` - Frequently asked questions\n\
             `/help` - Show this help menu\n\
             `/info` - About the bot\n\
             `/welcome` - Post the welcome message (admins only)",
            false,
        )
}

pub fn support_embed() -> CreateEmbed {
    CreateEmbed::new()
        .title("🎧 Support Information")
        .description("Need help? Here's where to look:")
        .color(Colour::BLUE)
        .field(
            "📖 Documentation",
            "Use `/faq` for answers to the most common questions.",
            false,
        )
        .field(
            "🔧 Common Issues",
            "• **Bot not responding?** Check the bot's permissions\n\
             • **Quiz not starting?** The question provider may be briefly unavailable\n\
             • **Stats not updating?** Finish the quiz - stats are recorded at the end",
            false,
        )
        .field(
            "👥 Community",
            "Ask in your server's general chat - other quizzers might help!",
            false,
        )
}

pub fn register() -> CreateCommand {
    CreateCommand::new("help")
        .description("Show the help menu with all available commands")
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
