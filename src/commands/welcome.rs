use crate::bot::Handler;
use crate::ui::handler::HandlerId;
use crate::ui::state::ButtonPayload;
use crate::ui::view::PersistentView;
use serenity::all::{
    Colour, CommandInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext, Permissions,
};
use serenity::builder::CreateCommand;

/// Post the public welcome message with its never-expiring action buttons.
/// Admin-only; the buttons carry `owner_id = 0` so every member can use them.
pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let guild_id = interaction.guild_id.map(|id| id.get());

    let mut view = PersistentView::new(&handler.ui, "WelcomeView");
    for action in ["quiz", "guide", "commands"] {
        view.add_button(
            HandlerId::WelcomeAction,
            0,
            ButtonPayload::Action {
                name: action.to_string(),
            },
            guild_id,
            None,
        )?;
    }

    let embed = CreateEmbed::new()
        .title("👋 Welcome to the Quiz Bot!")
        .description(
            "Quibble generates quizzes on any topic and tracks your progress \
             with XP, levels and daily streaks.\n\n\
             Pick a button below to get started:",
        )
        .color(Colour::from_rgb(88, 101, 242));

    let response = CreateInteractionResponseMessage::new()
        .embed(embed)
        .components(view.components());
    interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await?;

    if view.has_database_buttons() {
        let message = interaction.get_response(&context.http).await?;
        view.persist_to_database(&message).await;
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("welcome")
        .description("Post the welcome message with quick-start buttons (admins only)")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .contexts(vec![InteractionContext::Guild])
}
