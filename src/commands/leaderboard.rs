use crate::bot::Handler;
use crate::ui::UiContext;
use crate::ui::handler::HandlerId;
use crate::ui::state::{ButtonPayload, ToggleScope, UiError};
use crate::ui::view::PersistentView;
use serenity::all::{
    Colour, CommandInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext,
};
use serenity::builder::CreateCommand;

const LEADERBOARD_LIMIT: u32 = 10;

pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let guild_id = interaction.guild_id.map(|id| id.get());
    let guild_name = interaction
        .guild_id
        .and_then(|id| id.name(&context.cache));

    // DMs have no server scoreboard, so start global there.
    let scope = if guild_id.is_some() {
        ToggleScope::Server
    } else {
        ToggleScope::Global
    };

    let embed = build_embed(handler, scope, guild_id, guild_name).await?;
    let view = toggle_view(&handler.ui, interaction.user.id.get(), guild_id, scope)?;

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

/// Render the ranked top 10 for a scope.
pub async fn build_embed(
    handler: &Handler,
    scope: ToggleScope,
    guild_id: Option<u64>,
    guild_name: Option<String>,
) -> anyhow::Result<CreateEmbed> {
    let query_guild = match scope {
        ToggleScope::Server => guild_id,
        ToggleScope::Global => None,
    };
    let entries = handler
        .database
        .get_leaderboard(query_guild, LEADERBOARD_LIMIT)
        .await?;

    let title = match scope {
        ToggleScope::Global => "🏆 Global Leaderboard".to_string(),
        ToggleScope::Server => match guild_name {
            Some(name) => format!("🏆 {name} Leaderboard"),
            None => "🏆 Server Leaderboard".to_string(),
        },
    };

    let mut embed = CreateEmbed::new().title(title).color(Colour::GOLD);

    if entries.is_empty() {
        embed = embed.description("No quiz results yet. Be the first with `/quiz start`!");
        return Ok(embed);
    }

    let lines: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let medal = match i {
                0 => "🥇 ",
                1 => "🥈 ",
                2 => "🥉 ",
                _ => "",
            };
            format!(
                "{}**{}.** {} - {} points | {} quizzes | {}% accuracy",
                medal,
                i + 1,
                entry.username,
                entry.points,
                entry.quizzes,
                entry.accuracy
            )
        })
        .collect();

    Ok(embed.field("📊 Rankings", lines.join("\n"), false))
}

/// Single toggle button carrying the scope currently shown; a click flips it.
pub fn toggle_view<'a>(
    ui: &'a UiContext,
    owner_id: u64,
    guild_id: Option<u64>,
    scope: ToggleScope,
) -> Result<PersistentView<'a>, UiError> {
    let mut view = PersistentView::new(ui, "LeaderboardView");
    view.add_button(
        HandlerId::LeaderboardToggle,
        owner_id,
        ButtonPayload::Toggle { scope },
        guild_id,
        Some(ui.config.timeouts.toggle()),
    )?;
    Ok(view)
}

pub fn register() -> CreateCommand {
    CreateCommand::new("leaderboard")
        .description("View the quiz leaderboard for this server or globally")
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
