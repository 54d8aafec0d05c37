use crate::bot::Handler;
use crate::ui::UiContext;
use crate::ui::handler::HandlerId;
use crate::ui::state::{ButtonPayload, Direction, UiError};
use crate::ui::view::PersistentView;
use crate::utils::database::UserStats;
use crate::utils::xp;
use serenity::all::{
    Colour, CommandInteraction, CommandOptionType, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext, ResolvedOption, ResolvedValue, UserId,
};
use serenity::builder::{CreateCommand, CreateCommandOption};

pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let mut target_user_id = interaction.user.id.get();
    for option in &interaction.data.options() {
        if let ResolvedOption {
            name: "user",
            value: ResolvedValue::User(user, _),
            ..
        } = option
        {
            target_user_id = user.id.get();
        }
    }

    let guild_id = interaction.guild_id.map(|id| id.get());
    let pages = build_stats_pages(handler, context, target_user_id, guild_id).await?;

    let view = navigation_view(
        &handler.ui,
        interaction.user.id.get(),
        target_user_id,
        guild_id,
        0,
        pages.len() as u16,
    )?;

    let response = CreateInteractionResponseMessage::new()
        .embed(pages[0].clone())
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

/// Regenerate the full set of stats embeds for a user. Called both by the
/// command and by the navigation handler on every page step, so the data
/// is always fresh.
pub async fn build_stats_pages(
    handler: &Handler,
    context: &Context,
    target_user_id: u64,
    guild_id: Option<u64>,
) -> anyhow::Result<Vec<CreateEmbed>> {
    let username = match handler.database.get_username(target_user_id).await? {
        Some(name) if !name.is_empty() => name,
        _ => context
            .http
            .get_user(UserId::new(target_user_id))
            .await
            .map(|user| user.name)
            .unwrap_or_else(|_| "Unknown".to_string()),
    };

    let stats = handler.database.get_stats(target_user_id, guild_id).await?;

    Ok(vec![
        overview_page(&username, &stats),
        progress_page(&username, &stats),
        streak_page(&username, &stats),
    ])
}

/// Prev/next stats navigation, skipping buttons that cannot move.
pub fn navigation_view<'a>(
    ui: &'a UiContext,
    owner_id: u64,
    target_user_id: u64,
    guild_id: Option<u64>,
    page: u16,
    total: u16,
) -> Result<PersistentView<'a>, UiError> {
    let mut view = PersistentView::new(ui, "StatsView");
    let expiry = Some(ui.config.timeouts.stats());

    let mut directions = Vec::new();
    if page > 0 {
        directions.push(Direction::Prev);
    }
    if page < total.saturating_sub(1) {
        directions.push(Direction::Next);
    }

    for direction in directions {
        view.add_button(
            HandlerId::StatsNavigation,
            owner_id,
            ButtonPayload::Navigate {
                direction,
                page,
                total,
                target_user: Some(target_user_id),
            },
            guild_id,
            expiry,
        )?;
    }

    Ok(view)
}

fn overview_page(username: &str, stats: &UserStats) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!("📊 Stats for {username} (1/3)"))
        .color(Colour::BLUE)
        .field("Quizzes Taken", stats.quizzes_taken.to_string(), true)
        .field("Points", stats.points.to_string(), true)
        .field("\u{200b}", "\u{200b}", true)
        .field("Correct Answers", stats.correct_answers.to_string(), true)
        .field("Wrong Answers", stats.wrong_answers.to_string(), true)
        .field("Accuracy", format!("{}%", stats.accuracy()), true)
}

fn progress_page(username: &str, stats: &UserStats) -> CreateEmbed {
    let xp_into_level = stats.xp - xp::xp_for_level(stats.level);
    let next_level_cost = xp::xp_for_level(stats.level + 1) - xp::xp_for_level(stats.level);
    let progress = if stats.level >= xp::MAX_LEVEL {
        "Max level reached!".to_string()
    } else {
        format!("{xp_into_level}/{next_level_cost} XP to level {}", stats.level + 1)
    };

    CreateEmbed::new()
        .title(format!("📈 Progress for {username} (2/3)"))
        .color(Colour::from_rgb(34, 197, 94))
        .field("Level", stats.level.to_string(), true)
        .field("Total XP", stats.xp.to_string(), true)
        .field("Next Level", progress, false)
}

fn streak_page(username: &str, stats: &UserStats) -> CreateEmbed {
    let last_quiz = stats
        .last_quiz_date
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Never".to_string());

    CreateEmbed::new()
        .title(format!("🔥 Streaks for {username} (3/3)"))
        .color(Colour::ORANGE)
        .field("Current Streak", format!("{} days", stats.current_streak), true)
        .field("Best Streak", format!("{} days", stats.best_streak), true)
        .field("Last Quiz", last_quiz, false)
        .footer(serenity::all::CreateEmbedFooter::new(
            "Complete a quiz every day to grow your streak and XP multiplier",
        ))
}

pub fn register() -> CreateCommand {
    CreateCommand::new("stats")
        .description("View quiz statistics for yourself or another user")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::User,
                "user",
                "User whose stats to view (defaults to you)",
            )
            .required(false),
        )
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
