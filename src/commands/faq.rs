use crate::bot::Handler;
use crate::ui::handler::HandlerId;
use crate::ui::state::{ButtonPayload, Direction, UiError};
use crate::ui::view::PersistentView;
use crate::ui::UiContext;
use serenity::all::{
    Colour, CommandInteraction, CommandOptionType, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext, ResolvedOption, ResolvedValue,
};
use serenity::builder::{CreateCommand, CreateCommandOption};

/// Static FAQ content, one (title, body) per page.
const FAQ_PAGES: &[(&str, &str)] = &[
    (
        "❓ FAQ — Getting Started",
        "**How do I start a quiz?**\n\
         Use `/quiz start <topic>`. Any topic works: science, history, \
         programming, pop culture.\n\n\
         **Can I pick the difficulty?**\n\
         Yes — `/quiz start <topic> [count] [difficulty]` accepts easy, \
         medium or hard. Medium is the default.\n\n\
         **How many questions can a quiz have?**\n\
         Between 1 and 20. Five is the default.",
    ),
    (
        "❓ FAQ — Scoring",
        "**How is XP calculated?**\n\
         10 XP per correct answer, multiplied by difficulty. Accuracy above \
         80% earns bonus XP, a perfect quiz earns +25%, and daily streaks \
         multiply everything.\n\n\
         **What are levels?**\n\
         Each level needs 50 XP more than the one before it. The cap is \
         level 100.\n\n\
         **Do my stats carry between servers?**\n\
         Stats are tracked per server; the global leaderboard adds them up.",
    ),
    (
        "❓ FAQ — Troubleshooting",
        "**A quiz button stopped working.**\n\
         Buttons expire after a while; re-run the command for fresh ones.\n\n\
         **Question generation failed.**\n\
         The question provider is occasionally unavailable. You will get a \
         placeholder question; just start the quiz again.\n\n\
         **Who can post the welcome message?**\n\
         `/welcome` is restricted to administrators.",
    ),
];

pub fn total_pages() -> u16 {
    FAQ_PAGES.len() as u16
}

pub fn page_embed(page: u16) -> CreateEmbed {
    let page = (page as usize).min(FAQ_PAGES.len() - 1);
    let (title, body) = FAQ_PAGES[page];

    CreateEmbed::new()
        .title(title)
        .description(body)
        .color(Colour::from_rgb(88, 101, 242))
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "Page {}/{}",
            page + 1,
            FAQ_PAGES.len()
        )))
}

/// Full navigation row for a FAQ page: first/prev on the left, next/last on
/// the right, edge buttons omitted like the page can't move that way.
pub fn navigation_view<'a>(
    ui: &'a UiContext,
    owner_id: u64,
    guild_id: Option<u64>,
    page: u16,
) -> Result<PersistentView<'a>, UiError> {
    let total = total_pages();
    let mut view = PersistentView::new(ui, "FaqView");
    let expiry = Some(ui.config.timeouts.faq());

    let directions: &[Direction] = if page == 0 {
        &[Direction::Next, Direction::Last]
    } else if page >= total.saturating_sub(1) {
        &[Direction::First, Direction::Prev]
    } else {
        &[
            Direction::First,
            Direction::Prev,
            Direction::Next,
            Direction::Last,
        ]
    };

    for direction in directions {
        view.add_button(
            HandlerId::Navigation,
            owner_id,
            ButtonPayload::Navigate {
                direction: *direction,
                page,
                total,
                target_user: None,
            },
            guild_id,
            expiry,
        )?;
    }

    Ok(view)
}

pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let mut page: u16 = 0;
    for option in &interaction.data.options() {
        if let ResolvedOption {
            name: "page",
            value: ResolvedValue::Integer(p),
            ..
        } = option
        {
            page = (*p).clamp(1, total_pages() as i64) as u16 - 1;
        }
    }

    let embed = page_embed(page);
    let view = navigation_view(
        &handler.ui,
        interaction.user.id.get(),
        interaction.guild_id.map(|id| id.get()),
        page,
    )?;

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
    CreateCommand::new("faq")
        .description("Frequently asked questions about the quiz bot")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "page",
                "FAQ page to open (1-based)",
            )
            .min_int_value(1)
            .max_int_value(FAQ_PAGES.len() as u64)
            .required(false),
        )
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
