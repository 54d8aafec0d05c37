use crate::bot::Handler;
use serenity::all::{
    Colour, CommandInteraction, Context, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, InteractionContext,
};
use serenity::builder::CreateCommand;

pub async fn run(
    _handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let embed = CreateEmbed::new()
        .title("Quibble - Educational Quiz Bot")
        .description(
            "A Discord bot that generates quizzes on any topic and tracks your \
             progress with XP, levels and streaks.",
        )
        .color(Colour::from_rgb(88, 101, 242))
        .field(
            "Getting Started",
            "Use `/quiz start <topic>` to start your first quiz, or `/help` for the full command list.",
            false,
        )
        .field(
            "Statistics",
            "Track your progress with `/stats` and compete on `/leaderboard`.",
            false,
        )
        .field(
            "Report Issues",
            "Found a bug or have a feature request? Tell a server admin or open an issue.",
            false,
        )
        .footer(serenity::all::CreateEmbedFooter::new(
            "Questions are generated live, so every quiz is different",
        ));

    let response = CreateInteractionResponseMessage::new()
        .embed(embed)
        .ephemeral(true);

    interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("info")
        .description("Show information about the Quibble quiz bot")
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
