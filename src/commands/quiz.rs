use crate::bot::Handler;
use crate::bot::helpers::components;
use crate::commands;
use crate::services::quiz_session::{ActiveQuiz, AnswerError, AnswerOutcome};
use crate::utils::xp::{self, Difficulty};
use serenity::all::{
    ButtonStyle, Colour, CommandInteraction, CommandOptionType, ComponentInteraction, Context,
    CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, EditInteractionResponse, InteractionContext, ResolvedOption,
    ResolvedValue,
};
use serenity::builder::{CreateCommand, CreateCommandOption};

const DEFAULT_QUESTION_COUNT: u8 = 5;
const MAX_QUESTION_COUNT: u8 = 20;
const ANSWER_PREFIX: &str = "quiz_answer_";
const ANSWER_LABELS: [&str; 4] = ["A", "B", "C", "D"];

pub async fn run(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let options = interaction.data.options();
    let Some(subcommand) = options.first() else {
        return commands::error::run(context, interaction, "Missing subcommand.").await;
    };

    match (subcommand.name, &subcommand.value) {
        ("start", ResolvedValue::SubCommand(sub_options)) => {
            start(handler, context, interaction, sub_options).await
        }
        ("stop", _) => stop(handler, context, interaction).await,
        ("topics", _) => topics(context, interaction).await,
        (unknown, _) => {
            commands::error::run(
                context,
                interaction,
                &format!("Unknown quiz subcommand: `{unknown}`"),
            )
            .await
        }
    }
}

async fn start(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
    options: &[ResolvedOption<'_>],
) -> anyhow::Result<()> {
    let mut topic = String::new();
    let mut count = DEFAULT_QUESTION_COUNT;
    let mut difficulty = Difficulty::Medium;

    for option in options {
        match (option.name, &option.value) {
            ("topic", ResolvedValue::String(value)) => topic = value.to_string(),
            ("count", ResolvedValue::Integer(value)) => {
                count = (*value).clamp(1, MAX_QUESTION_COUNT as i64) as u8;
            }
            ("difficulty", ResolvedValue::String(value)) => {
                difficulty = Difficulty::parse(value);
            }
            _ => {}
        }
    }

    if topic.trim().is_empty() {
        return commands::error::run(context, interaction, "Please provide a quiz topic.").await;
    }

    let channel_id = interaction.channel_id.get();
    if handler.sessions.get(channel_id).is_some() {
        return commands::error::run(
            context,
            interaction,
            "A quiz is already running in this channel. Use `/quiz stop` to end it first.",
        )
        .await;
    }

    if !handler.quiz_generator.is_available() {
        return commands::error::run(
            context,
            interaction,
            "No question provider is configured. Ask an admin to set an API key.",
        )
        .await;
    }

    // Generation takes seconds; acknowledge first.
    interaction.defer(&context.http).await?;

    tracing::info!(
        "[QUIZ] Generating {} {} questions about '{}' for {}",
        count,
        difficulty.as_str(),
        topic,
        interaction.user.id
    );
    let questions = handler
        .quiz_generator
        .generate(&topic, count, difficulty, "general")
        .await;

    let quiz = ActiveQuiz::new(
        interaction.user.id.get(),
        interaction.user.name.clone(),
        topic.clone(),
        difficulty,
        questions,
    );

    let embed = question_embed(&quiz, None);
    let buttons = answer_buttons(&quiz);

    if handler.sessions.start(channel_id, quiz).is_err() {
        return commands::error::edit_response(
            context,
            interaction,
            "A quiz started in this channel while yours was being prepared.",
        )
        .await;
    }

    interaction
        .edit_response(
            &context.http,
            EditInteractionResponse::new()
                .embed(embed)
                .components(buttons),
        )
        .await?;

    Ok(())
}

async fn stop(
    handler: &Handler,
    context: &Context,
    interaction: &CommandInteraction,
) -> anyhow::Result<()> {
    let channel_id = interaction.channel_id.get();

    let Some(quiz) = handler.sessions.stop(channel_id) else {
        return commands::error::run(context, interaction, "No quiz is running in this channel.")
            .await;
    };

    let embed = CreateEmbed::new()
        .title("🛑 Quiz Stopped")
        .description(format!(
            "The quiz about **{}** was stopped after {} of {} questions.\n\
             Score so far: {} correct, {} wrong.",
            quiz.topic,
            quiz.current,
            quiz.total_questions(),
            quiz.correct,
            quiz.wrong
        ))
        .color(Colour::RED);

    let response = CreateInteractionResponseMessage::new().embed(embed);
    interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}

async fn topics(context: &Context, interaction: &CommandInteraction) -> anyhow::Result<()> {
    let embed = CreateEmbed::new()
        .title("💡 Popular Quiz Topics")
        .description(
            "A few ideas to get started:\n\n\
             • **Science** - physics, chemistry, biology, astronomy\n\
             • **History** - world wars, ancient civilizations, famous figures\n\
             • **Geography** - capitals, flags, landmarks\n\
             • **Programming** - Rust, Python, algorithms, databases\n\
             • **Pop Culture** - movies, music, video games\n\n\
             Any topic works - just try `/quiz start <your topic>`!",
        )
        .color(Colour::from_rgb(34, 197, 94));

    let response = CreateInteractionResponseMessage::new()
        .embed(embed)
        .ephemeral(true);
    interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await?;

    Ok(())
}

/// Session-scoped answer buttons. These intentionally bypass the persistent
/// UI system: a quiz dies with the process, so plain prefixed ids suffice.
pub async fn handle_button(
    handler: &Handler,
    context: &Context,
    component: &ComponentInteraction,
) -> anyhow::Result<()> {
    let Some(index) = components::extract_custom_id_value(&component.data.custom_id, ANSWER_PREFIX)
        .and_then(|raw| raw.parse::<usize>().ok())
    else {
        return Ok(());
    };

    let channel_id = component.channel_id.get();
    let user_id = component.user.id.get();

    let outcome = match handler.sessions.answer(channel_id, user_id, index) {
        Ok(outcome) => outcome,
        Err(AnswerError::NoSession) => {
            return components::ephemeral_text(
                context,
                component,
                "No active quiz in this channel. It may have ended or been restarted.",
            )
            .await;
        }
        Err(AnswerError::NotYourQuiz) => {
            return components::ephemeral_text(
                context,
                component,
                "Only the quiz host can answer. Start your own with `/quiz start`!",
            )
            .await;
        }
        Err(AnswerError::InvalidOption) => {
            return components::ephemeral_text(context, component, "That option is not valid.")
                .await;
        }
    };

    if let Some(finished) = &outcome.finished_quiz {
        return finish_quiz(handler, context, component, &outcome, finished).await;
    }

    let Some(quiz) = handler.sessions.get(channel_id) else {
        return components::ephemeral_text(context, component, "The quiz ended unexpectedly.")
            .await;
    };

    let embed = question_embed(&quiz, Some(feedback_line(&outcome)));
    let buttons = answer_buttons(&quiz);

    let response = CreateInteractionResponseMessage::new()
        .embed(embed)
        .components(buttons);
    component
        .create_response(context, CreateInteractionResponse::UpdateMessage(response))
        .await?;

    Ok(())
}

async fn finish_quiz(
    handler: &Handler,
    context: &Context,
    component: &ComponentInteraction,
    outcome: &AnswerOutcome,
    quiz: &ActiveQuiz,
) -> anyhow::Result<()> {
    let guild_id = component.guild_id.map(|id| id.get());
    let completion = handler
        .database
        .update_stats(
            quiz.host_id,
            guild_id,
            &quiz.host_name,
            quiz.correct,
            quiz.wrong,
            quiz.difficulty,
        )
        .await?;

    let mut description = format!(
        "{}\n\n**{}** answered {} of {} questions correctly!",
        feedback_line(outcome),
        quiz.host_name,
        quiz.correct,
        quiz.total_questions()
    );

    if let Some(new_level) = completion.leveled_up {
        description.push_str(&format!("\n\n🎉 **Level up! You reached level {new_level}!**"));
    }

    let embed = CreateEmbed::new()
        .title(format!("🏁 Quiz Complete - {}", quiz.topic))
        .description(description)
        .color(Colour::GOLD)
        .field(
            "XP Earned",
            xp::breakdown_message(&completion.breakdown, quiz.difficulty),
            false,
        )
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "Daily streak: {} - see /stats for your full progress",
            completion.current_streak
        )));

    let response = CreateInteractionResponseMessage::new()
        .embed(embed)
        .components(Vec::new());
    component
        .create_response(context, CreateInteractionResponse::UpdateMessage(response))
        .await?;

    Ok(())
}

fn feedback_line(outcome: &AnswerOutcome) -> String {
    let mut line = if outcome.was_correct {
        "✅ **Correct!**".to_string()
    } else {
        format!(
            "❌ **Wrong** - the answer was **{}**.",
            outcome.correct_answer
        )
    };
    if let Some(explanation) = &outcome.explanation {
        line.push_str(&format!("\n*{explanation}*"));
    }
    line
}

fn question_embed(quiz: &ActiveQuiz, feedback: Option<String>) -> CreateEmbed {
    let Some(question) = quiz.current_question() else {
        return CreateEmbed::new()
            .title("Quiz")
            .description("No more questions.")
            .color(Colour::RED);
    };

    let options_text: Vec<String> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| format!("**{}.** {}", ANSWER_LABELS.get(i).unwrap_or(&"?"), option))
        .collect();

    let mut embed = CreateEmbed::new()
        .title(format!(
            "🎯 {} - Question {}/{}",
            quiz.topic,
            quiz.current + 1,
            quiz.total_questions()
        ))
        .description(format!("{}\n\n{}", question.text, options_text.join("\n")))
        .color(Colour::BLUE)
        .footer(serenity::all::CreateEmbedFooter::new(format!(
            "Difficulty: {} | Score: {} correct, {} wrong",
            quiz.difficulty.as_str(),
            quiz.correct,
            quiz.wrong
        )));

    if let Some(feedback) = feedback {
        embed = embed.field("Previous Question", feedback, false);
    }

    embed
}

fn answer_buttons(quiz: &ActiveQuiz) -> Vec<CreateActionRow> {
    let Some(question) = quiz.current_question() else {
        return Vec::new();
    };

    let buttons: Vec<CreateButton> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, _)| {
            CreateButton::new(format!("{ANSWER_PREFIX}{i}"))
                .label(ANSWER_LABELS.get(i).copied().unwrap_or("?"))
                .style(ButtonStyle::Primary)
        })
        .collect();

    vec![CreateActionRow::Buttons(buttons)]
}

pub fn register() -> CreateCommand {
    CreateCommand::new("quiz")
        .description("Start and manage quizzes")
        .add_option(
            CreateCommandOption::new(CommandOptionType::SubCommand, "start", "Start a new quiz")
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "topic",
                        "What the quiz should be about",
                    )
                    .required(true),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::Integer,
                        "count",
                        "Number of questions (1-20, default 5)",
                    )
                    .min_int_value(1)
                    .max_int_value(MAX_QUESTION_COUNT as u64)
                    .required(false),
                )
                .add_sub_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "difficulty",
                        "Question difficulty (default medium)",
                    )
                    .add_string_choice("Easy", "easy")
                    .add_string_choice("Medium", "medium")
                    .add_string_choice("Hard", "hard")
                    .required(false),
                ),
        )
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "stop",
            "Stop the quiz running in this channel",
        ))
        .add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            "topics",
            "Show popular quiz topics",
        ))
        .contexts(vec![
            InteractionContext::Guild,
            InteractionContext::PrivateChannel,
        ])
}
