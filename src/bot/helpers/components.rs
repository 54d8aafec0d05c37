use serenity::all::{
    ComponentInteraction, Context, CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage,
};

/// Send an ephemeral text response to a component interaction.
///
/// Falls back to a followup when the interaction was already acknowledged
/// (a handler that responded before failing).
pub async fn ephemeral_text(
    context: &Context,
    interaction: &ComponentInteraction,
    content: &str,
) -> anyhow::Result<()> {
    let response = CreateInteractionResponseMessage::new()
        .content(content)
        .ephemeral(true);

    if interaction
        .create_response(context, CreateInteractionResponse::Message(response))
        .await
        .is_err()
    {
        interaction
            .create_followup(
                context,
                CreateInteractionResponseFollowup::new()
                    .content(content)
                    .ephemeral(true),
            )
            .await?;
    }

    Ok(())
}

/// Extract a value from a custom_id with a prefix
///
/// # Example
/// ```
/// let value = extract_custom_id_value("quiz_answer_2", "quiz_answer_");
/// assert_eq!(value, Some("2"));
/// ```
pub fn extract_custom_id_value<'a>(custom_id: &'a str, prefix: &str) -> Option<&'a str> {
    custom_id.strip_prefix(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_custom_id_value() {
        assert_eq!(extract_custom_id_value("quiz_answer_2", "quiz_answer_"), Some("2"));
        assert_eq!(extract_custom_id_value("other_3", "quiz_answer_"), None);
    }
}
