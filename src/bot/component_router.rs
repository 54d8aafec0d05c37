use crate::bot::Handler;
use crate::commands;
use crate::ui::dispatch;
use anyhow::Result;
use serenity::all::{ComponentInteraction, Context};

/// Route component interactions (button clicks) to their handlers
pub async fn route_component_interaction(
    handler: &Handler,
    context: &Context,
    component: &ComponentInteraction,
) -> Result<()> {
    let custom_id = component.data.custom_id.as_str();
    let persistent_prefix = format!("{}:", handler.ui.config.prefixes.persistent_button);

    match custom_id {
        // Persistent UI buttons (inline-encoded, database and memory modes)
        id if id.starts_with(&persistent_prefix) => {
            dispatch::dispatch_component(handler, context, component).await
        }

        // Session-scoped quiz answer buttons
        id if id.starts_with("quiz_answer_") => {
            commands::quiz::handle_button(handler, context, component).await
        }

        // Unknown component interaction - ignore silently
        _ => {
            tracing::debug!("Unhandled component interaction: {}", custom_id);
            Ok(())
        }
    }
}
