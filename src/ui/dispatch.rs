use std::sync::Arc;

use serenity::all::{ComponentInteraction, Context};

use crate::bot::Handler;
use crate::bot::helpers::components;
use crate::ui::handler::{
    ButtonHandler, HandlerId, MSG_BUTTON_ERROR, MSG_HANDLER_UNAVAILABLE, MSG_STATE_NOT_FOUND,
    validate,
};
use crate::ui::recovery::RecoveryPhase;
use crate::ui::state::{ButtonState, UiError};

/// Excerpt length for error text surfaced to users; raw internals stay in
/// the logs.
const ERROR_EXCERPT_CHARS: usize = 100;

/// Platform-invoked entry point for persistent button activations.
///
/// Database/memory-mode identifiers resolve through the in-memory recovery
/// table (no I/O on the click path); inline identifiers decode through the
/// codec. Everything past this boundary is terminal: no error propagates
/// far enough to take the process down.
pub async fn dispatch_component(
    bot: &Handler,
    context: &Context,
    component: &ComponentInteraction,
) -> anyhow::Result<()> {
    let custom_id = component.data.custom_id.clone();
    let prefixes = &bot.ui.config.prefixes;

    let db_prefix = format!("{}:{}:", prefixes.persistent_button, prefixes.database);
    let mem_prefix = format!("{}:{}:", prefixes.persistent_button, prefixes.memory);
    let inline_prefix = format!("{}:", prefixes.persistent_button);

    if custom_id.starts_with(&db_prefix) || custom_id.starts_with(&mem_prefix) {
        dispatch_stored(bot, context, component, &custom_id).await
    } else if let Some(rest) = custom_id.strip_prefix(inline_prefix.as_str()) {
        dispatch_inline(bot, context, component, &custom_id, rest).await
    } else {
        // The router only forwards pui-prefixed ids; anything else is a bug
        // in the routing table, not in the button.
        tracing::debug!("[UI] Dispatcher received non-persistent id: {}", custom_id);
        Ok(())
    }
}

/// Database/memory mode: the in-memory table is the authoritative fast path.
/// A miss here is unrecoverable for this process.
async fn dispatch_stored(
    bot: &Handler,
    context: &Context,
    component: &ComponentInteraction,
    custom_id: &str,
) -> anyhow::Result<()> {
    let Some(entry) = bot.ui.lookup_button(custom_id) else {
        let phase = bot.ui.phase();
        if phase != RecoveryPhase::Ready {
            tracing::warn!(
                "[UI] State for {} not found during {:?} phase; recovery may still be running",
                custom_id,
                phase
            );
        } else {
            tracing::warn!("[UI] No stored state for button {}", custom_id);
        }
        return components::ephemeral_text(context, component, MSG_STATE_NOT_FOUND).await;
    };

    let Some(handler) = bot.ui.registry.get(entry.handler) else {
        tracing::error!(
            "[UI] Handler {} missing from registry; wiring defect",
            entry.handler.wire_name()
        );
        return components::ephemeral_text(context, component, MSG_HANDLER_UNAVAILABLE).await;
    };

    run_handler(bot, context, component, entry.handler, handler, &entry.state).await
}

/// Inline mode: all state travels in the identifier itself.
async fn dispatch_inline(
    bot: &Handler,
    context: &Context,
    component: &ComponentInteraction,
    custom_id: &str,
    rest: &str,
) -> anyhow::Result<()> {
    let Some((encoded, wire_name)) = rest.split_once(':') else {
        tracing::warn!("[UI] Persistent id without handler segment: {}", custom_id);
        return components::ephemeral_text(context, component, MSG_STATE_NOT_FOUND).await;
    };

    let state = match ButtonState::decode(encoded) {
        Ok(state) => state,
        Err(e) => {
            // Tampered or truncated identifier. The raw id goes to the log
            // for forensics; the user gets a generic response.
            tracing::warn!("[UI] Malformed state in {}: {}", custom_id, e);
            return components::ephemeral_text(
                context,
                component,
                "This button has expired or is invalid.",
            )
            .await;
        }
    };

    let (handler_id, handler) = match bot.ui.registry.resolve(wire_name) {
        Ok(resolved) => resolved,
        Err(UiError::UnknownHandler(name)) => {
            tracing::error!("[UI] No handler registered for {}; deployment defect", name);
            return components::ephemeral_text(context, component, MSG_HANDLER_UNAVAILABLE).await;
        }
        Err(e) => return Err(e.into()),
    };

    run_handler(bot, context, component, handler_id, handler, &state).await
}

/// Shared validate-then-handle sequence with the central error boundary.
async fn run_handler(
    bot: &Handler,
    context: &Context,
    component: &ComponentInteraction,
    handler_id: HandlerId,
    handler: Arc<dyn ButtonHandler>,
    state: &ButtonState,
) -> anyhow::Result<()> {
    if let Err(failure) = validate(state, component.user.id.get()) {
        // Expected user behavior, not an error condition.
        tracing::debug!(
            "[UI] Validation rejected {} for user {}: {:?}",
            handler_id.wire_name(),
            component.user.id,
            failure
        );
        return components::ephemeral_text(context, component, failure.user_message()).await;
    }

    if let Err(e) = handler
        .handle_interaction(bot, context, component, state)
        .await
    {
        tracing::error!(
            "[UI] Handler {} failed for payload {:?}: {:#}",
            handler_id.wire_name(),
            state.payload,
            e
        );

        // A vanished or forbidden message will never start working again;
        // retire its durable records instead of retrying forever.
        if is_terminal_platform_error(&e) {
            let message_id = component.message.id.get();
            match bot.ui.store.deactivate_message(message_id).await {
                Ok(affected) if affected > 0 => {
                    tracing::warn!(
                        "[UI] Deactivated {} button records for unreachable message {}",
                        affected,
                        message_id
                    );
                }
                Ok(_) => {}
                Err(db_err) => {
                    tracing::error!(
                        "[UI] Failed to deactivate buttons for message {}: {}",
                        message_id,
                        db_err
                    );
                }
            }
        }

        let excerpt: String = e.to_string().chars().take(ERROR_EXCERPT_CHARS).collect();
        let text = format!("{MSG_BUTTON_ERROR}\nError: {excerpt}");
        if let Err(send_err) = components::ephemeral_text(context, component, &text).await {
            tracing::error!("[UI] Failed to send handler error response: {}", send_err);
        }
    }

    Ok(())
}

/// True when the error chain bottoms out in a Discord not-found or
/// missing-permissions response.
fn is_terminal_platform_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<serenity::Error>(),
            Some(serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(
                response
            ))) if response.status_code == serenity::http::StatusCode::NOT_FOUND
                || response.status_code == serenity::http::StatusCode::FORBIDDEN
        )
    })
}
