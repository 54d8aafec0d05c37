use chrono::{Duration, Utc};
use serenity::all::{CreateActionRow, CreateButton, Message};

use crate::ui::context::UiContext;
use crate::ui::handler::{ButtonConfig, HandlerId};
use crate::ui::state::{ButtonPayload, ButtonState, UiError};
use crate::ui::store::ButtonRecord;

/// How a button's state survives (or doesn't survive) a restart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PersistenceMode {
    /// State lives inside the custom_id. Fast, size-limited.
    StateEncoded,
    /// State lives in the durable store, keyed by the custom_id.
    Database,
    /// State lives only in this process and dies with it.
    Memory,
}

/// A database-mode button awaiting its durable write.
#[derive(Clone, Debug)]
struct PendingButton {
    custom_id: String,
    handler: HandlerId,
    state: ButtonState,
}

/// Composes persistent buttons into one interactive message attachment,
/// picking the cheapest persistence mode that fits each button.
pub struct PersistentView<'a> {
    ui: &'a UiContext,
    view_class: &'static str,
    default_mode: PersistenceMode,
    buttons: Vec<CreateButton>,
    pending: Vec<PendingButton>,
}

impl<'a> PersistentView<'a> {
    pub fn new(ui: &'a UiContext, view_class: &'static str) -> Self {
        PersistentView {
            ui,
            view_class,
            default_mode: PersistenceMode::StateEncoded,
            buttons: Vec::new(),
            pending: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: PersistenceMode) -> Self {
        self.default_mode = mode;
        self
    }

    /// Add a persistent button, returning the custom_id it was minted with.
    ///
    /// Inline encoding is tried first; a state too complex for the budget
    /// transparently falls back to database mode. Identifier length and the
    /// per-view button cap fail construction loudly.
    pub fn add_button(
        &mut self,
        handler: HandlerId,
        owner_id: u64,
        payload: ButtonPayload,
        guild_id: Option<u64>,
        expires_in: Option<Duration>,
    ) -> Result<String, UiError> {
        let mode = self.default_mode;
        self.add_button_with_mode(handler, owner_id, payload, guild_id, expires_in, mode)
    }

    pub fn add_button_with_mode(
        &mut self,
        handler: HandlerId,
        owner_id: u64,
        payload: ButtonPayload,
        guild_id: Option<u64>,
        expires_in: Option<Duration>,
        mode: PersistenceMode,
    ) -> Result<String, UiError> {
        let limits = &self.ui.config.limits;
        if self.buttons.len() >= limits.max_buttons_per_view {
            return Err(UiError::TooManyButtons {
                max: limits.max_buttons_per_view,
            });
        }

        let expires_at = expires_in.map(|d| (Utc::now() + d).timestamp());
        let state = ButtonState::new(owner_id, payload)
            .with_guild(guild_id)
            .with_expiry(expires_at);

        let custom_id = match mode {
            PersistenceMode::StateEncoded => {
                match state.encode(limits.encoded_state_max_length) {
                    Ok(encoded) => self.checked_custom_id(format!(
                        "{}:{}:{}",
                        self.ui.config.prefixes.persistent_button,
                        encoded,
                        handler.wire_name()
                    ))?,
                    Err(UiError::StateTooComplex { encoded_len, budget }) => {
                        // Expected fallback, not a defect.
                        tracing::debug!(
                            "[UI] State for {} exceeds inline budget ({} > {}), using database persistence",
                            handler.wire_name(),
                            encoded_len,
                            budget
                        );
                        return self.add_button_with_mode(
                            handler,
                            state.owner_id,
                            state.payload,
                            state.guild_id,
                            expires_in,
                            PersistenceMode::Database,
                        );
                    }
                    Err(other) => return Err(other),
                }
            }
            PersistenceMode::Database => {
                let custom_id = self.checked_custom_id(format!(
                    "{}:{}:{}:{}",
                    self.ui.config.prefixes.persistent_button,
                    self.ui.config.prefixes.database,
                    handler.wire_name(),
                    unique_suffix(owner_id)
                ))?;

                // Registered in memory immediately so the very next click
                // works before the durable write lands.
                self.ui.register_button(&custom_id, state.clone(), handler);
                self.pending.push(PendingButton {
                    custom_id: custom_id.clone(),
                    handler,
                    state: state.clone(),
                });
                custom_id
            }
            PersistenceMode::Memory => {
                let custom_id = self.checked_custom_id(format!(
                    "{}:{}:{}:{}",
                    self.ui.config.prefixes.persistent_button,
                    self.ui.config.prefixes.memory,
                    handler.wire_name(),
                    unique_suffix(owner_id)
                ))?;

                self.ui.register_button(&custom_id, state.clone(), handler);
                custom_id
            }
        };

        let config = self
            .ui
            .registry
            .get(handler)
            .map(|h| h.button_config(&state))
            .unwrap_or_else(ButtonConfig::fallback);

        let mut button = CreateButton::new(custom_id.clone())
            .style(config.style)
            .disabled(config.disabled || state.is_expired());
        if let Some(label) = config.label {
            button = button.label(label);
        }
        if let Some(emoji) = config.emoji {
            button = button.emoji(emoji);
        }
        self.buttons.push(button);

        Ok(custom_id)
    }

    fn checked_custom_id(&self, custom_id: String) -> Result<String, UiError> {
        let max = self.ui.config.limits.custom_id_max_length;
        if custom_id.len() > max {
            return Err(UiError::CustomIdTooLong {
                len: custom_id.len(),
                max,
            });
        }
        Ok(custom_id)
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn has_database_buttons(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Chunk the buttons into action rows of five.
    pub fn components(&self) -> Vec<CreateActionRow> {
        self.buttons
            .chunks(self.ui.config.limits.buttons_per_row)
            .map(|chunk| CreateActionRow::Buttons(chunk.to_vec()))
            .collect()
    }

    /// Upsert every database-mode button against the message that now
    /// carries it. Per-button store failures are logged and do not abort
    /// the rest.
    pub async fn persist_to_database(&self, message: &Message) -> usize {
        let mut stored = 0;
        for pending in &self.pending {
            let record = ButtonRecord::from_state(
                &pending.custom_id,
                pending.handler,
                self.view_class,
                &pending.state,
                message.channel_id.get(),
                message.id.get(),
            );

            match self.ui.store.store(&record).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    tracing::error!(
                        "[UI] Failed to persist button {} for message {}: {}",
                        pending.custom_id,
                        message.id,
                        e
                    );
                }
            }
        }

        if stored > 0 {
            tracing::debug!(
                "[UI] Persisted {} database-mode buttons for message {}",
                stored,
                message.id
            );
        }
        stored
    }
}

/// Collision-resistant suffix for database/memory-mode identifiers:
/// millisecond timestamp plus a random component, so rapid repeated calls
/// in the same millisecond still diverge.
fn unique_suffix(owner_id: u64) -> String {
    let millis = Utc::now().timestamp_millis();
    let salt = 100_000 + (rand::random::<u32>() % 900_000);
    format!("{}_{}_{}", owner_id, millis, salt)
}
