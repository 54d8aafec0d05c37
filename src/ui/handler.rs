use std::collections::HashMap;
use std::sync::Arc;

use serenity::all::{ButtonStyle, ComponentInteraction, Context, ReactionType};

use crate::bot::Handler;
use crate::ui::handlers;
use crate::ui::state::{ButtonState, UiError};

/// User-facing copy for the shared validation/error paths.
pub const MSG_BUTTON_EXPIRED: &str = "This button has expired.";
pub const MSG_BUTTON_UNAUTHORIZED: &str = "This button isn't for you.";
pub const MSG_BUTTON_ERROR: &str =
    "An error occurred while processing your request. Please try again later.";
pub const MSG_STATE_NOT_FOUND: &str = "Button state not found. It may predate the last restart.";
pub const MSG_HANDLER_UNAVAILABLE: &str = "Button handler not available. Please try again later.";

/// The closed set of button handler families.
///
/// Wire names match the identifiers already stored inside Discord messages,
/// so restarts keep resolving buttons minted by earlier versions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum HandlerId {
    Navigation,
    StatsNavigation,
    LeaderboardToggle,
    WelcomeAction,
    HelpAction,
}

impl HandlerId {
    pub const ALL: [HandlerId; 5] = [
        HandlerId::Navigation,
        HandlerId::StatsNavigation,
        HandlerId::LeaderboardToggle,
        HandlerId::WelcomeAction,
        HandlerId::HelpAction,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Navigation => "NavigationHandler",
            Self::StatsNavigation => "StatsNavigationHandler",
            Self::LeaderboardToggle => "LeaderboardToggleHandler",
            Self::WelcomeAction => "WelcomeActionHandler",
            Self::HelpAction => "HelpActionHandler",
        }
    }

    pub fn from_wire(name: &str) -> Result<Self, UiError> {
        match name {
            "NavigationHandler" => Ok(Self::Navigation),
            "StatsNavigationHandler" => Ok(Self::StatsNavigation),
            "LeaderboardToggleHandler" => Ok(Self::LeaderboardToggle),
            "WelcomeActionHandler" => Ok(Self::WelcomeAction),
            "HelpActionHandler" => Ok(Self::HelpAction),
            other => Err(UiError::UnknownHandler(other.to_string())),
        }
    }
}

/// Visual configuration a handler derives from button state.
#[derive(Clone, Debug)]
pub struct ButtonConfig {
    pub style: ButtonStyle,
    pub label: Option<String>,
    pub emoji: Option<ReactionType>,
    pub disabled: bool,
}

impl ButtonConfig {
    /// Safe fallback used when no handler config is available.
    pub fn fallback() -> Self {
        ButtonConfig {
            style: ButtonStyle::Secondary,
            label: Some("Action".to_string()),
            emoji: None,
            disabled: false,
        }
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self::fallback()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValidationFailure {
    Expired,
    Unauthorized,
}

impl ValidationFailure {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Expired => MSG_BUTTON_EXPIRED,
            Self::Unauthorized => MSG_BUTTON_UNAUTHORIZED,
        }
    }
}

/// Shared authorization and expiry check, run before any handler body.
///
/// `owner_id == 0` is the public sentinel: any user passes. Expiry is
/// checked first so an expired personal button reads as expired, not as
/// someone else's.
pub fn validate(state: &ButtonState, user_id: u64) -> Result<(), ValidationFailure> {
    if state.is_expired() {
        return Err(ValidationFailure::Expired);
    }
    if state.owner_id != 0 && state.owner_id != user_id {
        return Err(ValidationFailure::Unauthorized);
    }
    Ok(())
}

/// One concrete handler per family of buttons.
#[serenity::async_trait]
pub trait ButtonHandler: Send + Sync {
    /// Derive the visual config for a button. Pure function of state.
    fn button_config(&self, state: &ButtonState) -> ButtonConfig;

    /// React to an activation. Validation has already passed when this runs.
    async fn handle_interaction(
        &self,
        bot: &Handler,
        context: &Context,
        interaction: &ComponentInteraction,
        state: &ButtonState,
    ) -> anyhow::Result<()>;
}

/// Process-wide handler table, fully populated before the gateway connects
/// and never mutated afterward.
pub struct HandlerRegistry {
    handlers: HashMap<HandlerId, Arc<dyn ButtonHandler>>,
}

impl HandlerRegistry {
    /// Register every built-in handler.
    pub fn builtin() -> Self {
        let mut table: HashMap<HandlerId, Arc<dyn ButtonHandler>> = HashMap::new();
        table.insert(
            HandlerId::Navigation,
            Arc::new(handlers::navigation::NavigationHandler),
        );
        table.insert(
            HandlerId::StatsNavigation,
            Arc::new(handlers::stats_navigation::StatsNavigationHandler),
        );
        table.insert(
            HandlerId::LeaderboardToggle,
            Arc::new(handlers::leaderboard_toggle::LeaderboardToggleHandler),
        );
        table.insert(
            HandlerId::WelcomeAction,
            Arc::new(handlers::welcome_action::WelcomeActionHandler),
        );
        table.insert(
            HandlerId::HelpAction,
            Arc::new(handlers::help_action::HelpActionHandler),
        );

        tracing::info!("[UI] Registered {} button handlers", table.len());
        HandlerRegistry { handlers: table }
    }

    pub fn get(&self, id: HandlerId) -> Option<Arc<dyn ButtonHandler>> {
        self.handlers.get(&id).cloned()
    }

    /// Resolve a wire name from a custom_id into a live handler.
    pub fn resolve(&self, wire_name: &str) -> Result<(HandlerId, Arc<dyn ButtonHandler>), UiError> {
        let id = HandlerId::from_wire(wire_name)?;
        let handler = self
            .get(id)
            .ok_or_else(|| UiError::UnknownHandler(wire_name.to_string()))?;
        Ok((id, handler))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::state::ButtonPayload;
    use chrono::Utc;

    fn action_state(owner_id: u64) -> ButtonState {
        ButtonState::new(
            owner_id,
            ButtonPayload::Action {
                name: "quiz".to_string(),
            },
        )
    }

    #[test]
    fn test_public_sentinel_passes_for_anyone() {
        let state = action_state(0);
        assert!(validate(&state, 1).is_ok());
        assert!(validate(&state, u64::MAX).is_ok());
    }

    #[test]
    fn test_owned_button_requires_exact_match() {
        let state = action_state(99);
        assert!(validate(&state, 99).is_ok());
        assert_eq!(
            validate(&state, 100),
            Err(ValidationFailure::Unauthorized)
        );
    }

    #[test]
    fn test_expired_beats_unauthorized() {
        let state = action_state(99).with_expiry(Some(Utc::now().timestamp() - 1));
        assert_eq!(validate(&state, 100), Err(ValidationFailure::Expired));
        assert_eq!(validate(&state, 99), Err(ValidationFailure::Expired));
    }

    #[test]
    fn test_wire_names_roundtrip() {
        for id in HandlerId::ALL {
            assert_eq!(HandlerId::from_wire(id.wire_name()).unwrap(), id);
        }
        assert!(matches!(
            HandlerId::from_wire("NoSuchHandler"),
            Err(UiError::UnknownHandler(_))
        ));
    }
}
