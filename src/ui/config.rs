use chrono::Duration;

/// Discord-imposed and self-imposed limits for persistent UI components.
#[derive(Clone, Debug)]
pub struct UiLimits {
    /// Hard Discord limit on a component's custom_id.
    pub custom_id_max_length: usize,
    /// Budget for the base64 state segment before falling back to the database.
    pub encoded_state_max_length: usize,
    /// Discord limit on buttons in a single view (5 rows of 5).
    pub max_buttons_per_view: usize,
    pub buttons_per_row: usize,
}

impl Default for UiLimits {
    fn default() -> Self {
        UiLimits {
            custom_id_max_length: 100,
            encoded_state_max_length: 80,
            max_buttons_per_view: 25,
            buttons_per_row: 5,
        }
    }
}

/// Segments of the persistent custom_id formats.
///
/// Inline:   `pui:{encoded_state}:{handler_name}`
/// Database: `pui:db:{handler_name}:{unique_suffix}`
/// Memory:   `pui:mem:{handler_name}:{unique_suffix}`
#[derive(Clone, Debug)]
pub struct UiPrefixes {
    pub persistent_button: String,
    pub database: String,
    pub memory: String,
}

impl Default for UiPrefixes {
    fn default() -> Self {
        UiPrefixes {
            persistent_button: "pui".to_string(),
            database: "db".to_string(),
            memory: "mem".to_string(),
        }
    }
}

/// Expiry presets for the different button families.
#[derive(Clone, Debug)]
pub struct UiTimeouts {
    pub navigation_minutes: i64,
    pub stats_minutes: i64,
    pub faq_minutes: i64,
    pub help_minutes: i64,
    pub toggle_hours: i64,
}

impl Default for UiTimeouts {
    fn default() -> Self {
        UiTimeouts {
            navigation_minutes: 30,
            stats_minutes: 30,
            faq_minutes: 15,
            help_minutes: 60,
            toggle_hours: 1,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct UiConfig {
    pub limits: UiLimits,
    pub prefixes: UiPrefixes,
    pub timeouts: UiTimeouts,
}

impl UiConfig {
    /// Build the config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = UiConfig::default();

        UiConfig {
            limits: UiLimits {
                custom_id_max_length: env_usize(
                    "UI_CUSTOM_ID_MAX_LENGTH",
                    defaults.limits.custom_id_max_length,
                ),
                encoded_state_max_length: env_usize(
                    "UI_ENCODED_STATE_MAX_LENGTH",
                    defaults.limits.encoded_state_max_length,
                ),
                max_buttons_per_view: env_usize(
                    "UI_MAX_BUTTONS_PER_VIEW",
                    defaults.limits.max_buttons_per_view,
                ),
                buttons_per_row: defaults.limits.buttons_per_row,
            },
            prefixes: defaults.prefixes,
            timeouts: UiTimeouts {
                navigation_minutes: env_i64(
                    "UI_NAVIGATION_TIMEOUT_MINUTES",
                    defaults.timeouts.navigation_minutes,
                ),
                stats_minutes: env_i64(
                    "UI_STATS_TIMEOUT_MINUTES",
                    defaults.timeouts.stats_minutes,
                ),
                faq_minutes: env_i64("UI_FAQ_TIMEOUT_MINUTES", defaults.timeouts.faq_minutes),
                help_minutes: env_i64("UI_HELP_TIMEOUT_MINUTES", defaults.timeouts.help_minutes),
                toggle_hours: env_i64("UI_TOGGLE_TIMEOUT_HOURS", defaults.timeouts.toggle_hours),
            },
        }
    }
}

impl UiTimeouts {
    pub fn navigation(&self) -> Duration {
        Duration::minutes(self.navigation_minutes)
    }

    pub fn stats(&self) -> Duration {
        Duration::minutes(self.stats_minutes)
    }

    pub fn faq(&self) -> Duration {
        Duration::minutes(self.faq_minutes)
    }

    pub fn help(&self) -> Duration {
        Duration::minutes(self.help_minutes)
    }

    pub fn toggle(&self) -> Duration {
        Duration::hours(self.toggle_hours)
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    dotenvy::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    dotenvy::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_discord() {
        let config = UiConfig::default();
        assert_eq!(config.limits.custom_id_max_length, 100);
        assert_eq!(config.limits.max_buttons_per_view, 25);
        assert_eq!(config.limits.buttons_per_row, 5);
    }

    #[test]
    fn test_encoded_budget_below_custom_id_limit() {
        let config = UiConfig::default();
        assert!(config.limits.encoded_state_max_length < config.limits.custom_id_max_length);
    }
}
