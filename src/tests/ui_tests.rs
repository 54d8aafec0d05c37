#[cfg(test)]
pub mod tests {
    use std::collections::HashSet;

    use chrono::{Duration, Utc};
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::ui::UiContext;
    use crate::ui::config::UiConfig;
    use crate::ui::handler::HandlerId;
    use crate::ui::recovery::{self, FetchedMessage, MessageSource, RecoveryPhase};
    use crate::ui::state::{ButtonPayload, ButtonState, Direction, ToggleScope, UiError};
    use crate::ui::store::{ButtonRecord, ButtonStore};
    use crate::ui::view::{PersistenceMode, PersistentView};

    /// In-memory SQLite needs a single connection, or each checkout would
    /// see its own empty database.
    async fn memory_store() -> ButtonStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = ButtonStore::new(pool);
        store.setup_tables().await.unwrap();
        store
    }

    async fn memory_ui() -> UiContext {
        UiContext::new(UiConfig::default(), memory_store().await)
    }

    fn toggle_state(owner_id: u64) -> ButtonState {
        ButtonState::new(
            owner_id,
            ButtonPayload::Toggle {
                scope: ToggleScope::Server,
            },
        )
    }

    fn record(custom_id: &str, message_id: u64, state: &ButtonState) -> ButtonRecord {
        ButtonRecord::from_state(
            custom_id,
            HandlerId::LeaderboardToggle,
            "LeaderboardView",
            state,
            500,
            message_id,
        )
    }

    // Group 1: store semantics
    mod store_tests {
        use super::*;

        #[tokio::test]
        async fn test_store_upsert_is_idempotent() {
            let store = memory_store().await;

            let first = record("pui:db:LeaderboardToggleHandler:1_1_1", 10, &toggle_state(1));
            store.store(&first).await.unwrap();

            let mut second = first.clone();
            second.data = r#"{"s":"global"}"#.to_string();
            store.store(&second).await.unwrap();

            let rows = store.load_all_active().await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].data, r#"{"s":"global"}"#);
        }

        #[tokio::test]
        async fn test_load_skips_inactive_and_expired() {
            let store = memory_store().await;

            let live = record("live", 10, &toggle_state(1));
            store.store(&live).await.unwrap();

            let mut inactive = record("inactive", 11, &toggle_state(1));
            inactive.is_active = false;
            store.store(&inactive).await.unwrap();

            let mut expired = record("expired", 12, &toggle_state(1));
            expired.expires_at = Some(Utc::now() - Duration::hours(1));
            store.store(&expired).await.unwrap();

            assert!(store.load("live", 10).await.unwrap().is_some());
            assert!(store.load("inactive", 11).await.unwrap().is_none());
            assert!(store.load("expired", 12).await.unwrap().is_none());

            let active = store.load_all_active().await.unwrap();
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].custom_id, "live");
        }

        #[tokio::test]
        async fn test_deactivate_message_soft_deletes_all_rows() {
            let store = memory_store().await;
            store.store(&record("a", 10, &toggle_state(1))).await.unwrap();
            store.store(&record("b", 10, &toggle_state(2))).await.unwrap();
            store.store(&record("c", 11, &toggle_state(3))).await.unwrap();

            let affected = store.deactivate_message(10).await.unwrap();
            assert_eq!(affected, 2);

            let active = store.load_all_active().await.unwrap();
            assert_eq!(active.len(), 1);
            assert_eq!(active[0].message_id, 11);
        }

        #[tokio::test]
        async fn test_sweep_hard_deletes_dead_rows() {
            let store = memory_store().await;

            store.store(&record("live", 10, &toggle_state(1))).await.unwrap();

            let mut inactive = record("inactive", 11, &toggle_state(1));
            inactive.is_active = false;
            store.store(&inactive).await.unwrap();

            let mut expired = record("expired", 12, &toggle_state(1));
            expired.expires_at = Some(Utc::now() - Duration::hours(1));
            store.store(&expired).await.unwrap();

            let swept = store.sweep_expired().await.unwrap();
            assert_eq!(swept, 2);
            assert_eq!(store.load_all_active().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_record_roundtrips_to_state() {
            let state = ButtonState::new(
                7,
                ButtonPayload::Navigate {
                    direction: Direction::Next,
                    page: 1,
                    total: 4,
                    target_user: Some(99),
                },
            )
            .with_guild(Some(1234));

            let record = ButtonRecord::from_state(
                "pui:db:StatsNavigationHandler:7_1_1",
                HandlerId::StatsNavigation,
                "StatsView",
                &state,
                500,
                10,
            );

            assert_eq!(record.button_type, "nav");
            assert_eq!(record.handler_class, "StatsNavigationHandler");
            assert_eq!(record.to_state().unwrap(), state);
            assert_eq!(record.handler_id().unwrap(), HandlerId::StatsNavigation);
        }
    }

    // Group 2: view assembly and persistence-mode selection
    mod view_tests {
        use super::*;

        #[tokio::test]
        async fn test_inline_navigation_button_end_to_end() {
            let ui = memory_ui().await;
            let mut view = PersistentView::new(&ui, "FaqView");

            let custom_id = view
                .add_button(
                    HandlerId::Navigation,
                    42,
                    ButtonPayload::Navigate {
                        direction: Direction::Next,
                        page: 0,
                        total: 3,
                        target_user: None,
                    },
                    None,
                    None,
                )
                .unwrap();

            assert!(custom_id.starts_with("pui:"));
            assert!(custom_id.ends_with(":NavigationHandler"));
            assert!(custom_id.len() <= 100);

            let encoded = custom_id
                .strip_prefix("pui:")
                .unwrap()
                .strip_suffix(":NavigationHandler")
                .unwrap();
            let decoded = ButtonState::decode(encoded).unwrap();
            assert_eq!(decoded.owner_id, 42);
            assert_eq!(
                decoded.payload,
                ButtonPayload::Navigate {
                    direction: Direction::Next,
                    page: 0,
                    total: 3,
                    target_user: None,
                }
            );
        }

        #[tokio::test]
        async fn test_oversized_state_falls_back_to_database_mode() {
            let ui = memory_ui().await;
            let mut view = PersistentView::new(&ui, "ConfirmView");

            let custom_id = view
                .add_button(
                    HandlerId::WelcomeAction,
                    42,
                    ButtonPayload::Confirm {
                        token: "k".repeat(120),
                    },
                    Some(1234),
                    None,
                )
                .expect("fallback must not surface StateTooComplex");

            assert!(custom_id.starts_with("pui:db:WelcomeActionHandler:"));
            assert!(custom_id.len() <= 100);
            assert!(view.has_database_buttons());

            // Registered in memory immediately, before any durable write.
            let entry = ui.lookup_button(&custom_id).expect("state must be dispatchable");
            assert_eq!(entry.handler, HandlerId::WelcomeAction);
            assert_eq!(entry.state.owner_id, 42);
        }

        #[tokio::test]
        async fn test_database_suffixes_diverge_under_rapid_calls() {
            let ui = memory_ui().await;
            let mut view = PersistentView::new(&ui, "ConfirmView");

            let mut seen = HashSet::new();
            for _ in 0..10 {
                let custom_id = view
                    .add_button_with_mode(
                        HandlerId::WelcomeAction,
                        42,
                        ButtonPayload::Action {
                            name: "quiz".to_string(),
                        },
                        None,
                        None,
                        PersistenceMode::Database,
                    )
                    .unwrap();
                assert!(seen.insert(custom_id), "duplicate custom_id minted");
            }
        }

        #[tokio::test]
        async fn test_memory_mode_registers_without_durable_write() {
            let ui = memory_ui().await;
            let mut view = PersistentView::new(&ui, "TempView");

            let custom_id = view
                .add_button_with_mode(
                    HandlerId::HelpAction,
                    42,
                    ButtonPayload::Action {
                        name: "menu".to_string(),
                    },
                    None,
                    None,
                    PersistenceMode::Memory,
                )
                .unwrap();

            assert!(custom_id.starts_with("pui:mem:HelpActionHandler:"));
            assert!(ui.lookup_button(&custom_id).is_some());
            assert!(!view.has_database_buttons());
            assert!(ui.store.load_all_active().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_custom_id_length_guard_fails_construction() {
            let mut config = UiConfig::default();
            config.limits.custom_id_max_length = 40;
            let ui = UiContext::new(config, memory_store().await);

            let mut view = PersistentView::new(&ui, "FaqView");
            let result = view.add_button(
                HandlerId::Navigation,
                42,
                ButtonPayload::Navigate {
                    direction: Direction::Next,
                    page: 0,
                    total: 3,
                    target_user: None,
                },
                None,
                None,
            );

            assert!(matches!(result, Err(UiError::CustomIdTooLong { .. })));
        }

        #[tokio::test]
        async fn test_view_button_cap_fails_loudly() {
            let mut config = UiConfig::default();
            config.limits.max_buttons_per_view = 2;
            let ui = UiContext::new(config, memory_store().await);

            let mut view = PersistentView::new(&ui, "HelpView");
            for _ in 0..2 {
                view.add_button(
                    HandlerId::HelpAction,
                    42,
                    ButtonPayload::Action {
                        name: "menu".to_string(),
                    },
                    None,
                    None,
                )
                .unwrap();
            }

            let overflow = view.add_button(
                HandlerId::HelpAction,
                42,
                ButtonPayload::Action {
                    name: "close".to_string(),
                },
                None,
                None,
            );
            assert!(matches!(overflow, Err(UiError::TooManyButtons { max: 2 })));
        }

        #[tokio::test]
        async fn test_rows_chunked_five_per_row() {
            let ui = memory_ui().await;
            let mut view = PersistentView::new(&ui, "HelpView");
            for _ in 0..7 {
                view.add_button(
                    HandlerId::HelpAction,
                    42,
                    ButtonPayload::Action {
                        name: "menu".to_string(),
                    },
                    None,
                    None,
                )
                .unwrap();
            }

            assert_eq!(view.button_count(), 7);
            assert_eq!(view.components().len(), 2);
        }
    }

    // Group 3: startup recovery
    mod recovery_tests {
        use super::*;

        /// Scripted message source: some messages alive, some deleted, some
        /// erroring on fetch.
        struct ScriptedSource {
            alive: HashSet<u64>,
            stripped: HashSet<u64>,
            failing: HashSet<u64>,
        }

        #[serenity::async_trait]
        impl MessageSource for ScriptedSource {
            async fn fetch(
                &self,
                _channel_id: u64,
                message_id: u64,
            ) -> anyhow::Result<Option<FetchedMessage>> {
                if self.failing.contains(&message_id) {
                    anyhow::bail!("simulated network failure");
                }
                if self.stripped.contains(&message_id) {
                    return Ok(Some(FetchedMessage {
                        has_components: false,
                    }));
                }
                if self.alive.contains(&message_id) {
                    return Ok(Some(FetchedMessage {
                        has_components: true,
                    }));
                }
                Ok(None)
            }
        }

        #[tokio::test]
        async fn test_recovery_rebuilds_dispatch_table() {
            let ui = memory_ui().await;
            ui.store.store(&record("btn_a1", 10, &toggle_state(1))).await.unwrap();
            ui.store.store(&record("btn_a2", 10, &toggle_state(2))).await.unwrap();

            assert_eq!(ui.phase(), RecoveryPhase::Cold);

            let source = ScriptedSource {
                alive: HashSet::from([10]),
                stripped: HashSet::new(),
                failing: HashSet::new(),
            };
            let report = recovery::run_startup_recovery(&ui, &source).await;

            assert_eq!(ui.phase(), RecoveryPhase::Ready);
            assert_eq!(report.messages_scanned, 1);
            assert_eq!(report.buttons_recovered, 2);
            assert_eq!(report.errors, 0);

            let entry = ui.lookup_button("btn_a1").expect("recovered button must resolve");
            assert_eq!(entry.handler, HandlerId::LeaderboardToggle);
            assert_eq!(entry.state.owner_id, 1);
        }

        #[tokio::test]
        async fn test_one_failure_does_not_abort_the_pass() {
            let ui = memory_ui().await;
            // Two recoverable records on message 10, one on deleted message
            // 11, one on erroring message 12.
            ui.store.store(&record("btn_a1", 10, &toggle_state(1))).await.unwrap();
            ui.store.store(&record("btn_a2", 10, &toggle_state(2))).await.unwrap();
            ui.store.store(&record("btn_b", 11, &toggle_state(3))).await.unwrap();
            ui.store.store(&record("btn_c", 12, &toggle_state(4))).await.unwrap();

            let source = ScriptedSource {
                alive: HashSet::from([10]),
                stripped: HashSet::new(),
                failing: HashSet::from([12]),
            };
            let report = recovery::run_startup_recovery(&ui, &source).await;

            assert_eq!(report.messages_scanned, 3);
            assert_eq!(report.buttons_recovered, 2);
            assert_eq!(report.stale_messages, 1);
            assert_eq!(report.errors, 1);

            assert!(ui.lookup_button("btn_a1").is_some());
            assert!(ui.lookup_button("btn_a2").is_some());
            // Deleted message's button is gone from the table and the store.
            assert!(ui.lookup_button("btn_b").is_none());
            assert!(ui.store.load("btn_b", 11).await.unwrap().is_none());
            // The erroring message's record is untouched for the next pass.
            assert!(ui.store.load("btn_c", 12).await.unwrap().is_some());
        }

        #[tokio::test]
        async fn test_component_stripped_message_is_deactivated() {
            let ui = memory_ui().await;
            ui.store.store(&record("btn_s", 20, &toggle_state(1))).await.unwrap();

            let source = ScriptedSource {
                alive: HashSet::new(),
                stripped: HashSet::from([20]),
                failing: HashSet::new(),
            };
            let report = recovery::run_startup_recovery(&ui, &source).await;

            assert_eq!(report.stale_messages, 1);
            assert_eq!(report.buttons_recovered, 0);
            assert!(ui.lookup_button("btn_s").is_none());
            assert!(ui.store.load("btn_s", 20).await.unwrap().is_none());
        }
    }
}
