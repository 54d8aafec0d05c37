use std::sync::atomic::AtomicBool;

use crate::services::llm::LlmService;
use crate::services::quiz_generator::QuizGenerator;
use crate::services::quiz_session::QuizSessions;
use crate::ui::UiContext;
use crate::ui::config::UiConfig;
use crate::ui::store::ButtonStore;
use crate::utils::database::Database;

/// Shared bot state, constructed once before the gateway connects.
pub struct Handler {
    pub database: Database,
    pub quiz_generator: QuizGenerator,
    pub sessions: QuizSessions,
    pub ui: UiContext,
    /// Guards the once-per-process startup work against gateway reconnects
    /// re-firing the ready event.
    pub(crate) startup_done: AtomicBool,
}

impl Handler {
    pub async fn new() -> anyhow::Result<Self> {
        let database = Database::new().await?;

        let store = ButtonStore::new(database.pool().clone());
        store.setup_tables().await?;
        let ui = UiContext::new(UiConfig::from_env(), store);

        let llm = LlmService::from_env()?;
        if !llm.is_available() {
            tracing::warn!("[INIT] No LLM provider configured; quiz generation will be disabled");
        }

        Ok(Handler {
            database,
            quiz_generator: QuizGenerator::new(llm),
            sessions: QuizSessions::new(),
            ui,
            startup_done: AtomicBool::new(false),
        })
    }
}
