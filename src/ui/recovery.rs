use std::collections::BTreeMap;

use chrono::Utc;
use serenity::all::{ChannelId, MessageId};
use serenity::http::Http;

use crate::ui::context::UiContext;
use crate::ui::store::ButtonRecord;

/// Lifecycle of a startup recovery pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// No recovery attempted yet; database-mode buttons cannot be assumed
    /// to work.
    Cold,
    /// Loading active records from the store.
    Scanning,
    /// Re-fetching owning messages and rebuilding the dispatch table.
    Verifying,
    /// Pass finished; statistics published, sweep scheduled.
    Ready,
}

/// Operational statistics for one recovery pass.
#[derive(Clone, Debug, Default)]
pub struct RecoveryReport {
    pub messages_scanned: usize,
    pub buttons_recovered: usize,
    pub stale_messages: usize,
    pub errors: usize,
    pub swept: u64,
    pub duration_secs: f64,
}

/// What recovery needs to know about a re-fetched message.
pub struct FetchedMessage {
    pub has_components: bool,
}

/// Abstraction over the platform's fetch-message call so recovery can be
/// exercised without a gateway. `Ok(None)` means the message (or its
/// channel) is gone for good; `Err` is a transient failure.
#[serenity::async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch(&self, channel_id: u64, message_id: u64)
    -> anyhow::Result<Option<FetchedMessage>>;
}

/// Production source backed by the Discord HTTP API.
pub struct HttpMessageSource<'a> {
    http: &'a Http,
}

impl<'a> HttpMessageSource<'a> {
    pub fn new(http: &'a Http) -> Self {
        HttpMessageSource { http }
    }
}

#[serenity::async_trait]
impl MessageSource for HttpMessageSource<'_> {
    async fn fetch(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> anyhow::Result<Option<FetchedMessage>> {
        match self
            .http
            .get_message(ChannelId::new(channel_id), MessageId::new(message_id))
            .await
        {
            Ok(message) => Ok(Some(FetchedMessage {
                has_components: !message.components.is_empty(),
            })),
            Err(serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)))
                if response.status_code == serenity::http::StatusCode::NOT_FOUND =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Rebuild the in-memory dispatch table from the durable store after a
/// restart, so buttons created before the last shutdown keep working.
///
/// Each message group is processed independently: a failure recovering one
/// message is counted and never aborts the rest of the pass.
pub async fn run_startup_recovery(ui: &UiContext, source: &dyn MessageSource) -> RecoveryReport {
    let started = Utc::now();
    let mut report = RecoveryReport::default();

    tracing::info!("[RECOVERY] Starting persistent UI recovery");
    ui.set_phase(RecoveryPhase::Scanning);

    let records = match ui.store.load_all_active().await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("[RECOVERY] Failed to load persistent buttons: {}", e);
            report.errors += 1;
            ui.set_phase(RecoveryPhase::Ready);
            return report;
        }
    };

    let by_message = group_by_message(records);
    report.messages_scanned = by_message.len();

    ui.set_phase(RecoveryPhase::Verifying);
    for (message_id, records) in &by_message {
        recover_message(ui, source, *message_id, records, &mut report).await;

        // Pacing between platform fetches to stay clear of rate limits.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    match ui.store.sweep_expired().await {
        Ok(swept) => report.swept = swept,
        Err(e) => {
            tracing::error!("[RECOVERY] Post-recovery sweep failed: {}", e);
            report.errors += 1;
        }
    }

    report.duration_secs = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
    ui.set_phase(RecoveryPhase::Ready);

    tracing::info!(
        "[RECOVERY] Recovered {} buttons across {} messages ({} stale, {} errors) in {:.2}s; \
         dispatch table now tracks {} buttons",
        report.buttons_recovered,
        report.messages_scanned,
        report.stale_messages,
        report.errors,
        report.duration_secs,
        ui.tracked_buttons()
    );

    report
}

fn group_by_message(records: Vec<ButtonRecord>) -> BTreeMap<u64, Vec<ButtonRecord>> {
    let mut by_message: BTreeMap<u64, Vec<ButtonRecord>> = BTreeMap::new();
    for record in records {
        by_message.entry(record.message_id).or_default().push(record);
    }
    by_message
}

async fn recover_message(
    ui: &UiContext,
    source: &dyn MessageSource,
    message_id: u64,
    records: &[ButtonRecord],
    report: &mut RecoveryReport,
) {
    let channel_id = match records.first() {
        Some(record) => record.channel_id,
        None => return,
    };

    let fetched = match source.fetch(channel_id, message_id).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracing::error!("[RECOVERY] Error fetching message {}: {}", message_id, e);
            report.errors += 1;
            return;
        }
    };

    let alive = match fetched {
        Some(message) if message.has_components => true,
        Some(_) => {
            tracing::warn!(
                "[RECOVERY] Message {} has no components, deactivating its buttons",
                message_id
            );
            false
        }
        None => {
            tracing::warn!("[RECOVERY] Message {} not found, deactivating its buttons", message_id);
            false
        }
    };

    if !alive {
        report.stale_messages += 1;
        if let Err(e) = ui.store.deactivate_message(message_id).await {
            tracing::error!(
                "[RECOVERY] Failed to deactivate buttons for message {}: {}",
                message_id,
                e
            );
            report.errors += 1;
        }
        return;
    }

    for record in records {
        match (record.to_state(), record.handler_id()) {
            (Ok(state), Ok(handler)) => {
                ui.register_button(&record.custom_id, state, handler);
                report.buttons_recovered += 1;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!(
                    "[RECOVERY] Failed to rebuild button {}: {}",
                    record.custom_id,
                    e
                );
                report.errors += 1;
            }
        }
    }
}
