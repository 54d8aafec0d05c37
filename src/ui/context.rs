use std::sync::RwLock;

use dashmap::DashMap;

use crate::ui::config::UiConfig;
use crate::ui::handler::{HandlerId, HandlerRegistry};
use crate::ui::recovery::RecoveryPhase;
use crate::ui::state::ButtonState;
use crate::ui::store::ButtonStore;

/// A database- or memory-mode button as held in the in-memory dispatch table.
#[derive(Clone, Debug)]
pub struct RecoveredButton {
    pub state: ButtonState,
    pub handler: HandlerId,
}

/// The single owned home of all persistent-UI runtime state.
///
/// The registry is immutable after construction; the recovery table is
/// insert-only (startup recovery plus every new database/memory-mode button),
/// so no locking beyond the map's own is needed.
pub struct UiContext {
    pub config: UiConfig,
    pub registry: HandlerRegistry,
    pub store: ButtonStore,
    recovery_table: DashMap<String, RecoveredButton>,
    phase: RwLock<RecoveryPhase>,
}

impl UiContext {
    pub fn new(config: UiConfig, store: ButtonStore) -> Self {
        UiContext {
            config,
            registry: HandlerRegistry::builtin(),
            store,
            recovery_table: DashMap::new(),
            phase: RwLock::new(RecoveryPhase::Cold),
        }
    }

    /// Make a database/memory-mode button dispatchable immediately, before
    /// any durable write has completed.
    pub fn register_button(&self, custom_id: &str, state: ButtonState, handler: HandlerId) {
        self.recovery_table
            .insert(custom_id.to_string(), RecoveredButton { state, handler });
    }

    pub fn lookup_button(&self, custom_id: &str) -> Option<RecoveredButton> {
        self.recovery_table.get(custom_id).map(|e| e.value().clone())
    }

    pub fn tracked_buttons(&self) -> usize {
        self.recovery_table.len()
    }

    pub fn phase(&self) -> RecoveryPhase {
        *self.phase.read().expect("recovery phase lock poisoned")
    }

    pub fn set_phase(&self, phase: RecoveryPhase) {
        *self.phase.write().expect("recovery phase lock poisoned") = phase;
    }
}
