//! Session engine
//!
//! Front door for the step-ordering and template-resolution engine. Sessions
//! are independent units of mutation: batches for different sessions run in
//! parallel, while batch application within one session is serialized behind
//! a per-session mutex. The lock wait is bounded: a caller that cannot enter
//! the critical section in time gets [`Error::SessionLocked`] and may retry.

use crate::apply::{applied_kinds, OperationApplier};
use crate::error::{Error, Result};
use crate::log::ModificationLog;
use crate::materialize::materialize;
use crate::ops::{BatchResult, OperationBatch};
use crate::recipe::Recipe;
use crate::render::TemplateRenderer;
use crate::session::{CookingSession, SessionId, SessionModification};
use crate::storage::{PersistedSession, SessionStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on waiting for a session's exclusive section
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
        }
    }
}

/// A session together with its append-only modification log
struct SessionSlot {
    session: CookingSession,
    log: ModificationLog,
}

/// In-memory session engine with per-session write serialization
pub struct SessionEngine {
    config: EngineConfig,
    applier: OperationApplier,
    renderer: TemplateRenderer,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionSlot>>>>,
    store: Option<Arc<dyn SessionStore>>,
}

impl SessionEngine {
    /// Create an engine with explicit collaborators
    pub fn new(config: EngineConfig, store: Option<Arc<dyn SessionStore>>) -> Self {
        Self {
            config,
            applier: OperationApplier::default(),
            renderer: TemplateRenderer::new(),
            sessions: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Materialize a recipe into a new session and register it
    pub async fn create_session(&self, recipe: &Recipe, pax_multiplier: f64) -> Result<SessionId> {
        let session = materialize(recipe, pax_multiplier)?;
        let id = session.id.clone();
        let slot = SessionSlot {
            session,
            log: ModificationLog::new(),
        };
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(slot)));
        info!(session_id = %id, recipe = %recipe.title, "created session");
        Ok(id)
    }

    /// Move a session from Setup to InProgress
    pub async fn start_session(&self, id: &SessionId) -> Result<()> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        guard.session.begin();
        Ok(())
    }

    /// Validate and apply an advisor batch against a session
    ///
    /// Acquires the session's exclusive section (bounded wait), applies the
    /// batch all-or-nothing, appends one modification-log entry, and persists
    /// the session + log as a single unit through the storage collaborator.
    /// A rejected batch leaves the session untouched and surfaces as
    /// [`Error::ValidationFailed`].
    pub async fn apply_batch(&self, id: &SessionId, batch: &OperationBatch) -> Result<BatchResult> {
        let slot = self.slot(id).await?;
        let mut guard = timeout(self.config.lock_timeout, slot.lock())
            .await
            .map_err(|_| Error::SessionLocked(id.clone()))?;

        let SessionSlot { session, log } = &mut *guard;
        let modification = self.applier.apply_batch(session, batch)?;
        let modification_id = log.append(modification);
        debug!(
            session_id = %id,
            modification_id = %modification_id,
            "batch committed"
        );

        if let Some(store) = &self.store {
            let persisted = PersistedSession {
                session: guard.session.clone(),
                modifications: guard.log.clone(),
            };
            store.save(&persisted).await?;
        }

        Ok(BatchResult {
            applied: true,
            operations_applied: applied_kinds(batch),
            error: None,
            modification_log_id: Some(modification_id),
        })
    }

    /// Mark the current step completed and advance the cursor
    ///
    /// Returns the new current step index, or `None` when the session just
    /// completed.
    pub async fn advance(&self, id: &SessionId) -> Result<Option<u32>> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        Ok(guard.session.advance())
    }

    /// Abandon a session
    pub async fn abandon(&self, id: &SessionId) -> Result<()> {
        let slot = self.slot(id).await?;
        let mut guard = slot.lock().await;
        guard.session.abandon();
        Ok(())
    }

    /// Clone of the session's current state
    pub async fn snapshot(&self, id: &SessionId) -> Result<CookingSession> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        Ok(guard.session.clone())
    }

    /// Clone of the session's modification log, oldest first
    pub async fn modifications(&self, id: &SessionId) -> Result<Vec<SessionModification>> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        Ok(guard.log.entries().to_vec())
    }

    /// Render the instruction text of the step at the given order index
    pub async fn render_step_at(&self, id: &SessionId, order_index: u32) -> Result<String> {
        let slot = self.slot(id).await?;
        let guard = slot.lock().await;
        let step = guard
            .session
            .steps
            .iter()
            .find(|s| s.order_index == order_index)
            .ok_or_else(|| Error::InvalidPosition {
                position: order_index,
                current_step_index: guard.session.current_step_index,
            })?;
        self.renderer.render_step(step)
    }

    async fn slot(&self, id: &SessionId) -> Result<Arc<Mutex<SessionSlot>>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.clone()))
    }

    /// Grab a session's lock directly, bypassing the engine API
    #[cfg(test)]
    async fn lock_for_test(
        &self,
        id: &SessionId,
    ) -> tokio::sync::OwnedMutexGuard<SessionSlot> {
        let slot = self.slot(id).await.unwrap();
        slot.lock_owned().await
    }
}
