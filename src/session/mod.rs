//! Runtime cooking-session state
//!
//! A [`CookingSession`] is the mutable instantiation of one or more recipe
//! templates. It exclusively owns its [`SessionStep`] collection; steps are
//! only ever inserted or rewritten through the operation applier, never
//! deleted; history is preserved by skipping.

pub mod modification;
pub mod step;

pub use modification::{ChangeRecord, ModificationId, RequestDetails, SessionModification};
pub use step::{SessionStep, SessionStepEquipment, SessionStepIngredient};

use crate::recipe::RecipeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a cooking session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new session ID
    pub fn new() -> Self {
        Self(format!("session-{}", Uuid::new_v4()))
    }

    /// Create from an existing string
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a cooking session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Setup,
    InProgress,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Check if this is a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }
}

/// A live cooking session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookingSession {
    pub id: SessionId,
    pub source_recipe_ids: Vec<RecipeId>,
    pub status: SessionStatus,
    /// Serving-size scale factor applied to ingredient amounts at materialization
    pub pax_multiplier: f64,
    /// Order index of the first not-yet-completed step
    pub current_step_index: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Session steps, kept sorted by `order_index` (contiguous, 0-based)
    pub steps: Vec<SessionStep>,
}

impl CookingSession {
    /// Look up a step by ID
    pub fn step(&self, id: &crate::recipe::StepId) -> Option<&SessionStep> {
        self.steps.iter().find(|s| &s.id == id)
    }

    /// Look up a step by ID, mutably
    pub fn step_mut(&mut self, id: &crate::recipe::StepId) -> Option<&mut SessionStep> {
        self.steps.iter_mut().find(|s| &s.id == id)
    }

    /// Move Setup -> InProgress and stamp the start time
    pub fn begin(&mut self) {
        if self.status == SessionStatus::Setup {
            self.status = SessionStatus::InProgress;
            self.started_at = Some(Utc::now());
        }
    }

    /// Mark the current step completed and advance the cursor past any
    /// completed or skipped steps. Returns the new current step index, or
    /// `None` when the session just ran out of steps (status -> Completed).
    /// Inert on a session that already reached a terminal status.
    pub fn advance(&mut self) -> Option<u32> {
        if self.status.is_terminal() {
            return None;
        }
        if let Some(step) = self
            .steps
            .iter_mut()
            .find(|s| s.order_index == self.current_step_index)
        {
            step.is_completed = true;
        }
        let next = self
            .steps
            .iter()
            .filter(|s| s.order_index > self.current_step_index)
            .filter(|s| !s.is_completed && !s.is_skipped)
            .map(|s| s.order_index)
            .min();
        match next {
            Some(index) => {
                self.current_step_index = index;
                Some(index)
            }
            None => {
                self.current_step_index = self.steps.len() as u32;
                self.status = SessionStatus::Completed;
                None
            }
        }
    }

    /// Abandon the session; a completed session stays completed
    pub fn abandon(&mut self) {
        if !self.status.is_terminal() {
            self.status = SessionStatus::Abandoned;
        }
    }
}
