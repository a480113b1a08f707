//! Audit records for applied operation batches
//!
//! One [`SessionModification`] is written per successfully applied batch.
//! The audit fields are closed, tagged structures rather than open JSON
//! documents, so the trail stays schema-complete.

use crate::recipe::{IngredientId, StepId};
use crate::session::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a modification-log entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModificationId(String);

impl ModificationId {
    /// Create a new modification ID
    pub fn new() -> Self {
        Self(format!("mod-{}", Uuid::new_v4()))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ModificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The advisor's framing of the user issue that produced a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetails {
    pub agent_message: String,
    pub time_impact_minutes: f64,
}

/// What a single applied operation changed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChangeRecord {
    StepInserted {
        step_id: StepId,
        final_position: u32,
        short_text: String,
    },
    StepUpdated {
        step_id: StepId,
        short_text: Option<String>,
        detailed_description: Option<String>,
    },
    StepSkipped {
        step_id: StepId,
    },
    QuantityAdjusted {
        step_id: StepId,
        placeholder_key: String,
        previous_amount: f64,
        new_amount: f64,
    },
    IngredientSubstituted {
        step_id: StepId,
        placeholder_key: String,
        previous_ingredient_id: IngredientId,
        new_ingredient_id: IngredientId,
        substitution_note: String,
    },
}

impl ChangeRecord {
    /// The step this change touched
    pub fn step_id(&self) -> &StepId {
        match self {
            ChangeRecord::StepInserted { step_id, .. }
            | ChangeRecord::StepUpdated { step_id, .. }
            | ChangeRecord::StepSkipped { step_id }
            | ChangeRecord::QuantityAdjusted { step_id, .. }
            | ChangeRecord::IngredientSubstituted { step_id, .. } => step_id,
        }
    }

    /// Short name matching the wire operation kind
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeRecord::StepInserted { .. } => "insert",
            ChangeRecord::StepUpdated { .. } => "update",
            ChangeRecord::StepSkipped { .. } => "skip",
            ChangeRecord::QuantityAdjusted { .. } => "adjust_quantity",
            ChangeRecord::IngredientSubstituted { .. } => "substitute",
        }
    }
}

/// Append-only record of one applied operation batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionModification {
    pub id: ModificationId,
    pub session_id: SessionId,
    /// Set when the batch touched exactly one step
    pub step_index: Option<u32>,
    /// Operation kind for homogeneous batches, `"batch"` otherwise
    pub modification_type: String,
    pub request_details: RequestDetails,
    pub changes_made: Vec<ChangeRecord>,
    pub created_at: DateTime<Utc>,
}
