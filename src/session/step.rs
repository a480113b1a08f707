//! Session steps and their placeholder bindings

use crate::recipe::{EquipmentId, IngredientId, StepId};
use serde::{Deserialize, Serialize};

/// The mutable, per-session copy of an instruction step
///
/// Created by the materializer or by an `insert` operation (in which case
/// `source_step_id` is `None`). Only pending steps (neither completed nor
/// skipped) may be mutated by advisor operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStep {
    pub id: StepId,
    /// Template step this was copied from; `None` for agent-created steps
    pub source_step_id: Option<StepId>,
    pub order_index: u32,
    pub short_text: String,
    /// Template text; placeholders resolve against this step's bindings
    pub detailed_description: String,
    pub is_completed: bool,
    pub is_skipped: bool,
    pub agent_notes: Option<String>,
    pub ingredients: Vec<SessionStepIngredient>,
    pub equipment: Vec<SessionStepEquipment>,
}

impl SessionStep {
    /// Check whether advisor operations may still mutate this step
    pub fn is_pending(&self) -> bool {
        !self.is_completed && !self.is_skipped
    }

    /// Ingredient binding for a placeholder key
    pub fn ingredient(&self, placeholder_key: &str) -> Option<&SessionStepIngredient> {
        self.ingredients
            .iter()
            .find(|b| b.placeholder_key == placeholder_key)
    }

    /// Ingredient binding for a placeholder key, mutably
    pub fn ingredient_mut(&mut self, placeholder_key: &str) -> Option<&mut SessionStepIngredient> {
        self.ingredients
            .iter_mut()
            .find(|b| b.placeholder_key == placeholder_key)
    }

    /// Equipment binding for a placeholder key
    pub fn equipment(&self, placeholder_key: &str) -> Option<&SessionStepEquipment> {
        self.equipment
            .iter()
            .find(|b| b.placeholder_key == placeholder_key)
    }
}

/// Runtime binding of an ingredient to a placeholder key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStepIngredient {
    pub placeholder_key: String,
    pub ingredient_id: IngredientId,
    pub name: String,
    /// Unscaled template amount, kept for audit
    pub original_amount: f64,
    /// Supersedes `original_amount` for rendering and downstream scaling
    pub adjusted_amount: Option<f64>,
    pub unit: String,
    pub is_substitution: bool,
    pub substitution_note: Option<String>,
}

impl SessionStepIngredient {
    /// The amount the renderer should display
    pub fn effective_amount(&self) -> f64 {
        self.adjusted_amount.unwrap_or(self.original_amount)
    }
}

/// Runtime binding of equipment to a placeholder key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStepEquipment {
    pub placeholder_key: String,
    pub equipment_id: EquipmentId,
    pub name: String,
    pub is_substitution: bool,
    pub substitution_note: Option<String>,
}
