//! Advisor operation batches
//!
//! The upstream advisor proposes edits as a JSON batch whose operations all
//! carry the same field set, with unused fields present and null, the shape
//! a structured-output language model emits. [`RawOperation`] is that wire
//! record; [`Operation`] is the closed form the applier works with, produced
//! by per-kind required-field checks.

use crate::error::{Error, Result};
use crate::recipe::{EquipmentId, IngredientId, StepId};
use serde::{Deserialize, Serialize};

/// Operation kinds the engine accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Insert,
    Update,
    Skip,
    AdjustQuantity,
    Substitute,
}

impl OperationKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Insert => "insert",
            OperationKind::Update => "update",
            OperationKind::Skip => "skip",
            OperationKind::AdjustQuantity => "adjust_quantity",
            OperationKind::Substitute => "substitute",
        }
    }
}

/// Ingredient binding shipped with an `insert` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertIngredient {
    pub placeholder_key: String,
    pub ingredient_id: IngredientId,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Equipment binding shipped with an `insert` operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertEquipment {
    pub placeholder_key: String,
    pub equipment_id: EquipmentId,
    pub name: String,
}

/// One operation as it appears on the wire
///
/// Every field is present for every kind; fields a kind does not use are
/// null. `into_operation` enforces the per-kind required set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOperation {
    pub operation: OperationKind,
    pub step_index: Option<u32>,
    pub step_id: Option<String>,
    pub short_text: Option<String>,
    pub detailed_description: Option<String>,
    pub placeholder_key: Option<String>,
    pub new_amount: Option<f64>,
    pub new_ingredient_id: Option<String>,
    #[serde(default)]
    pub new_ingredient_name: Option<String>,
    pub substitution_note: Option<String>,
    pub agent_notes: Option<String>,
    #[serde(default)]
    pub ingredients: Option<Vec<InsertIngredient>>,
    #[serde(default)]
    pub equipment: Option<Vec<InsertEquipment>>,
}

impl RawOperation {
    /// Convert to the closed operation form, checking required fields
    pub fn into_operation(self) -> Result<Operation> {
        let kind = self.operation;
        let missing = |field: &str| {
            Error::InvalidOperation(format!("{} requires {field}", kind.as_str()))
        };
        match kind {
            OperationKind::Insert => Ok(Operation::Insert {
                step_index: self.step_index.ok_or_else(|| missing("step_index"))?,
                short_text: self.short_text.ok_or_else(|| missing("short_text"))?,
                detailed_description: self
                    .detailed_description
                    .ok_or_else(|| missing("detailed_description"))?,
                ingredients: self.ingredients.unwrap_or_default(),
                equipment: self.equipment.unwrap_or_default(),
                agent_notes: self.agent_notes,
            }),
            OperationKind::Update => {
                if self.short_text.is_none() && self.detailed_description.is_none() {
                    return Err(Error::InvalidOperation(
                        "update requires short_text or detailed_description".to_string(),
                    ));
                }
                Ok(Operation::Update {
                    step_id: step_id(self.step_id, kind)?,
                    short_text: self.short_text,
                    detailed_description: self.detailed_description,
                    agent_notes: self.agent_notes,
                })
            }
            OperationKind::Skip => Ok(Operation::Skip {
                step_id: step_id(self.step_id, kind)?,
                agent_notes: self.agent_notes,
            }),
            OperationKind::AdjustQuantity => Ok(Operation::AdjustQuantity {
                step_id: step_id(self.step_id, kind)?,
                placeholder_key: self
                    .placeholder_key
                    .ok_or_else(|| missing("placeholder_key"))?,
                new_amount: self.new_amount.ok_or_else(|| missing("new_amount"))?,
                agent_notes: self.agent_notes,
            }),
            OperationKind::Substitute => Ok(Operation::Substitute {
                step_id: step_id(self.step_id, kind)?,
                placeholder_key: self
                    .placeholder_key
                    .ok_or_else(|| missing("placeholder_key"))?,
                new_ingredient_id: IngredientId::from_string(
                    self.new_ingredient_id
                        .ok_or_else(|| missing("new_ingredient_id"))?,
                ),
                new_ingredient_name: self.new_ingredient_name,
                substitution_note: self
                    .substitution_note
                    .ok_or_else(|| missing("substitution_note"))?,
                agent_notes: self.agent_notes,
            }),
        }
    }
}

fn step_id(id: Option<String>, kind: OperationKind) -> Result<StepId> {
    id.map(StepId::from_string)
        .ok_or_else(|| Error::InvalidOperation(format!("{} requires step_id", kind.as_str())))
}

/// A validated, closed-form operation
#[derive(Debug, Clone)]
pub enum Operation {
    Insert {
        step_index: u32,
        short_text: String,
        detailed_description: String,
        ingredients: Vec<InsertIngredient>,
        equipment: Vec<InsertEquipment>,
        agent_notes: Option<String>,
    },
    Update {
        step_id: StepId,
        short_text: Option<String>,
        detailed_description: Option<String>,
        agent_notes: Option<String>,
    },
    Skip {
        step_id: StepId,
        agent_notes: Option<String>,
    },
    AdjustQuantity {
        step_id: StepId,
        placeholder_key: String,
        new_amount: f64,
        agent_notes: Option<String>,
    },
    Substitute {
        step_id: StepId,
        placeholder_key: String,
        new_ingredient_id: IngredientId,
        new_ingredient_name: Option<String>,
        substitution_note: String,
        agent_notes: Option<String>,
    },
}

impl Operation {
    /// The operation's wire kind
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Insert { .. } => OperationKind::Insert,
            Operation::Update { .. } => OperationKind::Update,
            Operation::Skip { .. } => OperationKind::Skip,
            Operation::AdjustQuantity { .. } => OperationKind::AdjustQuantity,
            Operation::Substitute { .. } => OperationKind::Substitute,
        }
    }
}

/// The full batch proposed for one user issue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationBatch {
    pub operations: Vec<RawOperation>,
    pub agent_message: String,
    pub time_impact_minutes: f64,
}

/// Outcome of applying a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub applied: bool,
    /// Wire kinds of the operations applied, in order
    pub operations_applied: Vec<OperationKind>,
    pub error: Option<String>,
    pub modification_log_id: Option<crate::session::ModificationId>,
}

impl BatchResult {
    /// Wire form of a rejected batch
    ///
    /// [`crate::engine::SessionEngine::apply_batch`] surfaces rejections as
    /// [`Err`] so callers can match on the failure kind; the orchestration
    /// layer converts that error into this shape when reporting back to the
    /// advisor.
    pub fn rejected(error: &Error) -> Self {
        Self {
            applied: false,
            operations_applied: Vec::new(),
            error: Some(error.to_string()),
            modification_log_id: None,
        }
    }
}
