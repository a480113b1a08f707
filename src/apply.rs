//! Operation applier
//!
//! Validates and applies an advisor batch against a session. The batch is
//! all-or-nothing: every operation is applied in order to a scratch clone of
//! the session, and only when the whole batch succeeds does the clone replace
//! the real state. A failure at any operation leaves the session untouched
//! and reports the index and reason of the first failure.

use crate::error::{Error, Result};
use crate::ops::{Operation, OperationBatch, OperationKind};
use crate::recipe::{IngredientId, StepId};
use crate::render::TemplateRenderer;
use crate::sequence;
use crate::session::{
    ChangeRecord, CookingSession, ModificationId, RequestDetails, SessionModification, SessionStep,
    SessionStepEquipment, SessionStepIngredient,
};
use chrono::Utc;
use tracing::{debug, warn};

/// Applies operation batches to cooking sessions
pub struct OperationApplier {
    renderer: TemplateRenderer,
}

impl Default for OperationApplier {
    fn default() -> Self {
        Self::new(TemplateRenderer::new())
    }
}

impl OperationApplier {
    /// Create an applier with the given renderer
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// Validate and apply a batch
    ///
    /// On success the session holds the new state and the returned
    /// [`SessionModification`] summarizes the whole batch. On failure the
    /// session is unchanged and the error carries the first failing
    /// operation's index and reason.
    pub fn apply_batch(
        &self,
        session: &mut CookingSession,
        batch: &OperationBatch,
    ) -> Result<SessionModification> {
        if session.status.is_terminal() {
            return Err(Error::SessionNotActive(session.id.clone()));
        }
        if batch.operations.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let operations = batch
            .operations
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                raw.clone()
                    .into_operation()
                    .map_err(|e| Error::validation(index, e))
            })
            .collect::<Result<Vec<_>>>()?;

        // Later operations may target steps created earlier in the batch, so
        // validation is application against a scratch clone.
        let mut scratch = session.clone();
        let mut changes = Vec::with_capacity(operations.len());
        for (index, operation) in operations.iter().enumerate() {
            match self.apply_one(&mut scratch, operation) {
                Ok(change) => changes.push(change),
                Err(e) => {
                    warn!(
                        session_id = %session.id,
                        op_index = index,
                        error = %e,
                        "rejecting operation batch"
                    );
                    return Err(Error::validation(index, e));
                }
            }
        }

        let modification = summarize(&scratch, batch, &operations, changes);
        debug!(
            session_id = %session.id,
            operations = operations.len(),
            modification_id = %modification.id,
            "applied operation batch"
        );
        *session = scratch;
        Ok(modification)
    }

    fn apply_one(&self, session: &mut CookingSession, operation: &Operation) -> Result<ChangeRecord> {
        match operation {
            Operation::Insert {
                step_index,
                short_text,
                detailed_description,
                ingredients,
                equipment,
                agent_notes,
            } => {
                if let Some(key) =
                    duplicate_key(ingredients.iter().map(|b| b.placeholder_key.as_str()))
                        .or_else(|| duplicate_key(equipment.iter().map(|b| b.placeholder_key.as_str())))
                {
                    return Err(Error::DuplicatePlaceholderKey(key.to_string()));
                }
                let step = SessionStep {
                    id: StepId::new(),
                    source_step_id: None,
                    order_index: *step_index,
                    short_text: short_text.clone(),
                    detailed_description: detailed_description.clone(),
                    is_completed: false,
                    is_skipped: false,
                    agent_notes: agent_notes.clone(),
                    ingredients: ingredients
                        .iter()
                        .map(|b| SessionStepIngredient {
                            placeholder_key: b.placeholder_key.clone(),
                            ingredient_id: b.ingredient_id.clone(),
                            name: b.name.clone(),
                            original_amount: b.amount,
                            adjusted_amount: None,
                            unit: b.unit.clone(),
                            is_substitution: false,
                            substitution_note: None,
                        })
                        .collect(),
                    equipment: equipment
                        .iter()
                        .map(|b| SessionStepEquipment {
                            placeholder_key: b.placeholder_key.clone(),
                            equipment_id: b.equipment_id.clone(),
                            name: b.name.clone(),
                            is_substitution: false,
                            substitution_note: None,
                        })
                        .collect(),
                };
                self.renderer.render_step(&step)?;
                let step_id = step.id.clone();
                let final_position = sequence::insert_at(session, *step_index, step)?;
                Ok(ChangeRecord::StepInserted {
                    step_id,
                    final_position,
                    short_text: short_text.clone(),
                })
            }
            Operation::Update {
                step_id,
                short_text,
                detailed_description,
                agent_notes,
            } => {
                let step = mutable_step(session, step_id)?;
                if let Some(text) = short_text {
                    step.short_text = text.clone();
                }
                if let Some(text) = detailed_description {
                    step.detailed_description = text.clone();
                }
                if agent_notes.is_some() {
                    step.agent_notes = agent_notes.clone();
                }
                self.renderer.render_step(step)?;
                Ok(ChangeRecord::StepUpdated {
                    step_id: step_id.clone(),
                    short_text: short_text.clone(),
                    detailed_description: detailed_description.clone(),
                })
            }
            Operation::Skip {
                step_id,
                agent_notes,
            } => {
                let step = mutable_step(session, step_id)?;
                step.is_skipped = true;
                if agent_notes.is_some() {
                    step.agent_notes = agent_notes.clone();
                }
                Ok(ChangeRecord::StepSkipped {
                    step_id: step_id.clone(),
                })
            }
            Operation::AdjustQuantity {
                step_id,
                placeholder_key,
                new_amount,
                agent_notes,
            } => {
                let step = mutable_step(session, step_id)?;
                let binding = step.ingredient_mut(placeholder_key).ok_or_else(|| {
                    Error::BindingNotFound {
                        step_id: step_id.clone(),
                        placeholder_key: placeholder_key.clone(),
                    }
                })?;
                let previous_amount = binding.effective_amount();
                binding.adjusted_amount = Some(*new_amount);
                if agent_notes.is_some() {
                    step.agent_notes = agent_notes.clone();
                }
                self.renderer.render_step(step)?;
                Ok(ChangeRecord::QuantityAdjusted {
                    step_id: step_id.clone(),
                    placeholder_key: placeholder_key.clone(),
                    previous_amount,
                    new_amount: *new_amount,
                })
            }
            Operation::Substitute {
                step_id,
                placeholder_key,
                new_ingredient_id,
                new_ingredient_name,
                substitution_note,
                agent_notes,
            } => {
                let step = mutable_step(session, step_id)?;
                let binding = step.ingredient_mut(placeholder_key).ok_or_else(|| {
                    Error::BindingNotFound {
                        step_id: step_id.clone(),
                        placeholder_key: placeholder_key.clone(),
                    }
                })?;
                let previous_ingredient_id = binding.ingredient_id.clone();
                binding.ingredient_id = new_ingredient_id.clone();
                binding.name = new_ingredient_name
                    .clone()
                    .unwrap_or_else(|| display_name(new_ingredient_id));
                binding.is_substitution = true;
                binding.substitution_note = Some(substitution_note.clone());
                if agent_notes.is_some() {
                    step.agent_notes = agent_notes.clone();
                }
                self.renderer.render_step(step)?;
                Ok(ChangeRecord::IngredientSubstituted {
                    step_id: step_id.clone(),
                    placeholder_key: placeholder_key.clone(),
                    previous_ingredient_id,
                    new_ingredient_id: new_ingredient_id.clone(),
                    substitution_note: substitution_note.clone(),
                })
            }
        }
    }
}

/// Resolve a step for mutation: it must exist, sit at or past the session
/// cursor, and still be pending
fn mutable_step<'a>(
    session: &'a mut CookingSession,
    step_id: &StepId,
) -> Result<&'a mut SessionStep> {
    let current_step_index = session.current_step_index;
    let step = session
        .step_mut(step_id)
        .ok_or_else(|| Error::InvalidOperation(format!("no such step: {step_id}")))?;
    if step.order_index < current_step_index || !step.is_pending() {
        return Err(Error::StepNotPending(step_id.clone()));
    }
    Ok(step)
}

/// Display name derived from an ingredient id when the advisor supplies none
fn display_name(id: &IngredientId) -> String {
    id.as_str().replace(['-', '_'], " ")
}

/// First repeated key in a binding set, if any
fn duplicate_key<'a>(keys: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Some(key);
        }
    }
    None
}

fn summarize(
    session: &CookingSession,
    batch: &OperationBatch,
    operations: &[Operation],
    changes: Vec<ChangeRecord>,
) -> SessionModification {
    let modification_type = match operations
        .iter()
        .map(Operation::kind)
        .collect::<Vec<_>>()
        .as_slice()
    {
        [] => "batch".to_string(),
        [first, rest @ ..] if rest.iter().all(|k| k == first) => first.as_str().to_string(),
        _ => "batch".to_string(),
    };

    let mut touched: Vec<&StepId> = changes.iter().map(ChangeRecord::step_id).collect();
    touched.sort();
    touched.dedup();
    let step_index = match touched.as_slice() {
        [only] => session.step(only).map(|s| s.order_index),
        _ => None,
    };

    SessionModification {
        id: ModificationId::new(),
        session_id: session.id.clone(),
        step_index,
        modification_type,
        request_details: RequestDetails {
            agent_message: batch.agent_message.clone(),
            time_impact_minutes: batch.time_impact_minutes,
        },
        changes_made: changes,
        created_at: Utc::now(),
    }
}

/// The wire kinds a batch would apply, in order (for [`crate::ops::BatchResult`])
pub fn applied_kinds(batch: &OperationBatch) -> Vec<OperationKind> {
    batch.operations.iter().map(|op| op.operation).collect()
}
