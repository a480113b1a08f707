//! Session materializer
//!
//! Clones a recipe template into a fresh [`CookingSession`], scaling every
//! ingredient amount by the pax multiplier. The scaled value lands in
//! `adjusted_amount` so the renderer uses it from the outset, while
//! `original_amount` keeps the template's unscaled value for audit.

use crate::error::{Error, Result};
use crate::recipe::{Recipe, StepId};
use crate::session::{
    CookingSession, SessionId, SessionStatus, SessionStep, SessionStepEquipment,
    SessionStepIngredient,
};
use chrono::Utc;
use tracing::debug;

/// Instantiate a recipe into a new cooking session
pub fn materialize(recipe: &Recipe, pax_multiplier: f64) -> Result<CookingSession> {
    if recipe.steps.is_empty() {
        return Err(Error::EmptyRecipe);
    }
    if !pax_multiplier.is_finite() || pax_multiplier <= 0.0 {
        return Err(Error::InvalidPaxMultiplier(pax_multiplier));
    }

    let steps = recipe
        .steps
        .iter()
        .map(|template| SessionStep {
            id: StepId::new(),
            source_step_id: Some(template.id.clone()),
            order_index: template.order_index,
            short_text: template.short_text.clone(),
            detailed_description: template.detailed_description.clone(),
            is_completed: false,
            is_skipped: false,
            agent_notes: None,
            ingredients: template
                .ingredients
                .iter()
                .map(|binding| SessionStepIngredient {
                    placeholder_key: binding.placeholder_key.clone(),
                    ingredient_id: binding.ingredient_id.clone(),
                    name: binding.name.clone(),
                    original_amount: binding.amount,
                    adjusted_amount: Some(binding.amount * pax_multiplier),
                    unit: binding.unit.clone(),
                    is_substitution: false,
                    substitution_note: None,
                })
                .collect(),
            equipment: template
                .equipment
                .iter()
                .map(|binding| SessionStepEquipment {
                    placeholder_key: binding.placeholder_key.clone(),
                    equipment_id: binding.equipment_id.clone(),
                    name: binding.name.clone(),
                    is_substitution: false,
                    substitution_note: None,
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    let session = CookingSession {
        id: SessionId::new(),
        source_recipe_ids: vec![recipe.id.clone()],
        status: SessionStatus::Setup,
        pax_multiplier,
        current_step_index: 0,
        started_at: None,
        created_at: Utc::now(),
        steps,
    };

    debug!(
        session_id = %session.id,
        recipe = %recipe.title,
        pax_multiplier,
        steps = session.steps.len(),
        "materialized session"
    );
    Ok(session)
}
