//! Template renderer for instruction text
//!
//! Resolves placeholder tokens in a step's `detailed_description` against its
//! ingredient and equipment bindings. Three token forms:
//!
//! - `{i:key}`: ingredient name only ("onion")
//! - `{i:key:qty}`: amount + unit + name ("2 tbsp olive oil")
//! - `{e:key}`: equipment name ("dutch oven")
//!
//! Rendering is pure and idempotent: the same template and bindings always
//! produce the same text. A token whose key has no binding fails the whole
//! call; there is no partial output.

use crate::error::{Error, Result};
use crate::session::{SessionStep, SessionStepEquipment, SessionStepIngredient};
use regex::Regex;

/// Renderer for placeholder-bearing instruction templates
pub struct TemplateRenderer {
    /// Matches {i:key}, {i:key:qty}, {e:key}; keys are lowercase with underscores
    token_regex: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new renderer
    pub fn new() -> Self {
        // {i:key} and {i:key:qty} for ingredients, {e:key} for equipment;
        // equipment takes no quantity
        let token_regex =
            Regex::new(r"\{i:([a-z0-9_]+)(:qty)?\}|\{e:([a-z0-9_]+)\}").expect("invalid token regex");
        Self { token_regex }
    }

    /// Render a template against a step's own bindings
    pub fn render_step(&self, step: &SessionStep) -> Result<String> {
        self.render(
            &step.detailed_description,
            &step.ingredients,
            &step.equipment,
        )
    }

    /// Render a template against explicit bindings
    pub fn render(
        &self,
        template: &str,
        ingredients: &[SessionStepIngredient],
        equipment: &[SessionStepEquipment],
    ) -> Result<String> {
        let mut result = String::with_capacity(template.len());
        let mut last_end = 0;

        for cap in self.token_regex.captures_iter(template) {
            let full_match = cap.get(0).expect("capture group 0 always present");
            result.push_str(&template[last_end..full_match.start()]);

            if let Some(key) = cap.get(1) {
                let key = key.as_str();
                let with_qty = cap.get(2).is_some();
                let binding = ingredients
                    .iter()
                    .find(|b| b.placeholder_key == key)
                    .ok_or_else(|| Error::UnresolvedPlaceholder(key.to_string()))?;
                if with_qty {
                    result.push_str(&format_amount(binding.effective_amount()));
                    result.push(' ');
                    result.push_str(&binding.unit);
                    result.push(' ');
                }
                result.push_str(&binding.name);
            } else {
                let key = cap.get(3).expect("equipment key group").as_str();
                let binding = equipment
                    .iter()
                    .find(|b| b.placeholder_key == key)
                    .ok_or_else(|| Error::UnresolvedPlaceholder(key.to_string()))?;
                result.push_str(&binding.name);
            }

            last_end = full_match.end();
        }

        result.push_str(&template[last_end..]);
        Ok(result)
    }
}

/// Format an amount with the minimal decimal representation
///
/// Integral values render without a decimal point ("6"), fractional values
/// keep only the digits they need ("1.5", never "1.50"). Amounts are rounded
/// to four decimal places first, so scaling products do not leak float
/// artifacts into spoken text.
pub fn format_amount(amount: f64) -> String {
    let rounded = (amount * 10_000.0).round() / 10_000.0;
    format!("{rounded}")
}
