//! Immutable recipe templates
//!
//! A [`Recipe`] is the authored form of a dish: an ordered list of
//! [`InstructionStep`]s whose `detailed_description` is a placeholder-bearing
//! template resolved at render time against the step's ingredient and
//! equipment bindings. Recipes are never mutated after creation; a cooking
//! session works on its own copy (see [`crate::materialize`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "-{}"), Uuid::new_v4()))
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

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for a recipe template
    RecipeId,
    "recipe"
);
string_id!(
    /// Unique identifier for a step (template or session copy)
    StepId,
    "step"
);
string_id!(
    /// Identity of an ingredient in the external master catalog
    IngredientId,
    "ingredient"
);
string_id!(
    /// Identity of a piece of equipment in the external master catalog
    EquipmentId,
    "equipment"
);

/// An immutable recipe template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub title: String,
    pub description: Option<String>,
    /// Serving count the template amounts are written for
    pub base_pax: u32,
    pub prep_time_minutes: u32,
    pub cook_time_minutes: u32,
    /// Ordered steps; `order_index` is contiguous and 0-based
    pub steps: Vec<InstructionStep>,
}

/// One authored instruction step within a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionStep {
    pub id: StepId,
    pub order_index: u32,
    pub short_text: String,
    /// Template text containing `{i:key}` / `{i:key:qty}` / `{e:key}` tokens
    pub detailed_description: String,
    pub ingredients: Vec<StepIngredient>,
    pub equipment: Vec<StepEquipment>,
}

/// Binding of an ingredient to a placeholder key within one step
///
/// `placeholder_key` must be unique within the step's ingredient set. The
/// display `name` travels with the binding; resolving ids against the master
/// catalog is an external collaborator's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepIngredient {
    pub placeholder_key: String,
    pub ingredient_id: IngredientId,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Binding of a piece of equipment to a placeholder key within one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEquipment {
    pub placeholder_key: String,
    pub equipment_id: EquipmentId,
    pub name: String,
}
