//! Step sequencer
//!
//! Owns the order-index invariant: after every insert, the session's steps
//! carry exactly the indices `0..N-1` with no gaps or duplicates. The
//! normalization pass renumbers by ascending `(order_index, step_id)`, so the
//! outcome is deterministic no matter what indices insertions arrived with.

use crate::error::{Error, Result};
use crate::session::{CookingSession, SessionStep};
use tracing::debug;

/// Insert a step at `position`, shifting later steps up and renumbering
///
/// `position` must be at or past the session's `current_step_index` (history
/// is immutable) and at most one past the last step (append). Returns the
/// step's final order index after normalization.
pub fn insert_at(
    session: &mut CookingSession,
    position: u32,
    mut new_step: SessionStep,
) -> Result<u32> {
    let len = session.steps.len() as u32;
    if position < session.current_step_index || position > len {
        return Err(Error::InvalidPosition {
            position,
            current_step_index: session.current_step_index,
        });
    }

    for step in &mut session.steps {
        if step.order_index >= position {
            step.order_index += 1;
        }
    }
    new_step.order_index = position;
    let new_id = new_step.id.clone();
    session.steps.push(new_step);

    normalize(session);

    let final_position = session
        .steps
        .iter()
        .find(|s| s.id == new_id)
        .map(|s| s.order_index)
        .expect("inserted step present after normalization");
    debug!(
        session_id = %session.id,
        position,
        final_position,
        "inserted session step"
    );
    Ok(final_position)
}

/// Renumber all steps to `0..N-1` by ascending `(order_index, step_id)`
///
/// The step-id tie-break makes renumbering stable when two steps ever end up
/// on the same index.
fn normalize(session: &mut CookingSession) {
    session
        .steps
        .sort_by(|a, b| (a.order_index, &a.id).cmp(&(b.order_index, &b.id)));
    for (index, step) in session.steps.iter_mut().enumerate() {
        step.order_index = index as u32;
    }
}
