//! Bracket business logic: construction, upper/lower decisions, grand final, placements, field.

mod construction;
mod field;
mod grand_final;
mod lower;
mod placements;
mod upper;

pub use construction::build_bracket;
pub use field::{rank_releases, select_field, FieldOptions, DEFAULT_FIELD_SIZE};
pub use grand_final::{convene_grand_final, decide_grand_final};
pub use lower::decide_lower_match;
pub use placements::derive_placements;
pub use upper::decide_upper_match;

use crate::models::{Access, BracketError};

/// Reject callers without the operator capability. Logged, never fatal.
fn require_operator(access: Access, action: &str) -> Result<(), BracketError> {
    if access.is_operator() {
        Ok(())
    } else {
        log::warn!("Rejected {}: caller is not a bracket operator", action);
        Err(BracketError::Unauthorized)
    }
}
