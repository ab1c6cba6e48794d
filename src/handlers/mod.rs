// handlers/mod.rs - 3-Tier Handler Architecture
//
// Public (no auth) → Protected (session + per-route requirement) → Elevated (Super-admin only)

pub mod elevated;
pub mod protected;
pub mod public;
pub mod validation;

use crate::auth::ResolvedIdentity;
use crate::authz::{decide, Requirement};
use crate::error::ApiError;

/// In-handler escalation check for operations whose requirement depends on
/// the record being touched.
pub(crate) fn require_super_admin(actor: &ResolvedIdentity) -> Result<(), ApiError> {
    decide(actor, &Requirement::SuperAdminOnly)
        .into_result()
        .map_err(|denial| {
            tracing::info!(user_id = %actor.id, "escalation refused");
            ApiError::forbidden(denial.to_string())
        })
}
