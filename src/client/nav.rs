use serde::Serialize;

use crate::auth::ResolvedIdentity;
use crate::authz::decide;

use super::identity::{IdentityContext, IdentitySource, IdentityState};
use super::views::VIEWS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub path: &'static str,
    pub label: &'static str,
}

/// Navigation entries the identity may open, by the same rule the guard uses.
pub fn navigation_links(identity: &ResolvedIdentity) -> Vec<NavLink> {
    VIEWS
        .iter()
        .filter(|view| view.in_nav)
        .filter(|view| decide(identity, &view.requirement).is_allow())
        .map(|view| NavLink {
            path: view.path,
            label: view.label,
        })
        .collect()
}

/// Re-fetch the identity, then list its links. Nothing while anonymous.
pub async fn refreshed_navigation(identity: &IdentityContext, source: &dyn IdentitySource) -> Vec<NavLink> {
    identity.refresh(source).await;
    match identity.settled().await {
        IdentityState::Resolved(current) => navigation_links(&current),
        IdentityState::Anonymous | IdentityState::Resolving => Vec::new(),
    }
}
