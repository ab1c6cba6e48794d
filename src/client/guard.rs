//! Client-side route guard.
//!
//! `evaluate` is the pure decision; `RouteGuard` adds the effects: an
//! immediate redirect to login, or a notice followed by a delayed redirect
//! home. Guarding is for user experience only. The server enforces.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::authz::{decide, Decision};

use super::identity::{IdentityContext, IdentitySource, IdentityState};
use super::views::{View, HOME_PATH, LOGIN_PATH};

/// Default pause between a denial notice and the redirect home.
pub const DENIED_REDIRECT_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GuardState {
    /// Identity not known yet; render a loading indicator, never the view.
    Resolving,
    Unauthenticated {
        redirect_to: &'static str,
        return_to: String,
    },
    AuthorizedSuperAdmin,
    AuthorizedByPermission,
    Denied {
        reason: String,
        redirect_to: &'static str,
    },
}

impl GuardState {
    pub fn is_authorized(&self) -> bool {
        matches!(self, GuardState::AuthorizedSuperAdmin | GuardState::AuthorizedByPermission)
    }
}

/// Decide what the guard shows for `view` given the current identity.
pub fn evaluate(view: &View, identity: &IdentityState) -> GuardState {
    match identity {
        IdentityState::Resolving => GuardState::Resolving,
        IdentityState::Anonymous => GuardState::Unauthenticated {
            redirect_to: LOGIN_PATH,
            return_to: view.path.to_string(),
        },
        IdentityState::Resolved(identity) if identity.is_super_admin() => GuardState::AuthorizedSuperAdmin,
        IdentityState::Resolved(identity) => match decide(identity, &view.requirement) {
            Decision::Allow => GuardState::AuthorizedByPermission,
            Decision::Deny(denial) => GuardState::Denied {
                reason: denial.to_string(),
                redirect_to: HOME_PATH,
            },
        },
    }
}

/// Side effects the guard asks its host to perform.
pub trait Navigator: Send + Sync + 'static {
    fn notify(&self, message: &str);
    fn redirect(&self, to: &str, return_to: Option<&str>);
}

/// One mounted guard around one view.
///
/// Dropping the guard cancels a pending denied redirect.
pub struct RouteGuard<N: Navigator> {
    view: &'static View,
    navigator: Arc<N>,
    redirect_delay: Duration,
    state: GuardState,
    pending_redirect: Option<JoinHandle<()>>,
}

impl<N: Navigator> RouteGuard<N> {
    pub fn mount(view: &'static View, navigator: Arc<N>, redirect_delay: Duration) -> Self {
        Self {
            view,
            navigator,
            redirect_delay,
            state: GuardState::Resolving,
            pending_redirect: None,
        }
    }

    pub fn view(&self) -> &'static View {
        self.view
    }

    pub fn state(&self) -> &GuardState {
        &self.state
    }

    pub fn has_pending_redirect(&self) -> bool {
        self.pending_redirect.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Re-fetch the identity and re-evaluate. Runs on every mount and every
    /// navigation; a previous pending redirect is cancelled first.
    pub async fn resolve(&mut self, identity: &IdentityContext, source: &dyn IdentitySource) -> &GuardState {
        self.cancel_pending();
        self.state = GuardState::Resolving;

        identity.refresh(source).await;
        let current = identity.settled().await;
        let next = evaluate(self.view, &current);
        self.apply(next);
        &self.state
    }

    fn apply(&mut self, next: GuardState) {
        debug!(view = self.view.path, state = ?next, "route guard evaluated");
        match &next {
            GuardState::Unauthenticated { redirect_to, return_to } => {
                self.navigator.redirect(redirect_to, Some(return_to));
            }
            GuardState::Denied { reason, redirect_to } => {
                self.navigator.notify(reason);
                let navigator = self.navigator.clone();
                let to = *redirect_to;
                let delay = self.redirect_delay;
                self.pending_redirect = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.redirect(to, None);
                }));
            }
            GuardState::Resolving | GuardState::AuthorizedSuperAdmin | GuardState::AuthorizedByPermission => {}
        }
        self.state = next;
    }

    /// Wait for a scheduled redirect to fire, if there is one.
    pub async fn settle(&mut self) {
        if let Some(handle) = self.pending_redirect.take() {
            let _ = handle.await;
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending_redirect.take() {
            handle.abort();
        }
    }
}

impl<N: Navigator> Drop for RouteGuard<N> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
