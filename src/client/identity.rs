use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::auth::ResolvedIdentity;

use super::ClientError;

/// What the client currently knows about who is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityState {
    Resolving,
    Anonymous,
    Resolved(ResolvedIdentity),
}

/// Where a fresh identity comes from, normally `GET /api/auth/me`.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    /// `Ok(None)` when there is no valid session.
    async fn fetch_identity(&self) -> Result<Option<ResolvedIdentity>, ClientError>;
}

/// Outcome of `IdentityContext::refresh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Applied(IdentityState),
    /// A later refresh started before this one finished; its result was dropped.
    Superseded,
}

/// Explicit, observable holder of the client-side identity.
///
/// Cheap to clone; clones share state. Only the most recently started
/// refresh may publish its result.
#[derive(Clone)]
pub struct IdentityContext {
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<IdentityState>>,
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityContext {
    pub fn new() -> Self {
        let (state, _) = watch::channel(IdentityState::Resolving);
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    /// Re-fetch the identity. Publishes `Resolving` first, then the result,
    /// unless a newer refresh has started meanwhile. A failed fetch resolves
    /// to `Anonymous`.
    ///
    /// Dropping the future before the fetch completes puts back the last
    /// settled state, so `settled()` never waits on an abandoned refresh.
    pub async fn refresh(&self, source: &dyn IdentitySource) -> Refresh {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.state.send_replace(IdentityState::Resolving);
        let mut pending = PendingRefresh::new(self, generation, previous);

        let fetched = source.fetch_identity().await;
        pending.disarm();

        let next = match fetched {
            Ok(Some(identity)) => IdentityState::Resolved(identity),
            Ok(None) => IdentityState::Anonymous,
            Err(e) => {
                warn!(error = %e, "identity refresh failed");
                IdentityState::Anonymous
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next.clone();
            true
        });

        if applied {
            Refresh::Applied(next)
        } else {
            debug!(generation, "identity refresh superseded");
            Refresh::Superseded
        }
    }

    /// Wait until no refresh is in flight and return the settled state.
    pub async fn settled(&self) -> IdentityState {
        let mut receiver = self.subscribe();
        let settled = receiver
            .wait_for(|state| !matches!(state, IdentityState::Resolving))
            .await
            .map(|state| state.clone());
        // The sender lives as long as `self`, so the channel cannot close here.
        settled.unwrap_or(IdentityState::Anonymous)
    }

    /// Forget the identity (sign-out). Invalidates any in-flight refresh.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_replace(IdentityState::Anonymous);
    }
}

/// Restores a settled state if its refresh is dropped mid-fetch.
struct PendingRefresh<'a> {
    ctx: &'a IdentityContext,
    generation: u64,
    fallback: Option<IdentityState>,
}

impl<'a> PendingRefresh<'a> {
    fn new(ctx: &'a IdentityContext, generation: u64, previous: IdentityState) -> Self {
        // A refresh that replaced another in-flight refresh has nothing settled to restore.
        let fallback = match previous {
            IdentityState::Resolving => IdentityState::Anonymous,
            settled => settled,
        };
        Self {
            ctx,
            generation,
            fallback: Some(fallback),
        }
    }

    fn disarm(&mut self) {
        self.fallback = None;
    }
}

impl Drop for PendingRefresh<'_> {
    fn drop(&mut self) {
        let Some(fallback) = self.fallback.take() else {
            return;
        };
        let ctx = self.ctx;
        let generation = self.generation;
        let restored = ctx.state.send_if_modified(|state| {
            if ctx.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = fallback;
            true
        });
        if restored {
            debug!(generation, "identity refresh cancelled; previous state restored");
        }
    }
}
