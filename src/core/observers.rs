use crate::domain::model::{
    ChangeCategories, ObserverHandle, ObserverRole, RetryToken, SubscriptionId,
};
use crate::domain::ports::{MutationHub, RetryScheduler};

/// The coordinator-owned subscription handles, at most one per role, plus
/// the pending container-discovery retry. Subsystems borrow this mutably;
/// nothing else creates or destroys subscriptions.
#[derive(Debug)]
pub struct ObserverSlots<N> {
    layout: Option<ObserverHandle<N>>,
    scroll: Option<ObserverHandle<N>>,
    pending_retry: Option<RetryToken>,
}

impl<N> Default for ObserverSlots<N> {
    fn default() -> Self {
        Self {
            layout: None,
            scroll: None,
            pending_retry: None,
        }
    }
}

impl<N: Clone + PartialEq + std::fmt::Debug> ObserverSlots<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: ObserverRole) -> Option<&ObserverHandle<N>> {
        match role {
            ObserverRole::Layout => self.layout.as_ref(),
            ObserverRole::Scroll => self.scroll.as_ref(),
        }
    }

    /// The node currently believed to be the subtitle container.
    pub fn scroll_target(&self) -> Option<&N> {
        self.scroll.as_ref().map(|handle| &handle.target)
    }

    pub fn role_of(&self, subscription: SubscriptionId) -> Option<ObserverRole> {
        [&self.layout, &self.scroll]
            .into_iter()
            .flatten()
            .find(|handle| handle.id == subscription)
            .map(|handle| handle.role)
    }

    pub fn active_count(&self) -> usize {
        self.layout.is_some() as usize + self.scroll.is_some() as usize
    }

    pub fn pending_retry(&self) -> Option<RetryToken> {
        self.pending_retry
    }

    fn slot_mut(&mut self, role: ObserverRole) -> &mut Option<ObserverHandle<N>> {
        match role {
            ObserverRole::Layout => &mut self.layout,
            ObserverRole::Scroll => &mut self.scroll,
        }
    }

    /// Subscribes `target` for `role`, disconnecting the role's previous
    /// subscription first.
    pub(crate) fn install<H>(
        &mut self,
        host: &mut H,
        role: ObserverRole,
        target: N,
        categories: ChangeCategories,
    ) -> SubscriptionId
    where
        H: MutationHub<Node = N>,
    {
        self.release(host, role);

        let id = host.observe(&target, categories);
        tracing::debug!("{:?} observer {:?} attached to {:?}", role, id, target);
        *self.slot_mut(role) = Some(ObserverHandle {
            id,
            role,
            target,
            categories,
        });
        id
    }

    pub(crate) fn release<H>(&mut self, host: &mut H, role: ObserverRole) -> bool
    where
        H: MutationHub<Node = N>,
    {
        match self.slot_mut(role).take() {
            Some(handle) => {
                host.disconnect(handle.id);
                tracing::debug!("{:?} observer {:?} disconnected", role, handle.id);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_pending_retry(&mut self, token: RetryToken) {
        self.pending_retry = Some(token);
    }

    /// Consumes the pending retry if `token` is the one on record.
    pub(crate) fn claim_retry(&mut self, token: RetryToken) -> bool {
        if self.pending_retry == Some(token) {
            self.pending_retry = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn cancel_retry<H: RetryScheduler>(&mut self, host: &mut H) -> bool {
        match self.pending_retry.take() {
            Some(token) => {
                host.cancel_retry(token);
                tracing::debug!("Container discovery retry {:?} cancelled", token);
                true
            }
            None => false,
        }
    }

    /// Forgets every handle without touching the host. Used after the host
    /// itself dropped all subscriptions and timers (reload).
    pub(crate) fn forget_all(&mut self) {
        self.layout = None;
        self.scroll = None;
        self.pending_retry = None;
    }
}
