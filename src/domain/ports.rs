use crate::domain::model::{
    ChangeCategories, MutationBatch, ReloadOutcome, RetryToken, SubscriptionId, UserPreferences,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// The document as seen by the core. Every operation is total: an invalid
/// selector matches nothing, and a detached node is silently ignored.
pub trait PageDom {
    type Node: Clone + PartialEq + std::fmt::Debug;

    fn body(&self) -> Option<Self::Node>;

    fn query_selector(&self, selector: &str) -> Option<Self::Node>;

    fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

    /// Whether `node` is still part of the document.
    fn is_attached(&self, node: &Self::Node) -> bool;

    /// Detaches `node` from its parent. Returns false if it was already detached.
    fn remove(&mut self, node: &Self::Node) -> bool;

    /// Creates the `<style id=style_id>` element if absent, then replaces its contents.
    fn upsert_style(&mut self, style_id: &str, css: &str);

    /// Removes one inline style property. Returns false if it was not set.
    fn remove_inline_property(&mut self, node: &Self::Node, property: &str) -> bool;

    fn scroll_to_bottom(&mut self, node: &Self::Node);

    fn reload(&mut self) -> ReloadOutcome;
}

/// Mutation subscriptions. Batches are delivered by the host, after the
/// current task, to `Coordinator::on_mutations`.
pub trait MutationHub: PageDom {
    fn observe(&mut self, target: &Self::Node, categories: ChangeCategories) -> SubscriptionId;

    /// Stops delivery and discards records not yet delivered.
    fn disconnect(&mut self, subscription: SubscriptionId);
}

/// One-shot deferred callbacks, delivered to `Coordinator::on_retry`.
pub trait RetryScheduler {
    fn schedule_retry(&mut self, delay: Duration) -> RetryToken;

    fn cancel_retry(&mut self, token: RetryToken);
}

pub trait PageHost: MutationHub + RetryScheduler {}

impl<T: MutationHub + RetryScheduler> PageHost for T {}

/// Hosts that queue deliveries until the caller drains them, instead of
/// pushing them from an event loop of their own.
pub trait QueuedDelivery: PageDom {
    /// Pending batches, one per subscription with records, in subscription order.
    fn take_batches(&mut self) -> Vec<MutationBatch<Self::Node>>;

    fn has_pending_batches(&self) -> bool;

    /// Moves the clock forward and returns the retries that became due, oldest first.
    fn advance_clock(&mut self, by: Duration) -> Vec<RetryToken>;
}

/// Key-value persistence owned by the popup. Futures are not `Send`: every
/// host runs the script on a single thread.
#[async_trait(?Send)]
pub trait PreferenceStore {
    async fn load(&self) -> Result<UserPreferences>;

    async fn save(&self, prefs: &UserPreferences) -> Result<()>;
}
