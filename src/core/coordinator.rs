use crate::config::toml_config::CleanerConfig;
use crate::core::layout::{LayoutSuppressor, ReconcileCounts, SuppressionReport};
use crate::core::observers::ObserverSlots;
use crate::core::scroll::ScrollFollower;
use crate::core::style::StyleController;
use crate::domain::model::{
    CleanState, FontSize, MutationBatch, ObserverRole, ReloadOutcome, RetryToken, UserPreferences,
};
use crate::domain::ports::PageHost;
use serde::Serialize;

/// Running totals of what the reactive handlers did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorStats {
    pub layout_deliveries: usize,
    pub scroll_deliveries: usize,
    pub stale_deliveries: usize,
    pub removed: usize,
    pub stripped: usize,
    pub scroll_pins: usize,
    pub retries_fired: usize,
    pub refollows: usize,
}

/// Owns clean-mode state and the observer handles, and routes host
/// deliveries to the subsystem that registered them.
pub struct Coordinator<H: PageHost> {
    host: H,
    state: CleanState,
    slots: ObserverSlots<H::Node>,
    suppressor: LayoutSuppressor,
    follower: ScrollFollower,
    style: StyleController,
    applied_font: Option<FontSize>,
    stats: CoordinatorStats,
}

impl<H: PageHost> Coordinator<H> {
    pub fn new(host: H, config: &CleanerConfig) -> Self {
        Self {
            host,
            state: CleanState::Inactive,
            slots: ObserverSlots::new(),
            suppressor: LayoutSuppressor::new(config),
            follower: ScrollFollower::new(config),
            style: StyleController::new(config),
            applied_font: None,
            stats: CoordinatorStats::default(),
        }
    }

    pub fn state(&self) -> CleanState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CleanState::Active
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn slots(&self) -> &ObserverSlots<H::Node> {
        &self.slots
    }

    pub fn applied_font(&self) -> Option<FontSize> {
        self.applied_font
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.stats
    }

    /// Startup check against the persisted preferences.
    pub fn restore(&mut self, prefs: &UserPreferences) -> CleanState {
        if prefs.clean_mode_enabled {
            self.enable();
            self.apply_font(prefs.font_size_px);
        } else {
            tracing::info!("Clean mode disabled in preferences, leaving page untouched");
        }
        self.state
    }

    /// Enters (or re-applies) clean mode. The font is applied separately by
    /// the caller once it has read the persisted size.
    pub fn enable(&mut self) -> SuppressionReport<H::Node> {
        if self.state == CleanState::Inactive {
            tracing::info!("Clean mode: inactive -> active");
        }
        self.state = CleanState::Active;

        let report = self
            .suppressor
            .activate(&mut self.host, &mut self.slots, &self.follower);
        self.stats.removed += report.counts.removed;
        self.stats.stripped += report.counts.stripped;
        report
    }

    pub fn apply_font(&mut self, size: Option<FontSize>) -> FontSize {
        let applied = self.style.apply(&mut self.host, size);
        self.applied_font = Some(applied);
        applied
    }

    /// Font changes only show while clean mode is on.
    pub fn update_font(&mut self, size: Option<FontSize>) -> Option<FontSize> {
        if !self.is_active() {
            tracing::debug!("Font update ignored while clean mode is inactive");
            return None;
        }
        Some(self.apply_font(size))
    }

    /// Tears down both subscriptions and any pending retry, then reloads the
    /// page to undo the DOM surgery.
    pub fn disable(&mut self) -> ReloadOutcome {
        tracing::info!("Removing clean mode, reloading");
        self.slots.release(&mut self.host, ObserverRole::Layout);
        self.slots.release(&mut self.host, ObserverRole::Scroll);
        self.slots.cancel_retry(&mut self.host);
        self.state = CleanState::Inactive;
        self.applied_font = None;

        let outcome = self.host.reload();
        // 重新載入後主機已清掉所有訂閱與計時器
        self.slots.forget_all();
        outcome
    }

    pub fn on_mutations(&mut self, batch: MutationBatch<H::Node>) {
        match self.slots.role_of(batch.subscription) {
            Some(ObserverRole::Layout) => {
                self.stats.layout_deliveries += 1;
                let ReconcileCounts { removed, stripped } = self.suppressor.reconcile(&mut self.host);
                self.stats.removed += removed;
                self.stats.stripped += stripped;
                self.refollow_if_detached();
            }
            Some(ObserverRole::Scroll) => {
                self.stats.scroll_deliveries += 1;
                let Some(container) = self.slots.scroll_target().cloned() else {
                    return;
                };
                if self.follower.on_batch(&mut self.host, &container, &batch) {
                    self.stats.scroll_pins += 1;
                }
            }
            None => {
                self.stats.stale_deliveries += 1;
                tracing::debug!(
                    "Ignoring {} records for released subscription {:?}",
                    batch.records.len(),
                    batch.subscription
                );
            }
        }
    }

    /// The page may re-render the caption area; a subscription on the old,
    /// detached container would never fire again.
    fn refollow_if_detached(&mut self) {
        let Some(container) = self.slots.scroll_target() else {
            return;
        };
        if self.host.is_attached(container) {
            return;
        }
        tracing::info!("Subtitle container detached, searching again");
        self.slots.release(&mut self.host, ObserverRole::Scroll);
        self.stats.refollows += 1;
        self.follower.activate(&mut self.host, &mut self.slots);
    }

    pub fn on_retry(&mut self, token: RetryToken) {
        if !self.slots.claim_retry(token) {
            tracing::debug!("Ignoring stale retry {:?}", token);
            return;
        }
        if !self.is_active() {
            return;
        }
        self.stats.retries_fired += 1;
        self.follower.activate(&mut self.host, &mut self.slots);
    }
}
