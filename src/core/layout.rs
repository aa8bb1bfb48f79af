use crate::config::toml_config::{CleanerConfig, InlineStrip};
use crate::core::observers::ObserverSlots;
use crate::core::scroll::{ScrollFollower, ScrollOutcome};
use crate::core::stylesheet::DesiredLayoutState;
use crate::domain::model::{ChangeCategories, ObserverRole};
use crate::domain::ports::{PageDom, PageHost};

/// Counts from one suppression pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileCounts {
    pub removed: usize,
    pub stripped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuppressionReport<N> {
    pub counts: ReconcileCounts,
    /// A new body subscription was created by this activation.
    pub subscribed: bool,
    pub scroll: ScrollOutcome<N>,
}

/// Deletes the page chrome and keeps deleting it while the host re-renders.
#[derive(Debug, Clone)]
pub struct LayoutSuppressor {
    desired: DesiredLayoutState,
    style_id: String,
    inline_strips: Vec<InlineStrip>,
}

impl LayoutSuppressor {
    pub fn new(config: &CleanerConfig) -> Self {
        Self {
            desired: DesiredLayoutState::from_config(config),
            style_id: config.styles.layout_id.clone(),
            inline_strips: config.selectors.inline_strips.clone(),
        }
    }

    pub fn desired(&self) -> &DesiredLayoutState {
        &self.desired
    }

    pub fn activate<H: PageHost>(
        &self,
        host: &mut H,
        slots: &mut ObserverSlots<H::Node>,
        follower: &ScrollFollower,
    ) -> SuppressionReport<H::Node> {
        tracing::info!("Applying clean mode");

        let removed = self.remove_suppressed(host);

        host.upsert_style(&self.style_id, self.desired.stylesheet());
        tracing::debug!("Clean mode styles applied to #{}", self.style_id);

        let stripped = self.strip_inline_styles(host);

        let subscribed = if slots.get(ObserverRole::Layout).is_some() {
            false
        } else if let Some(body) = host.body() {
            slots.install(host, ObserverRole::Layout, body, ChangeCategories::LAYOUT);
            tracing::info!("Layout observer started for element removal");
            true
        } else {
            tracing::warn!("Document has no body yet, layout observer not started");
            false
        };

        let scroll = follower.activate(host, slots);

        SuppressionReport {
            counts: ReconcileCounts { removed, stripped },
            subscribed,
            scroll,
        }
    }

    /// The work repeated on every body delivery: delete chrome, strip inline styles.
    pub fn reconcile<H: PageDom>(&self, host: &mut H) -> ReconcileCounts {
        ReconcileCounts {
            removed: self.remove_suppressed(host),
            stripped: self.strip_inline_styles(host),
        }
    }

    fn remove_suppressed<H: PageDom>(&self, host: &mut H) -> usize {
        let mut removed = 0;
        for selector in self.desired.suppress() {
            let nodes = host.query_selector_all(selector);
            if nodes.is_empty() {
                continue;
            }
            tracing::debug!("Removing {} elements for selector: {}", nodes.len(), selector);
            for node in &nodes {
                if host.remove(node) {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn strip_inline_styles<H: PageDom>(&self, host: &mut H) -> usize {
        let mut stripped = 0;
        for strip in &self.inline_strips {
            for node in host.query_selector_all(&strip.selector) {
                if host.remove_inline_property(&node, &strip.property) {
                    stripped += 1;
                }
            }
        }
        if stripped > 0 {
            tracing::debug!("Stripped {} inline style properties", stripped);
        }
        stripped
    }
}
