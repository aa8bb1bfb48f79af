use crate::config::toml_config::CleanerConfig;
use crate::core::observers::ObserverSlots;
use crate::domain::model::{ChangeCategories, MutationBatch, ObserverRole, RetryToken};
use crate::domain::ports::{PageDom, PageHost};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollOutcome<N> {
    /// Container found, pinned to the bottom and subscribed.
    Following(N),
    /// No candidate matched yet; another attempt is scheduled.
    Retrying(RetryToken),
}

/// Keeps the subtitle container scrolled to its newest line.
#[derive(Debug, Clone)]
pub struct ScrollFollower {
    candidates: Vec<String>,
    retry_delay: Duration,
}

impl ScrollFollower {
    pub fn new(config: &CleanerConfig) -> Self {
        Self {
            candidates: config.selectors.containers.clone(),
            retry_delay: config.retry_delay(),
        }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// First candidate selector with a match, in priority order.
    pub fn find_container<H: PageDom>(&self, host: &H) -> Option<(&str, H::Node)> {
        self.candidates.iter().find_map(|selector| {
            host.query_selector(selector)
                .map(|node| (selector.as_str(), node))
        })
    }

    pub fn activate<H: PageHost>(
        &self,
        host: &mut H,
        slots: &mut ObserverSlots<H::Node>,
    ) -> ScrollOutcome<H::Node> {
        // 同一時間最多只保留一個待執行的重試
        slots.cancel_retry(host);

        let Some((selector, container)) = self.find_container(host) else {
            let token = host.schedule_retry(self.retry_delay);
            slots.set_pending_retry(token);
            tracing::info!(
                "Subtitle container not found, retrying in {:?}",
                self.retry_delay
            );
            return ScrollOutcome::Retrying(token);
        };
        tracing::info!("Found subtitle container: {}", selector);

        host.scroll_to_bottom(&container);
        slots.install(host, ObserverRole::Scroll, container.clone(), ChangeCategories::SCROLL);
        tracing::info!("Auto-scroll observer started");

        ScrollOutcome::Following(container)
    }

    /// Re-pins the container when a delivery added nodes or changed text.
    pub fn on_batch<H: PageDom>(
        &self,
        host: &mut H,
        container: &H::Node,
        batch: &MutationBatch<H::Node>,
    ) -> bool {
        if !batch.grows_content() {
            return false;
        }
        host.scroll_to_bottom(container);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryPage, NodeId};
    use crate::domain::model::{MutationKind, MutationRecord, SubscriptionId};

    fn batch(
        target: NodeId,
        kind: MutationKind,
        added_nodes: usize,
        removed_nodes: usize,
    ) -> MutationBatch<NodeId> {
        MutationBatch {
            subscription: SubscriptionId(1),
            records: vec![MutationRecord {
                kind,
                target,
                added_nodes,
                removed_nodes,
            }],
        }
    }

    #[test]
    fn test_pure_removal_does_not_repin() {
        let follower = ScrollFollower::new(&CleanerConfig::default());
        let mut page = MemoryPage::new();
        let body = page.body_node();
        for _ in 0..20 {
            let row = page.create_element("div");
            page.append_child(body, row);
        }
        page.set_scroll_top(body, 0);

        assert!(!follower.on_batch(&mut page, &body, &batch(body, MutationKind::ChildList, 0, 1)));
        assert_eq!(page.scroll_top(body), 0);

        assert!(follower.on_batch(&mut page, &body, &batch(body, MutationKind::CharacterData, 0, 0)));
        assert!(page.is_scrolled_to_bottom(body));
    }

    #[test]
    fn test_candidate_priority() {
        let follower = ScrollFollower::new(&CleanerConfig::default());
        let mut page = MemoryPage::new();
        let body = page.body_node();
        for class in ["content-wrapper", "subtitle-wrapper"] {
            let node = page.create_element("div");
            page.add_class(node, class);
            page.append_child(body, node);
        }

        let (selector, _) = follower.find_container(&page).unwrap();
        assert_eq!(selector, ".subtitle-wrapper");
    }
}
