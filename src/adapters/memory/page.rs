use super::fixture::{NodeFixture, PageFixture};
use super::selector::{ComplexSelector, Compound, SelectorList};
use crate::domain::model::{
    ChangeCategories, MutationBatch, MutationKind, MutationRecord, ReloadOutcome, RetryToken,
    SubscriptionId,
};
use crate::domain::ports::{MutationHub, PageDom, QueuedDelivery, RetryScheduler};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_ROW_HEIGHT: u32 = 24;
pub const DEFAULT_CLIENT_HEIGHT: u32 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    /// Inline style declarations in insertion order.
    style: Vec<(String, String)>,
    scroll_top: u32,
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Arena of nodes. Detached nodes stay in the arena with no parent.
#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
    head: NodeId,
    body: NodeId,
}

const ROOT: NodeId = NodeId(0);

impl Tree {
    fn skeleton() -> Self {
        let mut tree = Tree {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            head: ROOT,
            body: ROOT,
        };
        let html = tree.push(NodeKind::Element(ElementData::tagged("html")));
        tree.attach(ROOT, html);
        tree.head = tree.push(NodeKind::Element(ElementData::tagged("head")));
        tree.attach(html, tree.head);
        tree.body = tree.push(NodeKind::Element(ElementData::tagged("body")));
        tree.attach(html, tree.body);
        tree
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            kind,
        });
        NodeId(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.nodes[child.0].parent.take()?;
        self.nodes[parent.0].children.retain(|c| *c != child);
        Some(parent)
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(ROOT, node)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.node(node)?.parent?;
        self.element(parent).map(|_| parent)
    }

    /// Descendants of `root` in document order, excluding `root` itself.
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.node(root) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.node(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    fn build(&mut self, fixture: &NodeFixture) -> NodeId {
        let data = ElementData {
            tag: fixture.tag.to_ascii_lowercase(),
            id: fixture.id.clone(),
            classes: fixture.classes(),
            style: fixture
                .style
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
                .collect(),
            scroll_top: 0,
        };
        let id = self.push(NodeKind::Element(data));
        if let Some(text) = &fixture.text {
            let text_node = self.push(NodeKind::Text(text.clone()));
            self.attach(id, text_node);
        }
        for child in &fixture.children {
            let child_id = self.build(child);
            self.attach(id, child_id);
        }
        id
    }
}

impl ElementData {
    fn tagged(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct Subscription {
    target: NodeId,
    categories: ChangeCategories,
    pending: Vec<MutationRecord<NodeId>>,
}

#[derive(Debug)]
struct Timer {
    token: RetryToken,
    due: Duration,
}

/// An in-process page: DOM arena, mutation subscriptions that queue
/// records until drained, fixed-row scroll geometry and a virtual clock.
#[derive(Debug)]
pub struct MemoryPage {
    tree: Tree,
    pristine: Tree,
    subscriptions: BTreeMap<SubscriptionId, Subscription>,
    timers: Vec<Timer>,
    now: Duration,
    next_handle: u64,
    row_height: u32,
    client_height: u32,
    reloads: usize,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    /// An empty `html > head + body` document.
    pub fn new() -> Self {
        let tree = Tree::skeleton();
        Self {
            pristine: tree.clone(),
            tree,
            subscriptions: BTreeMap::new(),
            timers: Vec::new(),
            now: Duration::ZERO,
            next_handle: 1,
            row_height: DEFAULT_ROW_HEIGHT,
            client_height: DEFAULT_CLIENT_HEIGHT,
            reloads: 0,
        }
    }

    /// Builds the page from a fixture; `reload` returns to this state.
    pub fn from_fixture(fixture: &PageFixture) -> Self {
        let mut page = Self::new();
        for node in &fixture.head {
            let id = page.tree.build(node);
            page.tree.attach(page.tree.head, id);
        }
        for node in &fixture.body {
            let id = page.tree.build(node);
            page.tree.attach(page.tree.body, id);
        }
        page.capture_pristine();
        page
    }

    pub fn with_viewport(mut self, row_height: u32, client_height: u32) -> Self {
        self.row_height = row_height.max(1);
        self.client_height = client_height;
        self
    }

    /// Makes the current DOM the state `reload` restores.
    pub fn capture_pristine(&mut self) {
        self.pristine = self.tree.clone();
    }

    pub fn head(&self) -> NodeId {
        self.tree.head
    }

    pub fn body_node(&self) -> NodeId {
        self.tree.body
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree
            .push(NodeKind::Element(ElementData::tagged(&tag.to_ascii_lowercase())))
    }

    /// Builds a detached subtree from a fixture node.
    pub fn create_from_fixture(&mut self, fixture: &NodeFixture) -> NodeId {
        self.tree.build(fixture)
    }

    pub fn set_element_id(&mut self, node: NodeId, id: &str) {
        if let Some(data) = self.tree.element_mut(node) {
            data.id = Some(id.to_string());
        }
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if let Some(data) = self.tree.element_mut(node) {
            if !data.classes.iter().any(|c| c == class) {
                data.classes.push(class.to_string());
            }
        }
    }

    pub fn set_inline_property(&mut self, node: NodeId, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        if let Some(data) = self.tree.element_mut(node) {
            match data.style.iter_mut().find(|(name, _)| *name == property) {
                Some(entry) => entry.1 = value.to_string(),
                None => data.style.push((property, value.to_string())),
            }
        }
    }

    /// Appends `child` to `parent`, moving it if it is attached elsewhere.
    /// Refuses to create cycles or to give a text node children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let parent_accepts = matches!(
            self.tree.node(parent).map(|n| &n.kind),
            Some(NodeKind::Element(_)) | Some(NodeKind::Document)
        );
        if !parent_accepts
            || self.tree.node(child).is_none()
            || self.tree.is_inclusive_ancestor(child, parent)
        {
            return false;
        }

        if let Some(old_parent) = self.tree.detach(child) {
            self.record(MutationKind::ChildList, old_parent, 0, 1);
        }
        self.tree.attach(parent, child);
        self.record(MutationKind::ChildList, parent, 1, 0);
        true
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.tree.push(NodeKind::Text(text.to_string()));
        self.append_child(parent, node);
        node
    }

    /// Sets a text node's data, or replaces an element's children with one text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        let is_text = match self.tree.node(node).map(|n| &n.kind) {
            Some(NodeKind::Text(_)) => true,
            Some(NodeKind::Element(_)) => false,
            _ => return,
        };

        if is_text {
            if let NodeKind::Text(data) = &mut self.tree.nodes[node.0].kind {
                *data = text.to_string();
            }
            self.record(MutationKind::CharacterData, node, 0, 0);
            return;
        }

        let old_children = std::mem::take(&mut self.tree.nodes[node.0].children);
        for child in &old_children {
            self.tree.nodes[child.0].parent = None;
        }
        let text_node = self.tree.push(NodeKind::Text(text.to_string()));
        self.tree.attach(node, text_node);
        self.record(MutationKind::ChildList, node, 1, old_children.len());
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.tree.is_connected(node)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.tree.element(node).map(|data| data.tag.as_str())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.tree
            .element(node)
            .map(|data| data.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree
            .node(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn inline_property(&self, node: NodeId, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.tree
            .element(node)?
            .style
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let Some(NodeKind::Text(data)) = self.tree.node(node).map(|n| &n.kind) {
            text.push_str(data);
        }
        for id in self.tree.descendants(node) {
            if let Some(NodeKind::Text(data)) = self.tree.node(id).map(|n| &n.kind) {
                text.push_str(data);
            }
        }
        text
    }

    /// Connected elements carrying `id`, in document order.
    pub fn elements_with_id(&self, id: &str) -> Vec<NodeId> {
        self.tree
            .descendants(ROOT)
            .into_iter()
            .filter(|node| {
                self.tree
                    .element(*node)
                    .and_then(|data| data.id.as_deref())
                    == Some(id)
            })
            .collect()
    }

    pub fn style_text(&self, style_id: &str) -> Option<String> {
        self.elements_with_id(style_id)
            .first()
            .map(|node| self.text_content(*node))
    }

    pub fn scroll_height(&self, node: NodeId) -> u32 {
        let rows = self.tree.descendants(node).len() as u32;
        (rows * self.row_height).max(self.client_height)
    }

    pub fn max_scroll_top(&self, node: NodeId) -> u32 {
        self.scroll_height(node) - self.client_height
    }

    /// Clamped the way a browser clamps when content shrinks.
    pub fn scroll_top(&self, node: NodeId) -> u32 {
        self.tree
            .element(node)
            .map(|data| data.scroll_top.min(self.max_scroll_top(node)))
            .unwrap_or(0)
    }

    pub fn set_scroll_top(&mut self, node: NodeId, value: u32) {
        let clamped = value.min(self.max_scroll_top(node));
        if let Some(data) = self.tree.element_mut(node) {
            data.scroll_top = clamped;
        }
    }

    pub fn is_scrolled_to_bottom(&self, node: NodeId) -> bool {
        self.scroll_top(node) == self.max_scroll_top(node)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn subscriptions_on(&self, node: NodeId) -> usize {
        self.subscriptions
            .values()
            .filter(|sub| sub.target == node)
            .count()
    }

    pub fn pending_retries(&self) -> usize {
        self.timers.len()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn reload_count(&self) -> usize {
        self.reloads
    }

    /// Indented dump of the connected tree, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_into(self.tree.body, 0, &mut out);
        out
    }

    fn outline_into(&self, node: NodeId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        match self.tree.node(node).map(|n| &n.kind) {
            Some(NodeKind::Element(data)) => {
                out.push_str(&indent);
                out.push_str(&data.tag);
                if let Some(id) = &data.id {
                    out.push('#');
                    out.push_str(id);
                }
                for class in &data.classes {
                    out.push('.');
                    out.push_str(class);
                }
                if !data.style.is_empty() {
                    let decls: Vec<String> =
                        data.style.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                    out.push_str(&format!(" [style=\"{}\"]", decls.join("; ")));
                }
                out.push('\n');
                for child in self.children(node) {
                    self.outline_into(*child, depth + 1, out);
                }
            }
            Some(NodeKind::Text(text)) => {
                out.push_str(&format!("{}{:?}\n", indent, text));
            }
            _ => {}
        }
    }

    fn next_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn record(&mut self, kind: MutationKind, target: NodeId, added_nodes: usize, removed_nodes: usize) {
        let tree = &self.tree;
        for sub in self.subscriptions.values_mut() {
            let wanted = match kind {
                MutationKind::ChildList => sub.categories.child_list,
                MutationKind::CharacterData => sub.categories.character_data,
            };
            let in_scope = sub.target == target
                || (sub.categories.subtree && tree.is_inclusive_ancestor(sub.target, target));
            if wanted && in_scope {
                sub.pending.push(MutationRecord {
                    kind,
                    target,
                    added_nodes,
                    removed_nodes,
                });
            }
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let Some(data) = self.tree.element(node) else {
            return false;
        };
        compound.tag.as_ref().map_or(true, |tag| *tag == data.tag)
            && compound
                .id
                .as_ref()
                .map_or(true, |id| data.id.as_ref() == Some(id))
            && compound
                .classes
                .iter()
                .all(|class| data.classes.iter().any(|c| c == class))
    }

    fn matches_complex(&self, node: NodeId, selector: &ComplexSelector) -> bool {
        let Some((last, ancestors)) = selector.compounds.split_last() else {
            return false;
        };
        if !self.matches_compound(node, last) {
            return false;
        }

        // 只有後代組合子，由右往左貪婪比對即可
        let mut current = self.tree.parent_element(node);
        for compound in ancestors.iter().rev() {
            loop {
                let Some(candidate) = current else {
                    return false;
                };
                current = self.tree.parent_element(candidate);
                if self.matches_compound(candidate, compound) {
                    break;
                }
            }
        }
        true
    }

    fn select(&self, selector: &str) -> Vec<NodeId> {
        let Some(list) = SelectorList::parse(selector) else {
            tracing::debug!("Unsupported selector, matching nothing: {}", selector);
            return Vec::new();
        };
        self.tree
            .descendants(ROOT)
            .into_iter()
            .filter(|node| list.selectors.iter().any(|s| self.matches_complex(*node, s)))
            .collect()
    }
}

impl PageDom for MemoryPage {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        self.tree
            .is_connected(self.tree.body)
            .then_some(self.tree.body)
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.select(selector).into_iter().next()
    }

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.select(selector)
    }

    fn is_attached(&self, node: &NodeId) -> bool {
        self.tree.is_connected(*node)
    }

    fn remove(&mut self, node: &NodeId) -> bool {
        if *node == ROOT {
            return false;
        }
        match self.tree.detach(*node) {
            Some(parent) => {
                self.record(MutationKind::ChildList, parent, 0, 1);
                true
            }
            None => false,
        }
    }

    fn upsert_style(&mut self, style_id: &str, css: &str) {
        let style = match self.elements_with_id(style_id).first() {
            Some(existing) => *existing,
            None => {
                let style = self.create_element("style");
                self.set_element_id(style, style_id);
                let container = if self.tree.is_connected(self.tree.head) {
                    self.tree.head
                } else {
                    ROOT
                };
                self.append_child(container, style);
                style
            }
        };
        self.set_text(style, css);
    }

    fn remove_inline_property(&mut self, node: &NodeId, property: &str) -> bool {
        let property = property.to_ascii_lowercase();
        let Some(data) = self.tree.element_mut(*node) else {
            return false;
        };
        let before = data.style.len();
        data.style.retain(|(name, _)| *name != property);
        data.style.len() != before
    }

    fn scroll_to_bottom(&mut self, node: &NodeId) {
        let bottom = self.scroll_height(*node);
        self.set_scroll_top(*node, bottom);
    }

    fn reload(&mut self) -> ReloadOutcome {
        self.tree = self.pristine.clone();
        self.subscriptions.clear();
        self.timers.clear();
        self.reloads += 1;
        tracing::debug!("Page reloaded ({} so far)", self.reloads);
        ReloadOutcome::Restarted
    }
}

impl MutationHub for MemoryPage {
    fn observe(&mut self, target: &NodeId, categories: ChangeCategories) -> SubscriptionId {
        let id = SubscriptionId(self.next_handle());
        self.subscriptions.insert(
            id,
            Subscription {
                target: *target,
                categories,
                pending: Vec::new(),
            },
        );
        id
    }

    fn disconnect(&mut self, subscription: SubscriptionId) {
        self.subscriptions.remove(&subscription);
    }
}

impl RetryScheduler for MemoryPage {
    fn schedule_retry(&mut self, delay: Duration) -> RetryToken {
        let token = RetryToken(self.next_handle());
        self.timers.push(Timer {
            token,
            due: self.now + delay,
        });
        token
    }

    fn cancel_retry(&mut self, token: RetryToken) {
        self.timers.retain(|timer| timer.token != token);
    }
}

impl QueuedDelivery for MemoryPage {
    fn take_batches(&mut self) -> Vec<MutationBatch<NodeId>> {
        self.subscriptions
            .iter_mut()
            .filter(|(_, sub)| !sub.pending.is_empty())
            .map(|(id, sub)| MutationBatch {
                subscription: *id,
                records: std::mem::take(&mut sub.pending),
            })
            .collect()
    }

    fn has_pending_batches(&self) -> bool {
        self.subscriptions.values().any(|sub| !sub.pending.is_empty())
    }

    fn advance_clock(&mut self, by: Duration) -> Vec<RetryToken> {
        self.now += by;
        let now = self.now;

        let mut due: Vec<&Timer> = self.timers.iter().filter(|timer| timer.due <= now).collect();
        due.sort_by_key(|timer| (timer.due, timer.token));
        let tokens: Vec<RetryToken> = due.into_iter().map(|timer| timer.token).collect();

        self.timers.retain(|timer| timer.due > now);
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caption_page() -> MemoryPage {
        let fixture: PageFixture = serde_json::from_value(json!({
            "body": [{
                "class": "page-container web",
                "children": [
                    { "class": "header", "text": "Weekly sync" },
                    { "class": "page-content", "children": [
                        { "class": "subtitle-content", "children": [
                            { "class": "translate-box", "style": { "padding-bottom": "40px" } }
                        ]}
                    ]}
                ]
            }]
        }))
        .unwrap();
        MemoryPage::from_fixture(&fixture)
    }

    #[test]
    fn test_selectors_match_in_document_order() {
        let page = caption_page();

        let header = page.query_selector(".header").unwrap();
        assert_eq!(page.text_content(header), "Weekly sync");

        let scoped = page.query_selector_all(".page-container.web .subtitle-content");
        assert_eq!(scoped.len(), 1);
        assert!(page.query_selector(".web .missing").is_none());
        assert!(page.query_selector("section .subtitle-content").is_none());

        let list = page.query_selector_all(".subtitle-content, .header");
        assert_eq!(list, vec![header, scoped[0]]);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let page = caption_page();
        assert!(page.query_selector_all("div > .header").is_empty());
        assert!(page.query_selector("").is_none());
    }

    #[test]
    fn test_remove_records_child_list_for_subtree_observer() {
        let mut page = caption_page();
        let body = page.body().unwrap();
        let sub = page.observe(&body, ChangeCategories::LAYOUT);

        let header = page.query_selector(".header").unwrap();
        assert!(page.remove(&header));
        assert!(!page.remove(&header));
        assert!(!page.is_connected(header));

        let batches = page.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].subscription, sub);
        assert_eq!(batches[0].records[0].removed_nodes, 1);
        assert!(!page.has_pending_batches());
    }

    #[test]
    fn test_character_data_only_reaches_subscribed_categories() {
        let mut page = caption_page();
        let body = page.body().unwrap();
        let container = page.query_selector(".subtitle-content").unwrap();
        page.observe(&body, ChangeCategories::LAYOUT);
        let scroll = page.observe(&container, ChangeCategories::SCROLL);

        let text = page.append_text(container, "hello");
        page.take_batches();

        page.set_text(text, "hello world");
        let batches = page.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].subscription, scroll);
        assert_eq!(batches[0].records[0].kind, MutationKind::CharacterData);
    }

    #[test]
    fn test_disconnect_discards_pending_records() {
        let mut page = caption_page();
        let body = page.body().unwrap();
        let sub = page.observe(&body, ChangeCategories::LAYOUT);
        let extra = page.create_element("div");
        page.append_child(body, extra);

        page.disconnect(sub);
        assert!(page.take_batches().is_empty());
        assert_eq!(page.active_subscriptions(), 0);
    }

    #[test]
    fn test_upsert_style_reuses_element() {
        let mut page = caption_page();
        page.upsert_style("clean-mode-style", "a {}");
        page.upsert_style("clean-mode-style", "b {}");

        assert_eq!(page.elements_with_id("clean-mode-style").len(), 1);
        assert_eq!(page.style_text("clean-mode-style").as_deref(), Some("b {}"));
        let style = page.elements_with_id("clean-mode-style")[0];
        assert_eq!(page.tag(style), Some("style"));
        assert_eq!(page.children(page.head()), &[style]);
    }

    #[test]
    fn test_inline_property_removal() {
        let mut page = caption_page();
        let boxed = page.query_selector(".translate-box").unwrap();
        assert_eq!(page.inline_property(boxed, "padding-bottom"), Some("40px"));

        assert!(page.remove_inline_property(&boxed, "PADDING-BOTTOM"));
        assert!(!page.remove_inline_property(&boxed, "padding-bottom"));
        assert_eq!(page.inline_property(boxed, "padding-bottom"), None);
    }

    #[test]
    fn test_scroll_geometry_clamps() {
        let mut page = MemoryPage::new().with_viewport(10, 50);
        let body = page.body().unwrap();
        let container = page.create_element("div");
        page.append_child(body, container);

        assert_eq!(page.scroll_height(container), 50);
        assert_eq!(page.max_scroll_top(container), 0);

        for i in 0..10 {
            let row = page.create_element("p");
            page.append_child(container, row);
            page.append_text(row, &format!("line {}", i));
        }
        assert_eq!(page.scroll_height(container), 200);

        page.scroll_to_bottom(&container);
        assert_eq!(page.scroll_top(container), 150);
        assert!(page.is_scrolled_to_bottom(container));

        page.set_scroll_top(container, 10);
        assert!(!page.is_scrolled_to_bottom(container));
    }

    #[test]
    fn test_timers_fire_in_due_order_and_cancel() {
        let mut page = MemoryPage::new();
        let late = page.schedule_retry(Duration::from_millis(1000));
        let early = page.schedule_retry(Duration::from_millis(500));
        let cancelled = page.schedule_retry(Duration::from_millis(200));
        page.cancel_retry(cancelled);

        assert!(page.advance_clock(Duration::from_millis(100)).is_empty());
        assert_eq!(page.advance_clock(Duration::from_millis(900)), vec![early, late]);
        assert_eq!(page.pending_retries(), 0);
        assert_eq!(page.now(), Duration::from_millis(1000));
    }

    #[test]
    fn test_reload_restores_pristine_dom() {
        let mut page = caption_page();
        let body = page.body().unwrap();
        page.observe(&body, ChangeCategories::LAYOUT);
        page.schedule_retry(Duration::from_secs(1));

        let header = page.query_selector(".header").unwrap();
        page.remove(&header);
        page.upsert_style("clean-mode-style", "x {}");

        assert_eq!(page.reload(), ReloadOutcome::Restarted);
        assert!(page.query_selector(".header").is_some());
        assert!(page.elements_with_id("clean-mode-style").is_empty());
        assert_eq!(page.active_subscriptions(), 0);
        assert_eq!(page.pending_retries(), 0);
        assert_eq!(page.reload_count(), 1);
    }

    #[test]
    fn test_append_child_rejects_cycles() {
        let mut page = caption_page();
        let body = page.body().unwrap();
        let container = page.query_selector(".subtitle-content").unwrap();
        assert!(!page.append_child(container, body));
        assert!(!page.append_child(body, body));
    }
}
