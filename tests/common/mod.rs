#![allow(dead_code)]

use subtitle_clean::adapters::memory::{NodeFixture, NodeId};
use subtitle_clean::domain::ports::PageDom;
use subtitle_clean::{MemoryPage, PageFixture};

pub const MEETING_PAGE: &str = r#"{
  "head": [ { "tag": "title", "text": "Live captions" } ],
  "body": [ {
    "class": "page-container web",
    "children": [
      { "class": "header", "children": [ { "class": "meeting-title", "text": "Weekly sync" } ] },
      { "class": "page-content", "children": [
        { "class": "subtitle-content", "children": [
          { "class": "translate-box", "style": { "padding-bottom": "40px" }, "children": [
            { "class": "origin", "text": "good morning" },
            { "class": "translate", "style": { "height": "60px" }, "text": "早安" }
          ] }
        ] }
      ] },
      { "class": "footer", "text": "Powered by captions" }
    ]
  } ]
}"#;

pub fn meeting_page() -> MemoryPage {
    let fixture = PageFixture::from_json_str(MEETING_PAGE).unwrap();
    MemoryPage::from_fixture(&fixture)
}

/// A page that has not rendered its caption area yet.
pub fn loading_page() -> MemoryPage {
    let fixture = PageFixture::from_json_str(
        r#"{ "body": [ { "class": "page-container web", "children": [ { "class": "header" } ] } ] }"#,
    )
    .unwrap();
    MemoryPage::from_fixture(&fixture)
}

pub fn append_caption_row(page: &mut MemoryPage, container: NodeId, text: &str) -> NodeId {
    let row = page.create_from_fixture(&NodeFixture {
        text: Some(text.to_string()),
        ..NodeFixture::with_class("translate-box")
    });
    page.append_child(container, row);
    row
}

/// Re-inserts the page chrome the way the site does after a re-render.
pub fn rerender_chrome(page: &mut MemoryPage) {
    let body = page.body().unwrap();
    for class in ["header", "meeting-title", "footer"] {
        let node = page.create_from_fixture(&NodeFixture::with_class(class));
        page.append_child(body, node);
    }
}
