use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A page snapshot in JSON, e.g.
///
/// ```json
/// { "body": [ { "class": "page-container web", "children": [
///     { "class": "header", "text": "Meeting" },
///     { "class": "subtitle-content", "children": [ { "class": "translate", "style": { "height": "40px" } } ] }
/// ] } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageFixture {
    pub head: Vec<NodeFixture>,
    pub body: Vec<NodeFixture>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeFixture {
    pub tag: String,
    pub id: Option<String>,
    /// Space-separated, as in the `class` attribute.
    pub class: Option<String>,
    pub style: BTreeMap<String, String>,
    pub text: Option<String>,
    pub children: Vec<NodeFixture>,
}

impl Default for NodeFixture {
    fn default() -> Self {
        Self {
            tag: "div".to_string(),
            id: None,
            class: None,
            style: BTreeMap::new(),
            text: None,
            children: Vec::new(),
        }
    }
}

impl NodeFixture {
    pub fn with_class(class: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            ..Self::default()
        }
    }

    pub fn classes(&self) -> Vec<String> {
        self.class
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

impl PageFixture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
