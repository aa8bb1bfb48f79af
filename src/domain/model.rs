use crate::utils::error::{CleanerError, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE_PX: u32 = 32;

/// A positive subtitle font size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FontSize(u32);

impl FontSize {
    pub const DEFAULT: FontSize = FontSize(DEFAULT_FONT_SIZE_PX);

    pub fn new(px: u32) -> Option<Self> {
        (px > 0).then_some(Self(px))
    }

    pub fn px(self) -> u32 {
        self.0
    }

    /// Reads a size the way the popup sends it: a number or a numeric
    /// string. Anything falsy, negative or non-numeric yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let raw = match value {
            serde_json::Value::Number(n) => n.as_f64()?,
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };

        if !raw.is_finite() {
            return None;
        }
        let px = raw.round();
        if px < 1.0 || px > u32::MAX as f64 {
            return None;
        }
        Self::new(px as u32)
    }

    pub fn resolve(size: Option<FontSize>, default: FontSize) -> FontSize {
        size.unwrap_or(default)
    }
}

impl Default for FontSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for FontSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}px", self.0)
    }
}

/// JavaScript truthiness, since preference values and message payloads
/// come from script code.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

/// Persisted popup preferences. Older popup builds wrote `cleanMode` and
/// `fontSize`; both are still accepted on read, and the current keys win
/// when storage holds both generations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredPreferences")]
pub struct UserPreferences {
    pub clean_mode_enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size_px: Option<FontSize>,
}

/// Preferences exactly as found in storage, every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredPreferences {
    clean_mode_enabled: Option<serde_json::Value>,
    font_size_px: Option<serde_json::Value>,
    clean_mode: Option<serde_json::Value>,
    font_size: Option<serde_json::Value>,
}

impl From<StoredPreferences> for UserPreferences {
    fn from(stored: StoredPreferences) -> Self {
        let enabled = stored.clean_mode_enabled.or(stored.clean_mode);
        let font = stored.font_size_px.or(stored.font_size);
        Self {
            clean_mode_enabled: enabled.as_ref().map(is_truthy).unwrap_or(false),
            font_size_px: font.as_ref().and_then(FontSize::from_json),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanState {
    Inactive,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Enable,
    Disable,
    UpdateFont(Option<FontSize>),
}

/// Wire shape of a popup message: `{ "action": "...", "value": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub action: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl TryFrom<InboundMessage> for Command {
    type Error = CleanerError;

    fn try_from(message: InboundMessage) -> Result<Self> {
        match message.action.as_str() {
            "toggleState" => Ok(if is_truthy(&message.value) {
                Command::Enable
            } else {
                Command::Disable
            }),
            "updateFont" => Ok(Command::UpdateFont(FontSize::from_json(&message.value))),
            other => Err(CleanerError::UnknownAction {
                action: other.to_string(),
            }),
        }
    }
}

impl From<Command> for InboundMessage {
    fn from(command: Command) -> Self {
        match command {
            Command::Enable => InboundMessage {
                action: "toggleState".to_string(),
                value: serde_json::Value::Bool(true),
            },
            Command::Disable => InboundMessage {
                action: "toggleState".to_string(),
                value: serde_json::Value::Bool(false),
            },
            Command::UpdateFont(size) => InboundMessage {
                action: "updateFont".to_string(),
                value: size
                    .map(|s| serde_json::Value::from(s.px()))
                    .unwrap_or(serde_json::Value::Null),
            },
        }
    }
}

impl Command {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let message: InboundMessage = serde_json::from_value(value)?;
        Command::try_from(message)
    }

    /// Applies the change the popup persists alongside sending this command.
    pub fn apply_to(&self, prefs: &mut UserPreferences) {
        match self {
            Command::Enable => prefs.clean_mode_enabled = true,
            Command::Disable => prefs.clean_mode_enabled = false,
            Command::UpdateFont(size) => prefs.font_size_px = *size,
        }
    }
}

/// Optional acknowledgement sent back on the command channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandAck {
    pub ok: bool,
    pub state: CleanState,
}

/// Which change categories a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChangeCategories {
    pub child_list: bool,
    pub subtree: bool,
    pub character_data: bool,
}

impl ChangeCategories {
    pub const LAYOUT: ChangeCategories = ChangeCategories {
        child_list: true,
        subtree: true,
        character_data: false,
    };

    pub const SCROLL: ChangeCategories = ChangeCategories {
        child_list: true,
        subtree: true,
        character_data: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RetryToken(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MutationKind {
    ChildList,
    CharacterData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    pub target: N,
    pub added_nodes: usize,
    pub removed_nodes: usize,
}

impl<N> MutationRecord<N> {
    pub fn grows_content(&self) -> bool {
        self.added_nodes > 0 || self.kind == MutationKind::CharacterData
    }
}

/// Everything one subscription observed since its previous delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationBatch<N> {
    pub subscription: SubscriptionId,
    pub records: Vec<MutationRecord<N>>,
}

impl<N> MutationBatch<N> {
    pub fn grows_content(&self) -> bool {
        self.records.iter().any(MutationRecord::grows_content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverRole {
    Layout,
    Scroll,
}

/// A live subscription owned by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverHandle<N> {
    pub id: SubscriptionId,
    pub role: ObserverRole,
    pub target: N,
    pub categories: ChangeCategories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The page was restored in-process; the script must run its startup check again.
    Restarted,
    /// The document is being replaced; nothing else should run.
    Navigating,
}
