use crate::domain::model::{FontSize, DEFAULT_FONT_SIZE_PX};
use crate::utils::error::{CleanerError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const LAYOUT_STYLE_ID: &str = "clean-mode-style";
pub const FONT_STYLE_ID: &str = "clean-mode-font-style";
pub const MAX_FONT_SIZE_PX: u32 = 512;

/// Tunables for the page rewrite. Every field defaults to the captioning
/// page's known DOM shape, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CleanerConfig {
    pub selectors: SelectorConfig,
    pub styles: StyleConfig,
    pub font: FontConfig,
    pub scroll: ScrollConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Chrome removed on every pass, in order.
    pub suppress: Vec<String>,
    /// Scroll container candidates, first match wins.
    pub containers: Vec<String>,
    pub main_content: String,
    pub subtitle_region: String,
    pub scrollable: Vec<String>,
    pub caption_rows: Vec<String>,
    pub inline_strips: Vec<InlineStrip>,
}

/// An inline style property the host sets and which must be deleted, not overridden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineStrip {
    pub selector: String,
    pub property: String,
    /// Value forced by the stylesheet in case the host re-applies the inline style.
    pub fallback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub layout_id: String,
    pub font_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub default_px: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub max_pump_rounds: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            suppress: strings(&[".header", ".meeting-title", ".footer"]),
            containers: strings(&[
                ".subtitle-content",
                ".subtitle-wrapper",
                ".content-wrapper",
                ".page-content",
            ]),
            main_content: ".page-container.web .page-content".to_string(),
            subtitle_region: ".page-container.web .subtitle-content".to_string(),
            scrollable: strings(&[
                ".page-container.web .subtitle-content",
                ".subtitle-content",
                ".subtitle-wrapper",
                ".content-wrapper",
            ]),
            caption_rows: strings(&[".origin", ".translate"]),
            inline_strips: vec![
                InlineStrip {
                    selector: ".translate-box".to_string(),
                    property: "padding-bottom".to_string(),
                    fallback: "0".to_string(),
                },
                InlineStrip {
                    selector: ".translate".to_string(),
                    property: "height".to_string(),
                    fallback: "auto".to_string(),
                },
            ],
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            layout_id: LAYOUT_STYLE_ID.to_string(),
            font_id: FONT_STYLE_ID.to_string(),
        }
    }
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            default_px: DEFAULT_FONT_SIZE_PX,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 1000,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_pump_rounds: 64 }
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl CleanerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SUBTITLE_FONT_PX})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CleanerError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn default_font(&self) -> FontSize {
        FontSize::new(self.font.default_px).unwrap_or(FontSize::DEFAULT)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.scroll.retry_delay_ms)
    }

    pub fn validate_config(&self) -> Result<()> {
        let selectors = &self.selectors;
        validation::validate_non_empty_list("selectors.suppress", &selectors.suppress)?;
        validation::validate_non_empty_list("selectors.containers", &selectors.containers)?;
        validation::validate_non_empty_list("selectors.scrollable", &selectors.scrollable)?;
        validation::validate_non_empty_list("selectors.caption_rows", &selectors.caption_rows)?;
        validation::validate_non_empty_string("selectors.main_content", &selectors.main_content)?;
        validation::validate_non_empty_string(
            "selectors.subtitle_region",
            &selectors.subtitle_region,
        )?;

        for (index, strip) in selectors.inline_strips.iter().enumerate() {
            let field = format!("selectors.inline_strips[{}]", index);
            validation::validate_non_empty_string(&format!("{}.selector", field), &strip.selector)?;
            validation::validate_non_empty_string(&format!("{}.property", field), &strip.property)?;
            validation::validate_non_empty_string(&format!("{}.fallback", field), &strip.fallback)?;
        }

        validation::validate_non_empty_string("styles.layout_id", &self.styles.layout_id)?;
        validation::validate_non_empty_string("styles.font_id", &self.styles.font_id)?;
        validation::validate_distinct(
            "styles",
            &[self.styles.layout_id.as_str(), self.styles.font_id.as_str()],
        )?;

        validation::validate_range("font.default_px", self.font.default_px, 1, MAX_FONT_SIZE_PX)?;
        validation::validate_positive_number("scroll.retry_delay_ms", self.scroll.retry_delay_ms, 1)?;
        validation::validate_positive_number(
            "runtime.max_pump_rounds",
            self.runtime.max_pump_rounds as u64,
            1,
        )?;

        Ok(())
    }
}

impl Validate for CleanerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
