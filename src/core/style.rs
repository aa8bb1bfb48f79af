use crate::config::toml_config::{CleanerConfig, SelectorConfig};
use crate::core::stylesheet::render_font_css;
use crate::domain::model::FontSize;
use crate::domain::ports::PageDom;

/// Owns the dedicated font `<style>` element. Needs no subscriptions.
#[derive(Debug, Clone)]
pub struct StyleController {
    style_id: String,
    default_size: FontSize,
    selectors: SelectorConfig,
}

impl StyleController {
    pub fn new(config: &CleanerConfig) -> Self {
        Self {
            style_id: config.styles.font_id.clone(),
            default_size: config.default_font(),
            selectors: config.selectors.clone(),
        }
    }

    pub fn apply<H: PageDom>(&self, host: &mut H, size: Option<FontSize>) -> FontSize {
        let size = FontSize::resolve(size, self.default_size);
        tracing::info!("Applying font size: {}", size);
        host.upsert_style(&self.style_id, &render_font_css(&self.selectors, size));
        size
    }
}
