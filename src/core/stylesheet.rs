use crate::config::toml_config::{CleanerConfig, SelectorConfig};
use crate::domain::model::FontSize;

/// What clean mode wants the page to look like: the chrome to delete and
/// the override sheet that backs the deletion up.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredLayoutState {
    suppress: Vec<String>,
    stylesheet: String,
}

impl DesiredLayoutState {
    pub fn from_config(config: &CleanerConfig) -> Self {
        Self {
            suppress: config.selectors.suppress.clone(),
            stylesheet: render_layout_css(&config.selectors),
        }
    }

    pub fn suppress(&self) -> &[String] {
        &self.suppress
    }

    pub fn stylesheet(&self) -> &str {
        &self.stylesheet
    }
}

pub fn render_layout_css(selectors: &SelectorConfig) -> String {
    let mut css = String::new();

    css.push_str(&format!(
        "{} {{\n    padding: 0 !important;\n    height: 100% !important;\n    max-width: none !important;\n}}\n",
        selectors.main_content
    ));

    // 以 CSS 再隱藏一次，避免移除與重新插入之間的空窗
    css.push_str(&format!(
        "{} {{\n    display: none !important;\n    visibility: hidden !important;\n    height: 0 !important;\n    overflow: hidden !important;\n}}\n",
        selectors.suppress.join(", ")
    ));

    css.push_str(&format!(
        "{} {{\n    overflow-y: auto !important;\n    max-height: 100vh !important;\n    scroll-behavior: smooth !important;\n}}\n",
        selectors.scrollable.join(",\n")
    ));

    for strip in &selectors.inline_strips {
        css.push_str(&format!(
            "{} {{\n    {}: {} !important;\n}}\n",
            strip.selector, strip.property, strip.fallback
        ));
    }

    css
}

pub fn render_font_css(selectors: &SelectorConfig, size: FontSize) -> String {
    format!(
        "{} {{\n    font-size: {}px !important;\n}}\n{} {{\n    line-height: normal !important;\n}}\n",
        selectors.subtitle_region,
        size.px(),
        selectors.caption_rows.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_css_covers_every_rule_group() {
        let config = CleanerConfig::default();
        let css = render_layout_css(&config.selectors);

        assert!(css.starts_with(".page-container.web .page-content {"));
        assert!(css.contains(".header, .meeting-title, .footer {\n    display: none !important;"));
        assert!(css.contains(".subtitle-wrapper,\n.content-wrapper {\n    overflow-y: auto !important;"));
        assert!(css.contains(".translate-box {\n    padding-bottom: 0 !important;\n}"));
        assert!(css.contains(".translate {\n    height: auto !important;\n}"));
    }

    #[test]
    fn test_font_css_uses_size() {
        let config = CleanerConfig::default();
        let css = render_font_css(&config.selectors, FontSize::new(40).unwrap());

        assert!(css.contains(".page-container.web .subtitle-content {\n    font-size: 40px !important;"));
        assert!(css.contains(".origin, .translate {\n    line-height: normal !important;"));
    }

    #[test]
    fn test_desired_state_is_stable() {
        let config = CleanerConfig::default();
        let first = DesiredLayoutState::from_config(&config);
        let second = DesiredLayoutState::from_config(&config);

        assert_eq!(first, second);
        assert_eq!(first.suppress(), config.selectors.suppress.as_slice());
    }
}
