use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use std::time::Duration;
use subtitle_clean::adapters::memory::NodeFixture;
use subtitle_clean::core::coordinator::CoordinatorStats;
use subtitle_clean::domain::ports::{PageDom, PreferenceStore};
use subtitle_clean::utils::error::ErrorSeverity;
use subtitle_clean::utils::{logger, validation::Validate};
use subtitle_clean::{
    CleanState, CleanerConfig, CleanerError, CliConfig, Command, CommandAck, ContentScript,
    FilePreferenceStore, MemoryPage, PageFixture, Result,
};

#[derive(Debug, Serialize)]
struct ScrollPosition {
    top: u32,
    max: u32,
    pinned: bool,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    generated_at: DateTime<Utc>,
    state: CleanState,
    acks: Vec<CommandAck>,
    active_observers: usize,
    pending_retries: usize,
    reloads: usize,
    stats: CoordinatorStats,
    scroll: Option<ScrollPosition>,
    layout_css: Option<String>,
    font_css: Option<String>,
    outline: String,
}

type Script = ContentScript<MemoryPage, FilePreferenceStore>;

/// A fresh element matching a plain `.class` selector, as the page would re-render it.
fn rerendered_chrome(selector: &str) -> Option<NodeFixture> {
    let class = selector.trim().strip_prefix('.')?;
    if class.is_empty() || class.contains(|c: char| c == '.' || c == '#' || c.is_whitespace()) {
        return None;
    }
    Some(NodeFixture::with_class(class))
}

fn load_commands(path: &str) -> Result<Vec<serde_json::Value>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Mirrors the popup: persist the new preference first, then message the page.
async fn send_popup_message(script: &Script, message: serde_json::Value) -> Result<CommandAck> {
    if let Ok(command) = Command::from_value(message.clone()) {
        let mut prefs = script.store().load().await?;
        command.apply_to(&mut prefs);
        script.store().save(&prefs).await?;
    }
    script.handle_message(message).await
}

async fn simulate(config: &CliConfig) -> Result<SimulationReport> {
    let cleaner_config = match &config.config {
        Some(path) => CleanerConfig::from_file(path)?,
        None => CleanerConfig::default(),
    };
    cleaner_config.validate()?;

    let fixture = PageFixture::from_file(&config.page)?;
    let page = MemoryPage::from_fixture(&fixture);
    let store = FilePreferenceStore::new(&config.prefs);
    let script = ContentScript::new(page, store, &cleaner_config);
    let step = Duration::from_millis(config.advance_ms);

    let state = script.boot().await?;
    tracing::info!("Content script booted, clean mode {:?}", state);
    script.pump()?;

    let messages = match &config.commands {
        Some(path) => load_commands(path)?,
        None => Vec::new(),
    };

    let mut acks = Vec::with_capacity(messages.len());
    for message in messages {
        let ack = send_popup_message(&script, message).await?;
        tracing::info!("Ack: ok={}, state={:?}", ack.ok, ack.state);
        acks.push(ack);
        script.pump()?;
        script.advance(step)?;
    }

    let chrome: Vec<NodeFixture> = cleaner_config
        .selectors
        .suppress
        .iter()
        .filter_map(|selector| rerendered_chrome(selector))
        .collect();

    for round in 0..config.rerender_rounds {
        {
            let mut coordinator = script.coordinator_mut();
            let page = coordinator.host_mut();
            let Some(body) = page.body() else {
                break;
            };
            for fixture in &chrome {
                let node = page.create_from_fixture(fixture);
                page.append_child(body, node);
            }
        }
        let rounds = script.pump()?;
        tracing::debug!("Re-render {} settled after {} delivery rounds", round + 1, rounds);
        script.advance(step)?;
    }

    let coordinator = script.coordinator();
    let page = coordinator.host();
    let scroll = coordinator.slots().scroll_target().map(|node| ScrollPosition {
        top: page.scroll_top(*node),
        max: page.max_scroll_top(*node),
        pinned: page.is_scrolled_to_bottom(*node),
    });

    Ok(SimulationReport {
        generated_at: Utc::now(),
        state: coordinator.state(),
        acks,
        active_observers: page.active_subscriptions(),
        pending_retries: page.pending_retries(),
        reloads: page.reload_count(),
        stats: coordinator.stats(),
        scroll,
        layout_css: page.style_text(&cleaner_config.styles.layout_id),
        font_css: page.style_text(&cleaner_config.styles.font_id),
        outline: page.outline(),
    })
}

fn exit_code(e: &CleanerError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting subtitle-clean simulator");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match simulate(&config).await {
        Ok(report) => {
            tracing::info!(
                "✅ Simulation finished: {:?}, {} observers active",
                report.state,
                report.active_observers
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ Simulation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let code = exit_code(&e);
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}
