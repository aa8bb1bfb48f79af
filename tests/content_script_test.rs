mod common;

use common::{meeting_page, rerender_chrome};
use serde_json::json;
use subtitle_clean::domain::ports::{PageDom, PreferenceStore};
use subtitle_clean::{
    CleanState, CleanerConfig, CleanerError, Command, ContentScript, FilePreferenceStore,
    FontSize, MemoryPreferenceStore, UserPreferences,
};
use tempfile::TempDir;

fn script_with(
    prefs: UserPreferences,
) -> (
    ContentScript<subtitle_clean::MemoryPage, MemoryPreferenceStore>,
    MemoryPreferenceStore,
) {
    let popup = MemoryPreferenceStore::new(prefs);
    let script = ContentScript::new(meeting_page(), popup.clone(), &CleanerConfig::default());
    (script, popup)
}

/// Writes the preference and then messages the page, like the popup does.
async fn popup_send(
    script: &ContentScript<subtitle_clean::MemoryPage, MemoryPreferenceStore>,
    popup: &MemoryPreferenceStore,
    message: serde_json::Value,
) -> subtitle_clean::CommandAck {
    let command = Command::from_value(message.clone()).unwrap();
    let mut prefs = popup.current();
    command.apply_to(&mut prefs);
    popup.save(&prefs).await.unwrap();

    let ack = script.handle_message(message).await.unwrap();
    script.pump().unwrap();
    ack
}

#[tokio::test]
async fn test_toggle_round_trip_keeps_one_observer_per_role() {
    let (script, popup) = script_with(UserPreferences::default());
    script.boot().await.unwrap();
    assert_eq!(script.state(), CleanState::Inactive);
    assert_eq!(popup.load_count(), 1);

    let ack = popup_send(&script, &popup, json!({"action": "toggleState", "value": true})).await;
    assert!(ack.ok);
    assert_eq!(ack.state, CleanState::Active);
    // 開啟時重新讀取字級
    assert_eq!(popup.load_count(), 2);

    let ack = popup_send(&script, &popup, json!({"action": "toggleState", "value": false})).await;
    assert!(ack.ok);
    assert_eq!(ack.state, CleanState::Inactive);
    // 重新載入後再跑一次啟動檢查
    assert_eq!(popup.load_count(), 3);
    {
        let coordinator = script.coordinator();
        let page = coordinator.host();
        assert_eq!(page.reload_count(), 1);
        assert_eq!(page.active_subscriptions(), 0);
        assert!(page.query_selector(".header").is_some());
    }

    let ack = popup_send(&script, &popup, json!({"action": "toggleState", "value": true})).await;
    assert_eq!(ack.state, CleanState::Active);

    rerender_chrome(script.coordinator_mut().host_mut());
    script.pump().unwrap();

    let coordinator = script.coordinator();
    let page = coordinator.host();
    assert_eq!(page.active_subscriptions(), 2);
    assert_eq!(coordinator.slots().active_count(), 2);
    assert!(page.query_selector(".footer").is_none());
    assert_eq!(page.elements_with_id("clean-mode-style").len(), 1);
}

#[tokio::test]
async fn test_enable_twice_is_idempotent() {
    let (script, popup) = script_with(UserPreferences::default());
    script.boot().await.unwrap();

    popup_send(&script, &popup, json!({"action": "toggleState", "value": true})).await;
    let css = script.coordinator().host().style_text("clean-mode-style");
    popup_send(&script, &popup, json!({"action": "toggleState", "value": true})).await;

    let coordinator = script.coordinator();
    let page = coordinator.host();
    assert_eq!(page.style_text("clean-mode-style"), css);
    assert_eq!(page.elements_with_id("clean-mode-style").len(), 1);
    assert_eq!(page.elements_with_id("clean-mode-font-style").len(), 1);
    assert_eq!(page.active_subscriptions(), 2);
}

#[tokio::test]
async fn test_font_updates_follow_popup() {
    let (script, popup) = script_with(UserPreferences {
        clean_mode_enabled: true,
        font_size_px: FontSize::new(40),
    });
    script.boot().await.unwrap();
    let font_css = |script: &ContentScript<subtitle_clean::MemoryPage, MemoryPreferenceStore>| {
        script
            .coordinator()
            .host()
            .style_text("clean-mode-font-style")
            .unwrap()
    };
    assert!(font_css(&script).contains("font-size: 40px !important"));

    popup_send(&script, &popup, json!({"action": "updateFont", "value": 56})).await;
    assert!(font_css(&script).contains("font-size: 56px !important"));
    assert_eq!(popup.current().font_size_px, FontSize::new(56));

    popup_send(&script, &popup, json!({"action": "updateFont", "value": "28"})).await;
    assert!(font_css(&script).contains("font-size: 28px !important"));

    popup_send(&script, &popup, json!({"action": "updateFont", "value": 0})).await;
    assert!(font_css(&script).contains("font-size: 32px !important"));
    assert!(font_css(&script).contains("line-height: normal !important"));
}

#[tokio::test]
async fn test_font_update_while_inactive_is_not_shown() {
    let (script, popup) = script_with(UserPreferences::default());
    script.boot().await.unwrap();

    let ack = popup_send(&script, &popup, json!({"action": "updateFont", "value": 48})).await;
    assert!(ack.ok);
    assert_eq!(ack.state, CleanState::Inactive);
    assert!(script
        .coordinator()
        .host()
        .style_text("clean-mode-font-style")
        .is_none());

    // 開啟時套用已儲存的字級
    popup_send(&script, &popup, json!({"action": "toggleState", "value": true})).await;
    assert!(script
        .coordinator()
        .host()
        .style_text("clean-mode-font-style")
        .unwrap()
        .contains("font-size: 48px !important"));
}

#[tokio::test]
async fn test_unknown_action_is_acknowledged_but_ignored() {
    let (script, popup) = script_with(UserPreferences::default());
    script.boot().await.unwrap();

    let ack = script
        .handle_message(json!({"action": "selfDestruct", "value": true}))
        .await
        .unwrap();
    assert!(!ack.ok);
    assert_eq!(ack.state, CleanState::Inactive);
    assert!(script.coordinator().host().query_selector(".header").is_some());
    assert_eq!(popup.load_count(), 1);
}

#[tokio::test]
async fn test_storage_unavailable_is_reported() {
    let (script, popup) = script_with(UserPreferences {
        clean_mode_enabled: true,
        font_size_px: None,
    });
    popup.set_unavailable(true);

    let err = script.boot().await.unwrap_err();
    assert!(matches!(err, CleanerError::StorageError { .. }));
    assert_eq!(script.state(), CleanState::Inactive);
    assert!(script.coordinator().host().query_selector(".header").is_some());

    popup.set_unavailable(false);
    assert_eq!(script.boot().await.unwrap(), CleanState::Active);
}

#[tokio::test]
async fn test_legacy_preference_file_restores_clean_mode() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.json");
    std::fs::write(&path, r#"{ "cleanMode": true, "fontSize": "44" }"#).unwrap();

    let store = FilePreferenceStore::new(&path);
    let script = ContentScript::new(meeting_page(), store, &CleanerConfig::default());

    assert_eq!(script.boot().await.unwrap(), CleanState::Active);
    let coordinator = script.coordinator();
    assert_eq!(coordinator.applied_font(), FontSize::new(44));
    assert!(coordinator.host().query_selector(".footer").is_none());
}

#[tokio::test]
async fn test_mixed_key_preference_file_restores_clean_mode() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("prefs.json");
    std::fs::write(
        &path,
        r#"{ "cleanModeEnabled": true, "fontSizePx": 40, "cleanMode": true, "fontSize": "40" }"#,
    )
    .unwrap();

    let script = ContentScript::new(
        meeting_page(),
        FilePreferenceStore::new(&path),
        &CleanerConfig::default(),
    );

    assert_eq!(script.boot().await.unwrap(), CleanState::Active);
    let coordinator = script.coordinator();
    assert_eq!(coordinator.applied_font(), FontSize::new(40));
    assert!(coordinator.host().query_selector(".header").is_none());
}

#[tokio::test]
async fn test_custom_config_changes_suppressed_chrome() {
    let config = CleanerConfig::from_toml_str(
        r#"
[selectors]
suppress = [".footer"]

[font]
default_px = 24
"#,
    )
    .unwrap();
    let store = MemoryPreferenceStore::new(UserPreferences {
        clean_mode_enabled: true,
        font_size_px: None,
    });
    let script = ContentScript::new(meeting_page(), store, &config);
    script.boot().await.unwrap();

    let coordinator = script.coordinator();
    let page = coordinator.host();
    assert!(page.query_selector(".header").is_some());
    assert!(page.query_selector(".footer").is_none());
    assert!(page
        .style_text("clean-mode-font-style")
        .unwrap()
        .contains("font-size: 24px !important"));
}
