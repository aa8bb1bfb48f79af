use crate::domain::model::UserPreferences;
use crate::domain::ports::PreferenceStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

/// Preferences kept in a JSON file, standing in for the extension's local storage.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait(?Send)]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> Result<UserPreferences> {
        if !self.path.exists() {
            tracing::debug!("No preference file at {}, using defaults", self.path.display());
            return Ok(UserPreferences::default());
        }
        let data = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&data)?)
    }

    async fn save(&self, prefs: &UserPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&self.path, serde_json::to_vec_pretty(prefs)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::FontSize;
    use crate::utils::error::CleanerError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_reads_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilePreferenceStore::new(temp_dir.path().join("prefs.json"));

        let prefs = store.load().await.unwrap();
        assert_eq!(prefs, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_save_creates_parent_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = FilePreferenceStore::new(temp_dir.path().join("nested/dir/prefs.json"));

        let prefs = UserPreferences {
            clean_mode_enabled: true,
            font_size_px: FontSize::new(42),
        };
        store.save(&prefs).await.unwrap();

        assert_eq!(store.load().await.unwrap(), prefs);
    }

    #[tokio::test]
    async fn test_reads_popup_written_legacy_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, r#"{"cleanMode": true, "fontSize": "38"}"#).unwrap();

        let prefs = FilePreferenceStore::new(&path).load().await.unwrap();
        assert!(prefs.clean_mode_enabled);
        assert_eq!(prefs.font_size_px, FontSize::new(38));
    }

    #[tokio::test]
    async fn test_mixed_key_file_prefers_current_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(
            &path,
            r#"{"cleanModeEnabled": true, "fontSizePx": 40, "cleanMode": true, "fontSize": "40"}"#,
        )
        .unwrap();

        let store = FilePreferenceStore::new(&path);
        let prefs = store.load().await.unwrap();
        assert!(prefs.clean_mode_enabled);
        assert_eq!(prefs.font_size_px, FontSize::new(40));

        // 儲存後只留下新鍵
        store.save(&prefs).await.unwrap();
        let saved: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(saved, serde_json::json!({"cleanModeEnabled": true, "fontSizePx": 40}));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();

        let err = FilePreferenceStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, CleanerError::SerializationError(_)));
    }
}
