use crate::domain::model::UserPreferences;
use crate::domain::ports::PreferenceStore;
use crate::utils::error::{CleanerError, Result};
use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared in-memory preferences. Clones see the same values, so a test can
/// play the popup while the script holds its own handle.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    prefs: Rc<RefCell<UserPreferences>>,
    loads: Rc<Cell<usize>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryPreferenceStore {
    pub fn new(prefs: UserPreferences) -> Self {
        Self {
            prefs: Rc::new(RefCell::new(prefs)),
            ..Self::default()
        }
    }

    pub fn current(&self) -> UserPreferences {
        self.prefs.borrow().clone()
    }

    pub fn replace(&self, prefs: UserPreferences) {
        *self.prefs.borrow_mut() = prefs;
    }

    pub fn load_count(&self) -> usize {
        self.loads.get()
    }

    /// Makes every later call fail, like storage in a torn-down extension context.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.get() {
            return Err(CleanerError::StorageError {
                message: "extension context invalidated".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> Result<UserPreferences> {
        self.check_available()?;
        self.loads.set(self.loads.get() + 1);
        Ok(self.current())
    }

    async fn save(&self, prefs: &UserPreferences) -> Result<()> {
        self.check_available()?;
        self.replace(prefs.clone());
        Ok(())
    }
}
