use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::{Result, StashmarkError};

/// Key-value capability for persisted boolean user choices.
pub trait PreferenceStore {
    /// Read the value stored under `key`, or `None` when never written.
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;
    /// Persist `value` under `key`.
    fn set_bool(&self, key: &str, value: bool) -> Result<()>;
}

/// Preferences kept in a flat TOML table on disk.
pub struct FilePreferenceStore {
    /// Location of the preferences file.
    pub(crate) path: PathBuf,
}

impl FilePreferenceStore {
    /// File name for preferences within a stashmark state directory.
    pub const FILE_NAME: &'static str = "preferences.toml";

    /// Create a store rooted at the provided state directory.
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(Self::FILE_NAME),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full table, treating a missing file as empty.
    fn load(&self) -> Result<BTreeMap<String, bool>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|err| self.error(err))?;
        toml::from_str(&contents).map_err(|err| self.error(err))
    }

    /// Wrap a failure with the file path.
    fn error(&self, err: impl ToString) -> StashmarkError {
        StashmarkError::Preferences {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.load()?.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.error(err))?;
        }
        let encoded = toml::to_string(&values).map_err(|err| self.error(err))?;
        fs::write(&self.path, encoded).map_err(|err| self.error(err))?;
        Ok(())
    }
}

/// Process-local store, used when nothing should touch disk.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    /// Stored values.
    values: Mutex<BTreeMap<String, bool>>,
}

impl MemoryPreferenceStore {
    /// Snapshot of the key/value pairs written so far.
    pub fn entries(&self) -> BTreeMap<String, bool> {
        self.values
            .lock()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let values = self
            .values
            .lock()
            .map_err(|_| StashmarkError::ContextError("preference store poisoned".to_string()))?;
        Ok(values.get(key).copied())
    }

    fn set_bool(&self, key: &str, value: bool) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| StashmarkError::ContextError("preference store poisoned".to_string()))?;
        values.insert(key.to_string(), value);
        Ok(())
    }
}
