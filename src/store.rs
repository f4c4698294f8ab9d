//! Persistence for budget settings and the triage board.
//!
//! The engine itself never reads or writes state; callers inject a
//! [`StateStore`] and pass loaded values in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::budget::BudgetSettings;
use crate::workflow::WorkflowBoard;

const SETTINGS_FILE_NAME: &str = "settings.json";
const BOARD_FILE_NAME: &str = "board.json";

/// Errors that can occur while loading or saving state.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for state storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Load/save capability for caller-owned state.
pub trait StateStore {
    /// `None` when nothing has been saved yet.
    fn load_settings(&self) -> StoreResult<Option<BudgetSettings>>;
    fn save_settings(&self, settings: &BudgetSettings) -> StoreResult<()>;
    /// `None` when nothing has been saved yet.
    fn load_board(&self) -> StoreResult<Option<WorkflowBoard>>;
    fn save_board(&self, board: &WorkflowBoard) -> StoreResult<()>;
}

/// State kept as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    state_dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `state_dir`; the directory is created on first save.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Get the state directory path.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> StoreResult<Option<T>> {
        let path = self.state_dir.join(file_name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StoreError::Io(err)),
        }
    }

    fn write_json<T: Serialize>(&self, file_name: &str, value: &T) -> StoreResult<()> {
        fs::create_dir_all(&self.state_dir)?;
        let json = serde_json::to_string_pretty(value)?;
        let temp_path = self.state_dir.join(format!("{}.tmp", file_name));
        let path = self.state_dir.join(file_name);

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        debug!(path = %path.display(), "state saved");
        Ok(())
    }
}

impl StateStore for JsonFileStore {
    fn load_settings(&self) -> StoreResult<Option<BudgetSettings>> {
        self.read_json(SETTINGS_FILE_NAME)
    }

    fn save_settings(&self, settings: &BudgetSettings) -> StoreResult<()> {
        self.write_json(SETTINGS_FILE_NAME, settings)
    }

    fn load_board(&self) -> StoreResult<Option<WorkflowBoard>> {
        self.read_json(BOARD_FILE_NAME)
    }

    fn save_board(&self, board: &WorkflowBoard) -> StoreResult<()> {
        self.write_json(BOARD_FILE_NAME, board)
    }
}
