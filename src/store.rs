use crate::error::Result;
use crate::settings::{Prebills, Settings};
use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const PREBILLS_FILE: &str = "prebills.json";

/// Read/write-through persistence of the dashboard configuration. Nothing is
/// cached between calls.
pub trait SettingsStore {
    fn load_settings(&self) -> Result<Settings>;
    fn save_settings(&self, settings: &Settings) -> Result<()>;
    fn load_prebills(&self) -> Result<Prebills>;
    fn save_prebills(&self, prebills: &Prebills) -> Result<()>;
}

/// Stores settings and prebills as pretty-printed JSON files in one
/// directory.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    pub fn prebills_path(&self) -> PathBuf {
        self.dir.join(PREBILLS_FILE)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(path, json)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let mut settings: Settings = serde_json::from_str(&fs::read_to_string(&path)?)?;
        settings.refresh_hours_threshold();
        Ok(settings)
    }

    fn save_settings(&self, settings: &Settings) -> Result<()> {
        let mut settings = settings.clone();
        settings.refresh_hours_threshold();
        self.write_json(&self.settings_path(), &settings)
    }

    fn load_prebills(&self) -> Result<Prebills> {
        let path = self.prebills_path();
        if !path.exists() {
            return Ok(Prebills::default());
        }

        let content = fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Prebills::default());
        }
        match serde_json::from_str(&content) {
            Ok(prebills) => Ok(prebills),
            Err(e) => {
                warn!(
                    "Prebills file {} is corrupted ({}), starting from an empty matrix",
                    path.display(),
                    e
                );
                Ok(Prebills::default())
            }
        }
    }

    fn save_prebills(&self, prebills: &Prebills) -> Result<()> {
        self.write_json(&self.prebills_path(), prebills)
    }
}
