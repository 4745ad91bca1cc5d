//! Configuration loading and management
//!
//! Handles parsing of `lifeboard.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Config file name inside the data directory
pub const CONFIG_FILE: &str = "lifeboard.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Completed-task archiving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Completed tasks older than this many days leave the board
    #[serde(default = "default_hide_days")]
    pub hide_days: u32,
}

fn default_hide_days() -> u32 {
    7
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            hide_days: default_hide_days(),
        }
    }
}

/// Display window for calendar entries. Purely cosmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,

    #[serde(default = "default_end_hour")]
    pub end_hour: u32,

    #[serde(default = "default_event_minutes")]
    pub event_minutes: u32,
}

fn default_start_hour() -> u32 {
    8
}

fn default_end_hour() -> u32 {
    18
}

fn default_event_minutes() -> u32 {
    45
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            event_minutes: default_event_minutes(),
        }
    }
}

/// Dashboard windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Days after today covered by the upcoming list
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: u32,

    /// Days ahead that count as "due soon" on an area card
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: u32,

    /// Highlighted task titles per area card
    #[serde(default = "default_highlights")]
    pub highlights: usize,
}

fn default_upcoming_days() -> u32 {
    7
}

fn default_due_soon_days() -> u32 {
    3
}

fn default_highlights() -> usize {
    2
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            upcoming_days: default_upcoming_days(),
            due_soon_days: default_due_soon_days(),
            highlights: default_highlights(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Character budget for breadcrumbs
    #[serde(default = "default_breadcrumb_max_len")]
    pub breadcrumb_max_len: usize,
}

fn default_breadcrumb_max_len() -> usize {
    50
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            breadcrumb_max_len: default_breadcrumb_max_len(),
        }
    }
}

impl Config {
    /// Load configuration from a `lifeboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data directory, or return defaults
    pub fn load_from_dir(data_dir: &Path) -> Self {
        let config_path = data_dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.archive.hide_days < 1 {
            return Err(Error::InvalidConfig(
                "archive.hide_days must be at least 1".to_string(),
            ));
        }
        self.calendar.validate()?;
        if self.display.breadcrumb_max_len < 8 {
            return Err(Error::InvalidConfig(
                "display.breadcrumb_max_len must be at least 8".to_string(),
            ));
        }
        Ok(())
    }
}

impl CalendarConfig {
    fn validate(&self) -> Result<()> {
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(Error::InvalidConfig(format!(
                "calendar hours must satisfy start_hour < end_hour <= 24 (got {}..{})",
                self.start_hour, self.end_hour
            )));
        }
        if self.event_minutes == 0 {
            return Err(Error::InvalidConfig(
                "calendar.event_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Minutes in the display window.
    pub fn window_minutes(&self) -> u32 {
        (self.end_hour.saturating_sub(self.start_hour)) * 60
    }
}

/// Data directory: explicit override, else the platform data dir.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    directories::ProjectDirs::from("", "", "lifeboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            Error::InvalidArgument(
                "cannot determine a data directory; pass --data-dir or set LIFEBOARD_DIR"
                    .to_string(),
            )
        })
}
