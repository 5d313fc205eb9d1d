//! Engine configuration
//!
//! Loaded from `~/.swatch/config.toml`. Every field has a default, so a missing or
//! partial file is fine.

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::animation::{RECENT_RESUME_WINDOW, THEME_CHANGE_DURATION};
use crate::paths;
use crate::theme::{BuiltinId, ThemeId};

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub animation: AnimationConfig,
    pub themes: ThemesConfig,
    pub night: NightConfig,
    pub storage: StorageConfig,
}

/// Cross-fade timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Cross-fade duration in milliseconds
    pub duration_ms: u64,
    /// How long after coming to the foreground switches still animate
    pub recent_resume_ms: u64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: THEME_CHANGE_DURATION.as_millis() as u64,
            recent_resume_ms: RECENT_RESUME_WINDOW.as_millis() as u64,
        }
    }
}

impl AnimationConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn recent_resume_window(&self) -> Duration {
        Duration::from_millis(self.recent_resume_ms)
    }
}

/// Theme defaults and legacy aliases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemesConfig {
    pub default_dark: i32,
    pub default_light: i32,
    /// Legacy theme id -> target theme id
    pub aliases: BTreeMap<String, i32>,
}

impl Default for ThemesConfig {
    fn default() -> Self {
        Self {
            default_dark: BuiltinId::NightBlue as i32,
            default_light: BuiltinId::Classic as i32,
            aliases: BTreeMap::new(),
        }
    }
}

impl ThemesConfig {
    /// Parsed alias pairs; entries with non-numeric keys are skipped
    pub fn alias_pairs(&self) -> Vec<(ThemeId, ThemeId)> {
        self.aliases
            .iter()
            .filter_map(|(alias, target)| match alias.trim().parse::<i32>() {
                Ok(alias) => Some((ThemeId(alias), ThemeId(*target))),
                Err(_) => {
                    tracing::warn!("Ignoring theme alias with non-numeric id: {}", alias);
                    None
                }
            })
            .collect()
    }

    pub fn default_theme(&self, is_dark: bool) -> ThemeId {
        let raw = if is_dark {
            self.default_dark
        } else {
            self.default_light
        };
        match BuiltinId::from_raw(raw) {
            Some(id) if id.is_dark() == is_dark => id.theme_id(),
            _ => {
                tracing::warn!("Configured default theme {} is not usable, falling back", raw);
                if is_dark {
                    BuiltinId::NightBlue.theme_id()
                } else {
                    BuiltinId::Classic.theme_id()
                }
            }
        }
    }
}

/// Automatic day/night switching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NightMode {
    #[default]
    None,
    Auto,
    Scheduled,
}

impl NightMode {
    pub fn as_raw(self) -> i32 {
        match self {
            NightMode::None => 0,
            NightMode::Auto => 1,
            NightMode::Scheduled => 2,
        }
    }

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => NightMode::Auto,
            2 => NightMode::Scheduled,
            _ => NightMode::None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NightConfig {
    pub mode: NightMode,
    pub schedule: NightSchedule,
}

impl Default for NightConfig {
    fn default() -> Self {
        Self {
            mode: NightMode::None,
            schedule: NightSchedule::default(),
        }
    }
}

/// Night window in local time, `HH:MM`; may wrap past midnight
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NightSchedule {
    pub start: String,
    pub end: String,
}

impl Default for NightSchedule {
    fn default() -> Self {
        Self {
            start: "22:00".to_string(),
            end: "07:00".to_string(),
        }
    }
}

impl NightSchedule {
    /// Whether `time` falls inside the night window
    pub fn contains(&self, time: NaiveTime) -> bool {
        let (Some(start), Some(end)) = (parse_time(&self.start), parse_time(&self.end)) else {
            tracing::warn!(
                "Invalid night schedule {}..{}, treating as daytime",
                self.start,
                self.end
            );
            return false;
        };
        if start <= end {
            time >= start && time < end
        } else {
            time >= start || time < end
        }
    }
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Explicit database location; defaults to `~/.swatch/swatch.db`
    pub database: Option<PathBuf>,
}

impl StorageConfig {
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(paths::database_path)
    }
}

impl EngineConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from_path(&paths::config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: EngineConfig =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }
}
