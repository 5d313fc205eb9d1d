//! Engine constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// Theme switching
pub mod animation {
    use super::*;

    /// Cross-fade duration between two themes
    pub const THEME_CHANGE_DURATION: Duration = Duration::from_millis(200);

    /// Slowed-down cross-fade used when debugging transitions
    pub const DEBUG_THEME_CHANGE_DURATION: Duration = Duration::from_millis(1000);

    /// Window after coming to the foreground in which switches are still animated
    pub const RECENT_RESUME_WINDOW: Duration = Duration::from_millis(1000);
}

/// Persistence key layout
pub mod keys {
    /// Prefix for background records (`wallpaper[_<account>]<suffix>`)
    pub const WALLPAPER_PREFIX: &str = "wallpaper";

    /// Prefix for custom theme records (`custom_theme_<index>_...`)
    pub const CUSTOM_THEME_PREFIX: &str = "custom_theme";

    /// Ordered list of custom theme indices
    pub const CUSTOM_THEME_LIST: &str = "custom_themes";

    /// Next custom theme index to allocate
    pub const CUSTOM_THEME_NEXT_INDEX: &str = "custom_theme_next";

    /// Global night mode
    pub const NIGHT_MODE: &str = "night_mode";

    /// Prefix for per-account theme selection (`account_<id>_theme...`)
    pub const ACCOUNT_PREFIX: &str = "account";
}

/// Background image sizing hints
pub mod images {
    /// Preview size (dp) for locally picked wallpapers
    pub const LOCAL_PREVIEW_SIZE_DP: u32 = 105;

    /// Target size for blurred wallpapers
    pub const BLURRED_TARGET_SIZE: u32 = 160;

    /// Upper bound for sharp wallpaper targets
    pub const MAX_TARGET_SIZE: u32 = 1480;
}

/// Application directories
pub mod dirs {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".swatch";

    /// Log file name
    pub const LOG_FILE_NAME: &str = "swatch.log";

    /// Database file name
    pub const DATABASE_FILE_NAME: &str = "swatch.db";
}
