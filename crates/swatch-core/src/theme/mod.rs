//! Themes
//!
//! - `ids`: theme, color and property catalogs
//! - `builtin`: palettes shipped with the engine
//! - `delegate`: per-theme color/property resolution
//! - `registry`: id to delegate resolution, custom theme loading
//! - `manager`: the current theme, transitions and night mode

pub mod builtin;
pub mod delegate;
pub mod ids;
pub mod listener;
pub mod manager;
pub mod property;
pub mod registry;

pub use delegate::{
    BuiltinTheme, CustomTheme, FrozenTheme, InheritedTheme, TemporaryTheme, ThemeDelegate,
    ThemeHandle, ThemeRef, ThemeSnapshot, ThemeSource,
};
pub use ids::{
    BuiltinId, ColorId, PropertyId, ThemeId, DEFAULT_DARK_THEME, DEFAULT_LIGHT_THEME,
    DEFAULT_THEME,
};
pub use listener::{ColorBindings, ListenerList, Subscription, ThemeChangeListener};
pub use manager::{ThemeChange, ThemeManager};
pub use registry::ThemeSet;
