//! Swatch Core - Theme and chat background engine
//!
//! This crate provides:
//! - Builtin, custom and aliased themes resolved through one registry
//! - Cross-fading theme switches with night mode and per-account selection
//! - Color edit history for custom themes
//! - Chat backgrounds (fills, patterns, wallpapers) and their persistence
//! - SQLite and in-memory key-value storage

pub mod background;
pub mod color;
pub mod config;
pub mod constants;
pub mod error;
pub mod paths;
pub mod storage;
pub mod theme;

// Re-exports for convenience
pub use background::{Background, BackgroundFetcher, BackgroundFill, BackgroundKind};
pub use color::{Argb, ColorState, HsvChannel};
pub use config::{EngineConfig, NightMode};
pub use error::{BackgroundError, FetchError, ThemeError, ThemeResult};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use theme::{
    BuiltinId, ColorId, PropertyId, ThemeChange, ThemeChangeListener, ThemeId, ThemeManager,
    ThemeRef,
};
