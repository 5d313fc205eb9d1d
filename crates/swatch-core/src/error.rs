//! Engine error types

use thiserror::Error;

/// Errors raised by theme resolution and persistence
#[derive(Debug, Error)]
pub enum ThemeError {
    /// Raw color id outside the color catalog
    #[error("unknown color id: {0}")]
    UnknownColorId(String),

    /// Raw property id outside the property catalog
    #[error("invalid property id: {0}")]
    InvalidPropertyId(String),

    /// Theme id that can never resolve (none, temporary, or unregistered)
    #[error("unknown theme id: {0}")]
    UnknownThemeId(i32),

    /// Custom theme that is no longer present in the store
    #[error("custom theme not found: {0}")]
    CustomThemeNotFound(i32),

    /// Negative custom theme index passed to id serialization
    #[error("invalid custom theme index: {0}")]
    InvalidCustomThemeIndex(i32),

    /// Operation that only applies to custom themes
    #[error("theme {0} is not a custom theme")]
    NotCustom(i32),

    /// Background slot failure
    #[error(transparent)]
    Background(#[from] BackgroundError),

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl ThemeError {
    /// Whether the error indicates a missing case in a closed catalog rather than bad data
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            ThemeError::UnknownColorId(_)
                | ThemeError::InvalidPropertyId(_)
                | ThemeError::InvalidCustomThemeIndex(_)
        )
    }
}

pub type ThemeResult<T> = std::result::Result<T, ThemeError>;

/// Errors raised while storing or restoring backgrounds
#[derive(Debug, Error)]
pub enum BackgroundError {
    /// Persisted background type tag outside the known kinds
    #[error("unknown background type: {0}")]
    UnknownType(i64),

    /// Persisted fill tag outside the known fills
    #[error("unknown background fill: {0}")]
    UnknownFill(i64),

    /// Pattern intensity is stored as a magnitude plus an inverted flag
    #[error("pattern intensity must not be negative: {0}")]
    NegativeIntensity(i32),

    /// Store failure
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type BackgroundResult<T> = std::result::Result<T, BackgroundError>;

/// Failures reported by a background fetcher
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The backend does not know the requested content
    #[error("background not found: {0}")]
    NotFound(String),

    /// The content exists but has no downloadable file
    #[error("{0}")]
    Inaccessible(String),

    /// The background has no remote content at all
    #[error("background is not remote")]
    NotRemote,

    /// Transport or backend failure
    #[error("backend error: {0}")]
    Backend(String),
}
