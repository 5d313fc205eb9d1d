//! Theme property normalization
//!
//! Every property is a float whose meaning depends on the id. `normalize` is total over
//! the catalog and idempotent; NaN collapses to the lower bound.

use super::ids::{BuiltinId, PropertyId, ThemeId, DEFAULT_THEME};
use crate::error::ThemeResult;

fn ratio(value: f32) -> f32 {
    value.max(0.0).min(1.0)
}

fn non_negative(value: f32) -> f32 {
    value.max(0.0)
}

/// Clamp `value` into the valid range of `property`
pub fn normalize(property: PropertyId, value: f32) -> f32 {
    use PropertyId::*;
    match property {
        ParentTheme => restore_builtin_theme_id(value as i32).raw() as f32,

        BubbleCorner | BubbleCornerMerged | BubbleDateCorner | DateCorner => non_negative(value),
        BubbleCornerLegacy => non_negative(value).min(6.0),
        BubbleOuterMargin => non_negative(value).min(12.0),

        ShadowDepth | SubtitleAlpha | AvatarRadius | AvatarRadiusForum | BubbleUnreadShadow => {
            ratio(value)
        }
        AvatarRadiusChatList | AvatarRadiusChatListForum => {
            if value == -1.0 {
                value
            } else {
                ratio(value)
            }
        }

        BubbleOutlineSize | ImageCorner => non_negative(value),

        WallpaperUsageId => (value as i32).clamp(0, 2) as f32,
        WallpaperId => (value as i32) as f32,

        Dark
        | ReplaceShadowsWithSeparators
        | BubbleOutline
        | LightStatusBar
        | WallpaperOverrideButton
        | WallpaperOverrideDate
        | WallpaperOverrideMediaReply
        | WallpaperOverrideOverlay
        | WallpaperOverrideTime
        | WallpaperOverrideUnread => value.round().max(0.0).min(1.0),
    }
}

/// Normalize a value keyed by a raw (persisted) property id
pub fn normalize_raw(raw_property: i32, value: f32) -> ThemeResult<f32> {
    let property = PropertyId::parse_raw(raw_property).inspect_err(|e| {
        tracing::error!("{}", e);
    })?;
    Ok(normalize(property, value))
}

/// Properties that only hold 0 or 1
pub fn is_bool_property(property: PropertyId) -> bool {
    use PropertyId::*;
    matches!(
        property,
        Dark | ReplaceShadowsWithSeparators
            | BubbleOutline
            | LightStatusBar
            | WallpaperOverrideButton
            | WallpaperOverrideDate
            | WallpaperOverrideMediaReply
            | WallpaperOverrideOverlay
            | WallpaperOverrideTime
            | WallpaperOverrideUnread
    )
}

/// Properties that are never interpolated during a cross-fade
pub fn is_static_property(property: PropertyId) -> bool {
    matches!(property, PropertyId::WallpaperId | PropertyId::WallpaperUsageId)
}

/// Whether `value` is already in normalized form
pub fn is_valid_property(property: PropertyId, value: f32) -> bool {
    normalize(property, value) == value
}

/// Builtin theme for a stored id, or the default theme when it is not one
pub fn restore_builtin_theme_id(raw: i32) -> ThemeId {
    match BuiltinId::from_raw(raw) {
        Some(id) => id.theme_id(),
        None => DEFAULT_THEME.theme_id(),
    }
}
