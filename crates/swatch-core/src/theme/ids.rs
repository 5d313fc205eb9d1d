//! Identifier catalogs: themes, colors, and properties
//!
//! Colors and properties are closed enums. Raw integers and persisted names only enter
//! through `from_raw`/`from_name`, which is where unknown ids are rejected.

use std::fmt;

use crate::error::{ThemeError, ThemeResult};

macro_rules! catalog {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $key:literal,)* }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];
            pub const COUNT: usize = $name::ALL.len();

            /// Stable name used in persisted keys
            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $key,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($key => Some($name::$variant),)*
                    _ => None,
                }
            }

            pub fn from_raw(raw: i32) -> Option<Self> {
                usize::try_from(raw).ok().and_then(|index| $name::ALL.get(index).copied())
            }

            /// Position in per-theme tables
            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

catalog! {
    /// Color slots every builtin theme defines
    ColorId {
        Filling => "filling",
        FillingPressed => "fillingPressed",
        Background => "background",
        BackgroundText => "background_text",
        BackgroundIcon => "background_icon",
        Separator => "separator",
        Text => "text",
        TextLight => "textLight",
        TextLink => "textLink",
        TextNeutral => "textNeutral",
        TextNegative => "textNegative",
        TextSecure => "textSecure",
        Icon => "icon",
        IconActive => "iconActive",
        IconLight => "iconLight",
        Progress => "progress",
        Placeholder => "placeholder",
        HeaderBackground => "headerBackground",
        HeaderText => "headerText",
        HeaderIcon => "headerIcon",
        HeaderSubtitle => "headerSubtitle",
        Badge => "badge",
        BadgeText => "badgeText",
        BadgeMuted => "badgeMuted",
        BadgeFailed => "badgeFailed",
        TogglerActive => "togglerActive",
        TogglerInactive => "togglerInactive",
        CheckActive => "checkActive",
        ChatSendButton => "chatSendButton",
        ChatBackground => "chatBackground",
        BubbleInBackground => "bubbleIn_background",
        BubbleInText => "bubbleIn_text",
        BubbleOutBackground => "bubbleOut_background",
        BubbleOutText => "bubbleOut_text",
        BubbleOutline => "bubble_outline",
        Overlay => "overlay",
        WpCats => "wp_cats",
        WpCatsPink => "wp_catsPink",
        WpCatsGreen => "wp_catsGreen",
        WpCatsOrange => "wp_catsOrange",
        WpCatsBeige => "wp_catsBeige",
        WpCirclesBlue => "wp_circlesBlue",
        ThemeClassic => "themeClassic",
        ThemeBlue => "themeBlue",
        ThemeRed => "themeRed",
        ThemeOrange => "themeOrange",
        ThemeGreen => "themeGreen",
        ThemePink => "themePink",
        ThemeCyan => "themeCyan",
        ThemeNightBlue => "themeNightBlue",
        ThemeNightBlack => "themeNightBlack",
        ThemeBlackWhite => "themeBlackWhite",
        ThemeWhiteBlack => "themeWhiteBlack",
    }
}

catalog! {
    /// Numeric theme properties
    PropertyId {
        ParentTheme => "parentTheme",
        BubbleCorner => "bubbleCorner",
        BubbleCornerMerged => "bubbleCornerMerged",
        BubbleDateCorner => "bubbleDateCorner",
        DateCorner => "dateCorner",
        BubbleCornerLegacy => "bubbleCornerLegacy",
        BubbleOuterMargin => "bubbleOuterMargin",
        ShadowDepth => "shadowDepth",
        SubtitleAlpha => "subtitleAlpha",
        AvatarRadius => "avatarRadius",
        AvatarRadiusForum => "avatarRadiusForum",
        AvatarRadiusChatList => "avatarRadiusChatList",
        AvatarRadiusChatListForum => "avatarRadiusChatListForum",
        BubbleOutlineSize => "bubbleOutlineSize",
        ImageCorner => "imageCorner",
        WallpaperUsageId => "wallpaperUsageId",
        WallpaperId => "wallpaperId",
        Dark => "dark",
        ReplaceShadowsWithSeparators => "replaceShadowsWithSeparators",
        BubbleOutline => "bubbleOutline",
        BubbleUnreadShadow => "bubbleUnreadShadow",
        LightStatusBar => "lightStatusBar",
        WallpaperOverrideButton => "wallpaperOverrideButton",
        WallpaperOverrideDate => "wallpaperOverrideDate",
        WallpaperOverrideMediaReply => "wallpaperOverrideMediaReply",
        WallpaperOverrideOverlay => "wallpaperOverrideOverlay",
        WallpaperOverrideTime => "wallpaperOverrideTime",
        WallpaperOverrideUnread => "wallpaperOverrideUnread",
    }
}

impl ColorId {
    pub fn parse_raw(raw: i32) -> ThemeResult<Self> {
        Self::from_raw(raw).ok_or_else(|| ThemeError::UnknownColorId(raw.to_string()))
    }

    pub fn parse_name(name: &str) -> ThemeResult<Self> {
        Self::from_name(name).ok_or_else(|| ThemeError::UnknownColorId(name.to_string()))
    }
}

impl PropertyId {
    pub fn parse_raw(raw: i32) -> ThemeResult<Self> {
        Self::from_raw(raw).ok_or_else(|| ThemeError::InvalidPropertyId(raw.to_string()))
    }

    pub fn parse_name(name: &str) -> ThemeResult<Self> {
        Self::from_name(name).ok_or_else(|| ThemeError::InvalidPropertyId(name.to_string()))
    }
}

/// Theme identifier
///
/// Positive ids are builtin themes, `0` is none, `-1` is the in-transition theme and
/// `-2` and below are custom themes (`index = CUSTOM - id`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThemeId(pub i32);

impl ThemeId {
    pub const NONE: ThemeId = ThemeId(0);
    pub const TEMPORARY: ThemeId = ThemeId(-1);
    pub const CUSTOM: ThemeId = ThemeId(-2);

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn builtin(self) -> Option<BuiltinId> {
        BuiltinId::from_raw(self.0)
    }

    pub fn is_builtin(self) -> bool {
        self.builtin().is_some()
    }

    /// Custom theme index, or `None` for builtin/special ids
    pub fn custom_index(self) -> Option<i32> {
        if self.0 <= Self::CUSTOM.0 {
            match Self::CUSTOM.0 - self.0 {
                0 => None,
                index => Some(index),
            }
        } else {
            None
        }
    }

    pub fn is_custom(self) -> bool {
        self.custom_index().is_some()
    }

    /// Theme id for a custom theme index
    pub fn from_custom_index(index: i32) -> ThemeResult<Self> {
        if index < 0 {
            return Err(ThemeError::InvalidCustomThemeIndex(index));
        }
        Ok(ThemeId(Self::CUSTOM.0 - index))
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.builtin() {
            Some(builtin) => write!(f, "{} ({})", builtin.key(), self.0),
            None => match self.custom_index() {
                Some(index) => write!(f, "custom #{} ({})", index, self.0),
                None => write!(f, "{}", self.0),
            },
        }
    }
}

impl From<BuiltinId> for ThemeId {
    fn from(id: BuiltinId) -> Self {
        id.theme_id()
    }
}

/// Builtin themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinId {
    Blue = 1,
    BlackWhite = 2,
    WhiteBlack = 3,
    Red = 4,
    Orange = 5,
    Green = 6,
    Pink = 7,
    Cyan = 8,
    NightBlack = 9,
    NightBlue = 10,
    Classic = 11,
}

impl BuiltinId {
    pub const ALL: &'static [BuiltinId] = &[
        BuiltinId::Blue,
        BuiltinId::BlackWhite,
        BuiltinId::WhiteBlack,
        BuiltinId::Red,
        BuiltinId::Orange,
        BuiltinId::Green,
        BuiltinId::Pink,
        BuiltinId::Cyan,
        BuiltinId::NightBlack,
        BuiltinId::NightBlue,
        BuiltinId::Classic,
    ];

    /// Themes offered as accent variations of the classic look
    pub const ACCENTS: &'static [BuiltinId] = &[
        BuiltinId::Blue,
        BuiltinId::Red,
        BuiltinId::Orange,
        BuiltinId::Green,
        BuiltinId::Pink,
        BuiltinId::Cyan,
    ];

    /// Picker order; the monochrome themes are only listed in extended mode
    pub fn listed(extended: bool) -> Vec<BuiltinId> {
        let mut themes = vec![
            BuiltinId::Classic,
            BuiltinId::Blue,
            BuiltinId::Red,
            BuiltinId::Orange,
            BuiltinId::Green,
            BuiltinId::Pink,
            BuiltinId::Cyan,
            BuiltinId::NightBlue,
            BuiltinId::NightBlack,
        ];
        if extended {
            themes.push(BuiltinId::BlackWhite);
            themes.push(BuiltinId::WhiteBlack);
        }
        themes
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| *id as i32 == raw)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.key() == key)
    }

    pub fn theme_id(self) -> ThemeId {
        ThemeId(self as i32)
    }

    pub fn is_dark(self) -> bool {
        matches!(
            self,
            BuiltinId::BlackWhite | BuiltinId::NightBlack | BuiltinId::NightBlue
        )
    }

    pub fn is_accent(self) -> bool {
        Self::ACCENTS.contains(&self)
    }

    pub fn key(self) -> &'static str {
        match self {
            BuiltinId::Blue => "blue",
            BuiltinId::BlackWhite => "black_white",
            BuiltinId::WhiteBlack => "white_black",
            BuiltinId::Red => "red",
            BuiltinId::Orange => "orange",
            BuiltinId::Green => "green",
            BuiltinId::Pink => "pink",
            BuiltinId::Cyan => "cyan",
            BuiltinId::NightBlack => "night_black",
            BuiltinId::NightBlue => "night_blue",
            BuiltinId::Classic => "classic",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BuiltinId::Blue => "Blue",
            BuiltinId::BlackWhite => "Black & White",
            BuiltinId::WhiteBlack => "White & Black",
            BuiltinId::Red => "Red",
            BuiltinId::Orange => "Orange",
            BuiltinId::Green => "Green",
            BuiltinId::Pink => "Pink",
            BuiltinId::Cyan => "Cyan",
            BuiltinId::NightBlack => "Night",
            BuiltinId::NightBlue => "Night Blue",
            BuiltinId::Classic => "Classic",
        }
    }

    /// Swatch color shown for this theme in pickers
    pub fn circle_color_id(self) -> ColorId {
        match self {
            BuiltinId::Blue => ColorId::ThemeBlue,
            BuiltinId::BlackWhite => ColorId::ThemeBlackWhite,
            BuiltinId::WhiteBlack => ColorId::ThemeWhiteBlack,
            BuiltinId::Red => ColorId::ThemeRed,
            BuiltinId::Orange => ColorId::ThemeOrange,
            BuiltinId::Green => ColorId::ThemeGreen,
            BuiltinId::Pink => ColorId::ThemePink,
            BuiltinId::Cyan => ColorId::ThemeCyan,
            BuiltinId::NightBlack => ColorId::ThemeNightBlack,
            BuiltinId::NightBlue => ColorId::ThemeNightBlue,
            BuiltinId::Classic => ColorId::ThemeClassic,
        }
    }
}

pub const DEFAULT_DARK_THEME: BuiltinId = BuiltinId::NightBlue;
pub const DEFAULT_LIGHT_THEME: BuiltinId = BuiltinId::Classic;
pub const DEFAULT_THEME: BuiltinId = DEFAULT_DARK_THEME;
