//! Builtin theme tables
//!
//! Each builtin theme is a light or dark base palette plus an accent. Tables are built
//! once, on first access.

use once_cell::sync::Lazy;

use super::ids::{BuiltinId, ColorId, PropertyId};
use crate::background::legacy;
use crate::color::Argb;

/// Fully resolved colors and properties of one builtin theme
#[derive(Debug)]
pub struct BuiltinPalette {
    id: BuiltinId,
    colors: [Argb; ColorId::COUNT],
    properties: [f32; PropertyId::COUNT],
}

impl BuiltinPalette {
    pub fn id(&self) -> BuiltinId {
        self.id
    }

    pub fn color(&self, color: ColorId) -> Argb {
        self.colors[color.index()]
    }

    pub fn property(&self, property: PropertyId) -> f32 {
        self.properties[property.index()]
    }

    /// Legacy wallpaper id shown by default, `0` for none
    pub fn default_wallpaper_id(&self) -> i32 {
        default_wallpaper_id(self.id)
    }

    /// Background name of the default wallpaper
    pub fn default_wallpaper(&self) -> Option<&'static str> {
        legacy::background_for_legacy_wallpaper_id(self.default_wallpaper_id())
    }
}

static PALETTES: Lazy<Vec<BuiltinPalette>> = Lazy::new(|| {
    tracing::debug!("Building {} builtin theme tables", BuiltinId::ALL.len());
    BuiltinId::ALL.iter().map(|id| build(*id)).collect()
});

/// Table for a builtin theme
pub fn palette(id: BuiltinId) -> &'static BuiltinPalette {
    // ALL is ordered by raw id, starting at 1
    &PALETTES[id as usize - 1]
}

pub fn default_wallpaper_id(id: BuiltinId) -> i32 {
    match id {
        BuiltinId::BlackWhite | BuiltinId::NightBlack | BuiltinId::NightBlue => 0,
        BuiltinId::Blue | BuiltinId::Classic | BuiltinId::Cyan | BuiltinId::WhiteBlack => {
            legacy::ID_CATS_BLUE
        }
        BuiltinId::Green => legacy::ID_CATS_GREEN,
        BuiltinId::Pink => legacy::ID_CATS_PINK,
        BuiltinId::Red | BuiltinId::Orange => legacy::ID_CATS_BEIGE,
    }
}

fn build(id: BuiltinId) -> BuiltinPalette {
    let accent = accent(id);
    let colors = std::array::from_fn(|i| {
        let color = ColorId::ALL[i];
        accent_color(&accent, color).unwrap_or_else(|| {
            if id.is_dark() {
                dark_color(id, color)
            } else {
                light_color(id, color)
            }
        })
    });
    let properties = std::array::from_fn(|i| property_value(id, PropertyId::ALL[i]));
    BuiltinPalette {
        id,
        colors,
        properties,
    }
}

/// Accent-driven slots
struct Accent {
    primary: Argb,
    header: Argb,
    bubble_out: Argb,
    bubble_out_text: Argb,
}

fn accent(id: BuiltinId) -> Accent {
    let (primary, header, bubble_out) = match id {
        BuiltinId::Classic => (0xff4a_8ccf, 0xff51_7da2, 0xffef_fdde),
        BuiltinId::Blue => (0xff3e_94d4, 0xff3e_94d4, 0xffe3_f1fc),
        BuiltinId::Red => (0xffd9_5a4e, 0xffd9_5a4e, 0xfffc_e7e4),
        BuiltinId::Orange => (0xffeb_8a2f, 0xffeb_8a2f, 0xfffd_eedd),
        BuiltinId::Green => (0xff4f_ae4e, 0xff4f_ae4e, 0xffe4_f6e0),
        BuiltinId::Pink => (0xffe0_588a, 0xffe0_588a, 0xfffc_e4ee),
        BuiltinId::Cyan => (0xff3a_a7b7, 0xff3a_a7b7, 0xffdf_f4f6),
        BuiltinId::WhiteBlack => (0xff00_0000, 0xffff_ffff, 0xffee_eeee),
        BuiltinId::NightBlue => (0xff5f_a8e6, 0xff24_3447, 0xff2b_5278),
        BuiltinId::NightBlack => (0xff61_b0f0, 0xff1c_1c1c, 0xff2e_4a6b),
        BuiltinId::BlackWhite => (0xffff_ffff, 0xff00_0000, 0xff33_3333),
    };
    let bubble_out_text = if id.is_dark() { 0xffff_ffff } else { 0xff00_0000 };
    Accent {
        primary,
        header,
        bubble_out,
        bubble_out_text,
    }
}

fn accent_color(accent: &Accent, color: ColorId) -> Option<Argb> {
    use ColorId::*;
    Some(match color {
        TextLink | IconActive | Progress | Badge | TogglerActive | CheckActive
        | ChatSendButton => accent.primary,
        HeaderBackground => accent.header,
        BubbleOutBackground => accent.bubble_out,
        BubbleOutText => accent.bubble_out_text,
        _ => return None,
    })
}

fn light_color(id: BuiltinId, color: ColorId) -> Argb {
    use ColorId::*;
    let monochrome = id == BuiltinId::WhiteBlack;
    match color {
        Filling => 0xffff_ffff,
        FillingPressed => 0xfff2_f2f2,
        Background => 0xfff0_f0f0,
        BackgroundText => 0xff6d_6d72,
        BackgroundIcon => 0xff9e_9e9e,
        Separator => 0xffe6_e6e6,
        Text => 0xff00_0000,
        TextLight => 0xff8a_8a8a,
        TextLink | IconActive | Progress | Badge | TogglerActive | CheckActive
        | ChatSendButton => 0xff4a_8ccf,
        TextNeutral => 0xff4c_a553,
        TextNegative => 0xffe5_3935,
        TextSecure => 0xff3e_b549,
        Icon => 0xff8a_8a8a,
        IconLight => 0xffb8_b8b8,
        Placeholder => 0xffe8_e8e8,
        HeaderBackground => 0xff51_7da2,
        HeaderText | HeaderIcon => {
            if monochrome {
                0xff00_0000
            } else {
                0xffff_ffff
            }
        }
        HeaderSubtitle => {
            if monochrome {
                0xff70_7070
            } else {
                0xffd2_e3f1
            }
        }
        BadgeText => 0xffff_ffff,
        BadgeMuted => 0xffb9_b9b9,
        BadgeFailed => 0xffe5_3935,
        TogglerInactive => 0xffc7_c7c7,
        ChatBackground => 0xffdf_e6ec,
        BubbleInBackground => 0xffff_ffff,
        BubbleInText => 0xff00_0000,
        BubbleOutBackground => 0xffef_fdde,
        BubbleOutText => 0xff00_0000,
        BubbleOutline => 0x1a00_0000,
        Overlay => 0x4d00_0000,
        other => shared_color(other),
    }
}

fn dark_color(id: BuiltinId, color: ColorId) -> Argb {
    use ColorId::*;
    let (filling, background, chat) = match id {
        BuiltinId::NightBlue => (0xff1e_2c3a, 0xff17_212b, 0xff0e_1621),
        BuiltinId::BlackWhite => (0xff00_0000, 0xff0a_0a0a, 0xff00_0000),
        _ => (0xff1c_1c1c, 0xff00_0000, 0xff0a_0a0a),
    };
    match color {
        Filling | BubbleInBackground => filling,
        FillingPressed => 0xff2a_3a4c,
        Background => background,
        ChatBackground => chat,
        BackgroundText => 0xff8f_9aa4,
        BackgroundIcon => 0xff6c_7883,
        Separator => 0xff10_1921,
        Text | BubbleInText | BubbleOutText | HeaderText | HeaderIcon | BadgeText => 0xffff_ffff,
        TextLight | Icon => 0xff7d_8b99,
        TextLink | IconActive | Progress | Badge | TogglerActive | CheckActive
        | ChatSendButton => 0xff5f_a8e6,
        TextNeutral => 0xff6e_c56f,
        TextNegative => 0xffef_5350,
        TextSecure => 0xff5e_c56a,
        IconLight => 0xff4b_5967,
        Placeholder => 0xff2b_3947,
        HeaderBackground => 0xff24_3447,
        HeaderSubtitle => 0xff8f_9aa4,
        BadgeMuted => 0xff4b_5967,
        BadgeFailed => 0xffef_5350,
        TogglerInactive => 0xff4b_5967,
        BubbleOutBackground => 0xff2b_5278,
        BubbleOutline => 0x33ff_ffff,
        Overlay => 0x8c00_0000,
        other => shared_color(other),
    }
}

/// Slots with the same value in every theme
fn shared_color(color: ColorId) -> Argb {
    use ColorId::*;
    match color {
        WpCats => 0x3300_5e7a,
        WpCatsPink => 0x33a8_3f6a,
        WpCatsGreen => 0x334a_7a2c,
        WpCatsOrange => 0x33a8_6a1e,
        WpCatsBeige => 0x338a_6a3c,
        WpCirclesBlue => 0x3324_5f8f,
        ThemeClassic => 0xff51_7da2,
        ThemeBlue => 0xff3e_94d4,
        ThemeRed => 0xffd9_5a4e,
        ThemeOrange => 0xffeb_8a2f,
        ThemeGreen => 0xff4f_ae4e,
        ThemePink => 0xffe0_588a,
        ThemeCyan => 0xff3a_a7b7,
        ThemeNightBlue => 0xff24_3447,
        ThemeNightBlack => 0xff1c_1c1c,
        ThemeBlackWhite => 0xff00_0000,
        ThemeWhiteBlack => 0xffff_ffff,
        // Base palettes cover everything else
        _ => 0xffff_00ff,
    }
}

fn property_value(id: BuiltinId, property: PropertyId) -> f32 {
    use PropertyId::*;
    let dark = id.is_dark();
    let flag = |on: bool| if on { 1.0 } else { 0.0 };
    match property {
        ParentTheme => id as i32 as f32,
        BubbleCorner => 16.0,
        BubbleCornerMerged => 6.0,
        BubbleDateCorner => 13.0,
        DateCorner => 13.0,
        BubbleCornerLegacy => 6.0,
        BubbleOuterMargin => 8.0,
        ShadowDepth => {
            if dark {
                0.0
            } else {
                1.0
            }
        }
        SubtitleAlpha => 0.8,
        AvatarRadius => 0.5,
        AvatarRadiusForum => 0.25,
        AvatarRadiusChatList => -1.0,
        AvatarRadiusChatListForum => -1.0,
        BubbleOutlineSize => 0.0,
        ImageCorner => 6.0,
        WallpaperUsageId => flag(dark),
        WallpaperId => default_wallpaper_id(id) as f32,
        Dark => flag(dark),
        ReplaceShadowsWithSeparators => flag(dark),
        BubbleOutline => flag(id == BuiltinId::BlackWhite || id == BuiltinId::WhiteBlack),
        BubbleUnreadShadow => flag(!dark),
        LightStatusBar => flag(id == BuiltinId::WhiteBlack),
        WallpaperOverrideButton
        | WallpaperOverrideDate
        | WallpaperOverrideMediaReply
        | WallpaperOverrideOverlay
        | WallpaperOverrideTime
        | WallpaperOverrideUnread => 0.0,
    }
}
