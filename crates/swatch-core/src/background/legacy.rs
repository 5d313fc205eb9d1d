//! Legacy wallpaper ids
//!
//! Older persisted data references backgrounds by small integer ids. Each id maps to the
//! content name the backend knows the background by, except for the solid blue fill,
//! which is synthesized locally.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

use crate::color::{self, Argb};
use crate::storage::StoreBatch;
use crate::theme::{ColorId, ThemeRef};

use super::{BackgroundKind, BACKGROUND_TYPE_FILL, BACKGROUND_TYPE_WALLPAPER, FILL_TYPE_SOLID};

pub const ID_SOLID_BLUE: i32 = 1_000_000;
pub const ID_CATS_BLUE: i32 = 1_000_001;
pub const ID_CATS_PINK: i32 = 36;
pub const ID_CATS_GREEN: i32 = 35;
pub const ID_CATS_ORANGE: i32 = 33;
pub const ID_CATS_BEIGE: i32 = 32;
pub const ID_BLUE_CIRCLES: i32 = 114;
pub const ID_GRAY_FOREST: i32 = 104;
pub const ID_GALAXY: i32 = 10;
pub const ID_POLYGONS: i32 = 5;
pub const ID_PAINT: i32 = 11;
pub const ID_CITY: i32 = 107;
pub const ID_CITY_BW: i32 = 112;

pub const COLOR_SOLID_BLUE: Argb = 0xd6e4ef;

/// Legacy ids offered in pickers, in display order
pub const LEGACY_WALLPAPER_IDS: [i32; 28] = [
    ID_CATS_BLUE,
    ID_SOLID_BLUE,
    106,
    103,
    105,
    ID_CITY,
    109,
    111,
    110,
    ID_CITY_BW,
    ID_CATS_BEIGE,
    15,
    14,
    ID_POLYGONS,
    ID_PAINT,
    ID_CATS_ORANGE,
    16,
    12,
    ID_GALAXY,
    7,
    ID_BLUE_CIRCLES,
    4,
    19,
    1,
    17,
    6,
    ID_CATS_GREEN,
    ID_CATS_PINK,
];

/// Content name the backend serves a legacy wallpaper under
pub fn background_for_legacy_wallpaper_id(id: i32) -> Option<&'static str> {
    let name = match id {
        ID_GRAY_FOREST => "7F-AWfPJgVIBAAAA5NdzN7l5zWM",
        105 => "Qe9IiLLfiVIBAAAAn_BDUKSYaCs",
        13 => "vG0wx9kyiVIBAAAAkhlpL_sW9dg",
        21 => "SJTGO1MxgVIBAAAA-AChMYdDH58",
        2 => "YRZSyB-VgVIBAAAAsaNJPdNxxpM",
        106 => "8vCBxkOtEVEBAAAA5hiHfYHN_8A",
        103 => "VDfKfArxEFEBAAAAWkmjzkSYtK0",
        ID_CITY => "_18_b7s2GVEDAAAAxtY3yyRnLmk",
        ID_CATS_BLUE => "Z86jxWuHGVECAAAA9XUiUlLRgY0",
        109 => "ZFubnSx4GFEBAAAAJcREqDYeZc8",
        111 => "DNHJ7mmeGVEBAAAAeSmU7YZuDQI",
        110 => "gAAMuM3xEFEDAAAAChFy8V6dHCE",
        ID_CITY_BW => "m3N0O6nVGFEBAAAApdOEjJV8_WE",
        ID_CATS_BEIGE => "r9rsZJd4GVEBAAAAhO9TCoJvZuI",
        15 => "gvnMKHV4GVECAAAAUXErPvdsu_M",
        14 => "VWHGDTX6GVECAAAAY2jkcp5eC5g",
        ID_POLYGONS => "axDtyTPwEVECAAAARm9eM8a3QLI",
        ID_PAINT => "fUJ1tAoXEVEBAAAARV_-KCYufFw",
        ID_CATS_ORANGE => "4GxoHR-KEVEBAAAApJ2vw7X40ng",
        16 => "VDopCxj6EFEDAAAAsX0JZu28bgw",
        12 => "TFZYLbcDEVEBAAAAzrIWPPqFgRs",
        ID_GALAXY => "cfI-qxRrEVECAAAA_o1jhbsHa14",
        7 => "fm91uT9iEFEBAAAAY7IRPuCvJNs",
        ID_BLUE_CIRCLES => "d8H77nPOGFECAAAArdOApK8bYj4",
        4 => "6goyzlSsEVEDAAAAW-mw5A6C42Q",
        19 => "ENXuz6t_EFEEAAAASyyprFX01MI",
        1 => "zLuqruxGEVEBAAAAHmhS93uFDlI",
        17 => "RB5LhCkREFECAAAA5KTABa4Zrmc",
        6 => "051BDerTGFECAAAAvsFaINUzGrE",
        ID_CATS_GREEN => "RoIieAeGGFEBAAAATN-bGmJbmIo",
        ID_CATS_PINK => "7_Fl55MMGFECAAAAx_nwn_5oOZ8",
        _ => return None,
    };
    Some(name)
}

/// Inverse of [`background_for_legacy_wallpaper_id`] over the picker list
static NAME_TO_LEGACY_ID: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    let map: HashMap<_, _> = LEGACY_WALLPAPER_IDS
        .iter()
        .filter_map(|id| background_for_legacy_wallpaper_id(*id).map(|name| (name, *id)))
        .collect();
    debug!("Built legacy wallpaper index with {} names", map.len());
    map
});

/// Legacy id for a solid fill color, or 0
pub fn resolve_legacy_wallpaper_id_for_color(color: Argb) -> i32 {
    if color::rgb(color) == COLOR_SOLID_BLUE {
        ID_SOLID_BLUE
    } else {
        0
    }
}

/// Legacy id for a background name and kind, or 0. Names are only looked up for
/// wallpapers and untyped records.
pub fn resolve_legacy_wallpaper_id(name: &str, kind: Option<&BackgroundKind>) -> i32 {
    match kind {
        Some(BackgroundKind::Fill(fill)) => match fill {
            super::BackgroundFill::Solid(color) => resolve_legacy_wallpaper_id_for_color(*color),
            _ => 0,
        },
        Some(BackgroundKind::Pattern { .. })
        | Some(BackgroundKind::Empty)
        | Some(BackgroundKind::Custom { .. }) => 0,
        Some(BackgroundKind::Wallpaper { .. }) | None => {
            NAME_TO_LEGACY_ID.get(name).copied().unwrap_or(0)
        }
    }
}

pub fn is_cat_id(id: i32) -> bool {
    matches!(
        id,
        ID_CATS_BLUE | ID_CATS_PINK | ID_CATS_GREEN | ID_CATS_ORANGE | ID_CATS_BEIGE
    )
}

/// Preference of a legacy wallpaper as a default for dark or light themes
pub fn legacy_score(id: i32, is_dark: bool) -> i32 {
    if is_dark {
        match id {
            ID_GRAY_FOREST => 3,
            ID_CITY | ID_GALAXY => 2,
            ID_POLYGONS | ID_PAINT | ID_CITY_BW => 1,
            _ => 0,
        }
    } else {
        match id {
            ID_CATS_BLUE => 1,
            ID_BLUE_CIRCLES => -2,
            _ => 0,
        }
    }
}

/// Flat RGB color associated with a legacy wallpaper, or 0
pub fn legacy_wallpaper_color(id: i32) -> Argb {
    match id {
        19 | 109 => 0x403003,
        ID_SOLID_BLUE => COLOR_SOLID_BLUE,
        ID_CATS_BLUE | 103 => 0x0c3259,
        _ => 0,
    }
}

/// Overlay tint for a legacy wallpaper: a theme accent for the cat wallpapers, a 20%
/// tint of the flat legacy color otherwise
pub fn legacy_overlay_color(id: i32, theme: ThemeRef<'_>, default: Argb) -> Argb {
    let color = match id {
        ID_SOLID_BLUE | ID_CATS_BLUE => ColorId::WpCats,
        ID_BLUE_CIRCLES => ColorId::WpCirclesBlue,
        ID_CATS_PINK => ColorId::WpCatsPink,
        ID_CATS_GREEN => ColorId::WpCatsGreen,
        ID_CATS_ORANGE => ColorId::WpCatsOrange,
        ID_CATS_BEIGE => ColorId::WpCatsBeige,
        _ => {
            let legacy = legacy_wallpaper_color(id);
            return if color::rgb(legacy) != 0 {
                color::with_alpha(51, legacy)
            } else {
                default
            };
        }
    };
    theme.color(color)
}

/// Rewrite a record that only knew the legacy id into the typed background layout
pub fn migrate_legacy_wallpaper(
    batch: &mut StoreBatch,
    prefix: &str,
    id: i32,
    color: Argb,
    persistent_id: Option<&str>,
) {
    if let Some(name) = background_for_legacy_wallpaper_id(id) {
        batch.put_string(format!("{}_name", prefix), name);
        batch.put_int(format!("{}_type", prefix), BACKGROUND_TYPE_WALLPAPER);
        if let Some(remote_id) = persistent_id.filter(|s| !s.is_empty()) {
            batch.put_string(format!("{}_remote_id", prefix), remote_id);
        }
    } else if id == ID_SOLID_BLUE {
        batch.put_int(format!("{}_type", prefix), BACKGROUND_TYPE_FILL);
        batch.put_int(format!("{}_fill", prefix), FILL_TYPE_SOLID);
        batch.put_int(format!("{}_color", prefix), legacy_wallpaper_color(id) as i64);
    } else if id == -1 && color != 0 {
        batch.put_int(format!("{}_type", prefix), BACKGROUND_TYPE_FILL);
        batch.put_int(format!("{}_fill", prefix), FILL_TYPE_SOLID);
        batch.put_int(format!("{}_color", prefix), color as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::BackgroundFill;
    use crate::storage::BatchOp;

    #[test]
    fn test_legacy_ids_resolve_back() {
        for id in LEGACY_WALLPAPER_IDS {
            if let Some(name) = background_for_legacy_wallpaper_id(id) {
                assert_eq!(resolve_legacy_wallpaper_id(name, None), id, "{}", name);
            }
        }
        assert_eq!(background_for_legacy_wallpaper_id(ID_SOLID_BLUE), None);
    }

    #[test]
    fn test_names_outside_picker_list_do_not_resolve() {
        let name = background_for_legacy_wallpaper_id(ID_GRAY_FOREST).unwrap();
        assert_eq!(resolve_legacy_wallpaper_id(name, None), 0);
    }

    #[test]
    fn test_kind_gates_name_lookup() {
        let name = background_for_legacy_wallpaper_id(ID_CATS_BLUE).unwrap();
        let pattern = BackgroundKind::Pattern {
            fill: BackgroundFill::Solid(0xffffffff),
            intensity: 50,
            is_inverted: false,
            is_moving: false,
        };
        assert_eq!(resolve_legacy_wallpaper_id(name, Some(&pattern)), 0);
        let wallpaper = BackgroundKind::Wallpaper {
            is_blurred: true,
            is_moving: false,
        };
        assert_eq!(
            resolve_legacy_wallpaper_id(name, Some(&wallpaper)),
            ID_CATS_BLUE
        );
        let solid = BackgroundKind::Fill(BackgroundFill::Solid(0xffd6e4ef));
        assert_eq!(resolve_legacy_wallpaper_id("", Some(&solid)), ID_SOLID_BLUE);
    }

    #[test]
    fn test_scores_and_cats() {
        assert_eq!(legacy_score(ID_GRAY_FOREST, true), 3);
        assert_eq!(legacy_score(ID_GALAXY, true), 2);
        assert_eq!(legacy_score(ID_GALAXY, false), 0);
        assert_eq!(legacy_score(ID_BLUE_CIRCLES, false), -2);
        assert!(is_cat_id(ID_CATS_ORANGE));
        assert!(!is_cat_id(ID_SOLID_BLUE));
    }

    #[test]
    fn test_migrate_named_wallpaper() {
        let mut batch = StoreBatch::new();
        migrate_legacy_wallpaper(&mut batch, "wallpaper", ID_CITY, 0, Some("remote"));
        assert_eq!(batch.len(), 3);

        let mut batch = StoreBatch::new();
        migrate_legacy_wallpaper(&mut batch, "wallpaper_1", -1, 0xff112233, None);
        let color = batch.ops().iter().find_map(|op| match op {
            BatchOp::Put(key, value) if key == "wallpaper_1_color" => Some(value.clone()),
            _ => None,
        });
        assert_eq!(color, Some(crate::storage::StoreValue::Int(0xff112233)));

        let mut batch = StoreBatch::new();
        migrate_legacy_wallpaper(&mut batch, "wallpaper", -1, 0, None);
        assert!(batch.is_empty());
    }
}
