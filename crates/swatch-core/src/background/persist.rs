//! Background persistence
//!
//! One background per account and usage slot, stored as flat keys under
//! `wallpaper[_<account>]<suffix>`, where slot 0 has no suffix, slot 1 is `_dark` and
//! any other slot is `_other<slot>`. Every write sets the fields of the current kind
//! and removes the fields that belong to the other kinds, so a slot never mixes two.

use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::constants::keys::WALLPAPER_PREFIX;
use crate::error::{BackgroundError, BackgroundResult};
use crate::storage::{KeyValueStore, StoreBatch};

use super::{
    legacy, Background, BackgroundFill, BackgroundKind, BACKGROUND_TYPE_FILL,
    BACKGROUND_TYPE_PATTERN, BACKGROUND_TYPE_WALLPAPER, FILL_TYPE_FREEFORM, FILL_TYPE_GRADIENT,
    FILL_TYPE_SOLID,
};

/// Every field suffix a slot may hold
const FIELDS: &[&str] = &[
    "_remote_id",
    "_empty",
    "_custom",
    "_path",
    "_name",
    "_vector",
    "_type",
    "_fill",
    "_color",
    "_color_top",
    "_color_bottom",
    "_colors",
    "_rotation_angle",
    "_intensity",
    "_inverted",
    "_moving",
    "_blurred",
];

/// Key suffix of a usage slot
fn slot_suffix(usage: i32) -> String {
    match usage {
        0 => String::new(),
        1 => "_dark".to_string(),
        other => format!("_other{}", other),
    }
}

/// Key prefix of a slot: `wallpaper` or `wallpaper_<account>`, then the slot suffix
pub fn slot_prefix(account_id: i32, usage: i32) -> String {
    let mut key = if account_id != 0 {
        format!("{}_{}", WALLPAPER_PREFIX, account_id)
    } else {
        WALLPAPER_PREFIX.to_string()
    };
    key.push_str(&slot_suffix(usage));
    key
}

fn field(prefix: &str, suffix: &str) -> String {
    format!("{}{}", prefix, suffix)
}

fn stage_fill(batch: &mut StoreBatch, key: &str, fill: &BackgroundFill) {
    batch.put_int(field(key, "_fill"), fill.tag());
    match fill {
        BackgroundFill::Solid(color) => {
            batch
                .put_int(field(key, "_color"), *color as i64)
                .remove(field(key, "_color_top"))
                .remove(field(key, "_color_bottom"))
                .remove(field(key, "_colors"))
                .remove(field(key, "_rotation_angle"));
        }
        BackgroundFill::Gradient {
            top,
            bottom,
            rotation,
        } => {
            batch
                .put_int(field(key, "_color_top"), *top as i64)
                .put_int(field(key, "_color_bottom"), *bottom as i64)
                .put_int(field(key, "_rotation_angle"), *rotation as i64)
                .remove(field(key, "_color"))
                .remove(field(key, "_colors"));
        }
        BackgroundFill::Freeform(colors) => {
            batch
                .put_int_array(
                    field(key, "_colors"),
                    colors.iter().map(|c| *c as i64).collect(),
                )
                .remove(field(key, "_color"))
                .remove(field(key, "_color_top"))
                .remove(field(key, "_color_bottom"))
                .remove(field(key, "_rotation_angle"));
        }
    }
}

/// Stage the writes that store `background` in `usage`
pub fn stage(
    batch: &mut StoreBatch,
    background: &Background,
    usage: i32,
) -> BackgroundResult<()> {
    let key = slot_prefix(background.account_id(), usage);

    match background.legacy_remote_id() {
        Some(remote_id) => batch.put_string(field(&key, "_remote_id"), remote_id),
        None => batch.remove(field(&key, "_remote_id")),
    };
    if background.is_empty() {
        batch.put_bool(field(&key, "_empty"), true);
    } else {
        batch.remove(field(&key, "_empty"));
    }
    match background.custom_path() {
        Some(path) => {
            batch
                .put_bool(field(&key, "_custom"), true)
                .put_string(field(&key, "_path"), path.to_string_lossy());
        }
        None => {
            batch.remove(field(&key, "_custom")).remove(field(&key, "_path"));
        }
    }
    let synthesized = matches!(background.kind(), BackgroundKind::Fill(fill) if fill.name() == background.name());
    if !background.name().is_empty() && !synthesized {
        batch.put_string(field(&key, "_name"), background.name());
    } else {
        batch.remove(field(&key, "_name"));
    }
    if background.is_vector() {
        batch.put_bool(field(&key, "_vector"), true);
    } else {
        batch.remove(field(&key, "_vector"));
    }

    match background.kind() {
        BackgroundKind::Fill(fill) => {
            batch
                .put_int(field(&key, "_type"), BACKGROUND_TYPE_FILL)
                .remove(field(&key, "_intensity"))
                .remove(field(&key, "_moving"))
                .remove(field(&key, "_blurred"))
                .remove(field(&key, "_inverted"));
            stage_fill(batch, &key, fill);
        }
        BackgroundKind::Wallpaper {
            is_blurred,
            is_moving,
        } => {
            batch
                .put_int(field(&key, "_type"), BACKGROUND_TYPE_WALLPAPER)
                .put_bool(field(&key, "_moving"), *is_moving)
                .put_bool(field(&key, "_blurred"), *is_blurred)
                .remove(field(&key, "_fill"))
                .remove(field(&key, "_color"))
                .remove(field(&key, "_color_top"))
                .remove(field(&key, "_color_bottom"))
                .remove(field(&key, "_colors"))
                .remove(field(&key, "_rotation_angle"))
                .remove(field(&key, "_intensity"))
                .remove(field(&key, "_inverted"));
        }
        BackgroundKind::Pattern {
            fill,
            intensity,
            is_inverted,
            is_moving,
        } => {
            if *intensity < 0 {
                error!("Refusing to store pattern with intensity {}", intensity);
                return Err(BackgroundError::NegativeIntensity(*intensity));
            }
            batch
                .put_int(field(&key, "_type"), BACKGROUND_TYPE_PATTERN)
                .put_int(field(&key, "_intensity"), *intensity as i64)
                .put_bool(field(&key, "_moving"), *is_moving)
                .put_bool(field(&key, "_inverted"), *is_inverted)
                .remove(field(&key, "_blurred"));
            stage_fill(batch, &key, fill);
        }
        BackgroundKind::Empty | BackgroundKind::Custom { .. } => {
            for suffix in [
                "_type",
                "_color",
                "_intensity",
                "_inverted",
                "_moving",
                "_blurred",
                "_fill",
                "_color_top",
                "_color_bottom",
                "_colors",
                "_rotation_angle",
            ] {
                batch.remove(field(&key, suffix));
            }
        }
    }
    Ok(())
}

/// Store `background` in `usage`, replacing whatever the slot held
pub fn save(
    store: &dyn KeyValueStore,
    background: &Background,
    usage: i32,
) -> BackgroundResult<()> {
    let mut batch = StoreBatch::new();
    stage(&mut batch, background, usage)?;
    store.apply(batch)?;
    info!(
        "Saved background {:?} to account {} slot {}",
        background.name(),
        background.account_id(),
        usage
    );
    Ok(())
}

fn restore_fill(
    store: &dyn KeyValueStore,
    key: &str,
) -> BackgroundResult<BackgroundFill> {
    let int = |suffix: &str| -> BackgroundResult<i64> {
        Ok(store.get_int(&field(key, suffix))?.unwrap_or(0))
    };
    match store.get_int(&field(key, "_fill"))?.unwrap_or(FILL_TYPE_SOLID) {
        FILL_TYPE_SOLID => Ok(BackgroundFill::Solid(int("_color")? as u32)),
        FILL_TYPE_GRADIENT => Ok(BackgroundFill::Gradient {
            top: int("_color_top")? as u32,
            bottom: int("_color_bottom")? as u32,
            rotation: int("_rotation_angle")? as i32,
        }),
        FILL_TYPE_FREEFORM => Ok(BackgroundFill::Freeform(
            store
                .get_int_array(&field(key, "_colors"))?
                .unwrap_or_default()
                .into_iter()
                .map(|c| c as u32)
                .collect(),
        )),
        other => {
            error!("Unknown background fill tag {} under {}", other, key);
            Err(BackgroundError::UnknownFill(other))
        }
    }
}

/// Load the background stored in `usage` for `account_id`.
///
/// `Ok(None)` when the slot holds nothing typed. Unknown type or fill tags are errors.
pub fn restore(
    store: &dyn KeyValueStore,
    account_id: i32,
    usage: i32,
) -> BackgroundResult<Option<Background>> {
    let key = slot_prefix(account_id, usage);
    let flag = |suffix: &str| -> BackgroundResult<bool> {
        Ok(store.get_bool(&field(&key, suffix))?.unwrap_or(false))
    };

    if flag("_empty")? {
        return Ok(Some(Background::new_empty(account_id)));
    }
    if flag("_custom")? {
        let path = store.get_string(&field(&key, "_path"))?.unwrap_or_default();
        return Ok(Some(Background::new_local(account_id, PathBuf::from(path))));
    }

    let mut name = store.get_string(&field(&key, "_name"))?.unwrap_or_default();
    let is_vector = flag("_vector")?;
    let kind = match store.get_int(&field(&key, "_type"))? {
        None | Some(0) => {
            debug!("No background stored under {}", key);
            return Ok(None);
        }
        Some(BACKGROUND_TYPE_FILL) => {
            let fill = restore_fill(store, &key)?;
            if name.is_empty() {
                name = fill.name();
            }
            BackgroundKind::Fill(fill)
        }
        Some(BACKGROUND_TYPE_WALLPAPER) => BackgroundKind::Wallpaper {
            is_blurred: flag("_blurred")?,
            is_moving: flag("_moving")?,
        },
        Some(BACKGROUND_TYPE_PATTERN) => {
            let intensity = store.get_int(&field(&key, "_intensity"))?.unwrap_or(0) as i32;
            BackgroundKind::Pattern {
                fill: restore_fill(store, &key)?,
                intensity: intensity.abs(),
                is_inverted: intensity < 0 || flag("_inverted")?,
                is_moving: flag("_moving")?,
            }
        }
        Some(other) => {
            error!("Unknown background type tag {} under {}", other, key);
            return Err(BackgroundError::UnknownType(other));
        }
    };

    let mut background = Background::from_remote(account_id, name, kind, is_vector, None);
    background.set_legacy_remote_id(store.get_string(&field(&key, "_remote_id"))?);
    Ok(Some(background))
}

/// Drop the stored legacy remote id of a slot after the backend stopped serving it
pub fn forget_legacy_remote_id(
    store: &dyn KeyValueStore,
    account_id: i32,
    usage: i32,
) -> BackgroundResult<()> {
    store.remove(&field(&slot_prefix(account_id, usage), "_remote_id"))?;
    Ok(())
}

/// Remove every field of a slot
pub fn delete_slot(store: &dyn KeyValueStore, account_id: i32, usage: i32) -> BackgroundResult<()> {
    let key = slot_prefix(account_id, usage);
    let mut batch = StoreBatch::new();
    for suffix in FIELDS {
        batch.remove(field(&key, suffix));
    }
    store.apply(batch)?;
    info!("Deleted background slot {} of account {}", usage, account_id);
    Ok(())
}

/// Rewrite a slot that only recorded a legacy wallpaper id
pub fn migrate_legacy_slot(
    store: &dyn KeyValueStore,
    account_id: i32,
    usage: i32,
    legacy_id: i32,
    color: u32,
    persistent_id: Option<&str>,
) -> BackgroundResult<()> {
    let mut batch = StoreBatch::new();
    legacy::migrate_legacy_wallpaper(
        &mut batch,
        &slot_prefix(account_id, usage),
        legacy_id,
        color,
        persistent_id,
    );
    if !batch.is_empty() {
        store.apply(batch)?;
        info!(
            "Migrated legacy wallpaper {} into account {} slot {}",
            legacy_id, account_id, usage
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore, StoreValue};
    use std::path::Path;

    fn samples(account_id: i32) -> Vec<Background> {
        vec![
            Background::new_empty(account_id),
            Background::new_local(account_id, "/data/wallpapers/picked.jpg"),
            Background::new_solid(account_id, 0xff20_4060),
            Background::new_gradient(account_id, 0xff11_2233, 0xff44_5566, 315),
            Background::new_freeform(account_id, vec![0xff11_1111, 0xff22_2222, 0xff33_3333]),
            Background::from_remote(
                account_id,
                "pattern-name",
                BackgroundKind::Pattern {
                    fill: BackgroundFill::Gradient {
                        top: 0xffaa_bbcc,
                        bottom: 0xffcc_bbaa,
                        rotation: 0,
                    },
                    intensity: 60,
                    is_inverted: true,
                    is_moving: false,
                },
                true,
                None,
            ),
            Background::from_remote(
                account_id,
                "wallpaper-name",
                BackgroundKind::Wallpaper {
                    is_blurred: true,
                    is_moving: true,
                },
                false,
                None,
            ),
            Background::new_legacy(account_id, legacy::ID_CATS_PINK).unwrap(),
        ]
    }

    #[test]
    fn test_every_kind_survives_a_slot() {
        let store = MemoryStore::new();
        // Written in sequence into one slot: stale fields must not leak between kinds
        for background in samples(3) {
            save(&store, &background, 1).unwrap();
            let restored = restore(&store, 3, 1).unwrap().unwrap();
            assert_eq!(restored, background, "{:?}", background.kind());
            assert_eq!(restored.kind(), background.kind());
            assert_eq!(restored.is_vector(), background.is_vector());
        }
    }

    #[test]
    fn test_sqlite_slot() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = SqliteStore::open(&temp.path().join("bg.db")).unwrap();
        let background = Background::new_gradient(0, 0xff00_00ff, 0xffff_0000, 45);
        save(&store, &background, 0).unwrap();
        let restored = restore(&store, 0, 0).unwrap().unwrap();
        assert_eq!(restored, background);
        assert_eq!(restored.name(), "0000ff-ff0000?rotation=45");
    }

    #[test]
    fn test_key_layout() {
        assert_eq!(slot_prefix(0, 0), "wallpaper");
        assert_eq!(slot_prefix(0, 1), "wallpaper_dark");
        assert_eq!(slot_prefix(0, 3), "wallpaper_other3");
        assert_eq!(slot_prefix(7, 0), "wallpaper_7");
        assert_eq!(slot_prefix(7, 1), "wallpaper_7_dark");
        assert_eq!(slot_prefix(3, 0), "wallpaper_3");

        let store = MemoryStore::new();
        save(&store, &Background::new_solid(0, 0xff12_3456), 0).unwrap();
        assert_eq!(store.get_int("wallpaper_type").unwrap(), Some(1));
        assert_eq!(store.get_int("wallpaper_fill").unwrap(), Some(1));
        assert_eq!(store.get_int("wallpaper_color").unwrap(), Some(0xff12_3456));
        // Synthesized fill names are not stored
        assert_eq!(store.get_string("wallpaper_name").unwrap(), None);

        save(
            &store,
            &Background::from_remote(
                0,
                "w",
                BackgroundKind::Wallpaper {
                    is_blurred: false,
                    is_moving: false,
                },
                false,
                None,
            ),
            0,
        )
        .unwrap();
        assert_eq!(store.get_int("wallpaper_color").unwrap(), None);
        assert_eq!(store.get_int("wallpaper_fill").unwrap(), None);
        assert_eq!(store.get_string("wallpaper_name").unwrap(), Some("w".into()));
    }

    #[test]
    fn test_missing_and_unknown_records() {
        let store = MemoryStore::new();
        assert!(restore(&store, 0, 0).unwrap().is_none());

        store.put("wallpaper_type", StoreValue::Int(4)).unwrap();
        assert!(matches!(
            restore(&store, 0, 0),
            Err(BackgroundError::UnknownType(4))
        ));

        store.put("wallpaper_type", StoreValue::Int(1)).unwrap();
        store.put("wallpaper_fill", StoreValue::Int(9)).unwrap();
        assert!(matches!(
            restore(&store, 0, 0),
            Err(BackgroundError::UnknownFill(9))
        ));
    }

    #[test]
    fn test_negative_intensity_means_inverted() {
        let store = MemoryStore::new();
        let mut batch = StoreBatch::new();
        batch
            .put_int("wallpaper_type", BACKGROUND_TYPE_PATTERN)
            .put_string("wallpaper_name", "p")
            .put_int("wallpaper_intensity", -35)
            .put_int("wallpaper_color", 0xff00_ff00);
        store.apply(batch).unwrap();

        let restored = restore(&store, 0, 0).unwrap().unwrap();
        assert!(restored.is_pattern_inverted());
        assert_eq!(restored.intensity(), 0.35);

        let negative = Background::from_remote(
            0,
            "p",
            BackgroundKind::Pattern {
                fill: BackgroundFill::Solid(0),
                intensity: -1,
                is_inverted: false,
                is_moving: false,
            },
            false,
            None,
        );
        assert!(matches!(
            save(&store, &negative, 0),
            Err(BackgroundError::NegativeIntensity(-1))
        ));
    }

    #[test]
    fn test_remote_id_and_delete() {
        let store = MemoryStore::new();
        let mut background = Background::new_legacy(2, legacy::ID_GALAXY).unwrap();
        background.set_legacy_remote_id(Some("remote-42".into()));
        save(&store, &background, 4).unwrap();

        let restored = restore(&store, 2, 4).unwrap().unwrap();
        assert_eq!(restored.legacy_remote_id(), Some("remote-42"));
        assert_eq!(restored.legacy_wallpaper_id(), legacy::ID_GALAXY);

        forget_legacy_remote_id(&store, 2, 4).unwrap();
        assert_eq!(restore(&store, 2, 4).unwrap().unwrap().legacy_remote_id(), None);

        delete_slot(&store, 2, 4).unwrap();
        assert!(store.keys_with_prefix("wallpaper_2_other4").unwrap().is_empty());
    }

    #[test]
    fn test_account_and_slot_do_not_share_keys() {
        let store = MemoryStore::new();
        save(&store, &Background::new_solid(0, 0xff00_00ff), 3).unwrap();
        save(&store, &Background::new_solid(3, 0xffff_0000), 0).unwrap();

        let first = restore(&store, 0, 3).unwrap().unwrap();
        assert_eq!(first.name(), "0000ff");
        assert_eq!(first.account_id(), 0);
        let second = restore(&store, 3, 0).unwrap().unwrap();
        assert_eq!(second.name(), "ff0000");

        delete_slot(&store, 3, 0).unwrap();
        assert!(restore(&store, 3, 0).unwrap().is_none());
        assert_eq!(restore(&store, 0, 3).unwrap().unwrap().name(), "0000ff");
    }

    #[test]
    fn test_migrate_legacy_slot() {
        let store = MemoryStore::new();
        migrate_legacy_slot(&store, 0, 0, legacy::ID_SOLID_BLUE, 0, None).unwrap();
        let restored = restore(&store, 0, 0).unwrap().unwrap();
        assert_eq!(restored.legacy_wallpaper_id(), legacy::ID_SOLID_BLUE);
        assert!(restored.is_fill_solid());

        migrate_legacy_slot(&store, 5, 0, legacy::ID_CITY, 0, Some("r")).unwrap();
        let restored = restore(&store, 5, 0).unwrap().unwrap();
        assert_eq!(restored.legacy_wallpaper_id(), legacy::ID_CITY);
        assert_eq!(restored.legacy_remote_id(), Some("r"));
        assert_eq!(restored.custom_path(), None::<&Path>);
    }
}
