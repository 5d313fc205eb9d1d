//! Custom theme persistence
//!
//! Layout, per custom theme index `n`:
//! - `custom_theme_<n>_name`
//! - `custom_theme_<n>_color_<color>` override, ARGB as int
//! - `custom_theme_<n>_property_<property>` override, float (the parent theme lives here)
//! - `custom_theme_<n>_wallpaper`
//! - `custom_theme_<n>_history_<color>` color edit history
//!
//! plus `custom_themes` (ordered index list) and `custom_theme_next`.

use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::color::Argb;
use crate::constants::keys::{CUSTOM_THEME_LIST, CUSTOM_THEME_NEXT_INDEX, CUSTOM_THEME_PREFIX};
use crate::theme::{ColorId, PropertyId, ThemeId};

use super::kv::{KeyValueStore, StoreBatch};

/// Summary used for listings
#[derive(Debug, Clone, PartialEq)]
pub struct CustomThemeInfo {
    pub index: i32,
    pub name: String,
    pub parent: ThemeId,
}

impl CustomThemeInfo {
    pub fn theme_id(&self) -> ThemeId {
        ThemeId(ThemeId::CUSTOM.0 - self.index)
    }
}

/// Everything stored for one custom theme
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomThemeRecord {
    pub index: i32,
    pub name: String,
    pub colors: BTreeMap<ColorId, Argb>,
    /// Property overrides, including [`PropertyId::ParentTheme`]
    pub properties: BTreeMap<PropertyId, f32>,
    pub wallpaper: Option<String>,
}

impl CustomThemeRecord {
    /// Raw parent theme id as stored; callers normalize it
    pub fn parent_raw(&self) -> i32 {
        self.properties
            .get(&PropertyId::ParentTheme)
            .map(|v| *v as i32)
            .unwrap_or(0)
    }
}

#[derive(Clone)]
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    fn key(index: i32) -> String {
        format!("{}_{}_", CUSTOM_THEME_PREFIX, index)
    }

    fn name_key(index: i32) -> String {
        format!("{}name", Self::key(index))
    }

    fn color_key(index: i32, color: ColorId) -> String {
        format!("{}color_{}", Self::key(index), color.name())
    }

    fn property_key(index: i32, property: PropertyId) -> String {
        format!("{}property_{}", Self::key(index), property.name())
    }

    fn wallpaper_key(index: i32) -> String {
        format!("{}wallpaper", Self::key(index))
    }

    fn history_key(index: i32, color: ColorId) -> String {
        format!("{}history_{}", Self::key(index), color.name())
    }

    fn indices(&self) -> Result<Vec<i32>> {
        Ok(self
            .store
            .get_int_array(CUSTOM_THEME_LIST)?
            .unwrap_or_default()
            .into_iter()
            .map(|i| i as i32)
            .collect())
    }

    /// Create a custom theme on top of `parent`, optionally copying every override of
    /// the custom theme `inherit_from`. Returns the new custom index.
    pub fn create(&self, name: &str, parent: ThemeId, inherit_from: Option<i32>) -> Result<i32> {
        let index = self
            .store
            .get_int(CUSTOM_THEME_NEXT_INDEX)?
            .map(|i| i as i32)
            .unwrap_or(1)
            .max(1);

        let mut batch = StoreBatch::new();
        if let Some(source) = inherit_from {
            match self.load(source)? {
                Some(record) => {
                    for (color, value) in &record.colors {
                        batch.put_int(Self::color_key(index, *color), *value as i64);
                    }
                    for (property, value) in &record.properties {
                        batch.put_float(Self::property_key(index, *property), *value);
                    }
                    if let Some(wallpaper) = &record.wallpaper {
                        batch.put_string(Self::wallpaper_key(index), wallpaper.clone());
                    }
                }
                None => warn!("Custom theme {} to inherit from is missing", source),
            }
        }
        batch
            .put_string(Self::name_key(index), name)
            .put_float(
                Self::property_key(index, PropertyId::ParentTheme),
                parent.raw() as f32,
            );

        let mut list: Vec<i64> = self.indices()?.into_iter().map(i64::from).collect();
        list.push(index as i64);
        batch
            .put_int_array(CUSTOM_THEME_LIST, list)
            .put_int(CUSTOM_THEME_NEXT_INDEX, index as i64 + 1);

        self.store.apply(batch)?;
        info!("Created custom theme {} ({:?}) on {}", index, name, parent);
        Ok(index)
    }

    pub fn exists(&self, index: i32) -> Result<bool> {
        Ok(index > 0 && self.store.contains(&Self::name_key(index))?)
    }

    pub fn list(&self) -> Result<Vec<CustomThemeInfo>> {
        let mut themes = Vec::new();
        for index in self.indices()? {
            let Some(name) = self.store.get_string(&Self::name_key(index))? else {
                debug!("Skipping listed but missing custom theme {}", index);
                continue;
            };
            let parent = self
                .store
                .get_float(&Self::property_key(index, PropertyId::ParentTheme))?
                .map(|v| ThemeId(v as i32))
                .unwrap_or(ThemeId::NONE);
            themes.push(CustomThemeInfo {
                index,
                name,
                parent,
            });
        }
        Ok(themes)
    }

    pub fn load(&self, index: i32) -> Result<Option<CustomThemeRecord>> {
        let Some(name) = self.store.get_string(&Self::name_key(index))? else {
            return Ok(None);
        };
        let mut record = CustomThemeRecord {
            index,
            name,
            ..Default::default()
        };

        let prefix = Self::key(index);
        for key in self.store.keys_with_prefix(&prefix)? {
            let field = &key[prefix.len()..];
            if let Some(color) = field.strip_prefix("color_") {
                match (ColorId::from_name(color), self.store.get_int(&key)?) {
                    (Some(color), Some(value)) => {
                        record.colors.insert(color, value as Argb);
                    }
                    _ => warn!("Ignoring unknown color override {}", key),
                }
            } else if let Some(property) = field.strip_prefix("property_") {
                match (PropertyId::from_name(property), self.store.get_float(&key)?) {
                    (Some(property), Some(value)) => {
                        record.properties.insert(property, value);
                    }
                    _ => warn!("Ignoring unknown property override {}", key),
                }
            } else if field == "wallpaper" {
                record.wallpaper = self.store.get_string(&key)?;
            }
        }
        Ok(Some(record))
    }

    pub fn name(&self, index: i32) -> Result<Option<String>> {
        self.store.get_string(&Self::name_key(index))
    }

    pub fn rename(&self, index: i32, name: &str) -> Result<()> {
        let mut batch = StoreBatch::new();
        batch.put_string(Self::name_key(index), name);
        self.store.apply(batch)
    }

    /// Write or clear a color override
    pub fn set_color(&self, index: i32, color: ColorId, value: Option<Argb>) -> Result<()> {
        let mut batch = StoreBatch::new();
        self.stage_color(&mut batch, index, color, value);
        self.store.apply(batch)
    }

    pub fn stage_color(&self, batch: &mut StoreBatch, index: i32, color: ColorId, value: Option<Argb>) {
        match value {
            Some(value) => batch.put_int(Self::color_key(index, color), value as i64),
            None => batch.remove(Self::color_key(index, color)),
        };
    }

    pub fn set_property(&self, index: i32, property: PropertyId, value: Option<f32>) -> Result<()> {
        let mut batch = StoreBatch::new();
        match value {
            Some(value) => batch.put_float(Self::property_key(index, property), value),
            None => batch.remove(Self::property_key(index, property)),
        };
        self.store.apply(batch)
    }

    pub fn set_wallpaper(&self, index: i32, wallpaper: Option<&str>) -> Result<()> {
        let mut batch = StoreBatch::new();
        match wallpaper {
            Some(wallpaper) => batch.put_string(Self::wallpaper_key(index), wallpaper),
            None => batch.remove(Self::wallpaper_key(index)),
        };
        self.store.apply(batch)
    }

    pub fn color_history(&self, index: i32, color: ColorId) -> Result<Option<Vec<Argb>>> {
        Ok(self
            .store
            .get_int_array(&Self::history_key(index, color))?
            .map(|values| values.into_iter().map(|v| v as Argb).collect()))
    }

    pub fn stage_color_history(
        &self,
        batch: &mut StoreBatch,
        index: i32,
        color: ColorId,
        history: Option<&[Argb]>,
    ) {
        match history {
            Some(history) if !history.is_empty() => batch.put_int_array(
                Self::history_key(index, color),
                history.iter().map(|c| *c as i64).collect(),
            ),
            _ => batch.remove(Self::history_key(index, color)),
        };
    }

    pub fn apply(&self, batch: StoreBatch) -> Result<()> {
        self.store.apply(batch)
    }

    /// Delete every key of the theme and drop it from the list
    pub fn remove(&self, index: i32) -> Result<()> {
        let mut batch = StoreBatch::new();
        for key in self.store.keys_with_prefix(&Self::key(index))? {
            batch.remove(key);
        }
        let list: Vec<i64> = self
            .indices()?
            .into_iter()
            .filter(|i| *i != index)
            .map(i64::from)
            .collect();
        batch.put_int_array(CUSTOM_THEME_LIST, list);
        self.store.apply(batch)?;
        info!("Removed custom theme {}", index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, SqliteStore};
    use crate::theme::BuiltinId;

    fn memory() -> ThemeStore {
        ThemeStore::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_create_list_load() {
        let store = memory();
        let first = store
            .create("Mine", BuiltinId::Blue.theme_id(), None)
            .unwrap();
        let second = store
            .create("Other", BuiltinId::NightBlue.theme_id(), None)
            .unwrap();
        assert_eq!((first, second), (1, 2));
        assert!(store.exists(1).unwrap());
        assert!(!store.exists(3).unwrap());
        assert!(!store.exists(0).unwrap());

        let list = store.list().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Mine");
        assert_eq!(list[1].parent, BuiltinId::NightBlue.theme_id());
        assert_eq!(list[0].theme_id(), ThemeId(-3));

        store
            .set_color(1, ColorId::Filling, Some(0xff11_2233))
            .unwrap();
        store
            .set_property(1, PropertyId::BubbleCorner, Some(12.0))
            .unwrap();
        store.set_wallpaper(1, Some("cats")).unwrap();

        let record = store.load(1).unwrap().unwrap();
        assert_eq!(record.colors.get(&ColorId::Filling), Some(&0xff11_2233));
        assert_eq!(record.properties.get(&PropertyId::BubbleCorner), Some(&12.0));
        assert_eq!(record.parent_raw(), BuiltinId::Blue as i32);
        assert_eq!(record.wallpaper.as_deref(), Some("cats"));
    }

    #[test]
    fn test_inherit_copies_overrides() {
        let store = memory();
        let base = store.create("Base", BuiltinId::Red.theme_id(), None).unwrap();
        store.set_color(base, ColorId::Text, Some(0xff00_0001)).unwrap();
        let copy = store
            .create("Copy", BuiltinId::Green.theme_id(), Some(base))
            .unwrap();
        let record = store.load(copy).unwrap().unwrap();
        assert_eq!(record.colors.get(&ColorId::Text), Some(&0xff00_0001));
        // The explicit parent wins over the copied one
        assert_eq!(record.parent_raw(), BuiltinId::Green as i32);
    }

    #[test]
    fn test_history_and_remove() {
        let store = ThemeStore::new(Arc::new(SqliteStore::in_memory().unwrap()));
        let index = store.create("T", BuiltinId::Classic.theme_id(), None).unwrap();

        let mut batch = StoreBatch::new();
        store.stage_color_history(&mut batch, index, ColorId::Icon, Some(&[0xffff_0000, 0xff00_ff00]));
        store.apply(batch).unwrap();
        assert_eq!(
            store.color_history(index, ColorId::Icon).unwrap(),
            Some(vec![0xffff_0000, 0xff00_ff00])
        );

        store.remove(index).unwrap();
        assert!(store.load(index).unwrap().is_none());
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.color_history(index, ColorId::Icon).unwrap(), None);

        // Indices are never reused
        assert_eq!(store.create("U", BuiltinId::Classic.theme_id(), None).unwrap(), 2);
    }
}
