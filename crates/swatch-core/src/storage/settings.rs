//! Per-account theme selection and the global night mode

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::{NightMode, ThemesConfig};
use crate::constants::keys::{ACCOUNT_PREFIX, NIGHT_MODE};
use crate::theme::ThemeId;

use super::kv::{KeyValueStore, StoreBatch, StoreValue};

#[derive(Clone)]
pub struct ThemeSettings {
    store: Arc<dyn KeyValueStore>,
    default_dark: ThemeId,
    default_light: ThemeId,
}

impl ThemeSettings {
    pub fn new(store: Arc<dyn KeyValueStore>, themes: &ThemesConfig) -> Self {
        Self {
            store,
            default_dark: themes.default_theme(true),
            default_light: themes.default_theme(false),
        }
    }

    fn key(account_id: i32, slot: &str) -> String {
        format!("{}_{}_{}", ACCOUNT_PREFIX, account_id, slot)
    }

    fn theme_at(&self, account_id: i32, slot: &str, default: ThemeId) -> Result<ThemeId> {
        Ok(self
            .store
            .get_int(&Self::key(account_id, slot))?
            .map(|raw| ThemeId(raw as i32))
            .unwrap_or(default))
    }

    /// Theme currently selected by the account, not yet validated
    pub fn global_theme(&self, account_id: i32) -> Result<ThemeId> {
        self.theme_at(account_id, "theme", self.default_dark)
    }

    pub fn global_night_theme(&self, account_id: i32) -> Result<ThemeId> {
        self.theme_at(account_id, "theme_night", self.default_dark)
    }

    pub fn global_daylight_theme(&self, account_id: i32) -> Result<ThemeId> {
        self.theme_at(account_id, "theme_day", self.default_light)
    }

    /// Select `theme`, also remembering it as the account's day or night theme
    pub fn set_global_theme(&self, account_id: i32, theme: ThemeId, is_dark: bool) -> Result<()> {
        let mut batch = StoreBatch::new();
        batch.put_int(Self::key(account_id, "theme"), theme.raw() as i64);
        batch.put_int(
            Self::key(account_id, if is_dark { "theme_night" } else { "theme_day" }),
            theme.raw() as i64,
        );
        self.store.apply(batch)?;
        info!("Account {} theme set to {}", account_id, theme);
        Ok(())
    }

    pub fn night_mode(&self) -> Result<Option<NightMode>> {
        Ok(self.store.get_int(NIGHT_MODE)?.map(|raw| NightMode::from_raw(raw as i32)))
    }

    pub fn set_night_mode(&self, mode: NightMode) -> Result<()> {
        self.store
            .put(NIGHT_MODE, StoreValue::Int(mode.as_raw() as i64))?;
        info!("Night mode set to {:?}", mode);
        Ok(())
    }

    /// Point every account reference to `from` at `to`; returns the number of rewrites
    pub fn replace_theme_id(&self, from: ThemeId, to: ThemeId) -> Result<usize> {
        let mut batch = StoreBatch::new();
        for key in self
            .store
            .keys_with_prefix(&format!("{}_", ACCOUNT_PREFIX))?
        {
            if self.store.get_int(&key)? == Some(from.raw() as i64) {
                batch.put_int(key, to.raw() as i64);
            }
        }
        let count = batch.len();
        if count > 0 {
            self.store.apply(batch)?;
            info!("Replaced theme {} with {} in {} settings", from, to, count);
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::theme::BuiltinId;

    fn settings() -> ThemeSettings {
        ThemeSettings::new(Arc::new(MemoryStore::new()), &ThemesConfig::default())
    }

    #[test]
    fn test_defaults() {
        let settings = settings();
        assert_eq!(settings.global_theme(0).unwrap(), BuiltinId::NightBlue.theme_id());
        assert_eq!(
            settings.global_daylight_theme(0).unwrap(),
            BuiltinId::Classic.theme_id()
        );
        assert_eq!(settings.night_mode().unwrap(), None);
    }

    #[test]
    fn test_set_theme_updates_day_or_night_slot() {
        let settings = settings();
        settings
            .set_global_theme(1, BuiltinId::Red.theme_id(), false)
            .unwrap();
        assert_eq!(settings.global_theme(1).unwrap(), BuiltinId::Red.theme_id());
        assert_eq!(settings.global_daylight_theme(1).unwrap(), BuiltinId::Red.theme_id());
        assert_eq!(
            settings.global_night_theme(1).unwrap(),
            BuiltinId::NightBlue.theme_id()
        );
        // Other accounts untouched
        assert_eq!(settings.global_theme(2).unwrap(), BuiltinId::NightBlue.theme_id());
    }

    #[test]
    fn test_replace_theme_id() {
        let settings = settings();
        settings.set_global_theme(1, ThemeId(-3), false).unwrap();
        settings.set_global_theme(2, ThemeId(-3), true).unwrap();
        let replaced = settings
            .replace_theme_id(ThemeId(-3), BuiltinId::Blue.theme_id())
            .unwrap();
        assert_eq!(replaced, 4);
        assert_eq!(settings.global_theme(2).unwrap(), BuiltinId::Blue.theme_id());
    }

    #[test]
    fn test_night_mode_round_trip() {
        let settings = settings();
        settings.set_night_mode(NightMode::Scheduled).unwrap();
        assert_eq!(settings.night_mode().unwrap(), Some(NightMode::Scheduled));
    }
}
