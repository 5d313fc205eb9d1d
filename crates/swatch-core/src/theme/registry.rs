//! Theme registry
//!
//! Resolves theme ids to delegates. Builtins are created on first use, custom themes are
//! loaded from the [`ThemeStore`], and configured aliases become inherited themes. The
//! arena only grows, so handles stay valid for the lifetime of the set.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::builtin;
use super::delegate::{
    BuiltinTheme, CustomTheme, InheritedTheme, ThemeDelegate, ThemeHandle, ThemeRef,
};
use super::ids::{BuiltinId, ColorId, PropertyId, ThemeId, DEFAULT_THEME};
use super::property::{normalize, restore_builtin_theme_id};
use crate::color::Argb;
use crate::config::ThemesConfig;
use crate::error::{ThemeError, ThemeResult};
use crate::storage::ThemeStore;

/// Alias chains longer than this are treated as broken
const MAX_ALIAS_DEPTH: usize = 8;

pub struct ThemeSet {
    themes: Vec<ThemeDelegate>,
    by_id: HashMap<ThemeId, ThemeHandle>,
    aliases: HashMap<ThemeId, ThemeId>,
    store: ThemeStore,
    default_dark: ThemeId,
    default_light: ThemeId,
}

impl ThemeSet {
    pub fn new(store: ThemeStore, config: &ThemesConfig) -> Self {
        let mut aliases = HashMap::new();
        for (alias, target) in config.alias_pairs() {
            if alias.is_builtin() || alias == ThemeId::NONE || alias == ThemeId::TEMPORARY {
                warn!("Ignoring alias {} -> {}: id is reserved", alias, target);
                continue;
            }
            aliases.insert(alias, target);
        }
        Self {
            themes: Vec::new(),
            by_id: HashMap::new(),
            aliases,
            store,
            default_dark: config.default_theme(true),
            default_light: config.default_theme(false),
        }
    }

    pub fn store(&self) -> &ThemeStore {
        &self.store
    }

    pub fn default_theme(&self, is_dark: bool) -> ThemeId {
        if is_dark {
            self.default_dark
        } else {
            self.default_light
        }
    }

    /// Resolve a handle minted by this set
    pub fn theme(&self, handle: ThemeHandle) -> ThemeRef<'_> {
        ThemeRef::new(self, &self.themes[handle.0])
    }

    pub fn handle_of(&self, id: ThemeId) -> Option<ThemeHandle> {
        self.by_id.get(&id).copied()
    }

    pub(crate) fn custom_mut(&mut self, handle: ThemeHandle) -> ThemeResult<&mut CustomTheme> {
        let delegate = &mut self.themes[handle.0];
        let id = delegate.id();
        delegate.as_custom_mut().ok_or(ThemeError::NotCustom(id.raw()))
    }

    fn push(&mut self, delegate: ThemeDelegate) -> ThemeHandle {
        let handle = ThemeHandle(self.themes.len());
        let id = delegate.id();
        self.themes.push(delegate);
        self.by_id.insert(id, handle);
        handle
    }

    /// Handle for `id`, constructing the delegate on first use
    pub fn get_or_load(&mut self, id: ThemeId) -> ThemeResult<ThemeHandle> {
        self.load_with_depth(id, 0)
    }

    fn load_with_depth(&mut self, id: ThemeId, depth: usize) -> ThemeResult<ThemeHandle> {
        if let Some(handle) = self.handle_of(id) {
            return Ok(handle);
        }

        if let Some(builtin) = id.builtin() {
            debug!("Creating builtin theme {}", id);
            return Ok(self.push(ThemeDelegate::Builtin(BuiltinTheme::new(builtin::palette(
                builtin,
            )))));
        }

        if let Some(target) = self.aliases.get(&id).copied() {
            if depth >= MAX_ALIAS_DEPTH {
                warn!("Alias chain through {} is too deep", id);
                return Err(ThemeError::UnknownThemeId(id.raw()));
            }
            let parent = self.load_with_depth(target, depth + 1)?;
            debug!("Creating inherited theme {} -> {}", id, target);
            return Ok(self.push(ThemeDelegate::Inherited(InheritedTheme::new(id, parent))));
        }

        match id.custom_index() {
            Some(index) => self.load_custom(id, index),
            None => Err(ThemeError::UnknownThemeId(id.raw())),
        }
    }

    fn load_custom(&mut self, id: ThemeId, index: i32) -> ThemeResult<ThemeHandle> {
        let Some(record) = self.store.load(index)? else {
            return Err(ThemeError::CustomThemeNotFound(id.raw()));
        };

        let parent_id = restore_builtin_theme_id(record.parent_raw());
        if parent_id.raw() != record.parent_raw() {
            warn!(
                "Custom theme {} has invalid parent {}, using {}",
                id,
                record.parent_raw(),
                parent_id
            );
        }
        let parent = self.get_or_load(parent_id)?;

        let mut properties = HashMap::new();
        for (property, value) in record.properties {
            if property == PropertyId::ParentTheme {
                continue;
            }
            let normalized = normalize(property, value);
            if normalized != value {
                warn!(
                    "Custom theme {}: {} = {} out of range, using {}",
                    id, property, value, normalized
                );
            }
            properties.insert(property, normalized);
        }

        debug!(
            "Loaded custom theme {} ({:?}) with {} color overrides",
            id,
            record.name,
            record.colors.len()
        );
        Ok(self.push(ThemeDelegate::Custom(CustomTheme::new(
            id,
            record.name,
            parent,
            record.colors.into_iter().collect(),
            properties,
            record.wallpaper,
        ))))
    }

    /// Drop the cached delegate for `id`; the slot stays allocated
    pub fn forget(&mut self, id: ThemeId) {
        if self.by_id.remove(&id).is_some() {
            info!("Forgot theme {}", id);
        }
    }

    /// Validate a persisted theme id: builtins, aliases and existing custom themes (when
    /// allowed) are returned as-is, anything else becomes the default theme
    pub fn restore_theme_id(&self, saved: ThemeId, allow_custom: bool) -> ThemeId {
        if saved.is_builtin() || self.aliases.contains_key(&saved) {
            return saved;
        }
        if allow_custom {
            if let Some(index) = saved.custom_index() {
                match self.store.exists(index) {
                    Ok(true) => return saved,
                    Ok(false) => {}
                    Err(e) => warn!("Failed to check custom theme {}: {}", saved, e),
                }
            }
        }
        if saved != DEFAULT_THEME.theme_id() {
            debug!("Restoring stale theme id {} to default", saved);
        }
        DEFAULT_THEME.theme_id()
    }

    /// Like [`ThemeSet::restore_theme_id`], but a builtin whose darkness disagrees with
    /// `is_dark` is replaced by the default dark or light theme
    pub fn restore_theme_id_for_mode(
        &self,
        saved: ThemeId,
        allow_custom: bool,
        is_dark: bool,
    ) -> ThemeId {
        let id = self.restore_theme_id(saved, allow_custom);
        match id.builtin() {
            Some(builtin) if builtin.is_dark() != is_dark => self.default_theme(is_dark),
            _ => id,
        }
    }

    pub fn is_dark_theme(&mut self, id: ThemeId) -> ThemeResult<bool> {
        if let Some(builtin) = id.builtin() {
            return Ok(builtin.is_dark());
        }
        let handle = self.get_or_load(id)?;
        Ok(self.theme(handle).is_dark())
    }

    pub fn color(&mut self, id: ThemeId, color: ColorId) -> ThemeResult<Argb> {
        let handle = self.get_or_load(id)?;
        Ok(self.theme(handle).color(color))
    }

    pub fn property(&mut self, id: ThemeId, property: PropertyId) -> ThemeResult<f32> {
        let handle = self.get_or_load(id)?;
        Ok(self.theme(handle).property(property))
    }

    pub fn default_wallpaper(&mut self, id: ThemeId) -> ThemeResult<Option<String>> {
        let handle = self.get_or_load(id)?;
        Ok(self.theme(handle).default_wallpaper().map(str::to_string))
    }

    pub fn wallpaper_usage_identifier(&mut self, id: ThemeId) -> ThemeResult<i32> {
        let handle = self.get_or_load(id)?;
        Ok(self.theme(handle).wallpaper_usage_identifier())
    }

    /// Apply a property override to a loaded custom theme. `None` clears the override.
    /// Setting [`PropertyId::ParentTheme`] re-links the theme to another builtin.
    /// Returns the effective (normalized) value.
    pub(crate) fn set_custom_property(
        &mut self,
        handle: ThemeHandle,
        property: PropertyId,
        value: Option<f32>,
    ) -> ThemeResult<f32> {
        if property == PropertyId::ParentTheme {
            let parent_id = match value {
                Some(value) => restore_builtin_theme_id(normalize(property, value) as i32),
                None => DEFAULT_THEME.theme_id(),
            };
            let parent = self.get_or_load(parent_id)?;
            self.custom_mut(handle)?.relink(parent);
            debug!("Re-linked theme to parent {}", parent_id);
            return Ok(parent_id.raw() as f32);
        }

        let value = value.map(|v| normalize(property, v));
        self.custom_mut(handle)?.set_property(property, value);
        Ok(self.theme(handle).property(property))
    }

    /// Builtin themes that are loaded or loadable, in picker order
    pub fn builtin_ids(extended: bool) -> Vec<BuiltinId> {
        BuiltinId::listed(extended)
    }
}
