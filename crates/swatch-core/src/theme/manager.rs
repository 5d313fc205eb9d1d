//! Theme manager
//!
//! Owns the registry, the account's current theme and the observers. A switch goes
//! through a temporary theme that interpolates from the colors on screen to the target;
//! [`ThemeManager::tick`] advances it. Starting a switch while another one runs freezes
//! the running one as the new starting point, so colors never jump.

use chrono::{Local, NaiveTime};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::background::{self, Background};
use crate::color::{Argb, ColorState};
use crate::config::{EngineConfig, NightConfig, NightMode};
use crate::error::{ThemeError, ThemeResult};
use crate::storage::{KeyValueStore, StoreBatch, ThemeSettings, ThemeStore};

use super::delegate::{
    FrozenTheme, TemporaryTheme, ThemeDelegate, ThemeHandle, ThemeRef, ThemeSource,
};
use super::ids::{ColorId, PropertyId, ThemeId, DEFAULT_THEME};
use super::listener::{ColorBindings, ListenerList, Subscription, ThemeChangeListener};
use super::property::{normalize, restore_builtin_theme_id};
use super::registry::ThemeSet;

/// Outcome of a theme switch request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeChange {
    /// Already the current theme
    Unchanged,
    /// Darkness would flip while automatic night mode is on; retry with `force`
    NeedsConfirmation,
    /// Cross-fade started, drive it with [`ThemeManager::tick`]
    Animated,
    /// Switched without animation
    Applied,
}

enum ThemeState {
    Stable(ThemeHandle),
    /// Always a [`ThemeDelegate::Temporary`]
    Transitioning(ThemeDelegate),
}

struct Animation {
    started: Instant,
    duration: Duration,
}

fn decelerate(fraction: f32) -> f32 {
    1.0 - (1.0 - fraction) * (1.0 - fraction)
}

/// Current theme. With `allow_temporary` a running cross-fade is returned as-is,
/// otherwise its target.
fn current_ref<'a>(set: &'a ThemeSet, state: &'a ThemeState, allow_temporary: bool) -> ThemeRef<'a> {
    match state {
        ThemeState::Stable(handle) => set.theme(*handle),
        ThemeState::Transitioning(delegate) => match delegate.as_temporary() {
            Some(temp) if !allow_temporary || temp.factor() >= 1.0 => set.theme(temp.to()),
            _ => ThemeRef::new(set, delegate),
        },
    }
}

pub struct ThemeManager {
    set: ThemeSet,
    settings: ThemeSettings,
    kv: Arc<dyn KeyValueStore>,
    night: NightConfig,
    duration: Duration,
    recent_resume_window: Duration,
    account_id: i32,
    night_mode: NightMode,
    state: ThemeState,
    animation: Option<Animation>,
    is_resumed: bool,
    last_resumed: Option<Instant>,
    listeners: ListenerList<dyn ThemeChangeListener>,
    bindings: ColorBindings,
}

impl ThemeManager {
    /// Restore the account's theme from `store`
    pub fn new(
        config: &EngineConfig,
        store: Arc<dyn KeyValueStore>,
        account_id: i32,
    ) -> ThemeResult<Self> {
        Self::with_local_time(config, store, account_id, Local::now().time())
    }

    /// Like [`ThemeManager::new`], evaluating the night schedule at `time`
    pub fn with_local_time(
        config: &EngineConfig,
        store: Arc<dyn KeyValueStore>,
        account_id: i32,
        time: NaiveTime,
    ) -> ThemeResult<Self> {
        let mut set = ThemeSet::new(ThemeStore::new(store.clone()), &config.themes);
        let settings = ThemeSettings::new(store.clone(), &config.themes);
        let night_mode = settings.night_mode()?.unwrap_or(config.night.mode);

        let mut saved = settings.global_theme(account_id)?;
        if night_mode == NightMode::Scheduled {
            let is_night = config.night.schedule.contains(time);
            let candidate = if is_night {
                settings.global_night_theme(account_id)?
            } else {
                settings.global_daylight_theme(account_id)?
            };
            let candidate = set.restore_theme_id_for_mode(candidate, true, is_night);
            if candidate != saved {
                info!(
                    "Night schedule selects {} theme {}",
                    if is_night { "night" } else { "day" },
                    candidate
                );
                settings.set_global_theme(account_id, candidate, is_night)?;
                saved = candidate;
            }
        }

        let handle = load_or_default(&mut set, saved)?;
        info!("Restored theme {} for account {}", set.theme(handle).id(), account_id);

        Ok(Self {
            set,
            settings,
            kv: store,
            night: config.night.clone(),
            duration: config.animation.duration(),
            recent_resume_window: config.animation.recent_resume_window(),
            account_id,
            night_mode,
            state: ThemeState::Stable(handle),
            animation: None,
            is_resumed: false,
            last_resumed: None,
            listeners: ListenerList::new(),
            bindings: ColorBindings::new(),
        })
    }

    pub fn themes(&self) -> &ThemeSet {
        &self.set
    }

    pub fn themes_mut(&mut self) -> &mut ThemeSet {
        &mut self.set
    }

    pub fn account_id(&self) -> i32 {
        self.account_id
    }

    pub fn set_animation_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    // -- Current theme --

    /// Theme on screen; a [`ThemeDelegate::Temporary`] while a cross-fade runs
    pub fn current_theme(&self) -> ThemeRef<'_> {
        current_ref(&self.set, &self.state, true)
    }

    /// Theme being switched to, or the current theme when no switch runs
    pub fn applied_theme(&self) -> ThemeRef<'_> {
        current_ref(&self.set, &self.state, false)
    }

    /// Starting point of the running cross-fade
    pub fn previous_theme(&self) -> Option<ThemeRef<'_>> {
        match &self.state {
            ThemeState::Transitioning(delegate) => {
                Some(ThemeRef::new(&self.set, delegate).from_theme())
            }
            ThemeState::Stable(_) => None,
        }
    }

    pub fn current_theme_id(&self) -> ThemeId {
        self.applied_theme().id()
    }

    pub fn is_current_theme(&self, id: ThemeId) -> bool {
        self.current_theme_id() == id
    }

    pub fn is_current_theme_dark(&self) -> bool {
        self.current_theme().is_dark()
    }

    pub fn is_changing(&self) -> bool {
        matches!(self.state, ThemeState::Transitioning(_))
    }

    pub fn color(&self, color: ColorId) -> Argb {
        self.current_theme().color(color)
    }

    pub fn property(&self, property: PropertyId) -> f32 {
        self.current_theme().property(property)
    }

    /// Whether `color` differs between the two ends of the running cross-fade, or was
    /// edited but not yet saved on the current custom theme
    pub fn has_color_changed(&self, color: ColorId) -> bool {
        let theme = self.current_theme();
        match theme.delegate() {
            ThemeDelegate::Temporary(_) => {
                theme.from_theme().color(color) != theme.to_theme().color(color)
            }
            ThemeDelegate::Custom(custom) => custom.has_recently_changed(color),
            _ => false,
        }
    }

    pub fn restore_theme_id(&self, saved: ThemeId, allow_custom: bool) -> ThemeId {
        self.set.restore_theme_id(saved, allow_custom)
    }

    pub fn restore_theme_id_for_mode(
        &self,
        saved: ThemeId,
        allow_custom: bool,
        is_dark: bool,
    ) -> ThemeId {
        self.set.restore_theme_id_for_mode(saved, allow_custom, is_dark)
    }

    // -- Switching --

    /// Report whether the host is in the foreground. Switches animate only while it is,
    /// or shortly after it came back.
    pub fn set_foreground(&mut self, is_resumed: bool, now: Instant) {
        if is_resumed && !self.is_resumed {
            self.last_resumed = Some(now);
        }
        self.is_resumed = is_resumed;
    }

    fn is_interactive(&self, now: Instant) -> bool {
        self.is_resumed
            || self.last_resumed.is_some_and(|resumed| {
                now.saturating_duration_since(resumed) <= self.recent_resume_window
            })
    }

    pub fn change_theme(&mut self, id: ThemeId, force: bool) -> ThemeResult<ThemeChange> {
        self.change_theme_at(id, force, Instant::now())
    }

    /// Switch to `id` and persist it as the account's theme.
    ///
    /// Unless `force` is set, a switch that flips darkness while night mode is on needs
    /// confirmation when interactive; otherwise night mode is turned off first.
    pub fn change_theme_at(
        &mut self,
        id: ThemeId,
        force: bool,
        now: Instant,
    ) -> ThemeResult<ThemeChange> {
        if self.is_current_theme(id) {
            return Ok(ThemeChange::Unchanged);
        }
        let to = self.set.get_or_load(id)?;
        let to_dark = self.set.theme(to).is_dark();
        let interactive = self.is_interactive(now);

        if !force && self.night_mode != NightMode::None && to_dark != self.is_current_theme_dark() {
            if interactive {
                info!("Switching to {} would override night mode", id);
                return Ok(ThemeChange::NeedsConfirmation);
            }
            self.set_night_mode(NightMode::None)?;
        }

        if let Err(e) = self.settings.set_global_theme(self.account_id, id, to_dark) {
            warn!("Failed to save theme selection: {}", e);
        }

        let from = match std::mem::replace(&mut self.state, ThemeState::Stable(to)) {
            ThemeState::Stable(handle) => ThemeSource::Stored(handle),
            ThemeState::Transitioning(ThemeDelegate::Temporary(temp)) if temp.factor() >= 1.0 => {
                ThemeSource::Stored(temp.to())
            }
            ThemeState::Transitioning(delegate) => {
                ThemeSource::Frozen(FrozenTheme::capture(ThemeRef::new(&self.set, &delegate)))
            }
        };
        let mut temp = TemporaryTheme::new(from, to);
        if !interactive {
            temp.set_factor(1.0);
        }
        self.state = ThemeState::Transitioning(ThemeDelegate::Temporary(temp));
        self.notify_theme_changed();

        if interactive {
            self.animation = Some(Animation {
                started: now,
                duration: self.duration,
            });
            info!("Animating switch to theme {}", id);
            Ok(ThemeChange::Animated)
        } else {
            self.animation = None;
            self.notify_colors_changed(false, None);
            self.state = ThemeState::Stable(to);
            info!("Switched to theme {}", id);
            Ok(ThemeChange::Applied)
        }
    }

    /// Switch after the user confirmed overriding night mode
    pub fn confirm_theme_change(&mut self, id: ThemeId) -> ThemeResult<ThemeChange> {
        self.set_night_mode(NightMode::None)?;
        self.change_theme(id, true)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance the running cross-fade. Returns whether it is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        let fraction = if animation.duration.is_zero() {
            1.0
        } else {
            let elapsed = now.saturating_duration_since(animation.started);
            (elapsed.as_secs_f32() / animation.duration.as_secs_f32()).min(1.0)
        };

        let changed = match &mut self.state {
            ThemeState::Transitioning(ThemeDelegate::Temporary(temp)) => {
                temp.set_factor(decelerate(fraction))
            }
            _ => false,
        };
        if changed {
            self.notify_colors_changed(true, None);
        }
        if fraction < 1.0 {
            return true;
        }
        self.finish_transition();
        false
    }

    fn finish_transition(&mut self) {
        self.animation = None;
        self.notify_colors_changed(false, None);
        if let ThemeState::Transitioning(ThemeDelegate::Temporary(temp)) = &self.state {
            let to = temp.to();
            self.state = ThemeState::Stable(to);
            debug!("Theme switch finished");
        }
    }

    // -- Night mode --

    pub fn night_mode(&self) -> NightMode {
        self.night_mode
    }

    pub fn set_night_mode(&mut self, mode: NightMode) -> ThemeResult<()> {
        if self.night_mode == mode {
            return Ok(());
        }
        self.settings.set_night_mode(mode)?;
        self.night_mode = mode;
        info!("Night mode set to {:?}", mode);
        self.listeners
            .for_each_mut(|listener| listener.on_auto_night_mode_changed(mode));
        Ok(())
    }

    /// Switch to the account's night or day theme
    pub fn set_in_night_mode(&mut self, in_night: bool, force: bool) -> ThemeResult<ThemeChange> {
        if self.is_current_theme_dark() == in_night {
            return Ok(ThemeChange::Unchanged);
        }
        let saved = if in_night {
            self.settings.global_night_theme(self.account_id)?
        } else {
            self.settings.global_daylight_theme(self.account_id)?
        };
        let target = self.set.restore_theme_id_for_mode(saved, true, in_night);
        self.change_theme(target, force)
    }

    pub fn toggle_night_mode(&mut self) -> ThemeResult<ThemeChange> {
        self.set_in_night_mode(!self.is_current_theme_dark(), false)
    }

    /// Follow the night schedule at `time`. Does nothing unless scheduled mode is on.
    pub fn apply_night_schedule(&mut self, time: NaiveTime) -> ThemeResult<ThemeChange> {
        if self.night_mode != NightMode::Scheduled {
            return Ok(ThemeChange::Unchanged);
        }
        let in_night = self.night.schedule.contains(time);
        self.set_in_night_mode(in_night, true)
    }

    // -- Accounts --

    /// Make `account_id` current and switch to its theme. While night mode is on, the
    /// account's theme for the current darkness is used instead.
    pub fn switch_account(&mut self, account_id: i32) -> ThemeResult<ThemeChange> {
        if account_id == self.account_id {
            return Ok(ThemeChange::Unchanged);
        }
        self.account_id = account_id;
        info!("Switched to account {}", account_id);

        let mut target = self.settings.global_theme(account_id)?;
        if self.night_mode != NightMode::None {
            let is_dark = self.is_current_theme_dark();
            let saved = if is_dark {
                self.settings.global_night_theme(account_id)?
            } else {
                self.settings.global_daylight_theme(account_id)?
            };
            target = self.set.restore_theme_id_for_mode(saved, true, is_dark);
            self.settings.set_global_theme(account_id, target, is_dark)?;
        }
        let target = self.set.restore_theme_id(target, true);
        self.change_theme(target, true)
    }

    // -- Custom themes --

    /// Create a custom theme on top of the builtin root of `parent`, optionally copying
    /// the overrides of another custom theme
    pub fn new_custom_theme(
        &mut self,
        name: &str,
        parent: ThemeId,
        inherit_from: Option<ThemeId>,
    ) -> ThemeResult<ThemeId> {
        let parent = if parent.is_builtin() {
            parent
        } else {
            let handle = self.set.get_or_load(parent)?;
            let root = self.set.theme(handle).property(PropertyId::ParentTheme);
            restore_builtin_theme_id(root as i32)
        };
        let inherit_from = inherit_from.and_then(ThemeId::custom_index);
        let index = self.set.store().create(name, parent, inherit_from)?;
        let id = ThemeId::from_custom_index(index)?;
        info!("Created custom theme {} '{}' on {}", id, name, parent);
        Ok(id)
    }

    pub fn rename_custom_theme(&mut self, id: ThemeId, name: &str) -> ThemeResult<()> {
        let index = custom_index(id)?;
        self.set.store().rename(index, name)?;
        if let Some(handle) = self.set.handle_of(id) {
            self.set.custom_mut(handle)?.set_name(name.to_string());
        }
        Ok(())
    }

    /// Delete a custom theme. When it is current, `fallback` is switched to first; if
    /// that switch needs confirmation nothing is deleted and `false` is returned.
    pub fn remove_custom_theme(&mut self, id: ThemeId, fallback: ThemeId) -> ThemeResult<bool> {
        let index = custom_index(id)?;
        if !self.set.store().exists(index)? {
            return Err(ThemeError::CustomThemeNotFound(id.raw()));
        }
        let usage = match self.set.wallpaper_usage_identifier(id) {
            Ok(usage) => usage,
            Err(e) => {
                warn!("Failed to read background slot of {}: {}", id, e);
                0
            }
        };

        if self.is_current_theme(id)
            && self.change_theme(fallback, false)? == ThemeChange::NeedsConfirmation
        {
            return Ok(false);
        }

        self.set.store().remove(index)?;
        self.set.forget(id);
        let replaced = self.settings.replace_theme_id(id, fallback)?;
        if usage >= 2 {
            self.clear_background(usage)?;
        }
        info!("Removed custom theme {} ({} selections moved to {})", id, replaced, fallback);
        Ok(true)
    }

    /// Start editing `color` of a custom theme, with its saved edit history
    pub fn begin_color_edit(&mut self, id: ThemeId, color: ColorId) -> ThemeResult<ColorState> {
        let index = custom_index(id)?;
        let handle = self.set.get_or_load(id)?;
        let theme = self.set.theme(handle);
        let parent = theme.parent().ok_or(ThemeError::NotCustom(id.raw()))?;
        let history = self.set.store().color_history(index, color)?;
        Ok(ColorState::new(
            color,
            parent.color(color),
            theme.color(color),
            history,
        ))
    }

    /// Show the color at the cursor of `state` on its custom theme.
    ///
    /// Provisional edits only touch the loaded theme. Final edits also persist the
    /// color (an override equal to the parent's color is removed) and the edit history.
    pub fn apply_color_edit(
        &mut self,
        id: ThemeId,
        state: &ColorState,
        is_temporary: bool,
    ) -> ThemeResult<()> {
        let index = custom_index(id)?;
        let handle = self.set.get_or_load(id)?;
        let color = state.color_id();
        let value = state.color();
        let inherited = self.set.theme(handle).parent().map(|parent| parent.color(color));
        let value = if inherited == Some(value) { None } else { Some(value) };

        self.set.custom_mut(handle)?.set_color(color, value);
        if !is_temporary {
            let store = self.set.store();
            let mut batch = StoreBatch::new();
            store.stage_color(&mut batch, index, color, value);
            if state.is_history_changed() {
                store.stage_color_history(&mut batch, index, color, state.new_stack().as_deref());
            }
            store.apply(batch)?;
            debug!("Saved {} of {}", color, id);
        }

        if self.is_current_theme(id) {
            self.notify_colors_changed(is_temporary, Some(state));
        }
        if !is_temporary {
            self.set.custom_mut(handle)?.clear_recent_changes();
        }
        Ok(())
    }

    /// Set or clear (`None`) a property override of a custom theme. Returns the
    /// effective value.
    pub fn set_custom_property(
        &mut self,
        id: ThemeId,
        property: PropertyId,
        value: Option<f32>,
    ) -> ThemeResult<f32> {
        let index = custom_index(id)?;
        let handle = self.set.get_or_load(id)?;
        let effective = self.set.set_custom_property(handle, property, value)?;
        let stored = if property == PropertyId::ParentTheme {
            Some(effective)
        } else {
            value.map(|value| normalize(property, value))
        };
        self.set.store().set_property(index, property, stored)?;

        if self.is_current_theme(id) {
            let is_default = if property == PropertyId::ParentTheme {
                effective == DEFAULT_THEME.theme_id().raw() as f32
            } else {
                self.set
                    .theme(handle)
                    .parent()
                    .map_or(true, |parent| parent.property(property) == effective)
            };
            self.listeners.for_each_mut(|listener| {
                listener.on_theme_property_changed(id, property, effective, is_default)
            });
            self.notify_colors_changed(false, None);
        }
        Ok(effective)
    }

    /// Set or clear the default background name of a custom theme
    pub fn set_custom_wallpaper(&mut self, id: ThemeId, wallpaper: Option<&str>) -> ThemeResult<()> {
        let index = custom_index(id)?;
        let handle = self.set.get_or_load(id)?;
        self.set.store().set_wallpaper(index, wallpaper)?;
        self.set
            .custom_mut(handle)?
            .set_wallpaper(wallpaper.map(str::to_string));
        Ok(())
    }

    // -- Backgrounds --

    /// Background stored in `usage` for the current account
    pub fn background(&self, usage: i32) -> ThemeResult<Option<Background>> {
        Ok(background::restore(self.kv.as_ref(), self.account_id, usage)?)
    }

    /// Background of the applied theme; the theme's default wallpaper when its slot is
    /// empty
    pub fn current_background(&self) -> ThemeResult<Background> {
        let theme = self.applied_theme();
        if let Some(background) = self.background(theme.wallpaper_usage_identifier())? {
            return Ok(background);
        }
        Ok(match theme.default_wallpaper() {
            Some(name) => Background::new_unknown(self.account_id, name),
            None => Background::new_empty(self.account_id),
        })
    }

    pub fn set_background(&self, usage: i32, background: &Background) -> ThemeResult<()> {
        background::save(self.kv.as_ref(), background, usage)?;
        Ok(())
    }

    /// Forget the background in `usage`, so the theme default applies again
    pub fn clear_background(&self, usage: i32) -> ThemeResult<()> {
        background::delete_slot(self.kv.as_ref(), self.account_id, usage)?;
        Ok(())
    }

    // -- Observers --

    pub fn subscribe(&mut self, listener: Box<dyn ThemeChangeListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription).is_some()
    }

    /// Call `apply` with the color on every change until it returns `false`
    pub fn bind_color(&mut self, color: ColorId, apply: impl FnMut(Argb, bool) -> bool + 'static) {
        self.bindings.bind(color, apply);
    }

    fn notify_theme_changed(&mut self) {
        let ThemeState::Transitioning(delegate) = &self.state else {
            return;
        };
        let temp = ThemeRef::new(&self.set, delegate);
        let (from, to) = (temp.from_theme(), temp.to_theme());
        self.listeners
            .for_each_mut(|listener| listener.on_theme_changed(from, to));
    }

    fn notify_colors_changed(&mut self, is_temporary: bool, state: Option<&ColorState>) {
        let theme = current_ref(&self.set, &self.state, true);
        self.bindings.apply(theme, is_temporary);
        self.listeners.for_each_mut(|listener| {
            if !is_temporary || listener.needs_temporary_updates() {
                listener.on_theme_colors_changed(theme, is_temporary, state);
            }
        });
    }
}

fn custom_index(id: ThemeId) -> ThemeResult<i32> {
    id.custom_index().ok_or(ThemeError::NotCustom(id.raw()))
}

fn load_or_default(set: &mut ThemeSet, saved: ThemeId) -> ThemeResult<ThemeHandle> {
    let id = set.restore_theme_id(saved, true);
    match set.get_or_load(id) {
        Ok(handle) => Ok(handle),
        Err(e) if !e.is_programmer_error() => {
            warn!("Failed to load theme {}: {}, using default", id, e);
            let fallback = set.default_theme(true);
            set.get_or_load(fallback)
        }
        Err(e) => Err(e),
    }
}
