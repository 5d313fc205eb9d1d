//! Theme delegates
//!
//! A delegate answers "which color/property is active" for one theme. Parents are
//! handles into the owning [`ThemeSet`]; reads go through [`ThemeRef`], which pairs a
//! delegate with the set it resolves against.

use std::collections::{HashMap, HashSet};

use super::builtin::BuiltinPalette;
use super::ids::{ColorId, PropertyId, ThemeId};
use super::property::is_static_property;
use super::registry::ThemeSet;
use crate::color::{self, Argb};

/// Index of a delegate inside a [`ThemeSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThemeHandle(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct BuiltinTheme {
    palette: &'static BuiltinPalette,
}

impl BuiltinTheme {
    pub(crate) fn new(palette: &'static BuiltinPalette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &'static BuiltinPalette {
        self.palette
    }
}

/// Sparse overrides on top of a builtin parent
#[derive(Debug, Clone)]
pub struct CustomTheme {
    id: ThemeId,
    name: String,
    parent: ThemeHandle,
    colors: HashMap<ColorId, Argb>,
    properties: HashMap<PropertyId, f32>,
    wallpaper: Option<String>,
    recently_changed: HashSet<ColorId>,
}

impl CustomTheme {
    pub(crate) fn new(
        id: ThemeId,
        name: String,
        parent: ThemeHandle,
        colors: HashMap<ColorId, Argb>,
        properties: HashMap<PropertyId, f32>,
        wallpaper: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            parent,
            colors,
            properties,
            wallpaper,
            recently_changed: HashSet::new(),
        }
    }

    pub fn id(&self) -> ThemeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn parent(&self) -> ThemeHandle {
        self.parent
    }

    pub(crate) fn relink(&mut self, parent: ThemeHandle) {
        self.parent = parent;
    }

    pub fn color_override(&self, color: ColorId) -> Option<Argb> {
        self.colors.get(&color).copied()
    }

    pub fn property_override(&self, property: PropertyId) -> Option<f32> {
        self.properties.get(&property).copied()
    }

    pub fn wallpaper(&self) -> Option<&str> {
        self.wallpaper.as_deref()
    }

    pub(crate) fn set_wallpaper(&mut self, wallpaper: Option<String>) {
        self.wallpaper = wallpaper;
    }

    /// Set or clear a color override, marking it as recently changed
    pub(crate) fn set_color(&mut self, color: ColorId, value: Option<Argb>) {
        match value {
            Some(value) => self.colors.insert(color, value),
            None => self.colors.remove(&color),
        };
        self.recently_changed.insert(color);
    }

    /// Set or clear a property override. The parent link is not a stored property.
    pub(crate) fn set_property(&mut self, property: PropertyId, value: Option<f32>) {
        debug_assert_ne!(property, PropertyId::ParentTheme);
        match value {
            Some(value) => self.properties.insert(property, value),
            None => self.properties.remove(&property),
        };
    }

    pub fn has_recently_changed(&self, color: ColorId) -> bool {
        self.recently_changed.contains(&color)
    }

    pub(crate) fn clear_recent_changes(&mut self) {
        self.recently_changed.clear();
    }

    pub fn overridden_colors(&self) -> impl Iterator<Item = (ColorId, Argb)> + '_ {
        self.colors.iter().map(|(k, v)| (*k, *v))
    }
}

/// Pass-through to another theme under a legacy id
#[derive(Debug, Clone)]
pub struct InheritedTheme {
    id: ThemeId,
    parent: ThemeHandle,
}

impl InheritedTheme {
    pub(crate) fn new(id: ThemeId, parent: ThemeHandle) -> Self {
        Self { id, parent }
    }

    pub fn parent(&self) -> ThemeHandle {
        self.parent
    }
}

/// Resolved colors and properties of a theme, frozen at one moment
#[derive(Debug, Clone)]
pub struct ThemeSnapshot {
    id: ThemeId,
    colors: Vec<Argb>,
    properties: Vec<f32>,
    is_dark: bool,
    light_status_bar: bool,
    wallpaper_usage: i32,
    default_wallpaper: Option<String>,
}

impl ThemeSnapshot {
    /// Read every color and property of `theme` as it currently resolves
    pub fn capture(theme: ThemeRef<'_>) -> Self {
        Self {
            id: theme.id(),
            colors: ColorId::ALL.iter().map(|color| theme.color(*color)).collect(),
            properties: PropertyId::ALL
                .iter()
                .map(|property| theme.property(*property))
                .collect(),
            is_dark: theme.is_dark(),
            light_status_bar: theme.need_light_status_bar(),
            wallpaper_usage: theme.wallpaper_usage_identifier(),
            default_wallpaper: theme.default_wallpaper().map(str::to_owned),
        }
    }
}

/// Snapshot wrapped as a delegate. Never refers to another delegate, so a chain of
/// interrupted cross-fades stays one level deep.
#[derive(Debug, Clone)]
pub struct FrozenTheme(Box<ThemeDelegate>);

impl FrozenTheme {
    pub fn capture(theme: ThemeRef<'_>) -> Self {
        Self(Box::new(ThemeDelegate::Snapshot(ThemeSnapshot::capture(theme))))
    }

    pub fn delegate(&self) -> &ThemeDelegate {
        &self.0
    }
}

/// Where a cross-fade starts from
#[derive(Debug, Clone)]
pub enum ThemeSource {
    Stored(ThemeHandle),
    /// What was on screen when a running cross-fade was interrupted
    Frozen(FrozenTheme),
}

/// Interpolation between two themes while switching
#[derive(Debug, Clone)]
pub struct TemporaryTheme {
    from: ThemeSource,
    to: ThemeHandle,
    factor: f32,
}

impl TemporaryTheme {
    pub fn new(from: ThemeSource, to: ThemeHandle) -> Self {
        Self {
            from,
            to,
            factor: 0.0,
        }
    }

    pub fn from(&self) -> &ThemeSource {
        &self.from
    }

    pub fn to(&self) -> ThemeHandle {
        self.to
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Returns whether the factor changed
    pub fn set_factor(&mut self, factor: f32) -> bool {
        let factor = factor.max(0.0).min(1.0);
        if self.factor != factor {
            self.factor = factor;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub enum ThemeDelegate {
    Builtin(BuiltinTheme),
    Custom(CustomTheme),
    Inherited(InheritedTheme),
    Temporary(TemporaryTheme),
    Snapshot(ThemeSnapshot),
}

impl ThemeDelegate {
    pub fn id(&self) -> ThemeId {
        match self {
            ThemeDelegate::Builtin(theme) => theme.palette.id().theme_id(),
            ThemeDelegate::Custom(theme) => theme.id,
            ThemeDelegate::Inherited(theme) => theme.id,
            ThemeDelegate::Temporary(_) => ThemeId::TEMPORARY,
            ThemeDelegate::Snapshot(snapshot) => snapshot.id,
        }
    }

    pub fn as_custom(&self) -> Option<&CustomTheme> {
        match self {
            ThemeDelegate::Custom(theme) => Some(theme),
            _ => None,
        }
    }

    pub(crate) fn as_custom_mut(&mut self) -> Option<&mut CustomTheme> {
        match self {
            ThemeDelegate::Custom(theme) => Some(theme),
            _ => None,
        }
    }

    pub fn as_temporary(&self) -> Option<&TemporaryTheme> {
        match self {
            ThemeDelegate::Temporary(theme) => Some(theme),
            _ => None,
        }
    }
}

/// A delegate resolved against its [`ThemeSet`]
#[derive(Clone, Copy)]
pub struct ThemeRef<'a> {
    set: &'a ThemeSet,
    delegate: &'a ThemeDelegate,
}

impl<'a> ThemeRef<'a> {
    pub(crate) fn new(set: &'a ThemeSet, delegate: &'a ThemeDelegate) -> Self {
        Self { set, delegate }
    }

    pub fn delegate(&self) -> &'a ThemeDelegate {
        self.delegate
    }

    pub fn id(&self) -> ThemeId {
        self.delegate.id()
    }

    fn resolve(&self, handle: ThemeHandle) -> ThemeRef<'a> {
        self.set.theme(handle)
    }

    fn source(&self, source: &'a ThemeSource) -> ThemeRef<'a> {
        match source {
            ThemeSource::Stored(handle) => self.resolve(*handle),
            ThemeSource::Frozen(frozen) => ThemeRef::new(self.set, frozen.delegate()),
        }
    }

    /// Start of a cross-fade; `self` for anything else
    pub fn from_theme(&self) -> ThemeRef<'a> {
        match self.delegate {
            ThemeDelegate::Temporary(theme) => self.source(&theme.from),
            _ => *self,
        }
    }

    /// End of a cross-fade; `self` for anything else
    pub fn to_theme(&self) -> ThemeRef<'a> {
        match self.delegate {
            ThemeDelegate::Temporary(theme) => self.resolve(theme.to),
            _ => *self,
        }
    }

    /// Direct parent of a custom or inherited theme
    pub fn parent(&self) -> Option<ThemeRef<'a>> {
        match self.delegate {
            ThemeDelegate::Custom(theme) => Some(self.resolve(theme.parent)),
            ThemeDelegate::Inherited(theme) => Some(self.resolve(theme.parent)),
            _ => None,
        }
    }

    pub fn color(&self, color: ColorId) -> Argb {
        match self.delegate {
            ThemeDelegate::Builtin(theme) => theme.palette.color(color),
            ThemeDelegate::Snapshot(snapshot) => snapshot.colors[color.index()],
            ThemeDelegate::Custom(theme) => match theme.colors.get(&color) {
                Some(value) => *value,
                None => self.resolve(theme.parent).color(color),
            },
            ThemeDelegate::Inherited(theme) => self.resolve(theme.parent).color(color),
            ThemeDelegate::Temporary(theme) => {
                if theme.factor <= 0.0 {
                    self.source(&theme.from).color(color)
                } else if theme.factor >= 1.0 {
                    self.resolve(theme.to).color(color)
                } else {
                    color::blend(
                        self.source(&theme.from).color(color),
                        self.resolve(theme.to).color(color),
                        theme.factor,
                    )
                }
            }
        }
    }

    pub fn property(&self, property: PropertyId) -> f32 {
        match self.delegate {
            ThemeDelegate::Builtin(theme) => theme.palette.property(property),
            ThemeDelegate::Snapshot(snapshot) => snapshot.properties[property.index()],
            ThemeDelegate::Custom(theme) => {
                if property == PropertyId::ParentTheme {
                    return self.resolve(theme.parent).id().raw() as f32;
                }
                match theme.properties.get(&property) {
                    Some(value) => *value,
                    None => self.resolve(theme.parent).property(property),
                }
            }
            ThemeDelegate::Inherited(theme) => {
                let parent = self.resolve(theme.parent);
                if property == PropertyId::ParentTheme {
                    parent.id().raw() as f32
                } else {
                    parent.property(property)
                }
            }
            ThemeDelegate::Temporary(theme) => {
                let to = self.resolve(theme.to);
                if theme.factor >= 1.0 || is_static_property(property) {
                    to.property(property)
                } else {
                    let from = self.source(&theme.from).property(property);
                    if theme.factor <= 0.0 {
                        from
                    } else {
                        color::lerp(from, to.property(property), theme.factor)
                    }
                }
            }
        }
    }

    pub fn is_dark(&self) -> bool {
        match self.delegate {
            ThemeDelegate::Temporary(theme) => self.resolve(theme.to).is_dark(),
            ThemeDelegate::Snapshot(snapshot) => snapshot.is_dark,
            _ => self.property(PropertyId::Dark) == 1.0,
        }
    }

    pub fn need_light_status_bar(&self) -> bool {
        match self.delegate {
            ThemeDelegate::Temporary(theme) => self.resolve(theme.to).need_light_status_bar(),
            ThemeDelegate::Snapshot(snapshot) => snapshot.light_status_bar,
            _ => self.property(PropertyId::LightStatusBar) == 1.0,
        }
    }

    /// Background name shown when the user has not picked one
    pub fn default_wallpaper(&self) -> Option<&'a str> {
        match self.delegate {
            ThemeDelegate::Builtin(theme) => theme.palette.default_wallpaper(),
            ThemeDelegate::Custom(theme) => match &theme.wallpaper {
                Some(wallpaper) => Some(wallpaper.as_str()),
                None => self.resolve(theme.parent).default_wallpaper(),
            },
            ThemeDelegate::Inherited(theme) => self.resolve(theme.parent).default_wallpaper(),
            ThemeDelegate::Temporary(theme) => self.resolve(theme.to).default_wallpaper(),
            ThemeDelegate::Snapshot(snapshot) => snapshot.default_wallpaper.as_deref(),
        }
    }

    /// Background usage slot: 0 shared light, 1 shared dark, `2 + custom index` for a
    /// theme-specific slot
    pub fn wallpaper_usage_identifier(&self) -> i32 {
        if let ThemeDelegate::Snapshot(snapshot) = self.delegate {
            return snapshot.wallpaper_usage;
        }
        let usage = self.property(PropertyId::WallpaperUsageId) as i32;
        if usage == 2 {
            2 + self.id().custom_index().unwrap_or(0)
        } else {
            usage
        }
    }

    pub fn as_custom(&self) -> Option<&'a CustomTheme> {
        self.delegate.as_custom()
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.delegate, ThemeDelegate::Temporary(_))
    }
}

impl std::fmt::Debug for ThemeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeRef").field("id", &self.id()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ThemesConfig;
    use crate::storage::{MemoryStore, ThemeStore};
    use crate::theme::builtin;
    use crate::theme::ids::BuiltinId;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn set_with(config: &ThemesConfig) -> ThemeSet {
        ThemeSet::new(ThemeStore::new(Arc::new(MemoryStore::new())), config)
    }

    fn set() -> ThemeSet {
        set_with(&ThemesConfig::default())
    }

    fn load(set: &mut ThemeSet, id: BuiltinId) -> ThemeHandle {
        set.get_or_load(id.theme_id()).unwrap()
    }

    /// Custom theme on `parent`, created through the store and loaded into `set`
    fn custom(set: &mut ThemeSet, parent: BuiltinId) -> (i32, ThemeHandle) {
        let index = set.store().create("Mine", parent.theme_id(), None).unwrap();
        let handle = set
            .get_or_load(ThemeId::from_custom_index(index).unwrap())
            .unwrap();
        (index, handle)
    }

    fn transition(from: ThemeHandle, to: ThemeHandle, factor: f32) -> ThemeDelegate {
        let mut temp = TemporaryTheme::new(ThemeSource::Stored(from), to);
        temp.set_factor(factor);
        ThemeDelegate::Temporary(temp)
    }

    #[test]
    fn test_light_status_bar() {
        let mut set = set();
        let white_black = load(&mut set, BuiltinId::WhiteBlack);
        let classic = load(&mut set, BuiltinId::Classic);
        assert!(set.theme(white_black).need_light_status_bar());
        assert!(!set.theme(classic).need_light_status_bar());

        let leaving = transition(white_black, classic, 0.0);
        assert!(!ThemeRef::new(&set, &leaving).need_light_status_bar());
        let entering = transition(classic, white_black, 0.0);
        assert!(ThemeRef::new(&set, &entering).need_light_status_bar());
    }

    #[test]
    fn test_darkness_follows_target_during_transition() {
        let mut set = set();
        let classic = load(&mut set, BuiltinId::Classic);
        let night = load(&mut set, BuiltinId::NightBlack);

        for factor in [0.0, 0.3, 1.0] {
            assert!(ThemeRef::new(&set, &transition(classic, night, factor)).is_dark());
            assert!(!ThemeRef::new(&set, &transition(night, classic, factor)).is_dark());
        }
    }

    #[test]
    fn test_wallpaper_usage_identifier() {
        let mut set = set();
        let classic = load(&mut set, BuiltinId::Classic);
        let night = load(&mut set, BuiltinId::NightBlue);
        assert_eq!(set.theme(classic).wallpaper_usage_identifier(), 0);
        assert_eq!(set.theme(night).wallpaper_usage_identifier(), 1);

        let index = set.store().create("Own", BuiltinId::Classic.theme_id(), None).unwrap();
        set.store()
            .set_property(index, PropertyId::WallpaperUsageId, Some(2.0))
            .unwrap();
        let own = set
            .get_or_load(ThemeId::from_custom_index(index).unwrap())
            .unwrap();
        assert_eq!(set.theme(own).wallpaper_usage_identifier(), 2 + index);

        // A shared-slot custom theme keeps its parent's slot
        let (_, shared) = custom(&mut set, BuiltinId::NightBlack);
        assert_eq!(set.theme(shared).wallpaper_usage_identifier(), 1);
    }

    #[test]
    fn test_custom_colors_override_then_fall_back() {
        let mut set = set();
        let index = set.store().create("Tinted", BuiltinId::Red.theme_id(), None).unwrap();
        set.store()
            .set_color(index, ColorId::Filling, Some(0xff12_3456))
            .unwrap();
        let handle = set
            .get_or_load(ThemeId::from_custom_index(index).unwrap())
            .unwrap();
        let theme = set.theme(handle);
        let red = builtin::palette(BuiltinId::Red);

        assert_eq!(theme.color(ColorId::Filling), 0xff12_3456);
        assert_eq!(theme.as_custom().unwrap().color_override(ColorId::Filling), Some(0xff12_3456));
        assert_eq!(theme.color(ColorId::Background), red.color(ColorId::Background));
        assert_eq!(theme.as_custom().unwrap().color_override(ColorId::Background), None);
        assert_eq!(theme.property(PropertyId::BubbleCorner), red.property(PropertyId::BubbleCorner));
    }

    #[test]
    fn test_parent_theme_is_the_parent_id() {
        let mut aliases = BTreeMap::new();
        aliases.insert("-40".to_string(), BuiltinId::Cyan as i32);
        let mut set = set_with(&ThemesConfig {
            aliases,
            ..ThemesConfig::default()
        });

        let (_, handle) = custom(&mut set, BuiltinId::Green);
        let theme = set.theme(handle);
        assert_eq!(
            theme.property(PropertyId::ParentTheme),
            BuiltinId::Green.theme_id().raw() as f32
        );
        assert_eq!(theme.parent().map(|p| p.id()), Some(BuiltinId::Green.theme_id()));

        let alias = set.get_or_load(ThemeId(-40)).unwrap();
        let alias = set.theme(alias);
        assert_eq!(alias.id(), ThemeId(-40));
        assert_eq!(
            alias.property(PropertyId::ParentTheme),
            BuiltinId::Cyan.theme_id().raw() as f32
        );
        let cyan = builtin::palette(BuiltinId::Cyan);
        assert_eq!(alias.color(ColorId::HeaderBackground), cyan.color(ColorId::HeaderBackground));
        assert_eq!(alias.property(PropertyId::ShadowDepth), cyan.property(PropertyId::ShadowDepth));
    }

    #[test]
    fn test_interpolation_endpoints_and_midpoint() {
        let mut set = set();
        let red = load(&mut set, BuiltinId::Red);
        let night = load(&mut set, BuiltinId::NightBlue);
        let from = set.theme(red);
        let to = set.theme(night);

        let start = transition(red, night, 0.0);
        let view = ThemeRef::new(&set, &start);
        for color in ColorId::ALL {
            assert_eq!(view.color(*color), from.color(*color));
        }
        assert_eq!(view.property(PropertyId::ShadowDepth), from.property(PropertyId::ShadowDepth));

        let middle = transition(red, night, 0.5);
        let view = ThemeRef::new(&set, &middle);
        for color in ColorId::ALL {
            assert_eq!(
                view.color(*color),
                color::blend(from.color(*color), to.color(*color), 0.5)
            );
        }
        assert_eq!(
            view.property(PropertyId::ShadowDepth),
            color::lerp(
                from.property(PropertyId::ShadowDepth),
                to.property(PropertyId::ShadowDepth),
                0.5
            )
        );

        let end = transition(red, night, 1.0);
        let view = ThemeRef::new(&set, &end);
        for color in ColorId::ALL {
            assert_eq!(view.color(*color), to.color(*color));
        }
        assert_eq!(view.from_theme().id(), BuiltinId::Red.theme_id());
        assert_eq!(view.to_theme().id(), BuiltinId::NightBlue.theme_id());
    }

    #[test]
    fn test_static_properties_come_from_target() {
        let mut set = set();
        let classic = load(&mut set, BuiltinId::Classic);
        let night = load(&mut set, BuiltinId::NightBlue);
        let start = transition(classic, night, 0.0);
        let view = ThemeRef::new(&set, &start);

        for property in [PropertyId::WallpaperUsageId, PropertyId::WallpaperId] {
            assert_eq!(view.property(property), set.theme(night).property(property));
        }
        assert_eq!(view.wallpaper_usage_identifier(), 1);
        assert_eq!(view.default_wallpaper(), None);
    }

    #[test]
    fn test_default_wallpaper_falls_back_to_parent() {
        let mut set = set();
        let classic = load(&mut set, BuiltinId::Classic);
        let classic_wallpaper = set.theme(classic).default_wallpaper().map(str::to_owned);
        assert!(classic_wallpaper.is_some());

        let (index, handle) = custom(&mut set, BuiltinId::Classic);
        assert_eq!(
            set.theme(handle).default_wallpaper(),
            classic_wallpaper.as_deref()
        );

        set.store().set_wallpaper(index, Some("own-wallpaper")).unwrap();
        set.forget(ThemeId::from_custom_index(index).unwrap());
        let reloaded = set
            .get_or_load(ThemeId::from_custom_index(index).unwrap())
            .unwrap();
        assert_eq!(set.theme(reloaded).default_wallpaper(), Some("own-wallpaper"));

        let (_, night_custom) = custom(&mut set, BuiltinId::NightBlue);
        assert_eq!(set.theme(night_custom).default_wallpaper(), None);
    }

    #[test]
    fn test_snapshot_keeps_resolved_values() {
        let mut set = set();
        let red = load(&mut set, BuiltinId::Red);
        let night = load(&mut set, BuiltinId::NightBlack);
        let running = transition(red, night, 0.4);
        let live = ThemeRef::new(&set, &running);

        let frozen = FrozenTheme::capture(live);
        let snapshot = ThemeRef::new(&set, frozen.delegate());
        assert_eq!(snapshot.id(), ThemeId::TEMPORARY);
        for color in ColorId::ALL {
            assert_eq!(snapshot.color(*color), live.color(*color));
        }
        for property in PropertyId::ALL {
            assert_eq!(snapshot.property(*property), live.property(*property));
        }
        assert!(snapshot.is_dark());
        assert!(snapshot.parent().is_none());
        assert_eq!(snapshot.wallpaper_usage_identifier(), live.wallpaper_usage_identifier());
    }
}
