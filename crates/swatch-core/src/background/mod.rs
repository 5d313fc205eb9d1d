//! Chat backgrounds
//!
//! A background is one of:
//! - empty (no background)
//! - a local image picked by the user
//! - a fill (solid, two-color gradient, or freeform gradient)
//! - a pattern drawn over a fill
//! - a remote wallpaper image
//!
//! Remote content is addressed by name. Fills synthesize their name from their colors,
//! so equal fills always share one name.

pub mod legacy;
pub mod persist;
pub mod resolve;

use once_cell::unsync::OnceCell;
use std::path::{Path, PathBuf};

use crate::color::{self, Argb};
use crate::constants::images::{BLURRED_TARGET_SIZE, LOCAL_PREVIEW_SIZE_DP, MAX_TARGET_SIZE};
use crate::theme::ThemeRef;

pub use persist::{delete_slot, restore, save, slot_prefix};
pub use resolve::{
    resolve_preview, resolve_target, BackgroundFetcher, RemoteBackground, RemoteFile,
};

pub(crate) const BACKGROUND_TYPE_FILL: i64 = 1;
pub(crate) const BACKGROUND_TYPE_WALLPAPER: i64 = 2;
pub(crate) const BACKGROUND_TYPE_PATTERN: i64 = 3;

pub(crate) const FILL_TYPE_SOLID: i64 = 1;
pub(crate) const FILL_TYPE_GRADIENT: i64 = 2;
pub(crate) const FILL_TYPE_FREEFORM: i64 = 3;

/// Color payload of fills and patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundFill {
    Solid(Argb),
    Gradient {
        top: Argb,
        bottom: Argb,
        rotation: i32,
    },
    /// Three or four stops
    Freeform(Vec<Argb>),
}

impl BackgroundFill {
    pub(crate) fn tag(&self) -> i64 {
        match self {
            BackgroundFill::Solid(_) => FILL_TYPE_SOLID,
            BackgroundFill::Gradient { .. } => FILL_TYPE_GRADIENT,
            BackgroundFill::Freeform(_) => FILL_TYPE_FREEFORM,
        }
    }

    /// Canonical content name: `rrggbb`, `top-bottom[?rotation=N]` or `a~b~c[~d]`
    pub fn name(&self) -> String {
        match self {
            BackgroundFill::Solid(color) => color::hex_name(*color),
            BackgroundFill::Gradient {
                top,
                bottom,
                rotation,
            } => {
                let mut name = format!("{}-{}", color::hex_name(*top), color::hex_name(*bottom));
                if *rotation != 0 {
                    name.push_str(&format!("?rotation={}", rotation));
                }
                name
            }
            BackgroundFill::Freeform(colors) => colors
                .iter()
                .map(|c| color::hex_name(*c))
                .collect::<Vec<_>>()
                .join("~"),
        }
    }

    /// Flat color standing in for the whole fill
    pub fn background_color(&self) -> Argb {
        match self {
            BackgroundFill::Solid(color) => opaque(*color),
            BackgroundFill::Gradient { top, bottom, .. } => center(opaque(*top), opaque(*bottom)),
            BackgroundFill::Freeform(colors) => match colors.len() {
                0 => 0,
                1 => opaque(colors[0]),
                2 => opaque(colors[1]),
                _ => opaque(colors[2]),
            },
        }
    }

    /// Tint for patterns and overlays drawn over this fill
    pub fn pattern_color(&self) -> Argb {
        match self {
            BackgroundFill::Solid(color) => pattern_color_for(*color),
            BackgroundFill::Gradient { top, bottom, .. } => {
                pattern_color_for(center(opaque(*top), opaque(*bottom)))
            }
            BackgroundFill::Freeform(colors) => {
                let center = freeform_center(colors);
                let pattern = pattern_color_for(center);
                if color::rgb_to_hsv(center)[2] < 0.3 {
                    pattern
                } else {
                    color::rgb(pattern) | 0x6400_0000
                }
            }
        }
    }
}

fn opaque(color: Argb) -> Argb {
    color::with_alpha(0xff, color)
}

fn center(a: Argb, b: Argb) -> Argb {
    color::blend(a, b, 0.5)
}

fn freeform_center(colors: &[Argb]) -> Argb {
    let mut stops = colors.iter().map(|c| opaque(*c));
    let Some(first) = stops.next() else {
        return 0;
    };
    stops.fold(first, center)
}

/// Push saturation up a little, then darken bright colors and lighten dark ones
fn pattern_color_for(color: Argb) -> Argb {
    let [hue, mut saturation, mut brightness] = color::rgb_to_hsv(color);
    if saturation > 0.0 || (brightness < 1.0 && brightness > 0.0) {
        saturation = (saturation + 0.05 + 0.1 * (1.0 - saturation)).min(1.0);
    }
    brightness = if brightness > 0.5 {
        (brightness * 0.65).max(0.0)
    } else {
        (1.0 - brightness * 0.65).clamp(0.0, 1.0)
    };
    color::hsv_to_rgb([hue, saturation, brightness], 0xff) & 0x66ff_ffff
}

/// What a background shows
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundKind {
    Empty,
    Custom {
        path: PathBuf,
    },
    Fill(BackgroundFill),
    Pattern {
        fill: BackgroundFill,
        /// Percent, never negative; see `is_inverted`
        intensity: i32,
        is_inverted: bool,
        is_moving: bool,
    },
    Wallpaper {
        is_blurred: bool,
        is_moving: bool,
    },
}

impl BackgroundKind {
    fn fill(&self) -> Option<&BackgroundFill> {
        match self {
            BackgroundKind::Fill(fill) | BackgroundKind::Pattern { fill, .. } => Some(fill),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Scale to cover the target
    Fit,
    /// Tile at natural size
    CenterRepeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Local(PathBuf),
    /// Remote content, fetched lazily by background name
    Remote { name: String },
}

/// Description of an image a renderer should load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub source: ImageSource,
    /// Cache key; for remote images `background_[preview_]<name>[_blurred]`
    pub key: String,
    pub size: u32,
    pub blur: bool,
    pub scale: ScaleMode,
}

#[derive(Debug, Clone)]
pub struct Background {
    account_id: i32,
    name: String,
    kind: BackgroundKind,
    is_vector: bool,
    legacy_wallpaper_id: i32,
    legacy_remote_id: Option<String>,
    document: Option<RemoteFile>,
    overlay_color: OnceCell<Argb>,
}

impl Background {
    fn build(account_id: i32, name: String, kind: BackgroundKind, is_vector: bool) -> Self {
        // Without a name or a local path there is nothing to draw
        let kind = match kind {
            BackgroundKind::Custom { path } if path.as_os_str().is_empty() => BackgroundKind::Empty,
            BackgroundKind::Custom { path } => BackgroundKind::Custom { path },
            _ if name.is_empty() => BackgroundKind::Empty,
            kind => kind,
        };
        let legacy_wallpaper_id = legacy::resolve_legacy_wallpaper_id(&name, Some(&kind));
        Self {
            account_id,
            name,
            kind,
            is_vector,
            legacy_wallpaper_id,
            legacy_remote_id: None,
            document: None,
            overlay_color: OnceCell::new(),
        }
    }

    pub fn new_empty(account_id: i32) -> Self {
        Self::build(account_id, String::new(), BackgroundKind::Empty, false)
    }

    /// Image picked from the local file system
    pub fn new_local(account_id: i32, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Self::new_empty(account_id);
        }
        Self::build(
            account_id,
            String::new(),
            BackgroundKind::Custom { path },
            false,
        )
    }

    pub fn new_fill(account_id: i32, fill: BackgroundFill) -> Self {
        Self::build(account_id, fill.name(), BackgroundKind::Fill(fill), false)
    }

    pub fn new_solid(account_id: i32, color: Argb) -> Self {
        Self::new_fill(account_id, BackgroundFill::Solid(color))
    }

    pub fn new_gradient(account_id: i32, top: Argb, bottom: Argb, rotation: i32) -> Self {
        Self::new_fill(
            account_id,
            BackgroundFill::Gradient {
                top,
                bottom,
                rotation,
            },
        )
    }

    pub fn new_freeform(account_id: i32, colors: Vec<Argb>) -> Self {
        Self::new_fill(account_id, BackgroundFill::Freeform(colors))
    }

    /// Background described by the backend. An empty name on a fill falls back to the
    /// fill's canonical name.
    pub fn from_remote(
        account_id: i32,
        name: impl Into<String>,
        kind: BackgroundKind,
        is_vector: bool,
        document: Option<RemoteFile>,
    ) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            if let BackgroundKind::Fill(fill) = &kind {
                name = fill.name();
            }
        }
        let mut background = Self::build(account_id, name, kind, is_vector);
        background.document = document;
        background
    }

    /// Background known only by name. Legacy names become their legacy background,
    /// anything else is treated as a plain wallpaper.
    pub fn new_unknown(account_id: i32, name: &str) -> Self {
        match legacy::resolve_legacy_wallpaper_id(name, None) {
            0 => Self::build(
                account_id,
                name.to_string(),
                BackgroundKind::Wallpaper {
                    is_blurred: false,
                    is_moving: false,
                },
                false,
            ),
            id => Self::new_legacy(account_id, id).unwrap_or_else(|| {
                Self::build(
                    account_id,
                    name.to_string(),
                    BackgroundKind::Wallpaper {
                        is_blurred: false,
                        is_moving: false,
                    },
                    false,
                )
            }),
        }
    }

    /// Background for a legacy id; `None` for ids without content
    pub fn new_legacy(account_id: i32, id: i32) -> Option<Self> {
        if id == legacy::ID_SOLID_BLUE {
            let mut background = Self::new_solid(account_id, legacy::COLOR_SOLID_BLUE);
            background.legacy_wallpaper_id = id;
            return Some(background);
        }
        let name = legacy::background_for_legacy_wallpaper_id(id)?;
        let mut background = Self::build(
            account_id,
            name.to_string(),
            BackgroundKind::Wallpaper {
                is_blurred: false,
                is_moving: false,
            },
            false,
        );
        background.legacy_wallpaper_id = id;
        Some(background)
    }

    /// Copy of `base` with the blur flag set on wallpapers. Local images are returned
    /// unchanged; no base means an empty background.
    pub fn new_blurred(account_id: i32, base: Option<&Background>, blur: bool) -> Self {
        let Some(base) = base else {
            return Self::new_empty(account_id);
        };
        if base.is_custom() {
            return base.clone();
        }
        let kind = match &base.kind {
            BackgroundKind::Wallpaper { is_moving, .. } => BackgroundKind::Wallpaper {
                is_blurred: blur,
                is_moving: *is_moving,
            },
            other => other.clone(),
        };
        Self {
            account_id: base.account_id,
            name: base.name.clone(),
            kind,
            is_vector: base.is_vector,
            legacy_wallpaper_id: base.legacy_wallpaper_id,
            legacy_remote_id: base.legacy_remote_id.clone(),
            document: None,
            overlay_color: OnceCell::new(),
        }
    }

    pub fn account_id(&self) -> i32 {
        self.account_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &BackgroundKind {
        &self.kind
    }

    /// True when there is neither a name nor a local path
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, BackgroundKind::Empty)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.kind, BackgroundKind::Custom { .. })
    }

    pub fn custom_path(&self) -> Option<&Path> {
        match &self.kind {
            BackgroundKind::Custom { path } => Some(path),
            _ => None,
        }
    }

    /// Whether the content has to come from the backend
    pub fn is_network(&self) -> bool {
        !self.is_custom() && !self.name.is_empty()
    }

    pub fn is_fill(&self) -> bool {
        matches!(self.kind, BackgroundKind::Fill(_))
    }

    pub fn is_fill_solid(&self) -> bool {
        matches!(self.kind, BackgroundKind::Fill(BackgroundFill::Solid(_)))
    }

    pub fn is_fill_gradient(&self) -> bool {
        matches!(self.kind, BackgroundKind::Fill(BackgroundFill::Gradient { .. }))
    }

    pub fn is_fill_freeform(&self) -> bool {
        matches!(self.kind, BackgroundKind::Fill(BackgroundFill::Freeform(_)))
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self.kind, BackgroundKind::Pattern { .. })
    }

    pub fn is_wallpaper(&self) -> bool {
        matches!(self.kind, BackgroundKind::Wallpaper { .. })
    }

    pub fn is_vector(&self) -> bool {
        self.is_vector
    }

    pub fn fill(&self) -> Option<&BackgroundFill> {
        self.kind.fill()
    }

    pub fn legacy_wallpaper_id(&self) -> i32 {
        self.legacy_wallpaper_id
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy_wallpaper_id != 0
    }

    pub fn is_cat(&self) -> bool {
        legacy::is_cat_id(self.legacy_wallpaper_id)
    }

    pub fn is_built_in(&self) -> bool {
        self.legacy_wallpaper_id == legacy::ID_CATS_BLUE
    }

    pub fn score(&self, is_dark: bool) -> i32 {
        legacy::legacy_score(self.legacy_wallpaper_id, is_dark)
    }

    /// Remote file id kept from the legacy wallpaper protocol
    pub fn legacy_remote_id(&self) -> Option<&str> {
        self.legacy_remote_id.as_deref()
    }

    pub fn set_legacy_remote_id(&mut self, remote_id: Option<String>) {
        self.legacy_remote_id = remote_id.filter(|id| !id.is_empty());
    }

    pub fn document(&self) -> Option<&RemoteFile> {
        self.document.as_ref()
    }

    pub fn set_document(&mut self, document: Option<RemoteFile>) {
        self.document = document;
    }

    /// Flat color for overlays; `default` for images
    pub fn background_color(&self, default: Argb) -> Argb {
        self.fill().map(BackgroundFill::background_color).unwrap_or(default)
    }

    /// Gradient top color, first freeform stop, or 0
    pub fn top_color(&self) -> Argb {
        match self.fill() {
            Some(BackgroundFill::Gradient { top, .. }) => *top,
            Some(BackgroundFill::Freeform(colors)) => colors.first().copied().unwrap_or(0),
            _ => 0,
        }
    }

    /// Gradient bottom color, last freeform stop, or 0
    pub fn bottom_color(&self) -> Argb {
        match self.fill() {
            Some(BackgroundFill::Gradient { bottom, .. }) => *bottom,
            Some(BackgroundFill::Freeform(colors)) => colors.last().copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn rotation_angle(&self) -> i32 {
        match self.fill() {
            Some(BackgroundFill::Gradient { rotation, .. }) => *rotation,
            _ => 0,
        }
    }

    pub fn freeform_colors(&self) -> &[Argb] {
        match self.fill() {
            Some(BackgroundFill::Freeform(colors)) => colors,
            _ => &[],
        }
    }

    /// Pattern color, computed once. `None` unless this is a pattern.
    pub fn pattern_color(&self) -> Option<Argb> {
        match &self.kind {
            BackgroundKind::Pattern { fill, .. } => {
                Some(*self.overlay_color.get_or_init(|| fill.pattern_color()))
            }
            _ => None,
        }
    }

    /// Overlay color for plain fills, computed once. `None` unless this is a fill.
    pub fn solid_overlay_color(&self) -> Option<Argb> {
        match &self.kind {
            BackgroundKind::Fill(fill) => {
                Some(*self.overlay_color.get_or_init(|| fill.pattern_color()))
            }
            _ => None,
        }
    }

    /// Theme-specific tint for legacy wallpapers
    pub fn legacy_overlay_color(&self, theme: ThemeRef<'_>, default: Argb) -> Argb {
        legacy::legacy_overlay_color(self.legacy_wallpaper_id, theme, default)
    }

    /// Pattern intensity in `[0, 1]`; 1 for everything but patterns
    pub fn intensity(&self) -> f32 {
        match &self.kind {
            BackgroundKind::Pattern { intensity, .. } => intensity.unsigned_abs() as f32 / 100.0,
            _ => 1.0,
        }
    }

    pub fn is_pattern_inverted(&self) -> bool {
        matches!(
            self.kind,
            BackgroundKind::Pattern {
                is_inverted: true,
                ..
            }
        )
    }

    pub fn is_moving(&self) -> bool {
        match &self.kind {
            BackgroundKind::Pattern { is_moving, .. }
            | BackgroundKind::Wallpaper { is_moving, .. } => *is_moving,
            _ => false,
        }
    }

    pub fn is_blurred(&self) -> bool {
        matches!(
            self.kind,
            BackgroundKind::Wallpaper {
                is_blurred: true,
                ..
            }
        )
    }

    fn remote_suffix(&self) -> &'static str {
        if self.is_blurred() {
            "_blurred"
        } else {
            ""
        }
    }

    /// Full-size image to draw, sized for a screen whose larger side is `screen_size`.
    /// Fills and empty backgrounds have none.
    pub fn target_image(&self, screen_size: u32) -> Option<ImageHandle> {
        match &self.kind {
            BackgroundKind::Empty | BackgroundKind::Fill(_) => None,
            BackgroundKind::Custom { path } => Some(ImageHandle {
                source: ImageSource::Local(path.clone()),
                key: path.display().to_string(),
                size: screen_size.min(MAX_TARGET_SIZE),
                blur: false,
                scale: ScaleMode::Fit,
            }),
            BackgroundKind::Pattern { .. } => Some(ImageHandle {
                source: ImageSource::Remote {
                    name: self.name.clone(),
                },
                key: format!("background_{}", self.name),
                size: screen_size,
                blur: false,
                scale: ScaleMode::CenterRepeat,
            }),
            BackgroundKind::Wallpaper { is_blurred, .. } => Some(ImageHandle {
                source: ImageSource::Remote {
                    name: self.name.clone(),
                },
                key: format!("background_{}{}", self.name, self.remote_suffix()),
                size: if *is_blurred {
                    BLURRED_TARGET_SIZE
                } else {
                    screen_size.min(MAX_TARGET_SIZE)
                },
                blur: *is_blurred,
                scale: ScaleMode::Fit,
            }),
        }
    }

    /// Small image shown while the target loads. `density` converts dp to pixels.
    pub fn preview_image(&self, density: f32) -> Option<ImageHandle> {
        match &self.kind {
            BackgroundKind::Empty | BackgroundKind::Fill(_) => None,
            BackgroundKind::Custom { path } => Some(ImageHandle {
                source: ImageSource::Local(path.clone()),
                key: path.display().to_string(),
                size: (LOCAL_PREVIEW_SIZE_DP as f32 * density).round() as u32,
                blur: false,
                scale: ScaleMode::Fit,
            }),
            BackgroundKind::Pattern { .. } | BackgroundKind::Wallpaper { .. } => {
                Some(ImageHandle {
                    source: ImageSource::Remote {
                        name: self.name.clone(),
                    },
                    key: format!("background_preview_{}{}", self.name, self.remote_suffix()),
                    size: 0,
                    blur: false,
                    scale: ScaleMode::Fit,
                })
            }
        }
    }

    /// Inline thumbnail delivered with the backend record, if any
    pub fn mini_thumbnail(&self) -> Option<&[u8]> {
        self.document
            .as_ref()
            .and_then(|doc| doc.mini_thumbnail.as_deref())
    }

    /// Equality as far as rendering is concerned: fills compare by their parameters,
    /// local images by path, everything else by kind and name
    pub fn compare(a: Option<&Background>, b: Option<&Background>) -> bool {
        let a_empty = a.map_or(true, Background::is_empty);
        let b_empty = b.map_or(true, Background::is_empty);
        if a_empty && b_empty {
            return true;
        }
        let (Some(a), Some(b)) = (a, b) else {
            return false;
        };
        if a_empty != b_empty {
            return false;
        }
        match (&a.kind, &b.kind) {
            (BackgroundKind::Custom { path: pa }, BackgroundKind::Custom { path: pb }) => pa == pb,
            (BackgroundKind::Fill(fa), BackgroundKind::Fill(fb)) => fa == fb,
            (ka, kb) => ka == kb && a.name == b.name,
        }
    }
}

impl PartialEq for Background {
    fn eq(&self, other: &Self) -> bool {
        Background::compare(Some(self), Some(other))
    }
}
