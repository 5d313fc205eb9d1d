//! Command handlers

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use swatch_core::color::{self, parse_hex};
use swatch_core::constants::animation::DEBUG_THEME_CHANGE_DURATION;
use swatch_core::theme::ThemeSet;
use swatch_core::{
    Background, BackgroundKind, ColorId, NightMode, PropertyId, ThemeChange, ThemeId,
    ThemeManager, ThemeRef,
};

use crate::{BackgroundCommands, CustomCommands, NightAction};

/// Colors printed by `swatch current`
const SUMMARY_COLORS: &[ColorId] = &[
    ColorId::Filling,
    ColorId::Background,
    ColorId::Text,
    ColorId::HeaderBackground,
    ColorId::BubbleOutBackground,
];

fn theme_label(theme: ThemeRef<'_>) -> String {
    match theme.as_custom() {
        Some(custom) => format!("{} [{}]", custom.name(), theme.id()),
        None => theme.id().to_string(),
    }
}

fn parse_color(value: &str) -> Result<u32> {
    parse_hex(value).ok_or_else(|| anyhow!("invalid color '{}', expected rrggbb or aarrggbb", value))
}

fn report(manager: &ThemeManager, target: ThemeId, change: ThemeChange) {
    match change {
        ThemeChange::Unchanged => println!("Already using {}", target),
        ThemeChange::NeedsConfirmation => println!(
            "Switching to {} turns off automatic night mode; pass --force to continue",
            target
        ),
        ThemeChange::Animated | ThemeChange::Applied => {
            println!("Switched to {}", theme_label(manager.applied_theme()))
        }
    }
}

pub fn list_themes(manager: &ThemeManager, extended: bool) -> Result<()> {
    let current = manager.current_theme_id();
    println!("Builtin themes:");
    for builtin in ThemeSet::builtin_ids(extended) {
        let id = builtin.theme_id();
        println!(
            "  {} {:<12} {}{}",
            if id == current { "*" } else { " " },
            builtin.key(),
            builtin.display_name(),
            if builtin.is_dark() { " (dark)" } else { "" }
        );
    }

    let custom = manager.themes().store().list()?;
    if !custom.is_empty() {
        println!();
        println!("Custom themes:");
        for info in custom {
            let id = info.theme_id();
            println!(
                "  {} custom:{:<5} {} (on {})",
                if id == current { "*" } else { " " },
                info.index,
                info.name,
                info.parent
            );
        }
    }
    Ok(())
}

pub fn show_current(manager: &ThemeManager) -> Result<()> {
    let theme = manager.current_theme();
    println!("Theme:      {}", theme_label(theme));
    println!("Dark:       {}", theme.is_dark());
    println!("Night mode: {:?}", manager.night_mode());
    println!("Background: slot {}", theme.wallpaper_usage_identifier());
    for color in SUMMARY_COLORS {
        println!("  {:<22} #{}", color.name(), color::hex_name(theme.color(*color)));
    }
    Ok(())
}

pub async fn switch(
    manager: &mut ThemeManager,
    theme: ThemeId,
    force: bool,
    animate: bool,
    slow: bool,
) -> Result<()> {
    if slow {
        manager.set_animation_duration(DEBUG_THEME_CHANGE_DURATION);
    }
    if animate {
        manager.set_foreground(true, Instant::now());
    }

    let change = if force {
        manager.confirm_theme_change(theme)?
    } else {
        manager.change_theme(theme, false)?
    };

    if change == ThemeChange::Animated {
        let mut frames = tokio::time::interval(Duration::from_millis(16));
        loop {
            frames.tick().await;
            let running = manager.tick(Instant::now());
            println!("  #{}", color::hex_name(manager.color(ColorId::Filling)));
            if !running {
                break;
            }
        }
    }
    report(manager, theme, change);
    Ok(())
}

pub fn night(manager: &mut ThemeManager, action: NightAction) -> Result<()> {
    let change = match action {
        NightAction::On => manager.set_in_night_mode(true, false)?,
        NightAction::Off => manager.set_in_night_mode(false, false)?,
        NightAction::Toggle => manager.toggle_night_mode()?,
        NightAction::Auto => {
            manager.set_night_mode(NightMode::Auto)?;
            println!("Night mode follows the system");
            return Ok(());
        }
        NightAction::Scheduled => {
            manager.set_night_mode(NightMode::Scheduled)?;
            manager.apply_night_schedule(chrono::Local::now().time())?
        }
        NightAction::Manual => {
            manager.set_night_mode(NightMode::None)?;
            println!("Night mode is off");
            return Ok(());
        }
    };
    let target = manager.current_theme_id();
    report(manager, target, change);
    Ok(())
}

pub fn custom(manager: &mut ThemeManager, action: CustomCommands) -> Result<()> {
    match action {
        CustomCommands::New { name, parent, from } => {
            let parent = parent.unwrap_or_else(|| manager.current_theme_id());
            let id = manager.new_custom_theme(&name, parent, from)?;
            println!("Created {} as custom:{}", name, id.custom_index().unwrap_or(0));
        }
        CustomCommands::Remove { theme, fallback } => {
            let fallback = match fallback {
                Some(fallback) => fallback,
                None => {
                    let parent = manager
                        .themes_mut()
                        .property(theme, PropertyId::ParentTheme)?;
                    ThemeId(parent as i32)
                }
            };
            if manager.remove_custom_theme(theme, fallback)? {
                println!("Removed {}", theme);
            } else {
                println!("Removing {} would turn off night mode; switch away first", theme);
            }
        }
        CustomCommands::SetColor {
            theme,
            color,
            value,
        } => {
            let color = ColorId::parse_name(&color)?;
            let mut state = manager.begin_color_edit(theme, color)?;
            state.set_color(parse_color(&value)?, true);
            manager.apply_color_edit(theme, &state, false)?;
            println!("{} = #{}", color, color::hex_name(state.color()));
        }
        CustomCommands::SetProperty {
            theme,
            property,
            value,
        } => {
            let property = PropertyId::parse_name(&property)?;
            let effective = manager.set_custom_property(theme, property, value)?;
            println!("{} = {}", property, effective);
        }
        CustomCommands::Undo { theme, color } => {
            let color = ColorId::parse_name(&color)?;
            let mut state = manager.begin_color_edit(theme, color)?;
            if !state.undo() {
                println!("Nothing to undo for {}", color);
                return Ok(());
            }
            manager.apply_color_edit(theme, &state, false)?;
            println!("{} = #{}", color, color::hex_name(state.color()));
        }
    }
    Ok(())
}

fn describe(background: &Background) -> String {
    let kind = match background.kind() {
        BackgroundKind::Empty => "empty",
        BackgroundKind::Custom { .. } => "local image",
        BackgroundKind::Fill(_) => "fill",
        BackgroundKind::Pattern { .. } => "pattern",
        BackgroundKind::Wallpaper { .. } => "wallpaper",
    };
    let mut line = format!("{} '{}'", kind, background.name());
    if background.is_fill() {
        line.push_str(&format!(" #{}", color::hex_name(background.background_color(0))));
    }
    if background.is_legacy() {
        line.push_str(&format!(" (legacy id {})", background.legacy_wallpaper_id()));
    }
    line
}

pub fn background(manager: &ThemeManager, action: BackgroundCommands, slot: Option<i32>) -> Result<()> {
    let account = manager.account_id();
    let slot = slot.unwrap_or_else(|| manager.applied_theme().wallpaper_usage_identifier());
    let background = match action {
        BackgroundCommands::Show => {
            match manager.background(slot)? {
                Some(background) => println!("Slot {}: {}", slot, describe(&background)),
                None => println!(
                    "Slot {} is empty, theme default: {}",
                    slot,
                    describe(&manager.current_background()?)
                ),
            }
            return Ok(());
        }
        BackgroundCommands::Clear => {
            manager.clear_background(slot)?;
            println!("Cleared slot {}", slot);
            return Ok(());
        }
        BackgroundCommands::Solid { color } => Background::new_solid(account, parse_color(&color)?),
        BackgroundCommands::Gradient {
            top,
            bottom,
            rotation,
        } => Background::new_gradient(account, parse_color(&top)?, parse_color(&bottom)?, rotation),
        BackgroundCommands::Legacy { id } => Background::new_legacy(account, id)
            .ok_or_else(|| anyhow!("unknown legacy wallpaper id {}", id))?,
    };
    manager.set_background(slot, &background)?;
    println!("Slot {}: {}", slot, describe(&background));
    Ok(())
}
