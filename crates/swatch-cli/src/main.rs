//! Swatch - command-line front end for the theme engine
//!
//! Lists and switches themes, edits custom themes and manages chat backgrounds for
//! one account at a time. State lives in the SQLite store under `~/.swatch`.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use swatch_core::constants::dirs::LOG_FILE_NAME;
use swatch_core::{paths, EngineConfig, KeyValueStore, SqliteStore, ThemeId, ThemeManager};

mod commands;

/// Swatch - theme and background engine
#[derive(Parser)]
#[command(name = "swatch")]
#[command(about = "Inspect and change themes and chat backgrounds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Account whose selection is read and changed
    #[arg(short, long, default_value_t = 0)]
    account: i32,

    /// Config file (defaults to ~/.swatch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List builtin and custom themes
    Themes {
        /// Include the monochrome themes
        #[arg(long)]
        extended: bool,
    },

    /// Show the current theme
    Current,

    /// Switch theme: a builtin key, `custom:<index>` or a raw id
    Switch {
        #[arg(value_parser = parse_theme, allow_hyphen_values = true)]
        theme: ThemeId,

        /// Switch even if it turns off night mode
        #[arg(long)]
        force: bool,

        /// Print the cross-fade frame by frame
        #[arg(long)]
        animate: bool,

        /// Slow the cross-fade down
        #[arg(long, requires = "animate")]
        slow: bool,
    },

    /// Night mode
    Night {
        #[arg(value_enum)]
        action: NightAction,
    },

    /// Edit custom themes
    Custom {
        #[command(subcommand)]
        action: CustomCommands,
    },

    /// Inspect or change the chat background
    Background {
        #[command(subcommand)]
        action: BackgroundCommands,

        /// Background slot (defaults to the current theme's slot)
        #[arg(long, global = true)]
        slot: Option<i32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NightAction {
    /// Switch to the night theme
    On,
    /// Switch to the day theme
    Off,
    /// Switch between the day and night themes
    Toggle,
    /// Follow the system
    Auto,
    /// Follow the configured schedule
    Scheduled,
    /// Stop switching automatically
    Manual,
}

#[derive(Subcommand)]
enum CustomCommands {
    /// Create a custom theme
    New {
        name: String,

        /// Theme to build on
        #[arg(long, value_parser = parse_theme, allow_hyphen_values = true)]
        parent: Option<ThemeId>,

        /// Custom theme whose overrides are copied
        #[arg(long, value_parser = parse_theme, allow_hyphen_values = true)]
        from: Option<ThemeId>,
    },

    /// Delete a custom theme
    Remove {
        #[arg(value_parser = parse_theme, allow_hyphen_values = true)]
        theme: ThemeId,

        /// Theme to switch to and to put in place of references
        #[arg(long, value_parser = parse_theme, allow_hyphen_values = true)]
        fallback: Option<ThemeId>,
    },

    /// Override a color (`rrggbb` or `aarrggbb`)
    SetColor {
        #[arg(value_parser = parse_theme, allow_hyphen_values = true)]
        theme: ThemeId,
        color: String,
        value: String,
    },

    /// Override a property; omit the value to clear the override
    SetProperty {
        #[arg(value_parser = parse_theme, allow_hyphen_values = true)]
        theme: ThemeId,
        property: String,
        #[arg(allow_hyphen_values = true)]
        value: Option<f32>,
    },

    /// Step a color back in its edit history
    Undo {
        #[arg(value_parser = parse_theme, allow_hyphen_values = true)]
        theme: ThemeId,
        color: String,
    },
}

#[derive(Subcommand)]
enum BackgroundCommands {
    /// Show the background
    Show,
    /// Use a solid color
    Solid { color: String },
    /// Use a two-color gradient
    Gradient {
        top: String,
        bottom: String,
        #[arg(long, default_value_t = 0)]
        rotation: i32,
    },
    /// Use a wallpaper by its legacy id
    Legacy { id: i32 },
    /// Forget the background so the theme default applies
    Clear,
}

fn parse_theme(value: &str) -> std::result::Result<ThemeId, String> {
    if let Some(builtin) = swatch_core::BuiltinId::from_key(value) {
        return Ok(builtin.theme_id());
    }
    if let Some(index) = value.strip_prefix("custom:") {
        let index = index
            .parse::<i32>()
            .map_err(|_| format!("invalid custom theme index '{}'", index))?;
        return ThemeId::from_custom_index(index).map_err(|e| e.to_string());
    }
    value
        .parse::<i32>()
        .map(ThemeId)
        .map_err(|_| format!("unknown theme '{}'", value))
}

fn init_logging() {
    let log_dir = paths::logs_dir();
    std::fs::create_dir_all(&log_dir).ok();

    #[cfg(unix)]
    let null_device = "/dev/null";
    #[cfg(windows)]
    let null_device = "NUL";

    let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
        .or_else(|_| std::fs::File::create(null_device))
    else {
        return;
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_path(path)?,
        None => EngineConfig::load()?,
    };
    let store: Arc<dyn KeyValueStore> =
        Arc::new(SqliteStore::open(&config.storage.database_path())?);
    let mut manager = ThemeManager::new(&config, store, cli.account)?;
    tracing::info!("Running for account {}", cli.account);

    match cli.command {
        Commands::Themes { extended } => commands::list_themes(&manager, extended),
        Commands::Current => commands::show_current(&manager),
        Commands::Switch {
            theme,
            force,
            animate,
            slow,
        } => commands::switch(&mut manager, theme, force, animate, slow).await,
        Commands::Night { action } => commands::night(&mut manager, action),
        Commands::Custom { action } => commands::custom(&mut manager, action),
        Commands::Background { action, slot } => commands::background(&manager, action, slot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_theme() {
        assert_eq!(parse_theme("night_blue"), Ok(ThemeId(10)));
        assert_eq!(parse_theme("custom:3"), Ok(ThemeId(-5)));
        assert_eq!(parse_theme("-7"), Ok(ThemeId(-7)));
        assert!(parse_theme("custom:x").is_err());
        assert!(parse_theme("sepia").is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["swatch", "--account", "2", "switch", "classic", "--force"])
            .unwrap();
        assert_eq!(cli.account, 2);
        assert!(matches!(
            cli.command,
            Commands::Switch { theme: ThemeId(11), force: true, animate: false, .. }
        ));

        let cli = Cli::try_parse_from(["swatch", "background", "solid", "ff0000", "--slot", "1"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Background { slot: Some(1), action: BackgroundCommands::Solid { .. } }
        ));

        assert!(Cli::try_parse_from(["swatch", "switch", "classic", "--slow"]).is_err());
    }
}
