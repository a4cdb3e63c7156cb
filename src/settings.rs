use anyhow::Context;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::overlay::OverlayStyle;
use crate::pdf::{
    DEFAULT_CACHE_SIZE, DEFAULT_PREFETCH_RADIUS, DEFAULT_RENDER_SCALE, DEFAULT_WORKERS,
    RenderConfig,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pagelight";

const DEFAULT_OUTLINE_COLOR: &str = "3B82F6";
const DEFAULT_HIGHLIGHT_COLOR: &str = "F59E0B";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Display scale for every page render
    #[serde(default = "default_render_scale")]
    pub render_scale: f32,

    #[serde(default = "default_render_workers")]
    pub render_workers: usize,

    /// Rendered pages kept in memory per document
    #[serde(default = "default_page_cache_size")]
    pub page_cache_size: usize,

    /// Pages rendered ahead on each side of the current page
    #[serde(default = "default_prefetch_radius")]
    pub prefetch_radius: usize,

    /// Hex RGB of box outlines
    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    /// Hex RGB of the highlighted box
    #[serde(default = "default_highlight_color")]
    pub highlight_color: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_render_scale() -> f32 {
    DEFAULT_RENDER_SCALE
}

fn default_render_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_page_cache_size() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_prefetch_radius() -> usize {
    DEFAULT_PREFETCH_RADIUS
}

fn default_outline_color() -> String {
    DEFAULT_OUTLINE_COLOR.to_string()
}

fn default_highlight_color() -> String {
    DEFAULT_HIGHLIGHT_COLOR.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            render_scale: default_render_scale(),
            render_workers: default_render_workers(),
            page_cache_size: default_page_cache_size(),
            prefetch_radius: default_prefetch_radius(),
            outline_color: default_outline_color(),
            highlight_color: default_highlight_color(),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings into the process-wide store.
///
/// `override_path` replaces the per-user config location. A missing file is
/// created with defaults; an unreadable one leaves defaults in place.
pub fn load_settings(override_path: Option<&Path>) {
    let path = match override_path {
        Some(path) => path.to_path_buf(),
        None => {
            let Some(path) = preferred_config_path() else {
                warn!("Could not determine config directory, using default settings");
                return;
            };
            path
        }
    };

    if !path.exists() {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
        return;
    }

    match read_settings_file(&path) {
        Ok(settings) => {
            if let Ok(mut global) = SETTINGS.write() {
                *global = settings;
            }
        }
        Err(e) => error!("Failed to load settings from {path:?}: {e:#}"),
    }
}

/// Parse and sanitize a settings file, migrating older versions in place
pub fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading settings file {path:?}"))?;
    let mut settings: Settings = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing settings file {path:?}"))?;
    debug!("Loaded settings from {path:?}");

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path);
    }
    sanitize(&mut settings);

    Ok(settings)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

fn sanitize(settings: &mut Settings) {
    if !settings.render_scale.is_finite() || settings.render_scale <= 0.0 {
        warn!(
            "Invalid render_scale {}, using {DEFAULT_RENDER_SCALE}",
            settings.render_scale
        );
        settings.render_scale = DEFAULT_RENDER_SCALE;
    }
    if settings.render_workers == 0 {
        warn!("render_workers must be at least 1");
        settings.render_workers = 1;
    }
    if settings.page_cache_size == 0 {
        warn!("page_cache_size must be at least 1");
        settings.page_cache_size = 1;
    }
    for (name, color, default) in [
        ("outline_color", &mut settings.outline_color, DEFAULT_OUTLINE_COLOR),
        ("highlight_color", &mut settings.highlight_color, DEFAULT_HIGHLIGHT_COLOR),
    ] {
        if parse_hex_color(color).is_none() {
            warn!("Invalid {name} {color:?}, using {default}");
            *color = default.to_string();
        }
    }
}

fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match fs::write(path, generate_settings_yaml(settings)) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push('\n');
    content.push_str("# Display scale; pages render at scale * 96/72 pixels per point\n");
    content.push_str(&format!("render_scale: {}\n", settings.render_scale));
    content.push_str("# Worker threads rendering pages in the background\n");
    content.push_str(&format!("render_workers: {}\n", settings.render_workers));
    content.push_str("# Rendered pages kept in memory\n");
    content.push_str(&format!("page_cache_size: {}\n", settings.page_cache_size));
    content.push_str("# Pages rendered ahead on each side of the current page\n");
    content.push_str(&format!("prefetch_radius: {}\n", settings.prefetch_radius));
    content.push('\n');
    content.push_str("# Overlay colours as hex RGB\n");
    content.push_str(&format!("outline_color: \"{}\"\n", settings.outline_color));
    content.push_str(&format!(
        "highlight_color: \"{}\"\n",
        settings.highlight_color
    ));

    content
}

/// `"F59E0B"` or `"#F59E0B"` to RGB
pub fn parse_hex_color(value: &str) -> Option<[u8; 3]> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

// Public API for reading settings

pub fn get_render_scale() -> f32 {
    SETTINGS
        .read()
        .map(|s| s.render_scale)
        .unwrap_or(DEFAULT_RENDER_SCALE)
}

pub fn get_render_workers() -> usize {
    SETTINGS
        .read()
        .map(|s| s.render_workers)
        .unwrap_or(DEFAULT_WORKERS)
}

pub fn get_page_cache_size() -> usize {
    SETTINGS
        .read()
        .map(|s| s.page_cache_size)
        .unwrap_or(DEFAULT_CACHE_SIZE)
}

pub fn get_prefetch_radius() -> usize {
    SETTINGS
        .read()
        .map(|s| s.prefetch_radius)
        .unwrap_or(DEFAULT_PREFETCH_RADIUS)
}

/// Render tuning from the loaded settings
pub fn render_config() -> RenderConfig {
    RenderConfig {
        scale: get_render_scale(),
        workers: get_render_workers(),
        cache_size: get_page_cache_size(),
        prefetch_radius: get_prefetch_radius(),
    }
}

/// Overlay colours from the loaded settings
pub fn overlay_style() -> OverlayStyle {
    let mut style = OverlayStyle::default();
    if let Ok(settings) = SETTINGS.read() {
        if let Some(rgb) = parse_hex_color(&settings.outline_color) {
            style.outline = rgb;
        }
        if let Some(rgb) = parse_hex_color(&settings.highlight_color) {
            style.highlight = rgb;
        }
    }
    style
}
