//! Configuration: platform config directory, `config.toml` loading, and the
//! color theme.
//!
//! Everything has a sensible default; the config file only needs to name
//! what it changes. `--generate-config` writes the commented template below.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::schema::ContractSchema;

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }

    /// Load `config.toml`, falling back to defaults when the file does not
    /// exist. A file that exists but fails to parse is an error.
    pub fn load_config(&self) -> Result<AppConfig> {
        let config_path = self.config_path("config.toml");
        match std::fs::read_to_string(&config_path) {
            Ok(content) => {
                let config: AppConfig = toml::from_str(&content)
                    .map_err(|e| eyre!("Invalid config at {}: {}", config_path.display(), e))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
            Err(e) => Err(eyre!("Could not read {}: {}", config_path.display(), e)),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub schema: SchemaSettings,
    pub display: DisplayConfig,
    pub search: SearchConfig,
    pub theme: ThemeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            schema: SchemaSettings::default(),
            display: DisplayConfig::default(),
            search: SearchConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Export layout to expect: "auto", "classic", "assisted", or the name
    /// of a custom variant defined below.
    pub variant: String,
    /// Additional schema variants, tried ahead of the built-ins.
    pub custom: Vec<ContractSchema>,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            variant: "auto".to_string(),
            custom: Vec::new(),
        }
    }
}

impl SchemaSettings {
    /// Custom variants first so they win detection ties against built-ins.
    pub fn variants(&self) -> Vec<ContractSchema> {
        let mut variants = self.custom.clone();
        variants.extend(ContractSchema::builtins());
        variants
    }

    /// The pinned variant name, unless set to auto-detect.
    pub fn pinned(&self) -> Option<&str> {
        if self.variant.eq_ignore_ascii_case("auto") {
            None
        } else {
            Some(self.variant.as_str())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// strftime format for coerced dates.
    pub date_format: String,
    /// Character budget for long grid cells (governing law, term).
    pub truncate_field: usize,
    /// Character budget for the amendment summary cell.
    pub truncate_summary: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: crate::record::DATE_DISPLAY_FORMAT.to_string(),
            truncate_field: 30,
            truncate_summary: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum similarity for a fuzzy match (0.0 to 1.0).
    pub threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threshold: crate::search::DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub background: String,
    pub success: String,
    pub error: String,
    pub warning: String,
    pub dimmed: String,
    pub table_header: String,
    pub table_header_bg: String,
    pub selection: String,
    pub sidebar_border: String,
    pub keybind_hints: String,
    pub controls_bg: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: "reset".to_string(),
            success: "green".to_string(),
            error: "red".to_string(),
            warning: "yellow".to_string(),
            dimmed: "dark_gray".to_string(),
            table_header: "white".to_string(),
            table_header_bg: "dark_gray".to_string(),
            selection: "cyan".to_string(),
            sidebar_border: "blue".to_string(),
            keybind_hints: "cyan".to_string(),
            controls_bg: "dark_gray".to_string(),
        }
    }
}

/// Parse a color from a name, `#rrggbb` hex, or a 0-255 indexed value.
pub fn parse_color(value: &str) -> Result<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 {
            return Err(eyre!("Invalid hex color: #{hex} (expected #rrggbb)"));
        }
        let r = u8::from_str_radix(&hex[0..2], 16)?;
        let g = u8::from_str_radix(&hex[2..4], 16)?;
        let b = u8::from_str_radix(&hex[4..6], 16)?;
        return Ok(Color::Rgb(r, g, b));
    }
    if let Ok(index) = value.parse::<u8>() {
        return Ok(Color::Indexed(index));
    }
    match value.to_lowercase().replace(['-', ' '], "_").as_str() {
        "reset" | "default" | "none" => Ok(Color::Reset),
        "black" => Ok(Color::Black),
        "red" => Ok(Color::Red),
        "green" => Ok(Color::Green),
        "yellow" => Ok(Color::Yellow),
        "blue" => Ok(Color::Blue),
        "magenta" => Ok(Color::Magenta),
        "cyan" => Ok(Color::Cyan),
        "gray" | "grey" => Ok(Color::Gray),
        "dark_gray" | "dark_grey" => Ok(Color::DarkGray),
        "light_red" => Ok(Color::LightRed),
        "light_green" => Ok(Color::LightGreen),
        "light_yellow" => Ok(Color::LightYellow),
        "light_blue" => Ok(Color::LightBlue),
        "light_magenta" => Ok(Color::LightMagenta),
        "light_cyan" => Ok(Color::LightCyan),
        "white" => Ok(Color::White),
        other => Err(eyre!("Unknown color name: {other}")),
    }
}

/// Named colors resolved from the config, with a fallback for unknown keys.
#[derive(Debug, Clone, Default)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Result<Theme> {
        let c = &config.colors;
        let entries = [
            ("background", &c.background),
            ("success", &c.success),
            ("error", &c.error),
            ("warning", &c.warning),
            ("dimmed", &c.dimmed),
            ("table_header", &c.table_header),
            ("table_header_bg", &c.table_header_bg),
            ("selection", &c.selection),
            ("sidebar_border", &c.sidebar_border),
            ("keybind_hints", &c.keybind_hints),
            ("controls_bg", &c.controls_bg),
        ];
        let mut colors = HashMap::new();
        for (name, value) in entries {
            colors.insert(name.to_string(), parse_color(value)?);
        }
        Ok(Theme { colors })
    }

    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }
}

pub const DEFAULT_CONFIG_TEMPLATE: &str = r##"# contratui configuration
# Generated with --generate-config. Every key is optional; delete what you
# don't change.

version = "1"

[schema]
# Export layout to expect: "auto" detects from the CSV header row.
# Pin to "classic" or "assisted" to skip detection, or name a custom
# variant defined in [[schema.custom]].
variant = "auto"

[display]
# strftime format for parsed date columns.
date_format = "%d %b %Y"
# Character budgets for long grid cells; values get a trailing ellipsis.
truncate_field = 30
truncate_summary = 100

[search]
# Minimum similarity (0.0-1.0) for a fuzzy match to appear in results.
# Lower is more permissive.
threshold = 0.6

[theme.colors]
# Named colors, "#rrggbb" hex, or 0-255 indexed values.
background = "reset"
success = "green"
error = "red"
warning = "yellow"
dimmed = "dark_gray"
table_header = "white"
table_header_bg = "dark_gray"
selection = "cyan"
sidebar_border = "blue"
keybind_hints = "cyan"
controls_bg = "dark_gray"
"##;
