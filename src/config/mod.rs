//! Configuration layer: typed settings with layered precedence (file → env).

use std::{path::Path, str::FromStr};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::fonts::{DEFAULT_EARLY_ACCESS_BASE_URL, DEFAULT_FAMILY_STYLESHEET_URL};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "tessera";
const ENV_PREFIX: &str = "TESSERA";
const DEFAULT_ASSETS_BASE_URL: &str = "http://localhost/assets/";
pub const DEFAULT_LOCALE: &str = "en_US";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub assets: AssetSettings,
    pub fonts: FontSettings,
    pub layout: LayoutSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct AssetSettings {
    /// Public base URL of the bundled scripts and styles.
    pub base_url: Url,
    /// Version string attached to first-party bundles.
    pub version: String,
    /// Serve unminified bundles.
    pub script_debug: bool,
}

#[derive(Debug, Clone)]
pub struct FontSettings {
    pub family_stylesheet_url: Url,
    pub early_access_base_url: Url,
    /// Families served through the combined family query.
    pub standard_families: Vec<String>,
    /// Families served through the per-font early-access path.
    pub early_access_families: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LayoutSettings {
    pub default_locale: String,
    pub stretched_section_container: String,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings from the default files, an optional explicit file, and
/// `TESSERA__SECTION__KEY` environment variables, in increasing precedence.
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("fonts.standard_families")
            .with_list_parse_key("fonts.early_access_families")
            .try_parsing(true),
    );

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    assets: RawAssetSettings,
    fonts: RawFontSettings,
    layout: RawLayoutSettings,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            assets,
            fonts,
            layout,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            assets: build_asset_settings(assets)?,
            fonts: build_font_settings(fonts)?,
            layout: build_layout_settings(layout)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_asset_settings(assets: RawAssetSettings) -> Result<AssetSettings, LoadError> {
    let base_url = parse_url(
        assets.base_url.as_deref().unwrap_or(DEFAULT_ASSETS_BASE_URL),
        "assets.base_url",
    )?;

    let version = assets
        .version
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());
    if version.is_empty() {
        return Err(LoadError::invalid("assets.version", "must not be empty"));
    }

    Ok(AssetSettings {
        base_url,
        version,
        script_debug: assets.script_debug.unwrap_or(false),
    })
}

fn build_font_settings(fonts: RawFontSettings) -> Result<FontSettings, LoadError> {
    let family_stylesheet_url = parse_url(
        fonts
            .family_stylesheet_url
            .as_deref()
            .unwrap_or(DEFAULT_FAMILY_STYLESHEET_URL),
        "fonts.family_stylesheet_url",
    )?;
    if family_stylesheet_url.query().is_some() {
        return Err(LoadError::invalid(
            "fonts.family_stylesheet_url",
            "must not carry a query string",
        ));
    }

    let early_access_base_url = parse_url(
        fonts
            .early_access_base_url
            .as_deref()
            .unwrap_or(DEFAULT_EARLY_ACCESS_BASE_URL),
        "fonts.early_access_base_url",
    )?;

    Ok(FontSettings {
        family_stylesheet_url,
        early_access_base_url,
        standard_families: clean_families(fonts.standard_families),
        early_access_families: clean_families(fonts.early_access_families),
    })
}

fn build_layout_settings(layout: RawLayoutSettings) -> Result<LayoutSettings, LoadError> {
    let default_locale = layout
        .default_locale
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    if default_locale.is_empty() {
        return Err(LoadError::invalid(
            "layout.default_locale",
            "must not be empty",
        ));
    }

    Ok(LayoutSettings {
        default_locale,
        stretched_section_container: layout
            .stretched_section_container
            .map(|value| value.trim().to_string())
            .unwrap_or_default(),
    })
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`"),
        )),
    }
}

fn clean_families(families: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(families.len());
    for family in families {
        let family = family.trim();
        if !family.is_empty() && !cleaned.iter().any(|known| known == family) {
            cleaned.push(family.to_string());
        }
    }
    cleaned
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawAssetSettings {
    base_url: Option<String>,
    version: Option<String>,
    script_debug: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawFontSettings {
    family_stylesheet_url: Option<String>,
    early_access_base_url: Option<String>,
    standard_families: Vec<String>,
    early_access_families: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLayoutSettings {
    default_locale: Option<String>,
    stretched_section_container: Option<String>,
}
