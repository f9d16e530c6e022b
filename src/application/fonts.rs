//! Webfont queue: collects font families requested while elements render and
//! flushes them as stylesheet links, at most once per family per request.

use std::collections::HashSet;
use std::rc::Rc;

use metrics::counter;
use tracing::debug;

use crate::application::collaborators::FontClassifier;
use crate::domain::types::FontType;
use crate::presentation::views::{FontLinkTemplate, TemplateRenderError, render_template};

pub const DEFAULT_FAMILY_STYLESHEET_URL: &str = "https://fonts.googleapis.com/css";
pub const DEFAULT_EARLY_ACCESS_BASE_URL: &str = "https://fonts.googleapis.com/earlyaccess";

const FONT_VARIANTS: &str = "100,100italic,200,200italic,300,300italic,400,400italic,500,500italic,600,600italic,700,700italic,800,800italic,900,900italic";

/// Where font stylesheets are fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEndpoints {
    /// Combined family query endpoint; `?family=` is appended.
    pub family_stylesheet_url: String,
    /// Directory holding one `{name}.css` per early-access font.
    pub early_access_base_url: String,
}

impl Default for FontEndpoints {
    fn default() -> Self {
        Self {
            family_stylesheet_url: DEFAULT_FAMILY_STYLESHEET_URL.to_string(),
            early_access_base_url: DEFAULT_EARLY_ACCESS_BASE_URL.to_string(),
        }
    }
}

impl From<&crate::config::FontSettings> for FontEndpoints {
    fn from(settings: &crate::config::FontSettings) -> Self {
        Self {
            family_stylesheet_url: settings.family_stylesheet_url.to_string(),
            early_access_base_url: settings
                .early_access_base_url
                .as_str()
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

pub struct FontQueue {
    classifier: Rc<dyn FontClassifier>,
    endpoints: FontEndpoints,
    standard: Vec<String>,
    early_access: Vec<String>,
    registered: HashSet<(FontType, String)>,
}

impl FontQueue {
    pub fn new(classifier: Rc<dyn FontClassifier>, endpoints: FontEndpoints) -> Self {
        Self {
            classifier,
            endpoints,
            standard: Vec::new(),
            early_access: Vec::new(),
            registered: HashSet::new(),
        }
    }

    /// Queue `name` for the next flush. Unknown fonts and fonts already queued
    /// during this request are ignored. Returns whether the font was queued.
    pub fn request_font(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }

        let font_type = self.classifier.classify(name);
        let queue = match font_type {
            FontType::Standard => &mut self.standard,
            FontType::EarlyAccess => &mut self.early_access,
            FontType::Unknown => return false,
        };

        if !self.registered.insert((font_type, name.to_string())) {
            return false;
        }

        queue.push(name.to_string());
        debug!(
            target = "application::fonts",
            font = name,
            font_type = %font_type,
            "queued webfont"
        );
        true
    }

    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.early_access.is_empty()
    }

    pub fn pending_standard(&self) -> &[String] {
        &self.standard
    }

    pub fn pending_early_access(&self) -> &[String] {
        &self.early_access
    }

    /// Emit link elements for everything queued since the last flush and clear
    /// the queues. The registered-font cache survives, so a later request for
    /// the same font in this request is still a no-op.
    pub fn flush(&mut self, locale: &str) -> Result<String, TemplateRenderError> {
        let mut html = String::new();

        if !self.standard.is_empty() {
            let href = family_stylesheet_href(&self.endpoints, &self.standard, locale);
            html.push_str(&render_template(
                FontLinkTemplate { href: &href },
                "font_link",
            )?);
        }

        for font in &self.early_access {
            let href = early_access_href(&self.endpoints, font);
            html.push_str(&render_template(
                FontLinkTemplate { href: &href },
                "font_link",
            )?);
        }

        if !self.standard.is_empty() {
            counter!("tessera_fonts_flushed_total", "type" => FontType::Standard.as_str())
                .increment(self.standard.len() as u64);
        }
        if !self.early_access.is_empty() {
            counter!("tessera_fonts_flushed_total", "type" => FontType::EarlyAccess.as_str())
                .increment(self.early_access.len() as u64);
        }

        self.standard.clear();
        self.early_access.clear();
        Ok(html)
    }

    /// Forget everything, including the registered-font cache.
    pub fn reset(&mut self) {
        self.standard.clear();
        self.early_access.clear();
        self.registered.clear();
    }
}

fn family_stylesheet_href(endpoints: &FontEndpoints, fonts: &[String], locale: &str) -> String {
    let families = fonts
        .iter()
        .map(|font| format!("{}:{FONT_VARIANTS}", font.replace(' ', "+")))
        .collect::<Vec<_>>()
        .join("|");

    let mut href = format!("{}?family={families}", endpoints.family_stylesheet_url);
    if let Some(subset) = locale_subset(locale) {
        href.push_str("&subset=");
        href.push_str(subset);
    }
    href
}

fn early_access_href(endpoints: &FontEndpoints, font: &str) -> String {
    let slug: String = font
        .chars()
        .filter(|ch| *ch != ' ')
        .flat_map(char::to_lowercase)
        .collect();
    format!("{}/{slug}.css", endpoints.early_access_base_url)
}

/// Character subset required by a site locale, if the default latin subset
/// does not cover it.
pub fn locale_subset(locale: &str) -> Option<&'static str> {
    match locale {
        "ru_RU" | "bg_BG" | "uk" => Some("cyrillic"),
        "he_IL" => Some("hebrew"),
        "el" => Some("greek"),
        "vi" => Some("vietnamese"),
        _ => None,
    }
}
