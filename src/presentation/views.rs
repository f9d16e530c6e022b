//! HTML fragments emitted by the frontend. Every fragment is a standalone,
//! well-formed piece of markup; dynamic values are escaped by askama unless a
//! field already carries rendered markup (`|safe`).

use askama::{Error as AskamaError, Template};
use thiserror::Error;

use crate::domain::entities::EntityId;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) template: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(template: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            template,
            public_message,
            error,
        }
    }

    pub fn template(&self) -> &'static str {
        self.template
    }
}

pub fn render_template<T: Template>(
    template: T,
    name: &'static str,
) -> Result<String, TemplateRenderError> {
    template
        .render()
        .map_err(|err| TemplateRenderError::new(name, "Template rendering failed", err))
}

/// Fixed three-level container around an entity's rendered sections.
#[derive(Template)]
#[template(
    source = r#"{% if let Some(css) = inline_css %}<style>{{ css|safe }}</style>{% endif %}<div class="tessera tessera-{{ entity }}"><div class="tessera-inner"><div class="tessera-section-wrap">{{ body|safe }}</div></div></div>"#,
    ext = "html"
)]
pub struct BuilderWrapperTemplate<'a> {
    pub entity: EntityId,
    pub inline_css: Option<&'a str>,
    pub body: &'a str,
}

/// Diagnostic shown in editing sessions only.
#[derive(Template)]
#[template(
    source = r#"<div class="tessera-alert tessera-alert-danger">{{ message }}</div>"#,
    ext = "html"
)]
pub struct AlertTemplate<'a> {
    pub message: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<link rel="stylesheet" type="text/css" href="{{ href }}">"#,
    ext = "html"
)]
pub struct FontLinkTemplate<'a> {
    pub href: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<link rel="stylesheet" id="{{ handle }}-css" href="{{ href }}" type="text/css" media="all">"#,
    ext = "html"
)]
pub struct StyleTagTemplate<'a> {
    pub handle: &'a str,
    pub href: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<script id="{{ handle }}-js" src="{{ src }}"></script>"#,
    ext = "html"
)]
pub struct ScriptTagTemplate<'a> {
    pub handle: &'a str,
    pub src: &'a str,
}

/// `data` must already be JSON with `</` neutralised.
#[derive(Template)]
#[template(
    source = r#"<script id="{{ handle }}-js-extra">var {{ object_name }} = {{ data|safe }};</script>"#,
    ext = "html"
)]
pub struct LocalizedScriptTemplate<'a> {
    pub handle: &'a str,
    pub object_name: &'a str,
    pub data: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<section class="tessera-element tessera-section"{% if let Some(id) = element_id %} data-id="{{ id }}"{% endif %}><div class="tessera-container">{{ body|safe }}</div></section>"#,
    ext = "html"
)]
pub struct SectionTemplate<'a> {
    pub element_id: Option<&'a str>,
    pub body: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<div class="tessera-element tessera-column"{% if let Some(id) = element_id %} data-id="{{ id }}"{% endif %}>{{ body|safe }}</div>"#,
    ext = "html"
)]
pub struct ColumnTemplate<'a> {
    pub element_id: Option<&'a str>,
    pub body: &'a str,
}

/// `content` is sanitised rich text.
#[derive(Template)]
#[template(
    source = r#"<div class="tessera-element tessera-widget tessera-widget-text">{{ content|safe }}</div>"#,
    ext = "html"
)]
pub struct TextTemplate<'a> {
    pub content: &'a str,
}

#[derive(Template)]
#[template(
    source = r#"<{{ tag }} class="tessera-element tessera-heading"{% if let Some(family) = font_family %} style="font-family: '{{ family }}'"{% endif %}>{{ title }}</{{ tag }}>"#,
    ext = "html"
)]
pub struct HeadingTemplate<'a> {
    pub tag: &'a str,
    pub title: &'a str,
    pub font_family: Option<&'a str>,
}

#[derive(Template)]
#[template(
    source = r#"<div class="tessera-element tessera-widget tessera-widget-template">{{ body|safe }}</div>"#,
    ext = "html"
)]
pub struct EmbeddedTemplateTemplate<'a> {
    pub body: &'a str,
}
