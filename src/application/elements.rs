//! Element registry: maps descriptor type tags to node constructors.

use std::collections::HashMap;

use crate::application::collaborators::{ElementFactory, RenderableNode};
use crate::application::error::ElementError;
use crate::application::frontend::RenderScope;
use crate::domain::entities::{ElementDescriptor, EntityId};
use crate::presentation::views::{
    ColumnTemplate, EmbeddedTemplateTemplate, HeadingTemplate, SectionTemplate, TextTemplate,
    render_template,
};

pub type ElementConstructor =
    fn(&ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError>;

pub struct ElementRegistry {
    constructors: HashMap<String, ElementConstructor>,
}

impl ElementRegistry {
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Registry with the built-in `section`, `column`, `text`, `heading` and
    /// `template` elements.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("section", SectionNode::build);
        registry.register("column", ColumnNode::build);
        registry.register("text", TextNode::build);
        registry.register("heading", HeadingNode::build);
        registry.register("template", TemplateNode::build);
        registry
    }

    /// Returns the constructor previously registered for the tag, if any.
    pub fn register(
        &mut self,
        element_type: impl Into<String>,
        constructor: ElementConstructor,
    ) -> Option<ElementConstructor> {
        self.constructors.insert(element_type.into(), constructor)
    }

    pub fn contains(&self, element_type: &str) -> bool {
        self.constructors.contains_key(element_type)
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ElementFactory for ElementRegistry {
    fn create_node(
        &self,
        descriptor: &ElementDescriptor,
    ) -> Result<Box<dyn RenderableNode>, ElementError> {
        let constructor = self
            .constructors
            .get(descriptor.element_type.as_str())
            .ok_or_else(|| ElementError::UnknownType {
                element_type: descriptor.element_type.clone(),
            })?;
        constructor(descriptor)
    }
}

struct SectionNode {
    id: Option<String>,
    children: Vec<ElementDescriptor>,
}

impl SectionNode {
    fn build(descriptor: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
        Ok(Box::new(Self {
            id: descriptor.id.clone(),
            children: descriptor.children.clone(),
        }))
    }
}

impl RenderableNode for SectionNode {
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        let body = scope.render_children(&self.children);
        out.push_str(&render_template(
            SectionTemplate {
                element_id: self.id.as_deref(),
                body: &body,
            },
            "section",
        )?);
        Ok(())
    }
}

struct ColumnNode {
    id: Option<String>,
    children: Vec<ElementDescriptor>,
}

impl ColumnNode {
    fn build(descriptor: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
        Ok(Box::new(Self {
            id: descriptor.id.clone(),
            children: descriptor.children.clone(),
        }))
    }
}

impl RenderableNode for ColumnNode {
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        let body = scope.render_children(&self.children);
        out.push_str(&render_template(
            ColumnTemplate {
                element_id: self.id.as_deref(),
                body: &body,
            },
            "column",
        )?);
        Ok(())
    }
}

/// Rich text. Content is sanitised when the node is built.
struct TextNode {
    content: String,
}

impl TextNode {
    fn build(descriptor: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
        let raw = descriptor.setting_str("content").unwrap_or_default();
        Ok(Box::new(Self {
            content: ammonia::clean(raw),
        }))
    }
}

impl RenderableNode for TextNode {
    fn render(&self, out: &mut String, _scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        out.push_str(&render_template(
            TextTemplate {
                content: &self.content,
            },
            "text",
        )?);
        Ok(())
    }
}

struct HeadingNode {
    tag: &'static str,
    title: String,
    font_family: Option<String>,
}

impl HeadingNode {
    fn build(descriptor: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
        let tag = match descriptor.setting_str("header_size").unwrap_or("h2") {
            "h1" => "h1",
            "h2" => "h2",
            "h3" => "h3",
            "h4" => "h4",
            "h5" => "h5",
            "h6" => "h6",
            other => {
                return Err(ElementError::invalid_settings(
                    "heading",
                    format!("unsupported header size `{other}`"),
                ));
            }
        };

        Ok(Box::new(Self {
            tag,
            title: descriptor.setting_str("title").unwrap_or_default().to_string(),
            font_family: descriptor.setting_str("font_family").map(str::to_string),
        }))
    }
}

impl RenderableNode for HeadingNode {
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        if let Some(family) = self.font_family.as_deref() {
            scope.request_font(family);
        }

        out.push_str(&render_template(
            HeadingTemplate {
                tag: self.tag,
                title: &self.title,
                font_family: self.font_family.as_deref(),
            },
            "heading",
        )?);
        Ok(())
    }
}

/// Embeds another entity's builder content.
struct TemplateNode {
    template: EntityId,
}

impl TemplateNode {
    fn build(descriptor: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
        let template = descriptor.setting_u64("template_id").ok_or_else(|| {
            ElementError::invalid_settings("template", "missing numeric `template_id`")
        })?;
        Ok(Box::new(Self {
            template: EntityId(template),
        }))
    }
}

impl RenderableNode for TemplateNode {
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        let body = scope.render_embedded(self.template);
        if body.is_empty() {
            return Ok(());
        }

        out.push_str(&render_template(
            EmbeddedTemplateTemplate { body: &body },
            "template",
        )?);
        Ok(())
    }
}
