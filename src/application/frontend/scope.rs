use crate::domain::entities::{ElementDescriptor, EntityId};

use super::Frontend;

/// What an element can reach while it renders.
///
/// The scope is handed to every [`RenderableNode`](crate::application::collaborators::RenderableNode),
/// so elements observe the entity currently being rendered without global
/// state, even inside an embedded template.
pub struct RenderScope<'a> {
    frontend: &'a mut Frontend,
}

impl<'a> RenderScope<'a> {
    pub(crate) fn new(frontend: &'a mut Frontend) -> Self {
        Self { frontend }
    }

    pub fn entity(&self) -> Option<EntityId> {
        self.frontend.frames.current().entity
    }

    pub fn is_edit_mode(&self) -> bool {
        self.frontend.frames.current().edit_mode
    }

    pub fn locale(&self) -> &str {
        self.frontend.context.locale()
    }

    pub fn request_font(&mut self, name: &str) -> bool {
        self.frontend.request_font(name)
    }

    /// Render nested descriptors with the same skip-on-failure policy as
    /// top-level ones.
    pub fn render_children(&mut self, children: &[ElementDescriptor]) -> String {
        self.frontend.render_elements(children)
    }

    /// Render another entity in place, as its own identity.
    pub fn render_embedded(&mut self, entity: EntityId) -> String {
        self.frontend.builder_content_for_display(entity)
    }

    /// Pass text through the host's main content chain.
    pub fn apply_content_filters(&mut self, content: &str) -> String {
        self.frontend.the_content(content)
    }
}
