//! Filter chains collaborators can attach to the render pipeline.

use crate::domain::entities::{ElementDescriptor, EntityId};

pub type TreeFilter = Box<dyn Fn(Vec<ElementDescriptor>, EntityId) -> Vec<ElementDescriptor>>;
pub type MarkupFilter = Box<dyn Fn(String) -> String>;

#[derive(Default)]
pub struct RenderHooks {
    tree_filters: Vec<TreeFilter>,
    markup_filters: Vec<MarkupFilter>,
    content_filters: Vec<MarkupFilter>,
}

impl RenderHooks {
    /// Adjust the raw element tree before it is walked.
    pub fn add_tree_filter(
        &mut self,
        filter: impl Fn(Vec<ElementDescriptor>, EntityId) -> Vec<ElementDescriptor> + 'static,
    ) {
        self.tree_filters.push(Box::new(filter));
    }

    /// Transform an entity's assembled builder markup.
    pub fn add_markup_filter(&mut self, filter: impl Fn(String) -> String + 'static) {
        self.markup_filters.push(Box::new(filter));
    }

    /// Host content filters that run after the builder interceptor on the main
    /// content chain.
    pub fn add_content_filter(&mut self, filter: impl Fn(String) -> String + 'static) {
        self.content_filters.push(Box::new(filter));
    }

    pub(crate) fn apply_tree_filters(
        &self,
        tree: Vec<ElementDescriptor>,
        entity: EntityId,
    ) -> Vec<ElementDescriptor> {
        self.tree_filters
            .iter()
            .fold(tree, |tree, filter| filter(tree, entity))
    }

    pub(crate) fn apply_markup_filters(&self, markup: String) -> String {
        self.markup_filters
            .iter()
            .fold(markup, |markup, filter| filter(markup))
    }

    pub(crate) fn apply_content_filters(&self, content: String) -> String {
        self.content_filters
            .iter()
            .fold(content, |content, filter| filter(content))
    }
}
