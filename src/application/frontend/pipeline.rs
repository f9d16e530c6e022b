use metrics::counter;
use tracing::{debug, warn};

use crate::application::error::{ElementError, RenderError};
use crate::domain::entities::{ElementDescriptor, EntityId};
use crate::presentation::views::{BuilderWrapperTemplate, render_template};

use super::{Frontend, RenderScope};

const SOURCE: &str = "application::frontend::pipeline";

impl Frontend {
    /// Render an entity's element tree into page markup.
    ///
    /// Returns an empty string for entities that are missing, password
    /// protected, not builder-authored, or have an empty tree. Store and
    /// template failures are logged and also yield an empty string.
    pub fn builder_content(&mut self, entity: EntityId, force_inline_css: bool) -> String {
        match self.render_builder_content(entity, force_inline_css) {
            Ok(html) => html,
            Err(err) => {
                warn!(
                    target = SOURCE,
                    entity = %entity,
                    error = %err,
                    "builder content render failed"
                );
                String::new()
            }
        }
    }

    fn render_builder_content(
        &mut self,
        entity: EntityId,
        force_inline_css: bool,
    ) -> Result<String, RenderError> {
        let store = self.collaborators.store.clone();

        let Some(record) = store.find_entity(entity)? else {
            debug!(target = SOURCE, entity = %entity, "entity not found");
            return Ok(String::new());
        };
        if record.password_required {
            debug!(target = SOURCE, entity = %entity, "entity requires a password");
            return Ok(String::new());
        }
        if !record.edit_mode.is_builder() {
            return Ok(String::new());
        }

        let tree = store.element_tree(entity)?;
        let tree = self.hooks.apply_tree_filters(tree, entity);
        if tree.is_empty() {
            return Ok(String::new());
        }

        counter!("tessera_render_total").increment(1);

        // Nested passes through the main content chain must not re-enter the
        // builder interceptor while this tree is walked.
        let _walking = self.content_guard.try_acquire();

        self.css.enqueue_entity_css(entity, &mut self.assets);
        let with_css = force_inline_css || self.context.inline_css;

        let body = self.render_elements(&tree);
        let inline_css = if with_css {
            self.css.entity_css_text(entity)
        } else {
            None
        };

        let html = render_template(
            BuilderWrapperTemplate {
                entity,
                inline_css: inline_css.as_deref(),
                body: &body,
            },
            "builder_wrapper",
        )?;
        let html = self.hooks.apply_markup_filters(html);

        if !html.is_empty() {
            self.context.has_target_in_page = true;
        }
        Ok(html)
    }

    /// Render descriptors in order. A descriptor that cannot be resolved or
    /// fails to render is skipped without leaving partial markup.
    pub(crate) fn render_elements(&mut self, descriptors: &[ElementDescriptor]) -> String {
        let mut out = String::new();

        for descriptor in descriptors {
            let node = match self.collaborators.elements.create_node(descriptor) {
                Ok(node) => node,
                Err(err) => {
                    skip_element(descriptor, &err, "resolve");
                    continue;
                }
            };

            let mut buffer = String::new();
            let mut scope = RenderScope::new(self);
            match node.render(&mut buffer, &mut scope) {
                Ok(()) => out.push_str(&buffer),
                Err(err) => skip_element(descriptor, &err, "render"),
            }
        }

        out
    }
}

fn skip_element(descriptor: &ElementDescriptor, error: &ElementError, stage: &'static str) {
    counter!("tessera_elements_skipped_total", "stage" => stage).increment(1);
    warn!(
        target = SOURCE,
        element_type = %descriptor.element_type,
        element_id = descriptor.id.as_deref().unwrap_or(""),
        stage,
        error = %error,
        "skipping element"
    );
}
