use thiserror::Error;
use tracing::warn;

use crate::domain::entities::EntityId;
use crate::presentation::views::{AlertTemplate, render_template};

use super::{Frame, Frontend};

const SOURCE: &str = "application::frontend::switcher";

const SELF_REFERENCE_MESSAGE: &str = "Invalid Data: The Template ID cannot be the same as the currently edited template. Please choose a different one.";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("entity {entity} is already being rendered")]
pub struct CycleDetected {
    pub entity: EntityId,
}

impl Frontend {
    /// Run `body` with `entity` installed as the currently rendering entity.
    ///
    /// The previous frame is restored when `body` returns, whether it
    /// succeeded, returned an error, or unwound. Requests for an entity that is
    /// already active in the chain are rejected without running `body`.
    pub fn with_substituted_entity<T>(
        &mut self,
        entity: EntityId,
        edit_mode: bool,
        body: impl FnOnce(&mut Frontend) -> T,
    ) -> Result<T, CycleDetected> {
        if self.frames.contains(entity) {
            return Err(CycleDetected { entity });
        }

        let _frame = self.frames.enter(Frame {
            entity: Some(entity),
            edit_mode,
        });
        Ok(body(self))
    }

    /// Render another entity's builder content from inside a render pass,
    /// e.g. a template embedded in a page.
    ///
    /// The nested pass runs without editor affordances; when the outer pass
    /// was in edit mode the stylesheet is inlined, since the editor will not
    /// load it separately.
    pub fn builder_content_for_display(&mut self, entity: EntityId) -> String {
        match self.collaborators.store.find_entity(entity) {
            Ok(Some(_)) => {}
            Ok(None) => return String::new(),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    entity = %entity,
                    error = %err,
                    "failed to load embedded entity"
                );
                return String::new();
            }
        }

        let was_edit_mode = self.frames.current().edit_mode;
        match self.with_substituted_entity(entity, false, |frontend| {
            frontend.builder_content(entity, was_edit_mode)
        }) {
            Ok(html) => html,
            Err(cycle) => {
                warn!(
                    target = SOURCE,
                    entity = %cycle.entity,
                    "refusing to render an entity inside itself"
                );
                self.cycle_diagnostic()
            }
        }
    }

    fn cycle_diagnostic(&self) -> String {
        if !self.context.edit_session {
            return String::new();
        }

        render_template(
            AlertTemplate {
                message: SELF_REFERENCE_MESSAGE,
            },
            "alert",
        )
        .unwrap_or_else(|err| {
            warn!(target = SOURCE, error = %err, "failed to render alert");
            String::new()
        })
    }
}
