//! Traits describing the external collaborators the frontend consumes.
//!
//! The frontend is single-threaded and request scoped, so collaborators are
//! shared as `Rc<dyn Trait>` and take `&self`; adapters that record state use
//! interior mutability.

use std::rc::Rc;

use serde_json::Value;

use crate::application::assets::AssetBundle;
use crate::application::css::CompiledStylesheet;
use crate::application::error::{CssError, ElementError, RepoError};
use crate::application::frontend::RenderScope;
use crate::domain::entities::{ElementDescriptor, EntityId, EntityRecord};
use crate::domain::types::{AssetKind, EditMode, FontType};

pub trait ContentStore {
    /// `None` for unknown or deleted entities.
    fn find_entity(&self, id: EntityId) -> Result<Option<EntityRecord>, RepoError>;

    fn edit_mode(&self, id: EntityId) -> Result<Option<EditMode>, RepoError> {
        Ok(self.find_entity(id)?.map(|record| record.edit_mode))
    }

    fn element_tree(&self, id: EntityId) -> Result<Vec<ElementDescriptor>, RepoError>;

    /// Whether the entity is known to carry builder content, so its assets are
    /// needed before the content itself is rendered.
    fn has_target_content(&self, id: EntityId) -> Result<bool, RepoError>;
}

/// Turns a descriptor into something that can produce markup.
pub trait ElementFactory {
    fn create_node(
        &self,
        descriptor: &ElementDescriptor,
    ) -> Result<Box<dyn RenderableNode>, ElementError>;
}

pub trait RenderableNode {
    /// Append this node's markup to `out`. Nested entities, fonts and child
    /// elements go through `scope`.
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError>;
}

/// Compiles builder settings into stylesheet files.
pub trait CssCompiler {
    fn global(&self) -> Result<CompiledStylesheet, CssError>;
    fn entity(&self, id: EntityId) -> Result<CompiledStylesheet, CssError>;
}

pub trait FontClassifier {
    fn classify(&self, name: &str) -> FontType;
}

/// The host's asset queue. Both `register` and `enqueue` are idempotent by
/// handle on the host side too.
pub trait AssetHost {
    fn register(&self, bundle: &AssetBundle);
    fn enqueue(&self, kind: AssetKind, handle: &str);
    fn localize(&self, handle: &str, object_name: &str, data: &Value);
}

/// Request-wide flags owned by the host.
pub trait AmbientModes {
    fn is_edit_session(&self) -> bool;
    fn is_preview_session(&self) -> bool;
    fn is_background_request(&self) -> bool;
}

#[derive(Clone)]
pub struct Collaborators {
    pub store: Rc<dyn ContentStore>,
    pub elements: Rc<dyn ElementFactory>,
    pub css: Rc<dyn CssCompiler>,
    pub fonts: Rc<dyn FontClassifier>,
    pub assets: Rc<dyn AssetHost>,
    pub modes: Rc<dyn AmbientModes>,
}
