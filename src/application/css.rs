//! Decides how compiled builder stylesheets reach the page.
//!
//! Stylesheets are linked by default. The global sheet is always scheduled
//! before any entity sheet so entity rules win on equal specificity.

use std::collections::HashMap;
use std::rc::Rc;

use sha2::{Digest, Sha256};
use tracing::warn;

use crate::application::assets::{AssetBundle, AssetRegistrar};
use crate::application::collaborators::CssCompiler;
use crate::domain::entities::EntityId;

pub const GLOBAL_CSS_HANDLE: &str = "tessera-global";

const FINGERPRINT_LEN: usize = 12;

/// Output of the external stylesheet compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStylesheet {
    /// Public URL of the written stylesheet file.
    pub locator: String,
    pub text: String,
}

pub fn entity_css_handle(id: EntityId) -> String {
    format!("tessera-post-{id}")
}

pub struct CssCoordinator {
    compiler: Rc<dyn CssCompiler>,
    global_scheduled: bool,
    entities: HashMap<EntityId, Option<CompiledStylesheet>>,
}

impl CssCoordinator {
    pub fn new(compiler: Rc<dyn CssCompiler>) -> Self {
        Self {
            compiler,
            global_scheduled: false,
            entities: HashMap::new(),
        }
    }

    /// Schedule the shared stylesheet. Only the first call per request does
    /// anything; a compiler failure is logged and not retried.
    pub fn enqueue_global_css(&mut self, registrar: &mut AssetRegistrar) {
        if self.global_scheduled {
            return;
        }
        self.global_scheduled = true;

        match self.compiler.global() {
            Ok(sheet) => registrar.register_and_enqueue(&stylesheet_bundle(GLOBAL_CSS_HANDLE, &sheet)),
            Err(err) => warn!(
                target = "application::css",
                error = %err,
                "global stylesheet unavailable"
            ),
        }
    }

    /// Schedule an entity's stylesheet as a linked resource, after the global
    /// sheet.
    pub fn enqueue_entity_css(&mut self, id: EntityId, registrar: &mut AssetRegistrar) {
        self.enqueue_global_css(registrar);

        if let Some(sheet) = self.compiled(id) {
            let bundle = stylesheet_bundle(&entity_css_handle(id), &sheet);
            registrar.register_and_enqueue(&bundle);
        }
    }

    /// Stylesheet text for inline delivery.
    pub fn entity_css_text(&mut self, id: EntityId) -> Option<String> {
        self.compiled(id).map(|sheet| sheet.text)
    }

    fn compiled(&mut self, id: EntityId) -> Option<CompiledStylesheet> {
        let compiler = &self.compiler;
        self.entities
            .entry(id)
            .or_insert_with(|| match compiler.entity(id) {
                Ok(sheet) => Some(sheet),
                Err(err) => {
                    warn!(
                        target = "application::css",
                        entity = %id,
                        error = %err,
                        "entity stylesheet unavailable"
                    );
                    None
                }
            })
            .clone()
    }

    pub fn reset(&mut self) {
        self.global_scheduled = false;
        self.entities.clear();
    }
}

fn stylesheet_bundle(handle: &str, sheet: &CompiledStylesheet) -> AssetBundle {
    AssetBundle::style(handle, sheet.locator.clone(), &[], fingerprint(&sheet.text))
}

/// Content-derived version string so caches refresh when the sheet changes.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(FINGERPRINT_LEN);
    digest
}
