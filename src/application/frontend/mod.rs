//! Request lifecycle for builder-rendered pages.
//!
//! A host drives one [`Frontend`] per request:
//!
//! 1. [`Frontend::begin_request`] resets request state and detects the mode.
//! 2. [`Frontend::register_assets`] and [`Frontend::enqueue_head_assets`]
//!    while the document head is assembled, then [`Frontend::head`].
//! 3. [`Frontend::the_content`] for the main content chain.
//! 4. [`Frontend::footer`] for deferred assets and late fonts.
//! 5. [`Frontend::end_request`].

mod guard;
mod pipeline;
mod scope;
mod switcher;

use serde_json::json;
use tracing::{debug, warn};

use crate::application::assets::{
    AssetCatalog, AssetRegistrar, FRONTEND_CONFIG_OBJECT, FRONTEND_HANDLE,
};
use crate::application::collaborators::Collaborators;
use crate::application::context::{RenderContext, RequestInfo};
use crate::application::css::CssCoordinator;
use crate::application::fonts::{FontEndpoints, FontQueue};
use crate::application::hooks::RenderHooks;
use crate::domain::types::AssetKind;

pub use guard::{ContextFrames, Frame, FrameGuard, ReentrancyFlag, ReentrancyGuard};
pub use scope::RenderScope;
pub use switcher::CycleDetected;

const SOURCE: &str = "application::frontend";

/// Static configuration of the frontend, usually built from
/// [`crate::config::Settings`].
#[derive(Debug, Clone)]
pub struct FrontendSettings {
    pub catalog: AssetCatalog,
    pub fonts: FontEndpoints,
    /// CSS selector stretched sections measure against; empty for the viewport.
    pub stretched_section_container: String,
    /// Locale used when the request does not carry one.
    pub default_locale: String,
}

impl Default for FrontendSettings {
    fn default() -> Self {
        Self {
            catalog: AssetCatalog::new("/assets", env!("CARGO_PKG_VERSION"), false),
            fonts: FontEndpoints::default(),
            stretched_section_container: String::new(),
            default_locale: crate::config::DEFAULT_LOCALE.to_string(),
        }
    }
}

impl From<&crate::config::Settings> for FrontendSettings {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            catalog: AssetCatalog::from(&settings.assets),
            fonts: FontEndpoints::from(&settings.fonts),
            stretched_section_container: settings.layout.stretched_section_container.clone(),
            default_locale: settings.layout.default_locale.clone(),
        }
    }
}

pub struct Frontend {
    collaborators: Collaborators,
    settings: FrontendSettings,
    hooks: RenderHooks,
    context: RenderContext,
    fonts: FontQueue,
    assets: AssetRegistrar,
    css: CssCoordinator,
    frames: ContextFrames,
    content_guard: ReentrancyFlag,
    intercept_content: bool,
}

impl Frontend {
    pub fn new(collaborators: Collaborators, settings: FrontendSettings) -> Self {
        let fonts = FontQueue::new(collaborators.fonts.clone(), settings.fonts.clone());
        let assets = AssetRegistrar::new(collaborators.assets.clone());
        let css = CssCoordinator::new(collaborators.css.clone());

        Self {
            collaborators,
            settings,
            hooks: RenderHooks::default(),
            context: RenderContext::default(),
            fonts,
            assets,
            css,
            frames: ContextFrames::default(),
            content_guard: ReentrancyFlag::default(),
            intercept_content: true,
        }
    }

    pub fn hooks_mut(&mut self) -> &mut RenderHooks {
        &mut self.hooks
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn registrar(&self) -> &AssetRegistrar {
        &self.assets
    }

    pub fn fonts(&self) -> &FontQueue {
        &self.fonts
    }

    /// The frame of the entity currently being rendered.
    pub fn current_frame(&self) -> Frame {
        self.frames.current()
    }

    /// Reset all request state and detect the rendering mode.
    pub fn begin_request(&mut self, mut request: RequestInfo) {
        if request.locale.trim().is_empty() {
            request.locale = self.settings.default_locale.clone();
        }

        self.fonts.reset();
        self.assets.reset();
        self.css.reset();
        self.content_guard = ReentrancyFlag::default();
        self.intercept_content = true;

        let modes = &self.collaborators.modes;
        let edit_session = modes.is_edit_session();
        let preview_session = modes.is_preview_session();
        let background = modes.is_background_request();
        let is_frontend_mode = !(edit_session || preview_session);

        let has_target_in_page = match request.entity {
            Some(entity) if is_frontend_mode => {
                match self.collaborators.store.has_target_content(entity) {
                    Ok(found) => found,
                    Err(err) => {
                        warn!(
                            target = SOURCE,
                            entity = %entity,
                            error = %err,
                            "failed to check entity for builder content"
                        );
                        false
                    }
                }
            }
            _ => false,
        };

        self.frames.reset(Frame {
            entity: request.entity,
            edit_mode: edit_session,
        });

        debug!(
            target = SOURCE,
            entity = ?request.entity,
            is_frontend_mode,
            has_target_in_page,
            "request started"
        );

        self.context = RenderContext {
            request,
            is_frontend_mode,
            has_target_in_page,
            inline_css: preview_session || background,
            edit_session,
            preview_session,
        };
    }

    pub fn end_request(&mut self) {
        self.fonts.reset();
        self.assets.reset();
        self.css.reset();
        self.frames.clear();
        self.context = RenderContext::default();
    }

    /// Register (without enqueueing) the frontend's own bundles.
    pub fn register_assets(&mut self) {
        for bundle in self.settings.catalog.scripts() {
            self.assets.register(&bundle);
        }
        for bundle in self.settings.catalog.styles(self.context.request.rtl) {
            self.assets.register(&bundle);
        }
    }

    /// Enqueue styles while the head is assembled when the page is already
    /// known to carry builder content.
    pub fn enqueue_head_assets(&mut self) {
        if self.context.is_frontend_mode && self.context.has_target_in_page {
            self.enqueue_styles();
        }
    }

    pub fn enqueue_styles(&mut self) {
        for handle in self.settings.catalog.style_handles() {
            self.assets.enqueue(AssetKind::Style, &handle);
        }

        if self.context.preview_session {
            return;
        }

        self.css.enqueue_global_css(&mut self.assets);
        if let Some(entity) = self.context.request.entity {
            self.css.enqueue_entity_css(entity, &mut self.assets);
        }
    }

    pub fn enqueue_scripts(&mut self) {
        self.assets.enqueue(AssetKind::Script, FRONTEND_HANDLE);
        let config = json!({
            "isEditMode": self.context.edit_session,
            "stretchedSectionContainer": self.settings.stretched_section_container,
            "is_rtl": self.context.request.rtl,
        });
        self.assets
            .localize(FRONTEND_HANDLE, FRONTEND_CONFIG_OBJECT, &config);
    }

    /// Queue a webfont for the next flush.
    pub fn request_font(&mut self, name: &str) -> bool {
        self.fonts.request_font(name)
    }

    /// Markup for the document head: fonts requested so far.
    pub fn head(&mut self) -> String {
        if !self.context.is_frontend_mode {
            return String::new();
        }
        self.flush_fonts()
    }

    /// Markup for the end of the document: assets for builder content rendered
    /// outside the head's knowledge, and fonts requested after the head.
    pub fn footer(&mut self) -> String {
        if !self.context.is_frontend_mode || !self.context.has_target_in_page {
            return String::new();
        }

        self.enqueue_styles();
        self.enqueue_scripts();
        self.flush_fonts()
    }

    fn flush_fonts(&mut self) -> String {
        match self.fonts.flush(self.context.locale()) {
            Ok(html) => html,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "failed to render font links");
                String::new()
            }
        }
    }

    pub fn body_classes(&self) -> Vec<String> {
        let mut classes = vec!["tessera-default".to_string()];

        let Some(entity) = self.context.request.entity else {
            return classes;
        };
        if !self.context.request.singular {
            return classes;
        }

        match self.collaborators.store.edit_mode(entity) {
            Ok(Some(mode)) if mode.is_builder() => classes.push("tessera-page".to_string()),
            Ok(_) => {}
            Err(err) => warn!(
                target = SOURCE,
                entity = %entity,
                error = %err,
                "failed to read edit mode for body classes"
            ),
        }
        classes
    }

    /// Enable or disable the builder interceptor on the main content chain.
    pub fn set_content_interception(&mut self, enabled: bool) {
        self.intercept_content = enabled;
    }

    /// Run the main content chain: the builder interceptor, then host filters.
    pub fn the_content(&mut self, content: &str) -> String {
        let content = if self.intercept_content {
            self.apply_builder_in_content(content.to_string())
        } else {
            content.to_string()
        };
        self.hooks.apply_content_filters(content)
    }

    /// Replace the current entity's content with its builder markup. A nested
    /// invocation while this one is running passes content through untouched.
    fn apply_builder_in_content(&mut self, content: String) -> String {
        let Some(_guard) = self.content_guard.try_acquire() else {
            return content;
        };

        if !self.context.is_frontend_mode {
            return content;
        }

        let Some(entity) = self.frames.current().entity else {
            return content;
        };

        let builder = self.builder_content(entity, false);
        if builder.is_empty() { content } else { builder }
    }
}
