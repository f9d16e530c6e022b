//! Request-scoped render state.

use crate::domain::entities::EntityId;

/// What the host knows about the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    /// The request's main entity, if it addresses one.
    pub entity: Option<EntityId>,
    pub locale: String,
    /// A single entity view, as opposed to an archive or listing.
    pub singular: bool,
    pub rtl: bool,
}

impl RequestInfo {
    pub fn singular(entity: EntityId, locale: impl Into<String>) -> Self {
        Self {
            entity: Some(entity),
            locale: locale.into(),
            singular: true,
            rtl: false,
        }
    }

    pub fn with_rtl(mut self, rtl: bool) -> Self {
        self.rtl = rtl;
        self
    }
}

/// Flags decided once in `begin_request` and read by every component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    pub request: RequestInfo,
    /// Regular page view: neither an editing nor a preview session.
    pub is_frontend_mode: bool,
    /// The page needs builder assets. Set at request start from the store and
    /// again whenever a render pass produces markup.
    pub has_target_in_page: bool,
    /// Stylesheets are delivered inline because the response is not a full
    /// document (preview or background request).
    pub inline_css: bool,
    pub edit_session: bool,
    pub preview_session: bool,
}

impl RenderContext {
    pub fn locale(&self) -> &str {
        &self.request.locale
    }
}
