//! Script and style registration with a per-request ledger, so repeated
//! render passes never register or enqueue the same bundle twice.

use std::collections::HashSet;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::application::collaborators::AssetHost;
use crate::domain::types::{AssetKind, Placement};

pub const FRONTEND_HANDLE: &str = "tessera-frontend";
pub const FRONTEND_CONFIG_OBJECT: &str = "tesseraFrontendConfig";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetBundle {
    pub handle: String,
    pub kind: AssetKind,
    pub locator: String,
    pub dependencies: Vec<String>,
    pub version: String,
    pub placement: Placement,
}

impl AssetBundle {
    pub fn script(
        handle: impl Into<String>,
        locator: impl Into<String>,
        dependencies: &[&str],
        version: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            kind: AssetKind::Script,
            locator: locator.into(),
            dependencies: dependencies.iter().map(|dep| dep.to_string()).collect(),
            version: version.into(),
            placement: Placement::Footer,
        }
    }

    pub fn style(
        handle: impl Into<String>,
        locator: impl Into<String>,
        dependencies: &[&str],
        version: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            kind: AssetKind::Style,
            locator: locator.into(),
            dependencies: dependencies.iter().map(|dep| dep.to_string()).collect(),
            version: version.into(),
            placement: Placement::Head,
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::new(self.kind, &self.handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub kind: AssetKind,
    pub handle: String,
}

impl AssetKey {
    pub fn new(kind: AssetKind, handle: &str) -> Self {
        Self {
            kind,
            handle: handle.to_string(),
        }
    }
}

/// Forwards registrations to the host exactly once per `(kind, handle)`.
pub struct AssetRegistrar {
    host: Rc<dyn AssetHost>,
    registered: Vec<AssetKey>,
    registered_index: HashSet<AssetKey>,
    enqueued: Vec<AssetKey>,
    enqueued_index: HashSet<AssetKey>,
    localized: HashSet<(String, String)>,
}

impl AssetRegistrar {
    pub fn new(host: Rc<dyn AssetHost>) -> Self {
        Self {
            host,
            registered: Vec::new(),
            registered_index: HashSet::new(),
            enqueued: Vec::new(),
            enqueued_index: HashSet::new(),
            localized: HashSet::new(),
        }
    }

    /// Returns `false` when the bundle was already registered this request.
    pub fn register(&mut self, bundle: &AssetBundle) -> bool {
        let key = bundle.key();
        if !self.registered_index.insert(key.clone()) {
            return false;
        }

        trace!(
            target = "application::assets",
            handle = %bundle.handle,
            kind = bundle.kind.as_str(),
            version = %bundle.version,
            "registering asset bundle"
        );
        self.host.register(bundle);
        self.registered.push(key);
        true
    }

    pub fn enqueue(&mut self, kind: AssetKind, handle: &str) -> bool {
        let key = AssetKey::new(kind, handle);
        if !self.enqueued_index.insert(key.clone()) {
            return false;
        }

        self.host.enqueue(kind, handle);
        self.enqueued.push(key);
        true
    }

    pub fn register_and_enqueue(&mut self, bundle: &AssetBundle) {
        self.register(bundle);
        self.enqueue(bundle.kind, &bundle.handle);
    }

    /// Attach a JSON object to a script handle. Repeated calls for the same
    /// handle and object name are ignored.
    pub fn localize(&mut self, handle: &str, object_name: &str, data: &Value) -> bool {
        if !self
            .localized
            .insert((handle.to_string(), object_name.to_string()))
        {
            return false;
        }
        self.host.localize(handle, object_name, data);
        true
    }

    pub fn is_registered(&self, kind: AssetKind, handle: &str) -> bool {
        self.registered_index
            .contains(&AssetKey::new(kind, handle))
    }

    /// Registration order for this request.
    pub fn registered(&self) -> &[AssetKey] {
        &self.registered
    }

    pub fn enqueued(&self) -> &[AssetKey] {
        &self.enqueued
    }

    pub fn reset(&mut self) {
        self.registered.clear();
        self.registered_index.clear();
        self.enqueued.clear();
        self.enqueued_index.clear();
        self.localized.clear();
    }
}

/// The frontend's own script and style bundles.
#[derive(Debug, Clone)]
pub struct AssetCatalog {
    base_url: String,
    version: String,
    script_debug: bool,
}

impl AssetCatalog {
    pub fn new(base_url: impl Into<String>, version: impl Into<String>, script_debug: bool) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            version: version.into(),
            script_debug,
        }
    }

    fn suffix(&self) -> &'static str {
        if self.script_debug { "" } else { ".min" }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    pub fn scripts(&self) -> Vec<AssetBundle> {
        let suffix = self.suffix();
        vec![
            AssetBundle::script(
                "tessera-waypoints",
                self.url(&format!("lib/waypoints/waypoints{suffix}.js")),
                &["jquery"],
                "4.0.2",
            ),
            AssetBundle::script(
                "imagesloaded",
                self.url(&format!("lib/imagesloaded/imagesloaded{suffix}.js")),
                &["jquery"],
                "4.1.0",
            ),
            AssetBundle::script(
                "jquery-numerator",
                self.url(&format!("lib/jquery-numerator/jquery-numerator{suffix}.js")),
                &["jquery"],
                "0.2.1",
            ),
            AssetBundle::script(
                "jquery-slick",
                self.url(&format!("lib/slick/slick{suffix}.js")),
                &["jquery"],
                "1.6.0",
            ),
            AssetBundle::script(
                FRONTEND_HANDLE,
                self.url(&format!("js/frontend{suffix}.js")),
                &[
                    "tessera-waypoints",
                    "jquery-numerator",
                    "imagesloaded",
                    "jquery-slick",
                ],
                self.version.clone(),
            ),
        ]
    }

    pub fn styles(&self, rtl: bool) -> Vec<AssetBundle> {
        let suffix = self.suffix();
        let direction = if rtl { "-rtl" } else { "" };
        vec![
            AssetBundle::style(
                "tessera-icons",
                self.url(&format!("lib/eicons/css/tessera-icons{suffix}.css")),
                &[],
                self.version.clone(),
            ),
            AssetBundle::style(
                "font-awesome",
                self.url(&format!("lib/font-awesome/css/font-awesome{suffix}.css")),
                &[],
                "4.7.0",
            ),
            // Only a minified build of the animations sheet is shipped.
            AssetBundle::style(
                "tessera-animations",
                self.url("css/animations.min.css"),
                &[],
                self.version.clone(),
            ),
            AssetBundle::style(
                FRONTEND_HANDLE,
                self.url(&format!("css/frontend{direction}{suffix}.css")),
                &[],
                self.version.clone(),
            ),
        ]
    }

    /// Handles of [`AssetCatalog::styles`], in enqueue order. Text direction
    /// only changes locators, never handles.
    pub fn style_handles(&self) -> Vec<String> {
        self.styles(false)
            .into_iter()
            .map(|bundle| bundle.handle)
            .collect()
    }
}

impl From<&crate::config::AssetSettings> for AssetCatalog {
    fn from(settings: &crate::config::AssetSettings) -> Self {
        Self::new(
            settings.base_url.as_str(),
            settings.version.clone(),
            settings.script_debug,
        )
    }
}
