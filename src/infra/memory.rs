//! In-memory collaborators: a content store, stylesheet compiler, font table,
//! asset host and mode flags that need no external runtime.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::application::assets::{AssetBundle, AssetKey};
use crate::application::collaborators::{
    AmbientModes, AssetHost, ContentStore, CssCompiler, FontClassifier,
};
use crate::application::css::CompiledStylesheet;
use crate::application::error::{CssError, RepoError};
use crate::config::FontSettings;
use crate::domain::entities::{ElementDescriptor, ElementTree, EntityId, EntityRecord};
use crate::domain::types::{AssetKind, EditMode, FontType, Placement};
use crate::presentation::views::{
    LocalizedScriptTemplate, ScriptTagTemplate, StyleTagTemplate, TemplateRenderError,
    render_template,
};

use super::error::InfraError;

#[derive(Debug)]
enum StoredTree {
    Decoded(Vec<ElementDescriptor>),
    /// Serialized builder data, decoded on every read like a database column.
    Raw(Value),
}

#[derive(Debug)]
struct StoredEntity {
    record: EntityRecord,
    tree: StoredTree,
}

#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    entities: RefCell<HashMap<EntityId, StoredEntity>>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    entities: Vec<FixtureEntity>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntity {
    id: EntityId,
    edit_mode: EditMode,
    #[serde(default)]
    password_required: bool,
    #[serde(default, alias = "children")]
    elements: Value,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a JSON document of the form
    /// `{"entities": [{"id": 1, "edit_mode": "builder", "elements": [...]}]}`.
    pub fn from_fixture_json(raw: &str) -> Result<Self, InfraError> {
        let fixture: Fixture = serde_json::from_str(raw)
            .map_err(|err| InfraError::fixture(format!("invalid fixture: {err}")))?;

        let store = Self::new();
        for entity in fixture.entities {
            store.insert_raw(
                EntityRecord {
                    id: entity.id,
                    edit_mode: entity.edit_mode,
                    password_required: entity.password_required,
                },
                entity.elements,
            );
        }
        Ok(store)
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self, InfraError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_fixture_json(&raw)
    }

    pub fn insert(&self, record: EntityRecord, tree: Vec<ElementDescriptor>) {
        self.store(record, StoredTree::Decoded(tree));
    }

    /// Store serialized element data as-is; it is decoded when read.
    pub fn insert_raw(&self, record: EntityRecord, tree: Value) {
        self.store(record, StoredTree::Raw(tree));
    }

    fn store(&self, record: EntityRecord, tree: StoredTree) {
        self.entities
            .borrow_mut()
            .insert(record.id, StoredEntity { record, tree });
    }

    /// Shorthand for a builder-authored entity without a password.
    pub fn insert_builder(&self, id: EntityId, tree: Vec<ElementDescriptor>) {
        self.insert(
            EntityRecord {
                id,
                edit_mode: EditMode::Builder,
                password_required: false,
            },
            tree,
        );
    }

    pub fn remove(&self, id: EntityId) {
        self.entities.borrow_mut().remove(&id);
    }
}

impl ContentStore for InMemoryContentStore {
    fn find_entity(&self, id: EntityId) -> Result<Option<EntityRecord>, RepoError> {
        Ok(self
            .entities
            .borrow()
            .get(&id)
            .map(|stored| stored.record.clone()))
    }

    fn element_tree(&self, id: EntityId) -> Result<Vec<ElementDescriptor>, RepoError> {
        let entities = self.entities.borrow();
        let Some(stored) = entities.get(&id) else {
            return Ok(Vec::new());
        };

        match &stored.tree {
            StoredTree::Decoded(tree) => Ok(tree.clone()),
            StoredTree::Raw(raw) => {
                let tree = ElementTree::from_value(raw.clone())?;
                if tree.skipped > 0 {
                    counter!("tessera_elements_skipped_total", "stage" => "decode")
                        .increment(tree.skipped as u64);
                    warn!(
                        target = "infra::memory",
                        entity = %id,
                        skipped = tree.skipped,
                        "dropped malformed element descriptors"
                    );
                }
                Ok(tree.elements)
            }
        }
    }

    fn has_target_content(&self, id: EntityId) -> Result<bool, RepoError> {
        let is_builder = self
            .entities
            .borrow()
            .get(&id)
            .is_some_and(|stored| stored.record.edit_mode.is_builder());
        if !is_builder {
            return Ok(false);
        }
        Ok(!self.element_tree(id)?.is_empty())
    }
}

/// Serves pre-compiled stylesheet text from memory. Entities without a sheet
/// report [`CssError::Unavailable`].
pub struct InMemoryCssCompiler {
    base_url: String,
    global: RefCell<String>,
    entities: RefCell<HashMap<EntityId, String>>,
}

impl InMemoryCssCompiler {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            global: RefCell::new(String::new()),
            entities: RefCell::new(HashMap::new()),
        }
    }

    pub fn set_global(&self, text: impl Into<String>) {
        *self.global.borrow_mut() = text.into();
    }

    pub fn set_entity(&self, id: EntityId, text: impl Into<String>) {
        self.entities.borrow_mut().insert(id, text.into());
    }
}

impl CssCompiler for InMemoryCssCompiler {
    fn global(&self) -> Result<CompiledStylesheet, CssError> {
        Ok(CompiledStylesheet {
            locator: format!("{}/global.css", self.base_url),
            text: self.global.borrow().clone(),
        })
    }

    fn entity(&self, id: EntityId) -> Result<CompiledStylesheet, CssError> {
        let text = self
            .entities
            .borrow()
            .get(&id)
            .cloned()
            .ok_or_else(|| CssError::unavailable(format!("entity {id}"), "no compiled sheet"))?;
        Ok(CompiledStylesheet {
            locator: format!("{}/post-{id}.css", self.base_url),
            text,
        })
    }
}

/// Classifies fonts from a fixed table.
#[derive(Debug, Default, Clone)]
pub struct TableFontClassifier {
    fonts: HashMap<String, FontType>,
}

impl TableFontClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &FontSettings) -> Self {
        let mut table = Self::new();
        for family in &settings.standard_families {
            table.insert(family, FontType::Standard);
        }
        for family in &settings.early_access_families {
            table.insert(family, FontType::EarlyAccess);
        }
        table
    }

    pub fn insert(&mut self, family: &str, font_type: FontType) {
        self.fonts.insert(family.to_string(), font_type);
    }

    pub fn with(mut self, family: &str, font_type: FontType) -> Self {
        self.insert(family, font_type);
        self
    }
}

impl FontClassifier for TableFontClassifier {
    fn classify(&self, name: &str) -> FontType {
        self.fonts.get(name).copied().unwrap_or(FontType::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalizedData {
    pub handle: String,
    pub object_name: String,
    pub data: Value,
}

/// Records registrations and enqueues the way a host asset queue would, and
/// prints the resulting tags with dependencies first.
#[derive(Default)]
pub struct RecordingAssetHost {
    bundles: RefCell<Vec<AssetBundle>>,
    queue: RefCell<Vec<AssetKey>>,
    localized: RefCell<Vec<LocalizedData>>,
    printed: RefCell<HashSet<AssetKey>>,
}

impl RecordingAssetHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles in registration order.
    pub fn registered_handles(&self, kind: AssetKind) -> Vec<String> {
        self.bundles
            .borrow()
            .iter()
            .filter(|bundle| bundle.kind == kind)
            .map(|bundle| bundle.handle.clone())
            .collect()
    }

    pub fn enqueued(&self) -> Vec<AssetKey> {
        self.queue.borrow().clone()
    }

    pub fn localized(&self) -> Vec<LocalizedData> {
        self.localized.borrow().clone()
    }

    pub fn bundle(&self, kind: AssetKind, handle: &str) -> Option<AssetBundle> {
        self.bundles
            .borrow()
            .iter()
            .find(|bundle| bundle.kind == kind && bundle.handle == handle)
            .cloned()
    }

    /// Tags for enqueued head-placed bundles not printed yet.
    pub fn print_head(&self) -> Result<String, TemplateRenderError> {
        self.print(Some(Placement::Head))
    }

    /// Tags for everything enqueued and not printed yet, including styles
    /// enqueued after the head was sent.
    pub fn print_footer(&self) -> Result<String, TemplateRenderError> {
        self.print(None)
    }

    fn print(&self, placement: Option<Placement>) -> Result<String, TemplateRenderError> {
        let mut ordered = Vec::new();
        let mut visiting = HashSet::new();
        for key in self.queue.borrow().iter() {
            let Some(bundle) = self.bundle(key.kind, &key.handle) else {
                continue;
            };
            if placement.is_some_and(|placement| bundle.placement != placement) {
                continue;
            }
            self.resolve(&bundle, &mut ordered, &mut visiting);
        }

        let mut html = String::new();
        for bundle in ordered {
            if !self.printed.borrow_mut().insert(bundle.key()) {
                continue;
            }
            html.push_str(&self.tag(&bundle)?);
        }
        Ok(html)
    }

    fn resolve(
        &self,
        bundle: &AssetBundle,
        ordered: &mut Vec<AssetBundle>,
        visiting: &mut HashSet<AssetKey>,
    ) {
        if !visiting.insert(bundle.key()) {
            return;
        }
        for dependency in &bundle.dependencies {
            // Dependencies the host never registered are provided elsewhere.
            if let Some(dependency) = self.bundle(bundle.kind, dependency) {
                self.resolve(&dependency, ordered, visiting);
            }
        }
        ordered.push(bundle.clone());
    }

    fn tag(&self, bundle: &AssetBundle) -> Result<String, TemplateRenderError> {
        let separator = if bundle.locator.contains('?') { '&' } else { '?' };
        let href = format!("{}{separator}ver={}", bundle.locator, bundle.version);

        match bundle.kind {
            AssetKind::Style => render_template(
                StyleTagTemplate {
                    handle: &bundle.handle,
                    href: &href,
                },
                "style_tag",
            ),
            AssetKind::Script => {
                let mut html = String::new();
                for localized in self
                    .localized
                    .borrow()
                    .iter()
                    .filter(|localized| localized.handle == bundle.handle)
                {
                    let data = serde_json::to_string(&localized.data)
                        .unwrap_or_else(|_| "{}".to_string())
                        .replace("</", "<\\/");
                    html.push_str(&render_template(
                        LocalizedScriptTemplate {
                            handle: &bundle.handle,
                            object_name: &localized.object_name,
                            data: &data,
                        },
                        "localized_script",
                    )?);
                }
                html.push_str(&render_template(
                    ScriptTagTemplate {
                        handle: &bundle.handle,
                        src: &href,
                    },
                    "script_tag",
                )?);
                Ok(html)
            }
        }
    }
}

impl AssetHost for RecordingAssetHost {
    fn register(&self, bundle: &AssetBundle) {
        let mut bundles = self.bundles.borrow_mut();
        if bundles.iter().any(|known| known.key() == bundle.key()) {
            return;
        }
        bundles.push(bundle.clone());
    }

    fn enqueue(&self, kind: AssetKind, handle: &str) {
        let key = AssetKey::new(kind, handle);
        let mut queue = self.queue.borrow_mut();
        if !queue.contains(&key) {
            queue.push(key);
        }
    }

    fn localize(&self, handle: &str, object_name: &str, data: &Value) {
        let mut localized = self.localized.borrow_mut();
        localized.retain(|entry| !(entry.handle == handle && entry.object_name == object_name));
        localized.push(LocalizedData {
            handle: handle.to_string(),
            object_name: object_name.to_string(),
            data: data.clone(),
        });
    }
}

/// Mode flags the host can flip between requests.
#[derive(Debug, Default)]
pub struct StaticModes {
    edit_session: Cell<bool>,
    preview_session: Cell<bool>,
    background_request: Cell<bool>,
}

impl StaticModes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_edit_session(&self, value: bool) {
        self.edit_session.set(value);
    }

    pub fn set_preview_session(&self, value: bool) {
        self.preview_session.set(value);
    }

    pub fn set_background_request(&self, value: bool) {
        self.background_request.set(value);
    }
}

impl AmbientModes for StaticModes {
    fn is_edit_session(&self) -> bool {
        self.edit_session.get()
    }

    fn is_preview_session(&self) -> bool {
        self.preview_session.get()
    }

    fn is_background_request(&self) -> bool {
        self.background_request.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_loads_entities_and_trees() {
        let store = InMemoryContentStore::from_fixture_json(
            r#"{"entities":[
                {"id":42,"edit_mode":"builder","elements":[{"type":"section"}]},
                {"id":7,"edit_mode":"classic","password_required":true}
            ]}"#,
        )
        .expect("fixture parses");

        let page = store
            .find_entity(EntityId(42))
            .expect("store")
            .expect("page exists");
        assert!(page.edit_mode.is_builder());
        assert!(store.has_target_content(EntityId(42)).expect("store"));

        let post = store
            .find_entity(EntityId(7))
            .expect("store")
            .expect("post exists");
        assert!(post.password_required);
        assert!(!store.has_target_content(EntityId(7)).expect("store"));
        assert!(store.element_tree(EntityId(99)).expect("store").is_empty());
    }

    #[test]
    fn malformed_fixture_is_reported() {
        let err = InMemoryContentStore::from_fixture_json("{\"entities\": 3}").unwrap_err();
        assert!(matches!(err, InfraError::Fixture { .. }));
    }

    #[test]
    fn malformed_descriptors_do_not_hide_their_siblings() {
        let store = InMemoryContentStore::from_fixture_json(
            r#"{"entities":[
                {"id":42,"edit_mode":"builder","elements":[
                    {"type":"section","settings":[]},
                    {"settings":{"content":"lost"}},
                    {"type":"text","settings":{"content":"Hi"}}
                ]}
            ]}"#,
        )
        .expect("fixture parses");

        let tree = store.element_tree(EntityId(42)).expect("tree decodes");
        assert_eq!(tree.len(), 2);
        assert!(tree[0].settings.is_empty());
        assert_eq!(tree[1].setting_str("content"), Some("Hi"));
    }

    #[test]
    fn corrupt_tree_is_reported_on_read_only() {
        let store = InMemoryContentStore::from_fixture_json(
            r#"{"entities":[
                {"id":1,"edit_mode":"builder","elements":{"type":"section"}},
                {"id":2,"edit_mode":"builder","elements":[{"type":"section"}]}
            ]}"#,
        )
        .expect("fixture parses");

        let err = store.element_tree(EntityId(1)).unwrap_err();
        assert!(matches!(err, RepoError::Corrupt(_)));
        assert!(store.has_target_content(EntityId(1)).is_err());
        assert_eq!(store.element_tree(EntityId(2)).expect("tree").len(), 1);
    }

    #[test]
    fn host_prints_dependencies_before_dependents() {
        let host = RecordingAssetHost::new();
        host.register(&AssetBundle::script(
            "app",
            "https://cdn.example/app.js",
            &["jquery", "lib"],
            "2",
        ));
        host.register(&AssetBundle::script(
            "lib",
            "https://cdn.example/lib.js",
            &[],
            "1",
        ));
        host.enqueue(AssetKind::Script, "app");
        host.localize("app", "appConfig", &serde_json::json!({"a": "</script>"}));

        assert_eq!(host.print_head().expect("head"), "");

        let footer = host.print_footer().expect("footer");
        let lib = footer.find("lib-js\"").expect("lib printed");
        let app = footer.find("app-js\"").expect("app printed");
        assert!(lib < app);
        assert!(footer.contains("var appConfig = {\"a\":\"<\\/script>\"};"));
        assert!(footer.contains("src=\"https://cdn.example/app.js?ver=2\""));

        assert_eq!(host.print_footer().expect("second footer"), "");
    }

    #[test]
    fn late_styles_are_printed_in_the_footer() {
        let host = RecordingAssetHost::new();
        host.register(&AssetBundle::style("early", "https://cdn.example/a.css", &[], "1"));
        host.register(&AssetBundle::style("late", "https://cdn.example/b.css", &[], "1"));
        host.enqueue(AssetKind::Style, "early");

        let head = host.print_head().expect("head");
        assert!(head.contains("id=\"early-css\""));

        host.enqueue(AssetKind::Style, "late");
        let footer = host.print_footer().expect("footer");
        assert!(footer.contains("id=\"late-css\""));
        assert!(!footer.contains("early-css"));
    }

    #[test]
    fn classifier_reads_configured_families() {
        let classifier = TableFontClassifier::new()
            .with("Roboto", FontType::Standard)
            .with("Noto Sans Hebrew", FontType::EarlyAccess);

        assert_eq!(classifier.classify("Roboto"), FontType::Standard);
        assert_eq!(classifier.classify("Noto Sans Hebrew"), FontType::EarlyAccess);
        assert_eq!(classifier.classify("Arial"), FontType::Unknown);
    }
}
