#![allow(dead_code)]

use std::rc::Rc;

use tessera::application::collaborators::Collaborators;
use tessera::application::elements::ElementRegistry;
use tessera::application::frontend::{Frontend, FrontendSettings};
use tessera::domain::entities::{ElementDescriptor, EntityId, EntityRecord};
use tessera::domain::types::{EditMode, FontType};
use tessera::infra::memory::{
    InMemoryContentStore, InMemoryCssCompiler, RecordingAssetHost, StaticModes,
    TableFontClassifier,
};

pub struct Harness {
    pub store: Rc<InMemoryContentStore>,
    pub css: Rc<InMemoryCssCompiler>,
    pub assets: Rc<RecordingAssetHost>,
    pub modes: Rc<StaticModes>,
    pub frontend: Frontend,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_elements(ElementRegistry::with_builtins())
    }

    pub fn with_elements(registry: ElementRegistry) -> Self {
        Self::with_parts(registry, FrontendSettings::default())
    }

    pub fn with_settings(settings: FrontendSettings) -> Self {
        Self::with_parts(ElementRegistry::with_builtins(), settings)
    }

    pub fn with_parts(registry: ElementRegistry, settings: FrontendSettings) -> Self {
        let store = Rc::new(InMemoryContentStore::new());
        let css = Rc::new(InMemoryCssCompiler::new("https://cdn.example/css"));
        let assets = Rc::new(RecordingAssetHost::new());
        let modes = Rc::new(StaticModes::new());
        let fonts = TableFontClassifier::new()
            .with("Roboto", FontType::Standard)
            .with("Open Sans", FontType::Standard)
            .with("Noto Sans Hebrew", FontType::EarlyAccess);

        css.set_global("body{margin:0}");

        let collaborators = Collaborators {
            store: store.clone(),
            elements: Rc::new(registry),
            css: css.clone(),
            fonts: Rc::new(fonts),
            assets: assets.clone(),
            modes: modes.clone(),
        };

        Self {
            store,
            css,
            assets,
            modes,
            frontend: Frontend::new(collaborators, settings),
        }
    }

    pub fn page(&self, id: u64, tree: Vec<ElementDescriptor>) {
        self.store.insert_builder(EntityId(id), tree);
    }

    pub fn classic(&self, id: u64) {
        self.store.insert(
            EntityRecord {
                id: EntityId(id),
                edit_mode: EditMode::from("classic"),
                password_required: false,
            },
            Vec::new(),
        );
    }
}

pub fn text(content: &str) -> ElementDescriptor {
    ElementDescriptor::new("text").with_setting("content", content)
}

pub fn section(id: &str, children: Vec<ElementDescriptor>) -> ElementDescriptor {
    children
        .into_iter()
        .fold(ElementDescriptor::new("section").with_id(id), |section, child| {
            section.with_child(child)
        })
}

pub fn template(id: u64) -> ElementDescriptor {
    ElementDescriptor::new("template").with_setting("template_id", id)
}

pub fn heading(title: &str, family: &str) -> ElementDescriptor {
    ElementDescriptor::new("heading")
        .with_setting("title", title)
        .with_setting("font_family", family)
}
