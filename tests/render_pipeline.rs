mod support;

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use tessera::application::collaborators::RenderableNode;
use tessera::application::context::RequestInfo;
use tessera::application::elements::ElementRegistry;
use tessera::application::error::ElementError;
use tessera::application::frontend::RenderScope;
use tessera::domain::entities::{ElementDescriptor, EntityId, EntityRecord};
use serde_json::json;
use tessera::domain::types::{AssetKind, EditMode};

use support::{Harness, heading, section, template, text};

#[test]
fn single_section_page_renders_inside_fixed_wrapper() {
    let mut harness = Harness::new();
    harness.page(42, vec![section("s1", vec![text("Hi")])]);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(42), "en_US"));

    let html = harness.frontend.builder_content(EntityId(42), false);

    insta::assert_snapshot!(html, @r#"<div class="tessera tessera-42"><div class="tessera-inner"><div class="tessera-section-wrap"><section class="tessera-element tessera-section" data-id="s1"><div class="tessera-container"><div class="tessera-element tessera-widget tessera-widget-text">Hi</div></div></section></div></div></div>"#);
    assert!(harness.frontend.context().has_target_in_page);
}

#[test]
fn rendering_twice_registers_entity_css_once() {
    let mut harness = Harness::new();
    harness.page(42, vec![section("s1", vec![text("Hi")])]);
    harness.css.set_entity(EntityId(42), ".s1{color:red}");
    harness.frontend.begin_request(RequestInfo::singular(EntityId(42), "en_US"));

    let first = harness.frontend.builder_content(EntityId(42), false);
    let second = harness.frontend.builder_content(EntityId(42), false);

    assert_eq!(first, second);
    let registered = harness
        .frontend
        .registrar()
        .registered()
        .iter()
        .filter(|key| key.handle == "tessera-post-42")
        .count();
    assert_eq!(registered, 1);
}

#[test]
fn global_css_is_enqueued_before_entity_css() {
    let mut harness = Harness::new();
    harness.page(7, vec![text("body")]);
    harness.css.set_entity(EntityId(7), "p{}");
    harness.frontend.begin_request(RequestInfo::default());

    harness.frontend.builder_content(EntityId(7), false);

    let styles: Vec<String> = harness
        .assets
        .enqueued()
        .into_iter()
        .filter(|key| key.kind == AssetKind::Style)
        .map(|key| key.handle)
        .collect();
    assert_eq!(styles, ["tessera-global", "tessera-post-7"]);
}

#[test]
fn non_builder_entities_render_nothing_and_register_nothing() {
    let mut harness = Harness::new();
    harness.classic(3);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(3), "en_US"));

    assert_eq!(harness.frontend.builder_content(EntityId(3), false), "");
    assert!(harness.frontend.registrar().registered().is_empty());
    assert_eq!(harness.frontend.the_content("classic body"), "classic body");
}

#[test]
fn password_protected_and_missing_entities_render_nothing() {
    let mut harness = Harness::new();
    harness.store.insert(
        EntityRecord {
            id: EntityId(4),
            edit_mode: EditMode::Builder,
            password_required: true,
        },
        vec![text("secret")],
    );
    harness.frontend.begin_request(RequestInfo::default());

    assert_eq!(harness.frontend.builder_content(EntityId(4), false), "");
    assert_eq!(harness.frontend.builder_content(EntityId(404), false), "");
    assert_eq!(harness.frontend.builder_content_for_display(EntityId(404)), "");
}

#[test]
fn unknown_and_broken_descriptors_are_skipped() {
    let mut harness = Harness::new();
    harness.page(
        9,
        vec![
            ElementDescriptor::new("carousel"),
            ElementDescriptor::new("heading").with_setting("header_size", "h9"),
            ElementDescriptor::new("template"),
            text("kept"),
        ],
    );
    harness.frontend.begin_request(RequestInfo::default());

    let html = harness.frontend.builder_content(EntityId(9), false);

    assert!(html.contains("kept"));
    assert!(!html.contains("tessera-heading"));
    assert!(!html.contains("tessera-widget-template"));
}

#[test]
fn background_requests_inline_entity_css() {
    let mut harness = Harness::new();
    harness.page(42, vec![text("Hi")]);
    harness.css.set_entity(EntityId(42), ".hi{color:red}");
    harness.modes.set_background_request(true);
    harness.frontend.begin_request(RequestInfo::default());

    let html = harness.frontend.builder_content(EntityId(42), false);

    assert!(html.starts_with("<style>.hi{color:red}</style><div class=\"tessera tessera-42\">"));
}

#[test]
fn forced_inline_css_applies_to_one_pass_only() {
    let mut harness = Harness::new();
    harness.page(42, vec![text("Hi")]);
    harness.css.set_entity(EntityId(42), ".hi{}");
    harness.frontend.begin_request(RequestInfo::default());

    let inline = harness.frontend.builder_content(EntityId(42), true);
    let linked = harness.frontend.builder_content(EntityId(42), false);

    assert!(inline.starts_with("<style>.hi{}</style>"));
    assert!(!linked.contains("<style>"));
}

#[test]
fn embedded_template_in_edit_session_inlines_its_css() {
    let mut harness = Harness::new();
    harness.page(1, vec![template(2)]);
    harness.page(2, vec![text("footer")]);
    harness.css.set_entity(EntityId(1), ".page{}");
    harness.css.set_entity(EntityId(2), ".footer{}");
    harness.modes.set_edit_session(true);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(1), "en_US"));

    let html = harness.frontend.builder_content(EntityId(1), false);

    assert!(!html.contains(".page{}"));
    assert!(html.contains("<style>.footer{}</style><div class=\"tessera tessera-2\">"));
    assert_eq!(harness.frontend.current_frame().entity, Some(EntityId(1)));
}

#[test]
fn self_reference_shows_alert_in_edit_session_only() {
    let mut harness = Harness::new();
    harness.page(5, vec![text("before"), template(5)]);
    harness.modes.set_edit_session(true);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(5), "en_US"));

    let editing = harness.frontend.builder_content(EntityId(5), false);
    assert!(editing.contains("before"));
    assert!(editing.contains(
        "<div class=\"tessera-alert tessera-alert-danger\">Invalid Data: The Template ID cannot be the same as the currently edited template. Please choose a different one.</div>"
    ));

    harness.modes.set_edit_session(false);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(5), "en_US"));

    let viewing = harness.frontend.builder_content(EntityId(5), false);
    assert!(viewing.contains("before"));
    assert!(!viewing.contains("tessera-alert"));
    assert_eq!(viewing.matches("class=\"tessera tessera-5\"").count(), 1);
}

#[test]
fn mutual_embedding_renders_each_entity_once() {
    let mut harness = Harness::new();
    harness.page(1, vec![text("one"), template(2)]);
    harness.page(2, vec![text("two"), template(1)]);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(1), "en_US"));

    let html = harness.frontend.the_content("");

    assert_eq!(html.matches("class=\"tessera tessera-1\"").count(), 1);
    assert_eq!(html.matches("class=\"tessera tessera-2\"").count(), 1);
    assert_eq!(html.matches("one").count(), 1);
    assert_eq!(html.matches("two").count(), 1);
}

#[test]
fn tree_and_markup_filters_shape_the_render() {
    let mut harness = Harness::new();
    harness.page(8, vec![text("original")]);
    harness.frontend.hooks_mut().add_tree_filter(|mut tree, entity| {
        if entity == EntityId(8) {
            tree.push(support::text("appended"));
        }
        tree
    });
    harness
        .frontend
        .hooks_mut()
        .add_markup_filter(|html| format!("<!-- start -->{html}"));
    harness.frontend.begin_request(RequestInfo::default());

    let html = harness.frontend.builder_content(EntityId(8), false);

    assert!(html.starts_with("<!-- start --><div class=\"tessera tessera-8\">"));
    assert!(html.find("original") < html.find("appended"));
}

#[test]
fn tree_filter_emptying_the_tree_yields_nothing() {
    let mut harness = Harness::new();
    harness.page(8, vec![text("original")]);
    harness
        .frontend
        .hooks_mut()
        .add_tree_filter(|_, _| Vec::new());
    harness.frontend.begin_request(RequestInfo::default());

    assert_eq!(harness.frontend.builder_content(EntityId(8), false), "");
    assert!(!harness.frontend.context().has_target_in_page);
}

struct EntityProbe;

impl RenderableNode for EntityProbe {
    fn render(&self, out: &mut String, scope: &mut RenderScope<'_>) -> Result<(), ElementError> {
        let entity = scope.entity().map(|id| id.to_string()).unwrap_or_default();
        out.push_str(&format!("[in {entity} edit={}]", scope.is_edit_mode()));
        Ok(())
    }
}

fn entity_probe(_: &ElementDescriptor) -> Result<Box<dyn RenderableNode>, ElementError> {
    Ok(Box::new(EntityProbe))
}

#[test]
fn elements_observe_the_entity_being_rendered() {
    let mut registry = ElementRegistry::with_builtins();
    registry.register("probe", entity_probe);
    let mut harness = Harness::with_elements(registry);
    harness.page(1, vec![ElementDescriptor::new("probe"), template(2)]);
    harness.page(2, vec![ElementDescriptor::new("probe")]);
    harness.modes.set_edit_session(true);
    harness.frontend.begin_request(RequestInfo::singular(EntityId(1), "en_US"));

    let html = harness.frontend.builder_content(EntityId(1), false);

    assert!(html.contains("[in 1 edit=true]"));
    assert!(html.contains("[in 2 edit=false]"));
}

#[test]
fn render_metrics_count_passes_and_skips() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let mut harness = Harness::new();
        harness.page(
            9,
            vec![
                ElementDescriptor::new("carousel"),
                ElementDescriptor::new("heading").with_setting("header_size", "h9"),
                heading("Title", "Roboto"),
            ],
        );
        harness.frontend.begin_request(RequestInfo::singular(EntityId(9), "en_US"));
        harness.frontend.builder_content(EntityId(9), false);
        harness.frontend.head();
    });

    let counters: Vec<(String, Vec<String>, u64)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => {
                let key = composite_key.key();
                let labels = key
                    .labels()
                    .map(|label| format!("{}={}", label.key(), label.value()))
                    .collect();
                Some((key.name().to_string(), labels, count))
            }
            _ => None,
        })
        .collect();

    let count = |name: &str, label: Option<&str>| {
        counters
            .iter()
            .filter(|(metric, labels, _)| {
                metric == name && label.is_none_or(|label| labels.iter().any(|l| l == label))
            })
            .map(|(_, _, count)| *count)
            .sum::<u64>()
    };

    assert_eq!(count("tessera_render_total", None), 1);
    assert_eq!(count("tessera_elements_skipped_total", Some("stage=resolve")), 2);
    assert_eq!(count("tessera_elements_skipped_total", Some("stage=render")), 0);
    assert_eq!(count("tessera_fonts_flushed_total", Some("type=standard")), 1);
}

#[test]
fn direct_render_marks_the_page_for_footer_assets() {
    let mut harness = Harness::new();
    harness.page(7, vec![text("sidebar")]);
    harness.frontend.begin_request(RequestInfo::default());
    assert!(!harness.frontend.context().has_target_in_page);

    harness.frontend.register_assets();
    harness.frontend.enqueue_head_assets();
    assert!(harness.assets.enqueued().is_empty());

    let html = harness.frontend.builder_content(EntityId(7), false);
    assert!(html.contains("sidebar"));
    assert!(harness.frontend.context().has_target_in_page);

    harness.frontend.footer();

    assert!(
        harness
            .assets
            .enqueued()
            .iter()
            .any(|key| key.kind == AssetKind::Script && key.handle == "tessera-frontend")
    );
    let localized = harness.assets.localized();
    assert_eq!(localized.len(), 1);
    assert_eq!(localized[0].handle, "tessera-frontend");
    assert_eq!(localized[0].object_name, "tesseraFrontendConfig");
}

#[test]
fn stored_tree_with_malformed_descriptor_still_renders_siblings() {
    let mut harness = Harness::new();
    harness.store.insert_raw(
        EntityRecord {
            id: EntityId(42),
            edit_mode: EditMode::Builder,
            password_required: false,
        },
        json!([
            {"type": "section", "settings": [], "elements": [
                {"type": "text", "settings": {"content": "Hi"}},
                {"type": ""}
            ]},
            {"settings": {"content": "untyped"}},
            {"type": "text", "settings": {"content": "after"}}
        ]),
    );
    harness.frontend.begin_request(RequestInfo::singular(EntityId(42), "en_US"));
    assert!(harness.frontend.context().has_target_in_page);

    let html = harness.frontend.builder_content(EntityId(42), false);

    assert!(html.contains("<div class=\"tessera-container\"><div class=\"tessera-element tessera-widget tessera-widget-text\">Hi</div></div>"));
    assert!(html.contains("after"));
    assert!(!html.contains("untyped"));
}

#[test]
fn corrupt_stored_tree_renders_nothing_for_that_entity_only() {
    let mut harness = Harness::new();
    harness.store.insert_raw(
        EntityRecord {
            id: EntityId(1),
            edit_mode: EditMode::Builder,
            password_required: false,
        },
        json!({"type": "section"}),
    );
    harness.page(2, vec![text("fine")]);
    harness.frontend.begin_request(RequestInfo::default());

    assert_eq!(harness.frontend.builder_content(EntityId(1), false), "");
    assert!(harness.frontend.builder_content(EntityId(2), false).contains("fine"));
}
