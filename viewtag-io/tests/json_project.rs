use std::path::PathBuf;

use viewtag_config::TaggingConfig;
use viewtag_core::document::{Category, Document, ElementId, ViewKind};
use viewtag_core::geometry::Point3;
use viewtag_engine::AutoTagger;
use viewtag_engine::demo::populate_demo;
use viewtag_engine::observer::NoticeLog;
use viewtag_io::{DocumentLoader, DocumentSaver, IoError, JsonFacade, load_document};

fn load_inline(name: &str, document: &str) -> Result<Document, IoError> {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join(name);
    let data = format!(r#"{{ "format_version": 1, "document": {document} }}"#);
    std::fs::write(&path, data).expect("write project file");
    JsonFacade::new().load(&path)
}

const DOOR_VIEWS_AND_TEMPLATES: &str = r#"
    "views": [[0, { "name": "Level 1", "kind": "floor_plan" }]],
    "tag_types": [
        [1, { "family_name": "Door Tag", "type_name": "Standard", "category": "Doors" }],
        [2, { "family_name": "Room Tag", "type_name": "Name and Number", "category": "Rooms" }],
        [3, { "family_name": "Wall Tag", "type_name": "Type Mark", "category": "Walls" }]
    ]"#;

fn invalid_message(err: IoError) -> String {
    match err {
        IoError::InvalidDocument(message) => message,
        other => panic!("expected an invalid document, got {other}"),
    }
}

fn fixture(name: &str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path
}

#[test]
fn load_fixture_matches_expected_document() {
    let doc = JsonFacade::new()
        .load(&fixture("level1_project.json"))
        .expect("读取项目文件失败");

    assert_eq!(doc.active_view(), Some(ElementId::new(0)));
    assert_eq!(doc.views().count(), 2);
    assert_eq!(
        doc.view(ElementId::new(10)).map(|view| view.kind),
        Some(ViewKind::AreaPlan)
    );
    assert_eq!(doc.elements().count(), 6);
    assert_eq!(doc.tag_types().count(), 3);
    assert_eq!(doc.tags().count(), 1);

    let wall_type = doc.element(ElementId::new(4)).expect("wall type");
    assert!(wall_type.is_type);
    assert_eq!(wall_type.category, Category::Walls);
    assert!(doc.element(ElementId::new(11)).unwrap().location.is_none());
}

#[test]
fn fixture_is_tagged_and_saved() {
    let mut doc = load_document(&fixture("level1_project.json")).expect("读取项目文件失败");
    let view = doc.active_view().expect("active view");

    let mut log = NoticeLog::new();
    let report = AutoTagger::new(&TaggingConfig::default())
        .unwrap()
        .run(&mut doc, view, &mut log)
        .expect("auto tag");

    assert_eq!(report.candidates, 5);
    assert_eq!(
        report.tagged_elements,
        vec![ElementId::new(5), ElementId::new(6), ElementId::new(7)]
    );
    assert_eq!(report.skipped_tagged, 1);
    assert_eq!(report.skipped_unplaced, 1);
    assert_eq!(log.with_title("Curtain wall").count(), 1);

    // 新标记 ID 从文件中记录的计数器继续分配。
    assert_eq!(
        report.tags,
        vec![ElementId::new(12), ElementId::new(13), ElementId::new(14)]
    );

    let (_, wall_tag) = doc
        .tags()
        .find(|(_, tag)| tag.references(ElementId::new(7)))
        .expect("wall tag");
    assert_eq!(wall_tag.head, Point3::new(5.0, 2.0, 0.0));

    let dir = tempfile::tempdir().expect("create temp dir");
    let output = dir.path().join("tagged.json");
    JsonFacade::new().save(&doc, &output).expect("保存项目文件失败");

    let mut reloaded = load_document(&output).expect("重新读取项目文件失败");
    assert_eq!(reloaded.tags().count(), 4);

    let second = AutoTagger::new(&TaggingConfig::default())
        .unwrap()
        .run(&mut reloaded, view, &mut NoticeLog::new())
        .expect("second run");
    assert_eq!(second.placed_count(), 0);
}

#[test]
fn demo_project_survives_compact_encoding() {
    let mut doc = Document::new();
    let project = populate_demo(&mut doc).expect("populate demo");

    let dir = tempfile::tempdir().expect("create temp dir");
    let output = dir.path().join("demo.json");
    JsonFacade::compact().save(&doc, &output).expect("save");

    let reloaded = JsonFacade::new().load(&output).expect("load");
    assert_eq!(reloaded.active_view(), Some(project.view));
    assert_eq!(reloaded.elements().count(), doc.elements().count());
    assert_eq!(
        reloaded.element(project.tagged_wall).unwrap().location,
        doc.element(project.tagged_wall).unwrap().location
    );
}

#[test]
fn malformed_and_missing_files_are_reported() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ \"format_version\": 1, \"document\": ").unwrap();

    let err = JsonFacade::new().load(&broken).unwrap_err();
    assert!(matches!(err, IoError::Decode { .. }));

    let err = JsonFacade::new()
        .load(&dir.path().join("missing.json"))
        .unwrap_err();
    assert!(matches!(err, IoError::ReadError { .. }));
}

#[test]
fn dangling_tag_reference_is_rejected() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("dangling.json");
    std::fs::write(
        &path,
        r#"{
            "format_version": 1,
            "document": {
                "views": [[0, { "name": "Level 1", "kind": "floor_plan" }]],
                "tag_types": [[1, {
                    "family_name": "Door Tag",
                    "type_name": "Standard",
                    "category": "Doors"
                }]],
                "tags": [[2, {
                    "tag_type": 1,
                    "view": 0,
                    "tagged": [99],
                    "head": [0.0, 0.0, 0.0],
                    "orientation": "horizontal",
                    "has_leader": false
                }]],
                "next_id": 3
            }
        }"#,
    )
    .unwrap();

    let err = JsonFacade::new().load(&path).unwrap_err();
    assert!(
        matches!(err, IoError::InvalidDocument(message) if message.contains("missing element 99"))
    );
}

#[test]
fn stale_id_counter_is_rejected() {
    let door = r#"[5, {
        "name": "Door",
        "category": "Doors",
        "location": { "Point": [1.0, 0.0, 0.0] },
        "views": [0]
    }]"#;

    // 缺少计数器时默认为 0，新标记会与视图 0 冲突。
    let missing = format!("{{ {DOOR_VIEWS_AND_TEMPLATES}, \"elements\": [{door}] }}");
    let message = invalid_message(load_inline("missing_counter.json", &missing).unwrap_err());
    assert!(message.contains("next_id 0"), "{message}");

    let equal = format!("{{ {DOOR_VIEWS_AND_TEMPLATES}, \"elements\": [{door}], \"next_id\": 5 }}");
    let message = invalid_message(load_inline("equal_counter.json", &equal).unwrap_err());
    assert!(message.contains("allocated id 5"), "{message}");

    let valid = format!("{{ {DOOR_VIEWS_AND_TEMPLATES}, \"elements\": [{door}], \"next_id\": 6 }}");
    let mut doc = load_inline("valid_counter.json", &valid).expect("valid counter");
    let report = AutoTagger::new(&TaggingConfig::default())
        .unwrap()
        .run(&mut doc, ElementId::new(0), &mut NoticeLog::new())
        .expect("auto tag");
    assert_eq!(report.tags, vec![ElementId::new(6)]);
}

#[test]
fn duplicate_ids_are_rejected() {
    let elements = r#"[
        [5, { "name": "Door", "category": "Doors", "location": { "Point": [1.0, 0.0, 0.0] } }],
        [5, { "name": "Door", "category": "Doors", "location": { "Point": [4.0, 0.0, 0.0] } }]
    ]"#;
    let twin_elements = format!(
        "{{ {DOOR_VIEWS_AND_TEMPLATES}, \"elements\": {elements}, \"next_id\": 6 }}"
    );
    let message = invalid_message(load_inline("twin_elements.json", &twin_elements).unwrap_err());
    assert!(message.contains("id 5 is assigned more than once"), "{message}");

    // 不同集合之间同样共用 ID 空间：元素不能复用标记类型的 ID。
    let shadowing = r#"[[2, { "name": "Door", "category": "Doors", "views": [0] }]]"#;
    let cross = format!(
        "{{ {DOOR_VIEWS_AND_TEMPLATES}, \"elements\": {shadowing}, \"next_id\": 6 }}"
    );
    let message = invalid_message(load_inline("shadowed_tag_type.json", &cross).unwrap_err());
    assert!(message.contains("id 2 is assigned more than once"), "{message}");
}
