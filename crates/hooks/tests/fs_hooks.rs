use mdxsync_hooks::{
    BatchInput, BatchOptions, CollectionConfig, FsStore, HookContext, HookError, MarkupHooks,
    load_documents,
};
use serde_json::{Value, json};
use std::fs;

const POSTS: &str = r#"
slug: posts
fields:
  - name: docPath
    type: text
  - name: frontMatter
    type: array
  - name: richText
    type: richText
    editor:
      features: [heading, paragraph, list, strong, emphasis, link]
"#;

fn posts() -> CollectionConfig {
    CollectionConfig::from_yaml_str(POSTS).unwrap()
}

fn record(path: &str) -> Value {
    json!({
        "id": "42",
        "docPath": path,
        "frontMatter": [
            { "key": "title", "value": "Getting started" },
            { "key": "order", "value": 2 },
        ],
        "richText": { "root": { "type": "root", "children": [
            { "type": "heading", "level": 2, "children": [{ "type": "text", "text": "Install" }] },
            { "type": "paragraph", "children": [
                { "type": "text", "text": "Run the " },
                { "type": "strong", "children": [{ "type": "text", "text": "installer" }] },
                { "type": "text", "text": " and read the " },
                { "type": "link", "url": "https://example.com/docs", "children": [
                    { "type": "text", "text": "docs" }
                ] },
                { "type": "text", "text": "." },
            ] },
            { "type": "list", "listType": "bullet", "children": [
                { "type": "listitem", "children": [{ "type": "text", "text": "one" }] },
                { "type": "listitem", "children": [{ "type": "text", "text": "two" }] },
            ] },
        ] } },
    })
}

#[test]
fn save_then_load_round_trips_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let hooks = MarkupHooks::new(dir.path());
    let ctx = HookContext::default();
    let original = record("guide/install.md");

    let saved = hooks.before_change(&posts(), original.clone(), &ctx).unwrap();
    assert_eq!(saved["richText"], Value::Null);

    let on_disk = fs::read_to_string(dir.path().join("guide/install.md")).unwrap();
    assert_eq!(
        on_disk,
        "---\ntitle: Getting started\norder: 2\n---\n\n## Install\n\nRun the **installer** and read the [docs](https://example.com/docs).\n\n- one\n- two"
    );

    let loaded = hooks.after_read(&posts(), saved, &ctx).unwrap();
    assert_eq!(loaded["id"], "42");
    assert_eq!(loaded["richText"], original["richText"]);
    assert_eq!(
        loaded["frontMatter"],
        json!([
            { "key": "title", "value": "Getting started" },
            { "key": "order", "value": "2" },
        ])
    );
}

#[test]
fn empty_document_without_front_matter_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let hooks = MarkupHooks::new(dir.path());
    let data = json!({ "docPath": "empty.md", "richText": null });
    hooks
        .before_change(&posts(), data, &HookContext::default())
        .unwrap();
    assert!(!dir.path().join("empty.md").exists());
}

#[test]
fn after_read_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let hooks = MarkupHooks::new(dir.path());
    let err = hooks
        .after_read(&posts(), json!({ "docPath": "nope.md" }), &HookContext::default())
        .unwrap_err();
    assert!(matches!(err, HookError::Io { .. }));
}

#[test]
fn batch_loads_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    for index in 0..8 {
        fs::write(
            dir.path().join(format!("{index}.md")),
            format!("---\nindex: {index}\n---\n\n# Page {index}"),
        )
        .unwrap();
    }
    let mut inputs: Vec<BatchInput> = (0..8)
        .map(|index| BatchInput {
            id: index.to_string(),
            path: format!("{index}.md").into(),
        })
        .collect();
    inputs.push(BatchInput {
        id: "missing".to_string(),
        path: "missing.md".into(),
    });

    let transformers = posts().transformers_for("richText").unwrap();
    let options = BatchOptions {
        max_threads: Some(2),
        continue_on_error: None,
    };
    let batch = load_documents(&FsStore, dir.path(), &transformers, inputs, &options).unwrap();

    assert_eq!(batch.stats.total, 9);
    assert_eq!(batch.stats.succeeded, 8);
    assert_eq!(batch.stats.failed, 1);
    let ids: Vec<_> = batch.results.iter().map(|result| result.id.as_str()).collect();
    assert_eq!(ids, vec!["0", "1", "2", "3", "4", "5", "6", "7", "missing"]);

    let third = batch.results[3].document.as_ref().unwrap();
    assert_eq!(third.front_matter[0].value, "3");
    assert_eq!(
        third.editor_state["root"]["children"][0]["children"][0]["text"],
        "Page 3"
    );
    assert!(batch.results[8].error.is_some());
}

#[test]
fn batch_stops_at_first_failure_when_asked() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.md"), "a").unwrap();
    fs::write(dir.path().join("c.md"), "c").unwrap();
    let inputs = ["a", "b", "c"]
        .iter()
        .map(|name| BatchInput {
            id: name.to_string(),
            path: format!("{name}.md").into(),
        })
        .collect();
    let options = BatchOptions {
        max_threads: None,
        continue_on_error: Some(false),
    };
    let transformers = posts().transformers_for("richText").unwrap();
    let batch = load_documents(&FsStore, dir.path(), &transformers, inputs, &options).unwrap();
    assert_eq!(batch.results.len(), 2);
    assert_eq!(batch.stats.total, 3);
    assert_eq!(batch.stats.succeeded, 1);
    assert_eq!(batch.stats.failed, 1);
}
