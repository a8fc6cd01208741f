use mdxsync_core::{
    FrontMatter, FrontMatterEntry, Node, TransformerSet, default_transformers, document_to_file,
    file_to_document, kinds, parse, serialize,
};

const RELEASE_NOTES: &str = r#"---
title: Release notes
draft: false
---

# Release notes

Version **2.0** ships with *faster* parsing and `inline code`.

## Changes

- Parser rewrite
  - block rules
  - inline rules
- New [docs](https://example.com/docs "Docs home")

1. Download
2. Install

- [x] tests
- [ ] benchmarks

> Quoted text
> on two lines

```rust
fn main() {}
```

***

Final ~~draft~~ paragraph."#;

fn kinds_of(root: &Node) -> Vec<&str> {
    root.children.iter().map(|node| node.kind.as_str()).collect()
}

#[test]
fn canonical_file_is_byte_stable() {
    let loaded = file_to_document(RELEASE_NOTES, default_transformers());
    assert!(!loaded.diagnostics.has_any());
    let written = document_to_file(&loaded.root, &loaded.front_matter, default_transformers());
    assert_eq!(written, RELEASE_NOTES);
}

#[test]
fn canonical_file_structure() {
    let loaded = file_to_document(RELEASE_NOTES, default_transformers());
    assert_eq!(loaded.front_matter.get("title"), Some("Release notes"));
    assert_eq!(loaded.front_matter.get("draft"), Some("false"));
    assert_eq!(
        kinds_of(&loaded.root),
        vec![
            kinds::HEADING,
            kinds::PARAGRAPH,
            kinds::HEADING,
            kinds::LIST,
            kinds::LIST,
            kinds::LIST,
            kinds::QUOTE,
            kinds::CODE,
            kinds::HORIZONTAL_RULE,
            kinds::PARAGRAPH,
        ]
    );

    let lists: Vec<_> = loaded
        .root
        .children
        .iter()
        .filter(|node| node.is(kinds::LIST))
        .map(|node| node.attr_str("listType").unwrap_or_default())
        .collect();
    assert_eq!(lists, vec!["bullet", "number", "check"]);

    let nested = &loaded.root.children[3].children[0];
    assert_eq!(nested.children[0], Node::text("Parser rewrite"));
    assert!(nested.children[1].is(kinds::LIST));

    let code = &loaded.root.children[7];
    assert_eq!(code.attr_str("language"), Some("rust"));
    assert_eq!(code.text_content(), "fn main() {}");
}

#[test]
fn stabilizes_after_one_pass() {
    let messy = "#   Title   #\n\n\n* one\n* two\n\n\nsome  _soft_ text\n\n___\n";
    let first = serialize(&parse(messy, default_transformers()), default_transformers());
    let second = serialize(&parse(&first, default_transformers()), default_transformers());
    assert_eq!(first, second);
    insta::assert_snapshot!(first.replace('\n', "|"), @"# Title||- one|- two||some  *soft* text||***");
}

#[test]
fn worked_example_empty_paragraph() {
    let front_matter = FrontMatter::from(vec![FrontMatterEntry::new("title", "Intro")]);
    let root = Node::root(vec![Node::paragraph(vec![])]);
    let file = document_to_file(&root, &front_matter, default_transformers());
    assert_eq!(file, "---\ntitle: Intro\n---\n\n");

    let loaded = file_to_document(&file, default_transformers());
    assert_eq!(loaded.root, root);
    assert_eq!(loaded.front_matter, front_matter);
}

#[test]
fn worked_example_heading_with_emphasis() {
    let root = parse("# Hello *world*", default_transformers());
    assert_eq!(
        root,
        Node::root(vec![Node::heading(
            1,
            vec![
                Node::text("Hello "),
                Node::element(kinds::EMPHASIS, vec![Node::text("world")]),
            ]
        )])
    );
    insta::assert_snapshot!(serialize(&root, default_transformers()), @"# Hello *world*");
}

#[test]
fn worked_example_heading_then_paragraph() {
    let transformers =
        TransformerSet::from_features(&["heading", "paragraph", "emphasis"][..]).unwrap();
    let markup = "# Heading\n\nSome *text*.";
    let root = parse(markup, &transformers);
    assert_eq!(
        root,
        Node::root(vec![
            Node::heading(1, vec![Node::text("Heading")]),
            Node::paragraph(vec![
                Node::text("Some "),
                Node::element(kinds::EMPHASIS, vec![Node::text("text")]),
                Node::text("."),
            ]),
        ])
    );
    assert_eq!(serialize(&root, &transformers), markup);
}

#[test]
fn restricted_set_keeps_unsupported_markup_as_text() {
    let transformers = TransformerSet::from_features(&["heading", "paragraph"][..]).unwrap();
    let root = parse("# Title\n\n- not a list\n- still text", &transformers);
    assert_eq!(kinds_of(&root), vec![kinds::HEADING, kinds::PARAGRAPH]);
    assert_eq!(root.children[1].text_content(), "- not a list\n- still text");
}

#[test]
fn unknown_nodes_degrade_to_text() {
    let root = Node::root(vec![
        Node::paragraph(vec![
            Node::text("Hi "),
            Node::new("mention").with_attr("text", "@sam"),
        ]),
        Node::element("callout", vec![Node::text("Careful")]),
    ]);
    assert_eq!(serialize(&root, default_transformers()), "Hi @sam\n\nCareful");
}

#[test]
fn file_without_header_keeps_leading_text() {
    let loaded = file_to_document("Plain body\n---\nnot a header", default_transformers());
    assert!(loaded.front_matter.is_empty());
    assert!(loaded.root.text_content().starts_with("Plain body"));
}
