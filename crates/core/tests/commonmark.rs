//! Serializer output checked against an independent CommonMark parser.

use markdown::mdast;
use mdxsync_core::{Node, default_transformers, kinds, serialize};

fn mdast_of(markup: &str) -> mdast::Node {
    markdown::to_mdast(markup, &markdown::ParseOptions::default()).unwrap()
}

fn blocks(tree: &mdast::Node) -> &[mdast::Node] {
    tree.children().map(Vec::as_slice).unwrap_or_default()
}

fn plain_text(node: &mdast::Node) -> String {
    match node {
        mdast::Node::Text(text) => text.value.clone(),
        mdast::Node::InlineCode(code) => code.value.clone(),
        other => blocks(other).iter().map(plain_text).collect(),
    }
}

fn sample() -> Node {
    Node::root(vec![
        Node::heading(1, vec![Node::text("Guide")]),
        Node::paragraph(vec![
            Node::text("Use "),
            Node::element(kinds::STRONG, vec![Node::text("bold")]),
            Node::text(" and "),
            Node::element(kinds::EMPHASIS, vec![Node::text("italic")]),
            Node::text(" with "),
            Node::new(kinds::INLINE_CODE).with_attr("text", "a `tick`"),
            Node::text("."),
        ]),
        Node::heading(3, vec![Node::text("Steps")]),
        Node::element(
            kinds::LIST,
            vec![
                Node::element(kinds::LIST_ITEM, vec![Node::text("fetch")]),
                Node::element(kinds::LIST_ITEM, vec![Node::text("build")]),
            ],
        )
        .with_attr("listType", "number")
        .with_attr("start", 4),
        Node::element(
            kinds::LIST,
            vec![Node::element(
                kinds::LIST_ITEM,
                vec![
                    Node::text("outer"),
                    Node::element(
                        kinds::LIST,
                        vec![Node::element(kinds::LIST_ITEM, vec![Node::text("inner")])],
                    )
                    .with_attr("listType", "bullet"),
                ],
            )],
        )
        .with_attr("listType", "bullet"),
        Node::element(kinds::QUOTE, vec![Node::text("quoted")]),
        Node::element(kinds::CODE, vec![Node::text("let x = 1;\n```\nnested")])
            .with_attr("language", "rust"),
        Node::new(kinds::HORIZONTAL_RULE),
        Node::paragraph(vec![
            Node::element(kinds::LINK, vec![Node::text("home")])
                .with_attr("url", "https://example.com/a (b)"),
        ]),
    ])
}

#[test]
fn block_structure_matches_commonmark() {
    let markup = serialize(&sample(), default_transformers());
    let tree = mdast_of(&markup);
    let top = blocks(&tree);
    assert_eq!(top.len(), 9, "{markup}");

    assert!(matches!(&top[0], mdast::Node::Heading(heading) if heading.depth == 1));
    assert!(matches!(&top[1], mdast::Node::Paragraph(_)));
    assert!(matches!(&top[2], mdast::Node::Heading(heading) if heading.depth == 3));
    assert!(matches!(
        &top[3],
        mdast::Node::List(list) if list.ordered && list.start == Some(4) && list.children.len() == 2
    ));
    assert!(matches!(&top[4], mdast::Node::List(list) if !list.ordered));
    assert!(matches!(&top[5], mdast::Node::Blockquote(_)));
    assert!(matches!(
        &top[6],
        mdast::Node::Code(code)
            if code.lang.as_deref() == Some("rust") && code.value == "let x = 1;\n```\nnested"
    ));
    assert!(matches!(&top[7], mdast::Node::ThematicBreak(_)));
    assert!(matches!(&top[8], mdast::Node::Paragraph(_)));
}

#[test]
fn inline_content_matches_commonmark() {
    let markup = serialize(&sample(), default_transformers());
    let tree = mdast_of(&markup);
    let top = blocks(&tree);

    let inline = blocks(&top[1]);
    assert!(matches!(&inline[1], mdast::Node::Strong(_)));
    assert!(matches!(&inline[3], mdast::Node::Emphasis(_)));
    assert!(matches!(&inline[5], mdast::Node::InlineCode(code) if code.value == "a `tick`"));
    assert_eq!(plain_text(&top[1]), "Use bold and italic with a `tick`.");

    let nested = blocks(&top[4]);
    let outer = blocks(&nested[0]);
    assert_eq!(plain_text(&outer[0]), "outer");
    assert!(matches!(&outer[1], mdast::Node::List(_)));

    match &blocks(&top[8])[0] {
        mdast::Node::Link(link) => assert_eq!(link.url, "https://example.com/a (b)"),
        other => panic!("expected a link, got {other:?}"),
    }
}

#[test]
fn escaped_text_stays_literal() {
    let lines = [
        "# not a heading",
        "1. not a list",
        "- not a bullet",
        "*not emphasis*",
        "> not a quote",
    ];
    for line in lines {
        let root = Node::root(vec![Node::paragraph(vec![Node::text(line)])]);
        let markup = serialize(&root, default_transformers());
        let tree = mdast_of(&markup);
        let top = blocks(&tree);
        assert_eq!(top.len(), 1, "{markup}");
        assert!(matches!(&top[0], mdast::Node::Paragraph(_)), "{markup}");
        assert_eq!(plain_text(&top[0]), line);
    }

    let heading = Node::root(vec![Node::heading(2, vec![Node::text("C#")])]);
    let markup = serialize(&heading, default_transformers());
    let tree = mdast_of(&markup);
    assert!(matches!(&blocks(&tree)[0], mdast::Node::Heading(heading) if heading.depth == 2));
    assert_eq!(plain_text(&tree), "C#");
}
