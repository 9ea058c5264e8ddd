use content_tree::{
    BlockKind, ContentTree, Edge, LeafValue, Mode, NodeId, NodeKind, NodeSpec, Position,
    TreeConfig, TreeError, Violation,
};

fn doc_with(specs: &[NodeSpec], config: TreeConfig) -> ContentTree {
    ContentTree::from_specs(specs, config).unwrap()
}

fn doc(paragraphs: &[&str]) -> ContentTree {
    let specs: Vec<NodeSpec> = paragraphs.iter().map(|p| NodeSpec::paragraph(p)).collect();
    doc_with(&specs, TreeConfig::default())
}

fn find(tree: &ContentTree, value: &str) -> NodeId {
    tree.arena()
        .descendants(tree.root(), Mode::RangeHidden)
        .find(|id| {
            tree.arena().get(*id).is_some_and(|n| {
                n.kind() == &NodeKind::Leaf(LeafValue::Char(value.to_string()))
            })
        })
        .unwrap()
}

/// Collapsed cursor right before the character `value`.
fn cursor_before(tree: &mut ContentTree, value: &str) {
    let id = find(tree, value);
    tree.set_start(id, Position::Before).unwrap();
    tree.collapse(Edge::Start).unwrap();
}

fn cursor_after(tree: &mut ContentTree, value: &str) {
    let id = find(tree, value);
    tree.set_start(id, Position::After).unwrap();
    tree.collapse(Edge::Start).unwrap();
}

#[test]
fn test_insert_text_at_cursor() {
    let mut tree = doc(&["abc"]);
    cursor_before(&mut tree, "b");
    assert_eq!(tree.outline(), "p(a[]bc)");

    let created = tree.insert_text("X").unwrap();

    assert_eq!(created.len(), 1);
    assert_eq!(tree.outline(), "p(aX[]bc)");
    assert_eq!(tree.text(), "aXbc");
    tree.check_invariants().unwrap();
}

#[test]
fn test_insert_text_splits_graphemes() {
    let mut tree = doc(&[""]);

    let created = tree.insert_text("e\u{301}👍🏽!").unwrap();

    assert_eq!(created.len(), 3);
    assert_eq!(tree.text(), "e\u{301}👍🏽!");
}

#[test]
fn test_insert_replaces_selection() {
    let mut tree = doc(&["abc"]);
    let b = find(&tree, "b");
    tree.select(b, Position::Before, b, Position::After).unwrap();

    tree.insert_text("X").unwrap();

    assert_eq!(tree.outline(), "p(aX[]c)");
    assert!(tree.arena().get(b).is_none());
}

#[test]
fn test_insert_keeps_backward_collapsed_range_collapsed() {
    let mut tree = doc(&["abc"]);
    let a = find(&tree, "a");
    tree.set_start(a, Position::After).unwrap();
    tree.set_end(a, Position::After).unwrap();
    assert_eq!(tree.outline(), "p(a][bc)");
    assert!(tree.is_collapsed());

    tree.insert_text("X").unwrap();

    assert_eq!(tree.outline(), "p(aX][bc)");
    assert!(tree.is_collapsed());
}

#[test]
fn test_insert_existing_node_moves_it() {
    let mut tree = doc(&["abc"]);
    let a = find(&tree, "a");
    cursor_after(&mut tree, "c");

    tree.insert(a).unwrap();

    assert_eq!(tree.outline(), "p(bca[])");
}

#[test]
fn test_newline_splits_block() {
    let mut tree = doc(&[""]);

    tree.insert_text("ab\ncd").unwrap();

    assert_eq!(tree.outline(), "p(ab)p(cd[])");
    assert_eq!(tree.text(), "ab\ncd");
}

#[test]
fn test_newline_as_line_break() {
    let config = TreeConfig {
        newline_splits_block: false,
        ..TreeConfig::default()
    };
    let mut tree = doc_with(&[NodeSpec::paragraph("")], config);

    tree.insert_text("ab\r\ncd").unwrap();

    assert_eq!(tree.outline(), "p(ab⏎cd[])");
    assert_eq!(tree.text(), "ab\ncd");
}

#[test]
fn test_delete_selection_on_collapsed_range_is_a_no_op() {
    let mut tree = doc(&["abc"]);
    cursor_before(&mut tree, "b");

    let removed = tree.delete_selection().unwrap();

    assert!(removed.is_empty());
    assert_eq!(tree.outline(), "p(a[]bc)");
}

#[test]
fn test_delete_selection_across_blocks_merges_them() {
    let mut tree = doc(&["ab", "cd"]);
    let (b, c) = (find(&tree, "b"), find(&tree, "c"));
    let p2 = tree.arena().parent(c).unwrap();
    tree.select(b, Position::Before, c, Position::After).unwrap();

    let removed = tree.delete_selection().unwrap();

    assert_eq!(removed, vec![b, p2, c]);
    assert_eq!(tree.outline(), "p(a[]d)");
    for id in removed {
        assert!(!tree.arena().contains(id));
    }
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_into_nested_block_keeps_leftover_order() {
    let mut tree = doc_with(
        &[
            NodeSpec::paragraph("ab"),
            NodeSpec::Block {
                kind: BlockKind::Quote,
                attrs: Vec::new(),
                children: vec![NodeSpec::paragraph("xy"), NodeSpec::paragraph("d")],
            },
        ],
        TreeConfig::default(),
    );
    let (a, x) = (find(&tree, "a"), find(&tree, "x"));
    tree.select(a, Position::After, x, Position::After).unwrap();
    assert_eq!(tree.outline(), "p(a[b)quote(p(x]y)p(d))");

    tree.delete_selection().unwrap();

    assert_eq!(tree.outline(), "p(a[]yp(d))");
    assert_eq!(tree.text(), "ay\nd");
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_backward_selection_collapses_at_leading_edge() {
    let mut tree = doc(&["abcd"]);
    let (b, c) = (find(&tree, "b"), find(&tree, "c"));
    tree.select(c, Position::After, b, Position::Before).unwrap();

    tree.delete_selection().unwrap();

    assert_eq!(tree.outline(), "p(a[]d)");
    assert!(tree.is_collapsed());
}

#[test]
fn test_select_all_then_delete_leaves_empty_block() {
    let mut tree = doc(&["ab", "cd"]);

    tree.select_all().unwrap();
    assert_eq!(tree.outline(), "p([ab)p(cd])");
    tree.delete_selection().unwrap();

    assert_eq!(tree.outline(), "p([])");
    assert_eq!(tree.text(), "");
}

#[test]
fn test_backspace_removes_previous_character() {
    let mut tree = doc(&["abc"]);
    cursor_before(&mut tree, "b");

    tree.delete_selection_backward().unwrap();

    assert_eq!(tree.outline(), "p([]bc)");
}

#[test]
fn test_backspace_at_block_start_merges_into_previous() {
    let mut tree = doc(&["a", "b"]);
    cursor_before(&mut tree, "b");
    assert_eq!(tree.outline(), "p(a)p([]b)");

    tree.delete_selection_backward().unwrap();

    assert_eq!(tree.outline(), "p(a[]b)");
    tree.check_invariants().unwrap();
}

#[test]
fn test_backspace_at_document_start_does_nothing() {
    let mut tree = doc(&["abc"]);

    let removed = tree.delete_selection_backward().unwrap();

    assert!(removed.is_empty());
    assert_eq!(tree.outline(), "p([]abc)");
}

#[test]
fn test_backspace_into_empty_block_removes_it() {
    let mut tree = doc(&["", "b"]);
    cursor_before(&mut tree, "b");

    tree.delete_selection_backward().unwrap();

    assert_eq!(tree.outline(), "p([]b)");
}

#[test]
fn test_delete_forward_removes_next_character() {
    let mut tree = doc(&["abc"]);
    cursor_before(&mut tree, "b");

    tree.delete_selection_forward().unwrap();

    assert_eq!(tree.outline(), "p(a[]c)");
}

#[test]
fn test_delete_forward_at_block_end_merges_next() {
    let mut tree = doc(&["a", "c"]);
    cursor_after(&mut tree, "a");
    assert_eq!(tree.outline(), "p(a[])p(c)");

    tree.delete_selection_forward().unwrap();

    assert_eq!(tree.outline(), "p(a[]c)");
}

#[test]
fn test_delete_forward_at_document_end_does_nothing() {
    let mut tree = doc(&["abc"]);
    cursor_after(&mut tree, "c");

    let removed = tree.delete_selection_forward().unwrap();

    assert!(removed.is_empty());
    assert_eq!(tree.outline(), "p(abc[])");
}

#[test]
fn test_delete_forward_removes_embed() {
    let mut tree = doc_with(
        &[NodeSpec::Block {
            kind: BlockKind::Paragraph,
            attrs: Vec::new(),
            children: vec![
                NodeSpec::text("a"),
                NodeSpec::Embed {
                    kind: "image".into(),
                    value: "cat.png".into(),
                },
                NodeSpec::text("b"),
            ],
        }],
        TreeConfig::default(),
    );
    cursor_after(&mut tree, "a");

    tree.delete_selection_forward().unwrap();

    assert_eq!(tree.outline(), "p(a[]b)");
}

#[test]
fn test_split_block_moves_tail_into_copy() {
    let mut tree = doc_with(
        &[NodeSpec::Block {
            kind: BlockKind::Heading(2),
            attrs: Vec::new(),
            children: vec![NodeSpec::text("abcd")],
        }],
        TreeConfig::default(),
    );
    cursor_before(&mut tree, "c");

    let copy = tree.split_block().unwrap();

    assert_eq!(tree.outline(), "h2(ab)h2([]cd)");
    assert_eq!(
        tree.arena().node(copy).unwrap().kind(),
        &NodeKind::Block(BlockKind::Heading(2))
    );
    assert_eq!(tree.arena().parent(find(&tree, "c")), Some(copy));
}

#[test]
fn test_split_block_at_end_creates_empty_block() {
    let mut tree = doc(&["ab"]);
    cursor_after(&mut tree, "b");

    tree.split_block().unwrap();

    assert_eq!(tree.outline(), "p(ab)p([])");
}

#[test]
fn test_split_block_replaces_selection() {
    let mut tree = doc(&["abcd"]);
    let (b, c) = (find(&tree, "b"), find(&tree, "c"));
    tree.select(b, Position::Before, c, Position::After).unwrap();

    tree.split_block().unwrap();

    assert_eq!(tree.outline(), "p(a)p([]d)");
}

#[test]
fn test_split_outside_any_block_fails() {
    let mut tree = ContentTree::new();

    let err = tree.split_block().unwrap_err();

    assert!(matches!(
        err,
        TreeError::InvariantViolation(Violation::RootLifecycle)
    ));
    assert_eq!(tree.outline(), "[]");
}

#[test]
fn test_nested_blocks_text_joins_with_newlines() {
    let tree = doc_with(
        &[
            NodeSpec::Block {
                kind: BlockKind::Quote,
                attrs: Vec::new(),
                children: vec![NodeSpec::paragraph("ab"), NodeSpec::paragraph("cd")],
            },
            NodeSpec::paragraph("ef"),
        ],
        TreeConfig::default(),
    );

    assert_eq!(tree.text(), "ab\ncd\nef");
}
