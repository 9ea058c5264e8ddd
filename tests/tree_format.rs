use content_tree::{
    Attr, AttrValue, BlockKind, ContentTree, Edge, LeafValue, Mode, NodeId, NodeKind, NodeSpec,
    Outline, Position, TreeConfig,
};

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

fn has(tree: &ContentTree, id: NodeId, attr: &Attr) -> bool {
    tree.arena().node(id).unwrap().attributes().is_set(attr)
}

fn formatted(runs: Vec<NodeSpec>, config: TreeConfig) -> ContentTree {
    let block = NodeSpec::Block {
        kind: BlockKind::Paragraph,
        attrs: Vec::new(),
        children: runs,
    };
    ContentTree::from_specs(&[block], config).unwrap()
}

fn bold(text: &str) -> NodeSpec {
    NodeSpec::Text {
        text: text.to_string(),
        attrs: vec![Attr::Bold],
    }
}

fn checklist(items: &[&str]) -> ContentTree {
    let items = items
        .iter()
        .map(|text| NodeSpec::Block {
            kind: BlockKind::ListItem,
            attrs: Vec::new(),
            children: vec![NodeSpec::text(text)],
        })
        .collect();
    let list = NodeSpec::Block {
        kind: BlockKind::List { ordered: false },
        attrs: Vec::new(),
        children: items,
    };
    ContentTree::from_specs(&[list], TreeConfig::default()).unwrap()
}

#[test]
fn test_toggle_sets_then_clears_selection() {
    let mut tree = formatted(vec![NodeSpec::text("abc")], TreeConfig::default());
    let (a, b, c) = (find(&tree, "a"), find(&tree, "b"), find(&tree, "c"));
    tree.select(a, Position::Before, b, Position::After).unwrap();

    tree.format_toggle(Attr::Italic).unwrap();
    assert!(has(&tree, a, &Attr::Italic));
    assert!(has(&tree, b, &Attr::Italic));
    assert!(!has(&tree, c, &Attr::Italic));
    assert_eq!(tree.render(&Outline::with_attributes()), "p([a{italic}b{italic}]c)");

    tree.format_toggle(Attr::Italic).unwrap();
    assert!(!has(&tree, a, &Attr::Italic));
    assert!(!has(&tree, b, &Attr::Italic));
}

#[test]
fn test_mixed_selection_toggles_on() {
    let mut tree = formatted(vec![bold("a"), NodeSpec::text("b")], TreeConfig::default());
    let (a, b) = (find(&tree, "a"), find(&tree, "b"));
    tree.select(a, Position::Before, b, Position::After).unwrap();

    tree.format_toggle(Attr::Bold).unwrap();

    assert!(has(&tree, a, &Attr::Bold));
    assert!(has(&tree, b, &Attr::Bold));
}

#[test]
fn test_collapsed_toggle_applies_to_next_insertion_only() {
    let mut tree = formatted(vec![NodeSpec::text("ab")], TreeConfig::default());
    let b = find(&tree, "b");
    tree.set_start(b, Position::After).unwrap();
    tree.collapse(Edge::Start).unwrap();

    tree.format_toggle(Attr::Bold).unwrap();
    assert!(!has(&tree, b, &Attr::Bold));
    assert!(tree.formats_at_cursor().contains(&Attr::Bold));

    let typed = tree.insert_text("c").unwrap();
    assert!(has(&tree, typed[0], &Attr::Bold));
    assert!(tree.range().pending_formats().is_empty());
}

#[test]
fn test_collapsed_toggle_off_overrides_inherited_format() {
    let mut tree = formatted(vec![bold("ab")], TreeConfig::default());
    let b = find(&tree, "b");
    tree.set_start(b, Position::After).unwrap();
    tree.collapse(Edge::Start).unwrap();
    assert!(tree.formats_at_cursor().contains(&Attr::Bold));

    tree.format_toggle(Attr::Bold).unwrap();
    let typed = tree.insert_text("c").unwrap();

    assert!(!has(&tree, typed[0], &Attr::Bold));
}

#[test]
fn test_typed_characters_inherit_formats() {
    let mut tree = formatted(vec![bold("ab")], TreeConfig::default());
    let b = find(&tree, "b");
    tree.arena_mut()
        .set_attribute(b, Attr::Custom("color".into()), AttrValue::String("red".into()))
        .unwrap();
    tree.set_start(b, Position::After).unwrap();
    tree.collapse(Edge::Start).unwrap();

    let typed = tree.insert_text("c").unwrap();

    let attrs = tree.arena().node(typed[0]).unwrap().attributes();
    assert!(attrs.is_set(&Attr::Bold));
    assert_eq!(
        attrs.get(&Attr::Custom("color".into())),
        Some(&AttrValue::String("red".into()))
    );
}

#[test]
fn test_inheritance_can_be_disabled() {
    let config = TreeConfig {
        inherit_formats: false,
        ..TreeConfig::default()
    };
    let mut tree = formatted(vec![bold("ab")], config);
    let b = find(&tree, "b");
    tree.set_start(b, Position::After).unwrap();
    tree.collapse(Edge::Start).unwrap();

    let typed = tree.insert_text("c").unwrap();

    assert!(!has(&tree, typed[0], &Attr::Bold));
}

#[test]
fn test_moving_the_cursor_drops_pending_formats() {
    let mut tree = formatted(vec![NodeSpec::text("ab")], TreeConfig::default());
    tree.format_toggle(Attr::Underline).unwrap();
    assert!(!tree.range().pending_formats().is_empty());

    let b = find(&tree, "b");
    tree.set_start(b, Position::Before).unwrap();

    assert!(tree.range().pending_formats().is_empty());
}

#[test]
fn test_checked_toggles_list_items_under_selection() {
    let mut tree = checklist(&["x", "y"]);
    let (x, y) = (find(&tree, "x"), find(&tree, "y"));
    let (first, second) = (tree.arena().parent(x).unwrap(), tree.arena().parent(y).unwrap());

    tree.format_toggle(Attr::Checked).unwrap();
    assert!(has(&tree, first, &Attr::Checked));
    assert!(!has(&tree, second, &Attr::Checked));
    assert_eq!(
        tree.render(&Outline::with_attributes()),
        "ul(li([]x){checked}li(y))"
    );

    tree.select(x, Position::Before, y, Position::After).unwrap();
    tree.format_toggle(Attr::Checked).unwrap();
    assert!(has(&tree, first, &Attr::Checked));
    assert!(has(&tree, second, &Attr::Checked));

    tree.format_toggle(Attr::Checked).unwrap();
    assert!(!has(&tree, first, &Attr::Checked));
    assert!(!has(&tree, second, &Attr::Checked));
}

#[test]
fn test_character_format_on_block_is_rejected() {
    let mut tree = formatted(vec![NodeSpec::text("ab")], TreeConfig::default());
    let p = tree.arena().parent(find(&tree, "a")).unwrap();

    assert!(tree
        .arena_mut()
        .set_attribute(p, Attr::Bold, AttrValue::Bool(true))
        .is_err());
}
