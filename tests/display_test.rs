//! Tests for debug dumps

use std::io::{self, Write};

use exprtree::domain::{
    print_tree_to, write_arena_dump, write_dump, DumpOptions, DumpStyle, ExprArena,
    TreeNodeConvert,
};
use exprtree::util::testing;
use exprtree::{combine, print_tree, Node, Operation, Settings};
use rstest::{fixture, rstest};

#[ctor::ctor]
fn init() {
    testing::init_test_setup();
}

#[fixture]
fn quotient() -> Node {
    combine(Operation::Div, Node::leaf("1", 1.0), Node::leaf("3", 3.0)).unwrap()
}

fn dump(root: Option<&Node>, options: &DumpOptions) -> String {
    let mut out = Vec::new();
    write_dump(root, options, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[rstest]
fn given_unevaluated_tree_when_dumping_flat_then_preorder_blocks(quotient: Node) {
    let expected = "\
 Node
    expr_string = (1)/(3)
    value       = 0
    num_parents = 0
 Node
    expr_string = 1
    value       = 1
    num_parents = 1
 Node
    expr_string = 3
    value       = 3
    num_parents = 1
";
    assert_eq!(dump(Some(&quotient), &DumpOptions::default()), expected);
}

#[rstest]
fn given_evaluated_tree_when_dumping_then_value_uses_general_format(mut quotient: Node) {
    quotient.refresh();
    let out = dump(Some(&quotient), &DumpOptions::default());
    assert!(out.contains("    value       = 0.333333\n"));

    let options = DumpOptions {
        style: DumpStyle::Flat,
        precision: 2,
    };
    assert!(dump(Some(&quotient), &options).contains("    value       = 0.33\n"));
}

#[test]
fn given_no_tree_when_dumping_then_nothing_written() {
    assert_eq!(dump(None, &DumpOptions::default()), "");
    print_tree(None);
}

#[rstest]
fn given_tree_style_when_dumping_then_box_drawing(quotient: Node) {
    let options = DumpOptions {
        style: DumpStyle::Tree,
        ..DumpOptions::default()
    };
    let out = dump(Some(&quotient), &options);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "(1)/(3) = 0");
    assert!(lines[1].ends_with("1 = 1"));
    assert!(lines[2].ends_with("3 = 3"));
}

#[test]
fn given_arena_tree_when_dumping_then_matches_owned_dump() {
    let mut arena = ExprArena::new();
    let one = arena.create_leaf("1", 1.0);
    let three = arena.create_leaf("3", 3.0);
    let root = arena.combine(Operation::Div, one, three).unwrap();
    let owned = combine(Operation::Div, Node::leaf("1", 1.0), Node::leaf("3", 3.0)).unwrap();

    for style in [DumpStyle::Flat, DumpStyle::Tree] {
        let options = DumpOptions {
            style,
            ..DumpOptions::default()
        };
        let mut out = Vec::new();
        write_arena_dump(&arena, Some(root), &options, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), dump(Some(&owned), &options));
    }
}

#[rstest]
fn given_settings_when_dumping_then_settings_style_applies(quotient: Node) {
    let settings = Settings::from_toml("[dump]\nstyle = \"tree\"\n").unwrap();
    let mut out = Vec::new();
    settings.write_dump(Some(&quotient), &mut out).unwrap();
    assert!(String::from_utf8(out).unwrap().starts_with("(1)/(3) = 0\n"));
}

#[rstest]
fn given_tree_when_printing_then_does_not_panic(quotient: Node) {
    print_tree(Some(&quotient));
}

#[test]
fn given_arena_view_when_converted_then_matches_owned_tree() {
    let mut arena = ExprArena::new();
    let one = arena.create_leaf("1", 1.0);
    let three = arena.create_leaf("3", 3.0);
    let root = arena.combine(Operation::Div, one, three).unwrap();
    let owned = combine(Operation::Div, Node::leaf("1", 1.0), Node::leaf("3", 3.0)).unwrap();

    let rendered = arena.view(root).to_tree_string().to_string();
    assert_eq!(rendered, owned.to_tree_string().to_string());
    assert!(rendered.starts_with("(1)/(3) = 0\n"));

    arena.evaluate(Some(root)).unwrap();
    let refreshed = arena.view(root).to_tree_string().to_string();
    assert!(refreshed.starts_with("(1)/(3) = 0.333333\n"));
}

#[test]
fn given_destroyed_root_when_viewing_then_stale_placeholder() {
    let mut arena = ExprArena::new();
    let leaf = arena.create_leaf("x", 1.0);
    arena.destroy(Some(leaf)).unwrap();
    let rendered = arena.view(leaf).to_tree_string().to_string();
    assert_eq!(rendered.trim_end(), "Stale handle");
}

/// Writer that fails every write.
struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
fn given_failing_writer_when_printing_then_error_is_swallowed(quotient: Node) {
    let mut out = BrokenPipe;
    assert!(write_dump(Some(&quotient), &DumpOptions::default(), &mut out).is_err());
    print_tree_to(Some(&quotient), &mut out);
}
