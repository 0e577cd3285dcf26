//! Property tests over randomly shaped trees

use exprtree::{combine, destroy, evaluate, Node, Operation};
use proptest::prelude::*;

fn operation() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

fn value() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

/// Description of a tree, built into fresh nodes on demand.
#[derive(Debug, Clone)]
enum Shape {
    Leaf(f64),
    Op(Operation, Box<Shape>, Box<Shape>),
}

impl Shape {
    fn build(&self) -> Node {
        match self {
            Shape::Leaf(v) => Node::leaf(v.to_string(), *v),
            Shape::Op(op, l, r) => combine(*op, l.build(), r.build()).unwrap(),
        }
    }

    fn expected(&self) -> f64 {
        match self {
            Shape::Leaf(v) => *v,
            Shape::Op(op, l, r) => op.apply(l.expected(), r.expected()),
        }
    }

    fn nodes(&self) -> usize {
        match self {
            Shape::Leaf(_) => 1,
            Shape::Op(_, l, r) => 1 + l.nodes() + r.nodes(),
        }
    }
}

fn shape() -> impl Strategy<Value = Shape> {
    value().prop_map(Shape::Leaf).prop_recursive(5, 32, 2, |inner| {
        (operation(), inner.clone(), inner)
            .prop_map(|(op, l, r)| Shape::Op(op, Box::new(l), Box::new(r)))
    })
}

fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a == b
}

proptest! {
    #[test]
    fn leaf_evaluates_to_its_value(v in value()) {
        let leaf = Node::leaf("v", v);
        prop_assert_eq!(evaluate(Some(&leaf)), v);
    }

    #[test]
    fn combination_evaluates_to_operator_applied(op in operation(), a in value(), b in value()) {
        let node = combine(op, Node::leaf("a", a), Node::leaf("b", b)).unwrap();
        prop_assert!(same(evaluate(Some(&node)), op.apply(a, b)));
    }

    #[test]
    fn tree_evaluates_like_its_shape(shape in shape()) {
        let tree = shape.build();
        prop_assert!(same(tree.evaluate(), shape.expected()));
    }

    #[test]
    fn duplicate_matches_text_and_value(shape in shape()) {
        let tree = shape.build();
        let copy = tree.duplicate().unwrap();
        prop_assert_eq!(copy.text(), tree.text());
        prop_assert!(same(copy.evaluate(), tree.evaluate()));
        prop_assert_ne!(copy.text().as_ptr(), tree.text().as_ptr());
    }

    #[test]
    fn destroy_releases_every_node(shape in shape()) {
        let tree = shape.build();
        prop_assert_eq!(tree.node_count(), shape.nodes());
        prop_assert_eq!(destroy(Some(tree)), shape.nodes());
    }
}
