use crate::seqtree::SeqTree::{self, *};
use crate::{CompileLimits, Error, compile_tree};

fn pattern(tree: &SeqTree) -> String {
    tree.to_pattern(5).unwrap()
}

#[test]
fn render_concat_and_or() {
    let tree = Concat(vec![Leaf(0), Or(vec![Leaf(1), Leaf(2)])]);

    assert_eq!(pattern(&tree), "(#0 (#1|#2))");
    assert_eq!(tree.max_slot(), Some(2));
}

#[test]
fn render_bounded_repetition() {
    assert_eq!(pattern(&SeqTree::repeat(Leaf(0), 2, Some(4))), "(#0 #0 [#0 [#0]])");
    assert_eq!(pattern(&SeqTree::repeat(Leaf(0), 1, None)), "(#0 #0*)");
    assert_eq!(pattern(&SeqTree::repeat(Leaf(0), 0, Some(1))), "([#0])");
    assert_eq!(pattern(&SeqTree::repeat(Leaf(0), 0, Some(0))), "1");
}

#[test]
fn render_any_order() {
    let tree = AnyOrder(vec![Leaf(0), Leaf(1), Leaf(2)]);

    assert_eq!(
        pattern(&tree),
        "((#0 #1 #2)|(#0 #2 #1)|(#1 #0 #2)|(#1 #2 #0)|(#2 #0 #1)|(#2 #1 #0))"
    );
}

#[test]
fn any_order_is_bounded() {
    let tree = AnyOrder((0..6).map(Leaf).collect());

    assert_eq!(
        tree.to_pattern(5).unwrap_err(),
        Error::TooManyPermutations { count: 6, limit: 5 }
    );
}

#[test]
fn invalid_repeat_bounds() {
    assert_eq!(
        SeqTree::repeat(Leaf(0), 3, Some(1)).to_pattern(5).unwrap_err(),
        Error::InvalidRepeat { min: 3, max: 1 }
    );
}

#[test]
fn empty_groups() {
    assert_eq!(pattern(&Concat(vec![])), "1");
    assert_eq!(pattern(&Or(vec![])), "0");
}

#[test]
fn compiled_repetition_accepts_bounds() {
    let tree = SeqTree::repeat(Leaf(0), 2, Some(3));
    let dfa = compile_tree(&tree, 1, 5, &CompileLimits::default()).unwrap();

    assert!(!dfa.accepts(&[0]));
    assert!(dfa.accepts(&[0, 0]));
    assert!(dfa.accepts(&[0, 0, 0]));
    assert!(!dfa.accepts(&[0, 0, 0, 0]));
}

#[test]
fn compiled_any_order_accepts_each_permutation() {
    let tree = AnyOrder(vec![Leaf(0), Leaf(1)]);
    let dfa = compile_tree(&tree, 2, 5, &CompileLimits::default()).unwrap();

    assert!(dfa.accepts(&[0, 1]));
    assert!(dfa.accepts(&[1, 0]));
    assert!(!dfa.accepts(&[0, 0]));
}

#[test]
fn tree_round_trips_through_json() {
    let tree = Concat(vec![Leaf(0), SeqTree::repeat(Or(vec![Leaf(1), Leaf(2)]), 0, None)]);
    let json = serde_json::to_string(&tree).unwrap();

    assert_eq!(serde_json::from_str::<SeqTree>(&json).unwrap(), tree);
}
