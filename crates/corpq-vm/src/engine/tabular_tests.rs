use std::sync::atomic::Ordering;

use corpq_core::Cpos;

use super::test_utils::{context, pos, sample, spans, word, words};
use super::{EvalConfig, EvalError, QueryStatus};
use crate::tree::{Environment, EvalTree, PatternSlot, Pred, TabColumn};

fn tab(env: Environment, config: EvalConfig) -> Vec<(Cpos, Cpos)> {
    let mut ctx = context(env, config);
    ctx.run_tabular_query(None, false).unwrap();
    spans(ctx.query_corpus())
}

/// `TAB [word="the"] {min,max} [pos="VB"]`
fn the_then_verb(min: u32, max: Option<u32>) -> Environment {
    let mut env = Environment::new(sample());
    let (word, pos) = (word(&env), pos(&env));
    let the = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let vb = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "VB")));
    env.set_tree(EvalTree::Tab(vec![
        TabColumn::adjacent(the),
        TabColumn::gap(vb, min, max),
    ]));
    env
}

#[test]
fn adjacent_columns() {
    let mut env = Environment::new(sample());
    let pos = pos(&env);
    let det = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    let nn = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "NN")));
    env.set_tree(EvalTree::Tab(vec![
        TabColumn::adjacent(det),
        TabColumn::adjacent(nn),
    ]));

    assert_eq!(tab(env, EvalConfig::new()), vec![(0, 1), (4, 5), (7, 8)]);
}

#[test]
fn bounded_gap() {
    // the@0 .. sat@2 has one token between; the@4 .. ran@9 has four
    assert_eq!(
        tab(the_then_verb(0, Some(3)), EvalConfig::new()),
        vec![(0, 2)]
    );
    assert_eq!(
        tab(the_then_verb(2, Some(5)), EvalConfig::new()),
        vec![(4, 9)]
    );
}

#[test]
fn unbounded_gap_stops_at_the_hard_boundary() {
    assert_eq!(
        tab(the_then_verb(0, None), EvalConfig::new()),
        vec![(0, 2), (4, 9)]
    );
    assert_eq!(
        tab(the_then_verb(0, None), EvalConfig::new().hard_boundary(4)),
        vec![(0, 2)]
    );
}

#[test]
fn column_items_are_consumed() {
    // TAB [word="a"] {0,3} [word="b"]: both a's could reach the b
    let mut env = Environment::new(words("a a b"));
    let word = word(&env);
    let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "a")));
    let b = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "b")));
    env.set_tree(EvalTree::Tab(vec![
        TabColumn::adjacent(a),
        TabColumn::gap(b, 0, Some(3)),
    ]));

    assert_eq!(tab(env, EvalConfig::new()), vec![(0, 2)]);
}

#[test]
fn three_columns() {
    // TAB [pos="DET"] [pos="NN"] {0,1} [pos="VB"]
    let mut env = Environment::new(sample());
    let pos = pos(&env);
    let det = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    let nn = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "NN")));
    let vb = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "VB")));
    env.set_tree(EvalTree::Tab(vec![
        TabColumn::adjacent(det),
        TabColumn::adjacent(nn),
        TabColumn::gap(vb, 0, Some(1)),
    ]));

    assert_eq!(tab(env, EvalConfig::new()), vec![(0, 2), (7, 9)]);
}

#[test]
fn single_column() {
    let mut env = Environment::new(sample());
    let word = word(&env);
    let the = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    env.set_tree(EvalTree::Tab(vec![TabColumn::adjacent(the)]));

    assert_eq!(tab(env, EvalConfig::new()), vec![(0, 0), (4, 4)]);
}

#[test]
fn tabular_needs_a_tab_tree() {
    let mut ctx = context(Environment::new(sample()), EvalConfig::new());

    assert_eq!(
        ctx.run_tabular_query(None, false).unwrap_err(),
        EvalError::WrongQueryKind { expected: "TAB" }
    );
}

#[test]
fn interrupted_scan_commits_nothing() {
    let mut ctx = context(the_then_verb(0, None), EvalConfig::new().poll_interval(1));
    let flag = ctx.interrupt_flag();
    flag.store(true, Ordering::Relaxed);

    let status = ctx.run_tabular_query(None, false).unwrap();

    assert_eq!(status, QueryStatus::Interrupted);
    assert_eq!(spans(ctx.query_corpus()), vec![]);
    assert!(!flag.load(Ordering::Relaxed));
}
