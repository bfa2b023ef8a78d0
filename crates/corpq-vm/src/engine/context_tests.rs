use std::sync::Arc;

use corpq_automaton::SeqTree::{Concat, Leaf};
use corpq_core::{Range, SubCorpus};

use super::test_utils::{context, pos, sample, spans, word};
use super::{EvalConfig, EvalError, QueryContext, QueryStatus};
use crate::tree::{Environment, EvalTree, PatternSlot, Pred};

/// `[pos="DET"]`
fn det() -> Environment {
    let mut env = Environment::new(sample());
    let pos = pos(&env);
    let slot = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    env.set_tree(EvalTree::Seq(Leaf(slot)));
    env
}

/// `[word="the"] [word="cat"]`
fn the_cat() -> Environment {
    let mut env = Environment::new(sample());
    let word = word(&env);
    let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let b = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "cat")));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(a), Leaf(b)])));
    env
}

#[test]
fn environment_stack() {
    let config = EvalConfig::new().max_environments(2);
    let mut ctx = QueryContext::new(SubCorpus::whole(sample()), config);
    assert_eq!(ctx.depth(), 0);
    assert!(ctx.environment().is_none());

    ctx.push_environment(det()).unwrap();
    ctx.push_environment(the_cat()).unwrap();
    assert_eq!(
        ctx.push_environment(det()).unwrap_err(),
        EvalError::EnvironmentDepth { limit: 2 }
    );
    assert_eq!(ctx.depth(), 2);

    assert!(ctx.pop_environment().is_some());
    assert_eq!(ctx.depth(), 1);
    assert_eq!(ctx.environment().unwrap().patterns().len(), 1);
}

#[test]
fn runners_need_an_environment() {
    let mut ctx = QueryContext::new(SubCorpus::whole(sample()), EvalConfig::new());

    assert_eq!(
        ctx.run_standard_query(None, false).unwrap_err(),
        EvalError::NoEnvironment
    );
    assert_eq!(
        ctx.run_meet_union_query(false, None).unwrap_err(),
        EvalError::NoEnvironment
    );
    assert_eq!(
        ctx.run_tabular_query(None, false).unwrap_err(),
        EvalError::NoEnvironment
    );
}

#[test]
fn cut_limits_committed_matches() {
    let mut ctx = context(det(), EvalConfig::new());
    let status = ctx.run_standard_query(Some(2), false).unwrap();

    assert_eq!(status, QueryStatus::Completed);
    assert_eq!(spans(ctx.query_corpus()), vec![(0, 0), (4, 4)]);
}

#[test]
fn keep_old_ranges() {
    let ranges = || vec![Range::new(0, 2), Range::new(4, 4)];
    let run = |keep: bool| {
        let mut ctx = context(the_cat(), EvalConfig::new());
        ctx.set_query_corpus(SubCorpus::with_ranges("Last", sample(), ranges()));
        ctx.run_standard_query(None, keep).unwrap();
        spans(ctx.query_corpus())
    };

    // the@4 cannot reach cat@5 outside its range
    assert_eq!(run(false), vec![(0, 1)]);
    assert_eq!(run(true), vec![(0, 2), (4, 4)]);
}

#[test]
fn set_query_corpus_returns_previous() {
    let mut ctx = context(det(), EvalConfig::new());
    let corpus = Arc::clone(ctx.environment().unwrap().corpus());
    let previous = ctx.set_query_corpus(SubCorpus::with_ranges("Last", corpus, vec![Range::new(3, 5)]));

    assert_eq!(previous.name(), "SAMPLE");
    ctx.run_standard_query(None, false).unwrap();
    assert_eq!(spans(ctx.query_corpus()), vec![(4, 4)]);
}
