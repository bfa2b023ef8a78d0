use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use corpq_automaton::SeqTree::{Concat, Leaf, Or};
use corpq_core::{Corpus, Cpos, MemCorpus, MemRegistry, Range, SubCorpus};

use super::test_utils::{context, spans, word};
use super::{DynamicFunction, EvalConfig, EvalError, Function, QueryContext, QueryStatus, Value};
use crate::tree::{AlignConstraint, CmpOp, Environment, EvalTree, Operand, PatternSlot, Pred};

/// Sentences [0, 3] and [4, 6] are aligned; token 7 is not.
fn english() -> Arc<dyn Corpus> {
    Arc::new(
        MemCorpus::builder("EN")
            .positional_text("word", "the cat sat . a dog ran !")
            .alignment(
                "de",
                "DE",
                &[
                    (Range::new(0, 3), Range::new(0, 3)),
                    (Range::new(4, 6), Range::new(4, 6)),
                ],
            )
            .build()
            .unwrap(),
    )
}

fn german() -> Arc<dyn Corpus> {
    Arc::new(
        MemCorpus::builder("DE")
            .positional_text("word", "die katze sass . ein hund lief")
            .build()
            .unwrap(),
    )
}

/// Single-token query environment.
fn token_query(corpus: Arc<dyn Corpus>, value: &str) -> Environment {
    let mut env = Environment::new(corpus);
    let word = word(&env);
    let slot = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, value)));
    env.set_tree(EvalTree::Seq(Leaf(slot)));
    env
}

/// `[word=<en>] :DE [word=<de>]`, optionally negated.
fn aligned(en: &str, de: &str, negated: bool) -> Environment {
    let mut env = token_query(english(), en);
    let attr = env.alignment("de").unwrap();
    env.add_alignment(AlignConstraint {
        attr,
        negated,
        env: Box::new(token_query(german(), de)),
    });
    env
}

fn run(env: Environment) -> Result<Vec<(Cpos, Cpos)>, EvalError> {
    let mut registry = MemRegistry::new();
    registry.insert(german());
    let mut ctx = context(env, EvalConfig::new()).with_registry(Arc::new(registry));
    ctx.run_standard_query(None, false)?;
    Ok(spans(ctx.query_corpus()))
}

#[test]
fn positive_constraint_keeps_aligned_hits() {
    assert_eq!(run(aligned("cat", "katze", false)).unwrap(), vec![(1, 1)]);
    assert_eq!(run(aligned("dog", "katze", false)).unwrap(), vec![]);
}

#[test]
fn negated_constraint() {
    assert_eq!(run(aligned("cat", "katze", true)).unwrap(), vec![]);
    assert_eq!(run(aligned("dog", "katze", true)).unwrap(), vec![(5, 5)]);
}

#[test]
fn unaligned_matches() {
    assert_eq!(run(aligned("!", "lief", false)).unwrap(), vec![]);
    assert_eq!(run(aligned("!", "lief", true)).unwrap(), vec![(7, 7)]);
}

#[test]
fn target_corpus_without_registry() {
    // the nested environment's own corpus is used when the name matches
    let mut ctx = context(aligned("cat", "katze", false), EvalConfig::new());
    ctx.run_standard_query(None, false).unwrap();

    assert_eq!(spans(ctx.query_corpus()), vec![(1, 1)]);
}

#[test]
fn unknown_target_corpus() {
    let mut env = token_query(english(), "cat");
    let attr = env.alignment("de").unwrap();
    env.add_alignment(AlignConstraint {
        attr,
        negated: false,
        env: Box::new(token_query(english(), "cat")),
    });

    let mut ctx = context(env, EvalConfig::new());

    assert_eq!(
        ctx.run_standard_query(None, false).unwrap_err(),
        EvalError::UnknownCorpus("DE".to_owned())
    );
}

#[test]
fn nesting_is_bounded() {
    let env = aligned("cat", "katze", false);
    let corpus = SubCorpus::whole(Arc::clone(env.corpus()));
    let mut ctx = QueryContext::new(corpus, EvalConfig::new().max_environments(1));
    ctx.push_environment(env).unwrap();

    assert_eq!(
        ctx.run_standard_query(None, false).unwrap_err(),
        EvalError::EnvironmentDepth { limit: 1 }
    );
}

/// `raise()`: sets the interrupt flag and never holds.
struct Raise(Arc<AtomicBool>);

impl DynamicFunction for Raise {
    fn name(&self) -> &str {
        "raise"
    }

    fn arity(&self) -> usize {
        0
    }

    fn call(&self, _args: &[Value<'_>]) -> Result<Value<'static>, EvalError> {
        self.0.store(true, Ordering::Relaxed);
        Ok(Value::Int(0))
    }
}

fn raise(flag: &Arc<AtomicBool>) -> Pred {
    let func = Function::Dynamic(Arc::new(Raise(Arc::clone(flag))));
    Pred::cmp(Operand::call(func, vec![]), CmpOp::Eq, Operand::Int(1))
}

fn interruptible() -> QueryContext {
    let mut registry = MemRegistry::new();
    registry.insert(german());
    QueryContext::new(SubCorpus::whole(english()), EvalConfig::new().poll_interval(1))
        .with_registry(Arc::new(registry))
}

#[test]
fn interrupted_nested_query_drops_unchecked_matches() {
    // [] :DE [] [raise()]
    let mut ctx = interruptible();
    let flag = ctx.interrupt_flag();
    let mut env = Environment::new(english());
    let any = env.add_pattern(PatternSlot::match_all());
    env.set_tree(EvalTree::Seq(Leaf(any)));
    let attr = env.alignment("de").unwrap();
    let mut nested = Environment::new(german());
    let a = nested.add_pattern(PatternSlot::match_all());
    let b = nested.add_pattern(PatternSlot::pattern(raise(&flag)));
    nested.set_tree(EvalTree::Seq(Concat(vec![Leaf(a), Leaf(b)])));
    env.add_alignment(AlignConstraint {
        attr,
        negated: false,
        env: Box::new(nested),
    });

    ctx.push_environment(env).unwrap();
    let status = ctx.run_standard_query(None, false).unwrap();

    assert_eq!(status, QueryStatus::Interrupted);
    assert_eq!(spans(ctx.query_corpus()), vec![]);
    assert!(!flag.load(Ordering::Relaxed));
}

#[test]
fn interrupted_outer_query_commits_nothing_unfiltered() {
    // ([word="the"] | [] [raise()]) :DE [word="nichts"]
    // the@0 is found before the interrupt but never filtered
    let mut ctx = interruptible();
    let flag = ctx.interrupt_flag();
    let mut env = token_query(english(), "the");
    let any = env.add_pattern(PatternSlot::match_all());
    let raising = env.add_pattern(PatternSlot::pattern(raise(&flag)));
    env.set_tree(EvalTree::Seq(Or(vec![
        Leaf(0),
        Concat(vec![Leaf(any), Leaf(raising)]),
    ])));
    let attr = env.alignment("de").unwrap();
    env.add_alignment(AlignConstraint {
        attr,
        negated: false,
        env: Box::new(token_query(german(), "nichts")),
    });

    ctx.push_environment(env).unwrap();
    let status = ctx.run_standard_query(None, false).unwrap();

    assert_eq!(status, QueryStatus::Interrupted);
    assert_eq!(spans(ctx.query_corpus()), vec![]);
}
