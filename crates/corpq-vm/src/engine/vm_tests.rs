use std::sync::Arc;
use std::sync::atomic::Ordering;

use corpq_automaton::SeqTree::{self, Concat, Leaf, Or};
use corpq_core::{Range, RegexFlags, SlotRef, SpecialLabel, SubCorpus, TokenRegex};
use indoc::indoc;

use super::test_utils::{context, pos, run, s, sample, spans, word, words};
use super::{EvalConfig, EvalError, MatchingStrategy, PrintTracer, QueryStatus, Verbosity};
use crate::tree::{
    AnchorKind, CmpOp, Environment, EvalTree, Operand, PatternSlot, Pred, SearchContext, TagValue,
};

/// `[word="the"] [word="cat"]`
fn the_cat() -> Environment {
    let mut env = Environment::new(sample());
    let word = word(&env);
    let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let b = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "cat")));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(a), Leaf(b)])));
    env
}

/// `[pos="DET"] [pos="NN"]`
fn det_nn(env: &mut Environment) {
    let pos = pos(env);
    let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    let b = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "NN")));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(a), Leaf(b)])));
}

#[test]
fn two_token_sequence() {
    assert_eq!(run(the_cat(), EvalConfig::new()), vec![(0, 1)]);
}

#[test]
fn alternatives_share_a_start_point() {
    // [word="the"] ([word="cat"] | [word="mat"])
    let mut env = Environment::new(sample());
    let word = word(&env);
    let the = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let cat = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "cat")));
    let mat = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "mat")));
    env.set_tree(EvalTree::Seq(Concat(vec![
        Leaf(the),
        Or(vec![Leaf(cat), Leaf(mat)]),
    ])));

    assert_eq!(run(env, EvalConfig::new()), vec![(0, 1), (4, 5)]);
}

#[test]
fn shortest_and_longest_repetition() {
    let build = || {
        let mut env = Environment::new(words("a a a"));
        let word = word(&env);
        let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "a")));
        env.set_tree(EvalTree::Seq(SeqTree::repeat(Leaf(a), 1, None)));
        env
    };

    let shortest = run(build(), EvalConfig::new());
    let longest = run(
        build(),
        EvalConfig::new().matching_strategy(MatchingStrategy::Longest),
    );

    assert_eq!(shortest, vec![(0, 0), (1, 1), (2, 2)]);
    assert_eq!(longest, vec![(0, 2)]);
}

#[test]
fn longest_keeps_disjoint_matches() {
    let mut env = Environment::new(words("a a b a"));
    let word = word(&env);
    let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "a")));
    env.set_tree(EvalTree::Seq(SeqTree::repeat(Leaf(a), 1, None)));

    let config = EvalConfig::new().matching_strategy(MatchingStrategy::Longest);

    assert_eq!(run(env, config), vec![(0, 1), (3, 3)]);
}

#[test]
fn within_region_blocks_crossing_matches() {
    // [word="."] [word="a"] crosses the sentence boundary at 6/7
    let build = || {
        let mut env = Environment::new(sample());
        let word = word(&env);
        let dot = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, ".")));
        let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "a")));
        env.set_tree(EvalTree::Seq(Concat(vec![Leaf(dot), Leaf(a)])));
        env
    };

    assert_eq!(run(build(), EvalConfig::new()), vec![(6, 7)]);

    let mut env = build();
    let s = s(&env);
    env.set_within(SearchContext::Regions { attr: s, count: 1 });
    assert_eq!(run(env, EvalConfig::new()), vec![]);

    let mut env = build();
    let s = super::test_utils::s(&env);
    env.set_within(SearchContext::Regions { attr: s, count: 2 });
    assert_eq!(run(env, EvalConfig::new()), vec![(6, 7)]);
}

#[test]
fn within_words_and_hard_boundary() {
    let mut env = the_cat();
    env.set_within(SearchContext::Words(1));
    assert_eq!(run(env, EvalConfig::new()), vec![]);

    assert_eq!(run(the_cat(), EvalConfig::new().hard_boundary(1)), vec![]);
    assert_eq!(run(the_cat(), EvalConfig::new().hard_boundary(2)), vec![(0, 1)]);
}

#[test]
fn query_corpus_restricts_start_points() {
    let mut env = Environment::new(sample());
    let word = word(&env);
    let the = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let any = env.add_pattern(PatternSlot::match_all());
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(the), Leaf(any)])));

    let corpus = SubCorpus::with_ranges("SUB", Arc::clone(env.corpus()), vec![Range::new(3, 9)]);
    let mut ctx = context(env, EvalConfig::new());
    ctx.set_query_corpus(corpus);
    ctx.run_standard_query(None, false).unwrap();

    assert_eq!(spans(ctx.query_corpus()), vec![(4, 5)]);
}

#[test]
fn matches_stay_inside_their_range() {
    // "the" at 4 is the last token of the range [0, 4]
    let mut env = Environment::new(sample());
    let word = word(&env);
    let the = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "the")));
    let any = env.add_pattern(PatternSlot::match_all());
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(the), Leaf(any)])));

    let corpus = SubCorpus::with_ranges("SUB", Arc::clone(env.corpus()), vec![Range::new(0, 4)]);
    let mut ctx = context(env, EvalConfig::new());
    ctx.set_query_corpus(corpus);
    ctx.run_standard_query(None, false).unwrap();

    assert_eq!(spans(ctx.query_corpus()), vec![(0, 1)]);
}

#[test]
fn global_constraint_reads_labels() {
    // a:[pos="DET"] [pos="NN"] :: a.word = "the"
    let mut env = Environment::new(sample());
    let (word, pos) = (word(&env), pos(&env));
    let a = env.label("a");
    let det = env.add_pattern(PatternSlot::labelled(Pred::attr_eq(&pos, "DET"), a));
    let nn = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "NN")));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(det), Leaf(nn)])));
    env.set_global(Pred::cmp(
        Operand::attr_at(&word, SlotRef::Label(a)),
        CmpOp::Eq,
        Operand::str("the"),
    ));

    assert_eq!(run(env, EvalConfig::new()), vec![(0, 1), (4, 5)]);
}

#[test]
fn global_constraint_sees_matchend() {
    let mut env = Environment::new(sample());
    det_nn(&mut env);
    let word = word(&env);
    let matchend = env.labels().special(SpecialLabel::MatchEnd).unwrap();
    env.set_global(Pred::cmp(
        Operand::attr_at(&word, SlotRef::Label(matchend)),
        CmpOp::Eq,
        Operand::str("mat"),
    ));

    assert_eq!(run(env, EvalConfig::new()), vec![(4, 5)]);
}

#[test]
fn target_anchor_is_committed() {
    // [pos="DET"] @[pos="NN"]
    let mut env = Environment::new(sample());
    let pos = pos(&env);
    let det = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    let nn = env.add_pattern(
        PatternSlot::pattern(Pred::attr_eq(&pos, "NN")).with_anchor(AnchorKind::Target),
    );
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(det), Leaf(nn)])));

    let mut ctx = context(env, EvalConfig::new());
    ctx.run_standard_query(None, false).unwrap();

    assert_eq!(spans(ctx.query_corpus()), vec![(0, 1), (4, 5), (7, 8)]);
    assert_eq!(ctx.query_corpus().targets(), Some(&[1, 5, 8][..]));
    assert_eq!(ctx.query_corpus().keywords(), None);
}

#[test]
fn lookahead_does_not_consume() {
    // [word="on"] (?= [word="the"])
    let build = |next: &str| {
        let mut env = Environment::new(sample());
        let word = word(&env);
        let on = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "on")));
        let ahead = env.add_pattern(PatternSlot::lookahead(Pred::attr_eq(&word, next)));
        env.set_tree(EvalTree::Seq(Concat(vec![Leaf(on), Leaf(ahead)])));
        env
    };

    assert_eq!(run(build("the"), EvalConfig::new()), vec![(3, 3)]);
    assert_eq!(run(build("mat"), EvalConfig::new()), vec![]);
}

#[test]
fn structure_tags() {
    // <s> [pos="DET"]
    let mut env = Environment::new(sample());
    let (pos, s) = (pos(&env), s(&env));
    let open = env.add_pattern(PatternSlot::open_tag(&s));
    let det = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(open), Leaf(det)])));
    assert_eq!(run(env, EvalConfig::new()), vec![(0, 0), (7, 7)]);

    // [pos="PUN"] </s>
    let mut env = Environment::new(sample());
    let (pos, s) = (super::test_utils::pos(&env), super::test_utils::s(&env));
    let pun = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "PUN")));
    let close = env.add_pattern(PatternSlot::close_tag(&s));
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(pun), Leaf(close)])));
    assert_eq!(run(env, EvalConfig::new()), vec![(6, 6)]);
}

#[test]
fn tag_value_constraint() {
    // <s id="s2"> []
    let mut env = Environment::new(sample());
    let s = s(&env);
    let open = env.add_pattern(PatternSlot::Tag {
        attr: s,
        closing: false,
        value: Some(TagValue {
            regex: TokenRegex::new("s2", RegexFlags::NONE).unwrap(),
            negated: false,
        }),
        right_boundary: None,
    });
    let any = env.add_pattern(PatternSlot::match_all());
    env.set_tree(EvalTree::Seq(Concat(vec![Leaf(open), Leaf(any)])));

    assert_eq!(run(env, EvalConfig::new()), vec![(7, 7)]);
}

#[test]
fn strict_regions_stop_at_region_end() {
    // <s> []* [word="a"]
    let build = || {
        let mut env = Environment::new(sample());
        let (word, s) = (word(&env), s(&env));
        let tag = env.open_tag(&s);
        let open = env.add_pattern(tag);
        let any = env.add_pattern(PatternSlot::match_all());
        let a = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "a")));
        env.set_tree(EvalTree::Seq(Concat(vec![
            Leaf(open),
            SeqTree::repeat(Leaf(any), 0, None),
            Leaf(a),
        ])));
        env
    };

    assert_eq!(run(build(), EvalConfig::new()), vec![(0, 7), (7, 7)]);
    assert_eq!(
        run(build(), EvalConfig::new().strict_regions(true)),
        vec![(7, 7)]
    );
}

#[test]
fn empty_match_query_is_rejected() {
    let mut env = Environment::new(sample());
    let any = env.add_pattern(PatternSlot::match_all());
    env.set_tree(EvalTree::Seq(SeqTree::repeat(Leaf(any), 0, None)));

    let mut ctx = context(env, EvalConfig::new());
    let err = ctx.run_standard_query(None, false).unwrap_err();

    assert_eq!(err, EvalError::EmptyMatchQuery);
    assert!(err.is_user_error());
}

#[test]
fn zero_width_loop_is_detected() {
    // <s>* [word="cat"]: the tag loop makes no progress
    let mut env = Environment::new(sample());
    let (word, s) = (word(&env), s(&env));
    let open = env.add_pattern(PatternSlot::open_tag(&s));
    let cat = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "cat")));
    env.set_tree(EvalTree::Seq(Concat(vec![
        SeqTree::repeat(Leaf(open), 0, None),
        Leaf(cat),
    ])));

    let mut ctx = context(env, EvalConfig::new());
    let err = ctx.run_standard_query(None, false).unwrap_err();

    assert!(matches!(err, EvalError::InfiniteLoop { start: 0, .. }));
    assert!(!err.is_user_error());
}

#[test]
fn zero_width_cycle_across_states() {
    // [word="."] (</s> <s>)* [word="cat"]: at 7, s1 closes and s2 opens
    let mut env = Environment::new(sample());
    let (word, s) = (word(&env), s(&env));
    let dot = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, ".")));
    let close = env.add_pattern(PatternSlot::close_tag(&s));
    let open = env.add_pattern(PatternSlot::open_tag(&s));
    let cat = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&word, "cat")));
    env.set_tree(EvalTree::Seq(Concat(vec![
        Leaf(dot),
        SeqTree::repeat(Concat(vec![Leaf(close), Leaf(open)]), 0, None),
        Leaf(cat),
    ])));

    let mut ctx = context(env, EvalConfig::new());
    let err = ctx.run_standard_query(None, false).unwrap_err();

    assert!(matches!(err, EvalError::InfiniteLoop { start: 6, .. }));
}

#[test]
fn zero_width_steps_without_a_cycle() {
    // [pos="PUN"] </s> <s> [pos="DET"]
    let mut env = Environment::new(sample());
    let (pos, s) = (pos(&env), s(&env));
    let pun = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "PUN")));
    let close = env.add_pattern(PatternSlot::close_tag(&s));
    let open = env.add_pattern(PatternSlot::open_tag(&s));
    let det = env.add_pattern(PatternSlot::pattern(Pred::attr_eq(&pos, "DET")));
    env.set_tree(EvalTree::Seq(Concat(vec![
        Leaf(pun),
        Leaf(close),
        Leaf(open),
        Leaf(det),
    ])));

    assert_eq!(run(env, EvalConfig::new()), vec![(6, 7)]);
}

#[test]
fn interrupt_truncates_and_clears_flag() {
    let mut ctx = context(the_cat(), EvalConfig::new().poll_interval(1));
    let flag = ctx.interrupt_flag();
    flag.store(true, Ordering::Relaxed);

    let status = ctx.run_standard_query(None, false).unwrap();

    assert_eq!(status, QueryStatus::Interrupted);
    assert_eq!(spans(ctx.query_corpus()), vec![]);
    assert!(!flag.load(Ordering::Relaxed));
}

#[test]
fn missing_query_tree() {
    let mut ctx = context(Environment::new(sample()), EvalConfig::new());

    assert_eq!(
        ctx.run_standard_query(None, false).unwrap_err(),
        EvalError::WrongQueryKind {
            expected: "sequence"
        }
    );
}

#[test]
fn trace_default() {
    let mut ctx = context(the_cat(), EvalConfig::new());
    let mut tracer = PrintTracer::new(Verbosity::Default);
    ctx.run_standard_query_with(None, false, &mut tracer).unwrap();

    insta::assert_snapshot!(tracer.lines().join("\n"), @r"
    init #0 -> S1: 2 candidate(s)
      match 0..1
    ");
}

#[test]
fn trace_very_verbose() {
    let mut ctx = context(the_cat(), EvalConfig::new());
    let mut tracer = PrintTracer::new(Verbosity::VeryVerbose);
    ctx.run_standard_query_with(None, false, &mut tracer).unwrap();

    let expected = indoc! {"
        dfa  S0: #0->S1
        dfa  S1: #1->S2
        dfa  S2*:
        init #0 -> S1: 2 candidate(s)
          start 0 (boundary 9)
            S0 #0@0 -> S1 ok
            S1 #1@1 -> S2 ok
          match 0..1
          start 4 (boundary 9)
            S0 #0@4 -> S1 ok
            S1 #1@5 -> S2 fail
    "};
    assert_eq!(tracer.output(), expected);
}
