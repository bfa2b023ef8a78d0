use std::sync::Arc;

use corpq_core::{Corpus, Cpos, MemCorpus, PositionalAttribute, StructuralAttribute, SubCorpus};

use super::{EvalConfig, QueryContext, QueryStatus};
use crate::tree::Environment;

/// `the cat sat on the mat . a dog ran`, with `pos` and two `s` regions.
pub fn sample() -> Arc<dyn Corpus> {
    Arc::new(
        MemCorpus::builder("SAMPLE")
            .positional_text("word", "the cat sat on the mat . a dog ran")
            .positional_text("pos", "DET NN VB IN DET NN PUN DET NN VB")
            .structural_with_values("s", &[(0, 6, "s1"), (7, 9, "s2")])
            .build()
            .unwrap(),
    )
}

/// Corpus with only a `word` attribute.
pub fn words(text: &str) -> Arc<dyn Corpus> {
    Arc::new(
        MemCorpus::builder("WORDS")
            .positional_text("word", text)
            .build()
            .unwrap(),
    )
}

pub fn word(env: &Environment) -> Arc<dyn PositionalAttribute> {
    env.positional("word").unwrap()
}

pub fn pos(env: &Environment) -> Arc<dyn PositionalAttribute> {
    env.positional("pos").unwrap()
}

pub fn s(env: &Environment) -> Arc<dyn StructuralAttribute> {
    env.structural("s").unwrap()
}

pub fn spans(corpus: &SubCorpus) -> Vec<(Cpos, Cpos)> {
    corpus.ranges().iter().map(|r| (r.start, r.end)).collect()
}

pub fn context(env: Environment, config: EvalConfig) -> QueryContext {
    let corpus = SubCorpus::whole(Arc::clone(env.corpus()));
    let mut ctx = QueryContext::new(corpus, config);
    ctx.push_environment(env).unwrap();
    ctx
}

/// Run a sequence query on the whole corpus and return the committed spans.
pub fn run(env: Environment, config: EvalConfig) -> Vec<(Cpos, Cpos)> {
    let mut ctx = context(env, config);
    let status = ctx.run_standard_query(None, false).unwrap();
    assert_eq!(status, QueryStatus::Completed);
    spans(ctx.query_corpus())
}
