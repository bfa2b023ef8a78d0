//! Alignment filter.
//!
//! For each match, the bead of the alignment attribute covering the match
//! start gives a region of the target corpus. The nested query runs on
//! that region as its query corpus; the match survives if the nested query
//! finds something (or, for a negated constraint, finds nothing). A match
//! with no bead is treated like a region without hits.

use std::sync::Arc;

use corpq_core::{Corpus, MatchList, NO_CPOS, Range, SubCorpus};

use super::error::{EvalError, QueryStatus};
use super::trace::Tracer;
use super::vm::{Scope, run_sequence};
use crate::tree::AlignConstraint;

pub(crate) fn apply<T: Tracer>(
    list: &mut MatchList,
    constraint: &AlignConstraint,
    scope: &Scope<'_>,
    tracer: &mut T,
) -> Result<QueryStatus, EvalError> {
    let limit = scope.config.get_max_environments();
    if scope.depth >= limit {
        return Err(EvalError::EnvironmentDepth { limit });
    }
    let target = target_corpus(constraint, scope)?;
    let nested = Scope {
        depth: scope.depth + 1,
        ..*scope
    };

    // consecutive matches often share a bead
    let mut last: Option<(Range, bool)> = None;
    let mut removed = 0usize;
    for i in 0..list.len() {
        let start = list.starts()[i];
        if start == NO_CPOS {
            continue;
        }
        let found = match constraint.attr.bead_at(start) {
            None => false,
            Some(bead) => match last {
                Some((range, found)) if range == bead.target => found,
                _ => {
                    let region = SubCorpus::with_ranges(
                        target.name(),
                        Arc::clone(&target),
                        vec![bead.target],
                    );
                    let (hits, status) = run_sequence(&constraint.env, &region, &nested, tracer)?;
                    if status == QueryStatus::Interrupted {
                        // this entry and the rest are unchecked
                        for k in i..list.len() {
                            list.delete(k);
                        }
                        list.reduce();
                        return Ok(status);
                    }
                    let found = !hits.is_empty();
                    last = Some((bead.target, found));
                    found
                }
            },
        };
        if found == constraint.negated {
            list.delete(i);
            removed += 1;
        }
    }
    list.reduce();
    tracing::debug!(
        attribute = constraint.attr.name(),
        removed,
        kept = list.len(),
        "alignment filter"
    );
    Ok(QueryStatus::Completed)
}

/// The corpus the alignment points into: from the registry if one is
/// available, else the nested environment's own corpus.
fn target_corpus(
    constraint: &AlignConstraint,
    scope: &Scope<'_>,
) -> Result<Arc<dyn Corpus>, EvalError> {
    let name = constraint.attr.target_corpus();
    if let Some(corpus) = scope.registry.and_then(|r| r.corpus(name)) {
        return Ok(corpus);
    }
    let own = constraint.env.corpus();
    if own.name() == name {
        return Ok(Arc::clone(own));
    }
    Err(EvalError::UnknownCorpus(name.to_owned()))
}
