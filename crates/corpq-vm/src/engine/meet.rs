//! Co-occurrence queries (`MU`).
//!
//! A meet keeps the items of its left list that have at least one item of
//! the right list inside a window around them. The right item is not
//! consumed: several left items may share it. Union merges two lists.

use corpq_core::{Cpos, MatchList, NO_CPOS, SubCorpus};

use super::error::EvalError;
use super::initial::slot_candidates;
use super::interrupt::Poller;
use crate::tree::{Environment, MeetTree, MeetWindow};

/// Evaluate a meet/union tree to a reduced list of single positions.
///
/// The interrupt flag is looked at after every node; an interrupted
/// evaluation yields `None`.
pub(crate) fn evaluate_meet_tree(
    tree: &MeetTree,
    env: &Environment,
    corpus: &SubCorpus,
    poller: &mut Poller<'_>,
) -> Result<Option<MatchList>, EvalError> {
    let size = corpus.mother_size();
    let list = match tree {
        MeetTree::Leaf(index) => slot_candidates(env.pattern(*index)?, env.labels(), corpus)?,
        MeetTree::Meet {
            left,
            right,
            window,
        } => {
            let Some(mut list) = evaluate_meet_tree(left, env, corpus, poller)? else {
                return Ok(None);
            };
            let Some(other) = evaluate_meet_tree(right, env, corpus, poller)? else {
                return Ok(None);
            };
            meet(&mut list, &other, window, size);
            list
        }
        MeetTree::Union(left, right) => {
            let Some(mut list) = evaluate_meet_tree(left, env, corpus, poller)? else {
                return Ok(None);
            };
            let Some(other) = evaluate_meet_tree(right, env, corpus, poller)? else {
                return Ok(None);
            };
            list.union(other, size)?;
            list
        }
    };
    if poller.check() {
        tracing::warn!("meet/union query interrupted");
        return Ok(None);
    }
    Ok(Some(list))
}

/// Delete every item of `list` without an item of `other` in its window.
///
/// Both lists must be reduced. Windows are clamped to the corpus; an
/// empty window (left offset beyond the right one) matches nothing.
pub fn meet(list: &mut MatchList, other: &MatchList, window: &MeetWindow, corpus_size: usize) {
    let candidates = other.starts();
    let last = corpus_size as i64 - 1;
    let mut j = 0;
    for i in 0..list.len() {
        let p = list.starts()[i];
        if p == NO_CPOS {
            continue;
        }
        let bounds = match window {
            MeetWindow::Offsets { left, right } => {
                let lo = (i64::from(p) + i64::from(*left)).max(0);
                let hi = (i64::from(p) + i64::from(*right)).min(last);
                (lo <= hi).then(|| (lo as Cpos, hi as Cpos))
            }
            MeetWindow::Region(attr) => attr.region_at(p).map(|r| (r.start, r.end)),
        };
        let Some((lo, hi)) = bounds else {
            list.delete(i);
            continue;
        };
        // window starts never decrease, so neither does `j`
        while j < candidates.len() && candidates[j] < lo {
            j += 1;
        }
        if j >= candidates.len() || candidates[j] > hi {
            list.delete(i);
        }
    }
    list.reduce();
}
