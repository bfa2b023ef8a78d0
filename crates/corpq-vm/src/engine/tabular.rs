//! TAB queries: a chain of columns with gap constraints.
//!
//! Each first-column item starts a chain. For every further column the
//! nearest item after the previous column whose gap lies within
//! `[min_gap, max_gap]` is taken. Column items used by a complete chain
//! are consumed, so which chain gets a shared item depends on scan order.
//! Unbounded gaps are capped by the hard boundary and the query corpus
//! range of the chain's start. An interrupt stops the scan; chains
//! completed before it are kept.

use corpq_core::{Cpos, Match, MatchList, SubCorpus};

use super::config::EvalConfig;
use super::error::EvalError;
use super::initial::slot_candidates;
use super::interrupt::Poller;
use crate::tree::{Environment, TabColumn};

pub(crate) fn evaluate_tab(
    columns: &[TabColumn],
    env: &Environment,
    corpus: &SubCorpus,
    config: &EvalConfig,
    poller: &mut Poller<'_>,
) -> Result<MatchList, EvalError> {
    let Some((head, rest)) = columns.split_first() else {
        return Ok(MatchList::new());
    };
    let labels = env.labels();
    let starts = slot_candidates(env.pattern(head.pattern)?, labels, corpus)?;
    let lists = rest
        .iter()
        .map(|c| slot_candidates(env.pattern(c.pattern)?, labels, corpus))
        .collect::<Result<Vec<_>, _>>()?;

    if poller.check() {
        return Ok(MatchList::new());
    }

    let reach = Cpos::try_from(config.get_hard_boundary().max(1) - 1).unwrap_or(Cpos::MAX);
    let mut pointers = vec![0usize; rest.len()];
    let mut chain = vec![0usize; rest.len()];
    let mut result = MatchList::new();

    'starts: for &start in starts.starts() {
        if poller.tick() {
            break;
        }
        let Some(range) = corpus.range_index_at(start).map(|i| corpus.ranges()[i]) else {
            continue;
        };
        let limit = start.saturating_add(reach).min(range.end);
        let mut prev = start;
        for (k, column) in rest.iter().enumerate() {
            let items = lists[k].starts();
            let lo = gap_end(prev, column.min_gap);
            let hi = match column.max_gap {
                Some(g) => gap_end(prev, g).min(limit),
                None => limit,
            };
            let p = &mut pointers[k];
            while *p < items.len() && items[*p] < lo {
                *p += 1;
            }
            if *p >= items.len() || items[*p] > hi {
                continue 'starts;
            }
            chain[k] = *p;
            prev = items[*p];
        }
        for (k, &used) in chain.iter().enumerate() {
            pointers[k] = used + 1;
        }
        result.push(Match::span(start, prev))?;
    }

    tracing::debug!(
        columns = columns.len(),
        matches = result.len(),
        interrupted = poller.is_interrupted(),
        "tab query"
    );
    Ok(result)
}

/// Position after `prev` with `gap` tokens in between.
fn gap_end(prev: Cpos, gap: u32) -> Cpos {
    prev.saturating_add(1)
        .saturating_add(Cpos::try_from(gap).unwrap_or(Cpos::MAX))
}
