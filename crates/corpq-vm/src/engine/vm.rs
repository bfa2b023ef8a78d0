//! Simulation driver for sequence queries.
//!
//! For each transition out of the start state, the driver computes the
//! initial match list of the transition's pattern slot and runs the
//! automaton from every candidate start point. Threads advance through
//! the corpus one generation at a time; each generation is a vector of
//! per-state threads (see [`ThreadSet`]).
//!
//! A start point's match is the first final state reached (shortest
//! strategy) or the last one (longest strategy). Empty matches are
//! discarded, and the global constraint is checked with `matchend` bound
//! before a candidate is accepted.
//!
//! Every thread remembers the states it visited since it last consumed a
//! token. A zero-width transition back into one of them is a cycle that
//! cannot make progress and aborts the query with
//! [`EvalError::InfiniteLoop`].

use std::sync::atomic::AtomicBool;

use corpq_automaton::{Dfa, StateId};
use corpq_core::{
    Bindings, CorpusRegistry, Cpos, LabelId, Match, MatchList, NO_CPOS, Namespace, SpecialLabel,
    SubCorpus,
};

use super::align;
use super::config::{EvalConfig, MatchingStrategy};
use super::error::{EvalError, QueryStatus};
use super::eval::{SlotEnv, check_slot, evaluate};
use super::initial::slot_candidates;
use super::interrupt::Poller;
use super::threads::ThreadSet;
use super::trace::Tracer;
use crate::tree::{Environment, SearchContext};

/// What a run needs besides the environment and the corpus it runs on.
#[derive(Clone, Copy)]
pub(crate) struct Scope<'a> {
    pub config: &'a EvalConfig,
    pub registry: Option<&'a dyn CorpusRegistry>,
    pub interrupt: &'a AtomicBool,
    /// Environments on the stack, this one included.
    pub depth: usize,
}

/// Run a sequence query: simulation, alignment filters, nesting cleanup.
///
/// The result is reduced. On interruption it holds the matches found so
/// far that passed every alignment filter; matches no filter got to are
/// dropped.
pub(crate) fn run_sequence<T: Tracer>(
    env: &Environment,
    corpus: &SubCorpus,
    scope: &Scope<'_>,
    tracer: &mut T,
) -> Result<(MatchList, QueryStatus), EvalError> {
    let (mut list, interrupted) = {
        let mut sim = Simulator::new(env, corpus, scope, tracer)?;
        let list = sim.run()?;
        (list, sim.poller.is_interrupted())
    };

    let alignments = env.alignments();
    let mut status = QueryStatus::Completed;
    if interrupted {
        status = QueryStatus::Interrupted;
        // unfiltered matches cannot be committed
        if !alignments.is_empty() {
            list.truncate(0);
        }
    } else {
        for (k, constraint) in alignments.iter().enumerate() {
            if align::apply(&mut list, constraint, scope, tracer)? == QueryStatus::Interrupted {
                status = QueryStatus::Interrupted;
                if k + 1 < alignments.len() {
                    list.truncate(0);
                }
                break;
            }
        }
    }
    if scope.config.get_matching_strategy() == MatchingStrategy::Longest {
        drop_nested(&mut list);
    }
    Ok((list, status))
}

/// Remove matches lying inside an earlier kept match.
pub(crate) fn drop_nested(list: &mut MatchList) {
    let mut reach = NO_CPOS;
    for i in 0..list.len() {
        let Some(m) = list.get(i) else {
            continue;
        };
        if m.start == NO_CPOS {
            continue;
        }
        if m.end <= reach {
            list.delete(i);
        } else {
            reach = m.end;
        }
    }
    list.reduce();
}

/// Last position of a window of `n` tokens from `start`.
fn span_end(start: Cpos, n: u32) -> Cpos {
    start.saturating_add(Cpos::try_from(n.max(1) - 1).unwrap_or(Cpos::MAX))
}

/// Automaton simulation state for one environment.
struct Simulator<'a, T: Tracer> {
    env: &'a Environment,
    dfa: &'a Dfa,
    corpus: &'a SubCorpus,
    config: &'a EvalConfig,
    poller: Poller<'a>,
    tracer: &'a mut T,
    slots: SlotEnv<'a>,
    current: ThreadSet,
    next: ThreadSet,
    /// Target of a successful slot check.
    scratch: Bindings,
    /// Bindings the global constraint sees.
    global_scratch: Bindings,
    match_label: Option<LabelId>,
    matchend_label: Option<LabelId>,
    target_label: Option<LabelId>,
    keyword_label: Option<LabelId>,
    /// Region ends recorded by opening tags.
    boundaries: Vec<LabelId>,
}

impl<'a, T: Tracer> Simulator<'a, T> {
    fn new(
        env: &'a Environment,
        corpus: &'a SubCorpus,
        scope: &Scope<'a>,
        tracer: &'a mut T,
    ) -> Result<Self, EvalError> {
        let dfa = env.dfa().ok_or(EvalError::WrongQueryKind {
            expected: "sequence",
        })?;
        if dfa.accepts_empty() {
            return Err(EvalError::EmptyMatchQuery);
        }
        let labels = env.labels();
        let states = dfa.state_count();
        Ok(Self {
            env,
            dfa,
            corpus,
            config: scope.config,
            poller: Poller::new(scope.interrupt, scope.config.get_poll_interval()),
            tracer,
            slots: SlotEnv::new(labels, corpus, scope.config.get_strict_regions()),
            current: ThreadSet::new(states, labels.len()),
            next: ThreadSet::new(states, labels.len()),
            scratch: labels.new_bindings(),
            global_scratch: labels.new_bindings(),
            match_label: labels.special(SpecialLabel::Match),
            matchend_label: labels.special(SpecialLabel::MatchEnd),
            target_label: labels.special(SpecialLabel::Target),
            keyword_label: labels.special(SpecialLabel::Keyword),
            boundaries: labels.iter_namespace(Namespace::Internal).collect(),
        })
    }

    fn run(&mut self) -> Result<MatchList, EvalError> {
        let (dfa, env) = (self.dfa, self.env);
        let size = self.corpus.mother_size();
        self.tracer.trace_automaton(dfa);

        let mut total = MatchList::new();
        let starts: Vec<(usize, StateId)> = dfa.transitions_from(0).collect();
        for (symbol, target) in starts {
            let slot = env.pattern(symbol)?;
            let mut list = slot_candidates(slot, env.labels(), self.corpus)?;
            self.tracer.trace_initial(symbol, target, list.len());
            tracing::debug!(symbol, candidates = list.len(), "initial match list");

            for i in 0..list.len() {
                if self.poller.is_interrupted() {
                    list.delete(i);
                    continue;
                }
                let start = list.starts()[i];
                match self.simulate(start, symbol)? {
                    Some(m) => {
                        list.set_end(i, m.end)?;
                        if m.target != NO_CPOS {
                            list.set_target(i, m.target)?;
                        }
                        if m.keyword != NO_CPOS {
                            list.set_keyword(i, m.keyword)?;
                        }
                    }
                    None => list.delete(i),
                }
            }
            list.reduce();
            total.union(list, size)?;

            if self.poller.is_interrupted() {
                self.tracer.trace_interrupt();
                tracing::warn!(matches = total.len(), "query interrupted");
                break;
            }
        }
        tracing::debug!(
            matches = total.len(),
            transitions = self.poller.ticks(),
            "simulation finished"
        );
        Ok(total)
    }

    /// Run the automaton from `start`, entering through `first_symbol`.
    fn simulate(&mut self, start: Cpos, first_symbol: usize) -> Result<Option<Match>, EvalError> {
        let Some(boundary) = self.boundary(start) else {
            return Ok(None);
        };
        self.tracer.trace_start(start, boundary);

        let (dfa, env) = (self.dfa, self.env);
        let patterns = env.patterns();
        let strategy = self.config.get_matching_strategy();

        self.current.clear();
        self.next.clear();
        self.scratch.reset();
        if let Some(label) = self.match_label {
            self.scratch.set(label, start)?;
        }
        self.current.activate(0, start, &self.scratch, &[]);

        let mut winner: Option<Match> = None;
        let mut first = true;
        while !self.current.is_empty() {
            self.next.clear();
            let active: Vec<StateId> = self.current.states().collect();
            for state in active {
                let cpos = self.current.cpos(state);
                let limit = self.thread_limit(boundary, self.current.bindings(state))?;
                for (symbol, to) in dfa.transitions_from(state) {
                    if first && symbol != first_symbol {
                        continue;
                    }
                    if self.poller.tick() {
                        return Ok(None);
                    }
                    let slot = &patterns[symbol];
                    let zero_width = slot.is_zero_width();
                    let allowed = if zero_width {
                        cpos <= limit + 1
                    } else {
                        cpos <= limit
                    };
                    let ok = allowed
                        && check_slot(
                            slot,
                            &self.slots,
                            cpos,
                            self.current.bindings(state),
                            &mut self.scratch,
                        )?;
                    self.tracer.trace_transition(state, symbol, to, cpos, ok);
                    if !ok {
                        continue;
                    }

                    let next_cpos = if zero_width { cpos } else { cpos + 1 };
                    if dfa.is_final(to)
                        && let Some(m) = self.accept(start, next_cpos - 1)?
                    {
                        match strategy {
                            MatchingStrategy::Shortest => {
                                self.tracer.trace_match(m.start, m.end);
                                return Ok(Some(m));
                            }
                            MatchingStrategy::Longest => {
                                if winner.is_none_or(|w| m.end >= w.end) {
                                    winner = Some(m);
                                }
                            }
                        }
                    }
                    if dfa.transitions_from(to).next().is_none() {
                        continue;
                    }
                    let trail: &[StateId] = if zero_width {
                        let trail = self.current.trail(state);
                        if trail.contains(&to) {
                            tracing::warn!(start, cpos, state = to, "zero-width cycle in simulation");
                            return Err(EvalError::InfiniteLoop { start, state: to });
                        }
                        trail
                    } else {
                        &[]
                    };
                    self.next.activate(to, next_cpos, &self.scratch, trail);
                }
            }
            first = false;
            std::mem::swap(&mut self.current, &mut self.next);
        }

        if let Some(m) = winner {
            self.tracer.trace_match(m.start, m.end);
        }
        Ok(winner)
    }

    /// Check a candidate ending at `end` against the global constraint.
    fn accept(&mut self, start: Cpos, end: Cpos) -> Result<Option<Match>, EvalError> {
        if end < start {
            return Ok(None);
        }
        if let Some(global) = self.env.global() {
            self.global_scratch.copy_from(&self.scratch);
            if let Some(label) = self.matchend_label {
                self.global_scratch.set(label, end)?;
            }
            if !evaluate(global, &self.global_scratch, start)? {
                self.tracer.trace_reject(start, end);
                return Ok(None);
            }
        }
        let anchor = |label: Option<LabelId>| match label {
            Some(l) => self.scratch.get(l),
            None => Ok(NO_CPOS),
        };
        Ok(Some(Match {
            start,
            end,
            target: anchor(self.target_label)?,
            keyword: anchor(self.keyword_label)?,
        }))
    }

    /// Last position a match from `start` may cover, or `None` if `start`
    /// lies outside the query corpus.
    fn boundary(&self, start: Cpos) -> Option<Cpos> {
        let range = self.corpus.ranges()[self.corpus.range_index_at(start)?];
        let context_end = match self.env.within() {
            None => span_end(start, self.config.get_hard_boundary()),
            Some(SearchContext::Words(n)) => span_end(start, *n),
            Some(SearchContext::Regions { attr, count }) => {
                let region = attr.region_at(start)?;
                let last = (region.index + (*count).max(1) as usize - 1)
                    .min(attr.region_count().saturating_sub(1));
                attr.region(last)?.end
            }
        };
        let corpus_end = self.corpus.mother_size() as Cpos - 1;
        Some(context_end.min(range.end).min(corpus_end))
    }

    /// Boundary further limited by region ends a thread has recorded.
    fn thread_limit(&self, boundary: Cpos, bindings: &Bindings) -> Result<Cpos, EvalError> {
        let mut limit = boundary;
        for &label in &self.boundaries {
            let end = bindings.get(label)?;
            if end != NO_CPOS {
                limit = limit.min(end);
            }
        }
        Ok(limit)
    }
}
