//! Thread storage for the simulation.
//!
//! The automaton is deterministic, so at any corpus position there is at
//! most one thread per state. Threads therefore live in vectors indexed by
//! state: the position a thread has reached (`NO_CPOS` when the state is
//! inactive), the label bindings it carries, and its zero-width trail: the
//! states it passed through since it last consumed a token. Binding vectors
//! are allocated once and reused for every start point.

use corpq_automaton::StateId;
use corpq_core::{Bindings, Cpos, NO_CPOS};

/// One generation of threads.
#[derive(Debug)]
pub(crate) struct ThreadSet {
    cpos: Vec<Cpos>,
    bindings: Vec<Bindings>,
    trails: Vec<Vec<StateId>>,
    active: usize,
}

impl ThreadSet {
    pub fn new(states: usize, labels: usize) -> Self {
        Self {
            cpos: vec![NO_CPOS; states],
            bindings: (0..states).map(|_| Bindings::new(labels)).collect(),
            trails: vec![Vec::new(); states],
            active: 0,
        }
    }

    /// Deactivate every state. Bindings are overwritten on activation.
    pub fn clear(&mut self) {
        if self.active > 0 {
            self.cpos.fill(NO_CPOS);
            self.active = 0;
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    #[inline]
    pub fn is_active(&self, state: StateId) -> bool {
        self.cpos.get(state).is_some_and(|&c| c != NO_CPOS)
    }

    /// Start a thread in `state`, extending the zero-width trail `trail`
    /// (empty after a consuming step). The first writer of a generation
    /// wins: returns `false` and leaves the state alone if it is already
    /// active.
    pub fn activate(
        &mut self,
        state: StateId,
        cpos: Cpos,
        bindings: &Bindings,
        trail: &[StateId],
    ) -> bool {
        if self.is_active(state) {
            return false;
        }
        self.cpos[state] = cpos;
        self.bindings[state].copy_from(bindings);
        let own = &mut self.trails[state];
        own.clear();
        own.extend_from_slice(trail);
        own.push(state);
        self.active += 1;
        true
    }

    #[inline]
    pub fn cpos(&self, state: StateId) -> Cpos {
        self.cpos[state]
    }

    #[inline]
    pub fn bindings(&self, state: StateId) -> &Bindings {
        &self.bindings[state]
    }

    /// States visited at the thread's position, itself included.
    #[inline]
    pub fn trail(&self, state: StateId) -> &[StateId] {
        &self.trails[state]
    }

    /// Active states in ascending order.
    pub fn states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.cpos
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != NO_CPOS)
            .map(|(s, _)| s)
    }
}
