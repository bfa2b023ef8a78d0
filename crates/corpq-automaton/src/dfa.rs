//! Deterministic automaton over pattern slots.

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Index of a DFA state.
pub type StateId = usize;

/// Transition table plus final-state set.
///
/// State 0 is the start state. Missing transitions lead to the error
/// state, numerically equal to the state count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dfa {
    slots: usize,
    states: usize,
    /// Row-major `states x slots`; `states` marks the error state.
    table: Vec<StateId>,
    finals: Vec<bool>,
}

impl Dfa {
    /// Empty automaton with `states` states and no transitions.
    pub fn new(states: usize, slots: usize) -> Self {
        Self {
            slots,
            states,
            table: vec![states; states * slots],
            finals: vec![false; states],
        }
    }

    pub fn set_transition(&mut self, from: StateId, slot: usize, to: StateId) {
        debug_assert!(from < self.states && slot < self.slots && to <= self.states);
        self.table[from * self.slots + slot] = to;
    }

    pub fn set_final(&mut self, state: StateId, is_final: bool) {
        self.finals[state] = is_final;
    }

    pub fn state_count(&self) -> usize {
        self.states
    }

    /// Size of the input alphabet.
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn error_state(&self) -> StateId {
        self.states
    }

    pub fn is_final(&self, state: StateId) -> bool {
        self.finals.get(state).copied().unwrap_or(false)
    }

    /// Raw transition; the error state for missing transitions and
    /// out-of-range inputs.
    #[inline]
    pub fn transition(&self, state: StateId, slot: usize) -> StateId {
        if state >= self.states || slot >= self.slots {
            return self.states;
        }
        self.table[state * self.slots + slot]
    }

    #[inline]
    pub fn next(&self, state: StateId, slot: usize) -> Option<StateId> {
        let to = self.transition(state, slot);
        (to != self.states).then_some(to)
    }

    /// Live transitions out of `state`, by ascending slot.
    pub fn transitions_from(&self, state: StateId) -> impl Iterator<Item = (usize, StateId)> + '_ {
        (0..self.slots).filter_map(move |p| self.next(state, p).map(|t| (p, t)))
    }

    /// Whether the slot sequence is accepted.
    pub fn accepts(&self, input: &[usize]) -> bool {
        let mut state = 0;
        if self.states == 0 {
            return false;
        }
        for &p in input {
            match self.next(state, p) {
                Some(t) => state = t,
                None => return false,
            }
        }
        self.is_final(state)
    }

    /// Whether the start state is final, i.e. the empty sequence is accepted.
    pub fn accepts_empty(&self) -> bool {
        self.is_final(0)
    }

    /// One line per state: `S<n>[*]: #<slot>->S<target> ...`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for s in 0..self.states {
            if s > 0 {
                out.push('\n');
            }
            let _ = write!(out, "S{s}{}:", if self.is_final(s) { "*" } else { "" });
            for (p, t) in self.transitions_from(s) {
                let _ = write!(out, " #{p}->S{t}");
            }
        }
        out
    }
}

impl fmt::Display for Dfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}
