//! Derivative-based state construction.
//!
//! Each DFA state is a distinct derivative of the root expression. States
//! are discovered breadth-first; a state is final iff its expression is
//! nullable. Derivatives equal to the empty set become error transitions.

use indexmap::IndexSet;

use crate::dfa::Dfa;
use crate::expr::{ExprId, ExprPool};
use crate::{Error, Result};

pub fn build(pool: &mut ExprPool, root: ExprId, slots: usize, max_states: usize) -> Result<Dfa> {
    let symbols: Vec<u32> = pool
        .symbols(root)
        .into_iter()
        .filter(|&s| (s as usize) < slots)
        .collect();

    let mut states: IndexSet<ExprId> = IndexSet::new();
    states.insert(root);
    let mut edges: Vec<(usize, usize, usize)> = Vec::new();

    let mut next = 0;
    while next < states.len() {
        let Some(&expr) = states.get_index(next) else {
            break;
        };
        for &s in &symbols {
            let d = pool.derive(expr, s);
            if pool.is_zero(d) {
                continue;
            }
            let (target, inserted) = states.insert_full(d);
            if inserted && states.len() > max_states {
                return Err(Error::TooManyStates { limit: max_states });
            }
            edges.push((next, s as usize, target));
        }
        next += 1;
    }

    let mut dfa = Dfa::new(states.len(), slots);
    for (i, &expr) in states.iter().enumerate() {
        dfa.set_final(i, pool.nullable(expr));
    }
    for (from, slot, to) in edges {
        dfa.set_transition(from, slot, to);
    }
    Ok(dfa)
}
