//! State minimisation by partition refinement.
//!
//! Starts from the final/non-final split and refines by transition
//! signatures until the class count is stable. The quotient automaton is
//! renumbered breadth-first from the start state, so numbering depends
//! only on the language, not on construction order.

use std::collections::{HashMap, VecDeque};

use crate::dfa::{Dfa, StateId};

pub fn minimize(dfa: &Dfa) -> Dfa {
    let n = dfa.state_count();
    if n == 0 {
        return dfa.clone();
    }
    let slots = dfa.slot_count();
    let error = dfa.error_state();

    let mut class: Vec<usize> = (0..n).map(|s| usize::from(dfa.is_final(s))).collect();
    let mut count = class.iter().copied().max().map_or(0, |m| m + 1);

    loop {
        let mut signatures: HashMap<(usize, Vec<Option<usize>>), usize> = HashMap::new();
        let mut refined = Vec::with_capacity(n);
        for s in 0..n {
            let row: Vec<Option<usize>> = (0..slots)
                .map(|p| {
                    let t = dfa.transition(s, p);
                    (t != error).then(|| class[t])
                })
                .collect();
            let next_id = signatures.len();
            let id = *signatures.entry((class[s], row)).or_insert(next_id);
            refined.push(id);
        }
        let refined_count = signatures.len();
        class = refined;
        if refined_count == count {
            break;
        }
        count = refined_count;
    }

    // breadth-first renumbering from the start state's class
    let mut order: Vec<Option<StateId>> = vec![None; count];
    let mut representative: Vec<StateId> = vec![0; count];
    for s in (0..n).rev() {
        representative[class[s]] = s;
    }
    let mut queue = VecDeque::from([class[0]]);
    order[class[0]] = Some(0);
    let mut numbered = 1;
    while let Some(c) = queue.pop_front() {
        let rep = representative[c];
        for (_, t) in dfa.transitions_from(rep) {
            let tc = class[t];
            if order[tc].is_none() {
                order[tc] = Some(numbered);
                numbered += 1;
                queue.push_back(tc);
            }
        }
    }

    let mut out = Dfa::new(numbered, slots);
    for c in 0..count {
        let Some(from) = order[c] else {
            continue;
        };
        let rep = representative[c];
        out.set_final(from, dfa.is_final(rep));
        for (p, t) in dfa.transitions_from(rep) {
            if let Some(to) = order[class[t]] {
                out.set_transition(from, p, to);
            }
        }
    }
    out
}
