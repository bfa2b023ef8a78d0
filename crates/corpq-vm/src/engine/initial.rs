//! Initial match lists: candidate start positions for the first slot of
//! a query, computed from lexicon lookups where possible.
//!
//! Recognised shapes:
//! - `attr = "literal"` / lexicon id constant: one posting list
//! - `attr = /regex/`: union of the postings of every matching lexicon entry
//!   (`.*` is the whole corpus, `.+` everything but empty values)
//! - id lists: union of postings
//! - `_ = n`: a single position
//! - `A & B`: the list of `A`, filtered by evaluating `B` per position
//! - `A | B`: union of both lists
//!
//! Everything else evaluates the predicate at every corpus position.

use std::sync::Arc;

use corpq_core::{
    Bindings, Cpos, LabelTable, MatchList, NO_CPOS, PositionalAttribute, SlotRef, SubCorpus,
};

use super::error::EvalError;
use super::eval::evaluate;
use crate::tree::{CmpOp, Field, Operand, PatternSlot, Pred};

/// Candidate list for `pred`, restricted to the ranges of `corpus`.
pub fn initial_matchlist(
    pred: &Pred,
    labels: &LabelTable,
    corpus: &SubCorpus,
) -> Result<MatchList, EvalError> {
    let size = corpus.mother_size();
    let bindings = labels.new_bindings();
    let mut list = calculate(pred, &bindings, size)?;
    list.restrict_to(corpus.ranges(), size)?;
    Ok(list)
}

/// Candidate start positions of a pattern slot.
///
/// Zero-width slots other than opening tags and `<match>` start from the
/// whole query corpus; the simulation checks them anyway.
pub(crate) fn slot_candidates(
    slot: &PatternSlot,
    labels: &LabelTable,
    corpus: &SubCorpus,
) -> Result<MatchList, EvalError> {
    let size = corpus.mother_size();
    let mut list = match slot {
        PatternSlot::Pattern {
            pred,
            lookahead: false,
            ..
        } => return initial_matchlist(pred, labels, corpus),
        PatternSlot::Tag {
            attr,
            closing: false,
            ..
        } => MatchList::from_positions(
            (0..attr.region_count())
                .filter_map(|i| attr.region(i))
                .map(|r| r.start)
                .collect(),
        ),
        PatternSlot::Anchor {
            field: Field::Match,
            closing: false,
        } => MatchList::from_positions(corpus.ranges().iter().map(|r| r.start).collect()),
        _ => MatchList::whole_corpus(),
    };
    list.restrict_to(corpus.ranges(), size)?;
    Ok(list)
}

fn calculate(pred: &Pred, bindings: &Bindings, size: usize) -> Result<MatchList, EvalError> {
    match pred {
        Pred::Cmp {
            op: op @ (CmpOp::Eq | CmpOp::Ne),
            left,
            right: Some(right),
        } => {
            let lookup = match (left, right) {
                (Operand::Attr { attr, at }, lit) | (lit, Operand::Attr { attr, at })
                    if *at == SlotRef::Current =>
                {
                    lexicon_lookup(attr, lit)?
                }
                (Operand::Position(SlotRef::Current), Operand::Int(n))
                | (Operand::Int(n), Operand::Position(SlotRef::Current))
                    if *op == CmpOp::Eq =>
                {
                    return Ok(pinpoint(*n, size));
                }
                _ => None,
            };
            match lookup {
                Some(mut list) => {
                    if *op == CmpOp::Ne {
                        list.complement();
                    }
                    Ok(list)
                }
                None => scan(pred, bindings, size),
            }
        }
        Pred::IdList {
            attr,
            at: SlotRef::Current,
            ids,
            negated,
        } => {
            let mut list = MatchList::from_positions(attr.ids_to_positions(ids)?);
            if *negated {
                list.complement();
            }
            Ok(list)
        }
        Pred::And(l, r) => {
            let mut list = calculate(l, bindings, size)?;
            list.resolve(size)?;
            for i in 0..list.len() {
                let cpos = list.starts()[i];
                if cpos != NO_CPOS && !evaluate(r, bindings, cpos)? {
                    list.delete(i);
                }
            }
            list.reduce();
            Ok(list)
        }
        Pred::Or(l, r) => {
            let mut list = calculate(l, bindings, size)?;
            list.union(calculate(r, bindings, size)?, size)?;
            Ok(list)
        }
        Pred::Not(None) => Ok(MatchList::whole_corpus()),
        _ => scan(pred, bindings, size),
    }
}

/// Postings for `attr = literal`, or `None` if the literal is not a
/// string, regex or lexicon id.
fn lexicon_lookup(
    attr: &Arc<dyn PositionalAttribute>,
    literal: &Operand,
) -> Result<Option<MatchList>, EvalError> {
    let positions = |id| attr.id_to_positions(id);
    let list = match literal {
        Operand::Str(s) => match attr.str_to_id(s) {
            Some(id) => MatchList::from_positions(positions(id)?),
            None => MatchList::new(),
        },
        Operand::LexId(id) => match id {
            Some(id) => MatchList::from_positions(positions(*id)?),
            None => MatchList::new(),
        },
        Operand::Regex(re) if re.matches_everything() => MatchList::whole_corpus(),
        Operand::Regex(re) if re.matches_non_empty() => {
            // everything but the positions of the empty value
            let mut list = match attr.str_to_id("") {
                Some(id) => MatchList::from_positions(positions(id)?),
                None => MatchList::new(),
            };
            list.complement();
            list
        }
        Operand::Regex(re) => {
            let ids = attr.regex_to_ids(re);
            MatchList::from_positions(attr.ids_to_positions(&ids)?)
        }
        _ => return Ok(None),
    };
    Ok(Some(list))
}

/// `[_ = n]`
fn pinpoint(n: i64, size: usize) -> MatchList {
    match Cpos::try_from(n) {
        Ok(cpos) if cpos >= 0 && (cpos as usize) < size => MatchList::from_positions(vec![cpos]),
        _ => MatchList::new(),
    }
}

/// Evaluate at every position of the corpus.
fn scan(pred: &Pred, bindings: &Bindings, size: usize) -> Result<MatchList, EvalError> {
    let mut positions = Vec::new();
    for cpos in 0..size as Cpos {
        if evaluate(pred, bindings, cpos)? {
            positions.push(cpos);
        }
    }
    Ok(MatchList::from_positions(positions))
}
