//! Constraint evaluator.
//!
//! [`evaluate`] tests one predicate tree at one corpus position, reading
//! labels from a binding vector. [`check_slot`] is the per-transition
//! check the simulation runs for every pattern slot; on success it
//! writes the source bindings plus whatever the slot binds into the
//! target vector.

use std::borrow::Cow;

use corpq_core::{Bindings, Cpos, LabelId, LabelTable, NO_CPOS, SpecialLabel, SubCorpus};

use super::error::EvalError;
use super::value::Value;
use crate::tree::{AnchorKind, CmpOp, Field, Operand, PatternSlot, Pred, TagValue};

/// Evaluate `pred` at `cpos`.
pub fn evaluate(pred: &Pred, bindings: &Bindings, cpos: Cpos) -> Result<bool, EvalError> {
    match pred {
        Pred::And(l, r) => Ok(evaluate(l, bindings, cpos)? && evaluate(r, bindings, cpos)?),
        Pred::Or(l, r) => Ok(evaluate(l, bindings, cpos)? || evaluate(r, bindings, cpos)?),
        Pred::Implies(l, r) => Ok(!evaluate(l, bindings, cpos)? || evaluate(r, bindings, cpos)?),
        Pred::Not(None) => Ok(true),
        Pred::Not(Some(p)) => Ok(!evaluate(p, bindings, cpos)?),
        Pred::Cmp { op, left, right } => {
            let lhs = operand(left, bindings, cpos)?;
            match right {
                Some(right) if *op != CmpOp::Exists => {
                    if !lhs.is_defined() {
                        return Ok(false);
                    }
                    let rhs = operand(right, bindings, cpos)?;
                    lhs.compare(*op, &rhs)
                }
                _ => Ok(lhs.truthy()),
            }
        }
        Pred::IdList {
            attr,
            at,
            ids,
            negated,
        } => {
            let pos = bindings.resolve(*at, cpos)?;
            let Some(id) = attr.cpos_to_id(pos) else {
                return Ok(false);
            };
            Ok(ids.binary_search(&id).is_ok() != *negated)
        }
    }
}

/// Evaluate one operand.
pub fn operand<'e>(
    op: &'e Operand,
    bindings: &Bindings,
    cpos: Cpos,
) -> Result<Value<'e>, EvalError> {
    let value = match op {
        Operand::Attr { attr, at } => {
            let pos = bindings.resolve(*at, cpos)?;
            match attr.cpos_to_id(pos) {
                Some(id) => Value::Token {
                    attr: attr.as_ref(),
                    id,
                },
                None => Value::Undefined,
            }
        }
        Operand::Region { attr, at } => {
            let pos = bindings.resolve(*at, cpos)?;
            match (pos != NO_CPOS).then(|| attr.region_at(pos)).flatten() {
                Some(region) => Value::Region {
                    attr: attr.as_ref(),
                    region,
                    cpos: pos,
                },
                None => Value::Undefined,
            }
        }
        Operand::Position(at) => match bindings.resolve(*at, cpos)? {
            NO_CPOS => Value::Undefined,
            pos => Value::Cpos(pos),
        },
        Operand::Call { func, args } => {
            let args = args
                .iter()
                .map(|a| operand(a, bindings, cpos))
                .collect::<Result<Vec<_>, _>>()?;
            func.call(&args)?
        }
        Operand::Str(s) => Value::Str(Cow::Borrowed(s.as_str())),
        Operand::Int(i) => Value::Int(*i),
        Operand::Float(x) => Value::Float(*x),
        Operand::Regex(re) => Value::Regex(re),
        Operand::LexId(id) => Value::LexId(*id),
    };
    Ok(value)
}

/// What a pattern slot check needs besides the slot itself.
#[derive(Clone, Copy)]
pub(crate) struct SlotEnv<'a> {
    pub query_corpus: &'a SubCorpus,
    pub corpus_size: Cpos,
    pub strict_regions: bool,
    pub target: Option<LabelId>,
    pub keyword: Option<LabelId>,
}

impl<'a> SlotEnv<'a> {
    pub fn new(labels: &LabelTable, query_corpus: &'a SubCorpus, strict_regions: bool) -> Self {
        Self {
            query_corpus,
            corpus_size: query_corpus.mother_size() as Cpos,
            strict_regions,
            target: labels.special(SpecialLabel::Target),
            keyword: labels.special(SpecialLabel::Keyword),
        }
    }

    fn in_corpus(&self, cpos: Cpos) -> bool {
        (0..self.corpus_size).contains(&cpos)
    }
}

/// Test pattern slot `slot` at `cpos`. On success `dst` holds a copy of
/// `src` plus the labels the slot sets.
pub(crate) fn check_slot(
    slot: &PatternSlot,
    env: &SlotEnv<'_>,
    cpos: Cpos,
    src: &Bindings,
    dst: &mut Bindings,
) -> Result<bool, EvalError> {
    let eff = slot.effective_position(cpos);
    if !env.in_corpus(eff) {
        return Ok(false);
    }

    let mut boundary = None;
    let ok = match slot {
        PatternSlot::Pattern { pred, .. } => evaluate(pred, src, eff)?,
        PatternSlot::MatchAll { .. } => true,
        PatternSlot::Tag {
            attr,
            closing,
            value,
            right_boundary,
        } => match attr.region_at(eff) {
            Some(region) => {
                let at_edge = if *closing {
                    region.end == eff
                } else {
                    region.start == eff
                };
                if let Some(label) = right_boundary
                    && env.strict_regions
                {
                    boundary = Some((*label, if *closing { NO_CPOS } else { region.end }));
                }
                at_edge && tag_value_matches(value.as_ref(), attr.region_value(region.index))
            }
            None => false,
        },
        PatternSlot::Anchor { field, .. } => {
            anchor_value(env.query_corpus, *field, eff)? == Some(eff)
        }
    };
    if !ok {
        return Ok(false);
    }

    dst.copy_from(src);
    if let Some(label) = slot.label() {
        dst.set(label, eff)?;
    }
    let anchor = match slot.anchor() {
        AnchorKind::None => None,
        AnchorKind::Target => env.target,
        AnchorKind::Keyword => env.keyword,
    };
    if let Some(label) = anchor {
        dst.set(label, eff)?;
    }
    if let Some((label, end)) = boundary {
        dst.set(label, end)?;
    }
    Ok(true)
}

fn tag_value_matches(constraint: Option<&TagValue>, value: Option<&str>) -> bool {
    match (constraint, value) {
        (None, _) => true,
        (Some(c), Some(v)) => c.regex.is_match(v) != c.negated,
        (Some(c), None) => c.negated,
    }
}

/// Value of a query corpus field for the range containing `cpos`.
fn anchor_value(corpus: &SubCorpus, field: Field, cpos: Cpos) -> Result<Option<Cpos>, EvalError> {
    let available = match field {
        Field::Match | Field::MatchEnd => true,
        Field::Target => corpus.targets().is_some(),
        Field::Keyword => corpus.keywords().is_some(),
    };
    if !available {
        return Err(EvalError::InvalidField(field.name()));
    }
    let Some(index) = corpus.range_index_at(cpos) else {
        return Ok(None);
    };
    let range = corpus.ranges()[index];
    let value = match field {
        Field::Match => range.start,
        Field::MatchEnd => range.end,
        Field::Target => corpus.target_at(index),
        Field::Keyword => corpus.keyword_at(index),
    };
    Ok((value != NO_CPOS).then_some(value))
}
