//! Query trees handed over by the query front end.
//!
//! An [`Environment`] bundles everything one query needs: the corpus it
//! runs on, its label table, pattern slots, evaluation tree, global
//! constraint, search context and alignment constraints. It also owns the
//! compiled automaton, rebuilt whenever the evaluation tree changes.

mod pred;
mod slot;

use std::sync::Arc;

use corpq_automaton::{Dfa, SeqTree, compile_tree};
use corpq_core::{
    AlignmentAttribute, AttributeHandle, AttributeKind, Corpus, CorpusError, LabelId, LabelTable,
    Namespace, PositionalAttribute, StructuralAttribute,
};

use crate::engine::config::EvalConfig;
use crate::engine::error::EvalError;

#[cfg(test)]
mod environment_tests;

pub use pred::{CmpOp, Operand, Pred};
pub use slot::{AnchorKind, Field, PatternSlot, TagValue};

/// How pattern slots combine.
#[derive(Clone, Debug)]
pub enum EvalTree {
    /// Token sequence, compiled into a DFA.
    Seq(SeqTree),
    /// Co-occurrence query (`MU`).
    MeetUnion(MeetTree),
    /// Column chain (`TAB`).
    Tab(Vec<TabColumn>),
}

/// Window of a `meet`.
#[derive(Clone, Debug)]
pub enum MeetWindow {
    /// Right item within `[left, right]` tokens of the left item.
    Offsets { left: i32, right: i32 },
    /// Right item in the same region as the left item.
    Region(Arc<dyn StructuralAttribute>),
}

#[derive(Clone, Debug)]
pub enum MeetTree {
    /// Initial match list of one pattern slot.
    Leaf(usize),
    Meet {
        left: Box<MeetTree>,
        right: Box<MeetTree>,
        window: MeetWindow,
    },
    Union(Box<MeetTree>, Box<MeetTree>),
}

impl MeetTree {
    pub fn meet(left: MeetTree, right: MeetTree, window: MeetWindow) -> Self {
        MeetTree::Meet {
            left: Box::new(left),
            right: Box::new(right),
            window,
        }
    }

    pub fn union(left: MeetTree, right: MeetTree) -> Self {
        MeetTree::Union(Box::new(left), Box::new(right))
    }
}

/// One column of a TAB query.
///
/// `min_gap`/`max_gap` bound the number of tokens between the previous
/// column and this one; they are ignored on the first column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TabColumn {
    pub pattern: usize,
    pub min_gap: u32,
    /// `None` is unbounded (up to the hard boundary).
    pub max_gap: Option<u32>,
}

impl TabColumn {
    /// Column directly following the previous one.
    pub fn adjacent(pattern: usize) -> Self {
        Self {
            pattern,
            min_gap: 0,
            max_gap: Some(0),
        }
    }

    pub fn gap(pattern: usize, min_gap: u32, max_gap: Option<u32>) -> Self {
        Self {
            pattern,
            min_gap,
            max_gap,
        }
    }
}

/// The `within` clause.
#[derive(Clone, Debug)]
pub enum SearchContext {
    Words(u32),
    /// `count` consecutive regions, starting at the start point's region.
    Regions {
        attr: Arc<dyn StructuralAttribute>,
        count: u32,
    },
}

/// `:CORPUS [...]`: matches must (or, negated, must not) have an aligned
/// region in which the nested query matches.
#[derive(Clone, Debug)]
pub struct AlignConstraint {
    pub attr: Arc<dyn AlignmentAttribute>,
    pub negated: bool,
    pub env: Box<Environment>,
}

/// One query's evaluation environment.
#[derive(Clone, Debug)]
pub struct Environment {
    corpus: Arc<dyn Corpus>,
    labels: LabelTable,
    patterns: Vec<PatternSlot>,
    tree: Option<EvalTree>,
    global: Option<Pred>,
    within: Option<SearchContext>,
    alignments: Vec<AlignConstraint>,
    dfa: Option<Dfa>,
}

impl Environment {
    pub fn new(corpus: Arc<dyn Corpus>) -> Self {
        Self {
            corpus,
            labels: LabelTable::with_special_labels(),
            patterns: Vec::new(),
            tree: None,
            global: None,
            within: None,
            alignments: Vec::new(),
            dfa: None,
        }
    }

    pub fn corpus(&self) -> &Arc<dyn Corpus> {
        &self.corpus
    }

    pub fn positional(&self, name: &str) -> Result<Arc<dyn PositionalAttribute>, EvalError> {
        match self.attribute(name, AttributeKind::Positional)? {
            AttributeHandle::Positional(a) => Ok(a),
            _ => Err(unknown_attribute(name, AttributeKind::Positional)),
        }
    }

    pub fn structural(&self, name: &str) -> Result<Arc<dyn StructuralAttribute>, EvalError> {
        match self.attribute(name, AttributeKind::Structural)? {
            AttributeHandle::Structural(a) => Ok(a),
            _ => Err(unknown_attribute(name, AttributeKind::Structural)),
        }
    }

    pub fn alignment(&self, name: &str) -> Result<Arc<dyn AlignmentAttribute>, EvalError> {
        match self.attribute(name, AttributeKind::Alignment)? {
            AttributeHandle::Alignment(a) => Ok(a),
            _ => Err(unknown_attribute(name, AttributeKind::Alignment)),
        }
    }

    /// A missing attribute is a query error; storage failures pass through.
    fn attribute(&self, name: &str, kind: AttributeKind) -> Result<AttributeHandle, EvalError> {
        match self.corpus.lookup_attribute(name, kind) {
            Ok(handle) => Ok(handle),
            Err(CorpusError::NoSuchAttribute { .. }) => Err(unknown_attribute(name, kind)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Define (or look up) a user label.
    pub fn label(&mut self, name: &str) -> LabelId {
        self.labels.define(name, Namespace::User)
    }

    /// Opening tag whose region end is tracked for strict region checks.
    pub fn open_tag(&mut self, attr: &Arc<dyn StructuralAttribute>) -> PatternSlot {
        let boundary = self.labels.define(attr.name(), Namespace::Internal);
        PatternSlot::Tag {
            attr: Arc::clone(attr),
            closing: false,
            value: None,
            right_boundary: Some(boundary),
        }
    }

    pub fn close_tag(&mut self, attr: &Arc<dyn StructuralAttribute>) -> PatternSlot {
        let boundary = self.labels.define(attr.name(), Namespace::Internal);
        PatternSlot::Tag {
            attr: Arc::clone(attr),
            closing: true,
            value: None,
            right_boundary: Some(boundary),
        }
    }

    /// Append a pattern slot, returning its index (the DFA input symbol).
    pub fn add_pattern(&mut self, slot: PatternSlot) -> usize {
        self.patterns.push(slot);
        self.patterns.len() - 1
    }

    pub fn patterns(&self) -> &[PatternSlot] {
        &self.patterns
    }

    pub fn pattern(&self, index: usize) -> Result<&PatternSlot, EvalError> {
        self.patterns.get(index).ok_or(EvalError::IllegalSlot {
            index,
            reason: "no such pattern",
        })
    }

    /// Replace the evaluation tree. Drops the compiled automaton.
    pub fn set_tree(&mut self, tree: EvalTree) {
        self.tree = Some(tree);
        self.dfa = None;
    }

    pub fn tree(&self) -> Option<&EvalTree> {
        self.tree.as_ref()
    }

    pub fn set_global(&mut self, pred: Pred) {
        self.global = Some(pred);
    }

    pub fn global(&self) -> Option<&Pred> {
        self.global.as_ref()
    }

    pub fn set_within(&mut self, context: SearchContext) {
        self.within = Some(context);
    }

    pub fn within(&self) -> Option<&SearchContext> {
        self.within.as_ref()
    }

    pub fn add_alignment(&mut self, constraint: AlignConstraint) {
        self.alignments.push(constraint);
    }

    pub fn alignments(&self) -> &[AlignConstraint] {
        &self.alignments
    }

    /// Compile the automaton of a sequence tree (and of every nested
    /// alignment environment) if it is not up to date.
    pub fn prepare(&mut self, config: &EvalConfig) -> Result<(), EvalError> {
        if self.dfa.is_none()
            && let Some(EvalTree::Seq(seq)) = &self.tree
        {
            let dfa = compile_tree(
                seq,
                self.patterns.len(),
                config.get_max_permutation(),
                &config.get_compile_limits(),
            )?;
            tracing::debug!(
                states = dfa.state_count(),
                slots = dfa.slot_count(),
                "compiled query automaton"
            );
            self.dfa = Some(dfa);
        }
        for constraint in &mut self.alignments {
            constraint.env.prepare(config)?;
        }
        Ok(())
    }

    pub fn dfa(&self) -> Option<&Dfa> {
        self.dfa.as_ref()
    }

    /// Install a hand-built automaton, bypassing the compiler.
    pub fn set_dfa(&mut self, dfa: Dfa) {
        self.dfa = Some(dfa);
    }
}

fn unknown_attribute(name: &str, kind: AttributeKind) -> EvalError {
    EvalError::UnknownAttribute {
        name: name.to_owned(),
        kind,
    }
}
