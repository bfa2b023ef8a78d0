#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core data structures for corpq.
//!
//! Three layers:
//! - **Corpus access**: the narrow attribute API the evaluator consumes
//!   (`Corpus`, positional/structural/alignment attributes, `SubCorpus`)
//! - **Match lists**: ordered position sets and their set algebra
//! - **Label tables**: label symbol table plus per-thread binding vectors
//!
//! `mem` provides an in-memory `Corpus` used by tests and small tools.

use serde::{Deserialize, Serialize};

pub mod corpus;
pub mod labels;
pub mod matchlist;
pub mod mem;
pub mod regex;

mod invariants;

#[cfg(test)]
mod regex_tests;

pub use corpus::{
    AlignmentAttribute, AttributeHandle, AttributeKind, Bead, Corpus, CorpusError,
    CorpusRegistry, PositionalAttribute, Region, StructuralAttribute, SubCorpus,
};
pub use labels::{Bindings, LabelError, LabelId, LabelTable, Namespace, SlotRef, SpecialLabel};
pub use matchlist::{Match, MatchList, MatchListError};
pub use mem::{MemCorpus, MemCorpusBuilder, MemRegistry};
pub use regex::{RegexError, RegexFlags, TokenRegex};

/// Corpus position: zero-based token index.
///
/// Kept as a signed integer because match lists use [`NO_CPOS`] to mark
/// deleted entries and unbound labels.
pub type Cpos = i32;

/// "Undefined / not applicable" corpus position.
pub const NO_CPOS: Cpos = -1;

/// Lexicon id of a positional attribute value.
pub type LexId = u32;

/// Closed interval `[start, end]` of corpus positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Cpos,
    pub end: Cpos,
}

impl Range {
    pub fn new(start: Cpos, end: Cpos) -> Self {
        Self { start, end }
    }

    /// Whether `cpos` lies inside the interval. Always false for [`NO_CPOS`].
    #[inline]
    pub fn contains(&self, cpos: Cpos) -> bool {
        cpos >= 0 && self.start <= cpos && cpos <= self.end
    }

    /// Number of tokens covered.
    #[inline]
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
