//! Corpus access API consumed by the evaluator.
//!
//! The storage layer is external; the evaluator only sees these traits.
//! "Not found" is a normal value (`None`, empty list). The only error a
//! lookup may raise is a genuine storage failure.

use std::fmt;
use std::sync::Arc;

use crate::matchlist::MatchList;
use crate::regex::TokenRegex;
use crate::{Cpos, LexId, NO_CPOS, Range};

/// Errors raised by the corpus access layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusError {
    #[error("corpus `{corpus}` has no {kind} attribute `{name}`")]
    NoSuchAttribute {
        corpus: String,
        name: String,
        kind: AttributeKind,
    },

    #[error("storage failure on attribute `{attribute}`: {message}")]
    Storage { attribute: String, message: String },

    #[error("inconsistent corpus data: {0}")]
    Inconsistent(String),
}

/// The three attribute kinds a corpus exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Positional,
    Structural,
    Alignment,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttributeKind::Positional => "positional",
            AttributeKind::Structural => "structural",
            AttributeKind::Alignment => "alignment",
        })
    }
}

/// One value per token, backed by a lexicon.
pub trait PositionalAttribute {
    fn name(&self) -> &str;

    fn lexicon_size(&self) -> usize;

    fn str_to_id(&self, value: &str) -> Option<LexId>;

    fn id_to_str(&self, id: LexId) -> Option<&str>;

    /// Corpus frequency of a lexicon entry; 0 for unknown ids.
    fn id_to_freq(&self, id: LexId) -> usize;

    fn cpos_to_id(&self, cpos: Cpos) -> Option<LexId>;

    fn cpos_to_str(&self, cpos: Cpos) -> Option<&str> {
        self.cpos_to_id(cpos).and_then(|id| self.id_to_str(id))
    }

    /// Sorted positions of one lexicon entry.
    fn id_to_positions(&self, id: LexId) -> Result<Vec<Cpos>, CorpusError>;

    /// Sorted, deduplicated positions of several lexicon entries.
    ///
    /// `ids` need not be sorted.
    fn ids_to_positions(&self, ids: &[LexId]) -> Result<Vec<Cpos>, CorpusError> {
        let mut out = Vec::new();
        for &id in ids {
            out.extend(self.id_to_positions(id)?);
        }
        out.sort_unstable();
        out.dedup();
        Ok(out)
    }

    /// Lexicon ids whose value matches `regex`, in ascending order.
    fn regex_to_ids(&self, regex: &TokenRegex) -> Vec<LexId> {
        (0..self.lexicon_size() as LexId)
            .filter(|&id| self.id_to_str(id).is_some_and(|s| regex.is_match(s)))
            .collect()
    }
}

/// A region of a structural attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub index: usize,
    pub start: Cpos,
    pub end: Cpos,
}

impl Region {
    pub fn range(&self) -> Range {
        Range::new(self.start, self.end)
    }
}

/// Non-overlapping regions (sentences, paragraphs, ...), optionally annotated.
pub trait StructuralAttribute {
    fn name(&self) -> &str;

    fn region_count(&self) -> usize;

    fn region(&self, index: usize) -> Option<Region>;

    /// Region enclosing `cpos`.
    fn region_at(&self, cpos: Cpos) -> Option<Region>;

    /// Annotated value of a region; `None` if the attribute has no values.
    fn region_value(&self, index: usize) -> Option<&str>;

    fn has_values(&self) -> bool;
}

/// One alignment bead: a source region paired with a target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bead {
    pub source: Range,
    pub target: Range,
}

/// Sentence-level alignment to another corpus.
pub trait AlignmentAttribute {
    fn name(&self) -> &str;

    /// Name of the aligned (target) corpus.
    fn target_corpus(&self) -> &str;

    /// Bead whose source region contains `cpos`.
    fn bead_at(&self, cpos: Cpos) -> Option<Bead>;
}

impl fmt::Debug for dyn PositionalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionalAttribute({})", self.name())
    }
}

impl fmt::Debug for dyn StructuralAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StructuralAttribute({})", self.name())
    }
}

impl fmt::Debug for dyn AlignmentAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AlignmentAttribute({})", self.name())
    }
}

/// Attribute handle returned by [`Corpus::lookup_attribute`].
///
/// Handles are cheap to clone and are resolved once per query session.
#[derive(Debug, Clone)]
pub enum AttributeHandle {
    Positional(Arc<dyn PositionalAttribute>),
    Structural(Arc<dyn StructuralAttribute>),
    Alignment(Arc<dyn AlignmentAttribute>),
}

/// A statically indexed corpus.
pub trait Corpus {
    fn name(&self) -> &str;

    /// Number of tokens.
    fn size(&self) -> usize;

    fn positional(&self, name: &str) -> Option<Arc<dyn PositionalAttribute>>;

    fn structural(&self, name: &str) -> Option<Arc<dyn StructuralAttribute>>;

    fn alignment(&self, name: &str) -> Option<Arc<dyn AlignmentAttribute>>;

    fn lookup_attribute(
        &self,
        name: &str,
        kind: AttributeKind,
    ) -> Result<AttributeHandle, CorpusError> {
        let handle = match kind {
            AttributeKind::Positional => self.positional(name).map(AttributeHandle::Positional),
            AttributeKind::Structural => self.structural(name).map(AttributeHandle::Structural),
            AttributeKind::Alignment => self.alignment(name).map(AttributeHandle::Alignment),
        };
        handle.ok_or_else(|| CorpusError::NoSuchAttribute {
            corpus: self.name().to_owned(),
            name: name.to_owned(),
            kind,
        })
    }
}

impl fmt::Debug for dyn Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Corpus({}, {} tokens)", self.name(), self.size())
    }
}

/// Resolves corpus names, e.g. the target side of an alignment.
pub trait CorpusRegistry {
    fn corpus(&self, name: &str) -> Option<Arc<dyn Corpus>>;
}

/// A query corpus: a corpus restricted to a sorted list of disjoint ranges,
/// optionally carrying target and keyword anchors per range.
///
/// Query results are committed back into it, replacing (or extending) the
/// ranges.
#[derive(Debug, Clone)]
pub struct SubCorpus {
    name: String,
    corpus: Arc<dyn Corpus>,
    ranges: Vec<Range>,
    targets: Option<Vec<Cpos>>,
    keywords: Option<Vec<Cpos>>,
}

impl SubCorpus {
    /// The unrestricted corpus: a single range covering every token.
    pub fn whole(corpus: Arc<dyn Corpus>) -> Self {
        let size = corpus.size() as Cpos;
        let ranges = if size > 0 {
            vec![Range::new(0, size - 1)]
        } else {
            Vec::new()
        };
        Self {
            name: corpus.name().to_owned(),
            corpus,
            ranges,
            targets: None,
            keywords: None,
        }
    }

    /// A named subcorpus. Ranges are sorted by start.
    pub fn with_ranges(name: impl Into<String>, corpus: Arc<dyn Corpus>, ranges: Vec<Range>) -> Self {
        let mut ranges = ranges;
        ranges.sort();
        Self {
            name: name.into(),
            corpus,
            ranges,
            targets: None,
            keywords: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn corpus(&self) -> &Arc<dyn Corpus> {
        &self.corpus
    }

    /// Size of the unrestricted parent corpus.
    pub fn mother_size(&self) -> usize {
        self.corpus.size()
    }

    /// Number of ranges.
    pub fn size(&self) -> usize {
        self.ranges.len()
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn targets(&self) -> Option<&[Cpos]> {
        self.targets.as_deref()
    }

    pub fn keywords(&self) -> Option<&[Cpos]> {
        self.keywords.as_deref()
    }

    pub fn set_targets(&mut self, targets: Vec<Cpos>) {
        debug_assert_eq!(targets.len(), self.ranges.len());
        self.targets = Some(targets);
    }

    pub fn set_keywords(&mut self, keywords: Vec<Cpos>) {
        debug_assert_eq!(keywords.len(), self.ranges.len());
        self.keywords = Some(keywords);
    }

    /// Index of the range containing `cpos`.
    pub fn range_index_at(&self, cpos: Cpos) -> Option<usize> {
        if cpos < 0 {
            return None;
        }
        let idx = self.ranges.partition_point(|r| r.start <= cpos);
        let idx = idx.checked_sub(1)?;
        self.ranges[idx].contains(cpos).then_some(idx)
    }

    /// Anchor value of range `index` (`NO_CPOS` if the column is absent).
    pub fn target_at(&self, index: usize) -> Cpos {
        self.targets
            .as_ref()
            .and_then(|t| t.get(index).copied())
            .unwrap_or(NO_CPOS)
    }

    pub fn keyword_at(&self, index: usize) -> Cpos {
        self.keywords
            .as_ref()
            .and_then(|k| k.get(index).copied())
            .unwrap_or(NO_CPOS)
    }

    /// Replace the ranges with a reduced match list.
    ///
    /// With `keep_old_ranges`, the previous ranges are kept and the new
    /// matches are merged in (previous entries win on equal starts).
    pub fn commit(&mut self, matches: &MatchList, keep_old_ranges: bool) {
        let mut merged: Vec<(Range, Cpos, Cpos)> = Vec::new();
        if keep_old_ranges {
            for (i, r) in self.ranges.iter().enumerate() {
                merged.push((*r, self.target_at(i), self.keyword_at(i)));
            }
        }
        let has_targets = matches.has_targets() || (keep_old_ranges && self.targets.is_some());
        let has_keywords = matches.has_keywords() || (keep_old_ranges && self.keywords.is_some());

        for m in matches.iter() {
            merged.push((Range::new(m.start, m.end), m.target, m.keyword));
        }
        // stable: old ranges precede new ones with the same start
        merged.sort_by_key(|(r, _, _)| r.start);
        merged.dedup_by_key(|(r, _, _)| r.start);

        self.ranges = merged.iter().map(|(r, _, _)| *r).collect();
        self.targets = has_targets.then(|| merged.iter().map(|(_, t, _)| *t).collect());
        self.keywords = has_keywords.then(|| merged.iter().map(|(_, _, k)| *k).collect());
    }
}
