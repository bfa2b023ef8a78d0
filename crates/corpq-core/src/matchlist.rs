//! Match lists and their set algebra.
//!
//! A match list is a column store: start positions plus optional end,
//! target and keyword columns of the same length. `NO_CPOS` in the start
//! column marks a logically deleted entry; [`MatchList::reduce`] compacts
//! those away. Reduction and sorting are always explicit, so callers can
//! inspect intermediate (unreduced or inverted) lists.
//!
//! An inverted list stands for every position of `[0, corpus_size)` that
//! is *not* listed. Operations that need concrete positions resolve the
//! inversion first.

use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};

use crate::{Cpos, NO_CPOS, Range};

/// Errors from match list operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchListError {
    #[error("match list allocation failed: {0}")]
    AllocationFailed(#[from] TryReserveError),
}

/// One row of a match list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub start: Cpos,
    pub end: Cpos,
    pub target: Cpos,
    pub keyword: Cpos,
}

impl Match {
    /// A single-token match without anchors.
    pub fn at(cpos: Cpos) -> Self {
        Self {
            start: cpos,
            end: cpos,
            target: NO_CPOS,
            keyword: NO_CPOS,
        }
    }

    pub fn span(start: Cpos, end: Cpos) -> Self {
        Self {
            start,
            end,
            target: NO_CPOS,
            keyword: NO_CPOS,
        }
    }
}

/// Ordered set of corpus positions with parallel columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchList {
    start: Vec<Cpos>,
    end: Option<Vec<Cpos>>,
    target: Option<Vec<Cpos>>,
    keyword: Option<Vec<Cpos>>,
    /// Optimisation hint: the list covers every corpus position.
    matches_whole_corpus: bool,
    /// The list enumerates excluded rather than included positions.
    is_inverted: bool,
}

impl MatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start-only list from sorted positions.
    pub fn from_positions(positions: Vec<Cpos>) -> Self {
        debug_assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        Self {
            start: positions,
            ..Self::default()
        }
    }

    /// Every position of the corpus, represented lazily as the complement
    /// of the empty set.
    pub fn whole_corpus() -> Self {
        Self {
            matches_whole_corpus: true,
            is_inverted: true,
            ..Self::default()
        }
    }

    /// List with start and end columns.
    pub fn with_spans(spans: impl IntoIterator<Item = (Cpos, Cpos)>) -> Self {
        let (start, end): (Vec<_>, Vec<_>) = spans.into_iter().unzip();
        Self {
            start,
            end: Some(end),
            ..Self::default()
        }
    }

    /// Number of entries, deleted ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.start.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start.is_empty()
    }

    /// Number of entries not marked deleted.
    pub fn live_count(&self) -> usize {
        self.start.iter().filter(|&&s| s != NO_CPOS).count()
    }

    pub fn is_inverted(&self) -> bool {
        self.is_inverted
    }

    pub fn matches_whole_corpus(&self) -> bool {
        self.matches_whole_corpus
    }

    pub fn has_ends(&self) -> bool {
        self.end.is_some()
    }

    pub fn has_targets(&self) -> bool {
        self.target.is_some()
    }

    pub fn has_keywords(&self) -> bool {
        self.keyword.is_some()
    }

    pub fn starts(&self) -> &[Cpos] {
        &self.start
    }

    /// Row `i`; the end defaults to the start when there is no end column.
    pub fn get(&self, i: usize) -> Option<Match> {
        let start = *self.start.get(i)?;
        Some(Match {
            start,
            end: column(&self.end, i, start),
            target: column(&self.target, i, NO_CPOS),
            keyword: column(&self.keyword, i, NO_CPOS),
        })
    }

    /// Live rows in list order.
    pub fn iter(&self) -> impl Iterator<Item = Match> + '_ {
        (0..self.len())
            .filter_map(|i| self.get(i))
            .filter(|m| m.start != NO_CPOS)
    }

    /// Append a row, allocating all columns the row needs.
    pub fn push(&mut self, m: Match) -> Result<(), MatchListError> {
        let n = self.start.len();
        self.start.try_reserve(1)?;
        if m.end != m.start || self.end.is_some() {
            ensure_column(&mut self.end, &self.start, true)?.push(m.end);
        }
        if m.target != NO_CPOS || self.target.is_some() {
            ensure_column(&mut self.target, &self.start, false)?.push(m.target);
        }
        if m.keyword != NO_CPOS || self.keyword.is_some() {
            ensure_column(&mut self.keyword, &self.start, false)?.push(m.keyword);
        }
        self.start.push(m.start);
        debug_assert!(self.end.as_ref().is_none_or(|c| c.len() == n + 1));
        Ok(())
    }

    /// Mark row `i` deleted.
    #[inline]
    pub fn delete(&mut self, i: usize) {
        self.start[i] = NO_CPOS;
    }

    pub fn set_end(&mut self, i: usize, end: Cpos) -> Result<(), MatchListError> {
        ensure_column(&mut self.end, &self.start, true)?[i] = end;
        Ok(())
    }

    pub fn set_target(&mut self, i: usize, target: Cpos) -> Result<(), MatchListError> {
        ensure_column(&mut self.target, &self.start, false)?[i] = target;
        Ok(())
    }

    pub fn set_keyword(&mut self, i: usize, keyword: Cpos) -> Result<(), MatchListError> {
        ensure_column(&mut self.keyword, &self.start, false)?[i] = keyword;
        Ok(())
    }

    /// Compact away deleted entries in a single forward pass.
    pub fn reduce(&mut self) {
        let mut write = 0;
        for read in 0..self.start.len() {
            if self.start[read] == NO_CPOS {
                continue;
            }
            if read != write {
                self.start[write] = self.start[read];
                for col in [&mut self.end, &mut self.target, &mut self.keyword]
                    .into_iter()
                    .flatten()
                {
                    col[write] = col[read];
                }
            }
            write += 1;
        }
        self.truncate(write);
    }

    /// Keep the first `n` entries.
    pub fn truncate(&mut self, n: usize) {
        self.start.truncate(n);
        for col in [&mut self.end, &mut self.target, &mut self.keyword]
            .into_iter()
            .flatten()
        {
            col.truncate(n);
        }
    }

    /// Sort by start and drop duplicate starts; the first-seen row of a
    /// duplicate run wins. Deleted entries are removed as well.
    pub fn sort_dedup(&mut self) {
        let mut rows: Vec<Match> = self.iter().collect();
        rows.sort_by_key(|m| m.start);
        rows.dedup_by_key(|m| m.start);
        self.rebuild(rows);
    }

    /// Starts strictly increasing, no deleted entries.
    pub fn is_reduced(&self) -> bool {
        self.start.iter().all(|&s| s != NO_CPOS) && self.start.windows(2).all(|w| w[0] < w[1])
    }

    /// Logical complement, applied lazily by flipping the inversion flag.
    pub fn complement(&mut self) {
        self.is_inverted = !self.is_inverted;
        self.matches_whole_corpus = self.is_inverted && self.live_count() == 0;
    }

    /// Turn an inverted list into the concrete list of included positions.
    ///
    /// The result is reduced and carries only the start column.
    pub fn resolve(&mut self, corpus_size: usize) -> Result<(), MatchListError> {
        if !self.is_inverted {
            return Ok(());
        }
        self.reduce();
        let size = corpus_size as Cpos;
        let mut excluded: Vec<Cpos> = self.start.iter().copied().filter(|&s| s < size).collect();
        excluded.sort_unstable();
        excluded.dedup();

        let mut out = Vec::new();
        out.try_reserve_exact(corpus_size.saturating_sub(excluded.len()))?;
        let mut ex = excluded.iter().peekable();
        for cpos in 0..size {
            if ex.peek() == Some(&&cpos) {
                ex.next();
            } else {
                out.push(cpos);
            }
        }

        *self = Self {
            matches_whole_corpus: excluded.is_empty(),
            ..Self::from_positions(out)
        };
        Ok(())
    }

    /// Merge `other` into `self`. Both must be reduced (or inverted, in
    /// which case they are resolved first). Duplicate starts keep the row
    /// from `self`.
    pub fn union(&mut self, mut other: MatchList, corpus_size: usize) -> Result<(), MatchListError> {
        self.resolve(corpus_size)?;
        other.resolve(corpus_size)?;
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }

        let mut rows = Vec::new();
        rows.try_reserve(self.len() + other.len())?;
        let (mut i, mut j) = (0, 0);
        let (a, b) = (&self.start, &other.start);
        while i < a.len() || j < b.len() {
            let row = match (a.get(i), b.get(j)) {
                (Some(&x), Some(&y)) if x == y => {
                    j += 1;
                    i += 1;
                    self.get(i - 1)
                }
                (Some(&x), Some(&y)) if x < y => {
                    i += 1;
                    self.get(i - 1)
                }
                (Some(_), None) => {
                    i += 1;
                    self.get(i - 1)
                }
                _ => {
                    j += 1;
                    other.get(j - 1)
                }
            };
            if let Some(row) = row
                && row.start != NO_CPOS
            {
                rows.push(row);
            }
        }

        let whole = self.matches_whole_corpus || other.matches_whole_corpus;
        let keep_ends = self.has_ends() || other.has_ends();
        let keep_targets = self.has_targets() || other.has_targets();
        let keep_keywords = self.has_keywords() || other.has_keywords();
        self.rebuild(rows);
        self.force_columns(keep_ends, keep_targets, keep_keywords);
        self.matches_whole_corpus = whole;
        Ok(())
    }

    /// Keep only starts present in both lists; columns come from `self`.
    pub fn intersect(
        &mut self,
        mut other: MatchList,
        corpus_size: usize,
    ) -> Result<(), MatchListError> {
        self.resolve(corpus_size)?;
        other.resolve(corpus_size)?;
        let b = &other.start;
        let mut j = 0;
        for i in 0..self.start.len() {
            let s = self.start[i];
            if s == NO_CPOS {
                continue;
            }
            while j < b.len() && b[j] < s {
                j += 1;
            }
            if j >= b.len() || b[j] != s {
                self.start[i] = NO_CPOS;
            }
        }
        self.reduce();
        self.matches_whole_corpus &= other.matches_whole_corpus;
        Ok(())
    }

    /// Delete every entry whose start lies outside all of `ranges`.
    ///
    /// Both the list and `ranges` must be sorted by start; the sweep is a
    /// single two-pointer pass. The list is not reduced afterwards.
    pub fn mark_off_ranges(&mut self, ranges: &[Range]) {
        let mut r = 0;
        let mut deleted = false;
        for s in self.start.iter_mut() {
            if *s == NO_CPOS {
                continue;
            }
            while r < ranges.len() && ranges[r].end < *s {
                r += 1;
            }
            if r >= ranges.len() || !ranges[r].contains(*s) {
                *s = NO_CPOS;
                deleted = true;
            }
        }
        if deleted {
            self.matches_whole_corpus = false;
        }
    }

    /// Resolve, mark off everything outside `ranges`, and reduce.
    pub fn restrict_to(
        &mut self,
        ranges: &[Range],
        corpus_size: usize,
    ) -> Result<(), MatchListError> {
        self.resolve(corpus_size)?;
        self.mark_off_ranges(ranges);
        self.reduce();
        Ok(())
    }

    fn rebuild(&mut self, rows: Vec<Match>) {
        let has_ends = rows.iter().any(|m| m.end != m.start);
        let has_targets = rows.iter().any(|m| m.target != NO_CPOS);
        let has_keywords = rows.iter().any(|m| m.keyword != NO_CPOS);
        self.start = rows.iter().map(|m| m.start).collect();
        self.end = (has_ends || self.end.is_some()).then(|| rows.iter().map(|m| m.end).collect());
        self.target = (has_targets || self.target.is_some())
            .then(|| rows.iter().map(|m| m.target).collect());
        self.keyword = (has_keywords || self.keyword.is_some())
            .then(|| rows.iter().map(|m| m.keyword).collect());
    }

    fn force_columns(&mut self, ends: bool, targets: bool, keywords: bool) {
        if ends && self.end.is_none() {
            self.end = Some(self.start.clone());
        }
        if targets && self.target.is_none() {
            self.target = Some(vec![NO_CPOS; self.start.len()]);
        }
        if keywords && self.keyword.is_none() {
            self.keyword = Some(vec![NO_CPOS; self.start.len()]);
        }
    }
}

fn column(col: &Option<Vec<Cpos>>, i: usize, default: Cpos) -> Cpos {
    col.as_ref().and_then(|c| c.get(i).copied()).unwrap_or(default)
}

/// Materialise an optional column. End columns default to the starts,
/// anchor columns to `NO_CPOS`.
fn ensure_column<'a>(
    col: &'a mut Option<Vec<Cpos>>,
    start: &[Cpos],
    copy_starts: bool,
) -> Result<&'a mut Vec<Cpos>, MatchListError> {
    let created = col.is_none();
    let col = col.get_or_insert_with(Vec::new);
    if created {
        col.try_reserve_exact(start.len() + 1)?;
        if copy_starts {
            col.extend_from_slice(start);
        } else {
            col.resize(start.len(), NO_CPOS);
        }
    }
    col.try_reserve(1)?;
    Ok(col)
}
