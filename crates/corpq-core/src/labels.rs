//! Label symbol table and per-thread binding vectors.
//!
//! Label names are interned into small integer handles (`LabelId`), split
//! into two namespaces: labels the query author wrote, and internal labels
//! the compiler allocates (e.g. right boundaries of opened regions).
//!
//! Each simulation thread owns a [`Bindings`] vector indexed by `LabelId`.
//! Vectors are fixed-size and copied wholesale when a transition is taken,
//! so parallel threads never share label state.

use std::collections::HashMap;
use std::fmt;

use crate::invariants::ensure_same_len;
use crate::{Cpos, NO_CPOS};

/// Errors from label lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    /// Indices are compiler-assigned, so this is an internal invariant violation.
    #[error("label index {index} out of range (table has {len} labels)")]
    OutOfRange { index: u32, len: usize },

    #[error("undefined label `{0}`")]
    Undefined(String),
}

/// Label namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Labels visible to the query author.
    User,
    /// Compiler-generated bookkeeping labels.
    Internal,
}

/// A lightweight handle to a label.
///
/// Handles are ordered by definition order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LabelId(u32);

impl LabelId {
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Create from a raw index. Use only for deserialization and tests.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

/// Reference to a position: either the implicit current position (`_`)
/// or a label. Keeps "current position" distinct from "unbound label".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SlotRef {
    Current,
    Label(LabelId),
}

/// Labels every environment defines up front.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SpecialLabel {
    Match,
    MatchEnd,
    Target,
    Keyword,
}

impl SpecialLabel {
    pub const ALL: [SpecialLabel; 4] = [
        SpecialLabel::Match,
        SpecialLabel::MatchEnd,
        SpecialLabel::Target,
        SpecialLabel::Keyword,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialLabel::Match => "match",
            SpecialLabel::MatchEnd => "matchend",
            SpecialLabel::Target => "target",
            SpecialLabel::Keyword => "keyword",
        }
    }
}

#[derive(Debug, Clone)]
struct LabelInfo {
    name: String,
    namespace: Namespace,
}

/// Label symbol table.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    map: HashMap<(Namespace, String), LabelId>,
    labels: Vec<LabelInfo>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the special labels, in [`SpecialLabel::ALL`] order.
    pub fn with_special_labels() -> Self {
        let mut table = Self::new();
        for special in SpecialLabel::ALL {
            table.define(special.name(), Namespace::User);
        }
        table
    }

    /// Define a label, returning the existing handle if already defined.
    pub fn define(&mut self, name: &str, namespace: Namespace) -> LabelId {
        if let Some(&id) = self.map.get(&(namespace, name.to_owned())) {
            return id;
        }

        let id = LabelId(self.labels.len() as u32);
        self.labels.push(LabelInfo {
            name: name.to_owned(),
            namespace,
        });
        self.map.insert((namespace, name.to_owned()), id);
        id
    }

    pub fn lookup(&self, name: &str, namespace: Namespace) -> Option<LabelId> {
        self.map.get(&(namespace, name.to_owned())).copied()
    }

    /// Lookup that reports an undefined user label as an error.
    pub fn require(&self, name: &str) -> Result<LabelId, LabelError> {
        self.lookup(name, Namespace::User)
            .ok_or_else(|| LabelError::Undefined(name.to_owned()))
    }

    pub fn special(&self, label: SpecialLabel) -> Option<LabelId> {
        self.lookup(label.name(), Namespace::User)
    }

    /// Name of a label.
    ///
    /// # Panics
    /// Panics if the handle was not created by this table.
    #[inline]
    pub fn resolve(&self, id: LabelId) -> &str {
        &self.labels[id.index()].name
    }

    pub fn try_resolve(&self, id: LabelId) -> Option<&str> {
        self.labels.get(id.index()).map(|l| l.name.as_str())
    }

    pub fn namespace(&self, id: LabelId) -> Option<Namespace> {
        self.labels.get(id.index()).map(|l| l.namespace)
    }

    /// Number of labels across both namespaces; the size of every binding vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LabelId, &str, Namespace)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (LabelId(i as u32), l.name.as_str(), l.namespace))
    }

    /// Labels of one namespace.
    pub fn iter_namespace(&self, namespace: Namespace) -> impl Iterator<Item = LabelId> + '_ {
        self.iter()
            .filter(move |(_, _, ns)| *ns == namespace)
            .map(|(id, _, _)| id)
    }

    /// Fresh binding vector sized to this table, every label unbound.
    pub fn new_bindings(&self) -> Bindings {
        Bindings::new(self.len())
    }
}

/// Per-thread label bindings: one position per label, `NO_CPOS` = unbound.
#[derive(Clone, PartialEq, Eq)]
pub struct Bindings(Vec<Cpos>);

impl Bindings {
    pub fn new(size: usize) -> Self {
        Self(vec![NO_CPOS; size])
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overwrite with `other`. Both vectors come from the same table.
    #[inline]
    pub fn copy_from(&mut self, other: &Bindings) {
        ensure_same_len(self.0.len(), other.0.len());
        self.0.copy_from_slice(&other.0);
    }

    /// Unbind every label.
    pub fn reset(&mut self) {
        self.0.fill(NO_CPOS);
    }

    /// Position a slot reference points at; `current` answers [`SlotRef::Current`].
    #[inline]
    pub fn resolve(&self, slot: SlotRef, current: Cpos) -> Result<Cpos, LabelError> {
        match slot {
            SlotRef::Current => Ok(current),
            SlotRef::Label(id) => self.get(id),
        }
    }

    #[inline]
    pub fn get(&self, id: LabelId) -> Result<Cpos, LabelError> {
        self.0
            .get(id.index())
            .copied()
            .ok_or(LabelError::OutOfRange {
                index: id.0,
                len: self.0.len(),
            })
    }

    #[inline]
    pub fn set(&mut self, id: LabelId, cpos: Cpos) -> Result<(), LabelError> {
        let len = self.0.len();
        let slot = self.0.get_mut(id.index()).ok_or(LabelError::OutOfRange {
            index: id.0,
            len,
        })?;
        *slot = cpos;
        Ok(())
    }

    pub fn is_bound(&self, id: LabelId) -> bool {
        self.get(id).is_ok_and(|c| c != NO_CPOS)
    }

    pub fn as_slice(&self) -> &[Cpos] {
        &self.0
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}
