//! Pattern slots: the input alphabet of the query automaton.

use std::sync::Arc;

use corpq_core::{Cpos, LabelId, StructuralAttribute, TokenRegex};

use super::pred::Pred;

/// Anchor a matching token sets (`@` / `@1` markers).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnchorKind {
    #[default]
    None,
    Target,
    Keyword,
}

/// Field of the query corpus an [`PatternSlot::Anchor`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Match,
    MatchEnd,
    Target,
    Keyword,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Match => "match",
            Field::MatchEnd => "matchend",
            Field::Target => "target",
            Field::Keyword => "keyword",
        }
    }
}

/// Value constraint of a structural tag, e.g. `<s id="a.*">`.
#[derive(Clone, Debug)]
pub struct TagValue {
    pub regex: TokenRegex,
    pub negated: bool,
}

/// One symbol of the token-sequence regex.
#[derive(Clone, Debug)]
pub enum PatternSlot {
    /// Ordinary token constraint `[...]`.
    Pattern {
        pred: Pred,
        label: Option<LabelId>,
        anchor: AnchorKind,
        /// Zero-width: tests the position without consuming it.
        lookahead: bool,
    },
    /// `<s>` or `</s>`.
    Tag {
        attr: Arc<dyn StructuralAttribute>,
        closing: bool,
        value: Option<TagValue>,
        /// Internal label holding the end of the opened region.
        right_boundary: Option<LabelId>,
    },
    /// `<match>`, `</match>`, `<target>`, ... inside subqueries.
    Anchor { field: Field, closing: bool },
    /// `[]`.
    MatchAll {
        label: Option<LabelId>,
        anchor: AnchorKind,
    },
}

impl PatternSlot {
    pub fn pattern(pred: Pred) -> Self {
        PatternSlot::Pattern {
            pred,
            label: None,
            anchor: AnchorKind::None,
            lookahead: false,
        }
    }

    pub fn labelled(pred: Pred, label: LabelId) -> Self {
        PatternSlot::Pattern {
            pred,
            label: Some(label),
            anchor: AnchorKind::None,
            lookahead: false,
        }
    }

    pub fn lookahead(pred: Pred) -> Self {
        PatternSlot::Pattern {
            pred,
            label: None,
            anchor: AnchorKind::None,
            lookahead: true,
        }
    }

    pub fn match_all() -> Self {
        PatternSlot::MatchAll {
            label: None,
            anchor: AnchorKind::None,
        }
    }

    pub fn open_tag(attr: &Arc<dyn StructuralAttribute>) -> Self {
        PatternSlot::Tag {
            attr: Arc::clone(attr),
            closing: false,
            value: None,
            right_boundary: None,
        }
    }

    pub fn close_tag(attr: &Arc<dyn StructuralAttribute>) -> Self {
        PatternSlot::Tag {
            attr: Arc::clone(attr),
            closing: true,
            value: None,
            right_boundary: None,
        }
    }

    /// Set the anchor of a `Pattern` or `MatchAll` slot; no-op otherwise.
    pub fn with_anchor(mut self, kind: AnchorKind) -> Self {
        if let PatternSlot::Pattern { anchor, .. } | PatternSlot::MatchAll { anchor, .. } = &mut self
        {
            *anchor = kind;
        }
        self
    }

    /// Tags, anchors and lookahead patterns do not consume a token.
    pub fn is_zero_width(&self) -> bool {
        match self {
            PatternSlot::Pattern { lookahead, .. } => *lookahead,
            PatternSlot::Tag { .. } | PatternSlot::Anchor { .. } => true,
            PatternSlot::MatchAll { .. } => false,
        }
    }

    /// Position the slot actually tests: closing tags and anchors look
    /// at the token before the current one.
    pub fn effective_position(&self, cpos: Cpos) -> Cpos {
        match self {
            PatternSlot::Tag { closing: true, .. } | PatternSlot::Anchor { closing: true, .. } => {
                cpos - 1
            }
            _ => cpos,
        }
    }

    pub fn label(&self) -> Option<LabelId> {
        match self {
            PatternSlot::Pattern { label, .. } | PatternSlot::MatchAll { label, .. } => *label,
            _ => None,
        }
    }

    pub fn anchor(&self) -> AnchorKind {
        match self {
            PatternSlot::Pattern { anchor, .. } | PatternSlot::MatchAll { anchor, .. } => *anchor,
            _ => AnchorKind::None,
        }
    }
}
