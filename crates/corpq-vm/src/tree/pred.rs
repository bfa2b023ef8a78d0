//! Predicate trees: per-token boolean constraints.

use std::fmt;
use std::sync::Arc;

use corpq_core::{
    LexId, PositionalAttribute, RegexError, RegexFlags, SlotRef, StructuralAttribute, TokenRegex,
};

use crate::engine::functions::Function;

/// Relational operator of a comparison node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Unary `?`: is the operand defined (or, for booleans and integers, true).
    Exists,
}

impl CmpOp {
    /// Operators that order their operands.
    pub fn is_ordering(self) -> bool {
        matches!(self, CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Exists => "?",
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Leaf of a comparison.
#[derive(Clone)]
pub enum Operand {
    /// Positional attribute value at a position (`word`, `a.word`).
    Attr {
        attr: Arc<dyn PositionalAttribute>,
        at: SlotRef,
    },
    /// Region of a structural attribute enclosing a position (`_.s`, `a.np_head`).
    Region {
        attr: Arc<dyn StructuralAttribute>,
        at: SlotRef,
    },
    /// The position a label (or `_`) refers to.
    Position(SlotRef),
    Call {
        func: Function,
        args: Vec<Operand>,
    },
    Str(String),
    Int(i64),
    Float(f64),
    Regex(TokenRegex),
    /// Literal resolved against the attribute's lexicon up front;
    /// `None` if the string does not occur.
    LexId(Option<LexId>),
}

impl Operand {
    /// Attribute value at the current position.
    pub fn attr(attr: &Arc<dyn PositionalAttribute>) -> Self {
        Operand::Attr {
            attr: Arc::clone(attr),
            at: SlotRef::Current,
        }
    }

    pub fn attr_at(attr: &Arc<dyn PositionalAttribute>, at: SlotRef) -> Self {
        Operand::Attr {
            attr: Arc::clone(attr),
            at,
        }
    }

    pub fn region(attr: &Arc<dyn StructuralAttribute>, at: SlotRef) -> Self {
        Operand::Region {
            attr: Arc::clone(attr),
            at,
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Operand::Str(s.into())
    }

    pub fn regex(pattern: &str, flags: RegexFlags) -> Result<Self, RegexError> {
        TokenRegex::new(pattern, flags).map(Operand::Regex)
    }

    /// String literal resolved to a lexicon id of `attr`.
    pub fn lexicon_id(attr: &Arc<dyn PositionalAttribute>, value: &str) -> Self {
        Operand::LexId(attr.str_to_id(value))
    }

    pub fn call(func: Function, args: Vec<Operand>) -> Self {
        Operand::Call { func, args }
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Attr { attr, at } => write!(f, "{}@{at:?}", attr.name()),
            Operand::Region { attr, at } => write!(f, "<{}>@{at:?}", attr.name()),
            Operand::Position(at) => write!(f, "pos@{at:?}"),
            Operand::Call { func, args } => write!(f, "{}{args:?}", func.name()),
            Operand::Str(s) => write!(f, "{s:?}"),
            Operand::Int(i) => write!(f, "{i}"),
            Operand::Float(x) => write!(f, "{x}"),
            Operand::Regex(re) => write!(f, "{re:?}"),
            Operand::LexId(id) => write!(f, "lexid({id:?})"),
        }
    }
}

/// Boolean constraint tree, evaluated at one corpus position.
#[derive(Clone, Debug)]
pub enum Pred {
    And(Box<Pred>, Box<Pred>),
    Or(Box<Pred>, Box<Pred>),
    Implies(Box<Pred>, Box<Pred>),
    /// `Not(None)` is vacuously true ("no constraint").
    Not(Option<Box<Pred>>),
    Cmp {
        op: CmpOp,
        left: Operand,
        /// Absent for [`CmpOp::Exists`].
        right: Option<Operand>,
    },
    /// Membership of the attribute's lexicon id in a sorted id list.
    IdList {
        attr: Arc<dyn PositionalAttribute>,
        at: SlotRef,
        ids: Vec<LexId>,
        negated: bool,
    },
}

impl Pred {
    pub fn and(l: Pred, r: Pred) -> Self {
        Pred::And(Box::new(l), Box::new(r))
    }

    pub fn or(l: Pred, r: Pred) -> Self {
        Pred::Or(Box::new(l), Box::new(r))
    }

    pub fn implies(l: Pred, r: Pred) -> Self {
        Pred::Implies(Box::new(l), Box::new(r))
    }

    pub fn not(p: Pred) -> Self {
        Pred::Not(Some(Box::new(p)))
    }

    /// The empty constraint `[]`.
    pub fn always() -> Self {
        Pred::Not(None)
    }

    pub fn cmp(left: Operand, op: CmpOp, right: Operand) -> Self {
        Pred::Cmp {
            op,
            left,
            right: Some(right),
        }
    }

    pub fn exists(operand: Operand) -> Self {
        Pred::Cmp {
            op: CmpOp::Exists,
            left: operand,
            right: None,
        }
    }

    /// `attr = "value"` at the current position.
    pub fn attr_eq(attr: &Arc<dyn PositionalAttribute>, value: &str) -> Self {
        Pred::cmp(Operand::attr(attr), CmpOp::Eq, Operand::str(value))
    }

    /// `attr = "v1" | "v2" | ...` resolved to a sorted id list. Values
    /// missing from the lexicon are dropped.
    pub fn id_list(attr: &Arc<dyn PositionalAttribute>, values: &[&str], negated: bool) -> Self {
        let mut ids: Vec<LexId> = values.iter().filter_map(|v| attr.str_to_id(v)).collect();
        ids.sort_unstable();
        ids.dedup();
        Pred::IdList {
            attr: Arc::clone(attr),
            at: SlotRef::Current,
            ids,
            negated,
        }
    }
}
