//! Runtime values of predicate operands.

use std::borrow::Cow;
use std::fmt;

use corpq_core::{Cpos, LexId, PositionalAttribute, Region, StructuralAttribute, TokenRegex};

use super::error::EvalError;
use crate::tree::CmpOp;

/// Result of evaluating an [`Operand`](crate::tree::Operand).
///
/// Values borrow attribute handles and literals from the predicate tree,
/// so strings are only materialised when a comparison needs them.
#[derive(Clone)]
pub enum Value<'e> {
    /// Unbound label, position outside the corpus, missing region, ...
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Cpos(Cpos),
    Str(Cow<'e, str>),
    /// Attribute reference: the lexicon entry found at a position.
    Token {
        attr: &'e dyn PositionalAttribute,
        id: LexId,
    },
    /// Region enclosing `cpos`.
    Region {
        attr: &'e dyn StructuralAttribute,
        region: Region,
        cpos: Cpos,
    },
    Regex(&'e TokenRegex),
    /// Lexicon id constant; `None` never equals a real id.
    LexId(Option<LexId>),
}

impl<'e> Value<'e> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Cpos(_) => "position",
            Value::Str(_) => "string",
            Value::Token { .. } => "attribute value",
            Value::Region { .. } => "region",
            Value::Regex(_) => "regex",
            Value::LexId(_) => "lexicon id",
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Truth value of a bare operand (`[f(word)]`, `[_.s]`, `[a]`).
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(x) => *x != 0.0,
            _ => true,
        }
    }

    /// String view after the attribute-reference to string conversion.
    pub fn as_str(&self) -> Option<&'e str> {
        match self {
            Value::Str(Cow::Borrowed(s)) => Some(*s),
            Value::Token { attr, id } => attr.id_to_str(*id),
            Value::Region { attr, region, .. } => attr.region_value(region.index),
            _ => None,
        }
    }

    /// Like [`Value::as_str`], but also yields owned strings.
    pub fn to_str(&self) -> Option<Cow<'e, str>> {
        match self {
            Value::Str(s) => Some(s.clone()),
            _ => self.as_str().map(Cow::Borrowed),
        }
    }

    /// Integer view after the integer to position conversion.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Cpos(c) => Some(i64::from(*c)),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    fn is_stringish(&self) -> bool {
        match self {
            Value::Str(_) | Value::Token { .. } => true,
            Value::Region { attr, .. } => attr.has_values(),
            _ => false,
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::Cpos(_) | Value::Float(_) | Value::Bool(_)
        )
    }

    /// Apply a binary relational operator.
    ///
    /// An undefined operand makes every comparison false. Combinations
    /// with no defined comparison are a [`EvalError::TypeMismatch`].
    pub fn compare(&self, op: CmpOp, other: &Value<'e>) -> Result<bool, EvalError> {
        if op == CmpOp::Exists {
            return Ok(self.truthy());
        }
        if !self.is_defined() || !other.is_defined() {
            return Ok(false);
        }
        let mismatch = || EvalError::TypeMismatch {
            op,
            left: self.kind_name(),
            right: other.kind_name(),
        };

        let equal = match (self, other) {
            (Value::Token { attr: a, id: x }, Value::Token { attr: b, id: y }) => {
                if op.is_ordering() {
                    return Err(mismatch());
                }
                if a.name() == b.name() {
                    x == y
                } else {
                    a.id_to_str(*x) == b.id_to_str(*y)
                }
            }
            (Value::Token { id, .. }, Value::LexId(c)) | (Value::LexId(c), Value::Token { id, .. }) => {
                if op.is_ordering() {
                    return Err(mismatch());
                }
                *c == Some(*id)
            }
            (s, Value::Regex(re)) | (Value::Regex(re), s) if s.is_stringish() => {
                if op.is_ordering() {
                    return Err(mismatch());
                }
                s.to_str().is_some_and(|v| re.is_match(&v))
            }
            (a, b) if a.is_stringish() && b.is_stringish() => {
                if op.is_ordering() {
                    return Err(mismatch());
                }
                match (a.to_str(), b.to_str()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
            (Value::Float(_), b) | (b, Value::Float(_)) if b.is_numeric() => {
                let (x, y) = (self.as_f64(), other.as_f64());
                return Ok(apply_ordering(op, x.partial_cmp(&y)));
            }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                if matches!((a, b), (Value::Bool(_), _) | (_, Value::Bool(_))) && op.is_ordering() {
                    return Err(mismatch());
                }
                let (x, y) = (a.as_int().unwrap_or(0), b.as_int().unwrap_or(0));
                return Ok(apply_ordering(op, Some(x.cmp(&y))));
            }
            (Value::Region { .. }, Value::Region { .. }) => {
                // value-less regions compare by identity
                if op.is_ordering() {
                    return Err(mismatch());
                }
                self.region_key() == other.region_key()
            }
            _ => return Err(mismatch()),
        };

        Ok(match op {
            CmpOp::Eq => equal,
            CmpOp::Ne => !equal,
            _ => unreachable!("ordering operators are rejected above"),
        })
    }

    fn as_f64(&self) -> f64 {
        match self {
            Value::Float(x) => *x,
            other => other.as_int().unwrap_or(0) as f64,
        }
    }

    fn region_key(&self) -> Option<(&str, usize)> {
        match self {
            Value::Region { attr, region, .. } => Some((attr.name(), region.index)),
            _ => None,
        }
    }
}

fn apply_ordering(op: CmpOp, ord: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match (op, ord) {
        (_, None) => false,
        (CmpOp::Eq, Some(o)) => o == Equal,
        (CmpOp::Ne, Some(o)) => o != Equal,
        (CmpOp::Lt, Some(o)) => o == Less,
        (CmpOp::Le, Some(o)) => o != Greater,
        (CmpOp::Gt, Some(o)) => o == Greater,
        (CmpOp::Ge, Some(o)) => o != Less,
        (CmpOp::Exists, Some(_)) => true,
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("Undefined"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Cpos(c) => write!(f, "Cpos({c})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Token { attr, id } => {
                write!(f, "Token({}={:?})", attr.name(), attr.id_to_str(*id))
            }
            Value::Region { attr, region, .. } => {
                write!(f, "Region({}[{}..{}])", attr.name(), region.start, region.end)
            }
            Value::Regex(re) => write!(f, "{re:?}"),
            Value::LexId(id) => write!(f, "LexId({id:?})"),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Cpos(a), Value::Cpos(b)) => a == b,
            (Value::LexId(a), Value::LexId(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Token { attr: a, id: x }, Value::Token { attr: b, id: y }) => {
                a.name() == b.name() && x == y
            }
            (Value::Region { .. }, Value::Region { .. }) => self.region_key() == other.region_key(),
            (Value::Regex(a), Value::Regex(b)) => a.source() == b.source(),
            _ => false,
        }
    }
}
