//! Builtin and externally provided functions of predicate trees.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use corpq_core::regex::fold_diacritics;

use super::error::EvalError;
use super::value::Value;

/// Functions every corpus query understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `f(attr)`: corpus frequency of the value.
    Freq,
    /// `distance(a, b)` / `dist(a, b)`: `a - b`.
    Distance,
    /// `distabs(a, b)`: `|a - b|`.
    DistAbs,
    /// `int(x)`: parse an integer.
    Int,
    /// `lbound(s)`: position starts its region.
    LBound,
    /// `rbound(s)`: position ends its region.
    RBound,
    StrLen,
    /// `ambiguity(x)`: number of values in a `|a|b|` set.
    Ambiguity,
    Add,
    Sub,
    Mul,
    /// `prefix(a, b)`: longest common prefix.
    Prefix,
    /// `is_prefix(a, b)`: `a` is a prefix of `b`.
    IsPrefix,
    /// `minus(a, b)`: `a` without the suffix `b`.
    Minus,
    /// `ignore(x)`: always true.
    Ignore,
    /// `normalize(x, "cd")`: case and/or diacritic folding.
    Normalize,
}

impl Builtin {
    pub const ALL: [Builtin; 16] = [
        Builtin::Freq,
        Builtin::Distance,
        Builtin::DistAbs,
        Builtin::Int,
        Builtin::LBound,
        Builtin::RBound,
        Builtin::StrLen,
        Builtin::Ambiguity,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Prefix,
        Builtin::IsPrefix,
        Builtin::Minus,
        Builtin::Ignore,
        Builtin::Normalize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Freq => "f",
            Builtin::Distance => "distance",
            Builtin::DistAbs => "distabs",
            Builtin::Int => "int",
            Builtin::LBound => "lbound",
            Builtin::RBound => "rbound",
            Builtin::StrLen => "strlen",
            Builtin::Ambiguity => "ambiguity",
            Builtin::Add => "add",
            Builtin::Sub => "sub",
            Builtin::Mul => "mul",
            Builtin::Prefix => "prefix",
            Builtin::IsPrefix => "is_prefix",
            Builtin::Minus => "minus",
            Builtin::Ignore => "ignore",
            Builtin::Normalize => "normalize",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Freq
            | Builtin::Int
            | Builtin::LBound
            | Builtin::RBound
            | Builtin::StrLen
            | Builtin::Ambiguity
            | Builtin::Ignore => 1,
            _ => 2,
        }
    }

    pub fn lookup(name: &str) -> Option<Self> {
        if name == "dist" {
            return Some(Builtin::Distance);
        }
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Apply to evaluated arguments. The argument count has been checked
    /// when the function was resolved.
    pub fn call<'e>(self, args: &[Value<'e>]) -> Result<Value<'e>, EvalError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
        let invalid = |message: String| EvalError::InvalidArgument {
            function: self.name().to_owned(),
            message,
        };

        let value = match self {
            Builtin::Freq => match arg(0) {
                Value::Token { attr, id } => Value::Int(attr.id_to_freq(id) as i64),
                Value::Undefined => Value::Undefined,
                other => {
                    return Err(invalid(format!(
                        "expected an attribute, got {}",
                        other.kind_name()
                    )));
                }
            },
            Builtin::Distance | Builtin::DistAbs | Builtin::Add | Builtin::Sub | Builtin::Mul => {
                let (a, b) = (arg(0), arg(1));
                let (Some(x), Some(y)) = (a.as_int(), b.as_int()) else {
                    return undefined_or_mismatch(self, &a, &b);
                };
                match self {
                    Builtin::Distance | Builtin::Sub => Value::Int(x.saturating_sub(y)),
                    Builtin::DistAbs => Value::Int(x.saturating_sub(y).saturating_abs()),
                    Builtin::Add => Value::Int(x.saturating_add(y)),
                    _ => Value::Int(x.saturating_mul(y)),
                }
            }
            Builtin::Int => match arg(0) {
                v @ (Value::Int(_) | Value::Cpos(_)) => Value::Int(v.as_int().unwrap_or(0)),
                v => match v.to_str() {
                    Some(s) => s.trim().parse::<i64>().map_or(Value::Undefined, Value::Int),
                    None => Value::Undefined,
                },
            },
            Builtin::LBound | Builtin::RBound => match arg(0) {
                Value::Region { region, cpos, .. } => Value::Bool(if self == Builtin::LBound {
                    region.start == cpos
                } else {
                    region.end == cpos
                }),
                Value::Undefined => Value::Bool(false),
                other => {
                    return Err(invalid(format!(
                        "expected a structural attribute, got {}",
                        other.kind_name()
                    )));
                }
            },
            Builtin::StrLen => match arg(0).to_str() {
                Some(s) => Value::Int(s.chars().count() as i64),
                None => Value::Undefined,
            },
            Builtin::Ambiguity => match arg(0).to_str() {
                Some(s) if s.starts_with('|') => {
                    Value::Int(s.split('|').filter(|v| !v.is_empty()).count() as i64)
                }
                Some(s) => Value::Int(i64::from(!s.is_empty())),
                None => Value::Undefined,
            },
            Builtin::Prefix | Builtin::IsPrefix | Builtin::Minus => {
                let (Some(a), Some(b)) = (arg(0).to_str(), arg(1).to_str()) else {
                    return Ok(Value::Undefined);
                };
                match self {
                    Builtin::Prefix => {
                        let len: usize = a
                            .chars()
                            .zip(b.chars())
                            .take_while(|(x, y)| x == y)
                            .map(|(x, _)| x.len_utf8())
                            .sum();
                        Value::Str(Cow::Owned(a[..len].to_owned()))
                    }
                    Builtin::IsPrefix => Value::Bool(b.starts_with(a.as_ref())),
                    _ => match a.strip_suffix(b.as_ref()) {
                        Some(stem) => Value::Str(Cow::Owned(stem.to_owned())),
                        None => Value::Str(a),
                    },
                }
            }
            Builtin::Ignore => Value::Bool(true),
            Builtin::Normalize => {
                let flags = match arg(1).to_str() {
                    Some(f) => f.into_owned(),
                    None => return Err(invalid("flags must be a string".to_owned())),
                };
                let Some(s) = arg(0).to_str() else {
                    return Ok(Value::Undefined);
                };
                let mut out = s.into_owned();
                for c in flags.trim_start_matches('%').chars() {
                    match c {
                        'c' => out = out.to_lowercase(),
                        'd' => out = fold_diacritics(&out).into_owned(),
                        other => return Err(invalid(format!("unknown flag `{other}`"))),
                    }
                }
                Value::Str(Cow::Owned(out))
            }
        };
        Ok(value)
    }
}

fn undefined_or_mismatch<'e>(
    builtin: Builtin,
    a: &Value<'e>,
    b: &Value<'e>,
) -> Result<Value<'e>, EvalError> {
    if !a.is_defined() || !b.is_defined() {
        return Ok(Value::Undefined);
    }
    let bad = if a.as_int().is_none() { a } else { b };
    Err(EvalError::InvalidArgument {
        function: builtin.name().to_owned(),
        message: format!("expected a number or position, got {}", bad.kind_name()),
    })
}

/// A function supplied by the embedding application (a "dynamic attribute").
pub trait DynamicFunction: Send + Sync {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    fn call(&self, args: &[Value<'_>]) -> Result<Value<'static>, EvalError>;
}

/// A resolved function reference in a predicate tree.
#[derive(Clone)]
pub enum Function {
    Builtin(Builtin),
    Dynamic(Arc<dyn DynamicFunction>),
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::Builtin(b) => b.name(),
            Function::Dynamic(d) => d.name(),
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            Function::Builtin(b) => b.arity(),
            Function::Dynamic(d) => d.arity(),
        }
    }

    pub fn call<'e>(&self, args: &[Value<'e>]) -> Result<Value<'e>, EvalError> {
        match self {
            Function::Builtin(b) => b.call(args),
            Function::Dynamic(d) => d.call(args),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(b) => write!(f, "Builtin({})", b.name()),
            Function::Dynamic(d) => write!(f, "Dynamic({})", d.name()),
        }
    }
}

/// Resolves function names while predicate trees are built.
///
/// Builtins shadow dynamic functions of the same name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    dynamic: HashMap<String, Arc<dyn DynamicFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: Arc<dyn DynamicFunction>) {
        self.dynamic.insert(function.name().to_owned(), function);
    }

    pub fn resolve(&self, name: &str, argc: usize) -> Result<Function, EvalError> {
        let function = match Builtin::lookup(name) {
            Some(b) => Function::Builtin(b),
            None => self
                .dynamic
                .get(name)
                .map(|d| Function::Dynamic(Arc::clone(d)))
                .ok_or_else(|| EvalError::UnknownFunction(name.to_owned()))?,
        };
        if function.arity() != argc {
            return Err(EvalError::ArgumentCount {
                function: name.to_owned(),
                expected: function.arity(),
                found: argc,
            });
        }
        Ok(function)
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.dynamic.keys().collect();
        names.sort();
        f.debug_struct("FunctionRegistry")
            .field("dynamic", &names)
            .finish()
    }
}
