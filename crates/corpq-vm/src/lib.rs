//! Query evaluation for corpq.
//!
//! `tree` holds the query representation handed over by a front end
//! (predicate trees, pattern slots, evaluation trees, environments);
//! `engine` evaluates it against a corpus.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![allow(clippy::comparison_chain)]

pub mod engine;
pub mod tree;

pub use engine::{
    Builtin, DynamicFunction, EvalConfig, EvalError, Function, FunctionRegistry, MatchingStrategy,
    NoopTracer, PrintTracer, QueryContext, QueryStatus, Tracer, Value, Verbosity, evaluate,
};
pub use tree::{
    AlignConstraint, AnchorKind, CmpOp, Environment, EvalTree, Field, MeetTree, MeetWindow,
    Operand, PatternSlot, Pred, SearchContext, TabColumn, TagValue,
};
