//! Query evaluation engine.
//!
//! Sequence queries compile to a DFA over pattern slots and are simulated
//! against the corpus, start point by start point. Meet/union and TAB
//! queries combine initial match lists directly.

mod align;
pub mod config;
mod context;
pub mod error;
pub mod eval;
pub mod functions;
mod initial;
mod interrupt;
mod meet;
mod tabular;
mod threads;
mod trace;
mod value;
mod vm;

#[cfg(test)]
mod align_tests;
#[cfg(test)]
mod context_tests;
#[cfg(test)]
mod tabular_tests;
#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod vm_tests;

pub use config::{EvalConfig, MatchingStrategy};
pub use context::QueryContext;
pub use error::{EvalError, QueryStatus};
pub use eval::{evaluate, operand};
pub use functions::{Builtin, DynamicFunction, Function, FunctionRegistry};
pub use initial::initial_matchlist;
pub use meet::meet;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::Value;
