//! corpq automaton compiler: token-sequence regex to minimal DFA.
//!
//! Pipeline:
//! - `lexer` - logos-based tokenizer
//! - `parser` - operator-precedence parser building a hash-consed `expr` DAG
//! - `build` - Brzozowski derivative state construction
//! - `minimize` - partition refinement and canonical renumbering
//! - `dfa` - the resulting transition table
//! - `seqtree` - sequence evaluation trees rendered into the pattern language
//! - `diagnostics` - error reporting

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod build;
pub mod diagnostics;
pub mod dfa;
pub mod expr;
pub mod lexer;
pub mod minimize;
pub mod parser;
pub mod seqtree;

#[cfg(test)]
mod expr_tests;
#[cfg(test)]
mod parser_tests;
#[cfg(test)]
mod seqtree_tests;

pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Span};
pub use dfa::{Dfa, StateId};
pub use seqtree::SeqTree;

/// Errors from compiling a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("pattern parsing failed with {} errors", .0.len())]
    Parse(Diagnostics),

    #[error("too many errors ({} reported), giving up", .0.len())]
    TooManyErrors(Diagnostics),

    #[error("expression nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("equation `{0}` refers to itself")]
    RecursiveDefinition(String),

    #[error("named symbols and `#n` slot references cannot be mixed")]
    MixedSymbolStyles,

    #[error("slot {slot} out of range ({slots} pattern slots)")]
    SlotOutOfRange { slot: usize, slots: usize },

    #[error("automaton exceeds {limit} states")]
    TooManyStates { limit: usize },

    #[error("order-independent group of {count} items exceeds the limit of {limit}")]
    TooManyPermutations { count: usize, limit: usize },

    #[error("invalid repetition bounds {{{min},{max}}}")]
    InvalidRepeat { min: u32, max: u32 },
}

impl Error {
    /// Parse diagnostics, when the error carries any.
    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        match self {
            Error::Parse(d) | Error::TooManyErrors(d) => Some(d),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Hard limits for one compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileLimits {
    pub(crate) max_errors: usize,
    pub(crate) max_depth: usize,
    pub(crate) max_states: usize,
}

impl Default for CompileLimits {
    fn default() -> Self {
        Self {
            max_errors: 10,
            max_depth: 1000,
            max_states: 10_000,
        }
    }
}

impl CompileLimits {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up after this many syntax errors.
    pub fn max_errors(mut self, n: usize) -> Self {
        self.max_errors = n.max(1);
        self
    }

    /// Maximum group nesting.
    pub fn max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    /// Maximum number of states before minimisation.
    pub fn max_states(mut self, n: usize) -> Self {
        self.max_states = n;
        self
    }
}

/// Compile a pattern over `slots` input symbols with default limits.
pub fn compile(pattern: &str, slots: usize) -> Result<Dfa> {
    compile_with(pattern, slots, &CompileLimits::default())
}

pub fn compile_with(pattern: &str, slots: usize, limits: &CompileLimits) -> Result<Dfa> {
    let mut parsed = parser::parse(pattern, slots, limits)?;
    let raw = build::build(&mut parsed.pool, parsed.root, slots, limits.max_states)?;
    Ok(minimize::minimize(&raw))
}

/// Render a sequence tree and compile it.
pub fn compile_tree(
    tree: &SeqTree,
    slots: usize,
    max_permutation: usize,
    limits: &CompileLimits,
) -> Result<Dfa> {
    let pattern = tree.to_pattern(max_permutation)?;
    compile_with(&pattern, slots, limits)
}
