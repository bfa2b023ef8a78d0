//! Errors that can occur during query evaluation.
//!
//! Every error aborts the current query only. Cancellation is not an
//! error: it is reported through [`QueryStatus::Interrupted`].

use corpq_core::{AttributeKind, Cpos, CorpusError, LabelError, MatchListError, RegexError};

use crate::tree::CmpOp;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        op: CmpOp,
        left: &'static str,
        right: &'static str,
    },

    #[error("no {kind} attribute `{name}`")]
    UnknownAttribute { name: String, kind: AttributeKind },

    #[error("unknown corpus `{0}`")]
    UnknownCorpus(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("function `{function}` takes {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid argument to `{function}`: {message}")]
    InvalidArgument {
        function: String,
        message: String,
    },

    #[error("query corpus has no `{0}` field")]
    InvalidField(&'static str),

    #[error("query matches the empty sequence")]
    EmptyMatchQuery,

    #[error("query has no {expected} evaluation tree")]
    WrongQueryKind { expected: &'static str },

    #[error(transparent)]
    Compile(#[from] corpq_automaton::Error),

    #[error(transparent)]
    Regex(#[from] RegexError),

    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    MatchList(#[from] MatchListError),

    #[error("internal error: {0}")]
    Label(#[from] LabelError),

    #[error("infinite loop detected at start point {start} (state {state})")]
    InfiniteLoop { start: Cpos, state: usize },

    #[error("environment stack exceeds {limit} levels")]
    EnvironmentDepth { limit: usize },

    #[error("internal error: no query environment")]
    NoEnvironment,

    #[error("internal error: illegal pattern slot {index}: {reason}")]
    IllegalSlot { index: usize, reason: &'static str },
}

impl EvalError {
    /// Errors caused by the query text rather than by an engine invariant.
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            EvalError::Label(_)
                | EvalError::InfiniteLoop { .. }
                | EvalError::EnvironmentDepth { .. }
                | EvalError::IllegalSlot { .. }
                | EvalError::NoEnvironment
                | EvalError::Corpus(_)
                | EvalError::MatchList(_)
        )
    }
}

/// Outcome of a query that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    Completed,
    /// Stopped by the interrupt flag; the committed list is truncated.
    Interrupted,
}
