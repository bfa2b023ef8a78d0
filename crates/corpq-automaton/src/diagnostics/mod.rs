//! Diagnostics for pattern parsing.

mod printer;


use std::fmt;

pub use printer::DiagnosticsPrinter;

/// Byte range into the pattern source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at `offset`.
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnclosedGroup,
    UnmatchedClose,
    ExpectedExpression,
    EmptyGroup,
    UnexpectedToken,
    TrailingInput,
    InvalidSlot,
    DuplicateDefinition,
    UsedBeforeDefinition,
}

impl DiagnosticKind {
    fn default_message(&self) -> &'static str {
        match self {
            Self::UnclosedGroup => "unclosed group",
            Self::UnmatchedClose => "closing delimiter without matching opener",
            Self::ExpectedExpression => "expected an expression",
            Self::EmptyGroup => "empty group",
            Self::UnexpectedToken => "unexpected token",
            Self::TrailingInput => "input after the main expression",
            Self::InvalidSlot => "invalid slot reference",
            Self::DuplicateDefinition => "name is already defined",
            Self::UsedBeforeDefinition => "name is used before its definition",
        }
    }

    /// Hint shown under the snippet.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptyGroup => Some("use `1` for the empty sequence"),
            Self::TrailingInput => Some("equations `name = expr ,` must precede the main expression"),
            Self::UsedBeforeDefinition => Some("move the equation above its first use"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub kind: DiagnosticKind,
    pub span: Span,
    pub message: String,
}

impl DiagnosticMessage {
    pub fn new(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            kind,
            span,
            message: kind.default_message().to_owned(),
        }
    }

    pub fn with_detail(kind: DiagnosticKind, span: Span, detail: impl fmt::Display) -> Self {
        Self {
            kind,
            span,
            message: format!("{}: {detail}", kind.default_message()),
        }
    }
}

impl fmt::Display for DiagnosticMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "error at {}..{}: {}",
            self.span.start, self.span.end, self.message
        )
    }
}

/// Collection of diagnostic messages from parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<DiagnosticMessage>);

impl Diagnostics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, msg: DiagnosticMessage) {
        self.0.push(msg);
    }

    pub fn report(&mut self, kind: DiagnosticKind, span: Span) {
        self.push(DiagnosticMessage::new(kind, span));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiagnosticMessage> {
        self.0.iter()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.0.iter().map(|d| d.kind).collect()
    }

    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticMessage;
    type IntoIter = std::slice::Iter<'a, DiagnosticMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
