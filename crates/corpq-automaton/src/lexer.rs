//! Lexer for the token-sequence regex language.
//!
//! Produces span-based tokens without storing text; text is sliced from the
//! source only when needed.
//!
//! Consecutive characters the lexer does not recognise are coalesced into a
//! single `UnexpectedFragment` token, so one stray run yields one diagnostic.

use logos::Logos;

use crate::diagnostics::Span;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    /// The empty set.
    #[token("0")]
    Zero,

    /// The empty sequence.
    #[token("1")]
    One,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    #[regex(r#""([^"\\]|\\.)*""#)]
    Quoted,

    /// Explicit slot reference, `#12`.
    #[regex(r"#[0-9]+")]
    Slot,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("|")]
    Pipe,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    /// Coalesced run of unrecognised characters (never produced by logos directly).
    UnexpectedFragment,
}

impl TokenKind {
    /// Tokens that may begin an operand.
    pub fn starts_operand(self) -> bool {
        matches!(
            self,
            Self::Zero
                | Self::One
                | Self::Ident
                | Self::Quoted
                | Self::Slot
                | Self::LParen
                | Self::LBracket
        )
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Zero => "`0`",
            Self::One => "`1`",
            Self::Ident => "name",
            Self::Quoted => "quoted name",
            Self::Slot => "slot reference",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Pipe => "`|`",
            Self::Star => "`*`",
            Self::Plus => "`+`",
            Self::Equals => "`=`",
            Self::Comma => "`,`",
            Self::UnexpectedFragment => "unexpected characters",
        }
    }
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Tokenizes source into a vector of span-based tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut error_start: Option<usize> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(start) = error_start.take() {
                    let end = lexer.span().start;
                    tokens.push(Token::new(
                        TokenKind::UnexpectedFragment,
                        Span::new(start, end),
                    ));
                }
                let span = lexer.span();
                tokens.push(Token::new(kind, Span::new(span.start, span.end)));
            }
            Some(Err(())) => {
                if error_start.is_none() {
                    error_start = Some(lexer.span().start);
                }
            }
            None => {
                if let Some(start) = error_start.take() {
                    tokens.push(Token::new(
                        TokenKind::UnexpectedFragment,
                        Span::new(start, source.len()),
                    ));
                }
                break;
            }
        }
    }

    tokens
}

/// Retrieves the text slice for a token.
#[inline]
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[token.span.start..token.span.end]
}

/// Symbol name of an `Ident` or `Quoted` token, with quotes removed and
/// backslash escapes resolved.
pub fn symbol_name(source: &str, token: &Token) -> String {
    let text = token_text(source, token);
    if token.kind != TokenKind::Quoted {
        return text.to_owned();
    }

    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}
