//! Operator-precedence parser for the token-sequence regex language.
//!
//! Grammar:
//!
//! ```text
//! pattern   := (equation ',')* expr ','?
//! equation  := NAME '=' expr
//! alt       := cat ('|' cat)*
//! cat       := post+
//! post      := atom ('*' | '+')*
//! atom      := '0' | '1' | NAME | '#' DIGITS | '(' expr ')' | '[' expr ']'
//! ```
//!
//! Expressions are parsed with explicit operand/operator stacks rather than
//! recursion, so nesting depth is bounded by `CompileLimits::max_depth`
//! instead of the native stack. Concatenation is implicit (juxtaposition).
//! Equations are non-recursive macros: a name defined by an equation expands
//! to the shared DAG node of its body.
//!
//! On a syntax error the parser records a diagnostic and skips to the next
//! `,`. Parsing gives up once `max_errors` diagnostics have accumulated.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::diagnostics::{DiagnosticKind, DiagnosticMessage, Diagnostics, Span};
use crate::expr::{ExprId, ExprPool};
use crate::lexer::{Token, TokenKind, lex, symbol_name, token_text};
use crate::{CompileLimits, Error, Result};

/// Parser output: the expression DAG and its root.
#[derive(Debug)]
pub struct Parsed {
    pub pool: ExprPool,
    pub root: ExprId,
    /// Free symbol names by slot, in order of first appearance. Empty when
    /// the pattern addresses slots as `#n`.
    pub symbol_names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Alt,
    Cat,
    Group { bracket: bool, span: Span },
}

impl Op {
    fn precedence(self) -> u8 {
        match self {
            Op::Group { .. } => 0,
            Op::Alt => 1,
            Op::Cat => 2,
        }
    }
}

pub fn parse(source: &str, slots: usize, limits: &CompileLimits) -> Result<Parsed> {
    let mut parser = Parser::new(source, slots, limits);
    let root = parser.parse_pattern()?;

    if !parser.diagnostics.is_empty() {
        return Err(Error::Parse(parser.diagnostics));
    }
    if !parser.free.is_empty() && parser.slot_refs_used {
        return Err(Error::MixedSymbolStyles);
    }
    if parser.free.len() > slots {
        return Err(Error::SlotOutOfRange {
            slot: parser.free.len() - 1,
            slots,
        });
    }

    let root = match root {
        Some(root) => root,
        None => parser.pool.zero(),
    };
    Ok(Parsed {
        pool: parser.pool,
        root,
        symbol_names: parser.free.into_keys().collect(),
    })
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
    slots: usize,
    limits: &'s CompileLimits,
    pool: ExprPool,
    diagnostics: Diagnostics,
    equations: HashMap<String, ExprId>,
    /// Free symbol name -> span of first use.
    free: IndexMap<String, Span>,
    slot_refs_used: bool,
}

impl<'s> Parser<'s> {
    fn new(source: &'s str, slots: usize, limits: &'s CompileLimits) -> Self {
        Self {
            source,
            tokens: lex(source),
            pos: 0,
            slots,
            limits,
            pool: ExprPool::new(),
            diagnostics: Diagnostics::new(),
            equations: HashMap::new(),
            free: IndexMap::new(),
            slot_refs_used: false,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind(0) == Some(kind)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.peek()?;
        self.pos += 1;
        Some(tok)
    }

    /// Span of the current token, or an empty span at end of input.
    fn current_span(&self) -> Span {
        self.peek()
            .map_or_else(|| Span::at(self.source.len()), |t| t.span)
    }

    fn error(&mut self, msg: DiagnosticMessage) -> Result<()> {
        self.diagnostics.push(msg);
        if self.diagnostics.len() >= self.limits.max_errors {
            return Err(Error::TooManyErrors(self.diagnostics.clone()));
        }
        Ok(())
    }

    /// Skip to the next `,` (not consumed).
    fn recover(&mut self) {
        while !self.at_end() && !self.at(TokenKind::Comma) {
            self.pos += 1;
        }
    }

    fn parse_pattern(&mut self) -> Result<Option<ExprId>> {
        let mut main = None;
        let mut seen_main = false;

        while !self.at_end() {
            if self.at(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if seen_main {
                let span = self.current_span().cover(Span::at(self.source.len()));
                self.error(DiagnosticMessage::new(DiagnosticKind::TrailingInput, span))?;
                break;
            }
            if self.is_equation_head() {
                self.parse_equation()?;
            } else {
                main = self.parse_expr()?;
                seen_main = true;
            }
        }

        if !seen_main && self.diagnostics.is_empty() {
            self.error(DiagnosticMessage::with_detail(
                DiagnosticKind::ExpectedExpression,
                Span::at(self.source.len()),
                "the pattern has no main expression",
            ))?;
        }
        Ok(main)
    }

    fn is_equation_head(&self) -> bool {
        matches!(
            self.peek_kind(0),
            Some(TokenKind::Ident | TokenKind::Quoted)
        ) && self.peek_kind(1) == Some(TokenKind::Equals)
    }

    fn parse_equation(&mut self) -> Result<()> {
        let (Some(name_tok), Some(_)) = (self.bump(), self.bump()) else {
            return Ok(());
        };
        let body_start = self.current_span().start;
        let body = self.parse_expr()?;

        if self.at(TokenKind::Comma) {
            self.bump();
        } else {
            self.error(DiagnosticMessage::with_detail(
                DiagnosticKind::ExpectedExpression,
                Span::at(self.source.len()),
                "an equation must be followed by `,` and the main expression",
            ))?;
        }
        let Some(body) = body else {
            return Ok(());
        };

        let name = symbol_name(self.source, &name_tok);
        if let Some(&first_use) = self.free.get(&name) {
            if first_use.start >= body_start {
                return Err(Error::RecursiveDefinition(name));
            }
            self.error(DiagnosticMessage::with_detail(
                DiagnosticKind::UsedBeforeDefinition,
                first_use,
                format_args!("`{name}`"),
            ))?;
            return Ok(());
        }
        if self.equations.contains_key(&name) {
            self.error(DiagnosticMessage::with_detail(
                DiagnosticKind::DuplicateDefinition,
                name_tok.span,
                format_args!("`{name}`"),
            ))?;
            return Ok(());
        }
        self.equations.insert(name, body);
        Ok(())
    }

    /// Parse one expression up to `,` or end of input.
    ///
    /// Returns `None` after a reported syntax error (input skipped to the
    /// next `,`).
    fn parse_expr(&mut self) -> Result<Option<ExprId>> {
        let mut operands: Vec<ExprId> = Vec::new();
        let mut ops: Vec<Op> = Vec::new();
        let mut expect_operand = true;
        let mut depth = 0usize;

        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::Comma => break,
                kind if kind.starts_operand() => {
                    if !expect_operand {
                        self.push_op(&mut operands, &mut ops, Op::Cat);
                    }
                    self.bump();
                    let operand = match kind {
                        TokenKind::LParen | TokenKind::LBracket => {
                            depth += 1;
                            if depth > self.limits.max_depth {
                                return Err(Error::NestingTooDeep {
                                    limit: self.limits.max_depth,
                                });
                            }
                            ops.push(Op::Group {
                                bracket: kind == TokenKind::LBracket,
                                span: tok.span,
                            });
                            expect_operand = true;
                            continue;
                        }
                        TokenKind::Zero => self.pool.zero(),
                        TokenKind::One => self.pool.one(),
                        TokenKind::Slot => match self.slot_ref(&tok)? {
                            Some(e) => e,
                            None => return self.abandon(),
                        },
                        _ => self.name_ref(&tok),
                    };
                    operands.push(operand);
                    expect_operand = false;
                }
                TokenKind::Star | TokenKind::Plus => {
                    self.bump();
                    if expect_operand {
                        self.error(DiagnosticMessage::with_detail(
                            DiagnosticKind::ExpectedExpression,
                            tok.span,
                            format_args!("nothing to repeat before {}", tok.kind.describe()),
                        ))?;
                        return self.abandon();
                    }
                    if let Some(top) = operands.pop() {
                        let repeated = if tok.kind == TokenKind::Star {
                            self.pool.star(top)
                        } else {
                            self.pool.plus(top)
                        };
                        operands.push(repeated);
                    }
                }
                TokenKind::Pipe => {
                    self.bump();
                    if expect_operand {
                        self.error(DiagnosticMessage::with_detail(
                            DiagnosticKind::ExpectedExpression,
                            tok.span,
                            "missing alternative before `|`",
                        ))?;
                        return self.abandon();
                    }
                    self.push_op(&mut operands, &mut ops, Op::Alt);
                    expect_operand = true;
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    self.bump();
                    let bracket = tok.kind == TokenKind::RBracket;
                    if expect_operand {
                        let msg = match ops.last() {
                            Some(Op::Group { span, .. }) => DiagnosticMessage::new(
                                DiagnosticKind::EmptyGroup,
                                span.cover(tok.span),
                            ),
                            _ => DiagnosticMessage::with_detail(
                                DiagnosticKind::ExpectedExpression,
                                tok.span,
                                format_args!("missing operand before {}", tok.kind.describe()),
                            ),
                        };
                        self.error(msg)?;
                        return self.abandon();
                    }
                    loop {
                        match ops.pop() {
                            Some(Op::Group { bracket: b, .. }) => {
                                if b != bracket {
                                    let opener = if b { "`[`" } else { "`(`" };
                                    self.error(DiagnosticMessage::with_detail(
                                        DiagnosticKind::UnmatchedClose,
                                        tok.span,
                                        format_args!("{} closes {opener}", tok.kind.describe()),
                                    ))?;
                                    return self.abandon();
                                }
                                break;
                            }
                            Some(op) => self.apply(&mut operands, op),
                            None => {
                                self.error(DiagnosticMessage::new(
                                    DiagnosticKind::UnmatchedClose,
                                    tok.span,
                                ))?;
                                return self.abandon();
                            }
                        }
                    }
                    if bracket && let Some(top) = operands.pop() {
                        let optional = self.pool.opt(top);
                        operands.push(optional);
                    }
                    depth -= 1;
                    expect_operand = false;
                }
                _ => {
                    self.bump();
                    self.error(DiagnosticMessage::with_detail(
                        DiagnosticKind::UnexpectedToken,
                        tok.span,
                        tok.kind.describe(),
                    ))?;
                    return self.abandon();
                }
            }
        }

        if expect_operand {
            self.error(DiagnosticMessage::new(
                DiagnosticKind::ExpectedExpression,
                self.current_span(),
            ))?;
            return self.abandon();
        }

        while let Some(op) = ops.pop() {
            match op {
                Op::Group { span, .. } => {
                    self.error(DiagnosticMessage::new(DiagnosticKind::UnclosedGroup, span))?;
                    return self.abandon();
                }
                op => self.apply(&mut operands, op),
            }
        }

        debug_assert_eq!(operands.len(), 1);
        Ok(operands.pop())
    }

    fn abandon(&mut self) -> Result<Option<ExprId>> {
        self.recover();
        Ok(None)
    }

    /// Reduce operators of higher or equal precedence, then push `op`.
    fn push_op(&mut self, operands: &mut Vec<ExprId>, ops: &mut Vec<Op>, op: Op) {
        while let Some(&top) = ops.last() {
            if matches!(top, Op::Group { .. }) || top.precedence() < op.precedence() {
                break;
            }
            ops.pop();
            self.apply(operands, top);
        }
        ops.push(op);
    }

    fn apply(&mut self, operands: &mut Vec<ExprId>, op: Op) {
        debug_assert!(operands.len() >= 2, "operator without two operands");
        let (Some(b), Some(a)) = (operands.pop(), operands.pop()) else {
            return;
        };
        let combined = match op {
            Op::Alt => self.pool.alt(a, b),
            Op::Cat => self.pool.cat(a, b),
            Op::Group { .. } => return,
        };
        operands.push(combined);
    }

    fn name_ref(&mut self, tok: &Token) -> ExprId {
        let name = symbol_name(self.source, tok);
        if let Some(&e) = self.equations.get(&name) {
            return e;
        }
        let slot = match self.free.get_index_of(&name) {
            Some(i) => i,
            None => {
                self.free.insert(name, tok.span);
                self.free.len() - 1
            }
        };
        self.pool.sym(slot as u32)
    }

    fn slot_ref(&mut self, tok: &Token) -> Result<Option<ExprId>> {
        self.slot_refs_used = true;
        let digits = &token_text(self.source, tok)[1..];
        let Ok(slot) = digits.parse::<u32>() else {
            self.error(DiagnosticMessage::with_detail(
                DiagnosticKind::InvalidSlot,
                tok.span,
                format_args!("`#{digits}` is too large"),
            ))?;
            return Ok(None);
        };
        if slot as usize >= self.slots {
            return Err(Error::SlotOutOfRange {
                slot: slot as usize,
                slots: self.slots,
            });
        }
        Ok(Some(self.pool.sym(slot)))
    }
}
