//! Tracing infrastructure for debugging the simulation.
//!
//! The tracer is a zero-cost abstraction: with [`NoopTracer`] every trait
//! method is an `#[inline(always)]` empty function and the calls vanish.
//! [`PrintTracer`] collects human readable lines instead.
//!
//! Structured `tracing` events are emitted by the engine regardless of the
//! tracer; the tracer is for step-by-step output of a single query.

use corpq_automaton::{Dfa, StateId};
use corpq_core::Cpos;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Initial lists, matches, interruptions.
    #[default]
    Default,
    /// Adds the automaton, start points and rejected candidates.
    Verbose,
    /// Adds every transition check.
    VeryVerbose,
}

/// Instrumentation hooks of the simulation driver.
///
/// - `trace_automaton` - once per query, before simulation
/// - `trace_initial` - after the initial list of a start transition is built
/// - `trace_start` - when a start point is simulated
/// - `trace_transition` - after each pattern slot check
/// - `trace_match` - when a start point produces its match
/// - `trace_reject` - when the global constraint rejects a candidate
/// - `trace_interrupt` - when the interrupt flag stops the query
pub trait Tracer {
    fn trace_automaton(&mut self, dfa: &Dfa);

    fn trace_initial(&mut self, symbol: usize, target: StateId, candidates: usize);

    fn trace_start(&mut self, start: Cpos, boundary: Cpos);

    fn trace_transition(
        &mut self,
        from: StateId,
        symbol: usize,
        to: StateId,
        cpos: Cpos,
        ok: bool,
    );

    fn trace_match(&mut self, start: Cpos, end: Cpos);

    fn trace_reject(&mut self, start: Cpos, end: Cpos);

    fn trace_interrupt(&mut self);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_automaton(&mut self, _dfa: &Dfa) {}

    #[inline(always)]
    fn trace_initial(&mut self, _symbol: usize, _target: StateId, _candidates: usize) {}

    #[inline(always)]
    fn trace_start(&mut self, _start: Cpos, _boundary: Cpos) {}

    #[inline(always)]
    fn trace_transition(
        &mut self,
        _from: StateId,
        _symbol: usize,
        _to: StateId,
        _cpos: Cpos,
        _ok: bool,
    ) {
    }

    #[inline(always)]
    fn trace_match(&mut self, _start: Cpos, _end: Cpos) {}

    #[inline(always)]
    fn trace_reject(&mut self, _start: Cpos, _end: Cpos) {}

    #[inline(always)]
    fn trace_interrupt(&mut self) {}
}

/// Tracer that collects the trace as text lines.
#[derive(Debug, Default)]
pub struct PrintTracer {
    verbosity: Verbosity,
    lines: Vec<String>,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The collected trace, one line per event.
    pub fn output(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Print the collected trace to stderr.
    pub fn print(&self) {
        for line in &self.lines {
            eprintln!("{line}");
        }
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

impl Tracer for PrintTracer {
    fn trace_automaton(&mut self, dfa: &Dfa) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        for line in dfa.dump().lines() {
            self.push(format!("dfa  {line}"));
        }
    }

    fn trace_initial(&mut self, symbol: usize, target: StateId, candidates: usize) {
        self.push(format!("init #{symbol} -> S{target}: {candidates} candidate(s)"));
    }

    fn trace_start(&mut self, start: Cpos, boundary: Cpos) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        self.push(format!("  start {start} (boundary {boundary})"));
    }

    fn trace_transition(
        &mut self,
        from: StateId,
        symbol: usize,
        to: StateId,
        cpos: Cpos,
        ok: bool,
    ) {
        if self.verbosity != Verbosity::VeryVerbose {
            return;
        }
        let verdict = if ok { "ok" } else { "fail" };
        self.push(format!("    S{from} #{symbol}@{cpos} -> S{to} {verdict}"));
    }

    fn trace_match(&mut self, start: Cpos, end: Cpos) {
        self.push(format!("  match {start}..{end}"));
    }

    fn trace_reject(&mut self, start: Cpos, end: Cpos) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        self.push(format!("  rejected {start}..{end}"));
    }

    fn trace_interrupt(&mut self) {
        self.push("interrupted".to_owned());
    }
}
