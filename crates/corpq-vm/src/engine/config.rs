//! Evaluation settings.

use corpq_automaton::CompileLimits;
use serde::{Deserialize, Serialize};

/// How far a simulation keeps going after the first match of a start point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    /// Stop at the first winner.
    #[default]
    Shortest,
    /// Keep extending until no thread is left; later winners replace
    /// earlier ones, and matches nested in an earlier match are dropped.
    Longest,
}

/// Evaluation limits and strategy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Longest match in tokens when no `within` clause is given (default: 500).
    pub(crate) hard_boundary: u32,
    pub(crate) matching_strategy: MatchingStrategy,
    /// Transitions between interrupt polls (default: 20,000).
    pub(crate) poll_interval: u32,
    /// Depth of the environment stack (default: 10).
    pub(crate) max_environments: usize,
    /// Tokens after an opened region may not pass its end (default: off).
    pub(crate) strict_regions: bool,
    /// Largest order-independent group (default: 5).
    pub(crate) max_permutation: usize,
    #[serde(skip)]
    pub(crate) compile_limits: CompileLimits,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            hard_boundary: 500,
            matching_strategy: MatchingStrategy::Shortest,
            poll_interval: 20_000,
            max_environments: 10,
            strict_regions: false,
            max_permutation: 5,
            compile_limits: CompileLimits::default(),
        }
    }
}

impl EvalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from JSON; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn hard_boundary(mut self, tokens: u32) -> Self {
        self.hard_boundary = tokens.max(1);
        self
    }

    pub fn matching_strategy(mut self, strategy: MatchingStrategy) -> Self {
        self.matching_strategy = strategy;
        self
    }

    pub fn poll_interval(mut self, transitions: u32) -> Self {
        self.poll_interval = transitions.max(1);
        self
    }

    pub fn max_environments(mut self, depth: usize) -> Self {
        self.max_environments = depth;
        self
    }

    pub fn strict_regions(mut self, strict: bool) -> Self {
        self.strict_regions = strict;
        self
    }

    pub fn max_permutation(mut self, n: usize) -> Self {
        self.max_permutation = n;
        self
    }

    pub fn compile_limits(mut self, limits: CompileLimits) -> Self {
        self.compile_limits = limits;
        self
    }

    pub fn get_hard_boundary(&self) -> u32 {
        self.hard_boundary
    }
    pub fn get_matching_strategy(&self) -> MatchingStrategy {
        self.matching_strategy
    }
    pub fn get_poll_interval(&self) -> u32 {
        self.poll_interval.max(1)
    }
    pub fn get_max_environments(&self) -> usize {
        self.max_environments
    }
    pub fn get_strict_regions(&self) -> bool {
        self.strict_regions
    }
    pub fn get_max_permutation(&self) -> usize {
        self.max_permutation
    }
    pub fn get_compile_limits(&self) -> CompileLimits {
        self.compile_limits
    }
}
