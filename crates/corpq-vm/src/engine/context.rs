//! Query context: the state one query session threads through evaluation.
//!
//! A [`QueryContext`] owns the evaluation settings, the stack of
//! environments (the active query on top), the query corpus results are
//! committed to, an optional corpus registry for alignment targets, and
//! the interrupt flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use corpq_core::{CorpusRegistry, MatchList, SubCorpus};

use super::config::EvalConfig;
use super::error::{EvalError, QueryStatus};
use super::interrupt::Poller;
use super::meet::evaluate_meet_tree;
use super::tabular::evaluate_tab;
use super::trace::{NoopTracer, Tracer};
use super::vm::{Scope, run_sequence};
use crate::tree::{EvalTree, Environment};

pub struct QueryContext {
    config: EvalConfig,
    environments: Vec<Environment>,
    query_corpus: SubCorpus,
    registry: Option<Arc<dyn CorpusRegistry>>,
    interrupt: Arc<AtomicBool>,
}

impl QueryContext {
    pub fn new(query_corpus: SubCorpus, config: EvalConfig) -> Self {
        Self {
            config,
            environments: Vec::new(),
            query_corpus,
            registry: None,
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resolve alignment targets through `registry`.
    pub fn with_registry(mut self, registry: Arc<dyn CorpusRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Flag to set (e.g. from a signal handler) to stop the running query.
    ///
    /// It is cleared when a runner reports the interruption.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub fn push_environment(&mut self, env: Environment) -> Result<(), EvalError> {
        let limit = self.config.get_max_environments();
        if self.environments.len() >= limit {
            return Err(EvalError::EnvironmentDepth { limit });
        }
        self.environments.push(env);
        Ok(())
    }

    pub fn pop_environment(&mut self) -> Option<Environment> {
        self.environments.pop()
    }

    /// The active environment.
    pub fn environment(&self) -> Option<&Environment> {
        self.environments.last()
    }

    pub fn environment_mut(&mut self) -> Option<&mut Environment> {
        self.environments.last_mut()
    }

    pub fn depth(&self) -> usize {
        self.environments.len()
    }

    pub fn query_corpus(&self) -> &SubCorpus {
        &self.query_corpus
    }

    /// Replace the query corpus, returning the previous one.
    pub fn set_query_corpus(&mut self, corpus: SubCorpus) -> SubCorpus {
        std::mem::replace(&mut self.query_corpus, corpus)
    }

    /// Run the active sequence query and commit its matches.
    pub fn run_standard_query(
        &mut self,
        cut: Option<usize>,
        keep_old_ranges: bool,
    ) -> Result<QueryStatus, EvalError> {
        self.run_standard_query_with(cut, keep_old_ranges, &mut NoopTracer)
    }

    pub fn run_standard_query_with<T: Tracer>(
        &mut self,
        cut: Option<usize>,
        keep_old_ranges: bool,
        tracer: &mut T,
    ) -> Result<QueryStatus, EvalError> {
        let depth = self.environments.len();
        let env = self
            .environments
            .last_mut()
            .ok_or(EvalError::NoEnvironment)?;
        if env.dfa().is_none() && !matches!(env.tree(), Some(EvalTree::Seq(_))) {
            return Err(EvalError::WrongQueryKind {
                expected: "sequence",
            });
        }
        env.prepare(&self.config)?;
        tracing::debug!(
            corpus = self.query_corpus.name(),
            ranges = self.query_corpus.ranges().len(),
            "running sequence query"
        );

        let scope = Scope {
            config: &self.config,
            registry: self.registry.as_deref(),
            interrupt: &self.interrupt,
            depth,
        };
        let (list, status) = run_sequence(env, &self.query_corpus, &scope, tracer)?;
        Ok(self.finish(list, status, cut, keep_old_ranges))
    }

    /// Run the active meet/union query and commit its matches.
    pub fn run_meet_union_query(
        &mut self,
        keep_old_ranges: bool,
        cut: Option<usize>,
    ) -> Result<QueryStatus, EvalError> {
        let env = self.environment().ok_or(EvalError::NoEnvironment)?;
        let Some(EvalTree::MeetUnion(tree)) = env.tree() else {
            return Err(EvalError::WrongQueryKind {
                expected: "meet/union",
            });
        };
        let mut poller = Poller::new(&self.interrupt, self.config.get_poll_interval());
        let (list, status) = match evaluate_meet_tree(tree, env, &self.query_corpus, &mut poller)? {
            Some(list) => (list, QueryStatus::Completed),
            None => (MatchList::new(), QueryStatus::Interrupted),
        };
        Ok(self.finish(list, status, cut, keep_old_ranges))
    }

    /// Run the active TAB query and commit its matches.
    pub fn run_tabular_query(
        &mut self,
        cut: Option<usize>,
        keep_old_ranges: bool,
    ) -> Result<QueryStatus, EvalError> {
        let env = self.environment().ok_or(EvalError::NoEnvironment)?;
        let Some(EvalTree::Tab(columns)) = env.tree() else {
            return Err(EvalError::WrongQueryKind { expected: "TAB" });
        };
        let mut poller = Poller::new(&self.interrupt, self.config.get_poll_interval());
        let list = evaluate_tab(columns, env, &self.query_corpus, &self.config, &mut poller)?;
        let status = poller.status();
        Ok(self.finish(list, status, cut, keep_old_ranges))
    }

    fn finish(
        &mut self,
        mut list: MatchList,
        status: QueryStatus,
        cut: Option<usize>,
        keep_old_ranges: bool,
    ) -> QueryStatus {
        if let Some(n) = cut {
            list.truncate(n);
        }
        self.query_corpus.commit(&list, keep_old_ranges);
        if status == QueryStatus::Interrupted {
            self.interrupt.store(false, Ordering::Relaxed);
        }
        tracing::debug!(
            corpus = self.query_corpus.name(),
            matches = list.len(),
            ?status,
            "query finished"
        );
        status
    }
}
