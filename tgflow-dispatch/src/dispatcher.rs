//! Routes one update to at most one registered handler and runs it as a detached task.

use std::sync::{Arc, PoisonError, RwLock};

use tgflow_core::{Result, Update, UpdateHandler};
use tracing::{debug, error, info};

use crate::pattern::MatchStrategy;
use crate::registry::{HandlerRegistry, Selection};

/// What dispatch decided for an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// An exact handler with this key was spawned.
    Exact(String),
    /// A pattern handler with this source pattern was spawned.
    Pattern(String),
    Unmatched,
}

/// Shared front of the [`HandlerRegistry`]. Registration takes the write lock and is meant to
/// happen before ingestion starts; dispatch only reads.
pub struct Dispatcher {
    registry: RwLock<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self {
            registry: RwLock::new(HandlerRegistry::new(strategy)),
        }
    }

    pub fn register_pattern<I, S>(
        &self,
        pattern: &str,
        scopes: I,
        handler: Arc<dyn UpdateHandler>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.register_pattern(pattern, scopes, handler)?;
        info!(pattern = %pattern, strategy = %registry.strategy(), "Pattern handler registered");
        Ok(())
    }

    pub fn register_exact(&self, key: impl Into<String>, handler: Arc<dyn UpdateHandler>) {
        let key = key.into();
        info!(key = %key, "Exact handler registered");
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_exact(key, handler);
    }

    /// Selects a handler for `update` and spawns it on the current tokio runtime. Returns without
    /// waiting for the handler; its failure is only logged.
    pub fn dispatch(&self, update: &Update) -> DispatchOutcome {
        let (outcome, handler) = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            let Some(selection) = registry.select(update) else {
                debug!(
                    update_id = update.update_id,
                    kind = update.kind_name(),
                    "No handler matched"
                );
                return DispatchOutcome::Unmatched;
            };
            let outcome = match &selection {
                Selection::Exact(h) => DispatchOutcome::Exact(h.key().to_string()),
                Selection::Pattern(h) => DispatchOutcome::Pattern(h.source().to_string()),
            };
            (outcome, selection.handler().clone())
        };

        info!(
            update_id = update.update_id,
            outcome = ?outcome,
            "step: handler selected, spawning"
        );

        let update = update.clone();
        let outcome_for_task = outcome.clone();
        tokio::spawn(async move {
            let update_id = update.update_id;
            if let Err(e) = handler.handle(update).await {
                error!(
                    error = %e,
                    update_id = update_id,
                    outcome = ?outcome_for_task,
                    "Handler failed"
                );
            }
        });

        outcome
    }

    pub fn pattern_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pattern_count()
    }

    pub fn exact_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .exact_count()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(MatchStrategy::default())
    }
}
