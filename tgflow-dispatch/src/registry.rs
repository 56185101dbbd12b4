//! Handler registry: pattern handlers (text) and exact handlers (callback data).

use std::sync::Arc;

use tgflow_core::{Result, Update, UpdateHandler, UpdateKind};

use crate::linear::LinearMatcher;
use crate::pattern::{MatchStrategy, PatternHandler, PatternMatcher};
use crate::tree::DispatchTree;

/// Handler selected by literal equality with a callback query's data.
pub struct ExactHandler {
    key: String,
    handler: Arc<dyn UpdateHandler>,
}

impl ExactHandler {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn handler(&self) -> &Arc<dyn UpdateHandler> {
        &self.handler
    }
}

/// The handler chosen for one update.
pub enum Selection<'a> {
    Exact(&'a ExactHandler),
    Pattern(&'a PatternHandler),
}

impl Selection<'_> {
    pub fn handler(&self) -> &Arc<dyn UpdateHandler> {
        match self {
            Selection::Exact(h) => h.handler(),
            Selection::Pattern(h) => h.handler(),
        }
    }
}

/// Append-only collections of pattern and exact handlers. Nothing is ever unregistered.
pub struct HandlerRegistry {
    strategy: MatchStrategy,
    patterns: Box<dyn PatternMatcher>,
    exact: Vec<ExactHandler>,
}

impl HandlerRegistry {
    pub fn new(strategy: MatchStrategy) -> Self {
        let patterns: Box<dyn PatternMatcher> = match strategy {
            MatchStrategy::Tree => Box::new(DispatchTree::new()),
            MatchStrategy::Linear => Box::new(LinearMatcher::new()),
        };
        Self {
            strategy,
            patterns,
            exact: Vec::new(),
        }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Compiles and registers a pattern handler. On a compile error nothing is registered.
    pub fn register_pattern<I, S>(
        &mut self,
        pattern: &str,
        scopes: I,
        handler: Arc<dyn UpdateHandler>,
    ) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handler = PatternHandler::new(pattern, scopes, handler)?;
        self.patterns.insert(handler);
        Ok(())
    }

    pub fn register_exact(&mut self, key: impl Into<String>, handler: Arc<dyn UpdateHandler>) {
        self.exact.push(ExactHandler {
            key: key.into(),
            handler,
        });
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn exact_count(&self) -> usize {
        self.exact.len()
    }

    /// Picks at most one handler: callback updates scan exact handlers in registration order;
    /// updates with non-empty text go through the pattern matcher with the chat type as scope.
    pub fn select(&self, update: &Update) -> Option<Selection<'_>> {
        if let UpdateKind::CallbackQuery(query) = &update.kind {
            let data = query.data.as_deref()?;
            return self
                .exact
                .iter()
                .find(|h| h.key == data)
                .map(Selection::Exact);
        }

        let text = update.text()?;
        let scope = update.scope().unwrap_or_default();
        self.patterns.lookup(text, scope).map(Selection::Pattern)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new(MatchStrategy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::tests::noop;
    use serde_json::json;

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_selection_exposes_registered_handler() {
        let mut registry = HandlerRegistry::default();
        let start = noop();
        let no = noop();
        registry
            .register_pattern("^/start$", ["all"], start.clone())
            .unwrap();
        registry.register_exact("no", no.clone());

        let text = update(json!({
            "update_id": 1,
            "message": {"message_id": 1, "chat": {"id": 1, "type": "private"}, "text": "/start"}
        }));
        let selection = registry.select(&text).unwrap();
        assert!(matches!(selection, Selection::Pattern(_)));
        assert!(Arc::ptr_eq(selection.handler(), &start));

        let callback = update(json!({
            "update_id": 2,
            "callback_query": {"id": "cb", "from": {"id": 1}, "data": "no"}
        }));
        let selection = registry.select(&callback).unwrap();
        assert!(matches!(selection, Selection::Exact(h) if h.key() == "no"));
        assert!(Arc::ptr_eq(selection.handler(), &no));
    }
}
