//! Pattern handlers and the lookup contract shared by the tree and linear matchers.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tgflow_core::{Result, UpdateHandler, SCOPE_ALL};

/// Handler selected by matching text against a compiled pattern, restricted to a set of scope
/// labels (`"all"` accepts every scope). Immutable once built.
pub struct PatternHandler {
    regex: Regex,
    scopes: HashSet<String>,
    handler: Arc<dyn UpdateHandler>,
}

impl PatternHandler {
    /// Compiles `pattern`; fails with [`tgflow_core::BotError::Compile`] on invalid syntax.
    pub fn new<I, S>(pattern: &str, scopes: I, handler: Arc<dyn UpdateHandler>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            regex: Regex::new(pattern)?,
            scopes: scopes.into_iter().map(Into::into).collect(),
            handler,
        })
    }

    /// Source text the pattern was compiled from.
    pub fn source(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// True when the scope set holds `scope` or the wildcard.
    pub fn accepts(&self, scope: &str) -> bool {
        self.scopes.contains(SCOPE_ALL) || self.scopes.contains(scope)
    }

    pub fn handler(&self) -> &Arc<dyn UpdateHandler> {
        &self.handler
    }
}

impl fmt::Debug for PatternHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        scopes.sort_unstable();
        f.debug_struct("PatternHandler")
            .field("pattern", &self.source())
            .field("scopes", &scopes)
            .finish()
    }
}

/// Index over pattern handlers: append-only insertion, at most one handler per lookup.
pub trait PatternMatcher: Send + Sync {
    fn insert(&mut self, handler: PatternHandler);

    /// Best handler for `text` arriving from a chat with scope label `scope`, if any.
    fn lookup(&self, text: &str, scope: &str) -> Option<&PatternHandler>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Which [`PatternMatcher`] the registry uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Specificity tree ([`crate::DispatchTree`]).
    #[default]
    Tree,
    /// First match in registration order ([`crate::LinearMatcher`]).
    Linear,
}

impl std::str::FromStr for MatchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tree" => Ok(Self::Tree),
            "linear" => Ok(Self::Linear),
            other => Err(format!("unknown match strategy: {}", other)),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tree => f.write_str("tree"),
            Self::Linear => f.write_str("linear"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tgflow_core::{handler_fn, BotError, Update};

    pub(crate) fn noop() -> Arc<dyn UpdateHandler> {
        Arc::new(handler_fn(|_update: Update| async { Ok(()) }))
    }

    #[test]
    fn test_wildcard_scope_accepts_everything() {
        let h = PatternHandler::new("^/start$", ["all"], noop()).unwrap();
        assert!(h.accepts("private"));
        assert!(h.accepts("supergroup"));
        assert!(h.accepts(""));
    }

    #[test]
    fn test_named_scope_only() {
        let h = PatternHandler::new("hi", ["group", "supergroup"], noop()).unwrap();
        assert!(h.accepts("group"));
        assert!(!h.accepts("private"));
    }

    #[test]
    fn test_invalid_pattern_is_compile_error() {
        let err = PatternHandler::new("([", ["all"], noop()).unwrap_err();
        assert!(matches!(err, BotError::Compile(_)));
    }

    #[test]
    fn test_match_strategy_parse() {
        assert_eq!("tree".parse::<MatchStrategy>().unwrap(), MatchStrategy::Tree);
        assert_eq!(" Linear ".parse::<MatchStrategy>().unwrap(), MatchStrategy::Linear);
        assert!("fuzzy".parse::<MatchStrategy>().is_err());
    }
}
