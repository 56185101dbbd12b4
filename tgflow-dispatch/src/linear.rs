//! Registration-order matcher: the first handler whose pattern matches and whose scope set accepts
//! the scope wins.

use crate::pattern::{PatternHandler, PatternMatcher};

#[derive(Debug, Default)]
pub struct LinearMatcher {
    handlers: Vec<PatternHandler>,
}

impl LinearMatcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternMatcher for LinearMatcher {
    fn insert(&mut self, handler: PatternHandler) {
        self.handlers.push(handler);
    }

    fn lookup(&self, text: &str, scope: &str) -> Option<&PatternHandler> {
        self.handlers
            .iter()
            .find(|h| h.accepts(scope) && h.matches(text))
    }

    fn len(&self) -> usize {
        self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::tests::noop;

    #[test]
    fn test_first_registered_match_wins() {
        let mut m = LinearMatcher::new();
        m.insert(PatternHandler::new("help", ["all"], noop()).unwrap());
        m.insert(PatternHandler::new("help admin", ["all"], noop()).unwrap());

        // Unlike the tree, registration order decides.
        assert_eq!(m.lookup("help admin", "private").unwrap().source(), "help");
    }

    #[test]
    fn test_scope_filter_skips_to_next() {
        let mut m = LinearMatcher::new();
        m.insert(PatternHandler::new("^/ban", ["group"], noop()).unwrap());
        m.insert(PatternHandler::new("^/", ["private"], noop()).unwrap());

        assert_eq!(m.lookup("/ban 42", "private").unwrap().source(), "^/");
        assert_eq!(m.lookup("/ban 42", "group").unwrap().source(), "^/ban");
        assert!(m.lookup("/ban 42", "channel").is_none());
    }
}
