//! # Handler dispatch
//!
//! Registry of application handlers and the rules that pick one per update: exact handlers match a
//! callback query's data, pattern handlers match message text within a chat scope through either
//! the specificity tree or a registration-order scan. The selected handler runs as its own task.

mod dispatcher;
mod linear;
mod pattern;
mod registry;
mod tree;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use linear::LinearMatcher;
pub use pattern::{MatchStrategy, PatternHandler, PatternMatcher};
pub use registry::{ExactHandler, HandlerRegistry, Selection};
pub use tree::DispatchTree;

// Integration tests live in tests/dispatch_test.rs
