pub mod router;
pub mod types;

pub use router::{classify, IntentRouter, Route, INTENT_PRIORITY};
pub use types::{Intent, IntentKind};
