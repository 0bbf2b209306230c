//! Warning-event trigger family: structural scoping, registration-time rules,
//! and the predicate chain that gates the rate limiter.

pub mod rule;
pub mod scope;
pub mod warning;

pub use rule::{RuleValidationError, TriggerRule, DEFAULT_RATE_LIMIT_SECONDS};
pub use scope::{LabelSelector, ResourceScope, ScopeError};
pub use warning::{
    DenyReason, FireDecision, TriggerContext, WarningEventTrigger, TRIGGER_BUCKET_PREFIX,
    WARNING_EVENT_TYPE,
};
