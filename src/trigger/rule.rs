use crate::event::OperationKind;
use crate::trigger::scope::ResourceScope;
use std::collections::BTreeSet;
use thiserror::Error;

/// Window length applied when a rule does not configure one.
pub const DEFAULT_RATE_LIMIT_SECONDS: u64 = 3600;

/// Error raised when a rule fails registration-time validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleValidationError {
    #[error("rate limit window must be at least 1 second")]
    ZeroRateLimitWindow,
}

/// Registration-time trigger configuration, immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRule {
    scope: ResourceScope,
    rate_limit_seconds: u64,
    operations: BTreeSet<OperationKind>,
    exclude: Vec<String>,
    include: Vec<String>,
}

impl Default for TriggerRule {
    fn default() -> Self {
        Self {
            scope: ResourceScope::unrestricted(),
            rate_limit_seconds: DEFAULT_RATE_LIMIT_SECONDS,
            operations: BTreeSet::new(),
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }
}

impl TriggerRule {
    /// Creates a rule with defaults: unrestricted scope, one-hour window,
    /// all operations admitted, no content filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the structural scope filter.
    pub fn with_scope(mut self, scope: ResourceScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the rate-limit window in seconds.
    pub fn with_rate_limit(mut self, seconds: u64) -> Self {
        self.rate_limit_seconds = seconds;
        self
    }

    /// Restricts the rule to the provided operations; empty means all.
    pub fn with_operations(mut self, operations: impl IntoIterator<Item = OperationKind>) -> Self {
        self.operations = operations.into_iter().collect();
        self
    }

    /// Sets the substrings whose presence in event content denies.
    pub fn with_exclude<S: Into<String>>(mut self, exclude: impl IntoIterator<Item = S>) -> Self {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the substrings of which at least one must appear in event content.
    pub fn with_include<S: Into<String>>(mut self, include: impl IntoIterator<Item = S>) -> Self {
        self.include = include.into_iter().map(Into::into).collect();
        self
    }

    /// Structural scope filter.
    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }

    /// Rate-limit window in seconds.
    pub fn rate_limit_seconds(&self) -> u64 {
        self.rate_limit_seconds
    }

    /// Configured operation filter; empty admits every operation.
    pub fn operations(&self) -> &BTreeSet<OperationKind> {
        &self.operations
    }

    /// Configured exclusion substrings.
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Configured inclusion substrings.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Rejects misconfigured rules before any event is evaluated.
    pub fn validate(&self) -> Result<(), RuleValidationError> {
        if self.rate_limit_seconds == 0 {
            return Err(RuleValidationError::ZeroRateLimitWindow);
        }
        Ok(())
    }

    /// True when the operation passes the filter.
    pub fn allows_operation(&self, operation: OperationKind) -> bool {
        self.operations.is_empty() || self.operations.contains(&operation)
    }

    /// True when any exclusion substring occurs in the lowercased content.
    pub fn excludes_content(&self, content: &str) -> bool {
        self.exclude
            .iter()
            .any(|exclusion| content.contains(&exclusion.to_lowercase()))
    }

    /// True when the inclusion filter is empty or any entry occurs in content.
    pub fn includes_content(&self, content: &str) -> bool {
        self.include.is_empty()
            || self
                .include
                .iter()
                .any(|inclusion| content.contains(&inclusion.to_lowercase()))
    }
}
