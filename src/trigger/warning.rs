use crate::event::{ChangeEvent, EventObject, OperationKind, EVENT_KIND};
use crate::rate_limiter::RateLimiter;
use crate::service_resolver::ServiceKeyResolver;
use crate::trigger::rule::{RuleValidationError, TriggerRule};

/// Event type string that warning triggers require.
pub const WARNING_EVENT_TYPE: &str = "Warning";

/// Prefix of every rate-limiter bucket key produced by warning triggers.
pub const TRIGGER_BUCKET_PREFIX: &str = "WarningEventTrigger";

/// Shared collaborators handed into each evaluation by the dispatch root.
pub struct TriggerContext<'a> {
    limiter: &'a RateLimiter,
    resolver: &'a ServiceKeyResolver,
}

impl<'a> TriggerContext<'a> {
    /// Borrows the limiter and resolver owned by the dispatch root.
    pub fn new(limiter: &'a RateLimiter, resolver: &'a ServiceKeyResolver) -> Self {
        Self { limiter, resolver }
    }
}

/// Reason a trigger declined to fire for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    ScopeMismatch,
    NotAnEventObject,
    MissingPayload,
    MissingRegarding,
    NotWarning,
    OperationFiltered,
    ContentExcluded,
    NoIncludeMatch,
    RateLimited,
}

impl DenyReason {
    /// Canonical reason name used in counters and decision logs.
    pub fn as_str(self) -> &'static str {
        match self {
            DenyReason::ScopeMismatch => "SCOPE_MISMATCH",
            DenyReason::NotAnEventObject => "NOT_AN_EVENT_OBJECT",
            DenyReason::MissingPayload => "MISSING_PAYLOAD",
            DenyReason::MissingRegarding => "MISSING_REGARDING",
            DenyReason::NotWarning => "NOT_WARNING",
            DenyReason::OperationFiltered => "OPERATION_FILTERED",
            DenyReason::ContentExcluded => "CONTENT_EXCLUDED",
            DenyReason::NoIncludeMatch => "NO_INCLUDE_MATCH",
            DenyReason::RateLimited => "RATE_LIMITED",
        }
    }
}

/// Outcome of evaluating one event against one registered rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    Fire,
    Deny(DenyReason),
}

impl FireDecision {
    /// Boolean projection of the decision.
    pub fn should_fire(self) -> bool {
        matches!(self, FireDecision::Fire)
    }
}

/// Decides whether a cluster Warning event should fire a downstream action.
///
/// One configurable type covers all change operations; the `on_create`,
/// `on_update`, and `on_delete` presets pin the operation filter for callers
/// that want the narrower registration surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningEventTrigger {
    rule: TriggerRule,
}

impl WarningEventTrigger {
    /// Builds a trigger for all change operations the rule admits.
    pub fn new(rule: TriggerRule) -> Result<Self, RuleValidationError> {
        rule.validate()?;
        Ok(Self { rule })
    }

    /// Builds a trigger that only fires on create notifications.
    pub fn on_create(rule: TriggerRule) -> Result<Self, RuleValidationError> {
        Self::new(rule.with_operations([OperationKind::Create]))
    }

    /// Builds a trigger that only fires on update notifications.
    pub fn on_update(rule: TriggerRule) -> Result<Self, RuleValidationError> {
        Self::new(rule.with_operations([OperationKind::Update]))
    }

    /// Builds a trigger that only fires on delete notifications.
    pub fn on_delete(rule: TriggerRule) -> Result<Self, RuleValidationError> {
        Self::new(rule.with_operations([OperationKind::Delete]))
    }

    /// The immutable rule this trigger was registered with.
    pub fn rule(&self) -> &TriggerRule {
        &self.rule
    }

    /// Boolean decision contract: true when the event should fire.
    pub fn should_fire(
        &self,
        event: &ChangeEvent,
        rule_id: &str,
        ctx: &TriggerContext<'_>,
    ) -> bool {
        self.evaluate(event, rule_id, ctx).should_fire()
    }

    /// Runs the full decision chain and reports why an event was denied.
    ///
    /// Every abnormal shape resolves to a deny, never an error: a
    /// notification the chain cannot evaluate must not fire.
    pub fn evaluate(
        &self,
        event: &ChangeEvent,
        rule_id: &str,
        ctx: &TriggerContext<'_>,
    ) -> FireDecision {
        if !self.rule.scope().allows(&event.object_meta()) {
            return FireDecision::Deny(DenyReason::ScopeMismatch);
        }
        if event.kind != EVENT_KIND {
            return FireDecision::Deny(DenyReason::NotAnEventObject);
        }
        let Some(raw) = event.object.as_ref() else {
            return FireDecision::Deny(DenyReason::MissingPayload);
        };
        let Some(object) = EventObject::from_value(raw) else {
            return FireDecision::Deny(DenyReason::NotAnEventObject);
        };
        let Some(regarding) = object.regarding.as_ref() else {
            return FireDecision::Deny(DenyReason::MissingRegarding);
        };
        if object.event_type.as_deref() != Some(WARNING_EVENT_TYPE) {
            return FireDecision::Deny(DenyReason::NotWarning);
        }
        if !self.rule.allows_operation(event.operation) {
            return FireDecision::Deny(DenyReason::OperationFiltered);
        }

        let reason = object.reason.as_deref().unwrap_or_default();
        let message = object.message.as_deref().unwrap_or_default();
        let content = format!("{reason}{message}").to_lowercase();
        if self.rule.excludes_content(&content) {
            return FireDecision::Deny(DenyReason::ContentExcluded);
        }
        if !self.rule.includes_content(&content) {
            return FireDecision::Deny(DenyReason::NoIncludeMatch);
        }

        let name = regarding.name.as_deref().unwrap_or_default();
        let namespace = regarding.namespace.as_deref().unwrap_or_default();
        let service_key = ctx
            .resolver
            .guess_service_key(name, namespace)
            .unwrap_or_else(|| format!("{namespace}:{name}"));
        let bucket = format!("{TRIGGER_BUCKET_PREFIX}_{rule_id}_{reason}");
        if ctx
            .limiter
            .mark_and_test(&bucket, &service_key, self.rule.rate_limit_seconds())
        {
            FireDecision::Fire
        } else {
            FireDecision::Deny(DenyReason::RateLimited)
        }
    }
}
