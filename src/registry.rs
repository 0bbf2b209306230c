use crate::config::{ConfigError, GateConfig};
use crate::event::ChangeEvent;
use crate::logging::{DecisionLogger, LogLevel};
use crate::rate_limiter::{DynClock, RateLimiter, SystemMonotonicClock};
use crate::service_resolver::ServiceKeyResolver;
use crate::trigger::{DenyReason, FireDecision, TriggerContext, WarningEventTrigger};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Component tag stamped on every dispatch log record.
const DISPATCH_COMPONENT: &str = "dispatch";

/// Component tag stamped on registration log records.
const REGISTRY_COMPONENT: &str = "registry";

/// Errors surfaced while registering triggers.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("trigger rule name must not be empty")]
    EmptyRuleName,
    #[error("trigger rule '{name}' is already registered")]
    DuplicateRuleName { name: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Outcome of routing one event through every registered rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Names of rules that fired, in registration order.
    pub fired: Vec<String>,
    /// Number of rules evaluated for the event.
    pub evaluated: usize,
    /// Deny reasons tallied across the rules that declined.
    pub deny_reasons: BTreeMap<String, u64>,
}

/// Cumulative dispatch counters since registry construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchTelemetry {
    pub evaluated_total: u64,
    pub fired_total: u64,
    pub deny_reasons: BTreeMap<String, u64>,
}

struct RegisteredTrigger {
    name: String,
    trigger: WarningEventTrigger,
}

/// Ordered collection of named rules sharing one limiter and one resolver.
///
/// Dispatch takes `&self`, so one registry can serve concurrent event streams;
/// every rule sees every event in registration order and the report says which
/// rules fired. One event firing several rules is expected, not a conflict.
pub struct TriggerRegistry {
    triggers: Vec<RegisteredTrigger>,
    limiter: Arc<RateLimiter>,
    resolver: Arc<ServiceKeyResolver>,
    counters: Mutex<DispatchCounters>,
    logger: Mutex<DecisionLogger>,
    clock: Mutex<DynClock>,
}

// Manual impl because `DynClock` is a trait object without a `Debug` bound.
impl std::fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("rules", &self.rule_names())
            .finish_non_exhaustive()
    }
}

impl TriggerRegistry {
    /// Creates an empty registry over shared limiter and resolver state.
    pub fn new(limiter: Arc<RateLimiter>, resolver: Arc<ServiceKeyResolver>) -> Self {
        Self::with_clock(limiter, resolver, Box::new(SystemMonotonicClock::new()))
    }

    /// Creates a registry whose log timestamps come from the provided clock.
    pub fn with_clock(
        limiter: Arc<RateLimiter>,
        resolver: Arc<ServiceKeyResolver>,
        clock: DynClock,
    ) -> Self {
        Self {
            triggers: Vec::new(),
            limiter,
            resolver,
            counters: Mutex::new(DispatchCounters::default()),
            logger: Mutex::new(DecisionLogger::default()),
            clock: Mutex::new(clock),
        }
    }

    /// Builds a registry from a parsed trigger document.
    pub fn from_config(
        config: &GateConfig,
        limiter: Arc<RateLimiter>,
        resolver: Arc<ServiceKeyResolver>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::new(limiter, resolver);
        for spec in &config.triggers {
            let trigger = spec.build()?;
            registry.register(spec.name(), trigger)?;
        }
        Ok(registry)
    }

    /// Registers a trigger under a unique, non-empty rule name.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        trigger: WarningEventTrigger,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyRuleName);
        }
        if self.triggers.iter().any(|entry| entry.name == name) {
            return Err(RegistryError::DuplicateRuleName { name });
        }
        self.log_registration(&name);
        self.triggers.push(RegisteredTrigger { name, trigger });
        Ok(())
    }

    /// Rule names in registration order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.triggers.iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns true when no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Evaluates one event against every registered rule.
    pub fn dispatch(&self, event: &ChangeEvent) -> DispatchReport {
        let ctx = TriggerContext::new(&self.limiter, &self.resolver);
        let mut report = DispatchReport::default();
        for entry in &self.triggers {
            report.evaluated += 1;
            match entry.trigger.evaluate(event, &entry.name, &ctx) {
                FireDecision::Fire => {
                    self.log_fire(&entry.name, event);
                    report.fired.push(entry.name.clone());
                }
                FireDecision::Deny(reason) => {
                    self.log_deny(&entry.name, reason);
                    *report
                        .deny_reasons
                        .entry(reason.as_str().to_string())
                        .or_insert(0) += 1;
                }
            }
        }
        let mut counters = self.counters.lock().unwrap();
        counters.evaluated_total += report.evaluated as u64;
        counters.fired_total += report.fired.len() as u64;
        for (reason, count) in &report.deny_reasons {
            *counters.deny_reasons.entry(reason.clone()).or_insert(0) += count;
        }
        report
    }

    /// Snapshot of cumulative dispatch counters.
    pub fn telemetry(&self) -> DispatchTelemetry {
        let counters = self.counters.lock().unwrap();
        DispatchTelemetry {
            evaluated_total: counters.evaluated_total,
            fired_total: counters.fired_total,
            deny_reasons: counters.deny_reasons.clone(),
        }
    }

    /// Every retained decision-log line in emission order.
    pub fn log_lines(&self) -> Vec<String> {
        self.logger.lock().unwrap().lines()
    }

    /// Applies a dynamic log-level override to the decision log.
    pub fn set_log_level(&self, level: LogLevel) {
        self.logger.lock().unwrap().set_level(level);
    }

    fn log_fire(&self, rule: &str, event: &ChangeEvent) {
        let ts_ms = self.now_ms();
        let message = format!("fired on {} {}", event.operation, event.kind);
        // A record that fails to serialize must not change the decision.
        let _ = self
            .logger
            .lock()
            .unwrap()
            .log(ts_ms, LogLevel::Info, DISPATCH_COMPONENT, rule, &message);
    }

    fn log_registration(&self, rule: &str) {
        let ts_ms = self.now_ms();
        let _ = self
            .logger
            .lock()
            .unwrap()
            .log(ts_ms, LogLevel::Debug, REGISTRY_COMPONENT, rule, "registered");
    }

    fn log_deny(&self, rule: &str, reason: DenyReason) {
        let ts_ms = self.now_ms();
        let message = format!("denied: {}", reason.as_str());
        let _ = self
            .logger
            .lock()
            .unwrap()
            .log(ts_ms, LogLevel::Debug, DISPATCH_COMPONENT, rule, &message);
    }

    fn now_ms(&self) -> u64 {
        let mut clock = self.clock.lock().unwrap();
        (clock.now_ns() / 1_000_000) as u64
    }
}

#[derive(Default)]
struct DispatchCounters {
    evaluated_total: u64,
    fired_total: u64,
    deny_reasons: BTreeMap<String, u64>,
}
