use eventgate::{
    ChangeEvent, GateConfig, LogLevel, MonotonicClock, OperationKind, RateLimiter, RegistryError,
    ServiceKeyResolver, TriggerRegistry, TriggerRule, WarningEventTrigger,
};
use serde_json::{json, Value};
use std::sync::Arc;

struct MockClock {
    readings: Vec<u128>,
    idx: usize,
}

impl MockClock {
    fn new(readings: Vec<u128>) -> Self {
        Self { readings, idx: 0 }
    }
}

impl MonotonicClock for MockClock {
    fn now_ns(&mut self) -> u128 {
        let reading = self
            .readings
            .get(self.idx)
            .copied()
            .unwrap_or_else(|| *self.readings.last().unwrap());
        self.idx += 1;
        reading
    }
}

const SECOND_NS: u128 = 1_000_000_000;

fn crash_event(pod: &str) -> ChangeEvent {
    ChangeEvent::new("Event", OperationKind::Create).with_object(json!({
        "metadata": {"name": format!("{pod}.17f4a6c2"), "namespace": "prod"},
        "type": "Warning",
        "reason": "BackOff",
        "message": "CrashLoopBackOff: back-off restarting failed container",
        "regarding": {"name": pod, "namespace": "prod"},
    }))
}

#[test]
fn config_driven_registry_gates_repeat_warnings() {
    let raw = r#"{
        "triggers": [
            {
                "on": "warning_event_create",
                "name": "crash-alerts",
                "rate_limit": 60,
                "include": ["crash"]
            }
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();
    let limiter = Arc::new(RateLimiter::with_clock(Box::new(MockClock::new(vec![
        0,
        30 * SECOND_NS,
        61 * SECOND_NS,
    ]))));
    let resolver = Arc::new(ServiceKeyResolver::new());
    let registry = TriggerRegistry::from_config(&config, limiter, resolver).unwrap();
    assert_eq!(registry.rule_names(), vec!["crash-alerts"]);

    let event = crash_event("web-abc");
    let first = registry.dispatch(&event);
    assert_eq!(first.fired, vec!["crash-alerts"]);
    assert_eq!(first.evaluated, 1);

    let second = registry.dispatch(&event);
    assert!(second.fired.is_empty());
    assert_eq!(second.deny_reasons.get("RATE_LIMITED"), Some(&1));

    let third = registry.dispatch(&event);
    assert_eq!(third.fired, vec!["crash-alerts"]);

    let telemetry = registry.telemetry();
    assert_eq!(telemetry.evaluated_total, 3);
    assert_eq!(telemetry.fired_total, 2);
    assert_eq!(telemetry.deny_reasons.get("RATE_LIMITED"), Some(&1));
}

#[test]
fn every_rule_sees_every_event_in_registration_order() {
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let mut registry = TriggerRegistry::new(limiter, resolver);
    registry
        .register(
            "all-warnings",
            WarningEventTrigger::new(TriggerRule::new()).unwrap(),
        )
        .unwrap();
    registry
        .register(
            "crash-only",
            WarningEventTrigger::new(TriggerRule::new().with_include(["crash"])).unwrap(),
        )
        .unwrap();
    registry
        .register(
            "oom-only",
            WarningEventTrigger::new(TriggerRule::new().with_include(["oom"])).unwrap(),
        )
        .unwrap();

    let report = registry.dispatch(&crash_event("web-abc"));
    assert_eq!(report.evaluated, 3);
    assert_eq!(report.fired, vec!["all-warnings", "crash-only"]);
    assert_eq!(report.deny_reasons.get("NO_INCLUDE_MATCH"), Some(&1));
}

#[test]
fn duplicate_rule_names_are_rejected() {
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let mut registry = TriggerRegistry::new(limiter, resolver);
    let trigger = WarningEventTrigger::new(TriggerRule::new()).unwrap();
    registry.register("alerts", trigger.clone()).unwrap();

    let err = registry.register("alerts", trigger).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::DuplicateRuleName { name } if name == "alerts"
    ));
}

#[test]
fn empty_rule_names_are_rejected() {
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let mut registry = TriggerRegistry::new(limiter, resolver);
    let trigger = WarningEventTrigger::new(TriggerRule::new()).unwrap();

    let err = registry.register("", trigger).unwrap_err();
    assert!(matches!(err, RegistryError::EmptyRuleName));
}

#[test]
fn fired_rules_are_logged_as_json_lines() {
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let mut registry = TriggerRegistry::new(limiter, resolver);
    registry
        .register(
            "crash-alerts",
            WarningEventTrigger::new(TriggerRule::new()).unwrap(),
        )
        .unwrap();
    registry.dispatch(&crash_event("web-abc"));

    let lines = registry.log_lines();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["level"], "INFO");
    assert_eq!(parsed["component"], "dispatch");
    assert_eq!(parsed["rule"], "crash-alerts");
}

#[test]
fn debug_level_exposes_deny_decisions() {
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());
    let mut registry = TriggerRegistry::new(limiter, resolver);
    registry
        .register(
            "create-only",
            WarningEventTrigger::on_create(TriggerRule::new()).unwrap(),
        )
        .unwrap();

    let mut event = crash_event("web-abc");
    event.operation = OperationKind::Update;

    // Denies are below the default level.
    registry.dispatch(&event);
    assert!(registry.log_lines().is_empty());

    registry.set_log_level(LogLevel::Debug);
    registry.dispatch(&event);
    let lines = registry.log_lines();
    assert_eq!(lines.len(), 1);
    let parsed: Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(parsed["message"], "denied: OPERATION_FILTERED");
}

#[test]
fn config_errors_surface_the_rule_name() {
    let raw = r#"{
        "triggers": [
            {"on": "warning_event", "name": "broken", "rate_limit": 0}
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();
    let limiter = Arc::new(RateLimiter::new());
    let resolver = Arc::new(ServiceKeyResolver::new());

    let err = TriggerRegistry::from_config(&config, limiter, resolver).unwrap_err();
    assert!(err.to_string().contains("broken"));
}
