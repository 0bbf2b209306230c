use eventgate::{
    ConfigError, GateConfig, OperationKind, TriggerParams, TriggerSpec,
    DEFAULT_RATE_LIMIT_SECONDS,
};

#[test]
fn minimal_document_applies_defaults() {
    let raw = r#"{"triggers": [{"on": "warning_event", "name": "all-warnings"}]}"#;
    let config = GateConfig::from_json(raw).unwrap();
    assert_eq!(config.triggers.len(), 1);

    let spec = &config.triggers[0];
    assert_eq!(spec.name(), "all-warnings");
    assert_eq!(spec.params().rate_limit, DEFAULT_RATE_LIMIT_SECONDS);
    assert!(spec.params().operations.is_empty());
    assert!(spec.params().include.is_empty());

    let trigger = spec.build().unwrap();
    assert_eq!(trigger.rule().rate_limit_seconds(), 3_600);
    assert!(trigger.rule().allows_operation(OperationKind::Update));
}

#[test]
fn params_built_in_code_match_the_parsed_form() {
    let raw = r#"{
        "triggers": [
            {"on": "warning_event_create", "name": "crash-alerts", "include": ["crash"]}
        ]
    }"#;
    let parsed = GateConfig::from_json(raw).unwrap();

    let mut params = TriggerParams::named("crash-alerts");
    params.include = vec!["crash".to_string()];
    let spec = TriggerSpec::WarningEventCreate(params);
    assert_eq!(spec, parsed.triggers[0]);

    let trigger = spec.build().unwrap();
    assert_eq!(trigger.rule().rate_limit_seconds(), DEFAULT_RATE_LIMIT_SECONDS);
    assert_eq!(trigger.rule().include(), ["crash"]);
}

#[test]
fn empty_document_is_allowed() {
    assert!(GateConfig::from_json("{}").unwrap().triggers.is_empty());
    assert!(GateConfig::from_json(r#"{"triggers": []}"#)
        .unwrap()
        .triggers
        .is_empty());
}

#[test]
fn explicit_operation_list_is_respected() {
    let raw = r#"{
        "triggers": [
            {"on": "warning_event", "name": "mutations", "operations": ["create", "delete"]}
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();
    let trigger = config.triggers[0].build().unwrap();

    assert!(trigger.rule().allows_operation(OperationKind::Create));
    assert!(trigger.rule().allows_operation(OperationKind::Delete));
    assert!(!trigger.rule().allows_operation(OperationKind::Update));
}

#[test]
fn preset_forms_pin_the_operation_filter() {
    // An operation list on a preset form is ignored; the form decides.
    let raw = r#"{
        "triggers": [
            {"on": "warning_event_delete", "name": "deletions", "operations": ["create"]}
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();
    assert!(matches!(
        config.triggers[0],
        TriggerSpec::WarningEventDelete(_)
    ));

    let trigger = config.triggers[0].build().unwrap();
    assert!(trigger.rule().allows_operation(OperationKind::Delete));
    assert!(!trigger.rule().allows_operation(OperationKind::Create));
}

#[test]
fn scope_and_filters_flow_into_the_rule() {
    let raw = r#"{
        "triggers": [
            {
                "on": "warning_event_create",
                "name": "prod-api-crashes",
                "name_prefix": "api-",
                "namespace_prefix": "prod",
                "labels_selector": "team=payments,tier=backend",
                "rate_limit": 900,
                "exclude": ["ImagePull"],
                "include": ["crash", "oom"]
            }
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();
    let trigger = config.triggers[0].build().unwrap();

    assert_eq!(trigger.rule().rate_limit_seconds(), 900);
    assert_eq!(trigger.rule().exclude(), ["ImagePull"]);
    assert_eq!(trigger.rule().include(), ["crash", "oom"]);
}

#[test]
fn zero_rate_limit_is_rejected() {
    let raw = r#"{"triggers": [{"on": "warning_event", "name": "bad", "rate_limit": 0}]}"#;
    let config = GateConfig::from_json(raw).unwrap();

    let err = config.triggers[0].build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidRule { ref name, .. } if name == "bad"));
}

#[test]
fn malformed_label_selectors_are_rejected() {
    let raw = r#"{
        "triggers": [
            {"on": "warning_event", "name": "bad-scope", "labels_selector": "team"}
        ]
    }"#;
    let config = GateConfig::from_json(raw).unwrap();

    let err = config.triggers[0].build().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidScope { ref name, .. } if name == "bad-scope"));
}

#[test]
fn unknown_trigger_forms_fail_to_parse() {
    let raw = r#"{"triggers": [{"on": "pod_restart", "name": "nope"}]}"#;
    assert!(matches!(
        GateConfig::from_json(raw),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn unknown_operation_names_fail_to_parse() {
    let raw = r#"{
        "triggers": [
            {"on": "warning_event", "name": "bad-op", "operations": ["reboot"]}
        ]
    }"#;
    assert!(GateConfig::from_json(raw).is_err());
}
