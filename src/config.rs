use crate::event::OperationKind;
use crate::trigger::{
    ResourceScope, RuleValidationError, ScopeError, TriggerRule, WarningEventTrigger,
    DEFAULT_RATE_LIMIT_SECONDS,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced while loading or compiling a trigger document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse trigger config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("trigger '{name}': {source}")]
    InvalidScope {
        name: String,
        #[source]
        source: ScopeError,
    },
    #[error("trigger '{name}': {source}")]
    InvalidRule {
        name: String,
        #[source]
        source: RuleValidationError,
    },
}

/// Root of the trigger configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,
}

impl GateConfig {
    /// Parses a JSON trigger document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// One trigger entry, tagged by the registration surface it uses.
///
/// The `warning_event` form accepts an explicit operation list; the three
/// preset forms pin it, mirroring the narrower constructors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "on", rename_all = "snake_case")]
pub enum TriggerSpec {
    WarningEvent(TriggerParams),
    WarningEventCreate(TriggerParams),
    WarningEventUpdate(TriggerParams),
    WarningEventDelete(TriggerParams),
}

impl TriggerSpec {
    /// Rule name this spec registers under.
    pub fn name(&self) -> &str {
        &self.params().name
    }

    /// Shared registration parameters.
    pub fn params(&self) -> &TriggerParams {
        match self {
            TriggerSpec::WarningEvent(params)
            | TriggerSpec::WarningEventCreate(params)
            | TriggerSpec::WarningEventUpdate(params)
            | TriggerSpec::WarningEventDelete(params) => params,
        }
    }

    /// Compiles the spec into a trigger, rejecting misconfiguration.
    pub fn build(&self) -> Result<WarningEventTrigger, ConfigError> {
        let params = self.params();
        let scope = params.scope().map_err(|source| ConfigError::InvalidScope {
            name: params.name.clone(),
            source,
        })?;
        let rule = TriggerRule::new()
            .with_scope(scope)
            .with_rate_limit(params.rate_limit)
            .with_exclude(params.exclude.iter().cloned())
            .with_include(params.include.iter().cloned());
        let built = match self {
            TriggerSpec::WarningEvent(params) => {
                WarningEventTrigger::new(rule.with_operations(params.operations.iter().copied()))
            }
            TriggerSpec::WarningEventCreate(_) => WarningEventTrigger::on_create(rule),
            TriggerSpec::WarningEventUpdate(_) => WarningEventTrigger::on_update(rule),
            TriggerSpec::WarningEventDelete(_) => WarningEventTrigger::on_delete(rule),
        };
        built.map_err(|source| ConfigError::InvalidRule {
            name: params.name.clone(),
            source,
        })
    }
}

/// Registration parameters shared by every trigger form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerParams {
    /// Rule name; must be unique within one registry.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_selector: Option<String>,
    /// Rate-limit window in seconds.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u64,
    /// Operation filter for the `warning_event` form; empty admits all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<OperationKind>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

impl TriggerParams {
    /// Creates parameters for a named rule with every default applied.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_prefix: None,
            namespace_prefix: None,
            labels_selector: None,
            rate_limit: DEFAULT_RATE_LIMIT_SECONDS,
            operations: Vec::new(),
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }

    fn scope(&self) -> Result<ResourceScope, ScopeError> {
        let mut scope = ResourceScope::unrestricted();
        if let Some(prefix) = &self.name_prefix {
            scope = scope.with_name_prefix(prefix.clone());
        }
        if let Some(prefix) = &self.namespace_prefix {
            scope = scope.with_namespace_prefix(prefix.clone());
        }
        if let Some(selector) = &self.labels_selector {
            scope = scope.with_labels_selector(selector)?;
        }
        Ok(scope)
    }
}

fn default_rate_limit() -> u64 {
    DEFAULT_RATE_LIMIT_SECONDS
}
