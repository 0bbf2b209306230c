//! Event gate for cluster automation: decides which Warning events fire
//! downstream actions, with per-service fixed-window rate limiting.

pub mod app;
pub mod config;
pub mod event;
pub mod logging;
pub mod rate_limiter;
pub mod registry;
pub mod service_resolver;
pub mod trigger;

pub use config::{ConfigError, GateConfig, TriggerParams, TriggerSpec};
pub use event::{ChangeEvent, EventObject, ObjectMeta, ObjectRef, OperationKind, EVENT_KIND};
pub use logging::{DecisionLogger, LogLevel, LogRotationPolicy, LogSegment, LoggingError};
pub use rate_limiter::{
    DynClock, MonotonicClock, RateLimiter, RateLimiterStats, SystemMonotonicClock,
};
pub use registry::{DispatchReport, DispatchTelemetry, RegistryError, TriggerRegistry};
pub use service_resolver::{DiscoveredWorkload, ServiceKeyResolver};
pub use trigger::{
    DenyReason, FireDecision, LabelSelector, ResourceScope, RuleValidationError, ScopeError,
    TriggerContext, TriggerRule, WarningEventTrigger, DEFAULT_RATE_LIMIT_SECONDS,
    TRIGGER_BUCKET_PREFIX, WARNING_EVENT_TYPE,
};
