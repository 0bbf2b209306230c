use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Resource kind string carried by cluster Event notifications.
pub const EVENT_KIND: &str = "Event";

/// Operation observed on a cluster object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Unknown,
}

impl OperationKind {
    /// Returns the lowercase wire name used in trigger configuration.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
            OperationKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the object a cluster Event concerns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectRef {
    /// Creates a reference with both coordinates present.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            namespace: Some(namespace.into()),
        }
    }
}

/// Subset of object metadata consulted by structural scope matching.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Extracts metadata from a raw object payload, tolerating absent fields.
    pub fn from_object_value(object: &Value) -> Self {
        object
            .get("metadata")
            .and_then(|meta| ObjectMeta::deserialize(meta).ok())
            .unwrap_or_default()
    }
}

/// Typed view of a cluster Event payload.
///
/// Payloads originate as opaque JSON; only the fields the trigger chain reads
/// are modeled, and every one of them is optional so malformed notifications
/// degrade to a deny decision instead of a parse fault.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventObject {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regarding: Option<ObjectRef>,
}

impl EventObject {
    /// Decodes an Event payload from its raw JSON form.
    pub fn from_value(object: &Value) -> Option<Self> {
        if !object.is_object() {
            return None;
        }
        EventObject::deserialize(object).ok()
    }
}

/// Immutable record of a single cluster-object notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Resource type the notification concerns.
    pub kind: String,
    /// Operation the cluster watch observed.
    pub operation: OperationKind,
    /// New object state; absent on deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    /// Previous object state; absent on creates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_object: Option<Value>,
}

impl ChangeEvent {
    /// Creates a notification without payloads attached.
    pub fn new(kind: impl Into<String>, operation: OperationKind) -> Self {
        Self {
            kind: kind.into(),
            operation,
            object: None,
            previous_object: None,
        }
    }

    /// Attaches the new object state.
    pub fn with_object(mut self, object: Value) -> Self {
        self.object = Some(object);
        self
    }

    /// Attaches the previous object state.
    pub fn with_previous_object(mut self, previous: Value) -> Self {
        self.previous_object = Some(previous);
        self
    }

    /// Metadata of the new object state, or the empty default when absent.
    pub fn object_meta(&self) -> ObjectMeta {
        self.object
            .as_ref()
            .map(ObjectMeta::from_object_value)
            .unwrap_or_default()
    }
}
