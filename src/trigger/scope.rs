use crate::event::ObjectMeta;
use thiserror::Error;

/// Error raised when a label selector cannot be parsed at registration time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScopeError {
    #[error("invalid label selector segment '{segment}' (expected key=value)")]
    InvalidSelector { segment: String },
}

/// Equality label selector parsed from `"key=value,key2=value2"` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    pairs: Vec<(String, String)>,
}

impl LabelSelector {
    /// Parses the comma-separated `key=value` selector syntax.
    pub fn parse(selector: &str) -> Result<Self, ScopeError> {
        let mut pairs = Vec::new();
        for segment in selector.split(',') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once('=') else {
                return Err(ScopeError::InvalidSelector {
                    segment: segment.to_string(),
                });
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(ScopeError::InvalidSelector {
                    segment: segment.to_string(),
                });
            }
            pairs.push((key.to_string(), value.trim().to_string()));
        }
        Ok(Self { pairs })
    }

    /// True when every selector pair is present and equal in the labels map.
    pub fn matches(&self, meta: &ObjectMeta) -> bool {
        self.pairs
            .iter()
            .all(|(key, value)| meta.labels.get(key) == Some(value))
    }

    /// True when the selector imposes no constraint.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Structural scoping filter applied before any content predicate runs.
///
/// A configured prefix with the corresponding metadata field absent is a
/// rejection, so notifications with malformed metadata never fire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceScope {
    name_prefix: Option<String>,
    namespace_prefix: Option<String>,
    selector: Option<LabelSelector>,
}

impl ResourceScope {
    /// Creates a scope that admits every object.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    /// Restricts matching to object names starting with the prefix.
    ///
    /// An empty prefix means no constraint, mirroring the registration
    /// surface where omitted and empty are equivalent.
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = non_empty(prefix.into());
        self
    }

    /// Restricts matching to namespaces starting with the prefix.
    pub fn with_namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.namespace_prefix = non_empty(prefix.into());
        self
    }

    /// Restricts matching to objects carrying every selector label.
    pub fn with_labels_selector(mut self, selector: &str) -> Result<Self, ScopeError> {
        let parsed = LabelSelector::parse(selector)?;
        self.selector = if parsed.is_empty() {
            None
        } else {
            Some(parsed)
        };
        Ok(self)
    }

    /// Evaluates the scope against object metadata.
    pub fn allows(&self, meta: &ObjectMeta) -> bool {
        if let Some(prefix) = &self.name_prefix {
            match &meta.name {
                Some(name) if name.starts_with(prefix) => {}
                _ => return false,
            }
        }
        if let Some(prefix) = &self.namespace_prefix {
            match &meta.namespace {
                Some(namespace) if namespace.starts_with(prefix) => {}
                _ => return false,
            }
        }
        if let Some(selector) = &self.selector {
            if !selector.matches(meta) {
                return false;
            }
        }
        true
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
