use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Canonical identity of a discovered top-level workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredWorkload {
    kind: String,
    name: String,
    namespace: String,
}

impl DiscoveredWorkload {
    /// Creates a workload identity record.
    pub fn new(
        kind: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Workload name as discovered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace the workload lives in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Canonical logical-service identifier for this workload.
    pub fn service_key(&self) -> String {
        format!("{}/{}/{}", self.namespace, self.kind, self.name)
    }

    /// True when an object name derives from this workload's name.
    ///
    /// Generated pod names extend their owner's name with `-` separated
    /// suffixes, so `payments-api-7d9f5-xkq2w` is claimed by `payments-api`
    /// but not by `payments`. An exact match always claims.
    fn claims(&self, object_name: &str) -> bool {
        if object_name == self.name {
            return true;
        }
        match object_name.strip_prefix(self.name.as_str()) {
            Some(rest) => rest.starts_with('-'),
            None => false,
        }
    }
}

type WorkloadIndex = HashMap<String, Vec<DiscoveredWorkload>>;

/// Maps bare (name, namespace) pairs to canonical logical-service identifiers.
///
/// The backing index is populated by an external discovery pipeline and read
/// on every trigger evaluation. Readers clone the current snapshot and search
/// without holding a lock, so a discovery update concurrent with a lookup
/// degrades at worst to a stale answer, never a blocked evaluation.
#[derive(Default)]
pub struct ServiceKeyResolver {
    index: RwLock<Arc<WorkloadIndex>>,
}

impl ServiceKeyResolver {
    /// Creates a resolver with an empty workload index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or replaces) a discovered workload.
    pub fn record_workload(&self, workload: DiscoveredWorkload) {
        let mut guard = self.index.write().unwrap();
        let mut next: WorkloadIndex = (**guard).clone();
        let entries = next.entry(workload.namespace.clone()).or_default();
        entries.retain(|existing| existing.name != workload.name);
        entries.push(workload);
        *guard = Arc::new(next);
    }

    /// Drops a workload that discovery observed being deleted.
    pub fn forget_workload(&self, name: &str, namespace: &str) {
        let mut guard = self.index.write().unwrap();
        let mut next: WorkloadIndex = (**guard).clone();
        if let Some(entries) = next.get_mut(namespace) {
            entries.retain(|existing| existing.name != name);
            if entries.is_empty() {
                next.remove(namespace);
            }
        }
        *guard = Arc::new(next);
    }

    /// Guesses the logical-service key for an object.
    ///
    /// Exact name matches win; otherwise the longest workload name that the
    /// object name extends is chosen. Returns `None` when nothing in the
    /// namespace claims the object, leaving the fallback to the caller.
    pub fn guess_service_key(&self, name: &str, namespace: &str) -> Option<String> {
        let snapshot = self.snapshot();
        let entries = snapshot.get(namespace)?;
        let mut best: Option<&DiscoveredWorkload> = None;
        for workload in entries {
            if !workload.claims(name) {
                continue;
            }
            if workload.name == name {
                return Some(workload.service_key());
            }
            if best.map_or(true, |current| workload.name.len() > current.name.len()) {
                best = Some(workload);
            }
        }
        best.map(DiscoveredWorkload::service_key)
    }

    /// Number of workloads currently indexed.
    pub fn workload_count(&self) -> usize {
        self.snapshot().values().map(Vec::len).sum()
    }

    fn snapshot(&self) -> Arc<WorkloadIndex> {
        self.index.read().unwrap().clone()
    }
}
