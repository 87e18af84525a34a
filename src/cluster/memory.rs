use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cluster::WorkloadClient;
use crate::core::error::{ClusterError, Operation};
use crate::model::workload::{Workload, WorkloadKind};

type ObjectKey = (WorkloadKind, String, String);

/// One call received by a [`MemoryCluster`], recorded whether it succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCall {
    pub operation: Operation,
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

/// In-memory stand-in for the API server.
///
/// Every stored object gets a fresh `resourceVersion` on write, a replace carrying a stale one is
/// rejected with a conflict, and one-shot faults can be injected per operation and kind.
#[derive(Clone, Default)]
pub struct MemoryCluster {
    objects: Arc<DashMap<ObjectKey, Workload>>,
    faults: Arc<DashMap<(Operation, WorkloadKind), ClusterError>>,
    calls: Arc<Mutex<Vec<ClusterCall>>>,
    revision: Arc<AtomicU64>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `workload` as is, without recording a call.
    pub fn seed(&self, mut workload: Workload) {
        workload.set_resource_version(Some(self.next_revision()));
        self.objects.insert(Self::key_of(&workload), workload);
    }

    /// Makes the next `operation` on `kind` fail with `error`.
    pub fn fail_next(&self, operation: Operation, kind: WorkloadKind, error: ClusterError) {
        self.faults.insert((operation, kind), error);
    }

    pub fn stored(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Option<Workload> {
        self.objects.get(&(kind, String::from(namespace), String::from(name)))
            .map(|entry| entry.value().clone())
    }

    pub fn stored_kinds(&self, namespace: &str, name: &str) -> Vec<WorkloadKind> {
        let mut kinds = self.objects.iter()
            .filter(|entry| entry.key().1 == namespace && entry.key().2 == name)
            .map(|entry| entry.key().0)
            .collect::<Vec<_>>();
        kinds.sort();
        kinds
    }

    pub fn calls(&self) -> Vec<ClusterCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn mutating_calls(&self) -> Vec<ClusterCall> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call.operation, Operation::Get))
            .collect()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn key_of(workload: &Workload) -> ObjectKey {
        (workload.kind(), workload.namespace().unwrap_or_default(), workload.name())
    }

    fn next_revision(&self) -> String {
        (self.revision.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn record(&self, operation: Operation, kind: WorkloadKind, namespace: &str, name: &str) -> Result<(), ClusterError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ClusterCall {
                operation,
                kind,
                namespace: String::from(namespace),
                name: String::from(name),
            });
        }
        match self.faults.remove(&(operation, kind)) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn validate(workload: &Workload) -> Result<(), ClusterError> {
        if workload.namespace().is_none() {
            return Err(ClusterError::Invalid(format!("{} {} has no namespace", workload.kind(), workload.name())));
        }
        if workload.name().is_empty() {
            return Err(ClusterError::Invalid(format!("{} has no name", workload.kind())));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkloadClient for MemoryCluster {
    async fn get(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<Option<Workload>, ClusterError> {
        self.record(Operation::Get, kind, namespace, name)?;
        Ok(self.stored(namespace, name, kind))
    }

    async fn create(&self, workload: &Workload) -> Result<(), ClusterError> {
        let (kind, namespace, name) = Self::key_of(workload);
        self.record(Operation::Create, kind, &namespace, &name)?;
        Self::validate(workload)?;

        let key = (kind, namespace, name);
        if self.objects.contains_key(&key) {
            return Err(ClusterError::Conflict(format!("{kind} {}/{} already exists", key.1, key.2)));
        }
        let mut stored = workload.clone();
        stored.set_resource_version(Some(self.next_revision()));
        self.objects.insert(key, stored);
        Ok(())
    }

    async fn update(&self, workload: &Workload) -> Result<(), ClusterError> {
        let (kind, namespace, name) = Self::key_of(workload);
        self.record(Operation::Update, kind, &namespace, &name)?;
        Self::validate(workload)?;

        let key = (kind, namespace, name);
        let Some(mut current) = self.objects.get_mut(&key) else {
            return Err(ClusterError::NotFound(format!("{kind} {}/{}", key.1, key.2)));
        };
        if let Some(expected) = workload.resource_version() {
            if current.resource_version().as_ref() != Some(&expected) {
                return Err(ClusterError::Conflict(format!("{kind} {}/{} was modified, resourceVersion {expected} is stale", key.1, key.2)));
            }
        }
        let mut stored = workload.clone();
        stored.set_resource_version(Some(self.next_revision()));
        *current = stored;
        Ok(())
    }

    async fn delete(&self, namespace: &str, name: &str, kind: WorkloadKind) -> Result<(), ClusterError> {
        self.record(Operation::Delete, kind, namespace, name)?;
        match self.objects.remove(&(kind, String::from(namespace), String::from(name))) {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound(format!("{kind} {namespace}/{name}"))),
        }
    }
}
