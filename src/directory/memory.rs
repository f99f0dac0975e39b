//! In-memory directory
//!
//! Holds a snapshot of services and backends, fed either directly or from
//! watch events. Useful for embedding a directory that is synchronized by
//! some external watcher, and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::common::{BackendCandidate, Labels, Selector};
use crate::error::DirectoryError;

use super::Directory;

/// Change notification for a watched resource
#[derive(Debug, Clone)]
pub enum WatchEvent<T> {
    Added(T),
    Modified(T),
    Deleted(T),
}

/// A service as seen by the directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    pub namespace: String,
    pub selector: Selector,
}

/// A backend and its labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendRecord {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Key {
    namespace: String,
    name: String,
}

impl Key {
    fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    services: HashMap<Key, Selector>,
    backends: HashMap<Key, Labels>,
}

/// Directory backed by an in-process snapshot
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: RwLock<State>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_service(&self, namespace: &str, name: &str, selector: Selector) {
        self.state
            .write()
            .services
            .insert(Key::new(namespace, name), selector);
    }

    pub fn remove_service(&self, namespace: &str, name: &str) -> bool {
        self.state
            .write()
            .services
            .remove(&Key::new(namespace, name))
            .is_some()
    }

    pub fn insert_backend(&self, namespace: &str, name: &str, labels: Labels) {
        self.state
            .write()
            .backends
            .insert(Key::new(namespace, name), labels);
    }

    pub fn remove_backend(&self, namespace: &str, name: &str) -> bool {
        self.state
            .write()
            .backends
            .remove(&Key::new(namespace, name))
            .is_some()
    }

    pub fn handle_service_event(&self, event: WatchEvent<ServiceRecord>) {
        match event {
            WatchEvent::Added(svc) | WatchEvent::Modified(svc) => {
                self.insert_service(&svc.namespace, &svc.name, svc.selector)
            }
            WatchEvent::Deleted(svc) => {
                self.remove_service(&svc.namespace, &svc.name);
            }
        }
    }

    pub fn handle_backend_event(&self, event: WatchEvent<BackendRecord>) {
        match event {
            WatchEvent::Added(b) | WatchEvent::Modified(b) => {
                self.insert_backend(&b.namespace, &b.name, b.labels)
            }
            WatchEvent::Deleted(b) => {
                self.remove_backend(&b.namespace, &b.name);
            }
        }
    }

    pub fn service_count(&self) -> usize {
        self.state.read().services.len()
    }

    pub fn backend_count(&self) -> usize {
        self.state.read().backends.len()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn service_selector(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Selector, DirectoryError> {
        self.state
            .read()
            .services
            .get(&Key::new(namespace, name))
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                kind: "service".into(),
                name: format!("{}/{}", namespace, name),
            })
    }

    async fn list_backends(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<BackendCandidate>, DirectoryError> {
        let state = self.state.read();
        let mut backends: Vec<BackendCandidate> = state
            .backends
            .iter()
            .filter(|(key, labels)| key.namespace == namespace && selector.matches(labels))
            .map(|(key, _)| BackendCandidate::new(&key.name, &key.namespace))
            .collect();
        backends.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(backends)
    }
}
