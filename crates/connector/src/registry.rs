use std::collections::HashMap;
use std::sync::Arc;

use crate::connector::Connector;

/// Registry for looking up connectors by service id.
///
/// The composition root populates it at startup and dispatches host calls
/// through it. Connectors are stored as `Arc<dyn Connector>` so concurrent
/// invocations can share them.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector. Overwrites any existing one with the same service id.
    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        let id = connector.service_id().to_string();
        self.connectors.insert(id, connector);
    }

    /// Look up a connector by service id.
    pub fn get(&self, service_id: &str) -> Option<&Arc<dyn Connector>> {
        self.connectors.get(service_id)
    }

    /// Check whether a connector with the given service id is registered.
    pub fn contains(&self, service_id: &str) -> bool {
        self.connectors.contains_key(service_id)
    }

    /// Registered service ids, sorted.
    pub fn service_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.connectors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered connectors.
    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    /// Returns `true` if no connectors are registered.
    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}

impl std::fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectorRegistry")
            .field("service_ids", &self.service_ids())
            .finish()
    }
}
