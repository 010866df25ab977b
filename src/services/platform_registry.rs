//! Per-run set of platform clients.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ports::PlatformClient;

/// Platform clients for one run, keyed by platform name.
///
/// Built once per run and handed to the orchestrator, so sessions are
/// reused across tasks without process-wide state.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    clients: HashMap<String, Arc<dyn PlatformClient>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client under its own platform name, replacing any previous one.
    #[must_use]
    pub fn with_client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.register(client);
        self
    }

    pub fn register(&mut self, client: Arc<dyn PlatformClient>) {
        self.clients.insert(client.platform().to_string(), client);
    }

    pub fn get(&self, platform: &str) -> Option<&Arc<dyn PlatformClient>> {
        self.clients.get(platform)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl std::fmt::Debug for PlatformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.clients.keys().collect();
        names.sort();
        f.debug_struct("PlatformRegistry").field("platforms", &names).finish()
    }
}
