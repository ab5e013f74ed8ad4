use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::database::memory::MemoryStore;
use crate::database::store::{EmployeeStore, ProjectStore, StoreLifecycle};
use crate::integrity::Integrity;
use crate::router::RouteTable;

/// Bounds applied while buffering request bodies.
#[derive(Debug, Clone, Copy)]
pub struct BodyLimits {
    pub max_bytes: usize,
    pub read_timeout: Duration,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
            read_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ApiConfig> for BodyLimits {
    fn from(api: &ApiConfig) -> Self {
        Self {
            max_bytes: api.max_request_size_bytes,
            read_timeout: Duration::from_secs(api.body_read_timeout_secs),
        }
    }
}

/// Everything a request needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub employees: Arc<dyn EmployeeStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub lifecycle: Arc<dyn StoreLifecycle>,
    pub integrity: Integrity,
    pub routes: Arc<RouteTable>,
    pub limits: BodyLimits,
}

impl AppState {
    /// Wire every façade to one backend.
    pub fn new<S>(store: Arc<S>, limits: BodyLimits) -> Self
    where
        S: EmployeeStore + ProjectStore + StoreLifecycle + 'static,
    {
        Self::from_parts(store.clone(), store.clone(), store, limits)
    }

    pub fn from_parts(
        employees: Arc<dyn EmployeeStore>,
        projects: Arc<dyn ProjectStore>,
        lifecycle: Arc<dyn StoreLifecycle>,
        limits: BodyLimits,
    ) -> Self {
        let integrity = Integrity::new(employees.clone(), projects.clone());
        Self {
            employees,
            projects,
            lifecycle,
            integrity,
            routes: Arc::new(RouteTable::default()),
            limits,
        }
    }

    /// Fresh in-memory backend with default limits.
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), BodyLimits::default())
    }

    pub fn with_limits(mut self, limits: BodyLimits) -> Self {
        self.limits = limits;
        self
    }
}
