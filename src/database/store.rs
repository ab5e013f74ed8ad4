//! Per-entity store façades.
//!
//! Controllers and the integrity engine only talk to these traits. Every
//! filter matches non-deleted rows only; soft-deleted rows are invisible to
//! everything except the store itself.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    Employee, EmployeeChanges, EmployeeDetail, NewEmployee, NewProject, Project, ProjectChanges,
    ProjectDetail,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint violation; carries the offending field name
    #[error("Duplicate value for unique field: {0}")]
    Conflict(&'static str),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeFilter {
    Active,
    Id(Uuid),
    Ids(Vec<Uuid>),
    ManagedBy(Uuid),
    HasPeer(Uuid),
    /// Employees other than `owner` that list `peer`
    HasPeerExcept { peer: Uuid, owner: Uuid },
}

#[derive(Debug, Clone)]
pub enum EmployeeUpdate {
    Apply(EmployeeChanges),
    RemovePeer(Uuid),
    SetManager(Uuid),
    ClearManager,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFilter {
    Active,
    Id(Uuid),
    ManagedBy(Uuid),
    HasEmployee(Uuid),
}

#[derive(Debug, Clone)]
pub enum ProjectUpdate {
    Apply(ProjectChanges),
    RemoveEmployee(Uuid),
    ClearManager,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn create(&self, new: NewEmployee) -> Result<Employee, StoreError>;

    async fn get_one(&self, filter: EmployeeFilter) -> Result<Option<Employee>, StoreError>;

    async fn get_many(&self, filter: EmployeeFilter) -> Result<Vec<Employee>, StoreError>;

    /// Returns the number of rows touched.
    async fn update_many(
        &self,
        filter: EmployeeFilter,
        update: EmployeeUpdate,
    ) -> Result<u64, StoreError>;

    /// Soft delete. `false` when no live row had that id.
    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Employee → manager (0..1) and employee ← projects (0..n).
    async fn aggregate_join(&self, id: Uuid) -> Result<Option<EmployeeDetail>, StoreError>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError>;

    async fn get_one(&self, filter: ProjectFilter) -> Result<Option<Project>, StoreError>;

    async fn get_many(&self, filter: ProjectFilter) -> Result<Vec<Project>, StoreError>;

    async fn update_many(
        &self,
        filter: ProjectFilter,
        update: ProjectUpdate,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Project → manager (0..1) and project → employees (0..n).
    async fn aggregate_join(&self, filter: ProjectFilter) -> Result<Vec<ProjectDetail>, StoreError>;
}

/// Lifecycle hooks shared by every backend.
#[async_trait]
pub trait StoreLifecycle: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    async fn close(&self);
}
