//! In-process store backend.
//!
//! Rows live in insertion-ordered vectors behind a tokio `RwLock`. Selected
//! with `STORE_BACKEND=memory`; the test-suite runs against it.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::{
    Employee, EmployeeDetail, NewEmployee, NewProject, Project, ProjectDetail, ProjectSummary,
};
use super::store::{
    EmployeeFilter, EmployeeStore, EmployeeUpdate, ProjectFilter, ProjectStore, ProjectUpdate,
    StoreError, StoreLifecycle,
};

#[derive(Debug, Default)]
struct Collections {
    employees: Vec<Employee>,
    projects: Vec<Project>,
}

impl Collections {
    fn live_employee(&self, id: Uuid) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| e.id == id && e.deleted_at.is_none())
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.employees.iter().any(|e| {
            e.deleted_at.is_none() && e.email == email && Some(e.id) != except
        })
    }

    fn project_detail(&self, project: &Project) -> ProjectDetail {
        let manager = project
            .manager_id
            .and_then(|id| self.live_employee(id))
            .cloned();
        let employees = project
            .employee_ids
            .iter()
            .filter_map(|id| self.live_employee(*id))
            .cloned()
            .collect();

        ProjectDetail {
            project: project.clone(),
            manager,
            employees,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn employee_matches(filter: &EmployeeFilter, employee: &Employee) -> bool {
    if employee.deleted_at.is_some() {
        return false;
    }
    match filter {
        EmployeeFilter::Active => true,
        EmployeeFilter::Id(id) => employee.id == *id,
        EmployeeFilter::Ids(ids) => ids.contains(&employee.id),
        EmployeeFilter::ManagedBy(id) => employee.manager_id == Some(*id),
        EmployeeFilter::HasPeer(id) => employee.peers.contains(id),
        EmployeeFilter::HasPeerExcept { peer, owner } => {
            employee.id != *owner && employee.peers.contains(peer)
        }
    }
}

fn project_matches(filter: &ProjectFilter, project: &Project) -> bool {
    if project.deleted_at.is_some() {
        return false;
    }
    match filter {
        ProjectFilter::Active => true,
        ProjectFilter::Id(id) => project.id == *id,
        ProjectFilter::ManagedBy(id) => project.manager_id == Some(*id),
        ProjectFilter::HasEmployee(id) => project.employee_ids.contains(id),
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn create(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        let mut db = self.inner.write().await;
        if db.email_taken(&new.email, None) {
            return Err(StoreError::Conflict("email"));
        }

        let now = Utc::now();
        let employee = Employee {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            is_manager: new.is_manager,
            manager_id: new.manager_id,
            peers: new.peers,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        db.employees.push(employee.clone());
        Ok(employee)
    }

    async fn get_one(&self, filter: EmployeeFilter) -> Result<Option<Employee>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .employees
            .iter()
            .find(|e| employee_matches(&filter, e))
            .cloned())
    }

    async fn get_many(&self, filter: EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .employees
            .iter()
            .filter(|e| employee_matches(&filter, e))
            .cloned()
            .collect())
    }

    async fn update_many(
        &self,
        filter: EmployeeFilter,
        update: EmployeeUpdate,
    ) -> Result<u64, StoreError> {
        let mut db = self.inner.write().await;

        if let EmployeeUpdate::Apply(changes) = &update {
            if let Some(email) = &changes.email {
                let conflict = db
                    .employees
                    .iter()
                    .filter(|e| employee_matches(&filter, e))
                    .any(|e| db.email_taken(email, Some(e.id)));
                if conflict {
                    return Err(StoreError::Conflict("email"));
                }
            }
        }

        let now = Utc::now();
        let mut touched = 0;
        for employee in db.employees.iter_mut() {
            if !employee_matches(&filter, employee) {
                continue;
            }
            match &update {
                EmployeeUpdate::Apply(changes) => changes.apply_to(employee),
                EmployeeUpdate::RemovePeer(id) => employee.peers.retain(|p| p != id),
                EmployeeUpdate::SetManager(id) => employee.manager_id = Some(*id),
                EmployeeUpdate::ClearManager => employee.manager_id = None,
            }
            employee.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        match db
            .employees
            .iter_mut()
            .find(|e| e.id == id && e.deleted_at.is_none())
        {
            Some(employee) => {
                employee.deleted_at = Some(now);
                employee.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn aggregate_join(&self, id: Uuid) -> Result<Option<EmployeeDetail>, StoreError> {
        let db = self.inner.read().await;
        let Some(employee) = db.live_employee(id).cloned() else {
            return Ok(None);
        };

        let manager = employee
            .manager_id
            .and_then(|m| db.live_employee(m))
            .cloned();
        let projects = db
            .projects
            .iter()
            .filter(|p| project_matches(&ProjectFilter::HasEmployee(id), p))
            .map(|p| ProjectSummary {
                id: p.id,
                name: p.name.clone(),
            })
            .collect();

        Ok(Some(EmployeeDetail {
            employee,
            manager,
            projects,
        }))
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: new.name,
            manager_id: new.manager_id,
            employee_ids: new.employee_ids,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        db.projects.push(project.clone());
        Ok(project)
    }

    async fn get_one(&self, filter: ProjectFilter) -> Result<Option<Project>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .projects
            .iter()
            .find(|p| project_matches(&filter, p))
            .cloned())
    }

    async fn get_many(&self, filter: ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .projects
            .iter()
            .filter(|p| project_matches(&filter, p))
            .cloned()
            .collect())
    }

    async fn update_many(
        &self,
        filter: ProjectFilter,
        update: ProjectUpdate,
    ) -> Result<u64, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for project in db.projects.iter_mut() {
            if !project_matches(&filter, project) {
                continue;
            }
            match &update {
                ProjectUpdate::Apply(changes) => changes.apply_to(project),
                ProjectUpdate::RemoveEmployee(id) => project.employee_ids.retain(|e| e != id),
                ProjectUpdate::ClearManager => project.manager_id = None,
            }
            project.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        match db
            .projects
            .iter_mut()
            .find(|p| p.id == id && p.deleted_at.is_none())
        {
            Some(project) => {
                project.deleted_at = Some(now);
                project.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn aggregate_join(&self, filter: ProjectFilter) -> Result<Vec<ProjectDetail>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .projects
            .iter()
            .filter(|p| project_matches(&filter, p))
            .map(|p| db.project_detail(p))
            .collect())
    }
}

#[async_trait]
impl StoreLifecycle for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::EmployeeChanges;

    fn new_employee(name: &str, email: &str) -> NewEmployee {
        NewEmployee {
            name: name.into(),
            email: email.into(),
            is_manager: false,
            manager_id: None,
            peers: vec![],
        }
    }

    #[tokio::test]
    async fn rejects_duplicate_email_among_live_rows() {
        let store = MemoryStore::new();
        let ann = EmployeeStore::create(&store, new_employee("Ann", "ann@x.com"))
            .await
            .unwrap();

        let dup = EmployeeStore::create(&store, new_employee("Ann 2", "ann@x.com")).await;
        assert!(matches!(dup, Err(StoreError::Conflict("email"))));

        // A soft-deleted row frees its email
        assert!(EmployeeStore::delete_one(&store, ann.id).await.unwrap());
        EmployeeStore::create(&store, new_employee("Ann 3", "ann@x.com"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn soft_deleted_rows_are_invisible() {
        let store = MemoryStore::new();
        let bob = EmployeeStore::create(&store, new_employee("Bob", "bob@x.com"))
            .await
            .unwrap();
        EmployeeStore::delete_one(&store, bob.id).await.unwrap();

        assert!(EmployeeStore::get_one(&store, EmployeeFilter::Id(bob.id))
            .await
            .unwrap()
            .is_none());
        assert!(!EmployeeStore::delete_one(&store, bob.id).await.unwrap());
        let changes = EmployeeChanges {
            name: Some("Robert".into()),
            ..Default::default()
        };
        let touched = EmployeeStore::update_many(
            &store,
            EmployeeFilter::Id(bob.id),
            EmployeeUpdate::Apply(changes),
        )
        .await
        .unwrap();
        assert_eq!(touched, 0);
    }

    #[tokio::test]
    async fn project_join_keeps_rows_without_matches() {
        let store = MemoryStore::new();
        let ann = EmployeeStore::create(&store, new_employee("Ann", "ann@x.com"))
            .await
            .unwrap();
        let project = ProjectStore::create(
            &store,
            NewProject {
                name: "Apollo".into(),
                manager_id: Some(Uuid::new_v4()),
                employee_ids: vec![ann.id, Uuid::new_v4()],
            },
        )
        .await
        .unwrap();

        let details = ProjectStore::aggregate_join(&store, ProjectFilter::Id(project.id))
            .await
            .unwrap();
        assert_eq!(details.len(), 1);
        assert!(details[0].manager.is_none());
        assert_eq!(details[0].employees.len(), 1);
        assert_eq!(details[0].employees[0].id, ann.id);
    }
}
