use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::manager::Database;
use super::models::{
    Employee, EmployeeDetail, NewEmployee, NewProject, Project, ProjectDetail,
};
use super::store::{
    EmployeeFilter, EmployeeStore, EmployeeUpdate, ProjectFilter, ProjectStore, ProjectUpdate,
    StoreError, StoreLifecycle,
};
use crate::types::Patch;

const EMPLOYEE_COLUMNS: &str =
    "id, name, email, is_manager, manager_id, peers, created_at, updated_at, deleted_at";
const PROJECT_COLUMNS: &str =
    "id, name, manager_id, employee_ids, created_at, updated_at, deleted_at";

/// Postgres-backed store. Joins are built server-side with `json_build_object`
/// so each detail row arrives as a single JSON document.
#[derive(Debug, Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Map driver errors onto the store taxonomy
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict("email")
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

/// camelCase key/value pairs for an employee row aliased as `alias`
fn employee_json_fields(alias: &str) -> String {
    format!(
        "'id', {a}.id, 'name', {a}.name, 'email', {a}.email, 'isManager', {a}.is_manager, \
         'managerId', {a}.manager_id, 'peers', {a}.peers, 'createdAt', {a}.created_at, \
         'updatedAt', {a}.updated_at, 'deletedAt', {a}.deleted_at",
        a = alias
    )
}

fn project_json_fields(alias: &str) -> String {
    format!(
        "'id', {a}.id, 'name', {a}.name, 'managerId', {a}.manager_id, \
         'employeeIds', {a}.employee_ids, 'createdAt', {a}.created_at, \
         'updatedAt', {a}.updated_at, 'deletedAt', {a}.deleted_at",
        a = alias
    )
}

fn push_employee_filter(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, filter: &EmployeeFilter) {
    qb.push(format!(" WHERE {}.deleted_at IS NULL", alias));
    match filter {
        EmployeeFilter::Active => {}
        EmployeeFilter::Id(id) => {
            qb.push(format!(" AND {}.id = ", alias)).push_bind(*id);
        }
        EmployeeFilter::Ids(ids) => {
            qb.push(format!(" AND {}.id = ANY(", alias))
                .push_bind(ids.clone())
                .push(")");
        }
        EmployeeFilter::ManagedBy(id) => {
            qb.push(format!(" AND {}.manager_id = ", alias)).push_bind(*id);
        }
        EmployeeFilter::HasPeer(id) => {
            qb.push(" AND ")
                .push_bind(*id)
                .push(format!(" = ANY({}.peers)", alias));
        }
        EmployeeFilter::HasPeerExcept { peer, owner } => {
            qb.push(format!(" AND {}.id <> ", alias))
                .push_bind(*owner)
                .push(" AND ")
                .push_bind(*peer)
                .push(format!(" = ANY({}.peers)", alias));
        }
    }
}

fn push_project_filter(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, filter: &ProjectFilter) {
    qb.push(format!(" WHERE {}.deleted_at IS NULL", alias));
    match filter {
        ProjectFilter::Active => {}
        ProjectFilter::Id(id) => {
            qb.push(format!(" AND {}.id = ", alias)).push_bind(*id);
        }
        ProjectFilter::ManagedBy(id) => {
            qb.push(format!(" AND {}.manager_id = ", alias)).push_bind(*id);
        }
        ProjectFilter::HasEmployee(id) => {
            qb.push(" AND ")
                .push_bind(*id)
                .push(format!(" = ANY({}.employee_ids)", alias));
        }
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(row: &sqlx::postgres::PgRow) -> Result<T, StoreError> {
    let value: Value = row.try_get("row").map_err(classify)?;
    serde_json::from_value(value).map_err(|e| StoreError::QueryError(e.to_string()))
}

#[async_trait]
impl EmployeeStore for PgStore {
    async fn create(&self, new: NewEmployee) -> Result<Employee, StoreError> {
        let sql = format!(
            "INSERT INTO employees (id, name, email, is_manager, manager_id, peers) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(&new.email)
            .bind(new.is_manager)
            .bind(new.manager_id)
            .bind(&new.peers)
            .fetch_one(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn get_one(&self, filter: EmployeeFilter) -> Result<Option<Employee>, StoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM employees e", EMPLOYEE_COLUMNS));
        push_employee_filter(&mut qb, "e", &filter);
        qb.push(" ORDER BY e.created_at LIMIT 1");
        qb.build_query_as::<Employee>()
            .fetch_optional(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn get_many(&self, filter: EmployeeFilter) -> Result<Vec<Employee>, StoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM employees e", EMPLOYEE_COLUMNS));
        push_employee_filter(&mut qb, "e", &filter);
        qb.push(" ORDER BY e.created_at");
        qb.build_query_as::<Employee>()
            .fetch_all(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn update_many(
        &self,
        filter: EmployeeFilter,
        update: EmployeeUpdate,
    ) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new("UPDATE employees SET updated_at = now()");
        match update {
            EmployeeUpdate::Apply(changes) => {
                if let Some(name) = changes.name {
                    qb.push(", name = ").push_bind(name);
                }
                if let Some(email) = changes.email {
                    qb.push(", email = ").push_bind(email);
                }
                if let Some(is_manager) = changes.is_manager {
                    qb.push(", is_manager = ").push_bind(is_manager);
                }
                match changes.manager_id {
                    Patch::Unset => {}
                    Patch::Null => {
                        qb.push(", manager_id = NULL");
                    }
                    Patch::Set(id) => {
                        qb.push(", manager_id = ").push_bind(id);
                    }
                }
                if let Some(peers) = changes.peers {
                    qb.push(", peers = ").push_bind(peers);
                }
            }
            EmployeeUpdate::RemovePeer(id) => {
                qb.push(", peers = array_remove(peers, ").push_bind(id).push(")");
            }
            EmployeeUpdate::SetManager(id) => {
                qb.push(", manager_id = ").push_bind(id);
            }
            EmployeeUpdate::ClearManager => {
                qb.push(", manager_id = NULL");
            }
        }
        push_employee_filter(&mut qb, "employees", &filter);

        let result = qb.build().execute(self.db.pool()).await.map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE employees SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn aggregate_join(&self, id: Uuid) -> Result<Option<EmployeeDetail>, StoreError> {
        let sql = format!(
            "SELECT json_build_object({employee}, \
               'manager', CASE WHEN m.id IS NULL THEN NULL ELSE json_build_object({manager}) END, \
               'projects', COALESCE(( \
                   SELECT json_agg(json_build_object('id', p.id, 'name', p.name) ORDER BY p.created_at) \
                   FROM projects p \
                   WHERE p.deleted_at IS NULL AND e.id = ANY(p.employee_ids) \
               ), '[]'::json) \
             ) AS row \
             FROM employees e \
             LEFT JOIN employees m ON m.id = e.manager_id AND m.deleted_at IS NULL \
             WHERE e.id = $1 AND e.deleted_at IS NULL",
            employee = employee_json_fields("e"),
            manager = employee_json_fields("m"),
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(classify)?;

        row.as_ref().map(decode_json::<EmployeeDetail>).transpose()
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError> {
        let sql = format!(
            "INSERT INTO projects (id, name, manager_id, employee_ids) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            PROJECT_COLUMNS
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(Uuid::new_v4())
            .bind(&new.name)
            .bind(new.manager_id)
            .bind(&new.employee_ids)
            .fetch_one(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn get_one(&self, filter: ProjectFilter) -> Result<Option<Project>, StoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM projects p", PROJECT_COLUMNS));
        push_project_filter(&mut qb, "p", &filter);
        qb.push(" ORDER BY p.created_at LIMIT 1");
        qb.build_query_as::<Project>()
            .fetch_optional(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn get_many(&self, filter: ProjectFilter) -> Result<Vec<Project>, StoreError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM projects p", PROJECT_COLUMNS));
        push_project_filter(&mut qb, "p", &filter);
        qb.push(" ORDER BY p.created_at");
        qb.build_query_as::<Project>()
            .fetch_all(self.db.pool())
            .await
            .map_err(classify)
    }

    async fn update_many(
        &self,
        filter: ProjectFilter,
        update: ProjectUpdate,
    ) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new("UPDATE projects SET updated_at = now()");
        match update {
            ProjectUpdate::Apply(changes) => {
                if let Some(name) = changes.name {
                    qb.push(", name = ").push_bind(name);
                }
                match changes.manager_id {
                    Patch::Unset => {}
                    Patch::Null => {
                        qb.push(", manager_id = NULL");
                    }
                    Patch::Set(id) => {
                        qb.push(", manager_id = ").push_bind(id);
                    }
                }
                if let Some(ids) = changes.employee_ids {
                    qb.push(", employee_ids = ").push_bind(ids);
                }
            }
            ProjectUpdate::RemoveEmployee(id) => {
                qb.push(", employee_ids = array_remove(employee_ids, ")
                    .push_bind(id)
                    .push(")");
            }
            ProjectUpdate::ClearManager => {
                qb.push(", manager_id = NULL");
            }
        }
        push_project_filter(&mut qb, "projects", &filter);

        let result = qb.build().execute(self.db.pool()).await.map_err(classify)?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE projects SET deleted_at = now(), updated_at = now() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn aggregate_join(&self, filter: ProjectFilter) -> Result<Vec<ProjectDetail>, StoreError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT json_build_object({project}, \
               'manager', ( \
                   SELECT json_build_object({manager}) FROM employees m \
                   WHERE m.id = p.manager_id AND m.deleted_at IS NULL \
               ), \
               'employees', COALESCE(( \
                   SELECT json_agg(json_build_object({employee}) \
                                   ORDER BY array_position(p.employee_ids, e.id)) \
                   FROM employees e \
                   WHERE e.id = ANY(p.employee_ids) AND e.deleted_at IS NULL \
               ), '[]'::json) \
             ) AS row \
             FROM projects p",
            project = project_json_fields("p"),
            manager = employee_json_fields("m"),
            employee = employee_json_fields("e"),
        ));
        push_project_filter(&mut qb, "p", &filter);
        qb.push(" ORDER BY p.created_at");

        let rows = qb.build().fetch_all(self.db.pool()).await.map_err(classify)?;
        rows.iter().map(decode_json::<ProjectDetail>).collect()
    }
}

#[async_trait]
impl StoreLifecycle for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.db.health_check().await.map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
