use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::employee::{validate_name, Employee};
use super::FieldError;
use crate::types::Patch;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub employee_ids: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Reverse-lookup projection used on the employee detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
}

/// Project joined with its manager and (non-deleted) employees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub manager: Option<Employee>,
    pub employees: Vec<Employee>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub manager_id: Option<Uuid>,
    pub employee_ids: Vec<Uuid>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub manager_id: Patch<Uuid>,
    pub employee_ids: Option<Vec<Uuid>>,
}

impl ProjectChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.manager_id.is_unset() && self.employee_ids.is_none()
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        match &self.name {
            Some(name) => validate_name(name),
            None => Ok(()),
        }
    }

    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        project.manager_id = self.manager_id.clone().resolve(project.manager_id);
        if let Some(ids) = &self.employee_ids {
            project.employee_ids = ids.clone();
        }
    }
}
