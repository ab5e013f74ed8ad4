use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::project::ProjectSummary;
use super::FieldError;
use crate::types::Patch;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.-]+@([\w-]+\.)+[\w-]{2,4}$").expect("valid email regex")
});

/// Basic `local@domain` shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Employee row. Bookkeeping timestamps are never serialized to clients.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_manager: bool,
    pub manager_id: Option<Uuid>,
    pub peers: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Listing projection: `{id, name, email}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<Employee> for EmployeeSummary {
    fn from(employee: Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name,
            email: employee.email,
        }
    }
}

/// Employee joined with its manager and the projects that list it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDetail {
    #[serde(flatten)]
    pub employee: Employee,
    pub manager: Option<Employee>,
    pub projects: Vec<ProjectSummary>,
}

/// Validated input for inserting an employee.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub is_manager: bool,
    pub manager_id: Option<Uuid>,
    pub peers: Vec<Uuid>,
}

impl NewEmployee {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

/// Field assignments applied by an update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_manager: Option<bool>,
    pub manager_id: Patch<Uuid>,
    pub peers: Option<Vec<Uuid>>,
}

impl EmployeeChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.is_manager.is_none()
            && self.manager_id.is_unset()
            && self.peers.is_none()
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Apply onto a stored row; used by the in-memory store.
    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(is_manager) = self.is_manager {
            employee.is_manager = is_manager;
        }
        employee.manager_id = self.manager_id.clone().resolve(employee.manager_id);
        if let Some(peers) = &self.peers {
            employee.peers = peers.clone();
        }
    }
}

pub(super) fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.trim().is_empty() {
        return Err(FieldError::Required("Name"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.trim().is_empty() {
        return Err(FieldError::Required("Email"));
    }
    if !is_valid_email(email) {
        return Err(FieldError::InvalidEmail(email.to_string()));
    }
    Ok(())
}
