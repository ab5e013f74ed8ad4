//! Request bodies as clients send them.
//!
//! Reference fields stay raw strings here; the integrity engine decides
//! whether they name real records.

use serde::Deserialize;

use crate::types::{IdList, Patch};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCreateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_manager: Option<bool>,
    #[serde(alias = "manager")]
    pub manager_id: Option<String>,
    pub peers: Option<IdList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdateRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub email: Patch<String>,
    /// `null` is treated like a missing key
    pub is_manager: Option<bool>,
    #[serde(default, alias = "manager")]
    pub manager_id: Patch<String>,
    #[serde(default)]
    pub peers: Patch<IdList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateRequest {
    pub name: Option<String>,
    #[serde(alias = "manager")]
    pub manager_id: Option<String>,
    #[serde(alias = "employees")]
    pub employee_ids: Option<IdList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateRequest {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default, alias = "manager")]
    pub manager_id: Patch<String>,
    #[serde(default, alias = "employees")]
    pub employee_ids: Patch<IdList>,
}
