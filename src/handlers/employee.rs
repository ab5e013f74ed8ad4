use tracing::{info, warn};
use uuid::Uuid;

use super::payload::{EmployeeCreateRequest, EmployeeUpdateRequest};
use super::{parse_body, parse_path_id, required};
use crate::database::models::{
    Employee, EmployeeChanges, EmployeeDetail, EmployeeSummary, NewEmployee,
};
use crate::database::store::{EmployeeFilter, EmployeeUpdate};
use crate::error::ApiError;
use crate::integrity::validate::{ensure_no_manager_cycle, ensure_peers_allowed};
use crate::integrity::CascadeStep;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::{IdList, Patch};

const NOT_FOUND: &str = "Employee not found";

/// GET /employee
pub async fn index(state: &AppState) -> ApiResult<Vec<EmployeeSummary>> {
    let employees = state.employees.get_many(EmployeeFilter::Active).await?;
    Ok(ApiResponse::success(
        employees.into_iter().map(EmployeeSummary::from).collect(),
    ))
}

/// GET /employee/{id} - employee with its manager and projects
pub async fn show(state: &AppState, id: &str) -> ApiResult<EmployeeDetail> {
    let id = parse_path_id(id)?;
    match state.employees.aggregate_join(id).await? {
        Some(detail) => Ok(ApiResponse::success(detail)),
        None => Err(ApiError::not_found(NOT_FOUND)),
    }
}

/// POST /employee
pub async fn create(state: &AppState, body: &[u8]) -> ApiResult<Employee> {
    let req: EmployeeCreateRequest = parse_body(body)?;
    let is_manager = req.is_manager.unwrap_or(false);

    let manager_id = state
        .integrity
        .validate_manager(req.manager_id.as_deref(), None)
        .await?;
    let peer_ids = req.peers.map(IdList::into_vec).unwrap_or_default();
    let peers = state
        .integrity
        .validate_peers(&peer_ids, is_manager, None)
        .await?;
    ensure_no_manager_cycle(&peers, manager_id)?;

    let new = NewEmployee {
        name: req.name.unwrap_or_default(),
        email: req.email.unwrap_or_default(),
        is_manager,
        manager_id,
        peers,
    };
    new.validate()?;

    let employee = state.employees.create(new).await?;
    info!("Created employee {}", employee.id);

    state
        .integrity
        .reciprocate_peers(employee.id, &employee.peers)
        .await;

    Ok(ApiResponse::success(employee))
}

/// PUT /employee/{id} - partial update, returns the stored result
pub async fn update(state: &AppState, id: &str, body: &[u8]) -> ApiResult<Employee> {
    let id = parse_path_id(id)?;
    let req: EmployeeUpdateRequest = parse_body(body)?;

    let current = state
        .employees
        .get_one(EmployeeFilter::Id(id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    let is_manager = req.is_manager.unwrap_or(current.is_manager);

    let manager_id = match req.manager_id {
        Patch::Unset => Patch::Unset,
        Patch::Null => Patch::Null,
        Patch::Set(raw) => {
            let manager = state
                .integrity
                .validate_manager(Some(raw.as_str()), Some(id))
                .await?;
            manager.map_or(Patch::Null, Patch::Set)
        }
    };

    let peers = match req.peers {
        Patch::Unset => {
            // The stored list must still be legal under the new flag
            ensure_peers_allowed(&current.peers, is_manager)?;
            None
        }
        Patch::Null => Some(Vec::new()),
        Patch::Set(list) => Some(
            state
                .integrity
                .validate_peers(&list.into_vec(), is_manager, Some(id))
                .await?,
        ),
    };

    let effective_manager = manager_id.clone().resolve(current.manager_id);
    let effective_peers = peers.as_deref().unwrap_or(current.peers.as_slice());
    ensure_no_manager_cycle(effective_peers, effective_manager)?;

    let changes = EmployeeChanges {
        name: required(req.name, "Name")?,
        email: required(req.email, "Email")?,
        is_manager: req.is_manager,
        manager_id,
        peers,
    };
    changes.validate()?;

    let added_peers: Vec<Uuid> = changes
        .peers
        .iter()
        .flatten()
        .filter(|peer| !current.peers.contains(*peer))
        .copied()
        .collect();

    if !changes.is_empty() {
        let touched = state
            .employees
            .update_many(EmployeeFilter::Id(id), EmployeeUpdate::Apply(changes))
            .await?;
        if touched == 0 {
            return Err(ApiError::not_found(NOT_FOUND));
        }
    }

    state.integrity.reciprocate_peers(id, &added_peers).await;

    if current.is_manager && !is_manager {
        let report = state
            .integrity
            .run_cascade(id, &CascadeStep::MANAGER_DEMOTION)
            .await;
        if !report.is_clean() {
            warn!("Demotion of {} left {} cascade step(s) unapplied", id, report.failed.len());
        }
    }

    let employee = state
        .employees
        .get_one(EmployeeFilter::Id(id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(ApiResponse::success(employee))
}

/// DELETE /employee/{id} - cascade, then soft delete
pub async fn delete(state: &AppState, id: &str) -> ApiResult<()> {
    let id = parse_path_id(id)?;
    if state.employees.get_one(EmployeeFilter::Id(id)).await?.is_none() {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let removal = state.integrity.delete_employee(id).await?;
    if !removal.removed {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    if !removal.cascade.is_clean() {
        warn!(
            "Deleted employee {} with {} failed cascade step(s)",
            id,
            removal.cascade.failed.len()
        );
    }
    info!("Deleted employee {}", id);

    Ok(ApiResponse::success(()))
}
