use tracing::info;

use super::payload::{ProjectCreateRequest, ProjectUpdateRequest};
use super::{parse_body, parse_path_id, required};
use crate::database::models::{NewProject, Project, ProjectChanges, ProjectDetail};
use crate::database::store::{ProjectFilter, ProjectUpdate};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::{IdList, Patch};

const NOT_FOUND: &str = "Project not found";

/// GET /project - every live project with its manager and members
pub async fn index(state: &AppState) -> ApiResult<Vec<ProjectDetail>> {
    let projects = state.projects.aggregate_join(ProjectFilter::Active).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /project/{id}
pub async fn show(state: &AppState, id: &str) -> ApiResult<ProjectDetail> {
    let id = parse_path_id(id)?;
    let mut found = state.projects.aggregate_join(ProjectFilter::Id(id)).await?;
    if found.is_empty() {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    Ok(ApiResponse::success(found.swap_remove(0)))
}

/// POST /project
pub async fn create(state: &AppState, body: &[u8]) -> ApiResult<Project> {
    let req: ProjectCreateRequest = parse_body(body)?;

    let manager_id = state
        .integrity
        .validate_manager(req.manager_id.as_deref(), None)
        .await?;
    let member_ids = req.employee_ids.map(IdList::into_vec).unwrap_or_default();
    let employee_ids = state.integrity.validate_employees(&member_ids).await?;

    let new = NewProject {
        name: req.name.unwrap_or_default(),
        manager_id,
        employee_ids,
    };
    new.validate()?;

    let project = state.projects.create(new).await?;
    info!("Created project {}", project.id);
    Ok(ApiResponse::success(project))
}

/// PUT /project/{id}
pub async fn update(state: &AppState, id: &str, body: &[u8]) -> ApiResult<Project> {
    let id = parse_path_id(id)?;
    let req: ProjectUpdateRequest = parse_body(body)?;

    if state.projects.get_one(ProjectFilter::Id(id)).await?.is_none() {
        return Err(ApiError::not_found(NOT_FOUND));
    }

    let manager_id = match req.manager_id {
        Patch::Unset => Patch::Unset,
        Patch::Null => Patch::Null,
        Patch::Set(raw) => {
            let manager = state
                .integrity
                .validate_manager(Some(raw.as_str()), None)
                .await?;
            manager.map_or(Patch::Null, Patch::Set)
        }
    };

    let employee_ids = match req.employee_ids {
        Patch::Unset => None,
        Patch::Null => Some(Vec::new()),
        Patch::Set(list) => Some(state.integrity.validate_employees(&list.into_vec()).await?),
    };

    let changes = ProjectChanges {
        name: required(req.name, "Name")?,
        manager_id,
        employee_ids,
    };
    changes.validate()?;

    if !changes.is_empty() {
        let touched = state
            .projects
            .update_many(ProjectFilter::Id(id), ProjectUpdate::Apply(changes))
            .await?;
        if touched == 0 {
            return Err(ApiError::not_found(NOT_FOUND));
        }
    }

    let project = state
        .projects
        .get_one(ProjectFilter::Id(id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
    Ok(ApiResponse::success(project))
}

/// DELETE /project/{id} - soft delete, nothing references a project
pub async fn delete(state: &AppState, id: &str) -> ApiResult<()> {
    let id = parse_path_id(id)?;
    if !state.projects.delete_one(id).await? {
        return Err(ApiError::not_found(NOT_FOUND));
    }
    info!("Deleted project {}", id);
    Ok(ApiResponse::success(()))
}
