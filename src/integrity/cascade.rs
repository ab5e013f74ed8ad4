use tracing::{debug, warn};
use uuid::Uuid;

use super::Integrity;
use crate::database::store::{
    EmployeeFilter, EmployeeUpdate, ProjectFilter, ProjectUpdate, StoreError,
};

/// One bulk reference cleanup for a departing (or demoted) employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeStep {
    /// Remove the employee from every project's `employeeIds`
    PullFromProjects,
    /// Null `managerId` on projects managed by the employee
    ClearProjectManager,
    /// Remove the employee from every other employee's `peers`
    PullFromPeers,
    /// Null `managerId` on employees managed by the employee
    ClearEmployeeManager,
}

impl CascadeStep {
    /// Run before an employee is deleted, in this order.
    pub const EMPLOYEE_DELETE: [CascadeStep; 4] = [
        CascadeStep::PullFromProjects,
        CascadeStep::ClearProjectManager,
        CascadeStep::PullFromPeers,
        CascadeStep::ClearEmployeeManager,
    ];

    /// Run after an update turns a manager into a non-manager.
    pub const MANAGER_DEMOTION: [CascadeStep; 2] = [
        CascadeStep::ClearProjectManager,
        CascadeStep::ClearEmployeeManager,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CascadeStep::PullFromProjects => "pull_from_projects",
            CascadeStep::ClearProjectManager => "clear_project_manager",
            CascadeStep::PullFromPeers => "pull_from_peers",
            CascadeStep::ClearEmployeeManager => "clear_employee_manager",
        }
    }
}

/// Outcome of a cascade run. Failures never abort the run.
#[derive(Debug, Default)]
pub struct CascadeReport {
    pub applied: Vec<(CascadeStep, u64)>,
    pub failed: Vec<(CascadeStep, String)>,
}

impl CascadeReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug)]
pub struct EmployeeRemoval {
    /// `false` when the record was already gone by the time of removal
    pub removed: bool,
    pub cascade: CascadeReport,
}

impl Integrity {
    pub async fn run_cascade(&self, employee_id: Uuid, steps: &[CascadeStep]) -> CascadeReport {
        let mut report = CascadeReport::default();
        for step in steps {
            match self.apply_step(*step, employee_id).await {
                Ok(touched) => {
                    debug!("Cascade {} for {} touched {} rows", step.name(), employee_id, touched);
                    report.applied.push((*step, touched));
                }
                Err(e) => {
                    warn!("Cascade {} for {} failed: {}", step.name(), employee_id, e);
                    report.failed.push((*step, e.to_string()));
                }
            }
        }
        report
    }

    async fn apply_step(&self, step: CascadeStep, id: Uuid) -> Result<u64, StoreError> {
        match step {
            CascadeStep::PullFromProjects => {
                self.projects
                    .update_many(ProjectFilter::HasEmployee(id), ProjectUpdate::RemoveEmployee(id))
                    .await
            }
            CascadeStep::ClearProjectManager => {
                self.projects
                    .update_many(ProjectFilter::ManagedBy(id), ProjectUpdate::ClearManager)
                    .await
            }
            CascadeStep::PullFromPeers => {
                self.employees
                    .update_many(EmployeeFilter::HasPeer(id), EmployeeUpdate::RemovePeer(id))
                    .await
            }
            CascadeStep::ClearEmployeeManager => {
                self.employees
                    .update_many(EmployeeFilter::ManagedBy(id), EmployeeUpdate::ClearManager)
                    .await
            }
        }
    }

    /// Clean every inbound reference, then soft-delete the employee.
    ///
    /// Cascade failures are logged and reported but the removal is always
    /// attempted; only a failure of the removal itself is an error.
    pub async fn delete_employee(&self, id: Uuid) -> Result<EmployeeRemoval, StoreError> {
        let cascade = self.run_cascade(id, &CascadeStep::EMPLOYEE_DELETE).await;
        let removed = self.employees.delete_one(id).await?;
        Ok(EmployeeRemoval { removed, cascade })
    }

    /// Point every newly assigned peer back at its manager and drop it from
    /// any other manager's peer list. Best-effort.
    pub async fn reciprocate_peers(&self, manager_id: Uuid, peers: &[Uuid]) {
        if peers.is_empty() {
            return;
        }
        for peer in peers {
            let released = self
                .employees
                .update_many(
                    EmployeeFilter::HasPeerExcept {
                        peer: *peer,
                        owner: manager_id,
                    },
                    EmployeeUpdate::RemovePeer(*peer),
                )
                .await;
            if let Err(e) = released {
                warn!("Releasing peer {} from other managers failed: {}", peer, e);
            }
        }
        let update = self
            .employees
            .update_many(
                EmployeeFilter::Ids(peers.to_vec()),
                EmployeeUpdate::SetManager(manager_id),
            )
            .await;
        if let Err(e) = update {
            warn!("Setting manager {} on peers failed: {}", manager_id, e);
        }
    }
}
