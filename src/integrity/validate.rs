use tracing::warn;
use uuid::Uuid;

use super::{Integrity, IntegrityError};
use crate::database::store::EmployeeFilter;

/// Parse a list of raw ids, dropping duplicates but keeping first-seen order.
/// `None` if any entry is not a valid identifier.
fn parse_distinct(raw: &[String]) -> Option<Vec<Uuid>> {
    let mut ids: Vec<Uuid> = Vec::with_capacity(raw.len());
    for value in raw {
        let id = Uuid::parse_str(value).ok()?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}

/// Peers are only allowed on managers.
pub fn ensure_peers_allowed(peers: &[Uuid], is_manager: bool) -> Result<(), IntegrityError> {
    if !peers.is_empty() && !is_manager {
        return Err(IntegrityError::InvalidPeers);
    }
    Ok(())
}

/// An employee's own manager cannot also be one of its peers.
pub fn ensure_no_manager_cycle(
    peers: &[Uuid],
    manager_id: Option<Uuid>,
) -> Result<(), IntegrityError> {
    match manager_id {
        Some(manager) if peers.contains(&manager) => Err(IntegrityError::InvalidPeers),
        _ => Ok(()),
    }
}

impl Integrity {
    /// A manager reference must resolve to a live employee flagged as manager.
    ///
    /// `owner` is the employee being written, if any; nobody manages
    /// themselves. Lookup failures of any kind make the reference invalid.
    pub async fn validate_manager(
        &self,
        manager_id: Option<&str>,
        owner: Option<Uuid>,
    ) -> Result<Option<Uuid>, IntegrityError> {
        let Some(raw) = manager_id else {
            return Ok(None);
        };
        let id = Uuid::parse_str(raw).map_err(|_| IntegrityError::InvalidManager)?;
        if owner == Some(id) {
            return Err(IntegrityError::InvalidManager);
        }

        match self.employees.get_one(EmployeeFilter::Id(id)).await {
            Ok(Some(manager)) if manager.is_manager => Ok(Some(id)),
            Ok(_) => Err(IntegrityError::InvalidManager),
            Err(e) => {
                warn!("Manager lookup for {} failed: {}", id, e);
                Err(IntegrityError::InvalidManager)
            }
        }
    }

    /// Validate a peer list for an employee whose effective manager flag is
    /// `is_manager`. Returns the distinct peer ids.
    pub async fn validate_peers(
        &self,
        peer_ids: &[String],
        is_manager: bool,
        owner: Option<Uuid>,
    ) -> Result<Vec<Uuid>, IntegrityError> {
        if peer_ids.is_empty() {
            return Ok(Vec::new());
        }
        if !is_manager {
            return Err(IntegrityError::InvalidPeers);
        }

        let ids = parse_distinct(peer_ids).ok_or(IntegrityError::InvalidPeers)?;
        if owner.is_some_and(|owner| ids.contains(&owner)) {
            return Err(IntegrityError::InvalidPeers);
        }

        if self.all_exist(&ids).await {
            Ok(ids)
        } else {
            Err(IntegrityError::InvalidPeers)
        }
    }

    /// Every project member must be a live employee.
    pub async fn validate_employees(
        &self,
        employee_ids: &[String],
    ) -> Result<Vec<Uuid>, IntegrityError> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = parse_distinct(employee_ids).ok_or(IntegrityError::InvalidEmployees)?;
        if self.all_exist(&ids).await {
            Ok(ids)
        } else {
            Err(IntegrityError::InvalidEmployees)
        }
    }

    async fn all_exist(&self, ids: &[Uuid]) -> bool {
        match self.employees.get_many(EmployeeFilter::Ids(ids.to_vec())).await {
            Ok(found) => found.len() == ids.len(),
            Err(e) => {
                warn!("Employee existence check failed: {}", e);
                false
            }
        }
    }
}
