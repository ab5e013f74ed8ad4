//! Referential integrity between employees and projects.
//!
//! Validation runs before any write and short-circuits on the first failure.
//! Cascades run after a successful primary write and are best-effort: a failed
//! step is logged and the remaining steps still run.

pub mod cascade;
pub mod validate;

use std::sync::Arc;
use thiserror::Error;

use crate::database::store::{EmployeeStore, ProjectStore};

pub use cascade::{CascadeReport, CascadeStep, EmployeeRemoval};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("Manager is invalid")]
    InvalidManager,

    #[error("Peer(s) is invalid")]
    InvalidPeers,

    #[error("Employee(s) is invalid")]
    InvalidEmployees,
}

/// Integrity engine shared by both resource controllers.
#[derive(Clone)]
pub struct Integrity {
    employees: Arc<dyn EmployeeStore>,
    projects: Arc<dyn ProjectStore>,
}

impl Integrity {
    pub fn new(employees: Arc<dyn EmployeeStore>, projects: Arc<dyn ProjectStore>) -> Self {
        Self {
            employees,
            projects,
        }
    }
}
