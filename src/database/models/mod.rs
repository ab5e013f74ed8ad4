pub mod employee;
pub mod project;

pub use employee::{Employee, EmployeeChanges, EmployeeDetail, EmployeeSummary, NewEmployee};
pub use project::{NewProject, Project, ProjectChanges, ProjectDetail, ProjectSummary};

/// Schema-level field errors, surfaced verbatim as validation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} is not a valid email")]
    InvalidEmail(String),
}
