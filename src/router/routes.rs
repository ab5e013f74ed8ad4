use axum::http::Method;

use super::{Action, PathPattern, Route, RouteTable};

const EMPLOYEES: PathPattern = PathPattern::Exact("/employee");
const EMPLOYEE: PathPattern = PathPattern::Param {
    prefix: "/employee/",
};
const PROJECTS: PathPattern = PathPattern::Exact("/project");
const PROJECT: PathPattern = PathPattern::Param {
    prefix: "/project/",
};

/// The service's route table, in match order.
pub fn table() -> RouteTable {
    RouteTable::new(vec![
        // Employees
        Route::new(Method::GET, EMPLOYEES, Action::EmployeeIndex),
        Route::new(Method::GET, EMPLOYEE, Action::EmployeeShow),
        Route::new(Method::POST, EMPLOYEES, Action::EmployeeCreate),
        Route::new(Method::PUT, EMPLOYEE, Action::EmployeeUpdate),
        Route::new(Method::DELETE, EMPLOYEE, Action::EmployeeDelete),
        // Projects
        Route::new(Method::POST, PROJECTS, Action::ProjectCreate),
        Route::new(Method::GET, PROJECTS, Action::ProjectIndex),
        Route::new(Method::GET, PROJECT, Action::ProjectShow),
        Route::new(Method::PUT, PROJECT, Action::ProjectUpdate),
        Route::new(Method::DELETE, PROJECT, Action::ProjectDelete),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_endpoint_is_registered_once() {
        let table = table();
        assert_eq!(table.routes().len(), 10);
        for route in table.routes() {
            let same = table
                .routes()
                .iter()
                .filter(|r| r.method == route.method && r.pattern == route.pattern)
                .count();
            assert_eq!(same, 1, "{} {:?}", route.method, route.pattern);
        }
    }
}
