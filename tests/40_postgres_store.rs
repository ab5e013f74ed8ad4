mod common;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;
use staffing_api::database::models::{EmployeeChanges, NewEmployee, NewProject};
use staffing_api::database::store::{
    EmployeeFilter, EmployeeStore, EmployeeUpdate, ProjectFilter, ProjectStore, StoreError,
};
use staffing_api::database::PgStore;
use staffing_api::state::{AppState, BodyLimits};

fn new_employee(name: &str, is_manager: bool, manager_id: Option<Uuid>) -> NewEmployee {
    NewEmployee {
        name: name.into(),
        email: common::unique_email(name),
        is_manager,
        manager_id,
        peers: vec![],
    }
}

#[tokio::test]
async fn delete_cascade_over_postgres() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let app = TestApp::with_state(AppState::new(Arc::new(store), BodyLimits::default()));

    let ann = app
        .employee(json!({"name": "Ann", "email": common::unique_email("ann"), "isManager": true}))
        .await?;
    let bob = app
        .employee(json!({"name": "Bob", "email": common::unique_email("bob"), "managerId": ann}))
        .await?;
    let cat = app
        .employee(json!({
            "name": "Cat",
            "email": common::unique_email("cat"),
            "isManager": true,
            "peers": [ann],
        }))
        .await?;
    let apollo = app
        .project(json!({"name": "Apollo", "managerId": ann, "employeeIds": [ann, bob]}))
        .await?;

    let (status, _) = app.delete(&format!("/employee/{}", ann)).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/project/{}", apollo)).await?;
    assert_eq!(body["data"]["employeeIds"], json!([bob]));
    assert_eq!(body["data"]["managerId"], Value::Null);
    assert_eq!(body["data"]["manager"], Value::Null);

    let (_, body) = app.get(&format!("/employee/{}", bob)).await?;
    assert_eq!(body["data"]["managerId"], Value::Null);
    assert_eq!(body["data"]["projects"], json!([{"id": apollo, "name": "Apollo"}]));

    let (_, body) = app.get(&format!("/employee/{}", cat)).await?;
    assert_eq!(body["data"]["peers"], json!([]));

    let (status, _) = app.get(&format!("/employee/{}", ann)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&format!("/employee/{}", ann)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn joins_keep_rows_whose_manager_is_gone() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };

    let boss = EmployeeStore::create(&store, new_employee("Boss", true, None)).await?;
    let eve = EmployeeStore::create(&store, new_employee("Eve", false, Some(boss.id))).await?;
    let project = ProjectStore::create(
        &store,
        NewProject {
            name: "Mercury".into(),
            manager_id: Some(boss.id),
            employee_ids: vec![eve.id, boss.id],
        },
    )
    .await?;

    let detail = EmployeeStore::aggregate_join(&store, eve.id)
        .await?
        .context("employee row dropped")?;
    assert_eq!(detail.manager.as_ref().map(|m| m.id), Some(boss.id));

    // Remove the manager without running any cascade
    assert!(EmployeeStore::delete_one(&store, boss.id).await?);

    let detail = EmployeeStore::aggregate_join(&store, eve.id)
        .await?
        .context("employee row dropped")?;
    assert_eq!(detail.employee.id, eve.id);
    assert_eq!(detail.employee.manager_id, Some(boss.id));
    assert!(detail.manager.is_none());
    assert_eq!(detail.projects.len(), 1);
    assert_eq!(detail.projects[0].id, project.id);

    let mut found = ProjectStore::aggregate_join(&store, ProjectFilter::Id(project.id)).await?;
    assert_eq!(found.len(), 1);
    let detail = found.swap_remove(0);
    assert_eq!(detail.project.name, "Mercury");
    assert!(detail.manager.is_none());
    let members: Vec<Uuid> = detail.employees.iter().map(|e| e.id).collect();
    assert_eq!(members, vec![eve.id]);
    assert!(detail.project.created_at <= detail.project.updated_at);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };

    let first = EmployeeStore::create(&store, new_employee("Ann", false, None)).await?;
    let mut copy = new_employee("Other Ann", false, None);
    copy.email = first.email.clone();
    let dup = EmployeeStore::create(&store, copy.clone()).await;
    assert!(matches!(dup, Err(StoreError::Conflict("email"))));

    let second = EmployeeStore::create(&store, new_employee("Bob", false, None)).await?;
    let changes = EmployeeChanges {
        email: Some(first.email.clone()),
        ..EmployeeChanges::default()
    };
    let clash = EmployeeStore::update_many(
        &store,
        EmployeeFilter::Id(second.id),
        EmployeeUpdate::Apply(changes),
    )
    .await;
    assert!(matches!(clash, Err(StoreError::Conflict("email"))));

    // Only live rows hold their address
    assert!(EmployeeStore::delete_one(&store, first.id).await?);
    let reused = EmployeeStore::create(&store, copy).await?;
    assert_eq!(reused.email, first.email);
    Ok(())
}

#[tokio::test]
async fn missing_rows_touch_nothing() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let ghost = Uuid::new_v4();

    let touched = EmployeeStore::update_many(
        &store,
        EmployeeFilter::Id(ghost),
        EmployeeUpdate::ClearManager,
    )
    .await?;
    assert_eq!(touched, 0);
    assert!(!EmployeeStore::delete_one(&store, ghost).await?);
    assert!(!ProjectStore::delete_one(&store, ghost).await?);

    let app = TestApp::with_state(AppState::new(Arc::new(store), BodyLimits::default()));
    let (status, body) = app
        .put(&format!("/project/{}", ghost), json!({"name": "Nope"}))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Project not found");
    Ok(())
}

#[tokio::test]
async fn health_checks_the_pool() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let app = TestApp::with_state(AppState::new(Arc::new(store), BodyLimits::default()));

    let (status, body) = app.get("/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["store"], "ok");
    Ok(())
}

#[tokio::test]
async fn store_is_usable_as_trait_objects() -> Result<()> {
    let Some(store) = common::pg_store().await? else {
        return Ok(());
    };
    let store: Arc<PgStore> = Arc::new(store);
    let employees: Arc<dyn EmployeeStore> = store.clone();

    let ann = employees.create(new_employee("Ann", true, None)).await?;
    let found = employees.get_many(EmployeeFilter::Ids(vec![ann.id])).await?;
    assert_eq!(found.len(), 1);
    assert!(found[0].is_manager);
    Ok(())
}
