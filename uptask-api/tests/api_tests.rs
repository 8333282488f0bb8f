/// HTTP integration tests
///
/// Drive the full router (JWT layer, resource extractors, validation and
/// handlers) over the in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use common::{id_of, TestContext};
use serde_json::json;
use tower::Service as _;
use uptask_shared::{models::task::TaskStatus, store::Store};
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.send(Method::GET, "/api/projects", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_token_for_unknown_user_is_unauthorized() {
    let ctx = TestContext::new().await.unwrap();

    let request = axum::http::Request::builder()
        .uri("/api/projects")
        .header(
            "authorization",
            format!("Bearer {}", common::token_for(Uuid::new_v4())),
        )
        .body(axum::body::Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_list_projects() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;

    let (status, body) = ctx
        .send(Method::GET, "/api/projects", Some(&ctx.manager), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(id_of(&body[0]), project_id);
    assert_eq!(body[0]["manager"], ctx.manager.id.to_string());

    // Outsiders see nothing
    let (_, body) = ctx
        .send(Method::GET, "/api/projects", Some(&ctx.outsider), None)
        .await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_client_name_is_rejected_and_nothing_persisted() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/projects",
            Some(&ctx.manager),
            Some(json!({
                "projectName": "Tienda",
                "clientName": "   ",
                "description": "Sitio web",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["message"], "El Nombre del Cliente es Obligatorio");
    assert_eq!(body["details"][0]["field"], "clientName");

    let projects = ctx.store.list_projects_for_user(ctx.manager.id).await.unwrap();
    assert!(projects.is_empty());
}

#[tokio::test]
async fn test_null_client_name_is_a_field_error() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/projects",
            Some(&ctx.manager),
            Some(json!({
                "projectName": "Tienda",
                "clientName": null,
                "description": "Sitio web",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "clientName");
    assert_eq!(body["details"][0]["message"], "El Nombre del Cliente es Obligatorio");
    assert!(ctx.store.list_projects_for_user(ctx.manager.id).await.unwrap().is_empty());

    // Scalars are taken as their text
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/projects",
            Some(&ctx.manager),
            Some(json!({ "projectName": "Tienda", "clientName": 5, "description": "Sitio web" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["clientName"], "5");
}

#[tokio::test]
async fn test_missing_fields_reported_per_field() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(Method::POST, "/api/projects", Some(&ctx.manager), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["clientName", "description", "projectName"]);
    assert_eq!(body["details"][1]["message"], "La Descripción del Proyecto es Obligatorio");
}

#[tokio::test]
async fn test_missing_field_messages() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;
    let task_uri = format!("/api/projects/{project_id}/tasks/{task_id}");

    let cases = [
        (
            format!("/api/projects/{project_id}/tasks"),
            json!({}),
            vec!["La Descripción de la tarea es Obligatorio", "El Nombre de la Tarea es Obligatorio"],
        ),
        (format!("{task_uri}/notes"), json!({}), vec!["El contenido de la nota es obligatorio"]),
        (format!("{task_uri}/status"), json!({}), vec!["El estado es obligatorio"]),
        (
            format!("/api/projects/{project_id}/team/find"),
            json!({ "email": "no-es-un-email" }),
            vec!["Email no válido"],
        ),
    ];

    for (uri, payload, expected) in cases {
        let (status, body) = ctx
            .send(Method::POST, &uri, Some(&ctx.manager), Some(payload))
            .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        let messages: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["message"].as_str().unwrap())
            .collect();
        assert_eq!(messages, expected, "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_project_id_is_rejected_before_lookup() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(Method::GET, "/api/projects/123", Some(&ctx.manager), None)
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "ID no válido");
    assert_eq!(body["details"][0]["field"], "projectId");
}

#[tokio::test]
async fn test_unknown_project_is_not_found() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{}", Uuid::new_v4()),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Proyecto no encontrado");
}

#[tokio::test]
async fn test_non_manager_update_is_forbidden_and_record_unchanged() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.member),
            Some(json!({
                "projectName": "Robado",
                "clientName": "Otro",
                "description": "Cambio",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Acción no válida");

    let project = ctx.store.find_project(project_id).await.unwrap().unwrap();
    assert_eq!(project.project_name, "Tienda");
    assert_eq!(project.client_name, "Acme");
}

#[tokio::test]
async fn test_manager_update() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            Some(json!({
                "projectName": "Tienda v2",
                "clientName": "Acme",
                "description": "Rediseño",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectName"], "Tienda v2");
}

#[tokio::test]
async fn test_outsider_cannot_read_project() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.outsider),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_task_from_another_project_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let project_a = ctx.create_project("A").await;
    let project_b = ctx.create_project("B").await;
    let task_b = ctx.create_task(project_b, "Diseño").await;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_a}/tasks/{task_b}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Tarea no encontrada");
}

#[tokio::test]
async fn test_outsider_is_forbidden_before_task_lookup() {
    let ctx = TestContext::new().await.unwrap();
    let project_a = ctx.create_project("A").await;
    let project_b = ctx.create_project("B").await;
    let task_a = ctx.create_task(project_a, "Maquetar").await;
    let task_b = ctx.create_task(project_b, "Diseño").await;

    for task_id in [task_a, task_b, Uuid::new_v4()] {
        let (status, body) = ctx
            .send(
                Method::GET,
                &format!("/api/projects/{project_a}/tasks/{task_id}"),
                Some(&ctx.outsider),
                None,
            )
            .await;

        assert_eq!(status, StatusCode::FORBIDDEN, "{task_id}");
        assert_eq!(body["message"], "Acción no válida");
    }

    // A member who is not the manager is stopped before the task lookup too
    ctx.add_member(project_a).await;
    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/projects/{project_a}/tasks/{}", Uuid::new_v4()),
            Some(&ctx.member),
            Some(json!({ "name": "x", "description": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_member_cannot_create_task() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/tasks"),
            Some(&ctx.member),
            Some(json!({ "name": "x", "description": "y" })),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.store.list_tasks(project_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_project_detail_includes_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["projectName"], "Tienda");
    assert_eq!(id_of(&body["tasks"][0]), task_id);
    assert_eq!(body["tasks"][0]["status"], "pending");
}

#[tokio::test]
async fn test_status_update_appends_history() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;
    let uri = format!("/api/projects/{project_id}/tasks/{task_id}/status");

    let (status, body) = ctx
        .send(
            Method::POST,
            &uri,
            Some(&ctx.member),
            Some(json!({ "status": "inProgress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inProgress");

    let (status, _) = ctx
        .send(
            Method::POST,
            &uri,
            Some(&ctx.manager),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let history = ctx.store.status_history(task_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].user_id, ctx.member.id);
    assert_eq!(history[0].previous_status, Some(TaskStatus::Pending));
    assert_eq!(history[1].status, TaskStatus::Completed);

    let (_, detail) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_id}/tasks/{task_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;
    assert_eq!(detail["completedBy"].as_array().unwrap().len(), 2);
    assert_eq!(detail["status"], "completed");
}

#[tokio::test]
async fn test_unknown_status_is_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/tasks/{task_id}/status"),
            Some(&ctx.manager),
            Some(json!({ "status": "finished" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "status");
    assert!(ctx.store.status_history(task_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_team_management() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let team_uri = format!("/api/projects/{project_id}/team");

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("{team_uri}/find"),
            Some(&ctx.manager),
            Some(json!({ "email": "MEMBER@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(id_of(&body), ctx.member.id);
    assert!(body.get("password_hash").is_none());

    ctx.add_member(project_id).await;

    let (status, body) = ctx
        .send(Method::GET, &team_uri, Some(&ctx.member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["email"], "member@example.com");

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("{team_uri}/{}", ctx.member.id),
            Some(&ctx.manager),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let project = ctx.store.find_project(project_id).await.unwrap().unwrap();
    assert!(project.team.is_empty());
}

#[tokio::test]
async fn test_duplicate_member_is_conflict() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/team"),
            Some(&ctx.manager),
            Some(json!({ "id": ctx.member.id })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "El usuario ya existe en el proyecto");

    // The manager cannot join their own team either
    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/team"),
            Some(&ctx.manager),
            Some(json!({ "id": ctx.manager.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_team_edge_cases() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/team"),
            Some(&ctx.manager),
            Some(json!({ "id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}/team/{}", ctx.outsider.id),
            Some(&ctx.manager),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/projects/{project_id}/team/find"),
            Some(&ctx.manager),
            Some(json!({ "email": "nadie@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_non_author_cannot_delete_note() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;
    let note_id = ctx.create_note(project_id, task_id, &ctx.member).await;
    let note_uri = format!("/api/projects/{project_id}/tasks/{task_id}/notes/{note_id}");

    let (status, _) = ctx
        .send(Method::DELETE, &note_uri, Some(&ctx.manager), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.store.find_note(note_id).await.unwrap().is_some());

    let (status, body) = ctx
        .send(Method::DELETE, &note_uri, Some(&ctx.member), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Nota Eliminada");
    assert!(ctx.store.find_note(note_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_note_from_another_task_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_a = ctx.create_task(project_id, "A").await;
    let task_b = ctx.create_task(project_id, "B").await;
    let note_b = ctx.create_note(project_id, task_b, &ctx.manager).await;

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}/tasks/{task_a}/notes/{note_b}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(ctx.store.find_note(note_b).await.unwrap().is_some());
}

#[tokio::test]
async fn test_task_delete_removes_its_notes() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;
    let kept_task = ctx.create_task(project_id, "Publicar").await;
    ctx.create_note(project_id, task_id, &ctx.manager).await;
    ctx.create_note(project_id, task_id, &ctx.manager).await;
    let kept_note = ctx.create_note(project_id, kept_task, &ctx.manager).await;

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}/tasks/{task_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Tarea Eliminada");
    assert!(ctx.store.find_task(task_id).await.unwrap().is_none());
    assert!(ctx.store.list_notes(task_id).await.unwrap().is_empty());
    assert!(ctx.store.find_note(kept_note).await.unwrap().is_some());
}

#[tokio::test]
async fn test_project_delete_cascades() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let other_project = ctx.create_project("Blog").await;
    let other_task = ctx.create_task(other_project, "Escribir").await;

    let mut tasks = Vec::new();
    for name in ["Maquetar", "Publicar", "Probar"] {
        let task_id = ctx.create_task(project_id, name).await;
        ctx.create_note(project_id, task_id, &ctx.manager).await;
        tasks.push(task_id);
    }

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Proyecto Eliminado");
    assert!(ctx.store.find_project(project_id).await.unwrap().is_none());
    for task_id in tasks {
        assert!(ctx.store.find_task(task_id).await.unwrap().is_none());
        assert!(ctx.store.list_notes(task_id).await.unwrap().is_empty());
    }
    assert!(ctx.store.find_task(other_task).await.unwrap().is_some());

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failed_project_delete_keeps_everything() {
    let ctx = TestContext::with_failing_cascade().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;
    let note_id = ctx.create_note(project_id, task_id, &ctx.manager).await;

    let (status, body) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "Hubo un error");
    assert!(!body.to_string().contains("connection reset"));

    assert!(ctx.store.find_project(project_id).await.unwrap().is_some());
    assert!(ctx.store.find_task(task_id).await.unwrap().is_some());
    assert!(ctx.store.find_note(note_id).await.unwrap().is_some());

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.manager),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_member_cannot_delete_project() {
    let ctx = TestContext::new().await.unwrap();
    let project_id = ctx.create_project("Tienda").await;
    ctx.add_member(project_id).await;
    let task_id = ctx.create_task(project_id, "Maquetar").await;

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/projects/{project_id}"),
            Some(&ctx.member),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(ctx.store.find_task(task_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new().await.unwrap();

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
