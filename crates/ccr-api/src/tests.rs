//! Router tests against the in-memory stores

use std::sync::{Arc, OnceLock};

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use ccr_attachments::MemoryStorage;
use ccr_auth::{hash_password, MemorySessionStore};
use ccr_core::config::AppConfig;
use ccr_core::traits::Id;
use ccr_db::Stores;
use ccr_models::{Account, NewProject, NewUser, Project, Role};
use ccr_services::{ServiceContext, ServiceSettings};
use serde_json::Value;
use tower::ServiceExt;

use crate::{router, AppState};

const PASSWORD: &str = "obra-segura-2024";
const BOUNDARY: &str = "ccr-test-boundary";

fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

struct TestApp {
    app: Router,
    state: AppState,
    project: Project,
    admin: Account,
    client: Account,
}

async fn create_account(ctx: &ServiceContext, username: &str, role: Role) -> Account {
    ctx.stores
        .users
        .create_account(NewUser {
            username: username.into(),
            email: format!("{}@example.com", username),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: password_hash(),
            role,
            phone: None,
            company_name: None,
        })
        .await
        .unwrap()
}

async fn test_app() -> TestApp {
    let config = AppConfig::default();
    let ctx = ServiceContext::new(
        Stores::memory(),
        Arc::new(MemoryStorage::new()),
        ServiceSettings::from_config(&config),
    );

    let admin = create_account(&ctx, "admin", Role::Admin).await;
    let worker = create_account(&ctx, "obrero", Role::Worker).await;
    create_account(&ctx, "obrero2", Role::Worker).await;
    let client = create_account(&ctx, "cliente", Role::Client).await;
    create_account(&ctx, "cliente2", Role::Client).await;

    let project = ctx
        .stores
        .projects
        .create(NewProject {
            name: "Residencial Los Pinos".into(),
            description: None,
            address: "Av. Ejercito 710".into(),
            city: "Arequipa".into(),
            status: Default::default(),
            start_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            estimated_end_date: None,
            actual_end_date: None,
            client_id: Some(client.id()),
            created_by_id: Some(admin.id()),
        })
        .await
        .unwrap();
    ctx.stores
        .assignments
        .assign(project.id, worker.id())
        .await
        .unwrap();

    let state = AppState::new(ctx, Arc::new(MemorySessionStore::new()), &config);
    TestApp {
        app: router(state.clone()),
        state,
        project,
        admin,
        client,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn post_multipart(&self, uri: &str, cookie: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Log in and return the `Cookie` header value for the new session
    async fn login(&self, username: &str) -> String {
        let body = format!("username={}&password={}", username, PASSWORD);
        let response = self.post_form("/login/", None, &body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response)
    }
}

fn session_cookie(response: &Response) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, file_name, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn project_progress(app: &TestApp, id: Id) -> String {
    app.state
        .services
        .project(id)
        .await
        .unwrap()
        .progress
        .to_string()
}

#[tokio::test]
async fn test_anonymous_is_sent_to_login() {
    let app = test_app().await;
    let response = app.get("/dashboard/", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=%2Fdashboard%2F");
}

#[tokio::test]
async fn test_bad_login_renders_inline_error() {
    let app = test_app().await;
    let response = app
        .post_form("/login/", None, "username=cliente&password=wrong")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let page = json(response).await;
    assert_eq!(page["page_title"], "Log in");
    assert_eq!(page["data"]["form"]["username"], "cliente");
    assert!(page["data"]["form"].get("password").is_none());
    assert_eq!(page["data"]["errors"]["base_errors"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_login_follows_safe_next_only() {
    let app = test_app().await;

    let body = format!("username=cliente&password={}&next=%2Fclient%2Finbox%2F", PASSWORD);
    let response = app.post_form("/login/", None, &body).await;
    assert_eq!(location(&response), "/client/inbox/");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let body = format!("username=cliente&password={}&next=https://evil.example.com/", PASSWORD);
    let response = app.post_form("/login/", None, &body).await;
    assert_eq!(location(&response), "/dashboard/");
}

#[tokio::test]
async fn test_dashboard_page_context() {
    let app = test_app().await;
    let cookie = app.login("cliente").await;

    let response = app.get("/dashboard/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = json(response).await;
    assert_eq!(page["company_name"], "CCR CONSULTORES");
    assert_eq!(page["page_title"], "Dashboard");
    assert_eq!(page["user"]["username"], "cliente");
    assert_eq!(page["data"]["role"], "CLIENT");
    assert_eq!(page["data"]["projects"][0]["name"], "Residencial Los Pinos");
}

#[tokio::test]
async fn test_registration_always_creates_client() {
    let app = test_app().await;
    let body = format!(
        "username=nuevo&email=nuevo%40example.com&password1={p}&password2={p}&role=ADMIN",
        p = PASSWORD
    );
    let response = app.post_form("/register/", None, &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/dashboard/");
    let cookie = session_cookie(&response);

    let page = json(app.get("/dashboard/", Some(&cookie)).await).await;
    assert_eq!(page["user"]["role"], "CLIENT");
    assert_eq!(page["messages"].as_array().unwrap().len(), 1);

    let page = json(app.get("/dashboard/", Some(&cookie)).await).await;
    assert!(page["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_registration_errors_are_unprocessable() {
    let app = test_app().await;
    let response = app
        .post_form("/register/", None, "username=cliente&email=bad&password1=x&password2=y")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = json(response).await;
    assert_eq!(page["data"]["form"]["username"], "cliente");
    let errors = &page["data"]["errors"]["errors"];
    assert!(errors.get("username").is_some());
    assert!(errors.get("email").is_some());
}

#[tokio::test]
async fn test_progress_update_flow() {
    let app = test_app().await;
    let cookie = app.login("obrero").await;
    let uri = format!("/worker/project/{}/add-update/", app.project.id);

    let page = json(app.get(&uri, Some(&cookie)).await).await;
    assert_eq!(page["data"]["form"]["progress_percent"], "0.00");

    let body = multipart(&[
        Part::Text("progress_percent", "45,5"),
        Part::Text("comment", "Muros del segundo piso"),
        Part::File("image", "avance.jpg", b"\xff\xd8\xff"),
    ]);
    let response = app.post_multipart(&uri, &cookie, body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("/worker/project/{}/", app.project.id)
    );
    assert_eq!(project_progress(&app, app.project.id).await, "45.50");

    let detail = json(
        app.get(&format!("/worker/project/{}/", app.project.id), Some(&cookie))
            .await,
    )
    .await;
    assert_eq!(detail["messages"][0]["level"], "success");
    let update_id = detail["data"]["updates"][0]["id"].as_i64().unwrap();

    let client = app.login("cliente").await;
    let image = app
        .get(&format!("/media/updates/{}/image/", update_id), Some(&client))
        .await;
    assert_eq!(image.status(), StatusCode::OK);
    assert_eq!(image.headers()[header::CONTENT_TYPE], "image/jpeg");
}

#[tokio::test]
async fn test_out_of_range_progress_is_rejected() {
    let app = test_app().await;
    let cookie = app.login("obrero").await;
    let uri = format!("/worker/project/{}/add-update/", app.project.id);

    let body = multipart(&[Part::Text("progress_percent", "120")]);
    let response = app.post_multipart(&uri, &cookie, body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let page = json(response).await;
    assert_eq!(page["data"]["form"]["progress_percent"], "120");
    assert!(page["data"]["errors"]["errors"]["progress_percent"].is_array());
    assert_eq!(project_progress(&app, app.project.id).await, "0.00");
}

#[tokio::test]
async fn test_unassigned_worker_is_forbidden() {
    let app = test_app().await;
    let cookie = app.login("obrero2").await;

    let response = app
        .get(&format!("/worker/project/{}/", app.project.id), Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json(response).await;
    assert_eq!(body["error"], "forbidden");

    let uri = format!("/worker/project/{}/add-update/", app.project.id);
    let body = multipart(&[Part::Text("progress_percent", "80")]);
    let response = app.post_multipart(&uri, &cookie, body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(project_progress(&app, app.project.id).await, "0.00");
}

#[tokio::test]
async fn test_message_and_reply_flow() {
    let app = test_app().await;
    let client = app.login("cliente").await;

    let uri = format!("/client/project/{}/send-message/", app.project.id);
    let response = app
        .post_form(&uri, Some(&client), "subject=Ventanas&body=%C2%BFCu%C3%A1ndo%3F")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let staff = app.login("obrero").await;
    let inbox = json(app.get("/staff/inbox/", Some(&staff)).await).await;
    let message_id = inbox["data"][0]["message"]["id"].as_i64().unwrap();
    assert_eq!(inbox["data"][0]["sender_name"], "cliente");

    let reply_uri = format!("/staff/message/{}/reply/", message_id);
    let form = json(app.get(&reply_uri, Some(&staff)).await).await;
    assert_eq!(form["data"]["context"]["subject"], "Re: Ventanas");

    let response = app
        .post_form(&reply_uri, Some(&staff), "body=La+pr%C3%B3xima+semana")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/staff/inbox/");

    let inbox = json(app.get("/client/inbox/", Some(&client)).await).await;
    assert_eq!(inbox["data"]["received"][0]["message"]["subject"], "Re: Ventanas");
    assert_eq!(inbox["data"]["sent"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_reply_is_rerendered() {
    let app = test_app().await;
    let client = app.login("cliente").await;
    let uri = format!("/client/project/{}/send-message/", app.project.id);
    app.post_form(&uri, Some(&client), "body=Hola").await;

    let staff = app.login("admin").await;
    let inbox = json(app.get("/staff/inbox/", Some(&staff)).await).await;
    let message_id = inbox["data"][0]["message"]["id"].as_i64().unwrap();

    let response = app
        .post_form(&format!("/staff/message/{}/reply/", message_id), Some(&staff), "body=")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert!(page["data"]["errors"]["errors"]["body"].is_array());
    assert_eq!(page["data"]["context"]["subject"], "Re: ");
}

#[tokio::test]
async fn test_role_gates() {
    let app = test_app().await;
    let client = app.login("cliente").await;
    let other_client = app.login("cliente2").await;

    assert_eq!(
        app.get("/staff/inbox/", Some(&client)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get(&format!("/client/project/{}/", app.project.id), Some(&other_client))
            .await
            .status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/panel/usuarios/", Some(&client)).await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        app.get("/panel/usuarios/9999/editar/", Some(&client)).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_document_visibility() {
    let app = test_app().await;
    let staff = app.login("obrero").await;
    let upload_uri = format!("/staff/project/{}/documents/upload/", app.project.id);

    for (title, visible, file) in [("Planos", "on", "planos.pdf"), ("Costos", "false", "costos.pdf")] {
        let body = multipart(&[
            Part::Text("title", title),
            Part::Text("visible_to_client", visible),
            Part::File("file", file, b"%PDF-1.4"),
        ]);
        let response = app.post_multipart(&upload_uri, &staff, body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    let list = json(
        app.get(&format!("/staff/project/{}/documents/", app.project.id), Some(&staff))
            .await,
    )
    .await;
    let documents = list["data"]["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);
    let hidden_id = documents
        .iter()
        .find(|d| d["title"] == "Costos")
        .and_then(|d| d["id"].as_i64())
        .unwrap();

    let client = app.login("cliente").await;
    let detail = json(
        app.get(&format!("/client/project/{}/", app.project.id), Some(&client))
            .await,
    )
    .await;
    let visible = detail["data"]["documents"].as_array().unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0]["title"], "Planos");

    let visible_id = visible[0]["id"].as_i64().unwrap();
    let download = app
        .get(&format!("/media/documents/{}/", visible_id), Some(&client))
        .await;
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(
        download.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"planos.pdf\""
    );

    assert_eq!(
        app.get(&format!("/media/documents/{}/", hidden_id), Some(&client))
            .await
            .status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_unchecked_visibility_hides_document() {
    let app = test_app().await;
    let staff = app.login("obrero").await;
    let upload_uri = format!("/staff/project/{}/documents/upload/", app.project.id);

    let page = json(app.get(&upload_uri, Some(&staff)).await).await;
    assert_eq!(page["data"]["form"]["visible_to_client"], true);

    let body = multipart(&[
        Part::Text("title", "Presupuesto interno"),
        Part::File("file", "presupuesto.pdf", b"%PDF-1.4"),
    ]);
    let response = app.post_multipart(&upload_uri, &staff, body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let list = json(
        app.get(&format!("/staff/project/{}/documents/", app.project.id), Some(&staff))
            .await,
    )
    .await;
    let documents = list["data"]["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0]["visible_to_client"], false);

    let client = app.login("cliente").await;
    let detail = json(
        app.get(&format!("/client/project/{}/", app.project.id), Some(&client))
            .await,
    )
    .await;
    assert!(detail["data"]["documents"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = test_app().await;
    let staff = app.login("admin").await;
    let upload_uri = format!("/staff/project/{}/documents/upload/", app.project.id);

    let body = multipart(&[Part::Text("title", "Planos"), Part::File("file", "", b"")]);
    let response = app.post_multipart(&upload_uri, &staff, body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = json(response).await;
    assert_eq!(page["data"]["form"]["title"], "Planos");
    assert!(page["data"]["errors"]["errors"]["file"].is_array());
}

#[tokio::test]
async fn test_admin_manages_projects_and_assignments() {
    let app = test_app().await;
    let admin = app.login("admin").await;

    let body = format!(
        "name=Colegio+San+Juan&address=Calle+Mercaderes+120&city=Arequipa\
         &status=EN_PROGRESO&start_date=2024-05-02&client_id={}",
        app.client.id()
    );
    let response = app.post_form("/panel/proyectos/", Some(&admin), &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/panel/proyectos/");

    let panel = json(app.get("/panel/proyectos/", Some(&admin)).await).await;
    let projects = panel["data"]["context"]["projects"].as_array().unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(projects[0]["name"], "Colegio San Juan");
    let new_id = projects[0]["id"].as_i64().unwrap();

    let response = app
        .post_form("/panel/proyectos/", Some(&admin), "name=&address=&city=")
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let assignments = format!("/panel/proyectos/{}/asignaciones/", new_id);
    let panel = json(app.get(&assignments, Some(&admin)).await).await;
    let worker_id = panel["data"]["context"]["available"][0]["user"]["id"]
        .as_i64()
        .unwrap();

    let body = format!("worker_id={}", worker_id);
    let response = app.post_form(&assignments, Some(&admin), &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), assignments);

    let response = app.post_form(&assignments, Some(&admin), &body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let unassign = format!("{}{}/eliminar/", assignments, worker_id);
    let response = app.post_form(&unassign, Some(&admin), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let response = app.post_form(&unassign, Some(&admin), "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_user_ends_their_sessions() {
    let app = test_app().await;
    let admin = app.login("admin").await;
    let client = app.login("cliente").await;

    let uri = format!("/panel/usuarios/{}/eliminar/", app.client.id());
    let response = app.post_form(&uri, Some(&admin), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/panel/usuarios/");

    let response = app.get("/dashboard/", Some(&client)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let own = format!("/panel/usuarios/{}/eliminar/", app.admin.id());
    let response = app.post_form(&own, Some(&admin), "").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_change_applies_to_existing_session() {
    let app = test_app().await;
    let admin = app.login("admin").await;
    let client = app.login("cliente").await;

    let uri = format!("/panel/usuarios/{}/editar/", app.client.id());
    let response = app
        .post_form(&uri, Some(&admin), "role=WORKER&phone=054-201010")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let page = json(app.get("/dashboard/", Some(&client)).await).await;
    assert_eq!(page["user"]["role"], "WORKER");
    assert_eq!(
        app.get("/client/inbox/", Some(&client)).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
async fn test_logout_clears_session() {
    let app = test_app().await;
    let cookie = app.login("cliente").await;

    let response = app.post_form("/logout/", Some(&cookie), "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    assert_eq!(
        app.get("/dashboard/", Some(&cookie)).await.status(),
        StatusCode::SEE_OTHER
    );
    let landing = json(app.get("/", Some(&cookie)).await).await;
    assert_eq!(landing["data"]["authenticated"], false);
}
