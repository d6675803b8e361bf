//! Portal routes

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{accounts, client, dashboard, media, panel, staff, worker};

/// Create the complete portal router
pub fn router(state: AppState) -> Router {
    let body_limit = state.site.max_body_size;

    Router::new()
        .merge(public_router())
        .route("/dashboard/", get(dashboard::dashboard))
        .nest("/worker", worker_router())
        .nest("/client", client_router())
        .nest("/staff", staff_router())
        .nest("/media", media_router())
        .nest("/panel", panel_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(accounts::home))
        .route("/login/", get(accounts::login_page).post(accounts::login))
        .route("/logout/", get(accounts::logout).post(accounts::logout))
        .route(
            "/register/",
            get(accounts::register_page).post(accounts::register),
        )
}

fn worker_router() -> Router<AppState> {
    Router::new()
        .route("/project/:id/", get(worker::project_detail))
        .route(
            "/project/:id/add-update/",
            get(worker::progress_form).post(worker::submit_progress),
        )
}

fn client_router() -> Router<AppState> {
    Router::new()
        .route("/project/:id/", get(client::project_detail))
        .route(
            "/project/:id/send-message/",
            get(client::message_form).post(client::send_message),
        )
        .route("/inbox/", get(client::inbox))
}

fn staff_router() -> Router<AppState> {
    Router::new()
        .route("/inbox/", get(staff::inbox))
        .route(
            "/message/:id/reply/",
            get(staff::reply_form).post(staff::reply),
        )
        .route("/project/:id/documents/", get(staff::documents))
        .route(
            "/project/:id/documents/upload/",
            get(staff::upload_form).post(staff::upload),
        )
}

fn media_router() -> Router<AppState> {
    Router::new()
        .route("/documents/:id/", get(media::document))
        .route("/updates/:id/image/", get(media::update_image))
}

fn panel_router() -> Router<AppState> {
    Router::new()
        .route("/usuarios/", get(panel::users))
        .route(
            "/usuarios/:id/editar/",
            get(panel::edit_user_form).post(panel::edit_user),
        )
        .route(
            "/usuarios/:id/eliminar/",
            get(panel::delete_user_confirm).post(panel::delete_user),
        )
        .route(
            "/proyectos/",
            get(panel::projects).post(panel::create_project),
        )
        .route(
            "/proyectos/:id/editar/",
            get(panel::edit_project_form).post(panel::edit_project),
        )
        .route(
            "/proyectos/:id/asignaciones/",
            get(panel::assignments).post(panel::assign),
        )
        .route(
            "/proyectos/:id/asignaciones/:worker_id/eliminar/",
            post(panel::unassign),
        )
}
