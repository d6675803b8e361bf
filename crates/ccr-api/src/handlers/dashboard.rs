//! Role-branched dashboard

use axum::{extract::State, response::IntoResponse};
use ccr_services::DashboardService;

use crate::error::ApiResult;
use crate::extractors::{AppState, AuthenticatedUser};

/// GET /dashboard/
pub async fn dashboard(
    State(state): State<AppState>,
    mut user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let dashboard = DashboardService::new(&state.services).load(&user).await?;
    user.page(&state, "Dashboard", dashboard)
}
