use axum::{extract::State, response::Response};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::service_type;
use crate::error::AppResult;
use crate::response::ApiResponse;
use crate::AppState;

/// List the active service catalog (public; needed to create a booking)
pub async fn list_service_types(State(state): State<AppState>) -> AppResult<Response> {
    let types = service_type::Entity::find()
        .filter(service_type::Column::IsActive.eq(true))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok("Service types", types))
}
