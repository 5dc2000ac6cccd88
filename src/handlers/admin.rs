use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::technician::{self, CertificationLevel};
use crate::entities::user::{self, UserRole};
use crate::entities::service_type;
use crate::error::{AppError, AppResult};
use crate::response::{ApiResponse, Page};
use crate::AppState;

// ============ Technician management ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTechnicianRequest {
    pub user_id: Uuid,
    pub employee_id: String,
    pub specializations: Vec<String>,
    pub certification_level: CertificationLevel,
    pub hourly_rate: f64,
    pub service_radius_km: f64,
    pub phone: Option<String>,
    pub vehicle_info: Option<serde_json::Value>,
    pub emergency_certified: Option<bool>,
}

/// Promote an existing user to technician and create their profile
pub async fn create_technician(
    State(state): State<AppState>,
    Json(payload): Json<CreateTechnicianRequest>,
) -> AppResult<Response> {
    if payload.employee_id.trim().is_empty() {
        return Err(AppError::Validation("employeeId is required".to_string()));
    }
    if payload.hourly_rate < 0.0 {
        return Err(AppError::Validation(
            "hourlyRate must not be negative".to_string(),
        ));
    }
    if payload.service_radius_km <= 0.0 {
        return Err(AppError::Validation(
            "serviceRadiusKm must be positive".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(payload.user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let existing = technician::Entity::find()
        .filter(technician::Column::UserId.eq(user.id))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "User already has a technician profile".to_string(),
        ));
    }

    let duplicate_badge = technician::Entity::find()
        .filter(technician::Column::EmployeeId.eq(payload.employee_id.trim()))
        .one(&state.db)
        .await?;
    if duplicate_badge.is_some() {
        return Err(AppError::Conflict("Employee ID already in use".to_string()));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    // The profile and the role flip land together or not at all
    if user.role != UserRole::Technician {
        let mut active: user::ActiveModel = user.clone().into();
        active.role = Set(UserRole::Technician);
        active.update(&txn).await?;
    }

    let profile = technician::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.id),
        employee_id: Set(payload.employee_id.trim().to_string()),
        specializations: Set(serde_json::json!(payload.specializations)),
        certification_level: Set(payload.certification_level),
        hourly_rate: Set(payload.hourly_rate),
        service_radius_km: Set(payload.service_radius_km),
        is_available: Set(false),
        is_on_duty: Set(false),
        current_latitude: Set(None),
        current_longitude: Set(None),
        last_location_update: Set(None),
        rating: Set(0.0),
        total_jobs: Set(0),
        completed_jobs: Set(0),
        phone: Set(payload.phone.clone()),
        vehicle_info: Set(payload.vehicle_info.clone()),
        emergency_certified: Set(payload.emergency_certified.unwrap_or(false)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let created = profile.insert(&txn).await?;
    txn.commit().await?;

    tracing::info!(technician_id = %created.id, user_id = %user.id, "Technician profile created");
    Ok(ApiResponse::created("Technician created", created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTechniciansQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub is_available: Option<bool>,
    pub is_on_duty: Option<bool>,
}

/// Paginated technician roster
pub async fn list_technicians(
    State(state): State<AppState>,
    Query(query): Query<ListTechniciansQuery>,
) -> AppResult<Response> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);
    if limit > 100 {
        return Err(AppError::Validation("limit must be at most 100".to_string()));
    }

    let mut find = technician::Entity::find();
    if let Some(available) = query.is_available {
        find = find.filter(technician::Column::IsAvailable.eq(available));
    }
    if let Some(on_duty) = query.is_on_duty {
        find = find.filter(technician::Column::IsOnDuty.eq(on_duty));
    }
    find = find.order_by(technician::Column::CreatedAt, Order::Desc);

    let paginator = find.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(ApiResponse::ok(
        "Technicians",
        Page::new(items, page, limit, total),
    ))
}

pub async fn get_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let profile = technician::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Technician not found".to_string()))?;
    Ok(ApiResponse::ok("Technician", profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTechnicianRequest {
    pub employee_id: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub certification_level: Option<CertificationLevel>,
    pub hourly_rate: Option<f64>,
    pub service_radius_km: Option<f64>,
    pub is_available: Option<bool>,
    pub is_on_duty: Option<bool>,
    pub phone: Option<String>,
    pub vehicle_info: Option<serde_json::Value>,
    pub emergency_certified: Option<bool>,
}

/// Update any technician profile field. Profiles are never hard-deleted;
/// retiring one means taking it off duty.
pub async fn update_technician(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTechnicianRequest>,
) -> AppResult<Response> {
    if payload.hourly_rate.is_some_and(|r| r < 0.0) {
        return Err(AppError::Validation(
            "hourlyRate must not be negative".to_string(),
        ));
    }
    if payload.service_radius_km.is_some_and(|r| r <= 0.0) {
        return Err(AppError::Validation(
            "serviceRadiusKm must be positive".to_string(),
        ));
    }

    let profile = technician::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Technician not found".to_string()))?;

    if let Some(badge) = &payload.employee_id {
        if badge.trim().is_empty() {
            return Err(AppError::Validation("employeeId must not be empty".to_string()));
        }
        let duplicate = technician::Entity::find()
            .filter(technician::Column::EmployeeId.eq(badge.trim()))
            .filter(technician::Column::Id.ne(profile.id))
            .one(&state.db)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict("Employee ID already in use".to_string()));
        }
    }

    let mut active: technician::ActiveModel = profile.into();
    if let Some(badge) = payload.employee_id {
        active.employee_id = Set(badge.trim().to_string());
    }
    if let Some(specializations) = payload.specializations {
        active.specializations = Set(serde_json::json!(specializations));
    }
    if let Some(level) = payload.certification_level {
        active.certification_level = Set(level);
    }
    if let Some(rate) = payload.hourly_rate {
        active.hourly_rate = Set(rate);
    }
    if let Some(radius) = payload.service_radius_km {
        active.service_radius_km = Set(radius);
    }
    if let Some(available) = payload.is_available {
        active.is_available = Set(available);
    }
    if let Some(on_duty) = payload.is_on_duty {
        active.is_on_duty = Set(on_duty);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(vehicle) = payload.vehicle_info {
        active.vehicle_info = Set(Some(vehicle));
    }
    if let Some(certified) = payload.emergency_certified {
        active.emergency_certified = Set(certified);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(ApiResponse::ok("Technician updated", updated))
}

// ============ Service catalog ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceTypeRequest {
    pub name: String,
    pub description: Option<String>,
    pub base_price: f64,
    pub required_specialization: Option<String>,
}

pub async fn create_service_type(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceTypeRequest>,
) -> AppResult<Response> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if payload.base_price < 0.0 {
        return Err(AppError::Validation(
            "basePrice must not be negative".to_string(),
        ));
    }

    let existing = service_type::Entity::find()
        .filter(service_type::Column::Name.eq(payload.name.trim()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "Service type with this name already exists".to_string(),
        ));
    }

    let new_type = service_type::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description.clone()),
        base_price: Set(payload.base_price),
        required_specialization: Set(payload.required_specialization.clone()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    };
    let created = new_type.insert(&state.db).await?;

    Ok(ApiResponse::created("Service type created", created))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceTypeRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<f64>,
    pub required_specialization: Option<String>,
    pub is_active: Option<bool>,
}

/// Update the catalog entry. Deactivation hides the type from customers but
/// keeps existing bookings intact.
pub async fn update_service_type(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateServiceTypeRequest>,
) -> AppResult<Response> {
    if payload.base_price.is_some_and(|p| p < 0.0) {
        return Err(AppError::Validation(
            "basePrice must not be negative".to_string(),
        ));
    }

    let existing = service_type::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service type not found".to_string()))?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        let duplicate = service_type::Entity::find()
            .filter(service_type::Column::Name.eq(name.trim()))
            .filter(service_type::Column::Id.ne(existing.id))
            .one(&state.db)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict(
                "Service type with this name already exists".to_string(),
            ));
        }
    }

    let mut active: service_type::ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.base_price {
        active.base_price = Set(price);
    }
    if let Some(tag) = payload.required_specialization {
        active.required_specialization = Set(Some(tag));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }

    let updated = active.update(&state.db).await?;
    Ok(ApiResponse::ok("Service type updated", updated))
}
