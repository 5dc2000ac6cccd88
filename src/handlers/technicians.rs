use axum::{
    extract::{Query, State},
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignment;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::technician_assignment::{self, AssignmentResponse};
use crate::entities::{service_type, technician, technician_location_history};
use crate::error::{AppError, AppResult};
use crate::handlers::bookings::require_coordinates;
use crate::response::ApiResponse;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Look up the technician profile attached to a user account
pub(crate) async fn profile_for_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> AppResult<Option<technician::Model>> {
    Ok(technician::Entity::find()
        .filter(technician::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}

async fn require_profile(db: &DatabaseConnection, user_id: Uuid) -> AppResult<technician::Model> {
    profile_for_user(db, user_id).await?.ok_or_else(|| {
        AppError::NotFound("Technician profile not found".to_string())
    })
}

// ============ Profile ============

/// Get the caller's technician profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Response> {
    let profile = require_profile(&state.db, claims.sub).await?;
    Ok(ApiResponse::ok("Technician profile", profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub phone: Option<String>,
    pub specializations: Option<Vec<String>>,
    pub service_radius_km: Option<f64>,
    pub vehicle_info: Option<serde_json::Value>,
}

/// Update the technician-editable profile fields
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Response> {
    let profile = require_profile(&state.db, claims.sub).await?;

    if payload.service_radius_km.is_some_and(|r| r <= 0.0) {
        return Err(AppError::Validation(
            "serviceRadiusKm must be positive".to_string(),
        ));
    }

    let mut active: technician::ActiveModel = profile.into();
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(specializations) = payload.specializations {
        active.specializations = Set(serde_json::json!(specializations));
    }
    if let Some(radius) = payload.service_radius_km {
        active.service_radius_km = Set(radius);
    }
    if let Some(vehicle) = payload.vehicle_info {
        active.vehicle_info = Set(Some(vehicle));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(ApiResponse::ok("Profile updated", updated))
}

// ============ Location & Availability ============

#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub accuracy: Option<f64>,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

/// Update the technician's current position and append to the location log.
/// The log write is best-effort: its failure never rolls back the position.
pub async fn update_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateLocationRequest>,
) -> AppResult<Response> {
    let (lat, lng) = require_coordinates(payload.latitude, payload.longitude)?;

    let profile = require_profile(&state.db, claims.sub).await?;
    let technician_id = profile.id;
    let now = Utc::now();

    let mut active: technician::ActiveModel = profile.into();
    active.current_latitude = Set(Some(lat));
    active.current_longitude = Set(Some(lng));
    active.last_location_update = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let updated = active.update(&state.db).await?;

    let history = technician_location_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        technician_id: Set(technician_id),
        latitude: Set(lat),
        longitude: Set(lng),
        accuracy: Set(payload.accuracy),
        heading: Set(payload.heading),
        speed: Set(payload.speed),
        recorded_at: Set(now.into()),
    };
    if let Err(e) = history.insert(&state.db).await {
        tracing::warn!(
            technician_id = %technician_id,
            error = %e,
            "Failed to append location history"
        );
    }

    Ok(ApiResponse::ok("Location updated", updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
    pub is_on_duty: Option<bool>,
}

/// Toggle availability / duty flags
pub async fn update_availability(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> AppResult<Response> {
    let profile = require_profile(&state.db, claims.sub).await?;

    let mut active: technician::ActiveModel = profile.into();
    active.is_available = Set(payload.is_available);
    if let Some(on_duty) = payload.is_on_duty {
        active.is_on_duty = Set(on_duty);
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.db).await?;
    Ok(ApiResponse::ok("Availability updated", updated))
}

// ============ Work Queue ============

/// Bookings currently assigned to the caller and not yet finished
pub async fn current_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Response> {
    let profile = require_profile(&state.db, claims.sub).await?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::TechnicianId.eq(profile.id))
        .filter(booking::Column::Status.is_in([
            BookingStatus::TechnicianAssigned,
            BookingStatus::TechnicianEnRoute,
            BookingStatus::InProgress,
        ]))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok("Current bookings", bookings))
}

// ============ Performance ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_jobs: u64,
    pub completed_jobs: u64,
    pub average_rating: Option<f64>,
    pub average_response_minutes: Option<f64>,
    pub average_completion_minutes: Option<f64>,
    pub total_revenue: f64,
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn compute_performance(
    bookings: &[booking::Model],
    assignments: &[technician_assignment::Model],
) -> PerformanceStats {
    let mut ratings: Vec<f64> = Vec::new();
    let mut response_minutes: Vec<f64> = Vec::new();
    let mut completion_minutes: Vec<f64> = Vec::new();
    let mut total_revenue = 0.0;
    let mut completed = 0u64;

    for b in bookings {
        if let Some(rating) = b.customer_rating {
            ratings.push(rating as f64);
        }
        if let Some(price) = b.final_price {
            total_revenue += price;
        }
        if b.actual_completion.is_some() {
            completed += 1;
        }

        if let Some(start) = b.actual_start {
            // Response time runs from the assignment offer to the actual start
            let offer = assignments
                .iter()
                .filter(|a| a.booking_id == b.id)
                .min_by_key(|a| a.assigned_at);
            if let Some(offer) = offer {
                let minutes = (start.with_timezone(&Utc)
                    - offer.assigned_at.with_timezone(&Utc))
                .num_seconds() as f64
                    / 60.0;
                response_minutes.push(minutes);
            }

            if let Some(end) = b.actual_completion {
                let minutes = (end.with_timezone(&Utc) - start.with_timezone(&Utc))
                    .num_seconds() as f64
                    / 60.0;
                completion_minutes.push(minutes);
            }
        }
    }

    PerformanceStats {
        total_jobs: bookings.len() as u64,
        completed_jobs: completed,
        average_rating: average(&ratings),
        average_response_minutes: average(&response_minutes),
        average_completion_minutes: average(&completion_minutes),
        total_revenue,
    }
}

/// Performance statistics for the caller over a window (default trailing 30
/// days)
pub async fn performance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<PerformanceQuery>,
) -> AppResult<Response> {
    let profile = require_profile(&state.db, claims.sub).await?;

    let date_to = query.date_to.unwrap_or_else(Utc::now);
    let date_from = query.date_from.unwrap_or(date_to - Duration::days(30));

    let bookings = booking::Entity::find()
        .filter(booking::Column::TechnicianId.eq(profile.id))
        .filter(booking::Column::CreatedAt.gte(date_from))
        .filter(booking::Column::CreatedAt.lte(date_to))
        .all(&state.db)
        .await?;

    let assignments = technician_assignment::Entity::find()
        .filter(technician_assignment::Column::TechnicianId.eq(profile.id))
        .filter(technician_assignment::Column::Response.eq(AssignmentResponse::Accepted))
        .all(&state.db)
        .await?;

    Ok(ApiResponse::ok(
        "Performance statistics",
        compute_performance(&bookings, &assignments),
    ))
}

// ============ Nearby ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_distance_km: Option<f64>,
    pub service_type_id: Option<Uuid>,
}

/// Available technicians around a point, closest first
pub async fn nearby(
    State(state): State<AppState>,
    Query(query): Query<NearbyQuery>,
) -> AppResult<Response> {
    let (lat, lng) = require_coordinates(query.latitude, query.longitude)?;

    let max_distance = query
        .max_distance_km
        .unwrap_or(state.config.assign_search_radius_km);
    if max_distance <= 0.0 {
        return Err(AppError::Validation(
            "maxDistanceKm must be positive".to_string(),
        ));
    }

    let required = match query.service_type_id {
        Some(id) => service_type::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Service type not found".to_string()))?
            .required_specialization,
        None => None,
    };

    let ranked =
        assignment::nearby_available(&state.db, lat, lng, max_distance, required.as_deref())
            .await?;

    Ok(ApiResponse::ok("Nearby technicians", ranked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::booking::{BookingPriority, BookingStatus};
    use chrono::TimeZone;

    fn finished_booking(
        id: Uuid,
        rating: Option<i32>,
        final_price: f64,
        start_offset_min: i64,
        duration_min: i64,
    ) -> booking::Model {
        let created = Utc.with_ymd_and_hms(2025, 8, 10, 9, 0, 0).unwrap();
        let start = created + Duration::minutes(start_offset_min);
        booking::Model {
            id,
            customer_id: Uuid::new_v4(),
            service_type_id: Uuid::new_v4(),
            technician_id: Some(Uuid::new_v4()),
            customer_name: "Robin".to_string(),
            customer_phone: "555-0102".to_string(),
            customer_email: None,
            service_address: "3 Oak Ave".to_string(),
            service_latitude: None,
            service_longitude: None,
            preferred_date: None,
            description: None,
            special_requirements: None,
            quoted_price: final_price,
            final_price: Some(final_price),
            parts_cost: None,
            status: BookingStatus::Completed,
            priority: BookingPriority::Normal,
            scheduled_start: None,
            actual_start: Some(start.into()),
            estimated_completion: None,
            actual_completion: Some((start + Duration::minutes(duration_min)).into()),
            photos: None,
            internal_notes: None,
            customer_rating: rating,
            customer_feedback: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    fn offer(booking_id: Uuid, minutes_before_start: i64) -> technician_assignment::Model {
        let start = Utc.with_ymd_and_hms(2025, 8, 10, 9, 0, 0).unwrap();
        technician_assignment::Model {
            id: Uuid::new_v4(),
            booking_id,
            technician_id: Uuid::new_v4(),
            response: AssignmentResponse::Accepted,
            responded_at: Some(start.into()),
            estimated_arrival: None,
            decline_reason: None,
            assigned_at: (start + Duration::minutes(minutes_before_start)).into(),
        }
    }

    #[test]
    fn test_performance_aggregation() {
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();
        let bookings = vec![
            // offered at t+0, started at t+30, 60 min on site
            finished_booking(b1, Some(5), 100.0, 30, 60),
            // offered at t+0, started at t+10, 20 min on site
            finished_booking(b2, Some(4), 50.0, 10, 20),
        ];
        let assignments = vec![offer(b1, 0), offer(b2, 0)];

        let stats = compute_performance(&bookings, &assignments);
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.completed_jobs, 2);
        assert_eq!(stats.average_rating, Some(4.5));
        assert_eq!(stats.average_response_minutes, Some(20.0));
        assert_eq!(stats.average_completion_minutes, Some(40.0));
        assert!((stats.total_revenue - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_performance_empty() {
        let stats = compute_performance(&[], &[]);
        assert_eq!(stats.total_jobs, 0);
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.average_response_minutes, None);
        assert_eq!(stats.total_revenue, 0.0);
    }
}
