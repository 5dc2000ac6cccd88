use std::collections::{BTreeMap, HashMap};

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assignment::{self, record_status_change};
use crate::entities::booking::{self, BookingPriority, BookingStatus};
use crate::entities::technician_assignment::{self, AssignmentResponse};
use crate::entities::user::UserRole;
use crate::entities::{service_type, technician};
use crate::error::{AppError, AppResult};
use crate::handlers::technicians::profile_for_user;
use crate::policy;
use crate::response::{ApiResponse, Page};
use crate::utils::geo::{is_valid_latitude, is_valid_longitude};
use crate::utils::jwt::Claims;
use crate::AppState;

// ============ Creation ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub service_type_id: Uuid,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub service_address: String,
    pub service_latitude: Option<f64>,
    pub service_longitude: Option<f64>,
    pub preferred_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub special_requirements: Option<String>,
    pub priority: Option<BookingPriority>,
}

/// Create a booking. Emergency-priority bookings kick off background
/// auto-assignment of the nearest technician.
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Response> {
    if claims.role != UserRole::Customer {
        return Err(AppError::Forbidden(
            "Only customers can create bookings".to_string(),
        ));
    }

    if payload.customer_name.trim().is_empty() {
        return Err(AppError::Validation("customerName is required".to_string()));
    }
    if payload.customer_phone.trim().is_empty() {
        return Err(AppError::Validation("customerPhone is required".to_string()));
    }
    if payload.service_address.trim().is_empty() {
        return Err(AppError::Validation("serviceAddress is required".to_string()));
    }
    validate_optional_coordinates(payload.service_latitude, payload.service_longitude)?;
    if let Some(date) = payload.preferred_date {
        if date < Utc::now() {
            return Err(AppError::Validation(
                "preferredDate must not be in the past".to_string(),
            ));
        }
    }

    // Quoted price is copied from the service catalog at creation time
    let service = service_type::Entity::find_by_id(payload.service_type_id)
        .one(&state.db)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::NotFound("Service type not found".to_string()))?;

    let priority = payload.priority.unwrap_or(BookingPriority::Normal);
    let now = Utc::now();
    let booking_id = Uuid::new_v4();

    let txn = state.db.begin().await?;

    let new_booking = booking::ActiveModel {
        id: Set(booking_id),
        customer_id: Set(claims.sub),
        service_type_id: Set(service.id),
        technician_id: Set(None),
        customer_name: Set(payload.customer_name.trim().to_string()),
        customer_phone: Set(payload.customer_phone.trim().to_string()),
        customer_email: Set(payload.customer_email.clone()),
        service_address: Set(payload.service_address.trim().to_string()),
        service_latitude: Set(payload.service_latitude),
        service_longitude: Set(payload.service_longitude),
        preferred_date: Set(payload.preferred_date.map(Into::into)),
        description: Set(payload.description.clone()),
        special_requirements: Set(payload.special_requirements.clone()),
        quoted_price: Set(service.base_price),
        status: Set(BookingStatus::Pending),
        priority: Set(priority),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    };

    let created = new_booking.insert(&txn).await?;
    record_status_change(&txn, created.id, None, BookingStatus::Pending, Some(claims.sub), None)
        .await?;
    txn.commit().await?;

    // Fire off nearest-technician matching; the caller gets the booking now,
    // the task's outcome is logged and awaitable through its handle.
    if priority == BookingPriority::Emergency {
        let _ = state.assigner.spawn(created.id);
    }

    Ok(ApiResponse::created("Booking created", created))
}

// ============ Listing & Retrieval ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<BookingStatus>,
    pub priority: Option<BookingPriority>,
    pub technician_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn sort_column(name: &str) -> Option<booking::Column> {
    match name {
        "createdAt" => Some(booking::Column::CreatedAt),
        "preferredDate" => Some(booking::Column::PreferredDate),
        "status" => Some(booking::Column::Status),
        "priority" => Some(booking::Column::Priority),
        "quotedPrice" => Some(booking::Column::QuotedPrice),
        _ => None,
    }
}

/// Role-scoped booking listing with filters, sorting and pagination
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ListBookingsQuery>,
) -> AppResult<Response> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).max(1);
    if limit > 100 {
        return Err(AppError::Validation("limit must be at most 100".to_string()));
    }

    let mut find = booking::Entity::find();

    // Role scoping: customers see their own, technicians their assigned work
    match claims.role {
        UserRole::Customer => {
            find = find.filter(booking::Column::CustomerId.eq(claims.sub));
        }
        UserRole::Technician => {
            let profile = profile_for_user(&state.db, claims.sub)
                .await?
                .ok_or_else(|| {
                    AppError::Forbidden("No technician profile for this account".to_string())
                })?;
            find = find.filter(booking::Column::TechnicianId.eq(profile.id));
        }
        UserRole::Admin => {
            if let Some(technician_id) = query.technician_id {
                find = find.filter(booking::Column::TechnicianId.eq(technician_id));
            }
        }
    }

    if let Some(status) = query.status {
        find = find.filter(booking::Column::Status.eq(status));
    }
    if let Some(priority) = query.priority {
        find = find.filter(booking::Column::Priority.eq(priority));
    }
    if let Some(from) = query.date_from {
        find = find.filter(booking::Column::CreatedAt.gte(from));
    }
    if let Some(to) = query.date_to {
        find = find.filter(booking::Column::CreatedAt.lte(to));
    }

    let order = match query.sort_order.as_deref() {
        None | Some("desc") => Order::Desc,
        Some("asc") => Order::Asc,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "Unknown sortOrder '{}', expected asc or desc",
                other
            )))
        }
    };
    let column = match query.sort_by.as_deref() {
        None => booking::Column::CreatedAt,
        Some(name) => sort_column(name).ok_or_else(|| {
            AppError::Validation(format!("Cannot sort bookings by '{}'", name))
        })?,
    };
    find = find.order_by(column, order);

    let paginator = find.paginate(&state.db, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(ApiResponse::ok(
        "Bookings",
        Page::new(items, page, limit, total),
    ))
}

/// Get a single booking, 404 when absent or outside the caller's scope
pub async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let booking = find_scoped(&state, &claims, id).await?;
    Ok(ApiResponse::ok("Booking", booking))
}

/// Scoped lookup shared by the single-booking operations. Unauthorized access
/// is indistinguishable from a missing booking.
async fn find_scoped(
    state: &AppState,
    claims: &Claims,
    id: Uuid,
) -> AppResult<booking::Model> {
    let booking = booking::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let technician_id = match claims.role {
        UserRole::Technician => profile_for_user(&state.db, claims.sub).await?.map(|t| t.id),
        _ => None,
    };

    if !policy::can_access_booking(claims, &booking, technician_id) {
        return Err(AppError::NotFound("Booking not found".to_string()));
    }

    Ok(booking)
}

// ============ Status Lifecycle ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_completion: Option<DateTime<Utc>>,
    pub internal_notes: Option<String>,
}

/// Move a booking through its lifecycle; transitions outside the state machine
/// are rejected
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Response> {
    let booking = find_scoped(&state, &claims, id).await?;

    let technician_id = match claims.role {
        UserRole::Technician => profile_for_user(&state.db, claims.sub).await?.map(|t| t.id),
        _ => None,
    };
    if !policy::can_update_status(&claims, &booking, technician_id) {
        return Err(AppError::Forbidden(
            "Only the assigned technician or an admin can update booking status".to_string(),
        ));
    }

    let old_status = booking.status;
    let new_status = payload.status;
    if !old_status.can_transition_to(new_status) {
        return Err(AppError::BadRequest(format!(
            "Cannot move booking from {} to {}",
            old_status.as_str(),
            new_status.as_str()
        )));
    }
    if new_status.requires_technician() && booking.technician_id.is_none() {
        return Err(AppError::BadRequest(
            "Booking has no technician assigned".to_string(),
        ));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(new_status);
    active.updated_at = Set(now.into());
    if let Some(start) = payload.actual_start {
        active.actual_start = Set(Some(start.into()));
    }
    if let Some(completion) = payload.actual_completion {
        active.actual_completion = Set(Some(completion.into()));
    }
    if let Some(ref notes) = payload.internal_notes {
        active.internal_notes = Set(Some(notes.clone()));
    }
    if new_status == BookingStatus::Cancelled {
        active.technician_id = Set(None);
    }
    let updated = active.update(&txn).await?;

    record_status_change(
        &txn,
        updated.id,
        Some(old_status),
        new_status,
        Some(claims.sub),
        payload.internal_notes.clone(),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::ok("Booking status updated", updated))
}

// ============ Assignment ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTechnicianRequest {
    pub technician_id: Uuid,
    pub estimated_arrival: Option<DateTime<Utc>>,
}

/// Manually assign a technician (admin)
pub async fn assign_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignTechnicianRequest>,
) -> AppResult<Response> {
    if claims.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    if let Some(arrival) = payload.estimated_arrival {
        if arrival < Utc::now() {
            return Err(AppError::Validation(
                "estimatedArrival must be in the future".to_string(),
            ));
        }
    }

    let booking = booking::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let technician = technician::Entity::find_by_id(payload.technician_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Technician not found".to_string()))?;

    let updated = assignment::assign_technician(
        &state.db,
        booking,
        &technician,
        payload.estimated_arrival.map(Into::into),
        AssignmentResponse::Accepted,
        Some(claims.sub),
    )
    .await?;

    Ok(ApiResponse::ok("Technician assigned", updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub response: AssignmentResponse,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
}

pub(crate) fn validate_decline_reason(reason: Option<&str>) -> AppResult<String> {
    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::Validation("declineReason is required".to_string()))?;
    if reason.len() < 3 || reason.len() > 200 {
        return Err(AppError::Validation(
            "declineReason must be between 3 and 200 characters".to_string(),
        ));
    }
    Ok(reason.to_string())
}

/// Technician accepts or declines a pending assignment. Declining returns the
/// booking to the pending pool.
pub async fn respond_to_assignment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RespondRequest>,
) -> AppResult<Response> {
    let profile = profile_for_user(&state.db, claims.sub)
        .await?
        .ok_or_else(|| {
            AppError::Forbidden("No technician profile for this account".to_string())
        })?;

    let booking = booking::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.technician_id != Some(profile.id) {
        return Err(AppError::Forbidden(
            "This booking is not assigned to you".to_string(),
        ));
    }
    if booking.status != BookingStatus::TechnicianAssigned {
        return Err(AppError::BadRequest(
            "Booking is not awaiting a response".to_string(),
        ));
    }

    let offer = technician_assignment::Entity::find()
        .filter(technician_assignment::Column::BookingId.eq(booking.id))
        .filter(technician_assignment::Column::TechnicianId.eq(profile.id))
        .order_by(technician_assignment::Column::AssignedAt, Order::Desc)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Assignment not found".to_string()))?;

    if offer.response != AssignmentResponse::Pending {
        return Err(AppError::Conflict(
            "Assignment has already been responded to".to_string(),
        ));
    }

    let now = Utc::now();
    match payload.response {
        AssignmentResponse::Accepted => {
            let arrival = payload.estimated_arrival.ok_or_else(|| {
                AppError::Validation("estimatedArrival is required when accepting".to_string())
            })?;
            if arrival < now {
                return Err(AppError::Validation(
                    "estimatedArrival must be in the future".to_string(),
                ));
            }

            let mut active: technician_assignment::ActiveModel = offer.into();
            active.response = Set(AssignmentResponse::Accepted);
            active.responded_at = Set(Some(now.into()));
            active.estimated_arrival = Set(Some(arrival.into()));
            active.update(&state.db).await?;

            Ok(ApiResponse::ok("Assignment accepted", booking))
        }
        AssignmentResponse::Declined => {
            let reason = validate_decline_reason(payload.decline_reason.as_deref())?;

            let txn = state.db.begin().await?;

            let mut active: technician_assignment::ActiveModel = offer.into();
            active.response = Set(AssignmentResponse::Declined);
            active.responded_at = Set(Some(now.into()));
            active.decline_reason = Set(Some(reason.clone()));
            active.update(&txn).await?;

            // Booking goes back into the pending pool without a technician
            let mut booking_active: booking::ActiveModel = booking.into();
            booking_active.technician_id = Set(None);
            booking_active.status = Set(BookingStatus::Pending);
            booking_active.updated_at = Set(now.into());
            let updated = booking_active.update(&txn).await?;

            record_status_change(
                &txn,
                updated.id,
                Some(BookingStatus::TechnicianAssigned),
                BookingStatus::Pending,
                Some(claims.sub),
                Some(format!("Technician declined: {}", reason)),
            )
            .await?;
            txn.commit().await?;

            Ok(ApiResponse::ok("Assignment declined", updated))
        }
        AssignmentResponse::Pending => Err(AppError::Validation(
            "response must be accepted or declined".to_string(),
        )),
    }
}

// ============ Job Timing ============

/// Mark the job as started by the assigned technician
pub async fn start_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Response> {
    let booking = find_scoped(&state, &claims, id).await?;

    let technician_id = match claims.role {
        UserRole::Technician => profile_for_user(&state.db, claims.sub).await?.map(|t| t.id),
        _ => None,
    };
    if !policy::can_update_status(&claims, &booking, technician_id) {
        return Err(AppError::Forbidden(
            "Only the assigned technician or an admin can start the job".to_string(),
        ));
    }

    let old_status = booking.status;
    if !old_status.can_transition_to(BookingStatus::InProgress) {
        return Err(AppError::BadRequest(format!(
            "Cannot start a {} booking",
            old_status.as_str()
        )));
    }

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::InProgress);
    active.actual_start = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    record_status_change(
        &txn,
        updated.id,
        Some(old_status),
        BookingStatus::InProgress,
        Some(claims.sub),
        None,
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::ok("Job started", updated))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteJobRequest {
    pub final_price: f64,
    pub parts_cost: Option<f64>,
    pub internal_notes: Option<String>,
    pub photos: Option<Vec<String>>,
}

/// Complete the job, recording final pricing and the technician's job counter
pub async fn complete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteJobRequest>,
) -> AppResult<Response> {
    if payload.final_price < 0.0 {
        return Err(AppError::Validation(
            "finalPrice must not be negative".to_string(),
        ));
    }
    if payload.parts_cost.is_some_and(|c| c < 0.0) {
        return Err(AppError::Validation(
            "partsCost must not be negative".to_string(),
        ));
    }

    let booking = find_scoped(&state, &claims, id).await?;

    let technician_id = match claims.role {
        UserRole::Technician => profile_for_user(&state.db, claims.sub).await?.map(|t| t.id),
        _ => None,
    };
    if !policy::can_update_status(&claims, &booking, technician_id) {
        return Err(AppError::Forbidden(
            "Only the assigned technician or an admin can complete the job".to_string(),
        ));
    }

    let old_status = booking.status;
    if !old_status.can_transition_to(BookingStatus::Completed) {
        return Err(AppError::BadRequest(format!(
            "Cannot complete a {} booking",
            old_status.as_str()
        )));
    }

    let technician = match booking.technician_id {
        Some(tid) => technician::Entity::find_by_id(tid).one(&state.db).await?,
        None => None,
    };

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Completed);
    active.final_price = Set(Some(payload.final_price));
    active.parts_cost = Set(payload.parts_cost);
    active.actual_completion = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    if let Some(ref notes) = payload.internal_notes {
        active.internal_notes = Set(Some(notes.clone()));
    }
    if let Some(ref photos) = payload.photos {
        active.photos = Set(Some(serde_json::json!(photos)));
    }
    let updated = active.update(&txn).await?;

    if let Some(tech) = technician {
        let completed = tech.completed_jobs + 1;
        let mut tech_active: technician::ActiveModel = tech.into();
        tech_active.completed_jobs = Set(completed);
        tech_active.updated_at = Set(now.into());
        tech_active.update(&txn).await?;
    }

    record_status_change(
        &txn,
        updated.id,
        Some(old_status),
        BookingStatus::Completed,
        Some(claims.sub),
        payload.internal_notes.clone(),
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::ok("Job completed", updated))
}

#[derive(Debug, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

/// Cancel a booking (owning customer or admin); refused once work has started
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Response> {
    let booking = find_scoped(&state, &claims, id).await?;

    if !policy::can_cancel_booking(&claims, &booking) {
        return Err(AppError::Forbidden(
            "Only the booking's customer or an admin can cancel it".to_string(),
        ));
    }

    let old_status = booking.status;
    if !old_status.is_cancellable() {
        return Err(AppError::BadRequest(format!(
            "Cannot cancel a {} booking",
            old_status.as_str()
        )));
    }

    let now = Utc::now();
    let note = payload
        .reason
        .as_deref()
        .map(|r| format!("Cancelled: {}", r.trim()));

    let txn = state.db.begin().await?;

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::Cancelled);
    active.technician_id = Set(None);
    active.updated_at = Set(now.into());
    if let Some(ref n) = note {
        active.internal_notes = Set(Some(n.clone()));
    }
    let updated = active.update(&txn).await?;

    record_status_change(
        &txn,
        updated.id,
        Some(old_status),
        BookingStatus::Cancelled,
        Some(claims.sub),
        note,
    )
    .await?;
    txn.commit().await?;

    Ok(ApiResponse::ok("Booking cancelled", updated))
}

// ============ Analytics ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingAnalytics {
    pub total_bookings: u64,
    pub total_revenue: f64,
    pub status_breakdown: BTreeMap<String, u64>,
    pub priority_breakdown: BTreeMap<String, u64>,
    pub service_breakdown: BTreeMap<String, u64>,
    pub average_completion_minutes: Option<f64>,
}

fn compute_analytics(
    bookings: &[booking::Model],
    service_names: &HashMap<Uuid, String>,
) -> BookingAnalytics {
    let mut status_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut priority_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut service_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_revenue = 0.0;
    let mut completion_minutes: Vec<f64> = Vec::new();

    for b in bookings {
        *status_breakdown
            .entry(b.status.as_str().to_string())
            .or_insert(0) += 1;
        *priority_breakdown
            .entry(b.priority.as_str().to_string())
            .or_insert(0) += 1;

        let service = service_names
            .get(&b.service_type_id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        *service_breakdown.entry(service).or_insert(0) += 1;

        if let Some(price) = b.final_price {
            total_revenue += price;
        }
        if let Some(completed_at) = b.actual_completion {
            let minutes = (completed_at.with_timezone(&Utc) - b.created_at.with_timezone(&Utc))
                .num_seconds() as f64
                / 60.0;
            completion_minutes.push(minutes);
        }
    }

    let average_completion_minutes = if completion_minutes.is_empty() {
        None
    } else {
        Some(completion_minutes.iter().sum::<f64>() / completion_minutes.len() as f64)
    };

    BookingAnalytics {
        total_bookings: bookings.len() as u64,
        total_revenue,
        status_breakdown,
        priority_breakdown,
        service_breakdown,
        average_completion_minutes,
    }
}

/// Aggregate booking counts, revenue and breakdowns over a window (admin);
/// defaults to the trailing 30 days
pub async fn analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AnalyticsQuery>,
) -> AppResult<Response> {
    if claims.role != UserRole::Admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let date_to = query.date_to.unwrap_or_else(Utc::now);
    let date_from = query.date_from.unwrap_or(date_to - Duration::days(30));

    let bookings = booking::Entity::find()
        .filter(booking::Column::CreatedAt.gte(date_from))
        .filter(booking::Column::CreatedAt.lte(date_to))
        .all(&state.db)
        .await?;

    let service_names: HashMap<Uuid, String> = service_type::Entity::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    Ok(ApiResponse::ok(
        "Booking analytics",
        compute_analytics(&bookings, &service_names),
    ))
}

// ============ Nearby Technicians ============

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTechniciansQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_type_id: Option<Uuid>,
}

/// List available technicians near a service location, closest first
pub async fn available_technicians(
    State(state): State<AppState>,
    Query(query): Query<AvailableTechniciansQuery>,
) -> AppResult<Response> {
    let (lat, lng) = require_coordinates(query.latitude, query.longitude)?;

    let required = match query.service_type_id {
        Some(id) => service_type::Entity::find_by_id(id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Service type not found".to_string()))?
            .required_specialization,
        None => None,
    };

    let ranked = assignment::nearby_available(
        &state.db,
        lat,
        lng,
        state.config.assign_search_radius_km,
        required.as_deref(),
    )
    .await?;

    Ok(ApiResponse::ok("Available technicians", ranked))
}

pub(crate) fn require_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AppResult<(f64, f64)> {
    let lat = latitude
        .ok_or_else(|| AppError::Validation("latitude is required".to_string()))?;
    let lng = longitude
        .ok_or_else(|| AppError::Validation("longitude is required".to_string()))?;
    validate_optional_coordinates(Some(lat), Some(lng))?;
    Ok((lat, lng))
}

pub(crate) fn validate_optional_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> AppResult<()> {
    if let Some(lat) = latitude {
        if !is_valid_latitude(lat) {
            return Err(AppError::Validation(
                "latitude must be between -90 and 90".to_string(),
            ));
        }
    }
    if let Some(lng) = longitude {
        if !is_valid_longitude(lng) {
            return Err(AppError::Validation(
                "longitude must be between -180 and 180".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn completed_booking(
        service_type_id: Uuid,
        final_price: f64,
        minutes_to_complete: i64,
    ) -> booking::Model {
        let created = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        booking::Model {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            service_type_id,
            technician_id: Some(Uuid::new_v4()),
            customer_name: "Casey".to_string(),
            customer_phone: "555-0101".to_string(),
            customer_email: None,
            service_address: "2 Pine St".to_string(),
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
            actual_start: Some(created.into()),
            estimated_completion: None,
            actual_completion: Some((created + Duration::minutes(minutes_to_complete)).into()),
            photos: None,
            internal_notes: None,
            customer_rating: None,
            customer_feedback: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    #[test]
    fn test_analytics_revenue_and_breakdown() {
        let towing = Uuid::new_v4();
        let names = HashMap::from([(towing, "Towing".to_string())]);
        let bookings = vec![
            completed_booking(towing, 100.0, 30),
            completed_booking(towing, 150.0, 60),
            completed_booking(towing, 200.0, 90),
        ];

        let analytics = compute_analytics(&bookings, &names);
        assert_eq!(analytics.total_bookings, 3);
        assert!((analytics.total_revenue - 450.0).abs() < 1e-9);
        assert_eq!(analytics.status_breakdown.get("completed"), Some(&3));
        assert_eq!(analytics.priority_breakdown.get("normal"), Some(&3));
        assert_eq!(analytics.service_breakdown.get("Towing"), Some(&3));
        assert_eq!(analytics.average_completion_minutes, Some(60.0));
    }

    #[test]
    fn test_analytics_empty_window() {
        let analytics = compute_analytics(&[], &HashMap::new());
        assert_eq!(analytics.total_bookings, 0);
        assert_eq!(analytics.total_revenue, 0.0);
        assert_eq!(analytics.average_completion_minutes, None);
    }

    #[test]
    fn test_decline_reason_validation() {
        assert!(validate_decline_reason(None).is_err());
        assert!(validate_decline_reason(Some("  ")).is_err());
        assert!(validate_decline_reason(Some("no")).is_err());
        assert!(validate_decline_reason(Some(&"x".repeat(201))).is_err());
        assert_eq!(
            validate_decline_reason(Some("Vehicle is out of my range")).unwrap(),
            "Vehicle is out of my range"
        );
    }

    #[test]
    fn test_sort_column_mapping() {
        assert!(sort_column("createdAt").is_some());
        assert!(sort_column("quotedPrice").is_some());
        assert!(sort_column("customerName").is_none());
    }
}
