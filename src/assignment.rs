//! Nearest-technician ranking and the emergency auto-assignment task.

use std::cmp::Ordering;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::technician_assignment::AssignmentResponse;
use crate::entities::{booking, booking_status_history, service_type, technician, technician_assignment};
use crate::error::{AppError, AppResult};
use crate::utils::geo::haversine_distance;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedTechnician {
    pub technician: technician::Model,
    pub distance_km: f64,
}

/// Rank candidate technicians by distance from the service location, closest
/// first. A candidate qualifies only while assignable, with a known position,
/// within both the search radius and their own service radius, and carrying
/// the required specialization when one is demanded.
pub fn rank_by_distance(
    lat: f64,
    lng: f64,
    max_distance_km: f64,
    required_specialization: Option<&str>,
    technicians: Vec<technician::Model>,
) -> Vec<RankedTechnician> {
    let mut ranked: Vec<RankedTechnician> = technicians
        .into_iter()
        .filter_map(|t| {
            if !t.is_assignable() {
                return None;
            }
            if let Some(tag) = required_specialization {
                if !t.has_specialization(tag) {
                    return None;
                }
            }
            let (t_lat, t_lng) = match (t.current_latitude, t.current_longitude) {
                (Some(a), Some(b)) => (a, b),
                _ => return None,
            };

            let distance = haversine_distance(lat, lng, t_lat, t_lng);
            if distance > max_distance_km || distance > t.service_radius_km {
                return None;
            }

            Some(RankedTechnician {
                technician: t,
                distance_km: distance,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.distance_km
            .partial_cmp(&b.distance_km)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Fetch available + on-duty technicians and rank them around a point.
pub async fn nearby_available(
    db: &DatabaseConnection,
    lat: f64,
    lng: f64,
    max_distance_km: f64,
    required_specialization: Option<&str>,
) -> AppResult<Vec<RankedTechnician>> {
    let candidates = technician::Entity::find()
        .filter(technician::Column::IsAvailable.eq(true))
        .filter(technician::Column::IsOnDuty.eq(true))
        .all(db)
        .await?;

    Ok(rank_by_distance(
        lat,
        lng,
        max_distance_km,
        required_specialization,
        candidates,
    ))
}

/// Link a technician to a booking: booking row, assignment record and status
/// history land in one transaction, so a failure leaves no half-assigned
/// booking behind.
pub async fn assign_technician(
    db: &DatabaseConnection,
    booking: booking::Model,
    technician: &technician::Model,
    estimated_arrival: Option<chrono::DateTime<chrono::FixedOffset>>,
    response: AssignmentResponse,
    changed_by: Option<Uuid>,
) -> AppResult<booking::Model> {
    if !technician.is_assignable() {
        return Err(AppError::BadRequest(
            "Technician is not available for assignment".to_string(),
        ));
    }

    let old_status = booking.status;
    // Re-assignment of an already-assigned booking is allowed; anything else
    // must be a legal transition.
    if old_status != BookingStatus::TechnicianAssigned
        && !old_status.can_transition_to(BookingStatus::TechnicianAssigned)
    {
        return Err(AppError::BadRequest(format!(
            "Cannot assign a technician to a {:?} booking",
            old_status
        )));
    }

    let now = Utc::now();
    let txn = db.begin().await?;

    let mut active: booking::ActiveModel = booking.into();
    active.technician_id = Set(Some(technician.id));
    active.status = Set(BookingStatus::TechnicianAssigned);
    active.updated_at = Set(now.into());
    let updated = active.update(&txn).await?;

    let responded_at = match response {
        AssignmentResponse::Pending => None,
        _ => Some(now.into()),
    };
    technician_assignment::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(updated.id),
        technician_id: Set(technician.id),
        response: Set(response),
        responded_at: Set(responded_at),
        estimated_arrival: Set(estimated_arrival),
        decline_reason: Set(None),
        assigned_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    record_status_change(&txn, updated.id, Some(old_status), BookingStatus::TechnicianAssigned, changed_by, None)
        .await?;

    // Assignment counts towards the technician's job total
    let mut tech_active: technician::ActiveModel = technician.clone().into();
    tech_active.total_jobs = Set(technician.total_jobs + 1);
    tech_active.updated_at = Set(now.into());
    tech_active.update(&txn).await?;

    txn.commit().await?;
    Ok(updated)
}

pub async fn record_status_change(
    txn: &DatabaseTransaction,
    booking_id: Uuid,
    old_status: Option<BookingStatus>,
    new_status: BookingStatus,
    changed_by: Option<Uuid>,
    notes: Option<String>,
) -> AppResult<()> {
    booking_status_history::ActiveModel {
        id: Set(Uuid::new_v4()),
        booking_id: Set(booking_id),
        old_status: Set(old_status),
        new_status: Set(new_status),
        changed_by: Set(changed_by),
        notes: Set(notes),
        created_at: Set(Utc::now().into()),
    }
    .insert(txn)
    .await?;
    Ok(())
}

#[derive(Debug)]
pub struct AssignmentOutcome {
    pub technician_id: Uuid,
    pub distance_km: f64,
}

/// Auto-assignment policy for emergency bookings. Holds its own store handle
/// so the booking-creation handler can respond without waiting for it.
#[derive(Clone)]
pub struct AutoAssigner {
    db: DatabaseConnection,
    search_radius_km: f64,
}

impl AutoAssigner {
    pub fn new(db: DatabaseConnection, search_radius_km: f64) -> Self {
        Self {
            db,
            search_radius_km,
        }
    }

    /// Assign the closest available technician to the booking. Returns `None`
    /// when the booking no longer qualifies or no technician is in range.
    pub async fn assign_nearest(&self, booking_id: Uuid) -> AppResult<Option<AssignmentOutcome>> {
        let booking = booking::Entity::find_by_id(booking_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        // Someone may have assigned or cancelled it in the meantime
        if booking.status != BookingStatus::Pending || booking.technician_id.is_some() {
            return Ok(None);
        }

        let (lat, lng) = match (booking.service_latitude, booking.service_longitude) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                tracing::warn!(booking_id = %booking_id, "Emergency booking has no coordinates, skipping auto-assignment");
                return Ok(None);
            }
        };

        let service = service_type::Entity::find_by_id(booking.service_type_id)
            .one(&self.db)
            .await?;
        let required = service
            .as_ref()
            .and_then(|s| s.required_specialization.as_deref());

        let ranked = nearby_available(&self.db, lat, lng, self.search_radius_km, required).await?;
        let Some(closest) = ranked.into_iter().next() else {
            return Ok(None);
        };

        // The technician still has to accept; the assignment row starts out
        // pending.
        assign_technician(
            &self.db,
            booking,
            &closest.technician,
            None,
            AssignmentResponse::Pending,
            None,
        )
        .await?;

        Ok(Some(AssignmentOutcome {
            technician_id: closest.technician.id,
            distance_km: closest.distance_km,
        }))
    }

    /// Background entry point used on booking creation. The handle makes the
    /// task awaitable; its outcome is also logged for the fire-and-forget
    /// callers.
    pub fn spawn(&self, booking_id: Uuid) -> JoinHandle<AppResult<Option<AssignmentOutcome>>> {
        let assigner = self.clone();
        tokio::spawn(async move {
            let result = assigner.assign_nearest(booking_id).await;
            match &result {
                Ok(Some(outcome)) => tracing::info!(
                    booking_id = %booking_id,
                    technician_id = %outcome.technician_id,
                    distance_km = outcome.distance_km,
                    "Auto-assigned emergency booking"
                ),
                Ok(None) => tracing::warn!(
                    booking_id = %booking_id,
                    "No technician in range for emergency booking"
                ),
                Err(e) => tracing::error!(
                    booking_id = %booking_id,
                    error = %e,
                    "Emergency auto-assignment failed"
                ),
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::technician::CertificationLevel;
    use chrono::Utc;

    fn technician_at(lat: f64, lng: f64, available: bool, on_duty: bool) -> technician::Model {
        technician::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            employee_id: format!("EMP-{}", Uuid::new_v4()),
            specializations: serde_json::json!(["towing"]),
            certification_level: CertificationLevel::Basic,
            hourly_rate: 75.0,
            service_radius_km: 100.0,
            is_available: available,
            is_on_duty: on_duty,
            current_latitude: Some(lat),
            current_longitude: Some(lng),
            last_location_update: Some(Utc::now().into()),
            rating: 4.0,
            total_jobs: 0,
            completed_jobs: 0,
            phone: None,
            vehicle_info: None,
            emergency_certified: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    // Service location in central Seattle for all ranking tests
    const ORIGIN: (f64, f64) = (47.6062, -122.3321);

    #[test]
    fn test_ranked_strictly_by_ascending_distance() {
        let far = technician_at(47.9, -122.2, true, true);
        let near = technician_at(47.61, -122.33, true, true);
        let mid = technician_at(47.70, -122.35, true, true);

        let ranked = rank_by_distance(
            ORIGIN.0,
            ORIGIN.1,
            50.0,
            None,
            vec![far.clone(), near.clone(), mid.clone()],
        );

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].technician.id, near.id);
        assert_eq!(ranked[1].technician.id, mid.id);
        assert_eq!(ranked[2].technician.id, far.id);
        assert!(ranked[0].distance_km <= ranked[1].distance_km);
        assert!(ranked[1].distance_km <= ranked[2].distance_km);
    }

    #[test]
    fn test_unassignable_technicians_excluded() {
        let off_duty = technician_at(47.61, -122.33, true, false);
        let unavailable = technician_at(47.61, -122.33, false, true);
        let ok = technician_at(47.62, -122.34, true, true);

        let ranked = rank_by_distance(ORIGIN.0, ORIGIN.1, 50.0, None, vec![off_duty, unavailable, ok.clone()]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].technician.id, ok.id);
    }

    #[test]
    fn test_max_distance_and_service_radius_cutoffs() {
        // ~12km away but only willing to travel 5km
        let mut short_radius = technician_at(47.70, -122.40, true, true);
        short_radius.service_radius_km = 5.0;

        // Within their own radius but outside the 10km search radius
        let outside_search = technician_at(47.80, -122.40, true, true);

        let ranked = rank_by_distance(
            ORIGIN.0,
            ORIGIN.1,
            10.0,
            None,
            vec![short_radius, outside_search],
        );
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_specialization_filter() {
        let mut lockout = technician_at(47.61, -122.33, true, true);
        lockout.specializations = serde_json::json!(["lockout"]);
        let towing = technician_at(47.62, -122.34, true, true);

        let ranked = rank_by_distance(
            ORIGIN.0,
            ORIGIN.1,
            50.0,
            Some("towing"),
            vec![lockout, towing.clone()],
        );
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].technician.id, towing.id);
    }

    #[test]
    fn test_technicians_without_position_excluded() {
        let mut unknown = technician_at(0.0, 0.0, true, true);
        unknown.current_latitude = None;
        unknown.current_longitude = None;

        let ranked = rank_by_distance(ORIGIN.0, ORIGIN.1, 50.0, None, vec![unknown]);
        assert!(ranked.is_empty());
    }
}
