//! Authorization policy for booking access, kept as pure functions so the
//! role/ownership rules are testable without HTTP or a database.

use uuid::Uuid;

use crate::entities::{booking, user::UserRole};
use crate::utils::jwt::Claims;

/// Role-scoped read access: customers see their own bookings, technicians the
/// bookings assigned to their profile, admins everything.
pub fn can_access_booking(
    claims: &Claims,
    booking: &booking::Model,
    technician_id: Option<Uuid>,
) -> bool {
    match claims.role {
        UserRole::Admin => true,
        UserRole::Customer => booking.customer_id == claims.sub,
        UserRole::Technician => match (booking.technician_id, technician_id) {
            (Some(assigned), Some(own)) => assigned == own,
            _ => false,
        },
    }
}

/// Cancellation is reserved for the owning customer or an admin.
pub fn can_cancel_booking(claims: &Claims, booking: &booking::Model) -> bool {
    match claims.role {
        UserRole::Admin => true,
        UserRole::Customer => booking.customer_id == claims.sub,
        UserRole::Technician => false,
    }
}

/// Status and timing mutations are reserved for the assigned technician or an
/// admin.
pub fn can_update_status(
    claims: &Claims,
    booking: &booking::Model,
    technician_id: Option<Uuid>,
) -> bool {
    match claims.role {
        UserRole::Admin => true,
        UserRole::Technician => match (booking.technician_id, technician_id) {
            (Some(assigned), Some(own)) => assigned == own,
            _ => false,
        },
        UserRole::Customer => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::booking::{BookingPriority, BookingStatus};
    use chrono::Utc;

    fn claims(role: UserRole) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
            exp: 0,
            iat: 0,
        }
    }

    fn booking(customer_id: Uuid, technician_id: Option<Uuid>) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            customer_id,
            service_type_id: Uuid::new_v4(),
            technician_id,
            customer_name: "Jamie".to_string(),
            customer_phone: "555-0100".to_string(),
            customer_email: None,
            service_address: "1 Main St".to_string(),
            service_latitude: None,
            service_longitude: None,
            preferred_date: None,
            description: None,
            special_requirements: None,
            quoted_price: 120.0,
            final_price: None,
            parts_cost: None,
            status: BookingStatus::Pending,
            priority: BookingPriority::Normal,
            scheduled_start: None,
            actual_start: None,
            estimated_completion: None,
            actual_completion: None,
            photos: None,
            internal_notes: None,
            customer_rating: None,
            customer_feedback: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let c = claims(UserRole::Admin);
        let b = booking(Uuid::new_v4(), None);
        assert!(can_access_booking(&c, &b, None));
        assert!(can_cancel_booking(&c, &b));
        assert!(can_update_status(&c, &b, None));
    }

    #[test]
    fn test_customer_sees_only_own_bookings() {
        let c = claims(UserRole::Customer);
        let own = booking(c.sub, None);
        let other = booking(Uuid::new_v4(), None);

        assert!(can_access_booking(&c, &own, None));
        assert!(!can_access_booking(&c, &other, None));
    }

    #[test]
    fn test_technician_scoped_to_assigned_bookings() {
        let c = claims(UserRole::Technician);
        let profile_id = Uuid::new_v4();
        let assigned = booking(Uuid::new_v4(), Some(profile_id));
        let foreign = booking(Uuid::new_v4(), Some(Uuid::new_v4()));
        let unassigned = booking(Uuid::new_v4(), None);

        assert!(can_access_booking(&c, &assigned, Some(profile_id)));
        assert!(!can_access_booking(&c, &foreign, Some(profile_id)));
        assert!(!can_access_booking(&c, &unassigned, Some(profile_id)));
        // Caller without a technician profile sees nothing
        assert!(!can_access_booking(&c, &assigned, None));
    }

    #[test]
    fn test_technician_cannot_cancel() {
        let c = claims(UserRole::Technician);
        let b = booking(Uuid::new_v4(), None);
        assert!(!can_cancel_booking(&c, &b));
    }

    #[test]
    fn test_customer_cannot_update_status() {
        let c = claims(UserRole::Customer);
        let b = booking(c.sub, None);
        assert!(!can_update_status(&c, &b, None));
    }

    #[test]
    fn test_assigned_technician_can_update_status() {
        let c = claims(UserRole::Technician);
        let profile_id = Uuid::new_v4();
        let b = booking(Uuid::new_v4(), Some(profile_id));
        assert!(can_update_status(&c, &b, Some(profile_id)));
        assert!(!can_update_status(&c, &b, Some(Uuid::new_v4())));
    }
}
