use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "technician_assigned")]
    TechnicianAssigned,
    #[sea_orm(string_value = "technician_en_route")]
    TechnicianEnRoute,
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "payment_pending")]
    PaymentPending,
    #[sea_orm(string_value = "paid")]
    Paid,
}

impl BookingStatus {
    /// Legal forward transitions of the booking lifecycle.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, Confirmed | TechnicianAssigned) => true,
            (Confirmed, TechnicianAssigned) => true,
            (TechnicianAssigned, TechnicianEnRoute | InProgress) => true,
            (TechnicianEnRoute, InProgress) => true,
            (InProgress, Completed) => true,
            (Completed, PaymentPending) => true,
            (PaymentPending, Paid) => true,
            (from, Cancelled) => from.is_cancellable(),
            _ => false,
        }
    }

    /// A booking that has started (or finished) can no longer be cancelled.
    pub fn is_cancellable(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending
                | BookingStatus::Confirmed
                | BookingStatus::TechnicianAssigned
                | BookingStatus::TechnicianEnRoute
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Paid)
    }

    /// Wire name, matching the database enum values.
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::TechnicianAssigned => "technician_assigned",
            BookingStatus::TechnicianEnRoute => "technician_en_route",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::PaymentPending => "payment_pending",
            BookingStatus::Paid => "paid",
        }
    }

    /// States in which the booking must have a technician linked.
    pub fn requires_technician(self) -> bool {
        matches!(
            self,
            BookingStatus::TechnicianAssigned
                | BookingStatus::TechnicianEnRoute
                | BookingStatus::InProgress
                | BookingStatus::Completed
                | BookingStatus::PaymentPending
                | BookingStatus::Paid
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_priority")]
#[serde(rename_all = "snake_case")]
pub enum BookingPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "emergency")]
    Emergency,
}

impl BookingPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingPriority::Low => "low",
            BookingPriority::Normal => "normal",
            BookingPriority::High => "high",
            BookingPriority::Emergency => "emergency",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub service_type_id: Uuid,
    pub technician_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub service_address: String,
    pub service_latitude: Option<f64>,
    pub service_longitude: Option<f64>,
    pub preferred_date: Option<DateTimeWithTimeZone>,
    pub description: Option<String>,
    pub special_requirements: Option<String>,
    pub quoted_price: f64,
    pub final_price: Option<f64>,
    pub parts_cost: Option<f64>,
    pub status: BookingStatus,
    pub priority: BookingPriority,
    pub scheduled_start: Option<DateTimeWithTimeZone>,
    pub actual_start: Option<DateTimeWithTimeZone>,
    pub estimated_completion: Option<DateTimeWithTimeZone>,
    pub actual_completion: Option<DateTimeWithTimeZone>,
    pub photos: Option<Json>,
    pub internal_notes: Option<String>,
    pub customer_rating: Option<i32>,
    pub customer_feedback: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CustomerId",
        to = "super::user::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::service_type::Entity",
        from = "Column::ServiceTypeId",
        to = "super::service_type::Column::Id"
    )]
    ServiceType,
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
    #[sea_orm(has_many = "super::technician_assignment::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::booking_status_history::Entity")]
    StatusHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::service_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceType.def()
    }
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::technician_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::booking_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(TechnicianAssigned));
        assert!(TechnicianAssigned.can_transition_to(TechnicianEnRoute));
        assert!(TechnicianEnRoute.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Completed.can_transition_to(PaymentPending));
        assert!(PaymentPending.can_transition_to(Paid));
    }

    #[test]
    fn test_assignment_skips_confirmation() {
        // Emergency auto-assignment goes straight from pending
        assert!(Pending.can_transition_to(TechnicianAssigned));
        // Job can start without an explicit en-route step
        assert!(TechnicianAssigned.can_transition_to(InProgress));
    }

    #[test]
    fn test_started_bookings_never_regress_to_cancelled() {
        assert!(!InProgress.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!PaymentPending.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(Cancelled));
    }

    #[test]
    fn test_cancellable_before_work_starts() {
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(TechnicianAssigned.can_transition_to(Cancelled));
        assert!(TechnicianEnRoute.can_transition_to(Cancelled));
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!TechnicianAssigned.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(PaymentPending));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(Cancelled.is_terminal());
        assert!(Paid.is_terminal());
        assert!(!Completed.is_terminal());
    }

    #[test]
    fn test_technician_linkage_states() {
        assert!(!Pending.requires_technician());
        assert!(!Confirmed.requires_technician());
        assert!(TechnicianAssigned.requires_technician());
        assert!(InProgress.requires_technician());
        assert!(Completed.requires_technician());
    }
}
