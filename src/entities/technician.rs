use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "certification_level")]
#[serde(rename_all = "snake_case")]
pub enum CertificationLevel {
    #[sea_orm(string_value = "basic")]
    Basic,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "advanced")]
    Advanced,
    #[sea_orm(string_value = "expert")]
    Expert,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "technician")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub employee_id: String,
    /// JSON array of specialization tags, e.g. ["towing", "battery"]
    pub specializations: Json,
    pub certification_level: CertificationLevel,
    pub hourly_rate: f64,
    pub service_radius_km: f64,
    pub is_available: bool,
    pub is_on_duty: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTimeWithTimeZone>,
    pub rating: f64,
    pub total_jobs: i32,
    pub completed_jobs: i32,
    pub phone: Option<String>,
    pub vehicle_info: Option<Json>,
    pub emergency_certified: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// A technician can take new work only while available and on duty.
    pub fn is_assignable(&self) -> bool {
        self.is_available && self.is_on_duty
    }

    /// Whether this technician carries the given specialization tag.
    pub fn has_specialization(&self, tag: &str) -> bool {
        self.specializations
            .as_array()
            .map(|tags| tags.iter().any(|t| t.as_str() == Some(tag)))
            .unwrap_or(false)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(has_many = "super::technician_assignment::Entity")]
    Assignments,
    #[sea_orm(has_many = "super::technician_location_history::Entity")]
    LocationHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::technician_assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignments.def()
    }
}

impl Related<super::technician_location_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LocationHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn technician(is_available: bool, is_on_duty: bool) -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            employee_id: "EMP-001".to_string(),
            specializations: serde_json::json!(["towing", "battery"]),
            certification_level: CertificationLevel::Advanced,
            hourly_rate: 85.0,
            service_radius_km: 40.0,
            is_available,
            is_on_duty,
            current_latitude: None,
            current_longitude: None,
            last_location_update: None,
            rating: 4.5,
            total_jobs: 10,
            completed_jobs: 9,
            phone: None,
            vehicle_info: None,
            emergency_certified: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_assignable_requires_both_flags() {
        assert!(technician(true, true).is_assignable());
        assert!(!technician(true, false).is_assignable());
        assert!(!technician(false, true).is_assignable());
        assert!(!technician(false, false).is_assignable());
    }

    #[test]
    fn test_specialization_lookup() {
        let t = technician(true, true);
        assert!(t.has_specialization("towing"));
        assert!(!t.has_specialization("lockout"));
    }
}
