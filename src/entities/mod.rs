pub mod booking;
pub mod booking_status_history;
pub mod service_type;
pub mod technician;
pub mod technician_assignment;
pub mod technician_location_history;
pub mod user;
