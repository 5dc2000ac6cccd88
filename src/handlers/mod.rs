pub mod admin;
pub mod auth;
pub mod bookings;
pub mod service_types;
pub mod technicians;
