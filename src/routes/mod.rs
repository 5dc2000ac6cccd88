use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{admin, auth, bookings, service_types, technicians};
use crate::middleware::auth::{auth_middleware, require_admin, require_technician};
use crate::middleware::rate_limit::create_public_governor;
use crate::middleware::role_rate_limit::{create_role_governor, RateLimitedRole};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Role-specific per-user governor layers
    let technician_governor = create_role_governor(RateLimitedRole::Technician);
    let customer_governor = create_role_governor(RateLimitedRole::Customer);
    // IP-based governor for unauthenticated routes
    let public_governor = create_public_governor();

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    // Public catalog (needed before an account can book anything useful)
    let public_routes = Router::new()
        .route("/service-types", get(service_types::list_service_types))
        .layer(public_governor);

    // Booking routes (requires auth; customers, technicians and admins all
    // enter here, with role scoping inside the handlers)
    // Rate limit: 100 requests per minute per user
    let booking_routes = Router::new()
        .route("/", post(bookings::create_booking))
        .route("/", get(bookings::list_bookings))
        .route("/analytics", get(bookings::analytics))
        .route(
            "/available-technicians",
            get(bookings::available_technicians),
        )
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/status", put(bookings::update_status))
        .route("/{id}/assign", put(bookings::assign_booking))
        .route("/{id}/respond", put(bookings::respond_to_assignment))
        .route("/{id}/start", put(bookings::start_job))
        .route("/{id}/complete", put(bookings::complete_job))
        .route("/{id}/cancel", put(bookings::cancel_booking))
        .layer(customer_governor)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Technician routes (requires auth + technician role)
    // Rate limit: 500 requests per minute (location pings are frequent)
    let technician_routes = Router::new()
        .route("/profile", get(technicians::get_profile))
        .route("/profile", put(technicians::update_profile))
        .route("/location", put(technicians::update_location))
        .route("/availability", put(technicians::update_availability))
        .route("/current-bookings", get(technicians::current_bookings))
        .route("/performance", get(technicians::performance))
        .route("/nearby", get(technicians::nearby))
        .layer(technician_governor)
        .layer(middleware::from_fn(require_technician))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes (requires auth + admin role, no per-user limiter)
    let admin_routes = Router::new()
        .route("/technicians", post(admin::create_technician))
        .route("/technicians", get(admin::list_technicians))
        .route("/technicians/{id}", get(admin::get_technician))
        .route("/technicians/{id}", put(admin::update_technician))
        .route("/service-types", post(admin::create_service_type))
        .route("/service-types/{id}", put(admin::update_service_type))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes)
        .nest("/api/bookings", booking_routes)
        .nest("/api/technicians", technician_routes)
        .nest("/api/admin", admin_routes)
        .with_state(state)
}
