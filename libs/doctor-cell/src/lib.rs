pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AvailabilityEntry, DoctorError, DoctorListing, SetAvailabilityRequest};
pub use router::doctor_routes;
pub use services::{doctor_available_at, AvailabilityService};
