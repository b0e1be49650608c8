pub mod availability;

pub use availability::{doctor_available_at, AvailabilityService};
