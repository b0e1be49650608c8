pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{AppointmentError, BookAppointmentRequest, UpdateStatusRequest};
pub use router::appointment_routes;
pub use services::booking::AppointmentBookingService;
pub use services::conflict::SlotConflictChecker;
pub use services::lifecycle::AppointmentLifecycleService;
