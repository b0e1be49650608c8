pub mod appointment;
pub mod auth;
pub mod error;
pub mod session;
pub mod time;
pub mod user;

pub use appointment::*;
pub use error::AppError;
pub use session::*;
pub use time::{is_time_within, TimeOfDay};
pub use user::*;
