//! Contact/lead intake.

mod intake;
mod rate_limit;
mod request;

pub use intake::ContactIntake;
pub use rate_limit::RateLimiter;
pub use request::{ContactForm, ContactReceipt, ContactRequest, ContactStatus};
