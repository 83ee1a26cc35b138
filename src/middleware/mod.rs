mod auth;
mod error_handler;
mod locale;
mod rate_limit;

pub use auth::{AdminGate, Session, current_user, require_admin, require_session, resolve_session};
pub use error_handler::log_errors;
pub use locale::with_locale_prefixes;
pub use rate_limit::{RateLimiter, client_ip, rate_limit};
