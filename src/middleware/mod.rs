mod database;
mod error_handler;
mod trust_proxy;

pub use database::require_database;
pub use error_handler::log_errors;
pub use trust_proxy::{ClientInfo, Protocol, TrustProxy, resolve_client, trust_proxy};
