pub mod config;
pub mod domain;
pub mod errors;
pub mod sessions;

pub use domain::order::{DraftOrder, OrderId, OrderLine, Quantity, IN_PROGRESS_STATUS};
pub use domain::session::SessionId;
pub use errors::{DomainError, RequestError};
pub use sessions::{SessionGuard, SessionStore};
