//! # ccr-api
//!
//! HTTP layer of the CCR project portal.
//!
//! Handlers resolve the session into a `CurrentUser`, call one service and
//! answer with a JSON page context, a `303 See Other` after a successful
//! form post, or a JSON error.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod page;
pub mod routes;
pub mod uploads;

pub use error::{ApiError, ApiResult};
pub use extractors::{AppState, AuthenticatedUser, SiteSettings, Visitor};
pub use routes::router;

#[cfg(test)]
mod tests;
