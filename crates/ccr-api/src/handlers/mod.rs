//! Request handlers, one module per area of the portal

pub mod accounts;
pub mod client;
pub mod dashboard;
pub mod media;
pub mod panel;
pub mod staff;
pub mod worker;
