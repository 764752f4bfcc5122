//! Route handlers for the API.

pub mod health;
pub mod metrics;
pub mod shops;
