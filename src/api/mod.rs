//! HTTP API for the ward service
//!
//! A thin JSON layer over [`WardService`](crate::core::WardService): handlers
//! map requests onto core procedures and errors onto status codes.

pub mod handlers;
pub mod middleware;
pub mod routes;

pub use routes::configure;
