//! HTTP surface: identity middleware, handlers and routes

pub mod constants;
pub mod middleware;
pub mod services;

pub use services::{AppState, configure_routes};
