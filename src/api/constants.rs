//! HTTP surface constants

/// Response header carrying the per-request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Path every identity cookie is scoped to
pub const IDENTITY_COOKIE_PATH: &str = "/";
