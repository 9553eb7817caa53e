//! urlshortener - an anonymous URL shortener service
//!
//! Callers are identified by a signed random ID carried in a cookie; every
//! alias is scoped to the caller that created it.
//!
//! # Architecture
//! - `identity`: issuing and verifying signed caller identities
//! - `shortener`: random short code generation
//! - `storage`: storage port with in-memory and relational backends
//! - `pipeline`: transactional batch soft-delete
//! - `api`: HTTP middleware, handlers and routes
//! - `config`: configuration loading and validation
//! - `runtime`: application lifecycle and server mode
//! - `system`: logging setup

pub mod api;
pub mod config;
pub mod errors;
pub mod identity;
pub mod pipeline;
pub mod runtime;
pub mod shortener;
pub mod storage;
pub mod system;
