//! Configuration
//!
//! `AppConfig` is loaded once in `main` and each section is passed by value
//! to the component that owns it.

pub mod args;
mod structs;

pub use args::Args;
pub use structs::*;
