//! Process-level facilities

pub mod logging;

pub use logging::init_logging;
