use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    MalformedCredential(String),
    CredentialDecode(String),
    SignatureInvalid(String),
    RandomSource(String),
    NotFound(String),
    Deleted(String),
    BackendMismatch(String),
    Transaction(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Validation(String),
    Config(String),
    Serialization(String),
    Conflict(String),
}

impl ShortenerError {
    /// Stable error code, used in logs
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::MalformedCredential(_) => "E001",
            ShortenerError::CredentialDecode(_) => "E002",
            ShortenerError::SignatureInvalid(_) => "E003",
            ShortenerError::RandomSource(_) => "E004",
            ShortenerError::NotFound(_) => "E005",
            ShortenerError::Deleted(_) => "E006",
            ShortenerError::BackendMismatch(_) => "E007",
            ShortenerError::Transaction(_) => "E008",
            ShortenerError::DatabaseConfig(_) => "E009",
            ShortenerError::DatabaseConnection(_) => "E010",
            ShortenerError::DatabaseOperation(_) => "E011",
            ShortenerError::Validation(_) => "E012",
            ShortenerError::Config(_) => "E013",
            ShortenerError::Serialization(_) => "E014",
            ShortenerError::Conflict(_) => "E015",
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::MalformedCredential(_) => "Malformed Credential",
            ShortenerError::CredentialDecode(_) => "Credential Decode Error",
            ShortenerError::SignatureInvalid(_) => "Invalid Signature",
            ShortenerError::RandomSource(_) => "Random Source Failure",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::Deleted(_) => "Resource Deleted",
            ShortenerError::BackendMismatch(_) => "Storage Backend Mismatch",
            ShortenerError::Transaction(_) => "Transaction Failure",
            ShortenerError::DatabaseConfig(_) => "Database Configuration Error",
            ShortenerError::DatabaseConnection(_) => "Database Connection Error",
            ShortenerError::DatabaseOperation(_) => "Database Operation Error",
            ShortenerError::Validation(_) => "Validation Error",
            ShortenerError::Config(_) => "Configuration Error",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::Conflict(_) => "Conflict",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ShortenerError::MalformedCredential(msg)
            | ShortenerError::CredentialDecode(msg)
            | ShortenerError::SignatureInvalid(msg)
            | ShortenerError::RandomSource(msg)
            | ShortenerError::NotFound(msg)
            | ShortenerError::Deleted(msg)
            | ShortenerError::BackendMismatch(msg)
            | ShortenerError::Transaction(msg)
            | ShortenerError::DatabaseConfig(msg)
            | ShortenerError::DatabaseConnection(msg)
            | ShortenerError::DatabaseOperation(msg)
            | ShortenerError::Validation(msg)
            | ShortenerError::Config(msg)
            | ShortenerError::Serialization(msg)
            | ShortenerError::Conflict(msg) => msg,
        }
    }

    /// Colored output for startup failures printed to the terminal
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

impl ShortenerError {
    pub fn malformed_credential<T: Into<String>>(msg: T) -> Self {
        ShortenerError::MalformedCredential(msg.into())
    }

    pub fn credential_decode<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CredentialDecode(msg.into())
    }

    pub fn signature_invalid<T: Into<String>>(msg: T) -> Self {
        ShortenerError::SignatureInvalid(msg.into())
    }

    pub fn random_source<T: Into<String>>(msg: T) -> Self {
        ShortenerError::RandomSource(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn deleted<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Deleted(msg.into())
    }

    pub fn backend_mismatch<T: Into<String>>(msg: T) -> Self {
        ShortenerError::BackendMismatch(msg.into())
    }

    pub fn transaction<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Transaction(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::DatabaseOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Validation(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Config(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Conflict(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

impl From<::config::ConfigError> for ShortenerError {
    fn from(err: ::config::ConfigError) -> Self {
        ShortenerError::Config(err.to_string())
    }
}

/// Only the status and a fixed reason phrase reach the client.
impl ResponseError for ShortenerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ShortenerError::MalformedCredential(_)
            | ShortenerError::CredentialDecode(_)
            | ShortenerError::Validation(_) => StatusCode::BAD_REQUEST,
            ShortenerError::SignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::Deleted(_) => StatusCode::GONE,
            ShortenerError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status)
            .insert_header(("Content-Type", "text/plain; charset=utf-8"))
            .body(status.canonical_reason().unwrap_or("Error"))
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;
