use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Persistence: {0}")]
    Persistence(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if the caller retries it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DomainError::Persistence(_) | DomainError::UpstreamUnavailable(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        match e {
            InfraError::Database(e) => DomainError::Persistence(e.to_string()),
            InfraError::Http(e) => DomainError::UpstreamUnavailable(e.to_string()),
            InfraError::Serialization(e) => DomainError::UpstreamUnavailable(e.to_string()),
            InfraError::Render(msg) => DomainError::Validation(msg),
        }
    }
}
