//! Authenticated user profile
//!
//! Users live in the external auth provider. The service only sees the
//! claims carried by the bearer token.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

impl UserProfile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            full_name: None,
        }
    }

    /// Full name, else the local part of the email, else "Customer"
    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Customer".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_fallbacks() {
        let mut user = UserProfile::new("u-1");
        assert_eq!(user.display_name(), "Customer");

        user.email = Some("priya.k@example.com".into());
        assert_eq!(user.display_name(), "priya.k");

        user.full_name = Some("Priya Kumar".into());
        assert_eq!(user.display_name(), "Priya Kumar");

        user.full_name = Some("   ".into());
        assert_eq!(user.display_name(), "priya.k");
    }
}
