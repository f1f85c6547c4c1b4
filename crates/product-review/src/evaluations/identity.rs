use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use super::domain::UserId;

/// Header carrying the authenticated account id, set by the authenticating proxy.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated account role, set by the authenticating proxy.
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Tester,
    User,
}

impl UserRole {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "tester" => Some(Self::Tester),
            "user" => Some(Self::User),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Tester => "tester",
            UserRole::User => "user",
        }
    }

    pub const fn can_evaluate(self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Tester)
    }
}

/// Already-authenticated caller, attached to the request as an extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub role: UserRole,
}

impl CallerIdentity {
    /// Decode the identity forwarded by the gateway. Missing or malformed headers yield `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = headers
            .get(USER_ID_HEADER)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()?;
        let role = UserRole::parse(headers.get(USER_ROLE_HEADER)?.to_str().ok()?)?;

        Some(Self {
            user_id: UserId(user_id),
            role,
        })
    }
}
