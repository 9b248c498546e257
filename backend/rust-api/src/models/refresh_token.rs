use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{bson_datetime_as_chrono, bson_datetime_as_chrono_option};

/// Refresh token stored in the "refresh_tokens" collection. Only the SHA-256
/// digest of the token ever reaches the store; the plaintext lives in the
/// HTTP-only cookie held by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    #[serde(rename = "_id")]
    pub id: String,

    pub user_id: String,

    /// SHA-256 hex digest of the actual refresh token
    pub token_hash: String,

    #[serde(rename = "createdAt", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "expiresAt", with = "bson_datetime_as_chrono")]
    pub expires_at: DateTime<Utc>,

    #[serde(
        rename = "revokedAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "bson_datetime_as_chrono_option"
    )]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn usable_only_while_unexpired_and_unrevoked() {
        let now = Utc::now();
        let mut token = RefreshTokenRecord {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            token_hash: "abc".to_string(),
            created_at: now,
            expires_at: now + Duration::days(30),
            revoked_at: None,
        };

        assert!(token.is_usable(now));
        assert!(!token.is_usable(now + Duration::days(31)));

        token.revoked_at = Some(now);
        assert!(!token.is_usable(now));
    }
}
