use std::sync::Arc;

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::refresh_token::RefreshTokenRecord;
use crate::models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserProfile};
use crate::models::UserRole;
use crate::store::{RecordStore, StoreError};

pub struct AuthService {
    store: Arc<dyn RecordStore>,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

/// An issued token pair; the refresh token leaves the service exactly once,
/// in plaintext, to be set as an HTTP-only cookie.
pub struct IssuedTokens {
    pub response: AuthResponse,
    pub refresh_token: String,
}

impl AuthService {
    pub fn new(store: Arc<dyn RecordStore>, jwt_service: JwtService) -> Self {
        let access_token_ttl_seconds = std::env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600); // Default: 1 hour

        let refresh_token_ttl_seconds = std::env::var("JWT_REFRESH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(2592000); // Default: 30 days

        Self {
            store,
            jwt_service,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        hash(password, DEFAULT_COST)
            .map_err(|e| ApiError::Validation(format!("Failed to hash password: {}", e)))
    }

    pub fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool, ApiError> {
        verify(password, password_hash)
            .map_err(|e| ApiError::Validation(format!("Failed to verify password: {}", e)))
    }

    /// Register a new learner account.
    pub async fn register(&self, req: RegisterRequest) -> Result<IssuedTokens, ApiError> {
        if self.store.find_user_by_email(&req.email).await?.is_some() {
            return Err(ApiError::Validation(
                "A user with this email already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: req.email.clone(),
            password_hash,
            name: req.name,
            role: UserRole::Learner,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        // The unique email index backs up the check above against races.
        match self.store.insert_user(&user).await {
            Ok(()) => {}
            Err(StoreError::Duplicate { .. }) => {
                return Err(ApiError::Validation(
                    "A user with this email already exists".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!("User registered: {}", user.id);
        self.issue_tokens(user).await
    }

    /// Login with email and password.
    pub async fn login(&self, req: LoginRequest) -> Result<IssuedTokens, ApiError> {
        let user = self
            .store
            .find_user_by_email(&req.email)
            .await?
            .ok_or_else(|| ApiError::Validation("Invalid email or password".to_string()))?;

        if !self.verify_password(&req.password, &user.password_hash)? {
            tracing::warn!(email = %req.email, "Failed login attempt: invalid password");
            return Err(ApiError::Validation(
                "Invalid email or password".to_string(),
            ));
        }

        let now = Utc::now();
        self.store.record_login(&user.id, now).await?;

        tracing::info!(user_id = %user.id, email = %req.email, "Successful login");

        let user = User {
            last_login_at: Some(now),
            ..user
        };
        self.issue_tokens(user).await
    }

    /// Exchange a refresh token for a fresh pair, rotating the stored token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens, ApiError> {
        let token_hash = Self::hash_token(refresh_token);
        let now = Utc::now();

        let record = self
            .store
            .find_refresh_token(&token_hash)
            .await?
            .filter(|t| t.is_usable(now))
            .ok_or(ApiError::AuthRequired)?;

        let user = self
            .store
            .find_user(&record.user_id)
            .await?
            .ok_or(ApiError::AuthRequired)?;

        // Rotation: the presented token is spent either way.
        self.store.revoke_refresh_token(&token_hash, now).await?;

        self.issue_tokens(user).await
    }

    /// Revoke the presented refresh token. Unknown tokens are treated as
    /// already logged out.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), ApiError> {
        let token_hash = Self::hash_token(refresh_token);
        self.store
            .revoke_refresh_token(&token_hash, Utc::now())
            .await?;
        Ok(())
    }

    pub async fn current_user(&self, user_id: &str) -> Result<UserProfile, ApiError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(ApiError::NotFound("user"))?;
        Ok(UserProfile::from(user))
    }

    async fn issue_tokens(&self, user: User) -> Result<IssuedTokens, ApiError> {
        let access_token = self.generate_access_token(&user)?;
        let refresh_token = self.create_refresh_token(&user.id).await?;

        Ok(IssuedTokens {
            response: AuthResponse {
                access_token,
                user: UserProfile::from(user),
            },
            refresh_token,
        })
    }

    fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_ttl_seconds);

        let claims = JwtClaims {
            sub: user.id.clone(),
            role: user.role.as_str().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| ApiError::Validation(format!("Failed to generate token: {}", e)))
    }

    /// Create a refresh token: plaintext goes to the client, only the digest
    /// is stored.
    async fn create_refresh_token(&self, user_id: &str) -> Result<String, ApiError> {
        let token = Uuid::new_v4().to_string();
        let now = Utc::now();

        let record = RefreshTokenRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token_hash: Self::hash_token(&token),
            created_at: now,
            expires_at: now + Duration::seconds(self.refresh_token_ttl_seconds),
            revoked_at: None,
        };

        self.store.insert_refresh_token(&record).await?;
        Ok(token)
    }

    fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_and_hex() {
        let a = AuthService::hash_token("some-token");
        let b = AuthService::hash_token("some-token");
        let c = AuthService::hash_token("other-token");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
