/*!
 * # Authentication and Authorization Module
 *
 * This module provides authentication and authorization services for the
 * AssetFlow API. Callers authenticate with JWT bearer tokens; permissions
 * travel inside the token claims and are checked by route middleware or
 * inline in handlers for actions whose permission depends on the payload.
 *
 * Token issuance for operators happens outside this service. The API
 * validates, refreshes and revokes tokens it is presented with.
 */

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::entities::user;

mod permissions;

pub use permissions::*;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub name: Option<String>,     // User's display name
    pub email: Option<String>,    // User's email
    pub roles: Vec<String>,       // User's roles (multiple roles support)
    pub permissions: Vec<String>, // User's explicit permissions
    pub jti: String,              // JWT ID (unique identifier for this token)
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
    pub nbf: i64,                 // Not valid before time
    pub iss: String,              // Issuer
    pub aud: String,              // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the user carries a specific permission verbatim
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }

    /// Check if the user may perform an action, honoring wildcard grants
    /// such as `assets:*` and the admin role
    pub fn can(&self, permission: &str) -> bool {
        self.is_admin()
            || self
                .permissions
                .iter()
                .any(|granted| PermissionService::is_permission_implied(granted, permission))
    }

    /// The user id parsed as a UUID, when the token carries one
    pub fn user_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.user_id).ok()
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
            refresh_token_expiration,
        }
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    pub db: Arc<DatabaseConnection>,
    blacklisted_tokens: Arc<RwLock<Vec<BlacklistedToken>>>,
    refresh_tokens: Arc<RwLock<Vec<StoredRefreshToken>>>,
}

/// Token blacklist entry
#[derive(Clone, Debug)]
struct BlacklistedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

/// Outstanding refresh token entry
#[derive(Clone, Debug)]
struct StoredRefreshToken {
    user_id: Uuid,
    jti: String,
    expiry: DateTime<Utc>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DatabaseConnection>) -> Self {
        Self {
            config,
            db,
            blacklisted_tokens: Arc::new(RwLock::new(Vec::new())),
            refresh_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Generate an access/refresh token pair for a user
    pub async fn generate_token(
        &self,
        user: &user::Model,
        roles: Vec<String>,
        permissions: Vec<String>,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        // Generate unique token IDs
        let access_jti = Uuid::new_v4().to_string();
        let refresh_jti = Uuid::new_v4().to_string();

        let display_name = match &user.last_name {
            Some(last) => format!("{} {}", user.first_name, last),
            None => user.first_name.clone(),
        };

        // Create access token claims
        let access_claims = Claims {
            sub: user.id.to_string(),
            name: Some(display_name.clone()),
            email: Some(user.email.clone()),
            roles: roles.clone(),
            permissions: permissions.clone(),
            jti: access_jti,
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh token claims carry roles and permissions so a refresh can
        // re-issue without a separate grant store
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            name: Some(display_name),
            email: Some(user.email.clone()),
            roles,
            permissions,
            jti: refresh_jti.clone(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Generate the tokens
        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        let refresh_token = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        // Register the refresh token so it can be verified and rotated
        self.store_refresh_token(user.id, &refresh_jti, refresh_exp)
            .await;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            refresh_expires_in: self.config.refresh_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.clone()]);
        validation.set_issuer(&[self.config.jwt_issuer.clone()]);

        // Decode and validate the token
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        // Check if the token is blacklisted
        if self.is_token_blacklisted(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Refresh an access token using a refresh token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        // Validate the refresh token
        let claims = self.validate_token(refresh_token).await?;

        // Get the user ID from the claims
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        // Check that the refresh token is still outstanding
        if !self.verify_refresh_token(user_id, &claims.jti).await {
            return Err(AuthError::InvalidToken);
        }

        // The user must still exist
        let user = user::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)?;

        // Generate new tokens from the grants carried by the refresh token
        let new_tokens = self
            .generate_token(&user, claims.roles, claims.permissions)
            .await?;

        // Invalidate the old refresh token
        self.revoke_refresh_token(user_id, &claims.jti).await;

        Ok(new_tokens)
    }

    /// Revoke a token (add it to the blacklist)
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        // Validate the token first
        let claims = self.validate_token(token).await?;

        // Add the token to the blacklist
        let expiry = Utc::now() + ChronoDuration::seconds(claims.exp - Utc::now().timestamp());
        let blacklisted_token = BlacklistedToken {
            jti: claims.jti,
            expiry,
        };

        // Add to the in-memory blacklist
        let mut blacklist = self.blacklisted_tokens.write().await;
        blacklist.push(blacklisted_token);

        // Clean up expired tokens in the blacklist
        self.clean_blacklist(&mut blacklist);

        Ok(())
    }

    /// Check if a token is blacklisted
    async fn is_token_blacklisted(&self, token_id: &str) -> bool {
        let blacklist = self.blacklisted_tokens.read().await;
        blacklist.iter().any(|t| t.jti == token_id)
    }

    /// Clean up expired tokens from the blacklist
    fn clean_blacklist(&self, blacklist: &mut Vec<BlacklistedToken>) {
        let now = Utc::now();
        blacklist.retain(|t| t.expiry > now);
    }

    /// Register a refresh token as outstanding
    async fn store_refresh_token(&self, user_id: Uuid, token_id: &str, expiry: DateTime<Utc>) {
        let mut tokens = self.refresh_tokens.write().await;
        let now = Utc::now();
        tokens.retain(|t| t.expiry > now);
        tokens.push(StoredRefreshToken {
            user_id,
            jti: token_id.to_string(),
            expiry,
        });
        debug!("Stored refresh token {} for user {}", token_id, user_id);
    }

    /// Check whether a refresh token is still outstanding
    async fn verify_refresh_token(&self, user_id: Uuid, token_id: &str) -> bool {
        let tokens = self.refresh_tokens.read().await;
        let now = Utc::now();
        tokens
            .iter()
            .any(|t| t.user_id == user_id && t.jti == token_id && t.expiry > now)
    }

    /// Remove a refresh token from the outstanding set
    async fn revoke_refresh_token(&self, user_id: Uuid, token_id: &str) {
        let mut tokens = self.refresh_tokens.write().await;
        tokens.retain(|t| !(t.user_id == user_id && t.jti == token_id));
        debug!("Revoked refresh token {} for user {}", token_id, user_id);
    }
}

/// Token pair response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::RevokedToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REVOKED_TOKEN",
                "Authentication token has been revoked".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::UserNotFound => (
                StatusCode::NOT_FOUND,
                "AUTH_USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_DATABASE_ERROR",
                msg.clone(),
            ),
            Self::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Extract the authenticated user placed into request extensions by
/// [`auth_middleware`]
#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Permission middleware to check if a user has the required permission
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // Extract the authenticated user
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    // Check the permission, honoring wildcard grants and the admin role
    if !user.can(&required_permission) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates auth tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Clone the headers to avoid borrowing issues
    let headers = request.headers().clone();

    // Extract the auth service from the request state
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    // Extract auth information
    let auth_result = extract_auth_from_headers(&headers, &auth_service).await;

    match auth_result {
        Ok(user) => {
            // Add the authenticated user to the request extensions
            request.extensions_mut().insert(user);

            // Continue with the request
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token).await?;

                return Ok(AuthUser {
                    user_id: claims.sub,
                    name: claims.name,
                    email: claims.email,
                    roles: claims.roles,
                    permissions: claims.permissions,
                    token_id: claims.jti,
                });
            }
        }
    }

    // No valid authentication found
    Err(AuthError::MissingAuth)
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/refresh", axum::routing::post(refresh_token_handler))
        .route(
            "/logout",
            axum::routing::post(logout_handler).layer(axum::middleware::from_fn(auth_middleware)),
        )
        .layer(DefaultBodyLimit::max(1024 * 64)) // 64KB limit
}

/// Refresh token handler
pub async fn refresh_token_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(refresh_request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    // Refresh the token
    let token_pair = auth_service
        .refresh_token(&refresh_request.refresh_token)
        .await?;

    Ok(Json(token_pair))
}

/// Logout handler
async fn logout_handler(
    State(auth_service): State<Arc<AuthService>>,
    auth_user: AuthUser,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthError> {
    // Extract the token from headers
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();

                // Revoke the token
                auth_service.revoke_token(token).await?;
                debug!("Revoked access token for user {}", auth_user.user_id);
                return Ok(Json(
                    serde_json::json!({ "message": "Successfully logged out" }),
                ));
            }
        }
    }

    Err(AuthError::MissingToken)
}

/// Refresh token request
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;

    fn test_config() -> AuthConfig {
        AuthConfig::new(
            "kY3sQ9vTn4xW8mZj2bHc6wRf5gPd7uLa0eNi1oXs4yVq8tKm3rGb5hJd9cWp2zFn".to_string(),
            "assetflow-auth".to_string(),
            "assetflow-api".to_string(),
            Duration::from_secs(30 * 60),
            Duration::from_secs(7 * 24 * 60 * 60),
        )
    }

    fn test_user() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            username: "asmith".to_string(),
            email: "asmith@example.com".to_string(),
            first_name: "Alex".to_string(),
            last_name: Some("Smith".to_string()),
            location_id: None,
            company_id: None,
            created_at: Utc::now(),
        }
    }

    async fn test_service() -> AuthService {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        AuthService::new(test_config(), Arc::new(db))
    }

    #[tokio::test]
    async fn generated_token_round_trips_through_validation() {
        let service = test_service().await;
        let user = test_user();

        let pair = service
            .generate_token(
                &user,
                vec!["staff".to_string()],
                vec!["assets:view".to_string(), "assets:update".to_string()],
            )
            .await
            .expect("token pair");

        let claims = service
            .validate_token(&pair.access_token)
            .await
            .expect("valid token");
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.name.as_deref(), Some("Alex Smith"));
        assert!(claims.permissions.contains(&"assets:update".to_string()));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = test_service().await;
        let pair = service
            .generate_token(&test_user(), vec![], vec![])
            .await
            .expect("token pair");

        service
            .revoke_token(&pair.access_token)
            .await
            .expect("revocation");

        let result = service.validate_token(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::RevokedToken)));
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let service = test_service().await;
        let mut other_config = test_config();
        other_config.jwt_secret =
            "zB8wQ2rTk6xM1nVc4gHd9sLf3jPa7uYe0oNi5qXw2yRb6tKs9vGm4hJc8dWp1zEn".to_string();
        let other = AuthService::new(
            other_config,
            service.db.clone(),
        );

        let pair = other
            .generate_token(&test_user(), vec![], vec![])
            .await
            .expect("token pair");

        let result = service.validate_token(&pair.access_token).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}
