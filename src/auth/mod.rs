//! Authentication and authorization.
//!
//! JWT bearer tokens with Argon2 password hashing. Two roles exist:
//! customers place and track orders; vendors manage one stall each.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    entities::stall,
    entities::user::{self, Entity as UserEntity, Role},
    errors::ServiceError,
};

/// JWT claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub stall_id: Option<Uuid>,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    expiration_secs: usize,
}

impl AuthConfig {
    pub fn new(secret: String, expiration_secs: usize) -> Self {
        Self {
            secret,
            expiration_secs,
        }
    }
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SignUpInput {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "Display name is required"))]
    pub display_name: String,
    pub role: Role,
    /// Required when signing up as a vendor
    pub stall_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct SignInInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Issued session: token plus the profile it authenticates.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub stall_id: Option<Uuid>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            display_name: model.display_name,
            role: model.role,
            stall_id: model.stall_id,
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Registers an account. Vendor sign-up also creates the stall the
    /// account operates, in the same transaction.
    #[instrument(skip(self, input), fields(email = %input.email, role = ?input.role))]
    pub async fn sign_up(&self, input: SignUpInput) -> Result<Session, ServiceError> {
        input.validate()?;

        if input.role == Role::Vendor
            && input
                .stall_name
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .is_empty()
        {
            return Err(ServiceError::ValidationError(
                "Vendor sign-up requires a stall name".to_string(),
            ));
        }

        let existing = UserEntity::find()
            .filter(user::Column::Email.eq(input.email.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Account with email {} already exists",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();
        let user_id = Uuid::new_v4();

        let txn = self.db.begin().await?;

        let stall_id = if input.role == Role::Vendor {
            let stall_name = input.stall_name.clone().unwrap_or_default();
            let next_number = stall::Entity::find()
                .order_by_desc(stall::Column::StallNumber)
                .one(&txn)
                .await?
                .map(|s| s.stall_number + 1)
                .unwrap_or(1);

            let stall_id = Uuid::new_v4();
            stall::ActiveModel {
                id: Set(stall_id),
                owner_id: Set(user_id),
                name: Set(stall_name.trim().to_string()),
                stall_number: Set(next_number),
                is_open: Set(true),
                rating: Set(0.0),
                total_ratings: Set(0),
                created_at: Set(now),
                updated_at: Set(None),
            }
            .insert(&txn)
            .await?;

            Some(stall_id)
        } else {
            None
        };

        let model = user::ActiveModel {
            id: Set(user_id),
            email: Set(input.email.trim().to_lowercase()),
            password_hash: Set(password_hash),
            display_name: Set(input.display_name.trim().to_string()),
            role: Set(input.role),
            stall_id: Set(stall_id),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(None),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        info!(user_id = %user_id, "account created");
        self.issue_session(model)
    }

    /// Verifies credentials and issues a token.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn sign_in(&self, input: SignInInput) -> Result<Session, ServiceError> {
        input.validate()?;

        let user = UserEntity::find()
            .filter(user::Column::Email.eq(input.email.trim().to_lowercase()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Invalid email or password".to_string()))?;

        if !user.active {
            return Err(ServiceError::AuthError("Account is disabled".to_string()));
        }

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(ServiceError::AuthError(
                "Invalid email or password".to_string(),
            ));
        }

        self.issue_session(user)
    }

    /// Fetches the current profile for an authenticated user id.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        let user = UserEntity::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::AuthError("Account no longer exists".to_string()))?;

        if !user.active {
            return Err(ServiceError::AuthError("Account is disabled".to_string()));
        }

        Ok(user.into())
    }

    /// Resolves a bearer token back to the account it was issued for.
    pub async fn session(&self, token: &str) -> Result<UserProfile, ServiceError> {
        let claims = self.verify_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::AuthError("Malformed token subject".to_string()))?;

        self.profile(user_id).await
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| ServiceError::AuthError(format!("Invalid token: {}", e)))
    }

    fn issue_session(&self, user: user::Model) -> Result<Session, ServiceError> {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            stall_id: user.stall_id,
            exp: now + self.config.expiration_secs,
            iat: now,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Failed to sign token: {}", e)))?;

        Ok(Session {
            token,
            user: user.into(),
        })
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| ServiceError::InternalError(format!("Corrupt password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Authenticated caller, extracted from the `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    pub stall_id: Option<Uuid>,
}

impl AuthUser {
    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    /// Returns the caller's stall id, rejecting non-vendor callers.
    pub fn require_vendor_stall(&self) -> Result<Uuid, ServiceError> {
        if self.role != Role::Vendor {
            return Err(ServiceError::Forbidden(
                "This action is only available to vendors".to_string(),
            ));
        }
        self.stall_id.ok_or_else(|| {
            ServiceError::Forbidden("Vendor account has no stall assigned".to_string())
        })
    }
}

#[async_trait]
impl FromRequestParts<crate::AppState> for AuthUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &crate::AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ServiceError::Unauthorized("Authorization header must be a Bearer token".to_string())
        })?;

        let claims = state.services.auth.verify_token(token)?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ServiceError::AuthError("Malformed token subject".to_string()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
            role: claims.role,
            stall_id: claims.stall_id,
        })
    }
}
