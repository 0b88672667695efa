//! User model, roles and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::pagination::PageQuery;
use crate::error::AppError;

text_enum! {
    /// Staff roles, from least to most privileged
    pub enum Role {
        Viewer => "viewer",
        Staff => "staff" | "user",
        Manager => "manager",
        Admin => "admin",
    }
}

impl Role {
    fn level(&self) -> u8 {
        match self {
            Role::Viewer => 0,
            Role::Staff => 1,
            Role::Manager => 2,
            Role::Admin => 3,
        }
    }

    pub fn at_least(&self, other: Role) -> bool {
        self.level() >= other.level()
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub login: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Search in login, names and email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl UserQuery {
    pub fn pagination(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Create user request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 50, message = "Login must be at least 3 characters"))]
    pub login: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    /// Defaults to staff
    pub role: Option<Role>,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 50, message = "Login must be at least 3 characters"))]
    pub login: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Change own password
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user: &User, expiration_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user.login.clone(),
            user_id: user.id,
            role: user.role,
            exp: now + (expiration_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    fn require(&self, role: Role, action: &str) -> Result<(), AppError> {
        if self.role.at_least(role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!("Insufficient rights to {}", action)))
        }
    }

    /// Any authenticated user may read
    pub fn require_read(&self) -> Result<(), AppError> {
        self.require(Role::Viewer, "read records")
    }

    /// Create and edit records, manage loans
    pub fn require_write(&self) -> Result<(), AppError> {
        self.require(Role::Staff, "modify records")
    }

    /// Delete records
    pub fn require_delete(&self) -> Result<(), AppError> {
        self.require(Role::Manager, "delete records")
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> UserClaims {
        UserClaims {
            sub: "nadia".to_string(),
            user_id: 2,
            role,
            exp: Utc::now().timestamp() + 3600,
            iat: Utc::now().timestamp(),
        }
    }

    #[test]
    fn test_role_hierarchy() {
        let viewer = claims(Role::Viewer);
        assert!(viewer.require_read().is_ok());
        assert!(viewer.require_write().is_err());

        let staff = claims(Role::Staff);
        assert!(staff.require_write().is_ok());
        assert!(staff.require_delete().is_err());

        let manager = claims(Role::Manager);
        assert!(manager.require_delete().is_ok());
        assert!(manager.require_admin().is_err());

        assert!(claims(Role::Admin).require_admin().is_ok());
    }

    #[test]
    fn test_token_roundtrip_and_wrong_secret() {
        let token = claims(Role::Manager).create_token("s3cret").unwrap();
        let decoded = UserClaims::from_token(&token, "s3cret").unwrap();
        assert_eq!(decoded.user_id, 2);
        assert_eq!(decoded.role, Role::Manager);

        assert!(UserClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut expired = claims(Role::Admin);
        expired.exp = Utc::now().timestamp() - 3600;
        let token = expired.create_token("s3cret").unwrap();
        assert!(UserClaims::from_token(&token, "s3cret").is_err());
    }
}
