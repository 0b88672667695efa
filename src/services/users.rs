//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        user::{ChangePassword, CreateUser, Role, UpdateUser, User, UserClaims, UserQuery},
        Page,
    },
    repository::Repository,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Authenticate by login and password and return a JWT token
    pub async fn authenticate(&self, login: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid login or password".to_string());

        let user = self.repository.users.get_by_login(login).await?.ok_or_else(invalid)?;
        if !verify_password(&user.password, password)? {
            tracing::warn!(login = %login, "Failed login attempt");
            return Err(invalid());
        }
        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        let token = self.create_token(&user)?;
        self.repository.users.touch_last_login(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    /// Create a JWT token for a user
    pub fn create_token(&self, user: &User) -> AppResult<String> {
        UserClaims::new(user, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<Page<User>> {
        let (items, total) = self.repository.users.list(query).await?;
        Ok(Page::new(items, total, &query.pagination()))
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        if self.repository.users.login_exists(&user.login, None).await? {
            return Err(AppError::Duplicate("Login already exists".to_string()));
        }
        let hash = hash_password(&user.password)?;
        let created = self.repository.users.create(&user, &hash).await?;
        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    /// Update a user, rehashing the password when one is given
    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        if let Some(ref login) = user.login {
            if self.repository.users.login_exists(login, Some(id)).await? {
                return Err(AppError::Duplicate("Login already exists".to_string()));
            }
        }
        let hash = user.password.as_deref().map(hash_password).transpose()?;
        self.repository.users.update(id, &user, hash.as_deref()).await
    }

    /// Delete a user; an account cannot delete itself
    pub async fn delete_user(&self, id: i32, requested_by: i32) -> AppResult<()> {
        if id == requested_by {
            return Err(AppError::BusinessRule("You cannot delete your own account".to_string()));
        }
        self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, deleted_by = requested_by, "User deleted");
        Ok(())
    }

    /// Change the password of the calling user after checking the current one
    pub async fn change_password(&self, id: i32, data: ChangePassword) -> AppResult<()> {
        let user = self.repository.users.get_by_id(id).await?;
        if !verify_password(&user.password, &data.current_password)? {
            return Err(AppError::Authentication("Current password is incorrect".to_string()));
        }
        let hash = hash_password(&data.new_password)?;
        self.repository.users.update_password(id, &hash).await
    }

    /// Create the configured administrator when the users table is empty
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<()> {
        let (Some(login), Some(password)) = (
            self.config.bootstrap_admin_login.as_deref(),
            self.config.bootstrap_admin_password.as_deref(),
        ) else {
            return Ok(());
        };

        if self.repository.users.count().await? > 0 {
            return Ok(());
        }

        let admin = self
            .create_user(CreateUser {
                login: login.to_string(),
                password: password.to_string(),
                first_name: None,
                last_name: None,
                email: None,
                role: Some(Role::Admin),
            })
            .await?;
        tracing::warn!(login = %admin.login, "Created bootstrap administrator; change its password");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password(&hash, "correct horse").unwrap());
        assert!(!verify_password(&hash, "wrong horse").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_internal_error() {
        assert!(matches!(
            verify_password("not-a-hash", "x"),
            Err(AppError::Internal(_))
        ));
    }
}
