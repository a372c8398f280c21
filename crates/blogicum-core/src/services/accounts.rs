//! Account flows: registration, login and editing one's own profile.

use std::sync::Arc;

use serde::Serialize;

use super::current_user;
use crate::domain::{
    NewUser, ProfileUpdate, PublicProfile, User, Viewer, is_plausible_email, is_valid_username,
};
use crate::error::{DomainError, FieldError, RepoError, Validator};
use crate::navigation::{Mutation, Navigation};
use crate::ports::{PasswordService, TokenService, UserRepository};

const PASSWORD_MIN_CHARS: usize = 8;

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued identity handle.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub expires_in: i64,
    pub username: String,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    pub async fn register(
        &self,
        form: Registration,
    ) -> Result<Mutation<PublicProfile>, DomainError> {
        Validator::new()
            .check(
                is_valid_username(&form.username),
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            )
            .check(
                form.email.is_empty() || is_plausible_email(&form.email),
                "email",
                "Enter a valid email address.",
            )
            .check(
                form.password.chars().count() >= PASSWORD_MIN_CHARS,
                "password",
                "This password is too short. It must contain at least 8 characters.",
            )
            .finish()?;

        if self.users.find_by_username(&form.username).await?.is_some() {
            return Err(username_taken());
        }

        let password_hash = self
            .passwords
            .hash(&form.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(NewUser {
            username: form.username,
            email: form.email,
            password_hash,
        });
        let user = self.users.create(user).await.map_err(unique_username)?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok(Mutation::Applied {
            value: user.profile(),
            next: Navigation::login(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, DomainError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            tracing::debug!("Login rejected");
            return Err(DomainError::InvalidCredentials);
        }

        let access_token = self
            .tokens
            .generate_token(user.id, &user.username)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_in: self.tokens.expiration_seconds(),
            username: user.username,
        })
    }

    /// The requester's own record; there is no way to name another user here.
    pub async fn profile_form(&self, viewer: &Viewer) -> Result<User, DomainError> {
        current_user(self.users.as_ref(), viewer).await
    }

    pub async fn update_profile(
        &self,
        viewer: &Viewer,
        update: ProfileUpdate,
    ) -> Result<Mutation<PublicProfile>, DomainError> {
        let mut user = current_user(self.users.as_ref(), viewer).await?;
        update.validate()?;

        if update.username != user.username {
            if let Some(other) = self.users.find_by_username(&update.username).await? {
                if other.id != user.id {
                    return Err(username_taken());
                }
            }
        }

        user.apply(update);
        let user = self.users.update(user).await.map_err(unique_username)?;
        tracing::info!(user_id = %user.id, "Profile updated");

        Ok(Mutation::Applied {
            next: Navigation::profile(user.username.clone()),
            value: user.profile(),
        })
    }
}

fn username_taken() -> DomainError {
    DomainError::Validation(vec![FieldError::new(
        "username",
        "A user with that username already exists.",
    )])
}

fn unique_username(err: RepoError) -> DomainError {
    match err {
        RepoError::Constraint(_) => username_taken(),
        other => other.into(),
    }
}
